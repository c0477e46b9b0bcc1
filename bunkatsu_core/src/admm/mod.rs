//! Alternating direction method of multipliers

use num_traits::Float;
use core::fmt::{Debug, LowerExp};
use std::time::{Duration, Instant};
use crate::vecops::{self, DenseMat, LinearMap};
use crate::{DecompError, Site, SolveError, Termination};

//

/// Coupling term added to a block's own objective.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// A block with its own objective \\(\phi(u)\\) shall minimize
/// \\[
/// \phi(u) + {\rho \over 2} \\|e(u)\\|_2^2 + \lambda^T e(u),
/// \quad e(u) = a - M u,
/// \\]
/// where \\(M\\) is [`CouplingTerm::map`], \\(a\\) is [`CouplingTerm::anchor`] and
/// \\(\lambda\\) is [`CouplingTerm::multiplier`].
///
/// Both blocks see the same residual \\(e = z - T x\\):
/// the x-block gets \\(M = T,\ a = z\\) and the z-block gets \\(M = -I,\ a = -T x\\).
pub struct CouplingTerm<'a, F>
{
    pub map: &'a LinearMap<F>,
    pub anchor: &'a [F],
    pub multiplier: &'a [F],
    pub rho: F,
}

impl<'a, F: Float> CouplingTerm<'a, F>
{
    /// Residual \\(e(u) = a - M u\\).
    pub fn error(&self, u: &[F]) -> Vec<F>
    {
        vecops::sub(self.anchor, &self.map.apply(u))
    }

    /// Value of the coupling term at `u`.
    pub fn value(&self, u: &[F]) -> F
    {
        let e = self.error(u);
        let half = F::from(0.5).unwrap_or_else(F::zero);

        half * self.rho * vecops::dot(&e, &e) + vecops::dot(self.multiplier, &e)
    }

    /// Quadratic part \\(\rho M^T M\\) of the expanded term.
    pub fn quadratic(&self) -> DenseMat<F>
    {
        let g = self.map.gram();
        let (n, _) = g.size();
        DenseMat::zeros(n, n).by_fn(|r, c| self.rho * g[(r, c)])
    }

    /// Linear part \\(-M^T(\rho a + \lambda)\\) of the expanded term.
    pub fn linear(&self) -> Vec<F>
    {
        let mut v = self.multiplier.to_vec();
        vecops::axpy(self.rho, self.anchor, &mut v);
        self.map.apply_trans(&v).into_iter().map(|u| -u).collect()
    }
}

/// One block of a splitting \\(f(x) + g(z)\\).
pub trait Block<F: Float>
{
    /// Dimension of the block variable.
    fn dim(&self) -> usize;

    /// Minimizes the block's own objective plus the coupling `term`.
    ///
    /// Returns the minimizer, whose length shall be [`Block::dim`].
    /// The block itself is left untouched.
    fn minimize(&self, term: &CouplingTerm<'_, F>) -> Result<Vec<F>, SolveError>;
}

//

/// ADMM parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmmParam<F: Float>
{
    /// Max number of iterations.
    pub max_iter: usize,
    /// Tolerance of the primal residual \\(\\|T x - z\\|_2\\).
    pub tol: F,
    /// Penalty parameter \\(\rho > 0\\).
    pub rho: F,
    /// Wall-clock limit. `None` means no limit.
    pub time_limit: Option<Duration>,
    /// Period of iterations to output progress log (for debug level).
    pub log_period: usize,
}

impl<F: Float> Default for AdmmParam<F>
{
    fn default() -> Self
    {
        let ten = F::from(10).unwrap_or_else(F::one);

        AdmmParam {
            max_iter: 1_000,
            tol: ten.powi(-6),
            rho: F::one(),
            time_limit: None,
            log_period: 10,
        }
    }
}

/// Result of [`Admm::solve`].
#[derive(Debug, Clone)]
pub struct AdmmReport<F>
{
    pub x: Vec<F>,
    pub z: Vec<F>,
    /// Multiplier \\(\lambda\\) of \\(z = T x\\).
    pub lambda: Vec<F>,
    pub iterations: usize,
    /// Last primal residual.
    pub residual: F,
    /// Primal residual of every iteration.
    pub residuals: Vec<F>,
    pub termination: Termination,
}

/// ADMM driver.
///
/// Minimizes \\(f(x) + g(z)\\) subject to \\(z = T x\\)
/// by alternating the two block minimizations with a dual ascent step.
pub struct Admm<F: Float>
{
    /// driver parameters.
    pub par: AdmmParam<F>,
}

impl<F: Float> Admm<F>
{
    /// Creates an instance with default parameters.
    pub fn new() -> Self
    {
        Admm {
            par: AdmmParam::default(),
        }
    }

    /// Changes driver parameters.
    ///
    /// Returns [`Admm`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut AdmmParam<F>)
    {
        f(&mut self.par);
        self
    }
}

impl<F: Float> Default for Admm<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<F> Admm<F>
where F: Float + Debug + LowerExp
{
    /// Runs ADMM.
    ///
    /// Returns `Ok` with [`AdmmReport`] when the residual falls below the tolerance
    /// or the time limit is hit, `Err` with [`DecompError`] otherwise.
    /// * `x_block` is \\(f\\) over \\(x \in \mathbb{R}^n\\).
    /// * `z_block` is \\(g\\) over \\(z \in \mathbb{R}^m\\).
    /// * `map_t` is \\(T\\) of size \\(m \times n\\).
    pub fn solve<X, Z>(&self, x_block: &X, z_block: &Z, map_t: &LinearMap<F>) -> Result<AdmmReport<F>, DecompError>
    where X: Block<F>, Z: Block<F>
    {
        let par = &self.par;
        let (m, n) = map_t.size();

        if !(par.rho > F::zero()) || !par.rho.is_finite() {
            return Err(DecompError::InvalidInput(format!("rho must be positive and finite: {:?}", par.rho)));
        }
        if par.tol.is_nan() {
            return Err(DecompError::InvalidInput("tol is NaN".into()));
        }
        if x_block.dim() != n || z_block.dim() != m {
            return Err(DecompError::InvalidInput(format!(
                "T is {}x{} but blocks have dimensions x:{} z:{}", m, n, x_block.dim(), z_block.dim()
            )));
        }

        log::debug!("{:?}", par);

        if par.max_iter == 0 {
            log::warn!("----- ExcessIter");
            return Err(DecompError::NonConvergence { iterations: 0, gap: f64::INFINITY });
        }

        let neg_eye = LinearMap::identity(m).neg();
        let mut z = vec![F::zero(); m];
        let mut lambda = vec![F::zero(); m];
        let mut residuals = Vec::new();

        log::info!("----- Started");
        let start = Instant::now();
        for k in 1..= par.max_iter {
            let x = x_block.minimize(&CouplingTerm {
                map: map_t,
                anchor: &z,
                multiplier: &lambda,
                rho: par.rho,
            })
            .and_then(|x| check_len(x, n))
            .map_err(DecompError::failure(Site::BlockX, k))?;

            let tx = map_t.apply(&x);
            let neg_tx: Vec<F> = tx.iter().map(|u| -*u).collect();

            z = z_block.minimize(&CouplingTerm {
                map: &neg_eye,
                anchor: &neg_tx,
                multiplier: &lambda,
                rho: par.rho,
            })
            .and_then(|z| check_len(z, m))
            .map_err(DecompError::failure(Site::BlockZ, k))?;

            // dual ascent
            let err = vecops::sub(&tx, &z);
            vecops::axpy(-par.rho, &err, &mut lambda);

            let residual = vecops::norm(&err);
            residuals.push(residual);

            let converged = residual < par.tol;
            let timed_out = par.time_limit.map_or(false, |limit| start.elapsed() >= limit);

            if converged || timed_out || (par.log_period > 0 && k % par.log_period == 0) {
                log::debug!("{}: residual {:.3e}", k, residual);
            }
            else {
                log::trace!("{}: residual {:.3e}", k, residual);
            }
            log::trace!("{}: x {:?}", k, x);
            log::trace!("{}: z {:?}", k, z);

            if converged || timed_out {
                let termination = if converged {
                    log::info!("----- Converged");
                    Termination::Converged
                }
                else {
                    log::warn!("----- TimeLimit");
                    Termination::TimeLimit
                };

                return Ok(AdmmReport {
                    x,
                    z,
                    lambda,
                    iterations: k,
                    residual,
                    residuals,
                    termination,
                });
            }
        }

        log::warn!("----- ExcessIter");
        Err(DecompError::NonConvergence {
            iterations: par.max_iter,
            gap: residuals.last().and_then(|r| r.to_f64()).unwrap_or(f64::INFINITY),
        })
    }
}

fn check_len<F>(v: Vec<F>, len: usize) -> Result<Vec<F>, SolveError>
{
    if v.len() == len {
        Ok(v)
    }
    else {
        Err(SolveError::DimensionMismatch { expected: len, got: v.len() })
    }
}

//
