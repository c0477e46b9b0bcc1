//! Kelley's cutting-planes method for two-stage programs

use num_traits::Float;
use core::fmt::{Debug, LowerExp};
use std::time::{Duration, Instant};
use crate::vecops;
use crate::{DecompError, Site, SolveError, Sense, Termination};

mod cut;
mod stage;

pub use cut::*;
pub use stage::*;

//

/// Cutting-planes parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingPlanesParam<F: Float>
{
    /// Max number of outer iterations.
    pub max_iter: usize,
    /// Relative and absolute tolerance between the inner and outer bounds.
    pub tol: F,
    /// Evaluates scenarios on the rayon thread pool (needs `parallel` feature).
    pub parallel: bool,
    /// Wall-clock limit. `None` means no limit.
    pub time_limit: Option<Duration>,
}

impl<F: Float> Default for CuttingPlanesParam<F>
{
    fn default() -> Self
    {
        let ten = F::from(10).unwrap_or_else(F::one);

        CuttingPlanesParam {
            max_iter: 100,
            tol: ten.powi(-6),
            parallel: true,
            time_limit: None,
        }
    }
}

/// Bounds of one outer iteration.
#[derive(Debug, Clone)]
pub struct TraceEntry<F>
{
    pub iteration: usize,
    /// True objective at the trial point.
    pub inner_bound: F,
    /// Objective of the approximation.
    pub outer_bound: F,
    /// Trial point.
    pub x: Vec<F>,
}

/// Result of [`CuttingPlanes::solve`].
#[derive(Debug, Clone)]
pub struct CuttingPlanesReport<F>
{
    pub inner_bound: F,
    pub outer_bound: F,
    /// Last trial point.
    pub x: Vec<F>,
    pub iterations: usize,
    pub trace: Vec<TraceEntry<F>>,
    /// Cuts in the order they were added.
    pub cuts: Vec<Cut<F>>,
    pub termination: Termination,
}

/// Cutting-planes driver.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Solves a two-stage program
/// \\[
/// \begin{array}{ll}
/// {\rm optimize} & \mathrm{own}(x) + \sum_\omega w_\omega V_\omega(x)
/// \end{array}
/// \\]
/// over the first-stage feasible set,
/// where the recourse function \\(V_\omega\\) is convex when minimizing and concave when maximizing.
/// \\(\sum_\omega w_\omega V_\omega\\) is approximated from the optimistic side
/// by the supporting hyperplanes collected so far.
pub struct CuttingPlanes<F: Float>
{
    /// driver parameters.
    pub par: CuttingPlanesParam<F>,
}

impl<F: Float> CuttingPlanes<F>
{
    /// Creates an instance with default parameters.
    pub fn new() -> Self
    {
        CuttingPlanes {
            par: CuttingPlanesParam::default(),
        }
    }

    /// Changes driver parameters.
    ///
    /// Returns [`CuttingPlanes`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut CuttingPlanesParam<F>)
    {
        f(&mut self.par);
        self
    }
}

impl<F: Float> Default for CuttingPlanes<F>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<F> CuttingPlanes<F>
where F: Float + Debug + LowerExp + Send + Sync
{
    /// Runs the cutting-planes method.
    ///
    /// Returns `Ok` with [`CuttingPlanesReport`] when the bounds meet or the time limit is hit,
    /// `Err` with [`DecompError`] otherwise.
    /// * `first` is the first-stage problem; it is not modified.
    /// * `second` is the second-stage problem.
    /// * `scenarios` and `weights` are the scenarios and their probabilities.
    ///   The weights should sum up to one, which is not enforced.
    /// * `initial_bound` bounds \\(\theta\\) before any cut exists.
    ///   It shall be an optimistic bound on the expected recourse value
    ///   (an upper bound when maximizing, a lower bound when minimizing);
    ///   a wrong-side bound silently yields a wrong result.
    pub fn solve<P, Q>(&self,
        first: &P, second: &Q,
        scenarios: &[Q::Scenario], weights: &[F],
        initial_bound: F
    ) -> Result<CuttingPlanesReport<F>, DecompError>
    where P: FirstStage<F>, Q: SecondStage<F>
    {
        let par = &self.par;
        let sense = first.sense();
        let dim = first.dim();

        if scenarios.is_empty() {
            return Err(DecompError::InvalidInput("no scenario".into()));
        }
        if scenarios.len() != weights.len() {
            return Err(DecompError::InvalidInput(format!(
                "{} scenarios but {} weights", scenarios.len(), weights.len()
            )));
        }
        if !initial_bound.is_finite() {
            return Err(DecompError::InvalidInput(format!("initial bound must be finite: {:?}", initial_bound)));
        }
        if par.tol.is_nan() {
            return Err(DecompError::InvalidInput("tol is NaN".into()));
        }

        let total = vecops::weighted_sum(weights, &vec![F::one(); weights.len()]);
        if !vecops::is_close(total, F::one(), par.tol.max(F::epsilon()), F::epsilon()) {
            log::warn!("weights sum up to {:?}", total);
        }

        log::debug!("{:?}", par);

        if par.max_iter == 0 {
            log::warn!("----- ExcessIter");
            return Err(DecompError::NonConvergence { iterations: 0, gap: f64::INFINITY });
        }

        let mut master = first.augment(initial_bound)
            .map_err(DecompError::failure(Site::FirstStage, 0))?;

        let mut trace: Vec<TraceEntry<F>> = Vec::new();
        let mut cuts = Vec::new();

        log::info!("----- Started");
        let start = Instant::now();
        for k in 1..= par.max_iter {
            let sol = master.solve()
                .and_then(|sol| if sol.x.len() == dim {
                    Ok(sol)
                }
                else {
                    Err(SolveError::DimensionMismatch { expected: dim, got: sol.x.len() })
                })
                .map_err(DecompError::failure(Site::FirstStage, k))?;
            let outer_bound = sol.objective;

            if let Some(prev) = trace.last() {
                if !outer_bound_monotone(sense, prev.outer_bound, outer_bound, par.tol) {
                    log::warn!("{}: outer bound improved from {:.6e} to {:.6e} after a cut", k, prev.outer_bound, outer_bound);
                }
            }

            let evals = self.evaluate_scenarios(second, scenarios, &sol.x, dim)
                .map_err(|(i, e)| DecompError::failure(Site::Scenario(i), k)(e))?;
            let recourse = aggregate(weights, &evals)
                .map_err(DecompError::failure(Site::FirstStage, k))?;

            let inner_bound = sol.own_cost + recourse.value;

            if k == 1 && sense.better(inner_bound, outer_bound)
            && !vecops::is_close(inner_bound, outer_bound, par.tol, par.tol) {
                log::warn!("inner bound {:.6e} beats outer bound {:.6e}: initial bound is not optimistic", inner_bound, outer_bound);
            }

            log::debug!("{}: inner {:.6e} outer {:.6e}", k, inner_bound, outer_bound);
            log::trace!("{}: x {:?} theta {:?}", k, sol.x, sol.theta);

            let converged = vecops::is_close(inner_bound, outer_bound, par.tol, par.tol);
            let timed_out = par.time_limit.map_or(false, |limit| start.elapsed() >= limit);

            trace.push(TraceEntry {
                iteration: k,
                inner_bound,
                outer_bound,
                x: sol.x.clone(),
            });

            if converged || timed_out {
                let termination = if converged {
                    log::info!("----- Converged");
                    Termination::Converged
                }
                else {
                    log::warn!("----- TimeLimit");
                    Termination::TimeLimit
                };

                return Ok(CuttingPlanesReport {
                    inner_bound,
                    outer_bound,
                    x: sol.x,
                    iterations: k,
                    trace,
                    cuts,
                    termination,
                });
            }

            let cut = Cut::new(recourse, sol.x)
                .and_then(|cut| master.add_cut(&cut).map(|_| cut))
                .map_err(DecompError::failure(Site::FirstStage, k))?;
            cuts.push(cut);
        }

        log::warn!("----- ExcessIter");
        let gap = trace.last()
            .and_then(|t| (t.outer_bound - t.inner_bound).abs().to_f64())
            .unwrap_or(f64::INFINITY);

        Err(DecompError::NonConvergence {
            iterations: par.max_iter,
            gap,
        })
    }

    fn evaluate_scenarios<Q>(&self, second: &Q, scenarios: &[Q::Scenario], x: &[F], dim: usize)
    -> Result<Vec<Recourse<F>>, (usize, SolveError)>
    where Q: SecondStage<F>
    {
        let eval = |(i, scenario): (usize, &Q::Scenario)| {
            second.evaluate(scenario, x)
                .and_then(|r| if r.sensitivity.len() == dim {
                    Ok(r)
                }
                else {
                    Err(SolveError::DimensionMismatch { expected: dim, got: r.sensitivity.len() })
                })
                .map_err(|e| (i, e))
        };

        #[cfg(feature = "parallel")]
        if self.par.parallel && scenarios.len() > 1 {
            use rayon::prelude::*;

            // every scenario is evaluated, so the lowest failing index is reported
            let evals: Vec<_> = scenarios.par_iter().enumerate().map(eval).collect();
            return evals.into_iter().collect();
        }

        scenarios.iter().enumerate().map(eval).collect()
    }
}

/// Direction in which the outer bound moves as cuts accumulate.
///
/// Returns `true` if `later` is no better than `earlier` up to `tol`.
pub fn outer_bound_monotone<F: Float>(sense: Sense, earlier: F, later: F, tol: F) -> bool
{
    !sense.better(later, earlier) || vecops::is_close(later, earlier, tol, tol)
}
