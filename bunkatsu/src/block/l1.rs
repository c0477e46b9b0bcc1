use num_traits::Float;
use bunkatsu_core::admm::{Block, CouplingTerm};
use bunkatsu_core::vecops::LinearMap;
use bunkatsu_core::SolveError;

/// \\(\ell_1\\)-norm block
///
/// Own objective \\(w \\|u\\|_1\\), minimized by soft thresholding.
/// Only a scaled-identity coupling map \\(M = s I,\ s \ne 0\\) is supported,
/// which is the case of the z-block.
#[derive(Debug, Clone)]
pub struct L1Block<F>
{
    dim: usize,
    weight: F,
}

impl<F: Float> L1Block<F>
{
    /// * `dim` is the dimension of \\(u\\).
    /// * `weight` is \\(w \ge 0\\).
    pub fn new(dim: usize, weight: F) -> Self
    {
        L1Block {
            dim,
            weight,
        }
    }
}

/// Proximal operator of \\(t |v|\\).
pub fn soft_threshold<F: Float>(v: F, t: F) -> F
{
    if v > t {
        v - t
    }
    else if v < -t {
        v + t
    }
    else {
        F::zero()
    }
}

impl<F: Float> Block<F> for L1Block<F>
{
    fn dim(&self) -> usize
    {
        self.dim
    }

    fn minimize(&self, term: &CouplingTerm<'_, F>) -> Result<Vec<F>, SolveError>
    {
        let scale = match term.map {
            LinearMap::ScaledIdentity { dim, scale } if *dim == self.dim && *scale != F::zero() => *scale,
            _ => return Err(SolveError::NotAvailable("L1Block needs a nonzero scaled-identity map".into())),
        };

        // per element: (rho s^2 / 2) u^2 + linear * u + w |u|
        let curv = term.rho * scale * scale;
        let t = self.weight / curv;

        Ok(term.linear().iter().map(|l| soft_threshold(-*l / curv, t)).collect())
    }
}
