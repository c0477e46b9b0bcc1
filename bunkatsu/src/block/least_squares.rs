use num_traits::Float;
use bunkatsu_core::admm::{Block, CouplingTerm};
use bunkatsu_core::vecops::{self, DenseMat};
use bunkatsu_core::SolveError;

/// Least-squares block
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Own objective \\(\\|A u - b\\|_2^2\\), minimized with the coupling term in closed form:
/// \\[
/// (2 A^T A + \rho M^T M) u = 2 A^T b + M^T (\rho a + \lambda).
/// \\]
#[derive(Debug, Clone)]
pub struct LeastSquaresBlock<F>
{
    ata2: DenseMat<F>,
    atb2: Vec<F>,
}

impl<F: Float> LeastSquaresBlock<F>
{
    /// Creates a block with given data.
    ///
    /// Returns `Err` if the length of `vec_b` differs from the number of rows of `mat_a`.
    pub fn new(mat_a: &DenseMat<F>, vec_b: &[F]) -> Result<Self, SolveError>
    {
        let (m, _) = mat_a.size();
        if vec_b.len() != m {
            return Err(SolveError::DimensionMismatch { expected: m, got: vec_b.len() });
        }

        let two = F::one() + F::one();
        let ata = mat_a.gram();
        let (n, _) = ata.size();

        Ok(LeastSquaresBlock {
            ata2: DenseMat::zeros(n, n).by_fn(|r, c| two * ata[(r, c)]),
            atb2: mat_a.trans_mul_vec(vec_b).into_iter().map(|v| two * v).collect(),
        })
    }
}

impl<F: Float> Block<F> for LeastSquaresBlock<F>
{
    fn dim(&self) -> usize
    {
        self.atb2.len()
    }

    fn minimize(&self, term: &CouplingTerm<'_, F>) -> Result<Vec<F>, SolveError>
    {
        let quad = term.quadratic();
        let n = self.dim();
        let h = DenseMat::zeros(n, n).by_fn(|r, c| self.ata2[(r, c)] + quad[(r, c)]);

        let mut g = self.atb2.clone();
        vecops::axpy(-F::one(), &term.linear(), &mut g);

        vecops::cholesky_solve(&h, &g)
            .ok_or_else(|| SolveError::Failure("normal equation is not positive definite".into()))
    }
}
