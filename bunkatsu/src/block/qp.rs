use totsu::prelude::*;
use totsu::{MatBuild, ProbQP};
use bunkatsu_core::admm::{Block, CouplingTerm};
use bunkatsu_core::vecops::DenseMat;
use bunkatsu_core::SolveError;
use crate::linprog::{LpParam, solve_error};

type La = FloatGeneric<f64>;
type AMatBuild = MatBuild<La>;
type AProbQP = ProbQP<La>;
type ASolver = Solver<La>;

//

/// Quadratic-program block
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Own objective
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & {1 \over 2} u^T P u + q^T u \\\\
/// {\rm subject \ to} & G u \preceq h \\\\
/// & A u = b,
/// \end{array}
/// \\]
/// minimized with the coupling term by [`totsu::ProbQP`]
/// after folding \\(\rho M^T M\\) into \\(P\\) and \\(-M^T(\rho a + \lambda)\\) into \\(q\\).
#[derive(Debug, Clone)]
pub struct QpBlock
{
    sym_p: DenseMat<f64>,
    vec_q: Vec<f64>,
    mat_g: DenseMat<f64>,
    vec_h: Vec<f64>,
    mat_a: DenseMat<f64>,
    vec_b: Vec<f64>,
    /// solver parameters.
    pub par: LpParam,
}

impl QpBlock
{
    /// Creates an unconstrained block.
    ///
    /// * `sym_p` is \\(P\\), symmetric positive semidefinite.
    /// * `vec_q` is \\(q\\).
    pub fn new(sym_p: DenseMat<f64>, vec_q: Vec<f64>) -> Result<Self, SolveError>
    {
        let n = vec_q.len();
        if sym_p.size() != (n, n) {
            return Err(SolveError::DimensionMismatch { expected: n, got: sym_p.size().0 });
        }

        Ok(QpBlock {
            sym_p,
            vec_q,
            mat_g: DenseMat::zeros(0, n),
            vec_h: Vec::new(),
            mat_a: DenseMat::zeros(0, n),
            vec_b: Vec::new(),
            par: LpParam::default(),
        })
    }

    /// Builder setting \\(G u \preceq h\\).
    pub fn ineq(mut self, mat_g: DenseMat<f64>, vec_h: Vec<f64>) -> Result<Self, SolveError>
    {
        self.check_rows(&mat_g, &vec_h)?;
        self.mat_g = mat_g;
        self.vec_h = vec_h;
        Ok(self)
    }

    /// Builder setting \\(A u = b\\).
    pub fn eq(mut self, mat_a: DenseMat<f64>, vec_b: Vec<f64>) -> Result<Self, SolveError>
    {
        self.check_rows(&mat_a, &vec_b)?;
        self.mat_a = mat_a;
        self.vec_b = vec_b;
        Ok(self)
    }

    /// Changes solver parameters.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut LpParam)
    {
        f(&mut self.par);
        self
    }

    fn check_rows(&self, mat: &DenseMat<f64>, vec: &[f64]) -> Result<(), SolveError>
    {
        let n = self.vec_q.len();
        let (nr, nc) = mat.size();
        if nc != n {
            Err(SolveError::DimensionMismatch { expected: n, got: nc })
        }
        else if vec.len() != nr {
            Err(SolveError::DimensionMismatch { expected: nr, got: vec.len() })
        }
        else {
            Ok(())
        }
    }
}

fn to_matbuild(mat: &DenseMat<f64>) -> AMatBuild
{
    let (nr, nc) = mat.size();
    AMatBuild::new(MatType::General(nr, nc)).by_fn(|r, c| mat[(r, c)])
}

fn to_colvec(vec: &[f64]) -> AMatBuild
{
    AMatBuild::new(MatType::General(vec.len(), 1)).iter_colmaj(vec)
}

impl Block<f64> for QpBlock
{
    fn dim(&self) -> usize
    {
        self.vec_q.len()
    }

    fn minimize(&self, term: &CouplingTerm<'_, f64>) -> Result<Vec<f64>, SolveError>
    {
        let n = self.dim();
        let quad = term.quadratic();
        let lin = term.linear();

        let sym_p = AMatBuild::new(MatType::SymPack(n))
            .by_fn(|r, c| self.sym_p[(r, c)] + quad[(r, c)]);
        let vec_q = AMatBuild::new(MatType::General(n, 1))
            .by_fn(|r, _| self.vec_q[r] + lin[r]);

        let par = &self.par;
        let s = ASolver::new().par(|p| {
            p.eps_acc = par.eps_acc;
            p.max_iter = par.max_iter;
            p.log_period = par.log_period;
        });

        let mut qp = AProbQP::new(
            sym_p, vec_q,
            to_matbuild(&self.mat_g), to_colvec(&self.vec_h),
            to_matbuild(&self.mat_a), to_colvec(&self.vec_b),
            s.par.eps_zero
        );
        let rslt = s.solve(qp.problem()).map_err(solve_error)?;

        Ok(rslt.0[0.. n].to_vec())
    }
}
