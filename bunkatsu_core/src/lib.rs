/*!
Bunkatsu ([分割](http://www.decodeunicode.org/en/u+5206) in Japanese) means decomposition.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate for Rust provides **decomposition drivers** for structured convex optimization,
independent of the solver used for the subproblems:

* [`admm::Admm`] - alternating direction method of multipliers for
  \\(f(x) + g(z)\\) subject to \\(z = T x\\).
* [`cuts::CuttingPlanes`] - Kelley's cutting-planes method for two-stage stochastic programs,
  approximating the expected recourse function by supporting hyperplanes.

# General usage

1. Express the parts of your problem through the traits the drivers need:
   [`admm::Block`] for ADMM,
   [`cuts::FirstStage`] and [`cuts::SecondStage`] for cutting planes.
   Any model implementing [`Subproblem`] can be wrapped by
   [`cuts::ModelFirstStage`] and [`cuts::ModelSecondStage`].
1. Create a driver instance and optionally set its parameters.
1. Invoke `solve` to get a report, or a [`DecompError`].

The [`bunkatsu`](https://crates.io/crates/bunkatsu) crate provides
LP/QP subproblems solved by [`totsu`](https://crates.io/crates/totsu).

# Examples

Consensus of two quadratics \\(\\|x - 1\\|^2 / 2 + \\|z - 3\\|^2 / 2\\) subject to \\(z = x\\):

```
use bunkatsu_core::admm::{Admm, Block, CouplingTerm};
use bunkatsu_core::vecops::LinearMap;
use bunkatsu_core::SolveError;

struct Quad(f64);

impl Block<f64> for Quad
{
    fn dim(&self) -> usize { 1 }

    fn minimize(&self, term: &CouplingTerm<'_, f64>) -> Result<Vec<f64>, SolveError>
    {
        let h = term.quadratic();
        let q = term.linear();
        Ok(vec![(self.0 - q[0]) / (1. + h[(0, 0)])])
    }
}

//env_logger::init(); // Use any logger crate as `bunkatsu_core` uses `log` crate.

let rslt = Admm::new().par(|p| p.tol = 1e-8)
    .solve(&Quad(1.), &Quad(3.), &LinearMap::identity(1))
    .unwrap();

assert!((rslt.x[0] - 2.).abs() < 1e-6);
```
*/

pub mod vecops;

//

mod error;

pub use error::*;

//

mod subproblem;

pub use subproblem::*;

//

pub mod admm;
pub mod cuts;

/// How a driver finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination
{
    /// The tolerance was met.
    Converged,
    /// The wall-clock limit was hit first; the report holds the last iterate.
    TimeLimit,
}

/// Prelude
pub mod prelude
{
    pub use crate::admm::{Admm, AdmmParam, Block, CouplingTerm};
    pub use crate::cuts::{CuttingPlanes, CuttingPlanesParam, FirstStage, SecondStage, MasterProblem};
    pub use crate::cuts::{Cut, Recourse, ModelFirstStage, ModelSecondStage, RecourseFn};
    pub use crate::vecops::{DenseMat, LinearMap};
    pub use crate::{DecompError, SolveError, Sense, Relation, LinearExpr, Subproblem, Termination};
}
