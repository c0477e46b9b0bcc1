/*!
LP/QP subproblems for [`bunkatsu_core`] decomposition drivers, solved by [`totsu`].

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate provides:

* [`linprog::LinearProgram`] - a linear-program model implementing [`bunkatsu_core::Subproblem`],
  so that it can be plugged into [`bunkatsu_core::cuts::CuttingPlanes`] through
  [`linprog::LpFirstStage`] and [`linprog::LpSecondStage`].
* [`block`] - blocks for [`bunkatsu_core::admm::Admm`]:
  a closed-form least-squares block, an \\(\ell_1\\)-norm block and a QP block.

# Examples
## Two-stage newsvendor

Buy \\(x \le 150\\) units at unit cost 2, then sell \\(\min(x, d)\\) at unit price 5
for demand \\(d \in \lbrace 50, 100, 150 \rbrace\\) with probabilities \\(0.3, 0.4, 0.3\\).

```
use float_eq::assert_float_eq;
use bunkatsu::prelude::*;

// first stage: maximize -2x, 0 <= x <= 150
let mut first = LinearProgram::new(Sense::Max).par(|p| p.eps_acc = 1e-8);
let x = first.add_variable(1, Some(0.), Some(150.));
first.add_objective(&x, &[-2.]).unwrap();

// second stage: maximize 5y, 0 <= y <= u, y <= d, u fixed to x
let mut second = LinearProgram::new(Sense::Max).par(|p| p.eps_acc = 1e-8);
let y = second.add_variable(1, Some(0.), None);
let u = second.add_variable(1, None, None);
second.add_objective(&y, &[5.]).unwrap();
second.add_linear_constraint(
    &LinearExpr::new().term(y, vec![1.]).term(u, vec![-1.]), Relation::Le, 0.
).unwrap();
let demand = second.add_row(&LinearExpr::new().term(y, vec![1.]), Relation::Le, 0.).unwrap();

let first = LpFirstStage::new(first, x);
let second = LpSecondStage::new(second, u, |m: &mut LinearProgram, d: &f64| m.set_rhs(demand, *d));

let rslt = CuttingPlanes::new().par(|p| p.tol = 1e-4)
    .solve(&first, &second, &[50., 100., 150.], &[0.3, 0.4, 0.3], 1000.)
    .unwrap();

assert_float_eq!(rslt.outer_bound, 225., abs <= 0.1);
```
*/

pub mod linprog;
pub mod block;

/// Prelude
pub mod prelude
{
    pub use bunkatsu_core::prelude::*;
    pub use crate::linprog::{LinearProgram, LpParam, LpFirstStage, LpSecondStage, VarId, RowId};
    pub use crate::block::{LeastSquaresBlock, L1Block, QpBlock};
}
