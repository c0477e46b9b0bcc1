//! Linear-program subproblem model

use totsu::prelude::*;
use totsu::{MatBuild, ProbLP};
use bunkatsu_core::{Subproblem, SolveError, Sense, Relation, LinearExpr};
use bunkatsu_core::cuts::{ModelFirstStage, ModelSecondStage};

type La = FloatGeneric<f64>;
type AMatBuild = MatBuild<La>;
type AProbLP = ProbLP<La>;
type ASolver = Solver<La>;

//

/// Group of consecutive variables of a [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarId
{
    start: usize,
    len: usize,
}

impl VarId
{
    pub fn len(&self) -> usize
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }
}

/// Constraint row of a [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowId(usize);

/// Parameters forwarded to totsu [`SolverParam`].
#[derive(Debug, Clone, PartialEq)]
pub struct LpParam
{
    /// Tolerance of the primal residual, dual residual and duality gap.
    pub eps_acc: f64,
    /// Max iteration number of the first-order algorithm. `None` means no upper limit.
    pub max_iter: Option<usize>,
    /// Period of iterations to output progress log.
    pub log_period: usize,
    /// Tolerance of constraints left without any free variable once fixed values are substituted.
    pub eps_feas: f64,
}

impl Default for LpParam
{
    fn default() -> Self
    {
        LpParam {
            eps_acc: 1e-6,
            max_iter: Some(1_000_000),
            log_period: 10_000,
            eps_feas: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
struct Column
{
    lower: Option<f64>,
    upper: Option<f64>,
    cost: f64,
    fixed: Option<f64>,
}

#[derive(Debug, Clone)]
struct Row
{
    coefs: Vec<(usize, f64)>,
    relation: Relation,
    rhs: f64,
}

#[derive(Debug, Clone)]
struct Solution
{
    objective: f64,
    x: Vec<f64>,
    // d(objective)/d(value) of each column, if fixed
    sens: Vec<Option<f64>>,
}

/// Standard-form data with the fixed columns substituted out.
struct StandardForm
{
    /// `None` if every column is fixed.
    lp: Option<AProbLP>,
    /// Model column of each standard-form column.
    free: Vec<usize>,
    /// Row of the dual vector, fixed column and its coefficient in that row.
    fixed_coefs: Vec<(usize, usize, f64)>,
}

/// Linear program
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// \begin{array}{ll}
/// {\rm optimize} & c^T x + c_0 \\\\
/// {\rm subject \ to} & l \le x \le u \\\\
/// & g_i^T x \ (\le, \ge, =) \ h_i \\\\
/// & x_j = v_j \quad (\text{fixed } j)
/// \end{array}
/// \\]
///
/// built incrementally and solved by [`totsu::ProbLP`].
/// A maximization is solved as the minimization of \\(-c^T x\\).
/// Fixed columns are substituted into the right-hand sides and do not reach the solver,
/// and neither do their bounds;
/// bounds of free columns and \\(\le, \ge\\) rows become rows of \\(G x \le h\\),
/// equality rows become rows of \\(A x = b\\).
/// A row with no free column left is checked against [`LpParam::eps_feas`] instead.
#[derive(Debug, Clone)]
pub struct LinearProgram
{
    sense: Sense,
    cols: Vec<Column>,
    rows: Vec<Row>,
    constant: f64,
    /// solver parameters.
    pub par: LpParam,
    solution: Option<Solution>,
}

impl LinearProgram
{
    /// Creates an empty model.
    pub fn new(sense: Sense) -> Self
    {
        LinearProgram {
            sense,
            cols: Vec::new(),
            rows: Vec::new(),
            constant: 0.,
            par: LpParam::default(),
            solution: None,
        }
    }

    /// Changes solver parameters.
    ///
    /// Returns [`LinearProgram`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut LpParam)
    {
        f(&mut self.par);
        self
    }

    /// Number of scalar variables.
    pub fn num_vars(&self) -> usize
    {
        self.cols.len()
    }

    /// Number of constraint rows, excluding bounds and fixings.
    pub fn num_rows(&self) -> usize
    {
        self.rows.len()
    }

    /// Appends a linear constraint.
    ///
    /// Returns the handle to change the row later.
    pub fn add_row(&mut self, expr: &LinearExpr<VarId, f64>, relation: Relation, rhs: f64) -> Result<RowId, SolveError>
    {
        let mut coefs = Vec::new();
        for (var, c) in &expr.terms {
            self.check_var(var)?;
            check_len(var.len, c.len())?;
            coefs.extend(c.iter().enumerate().map(|(i, c)| (var.start + i, *c)));
        }

        self.solution = None;
        self.rows.push(Row {
            coefs,
            relation,
            rhs,
        });
        Ok(RowId(self.rows.len() - 1))
    }

    /// Replaces the right-hand side of `row`.
    pub fn set_rhs(&mut self, row: RowId, rhs: f64) -> Result<(), SolveError>
    {
        let r = self.row_mut(row)?;
        r.rhs = rhs;
        self.solution = None;
        Ok(())
    }

    /// Replaces the coefficients of `var` in `row`.
    pub fn set_coefs(&mut self, row: RowId, var: &VarId, coefs: &[f64]) -> Result<(), SolveError>
    {
        self.check_var(var)?;
        check_len(var.len, coefs.len())?;

        let r = self.row_mut(row)?;
        r.coefs.retain(|(j, _)| *j < var.start || *j >= var.start + var.len);
        r.coefs.extend(coefs.iter().enumerate().map(|(i, c)| (var.start + i, *c)));
        self.solution = None;
        Ok(())
    }

    /// Replaces the objective coefficients of `var`.
    pub fn set_costs(&mut self, var: &VarId, coefs: &[f64]) -> Result<(), SolveError>
    {
        self.check_var(var)?;
        check_len(var.len, coefs.len())?;

        for (col, c) in self.cols[var.start..var.start + var.len].iter_mut().zip(coefs) {
            col.cost = *c;
        }
        self.solution = None;
        Ok(())
    }

    /// Adds a constant to the objective.
    pub fn add_constant(&mut self, c: f64)
    {
        self.constant += c;
        self.solution = None;
    }

    /// Releases the fixings of `var`.
    pub fn unfix(&mut self, var: &VarId) -> Result<(), SolveError>
    {
        self.check_var(var)?;

        for col in &mut self.cols[var.start..var.start + var.len] {
            col.fixed = None;
        }
        self.solution = None;
        Ok(())
    }

    /// Optimal objective value found by the last solve.
    pub fn objective(&self) -> Result<f64, SolveError>
    {
        self.solution().map(|s| s.objective)
    }

    fn check_var(&self, var: &VarId) -> Result<(), SolveError>
    {
        if var.start + var.len > self.cols.len() {
            Err(SolveError::Failure(format!("variable {:?} does not belong to this model", var)))
        }
        else {
            Ok(())
        }
    }

    fn row_mut(&mut self, row: RowId) -> Result<&mut Row, SolveError>
    {
        self.rows.get_mut(row.0)
            .ok_or_else(|| SolveError::Failure(format!("row {:?} does not belong to this model", row)))
    }

    fn solution(&self) -> Result<&Solution, SolveError>
    {
        self.solution.as_ref()
            .ok_or_else(|| SolveError::NotAvailable("model is not solved".into()))
    }

    /// Builds the standard-form data.
    ///
    /// Fails with [`SolveError::Infeasible`]
    /// if a row without free columns is violated by the fixed values.
    fn standard_form(&self) -> Result<StandardForm, SolveError>
    {
        let sign = self.sense.sign::<f64>();
        let free: Vec<usize> = (0.. self.cols.len())
            .filter(|j| self.cols[*j].fixed.is_none())
            .collect();
        let mut pos = vec![None; self.cols.len()];
        for (k, j) in free.iter().enumerate() {
            pos[*j] = Some(k);
        }

        // G x <= h
        let mut g_rows: Vec<(Vec<(usize, f64)>, f64)> = Vec::new();
        for (j, col) in self.cols.iter().enumerate() {
            if col.fixed.is_some() {
                continue;
            }
            if let Some(l) = col.lower {
                g_rows.push((vec![(j, -1.)], -l));
            }
            if let Some(u) = col.upper {
                g_rows.push((vec![(j, 1.)], u));
            }
        }
        // A x = b
        let mut a_rows: Vec<(Vec<(usize, f64)>, f64)> = Vec::new();
        for row in &self.rows {
            match row.relation {
                Relation::Le => g_rows.push((row.coefs.clone(), row.rhs)),
                Relation::Ge => g_rows.push((row.coefs.iter().map(|(j, c)| (*j, -c)).collect(), -row.rhs)),
                Relation::Eq => a_rows.push((row.coefs.clone(), row.rhs)),
            }
        }

        let g_rows = self.substitute(g_rows, Relation::Le)?;
        let a_rows = self.substitute(a_rows, Relation::Eq)?;

        let m = g_rows.len();
        let mut fixed_coefs = Vec::new();
        for (r, (_, fixed, _)) in g_rows.iter().chain(&a_rows).enumerate() {
            fixed_coefs.extend(fixed.iter().map(|(j, c)| (r, *j, *c)));
        }

        if free.is_empty() {
            return Ok(StandardForm {
                lp: None,
                free,
                fixed_coefs,
            });
        }

        let n = free.len();
        let p = a_rows.len();

        let vec_c = AMatBuild::new(MatType::General(n, 1))
            .by_fn(|k, _| sign * self.cols[free[k]].cost);

        let mut mat_g = AMatBuild::new(MatType::General(m, n));
        let mut vec_h = AMatBuild::new(MatType::General(m, 1));
        for (r, (coefs, _, h)) in g_rows.iter().enumerate() {
            for (j, v) in coefs {
                if let Some(k) = pos[*j] {
                    mat_g[(r, k)] += v;
                }
            }
            vec_h[(r, 0)] = *h;
        }

        let mut mat_a = AMatBuild::new(MatType::General(p, n));
        let mut vec_b = AMatBuild::new(MatType::General(p, 1));
        for (r, (coefs, _, b)) in a_rows.iter().enumerate() {
            for (j, v) in coefs {
                if let Some(k) = pos[*j] {
                    mat_a[(r, k)] += v;
                }
            }
            vec_b[(r, 0)] = *b;
        }

        Ok(StandardForm {
            lp: Some(AProbLP::new(vec_c, mat_g, vec_h, mat_a, vec_b)),
            free,
            fixed_coefs,
        })
    }

    /// Moves the fixed terms of `rows` to the right-hand side.
    ///
    /// Returns the rows that still have a free column,
    /// each as its free terms, its fixed terms and the new right-hand side.
    fn substitute(&self, rows: Vec<(Vec<(usize, f64)>, f64)>, relation: Relation)
    -> Result<Vec<(Vec<(usize, f64)>, Vec<(usize, f64)>, f64)>, SolveError>
    {
        let mut kept = Vec::with_capacity(rows.len());
        for (coefs, rhs) in rows {
            let (fixed, free): (Vec<_>, Vec<_>) = coefs.into_iter()
                .partition(|(j, _)| self.cols[*j].fixed.is_some());
            let rhs = fixed.iter()
                .fold(rhs, |acc, (j, c)| acc - c * self.cols[*j].fixed.unwrap_or(0.));

            if free.iter().any(|(_, c)| *c != 0.) {
                kept.push((free, fixed, rhs));
                continue;
            }

            let tol = self.par.eps_feas * (1. + rhs.abs());
            let violated = match relation {
                Relation::Le => rhs < -tol,
                _ => rhs.abs() > tol,
            };
            if violated {
                log::debug!("row left with fixed columns only is violated by {:.3e}", rhs);
                return Err(SolveError::Infeasible);
            }
        }
        Ok(kept)
    }
}

fn check_len(expected: usize, got: usize) -> Result<(), SolveError>
{
    if expected == got {
        Ok(())
    }
    else {
        Err(SolveError::DimensionMismatch { expected, got })
    }
}

/// Maps an error of totsu to [`SolveError`].
pub fn solve_error(e: SolverError) -> SolveError
{
    match e {
        SolverError::Infeasible => SolveError::Infeasible,
        SolverError::Unbounded => SolveError::Unbounded,
        other => SolveError::Failure(other.to_string()),
    }
}

impl Subproblem<f64> for LinearProgram
{
    type Var = VarId;

    fn sense(&self) -> Sense
    {
        self.sense
    }

    fn add_variable(&mut self, len: usize, lower: Option<f64>, upper: Option<f64>) -> VarId
    {
        let var = VarId {
            start: self.cols.len(),
            len,
        };
        self.cols.extend((0.. len).map(|_| Column {
            lower,
            upper,
            cost: 0.,
            fixed: None,
        }));
        self.solution = None;
        var
    }

    fn len(&self, var: &VarId) -> usize
    {
        var.len
    }

    fn add_objective(&mut self, var: &VarId, coefs: &[f64]) -> Result<(), SolveError>
    {
        self.check_var(var)?;
        check_len(var.len, coefs.len())?;

        for (col, c) in self.cols[var.start..var.start + var.len].iter_mut().zip(coefs) {
            col.cost += c;
        }
        self.solution = None;
        Ok(())
    }

    fn add_linear_constraint(&mut self, expr: &LinearExpr<VarId, f64>, relation: Relation, rhs: f64) -> Result<(), SolveError>
    {
        self.add_row(expr, relation, rhs).map(|_| ())
    }

    fn fix(&mut self, var: &VarId, values: &[f64]) -> Result<(), SolveError>
    {
        self.check_var(var)?;
        check_len(var.len, values.len())?;

        for (col, v) in self.cols[var.start..var.start + var.len].iter_mut().zip(values) {
            col.fixed = Some(*v);
        }
        self.solution = None;
        Ok(())
    }

    fn solve(&mut self) -> Result<f64, SolveError>
    {
        let sign = self.sense.sign::<f64>();
        let sf = self.standard_form()?;

        let mut x: Vec<f64> = self.cols.iter()
            .map(|col| col.fixed.unwrap_or(0.))
            .collect();
        // the fixed value enters the objective directly and every row through the right-hand side
        let mut sens: Vec<Option<f64>> = self.cols.iter()
            .map(|col| col.fixed.map(|_| col.cost))
            .collect();

        if let Some(mut lp) = sf.lp {
            let par = &self.par;
            let s = ASolver::new().par(|p| {
                p.eps_acc = par.eps_acc;
                p.max_iter = par.max_iter;
                p.log_period = par.log_period;
            });

            let (x_free, y) = s.solve(lp.problem()).map_err(solve_error)?;
            for (k, j) in sf.free.iter().enumerate() {
                x[*j] = x_free[k];
            }
            // totsu minimizes with G x + s = h and dual y, so d(obj)/d(h) = -y
            for (r, j, c) in &sf.fixed_coefs {
                if let Some(d) = sens[*j].as_mut() {
                    *d += sign * y[*r] * c;
                }
            }
        }
        else {
            log::debug!("every column is fixed");
        }

        let objective = self.cols.iter().zip(&x)
            .fold(self.constant, |acc, (col, x)| acc + col.cost * x);

        log::debug!("LP objective {:.6e}", objective);
        log::trace!("LP x {:?}", x);

        self.solution = Some(Solution {
            objective,
            x,
            sens,
        });
        Ok(objective)
    }

    fn values(&self, var: &VarId) -> Result<Vec<f64>, SolveError>
    {
        self.check_var(var)?;
        let sol = self.solution()?;

        Ok(sol.x[var.start..var.start + var.len].to_vec())
    }

    fn sensitivity(&self, var: &VarId) -> Result<Vec<f64>, SolveError>
    {
        self.check_var(var)?;
        let sol = self.solution()?;

        sol.sens[var.start..var.start + var.len].iter()
            .map(|d| d.ok_or_else(|| SolveError::NotAvailable(format!("variable {:?} is not fixed", var))))
            .collect()
    }
}

//

/// First stage over a [`LinearProgram`].
pub type LpFirstStage = ModelFirstStage<f64, LinearProgram>;

/// Second stage over a [`LinearProgram`] with scenario callback `G`.
pub type LpSecondStage<S, G> = ModelSecondStage<f64, LinearProgram, S, G>;

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use super::*;

    #[test]
    fn test_standard_form_substitution()
    {
        let mut lp = LinearProgram::new(Sense::Max);
        let x = lp.add_variable(2, Some(0.), None);
        let w = lp.add_variable(1, Some(0.), Some(1.));
        lp.add_row(&LinearExpr::new().term(x, vec![1., 1.]), Relation::Ge, 1.).unwrap();
        lp.add_row(&LinearExpr::new().term(x, vec![1., -1.]).term(w, vec![2.]), Relation::Eq, 0.).unwrap();
        lp.fix(&x, &[0.5, 0.5]).unwrap();

        let sf = lp.standard_form().unwrap();
        assert!(sf.lp.is_some());
        assert_eq!(sf.free, vec![2]);
        // two bound rows of w, then the equality row; the >= row has no free column left
        assert_eq!(sf.fixed_coefs, vec![(2, 0, 1.), (2, 1, -1.)]);

        lp.fix(&x, &[0.4, 0.5]).unwrap();
        assert_eq!(lp.standard_form().err(), Some(SolveError::Infeasible));
    }

    #[test]
    fn test_all_fixed()
    {
        // maximize 2 x0 - x1 + 1 subject to x0 + x1 <= 3, fixed to (1, 1)
        let mut lp = LinearProgram::new(Sense::Max);
        let x = lp.add_variable(2, None, None);
        lp.add_objective(&x, &[2., -1.]).unwrap();
        lp.add_constant(1.);
        lp.add_row(&LinearExpr::new().term(x, vec![1., 1.]), Relation::Le, 3.).unwrap();
        lp.fix(&x, &[1., 1.]).unwrap();

        assert_eq!(lp.solve(), Ok(2.));
        assert_eq!(lp.sensitivity(&x), Ok(vec![2., -1.]));

        lp.fix(&x, &[2., 2.]).unwrap();
        assert_eq!(lp.solve(), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_not_solved()
    {
        let mut lp = LinearProgram::new(Sense::Min);
        let x = lp.add_variable(1, None, None);

        assert!(matches!(lp.values(&x), Err(SolveError::NotAvailable(_))));
        assert!(matches!(lp.objective(), Err(SolveError::NotAvailable(_))));
        assert_eq!(lp.fix(&x, &[1., 2.]), Err(SolveError::DimensionMismatch { expected: 1, got: 2 }));
    }

    #[test]
    fn test_edit_row()
    {
        let _ = env_logger::builder().is_test(true).try_init();

        // min x s.t. 2x >= 4
        let mut lp = LinearProgram::new(Sense::Min).par(|p| p.eps_acc = 1e-9);
        let x = lp.add_variable(1, None, None);
        lp.add_objective(&x, &[1.]).unwrap();
        let row = lp.add_row(&LinearExpr::new().term(x, vec![2.]), Relation::Ge, 4.).unwrap();

        assert_float_eq!(lp.solve().unwrap(), 2., abs <= 1e-4);

        lp.set_rhs(row, 6.).unwrap();
        lp.set_coefs(row, &x, &[1.]).unwrap();
        assert!(lp.values(&x).is_err());
        assert_float_eq!(lp.solve().unwrap(), 6., abs <= 1e-4);
    }
}
