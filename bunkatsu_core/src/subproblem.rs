//! Capability set of a subproblem model

use num_traits::Float;
use crate::SolveError;

/// Objective sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense
{
    Min,
    Max,
}

impl Sense
{
    /// `1` for [`Sense::Min`], `-1` for [`Sense::Max`].
    ///
    /// Multiplying an objective by this turns it into a minimization.
    pub fn sign<F: Float>(self) -> F
    {
        match self {
            Sense::Min => F::one(),
            Sense::Max => -F::one(),
        }
    }

    /// Returns `true` if `a` is strictly better than `b` in this sense.
    pub fn better<F: Float>(self, a: F, b: F) -> bool
    {
        match self {
            Sense::Min => a < b,
            Sense::Max => a > b,
        }
    }
}

/// Relation of a linear constraint `expr (relation) rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation
{
    Le,
    Ge,
    Eq,
}

/// Linear expression \\(\sum_k c_k^T v_k\\) over variable groups \\(v_k\\).
#[derive(Debug, Clone)]
pub struct LinearExpr<V, F>
{
    pub terms: Vec<(V, Vec<F>)>,
}

impl<V, F> LinearExpr<V, F>
{
    pub fn new() -> Self
    {
        LinearExpr {
            terms: Vec::new(),
        }
    }

    /// Builder adding a term \\(c^T v\\).
    pub fn term(mut self, var: V, coefs: Vec<F>) -> Self
    {
        self.terms.push((var, coefs));
        self
    }
}

impl<V, F> Default for LinearExpr<V, F>
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Subproblem model.
///
/// This is everything the decomposition drivers need from a modeling layer and its solver.
/// A model is cloned into a fresh snapshot before it is augmented or parameterized,
/// so an implementor never sees a driver's changes leak back into the model it was built from.
pub trait Subproblem<F: Float>: Clone
{
    /// Reference to a group of variables.
    /// Adding variables or constraints shall not invalidate existing references.
    type Var: Clone;

    /// Objective sense.
    fn sense(&self) -> Sense;

    /// Adds a group of `len` variables, each bounded by `lower` and `upper` if given.
    ///
    /// Returns the reference to the new group.
    fn add_variable(&mut self, len: usize, lower: Option<F>, upper: Option<F>) -> Self::Var;

    /// Number of variables in the group `var`.
    fn len(&self, var: &Self::Var) -> usize;

    /// Adds \\(c^T v\\) to the objective.
    fn add_objective(&mut self, var: &Self::Var, coefs: &[F]) -> Result<(), SolveError>;

    /// Appends a linear constraint.
    fn add_linear_constraint(&mut self, expr: &LinearExpr<Self::Var, F>, relation: Relation, rhs: F) -> Result<(), SolveError>;

    /// Pins the variables of `var` to `values` for the next solve.
    fn fix(&mut self, var: &Self::Var, values: &[F]) -> Result<(), SolveError>;

    /// Solves the model.
    ///
    /// Returns the optimal objective value.
    fn solve(&mut self) -> Result<F, SolveError>;

    /// Optimal values of `var` found by the last [`Subproblem::solve`].
    fn values(&self, var: &Self::Var) -> Result<Vec<F>, SolveError>;

    /// Sensitivity of the optimal objective value to the values `var` is fixed to,
    /// in the model's own sense, found by the last [`Subproblem::solve`].
    fn sensitivity(&self, var: &Self::Var) -> Result<Vec<F>, SolveError>;
}
