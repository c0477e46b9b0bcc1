use core::fmt::Display;
use thiserror::Error;

/// Errors reported by a subproblem solver adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError
{
    /// The subproblem has no feasible point.
    #[error("Infeasible: subproblem has no feasible point")]
    Infeasible,
    /// The subproblem objective is unbounded.
    #[error("Unbounded: subproblem objective is unbounded")]
    Unbounded,
    /// A requested value or sensitivity does not exist, e.g. before a successful solve.
    #[error("NotAvailable: {0}")]
    NotAvailable(String),
    /// A vector of an unexpected length.
    #[error("DimensionMismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Any other failure of the underlying solver.
    #[error("Failure: {0}")]
    Failure(String),
}

/// Where a subproblem failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site
{
    /// ADMM x-update.
    BlockX,
    /// ADMM z-update.
    BlockZ,
    /// Augmented first stage of cutting planes.
    FirstStage,
    /// Second stage of cutting planes for the scenario of this index.
    Scenario(usize),
}

impl Display for Site
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
    {
        match self {
            Site::BlockX => write!(f, "x-block"),
            Site::BlockZ => write!(f, "z-block"),
            Site::FirstStage => write!(f, "first stage"),
            Site::Scenario(i) => write!(f, "scenario #{}", i),
        }
    }
}

/// Errors of the decomposition drivers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecompError
{
    /// The iteration limit was exhausted before the tolerance was met.
    ///
    /// `gap` is the last primal residual (ADMM) or the last absolute bound gap
    /// (cutting planes), infinite if no iteration was run.
    #[error("NonConvergence: no convergence within {iterations} iterations (last gap {gap:e})")]
    NonConvergence { iterations: usize, gap: f64 },
    /// A subproblem failed; the driver call is aborted.
    #[error("SolverFailure: {site} failed in iteration {iteration}: {source}")]
    SolverFailure { site: Site, iteration: usize, source: SolveError },
    /// Inconsistent arguments or parameters.
    #[error("InvalidInput: {0}")]
    InvalidInput(String),
}

impl DecompError
{
    pub(crate) fn failure(site: Site, iteration: usize) -> impl FnOnce(SolveError) -> DecompError
    {
        move |source| DecompError::SolverFailure { site, iteration, source }
    }
}
