use num_traits::Float;
use core::marker::PhantomData;
use crate::subproblem::{Subproblem, Sense, Relation, LinearExpr};
use crate::SolveError;
use super::{Cut, Recourse};

/// Solution of the augmented first stage.
#[derive(Debug, Clone)]
pub struct MasterSolution<F>
{
    /// Optimal value of \\(\mathrm{own}(x) + \theta\\).
    pub objective: F,
    /// \\(\mathrm{own}(x)\\) at the optimum, the objective without the recourse estimate.
    pub own_cost: F,
    pub x: Vec<F>,
    pub theta: F,
}

/// First-stage problem of a two-stage program.
pub trait FirstStage<F: Float>
{
    type Master: MasterProblem<F>;

    /// Dimension of the first-stage decision \\(x\\).
    fn dim(&self) -> usize;

    /// Objective sense.
    fn sense(&self) -> Sense;

    /// Builds a fresh copy of the problem augmented by \\(\theta\\).
    ///
    /// The objective of the copy is \\(\mathrm{own}(x) + \theta\\) in the same sense,
    /// and \\(\theta\\) is bounded by `theta_bound` from above when maximizing,
    /// from below when minimizing.
    fn augment(&self, theta_bound: F) -> Result<Self::Master, SolveError>;
}

/// First-stage problem augmented by \\(\theta\\) and the cuts added so far.
pub trait MasterProblem<F: Float>
{
    fn solve(&mut self) -> Result<MasterSolution<F>, SolveError>;

    /// Appends `cut` as a constraint on \\(\theta\\).
    fn add_cut(&mut self, cut: &Cut<F>) -> Result<(), SolveError>;
}

/// Second-stage (recourse) problem of a two-stage program.
///
/// [`SecondStage::evaluate`] takes `&self` and may be called from several threads at once.
pub trait SecondStage<F: Float>: Sync
{
    type Scenario: Sync;

    /// Solves the recourse problem of `scenario` with the first-stage decision fixed to `x`.
    ///
    /// Returns the optimal recourse value and its sensitivity with respect to `x`.
    fn evaluate(&self, scenario: &Self::Scenario, x: &[F]) -> Result<Recourse<F>, SolveError>;
}

//

/// [`FirstStage`] over any [`Subproblem`] model.
pub struct ModelFirstStage<F: Float, M: Subproblem<F>>
{
    model: M,
    decision: M::Var,
    ph_f: PhantomData<F>,
}

impl<F: Float, M: Subproblem<F>> ModelFirstStage<F, M>
{
    /// * `model` is the first-stage model whose objective is \\(\mathrm{own}(x)\\).
    /// * `decision` is \\(x\\) in `model`.
    pub fn new(model: M, decision: M::Var) -> Self
    {
        ModelFirstStage {
            model,
            decision,
            ph_f: PhantomData,
        }
    }

    pub fn model(&self) -> &M
    {
        &self.model
    }
}

impl<F: Float, M: Subproblem<F>> FirstStage<F> for ModelFirstStage<F, M>
{
    type Master = ModelMaster<F, M>;

    fn dim(&self) -> usize
    {
        self.model.len(&self.decision)
    }

    fn sense(&self) -> Sense
    {
        self.model.sense()
    }

    fn augment(&self, theta_bound: F) -> Result<Self::Master, SolveError>
    {
        let mut model = self.model.clone();
        let sense = model.sense();

        let theta = match sense {
            Sense::Min => model.add_variable(1, Some(theta_bound), None),
            Sense::Max => model.add_variable(1, None, Some(theta_bound)),
        };
        model.add_objective(&theta, &[F::one()])?;

        Ok(ModelMaster {
            model,
            decision: self.decision.clone(),
            theta,
            sense,
        })
    }
}

/// Augmented copy made by [`ModelFirstStage`].
pub struct ModelMaster<F: Float, M: Subproblem<F>>
{
    model: M,
    decision: M::Var,
    theta: M::Var,
    sense: Sense,
}

impl<F: Float, M: Subproblem<F>> MasterProblem<F> for ModelMaster<F, M>
{
    fn solve(&mut self) -> Result<MasterSolution<F>, SolveError>
    {
        let objective = self.model.solve()?;
        let x = self.model.values(&self.decision)?;
        let theta = self.model.values(&self.theta)?
            .first().copied()
            .ok_or(SolveError::DimensionMismatch { expected: 1, got: 0 })?;

        Ok(MasterSolution {
            objective,
            own_cost: objective - theta,
            x,
            theta,
        })
    }

    fn add_cut(&mut self, cut: &Cut<F>) -> Result<(), SolveError>
    {
        let relation = match self.sense {
            Sense::Min => Relation::Ge,
            Sense::Max => Relation::Le,
        };
        let expr = LinearExpr::new()
            .term(self.theta.clone(), vec![F::one()])
            .term(self.decision.clone(), cut.slope.iter().map(|s| -*s).collect());

        self.model.add_linear_constraint(&expr, relation, cut.intercept())
    }
}

//

/// [`SecondStage`] over any [`Subproblem`] model.
///
/// Every evaluation works on its own clone of the base model:
/// `apply` sets the scenario data on the clone,
/// then the coupling variables are fixed to the first-stage decision and the clone is solved.
pub struct ModelSecondStage<F: Float, M: Subproblem<F>, S, G>
{
    model: M,
    coupling: M::Var,
    apply: G,
    ph: PhantomData<fn(&S) -> F>,
}

impl<F, M, S, G> ModelSecondStage<F, M, S, G>
where F: Float, M: Subproblem<F>, G: Fn(&mut M, &S) -> Result<(), SolveError>
{
    /// * `model` is the base second-stage model.
    /// * `coupling` is the copy of the first-stage decision in `model`.
    /// * `apply` sets the data of a scenario on a clone of `model`.
    pub fn new(model: M, coupling: M::Var, apply: G) -> Self
    {
        ModelSecondStage {
            model,
            coupling,
            apply,
            ph: PhantomData,
        }
    }

    pub fn model(&self) -> &M
    {
        &self.model
    }
}

impl<F, M, S, G> SecondStage<F> for ModelSecondStage<F, M, S, G>
where F: Float, M: Subproblem<F> + Sync, M::Var: Sync, S: Sync,
      G: Fn(&mut M, &S) -> Result<(), SolveError> + Sync
{
    type Scenario = S;

    fn evaluate(&self, scenario: &S, x: &[F]) -> Result<Recourse<F>, SolveError>
    {
        let mut model = self.model.clone();

        (self.apply)(&mut model, scenario)?;
        model.fix(&self.coupling, x)?;

        let value = model.solve()?;
        let sensitivity = model.sensitivity(&self.coupling)?;

        Ok(Recourse {
            value,
            sensitivity,
        })
    }
}

//

/// [`SecondStage`] given by a function of a scenario and the first-stage decision.
pub struct RecourseFn<S, G>
{
    func: G,
    ph_s: PhantomData<fn(&S)>,
}

impl<S, G> RecourseFn<S, G>
{
    /// * `func` takes a scenario and the first-stage decision
    ///   and returns the recourse value and its sensitivity.
    pub fn new<F>(func: G) -> Self
    where F: Float, G: Fn(&S, &[F]) -> Result<Recourse<F>, SolveError>
    {
        RecourseFn {
            func,
            ph_s: PhantomData,
        }
    }
}

impl<F, S, G> SecondStage<F> for RecourseFn<S, G>
where F: Float, S: Sync, G: Fn(&S, &[F]) -> Result<Recourse<F>, SolveError> + Sync
{
    type Scenario = S;

    fn evaluate(&self, scenario: &S, x: &[F]) -> Result<Recourse<F>, SolveError>
    {
        (self.func)(scenario, x)
    }
}
