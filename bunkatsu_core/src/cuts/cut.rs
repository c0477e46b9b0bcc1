use num_traits::Float;
use crate::vecops::{self, WeightedSum};
use crate::SolveError;

/// Value and sensitivity of a recourse function at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Recourse<F>
{
    /// Optimal recourse value \\(v\\).
    pub value: F,
    /// Sensitivity \\(\lambda = \partial v / \partial x\\) with respect to the fixed first-stage decision.
    pub sensitivity: Vec<F>,
}

/// Expectation of scenario recourse evaluations.
///
/// Returns \\(\sum_\omega w_\omega v_\omega\\) and \\(\sum_\omega w_\omega \lambda_\omega\\),
/// or [`SolveError::DimensionMismatch`] if `weights` and `evals` differ in length
/// or the sensitivities differ in length from each other.
/// Each component is accumulated in scenario order with compensated summation,
/// so the result is independent of which scenario finished first
/// and nearly independent of how scenarios are ordered.
pub fn aggregate<F: Float>(weights: &[F], evals: &[Recourse<F>]) -> Result<Recourse<F>, SolveError>
{
    if weights.len() != evals.len() {
        return Err(SolveError::DimensionMismatch { expected: weights.len(), got: evals.len() });
    }

    let dim = evals.first().map_or(0, |e| e.sensitivity.len());

    let mut value = WeightedSum::new();
    let mut sensitivity = vec![WeightedSum::new(); dim];
    for (w, e) in weights.iter().zip(evals) {
        if e.sensitivity.len() != dim {
            return Err(SolveError::DimensionMismatch { expected: dim, got: e.sensitivity.len() });
        }

        value.add(*w, e.value);
        for (acc, s) in sensitivity.iter_mut().zip(&e.sensitivity) {
            acc.add(*w, *s);
        }
    }

    Ok(Recourse {
        value: value.value(),
        sensitivity: sensitivity.iter().map(|acc| acc.value()).collect(),
    })
}

/// Supporting hyperplane of the recourse function.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The affine function \\(v + \lambda^T (x - \bar{x})\\), built at the point \\(\bar{x}\\).
/// It bounds \\(\theta\\) from above when maximizing and from below when minimizing.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut<F>
{
    /// \\(v\\)
    pub value: F,
    /// \\(\lambda\\)
    pub slope: Vec<F>,
    /// \\(\bar{x}\\)
    pub point: Vec<F>,
}

impl<F: Float> Cut<F>
{
    /// Builds the cut of `recourse` evaluated at `point`.
    ///
    /// Fails with [`SolveError::DimensionMismatch`] unless the sensitivity and `point` have the same length.
    pub fn new(recourse: Recourse<F>, point: Vec<F>) -> Result<Self, SolveError>
    {
        if recourse.sensitivity.len() != point.len() {
            return Err(SolveError::DimensionMismatch { expected: point.len(), got: recourse.sensitivity.len() });
        }

        Ok(Cut {
            value: recourse.value,
            slope: recourse.sensitivity,
            point,
        })
    }

    /// Evaluates the hyperplane at `x`.
    pub fn eval(&self, x: &[F]) -> F
    {
        self.value + vecops::dot(&self.slope, &vecops::sub(x, &self.point))
    }

    /// Constant term \\(v - \lambda^T \bar{x}\\) of the hyperplane.
    ///
    /// The cut as a linear constraint reads \\(\theta - \lambda^T x \lessgtr v - \lambda^T \bar{x}\\).
    pub fn intercept(&self) -> F
    {
        self.value - vecops::dot(&self.slope, &self.point)
    }
}

//

#[cfg(test)]
mod tests
{
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn test_cut_passes_through_its_point()
    {
        let cut = Cut::new(
            Recourse { value: 12.5, sensitivity: vec![-0.3, 4.] },
            vec![7.1, -2.9],
        ).unwrap();

        assert_eq!(cut.eval(&[7.1, -2.9]), 12.5);
        assert_float_eq!(cut.eval(&[8.1, -2.9]), 12.2, abs <= 1e-12);
        assert_float_eq!(cut.eval(&[0., 0.]), cut.intercept(), abs <= 1e-12);
    }

    #[test]
    fn test_aggregate_permutation()
    {
        let weights = [0.1, 0.25, 0.3, 0.35];
        let evals: Vec<_> = [(1.3e3, 0.7), (-2.1, 5.5), (8.8e-2, -3.3), (4.4e2, 1e-4)].iter()
            .map(|&(v, s)| Recourse { value: v, sensitivity: vec![s, -s] })
            .collect();

        let a = aggregate(&weights, &evals).unwrap();

        let perm = [2, 0, 3, 1];
        let weights_p: Vec<_> = perm.iter().map(|&i| weights[i]).collect();
        let evals_p: Vec<_> = perm.iter().map(|&i| evals[i].clone()).collect();
        let b = aggregate(&weights_p, &evals_p).unwrap();

        assert_float_eq!(a.value, b.value, rmax <= 1e-9);
        assert_float_eq!(a.sensitivity[..], b.sensitivity.as_slice(), rmax_all <= 1e-9);
        assert_float_eq!(a.value, 0.1 * 1.3e3 - 0.25 * 2.1 + 0.3 * 8.8e-2 + 0.35 * 4.4e2, rmax <= 1e-12);
    }

    #[test]
    fn test_length_mismatch()
    {
        let evals = vec![
            Recourse { value: 1., sensitivity: vec![1., 2.] },
            Recourse { value: 2., sensitivity: vec![3.] },
        ];

        assert_eq!(aggregate(&[0.5], &evals), Err(SolveError::DimensionMismatch { expected: 1, got: 2 }));
        assert_eq!(aggregate(&[0.5, 0.5], &evals), Err(SolveError::DimensionMismatch { expected: 2, got: 1 }));
        assert_eq!(
            Cut::new(evals[0].clone(), vec![0.]),
            Err(SolveError::DimensionMismatch { expected: 1, got: 2 })
        );
    }
}
