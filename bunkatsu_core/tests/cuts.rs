use float_eq::assert_float_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use bunkatsu_core::prelude::*;
use bunkatsu_core::cuts::{MasterSolution, outer_bound_monotone};

//

/// One-dimensional first stage `optimize c*x + theta` over `lo <= x <= hi`,
/// solved exactly by enumerating breakpoints of the cut envelope.
#[derive(Clone, Copy)]
struct Interval
{
    sense: Sense,
    c: f64,
    lo: f64,
    hi: f64,
}

struct IntervalMaster
{
    prob: Interval,
    // affine pieces (a, b) of theta as a + b*x
    pieces: Vec<(f64, f64)>,
}

impl FirstStage<f64> for Interval
{
    type Master = IntervalMaster;

    fn dim(&self) -> usize
    {
        1
    }

    fn sense(&self) -> Sense
    {
        self.sense
    }

    fn augment(&self, theta_bound: f64) -> Result<IntervalMaster, SolveError>
    {
        Ok(IntervalMaster {
            prob: *self,
            pieces: vec![(theta_bound, 0.)],
        })
    }
}

impl IntervalMaster
{
    fn envelope(&self, x: f64) -> f64
    {
        let vals = self.pieces.iter().map(|(a, b)| a + b * x);
        match self.prob.sense {
            Sense::Max => vals.fold(f64::INFINITY, f64::min),
            Sense::Min => vals.fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl MasterProblem<f64> for IntervalMaster
{
    fn solve(&mut self) -> Result<MasterSolution<f64>, SolveError>
    {
        let p = &self.prob;

        let mut cands = vec![p.lo, p.hi];
        for (i, (a1, b1)) in self.pieces.iter().enumerate() {
            for (a2, b2) in &self.pieces[i + 1..] {
                if b1 != b2 {
                    let x = (a2 - a1) / (b1 - b2);
                    if x > p.lo && x < p.hi {
                        cands.push(x);
                    }
                }
            }
        }
        cands.sort_by(|u, v| u.partial_cmp(v).unwrap());

        let mut best: Option<(f64, f64)> = None;
        for x in cands {
            let obj = p.c * x + self.envelope(x);
            if best.map_or(true, |(_, o)| p.sense.better(obj, o)) {
                best = Some((x, obj));
            }
        }
        let (x, objective) = best.unwrap();
        let theta = self.envelope(x);

        Ok(MasterSolution {
            objective,
            own_cost: p.c * x,
            x: vec![x],
            theta,
        })
    }

    fn add_cut(&mut self, cut: &Cut<f64>) -> Result<(), SolveError>
    {
        self.pieces.push((cut.intercept(), cut.slope[0]));
        Ok(())
    }
}

//

/// Sells `min(x, demand)` at `price`.
fn sales(price: f64, demand: &f64, x: &[f64]) -> Recourse<f64>
{
    Recourse {
        value: price * x[0].min(*demand),
        sensitivity: vec![if x[0] < *demand {price} else {0.}],
    }
}

/// Pays `penalty` per unit of unmet demand.
fn shortage(penalty: f64, demand: &f64, x: &[f64]) -> Recourse<f64>
{
    Recourse {
        value: penalty * (demand - x[0]).max(0.),
        sensitivity: vec![if x[0] < *demand {-penalty} else {0.}],
    }
}

fn newsvendor() -> Interval
{
    Interval { sense: Sense::Max, c: -2., lo: 0., hi: 150. }
}

const DEMANDS: [f64; 3] = [50., 100., 150.];
const WEIGHTS: [f64; 3] = [0.3, 0.4, 0.3];

//

#[test]
fn test_maximize_newsvendor()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));

    let rslt = CuttingPlanes::new().par(|p| p.tol = 1e-9)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();

    assert_eq!(rslt.termination, Termination::Converged);
    assert_eq!(rslt.iterations, 5);
    assert_float_eq!(rslt.x[..], [100.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(rslt.inner_bound, 225., abs <= 1e-9);
    assert_float_eq!(rslt.outer_bound, 225., abs <= 1e-9);

    let outer: Vec<f64> = rslt.trace.iter().map(|t| t.outer_bound).collect();
    assert_float_eq!(outer[..], [1000., 450., 300., 1650. / 7., 225.].as_ref(), abs_all <= 1e-9);

    for w in rslt.trace.windows(2) {
        assert!(outer_bound_monotone(Sense::Max, w[0].outer_bound, w[1].outer_bound, 0.));
    }
    for t in &rslt.trace {
        // the approximation is never worse than the truth
        assert!(t.outer_bound >= t.inner_bound - 1e-9);
    }
}

#[test]
fn test_minimize_capacity()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let first = Interval { sense: Sense::Min, c: 1., lo: 0., hi: 10. };
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(shortage(3., d, x)));

    let rslt = CuttingPlanes::new().par(|p| p.tol = 1e-9)
        .solve(&first, &second, &[2., 6., 8.], &[0.5, 0.25, 0.25], 0.)
        .unwrap();

    assert_eq!(rslt.iterations, 4);
    assert_float_eq!(rslt.x[..], [6.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(rslt.outer_bound, 7.5, abs <= 1e-9);

    let outer: Vec<f64> = rslt.trace.iter().map(|t| t.outer_bound).collect();
    assert_float_eq!(outer[..], [0., 4.5, 7., 7.5].as_ref(), abs_all <= 1e-9);
    for w in rslt.trace.windows(2) {
        assert!(outer_bound_monotone(Sense::Min, w[0].outer_bound, w[1].outer_bound, 0.));
    }
}

#[test]
fn test_cuts_pass_through_their_points()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));

    let rslt = CuttingPlanes::new()
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();

    assert_eq!(rslt.cuts.len(), rslt.iterations - 1);
    for (cut, t) in rslt.cuts.iter().zip(&rslt.trace) {
        assert_eq!(cut.point, t.x);
        assert_eq!(cut.eval(&cut.point), cut.value);
        // the cut value is the expected recourse at its point
        assert_float_eq!(t.inner_bound, -2. * t.x[0] + cut.value, abs <= 1e-9);
    }
}

#[test]
fn test_scenario_permutation()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));

    let a = CuttingPlanes::new()
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();
    let b = CuttingPlanes::new()
        .solve(&newsvendor(), &second, &[150., 50., 100.], &[0.3, 0.3, 0.4], 1000.)
        .unwrap();

    assert_eq!(a.iterations, b.iterations);
    for (ca, cb) in a.cuts.iter().zip(&b.cuts) {
        assert_float_eq!(ca.value, cb.value, rmax <= 1e-9);
        assert_float_eq!(ca.slope[..], cb.slope.as_slice(), rmax_all <= 1e-9);
    }
    assert_float_eq!(a.outer_bound, b.outer_bound, rmax <= 1e-9);
}

#[test]
fn test_parallel_matches_sequential()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));

    let par = CuttingPlanes::new().par(|p| p.parallel = true)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();
    let seq = CuttingPlanes::new().par(|p| p.parallel = false)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();

    assert_eq!(par.cuts, seq.cuts);
    assert_eq!(par.outer_bound, seq.outer_bound);
}

#[test]
fn test_iteration_limit()
{
    let count = AtomicUsize::new(0);
    let second = RecourseFn::new(|d: &f64, x: &[f64]| {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(sales(5., d, x))
    });

    let rslt = CuttingPlanes::new().par(|p| p.max_iter = 0)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.);
    assert!(matches!(rslt, Err(DecompError::NonConvergence { iterations: 0, .. })));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    let rslt = CuttingPlanes::new().par(|p| p.max_iter = 2)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.);
    match rslt {
        Err(DecompError::NonConvergence { iterations, gap }) => {
            assert_eq!(iterations, 2);
            // bounds of the 2nd iteration: 450 and 200
            assert_float_eq!(gap, 250., abs <= 1e-9);
        },
        _ => panic!("{:?}", rslt),
    }
    assert_eq!(count.load(Ordering::SeqCst), 2 * DEMANDS.len());
}

#[test]
fn test_scenario_failure()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| {
        if *d > 120. {
            Err(SolveError::Infeasible)
        }
        else {
            Ok(sales(5., d, x))
        }
    });

    let rslt = CuttingPlanes::new().par(|p| p.parallel = false)
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap_err();

    assert_eq!(rslt, DecompError::SolverFailure {
        site: bunkatsu_core::Site::Scenario(2),
        iteration: 1,
        source: SolveError::Infeasible,
    });
}

#[test]
fn test_lowest_failing_scenario()
{
    let demands: Vec<f64> = (0.. 32).map(|i| 10. * i as f64).collect();
    let weights = vec![1. / 32.; 32];
    let second = RecourseFn::new(|d: &f64, x: &[f64]| {
        if *d >= 50. {
            Err(SolveError::Failure(format!("demand {}", d)))
        }
        else {
            Ok(sales(5., d, x))
        }
    });

    for _ in 0.. 20 {
        let rslt = CuttingPlanes::new().par(|p| p.parallel = true)
            .solve(&newsvendor(), &second, &demands, &weights, 1000.)
            .unwrap_err();

        assert_eq!(rslt, DecompError::SolverFailure {
            site: bunkatsu_core::Site::Scenario(5),
            iteration: 1,
            source: SolveError::Failure("demand 50".into()),
        });
    }
}

#[test]
fn test_sensitivity_dimension()
{
    let second = RecourseFn::new(|_: &f64, _: &[f64]| Ok(Recourse { value: 0., sensitivity: vec![0., 0.] }));

    let rslt = CuttingPlanes::new()
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap_err();

    assert!(matches!(rslt, DecompError::SolverFailure {
        source: SolveError::DimensionMismatch { expected: 1, got: 2 }, ..
    }));
}

#[test]
fn test_invalid_input()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));
    let s = CuttingPlanes::new();

    assert!(matches!(
        s.solve(&newsvendor(), &second, &DEMANDS, &[0.5, 0.5], 1000.),
        Err(DecompError::InvalidInput(_))
    ));
    assert!(matches!(
        s.solve(&newsvendor(), &second, &[], &[], 1000.),
        Err(DecompError::InvalidInput(_))
    ));
    assert!(matches!(
        s.solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, f64::INFINITY),
        Err(DecompError::InvalidInput(_))
    ));
}

#[test]
fn test_time_limit()
{
    let second = RecourseFn::new(|d: &f64, x: &[f64]| Ok(sales(5., d, x)));

    let rslt = CuttingPlanes::new().par(|p| p.time_limit = Some(Duration::ZERO))
        .solve(&newsvendor(), &second, &DEMANDS, &WEIGHTS, 1000.)
        .unwrap();

    assert_eq!(rslt.termination, Termination::TimeLimit);
    assert_eq!(rslt.iterations, 1);
    assert_eq!(rslt.outer_bound, 1000.);
    assert_eq!(rslt.inner_bound, 0.);
}
