use bunkatsu::prelude::*;

use utils;

use rand::prelude::*;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use anyhow::{Result, Context};

/// main
fn main() -> Result<()> {
    env_logger::init();

    //----- make demand scenarios

    let mut rng = Xoshiro256StarStar::seed_from_u64(0);
    let l = utils::num_by_env("SCENARIOS").unwrap_or(20); // # of scenarios

    let demands: Vec<f64> = (0.. l).map(|_| (50. + 100. * rng.gen::<f64>()).round()).collect();
    let weights = vec![1. / l as f64; l];

    let cost = 2.; // unit purchase cost
    let price = 5.; // unit sales price
    let salvage = 0.5; // unit salvage value of unsold stock
    let cap = 200.; // purchase capacity

    //----- first stage: maximize -cost * x, 0 <= x <= cap

    let mut first = LinearProgram::new(Sense::Max);
    let x = first.add_variable(1, Some(0.), Some(cap));
    first.add_objective(&x, &[-cost])?;

    //----- second stage: maximize price * y + salvage * r, y + r = u, 0 <= y <= demand, r >= 0

    let mut second = LinearProgram::new(Sense::Max);
    let y = second.add_variable(1, Some(0.), None);
    let r = second.add_variable(1, Some(0.), None);
    let u = second.add_variable(1, None, None);
    second.add_objective(&y, &[price])?;
    second.add_objective(&r, &[salvage])?;
    second.add_linear_constraint(
        &LinearExpr::new().term(y, vec![1.]).term(r, vec![1.]).term(u, vec![-1.]),
        Relation::Eq, 0.
    )?;
    let demand = second.add_row(&LinearExpr::new().term(y, vec![1.]), Relation::Le, 0.)?;

    //----- solve by cutting planes

    let first = LpFirstStage::new(first, x);
    let second = LpSecondStage::new(second, u, |m: &mut LinearProgram, d: &f64| m.set_rhs(demand, *d));

    let s = CuttingPlanes::new().par(|p| {
        p.tol = 1e-4;
        utils::set_cuts_par_by_env(p);
    });
    let bound = price * cap; // nothing sells above price * cap
    let rslt = s.solve(&first, &second, &demands, &weights, bound)
               .context("newsvendor by cutting planes")?;

    //----- report

    println!("{:?} after {} iterations", rslt.termination, rslt.iterations);
    println!("{:>4} {:>12} {:>12} {:>10}", "#", "inner", "outer", "x");
    for t in &rslt.trace {
        println!("{:>4} {:>12.4} {:>12.4} {:>10.4}", t.iteration, t.inner_bound, t.outer_bound, t.x[0]);
    }

    let mut sorted = demands.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    // critical fractile (price - cost) / (price - salvage)
    let fractile = (price - cost) / (price - salvage);
    let k = ((fractile * l as f64).ceil() as usize).clamp(1, l) - 1;
    println!("order {:.4}, critical-fractile demand {:.4}", rslt.x[0], sorted[k]);

    Ok(())
}
