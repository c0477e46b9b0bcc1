use bunkatsu::prelude::*;

use utils;

use rand::prelude::*;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use anyhow::{Result, Context};

/// main
fn main() -> Result<()> {
    env_logger::init();

    //----- make a sparse regression problem

    let mut rng = Xoshiro256StarStar::seed_from_u64(0);
    let m = 30; // # of samples
    let n = 100; // # of features
    let nnz = 5; // # of nonzero weights

    let mut x_true = vec![0.; n];
    for i in rand::seq::index::sample(&mut rng, n, nnz).into_iter() {
        let sign = if rng.gen() {1.} else {-1.};
        x_true[i] = sign * (1. + rng.gen::<f64>());
    }

    let mat_a = DenseMat::zeros(m, n)
                .by_fn(|_, _| rng.gen::<f64>() * 2. - 1.);
    let vec_b: Vec<f64> = mat_a.mul_vec(&x_true).iter()
                .map(|v| v + 0.01 * (rng.gen::<f64>() * 2. - 1.)) // small noise
                .collect();

    //----- minimize ||Ax - b||^2 + w ||z||_1 subject to z = x

    let weight = utils::num_by_env("WEIGHT").unwrap_or(0.5);

    let f = LeastSquaresBlock::new(&mat_a, &vec_b)?;
    let g = L1Block::new(n, weight);

    let s = Admm::new().par(|p| {
        p.max_iter = 10_000;
        p.tol = 1e-8;
        utils::set_admm_par_by_env(p);
    });
    let rslt = s.solve(&f, &g, &LinearMap::identity(n))
               .context("lasso by ADMM")?;

    //----- report

    println!("{:?} after {} iterations, residual {:.3e}", rslt.termination, rslt.iterations, rslt.residual);
    println!("{:>4} {:>10} {:>10}", "#", "true", "estimated");
    for i in 0.. n {
        if x_true[i] != 0. || rslt.z[i] != 0. {
            println!("{:>4} {:>10.4} {:>10.4}", i, x_true[i], rslt.z[i]);
        }
    }

    Ok(())
}
