use float_eq::assert_float_eq;
use rand::prelude::*;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use bunkatsu::prelude::*;

//

#[test]
fn test_lasso()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // minimize ||Ax - b||^2 + ||z||_1 subject to z = x
    let mut rng = Xoshiro256StarStar::seed_from_u64(2);
    let mat_a = DenseMat::from_rowmaj(3, 10, (0.. 30).map(|_| rng.gen()).collect()).unwrap();
    let vec_b: Vec<f64> = (0.. 3).map(|_| rng.gen()).collect();

    let f = LeastSquaresBlock::new(&mat_a, &vec_b).unwrap();
    let g = L1Block::new(10, 1.);

    let rslt = Admm::new().par(|p| {
        p.rho = 1.;
        p.tol = 1e-6;
        p.max_iter = 100;
    })
    .solve(&f, &g, &LinearMap::identity(10))
    .unwrap();

    assert_eq!(rslt.termination, Termination::Converged);
    assert!(rslt.residual < 1e-6);
    assert!(rslt.iterations <= 100);
    assert_eq!(rslt.residuals.len(), rslt.iterations);

    for (i, z) in rslt.z.iter().enumerate() {
        if i == 3 || i == 9 {
            assert!(*z > 0.1);
        }
        else {
            assert_eq!(*z, 0.);
        }
    }
    assert_float_eq!(rslt.z[3], 0.154208, abs <= 1e-4);
    assert_float_eq!(rslt.z[9], 0.309825, abs <= 1e-4);
    assert_float_eq!(rslt.x[..], rslt.z.as_slice(), abs_all <= 1e-5);
}

#[test]
fn test_dense_coupling()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // minimize ||x - (1, 2)||^2 + ||z||^2 subject to z = x0 + x1
    let f = LeastSquaresBlock::new(&DenseMat::identity(2), &[1., 2.]).unwrap();
    let g = LeastSquaresBlock::new(&DenseMat::identity(1), &[0.]).unwrap();
    let map_t = LinearMap::Dense(DenseMat::from_rowmaj(1, 2, vec![1., 1.]).unwrap());

    let rslt = Admm::new().par(|p| p.tol = 1e-9)
        .solve(&f, &g, &map_t)
        .unwrap();

    assert_float_eq!(rslt.x[..], [0., 1.].as_ref(), abs_all <= 1e-6);
    assert_float_eq!(rslt.z[..], [1.].as_ref(), abs_all <= 1e-6);
}

#[test]
fn test_box_qp_with_l1()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // minimize ||x - a||^2 / 2 + 0.5 ||z||_1 subject to z = x, x <= 1
    let a = [2., 0.3, -1.];
    let f = QpBlock::new(DenseMat::identity(3), a.iter().map(|v| -v).collect()).unwrap()
        .ineq(DenseMat::identity(3), vec![1.; 3]).unwrap()
        .par(|p| {
            p.eps_acc = 1e-9;
            p.max_iter = Some(500_000);
        });
    let g = L1Block::new(3, 0.5);

    let rslt = Admm::new().par(|p| {
        p.tol = 1e-5;
        p.max_iter = 500;
    })
    .solve(&f, &g, &LinearMap::identity(3))
    .unwrap();

    assert_float_eq!(rslt.z[..], [1., 0., -0.5].as_ref(), abs_all <= 1e-3);
    assert_float_eq!(rslt.x[..], [1., 0., -0.5].as_ref(), abs_all <= 1e-3);
}

#[test]
fn test_block_data_mismatch()
{
    let rslt = LeastSquaresBlock::new(&DenseMat::identity(2), &[1., 2., 3.]);
    assert!(matches!(rslt, Err(SolveError::DimensionMismatch { expected: 2, got: 3 })));

    let rslt = QpBlock::new(DenseMat::identity(2), vec![0.; 3]);
    assert!(rslt.is_err());
}

#[test]
fn test_l1_on_x_side()
{
    // L1Block only accepts a scaled identity, so a dense T is reported as the x-block failure
    let f = L1Block::new(2, 1.);
    let g = LeastSquaresBlock::new(&DenseMat::identity(1), &[0.]).unwrap();
    let map_t = LinearMap::Dense(DenseMat::from_rowmaj(1, 2, vec![1., 1.]).unwrap());

    let rslt = Admm::new().solve(&f, &g, &map_t).unwrap_err();
    assert!(matches!(rslt, DecompError::SolverFailure {
        site: bunkatsu_core::Site::BlockX, iteration: 1, source: SolveError::NotAvailable(_)
    }));
}
