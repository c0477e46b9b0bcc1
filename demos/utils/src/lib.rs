use bunkatsu_core::admm::AdmmParam;
use bunkatsu_core::cuts::CuttingPlanesParam;
use num_traits::{Float, Num};

pub fn num_by_env<N: Num + std::fmt::Display>(e: &str) -> Option<N>
{
    if let Some(v) = std::env::var(e).ok()
                     .and_then(|s| {N::from_str_radix(&s, 10).ok()}) {
        log::info!("{}: {}", e, v);
        Some(v)
    }
    else {
        None
    }
}

pub fn flag_by_env(e: &str) -> Option<bool>
{
    std::env::var(e).ok().map(|s| {
        let v = !matches!(s.as_str(), "0" | "false" | "off");
        log::info!("{}: {}", e, v);
        v
    })
}

pub fn set_admm_par_by_env<F: Float + std::fmt::Display>(p: &mut AdmmParam<F>)
{
    p.max_iter = num_by_env("MAX_ITER").unwrap_or(p.max_iter);
    p.tol = num_by_env("TOL").unwrap_or(p.tol);
    p.rho = num_by_env("RHO").unwrap_or(p.rho);
    p.log_period = num_by_env("LOG_PERIOD").unwrap_or(p.log_period);
}

pub fn set_cuts_par_by_env<F: Float + std::fmt::Display>(p: &mut CuttingPlanesParam<F>)
{
    p.max_iter = num_by_env("MAX_ITER").unwrap_or(p.max_iter);
    p.tol = num_by_env("TOL").unwrap_or(p.tol);
    p.parallel = flag_by_env("PARALLEL").unwrap_or(p.parallel);
}
