//! ADMM blocks

mod least_squares;
mod l1;
mod qp;

pub use least_squares::*;
pub use l1::*;
pub use qp::*;
