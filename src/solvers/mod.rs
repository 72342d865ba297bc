pub mod barrier_checks;
pub mod bfgs;
pub mod constrained;
pub mod lmm_step;
pub mod projection;
