//! Analysis runners for DC, AC, and transient simulation.

pub mod ac;
pub mod dc;
pub mod transient;

pub use ac::run_ac;
pub use dc::{run_dc_op, run_dc_sweep};
pub use transient::run_transient;
