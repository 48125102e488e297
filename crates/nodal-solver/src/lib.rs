//! Linear and nonlinear solvers and analysis drivers for Nodal.
//!
//! This crate provides:
//! - Dense Gaussian elimination with partial pivoting, real and complex
//! - Newton-Raphson iteration for circuits with diodes
//! - DC operating point and DC sweep analysis
//! - Fixed-step transient analysis (Backward Euler, Trapezoidal)
//! - AC small-signal frequency sweeps
//! - The [`Simulator`] facade tying them to one circuit snapshot
//!
//! # Example
//!
//! ```
//! use nodal_core::{Circuit, Device};
//! use nodal_solver::Simulator;
//!
//! let circuit = Circuit::new()
//!     .with_device(Device::voltage_source("V1", 5.0))
//!     .with_device(Device::resistor("R1", "1k"))
//!     .with_device(Device::resistor("R2", "1k"))
//!     .wired("V1", "pos", "R1", "a")
//!     .wired("R1", "b", "R2", "a")
//!     .wired("R2", "b", "V1", "neg");
//!
//! let mut sim = Simulator::new(circuit).unwrap();
//! let op = sim.dc_operating_point().unwrap();
//! let mid = sim.net("R1.b").unwrap();
//! assert!((op.voltage(mid) - 2.5).abs() < 1e-9);
//! ```

pub mod ac;
pub mod config;
pub mod dc;
pub mod error;
pub mod linear;
pub mod newton;
pub mod readings;
pub mod simulator;
pub mod transient;

pub use ac::{AcParams, AcPoint, AcReading, AcResult, AcSweepType, generate_frequencies, solve_ac};
pub use config::{DEFAULT_MAX_POINTS, SimulatorConfig};
pub use dc::{DcSweepParams, DcSweepResult, dc_sweep, solve_dc};
pub use error::{Error, Result};
pub use linear::{solve_complex, solve_dense};
pub use newton::{ConvergenceCriteria, NonlinearStamper, NrResult, solve_newton_raphson};
pub use readings::{DeviceReading, SimulationResult, StepFailure, kcl_residuals};
pub use simulator::{Simulator, SimulatorState};
pub use transient::{
    InitialConditions, IntegrationMethod, TransientParams, TransientResult, solve_transient,
};
