//! Transient analysis engine.
//!
//! Fixed-step time-domain simulation for circuits with reactive elements
//! (capacitors and inductors), using either:
//!
//! - **Backward Euler**: First-order, A-stable, most robust
//! - **Trapezoidal**: Second-order, A-stable, good for oscillators
//!
//! # Module Structure
//!
//! - [`types`] - Configuration types and parameters
//! - [`companion`] - Companion models for capacitors and inductors
//! - [`result`] - Result type with interpolation support
//! - [`solver`] - The stepping loop

pub mod companion;
pub mod result;
pub mod solver;
pub mod types;

pub use companion::{CapacitorState, CompanionSet, InductorState};
pub use result::TransientResult;
pub use solver::solve_transient;
pub use types::{InitialConditions, IntegrationMethod, TransientParams};
