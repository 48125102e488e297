//! Device models and MNA stamps for Nodal.
//!
//! This crate provides:
//! - Passive elements: R, C, L
//! - Independent sources: V, I
//! - Diodes: linear forward-resistance and Shockley models
//! - Subcircuit flattening and netlist construction from a circuit description

pub mod diode;
pub mod error;
pub mod netlist;
pub mod passive;
pub mod sources;
pub mod stamp;
pub mod subcircuit;

pub use diode::{Diode, DiodeKind};
pub use error::{Error, Result};
pub use netlist::{Element, Netlist, NetlistOptions};
pub use passive::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, VoltageSource};
pub use stamp::Stamp;
