//! Core circuit representation and MNA matrix structures for Nodal.
//!
//! This crate provides the circuit data model (devices, connections, model
//! library), engineering value parsing, the terminal-to-net topology mapper,
//! and the Modified Nodal Analysis (MNA) system containers.

pub mod circuit;
pub mod error;
pub mod library;
pub mod mna;
pub mod net;
pub mod topology;
pub mod units;

pub use circuit::{AcStimulus, Circuit, Connection, Device, DeviceState, DeviceType};
pub use error::{Error, Result, Warning};
pub use library::{DiodeModel, ModelLibrary, PortBinding, SubcircuitDef};
pub use mna::{ComplexMna, MnaSystem};
pub use net::{NetId, TerminalId};
pub use topology::Topology;
pub use units::Value;
