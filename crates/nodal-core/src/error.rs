//! Error and warning types for nodal-core.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection {connection} references unknown terminal {device}.{port}")]
    UnknownTerminal {
        connection: String,
        device: String,
        port: String,
    },

    #[error("duplicate device id: {0}")]
    DuplicateDevice(String),

    #[error("device not found: {0}")]
    UnknownDevice(String),

    #[error("invalid circuit: {0}")]
    InvalidCircuit(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions found while preparing a circuit for simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A terminal with no connection was tied to ground.
    UnresolvedTerminal { device: String, port: String },
    /// A device of an unsupported type was left out of the simulation.
    SkippedDevice { device: String, device_type: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedTerminal { device, port } => {
                write!(f, "terminal {}.{} is unconnected; tied to ground", device, port)
            }
            Warning::SkippedDevice {
                device,
                device_type,
            } => write!(f, "device {} of unsupported type '{}' skipped", device, device_type),
        }
    }
}
