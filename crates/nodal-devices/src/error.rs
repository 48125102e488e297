//! Error types for nodal-devices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("device {device} has unsupported type '{device_type}'")]
    UnsupportedDeviceType { device: String, device_type: String },

    #[error("device {device} references unknown model '{model}'")]
    UnknownModel { device: String, model: String },

    #[error("subcircuit '{model}' recurses (depth {depth})")]
    RecursiveSubcircuit { model: String, depth: usize },

    #[error("subcircuit instance {instance} has no binding for port '{port}'")]
    UnboundPort { instance: String, port: String },

    #[error("device {name} has invalid value: {value}")]
    InvalidValue { name: String, value: f64 },

    #[error("device {0} is not an independent source")]
    NotSweepable(String),

    #[error(transparent)]
    Core(#[from] nodal_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
