//! Named device models and reusable subcircuit definitions.
//!
//! A [`ModelLibrary`] is an ordinary value handed to the engine together with
//! the circuit. Devices refer to entries by name through `Device::model`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::circuit::{Connection, Device};

/// Shockley diode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiodeModel {
    /// Saturation current (A).
    pub saturation_current: f64,
    /// Emission coefficient.
    pub emission_coefficient: f64,
}

impl Default for DiodeModel {
    fn default() -> Self {
        Self {
            saturation_current: 1e-14,
            emission_coefficient: 1.0,
        }
    }
}

/// Binds an external port of a subcircuit to one of its inner terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// External port name, as listed in the instance's terminals.
    pub name: String,
    /// Inner device id.
    pub device: String,
    /// Inner device port.
    pub port: String,
}

impl PortBinding {
    pub fn new(name: impl Into<String>, device: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            port: port.into(),
        }
    }
}

/// A reusable block of devices exposed through named ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcircuitDef {
    pub ports: Vec<PortBinding>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl SubcircuitDef {
    /// Find the binding for an external port.
    pub fn port(&self, name: &str) -> Option<&PortBinding> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// Collection of diode models and subcircuit definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelLibrary {
    #[serde(default)]
    diodes: IndexMap<String, DiodeModel>,
    #[serde(default)]
    subcircuits: IndexMap<String, SubcircuitDef>,
}

impl ModelLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a diode model, replacing any previous entry of that name.
    pub fn with_diode(mut self, name: impl Into<String>, model: DiodeModel) -> Self {
        self.diodes.insert(name.into(), model);
        self
    }

    /// Register a subcircuit definition, replacing any previous entry of that name.
    pub fn with_subcircuit(mut self, name: impl Into<String>, def: SubcircuitDef) -> Self {
        self.subcircuits.insert(name.into(), def);
        self
    }

    /// Look up a diode model.
    pub fn diode(&self, name: &str) -> Option<&DiodeModel> {
        self.diodes.get(name)
    }

    /// Look up a subcircuit definition.
    pub fn subcircuit(&self, name: &str) -> Option<&SubcircuitDef> {
        self.subcircuits.get(name)
    }

    /// Check if the library holds no entries.
    pub fn is_empty(&self) -> bool {
        self.diodes.is_empty() && self.subcircuits.is_empty()
    }
}
