//! Circuit description: devices, their terminals, and the wires between them.
//!
//! This is plain data supplied by an editor or import layer. Nothing here
//! knows how to stamp a device; that happens in `nodal-devices`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::units::Value;

/// Kind of a device, as named in the circuit description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Diode,
    /// Instance of a subcircuit definition from the model library.
    Subcircuit,
    /// Reference marker; its net becomes net 0.
    Ground,
    /// A type this engine does not know how to simulate.
    Unsupported(String),
}

impl DeviceType {
    /// Canonical name used in circuit descriptions.
    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::Resistor => "resistor",
            DeviceType::Capacitor => "capacitor",
            DeviceType::Inductor => "inductor",
            DeviceType::VoltageSource => "voltage_source",
            DeviceType::CurrentSource => "current_source",
            DeviceType::Diode => "diode",
            DeviceType::Subcircuit => "subcircuit",
            DeviceType::Ground => "ground",
            DeviceType::Unsupported(name) => name,
        }
    }
}

impl From<String> for DeviceType {
    fn from(name: String) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "resistor" => DeviceType::Resistor,
            "capacitor" => DeviceType::Capacitor,
            "inductor" => DeviceType::Inductor,
            "voltagesource" => DeviceType::VoltageSource,
            "currentsource" => DeviceType::CurrentSource,
            "diode" => DeviceType::Diode,
            "subcircuit" => DeviceType::Subcircuit,
            "ground" => DeviceType::Ground,
            _ => DeviceType::Unsupported(name),
        }
    }
}

impl From<DeviceType> for String {
    fn from(kind: DeviceType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy stored in a reactive device between simulation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// Inductor current (A).
    #[serde(default)]
    pub stored_current: f64,
    /// Capacitor voltage (V).
    #[serde(default)]
    pub stored_voltage: f64,
}

/// Small-signal stimulus of a source for AC analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcStimulus {
    /// Amplitude (V or A).
    pub magnitude: f64,
    /// Phase in degrees.
    #[serde(default)]
    pub phase: f64,
}

/// A typed device with named terminals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Unique device identifier (e.g. "R1").
    pub id: String,
    /// Device kind.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Ordered port names. The first two are the main terminals.
    pub terminals: Vec<String>,
    /// Primary value (ohms, farads, henries, volts, amps).
    #[serde(default)]
    pub value: Value,
    /// Name of a model library entry (diode model or subcircuit).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// AC stimulus for sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<AcStimulus>,
    /// Stored reactive state.
    #[serde(default)]
    pub internal_state: DeviceState,
}

impl Device {
    /// Create a device with the given terminals and value.
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        device_type: DeviceType,
        terminals: impl IntoIterator<Item = S>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            device_type,
            terminals: terminals.into_iter().map(Into::into).collect(),
            value: value.into(),
            model: None,
            ac: None,
            internal_state: DeviceState::default(),
        }
    }

    /// Resistor with terminals `a`, `b`.
    pub fn resistor(id: impl Into<String>, ohms: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::Resistor, ["a", "b"], ohms)
    }

    /// Capacitor with terminals `pos`, `neg`.
    pub fn capacitor(id: impl Into<String>, farads: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::Capacitor, ["pos", "neg"], farads)
    }

    /// Inductor with terminals `pos`, `neg`.
    pub fn inductor(id: impl Into<String>, henries: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::Inductor, ["pos", "neg"], henries)
    }

    /// Independent voltage source with terminals `pos`, `neg`.
    pub fn voltage_source(id: impl Into<String>, volts: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::VoltageSource, ["pos", "neg"], volts)
    }

    /// Independent current source with terminals `pos`, `neg`.
    ///
    /// Current flows from `pos` to `neg` through the source.
    pub fn current_source(id: impl Into<String>, amps: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::CurrentSource, ["pos", "neg"], amps)
    }

    /// Diode with terminals `anode`, `cathode`.
    pub fn diode(id: impl Into<String>, forward_resistance: impl Into<Value>) -> Self {
        Self::new(id, DeviceType::Diode, ["anode", "cathode"], forward_resistance)
    }

    /// Ground marker with a single terminal `gnd`.
    pub fn ground(id: impl Into<String>) -> Self {
        Self::new(id, DeviceType::Ground, ["gnd"], 0.0)
    }

    /// Subcircuit instance of `model` with the given ports.
    pub fn subcircuit<S: Into<String>>(
        id: impl Into<String>,
        model: impl Into<String>,
        ports: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut device = Self::new(id, DeviceType::Subcircuit, ports, 0.0);
        device.model = Some(model.into());
        device
    }

    /// Attach a model library reference.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach an AC stimulus.
    pub fn with_ac(mut self, magnitude: f64, phase: f64) -> Self {
        self.ac = Some(AcStimulus { magnitude, phase });
        self
    }

    /// Replace the stored reactive state.
    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.internal_state = state;
        self
    }

    /// Index of a port by name.
    pub fn port_index(&self, port: &str) -> Option<usize> {
        self.terminals.iter().position(|t| t == port)
    }

    /// Numeric value of this device.
    pub fn numeric_value(&self) -> f64 {
        self.value.as_f64()
    }
}

/// An undirected wire between two device terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub device_a: String,
    pub port_a: String,
    pub device_b: String,
    pub port_b: String,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        device_a: impl Into<String>,
        port_a: impl Into<String>,
        device_b: impl Into<String>,
        port_b: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            device_a: device_a.into(),
            port_a: port_a.into(),
            device_b: device_b.into(),
            port_b: port_b.into(),
        }
    }
}

/// A circuit snapshot: devices plus connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device (builder style).
    pub fn with_device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    /// Add a device.
    pub fn add_device(&mut self, device: Device) {
        self.devices.push(device);
    }

    /// Wire two terminals together, generating a connection id.
    pub fn connect(
        &mut self,
        device_a: impl Into<String>,
        port_a: impl Into<String>,
        device_b: impl Into<String>,
        port_b: impl Into<String>,
    ) {
        let id = format!("W{}", self.connections.len() + 1);
        self.connections
            .push(Connection::new(id, device_a, port_a, device_b, port_b));
    }

    /// Wire two terminals together (builder style).
    pub fn wired(
        mut self,
        device_a: impl Into<String>,
        port_a: impl Into<String>,
        device_b: impl Into<String>,
        port_b: impl Into<String>,
    ) -> Self {
        self.connect(device_a, port_a, device_b, port_b);
        self
    }

    /// Find a device by id.
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Position of a device by id.
    pub fn device_index(&self, id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.id == id)
    }

    /// Check that device ids are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.devices.len());
        for device in &self.devices {
            if !seen.insert(device.id.as_str()) {
                return Err(Error::DuplicateDevice(device.id.clone()));
            }
        }
        Ok(())
    }

    /// Copy of this circuit with one device's value replaced.
    pub fn with_value(&self, device_id: &str, value: impl Into<Value>) -> Result<Circuit> {
        let index = self
            .device_index(device_id)
            .ok_or_else(|| Error::UnknownDevice(device_id.to_string()))?;
        let mut circuit = self.clone();
        circuit.devices[index].value = value.into();
        Ok(circuit)
    }

    /// Copy of this circuit with stored reactive state replaced per device.
    pub fn with_states<'a>(
        &self,
        states: impl IntoIterator<Item = (&'a str, DeviceState)>,
    ) -> Result<Circuit> {
        let mut circuit = self.clone();
        for (device_id, state) in states {
            let index = circuit
                .device_index(device_id)
                .ok_or_else(|| Error::UnknownDevice(device_id.to_string()))?;
            circuit.devices[index].internal_state = state;
        }
        Ok(circuit)
    }
}
