//! Passive device models: Resistor, Capacitor, Inductor.

use nodal_core::NetId;
use nodal_core::mna::{ComplexMna, MnaSystem};
use num_complex::Complex;

use crate::stamp::Stamp;

/// A resistor element.
#[derive(Debug, Clone)]
pub struct Resistor {
    /// Device name (e.g., "R1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NetId,
    /// Negative terminal node.
    pub node_neg: NetId,
    /// Resistance value in ohms.
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(name: impl Into<String>, node_pos: NetId, node_neg: NetId, resistance: f64) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            resistance,
        }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

impl Stamp for Resistor {
    fn stamp(&self, mna: &mut MnaSystem) {
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();
        mna.stamp_conductance(i, j, self.conductance());
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, _omega: f64) {
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();
        mna.stamp_conductance(i, j, self.conductance());
    }
}

/// A capacitor element.
#[derive(Debug, Clone)]
pub struct Capacitor {
    /// Device name (e.g., "C1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NetId,
    /// Negative terminal node.
    pub node_neg: NetId,
    /// Capacitance value in farads.
    pub capacitance: f64,
    /// Stored voltage carried in from the circuit description.
    pub initial_voltage: f64,
}

impl Capacitor {
    /// Create a new capacitor with no stored charge.
    pub fn new(name: impl Into<String>, node_pos: NetId, node_neg: NetId, capacitance: f64) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            capacitance,
            initial_voltage: 0.0,
        }
    }

    /// Set the stored voltage.
    pub fn with_initial_voltage(mut self, voltage: f64) -> Self {
        self.initial_voltage = voltage;
        self
    }
}

impl Stamp for Capacitor {
    fn stamp(&self, _mna: &mut MnaSystem) {
        // Open circuit at DC. Transient analysis uses a companion model.
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64) {
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();
        mna.stamp_admittance(i, j, Complex::new(0.0, omega * self.capacitance));
    }
}

/// An inductor element.
#[derive(Debug, Clone)]
pub struct Inductor {
    /// Device name (e.g., "L1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NetId,
    /// Negative terminal node.
    pub node_neg: NetId,
    /// Inductance value in henries.
    pub inductance: f64,
    /// Series resistance standing in for the inductor at DC.
    pub dc_resistance: f64,
    /// Stored current (pos to neg) carried in from the circuit description.
    pub initial_current: f64,
}

impl Inductor {
    /// Create a new inductor with no stored current.
    pub fn new(
        name: impl Into<String>,
        node_pos: NetId,
        node_neg: NetId,
        inductance: f64,
        dc_resistance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            inductance,
            dc_resistance,
            initial_current: 0.0,
        }
    }

    /// Set the stored current.
    pub fn with_initial_current(mut self, current: f64) -> Self {
        self.initial_current = current;
        self
    }

    /// Conductance of the DC near-short.
    pub fn dc_conductance(&self) -> f64 {
        1.0 / self.dc_resistance
    }
}

impl Stamp for Inductor {
    fn stamp(&self, mna: &mut MnaSystem) {
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();
        mna.stamp_conductance(i, j, self.dc_conductance());
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64) {
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();
        if omega > 0.0 {
            // Y = 1/(jωL) = -j/(ωL)
            mna.stamp_admittance(i, j, Complex::new(0.0, -1.0 / (omega * self.inductance)));
        } else {
            mna.stamp_conductance(i, j, self.dc_conductance());
        }
    }
}
