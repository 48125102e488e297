//! Independent sources: Voltage and Current.

use nodal_core::circuit::AcStimulus;
use nodal_core::NetId;
use nodal_core::mna::{ComplexMna, MnaSystem};
use num_complex::Complex;

use crate::stamp::Stamp;

/// Phasor of an AC stimulus (phase in degrees).
pub fn stimulus_phasor(ac: &AcStimulus) -> Complex<f64> {
    Complex::from_polar(ac.magnitude, ac.phase.to_radians())
}

/// An independent voltage source.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    /// Device name (e.g., "V1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NetId,
    /// Negative terminal node.
    pub node_neg: NetId,
    /// DC voltage (V).
    pub voltage: f64,
    /// Index of the branch current unknown.
    pub branch_index: usize,
    /// AC phasor. `None` means the DC value is used as the AC magnitude.
    pub ac: Option<Complex<f64>>,
}

impl VoltageSource {
    /// Create a new DC voltage source.
    pub fn new(
        name: impl Into<String>,
        node_pos: NetId,
        node_neg: NetId,
        voltage: f64,
        branch_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            voltage,
            branch_index,
            ac: None,
        }
    }

    /// Excitation used in AC analysis.
    pub fn ac_phasor(&self) -> Complex<f64> {
        self.ac.unwrap_or(Complex::new(self.voltage, 0.0))
    }
}

impl Stamp for VoltageSource {
    fn stamp(&self, mna: &mut MnaSystem) {
        mna.stamp_voltage_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.branch_index,
            self.voltage,
        );
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, _omega: f64) {
        mna.stamp_voltage_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.branch_index,
            self.ac_phasor(),
        );
    }
}

/// An independent current source.
///
/// Current flows from `node_pos` to `node_neg` through the source, so it is
/// drawn out of `node_pos` and delivered into `node_neg`.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    /// Device name (e.g., "I1").
    pub name: String,
    /// Positive terminal node.
    pub node_pos: NetId,
    /// Negative terminal node.
    pub node_neg: NetId,
    /// DC current (A).
    pub current: f64,
    /// AC phasor. `None` means the DC value is used as the AC magnitude.
    pub ac: Option<Complex<f64>>,
}

impl CurrentSource {
    /// Create a new DC current source.
    pub fn new(name: impl Into<String>, node_pos: NetId, node_neg: NetId, current: f64) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            current,
            ac: None,
        }
    }

    /// Excitation used in AC analysis.
    pub fn ac_phasor(&self) -> Complex<f64> {
        self.ac.unwrap_or(Complex::new(self.current, 0.0))
    }
}

impl Stamp for CurrentSource {
    fn stamp(&self, mna: &mut MnaSystem) {
        mna.stamp_current_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.current,
        );
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, _omega: f64) {
        mna.stamp_current_source(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.ac_phasor(),
        );
    }
}
