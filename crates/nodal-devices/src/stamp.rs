//! MNA stamping trait and utilities.

use nalgebra::DVector;
use nodal_core::NetId;
use nodal_core::mna::{ComplexMna, MnaSystem};

/// Trait for devices that can stamp into an MNA matrix.
pub trait Stamp {
    /// Stamp this device's DC contribution into the MNA system.
    ///
    /// The device should add its conductance/coefficient contributions
    /// to the matrix and its source contributions to the RHS vector.
    fn stamp(&self, mna: &mut MnaSystem);

    /// Stamp this device's small-signal admittance at angular frequency `omega`.
    fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64);
}

/// Voltage of `node` in a solution vector (ground is 0).
pub fn node_voltage(solution: &DVector<f64>, node: NetId) -> f64 {
    node.mna_index().map(|i| solution[i]).unwrap_or(0.0)
}

/// Voltage across two nodes, V(pos) - V(neg).
pub fn voltage_across(solution: &DVector<f64>, pos: NetId, neg: NetId) -> f64 {
    node_voltage(solution, pos) - node_voltage(solution, neg)
}
