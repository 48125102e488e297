//! Companion models for reactive elements in transient analysis.

use nalgebra::DVector;
use nodal_core::DeviceState;
use nodal_core::mna::MnaSystem;
use nodal_devices::{Capacitor, Inductor};

use super::types::IntegrationMethod;

/// State of a capacitor for companion model.
#[derive(Debug, Clone)]
pub struct CapacitorState {
    /// Index of the element in the netlist.
    pub element: usize,
    /// Capacitance (F).
    pub capacitance: f64,
    /// Voltage at previous timestep.
    pub v_prev: f64,
    /// Current at previous timestep (pos to neg).
    pub i_prev: f64,
    /// Positive node MNA index (None for ground).
    pub node_pos: Option<usize>,
    /// Negative node MNA index (None for ground).
    pub node_neg: Option<usize>,
}

impl CapacitorState {
    /// Create a new capacitor state with no charge.
    pub fn new(element: usize, cap: &Capacitor) -> Self {
        Self {
            element,
            capacitance: cap.capacitance,
            v_prev: 0.0,
            i_prev: 0.0,
            node_pos: cap.node_pos.mna_index(),
            node_neg: cap.node_neg.mna_index(),
        }
    }

    /// Stamp the companion model for the given method.
    pub fn stamp(&self, mna: &mut MnaSystem, h: f64, method: IntegrationMethod) {
        match method {
            IntegrationMethod::BackwardEuler => self.stamp_be(mna, h),
            IntegrationMethod::Trapezoidal => self.stamp_trap(mna, h),
        }
    }

    /// Stamp the companion model for Backward Euler.
    ///
    /// C is replaced by: G_eq = C/h in parallel with I_eq = C/h * V_prev
    pub fn stamp_be(&self, mna: &mut MnaSystem, h: f64) {
        let geq = self.capacitance / h;
        let ieq = geq * self.v_prev;

        mna.stamp_conductance(self.node_pos, self.node_neg, geq);
        // Current source: ieq flows from neg to pos (charging)
        mna.stamp_current_source(self.node_neg, self.node_pos, ieq);
    }

    /// Stamp the companion model for Trapezoidal rule.
    ///
    /// C is replaced by: G_eq = 2C/h in parallel with I_eq = 2C/h * V_prev + I_prev
    pub fn stamp_trap(&self, mna: &mut MnaSystem, h: f64) {
        let geq = 2.0 * self.capacitance / h;
        let ieq = geq * self.v_prev + self.i_prev;

        mna.stamp_conductance(self.node_pos, self.node_neg, geq);
        mna.stamp_current_source(self.node_neg, self.node_pos, ieq);
    }

    /// Update state after solving a timestep.
    pub fn update(&mut self, v_new: f64, h: f64, method: IntegrationMethod) {
        match method {
            IntegrationMethod::BackwardEuler => {
                self.i_prev = self.capacitance / h * (v_new - self.v_prev);
            }
            IntegrationMethod::Trapezoidal => {
                self.i_prev = 2.0 * self.capacitance / h * (v_new - self.v_prev) - self.i_prev;
            }
        }
        self.v_prev = v_new;
    }

    /// Get voltage across capacitor from solution vector.
    pub fn voltage_from_solution(&self, solution: &DVector<f64>) -> f64 {
        let vp = self.node_pos.map(|i| solution[i]).unwrap_or(0.0);
        let vn = self.node_neg.map(|i| solution[i]).unwrap_or(0.0);
        vp - vn
    }

    /// Stored state to write back into the circuit description.
    pub fn device_state(&self) -> DeviceState {
        DeviceState {
            stored_current: self.i_prev,
            stored_voltage: self.v_prev,
        }
    }
}

/// State of an inductor for companion model.
#[derive(Debug, Clone)]
pub struct InductorState {
    /// Index of the element in the netlist.
    pub element: usize,
    /// Inductance (H).
    pub inductance: f64,
    /// Current at previous timestep (pos to neg).
    pub i_prev: f64,
    /// Voltage at previous timestep (for trapezoidal).
    pub v_prev: f64,
    /// Positive node MNA index (None for ground).
    pub node_pos: Option<usize>,
    /// Negative node MNA index (None for ground).
    pub node_neg: Option<usize>,
}

impl InductorState {
    /// Create a new inductor state with no current.
    pub fn new(element: usize, ind: &Inductor) -> Self {
        Self {
            element,
            inductance: ind.inductance,
            i_prev: 0.0,
            v_prev: 0.0,
            node_pos: ind.node_pos.mna_index(),
            node_neg: ind.node_neg.mna_index(),
        }
    }

    /// Stamp the companion model for the given method.
    pub fn stamp(&self, mna: &mut MnaSystem, h: f64, method: IntegrationMethod) {
        match method {
            IntegrationMethod::BackwardEuler => self.stamp_be(mna, h),
            IntegrationMethod::Trapezoidal => self.stamp_trap(mna, h),
        }
    }

    /// Stamp the companion model for Backward Euler.
    ///
    /// L is replaced by: G_eq = h/L in parallel with I_eq = I_prev
    /// The inductor current flows from node_pos to node_neg.
    pub fn stamp_be(&self, mna: &mut MnaSystem, h: f64) {
        let geq = h / self.inductance;
        let ieq = self.i_prev;

        mna.stamp_conductance(self.node_pos, self.node_neg, geq);
        mna.stamp_current_source(self.node_pos, self.node_neg, ieq);
    }

    /// Stamp the companion model for Trapezoidal rule.
    ///
    /// L is replaced by: G_eq = h/(2L) in parallel with I_eq = I_prev + h/(2L) * V_prev
    pub fn stamp_trap(&self, mna: &mut MnaSystem, h: f64) {
        let geq = h / (2.0 * self.inductance);
        let ieq = self.i_prev + geq * self.v_prev;

        mna.stamp_conductance(self.node_pos, self.node_neg, geq);
        mna.stamp_current_source(self.node_pos, self.node_neg, ieq);
    }

    /// Update state after solving a timestep.
    pub fn update(&mut self, v_new: f64, h: f64, method: IntegrationMethod) {
        match method {
            IntegrationMethod::BackwardEuler => {
                self.i_prev += h / self.inductance * v_new;
            }
            IntegrationMethod::Trapezoidal => {
                self.i_prev += h / (2.0 * self.inductance) * (v_new + self.v_prev);
            }
        }
        self.v_prev = v_new;
    }

    /// Get voltage across inductor from solution vector.
    pub fn voltage_from_solution(&self, solution: &DVector<f64>) -> f64 {
        let vp = self.node_pos.map(|i| solution[i]).unwrap_or(0.0);
        let vn = self.node_neg.map(|i| solution[i]).unwrap_or(0.0);
        vp - vn
    }

    /// Stored state to write back into the circuit description.
    pub fn device_state(&self) -> DeviceState {
        DeviceState {
            stored_current: self.i_prev,
            stored_voltage: self.v_prev,
        }
    }
}

/// Companion states for every reactive element of a netlist.
#[derive(Debug, Clone, Default)]
pub struct CompanionSet {
    pub capacitors: Vec<CapacitorState>,
    pub inductors: Vec<InductorState>,
}

impl CompanionSet {
    /// Stamp every companion model for a step of size `h`.
    pub fn stamp(&self, mna: &mut MnaSystem, h: f64, method: IntegrationMethod) {
        for cap in &self.capacitors {
            cap.stamp(mna, h, method);
        }
        for ind in &self.inductors {
            ind.stamp(mna, h, method);
        }
    }

    /// Advance every state after a solved step.
    pub fn update(&mut self, solution: &DVector<f64>, h: f64, method: IntegrationMethod) {
        for cap in &mut self.capacitors {
            let v = cap.voltage_from_solution(solution);
            cap.update(v, h, method);
        }
        for ind in &mut self.inductors {
            let v = ind.voltage_from_solution(solution);
            ind.update(v, h, method);
        }
    }

    /// Current through a reactive element (pos to neg), if it has state here.
    ///
    /// Both state lists are ordered by element index.
    pub fn current(&self, element: usize) -> Option<f64> {
        if let Ok(k) = self.capacitors.binary_search_by_key(&element, |c| c.element) {
            return Some(self.capacitors[k].i_prev);
        }
        self.inductors
            .binary_search_by_key(&element, |l| l.element)
            .ok()
            .map(|k| self.inductors[k].i_prev)
    }
}
