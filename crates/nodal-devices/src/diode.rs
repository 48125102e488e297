//! Diode device models: a linear forward-resistance approximation and the
//! Shockley equation for diodes that name a library model.

use nodal_core::NetId;
use nodal_core::library::DiodeModel;
use nodal_core::mna::{ComplexMna, MnaSystem};

use crate::stamp::Stamp;

/// Room temperature (27°C) in kelvin.
pub const ROOM_TEMPERATURE: f64 = 300.15;

/// Exponent above which the Shockley current is continued linearly.
const MAX_EXP_ARG: f64 = 80.0;

/// Thermal voltage at a given temperature.
pub fn thermal_voltage(temp_k: f64) -> f64 {
    const K_BOLTZMANN: f64 = 1.380649e-23;
    const Q_ELECTRON: f64 = 1.602176634e-19;
    K_BOLTZMANN * temp_k / Q_ELECTRON
}

/// How a diode conducts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiodeKind {
    /// Fixed forward resistance, stamped as a resistor.
    Linear { resistance: f64 },
    /// Exponential junction, solved with Newton-Raphson.
    Shockley(DiodeModel),
}

/// A diode element.
#[derive(Debug, Clone)]
pub struct Diode {
    /// Device name (e.g., "D1").
    pub name: String,
    /// Anode node.
    pub node_pos: NetId,
    /// Cathode node.
    pub node_neg: NetId,
    pub kind: DiodeKind,
}

impl Diode {
    /// Create a linear diode with the given forward resistance.
    pub fn linear(name: impl Into<String>, node_pos: NetId, node_neg: NetId, resistance: f64) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            kind: DiodeKind::Linear { resistance },
        }
    }

    /// Create a Shockley diode from model parameters.
    pub fn with_model(
        name: impl Into<String>,
        node_pos: NetId,
        node_neg: NetId,
        model: DiodeModel,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            kind: DiodeKind::Shockley(model),
        }
    }

    /// Whether the diode needs Newton-Raphson iteration.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self.kind, DiodeKind::Shockley(_))
    }

    /// Evaluate diode current and conductance at a given voltage.
    ///
    /// Returns (current, conductance). For the Shockley model:
    /// - current = Is * (exp(Vd / (n * Vt)) - 1)
    /// - conductance = dI/dV = Is / (n * Vt) * exp(Vd / (n * Vt))
    pub fn evaluate(&self, vd: f64) -> (f64, f64) {
        match self.kind {
            DiodeKind::Linear { resistance } => (vd / resistance, 1.0 / resistance),
            DiodeKind::Shockley(model) => {
                let nvt = model.emission_coefficient * thermal_voltage(ROOM_TEMPERATURE);
                let arg = vd / nvt;
                if arg > MAX_EXP_ARG {
                    let exp_max = MAX_EXP_ARG.exp();
                    let gd = model.saturation_current * exp_max / nvt;
                    let id = model.saturation_current * (exp_max - 1.0) + gd * (vd - MAX_EXP_ARG * nvt);
                    (id, gd)
                } else {
                    let exp_term = arg.exp();
                    let id = model.saturation_current * (exp_term - 1.0);
                    let gd = model.saturation_current * exp_term / nvt;
                    (id, gd)
                }
            }
        }
    }

    /// Current from anode to cathode at junction voltage `vd`, including
    /// the `gmin` shunt used while solving.
    pub fn current(&self, vd: f64, gmin: f64) -> f64 {
        let (id, _) = self.evaluate(vd);
        if self.is_nonlinear() { id + gmin * vd } else { id }
    }

    /// Small-signal conductance at junction voltage `vd`.
    pub fn small_signal_conductance(&self, vd: f64, gmin: f64) -> f64 {
        let (_, gd) = self.evaluate(vd);
        if self.is_nonlinear() { gd + gmin } else { gd }
    }

    /// Critical voltage above which junction voltage limiting applies.
    pub fn critical_voltage(&self) -> f64 {
        match self.kind {
            DiodeKind::Linear { .. } => f64::INFINITY,
            DiodeKind::Shockley(model) => {
                let nvt = model.emission_coefficient * thermal_voltage(ROOM_TEMPERATURE);
                nvt * (nvt / (std::f64::consts::SQRT_2 * model.saturation_current)).ln()
            }
        }
    }

    /// Limit the step of the junction voltage between Newton iterations.
    ///
    /// `v_new` is the voltage taken from the latest solution, `v_old` the
    /// voltage the diode was last linearized at.
    pub fn limit_voltage(&self, v_new: f64, v_old: f64) -> f64 {
        let DiodeKind::Shockley(model) = self.kind else {
            return v_new;
        };
        let nvt = model.emission_coefficient * thermal_voltage(ROOM_TEMPERATURE);
        let vcrit = self.critical_voltage();

        if v_new > vcrit && (v_new - v_old).abs() > 2.0 * nvt {
            if v_old > 0.0 {
                let arg = 1.0 + (v_new - v_old) / nvt;
                if arg > 0.0 { v_old + nvt * arg.ln() } else { vcrit }
            } else {
                nvt * (v_new / nvt).ln()
            }
        } else {
            v_new
        }
    }

    /// Stamp the diode linearized at junction voltage `vd`.
    ///
    /// At operating point Vd0, the diode is represented as:
    /// - A conductance Gd = dI/dV(Vd0) (plus `gmin`)
    /// - A current source Ieq = Id(Vd0) - Gd * Vd0, anode to cathode
    pub fn stamp_linearized(&self, mna: &mut MnaSystem, vd: f64, gmin: f64) {
        let (id, gd) = self.evaluate(vd);
        let i = self.node_pos.mna_index();
        let j = self.node_neg.mna_index();

        if self.is_nonlinear() {
            let ieq = id - gd * vd;
            mna.stamp_conductance(i, j, gd + gmin);
            mna.stamp_current_source(i, j, ieq);
        } else {
            mna.stamp_conductance(i, j, gd);
        }
    }

    /// Stamp the small-signal conductance at operating voltage `vd`.
    pub fn stamp_small_signal(&self, mna: &mut ComplexMna, vd: f64, gmin: f64) {
        mna.stamp_conductance(
            self.node_pos.mna_index(),
            self.node_neg.mna_index(),
            self.small_signal_conductance(vd, gmin),
        );
    }
}

impl Stamp for Diode {
    fn stamp(&self, mna: &mut MnaSystem) {
        self.stamp_linearized(mna, 0.0, 0.0);
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, _omega: f64) {
        self.stamp_small_signal(mna, 0.0, 0.0);
    }
}
