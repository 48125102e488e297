//! Simulator configuration.

use nodal_devices::NetlistOptions;

use crate::linear::DEFAULT_PIVOT_TOLERANCE;
use crate::newton::ConvergenceCriteria;
use crate::transient::{InitialConditions, IntegrationMethod};

/// Largest number of points a single sweep or transient run may produce.
pub const DEFAULT_MAX_POINTS: usize = 1_000_000;

/// Numerical and policy settings shared by every analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Pivots below this magnitude make the system singular.
    pub pivot_tolerance: f64,
    /// Resistance standing in for an inductor at DC (Ω).
    pub inductor_dc_resistance: f64,
    /// Forward resistance of a linear diode whose value is not positive (Ω).
    pub diode_default_resistance: f64,
    /// Newton-Raphson settings.
    pub convergence: ConvergenceCriteria,
    /// Companion-model integration method for transient analysis.
    pub method: IntegrationMethod,
    /// How transient analysis seeds its first point.
    pub initial_conditions: InitialConditions,
    /// Skip devices of unknown type instead of failing.
    pub ignore_unsupported: bool,
    /// Upper bound on the points of a sweep or transient run.
    pub max_points: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            inductor_dc_resistance: 1e-6,
            diode_default_resistance: 10.0,
            convergence: ConvergenceCriteria::default(),
            method: IntegrationMethod::BackwardEuler,
            initial_conditions: InitialConditions::DeviceState,
            ignore_unsupported: false,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl SimulatorConfig {
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    pub fn with_inductor_dc_resistance(mut self, ohms: f64) -> Self {
        self.inductor_dc_resistance = ohms;
        self
    }

    pub fn with_diode_default_resistance(mut self, ohms: f64) -> Self {
        self.diode_default_resistance = ohms;
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceCriteria) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_initial_conditions(mut self, initial_conditions: InitialConditions) -> Self {
        self.initial_conditions = initial_conditions;
        self
    }

    pub fn with_ignore_unsupported(mut self, ignore: bool) -> Self {
        self.ignore_unsupported = ignore;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Options for netlist construction.
    pub fn netlist_options(&self) -> NetlistOptions {
        NetlistOptions {
            inductor_dc_resistance: self.inductor_dc_resistance,
            diode_default_resistance: self.diode_default_resistance,
            ignore_unsupported: self.ignore_unsupported,
        }
    }
}
