//! Type definitions for transient analysis.

use crate::error::{Error, Result};

/// How the first transient point (t = 0) is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialConditions {
    /// Hold each capacitor at its stored voltage and drive each inductor
    /// with its stored current while solving for t = 0.
    #[default]
    DeviceState,
    /// Start from the plain DC operating point (capacitors open, inductors
    /// shorted).
    OperatingPoint,
}

/// Integration method for transient analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    /// Backward Euler (first order, A-stable).
    #[default]
    BackwardEuler,
    /// Trapezoidal (second order, A-stable).
    Trapezoidal,
}

/// Transient analysis parameters.
#[derive(Debug, Clone)]
pub struct TransientParams {
    /// Stop time (s).
    pub duration: f64,
    /// Fixed timestep (s).
    pub time_step: f64,
    /// Integration method.
    pub method: IntegrationMethod,
    /// Source of the t = 0 point.
    pub initial_conditions: InitialConditions,
}

impl TransientParams {
    /// Parameters with Backward Euler and stored device state.
    pub fn new(duration: f64, time_step: f64) -> Self {
        Self {
            duration,
            time_step,
            method: IntegrationMethod::default(),
            initial_conditions: InitialConditions::default(),
        }
    }

    /// Reject non-positive or non-finite times.
    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "transient duration must be positive, got {}",
                self.duration
            )));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "transient time step must be positive, got {}",
                self.time_step
            )));
        }
        Ok(())
    }

    /// Number of steps after t = 0.
    ///
    /// `duration / time_step` rounded up, except that a ratio within 1e-9 of
    /// an integer is taken as that integer.
    pub fn num_steps(&self) -> usize {
        self.step_ratio() as usize
    }

    /// Step count, rejected when the run would produce more than
    /// `max_points` points including t = 0.
    pub fn checked_steps(&self, max_points: usize) -> Result<usize> {
        let steps = self.step_ratio();
        if !(steps < max_points as f64) {
            return Err(Error::InvalidParameter(format!(
                "transient of {} s at {} s steps needs {:e} points, limit is {}",
                self.duration,
                self.time_step,
                steps + 1.0,
                max_points
            )));
        }
        Ok(steps as usize)
    }

    fn step_ratio(&self) -> f64 {
        let ratio = self.duration / self.time_step;
        let nearest = ratio.round();
        let steps = if (ratio - nearest).abs() < 1e-9 {
            nearest
        } else {
            ratio.ceil()
        };
        steps.max(1.0)
    }

    /// Time of step `step` (1-based); the last step lands on `duration`.
    pub fn time_at(&self, step: usize) -> f64 {
        if step >= self.num_steps() {
            self.duration
        } else {
            step as f64 * self.time_step
        }
    }
}
