//! Result types for transient analysis.

use nodal_core::{DeviceState, NetId, Warning};

use crate::readings::{SimulationResult, StepFailure};

/// Result of a transient simulation.
#[derive(Debug)]
pub struct TransientResult {
    /// Solved timepoints, t = 0 first.
    pub points: Vec<SimulationResult>,
    /// The step that stopped the run, if any.
    pub failure: Option<StepFailure>,
    /// Set when the per-step callback asked to stop.
    pub stopped_early: bool,
    /// Reactive device state after the last solved point, by device name.
    pub final_states: Vec<(String, DeviceState)>,
    pub warnings: Vec<Warning>,
}

impl TransientResult {
    /// Whether every requested step was solved.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.stopped_early
    }

    /// Get the voltage of a net across all timepoints.
    pub fn voltage_waveform(&self, net: NetId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.time.unwrap_or(0.0), p.voltage(net)))
            .collect()
    }

    /// Get all time values.
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.time).collect()
    }

    /// Final state of one reactive device.
    pub fn final_state(&self, device: &str) -> Option<DeviceState> {
        self.final_states
            .iter()
            .find(|(name, _)| name == device)
            .map(|(_, state)| *state)
    }

    /// Voltage of a net at a specific time.
    ///
    /// Uses linear interpolation between the two nearest timepoints and
    /// clamps to the first or last point outside the simulated range.
    /// Returns None when no point was solved.
    pub fn voltage_at(&self, net: NetId, time: f64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;

        if time <= first.time.unwrap_or(0.0) {
            return Some(first.voltage(net));
        }
        if time >= last.time.unwrap_or(0.0) {
            return Some(last.voltage(net));
        }

        self.points.windows(2).find_map(|pair| {
            let t0 = pair[0].time.unwrap_or(0.0);
            let t1 = pair[1].time.unwrap_or(0.0);
            if time >= t0 && time <= t1 {
                let alpha = (time - t0) / (t1 - t0);
                Some(pair[0].voltage(net) * (1.0 - alpha) + pair[1].voltage(net) * alpha)
            } else {
                None
            }
        })
    }
}
