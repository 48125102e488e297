//! AC small-signal frequency-domain analysis.

use std::f64::consts::PI;

use nalgebra::DVector;
use nodal_core::mna::ComplexMna;
use nodal_core::{NetId, Warning};
use nodal_devices::{Element, Netlist, Stamp};
use num_complex::Complex;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimulatorConfig;
use crate::dc::{ReactiveModel, solve_point};
use crate::error::{Error, Result};
use crate::linear::solve_with_tolerance;
use crate::readings::StepFailure;

/// AC sweep type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSweepType {
    /// Linear frequency spacing.
    Linear,
    /// Logarithmic spacing, points per decade.
    Decade,
    /// Logarithmic spacing, points per octave.
    Octave,
}

/// AC analysis parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AcParams {
    /// Start frequency (Hz).
    pub fstart: f64,
    /// Stop frequency (Hz).
    pub fstop: f64,
    /// Number of points (total for Linear, per decade/octave for log sweeps).
    pub num_points: usize,
    /// Sweep type.
    pub sweep_type: AcSweepType,
}

impl AcParams {
    /// Decade sweep with `points_per_decade` points per decade.
    pub fn decade(fstart: f64, fstop: f64, points_per_decade: usize) -> Self {
        Self {
            fstart,
            fstop,
            num_points: points_per_decade,
            sweep_type: AcSweepType::Decade,
        }
    }

    /// Reject empty or non-positive frequency ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.fstart.is_finite() && self.fstart > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "start frequency must be positive, got {}",
                self.fstart
            )));
        }
        if !(self.fstop.is_finite() && self.fstop >= self.fstart) {
            return Err(Error::InvalidParameter(format!(
                "stop frequency {} is below start frequency {}",
                self.fstop, self.fstart
            )));
        }
        if self.num_points == 0 {
            return Err(Error::InvalidParameter(
                "AC sweep needs at least one point".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and reject sweeps of more than `max_points` frequencies.
    pub fn checked_points(&self, max_points: usize) -> Result<usize> {
        self.validate()?;
        let count = match self.sweep_type {
            AcSweepType::Linear => self.num_points as f64,
            AcSweepType::Decade => log_point_bound(self, 10.0),
            AcSweepType::Octave => log_point_bound(self, 2.0),
        };
        if !(count <= max_points as f64) {
            return Err(Error::InvalidParameter(format!(
                "AC sweep from {} Hz to {} Hz needs {:e} points, limit is {}",
                self.fstart, self.fstop, count, max_points
            )));
        }
        Ok(count as usize)
    }
}

/// Generate frequency points for an AC sweep.
pub fn generate_frequencies(params: &AcParams) -> Vec<f64> {
    match params.sweep_type {
        AcSweepType::Linear => {
            if params.num_points <= 1 {
                return vec![params.fstart];
            }
            let step = (params.fstop - params.fstart) / (params.num_points as f64 - 1.0);
            (0..params.num_points)
                .map(|i| params.fstart + step * i as f64)
                .collect()
        }
        AcSweepType::Decade => log_frequencies(params, 10.0),
        AcSweepType::Octave => log_frequencies(params, 2.0),
    }
}

/// Points generated before the stop-frequency filter.
fn log_point_bound(params: &AcParams, base: f64) -> f64 {
    let spans = (params.fstop / params.fstart).log(base);
    (params.num_points as f64 * spans).ceil() + 1.0
}

fn log_frequencies(params: &AcParams, base: f64) -> Vec<f64> {
    let total_points = log_point_bound(params, base) as usize;
    (0..total_points)
        .map(|i| params.fstart * base.powf(i as f64 / params.num_points as f64))
        .filter(|&f| f <= params.fstop * 1.001)
        .collect()
}

/// Voltage and current phasors of one device at one frequency.
///
/// Current flows from terminal 0 to terminal 1 through the device.
#[derive(Debug, Clone, PartialEq)]
pub struct AcReading {
    pub device: String,
    pub voltage: Complex<f64>,
    pub current: Complex<f64>,
}

/// A single frequency point in AC analysis.
#[derive(Debug, Clone)]
pub struct AcPoint {
    /// Frequency (Hz).
    pub frequency: f64,
    /// Node voltage phasors indexed by net id; entry 0 is ground.
    pub node_voltages: Vec<Complex<f64>>,
    /// Voltage source branch current phasors, in branch order.
    pub aux_currents: Vec<Complex<f64>>,
    /// Per-device phasors in element order.
    pub readings: Vec<AcReading>,
}

impl AcPoint {
    /// Voltage phasor of a net.
    pub fn voltage(&self, net: NetId) -> Complex<f64> {
        self.node_voltages
            .get(net.as_u32() as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Reading of a device by name.
    pub fn reading(&self, device: &str) -> Option<&AcReading> {
        self.readings.iter().find(|r| r.device == device)
    }
}

/// Result of AC analysis.
#[derive(Debug)]
pub struct AcResult {
    /// Solved frequency points in sweep order.
    pub points: Vec<AcPoint>,
    /// The point that stopped the sweep, if any.
    pub failure: Option<StepFailure>,
    pub warnings: Vec<Warning>,
}

impl AcResult {
    /// Whether every requested point was solved.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Get all frequencies.
    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }

    /// Get complex voltage of a net across all frequencies.
    pub fn voltage_at(&self, net: NetId) -> Vec<(f64, Complex<f64>)> {
        self.points
            .iter()
            .map(|p| (p.frequency, p.voltage(net)))
            .collect()
    }

    /// Get voltage magnitude of a net across all frequencies.
    pub fn magnitude(&self, net: NetId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency, p.voltage(net).norm()))
            .collect()
    }

    /// Get voltage magnitude in dB of a net across all frequencies.
    pub fn magnitude_db(&self, net: NetId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency, 20.0 * p.voltage(net).norm().log10()))
            .collect()
    }

    /// Get voltage phase in degrees of a net across all frequencies.
    pub fn phase_deg(&self, net: NetId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency, p.voltage(net).arg() * 180.0 / PI))
            .collect()
    }
}

/// Stamp and solve one frequency point.
fn solve_frequency(
    netlist: &Netlist,
    operating_point: Option<&DVector<f64>>,
    frequency: f64,
    config: &SimulatorConfig,
) -> Result<AcPoint> {
    let omega = 2.0 * PI * frequency;
    let num_nodes = netlist.num_nodes();
    let mut mna = ComplexMna::new(num_nodes, netlist.num_branches());

    for element in netlist.elements() {
        match (element, operating_point) {
            (Element::Diode(d), Some(op)) if d.is_nonlinear() => {
                d.stamp_small_signal(&mut mna, element.voltage(op), config.convergence.gmin);
            }
            _ => element.stamp_ac(&mut mna, omega),
        }
    }

    let solution = solve_with_tolerance(mna.matrix(), mna.rhs(), config.pivot_tolerance)?;

    let mut node_voltages = Vec::with_capacity(num_nodes + 1);
    node_voltages.push(Complex::new(0.0, 0.0));
    node_voltages.extend(solution.rows(0, num_nodes).iter().copied());
    let aux_currents: Vec<Complex<f64>> =
        solution.rows(num_nodes, netlist.num_branches()).iter().copied().collect();

    let readings = netlist
        .elements()
        .iter()
        .map(|element| {
            let (pos, neg) = element.nodes();
            let at = |net: NetId| node_voltages[net.as_u32() as usize];
            let voltage = at(pos) - at(neg);
            let current = match element {
                Element::Resistor(r) => voltage * r.conductance(),
                Element::Capacitor(c) => voltage * Complex::new(0.0, omega * c.capacitance),
                Element::Inductor(l) if omega > 0.0 => {
                    voltage * Complex::new(0.0, -1.0 / (omega * l.inductance))
                }
                Element::Inductor(l) => voltage * l.dc_conductance(),
                Element::VoltageSource(v) => aux_currents[v.branch_index],
                Element::CurrentSource(i) => i.ac_phasor(),
                Element::Diode(d) => {
                    let g = match operating_point {
                        Some(op) if d.is_nonlinear() => {
                            d.small_signal_conductance(element.voltage(op), config.convergence.gmin)
                        }
                        _ => d.small_signal_conductance(0.0, 0.0),
                    };
                    voltage * g
                }
            };
            AcReading {
                device: element.name().to_string(),
                voltage,
                current,
            }
        })
        .collect();

    Ok(AcPoint {
        frequency,
        node_voltages,
        aux_currents,
        readings,
    })
}

/// Run an AC sweep.
///
/// Nonlinear diodes are replaced by their small-signal conductance at the DC
/// operating point, which is solved first. A failing frequency ends the
/// sweep; the points before it are returned along with the failure.
pub fn solve_ac(netlist: &Netlist, params: &AcParams, config: &SimulatorConfig) -> Result<AcResult> {
    params.checked_points(config.max_points)?;

    let operating_point = if netlist.has_nonlinear() {
        let (solution, _) = solve_point(netlist, ReactiveModel::Static, config, None)?;
        Some(solution)
    } else {
        None
    };

    let frequencies = generate_frequencies(params);
    log::info!(
        "AC analysis: {} point(s) from {:e} Hz to {:e} Hz, {} unknowns",
        frequencies.len(),
        params.fstart,
        params.fstop,
        netlist.size()
    );

    let solve_at = |frequency: f64| solve_frequency(netlist, operating_point.as_ref(), frequency, config);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<AcPoint>> = frequencies.par_iter().map(|&f| solve_at(f)).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes = frequencies.iter().map(|&f| solve_at(f));

    let mut points = Vec::with_capacity(frequencies.len());
    let mut failure = None;
    for (step, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(point) => points.push(point),
            Err(error) => {
                log::warn!(
                    "AC sweep stopped at {:e} Hz: {}",
                    frequencies[step],
                    error
                );
                failure = Some(StepFailure {
                    step,
                    at: frequencies[step],
                    error,
                });
                break;
            }
        }
    }

    Ok(AcResult {
        points,
        failure,
        warnings: netlist.warnings().to_vec(),
    })
}
