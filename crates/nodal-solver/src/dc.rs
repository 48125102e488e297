//! DC operating point and DC sweep analysis.

use nalgebra::DVector;
use nodal_core::Warning;
use nodal_core::mna::MnaSystem;
use nodal_devices::{Element, Netlist, Stamp};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimulatorConfig;
use crate::error::{Error, Result};
use crate::linear::solve_with_tolerance;
use crate::newton::{NonlinearStamper, solve_newton_raphson};
use crate::readings::{ReactiveCurrents, SimulationResult, StepFailure, map_solution};
use crate::transient::{CompanionSet, IntegrationMethod};

/// How capacitors and inductors enter the system being solved.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReactiveModel<'a> {
    /// DC: capacitors open, inductors through their DC resistance.
    Static,
    /// Stored state: capacitors held at their stored voltage on extra
    /// branches, inductors forced to their stored current.
    Stored,
    /// Transient step: companion models replace every reactive element.
    Companion {
        set: &'a CompanionSet,
        h: f64,
        method: IntegrationMethod,
    },
}

/// Stamps a whole netlist, linearizing diodes at each Newton iterate.
pub(crate) struct CircuitStamper<'a> {
    netlist: &'a Netlist,
    reactive: ReactiveModel<'a>,
    gmin: f64,
    /// Voltage each nonlinear junction was last linearized at.
    junctions: Vec<f64>,
}

impl<'a> CircuitStamper<'a> {
    pub(crate) fn new(
        netlist: &'a Netlist,
        reactive: ReactiveModel<'a>,
        gmin: f64,
        initial_guess: Option<&DVector<f64>>,
    ) -> Self {
        let junctions = netlist
            .elements()
            .iter()
            .filter(|e| e.is_nonlinear())
            .map(|e| initial_guess.map(|x| e.voltage(x)).unwrap_or(0.0))
            .collect();
        Self {
            netlist,
            reactive,
            gmin,
            junctions,
        }
    }

    /// Branch unknowns of the stamped system, held capacitors included.
    pub(crate) fn num_branches(&self) -> usize {
        let held = match self.reactive {
            ReactiveModel::Stored => self
                .netlist
                .elements()
                .iter()
                .filter(|e| matches!(e, Element::Capacitor(_)))
                .count(),
            _ => 0,
        };
        self.netlist.num_branches() + held
    }
}

impl NonlinearStamper for CircuitStamper<'_> {
    fn stamp_at(&mut self, mna: &mut MnaSystem, solution: &DVector<f64>) {
        let mut held = self.netlist.num_branches();
        let mut junction = 0;

        for element in self.netlist.elements() {
            match (element, self.reactive) {
                (Element::Capacitor(c), ReactiveModel::Stored) => {
                    mna.stamp_voltage_source(
                        c.node_pos.mna_index(),
                        c.node_neg.mna_index(),
                        held,
                        c.initial_voltage,
                    );
                    held += 1;
                }
                (Element::Inductor(l), ReactiveModel::Stored) => {
                    mna.stamp_current_source(
                        l.node_pos.mna_index(),
                        l.node_neg.mna_index(),
                        l.initial_current,
                    );
                }
                (
                    Element::Capacitor(_) | Element::Inductor(_),
                    ReactiveModel::Companion { .. },
                ) => {}
                (Element::Diode(d), _) if d.is_nonlinear() => {
                    let vd = d.limit_voltage(element.voltage(solution), self.junctions[junction]);
                    self.junctions[junction] = vd;
                    junction += 1;
                    d.stamp_linearized(mna, vd, self.gmin);
                }
                _ => element.stamp(mna),
            }
        }

        if let ReactiveModel::Companion { set, h, method } = self.reactive {
            set.stamp(mna, h, method);
        }
    }
}

/// Solve one point: a single solve for linear netlists, Newton-Raphson
/// otherwise. Returns the solution and the iteration count.
pub(crate) fn solve_point(
    netlist: &Netlist,
    reactive: ReactiveModel<'_>,
    config: &SimulatorConfig,
    initial_guess: Option<&DVector<f64>>,
) -> Result<(DVector<f64>, usize)> {
    let mut stamper = CircuitStamper::new(netlist, reactive, config.convergence.gmin, initial_guess);
    let num_nodes = netlist.num_nodes();
    let num_branches = stamper.num_branches();

    if !netlist.has_nonlinear() {
        let mut mna = MnaSystem::new(num_nodes, num_branches);
        stamper.stamp_at(&mut mna, &DVector::zeros(num_nodes + num_branches));
        let solution = solve_with_tolerance(mna.matrix(), mna.rhs(), config.pivot_tolerance)?;
        return Ok((solution, 1));
    }

    let result = solve_newton_raphson(
        num_nodes,
        num_branches,
        &mut stamper,
        &config.convergence,
        config.pivot_tolerance,
        initial_guess,
    )?;
    Ok((result.solution, result.iterations))
}

/// Solve the DC operating point.
pub fn solve_dc(netlist: &Netlist, config: &SimulatorConfig) -> Result<SimulationResult> {
    let (solution, iterations) = solve_point(netlist, ReactiveModel::Static, config, None)?;
    log::debug!("DC operating point solved in {} iteration(s)", iterations);
    Ok(map_solution(
        netlist,
        &solution,
        ReactiveCurrents::Dc,
        config.convergence.gmin,
        iterations,
    ))
}

/// Parameters for a DC sweep of one independent source.
#[derive(Debug, Clone, PartialEq)]
pub struct DcSweepParams {
    /// Name of the voltage or current source being swept.
    pub source: String,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl DcSweepParams {
    pub fn new(source: impl Into<String>, start: f64, stop: f64, step: f64) -> Self {
        Self {
            source: source.into(),
            start,
            stop,
            step,
        }
    }

    /// Number of sweep points, start and stop included.
    ///
    /// The step must be nonzero and point from start towards stop, and the
    /// sweep may not exceed `max_points` points.
    pub fn num_points(&self, max_points: usize) -> Result<usize> {
        let span = self.stop - self.start;
        if !self.start.is_finite() || !self.stop.is_finite() || !self.step.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "sweep bounds must be finite (start {}, stop {}, step {})",
                self.start, self.stop, self.step
            )));
        }
        if self.step == 0.0 || span * self.step < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sweep step {} does not lead from {} to {}",
                self.step, self.start, self.stop
            )));
        }

        let count = (span / self.step + 1e-9).floor() + 1.0;
        if !(count <= max_points as f64) {
            return Err(Error::InvalidParameter(format!(
                "sweep from {} to {} by {} needs {:e} points, limit is {}",
                self.start, self.stop, self.step, count, max_points
            )));
        }
        Ok(count as usize)
    }

    /// Source value of sweep point `index`.
    pub fn value_at(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Source values of every sweep point, start first, generated lazily.
    pub fn values(&self, max_points: usize) -> Result<impl Iterator<Item = f64> + '_> {
        let count = self.num_points(max_points)?;
        Ok((0..count).map(move |i| self.value_at(i)))
    }
}

/// Result of a DC sweep.
#[derive(Debug)]
pub struct DcSweepResult {
    /// Name of the swept source.
    pub source: String,
    /// Solved points in sweep order.
    pub points: Vec<SimulationResult>,
    /// The point that stopped the sweep, if any.
    pub failure: Option<StepFailure>,
    pub warnings: Vec<Warning>,
}

impl DcSweepResult {
    /// Whether every requested point was solved.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Swept source values of the solved points.
    pub fn sweep_values(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.sweep_value).collect()
    }

    /// (source value, voltage) pairs for one net.
    pub fn voltage_curve(&self, net: nodal_core::NetId) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.sweep_value.unwrap_or(0.0), p.voltage(net)))
            .collect()
    }
}

/// Sweep one independent source and solve the operating point at each value.
///
/// A failing point ends the sweep; the points before it are returned along
/// with the failure.
pub fn dc_sweep(
    netlist: &Netlist,
    params: &DcSweepParams,
    config: &SimulatorConfig,
) -> Result<DcSweepResult> {
    let count = params.num_points(config.max_points)?;
    // Reject unknown or non-source devices before solving anything
    netlist.with_source_value(&params.source, params.start)?;

    log::debug!("DC sweep of {} over {} point(s)", params.source, count);

    let solve_at = |value: f64, guess: Option<&DVector<f64>>| -> Result<SimulationResult> {
        let point = netlist.with_source_value(&params.source, value)?;
        let (solution, iterations) = solve_point(&point, ReactiveModel::Static, config, guess)?;
        let mut result = map_solution(
            &point,
            &solution,
            ReactiveCurrents::Dc,
            config.convergence.gmin,
            iterations,
        );
        result.sweep_value = Some(value);
        Ok(result)
    };

    let mut points = Vec::with_capacity(count);
    let mut failure = None;

    #[cfg(feature = "parallel")]
    {
        let outcomes: Vec<Result<SimulationResult>> = (0..count)
            .into_par_iter()
            .map(|i| solve_at(params.value_at(i), None))
            .collect();
        for (step, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(point) => points.push(point),
                Err(error) => {
                    failure = Some(StepFailure {
                        step,
                        at: params.value_at(step),
                        error,
                    });
                    break;
                }
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut guess: Option<DVector<f64>> = None;
        for (step, value) in params.values(config.max_points)?.enumerate() {
            match solve_at(value, guess.as_ref()) {
                Ok(point) => {
                    guess = Some(point.solution());
                    points.push(point);
                }
                Err(error) => {
                    failure = Some(StepFailure {
                        step,
                        at: value,
                        error,
                    });
                    break;
                }
            }
        }
    }

    if let Some(f) = &failure {
        log::warn!(
            "DC sweep of {} stopped at {} = {}: {}",
            params.source,
            params.source,
            f.at,
            f.error
        );
    }

    Ok(DcSweepResult {
        source: params.source.clone(),
        points,
        failure,
        warnings: netlist.warnings().to_vec(),
    })
}
