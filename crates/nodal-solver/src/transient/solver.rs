//! Fixed-step transient simulation.

use std::ops::ControlFlow;

use nalgebra::DVector;
use nodal_devices::{Element, Netlist};

use crate::config::SimulatorConfig;
use crate::dc::{ReactiveModel, solve_point};
use crate::error::{Error, Result};
use crate::readings::{ReactiveCurrents, SimulationResult, StepFailure, map_solution};

use super::companion::{CapacitorState, CompanionSet, InductorState};
use super::result::TransientResult;
use super::types::{InitialConditions, TransientParams};

/// Companion states for a netlist, seeded with the stored device state.
fn companion_set(netlist: &Netlist) -> CompanionSet {
    let mut set = CompanionSet::default();
    for (index, element) in netlist.elements().iter().enumerate() {
        match element {
            Element::Capacitor(c) => {
                let mut state = CapacitorState::new(index, c);
                state.v_prev = c.initial_voltage;
                set.capacitors.push(state);
            }
            Element::Inductor(l) => {
                let mut state = InductorState::new(index, l);
                state.i_prev = l.initial_current;
                set.inductors.push(state);
            }
            _ => {}
        }
    }
    set
}

/// Solve t = 0 with every capacitor held at its stored voltage and every
/// inductor driven by its stored current.
fn held_start(
    netlist: &Netlist,
    set: &mut CompanionSet,
    config: &SimulatorConfig,
) -> Result<(SimulationResult, DVector<f64>)> {
    let num_nodes = netlist.num_nodes();
    let num_branches = netlist.num_branches();

    let (solution, iterations) = solve_point(netlist, ReactiveModel::Stored, config, None)?;
    for (k, cap) in set.capacitors.iter_mut().enumerate() {
        cap.v_prev = cap.voltage_from_solution(&solution);
        cap.i_prev = solution[num_nodes + num_branches + k];
    }
    for ind in &mut set.inductors {
        ind.v_prev = ind.voltage_from_solution(&solution);
    }
    let point = map_solution(
        netlist,
        &solution,
        ReactiveCurrents::Held {
            branch_base: num_branches,
        },
        config.convergence.gmin,
        iterations,
    );
    Ok((point, solution.rows(0, netlist.size()).into_owned()))
}

/// Solve t = 0 as a DC operating point and seed the states from it.
fn operating_point_start(
    netlist: &Netlist,
    set: &mut CompanionSet,
    config: &SimulatorConfig,
) -> Result<(SimulationResult, DVector<f64>)> {
    let (solution, iterations) = solve_point(netlist, ReactiveModel::Static, config, None)?;
    for cap in &mut set.capacitors {
        cap.v_prev = cap.voltage_from_solution(&solution);
        cap.i_prev = 0.0;
    }
    for ind in &mut set.inductors {
        let v = ind.voltage_from_solution(&solution);
        ind.v_prev = v;
        ind.i_prev = match &netlist.elements()[ind.element] {
            Element::Inductor(l) => v * l.dc_conductance(),
            _ => 0.0,
        };
    }
    let point = map_solution(
        netlist,
        &solution,
        ReactiveCurrents::Dc,
        config.convergence.gmin,
        iterations,
    );
    Ok((point, solution))
}

/// Solve t = 0 and seed the companion states from it.
///
/// A stored state that conflicts with the circuit (a capacitor held across
/// an ideal voltage source, an inductor in series with a current source)
/// makes the held system singular; the run then starts from the operating
/// point instead.
///
/// Returns the t = 0 point and its solution truncated to the netlist size.
fn initial_point(
    netlist: &Netlist,
    set: &mut CompanionSet,
    params: &TransientParams,
    config: &SimulatorConfig,
) -> Result<(SimulationResult, DVector<f64>)> {
    let (mut point, solution) = match params.initial_conditions {
        InitialConditions::DeviceState => match held_start(netlist, set, config) {
            Err(error @ Error::SingularMatrix { .. }) => {
                log::warn!(
                    "stored device state cannot be held at t = 0 ({}); starting from the operating point",
                    error
                );
                operating_point_start(netlist, set, config)?
            }
            other => other?,
        },
        InitialConditions::OperatingPoint => operating_point_start(netlist, set, config)?,
    };
    point.time = Some(0.0);
    Ok((point, solution))
}

/// Run a fixed-step transient simulation.
///
/// `on_step` sees every solved point, t = 0 included, and may stop the run
/// by returning `ControlFlow::Break`. A failing step ends the run; the points
/// before it are kept and the failure is reported in the result.
pub fn solve_transient(
    netlist: &Netlist,
    params: &TransientParams,
    config: &SimulatorConfig,
    on_step: &mut dyn FnMut(&SimulationResult) -> ControlFlow<()>,
) -> Result<TransientResult> {
    params.validate()?;

    let num_steps = params.checked_steps(config.max_points)?;
    let mut set = companion_set(netlist);
    log::debug!(
        "transient: {} step(s) of {:e} s, {:?}, {} reactive element(s)",
        num_steps,
        params.time_step,
        params.method,
        set.capacitors.len() + set.inductors.len()
    );

    let mut result = TransientResult {
        points: Vec::with_capacity(num_steps + 1),
        failure: None,
        stopped_early: false,
        final_states: Vec::new(),
        warnings: netlist.warnings().to_vec(),
    };

    let mut solution = match initial_point(netlist, &mut set, params, config) {
        Ok((point, solution)) => {
            let flow = on_step(&point);
            result.points.push(point);
            if flow.is_break() {
                result.stopped_early = true;
            }
            Some(solution)
        }
        Err(error) => {
            log::warn!("transient initial point failed: {}", error);
            result.failure = Some(StepFailure {
                step: 0,
                at: 0.0,
                error,
            });
            None
        }
    };

    let mut t_prev = 0.0;
    for step in 1..=num_steps {
        let Some(x) = solution.as_ref() else { break };
        if result.stopped_early {
            break;
        }

        let t = params.time_at(step);
        let h = t - t_prev;
        let reactive = ReactiveModel::Companion {
            set: &set,
            h,
            method: params.method,
        };

        match solve_point(netlist, reactive, config, Some(x)) {
            Ok((x_new, iterations)) => {
                set.update(&x_new, h, params.method);
                let mut point = map_solution(
                    netlist,
                    &x_new,
                    ReactiveCurrents::Transient(&set),
                    config.convergence.gmin,
                    iterations,
                );
                point.time = Some(t);
                if on_step(&point).is_break() {
                    log::debug!("transient stopped by caller at t = {:e}", t);
                    result.stopped_early = true;
                }
                result.points.push(point);
                solution = Some(x_new);
                t_prev = t;
            }
            Err(error) => {
                log::warn!("transient step {} at t = {:e} failed: {}", step, t, error);
                result.failure = Some(StepFailure { step, at: t, error });
                break;
            }
        }
    }

    let elements = netlist.elements();
    result.final_states = set
        .capacitors
        .iter()
        .map(|c| (elements[c.element].name().to_string(), c.device_state()))
        .chain(
            set.inductors
                .iter()
                .map(|l| (elements[l.element].name().to_string(), l.device_state())),
        )
        .collect();

    Ok(result)
}
