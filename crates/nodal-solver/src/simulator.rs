//! The engine facade: one circuit snapshot, every analysis.

use std::ops::ControlFlow;

use nodal_core::{Circuit, ModelLibrary, NetId, Warning};
use nodal_devices::Netlist;

use crate::ac::{AcParams, AcResult, solve_ac};
use crate::config::SimulatorConfig;
use crate::dc::{DcSweepParams, DcSweepResult, dc_sweep, solve_dc};
use crate::error::{Error, Result};
use crate::readings::{SimulationResult, StepFailure};
use crate::transient::{TransientParams, TransientResult, solve_transient};

/// Where the engine is in an analysis.
///
/// An analysis runs `Idle → BuildingMatrix → Solving`, settles in one of the
/// outcome states, and returns to `Idle`. Parameters, point counts and the
/// swept source are checked while building; a rejection there returns to
/// `Idle` without an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    BuildingMatrix,
    Solving,
    Converged,
    SingularFailure,
    ConvergenceFailure,
}

impl SimulatorState {
    fn of_error(error: &Error) -> Option<Self> {
        match error {
            Error::SingularMatrix { .. } => Some(Self::SingularFailure),
            Error::ConvergenceFailed { .. } => Some(Self::ConvergenceFailure),
            _ => None,
        }
    }
}

/// Circuit simulator over an immutable circuit snapshot.
///
/// The circuit is validated, flattened and mapped once at construction; every
/// analysis then reads the same netlist.
#[derive(Debug)]
pub struct Simulator {
    circuit: Circuit,
    library: ModelLibrary,
    config: SimulatorConfig,
    netlist: Netlist,
    state: SimulatorState,
    last_outcome: Option<SimulatorState>,
}

impl Simulator {
    /// Simulator with an empty model library and default settings.
    pub fn new(circuit: Circuit) -> Result<Self> {
        Self::with_config(circuit, ModelLibrary::new(), SimulatorConfig::default())
    }

    /// Simulator with an explicit model library and settings.
    pub fn with_config(
        circuit: Circuit,
        library: ModelLibrary,
        config: SimulatorConfig,
    ) -> Result<Self> {
        let netlist = Netlist::build(&circuit, &library, &config.netlist_options())?;
        log::debug!(
            "netlist ready: {} element(s), {} node(s), {} branch(es), {} warning(s)",
            netlist.elements().len(),
            netlist.num_nodes(),
            netlist.num_branches(),
            netlist.warnings().len()
        );
        Ok(Self {
            circuit,
            library,
            config,
            netlist,
            state: SimulatorState::Idle,
            last_outcome: None,
        })
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Non-fatal findings from building the netlist.
    pub fn warnings(&self) -> &[Warning] {
        self.netlist.warnings()
    }

    /// Look up a net by `"0"`, `"gnd"`, or `device.port`.
    pub fn net(&self, name: &str) -> Option<NetId> {
        self.netlist.topology().find_net(name)
    }

    /// Current state of the engine.
    pub fn state(&self) -> SimulatorState {
        self.state
    }

    /// Outcome of the most recent analysis, if it reached the solver.
    pub fn last_outcome(&self) -> Option<SimulatorState> {
        self.last_outcome
    }

    /// A new simulator whose circuit carries the final reactive state of a
    /// transient run. Only top-level devices are updated.
    pub fn with_final_states(&self, result: &TransientResult) -> Result<Simulator> {
        let states = result
            .final_states
            .iter()
            .filter(|(name, _)| self.circuit.device(name).is_some())
            .map(|(name, state)| (name.as_str(), *state));
        let circuit = self.circuit.with_states(states)?;
        Self::with_config(circuit, self.library.clone(), self.config.clone())
    }

    /// Solve the DC operating point.
    pub fn dc_operating_point(&mut self) -> Result<SimulationResult> {
        self.run(
            "DC operating point",
            |_, _| Ok(1),
            |netlist, config| solve_dc(netlist, config),
            |_| None,
        )
    }

    /// Sweep one voltage or current source from `start` to `stop`.
    pub fn dc_sweep(
        &mut self,
        device_id: &str,
        start: f64,
        stop: f64,
        step: f64,
    ) -> Result<DcSweepResult> {
        let params = DcSweepParams::new(device_id, start, stop, step);
        self.run(
            "DC sweep",
            |netlist, config| {
                let count = params.num_points(config.max_points)?;
                netlist.with_source_value(&params.source, params.start)?;
                Ok(count)
            },
            |netlist, config| dc_sweep(netlist, &params, config),
            |r| r.failure.as_ref(),
        )
    }

    /// Fixed-step transient run with the configured method and initial
    /// conditions.
    pub fn transient(&mut self, duration: f64, time_step: f64) -> Result<TransientResult> {
        let params = TransientParams {
            duration,
            time_step,
            method: self.config.method,
            initial_conditions: self.config.initial_conditions,
        };
        self.transient_with(&params, |_| ControlFlow::Continue(()))
    }

    /// Transient run with explicit parameters and a per-step callback that
    /// may stop the run.
    pub fn transient_with(
        &mut self,
        params: &TransientParams,
        mut on_step: impl FnMut(&SimulationResult) -> ControlFlow<()>,
    ) -> Result<TransientResult> {
        self.run(
            "transient",
            |_, config| {
                params.validate()?;
                Ok(params.checked_steps(config.max_points)? + 1)
            },
            |netlist, config| solve_transient(netlist, params, config, &mut on_step),
            |r| r.failure.as_ref(),
        )
    }

    /// AC sweep with `points_per_decade` logarithmic points.
    pub fn ac(&mut self, fstart: f64, fstop: f64, points_per_decade: usize) -> Result<AcResult> {
        self.ac_sweep(&AcParams::decade(fstart, fstop, points_per_decade))
    }

    /// AC sweep with explicit parameters.
    pub fn ac_sweep(&mut self, params: &AcParams) -> Result<AcResult> {
        self.run(
            "AC",
            |_, config| params.checked_points(config.max_points),
            |netlist, config| solve_ac(netlist, params, config),
            |r| r.failure.as_ref(),
        )
    }

    fn transition(&mut self, next: SimulatorState) {
        log::debug!("simulator: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Drive one analysis through the state machine.
    ///
    /// `prepare` checks the request against the netlist and returns the
    /// number of points it will solve; `solve` then runs the analysis.
    fn run<T>(
        &mut self,
        analysis: &str,
        prepare: impl FnOnce(&Netlist, &SimulatorConfig) -> Result<usize>,
        solve: impl FnOnce(&Netlist, &SimulatorConfig) -> Result<T>,
        failure_of: impl Fn(&T) -> Option<&StepFailure>,
    ) -> Result<T> {
        self.last_outcome = None;
        self.transition(SimulatorState::BuildingMatrix);
        let points = match prepare(&self.netlist, &self.config) {
            Ok(points) => points,
            Err(error) => {
                log::debug!("{} rejected: {}", analysis, error);
                self.transition(SimulatorState::Idle);
                return Err(error);
            }
        };

        log::info!(
            "{}: {} point(s), {} node(s), {} branch(es), {} element(s)",
            analysis,
            points,
            self.netlist.num_nodes(),
            self.netlist.num_branches(),
            self.netlist.elements().len()
        );
        for warning in self.netlist.warnings() {
            log::warn!("{}", warning);
        }

        self.transition(SimulatorState::Solving);
        let outcome = solve(&self.netlist, &self.config);

        let settled = match &outcome {
            Ok(result) => match failure_of(result) {
                Some(failure) => SimulatorState::of_error(&failure.error),
                None => Some(SimulatorState::Converged),
            },
            Err(error) => SimulatorState::of_error(error),
        };
        if let Some(state) = settled {
            self.transition(state);
        }
        self.last_outcome = settled;
        self.transition(SimulatorState::Idle);
        outcome
    }
}
