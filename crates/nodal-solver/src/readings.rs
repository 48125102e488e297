//! Result mapping: solved vectors to node voltages and per-device readings.

use nalgebra::DVector;
use nodal_core::NetId;
use nodal_devices::{Element, Netlist};

use crate::error::Error;
use crate::transient::CompanionSet;

/// Voltage, current and power of one device at one solved point.
///
/// Current flows from terminal 0 to terminal 1 through the device; power is
/// V·I with the passive sign convention (negative when delivering).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub device: String,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

/// One solved point of an analysis.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Node voltages indexed by net id; entry 0 is ground and always 0.
    pub node_voltages: Vec<f64>,
    /// Branch currents of the voltage sources, in branch order.
    pub aux_currents: Vec<f64>,
    /// Simulation time (transient only).
    pub time: Option<f64>,
    /// Swept source value (DC sweep only).
    pub sweep_value: Option<f64>,
    /// Per-device readings in element order.
    pub readings: Vec<DeviceReading>,
    /// Newton-Raphson iterations spent (1 for a linear solve).
    pub iterations: usize,
}

impl SimulationResult {
    /// Voltage of a net.
    pub fn voltage(&self, net: NetId) -> f64 {
        self.node_voltages
            .get(net.as_u32() as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Reading of a device by name.
    pub fn reading(&self, device: &str) -> Option<&DeviceReading> {
        self.readings.iter().find(|r| r.device == device)
    }

    /// The MNA unknown vector this result was mapped from.
    pub fn solution(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.node_voltages.len().saturating_sub(1) + self.aux_currents.len(),
            self.node_voltages
                .iter()
                .skip(1)
                .chain(self.aux_currents.iter())
                .copied(),
        )
    }
}

/// A failed point of a stepwise analysis.
#[derive(Debug)]
pub struct StepFailure {
    /// Index of the failed step (0 is the starting point).
    pub step: usize,
    /// Time, sweep value or frequency of the failed step.
    pub at: f64,
    pub error: Error,
}

/// Where reactive element currents come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReactiveCurrents<'a> {
    /// Capacitors carry nothing; inductors conduct through their DC resistance.
    Dc,
    /// Capacitors are held by branch unknowns starting at `branch_base`;
    /// inductors carry their stored current.
    Held { branch_base: usize },
    /// Companion model currents after a transient step.
    Transient(&'a CompanionSet),
}

/// Map a solved vector onto node voltages and device readings.
pub(crate) fn map_solution(
    netlist: &Netlist,
    solution: &DVector<f64>,
    reactive: ReactiveCurrents<'_>,
    gmin: f64,
    iterations: usize,
) -> SimulationResult {
    let num_nodes = netlist.num_nodes();
    let num_branches = netlist.num_branches();

    let mut node_voltages = Vec::with_capacity(num_nodes + 1);
    node_voltages.push(0.0);
    node_voltages.extend(solution.rows(0, num_nodes).iter().copied());
    let aux_currents = solution.rows(num_nodes, num_branches).iter().copied().collect();

    // Reactive states are kept in element order, one per capacitor or inductor
    let mut cap_k = 0;
    let mut ind_k = 0;
    let readings = netlist
        .elements()
        .iter()
        .map(|element| {
            let voltage = element.voltage(solution);
            let current = match element {
                Element::Resistor(r) => voltage / r.resistance,
                Element::VoltageSource(v) => solution[num_nodes + v.branch_index],
                Element::CurrentSource(i) => i.current,
                Element::Diode(d) => d.current(voltage, gmin),
                Element::Capacitor(_) => {
                    let k = cap_k;
                    cap_k += 1;
                    match reactive {
                        ReactiveCurrents::Dc => 0.0,
                        ReactiveCurrents::Held { branch_base } => {
                            solution[num_nodes + branch_base + k]
                        }
                        ReactiveCurrents::Transient(set) => {
                            set.capacitors.get(k).map_or(0.0, |c| c.i_prev)
                        }
                    }
                }
                Element::Inductor(l) => {
                    let k = ind_k;
                    ind_k += 1;
                    match reactive {
                        ReactiveCurrents::Dc => voltage / l.dc_resistance,
                        ReactiveCurrents::Held { .. } => l.initial_current,
                        ReactiveCurrents::Transient(set) => {
                            set.inductors.get(k).map_or(0.0, |l| l.i_prev)
                        }
                    }
                }
            };
            DeviceReading {
                device: element.name().to_string(),
                voltage,
                current,
                power: voltage * current,
            }
        })
        .collect();

    SimulationResult {
        node_voltages,
        aux_currents,
        time: None,
        sweep_value: None,
        readings,
        iterations,
    }
}

/// Net current imbalance at every net, indexed by net id.
///
/// Each entry sums the reading currents leaving that net through terminal 0
/// minus those entering through terminal 1; a solved point gives zeros
/// within solver tolerance.
pub fn kcl_residuals(netlist: &Netlist, result: &SimulationResult) -> Vec<f64> {
    let mut residuals = vec![0.0; netlist.num_nodes() + 1];
    for (element, reading) in netlist.elements().iter().zip(&result.readings) {
        let (pos, neg) = element.nodes();
        residuals[pos.as_u32() as usize] += reading.current;
        residuals[neg.as_u32() as usize] -= reading.current;
    }
    residuals
}
