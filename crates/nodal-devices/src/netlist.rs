//! Netlist construction: circuit description to stampable elements.

use std::collections::HashMap;

use nalgebra::DVector;
use nodal_core::circuit::{Circuit, Device, DeviceType};
use nodal_core::library::ModelLibrary;
use nodal_core::mna::{ComplexMna, MnaSystem};
use nodal_core::{NetId, Topology, Warning};
use num_complex::Complex;

use crate::diode::Diode;
use crate::error::{Error, Result};
use crate::passive::{Capacitor, Inductor, Resistor};
use crate::sources::{CurrentSource, VoltageSource, stimulus_phasor};
use crate::stamp::{Stamp, voltage_across};
use crate::subcircuit::flatten;

/// Options that shape how devices become elements.
#[derive(Debug, Clone, PartialEq)]
pub struct NetlistOptions {
    /// Resistance standing in for an inductor at DC (Ω).
    pub inductor_dc_resistance: f64,
    /// Forward resistance of a linear diode whose value is not positive (Ω).
    pub diode_default_resistance: f64,
    /// Skip devices of unknown type instead of failing.
    pub ignore_unsupported: bool,
}

impl Default for NetlistOptions {
    fn default() -> Self {
        Self {
            inductor_dc_resistance: 1e-6,
            diode_default_resistance: 10.0,
            ignore_unsupported: false,
        }
    }
}

/// A stampable circuit element.
#[derive(Debug, Clone)]
pub enum Element {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    Diode(Diode),
}

impl Element {
    /// Device name.
    pub fn name(&self) -> &str {
        match self {
            Element::Resistor(r) => &r.name,
            Element::Capacitor(c) => &c.name,
            Element::Inductor(l) => &l.name,
            Element::VoltageSource(v) => &v.name,
            Element::CurrentSource(i) => &i.name,
            Element::Diode(d) => &d.name,
        }
    }

    /// The two main terminal nets, (terminal 0, terminal 1).
    pub fn nodes(&self) -> (NetId, NetId) {
        match self {
            Element::Resistor(r) => (r.node_pos, r.node_neg),
            Element::Capacitor(c) => (c.node_pos, c.node_neg),
            Element::Inductor(l) => (l.node_pos, l.node_neg),
            Element::VoltageSource(v) => (v.node_pos, v.node_neg),
            Element::CurrentSource(i) => (i.node_pos, i.node_neg),
            Element::Diode(d) => (d.node_pos, d.node_neg),
        }
    }

    /// Voltage across the main terminals in a solution vector.
    pub fn voltage(&self, solution: &DVector<f64>) -> f64 {
        let (pos, neg) = self.nodes();
        voltage_across(solution, pos, neg)
    }

    /// Branch current index, for elements that own one.
    pub fn branch_index(&self) -> Option<usize> {
        match self {
            Element::VoltageSource(v) => Some(v.branch_index),
            _ => None,
        }
    }

    /// Whether this element needs Newton-Raphson iteration.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Element::Diode(d) if d.is_nonlinear())
    }

    fn as_stamp(&self) -> &dyn Stamp {
        match self {
            Element::Resistor(r) => r,
            Element::Capacitor(c) => c,
            Element::Inductor(l) => l,
            Element::VoltageSource(v) => v,
            Element::CurrentSource(i) => i,
            Element::Diode(d) => d,
        }
    }
}

impl Stamp for Element {
    fn stamp(&self, mna: &mut MnaSystem) {
        self.as_stamp().stamp(mna);
    }

    fn stamp_ac(&self, mna: &mut ComplexMna, omega: f64) {
        self.as_stamp().stamp_ac(mna, omega);
    }
}

/// A flattened, mapped circuit ready for stamping.
#[derive(Debug, Clone)]
pub struct Netlist {
    elements: Vec<Element>,
    /// Element position by device name.
    index: HashMap<String, usize>,
    topology: Topology,
    num_branches: usize,
    warnings: Vec<Warning>,
}

impl Netlist {
    /// Build a netlist from a circuit and its model library.
    pub fn build(circuit: &Circuit, library: &ModelLibrary, options: &NetlistOptions) -> Result<Self> {
        circuit.validate()?;
        let flat = flatten(&circuit.devices, &circuit.connections, library)?;
        let topology = Topology::build(&flat.devices, &flat.connections)?;
        let mut warnings = topology.warnings().to_vec();

        let ac_declared = flat.devices.iter().any(|d| d.ac.is_some());
        let mut elements = Vec::with_capacity(flat.devices.len());
        let mut num_branches = 0;

        for (index, device) in flat.devices.iter().enumerate() {
            let nodes = || -> Result<(NetId, NetId)> {
                if device.terminals.len() < 2 {
                    return Err(nodal_core::Error::InvalidCircuit(format!(
                        "device {} needs two terminals",
                        device.id
                    ))
                    .into());
                }
                Ok((topology.net(index, 0), topology.net(index, 1)))
            };
            let ac = |device: &Device| match device.ac {
                Some(ref stim) => Some(stimulus_phasor(stim)),
                None if ac_declared => Some(Complex::new(0.0, 0.0)),
                None => None,
            };

            let element = match &device.device_type {
                DeviceType::Ground | DeviceType::Subcircuit => continue,
                DeviceType::Resistor => {
                    let (p, n) = nodes()?;
                    Element::Resistor(Resistor::new(&device.id, p, n, positive(device)?))
                }
                DeviceType::Capacitor => {
                    let (p, n) = nodes()?;
                    Element::Capacitor(
                        Capacitor::new(&device.id, p, n, positive(device)?)
                            .with_initial_voltage(device.internal_state.stored_voltage),
                    )
                }
                DeviceType::Inductor => {
                    let (p, n) = nodes()?;
                    Element::Inductor(
                        Inductor::new(
                            &device.id,
                            p,
                            n,
                            positive(device)?,
                            options.inductor_dc_resistance,
                        )
                        .with_initial_current(device.internal_state.stored_current),
                    )
                }
                DeviceType::VoltageSource => {
                    let (p, n) = nodes()?;
                    let mut source =
                        VoltageSource::new(&device.id, p, n, device.numeric_value(), num_branches);
                    source.ac = ac(device);
                    num_branches += 1;
                    Element::VoltageSource(source)
                }
                DeviceType::CurrentSource => {
                    let (p, n) = nodes()?;
                    let mut source = CurrentSource::new(&device.id, p, n, device.numeric_value());
                    source.ac = ac(device);
                    Element::CurrentSource(source)
                }
                DeviceType::Diode => {
                    let (p, n) = nodes()?;
                    match device.model.as_deref() {
                        Some(name) => {
                            let model = library.diode(name).ok_or_else(|| Error::UnknownModel {
                                device: device.id.clone(),
                                model: name.to_string(),
                            })?;
                            Element::Diode(Diode::with_model(&device.id, p, n, *model))
                        }
                        None => {
                            let value = device.numeric_value();
                            let resistance = if value > 0.0 {
                                value
                            } else {
                                options.diode_default_resistance
                            };
                            Element::Diode(Diode::linear(&device.id, p, n, resistance))
                        }
                    }
                }
                DeviceType::Unsupported(kind) => {
                    if !options.ignore_unsupported {
                        return Err(Error::UnsupportedDeviceType {
                            device: device.id.clone(),
                            device_type: kind.clone(),
                        });
                    }
                    log::warn!("skipping device {} of unsupported type '{}'", device.id, kind);
                    warnings.push(Warning::SkippedDevice {
                        device: device.id.clone(),
                        device_type: kind.clone(),
                    });
                    continue;
                }
            };
            elements.push(element);
        }

        log::debug!(
            "netlist: {} elements, {} nodes, {} branches",
            elements.len(),
            topology.num_nodes(),
            num_branches
        );

        let mut index = HashMap::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            index.entry(element.name().to_string()).or_insert(i);
        }

        Ok(Self {
            elements,
            index,
            topology,
            num_branches,
            warnings,
        })
    }

    /// All elements in device order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look up an element by name.
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&i| &self.elements[i])
    }

    /// Terminal-to-net mapping.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Number of non-ground nets.
    pub fn num_nodes(&self) -> usize {
        self.topology.num_nodes()
    }

    /// Number of branch current unknowns.
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Size of the MNA system.
    pub fn size(&self) -> usize {
        self.num_nodes() + self.num_branches
    }

    /// Whether any element needs Newton-Raphson iteration.
    pub fn has_nonlinear(&self) -> bool {
        self.elements.iter().any(Element::is_nonlinear)
    }

    /// Non-fatal findings from construction.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Copy of this netlist with one independent source set to `value`.
    pub fn with_source_value(&self, name: &str, value: f64) -> Result<Netlist> {
        let &index = self
            .index
            .get(name)
            .ok_or_else(|| nodal_core::Error::UnknownDevice(name.to_string()))?;
        let mut netlist = self.clone();
        match &mut netlist.elements[index] {
            Element::VoltageSource(v) => v.voltage = value,
            Element::CurrentSource(i) => i.current = value,
            _ => return Err(Error::NotSweepable(name.to_string())),
        }
        Ok(netlist)
    }

    /// Stamp every element's DC contribution (nonlinear elements at 0 V).
    pub fn stamp(&self, mna: &mut MnaSystem) {
        for element in &self.elements {
            element.stamp(mna);
        }
    }
}

/// Numeric value of a device that must be strictly positive.
fn positive(device: &Device) -> Result<f64> {
    let value = device.numeric_value();
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidValue {
            name: device.id.clone(),
            value,
        })
    }
}
