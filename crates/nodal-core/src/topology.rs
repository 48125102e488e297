//! Topology mapping: device terminals to electrical nets.
//!
//! Terminals are interned into a dense arena (device order, then port order)
//! and grouped with an index-based union-find. The resulting nets are numbered
//! with ground as net 0.

use std::collections::HashMap;

use crate::circuit::{Connection, Device, DeviceType};
use crate::error::{Error, Result, Warning};
use crate::net::{NetId, TerminalId};

/// Label used for the ground net.
pub const GROUND_LABEL: &str = "0";

/// Union-find over terminal indices with path halving.
#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Terminal-to-net mapping for one circuit topology.
#[derive(Debug, Clone)]
pub struct Topology {
    /// First arena slot of each device.
    offsets: Vec<usize>,
    /// Net of each terminal in the arena.
    terminal_nets: Vec<NetId>,
    /// Display label of each net, indexed by net id.
    net_labels: Vec<String>,
    /// `device.port` to terminal handle.
    terminal_names: HashMap<String, TerminalId>,
    warnings: Vec<Warning>,
}

impl Topology {
    /// Group the terminals of `devices` into nets using `connections`.
    ///
    /// Ground is the net of any `ground` device; without one, the negative
    /// terminal of the first voltage source; without that, the net of the
    /// first terminal. Terminals that no connection touches are tied to
    /// ground and reported as [`Warning::UnresolvedTerminal`].
    pub fn build(devices: &[Device], connections: &[Connection]) -> Result<Self> {
        let mut device_index: HashMap<&str, usize> = HashMap::with_capacity(devices.len());
        let mut offsets = Vec::with_capacity(devices.len());
        let mut total = 0usize;
        for (i, device) in devices.iter().enumerate() {
            if device_index.insert(device.id.as_str(), i).is_some() {
                return Err(Error::DuplicateDevice(device.id.clone()));
            }
            offsets.push(total);
            total += device.terminals.len();
        }

        let mut uf = UnionFind::new(total);
        let mut connected = vec![false; total];

        let resolve = |conn: &Connection, device: &str, port: &str| -> Result<usize> {
            let unknown = || Error::UnknownTerminal {
                connection: conn.id.clone(),
                device: device.to_string(),
                port: port.to_string(),
            };
            let &d = device_index.get(device).ok_or_else(unknown)?;
            let p = devices[d].port_index(port).ok_or_else(unknown)?;
            Ok(offsets[d] + p)
        };

        for conn in connections {
            let a = resolve(conn, &conn.device_a, &conn.port_a)?;
            let b = resolve(conn, &conn.device_b, &conn.port_b)?;
            uf.union(a, b);
            connected[a] = true;
            connected[b] = true;
        }

        // Ground markers are their own anchor and never count as dangling.
        let offsets_ref = &offsets;
        let ground_terminals: Vec<usize> = devices
            .iter()
            .enumerate()
            .filter(|(_, d)| d.device_type == DeviceType::Ground)
            .flat_map(|(i, d)| (0..d.terminals.len()).map(move |p| offsets_ref[i] + p))
            .collect();
        for &t in &ground_terminals {
            connected[t] = true;
        }

        let ground_anchor = if let Some(&first) = ground_terminals.first() {
            for &t in &ground_terminals[1..] {
                uf.union(first, t);
            }
            Some(first)
        } else {
            devices
                .iter()
                .enumerate()
                .find(|(_, d)| d.device_type == DeviceType::VoltageSource && d.terminals.len() >= 2)
                .map(|(i, _)| offsets[i] + 1)
                .or(if total > 0 { Some(0) } else { None })
        };

        let mut warnings = Vec::new();
        if let Some(anchor) = ground_anchor {
            for (i, device) in devices.iter().enumerate() {
                for (p, port) in device.terminals.iter().enumerate() {
                    let t = offsets[i] + p;
                    if !connected[t] {
                        log::warn!("terminal {}.{} is unconnected; tying it to ground", device.id, port);
                        warnings.push(Warning::UnresolvedTerminal {
                            device: device.id.clone(),
                            port: port.clone(),
                        });
                        uf.union(anchor, t);
                    }
                }
            }
        }

        // Number nets: ground first, then in order of first appearance.
        let mut root_to_net: HashMap<usize, NetId> = HashMap::new();
        let mut net_labels = vec![GROUND_LABEL.to_string()];
        if let Some(anchor) = ground_anchor {
            root_to_net.insert(uf.find(anchor), NetId::GROUND);
        }

        let mut terminal_nets = Vec::with_capacity(total);
        let mut terminal_names = HashMap::with_capacity(total);
        for (i, device) in devices.iter().enumerate() {
            for (p, port) in device.terminals.iter().enumerate() {
                let t = offsets[i] + p;
                let label = format!("{}.{}", device.id, port);
                let root = uf.find(t);
                let net = *root_to_net.entry(root).or_insert_with(|| {
                    let id = NetId::new(net_labels.len() as u32);
                    net_labels.push(label.clone());
                    id
                });
                terminal_nets.push(net);
                terminal_names.insert(label, TerminalId(t as u32));
            }
        }

        Ok(Self {
            offsets,
            terminal_nets,
            net_labels,
            terminal_names,
            warnings,
        })
    }

    /// Terminal handle of a device's port.
    pub fn terminal(&self, device: usize, port: usize) -> TerminalId {
        TerminalId((self.offsets[device] + port) as u32)
    }

    /// Net of a device's port (by device index and port index).
    pub fn net(&self, device: usize, port: usize) -> NetId {
        self.terminal_nets[self.offsets[device] + port]
    }

    /// Net of an interned terminal.
    pub fn net_of_terminal(&self, terminal: TerminalId) -> NetId {
        self.terminal_nets[terminal.index()]
    }

    /// Number of nets, including ground.
    pub fn num_nets(&self) -> usize {
        self.net_labels.len()
    }

    /// Number of non-ground nets (MNA node unknowns).
    pub fn num_nodes(&self) -> usize {
        self.net_labels.len() - 1
    }

    /// Display label of a net (`"0"` for ground, else its first `device.port`).
    pub fn net_label(&self, net: NetId) -> &str {
        &self.net_labels[net.as_u32() as usize]
    }

    /// Look up a net by `"0"`, `"gnd"`, or any `device.port` on it.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        if name == GROUND_LABEL || name.eq_ignore_ascii_case("gnd") {
            return Some(NetId::GROUND);
        }
        self.terminal_names
            .get(name)
            .map(|&t| self.net_of_terminal(t))
    }

    /// Non-fatal findings, such as unconnected terminals.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
