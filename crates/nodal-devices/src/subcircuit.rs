//! Subcircuit flattening.
//!
//! Each instance keeps its own device entry (so outer connections still
//! resolve against its ports) and gains the definition's devices with ids
//! prefixed `instance/`. Every instance port is wired to the inner terminal
//! it is bound to.

use nodal_core::circuit::{Connection, Device, DeviceType};
use nodal_core::library::ModelLibrary;

use crate::error::{Error, Result};

/// Maximum nesting depth of subcircuit instances.
pub const MAX_SUBCIRCUIT_DEPTH: usize = 32;

/// Devices and connections after subcircuit expansion.
#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub devices: Vec<Device>,
    pub connections: Vec<Connection>,
}

/// Expand every subcircuit instance in `devices` recursively.
pub fn flatten(
    devices: &[Device],
    connections: &[Connection],
    library: &ModelLibrary,
) -> Result<Flattened> {
    let mut out = Flattened::default();
    let mut stack = Vec::new();
    expand(devices, connections, "", library, &mut stack, &mut out)?;
    Ok(out)
}

fn expand(
    devices: &[Device],
    connections: &[Connection],
    prefix: &str,
    library: &ModelLibrary,
    stack: &mut Vec<String>,
    out: &mut Flattened,
) -> Result<()> {
    for conn in connections {
        out.connections.push(Connection::new(
            format!("{prefix}{}", conn.id),
            format!("{prefix}{}", conn.device_a),
            conn.port_a.clone(),
            format!("{prefix}{}", conn.device_b),
            conn.port_b.clone(),
        ));
    }

    for device in devices {
        let mut placed = device.clone();
        placed.id = format!("{prefix}{}", device.id);

        if device.device_type == DeviceType::Subcircuit {
            let model = device.model.as_deref().unwrap_or_default();
            let def = library.subcircuit(model).ok_or_else(|| Error::UnknownModel {
                device: placed.id.clone(),
                model: model.to_string(),
            })?;

            if stack.len() >= MAX_SUBCIRCUIT_DEPTH || stack.iter().any(|m| m == model) {
                return Err(Error::RecursiveSubcircuit {
                    model: model.to_string(),
                    depth: stack.len() + 1,
                });
            }

            let inner_prefix = format!("{}/", placed.id);
            for port in &device.terminals {
                let binding = def.port(port).ok_or_else(|| Error::UnboundPort {
                    instance: placed.id.clone(),
                    port: port.clone(),
                })?;
                out.connections.push(Connection::new(
                    format!("{inner_prefix}{port}"),
                    placed.id.clone(),
                    port.clone(),
                    format!("{inner_prefix}{}", binding.device),
                    binding.port.clone(),
                ));
            }

            log::debug!(
                "expanding subcircuit {} ({} devices) as {}",
                model,
                def.devices.len(),
                placed.id
            );
            stack.push(model.to_string());
            out.devices.push(placed);
            expand(&def.devices, &def.connections, &inner_prefix, library, stack, out)?;
            stack.pop();
        } else {
            out.devices.push(placed);
        }
    }

    Ok(())
}
