//! Table and JSON output for analysis results.

use nodal_core::{NetId, Warning};
use nodal_core::units::format_value;
use nodal_devices::Netlist;
use nodal_solver::{AcReading, DeviceReading, SimulationResult, StepFailure};
use num_complex::Complex;
use serde::Serialize;

/// Every non-ground net with its display label, in id order.
pub fn net_columns(netlist: &Netlist) -> Vec<(String, NetId)> {
    let topology = netlist.topology();
    (1..=topology.num_nodes())
        .map(|i| {
            let net = NetId::new(i as u32);
            (topology.net_label(net).to_string(), net)
        })
        .collect()
}

/// Print an operating point: node voltages, then device readings.
pub fn print_operating_point(netlist: &Netlist, result: &SimulationResult) {
    println!("Node Voltages:");
    for (name, net) in net_columns(netlist) {
        println!("  V({}) = {:.6} V", name, result.voltage(net));
    }

    if !result.readings.is_empty() {
        println!();
        println!("Devices:");
        println!(
            "  {:<16}{:>14}{:>14}{:>14}",
            "Device", "Voltage", "Current", "Power"
        );
        for r in &result.readings {
            println!(
                "  {:<16}{:>14}{:>14}{:>14}",
                r.device,
                format!("{}V", format_value(r.voltage, 3)),
                format!("{}A", format_value(r.current, 3)),
                format!("{}W", format_value(r.power, 3)),
            );
        }
    }
    println!();
}

/// Print one row per point: the leading column, then every net voltage.
pub fn print_voltage_table<'a>(
    netlist: &Netlist,
    leading: &str,
    rows: impl IntoIterator<Item = (f64, &'a SimulationResult)>,
) {
    let columns = net_columns(netlist);

    print!("{:>14}", leading);
    for (name, _) in &columns {
        print!("{:>14}", format!("V({})", name));
    }
    println!();
    println!("{}", "-".repeat(14 * (1 + columns.len())));

    for (x, point) in rows {
        print!("{:>14.6e}", x);
        for (_, net) in &columns {
            print!("{:>14.6}", point.voltage(*net));
        }
        println!();
    }
    println!();
}

/// Report where a partial run stopped.
pub fn print_failure(what: &str, failure: &StepFailure) {
    eprintln!(
        "Warning: {} stopped at point {} ({}): {}",
        what, failure.step, failure.at, failure.error
    );
}

#[derive(Debug, Serialize)]
pub struct NetVoltage {
    pub net: String,
    pub voltage: f64,
}

#[derive(Debug, Serialize)]
pub struct ReadingRecord {
    pub device: String,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

impl From<&DeviceReading> for ReadingRecord {
    fn from(r: &DeviceReading) -> Self {
        Self {
            device: r.device.clone(),
            voltage: r.voltage,
            current: r.current,
            power: r.power,
        }
    }
}

/// One solved point in JSON output.
#[derive(Debug, Serialize)]
pub struct PointRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_value: Option<f64>,
    pub voltages: Vec<NetVoltage>,
    pub devices: Vec<ReadingRecord>,
}

impl PointRecord {
    pub fn new(netlist: &Netlist, result: &SimulationResult) -> Self {
        Self {
            time: result.time,
            sweep_value: result.sweep_value,
            voltages: net_columns(netlist)
                .into_iter()
                .map(|(net, id)| NetVoltage {
                    voltage: result.voltage(id),
                    net,
                })
                .collect(),
            devices: result.readings.iter().map(ReadingRecord::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhasorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<String>,
    pub magnitude: f64,
    pub phase_deg: f64,
}

impl PhasorRecord {
    pub fn new(net: Option<String>, v: Complex<f64>) -> Self {
        Self {
            net,
            magnitude: v.norm(),
            phase_deg: v.arg().to_degrees(),
        }
    }
}

/// Voltage and current phasors of one device.
#[derive(Debug, Serialize)]
pub struct AcReadingRecord {
    pub device: String,
    pub voltage: PhasorRecord,
    pub current: PhasorRecord,
}

impl From<&AcReading> for AcReadingRecord {
    fn from(r: &AcReading) -> Self {
        Self {
            device: r.device.clone(),
            voltage: PhasorRecord::new(None, r.voltage),
            current: PhasorRecord::new(None, r.current),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrequencyRecord {
    pub frequency: f64,
    pub voltages: Vec<PhasorRecord>,
    pub devices: Vec<AcReadingRecord>,
}

/// A whole analysis in JSON output.
#[derive(Debug, Serialize)]
pub struct Report<P: Serialize> {
    pub analysis: &'static str,
    pub points: Vec<P>,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub warnings: Vec<String>,
}

impl<P: Serialize> Report<P> {
    pub fn new(analysis: &'static str, points: Vec<P>) -> Self {
        Self {
            analysis,
            points,
            complete: true,
            failure: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_failure(mut self, failure: Option<&StepFailure>) -> Self {
        if let Some(f) = failure {
            self.complete = false;
            self.failure = Some(format!("point {} ({}): {}", f.step, f.at, f.error));
        }
        self
    }

    pub fn with_warnings(mut self, warnings: &[Warning]) -> Self {
        self.warnings = warnings.iter().map(ToString::to_string).collect();
        self
    }

    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::{Circuit, Device};
    use nodal_solver::Simulator;

    fn divider() -> Simulator {
        let circuit = Circuit::new()
            .with_device(Device::voltage_source("V1", 5.0))
            .with_device(Device::resistor("R1", "1k"))
            .with_device(Device::resistor("R2", "1k"))
            .wired("V1", "pos", "R1", "a")
            .wired("R1", "b", "R2", "a")
            .wired("R2", "b", "V1", "neg");
        Simulator::new(circuit).unwrap()
    }

    #[test]
    fn test_net_columns_skip_ground() {
        let sim = divider();
        let columns = net_columns(sim.netlist());
        assert_eq!(columns.len(), 2);
        assert!(columns.iter().all(|(_, net)| !net.is_ground()));
        assert!(columns.iter().any(|(_, net)| Some(*net) == sim.net("R1.b")));
    }

    #[test]
    fn test_point_record_json() {
        let mut sim = divider();
        let op = sim.dc_operating_point().unwrap();
        let record = PointRecord::new(sim.netlist(), &op);
        let value = serde_json::to_value(Report::new("op", vec![record])).unwrap();

        assert_eq!(value["analysis"], "op");
        assert_eq!(value["complete"], true);
        assert!(value.get("failure").is_none());
        let point = &value["points"][0];
        assert!(point.get("time").is_none());
        assert_eq!(point["voltages"].as_array().unwrap().len(), 2);
        let v1 = point["devices"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["device"] == "V1")
            .unwrap();
        assert!((v1["current"].as_f64().unwrap() + 2.5e-3).abs() < 1e-9);
    }

    #[test]
    fn test_phasor_record() {
        let record = PhasorRecord::new(Some("n1".to_string()), Complex::new(0.0, 2.0));
        assert!((record.magnitude - 2.0).abs() < 1e-12);
        assert!((record.phase_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_ac_reading_record_json() {
        let reading = AcReading {
            device: "C1".to_string(),
            voltage: Complex::new(1.0, 0.0),
            current: Complex::new(0.0, -1e-3),
        };
        let value = serde_json::to_value(AcReadingRecord::from(&reading)).unwrap();
        assert_eq!(value["device"], "C1");
        assert!(value["voltage"].get("net").is_none());
        assert!((value["current"]["magnitude"].as_f64().unwrap() - 1e-3).abs() < 1e-15);
        assert!((value["current"]["phase_deg"].as_f64().unwrap() + 90.0).abs() < 1e-9);
    }
}
