//! Validation tests comparing simulator results against analytical solutions.
//!
//! Test naming convention:
//! - `test_dc_*` - DC operating point and sweep tests
//! - `test_tran_*` - Transient analysis tests
//! - `test_ac_*` - AC analysis tests
//! - `test_circuit_*` - Circuit description handling (subcircuits, policies)

use std::f64::consts::PI;

use nodal_core::{
    Circuit, Connection, Device, DeviceType, DiodeModel, ModelLibrary, PortBinding,
    SubcircuitDef, Warning,
};
use nodal_solver::{Error, InitialConditions, Simulator, SimulatorConfig, kcl_residuals};

/// Tolerance for DC voltage comparisons (1mV)
const DC_VOLTAGE_TOL: f64 = 1e-3;

/// Tolerance for KCL residuals (A)
const KCL_TOL: f64 = 1e-9;

/// Tolerance for AC magnitude in dB (0.1 dB)
const AC_DB_TOL: f64 = 0.1;

/// Tolerance for AC phase in degrees (1 degree)
const AC_PHASE_TOL: f64 = 1.0;

fn divider(volts: f64) -> Circuit {
    Circuit::new()
        .with_device(Device::voltage_source("V1", volts))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::resistor("R2", "1k"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "R2", "a")
        .wired("R2", "b", "V1", "neg")
}

/// 5 V -- R1 = 1k -- C1 = 1µF -- ground, tau = 1 ms.
fn rc_circuit() -> Circuit {
    Circuit::new()
        .with_device(Device::voltage_source("V1", 5.0))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::capacitor("C1", "1u"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "C1", "pos")
        .wired("C1", "neg", "V1", "neg")
}

fn value_at(points: &[(f64, f64)], frequency: f64) -> f64 {
    points
        .iter()
        .min_by(|a, b| {
            (a.0 - frequency)
                .abs()
                .partial_cmp(&(b.0 - frequency).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|p| p.1)
        .expect("empty sweep")
}

// ============================================================================
// DC Operating Point Validation
// ============================================================================

/// Circuit: V1=5V -- R1=1k -- mid -- R2=1k -- GND
/// Expected: V(mid) = 2.5 V
#[test]
fn test_dc_voltage_divider_analytical() {
    let mut sim = Simulator::new(divider(5.0)).expect("build failed");
    let op = sim.dc_operating_point().expect("DC solve failed");

    let top = sim.net("V1.pos").unwrap();
    let mid = sim.net("R1.b").unwrap();
    let v_top = op.voltage(top);
    let v_mid = op.voltage(mid);
    assert!((v_top - 5.0).abs() < DC_VOLTAGE_TOL, "V(top) = {v_top} (expected 5.0)");
    assert!((v_mid - 2.5).abs() < DC_VOLTAGE_TOL, "V(mid) = {v_mid} (expected 2.5)");
    assert_eq!(op.voltage(sim.net("gnd").unwrap()), 0.0);

    let v1 = op.reading("V1").unwrap();
    assert!((v1.current + 2.5e-3).abs() < 1e-9, "I(V1) = {}", v1.current);
    assert!((v1.power + 12.5e-3).abs() < 1e-9, "P(V1) = {}", v1.power);
}

/// Circuit: I1=10mA into top, R1=1k and R2=1k in parallel to GND
/// Expected: V(top) = 10mA * 500Ω = 5V
#[test]
fn test_dc_current_divider_analytical() {
    let circuit = Circuit::new()
        .with_device(Device::ground("GND"))
        .with_device(Device::current_source("I1", "10m"))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::resistor("R2", "1k"))
        .wired("I1", "pos", "GND", "gnd")
        .wired("I1", "neg", "R1", "a")
        .wired("R1", "a", "R2", "a")
        .wired("R1", "b", "GND", "gnd")
        .wired("R2", "b", "GND", "gnd");
    let mut sim = Simulator::new(circuit).unwrap();
    let op = sim.dc_operating_point().unwrap();

    let v = op.voltage(sim.net("R1.a").unwrap());
    assert!((v - 5.0).abs() < DC_VOLTAGE_TOL, "V(top) = {v} (expected 5.0)");
    assert!((op.reading("R2").unwrap().current - 5e-3).abs() < 1e-9);
}

/// Bridge with a current source, a model diode and a capacitor.
#[test]
fn test_dc_kcl_conservation() {
    let library = ModelLibrary::new().with_diode("DMOD", DiodeModel::default());
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 12.0))
        .with_device(Device::resistor("R1", "2k"))
        .with_device(Device::resistor("R2", "3.3k"))
        .with_device(Device::resistor("R3", "4.7k"))
        .with_device(Device::resistor("R4", "1k"))
        .with_device(Device::diode("D1", 0.0).with_model("DMOD"))
        .with_device(Device::capacitor("C1", "1u"))
        .with_device(Device::current_source("I1", "1m"))
        .wired("V1", "pos", "R1", "a")
        .wired("V1", "pos", "R2", "a")
        .wired("R1", "b", "R3", "a")
        .wired("R2", "b", "R4", "a")
        .wired("R1", "b", "D1", "anode")
        .wired("D1", "cathode", "R2", "b")
        .wired("R3", "b", "V1", "neg")
        .wired("R4", "b", "V1", "neg")
        .wired("C1", "pos", "R2", "b")
        .wired("C1", "neg", "V1", "neg")
        .wired("I1", "pos", "R3", "a")
        .wired("I1", "neg", "R4", "a");
    let config = SimulatorConfig::default();
    let mut sim = Simulator::with_config(circuit, library, config).unwrap();
    let op = sim.dc_operating_point().unwrap();

    for (net, residual) in kcl_residuals(sim.netlist(), &op).iter().enumerate() {
        assert!(residual.abs() < KCL_TOL, "KCL residual at net {net}: {residual}");
    }
    assert_eq!(op.reading("C1").unwrap().current, 0.0);
}

/// Two directly shorted voltage sources with conflicting values
#[test]
fn test_dc_singular_shorted_sources() {
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 5.0))
        .with_device(Device::voltage_source("V2", 3.0))
        .with_device(Device::resistor("R1", "1k"))
        .wired("V1", "pos", "V2", "pos")
        .wired("V1", "neg", "V2", "neg")
        .wired("R1", "a", "V1", "pos")
        .wired("R1", "b", "V1", "neg");
    let mut sim = Simulator::new(circuit).unwrap();

    match sim.dc_operating_point() {
        Err(Error::SingularMatrix { .. }) => {}
        other => panic!("expected SingularMatrix, got {:?}", other),
    }
}

/// Circuit: V1=5V -- R1=1k -- D1 -- GND (Shockley, Is = 1e-14)
#[test]
fn test_dc_diode_forward_voltage() {
    let library = ModelLibrary::new().with_diode("D1N4148", DiodeModel::default());
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 5.0))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::diode("D1", 0.0).with_model("D1N4148"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "D1", "anode")
        .wired("D1", "cathode", "V1", "neg");
    let mut sim = Simulator::with_config(circuit, library, SimulatorConfig::default()).unwrap();
    let op = sim.dc_operating_point().unwrap();

    let vd = op.reading("D1").unwrap().voltage;
    assert!(vd > 0.6 && vd < 0.75, "V(D1) = {vd} (expected 0.6..0.75)");
    assert!(op.iterations > 1 && op.iterations <= 100);

    for residual in kcl_residuals(sim.netlist(), &op) {
        assert!(residual.abs() < 1e-6, "KCL residual {residual}");
    }
}

/// Linear diode without a model is its forward resistance
#[test]
fn test_dc_linear_diode() {
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 1.0))
        .with_device(Device::resistor("R1", 90.0))
        .with_device(Device::diode("D1", 0.0))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "D1", "anode")
        .wired("D1", "cathode", "V1", "neg");
    let mut sim = Simulator::new(circuit).unwrap();
    let op = sim.dc_operating_point().unwrap();

    // Default forward resistance 10 Ω: 1 V * 10 / 100
    let vd = op.reading("D1").unwrap().voltage;
    assert!((vd - 0.1).abs() < 1e-9, "V(D1) = {vd}");
}

#[test]
fn test_dc_sweep_determinism() {
    let mut sim = Simulator::new(divider(5.0)).unwrap();
    let sweep = sim.dc_sweep("V1", 0.0, 5.0, 1.0).unwrap();
    let mid = sim.net("R1.b").unwrap();

    assert!(sweep.is_complete());
    assert_eq!(sweep.points.len(), 6);
    assert_eq!(sweep.sweep_values(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    for point in &sweep.points {
        let value = point.sweep_value.unwrap();
        let v_mid = point.voltage(mid);
        assert!((v_mid - value / 2.0).abs() < DC_VOLTAGE_TOL, "V(mid) = {v_mid} at {value}");
    }

    // The engine's own circuit is untouched by the sweep
    let op = sim.dc_operating_point().unwrap();
    assert!((op.voltage(mid) - 2.5).abs() < DC_VOLTAGE_TOL);

    let again = sim.dc_sweep("V1", 0.0, 5.0, 1.0).unwrap();
    for (a, b) in sweep.points.iter().zip(&again.points) {
        assert_eq!(a.node_voltages, b.node_voltages);
    }
}

#[test]
fn test_dc_sweep_current_source() {
    let circuit = Circuit::new()
        .with_device(Device::ground("GND"))
        .with_device(Device::current_source("I1", 0.0))
        .with_device(Device::resistor("R1", "2k"))
        .wired("I1", "pos", "GND", "gnd")
        .wired("I1", "neg", "R1", "a")
        .wired("R1", "b", "GND", "gnd");
    let mut sim = Simulator::new(circuit).unwrap();
    let sweep = sim.dc_sweep("I1", 0.0, 2e-3, 0.5e-3).unwrap();
    let top = sim.net("R1.a").unwrap();

    assert_eq!(sweep.points.len(), 5);
    for (value, v) in sweep.voltage_curve(top) {
        assert!((v - value * 2e3).abs() < 1e-9);
    }
}

#[test]
fn test_dc_sweep_partial_failure() {
    // Forward-biased diode with a tiny iteration budget: the low points
    // settle immediately, the forward-biased ones do not.
    let library = ModelLibrary::new().with_diode("D", DiodeModel::default());
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 0.0))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::diode("D1", 0.0).with_model("D"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "D1", "anode")
        .wired("D1", "cathode", "V1", "neg");
    let mut config = SimulatorConfig::default();
    config.convergence.max_iterations = 3;
    let mut sim = Simulator::with_config(circuit, library, config).unwrap();

    let sweep = sim.dc_sweep("V1", 0.0, 5.0, 1.0).unwrap();
    let failure = sweep.failure.as_ref().expect("sweep should stop early");
    assert!(matches!(failure.error, Error::ConvergenceFailed { .. }));
    assert_eq!(sweep.points.len(), failure.step);
    assert!(!sweep.points.is_empty());
    assert_eq!(
        sim.last_outcome(),
        Some(nodal_solver::SimulatorState::ConvergenceFailure)
    );

    // The failed sweep leaves the source at its original value
    let op = sim.dc_operating_point().unwrap();
    assert_eq!(op.reading("V1").unwrap().voltage, 0.0);
    assert!(op.reading("D1").unwrap().current.abs() < 1e-12);
}

#[test]
fn test_dc_sweep_descending() {
    let mut sim = Simulator::new(divider(5.0)).unwrap();
    let sweep = sim.dc_sweep("V1", 5.0, 0.0, -1.0).unwrap();
    let mid = sim.net("R1.b").unwrap();

    assert!(sweep.is_complete());
    assert_eq!(sweep.sweep_values(), vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
    for (value, v_mid) in sweep.voltage_curve(mid) {
        assert!((v_mid - value / 2.0).abs() < DC_VOLTAGE_TOL);
    }
}

#[test]
fn test_dc_sweep_oversized_rejected() {
    let mut sim = Simulator::new(divider(5.0)).unwrap();
    assert!(matches!(
        sim.dc_sweep("V1", 0.0, 1e30, 1e-30),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        sim.dc_sweep("V1", -f64::MAX, f64::MAX, 1.0),
        Err(Error::InvalidParameter(_))
    ));
    assert_eq!(sim.last_outcome(), None);

    // The cap is configurable
    let config = SimulatorConfig::default().with_max_points(5);
    let mut small = Simulator::with_config(divider(5.0), ModelLibrary::new(), config).unwrap();
    assert!(matches!(
        small.dc_sweep("V1", 0.0, 5.0, 1.0),
        Err(Error::InvalidParameter(_))
    ));
    assert_eq!(small.dc_sweep("V1", 0.0, 4.0, 1.0).unwrap().points.len(), 5);
}

// ============================================================================
// Transient Validation
// ============================================================================

#[test]
fn test_tran_rc_charging() {
    let mut sim = Simulator::new(rc_circuit()).unwrap();
    let result = sim.transient(0.005, 0.0001).unwrap();
    let cap = sim.net("C1.pos").unwrap();

    assert!(result.is_complete());
    assert_eq!(result.points.len(), 51);
    assert_eq!(result.points[0].time, Some(0.0));
    assert!((result.points[50].time.unwrap() - 0.005).abs() < 1e-15);

    let voltages: Vec<f64> = result.points.iter().map(|p| p.voltage(cap)).collect();
    assert!(voltages[0].abs() < 1e-12, "V(C1, t=0) = {}", voltages[0]);
    for pair in voltages.windows(2) {
        assert!(pair[1] > pair[0], "capacitor voltage must rise: {:?}", pair);
    }
    let last = voltages[50];
    assert!(last > 4.9 && last < 5.0, "V(C1, 5τ) = {last}");
}

#[test]
fn test_tran_dc_agreement() {
    let mut sim = Simulator::new(rc_circuit()).unwrap();
    let op = sim.dc_operating_point().unwrap();
    let result = sim.transient(0.010, 0.0001).unwrap();
    let cap = sim.net("C1.pos").unwrap();

    // Backward Euler after 10 τ
    let v_tran = result.points.last().unwrap().voltage(cap);
    let v_dc = op.voltage(cap);
    assert!(
        (v_tran - v_dc).abs() < DC_VOLTAGE_TOL,
        "transient {v_tran} vs DC {v_dc}"
    );
}

#[test]
fn test_tran_kcl_every_step() {
    let circuit = rc_circuit()
        .with_device(Device::inductor("L1", "1m"))
        .with_device(Device::resistor("R2", "100"))
        .wired("L1", "pos", "R1", "b")
        .wired("L1", "neg", "R2", "a")
        .wired("R2", "b", "V1", "neg");
    let config = SimulatorConfig::default()
        .with_method(nodal_solver::IntegrationMethod::Trapezoidal);
    let mut sim = Simulator::with_config(circuit, ModelLibrary::new(), config).unwrap();
    let result = sim.transient(2e-3, 1e-5).unwrap();

    for point in &result.points {
        for (net, residual) in kcl_residuals(sim.netlist(), point).iter().enumerate() {
            assert!(
                residual.abs() < KCL_TOL,
                "KCL residual at net {net}, t = {:?}: {residual}",
                point.time
            );
        }
    }
}

#[test]
fn test_tran_oversized_rejected() {
    let mut sim = Simulator::new(rc_circuit()).unwrap();
    assert!(matches!(
        sim.transient(1e30, 1e-30),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        sim.ac(1e-300, 1e300, usize::MAX),
        Err(Error::InvalidParameter(_))
    ));
    assert_eq!(sim.last_outcome(), None);
}

/// V1 = 5 V with C1 = 1µF and R1 = 1k directly across it. Holding C1 at its
/// stored 0 V conflicts with V1, so t = 0 comes from the operating point.
#[test]
fn test_tran_held_state_conflict() {
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 5.0))
        .with_device(Device::capacitor("C1", "1u"))
        .with_device(Device::resistor("R1", "1k"))
        .wired("V1", "pos", "C1", "pos")
        .wired("V1", "pos", "R1", "a")
        .wired("V1", "neg", "C1", "neg")
        .wired("V1", "neg", "R1", "b");
    let mut sim = Simulator::new(circuit).unwrap();
    let result = sim.transient(1e-3, 1e-4).unwrap();
    let top = sim.net("C1.pos").unwrap();

    assert!(result.is_complete(), "failure: {:?}", result.failure);
    assert_eq!(result.points.len(), 11);
    for point in &result.points {
        assert!((point.voltage(top) - 5.0).abs() < DC_VOLTAGE_TOL);
    }
    assert_eq!(
        sim.last_outcome(),
        Some(nodal_solver::SimulatorState::Converged)
    );
}

/// Divider with C1 across R2, started from the operating point: the output
/// sits at V·R2/(R1+R2) from the first point on.
#[test]
fn test_tran_operating_point_start_analytical() {
    let circuit = divider(6.0)
        .with_device(Device::capacitor("C1", "10u"))
        .wired("C1", "pos", "R2", "a")
        .wired("C1", "neg", "R2", "b");
    let config = SimulatorConfig::default().with_initial_conditions(InitialConditions::OperatingPoint);
    let mut sim = Simulator::with_config(circuit, ModelLibrary::new(), config).unwrap();
    let result = sim.transient(5e-3, 1e-4).unwrap();
    let mid = sim.net("R1.b").unwrap();

    assert!(result.is_complete());
    assert_eq!(result.points.len(), 51);
    for point in &result.points {
        assert!((point.voltage(mid) - 3.0).abs() < 1e-9, "V(mid) = {}", point.voltage(mid));
        assert!(point.reading("C1").unwrap().current.abs() < 1e-12);
    }
    let state = result.final_state("C1").unwrap();
    assert!((state.stored_voltage - 3.0).abs() < 1e-9);
}

#[test]
fn test_tran_step_count_clamps_last_step() {
    let mut sim = Simulator::new(rc_circuit()).unwrap();
    let result = sim.transient(0.00105, 0.0001).unwrap();
    assert_eq!(result.points.len(), 12);
    assert!((result.times().last().unwrap() - 0.00105).abs() < 1e-15);
}

// ============================================================================
// AC Validation
// ============================================================================

/// RC low-pass: −3 dB and −45° at f = 1/(2πRC)
#[test]
fn test_ac_rc_lowpass() {
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 0.0).with_ac(1.0, 0.0))
        .with_device(Device::resistor("R1", "1k"))
        .with_device(Device::capacitor("C1", "1u"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "C1", "pos")
        .wired("C1", "neg", "V1", "neg");
    let mut sim = Simulator::new(circuit).unwrap();
    let fc = 1.0 / (2.0 * PI * 1e3 * 1e-6);
    let result = sim.ac(1.0, 100e3, 20).unwrap();
    let out = sim.net("C1.pos").unwrap();

    let db = value_at(&result.magnitude_db(out), fc);
    let phase = value_at(&result.phase_deg(out), fc);
    // Nearest point lies within 1/40 decade of fc
    assert!((db + 3.01).abs() < 0.5, "|H(fc)| = {db} dB");
    assert!((phase + 45.0).abs() < 4.0, "phase(fc) = {phase}°");

    // Exact corner frequency
    let exact = sim.ac(fc, fc, 1).unwrap();
    let db = exact.magnitude_db(out)[0].1;
    let phase = exact.phase_deg(out)[0].1;
    assert!((db + 3.0103).abs() < AC_DB_TOL, "|H(fc)| = {db} dB");
    assert!((phase + 45.0).abs() < AC_PHASE_TOL, "phase(fc) = {phase}°");
}

/// RL high-pass across the inductor: phase rotates from +90° to 0°
#[test]
fn test_ac_rl_highpass_phase() {
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 0.0).with_ac(1.0, 0.0))
        .with_device(Device::resistor("R1", "100"))
        .with_device(Device::inductor("L1", "10m"))
        .wired("V1", "pos", "R1", "a")
        .wired("R1", "b", "L1", "pos")
        .wired("L1", "neg", "V1", "neg");
    let mut sim = Simulator::new(circuit).unwrap();
    let fc = 100.0 / (2.0 * PI * 10e-3);
    let result = sim.ac(fc / 100.0, fc * 100.0, 10).unwrap();
    let out = sim.net("L1.pos").unwrap();

    let phases = result.phase_deg(out);
    assert!(phases.first().unwrap().1 > 85.0, "low-frequency phase {:?}", phases.first());
    assert!(phases.last().unwrap().1 < 5.0, "high-frequency phase {:?}", phases.last());
    for pair in phases.windows(2) {
        assert!(pair[1].1 < pair[0].1, "phase must fall with frequency");
    }

    let corner = value_at(&phases, fc);
    assert!((corner - 45.0).abs() < AC_PHASE_TOL, "phase(fc) = {corner}°");
    let db = value_at(&result.magnitude_db(out), fc);
    assert!((db + 3.0103).abs() < AC_DB_TOL, "|H(fc)| = {db} dB");
}

// ============================================================================
// Circuit Handling
// ============================================================================

#[test]
fn test_circuit_subcircuit_equivalence() {
    let half = SubcircuitDef {
        ports: vec![
            PortBinding::new("top", "Ra", "a"),
            PortBinding::new("mid", "Ra", "b"),
            PortBinding::new("bot", "Rb", "b"),
        ],
        devices: vec![Device::resistor("Ra", "1k"), Device::resistor("Rb", "1k")],
        connections: vec![Connection::new("w", "Ra", "b", "Rb", "a")],
    };
    let library = ModelLibrary::new().with_subcircuit("divider", half);
    let circuit = Circuit::new()
        .with_device(Device::voltage_source("V1", 5.0))
        .with_device(Device::subcircuit("X1", "divider", ["top", "mid", "bot"]))
        .wired("V1", "pos", "X1", "top")
        .wired("X1", "bot", "V1", "neg");

    let mut nested =
        Simulator::with_config(circuit, library, SimulatorConfig::default()).unwrap();
    let mut flat = Simulator::new(divider(5.0)).unwrap();

    let v_nested = nested
        .dc_operating_point()
        .unwrap()
        .voltage(nested.net("X1.mid").unwrap());
    let v_flat = flat
        .dc_operating_point()
        .unwrap()
        .voltage(flat.net("R1.b").unwrap());
    assert!((v_nested - v_flat).abs() < 1e-12, "{v_nested} vs {v_flat}");
    assert_eq!(nested.net("X1/Ra.b"), nested.net("X1.mid"));
}

#[test]
fn test_circuit_unsupported_policy() {
    let circuit = divider(5.0)
        .with_device(Device::new(
            "Q1",
            DeviceType::from("bjt".to_string()),
            ["c", "b", "e"],
            0.0,
        ))
        .wired("Q1", "c", "R1", "a")
        .wired("Q1", "b", "R1", "b")
        .wired("Q1", "e", "V1", "neg");

    match Simulator::new(circuit.clone()) {
        Err(Error::Device(nodal_devices::Error::UnsupportedDeviceType { device, .. })) => {
            assert_eq!(device, "Q1");
        }
        other => panic!("expected UnsupportedDeviceType, got {:?}", other.map(|_| ())),
    }

    let config = SimulatorConfig::default().with_ignore_unsupported(true);
    let mut sim = Simulator::with_config(circuit, ModelLibrary::new(), config).unwrap();
    assert!(sim.warnings().iter().any(|w| matches!(
        w,
        Warning::SkippedDevice { device, .. } if device == "Q1"
    )));
    let op = sim.dc_operating_point().unwrap();
    assert!((op.voltage(sim.net("R1.b").unwrap()) - 2.5).abs() < DC_VOLTAGE_TOL);

    let sweep = sim.dc_sweep("V1", 0.0, 1.0, 1.0).unwrap();
    assert_eq!(sweep.warnings, sim.warnings());
}

#[test]
fn test_circuit_unconnected_terminal_grounded() {
    let circuit = divider(5.0).with_device(Device::resistor("R3", "1k")).wired(
        "R3",
        "a",
        "R1",
        "b",
    );
    let mut sim = Simulator::new(circuit).unwrap();
    assert_eq!(
        sim.warnings(),
        &[Warning::UnresolvedTerminal {
            device: "R3".to_string(),
            port: "b".to_string(),
        }]
    );

    // R3 hangs from mid to ground: 1k || 1k below 1k
    let op = sim.dc_operating_point().unwrap();
    let v_mid = op.voltage(sim.net("R1.b").unwrap());
    assert!((v_mid - 5.0 / 3.0).abs() < DC_VOLTAGE_TOL, "V(mid) = {v_mid}");
}

#[test]
fn test_circuit_from_json() {
    let json = r#"{
        "devices": [
            {"id": "V1", "type": "voltage_source", "value": 10, "terminals": ["pos", "neg"]},
            {"id": "R1", "type": "resistor", "value": "3k", "terminals": ["a", "b"]},
            {"id": "R2", "type": "resistor", "value": "1k", "terminals": ["a", "b"]}
        ],
        "connections": [
            {"id": "W1", "deviceA": "V1", "portA": "pos", "deviceB": "R1", "portB": "a"},
            {"id": "W2", "deviceA": "R1", "portA": "b", "deviceB": "R2", "portB": "a"},
            {"id": "W3", "deviceA": "R2", "portA": "b", "deviceB": "V1", "portB": "neg"}
        ]
    }"#;
    let circuit: Circuit = serde_json::from_str(json).expect("parse failed");
    let mut sim = Simulator::new(circuit).unwrap();
    let op = sim.dc_operating_point().unwrap();
    let v = op.voltage(sim.net("R2.a").unwrap());
    assert!((v - 2.5).abs() < DC_VOLTAGE_TOL, "V(mid) = {v}");
}
