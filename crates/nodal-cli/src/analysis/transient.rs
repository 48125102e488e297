//! Transient time-domain analysis.

use anyhow::{Context, Result};
use nodal_solver::{InitialConditions, IntegrationMethod, Simulator};

use crate::output::{PointRecord, Report, print_failure, print_voltage_table};

/// Run a fixed-step transient analysis with the configured method.
pub fn run_transient(sim: &mut Simulator, duration: f64, step: f64, json: bool) -> Result<()> {
    let result = sim
        .transient(duration, step)
        .context("Transient analysis failed")?;

    if json {
        let points = result
            .points
            .iter()
            .map(|p| PointRecord::new(sim.netlist(), p))
            .collect();
        return Report::new("tran", points)
            .with_failure(result.failure.as_ref())
            .with_warnings(&result.warnings)
            .print();
    }

    let config = sim.config();
    println!(
        "Transient Analysis ({} {}, {}, {})",
        step,
        duration,
        match config.method {
            IntegrationMethod::BackwardEuler => "backward Euler",
            IntegrationMethod::Trapezoidal => "trapezoidal",
        },
        match config.initial_conditions {
            InitialConditions::DeviceState => "stored state",
            InitialConditions::OperatingPoint => "operating point",
        }
    );
    println!("==========================================");
    println!();
    print_voltage_table(
        sim.netlist(),
        "Time",
        result
            .points
            .iter()
            .map(|p| (p.time.unwrap_or_default(), p)),
    );

    if let Some(failure) = &result.failure {
        print_failure("Transient analysis", failure);
    }
    println!("Transient complete ({} time points).", result.points.len());
    Ok(())
}
