//! DC operating point and sweep analysis.

use anyhow::{Context, Result};
use nodal_solver::Simulator;

use crate::output::{PointRecord, Report, print_failure, print_operating_point, print_voltage_table};

/// Run DC operating point analysis.
pub fn run_dc_op(sim: &mut Simulator, json: bool) -> Result<()> {
    let op = sim
        .dc_operating_point()
        .context("DC operating point failed")?;

    if json {
        let record = PointRecord::new(sim.netlist(), &op);
        return Report::new("op", vec![record])
            .with_warnings(sim.warnings())
            .print();
    }

    println!("DC Operating Point Analysis");
    println!("===========================");
    println!();
    if op.iterations > 1 {
        println!("Converged in {} Newton-Raphson iterations.", op.iterations);
        println!();
    }
    print_operating_point(sim.netlist(), &op);
    println!("Analysis complete.");
    Ok(())
}

/// Run a single-source DC sweep.
pub fn run_dc_sweep(
    sim: &mut Simulator,
    source: &str,
    start: f64,
    stop: f64,
    step: f64,
    json: bool,
) -> Result<()> {
    let result = sim
        .dc_sweep(source, start, stop, step)
        .with_context(|| format!("DC sweep of {} failed", source))?;

    if json {
        let points = result
            .points
            .iter()
            .map(|p| PointRecord::new(sim.netlist(), p))
            .collect();
        return Report::new("sweep", points)
            .with_failure(result.failure.as_ref())
            .with_warnings(&result.warnings)
            .print();
    }

    println!("DC Sweep Analysis ({} {} {} {})", source, start, stop, step);
    println!("==========================================");
    println!();
    print_voltage_table(
        sim.netlist(),
        source,
        result
            .points
            .iter()
            .map(|p| (p.sweep_value.unwrap_or_default(), p)),
    );

    if let Some(failure) = &result.failure {
        print_failure("DC sweep", failure);
    }
    println!("Sweep complete ({} points).", result.points.len());
    Ok(())
}
