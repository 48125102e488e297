//! AC small-signal frequency sweep.

use anyhow::{Context, Result};
use nodal_solver::{AcParams, AcSweepType, Simulator};

use crate::output::{
    AcReadingRecord, FrequencyRecord, PhasorRecord, Report, net_columns, print_failure,
};

/// Run an AC sweep and print magnitude (dB) and phase per net.
pub fn run_ac(
    sim: &mut Simulator,
    fstart: f64,
    fstop: f64,
    points: usize,
    sweep_type: AcSweepType,
    json: bool,
) -> Result<()> {
    let params = AcParams {
        fstart,
        fstop,
        num_points: points,
        sweep_type,
    };
    let result = sim.ac_sweep(&params).context("AC analysis failed")?;
    let columns = net_columns(sim.netlist());

    if json {
        let records = result
            .points
            .iter()
            .map(|p| FrequencyRecord {
                frequency: p.frequency,
                voltages: columns
                    .iter()
                    .map(|(name, net)| PhasorRecord::new(Some(name.clone()), p.voltage(*net)))
                    .collect(),
                devices: p.readings.iter().map(AcReadingRecord::from).collect(),
            })
            .collect();
        return Report::new("ac", records)
            .with_failure(result.failure.as_ref())
            .with_warnings(&result.warnings)
            .print();
    }

    println!(
        "AC Analysis ({:?} {} points, {} Hz to {} Hz)",
        sweep_type, points, fstart, fstop
    );
    println!("==========================================");
    println!();

    print!("{:>14}", "Freq (Hz)");
    for (name, _) in &columns {
        print!("{:>14}{:>14}", format!("VDB({})", name), format!("VP({})", name));
    }
    println!();
    println!("{}", "-".repeat(14 * (1 + 2 * columns.len())));

    for point in &result.points {
        print!("{:>14.6e}", point.frequency);
        for (_, net) in &columns {
            let v = point.voltage(*net);
            let db = if v.norm() > 0.0 {
                20.0 * v.norm().log10()
            } else {
                f64::NEG_INFINITY
            };
            print!("{:>14.4}{:>14.4}", db, v.arg().to_degrees());
        }
        println!();
    }
    println!();

    if let Some(failure) = &result.failure {
        print_failure("AC analysis", failure);
    }
    println!("AC analysis complete ({} frequency points).", result.points.len());
    Ok(())
}
