//! Nodal command-line interface.

mod analysis;
mod output;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nodal_core::units::try_parse_value;
use nodal_core::{Circuit, ModelLibrary};
use nodal_solver::{
    AcSweepType, ConvergenceCriteria, DEFAULT_MAX_POINTS, InitialConditions, IntegrationMethod,
    Simulator, SimulatorConfig,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nodal")]
#[command(about = "A nodal-analysis circuit simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Circuit description file (JSON)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    #[command(subcommand)]
    analysis: Analysis,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output; repeat for more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Analysis {
    /// DC operating point
    Op,
    /// Sweep one voltage or current source
    Sweep {
        /// Source device id
        source: String,
        #[arg(value_parser = parse_number, allow_hyphen_values = true)]
        start: f64,
        #[arg(value_parser = parse_number, allow_hyphen_values = true)]
        stop: f64,
        #[arg(value_parser = parse_number, allow_hyphen_values = true)]
        step: f64,
    },
    /// Fixed-step transient analysis
    Tran {
        /// Simulated duration (s)
        #[arg(value_parser = parse_number)]
        duration: f64,
        /// Time step (s)
        #[arg(value_parser = parse_number)]
        step: f64,
    },
    /// Small-signal frequency sweep
    Ac {
        /// Start frequency (Hz)
        #[arg(value_parser = parse_number)]
        fstart: f64,
        /// Stop frequency (Hz)
        #[arg(value_parser = parse_number)]
        fstop: f64,
        /// Points per decade or octave, or total points for a linear sweep
        #[arg(default_value_t = 10)]
        points: usize,
        /// Frequency spacing
        #[arg(long, value_enum, default_value_t = Spacing::Decade)]
        spacing: Spacing,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Spacing {
    Linear,
    Decade,
    Octave,
}

impl From<Spacing> for AcSweepType {
    fn from(spacing: Spacing) -> Self {
        match spacing {
            Spacing::Linear => AcSweepType::Linear,
            Spacing::Decade => AcSweepType::Decade,
            Spacing::Octave => AcSweepType::Octave,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    /// Backward Euler
    Be,
    /// Trapezoidal
    Trap,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum InitialState {
    /// Start from each device's stored state
    DeviceState,
    /// Start from the DC operating point
    OperatingPoint,
}

/// Numerical settings, mapped onto `SimulatorConfig`.
#[derive(Args, Debug, Clone)]
struct SolverArgs {
    /// Integration method for transient analysis
    #[arg(long, value_enum, default_value_t = Method::Be, global = true)]
    method: Method,

    /// How transient analysis obtains its t = 0 point
    #[arg(long = "initial", value_enum, default_value_t = InitialState::DeviceState, global = true)]
    initial: InitialState,

    /// Newton-Raphson convergence tolerance (sum of absolute updates)
    #[arg(long, value_parser = parse_number, default_value = "1e-9", global = true)]
    tolerance: f64,

    /// Newton-Raphson iteration limit
    #[arg(long, default_value_t = 100, global = true)]
    max_iterations: usize,

    /// Conductance shunted across diode junctions (S)
    #[arg(long, value_parser = parse_number, default_value = "1e-12", global = true)]
    gmin: f64,

    /// Pivot magnitude below which the matrix counts as singular
    #[arg(long, value_parser = parse_number, default_value = "1e-12", global = true)]
    pivot_tolerance: f64,

    /// Resistance standing in for inductors at DC (Ω)
    #[arg(long, value_parser = parse_number, default_value = "1e-6", global = true)]
    inductor_dc_resistance: f64,

    /// Forward resistance of diodes without a model or value (Ω)
    #[arg(long, value_parser = parse_number, default_value = "10", global = true)]
    diode_resistance: f64,

    /// Skip devices of unsupported type instead of failing
    #[arg(long, global = true)]
    ignore_unsupported: bool,

    /// Most points a sweep or transient run may produce
    #[arg(long, default_value_t = DEFAULT_MAX_POINTS, global = true)]
    max_points: usize,
}

impl SolverArgs {
    fn config(&self) -> SimulatorConfig {
        SimulatorConfig::default()
            .with_pivot_tolerance(self.pivot_tolerance)
            .with_inductor_dc_resistance(self.inductor_dc_resistance)
            .with_diode_default_resistance(self.diode_resistance)
            .with_convergence(ConvergenceCriteria {
                tolerance: self.tolerance,
                max_iterations: self.max_iterations,
                gmin: self.gmin,
            })
            .with_method(match self.method {
                Method::Be => IntegrationMethod::BackwardEuler,
                Method::Trap => IntegrationMethod::Trapezoidal,
            })
            .with_initial_conditions(match self.initial {
                InitialState::DeviceState => InitialConditions::DeviceState,
                InitialState::OperatingPoint => InitialConditions::OperatingPoint,
            })
            .with_ignore_unsupported(self.ignore_unsupported)
            .with_max_points(self.max_points)
    }
}

/// A circuit file: the circuit description plus an optional model library.
#[derive(Debug, Deserialize)]
struct CircuitFile {
    #[serde(flatten)]
    circuit: Circuit,
    #[serde(default)]
    library: ModelLibrary,
}

/// Parse a number in plain or engineering notation (`1e-3`, `1m`, `2.2k`).
fn parse_number(s: &str) -> std::result::Result<f64, String> {
    try_parse_value(s).ok_or_else(|| format!("'{}' is not a number", s))
}

fn load_circuit(path: &Path) -> Result<CircuitFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read circuit: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse circuit: {}", path.display()))
}

/// Log filter for a `-v` count; `RUST_LOG` takes precedence when set.
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let file = load_circuit(&cli.input)?;
    log::debug!(
        "loaded {} device(s), {} connection(s)",
        file.circuit.devices.len(),
        file.circuit.connections.len()
    );

    let config = cli.solver.config();
    let mut sim = Simulator::with_config(file.circuit, file.library, config)
        .context("Failed to prepare circuit")?;

    if cli.verbose > 0 && !cli.json {
        let netlist = sim.netlist();
        println!("Circuit: {}", cli.input.display());
        println!("Elements: {}", netlist.elements().len());
        println!("Nodes: {}", netlist.num_nodes());
        println!("Branch currents: {}", netlist.num_branches());
        println!();
    }

    match &cli.analysis {
        Analysis::Op => analysis::run_dc_op(&mut sim, cli.json),
        Analysis::Sweep {
            source,
            start,
            stop,
            step,
        } => analysis::run_dc_sweep(&mut sim, source, *start, *stop, *step, cli.json),
        Analysis::Tran { duration, step } => {
            if *duration <= 0.0 || *step <= 0.0 {
                bail!("duration and step must be positive");
            }
            analysis::run_transient(&mut sim, *duration, *step, cli.json)
        }
        Analysis::Ac {
            fstart,
            fstop,
            points,
            spacing,
        } => analysis::run_ac(&mut sim, *fstart, *fstop, *points, (*spacing).into(), cli.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_op() {
        let cli = Cli::try_parse_from(["nodal", "circuit.json", "op"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("circuit.json"));
        assert_eq!(cli.analysis, Analysis::Op);
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.solver.config(), SimulatorConfig::default());
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["nodal", "c.json", "-vv", "op"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(log_filter(cli.verbose), "debug");
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(7), "trace");
    }

    #[test]
    fn test_parse_sweep_engineering_values() {
        let cli = Cli::try_parse_from(["nodal", "c.json", "sweep", "V1", "-1", "2.5", "500m"])
            .unwrap();
        match cli.analysis {
            Analysis::Sweep {
                source,
                start,
                stop,
                step,
            } => {
                assert_eq!(source, "V1");
                assert_eq!(start, -1.0);
                assert_eq!(stop, 2.5);
                assert!((step - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[test]
    fn test_parse_tran_with_options() {
        let cli = Cli::try_parse_from([
            "nodal",
            "c.json",
            "tran",
            "5m",
            "100u",
            "--method",
            "trap",
            "--initial",
            "operating-point",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.analysis {
            Analysis::Tran { duration, step } => {
                assert!((duration - 5e-3).abs() < 1e-15);
                assert!((step - 1e-4).abs() < 1e-15);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
        let config = cli.solver.config();
        assert_eq!(config.method, IntegrationMethod::Trapezoidal);
        assert_eq!(config.initial_conditions, InitialConditions::OperatingPoint);
    }

    #[test]
    fn test_parse_ac_defaults() {
        let cli = Cli::try_parse_from(["nodal", "c.json", "ac", "1", "1meg"]).unwrap();
        assert_eq!(
            cli.analysis,
            Analysis::Ac {
                fstart: 1.0,
                fstop: 1e6,
                points: 10,
                spacing: Spacing::Decade,
            }
        );
    }

    #[test]
    fn test_solver_flags() {
        let cli = Cli::try_parse_from([
            "nodal",
            "c.json",
            "--max-iterations",
            "20",
            "--gmin",
            "1n",
            "--ignore-unsupported",
            "--max-points",
            "5000",
            "op",
        ])
        .unwrap();
        let config = cli.solver.config();
        assert_eq!(config.max_points, 5000);
        assert_eq!(config.convergence.max_iterations, 20);
        assert!((config.convergence.gmin - 1e-9).abs() < 1e-24);
        assert!(config.ignore_unsupported);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["nodal", "c.json", "tran", "abc", "1u"]).is_err());
        assert!(Cli::try_parse_from(["nodal", "c.json"]).is_err());
        assert!(
            Cli::try_parse_from(["nodal", "c.json", "ac", "1", "1k", "--spacing", "cubic"])
                .is_err()
        );
    }

    #[test]
    fn test_circuit_file_with_library() {
        let json = r#"{
            "devices": [
                {"id": "V1", "type": "voltage_source", "value": 5, "terminals": ["pos", "neg"]},
                {"id": "D1", "type": "diode", "value": 0, "model": "DMOD", "terminals": ["anode", "cathode"]}
            ],
            "connections": [
                {"id": "W1", "deviceA": "V1", "portA": "pos", "deviceB": "D1", "portB": "anode"}
            ],
            "library": {
                "diodes": {"DMOD": {"saturationCurrent": 1e-14, "emissionCoefficient": 1.0}}
            }
        }"#;
        let file: CircuitFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.circuit.devices.len(), 2);
        assert!(file.library.diode("DMOD").is_some());

        let bare: CircuitFile = serde_json::from_str(r#"{"devices": []}"#).unwrap();
        assert!(bare.library.is_empty());
    }
}
