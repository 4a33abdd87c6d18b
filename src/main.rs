use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use simple_logger::SimpleLogger;

use adaptive_net::an_config::parse_seed_hex;
use adaptive_net::an_metrics::{ConsoleMetricsSink, CsvMetricsSink, MultiSink};
use adaptive_net::{run_simulation, MetricsSink, RunOptions, SimulationConfig};

/// Epidemic spread over a small-world network with adaptive edge removal
#[derive(Debug, Parser)]
#[command(name = "adaptive_net", version)]
struct Args {
    /// YAML configuration file
    config: PathBuf,

    /// Show the initial topology
    #[arg(long)]
    display: bool,

    /// Log per-step calculations
    #[arg(long, short)]
    verbose: bool,

    /// Enable per-step adaptive edge removal
    #[arg(long)]
    adaptive: bool,

    /// Enable one-time pre-hardening
    #[arg(long)]
    prer: bool,

    /// CSV output path, overrides `output` in the configuration
    #[arg(long)]
    output: Option<PathBuf>,

    /// Hex seed, overrides `seed` in the configuration
    #[arg(long)]
    seed: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let options = RunOptions {
        display_topology: args.display,
        verbose: args.verbose,
        adaptive: args.adaptive,
        prer_mode: args.prer,
    };

    if let Err(e) = SimpleLogger::new().with_level(options.log_level()).init() {
        eprintln!("failed to initialise logging: {}", e);
    }

    let config = match SimulationConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}: {}", args.config.display(), e);
            return ExitCode::from(1);
        }
    };

    let seed = match args.seed.as_deref().map(parse_seed_hex).transpose() {
        Ok(seed) => seed,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };

    info!(
        "running {} steps over {} nodes (detection: {}, adaptive: {}, pre-hardening: {})",
        config.time,
        config.num_nodes(),
        config.detection(),
        options.adaptive,
        options.prer_mode
    );

    let output = args
        .output
        .or_else(|| config.output.as_ref().map(PathBuf::from));
    let mut csv = match &output {
        Some(path) => match CsvMetricsSink::create(path) {
            Ok(sink) => Some(sink),
            Err(e) => {
                error!("cannot write {}: {}, continuing without CSV", path.display(), e);
                None
            }
        },
        None => None,
    };

    let mut console = ConsoleMetricsSink;
    let mut sinks: Vec<&mut dyn MetricsSink> = vec![&mut console];
    if let Some(csv) = csv.as_mut() {
        sinks.push(csv);
    }
    let mut sink = MultiSink::new(sinks);

    match run_simulation(&config, &options, seed, &mut sink) {
        Ok(result) => {
            result.print_summary();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("simulation failed: {}", e);
            ExitCode::from(2)
        }
    }
}
