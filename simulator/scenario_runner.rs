// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/isolation.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/isolation.yaml --seed 0x1234...
//   cargo run --bin scenario_runner scenarios/ --verbose

use std::env;
use std::fs;
use std::path::Path;

use simple_logger::SimpleLogger;

use adaptive_net::an_config::parse_seed_hex;
use adaptive_net::an_metrics::CsvMetricsSink;
use adaptive_net::{run_simulation, MetricsSink, NoOpSink, RunOptions, SimulationConfig};

/// Scenario file: metadata, a configuration and the interventions to enable
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    meta: ScenarioMeta,

    config: SimulationConfig,

    #[serde(default)]
    options: ScenarioOptions,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioOptions {
    #[serde(default)]
    adaptive: bool,
    #[serde(default)]
    prer: bool,
    #[serde(default)]
    display: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX] [--verbose]",
            args[0]
        );
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/isolation.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/isolation.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let flags = &args[2..];

    let seed: Option<[u8; 32]> = match flags.iter().position(|a| a == "--seed") {
        Some(i) => match flags.get(i + 1).map(|hex| parse_seed_hex(hex)) {
            Some(Ok(seed)) => Some(seed),
            Some(Err(e)) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!("--seed needs a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let base = RunOptions {
        verbose: flags.iter().any(|a| a == "--verbose" || a == "-v"),
        ..Default::default()
    };

    SimpleLogger::new()
        .with_level(base.log_level())
        .init()
        .unwrap_or_else(|e| eprintln!("failed to initialise logging: {}", e));

    if path.is_file() {
        if let Err(e) = run_scenario_file(path, seed, &base) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    } else if path.is_dir() {
        let failed = run_scenario_directory(path, seed, &base);
        if failed > 0 {
            std::process::exit(1);
        }
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

/// Runs every scenario in `dir`; a bad file is reported and skipped. Returns the number of
/// scenarios that failed.
fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>, base: &RunOptions) -> usize {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        return 1;
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    let mut failed = Vec::new();
    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        if let Err(e) = run_scenario_file(scenario_path, seed, base) {
            eprintln!("{}", e);
            failed.push(scenario_path.display().to_string());
        }
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    if failed.is_empty() {
        println!("║  All scenarios complete!                               ║");
    } else {
        println!("║  {} of {} scenario(s) failed", failed.len(), scenarios.len());
    }
    println!("╚════════════════════════════════════════════════════════╝\n");
    for path in &failed {
        println!("  failed: {}", path);
    }

    failed.len()
}

/// Read, parse and validate a scenario file
fn load_scenario(path: &Path) -> Result<ScenarioFile, String> {
    let yaml_content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    scenario
        .config
        .validate()
        .map_err(|e| format!("Invalid scenario {}: {}", path.display(), e))?;

    Ok(scenario)
}

fn run_scenario_file(
    path: &Path,
    seed: Option<[u8; 32]>,
    base: &RunOptions,
) -> Result<(), String> {
    println!("Loading scenario from: {}", path.display());
    let scenario = load_scenario(path)?;

    println!("\n╔════════════════════════════════════════════════════════╗");
    match scenario.meta.name {
        Some(ref name) => println!("║  {}", name),
        None => println!(
            "║  Scenario: {}",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("?")
        ),
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let config = scenario.config;
    let options = RunOptions {
        display_topology: scenario.options.display,
        verbose: base.verbose,
        adaptive: scenario.options.adaptive,
        prer_mode: scenario.options.prer,
    };

    println!("Configuration:");
    println!("  Steps: {}", config.time);
    println!("  Nodes: {} ({} infectious)", config.num_nodes(), config.ipop);
    println!(
        "  Topology: connectivity {}, rewiring {}",
        config.connectivity, config.rewiring
    );
    println!("  beta: {}  gamma: {}  discovery: {:?}", config.beta, config.gamma, config.discovery);
    println!(
        "  Adaptive removal: {} (restrict {})",
        options.adaptive, config.restrict
    );
    println!("  Pre-hardening: {} (prer {})", options.prer_mode, config.prer);
    println!("\nStarting simulation...\n");

    let mut csv = config.output.as_ref().and_then(|out| {
        CsvMetricsSink::create(out)
            .map_err(|e| eprintln!("Cannot write {}: {}", out, e))
            .ok()
    });
    let mut noop = NoOpSink;
    let sink: &mut dyn MetricsSink = match csv.as_mut() {
        Some(csv) => csv,
        None => &mut noop,
    };

    let result = run_simulation(&config, &options, seed, sink)
        .map_err(|e| format!("Scenario {} failed: {}", path.display(), e))?;
    result.print_summary();
    println!("\n✓ Scenario complete!\n");
    Ok(())
}
