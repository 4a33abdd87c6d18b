// Simulation Configuration

use std::fs;
use std::path::Path;

use log::LevelFilter;
use serde::Deserialize;

use crate::an_error::ConfigError;
use crate::an_topology::TopologyConfig;

// ============================================================================
// Configuration File
// ============================================================================

/// Parameters of one run, as read from a YAML file
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Step horizon
    pub time: usize,

    /// Lattice degree of the initial small-world topology
    pub connectivity: usize,

    /// Rewiring probability of the initial topology
    pub rewiring: f64,

    /// Transmission probability per contact
    pub beta: f64,

    /// Recovery probability per step
    pub gamma: f64,

    /// Initial population sizing: the network has `spop + ipop + rpop` nodes,
    /// `ipop` draws are seeded Infectious and `rpop` draws Recovered
    pub spop: usize,
    pub ipop: usize,
    pub rpop: usize,

    /// Edges removed per step by adaptive removal; 0 isolates every Infectious node
    pub restrict: usize,

    /// Reserved, not read by any transition
    pub delay: u32,

    /// Steps a node stays Undetected before it is detected; absent disables detection
    #[serde(default)]
    pub discovery: Option<u32>,

    /// Fraction of edges removed by pre-hardening
    pub prer: f64,

    /// Hex encoded 32 byte seed; a fresh one is drawn when absent
    #[serde(default)]
    pub seed: Option<String>,

    /// CSV output path
    #[serde(default)]
    pub output: Option<String>,
}

/// Switches that are chosen per run rather than per configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Log the initial topology
    pub display_topology: bool,

    /// Debug level logging of per-step calculations
    pub verbose: bool,

    /// Enable per-step adaptive edge removal
    pub adaptive: bool,

    /// Enable one-time pre-hardening
    pub prer_mode: bool,
}

impl RunOptions {
    /// Log level for a run: per-step calculations at debug when verbose
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

impl SimulationConfig {
    /// Read, parse and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn num_nodes(&self) -> usize {
        self.spop + self.ipop + self.rpop
    }

    pub fn detection(&self) -> bool {
        self.discovery.is_some()
    }

    pub fn topology(&self) -> TopologyConfig {
        TopologyConfig {
            num_nodes: self.num_nodes(),
            connectivity: self.connectivity,
            rewiring: self.rewiring,
            initial_infectious: self.ipop,
            initial_recovered: self.rpop,
        }
    }

    /// Seed from the configuration, if one is set
    pub fn parsed_seed(&self) -> Result<Option<[u8; 32]>, ConfigError> {
        self.seed.as_deref().map(parse_seed_hex).transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("beta", self.beta)?;
        check_probability("gamma", self.gamma)?;
        check_probability("rewiring", self.rewiring)?;
        check_probability("prer", self.prer)?;

        if self.num_nodes() == 0 {
            return Err(ConfigError::InvalidValue {
                key: "spop",
                reason: "population is empty".to_string(),
            });
        }
        if self.connectivity >= self.num_nodes() {
            return Err(ConfigError::InvalidValue {
                key: "connectivity",
                reason: format!(
                    "{} must be smaller than the node count {}",
                    self.connectivity,
                    self.num_nodes()
                ),
            });
        }
        if self.discovery == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "discovery",
                reason: "threshold must be at least 1".to_string(),
            });
        }
        self.parsed_seed()?;

        Ok(())
    }
}

fn check_probability(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: format!("{} is not in [0, 1]", value),
        })
    }
}

/// Parse a seed given as up to 64 hex digits, `0x` prefix optional.
///
/// Shorter input fills the leading bytes, the rest stay zero.
pub fn parse_seed_hex(hex: &str) -> Result<[u8; 32], ConfigError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.is_empty() || hex.len() > 64 || hex.len() % 2 != 0 {
        return Err(ConfigError::InvalidSeed(format!(
            "expected an even number of hex digits, at most 64, got {}",
            hex.len()
        )));
    }

    let mut seed = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let byte_str =
            std::str::from_utf8(chunk).map_err(|e| ConfigError::InvalidSeed(e.to_string()))?;
        seed[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|e| ConfigError::InvalidSeed(format!("{}: {}", byte_str, e)))?;
    }

    Ok(seed)
}

/// Hex rendering of a seed, accepted back by [`parse_seed_hex`]
pub fn format_seed_hex(seed: &[u8; 32]) -> String {
    let mut out = String::with_capacity(66);
    out.push_str("0x");
    for byte in seed {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
