use thiserror::Error;

/// Raised when a probability handed to the sampler is not in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SamplerError {
    #[error("probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),
}

/// Configuration could not be loaded; fatal before any simulation state exists
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("invalid seed: {0}")]
    InvalidSeed(String),
}

/// Errors surfaced while running a simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
