//! # adaptive_net - Epidemic Spread on an Adaptive Contact Network
//!
//! Simulates a contagion spreading over an undirected contact network and evaluates a
//! defensive strategy that severs edges under a limited intervention budget.
//!
//! ## Core Components
//!
//! - **Sampler**: discretised Bernoulli trials driving every stochastic transition
//! - **EpidemicEngine / DiscoveryTracker**: spread, recovery and dwell-time detection
//! - **Centrality**: edge betweenness and current-flow betweenness
//! - **Policy**: one-time pre-hardening and per-step budgeted edge removal
//! - **Scheduler**: fixed phase order per timestep, termination, metric emission
//!
//! ## Usage
//!
//! ```no_run
//! use adaptive_net::{run_simulation, RunOptions, SimulationConfig};
//! use adaptive_net::an_metrics::ConsoleMetricsSink;
//!
//! let config = SimulationConfig::load("configs/small_world.yaml").unwrap();
//! let options = RunOptions { adaptive: true, ..Default::default() };
//!
//! let result = run_simulation(&config, &options, None, &mut ConsoleMetricsSink).unwrap();
//! result.print_summary();
//! ```
//!
//! A run is fully determined by its seed: topology construction and every transition draw
//! from the same generator.

// Simulation kernel
pub mod an_centrality;
pub mod an_epidemic;
pub mod an_interface;
pub mod an_network;
pub mod an_policy;
pub mod an_sampler;
pub mod an_scheduler;

// Surroundings
pub mod an_config;
pub mod an_error;
pub mod an_metrics;
pub mod an_topology;

// Re-export commonly used types
pub use an_config::{RunOptions, SimulationConfig};
pub use an_error::{ConfigError, SamplerError, SimError};
pub use an_interface::{
    Edge, MetricsRecord, MetricsSink, NoOpSink, NodeId, NodeState, RecordSchema, StateCounts,
    TimeStep,
};
pub use an_network::Network;
pub use an_scheduler::{run_simulation, Scheduler, SimulationResult, Termination};
