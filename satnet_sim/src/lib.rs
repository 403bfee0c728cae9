//! satnet Simulator - Time-Stepped Routing over a Satellite Mesh
//!
//! This crate runs routing algorithms from `satnet_core` against a moving
//! constellation served by a `satnet_env` source, and measures what
//! packets would experience along the computed tables.
//!
//! # The Loop
//!
//! Every step the orchestrator walks the same phases:
//!
//! ```text
//! LoadState ─► [every update period]
//!              LoadFutureBanned ─► ApplyFailures ─► ComputeRoutes
//!          ─► CollectStats ─► [every refresh period] Report
//!          ─► Visualize ─► AdvanceTime
//! ```
//!
//! - **Routing**: one algorithm instance per satellite, computed in
//!   parallel batches on a worker pool and merged in node order
//! - **Failures**: seeded random node/link failures on top of scheduled
//!   outages, reproducible from the config seed
//! - **Statistics**: per-observer latency and failure-rate averages,
//!   written to a plain-text report
//!
//! # Usage
//!
//! ```ignore
//! use satnet_core::AlgorithmRegistry;
//! use satnet_env::FsSource;
//! use satnet_sim::{load_observers, SimConfig, Simulation};
//!
//! let config = SimConfig::load("config.json")?;
//! let observers = load_observers(&config.observer_config_path, config.num_nodes())?;
//! let source = FsSource::new(config.data_dirs(), config.num_nodes());
//! let mut sim = Simulation::new(config, &AlgorithmRegistry::standard(), 3001, source, observers)?;
//! let summary = sim.run()?;
//! ```

pub mod config;
mod data_manager;
mod error;
mod failure;
pub mod frames;
mod reporter;
mod rib;
mod routing;
mod simulation;
mod static_source;
mod stats;

pub use config::{SimConfig, VisualizationConfig};
pub use data_manager::DataManager;
pub use error::{ConfigError, SimError};
pub use failure::{FailureManager, FailureReport};
pub use frames::{Frame, FrameSink, JsonFrameExporter, NoFrames};
pub use reporter::{ReportClock, Reporter};
pub use rib::RibWriter;
pub use routing::{RouteUpdate, RoutingManager};
pub use simulation::{Phase, RunSummary, Simulation};
pub use static_source::StaticSource;
pub use stats::{
    load_observers, parse_observers, ObserverPair, ObserverStats, PathOutcome, PathWalker, StatisticsCollector,
    StatsSnapshot,
};
