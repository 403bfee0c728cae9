//! satnet Core - Routing over a Moving Satellite Mesh
//!
//! Building blocks for simulating packet routing across a toroidal
//! constellation of inter-satellite links:
//!
//! 1. **Topology**: the P×Q grid with phase shift F and its four link ports
//! 2. **Physics**: per-hop processing + propagation delay
//! 3. **World**: positions and banned-link bitmaps at the current instant
//! 4. **Algorithms**: per-node route computation behind one trait, selected
//!    by numeric id through [`AlgorithmRegistry`]
//! 5. **Domains**: Kp×Kn partitioning and cross-domain path evaluation

pub mod algorithm;
pub mod average;
pub mod domain;
pub mod error;
pub mod physics;
pub mod table;
pub mod topology;
pub mod world;

// Re-export key types for convenience
pub use algorithm::{
    AlgorithmKind, AlgorithmRegistry, BanPolicy, NetworkView, PathModel, RoutingAlgorithm,
};
pub use average::{Average, Observation};
pub use domain::{DomainLayout, DomainPathSearch};
pub use error::CoreError;
pub use physics::{calculate_delay_ms, LinkModel};
pub use table::RouteTables;
pub use topology::{Direction, Grid, Port, NO_PORT};
pub use world::{BannedLinks, WorldState};
