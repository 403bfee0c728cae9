//! Per-node routing algorithms.
//!
//! Every satellite owns one [`RoutingAlgorithm`] instance. On each update
//! period the simulator calls [`RoutingAlgorithm::compute`] with a
//! read-only [`NetworkView`] and then reads back the node's row of next-hop
//! ports. Instances keep private state across calls.
//!
//! Variants are a few strategy types rather than a hierarchy:
//!
//! - [`DijkstraRouter`]: latency-weighted shortest path
//! - [`MinHopRouter`]: breadth-first minimum hop count
//! - [`DomainRouter`]: minimum hop count restricted to the node's domain
//!
//! Each takes a [`BanPolicy`] (or a fixed one) deciding which banned-link
//! bitmap, if any, forbids edges. Concrete variants are looked up by numeric
//! id in an [`AlgorithmRegistry`].

mod dijkstra;
mod minhop;
mod registry;

pub use dijkstra::DijkstraRouter;
pub use minhop::{DomainRouter, MinHopRouter};
pub use registry::{AlgorithmKind, AlgorithmRegistry, PathModel};

use crate::physics::LinkModel;
use crate::topology::{Grid, Port};
use crate::world::{BannedLinks, WorldState};
use serde::{Deserialize, Serialize};

/// Read-only view of the network handed to algorithms.
#[derive(Debug, Clone, Copy)]
pub struct NetworkView<'a> {
    pub grid: &'a Grid,
    pub link: &'a LinkModel,
    pub world: &'a WorldState,
}

impl<'a> NetworkView<'a> {
    pub fn new(grid: &'a Grid, link: &'a LinkModel, world: &'a WorldState) -> Self {
        Self { grid, link, world }
    }
    
    pub fn num_nodes(&self) -> usize {
        self.grid.len()
    }
    
    /// One-hop delay between two satellites at their current positions.
    pub fn delay_ms(&self, u: usize, v: usize) -> f64 {
        self.link.delay_ms(&self.world.positions[u], &self.world.positions[v])
    }
}

/// Which banned-link bitmap an algorithm honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BanPolicy {
    /// Route as if every link were up
    Ignore,
    
    /// Avoid links down at this instant
    Current,
    
    /// Avoid links expected down during the coming update period
    Future,
}

impl BanPolicy {
    /// The bitmap to consult, or `None` for [`BanPolicy::Ignore`].
    pub fn bitmap<'a>(&self, world: &'a WorldState) -> Option<&'a BannedLinks> {
        match self {
            BanPolicy::Ignore => None,
            BanPolicy::Current => Some(&world.cur_banned),
            BanPolicy::Future => Some(&world.futr_banned),
        }
    }
}

/// A per-node route computation.
///
/// `route_table` returns the row produced by the last `compute` (all
/// [`crate::topology::NO_PORT`] before the first one). Unreachable
/// destinations are `NO_PORT`; that is never an error.
pub trait RoutingAlgorithm: Send {
    /// Recomputes this node's row from the current world.
    fn compute(&mut self, view: &NetworkView<'_>);
    
    fn name(&self) -> &str;
    
    /// The node this instance routes for.
    fn node_id(&self) -> usize;
    
    fn route_table(&self) -> &[Port];
}
