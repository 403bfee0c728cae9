//! Shared per-instant world state.
//!
//! The world is rebuilt every simulation step: positions are replaced
//! wholesale and both banned-link bitmaps are cleared and refilled. Routing
//! algorithms only ever see it through `&WorldState`, so nothing can mutate
//! it while routes are being computed.

use crate::topology::{Direction, Grid, Port, PORT_SLOTS};
use nalgebra::Vector3;
use satnet_env::{LinkPair, SatelliteSnapshot};
use tracing::warn;

/// Directed link bans indexed by `(node, port)`.
///
/// Slot 0 of every node is never set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedLinks {
    flags: Vec<[bool; PORT_SLOTS]>,
}

impl BannedLinks {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            flags: vec![[false; PORT_SLOTS]; num_nodes],
        }
    }
    
    pub fn len(&self) -> usize {
        self.flags.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
    
    pub fn clear(&mut self) {
        self.flags.fill([false; PORT_SLOTS]);
    }
    
    /// True if the link leaving `node` through `port` is unusable.
    pub fn is_banned(&self, node: usize, port: Port) -> bool {
        port != 0
            && self
                .flags
                .get(node)
                .and_then(|row| row.get(port as usize))
                .copied()
                .unwrap_or(false)
    }
    
    /// Bans one direction of a link. Port 0 is ignored.
    pub fn ban(&mut self, node: usize, port: Port) {
        if port == 0 {
            return;
        }
        if let Some(slot) = self.flags.get_mut(node).and_then(|r| r.get_mut(port as usize)) {
            *slot = true;
        }
    }
    
    /// Bans every outgoing port of `node`.
    pub fn ban_node(&mut self, node: usize) {
        for dir in Direction::ALL {
            self.ban(node, dir.port());
        }
    }
    
    /// Bans both directions of the link between `u` and `v`.
    ///
    /// Returns false, and bans nothing, when the nodes are not adjacent.
    pub fn ban_link(&mut self, grid: &Grid, u: usize, v: usize) -> bool {
        let (u_port, v_port) = grid.port_between(u, v);
        if u_port == 0 || v_port == 0 {
            return false;
        }
        self.ban(u, u_port);
        self.ban(v, v_port);
        true
    }
    
    /// Applies a list of scheduled outages, skipping pairs that are not
    /// direct neighbors. Returns the number of links banned.
    pub fn apply_pairs(&mut self, grid: &Grid, pairs: &[LinkPair], time: u64) -> usize {
        let mut applied = 0;
        for pair in pairs {
            if pair.a >= self.len() || pair.b >= self.len() {
                warn!("Banned link {} out of range at t={} (N={})", pair, time, self.len());
                continue;
            }
            if self.ban_link(grid, pair.a, pair.b) {
                applied += 1;
            } else {
                warn!("Could not find valid ports between nodes {} and {} at t={}", pair.a, pair.b, time);
            }
        }
        applied
    }
    
    /// Number of banned directed links.
    pub fn count(&self) -> usize {
        self.flags
            .iter()
            .map(|row| row.iter().filter(|b| **b).count())
            .sum()
    }
}

/// Snapshot of the constellation at the current simulation instant.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Links down right now
    pub cur_banned: BannedLinks,
    
    /// Union of links expected down during the coming update period
    pub futr_banned: BannedLinks,
    
    /// Cartesian positions (km)
    pub positions: Vec<Vector3<f64>>,
    
    /// Latitude, longitude, altitude
    pub lla: Vec<Vector3<f64>>,
    
    pub velocities: Vec<f64>,
}

impl WorldState {
    /// Creates an all-zero world for `num_nodes` satellites.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            cur_banned: BannedLinks::new(num_nodes),
            futr_banned: BannedLinks::new(num_nodes),
            positions: vec![Vector3::zeros(); num_nodes],
            lla: vec![Vector3::zeros(); num_nodes],
            velocities: vec![0.0; num_nodes],
        }
    }
    
    pub fn num_nodes(&self) -> usize {
        self.positions.len()
    }
    
    /// Replaces positions, LLA and velocities.
    pub fn set_snapshot(&mut self, snapshot: SatelliteSnapshot) {
        self.positions = snapshot.positions;
        self.lla = snapshot.lla;
        self.velocities = snapshot.velocities;
    }
}
