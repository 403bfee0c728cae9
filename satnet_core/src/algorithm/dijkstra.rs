//! Latency-weighted shortest path.

use super::{BanPolicy, NetworkView, RoutingAlgorithm};
use crate::topology::{Direction, Port, NO_PORT};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered so that `BinaryHeap` pops the smallest distance
/// first and, among equal distances, the earliest pushed.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over link delays, recording the first hop to every node.
///
/// One engine backs three variants:
///
/// | policy              | name            |
/// |---------------------|-----------------|
/// | `BanPolicy::Ignore` | `DijkstraBase`  |
/// | `BanPolicy::Current`| `DijkstraProbe` |
/// | `BanPolicy::Future` | `DijkstraPred`  |
pub struct DijkstraRouter {
    id: usize,
    policy: BanPolicy,
    dist: Vec<f64>,
    settled: Vec<bool>,
    route: Vec<Port>,
    heap: BinaryHeap<Candidate>,
}

impl DijkstraRouter {
    pub fn new(id: usize, num_nodes: usize, policy: BanPolicy) -> Self {
        Self {
            id,
            policy,
            dist: vec![f64::INFINITY; num_nodes],
            settled: vec![false; num_nodes],
            route: vec![NO_PORT; num_nodes],
            heap: BinaryHeap::new(),
        }
    }
    
    /// Variant name for a ban policy.
    pub fn name_for(policy: BanPolicy) -> &'static str {
        match policy {
            BanPolicy::Ignore => "DijkstraBase",
            BanPolicy::Current => "DijkstraProbe",
            BanPolicy::Future => "DijkstraPred",
        }
    }
    
    /// Cumulative delay (ms) to every node from the last computation.
    /// Unreachable nodes are `f64::INFINITY`.
    pub fn distances(&self) -> &[f64] {
        &self.dist
    }
}

impl RoutingAlgorithm for DijkstraRouter {
    fn compute(&mut self, view: &NetworkView<'_>) {
        let n = view.num_nodes();
        let banned = self.policy.bitmap(view.world);
        
        self.dist.clear();
        self.dist.resize(n, f64::INFINITY);
        self.settled.clear();
        self.settled.resize(n, false);
        self.route.clear();
        self.route.resize(n, NO_PORT);
        self.heap.clear();
        
        let mut seq = 0u64;
        self.dist[self.id] = 0.0;
        self.heap.push(Candidate {
            dist: 0.0,
            seq,
            node: self.id,
        });
        
        while let Some(Candidate { dist: d, node: u, .. }) = self.heap.pop() {
            if self.settled[u] || d > self.dist[u] {
                continue;
            }
            self.settled[u] = true;
            
            for dir in Direction::ALL {
                let port = dir.port();
                if banned.is_some_and(|b| b.is_banned(u, port)) {
                    continue;
                }
                let v = view.grid.step(u, dir);
                if v == u {
                    continue;
                }
                let nd = d + view.delay_ms(u, v);
                if nd < self.dist[v] {
                    self.dist[v] = nd;
                    self.route[v] = if u == self.id { port } else { self.route[u] };
                    seq += 1;
                    self.heap.push(Candidate { dist: nd, seq, node: v });
                }
            }
        }
        
        self.route[self.id] = NO_PORT;
    }
    
    fn name(&self) -> &str {
        Self::name_for(self.policy)
    }
    
    fn node_id(&self) -> usize {
        self.id
    }
    
    fn route_table(&self) -> &[Port] {
        &self.route
    }
}
