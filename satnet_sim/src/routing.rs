//! Parallel per-node route computation and table merge.

use crate::error::SimError;
use crate::rib::RibWriter;
use rayon::prelude::*;
use rayon::ThreadPool;
use satnet_core::{AlgorithmKind, Grid, NetworkView, RouteTables, RoutingAlgorithm};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteUpdate {
    /// Sum of per-node compute durations (ms)
    pub compute_ms: f64,
    
    /// Table entries that changed
    pub updated_entries: usize,
}

/// Owns one algorithm instance per node and the merged N×N table.
///
/// Computation is spread over a fixed worker pool in contiguous node
/// batches; merging happens afterwards on the calling thread in node order,
/// so the resulting table never depends on worker timing.
pub struct RoutingManager {
    nodes: Vec<Box<dyn RoutingAlgorithm>>,
    tables: RouteTables,
    algorithm: String,
    pool: ThreadPool,
    workers: usize,
    rib: Option<RibWriter>,
}

impl RoutingManager {
    /// Builds the instances for `kind` on `grid`.
    pub fn new(kind: &AlgorithmKind, grid: &Grid, rib: Option<RibWriter>) -> Result<Self, SimError> {
        let nodes = kind.build_all(grid)?;
        Self::from_nodes(nodes, grid.len(), kind.name(), rib)
    }
    
    /// Wraps pre-built instances. `nodes[i]` must route for node `i`.
    pub fn from_nodes(
        nodes: Vec<Box<dyn RoutingAlgorithm>>,
        num_nodes: usize,
        algorithm: String,
        rib: Option<RibWriter>,
    ) -> Result<Self, SimError> {
        let workers = default_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("route-worker-{}", i))
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;
        info!(
            "Routing manager: {} nodes running {} on {} workers",
            nodes.len(),
            algorithm,
            workers
        );
        Ok(Self {
            nodes,
            tables: RouteTables::new(num_nodes),
            algorithm,
            pool,
            workers,
            rib,
        })
    }
    
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm
    }
    
    pub fn tables(&self) -> &RouteTables {
        &self.tables
    }
    
    pub fn workers(&self) -> usize {
        self.workers
    }
    
    /// Recomputes every node's row and merges the changes.
    pub fn compute_and_update_routes(&mut self, view: &NetworkView<'_>, time_step: u64) -> RouteUpdate {
        let n = self.tables.num_nodes();
        let batch = (n / self.workers).max(1);
        let nodes = &mut self.nodes;
        
        let batch_ms: Vec<f64> = self.pool.install(|| {
            nodes
                .par_chunks_mut(batch)
                .map(|chunk| {
                    chunk
                        .iter_mut()
                        .map(|node| {
                            let start = Instant::now();
                            node.compute(view);
                            start.elapsed().as_secs_f64() * 1000.0
                        })
                        .sum::<f64>()
                })
                .collect()
        });
        let compute_ms: f64 = batch_ms.iter().sum();
        
        let mut updated_entries = 0;
        for node in &self.nodes {
            let id = node.node_id();
            let row = node.route_table();
            if row.len() != n || id >= n {
                warn!(
                    "Node {} returned route table of length {} (expected {}); keeping previous row",
                    id,
                    row.len(),
                    n
                );
                continue;
            }
            updated_entries += self.tables.merge_row(id, row);
            
            if let Some(rib) = self.rib.as_ref().filter(|r| r.is_flagged(id)) {
                if let Err(e) = rib.save(id, time_step, self.tables.row(id)) {
                    warn!("Failed to save RIB for node {} at t={}: {}", id, time_step, e);
                }
            }
        }
        
        debug!(
            "Route update at t={}: {} batches of {}, {} entries changed",
            time_step,
            batch_ms.len(),
            batch,
            updated_entries
        );
        RouteUpdate {
            compute_ms,
            updated_entries,
        }
    }
}

/// One less than the available cores, at least one.
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use satnet_core::{BanPolicy, LinkModel, Port, WorldState, NO_PORT};
    use tempfile::TempDir;
    
    fn flat(p: usize, q: usize) -> (Grid, LinkModel, WorldState) {
        let grid = Grid::new(p, q, 0).unwrap();
        let mut world = WorldState::new(grid.len());
        world.positions = vec![Vector3::new(7000.0, 0.0, 0.0); grid.len()];
        (grid, LinkModel::default(), world)
    }
    
    #[test]
    fn test_first_update_fills_table() {
        let (grid, link, world) = flat(4, 4);
        let mut rm = RoutingManager::new(&AlgorithmKind::Dijkstra(BanPolicy::Current), &grid, None).unwrap();
        let view = NetworkView::new(&grid, &link, &world);
        let update = rm.compute_and_update_routes(&view, 0);
        // every node gets a port toward the 15 others
        assert_eq!(update.updated_entries, 16 * 15);
        assert!(update.compute_ms >= 0.0);
        assert_ne!(rm.tables().get(0, 10), NO_PORT);
        assert_eq!(rm.tables().get(3, 3), NO_PORT);
    }
    
    #[test]
    fn test_unchanged_world_gives_zero_diff() {
        let (grid, link, world) = flat(4, 6);
        let mut rm = RoutingManager::new(&AlgorithmKind::MinHop(BanPolicy::Ignore), &grid, None).unwrap();
        let view = NetworkView::new(&grid, &link, &world);
        rm.compute_and_update_routes(&view, 0);
        let before = rm.tables().clone();
        let again = rm.compute_and_update_routes(&view, 1);
        assert_eq!(again.updated_entries, 0);
        assert_eq!(rm.tables(), &before);
    }
    
    #[test]
    fn test_outage_changes_some_entries() {
        let (grid, link, mut world) = flat(4, 4);
        let mut rm = RoutingManager::new(&AlgorithmKind::Dijkstra(BanPolicy::Current), &grid, None).unwrap();
        rm.compute_and_update_routes(&NetworkView::new(&grid, &link, &world), 0);
        world.cur_banned.ban_node(5);
        let update = rm.compute_and_update_routes(&NetworkView::new(&grid, &link, &world), 1);
        assert!(update.updated_entries > 0);
        assert!(rm.tables().row(5).iter().all(|p| *p == NO_PORT));
    }
    
    struct Misbehaving {
        id: usize,
        row: Vec<Port>,
    }
    
    impl RoutingAlgorithm for Misbehaving {
        fn compute(&mut self, _view: &NetworkView<'_>) {}
        fn name(&self) -> &str {
            "Misbehaving"
        }
        fn node_id(&self) -> usize {
            self.id
        }
        fn route_table(&self) -> &[Port] {
            &self.row
        }
    }
    
    #[test]
    fn test_wrong_length_row_is_skipped() {
        let (grid, link, world) = flat(1, 3);
        let nodes: Vec<Box<dyn RoutingAlgorithm>> = vec![
            Box::new(Misbehaving { id: 0, row: vec![0, 3, 1] }),
            Box::new(Misbehaving { id: 1, row: vec![1, 0] }),
            Box::new(Misbehaving { id: 2, row: vec![3, 1, 0] }),
        ];
        let mut rm = RoutingManager::from_nodes(nodes, 3, "Misbehaving".into(), None).unwrap();
        let update = rm.compute_and_update_routes(&NetworkView::new(&grid, &link, &world), 0);
        assert_eq!(update.updated_entries, 4);
        assert_eq!(rm.tables().row(1), &[0, 0, 0]);
    }
    
    #[test]
    fn test_flagged_nodes_dump_rib() {
        let root = TempDir::new().unwrap();
        let (grid, link, world) = flat(2, 2);
        let kind = AlgorithmKind::MinHop(BanPolicy::Ignore);
        let rib = RibWriter::new(root.path(), "demo", &kind.name(), &[1], grid.len());
        let mut rm = RoutingManager::new(&kind, &grid, Some(rib)).unwrap();
        rm.compute_and_update_routes(&NetworkView::new(&grid, &link, &world), 5);
        let dumped = root.path().join("demo/MinHopCount/1/5.txt");
        assert!(dumped.exists());
        assert!(!root.path().join("demo/MinHopCount/0").exists());
    }
}
