//! Numeric algorithm ids and the factory behind them.

use super::{BanPolicy, DijkstraRouter, DomainRouter, MinHopRouter, RoutingAlgorithm};
use crate::domain::DomainLayout;
use crate::error::CoreError;
use crate::topology::Grid;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Domain partitions registered under ids 200..=209, in id order.
const DOMAIN_PARTITIONS: [(usize, usize); 10] = [
    (7, 10),
    (4, 10),
    (7, 20),
    (4, 20),
    (4, 2),
    (2, 2),
    (14, 60),
    (1, 2),
    (2, 1),
    (1, 1),
];

/// How end-to-end observer paths are evaluated for an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathModel {
    /// Follow each node's table entry for the destination
    HopByHop,
    
    /// Walk in-domain tables and search across domain borders
    DomainBridge { kp: usize, kn: usize },
}

/// A concrete routing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Dijkstra(BanPolicy),
    MinHop(BanPolicy),
    Domain { kp: usize, kn: usize },
}

impl AlgorithmKind {
    /// Name used in reports and RIB directories.
    pub fn name(&self) -> String {
        match self {
            AlgorithmKind::Dijkstra(policy) => DijkstraRouter::name_for(*policy).to_string(),
            AlgorithmKind::MinHop(policy) => MinHopRouter::name_for(*policy).to_string(),
            AlgorithmKind::Domain { kp, kn } => DomainRouter::name_for(*kp, *kn),
        }
    }
    
    /// Type name of the per-node instances, shown as the report's node type.
    pub fn node_type(&self) -> &'static str {
        match self {
            AlgorithmKind::Dijkstra(_) => "DijkstraRouter",
            AlgorithmKind::MinHop(_) => "MinHopRouter",
            AlgorithmKind::Domain { .. } => "DomainRouter",
        }
    }
    
    pub fn path_model(&self) -> PathModel {
        match self {
            AlgorithmKind::Domain { kp, kn } => PathModel::DomainBridge { kp: *kp, kn: *kn },
            _ => PathModel::HopByHop,
        }
    }
    
    /// Creates one instance per node of `grid`.
    pub fn build_all(&self, grid: &Grid) -> Result<Vec<Box<dyn RoutingAlgorithm>>, CoreError> {
        let n = grid.len();
        let nodes: Vec<Box<dyn RoutingAlgorithm>> = match *self {
            AlgorithmKind::Dijkstra(policy) => (0..n)
                .map(|id| Box::new(DijkstraRouter::new(id, n, policy)) as Box<dyn RoutingAlgorithm>)
                .collect(),
            AlgorithmKind::MinHop(policy) => (0..n)
                .map(|id| Box::new(MinHopRouter::new(id, n, policy)) as Box<dyn RoutingAlgorithm>)
                .collect(),
            AlgorithmKind::Domain { kp, kn } => {
                let layout = Arc::new(DomainLayout::new(*grid, kp, kn)?);
                (0..n)
                    .map(|id| Box::new(DomainRouter::new(id, layout.clone())) as Box<dyn RoutingAlgorithm>)
                    .collect()
            }
        };
        info!("Created {} {} node instances", nodes.len(), self.name());
        Ok(nodes)
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps stable numeric ids to algorithm kinds.
///
/// Built once at startup and handed to the simulator.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    entries: BTreeMap<u32, AlgorithmKind>,
}

impl AlgorithmRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }
    
    /// The built-in id table.
    ///
    /// | id        | algorithm                |
    /// |-----------|--------------------------|
    /// | 3001      | `DijkstraBase`           |
    /// | 3002      | `DijkstraProbe`          |
    /// | 3003      | `DijkstraPred`           |
    /// | 5001      | `MinHopCount`            |
    /// | 5011      | `MinHopCountPred`        |
    /// | 200..=209 | `DomainHeuristic_Kp_Kn`  |
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(3001, AlgorithmKind::Dijkstra(BanPolicy::Ignore));
        registry.register(3002, AlgorithmKind::Dijkstra(BanPolicy::Current));
        registry.register(3003, AlgorithmKind::Dijkstra(BanPolicy::Future));
        registry.register(5001, AlgorithmKind::MinHop(BanPolicy::Ignore));
        registry.register(5011, AlgorithmKind::MinHop(BanPolicy::Future));
        for (offset, (kp, kn)) in DOMAIN_PARTITIONS.into_iter().enumerate() {
            registry.register(200 + offset as u32, AlgorithmKind::Domain { kp, kn });
        }
        registry
    }
    
    /// Registers or replaces an id.
    pub fn register(&mut self, id: u32, kind: AlgorithmKind) {
        self.entries.insert(id, kind);
    }
    
    pub fn get(&self, id: u32) -> Result<AlgorithmKind, CoreError> {
        self.entries.get(&id).copied().ok_or_else(|| CoreError::UnknownAlgorithm {
            id,
            known: self
                .entries
                .keys()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
    
    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, AlgorithmKind)> + '_ {
        self.entries.iter().map(|(id, kind)| (*id, *kind))
    }
    
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_standard_ids() {
        let registry = AlgorithmRegistry::standard();
        assert_eq!(registry.len(), 15);
        assert_eq!(registry.get(3003).unwrap().name(), "DijkstraPred");
        assert_eq!(registry.get(5011).unwrap().name(), "MinHopCountPred");
        assert_eq!(registry.get(205).unwrap(), AlgorithmKind::Domain { kp: 2, kn: 2 });
        assert_eq!(registry.get(209).unwrap().name(), "DomainHeuristic_1_1");
    }
    
    #[test]
    fn test_node_type_follows_variant() {
        let registry = AlgorithmRegistry::standard();
        assert_eq!(registry.get(3001).unwrap().node_type(), "DijkstraRouter");
        assert_eq!(registry.get(5011).unwrap().node_type(), "MinHopRouter");
        assert_eq!(registry.get(200).unwrap().node_type(), "DomainRouter");
    }
    
    #[test]
    fn test_unknown_id_lists_known() {
        let registry = AlgorithmRegistry::standard();
        match registry.get(42) {
            Err(CoreError::UnknownAlgorithm { id, known }) => {
                assert_eq!(id, 42);
                assert!(known.contains("3001"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    
    #[test]
    fn test_build_all_one_per_node() {
        let grid = Grid::new(4, 4, 0).unwrap();
        let nodes = AlgorithmKind::Dijkstra(BanPolicy::Current).build_all(&grid).unwrap();
        assert_eq!(nodes.len(), 16);
        assert!(nodes.iter().enumerate().all(|(i, n)| n.node_id() == i));
        assert_eq!(nodes[3].name(), "DijkstraProbe");
    }
    
    #[test]
    fn test_domain_build_checks_divisibility() {
        let grid = Grid::new(4, 4, 0).unwrap();
        let kind = AlgorithmKind::Domain { kp: 7, kn: 10 };
        assert!(matches!(kind.build_all(&grid), Err(CoreError::IndivisibleDomain { .. })));
        assert_eq!(kind.path_model(), PathModel::DomainBridge { kp: 7, kn: 10 });
    }
}
