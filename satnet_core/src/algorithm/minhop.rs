//! Breadth-first minimum hop routing, optionally confined to a domain.

use super::{BanPolicy, NetworkView, RoutingAlgorithm};
use crate::domain::DomainLayout;
use crate::topology::{Direction, Port, NO_PORT};
use crate::world::BannedLinks;
use std::collections::VecDeque;
use std::sync::Arc;

/// Reusable BFS buffers.
#[derive(Debug, Default)]
struct Bfs {
    /// Hop level + 1; 0 = not reached
    level: Vec<u32>,
    queue: VecDeque<usize>,
}

impl Bfs {
    /// Fills `route` with the first hop toward every reachable node.
    ///
    /// Among equal-hop paths the smallest first port wins. `admit` filters
    /// which nodes the search may enter.
    fn run(
        &mut self,
        view: &NetworkView<'_>,
        src: usize,
        banned: Option<&BannedLinks>,
        admit: impl Fn(usize) -> bool,
        route: &mut Vec<Port>,
    ) {
        let n = view.num_nodes();
        route.clear();
        route.resize(n, NO_PORT);
        self.level.clear();
        self.level.resize(n, 0);
        self.queue.clear();
        
        self.level[src] = 1;
        self.queue.push_back(src);
        
        while let Some(cur) = self.queue.pop_front() {
            for dir in Direction::ALL {
                let port = dir.port();
                if banned.is_some_and(|b| b.is_banned(cur, port)) {
                    continue;
                }
                let nxt = view.grid.step(cur, dir);
                if nxt == src || !admit(nxt) {
                    continue;
                }
                let first = if cur == src { port } else { route[cur] };
                if self.level[nxt] == 0 {
                    self.level[nxt] = self.level[cur] + 1;
                    route[nxt] = first;
                    self.queue.push_back(nxt);
                } else if self.level[nxt] == self.level[cur] + 1 && first < route[nxt] {
                    route[nxt] = first;
                }
            }
        }
    }
}

/// Minimum hop count over the whole constellation.
///
/// `MinHopCount` ignores outages; `MinHopCountPred` avoids links expected
/// down during the update period.
pub struct MinHopRouter {
    id: usize,
    policy: BanPolicy,
    bfs: Bfs,
    route: Vec<Port>,
}

impl MinHopRouter {
    pub fn new(id: usize, num_nodes: usize, policy: BanPolicy) -> Self {
        Self {
            id,
            policy,
            bfs: Bfs::default(),
            route: vec![NO_PORT; num_nodes],
        }
    }
    
    pub fn name_for(policy: BanPolicy) -> &'static str {
        match policy {
            BanPolicy::Ignore => "MinHopCount",
            BanPolicy::Current => "MinHopCountProbe",
            BanPolicy::Future => "MinHopCountPred",
        }
    }
}

impl RoutingAlgorithm for MinHopRouter {
    fn compute(&mut self, view: &NetworkView<'_>) {
        let banned = self.policy.bitmap(view.world);
        self.bfs.run(view, self.id, banned, |_| true, &mut self.route);
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

/// Minimum hop routing inside the node's own Kp×Kn domain.
///
/// Destinations in other domains stay unreachable in the table; crossing
/// domains is resolved at path-evaluation time by
/// [`crate::domain::DomainPathSearch`]. Honors current outages.
pub struct DomainRouter {
    id: usize,
    layout: Arc<DomainLayout>,
    name: String,
    bfs: Bfs,
    route: Vec<Port>,
}

impl DomainRouter {
    pub fn new(id: usize, layout: Arc<DomainLayout>) -> Self {
        let n = layout.grid().len();
        Self {
            id,
            name: Self::name_for(layout.kp(), layout.kn()),
            layout,
            bfs: Bfs::default(),
            route: vec![NO_PORT; n],
        }
    }
    
    pub fn name_for(kp: usize, kn: usize) -> String {
        format!("DomainHeuristic_{}_{}", kp, kn)
    }
}

impl RoutingAlgorithm for DomainRouter {
    fn compute(&mut self, view: &NetworkView<'_>) {
        let home = self.layout.domain_id(self.id);
        let layout = &self.layout;
        self.bfs.run(
            view,
            self.id,
            Some(&view.world.cur_banned),
            |node| layout.domain_id(node) == home,
            &mut self.route,
        );
    }
    
    fn name(&self) -> &str {
        &self.name
    }
    
    fn node_id(&self) -> usize {
        self.id
    }
    
    fn route_table(&self) -> &[Port] {
        &self.route
    }
}
