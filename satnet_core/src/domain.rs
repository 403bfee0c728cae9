//! Kp×Kn domain partition and cross-domain path evaluation.
//!
//! The P×Q grid is tiled into Kp×Kn rectangular domains. A satellite at
//! `(row, col)` belongs to domain `(I, J) = (row / (P/Kp), col / (Q/Kn))`
//! with id `I * Kn + J`.
//!
//! Domain routers only know routes inside their own domain. To evaluate an
//! end-to-end path, [`DomainPathSearch`] walks the in-domain tables and
//! crosses domain borders with a depth-first search over border nodes,
//! trying neighbor domains in order of a distance heuristic.

use crate::algorithm::NetworkView;
use crate::error::CoreError;
use crate::table::RouteTables;
use crate::topology::{Direction, Grid, PORT_SLOTS};

/// Upper bound on search recursion for one path evaluation.
pub const MAX_RECURSION: usize = 10_000;

/// Domain membership and per-domain border nodes of a grid.
#[derive(Debug, Clone)]
pub struct DomainLayout {
    grid: Grid,
    kp: usize,
    kn: usize,
    /// `border[domain][port]`: nodes whose link through `port` leaves the
    /// domain, ascending
    border: Vec<[Vec<usize>; PORT_SLOTS]>,
}

impl DomainLayout {
    /// Partitions `grid` into `kp × kn` domains.
    pub fn new(grid: Grid, kp: usize, kn: usize) -> Result<Self, CoreError> {
        if kp == 0 || kn == 0 || grid.p % kp != 0 || grid.q % kn != 0 {
            return Err(CoreError::IndivisibleDomain {
                kp,
                kn,
                p: grid.p,
                q: grid.q,
            });
        }
        let mut layout = Self {
            grid,
            kp,
            kn,
            border: vec![Default::default(); kp * kn],
        };
        for node in 0..grid.len() {
            let home = layout.domain_id(node);
            for dir in Direction::ALL {
                if layout.domain_id(grid.step(node, dir)) != home {
                    layout.border[home][dir.port() as usize].push(node);
                }
            }
        }
        Ok(layout)
    }
    
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    
    pub fn kp(&self) -> usize {
        self.kp
    }
    
    pub fn kn(&self) -> usize {
        self.kn
    }
    
    pub fn num_domains(&self) -> usize {
        self.kp * self.kn
    }
    
    /// `(I, J)` coordinates of the domain holding `node`.
    pub fn coords(&self, node: usize) -> (usize, usize) {
        let rows_per = self.grid.p / self.kp;
        let cols_per = self.grid.q / self.kn;
        (self.grid.row(node) / rows_per, self.grid.col(node) / cols_per)
    }
    
    pub fn domain_id(&self, node: usize) -> usize {
        let (i, j) = self.coords(node);
        i * self.kn + j
    }
    
    /// Nodes of `domain` with a link leaving it through `dir`.
    pub fn border_nodes(&self, domain: usize, dir: Direction) -> &[usize] {
        &self.border[domain][dir.port() as usize]
    }
    
    /// Heuristic preference for moving into `from`: the negated wrap-around
    /// distance between the domain columns of `from` and `to`.
    pub fn heuristic_score(&self, from: usize, to: usize) -> i64 {
        let kn = self.kn as i64;
        let js = (from % self.kn) as i64;
        let jd = (to % self.kn) as i64;
        let vertical = ((js - jd + kn) % kn).abs().min(((jd - js + kn) % kn).abs());
        -vertical
    }
}

/// Mutable state of one path evaluation.
struct Search {
    visited: Vec<bool>,
    depth: usize,
    dst: usize,
    target: usize,
}

/// Evaluates end-to-end latency over domain-local routing tables.
pub struct DomainPathSearch<'a> {
    layout: &'a DomainLayout,
    tables: &'a RouteTables,
    view: &'a NetworkView<'a>,
}

impl<'a> DomainPathSearch<'a> {
    pub fn new(layout: &'a DomainLayout, tables: &'a RouteTables, view: &'a NetworkView<'a>) -> Self {
        Self { layout, tables, view }
    }
    
    /// Latency (ms) from `src` to `dst`, or `None` if no path was found.
    pub fn path_latency(&self, src: usize, dst: usize) -> Option<f64> {
        let target = self.layout.domain_id(dst);
        if self.layout.domain_id(src) == target {
            return self.within_domain(src, dst);
        }
        let mut search = Search {
            visited: vec![false; self.layout.num_domains()],
            depth: 0,
            dst,
            target,
        };
        self.search(&mut search, src, None, 0.0)
    }
    
    /// Follows the tables from `src` to `dst` without leaving the domain.
    pub fn within_domain(&self, src: usize, dst: usize) -> Option<f64> {
        let grid = self.view.grid;
        let banned = &self.view.world.cur_banned;
        let home = self.layout.domain_id(src);
        let domain_size = self.layout.kp * self.layout.kn;
        let mut cur = src;
        let mut latency = 0.0;
        let mut steps = 0usize;
        
        while cur != dst {
            steps += 1;
            if steps * domain_size > 2 * grid.len() {
                return None;
            }
            let port = self.tables.get(cur, dst);
            if Direction::from_port(port).is_none() || banned.is_banned(cur, port) {
                return None;
            }
            let nxt = grid.move_node(cur, port);
            if self.layout.domain_id(nxt) != home {
                return None;
            }
            latency += self.view.delay_ms(cur, nxt);
            cur = nxt;
        }
        Some(latency)
    }
    
    fn search(&self, st: &mut Search, current: usize, prev: Option<Direction>, cost: f64) -> Option<f64> {
        let layout = self.layout;
        let grid = self.view.grid;
        let banned = &self.view.world.cur_banned;
        let here = layout.domain_id(current);
        
        if st.visited[here] {
            return None;
        }
        st.depth += 1;
        if st.depth > MAX_RECURSION {
            return None;
        }
        if current == st.dst {
            return Some(cost);
        }
        st.visited[here] = true;
        
        if here == st.target {
            let found = self.within_domain(current, st.dst).map(|v| cost + v);
            if found.is_none() {
                st.visited[here] = false;
            }
            return found;
        }
        
        let mut candidates: Vec<(Direction, i64)> = Direction::ALL
            .into_iter()
            .filter(|dir| prev != Some(dir.opposite()))
            .filter_map(|dir| {
                let sample = *layout.border_nodes(here, dir).first()?;
                let next_domain = layout.domain_id(grid.step(sample, dir));
                if st.visited[next_domain] {
                    return None;
                }
                Some((dir, layout.heuristic_score(next_domain, st.target)))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        
        for (dir, _) in candidates {
            let port = dir.port();
            let borders = layout.border_nodes(here, dir);
            
            if borders.binary_search(&current).is_ok() && !banned.is_banned(current, port) {
                let next = grid.step(current, dir);
                if !st.visited[layout.domain_id(next)] {
                    let hop = self.view.delay_ms(current, next);
                    if let Some(total) = self.search(st, next, Some(dir), cost + hop) {
                        return Some(total);
                    }
                }
            }
            
            for &border in borders {
                if border == current
                    || self.tables.get(current, border) == 0
                    || banned.is_banned(border, port)
                {
                    continue;
                }
                let Some(inner) = self.within_domain(current, border) else {
                    continue;
                };
                let next = grid.step(border, dir);
                let hop = self.view.delay_ms(border, next);
                if let Some(total) = self.search(st, next, Some(dir), cost + inner + hop) {
                    return Some(total);
                }
            }
        }
        
        st.visited[here] = false;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_support::{compute_all, flat_world};
    use crate::algorithm::{DomainRouter, RoutingAlgorithm};
    use crate::physics::LinkModel;
    use crate::world::WorldState;
    use approx::assert_relative_eq;
    use std::sync::Arc;
    
    #[test]
    fn test_domain_ids() {
        let grid = Grid::new(4, 6, 0).unwrap();
        let layout = DomainLayout::new(grid, 2, 3).unwrap();
        assert_eq!(layout.num_domains(), 6);
        // row 3, col 5 -> I = 1, J = 2
        assert_eq!(layout.coords(23), (1, 2));
        assert_eq!(layout.domain_id(23), 5);
        assert_eq!(layout.domain_id(0), 0);
    }
    
    #[test]
    fn test_indivisible_domain_rejected() {
        let grid = Grid::new(4, 6, 0).unwrap();
        assert!(DomainLayout::new(grid, 3, 3).is_err());
        assert!(DomainLayout::new(grid, 2, 4).is_err());
        assert!(DomainLayout::new(grid, 0, 1).is_err());
    }
    
    #[test]
    fn test_border_nodes() {
        let grid = Grid::new(4, 4, 0).unwrap();
        let layout = DomainLayout::new(grid, 2, 2).unwrap();
        // domain 0 = {0, 1, 4, 5}
        assert_eq!(layout.border_nodes(0, Direction::East), &[1, 5]);
        assert_eq!(layout.border_nodes(0, Direction::West), &[0, 4]);
        assert_eq!(layout.border_nodes(0, Direction::North), &[4, 5]);
        assert_eq!(layout.border_nodes(0, Direction::South), &[0, 1]);
    }
    
    #[test]
    fn test_single_domain_has_no_borders() {
        let grid = Grid::new(2, 2, 0).unwrap();
        let layout = DomainLayout::new(grid, 1, 1).unwrap();
        for dir in Direction::ALL {
            assert!(layout.border_nodes(0, dir).is_empty());
        }
    }
    
    #[test]
    fn test_heuristic_prefers_closer_columns() {
        let grid = Grid::new(4, 8, 0).unwrap();
        let layout = DomainLayout::new(grid, 1, 4).unwrap();
        assert_eq!(layout.heuristic_score(2, 2), 0);
        assert_eq!(layout.heuristic_score(1, 2), -1);
        assert_eq!(layout.heuristic_score(0, 2), -2);
        assert_eq!(layout.heuristic_score(3, 0), -1);
    }
    
    fn domain_tables(
        p: usize,
        q: usize,
        kp: usize,
        kn: usize,
    ) -> (DomainLayout, RouteTables, Grid, LinkModel, WorldState) {
        let (grid, link, world) = flat_world(p, q);
        let layout = DomainLayout::new(grid, kp, kn).unwrap();
        let shared = Arc::new(layout.clone());
        let mut algos: Vec<Box<dyn RoutingAlgorithm>> = (0..grid.len())
            .map(|id| Box::new(DomainRouter::new(id, shared.clone())) as Box<dyn RoutingAlgorithm>)
            .collect();
        let view = NetworkView::new(&grid, &link, &world);
        let tables = compute_all(&mut algos, &view);
        (layout, tables, grid, link, world)
    }
    
    #[test]
    fn test_path_within_domain() {
        let (layout, tables, grid, link, world) = domain_tables(4, 4, 2, 2);
        let view = NetworkView::new(&grid, &link, &world);
        let search = DomainPathSearch::new(&layout, &tables, &view);
        assert_relative_eq!(search.path_latency(0, 5).unwrap(), 2.0);
        assert_relative_eq!(search.path_latency(5, 5).unwrap(), 0.0);
    }
    
    #[test]
    fn test_path_crosses_domains() {
        let (layout, tables, grid, link, world) = domain_tables(4, 4, 2, 2);
        let view = NetworkView::new(&grid, &link, &world);
        let search = DomainPathSearch::new(&layout, &tables, &view);
        // 0 is a border node westward into domain 1 at node 3
        assert_relative_eq!(search.path_latency(0, 3).unwrap(), 1.0);
        // 0 -> 3 -> 2 -> 6 -> 10 through domains 0, 1, 3
        assert_relative_eq!(search.path_latency(0, 10).unwrap(), 4.0);
    }
    
    #[test]
    fn test_path_fails_when_target_domain_cut_off() {
        let (grid, link, mut world) = flat_world(1, 4);
        let layout = DomainLayout::new(grid, 1, 2).unwrap();
        // domains {0,1} and {2,3}; cut both crossings
        world.cur_banned.ban_link(&grid, 1, 2);
        world.cur_banned.ban_link(&grid, 3, 0);
        let shared = Arc::new(layout.clone());
        let mut algos: Vec<Box<dyn RoutingAlgorithm>> = (0..grid.len())
            .map(|id| Box::new(DomainRouter::new(id, shared.clone())) as Box<dyn RoutingAlgorithm>)
            .collect();
        let view = NetworkView::new(&grid, &link, &world);
        let tables = compute_all(&mut algos, &view);
        let search = DomainPathSearch::new(&layout, &tables, &view);
        assert_eq!(search.path_latency(0, 2), None);
        assert_relative_eq!(search.path_latency(0, 1).unwrap(), 1.0);
    }
}
