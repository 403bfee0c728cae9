//! The N×N next-hop table.

use crate::topology::{Port, NO_PORT};

/// Routing tables for the whole constellation, stored row-major.
///
/// `get(u, d)` is the port `u` forwards on toward `d`, or [`NO_PORT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTables {
    n: usize,
    ports: Vec<Port>,
}

impl RouteTables {
    /// Creates an all-unreachable table.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            n: num_nodes,
            ports: vec![NO_PORT; num_nodes * num_nodes],
        }
    }
    
    pub fn num_nodes(&self) -> usize {
        self.n
    }
    
    pub fn row(&self, node: usize) -> &[Port] {
        &self.ports[node * self.n..(node + 1) * self.n]
    }
    
    pub fn row_mut(&mut self, node: usize) -> &mut [Port] {
        &mut self.ports[node * self.n..(node + 1) * self.n]
    }
    
    /// Next-hop port; out-of-range indices read as [`NO_PORT`].
    pub fn get(&self, node: usize, dst: usize) -> Port {
        if node >= self.n || dst >= self.n {
            return NO_PORT;
        }
        self.ports[node * self.n + dst]
    }
    
    pub fn set(&mut self, node: usize, dst: usize, port: Port) {
        self.ports[node * self.n + dst] = port;
    }
    
    /// Overwrites the entries of `node` that differ from `row`.
    ///
    /// Returns the number of entries changed. `row` must have length N.
    pub fn merge_row(&mut self, node: usize, row: &[Port]) -> usize {
        let mut changed = 0;
        for (old, new) in self.row_mut(node).iter_mut().zip(row) {
            if *old != *new {
                *old = *new;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_merge_row_counts_changes() {
        let mut t = RouteTables::new(3);
        assert_eq!(t.merge_row(1, &[2, 0, 3]), 2);
        assert_eq!(t.row(1), &[2, 0, 3]);
        assert_eq!(t.merge_row(1, &[2, 0, 3]), 0);
        assert_eq!(t.merge_row(1, &[2, 4, 3]), 1);
    }
    
    #[test]
    fn test_get_out_of_range_is_no_port() {
        let t = RouteTables::new(2);
        assert_eq!(t.get(5, 0), NO_PORT);
    }
}
