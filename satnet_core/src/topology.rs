//! Toroidal constellation grid.
//!
//! Satellites are laid out on P orbital planes (rows) of Q satellites
//! (columns). Node `id` sits at `row = id / Q`, `col = id % Q`. Each node has
//! four inter-satellite links, addressed by a *port*:
//!
//! ```text
//!              2 (north: row+1, col+F)
//!                   │
//!   1 (west: col-1) ─ u ─ 3 (east: col+1)
//!                   │
//!              4 (south: row-1, col-F)
//! ```
//!
//! Rows wrap around (plane P-1 is adjacent to plane 0) and crossing a row
//! shifts the column by the inter-plane phase F. Port 0 means "no link".

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// A link port on a satellite: 1..=4, or [`NO_PORT`].
pub type Port = u8;

/// Sentinel port for "no route / not adjacent".
pub const NO_PORT: Port = 0;

/// Number of port slots per node, including the unused slot 0.
pub const PORT_SLOTS: usize = 5;

/// Compass direction of an inter-satellite link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    West = 1,
    North = 2,
    East = 3,
    South = 4,
}

impl Direction {
    /// All directions in port order.
    pub const ALL: [Direction; 4] = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];
    
    /// Maps a port number to its direction. Port 0 and anything above 4
    /// have no direction.
    pub fn from_port(port: Port) -> Option<Self> {
        match port {
            1 => Some(Direction::West),
            2 => Some(Direction::North),
            3 => Some(Direction::East),
            4 => Some(Direction::South),
            _ => None,
        }
    }
    
    pub fn port(self) -> Port {
        self as Port
    }
    
    /// The direction that undoes this one.
    pub fn opposite(self) -> Self {
        match self {
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
        }
    }
}

/// P×Q toroidal grid with inter-plane phase shift F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Number of orbital planes (rows)
    pub p: usize,
    
    /// Satellites per plane (columns)
    pub q: usize,
    
    /// Column shift applied when crossing to the next plane
    pub f: usize,
}

impl Grid {
    /// Creates a grid, rejecting empty dimensions.
    pub fn new(p: usize, q: usize, f: usize) -> Result<Self, CoreError> {
        if p == 0 || q == 0 {
            return Err(CoreError::InvalidGrid {
                p,
                q,
                reason: "planes and satellites per plane must be positive".to_string(),
            });
        }
        Ok(Self { p, q, f: f % q })
    }
    
    /// Total number of satellites N = P·Q.
    pub fn len(&self) -> usize {
        self.p * self.q
    }
    
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    
    pub fn row(&self, node: usize) -> usize {
        node / self.q
    }
    
    pub fn col(&self, node: usize) -> usize {
        node % self.q
    }
    
    /// Neighbor of `node` one link away in `dir`.
    pub fn step(&self, node: usize, dir: Direction) -> usize {
        let (p, q, f) = (self.p, self.q, self.f);
        let (mut x, mut y) = (node / q, node % q);
        match dir {
            Direction::West => y = (y + q - 1) % q,
            Direction::North => {
                x = if x == p - 1 { 0 } else { x + 1 };
                y = (y + f) % q;
            }
            Direction::East => y = (y + 1) % q,
            Direction::South => {
                x = if x == 0 { p - 1 } else { x - 1 };
                y = (y + q - f) % q;
            }
        }
        x * q + y
    }
    
    /// Neighbor of `node` through `port`. Port 0 or an invalid port leaves
    /// the node where it is.
    pub fn move_node(&self, node: usize, port: Port) -> usize {
        match Direction::from_port(port) {
            Some(dir) => self.step(node, dir),
            None => node,
        }
    }
    
    /// Returns `(port u→v, port v→u)`, with 0 on a side that cannot reach
    /// the other in one move.
    ///
    /// On degenerate grids where several directions reach the same
    /// neighbor, the highest matching port wins.
    pub fn port_between(&self, u: usize, v: usize) -> (Port, Port) {
        let mut u_port = NO_PORT;
        let mut v_port = NO_PORT;
        for dir in Direction::ALL {
            if self.step(u, dir) == v {
                u_port = dir.port();
            }
            if self.step(v, dir) == u {
                v_port = dir.port();
            }
        }
        (u_port, v_port)
    }
    
    /// The four neighbors of `node`, indexed by `port - 1`.
    pub fn neighbors(&self, node: usize) -> [usize; 4] {
        Direction::ALL.map(|d| self.step(node, d))
    }
    
    /// Analytic minimum hop count on an unshifted torus (F = 0).
    pub fn min_hops(&self, u: usize, v: usize) -> usize {
        let ring = |a: usize, b: usize, n: usize| {
            let d = a.abs_diff(b);
            d.min(n - d)
        };
        ring(self.row(u), self.row(v), self.p) + ring(self.col(u), self.col(v), self.q)
    }
}
