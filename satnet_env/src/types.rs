//! Common types for the satnet data-source abstraction.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Index of a satellite in the constellation, `row * Q + col`.
pub type SatId = usize;

/// Per-satellite state at one instant of simulation time.
///
/// All three vectors are indexed by [`SatId`] and have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSnapshot {
    /// Cartesian positions in kilometres
    pub positions: Vec<Vector3<f64>>,
    
    /// Latitude, longitude and altitude
    pub lla: Vec<Vector3<f64>>,
    
    /// Scalar velocity / direction sign
    pub velocities: Vec<f64>,
}

impl SatelliteSnapshot {
    /// Creates a snapshot where every satellite sits at `position`.
    pub fn uniform(count: usize, position: Vector3<f64>) -> Self {
        Self {
            positions: vec![position; count],
            lla: vec![Vector3::zeros(); count],
            velocities: vec![0.0; count],
        }
    }
    
    /// Number of satellites described.
    pub fn len(&self) -> usize {
        self.positions.len()
    }
    
    /// Returns true if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// An undirected inter-satellite link reported as unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkPair {
    pub a: SatId,
    pub b: SatId,
}

impl LinkPair {
    pub fn new(a: SatId, b: SatId) -> Self {
        Self { a, b }
    }
}

impl std::fmt::Display for LinkPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}
