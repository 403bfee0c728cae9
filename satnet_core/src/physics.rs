//! One-hop link latency.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Constants of the inter-satellite link delay model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkModel {
    /// Fixed per-hop processing delay (ms)
    pub proc_delay_ms: f64,
    
    /// Scaling applied to the propagation term
    pub prop_delay_coef: f64,
    
    /// Signal propagation speed (m/s)
    pub prop_speed: f64,
}

impl Default for LinkModel {
    fn default() -> Self {
        Self {
            proc_delay_ms: 1.0,
            prop_delay_coef: 1.0,
            prop_speed: 299_792_458.0,
        }
    }
}

impl LinkModel {
    /// Delay between two satellites given their km positions.
    pub fn delay_ms(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        calculate_delay_ms(a, b, self.proc_delay_ms, self.prop_delay_coef, self.prop_speed)
    }
}

/// Euclidean distance in metres between two km positions.
pub fn distance_m(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm() * 1000.0
}

/// Processing plus propagation delay (ms) of one hop.
///
/// Coincident positions are valid and yield `proc_delay`.
pub fn calculate_delay_ms(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    proc_delay: f64,
    prop_coef: f64,
    prop_speed: f64,
) -> f64 {
    proc_delay + prop_coef * distance_m(a, b) * 1000.0 / prop_speed
}
