//! Running averages with a failure penalty.

use serde::{Deserialize, Serialize};

/// One sample fed to an [`Average`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Success(f64),
    Failure,
}

/// Running mean where a failure counts as twice the largest success seen.
///
/// A failure before any positive success adds 0, so the count still grows
/// but the mean is pulled toward zero rather than an arbitrary constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Average {
    sum: f64,
    count: u64,
    max: f64,
}

impl Average {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn add(&mut self, obs: Observation) {
        let value = match obs {
            Observation::Success(v) => {
                self.max = self.max.max(v);
                v
            }
            Observation::Failure if self.max > 0.0 => 2.0 * self.max,
            Observation::Failure => 0.0,
        };
        self.sum += value;
        self.count += 1;
    }
    
    /// Shorthand for `add(Observation::Success(v))`.
    pub fn add_value(&mut self, v: f64) {
        self.add(Observation::Success(v));
    }
    
    /// The mean, or 0 when nothing was added.
    pub fn result(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
    
    pub fn sum(&self) -> f64 {
        self.sum
    }
    
    pub fn count(&self) -> u64 {
        self.count
    }
    
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    
    #[test]
    fn test_successes_give_arithmetic_mean() {
        let mut avg = Average::new();
        for v in [1.0, 2.0, 3.0, 6.0] {
            avg.add_value(v);
        }
        assert_relative_eq!(avg.result(), 3.0);
    }
    
    #[test]
    fn test_failure_penalised_at_twice_max() {
        let mut avg = Average::new();
        avg.add_value(10.0);
        avg.add_value(20.0);
        avg.add(Observation::Failure);
        assert_relative_eq!(avg.sum(), 70.0);
        assert_eq!(avg.count(), 3);
        assert_relative_eq!(avg.result(), 70.0 / 3.0);
    }
    
    #[test]
    fn test_failure_without_success_adds_zero() {
        let mut avg = Average::new();
        avg.add(Observation::Failure);
        assert_eq!(avg.count(), 1);
        assert_eq!(avg.result(), 0.0);
        avg.add_value(9.0);
        assert_relative_eq!(avg.result(), 4.5);
    }
    
    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(Average::new().result(), 0.0);
    }
}
