//! In-memory constellation source.

use nalgebra::Vector3;
use satnet_env::{ConstellationSource, EnvError, LinkPair, SatelliteSnapshot};
use std::collections::BTreeMap;

/// Serves fixed snapshots and outages from memory.
///
/// Times without an explicit snapshot fall back to the default one, so a
/// static constellation needs a single entry.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    default: Option<SatelliteSnapshot>,
    snapshots: BTreeMap<u64, SatelliteSnapshot>,
    outages: BTreeMap<u64, Vec<LinkPair>>,
}

impl StaticSource {
    /// Every satellite at `position` for all times.
    pub fn uniform(num_sats: usize, position: Vector3<f64>) -> Self {
        Self {
            default: Some(SatelliteSnapshot::uniform(num_sats, position)),
            ..Default::default()
        }
    }
    
    /// Uses `snapshot` for every time without a specific one.
    pub fn with_default(mut self, snapshot: SatelliteSnapshot) -> Self {
        self.default = Some(snapshot);
        self
    }
    
    pub fn with_snapshot(mut self, time: u64, snapshot: SatelliteSnapshot) -> Self {
        self.snapshots.insert(time, snapshot);
        self
    }
    
    /// Schedules the link `a`-`b` down at `time`.
    pub fn with_outage(mut self, time: u64, a: usize, b: usize) -> Self {
        self.outages.entry(time).or_default().push(LinkPair::new(a, b));
        self
    }
}

impl ConstellationSource for StaticSource {
    fn snapshot(&mut self, time: u64) -> Result<SatelliteSnapshot, EnvError> {
        self.snapshots
            .get(&time)
            .or(self.default.as_ref())
            .cloned()
            .ok_or(EnvError::MissingSnapshot(time))
    }
    
    fn banned_links(&mut self, time: u64) -> Result<Vec<LinkPair>, EnvError> {
        Ok(self.outages.get(&time).cloned().unwrap_or_default())
    }
}
