//! Loads per-step world state from a constellation source.

use crate::config::SimConfig;
use crate::error::SimError;
use satnet_core::{Grid, WorldState};
use satnet_env::ConstellationSource;
use tracing::{debug, info};

/// Refreshes the [`WorldState`] from a [`ConstellationSource`].
pub struct DataManager<S> {
    source: S,
    grid: Grid,
    step: u64,
    update_period: u64,
    end_time: u64,
}

impl<S: ConstellationSource> DataManager<S> {
    pub fn new(source: S, grid: Grid, config: &SimConfig) -> Self {
        Self {
            source,
            grid,
            step: config.step_length,
            update_period: config.update_period(),
            end_time: config.end_time(),
        }
    }
    
    /// Replaces positions and rebuilds the current banned bitmap for `time`.
    pub fn load_state(&mut self, time: u64, world: &mut WorldState) -> Result<(), SimError> {
        debug!("Loading state for time {}", time);
        let snapshot = self.source.snapshot(time)?;
        let expected = self.grid.len();
        for found in [snapshot.positions.len(), snapshot.lla.len(), snapshot.velocities.len()] {
            if found != expected {
                return Err(SimError::SnapshotSize {
                    time,
                    found,
                    expected,
                });
            }
        }
        world.set_snapshot(snapshot);
        
        world.cur_banned.clear();
        let pairs = self.source.banned_links(time)?;
        let applied = world.cur_banned.apply_pairs(&self.grid, &pairs, time);
        debug!("Applied {} scheduled outages at t={}", applied, time);
        Ok(())
    }
    
    /// Rebuilds the future bitmap as the union of outages over
    /// `(time, min(time + update_period, end))`, stepping by the step length.
    ///
    /// Returns the number of instants read.
    pub fn load_future_banned(&mut self, time: u64, world: &mut WorldState) -> Result<usize, SimError> {
        world.futr_banned.clear();
        let end = (time + self.update_period).min(self.end_time);
        let mut t = time + self.step;
        let mut instants = 0;
        while t < end {
            let pairs = self.source.banned_links(t)?;
            world.futr_banned.apply_pairs(&self.grid, &pairs, t);
            instants += 1;
            t += self.step;
        }
        info!(
            "Loaded future banned links for {} instants ({} directed links)",
            instants,
            world.futr_banned.count()
        );
        Ok(instants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_source::StaticSource;
    use nalgebra::Vector3;
    use satnet_core::Direction;
    use satnet_env::SatelliteSnapshot;
    
    fn setup(source: StaticSource) -> (DataManager<StaticSource>, WorldState) {
        let mut config = SimConfig::for_grid("t", 4, 4, 0);
        config.duration = 20;
        config.update_period = Some(5);
        let grid = config.grid().unwrap();
        (DataManager::new(source, grid, &config), WorldState::new(grid.len()))
    }
    
    #[test]
    fn test_load_state_replaces_bans() {
        let source = StaticSource::uniform(16, Vector3::zeros())
            .with_outage(0, 0, 1)
            .with_outage(1, 2, 3);
        let (mut dm, mut world) = setup(source);
        dm.load_state(0, &mut world).unwrap();
        assert!(world.cur_banned.is_banned(0, Direction::East.port()));
        dm.load_state(1, &mut world).unwrap();
        assert!(!world.cur_banned.is_banned(0, Direction::East.port()));
        assert!(world.cur_banned.is_banned(2, Direction::East.port()));
    }
    
    #[test]
    fn test_future_window_is_union_excluding_now() {
        let source = StaticSource::uniform(16, Vector3::zeros())
            .with_outage(10, 0, 1)
            .with_outage(12, 4, 5)
            .with_outage(14, 8, 9)
            .with_outage(15, 12, 13);
        let (mut dm, mut world) = setup(source);
        // window (10, 15): 11..=14
        assert_eq!(dm.load_future_banned(10, &mut world).unwrap(), 4);
        assert!(!world.futr_banned.is_banned(0, Direction::East.port()));
        assert!(world.futr_banned.is_banned(4, Direction::East.port()));
        assert!(world.futr_banned.is_banned(8, Direction::East.port()));
        assert!(!world.futr_banned.is_banned(12, Direction::East.port()));
    }
    
    #[test]
    fn test_future_window_clipped_at_end() {
        let source = StaticSource::uniform(16, Vector3::zeros()).with_outage(19, 0, 1);
        let (mut dm, mut world) = setup(source);
        assert_eq!(dm.load_future_banned(18, &mut world).unwrap(), 1);
        assert!(world.futr_banned.is_banned(0, Direction::East.port()));
    }
    
    #[test]
    fn test_wrong_snapshot_size_is_error() {
        let source = StaticSource::default().with_default(SatelliteSnapshot::uniform(3, Vector3::zeros()));
        let (mut dm, mut world) = setup(source);
        assert!(matches!(
            dm.load_state(0, &mut world),
            Err(SimError::SnapshotSize { found: 3, expected: 16, .. })
        ));
    }
}
