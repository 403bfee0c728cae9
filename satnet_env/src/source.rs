//! The data-source trait consumed by the simulator.

use crate::error::EnvError;
use crate::types::{LinkPair, SatelliteSnapshot};

/// Supplies constellation state for a given simulation time.
///
/// This trait abstracts where positions and scheduled outages come from so
/// the simulator can run against on-disk datasets (`FsSource`) or against
/// in-memory fixtures in tests.
///
/// # Contract
///
/// - `snapshot` must return exactly one entry per satellite, or an error.
/// - `banned_links` returns the scheduled outages active at `time`. Having
///   none is not an error. Implementations skip unreadable entries.
pub trait ConstellationSource {
    /// Loads positions, LLA and velocities at `time`.
    fn snapshot(&mut self, time: u64) -> Result<SatelliteSnapshot, EnvError>;
    
    /// Loads the scheduled link outages at `time`.
    fn banned_links(&mut self, time: u64) -> Result<Vec<LinkPair>, EnvError>;
}

impl<S: ConstellationSource + ?Sized> ConstellationSource for Box<S> {
    fn snapshot(&mut self, time: u64) -> Result<SatelliteSnapshot, EnvError> {
        (**self).snapshot(time)
    }
    
    fn banned_links(&mut self, time: u64) -> Result<Vec<LinkPair>, EnvError> {
        (**self).banned_links(time)
    }
}
