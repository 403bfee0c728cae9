//! satnet Environment Abstraction Layer
//!
//! This crate isolates the simulator from where constellation data comes
//! from. The simulator only sees the [`ConstellationSource`] trait:
//!
//! - **Datasets**: [`FsSource`] reads per-time-step position, LLA,
//!   velocity and ISL outage files produced by an external orbit propagator.
//! - **Fixtures**: tests and demos implement the trait in memory.
//!
//! # Example
//!
//! ```ignore
//! use satnet_env::{ConstellationSource, DataDirs, FsSource};
//!
//! let mut source = FsSource::new(dirs, 1584);
//! let snap = source.snapshot(0)?;
//! let outages = source.banned_links(0)?;
//! ```

mod error;
mod fs_source;
mod source;
mod types;

pub use error::EnvError;
pub use fs_source::{parse_link_pairs, DataDirs, FsSource};
pub use source::ConstellationSource;
pub use types::{LinkPair, SatId, SatelliteSnapshot};
