//! File-backed constellation source.
//!
//! Reads one file per simulation instant from four directories:
//!
//! | directory           | file        | content                         |
//! |---------------------|-------------|---------------------------------|
//! | `isl_state_dir`     | `<t>.txt`   | `u v` pairs of downed links     |
//! | `sat_position_dir`  | `<t>.csv`   | N rows of `x y z` (km)          |
//! | `sat_lla_dir`       | `<t>.csv`   | N rows of `lat lon alt`         |
//! | `sat_velocity_dir`  | `<t>.csv`   | N scalars                       |
//!
//! Numbers may be separated by whitespace or commas.

use crate::error::EnvError;
use crate::source::ConstellationSource;
use crate::types::{LinkPair, SatelliteSnapshot};
use nalgebra::Vector3;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory layout for an on-disk dataset.
#[derive(Debug, Clone)]
pub struct DataDirs {
    pub isl_state: PathBuf,
    pub positions: PathBuf,
    pub lla: PathBuf,
    pub velocities: PathBuf,
}

/// Loads snapshots and scheduled outages from per-time-step files.
pub struct FsSource {
    dirs: DataDirs,
    num_sats: usize,
}

impl FsSource {
    /// Creates a source for a constellation of `num_sats` satellites.
    ///
    /// Missing directories are reported once here; missing files are only
    /// an error when a snapshot is requested.
    pub fn new(dirs: DataDirs, num_sats: usize) -> Self {
        for (label, dir) in [
            ("ISL state", &dirs.isl_state),
            ("position", &dirs.positions),
            ("LLA", &dirs.lla),
            ("velocity", &dirs.velocities),
        ] {
            if !dir.is_dir() {
                warn!("{} directory not found: {}", label, dir.display());
            }
        }
        Self { dirs, num_sats }
    }
    
    fn read_numbers(path: &Path) -> Result<Vec<f64>, EnvError> {
        let text = fs::read_to_string(path).map_err(|e| EnvError::io(path, e))?;
        text.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    EnvError::malformed(path, format!("not a number: '{}'", tok))
                })
            })
            .collect()
    }
    
    fn read_vectors(&self, path: &Path) -> Result<Vec<Vector3<f64>>, EnvError> {
        let values = Self::read_numbers(path)?;
        if values.len() != self.num_sats * 3 {
            return Err(EnvError::malformed(
                path,
                format!("expected {} values, found {}", self.num_sats * 3, values.len()),
            ));
        }
        Ok(values
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect())
    }
    
    fn read_scalars(&self, path: &Path) -> Result<Vec<f64>, EnvError> {
        let values = Self::read_numbers(path)?;
        if values.len() != self.num_sats {
            return Err(EnvError::malformed(
                path,
                format!("expected {} values, found {}", self.num_sats, values.len()),
            ));
        }
        Ok(values)
    }
}

/// Parses a banned-link listing, skipping bad lines with a warning.
///
/// Pairs referencing satellites outside `0..num_sats` are dropped.
pub fn parse_link_pairs(text: &str, num_sats: usize, origin: &Path) -> Vec<LinkPair> {
    let mut pairs = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
            warn!("Insufficient parts on line {} in {}: '{}'", lineno + 1, origin.display(), line);
            continue;
        };
        let (Ok(a), Ok(b)) = (a.parse::<usize>(), b.parse::<usize>()) else {
            warn!("Invalid integer format on line {} in {}: '{}'", lineno + 1, origin.display(), line);
            continue;
        };
        if a >= num_sats || b >= num_sats {
            warn!(
                "Node index out of range ({} or {}, N={}) on line {} in {}",
                a, b, num_sats, lineno + 1, origin.display()
            );
            continue;
        }
        pairs.push(LinkPair::new(a, b));
    }
    pairs
}

impl ConstellationSource for FsSource {
    fn snapshot(&mut self, time: u64) -> Result<SatelliteSnapshot, EnvError> {
        let file = format!("{}.csv", time);
        let pos_file = self.dirs.positions.join(&file);
        if !pos_file.exists() {
            return Err(EnvError::MissingSnapshot(time));
        }
        debug!("Loading positions from {}", pos_file.display());
        let positions = self.read_vectors(&pos_file)?;
        let lla = self.read_vectors(&self.dirs.lla.join(&file))?;
        let velocities = self.read_scalars(&self.dirs.velocities.join(&file))?;
        Ok(SatelliteSnapshot {
            positions,
            lla,
            velocities,
        })
    }
    
    fn banned_links(&mut self, time: u64) -> Result<Vec<LinkPair>, EnvError> {
        let path = self.dirs.isl_state.join(format!("{}.txt", time));
        match fs::read_to_string(&path) {
            Ok(text) => {
                let pairs = parse_link_pairs(&text, self.num_sats, &path);
                debug!("Read {} banned link entries from {}", pairs.len(), path.display());
                Ok(pairs)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("ISL state file not found: {} (no links down)", path.display());
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Could not read ISL state file {}: {}", path.display(), e);
                Ok(Vec::new())
            }
        }
    }
}
