//! Routing-table (RIB) dumps for selected nodes.

use crate::error::SimError;
use satnet_core::Port;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes a node's table row to `<base>/<scenario>/<algorithm>/<node>/<time>.txt`.
///
/// The file holds a single line of N space-separated ports.
#[derive(Debug, Clone)]
pub struct RibWriter {
    base_dir: PathBuf,
    scenario: String,
    algorithm: String,
    flags: Vec<bool>,
}

impl RibWriter {
    /// Flags `nodes` for dumping. Ids outside `0..num_nodes` are ignored
    /// with a warning.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        scenario: &str,
        algorithm: &str,
        nodes: &[usize],
        num_nodes: usize,
    ) -> Self {
        let mut flags = vec![false; num_nodes];
        for &node in nodes {
            match flags.get_mut(node) {
                Some(flag) => *flag = true,
                None => warn!("Ignoring RIB dump for node {} (N={})", node, num_nodes),
            }
        }
        Self {
            base_dir: base_dir.into(),
            scenario: scenario.to_string(),
            algorithm: algorithm.to_string(),
            flags,
        }
    }
    
    pub fn is_flagged(&self, node: usize) -> bool {
        self.flags.get(node).copied().unwrap_or(false)
    }
    
    /// Directory holding one node's dumps.
    pub fn node_dir(&self, node: usize) -> PathBuf {
        self.base_dir
            .join(&self.scenario)
            .join(&self.algorithm)
            .join(node.to_string())
    }
    
    /// Writes `row` for `node` at `time` and returns the file path.
    pub fn save(&self, node: usize, time: u64, row: &[Port]) -> Result<PathBuf, SimError> {
        let dir = self.node_dir(node);
        fs::create_dir_all(&dir).map_err(|e| SimError::io(&dir, e))?;
        let path = dir.join(format!("{}.txt", time));
        write_row(&path, row)?;
        Ok(path)
    }
}

fn write_row(path: &Path, row: &[Port]) -> Result<(), SimError> {
    let line = row
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    fs::write(path, line).map_err(|e| SimError::io(path, e))
}
