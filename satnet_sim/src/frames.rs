//! JSON frame export for external visualization.
//!
//! One frame per step: every satellite as a map marker, every W/N link with
//! its state, and either the traced observer path or one node's routing
//! table, depending on the configured source/destination.

use crate::config::VisualizationConfig;
use crate::error::SimError;
use crate::stats::{PathOutcome, PathWalker};
use satnet_core::{Direction, Grid, NetworkView, RouteTables, WorldState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker kinds understood by the frame viewer.
pub mod kind {
    pub const NODE_DEFAULT: u8 = 0;
    pub const NODE_ENDPOINT: u8 = 1;
    /// Table entries are drawn as `NODE_TABLE_BASE + port`.
    pub const NODE_TABLE_BASE: u8 = 2;
    pub const NODE_TABLE_SOURCE: u8 = 7;
    
    pub const EDGE_BANNED: u8 = 0;
    pub const EDGE_PATH: u8 = 3;
}

/// A satellite marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameNode {
    pub lon: f64,
    pub lat: f64,
    pub kind: u8,
}

/// A drawn link. Active links carry their port (1 = west, 2 = north).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEdge {
    pub u: usize,
    pub v: usize,
    pub kind: u8,
}

/// The observer path as followed through the tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedPath {
    pub nodes: Vec<usize>,
    pub delivered: bool,
}

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub time: u64,
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
    pub nodes_3d: Vec<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<TracedPath>,
}

/// Receives the network state once per step.
pub trait FrameSink {
    fn record(&mut self, time: u64, view: &NetworkView<'_>, tables: &RouteTables) -> Result<(), SimError>;
}

/// Sink used when visualization is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFrames;

impl FrameSink for NoFrames {
    fn record(&mut self, _: u64, _: &NetworkView<'_>, _: &RouteTables) -> Result<(), SimError> {
        Ok(())
    }
}

/// Writes `<frames_dir>/<scenario>/<time>.json`.
#[derive(Debug, Clone)]
pub struct JsonFrameExporter {
    dir: PathBuf,
    source: Option<usize>,
    destination: Option<usize>,
    diff_table: u8,
}

impl JsonFrameExporter {
    /// `run_name` names the output directory unless a scenario is set.
    pub fn new(config: &VisualizationConfig, run_name: &str) -> Self {
        let scenario = config.scenario.as_deref().unwrap_or(run_name);
        Self {
            dir: config.frames_dir.join(scenario),
            source: config.source,
            destination: config.destination,
            diff_table: config.diff_table,
        }
    }
    
    pub fn dir(&self) -> &Path {
        &self.dir
    }
    
    /// Assembles the frame without touching the filesystem.
    pub fn build_frame(&self, time: u64, view: &NetworkView<'_>, tables: &RouteTables) -> Frame {
        let (grid, world) = (view.grid, view.world);
        let mut frame = Frame {
            time,
            nodes: world
                .lla
                .iter()
                .map(|lla| FrameNode {
                    lon: lla.y,
                    lat: lla.x,
                    kind: kind::NODE_DEFAULT,
                })
                .collect(),
            edges: link_edges(grid, world),
            nodes_3d: world.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
            path: None,
        };
        
        let n = grid.len();
        match (self.source, self.destination) {
            (Some(src), Some(dst)) if src < n && dst < n => {
                mark(&mut frame.nodes, src, kind::NODE_ENDPOINT);
                mark(&mut frame.nodes, dst, kind::NODE_ENDPOINT);
                let path = trace(view, tables, src, dst);
                frame
                    .edges
                    .extend(path.nodes.windows(2).map(|w| FrameEdge { u: w[0], v: w[1], kind: kind::EDGE_PATH }));
                frame.path = Some(path);
            }
            (Some(src), None) if src < n => self.mark_table(&mut frame.nodes, world, tables, src),
            _ => {}
        }
        frame
    }
    
    /// Colors every node by `src`'s next-hop port toward it.
    fn mark_table(&self, nodes: &mut [FrameNode], world: &WorldState, tables: &RouteTables, src: usize) {
        mark(nodes, src, kind::NODE_TABLE_SOURCE);
        let heading = |i: usize| world.velocities.get(i).is_some_and(|v| *v > 0.0);
        for dst in (0..tables.num_nodes()).filter(|d| *d != src) {
            let show = match self.diff_table {
                0 => heading(src) == heading(dst),
                1 => heading(src) != heading(dst),
                _ => true,
            };
            if show {
                mark(nodes, dst, kind::NODE_TABLE_BASE + tables.get(src, dst));
            }
        }
    }
}

impl FrameSink for JsonFrameExporter {
    fn record(&mut self, time: u64, view: &NetworkView<'_>, tables: &RouteTables) -> Result<(), SimError> {
        let frame = self.build_frame(time, view, tables);
        fs::create_dir_all(&self.dir).map_err(|e| SimError::io(&self.dir, e))?;
        let path = self.dir.join(format!("{}.json", time));
        let json = serde_json::to_string(&frame)?;
        fs::write(&path, json).map_err(|e| SimError::io(&path, e))
    }
}

fn mark(nodes: &mut [FrameNode], node: usize, kind: u8) {
    if let Some(n) = nodes.get_mut(node) {
        n.kind = kind;
    }
}

/// West and north link of every node, so each link appears once.
fn link_edges(grid: &Grid, world: &WorldState) -> Vec<FrameEdge> {
    let mut edges = Vec::with_capacity(2 * grid.len());
    for u in 0..grid.len() {
        for dir in [Direction::West, Direction::North] {
            let port = dir.port();
            let kind = if world.cur_banned.is_banned(u, port) { kind::EDGE_BANNED } else { port };
            edges.push(FrameEdge { u, v: grid.step(u, dir), kind });
        }
    }
    edges
}

/// Follows the tables from `src`, stopping where the observer walk stops.
fn trace(view: &NetworkView<'_>, tables: &RouteTables, src: usize, dst: usize) -> TracedPath {
    let mut nodes = vec![src];
    let outcome = PathWalker::new(view.num_nodes()).walk_with(tables, view, src, dst, |_, to| nodes.push(to));
    TracedPath {
        delivered: matches!(outcome, PathOutcome::Delivered { .. }),
        nodes,
    }
}
