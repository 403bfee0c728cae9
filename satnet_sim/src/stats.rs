//! Observer statistics: hop-by-hop path walks and running averages.
//!
//! Each observer pair is walked through the merged routing table once per
//! step. A walk fails on a routing loop, a missing or banned port, or after
//! 2N hops; failures feed [`Observation::Failure`] into the latency average
//! and 1 into the failure-rate average.

use crate::error::ConfigError;
use satnet_core::{
    Average, CoreError, Direction, DomainLayout, DomainPathSearch, Grid, NetworkView,
    Observation, PathModel, RouteTables,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// An ordered (source, destination) pair measured every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObserverPair {
    pub src: usize,
    pub dst: usize,
}

impl ObserverPair {
    pub fn new(src: usize, dst: usize) -> Self {
        Self { src, dst }
    }
}

/// Reads the observer file at `path`.
pub fn load_observers(path: impl AsRef<Path>, num_nodes: usize) -> Result<Vec<ObserverPair>, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingObserverFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ObserverFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_observers(&text, num_nodes, path)
}

/// Parses observer text: a count line followed by `src dst` lines.
///
/// The count is an upper bound on the lines read. Lines that do not parse,
/// reference nodes outside `0..num_nodes`, or have `src == dst` are dropped
/// with a warning.
pub fn parse_observers(text: &str, num_nodes: usize, origin: &Path) -> Result<Vec<ObserverPair>, ConfigError> {
    let mut lines = text.lines();
    let header = match lines.next().map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => {
            warn!("Observer file {} is empty", origin.display());
            return Ok(Vec::new());
        }
    };
    let count: usize = header.parse().map_err(|_| ConfigError::ObserverFile {
        path: origin.to_path_buf(),
        reason: format!("invalid observer count '{}'", header),
    })?;
    
    let mut observers = Vec::with_capacity(count);
    for (i, line) in lines.take(count).enumerate() {
        let mut fields = line.split_whitespace().map(str::parse::<usize>);
        let pair = match (fields.next(), fields.next()) {
            (Some(Ok(src)), Some(Ok(dst))) => ObserverPair::new(src, dst),
            _ => {
                warn!("{}:{}: skipping unparsable observer line '{}'", origin.display(), i + 2, line);
                continue;
            }
        };
        if pair.src >= num_nodes || pair.dst >= num_nodes || pair.src == pair.dst {
            warn!(
                "{}:{}: skipping invalid observer pair [{}, {}] (N={})",
                origin.display(),
                i + 2,
                pair.src,
                pair.dst,
                num_nodes
            );
            continue;
        }
        observers.push(pair);
    }
    Ok(observers)
}

/// Result of walking one observer path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOutcome {
    Delivered { latency_ms: f64, hops: usize },
    
    /// The walk revisited `node`
    Cycle { node: usize },
    
    /// `node` has no usable port toward the destination
    Broken { node: usize, port: u8 },
    
    /// Gave up after 2N hops
    HopLimit,
}

impl PathOutcome {
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            PathOutcome::Delivered { latency_ms, .. } => Some(*latency_ms),
            _ => None,
        }
    }
}

/// Follows routing tables hop by hop.
///
/// Loops are detected by stamping visited nodes with a per-walk timer, so
/// repeated walks need no clearing. A walk gives up after 2N hops.
#[derive(Debug, Clone)]
pub struct PathWalker {
    visited: Vec<u64>,
    timer: u64,
}

impl PathWalker {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            visited: vec![0; num_nodes],
            timer: 0,
        }
    }
    
    /// Walks from `src` toward `dst` over the current banned bitmap.
    pub fn walk(&mut self, tables: &RouteTables, view: &NetworkView<'_>, src: usize, dst: usize) -> PathOutcome {
        self.walk_with(tables, view, src, dst, |_, _| {})
    }
    
    /// Like [`PathWalker::walk`], calling `on_hop(from, to)` for every hop taken.
    pub fn walk_with(
        &mut self,
        tables: &RouteTables,
        view: &NetworkView<'_>,
        src: usize,
        dst: usize,
        mut on_hop: impl FnMut(usize, usize),
    ) -> PathOutcome {
        let grid = view.grid;
        let banned = &view.world.cur_banned;
        let hop_limit = 2 * grid.len();
        self.timer += 1;
        
        let mut cur = src;
        let mut hops = 0;
        let mut latency_ms = 0.0;
        while cur != dst && hops < hop_limit {
            if self.visited[cur] == self.timer {
                return PathOutcome::Cycle { node: cur };
            }
            self.visited[cur] = self.timer;
            
            let port = tables.get(cur, dst);
            if Direction::from_port(port).is_none() || banned.is_banned(cur, port) {
                return PathOutcome::Broken { node: cur, port };
            }
            let next = grid.move_node(cur, port);
            latency_ms += view.delay_ms(cur, next);
            on_hop(cur, next);
            cur = next;
            hops += 1;
        }
        
        if cur != dst {
            return PathOutcome::HopLimit;
        }
        PathOutcome::Delivered { latency_ms, hops }
    }
}

/// Per-observer averages at the time of the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ObserverStats {
    pub src: usize,
    pub dst: usize,
    pub latency_ms: f64,
    pub failure_rate: f64,
}

/// Serializable view of the collector.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub compute_time_avg_ms: f64,
    pub update_entry_avg: f64,
    pub observers: Vec<ObserverStats>,
}

/// Accumulates compute, update and per-observer path metrics.
pub struct StatisticsCollector {
    num_nodes: usize,
    start_time: u64,
    observers: Vec<ObserverPair>,
    latency: Vec<Average>,
    failure: Vec<Average>,
    compute_time: Average,
    update_entry: Average,
    walker: PathWalker,
    domains: Option<DomainLayout>,
}

impl StatisticsCollector {
    /// Fails only when `model` names a partition the grid cannot hold.
    pub fn new(
        grid: Grid,
        start_time: u64,
        observers: Vec<ObserverPair>,
        model: PathModel,
    ) -> Result<Self, CoreError> {
        let domains = match model {
            PathModel::HopByHop => None,
            PathModel::DomainBridge { kp, kn } => Some(DomainLayout::new(grid, kp, kn)?),
        };
        let n = observers.len();
        Ok(Self {
            num_nodes: grid.len(),
            start_time,
            observers,
            latency: vec![Average::new(); n],
            failure: vec![Average::new(); n],
            compute_time: Average::new(),
            update_entry: Average::new(),
            walker: PathWalker::new(grid.len()),
            domains,
        })
    }
    
    pub fn observers(&self) -> &[ObserverPair] {
        &self.observers
    }
    
    /// Records one route update, averaged over all nodes.
    ///
    /// The update count at the start time is skipped since every entry
    /// changes when the tables are first filled.
    pub fn log_compute_update_metrics(&mut self, total_compute_ms: f64, total_updates: usize, time: u64) {
        let n = self.num_nodes as f64;
        self.compute_time.add_value(total_compute_ms / n);
        if time != self.start_time {
            self.update_entry.add_value(total_updates as f64 / n);
        }
    }
    
    /// Walks the table from `src` to `dst` without recording anything.
    pub fn trace_path(&mut self, tables: &RouteTables, view: &NetworkView<'_>, src: usize, dst: usize) -> PathOutcome {
        self.walker.walk(tables, view, src, dst)
    }
    
    /// Measures every observer against the current tables and world.
    pub fn compute_observer_metrics(&mut self, tables: &RouteTables, view: &NetworkView<'_>) {
        for (i, pair) in self.observers.iter().enumerate() {
            let latency = match &self.domains {
                Some(layout) => DomainPathSearch::new(layout, tables, view).path_latency(pair.src, pair.dst),
                None => {
                    let outcome = self.walker.walk(tables, view, pair.src, pair.dst);
                    if outcome.latency_ms().is_none() {
                        debug!("Observer [{}, {}] failed: {:?}", pair.src, pair.dst, outcome);
                    }
                    outcome.latency_ms()
                }
            };
            
            match latency {
                Some(ms) => {
                    self.latency[i].add(Observation::Success(ms));
                    self.failure[i].add_value(0.0);
                }
                None => {
                    self.latency[i].add(Observation::Failure);
                    self.failure[i].add_value(1.0);
                }
            }
        }
    }
    
    pub fn results(&self) -> StatsSnapshot {
        StatsSnapshot {
            compute_time_avg_ms: self.compute_time.result(),
            update_entry_avg: self.update_entry.result(),
            observers: self
                .observers
                .iter()
                .zip(self.latency.iter().zip(&self.failure))
                .map(|(pair, (lat, fail))| ObserverStats {
                    src: pair.src,
                    dst: pair.dst,
                    latency_ms: lat.result(),
                    failure_rate: fail.result(),
                })
                .collect(),
        }
    }
}
