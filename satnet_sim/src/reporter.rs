//! Plain-text progress reports.

use crate::error::SimError;
use crate::stats::StatsSnapshot;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Timing of the run up to the reported instant.
#[derive(Debug, Clone, Copy)]
pub struct ReportClock {
    pub sim_time: u64,
    pub start_time: u64,
    pub duration: u64,
    pub step: u64,
    pub wall: Duration,
}

impl ReportClock {
    /// Wall-clock seconds left, extrapolated from progress so far.
    pub fn eta_secs(&self) -> f64 {
        let elapsed_units = (self.sim_time + self.step).saturating_sub(self.start_time).max(1);
        let remaining_units = (self.start_time + self.duration).saturating_sub(self.sim_time + self.step);
        self.wall.as_secs_f64() / elapsed_units as f64 * remaining_units as f64
    }
}

/// Writes `report [<name>] <algorithm>.txt` into the report directory,
/// replacing the previous report of the same run.
#[derive(Debug, Clone)]
pub struct Reporter {
    path: PathBuf,
    name: String,
    algorithm: String,
    node_type: String,
}

impl Reporter {
    pub fn new(report_dir: &Path, name: &str, algorithm: &str, node_type: &str) -> Self {
        Self {
            path: report_dir.join(format!("report [{}] {}.txt", name, algorithm)),
            name: name.to_string(),
            algorithm: algorithm.to_string(),
            node_type: node_type.to_string(),
        }
    }
    
    pub fn path(&self) -> &Path {
        &self.path
    }
    
    /// Formats the report body.
    pub fn render(&self, clock: &ReportClock, stats: &StatsSnapshot, is_error: bool) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "name: {}", self.name);
        let _ = writeln!(out, "algorithm: {}", self.algorithm);
        let _ = writeln!(out, "node type: {}", self.node_type);
        if is_error {
            let _ = writeln!(out, "status: error");
        }
        let _ = writeln!(out, "simulation time: {}", clock.sim_time);
        let _ = writeln!(out, "real-world time: {:.6}", clock.wall.as_secs_f64());
        let _ = writeln!(out, "estimated time of arrival (s): {:.6}", clock.eta_secs());
        let _ = writeln!(out, "compute time avg (ms): {:.6}", stats.compute_time_avg_ms);
        let _ = writeln!(out, "update entry avg: {:.6}", stats.update_entry_avg);
        let _ = writeln!(out, "number of observers: {}", stats.observers.len());
        for obs in &stats.observers {
            let _ = writeln!(out, "route path [{}, {}]", obs.src, obs.dst);
            let _ = writeln!(out, "\tlatency avg (ms): {:.6}", obs.latency_ms);
            let _ = writeln!(out, "\tfailure rate avg: {:.6}", obs.failure_rate);
        }
        out
    }
    
    /// Renders and writes the report, returning its path.
    pub fn write(&self, clock: &ReportClock, stats: &StatsSnapshot, is_error: bool) -> Result<&Path, SimError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;
        }
        fs::write(&self.path, self.render(clock, stats, is_error)).map_err(|e| SimError::io(&self.path, e))?;
        
        info!(
            "Report at t={}: wall {:.2}s, ETA {:.2}s, compute {:.3}ms, updates {:.2}",
            clock.sim_time,
            clock.wall.as_secs_f64(),
            clock.eta_secs(),
            stats.compute_time_avg_ms,
            stats.update_entry_avg
        );
        for obs in &stats.observers {
            info!(
                "  Observer [{}->{}]: latency={:.3}ms, failure rate={:.3}%",
                obs.src,
                obs.dst,
                obs.latency_ms,
                obs.failure_rate * 100.0
            );
        }
        Ok(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ObserverStats;
    use approx::assert_relative_eq;
    use tempfile::TempDir;
    
    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            compute_time_avg_ms: 0.25,
            update_entry_avg: 3.0,
            observers: vec![ObserverStats {
                src: 0,
                dst: 10,
                latency_ms: 12.5,
                failure_rate: 0.1,
            }],
        }
    }
    
    fn clock(sim_time: u64, wall_secs: u64) -> ReportClock {
        ReportClock {
            sim_time,
            start_time: 0,
            duration: 100,
            step: 10,
            wall: Duration::from_secs(wall_secs),
        }
    }
    
    #[test]
    fn test_eta_extrapolates_progress() {
        // 20 units done in 4s, 70 left
        assert_relative_eq!(clock(10, 4).eta_secs(), 14.0);
        assert_relative_eq!(clock(90, 4).eta_secs(), 0.0);
    }
    
    #[test]
    fn test_render_format() {
        let reporter = Reporter::new(Path::new("reports"), "demo", "DijkstraBase", "DijkstraRouter");
        let text = reporter.render(&clock(10, 4), &snapshot(), false);
        let expected = "name: demo\n\
                        algorithm: DijkstraBase\n\
                        node type: DijkstraRouter\n\
                        simulation time: 10\n\
                        real-world time: 4.000000\n\
                        estimated time of arrival (s): 14.000000\n\
                        compute time avg (ms): 0.250000\n\
                        update entry avg: 3.000000\n\
                        number of observers: 1\n\
                        route path [0, 10]\n\
                        \tlatency avg (ms): 12.500000\n\
                        \tfailure rate avg: 0.100000\n";
        assert_eq!(text, expected);
        assert_eq!(reporter.path(), Path::new("reports/report [demo] DijkstraBase.txt"));
    }
    
    #[test]
    fn test_error_report_is_marked() {
        let root = TempDir::new().unwrap();
        let reporter = Reporter::new(&root.path().join("out"), "demo", "MinHopCount", "MinHopRouter");
        let path = reporter.write(&clock(0, 1), &snapshot(), true).unwrap().to_path_buf();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.lines().nth(3) == Some("status: error"));
    }
}
