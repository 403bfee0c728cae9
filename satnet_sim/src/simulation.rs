//! The simulation time loop.

use crate::config::SimConfig;
use crate::data_manager::DataManager;
use crate::error::{ConfigError, SimError};
use crate::failure::FailureManager;
use crate::frames::{FrameSink, JsonFrameExporter, NoFrames};
use crate::reporter::{ReportClock, Reporter};
use crate::rib::RibWriter;
use crate::routing::RoutingManager;
use crate::stats::{ObserverPair, StatisticsCollector, StatsSnapshot};
use satnet_core::{AlgorithmRegistry, Grid, LinkModel, NetworkView, WorldState};
use satnet_env::ConstellationSource;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One stage of a simulation step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    LoadState,
    LoadFutureBanned,
    ApplyFailures,
    ComputeRoutes,
    CollectStats,
    Report,
    Visualize,
    AdvanceTime,
}

/// Results of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub algorithm: String,
    
    /// Last simulated instant
    pub final_time: u64,
    
    pub steps: u64,
    pub route_updates: u64,
    pub wall_secs: f64,
    pub report_path: PathBuf,
    pub stats: StatsSnapshot,
}

/// Drives every component through the time loop.
pub struct Simulation<S> {
    config: SimConfig,
    grid: Grid,
    link: LinkModel,
    world: WorldState,
    data: DataManager<S>,
    failures: FailureManager,
    routing: RoutingManager,
    stats: StatisticsCollector,
    reporter: Reporter,
    frames: Box<dyn FrameSink>,
    current_time: u64,
    route_updates: u64,
    started: Instant,
}

impl<S: ConstellationSource> Simulation<S> {
    /// Wires up a run of `algorithm_id` over `source`.
    ///
    /// Frames are exported when the config has a `visualization` section.
    pub fn new(
        config: SimConfig,
        registry: &AlgorithmRegistry,
        algorithm_id: u32,
        source: S,
        observers: Vec<ObserverPair>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let grid = config.grid()?;
        let kind = registry.get(algorithm_id).map_err(ConfigError::from)?;
        let algorithm = kind.name();
        
        let rib = if config.dump_rib_nodes.is_empty() {
            None
        } else {
            Some(RibWriter::new(
                &config.rib_dir,
                &config.name,
                &algorithm,
                &config.dump_rib_nodes,
                grid.len(),
            ))
        };
        let routing = RoutingManager::new(&kind, &grid, rib)?;
        let stats = StatisticsCollector::new(grid, config.start_time, observers, kind.path_model())?;
        let reporter = Reporter::new(&config.report_dir, &config.name, &algorithm, kind.node_type());
        let frames: Box<dyn FrameSink> = match &config.visualization {
            Some(vis) => {
                let exporter = JsonFrameExporter::new(vis, &config.name);
                info!("Frames will be written to {}", exporter.dir().display());
                Box::new(exporter)
            }
            None => Box::new(NoFrames),
        };
        
        info!(
            "Simulation '{}': {}x{} grid (F={}), algorithm {} ({}), {} observers",
            config.name,
            grid.p,
            grid.q,
            grid.f,
            algorithm_id,
            algorithm,
            stats.observers().len()
        );
        
        Ok(Self {
            link: config.link_model(),
            world: WorldState::new(grid.len()),
            data: DataManager::new(source, grid, &config),
            failures: FailureManager::new(config.seed, &config.failure_model),
            current_time: config.start_time,
            config,
            grid,
            routing,
            stats,
            reporter,
            frames,
            route_updates: 0,
            started: Instant::now(),
        })
    }
    
    /// Replaces the frame sink.
    pub fn with_frames(mut self, frames: Box<dyn FrameSink>) -> Self {
        self.frames = frames;
        self
    }
    
    pub fn current_time(&self) -> u64 {
        self.current_time
    }
    
    pub fn is_finished(&self) -> bool {
        self.current_time >= self.config.end_time()
    }
    
    pub fn world(&self) -> &WorldState {
        &self.world
    }
    
    pub fn routing(&self) -> &RoutingManager {
        &self.routing
    }
    
    pub fn stats(&self) -> &StatisticsCollector {
        &self.stats
    }
    
    /// Runs one time step and returns the phases executed.
    pub fn step(&mut self) -> Result<Vec<Phase>, SimError> {
        let t = self.current_time;
        let mut phases = Vec::with_capacity(8);
        debug!("--- Sim time: {} ---", t);
        
        phases.push(Phase::LoadState);
        self.data.load_state(t, &mut self.world)?;
        
        if t % self.config.update_period() == 0 {
            phases.push(Phase::LoadFutureBanned);
            self.data.load_future_banned(t, &mut self.world)?;
            
            phases.push(Phase::ApplyFailures);
            self.failures.apply_random_failures(&self.grid, &mut self.world.cur_banned);
            
            phases.push(Phase::ComputeRoutes);
            let view = NetworkView::new(&self.grid, &self.link, &self.world);
            let update = self.routing.compute_and_update_routes(&view, t);
            self.stats
                .log_compute_update_metrics(update.compute_ms, update.updated_entries, t);
            self.route_updates += 1;
            info!(
                "t={}: routes computed in {:.2} ms, {} entries changed",
                t, update.compute_ms, update.updated_entries
            );
        }
        
        phases.push(Phase::CollectStats);
        let view = NetworkView::new(&self.grid, &self.link, &self.world);
        self.stats.compute_observer_metrics(self.routing.tables(), &view);
        
        if t != self.config.start_time && t % self.config.refresh_period() == 0 {
            phases.push(Phase::Report);
            if let Err(e) = self.write_report(t, false) {
                error!("Failed to write report at t={}: {}", t, e);
            }
        }
        
        phases.push(Phase::Visualize);
        self.frames.record(t, &view, self.routing.tables())?;
        
        phases.push(Phase::AdvanceTime);
        self.current_time += self.config.step_length;
        Ok(phases)
    }
    
    /// Runs to the end and writes the final report.
    ///
    /// On a mid-run error an error report is attempted before the error is
    /// returned.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        info!(
            "Time range: {} to {} (step {}), update period {}, refresh period {}",
            self.current_time,
            self.config.end_time().saturating_sub(self.config.step_length),
            self.config.step_length,
            self.config.update_period(),
            self.config.refresh_period()
        );
        self.started = Instant::now();
        let mut steps = 0;
        
        while !self.is_finished() {
            if let Err(e) = self.step() {
                error!("Simulation failed at t={}: {}", self.current_time, e);
                warn!("Attempting to write report despite error...");
                if let Err(report_err) = self.write_report(self.current_time, true) {
                    error!("Failed to write error report: {}", report_err);
                }
                return Err(e);
            }
            steps += 1;
        }
        
        let final_time = self.current_time.saturating_sub(self.config.step_length);
        let report_path = self.write_report(final_time, false)?;
        let wall_secs = self.started.elapsed().as_secs_f64();
        info!("Simulation finished in {:.2} s, report at {}", wall_secs, report_path.display());
        
        Ok(RunSummary {
            name: self.config.name.clone(),
            algorithm: self.routing.algorithm_name().to_string(),
            final_time,
            steps,
            route_updates: self.route_updates,
            wall_secs,
            report_path,
            stats: self.stats.results(),
        })
    }
    
    fn write_report(&self, sim_time: u64, is_error: bool) -> Result<PathBuf, SimError> {
        let clock = ReportClock {
            sim_time,
            start_time: self.config.start_time,
            duration: self.config.duration,
            step: self.config.step_length,
            wall: self.started.elapsed(),
        };
        let path = self.reporter.write(&clock, &self.stats.results(), is_error)?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_source::StaticSource;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use satnet_core::algorithm::DijkstraRouter;
    use satnet_core::{BanPolicy, Direction, RoutingAlgorithm};
    use satnet_env::SatelliteSnapshot;
    use std::fs;
    use tempfile::TempDir;
    
    fn config(root: &TempDir, p: usize, q: usize, duration: u64) -> SimConfig {
        let mut config = SimConfig::for_grid("demo", p, q, 0);
        config.duration = duration;
        config.update_period = Some(2);
        config.report_dir = root.path().join("reports");
        config
    }
    
    fn source(n: usize) -> StaticSource {
        StaticSource::uniform(n, Vector3::new(6900.0, 0.0, 0.0))
    }
    
    #[test]
    fn test_phase_order() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        let mut sim = Simulation::new(config(&root, 2, 2, 4), &registry, 3001, source(4), vec![]).unwrap();
        
        use Phase::*;
        assert_eq!(
            sim.step().unwrap(),
            vec![LoadState, LoadFutureBanned, ApplyFailures, ComputeRoutes, CollectStats, Visualize, AdvanceTime]
        );
        assert_eq!(sim.step().unwrap(), vec![LoadState, CollectStats, Visualize, AdvanceTime]);
        assert_eq!(
            sim.step().unwrap(),
            vec![LoadState, LoadFutureBanned, ApplyFailures, ComputeRoutes, CollectStats, Report, Visualize, AdvanceTime]
        );
        assert_eq!(sim.current_time(), 3);
        assert!(!sim.is_finished());
        sim.step().unwrap();
        assert!(sim.is_finished());
    }
    
    #[test]
    fn test_unknown_algorithm_is_config_error() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        let err = Simulation::new(config(&root, 2, 2, 4), &registry, 9999, source(4), vec![]).err();
        assert!(matches!(err, Some(SimError::Config(ConfigError::Algorithm(_)))));
    }
    
    #[test]
    fn test_run_end_to_end() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        let mut sim = Simulation::new(
            config(&root, 4, 4, 6),
            &registry,
            3001,
            source(16),
            vec![ObserverPair::new(0, 10)],
        )
        .unwrap();
        let summary = sim.run().unwrap();
        
        assert_eq!(summary.steps, 6);
        assert_eq!(summary.route_updates, 3);
        assert_eq!(summary.final_time, 5);
        assert_eq!(summary.algorithm, "DijkstraBase");
        let obs = &summary.stats.observers[0];
        assert_relative_eq!(obs.latency_ms, 4.0);
        assert_eq!(obs.failure_rate, 0.0);
        
        let report = fs::read_to_string(&summary.report_path).unwrap();
        assert!(report.starts_with("name: demo\nalgorithm: DijkstraBase\nnode type: DijkstraRouter\nsimulation time: 5\n"));
        assert!(report.contains("route path [0, 10]"));
    }
    
    #[test]
    fn test_run_latency_with_spread_positions() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        let grid = Grid::new(4, 4, 0).unwrap();
        let mut snapshot = SatelliteSnapshot::uniform(16, Vector3::zeros());
        snapshot.positions = (0..16)
            .map(|i| Vector3::new(6900.0 + 700.0 * (i % 4) as f64, 1100.0 * (i / 4) as f64 + 40.0 * (i % 4) as f64, 0.0))
            .collect();
        
        let mut world = WorldState::new(16);
        world.positions = snapshot.positions.clone();
        let link = LinkModel::default();
        let mut router = DijkstraRouter::new(0, 16, BanPolicy::Current);
        router.compute(&NetworkView::new(&grid, &link, &world));
        let shortest = router.distances()[10];
        assert!(shortest > grid.min_hops(0, 10) as f64 * link.proc_delay_ms);
        
        let src = StaticSource::default().with_default(snapshot);
        let mut sim = Simulation::new(config(&root, 4, 4, 4), &registry, 3002, src, vec![ObserverPair::new(0, 10)])
            .unwrap();
        let summary = sim.run().unwrap();
        let obs = &summary.stats.observers[0];
        assert_relative_eq!(obs.latency_ms, shortest, max_relative = 1e-12);
        assert_eq!(obs.failure_rate, 0.0);
    }
    
    #[test]
    fn test_outage_reroutes_at_next_update() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        // 1x4 ring: 0 -> 1 is direct until the link drops at t=1
        let src = source(4).with_outage(1, 0, 1).with_outage(2, 0, 1);
        let mut sim = Simulation::new(config(&root, 1, 4, 4), &registry, 3002, src, vec![ObserverPair::new(0, 1)])
            .unwrap();
        
        sim.step().unwrap();
        assert_eq!(sim.routing().tables().get(0, 1), Direction::East.port());
        // stale route over a banned link
        sim.step().unwrap();
        assert_eq!(sim.stats().results().observers[0].failure_rate, 0.5);
        sim.step().unwrap();
        assert_eq!(sim.routing().tables().get(0, 1), Direction::West.port());
    }
    
    #[test]
    fn test_missing_snapshot_writes_error_report() {
        let root = TempDir::new().unwrap();
        let registry = AlgorithmRegistry::standard();
        let src = StaticSource::default().with_snapshot(0, SatelliteSnapshot::uniform(4, Vector3::new(6900.0, 0.0, 0.0)));
        let mut sim = Simulation::new(config(&root, 2, 2, 4), &registry, 5001, src, vec![]).unwrap();
        
        let err = sim.run().unwrap_err();
        assert!(matches!(err, SimError::Env(satnet_env::EnvError::MissingSnapshot(1))));
        let report = fs::read_to_string(root.path().join("reports/report [demo] MinHopCount.txt")).unwrap();
        assert!(report.contains("status: error"));
        assert!(report.contains("simulation time: 1"));
    }
}
