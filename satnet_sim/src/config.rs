//! Simulation configuration loaded from JSON.
//!
//! ```json
//! {
//!   "name": "starlink_shell1",
//!   "constellation": {
//!     "num_of_orbit_planes": 72,
//!     "num_of_satellites_per_plane": 22,
//!     "relative_spacing": 39
//!   },
//!   "ISL_latency": {
//!     "processing_delay": 1.0,
//!     "propagation_delay_coef": 1.0,
//!     "propagation_speed": 299792458.0
//!   },
//!   "step_length": 1,
//!   "duration": 600,
//!   "update_period": 15,
//!   "isl_state_dir": "data/isl",
//!   "sat_position_dir": "data/pos",
//!   "sat_lla_dir": "data/lla",
//!   "sat_velocity_dir": "data/vel",
//!   "report_dir": "reports",
//!   "observer_config_path": "observers.txt",
//!   "failure_model": { "link_probability": 0.001 }
//! }
//! ```

use crate::error::ConfigError;
use satnet_core::{Grid, LinkModel};
use satnet_env::DataDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Grid shape of the constellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstellationConfig {
    /// P
    pub num_of_orbit_planes: usize,
    
    /// Q
    pub num_of_satellites_per_plane: usize,
    
    /// F, the phase shift between adjacent planes
    pub relative_spacing: usize,
}

/// Inter-satellite link delay constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslLatencyConfig {
    /// ms per hop
    pub processing_delay: f64,
    pub propagation_delay_coef: f64,
    /// m/s
    pub propagation_speed: f64,
}

/// Random failure overlay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureModelConfig {
    #[serde(default)]
    pub link_probability: f64,
    #[serde(default)]
    pub node_probability: f64,
}

/// Frame export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Path source; alone it selects a routing-table view of this node
    #[serde(default)]
    pub source: Option<usize>,
    
    #[serde(default)]
    pub destination: Option<usize>,
    
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,
    
    /// Sub-directory for this run's frames (defaults to the config name)
    #[serde(default)]
    pub scenario: Option<String>,
    
    /// Table view filter: 0 same direction as source, 1 opposite, 2 all
    #[serde(default)]
    pub diff_table: u8,
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("frames")
}

fn default_rib_dir() -> PathBuf {
    PathBuf::from("rib")
}

fn default_seed() -> u64 {
    42
}

/// Complete configuration of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Scenario name used in report and RIB paths
    pub name: String,
    
    pub constellation: ConstellationConfig,
    
    #[serde(rename = "ISL_latency")]
    pub isl_latency: IslLatencyConfig,
    
    /// Simulation seconds per step
    pub step_length: u64,
    
    /// Total simulated seconds
    pub duration: u64,
    
    #[serde(default)]
    pub start_time: u64,
    
    /// Route recomputation interval (defaults to `duration`)
    #[serde(default)]
    pub update_period: Option<u64>,
    
    /// Report interval (defaults to the update period)
    #[serde(default)]
    pub refresh_period: Option<u64>,
    
    pub isl_state_dir: PathBuf,
    pub sat_position_dir: PathBuf,
    pub sat_lla_dir: PathBuf,
    pub sat_velocity_dir: PathBuf,
    pub report_dir: PathBuf,
    
    pub observer_config_path: PathBuf,
    
    /// Nodes whose table row is dumped after every update
    #[serde(default)]
    pub dump_rib_nodes: Vec<usize>,
    
    #[serde(default = "default_rib_dir")]
    pub rib_dir: PathBuf,
    
    /// Seed of the failure model RNG
    #[serde(default = "default_seed")]
    pub seed: u64,
    
    #[serde(default)]
    pub failure_model: FailureModelConfig,
    
    #[serde(default)]
    pub visualization: Option<VisualizationConfig>,
}

impl SimConfig {
    /// A minimal configuration for a P×Q grid, with paths relative to the
    /// working directory. Mostly useful for tests and in-memory sources.
    pub fn for_grid(name: &str, p: usize, q: usize, f: usize) -> Self {
        let link = LinkModel::default();
        Self {
            name: name.to_string(),
            constellation: ConstellationConfig {
                num_of_orbit_planes: p,
                num_of_satellites_per_plane: q,
                relative_spacing: f,
            },
            isl_latency: IslLatencyConfig {
                processing_delay: link.proc_delay_ms,
                propagation_delay_coef: link.prop_delay_coef,
                propagation_speed: link.prop_speed,
            },
            step_length: 1,
            duration: 1,
            start_time: 0,
            update_period: None,
            refresh_period: None,
            isl_state_dir: PathBuf::from("isl"),
            sat_position_dir: PathBuf::from("pos"),
            sat_lla_dir: PathBuf::from("lla"),
            sat_velocity_dir: PathBuf::from("vel"),
            report_dir: PathBuf::from("reports"),
            observer_config_path: PathBuf::from("observers.txt"),
            dump_rib_nodes: Vec::new(),
            rib_dir: default_rib_dir(),
            seed: default_seed(),
            failure_model: FailureModelConfig::default(),
            visualization: None,
        }
    }
    
    /// Reads, parses and validates a config file. The observer file must
    /// exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        if !config.observer_config_path.is_file() {
            return Err(ConfigError::MissingObserverFile(config.observer_config_path));
        }
        Ok(config)
    }
    
    /// Parses and validates a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
    
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.constellation;
        if c.num_of_orbit_planes == 0 {
            return Err(ConfigError::invalid("num_of_orbit_planes", "must be positive"));
        }
        if c.num_of_satellites_per_plane == 0 {
            return Err(ConfigError::invalid("num_of_satellites_per_plane", "must be positive"));
        }
        if self.step_length == 0 {
            return Err(ConfigError::invalid("step_length", "must be positive"));
        }
        if self.duration == 0 {
            return Err(ConfigError::invalid("duration", "must be positive"));
        }
        if self.update_period == Some(0) {
            return Err(ConfigError::invalid("update_period", "must be positive"));
        }
        if self.refresh_period == Some(0) {
            return Err(ConfigError::invalid("refresh_period", "must be positive"));
        }
        if self.isl_latency.propagation_speed <= 0.0 {
            return Err(ConfigError::invalid("propagation_speed", "must be positive"));
        }
        for (field, p) in [
            ("link_probability", self.failure_model.link_probability),
            ("node_probability", self.failure_model.node_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::invalid(field, format!("{} is not in [0, 1]", p)));
            }
        }
        Ok(())
    }
    
    pub fn update_period(&self) -> u64 {
        self.update_period.unwrap_or(self.duration)
    }
    
    pub fn refresh_period(&self) -> u64 {
        self.refresh_period.unwrap_or_else(|| self.update_period())
    }
    
    /// First instant past the end of the run.
    pub fn end_time(&self) -> u64 {
        self.start_time + self.duration
    }
    
    pub fn num_nodes(&self) -> usize {
        self.constellation.num_of_orbit_planes * self.constellation.num_of_satellites_per_plane
    }
    
    pub fn grid(&self) -> Result<Grid, ConfigError> {
        let c = &self.constellation;
        Ok(Grid::new(
            c.num_of_orbit_planes,
            c.num_of_satellites_per_plane,
            c.relative_spacing,
        )?)
    }
    
    pub fn link_model(&self) -> LinkModel {
        LinkModel {
            proc_delay_ms: self.isl_latency.processing_delay,
            prop_delay_coef: self.isl_latency.propagation_delay_coef,
            prop_speed: self.isl_latency.propagation_speed,
        }
    }
    
    pub fn data_dirs(&self) -> DataDirs {
        DataDirs {
            isl_state: self.isl_state_dir.clone(),
            positions: self.sat_position_dir.clone(),
            lla: self.sat_lla_dir.clone(),
            velocities: self.sat_velocity_dir.clone(),
        }
    }
}
