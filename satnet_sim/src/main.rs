//! satnet simulator CLI
//!
//! Run one routing algorithm over a constellation dataset and write its
//! report.

use clap::Parser;
use satnet_core::AlgorithmRegistry;
use satnet_env::FsSource;
use satnet_sim::{load_observers, SimConfig, SimError, Simulation};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Satellite constellation routing simulator
#[derive(Parser, Debug)]
#[command(name = "satnet-sim")]
#[command(about = "Simulate routing algorithms over a satellite constellation", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(required_unless_present = "list")]
    config: Option<PathBuf>,
    
    /// Algorithm id (see --list)
    #[arg(required_unless_present = "list")]
    algorithm: Option<u32>,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON summary on stdout
    #[arg(long)]
    json: bool,
    
    /// List algorithm ids and exit
    #[arg(long)]
    list: bool,
}

fn run(config_path: PathBuf, algorithm_id: u32, registry: &AlgorithmRegistry, json: bool) -> Result<(), SimError> {
    let config = SimConfig::load(&config_path)?;
    let observers = load_observers(&config.observer_config_path, config.num_nodes())?;
    let source = FsSource::new(config.data_dirs(), config.num_nodes());
    
    let mut sim = Simulation::new(config, registry, algorithm_id, source, observers)?;
    let summary = sim.run()?;
    
    if json {
        let out = serde_json::json!({
            "name": summary.name,
            "algorithm": summary.algorithm,
            "algorithm_id": algorithm_id,
            "final_time": summary.final_time,
            "steps": summary.steps,
            "route_updates": summary.route_updates,
            "wall_secs": summary.wall_secs,
            "report": summary.report_path,
            "stats": summary.stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!(
            "✓ {} [{}] finished at t={} ({} steps, {} route updates) in {:.2}s",
            summary.name,
            summary.algorithm,
            summary.final_time,
            summary.steps,
            summary.route_updates,
            summary.wall_secs
        );
    }
    Ok(())
}

/// Log directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    level.as_str().to_ascii_lowercase()
}

fn main() {
    let args = Args::parse();
    
    // Initialize logging; RUST_LOG overrides the --verbose default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(args.verbose)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
    
    let registry = AlgorithmRegistry::standard();
    if args.list {
        for (id, kind) in registry.iter() {
            println!("{:>5}  {}", id, kind);
        }
        return;
    }
    
    let (Some(config), Some(algorithm)) = (args.config, args.algorithm) else {
        eprintln!("Error: CONFIG and ALGORITHM are required");
        std::process::exit(2);
    };
    
    if !args.json {
        info!("satnet simulator v{}", env!("CARGO_PKG_VERSION"));
    }
    
    if let Err(e) = run(config, algorithm, &registry, args.json) {
        error!("✗ {}", e);
        std::process::exit(1);
    }
}
