use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use tidvakt_config::{ModuleManifest, SimulationConfig};
use tidvakt_registry::{DependencyGraph, ModuleRegistry};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a run configuration and module manifest without running
    Validate(ValidateArgs),
    /// Print the resolved activation order or a DOT dependency graph
    Graph(GraphArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Module manifest: a YAML list of module descriptors
    #[arg(short, long)]
    pub manifest: PathBuf,
    /// Run configuration file; defaults plus environment if omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Module manifest: a YAML list of module descriptors
    #[arg(short, long)]
    pub manifest: PathBuf,
    /// Run configuration file; defaults plus environment if omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Emit DOT for external visualization tooling
    #[arg(long)]
    pub dot: bool,
}

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub fn run_validate(args: ValidateArgs) -> CliResult {
    let (config, graph) = resolve(&args.manifest, args.config.as_deref())?;

    println!(
        "Schedule: {} -> {} ({})",
        config.schedule.start_time, config.schedule.end_time, config.schedule.time_unit
    );
    println!("Activation order: {}", graph.activation_order().join(" -> "));
    for unmatched in graph.unmatched_inputs() {
        println!(
            "warning: input '{}' of module '{}' has no producer; it must be supplied before init",
            unmatched.object, unmatched.module
        );
    }
    println!("Configuration OK");
    Ok(())
}

pub fn run_graph(args: GraphArgs) -> CliResult {
    let (_config, graph) = resolve(&args.manifest, args.config.as_deref())?;

    if args.dot {
        print!("{}", graph.to_dot());
    } else {
        for (position, name) in graph.activation_order().iter().enumerate() {
            println!("{:>3}. {}", position + 1, name);
        }
    }
    Ok(())
}

/// Loads manifest and configuration, then resolves the dependency graph.
/// An empty module selection in the configuration means "every module in
/// the manifest, in listing order".
fn resolve(
    manifest_path: &Path,
    config_path: Option<&Path>,
) -> Result<(SimulationConfig, DependencyGraph), Box<dyn std::error::Error + Send + Sync>> {
    let manifest = ModuleManifest::load_from_path(manifest_path)?;
    let config = match config_path {
        Some(path) => SimulationConfig::load_from_path(path)?,
        None => SimulationConfig::load()?,
    };

    let mut registry = ModuleRegistry::new();
    manifest.register_into(&mut registry)?;

    let selected = if config.modules.is_empty() {
        manifest.names()
    } else {
        config.modules.clone()
    };
    let graph = registry.build_graph(&selected)?;
    Ok((config, graph))
}
