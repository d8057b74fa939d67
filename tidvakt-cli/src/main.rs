//! ## tidvakt-cli
//! **Configuration and dependency diagnostics**
//!
//! Checks run configurations and module manifests without running a
//! simulation: resolves the activation order, surfaces unmatched inputs,
//! and renders the dependency graph for external visualization tooling.

use clap::Parser;
use tidvakt_telemetry::logging::EventLogger;

mod commands;

use commands::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => commands::run_validate(args),
        Commands::Graph(args) => commands::run_graph(args),
    }
}
