use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod io;
mod render;

#[derive(Parser)]
#[command(name = "adspend", about = "Multi-touch attribution and budget optimization")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra config file layered over user and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: journeys, attribution, metrics and budget plan
    Run(commands::run::RunArgs),
    /// Compare attribution models on an event file
    Attribute(commands::attribute::AttributeArgs),
    /// Recommend a budget plan from a metrics table
    Optimize(commands::optimize::OptimizeArgs),
    /// Test whether two observed rates differ significantly
    Abtest(commands::abtest::AbTestArgs),
    /// Generate synthetic campus ad events
    Generate(commands::generate::GenerateArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Attribute(args) => commands::attribute::run(args, config),
        Commands::Optimize(args) => commands::optimize::run(args, config),
        Commands::Abtest(args) => commands::abtest::run(args, config),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Config(args) => commands::config::run(args, config),
    }
}
