//! lupa CLI - PHP inspection and quick-fix tool
//!
//! Three subcommands:
//! - `analyze`: report problems found by the enabled inspections
//! - `fix`: apply the quick fixes those inspections offer
//! - `list`: show the available inspections

mod analyze;
mod config;
mod fix;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

use lupa_inspections::InspectionRegistry;

#[derive(Parser)]
#[command(name = "lupa")]
#[command(version = "0.1.0")]
#[command(about = "PHP inspections with quick fixes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze PHP files and report problems
    Analyze(AnalyzeArgs),
    /// Apply quick fixes to PHP files
    Fix(FixArgs),
    /// List available inspections and exit
    List,
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze (default: paths from .lupa.toml)
    pub paths: Vec<PathBuf>,

    /// Output format: text, json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    /// Path to config file (default: auto-detect .lupa.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    pub no_config: bool,

    /// Target PHP version, overrides the config file (e.g. "7.4")
    #[arg(long, value_name = "VERSION")]
    pub php: Option<String>,

    /// Inspections to run (can be specified multiple times)
    #[arg(long = "inspection", short = 'i', value_name = "NAME")]
    pub inspections: Vec<String>,

    /// Write a debug log of the run to PATH
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(clap::Args)]
pub struct FixArgs {
    /// Files or directories to fix (default: paths from .lupa.toml)
    pub paths: Vec<PathBuf>,

    /// Show the changes without writing any file
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Only apply fixes from these inspections (can be specified multiple times)
    #[arg(long = "inspection", short = 'i', value_name = "NAME")]
    pub inspections: Vec<String>,

    /// Path to config file (default: auto-detect .lupa.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    pub no_config: bool,

    /// Target PHP version, overrides the config file (e.g. "7.4")
    #[arg(long, value_name = "VERSION")]
    pub php: Option<String>,

    /// Show verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => analyze::run(args),
        Commands::Fix(args) => fix::run(args),
        Commands::List => {
            list_inspections();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn list_inspections() {
    let registry = InspectionRegistry::new();

    println!("{}", "Available inspections:".bold());
    let mut entries = registry.list_inspections();
    entries.sort_by_key(|(name, _)| *name);
    for (name, description) in entries {
        println!("  {} - {}", name.green(), description);
    }
}
