//! Configuration file support for lupa
//!
//! Loads `.lupa.toml` from the current directory or parent directories.
//! The `[config]` table feeds the inspections directly; the top-level
//! keys drive the CLI (default paths, excludes, enabled inspections).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lupa_inspections::InspectionConfig;

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LupaConfig {
    /// Inspection settings, passed through to every check
    pub config: InspectionConfig,
    /// Default paths to analyze when none are given on the command line
    pub paths: Vec<PathBuf>,
    /// Glob patterns to exclude from directory walks
    pub exclude: Vec<String>,
    /// Inspections to enable (empty = all)
    pub inspections: Vec<String>,
}

impl LupaConfig {
    /// Load config from `.lupa.toml` searching from current directory upward
    pub fn load() -> Result<Option<(LupaConfig, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(LupaConfig, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(".lupa.toml");
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<LupaConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: LupaConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Compute the effective set of enabled inspections.
    ///
    /// Names given on the command line override the config file entirely;
    /// an empty result means "run everything".
    pub fn effective_inspections(&self, cli_names: &[String]) -> HashSet<String> {
        if !cli_names.is_empty() {
            return cli_names.iter().cloned().collect();
        }
        self.inspections.iter().cloned().collect()
    }
}

/// Resolve the configuration for one CLI invocation
pub fn resolve(
    config_path: Option<&Path>,
    no_config: bool,
    verbose: bool,
) -> Result<LupaConfig> {
    if no_config {
        return Ok(LupaConfig::default());
    }

    if let Some(path) = config_path {
        let config = LupaConfig::load_path(path)?;
        if verbose {
            println!("Using config: {}", path.display());
        }
        return Ok(config);
    }

    match LupaConfig::load()? {
        Some((config, path)) => {
            if verbose {
                println!("Using config: {}", path.display());
            }
            Ok(config)
        }
        None => Ok(LupaConfig::default()),
    }
}

/// Reject inspection names that no registered inspection answers to
pub fn validate_inspection_names(names: &[String], all: &[&str]) -> Result<()> {
    for name in names {
        if !all.contains(&name.as_str()) {
            bail!(
                "Unknown inspection '{}'. Use `lupa list` to see available inspections.",
                name
            );
        }
    }
    Ok(())
}
