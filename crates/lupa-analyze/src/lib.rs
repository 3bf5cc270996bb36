//! lupa-analyze: drives inspections over PHP source trees
//!
//! This crate walks the given paths, parses every PHP file it finds, runs
//! the enabled inspections against each parse tree, and collects the
//! resulting problems into one sorted collection.
//!
//! # Example
//!
//! ```no_run
//! use lupa_analyze::Analyzer;
//! use lupa_analyze::output::{format_problems, OutputFormat};
//! use std::path::PathBuf;
//!
//! let analyzer = Analyzer::with_defaults();
//! let problems = analyzer.analyze_paths(&[PathBuf::from("src/")]).unwrap();
//! println!("{}", format_problems(&problems, OutputFormat::Text));
//! ```

pub mod logging;
pub mod output;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use mago_database::file::FileId;
use mago_span::{Position, Span};
use rayon::prelude::*;
use walkdir::WalkDir;

use lupa_core::{Problem, ProblemCollection};
use lupa_inspections::{InspectionConfig, InspectionRegistry};

/// Runs the inspection registry over files and sources
pub struct Analyzer {
    config: InspectionConfig,
    registry: InspectionRegistry,
    enabled: HashSet<String>,
    exclude: Vec<String>,
}

impl Analyzer {
    /// Create an analyzer with the given inspection configuration.
    ///
    /// All registered inspections start enabled.
    pub fn new(config: InspectionConfig) -> Self {
        let registry = InspectionRegistry::new();
        let enabled = registry
            .all_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        Self {
            config,
            registry,
            enabled,
            exclude: Vec::new(),
        }
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> Self {
        Self::new(InspectionConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    /// Access the inspection registry
    pub fn registry(&self) -> &InspectionRegistry {
        &self.registry
    }

    /// Restrict analysis to the named inspections.
    ///
    /// An empty set means "run everything".
    pub fn set_enabled(&mut self, names: HashSet<String>) {
        if names.is_empty() {
            self.enabled = self
                .registry
                .all_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
        } else {
            self.enabled = names;
        }
    }

    /// Glob patterns for paths to skip during directory walks
    pub fn set_exclude(&mut self, patterns: Vec<String>) {
        self.exclude = patterns;
    }

    /// Analyze a single file
    pub fn analyze_file(&self, path: &Path) -> Result<ProblemCollection, AnalyzeError> {
        let source = fs::read_to_string(path)?;
        Ok(self.analyze_source(path, &source))
    }

    /// Analyze source code with a given path.
    ///
    /// A source that fails to parse yields one `parse_error` problem and
    /// no inspection runs.
    pub fn analyze_source(&self, path: &Path, source: &str) -> ProblemCollection {
        let arena = bumpalo::Bump::new();
        let file_id = FileId::new(path.to_string_lossy().as_ref());
        let (program, parse_error) =
            mago_syntax::parser::parse_file_content(&arena, file_id, source);

        let mut problems = ProblemCollection::new();

        if let Some(error) = parse_error {
            let span = Span::new(file_id, Position::new(0), Position::new(0));
            problems.add(
                Problem::error("parse_error", error.to_string(), span).locate(source, path),
            );
            return problems;
        }

        for problem in self
            .registry
            .check_all(program, source, &self.config, &self.enabled)
        {
            problems.add(problem.locate(source, path));
        }

        problems
    }

    /// Analyze multiple paths (files or directories), in parallel.
    ///
    /// Unreadable files are reported to stderr and skipped; the rest of
    /// the run continues. The returned collection is sorted by file, line
    /// and column.
    pub fn analyze_paths(&self, paths: &[PathBuf]) -> Result<ProblemCollection, AnalyzeError> {
        if paths.is_empty() {
            return Err(AnalyzeError::NoPaths);
        }

        let files = collect_php_files(paths, &self.exclude);
        logging::log_analysis_start(files.len());

        let results: Vec<_> = files
            .par_iter()
            .map(|file| (file, self.analyze_file(file)))
            .collect();

        let mut combined = ProblemCollection::new();
        for (file, result) in results {
            match result {
                Ok(problems) => {
                    logging::log_file_result(file, problems.len());
                    combined.extend(problems.into_problems());
                }
                Err(e) => {
                    eprintln!("Warning: {}: {}", file.display(), e);
                }
            }
        }

        combined.sort();
        logging::log_analysis_complete(combined.len(), combined.error_count());
        Ok(combined)
    }
}

/// Collect the PHP files under the given paths, honoring exclude globs.
///
/// Explicitly named files are always kept; directory walks filter by the
/// `.php` extension and the exclude patterns.
pub fn collect_php_files(paths: &[PathBuf], exclude: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file()
                    && entry_path.extension().map(|e| e == "php").unwrap_or(false)
                    && !is_excluded(entry_path, exclude)
                {
                    files.push(entry_path.to_path_buf());
                }
            }
        }
    }

    files
}

fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
            if glob_pattern.matches(&path_str) {
                return true;
            }
            if let Some(file_name) = path.file_name() {
                if glob_pattern.matches(&file_name.to_string_lossy()) {
                    return true;
                }
            }
        }

        // Directory patterns like "vendor/" match anywhere in the path
        if pattern.ends_with('/') {
            let dir_pattern = pattern.trim_end_matches('/');
            if path_str.contains(&format!("/{}/", dir_pattern))
                || path_str.starts_with(&format!("{}/", dir_pattern))
            {
                return true;
            }
        }
    }

    false
}

/// Errors that can occur while driving analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("No paths given to analyze")]
    NoPaths,
}
