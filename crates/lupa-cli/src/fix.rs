//! The `fix` subcommand
//!
//! Re-runs the enabled inspections over the target files and applies the
//! quick fixes they offer. Every file gets its own document: fixes are
//! offered against the unmodified text, then applied one by one, with
//! handle resolution skipping any fix whose target an earlier fix
//! already rewrote. Skipped fixes require a fresh run to come back.

use anyhow::{Context, Result};
use colored::*;
use indicatif::ProgressBar;
use rayon::prelude::*;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lupa_analyze::{collect_php_files, Analyzer};
use lupa_core::{Document, FixOutcome};

use crate::config;
use crate::FixArgs;

pub fn run(args: FixArgs) -> Result<ExitCode> {
    let settings = config::resolve(args.config.as_deref(), args.no_config, args.verbose)?;

    let mut inspection_config = settings.config.clone();
    if let Some(php) = &args.php {
        inspection_config.php_version = php.clone();
    }

    let mut analyzer = Analyzer::new(inspection_config);
    config::validate_inspection_names(&args.inspections, &analyzer.registry().all_names())?;
    analyzer.set_enabled(settings.effective_inspections(&args.inspections));
    analyzer.set_exclude(settings.exclude.clone());

    let paths = if args.paths.is_empty() {
        settings.paths.clone()
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        anyhow::bail!("No paths given. Pass paths on the command line or set them in .lupa.toml");
    }

    let files = collect_php_files(&paths, &settings.exclude);
    if files.is_empty() {
        println!("No PHP files found");
        return Ok(ExitCode::SUCCESS);
    }

    let progress = if files.len() > 1 {
        Some(ProgressBar::new(files.len() as u64))
    } else {
        None
    };

    let results: Vec<(PathBuf, Result<FileFix>)> = files
        .par_iter()
        .map(|path| {
            let result = fix_file(&analyzer, path);
            if let Some(bar) = &progress {
                bar.inc(1);
            }
            (path.clone(), result)
        })
        .collect();
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let mut applied_total = 0;
    let mut skipped_total = 0;
    let mut files_changed = 0;
    let mut errors = 0;

    for (path, result) in results {
        match result {
            Ok(outcome) => {
                if outcome.applied == 0 && outcome.skipped == 0 {
                    if args.verbose {
                        println!("{}: nothing to fix", path.display());
                    }
                    continue;
                }

                applied_total += outcome.applied;
                skipped_total += outcome.skipped;

                if outcome.applied > 0 {
                    files_changed += 1;
                    if args.dry_run {
                        print_diff(&path, &outcome.original, &outcome.text);
                    } else {
                        write_file(&path, &outcome.text)?;
                        println!(
                            "{} {} fix{} applied",
                            path.display().to_string().bold(),
                            outcome.applied,
                            if outcome.applied == 1 { "" } else { "es" }
                        );
                    }
                }

                if outcome.skipped > 0 {
                    println!(
                        "{}: {} {} fix{} skipped (target changed, re-run to retry)",
                        path.display(),
                        "!".yellow(),
                        outcome.skipped,
                        if outcome.skipped == 1 { "" } else { "es" }
                    );
                }
            }
            Err(e) => {
                eprintln!("{}: {} - {:#}", "Warning".yellow(), path.display(), e);
                errors += 1;
            }
        }
    }

    println!();
    if args.dry_run {
        println!(
            "Would apply {} fix{} in {} file{}",
            applied_total,
            if applied_total == 1 { "" } else { "es" },
            files_changed,
            if files_changed == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "Applied {} fix{} in {} file{}",
            applied_total,
            if applied_total == 1 { "" } else { "es" },
            files_changed,
            if files_changed == 1 { "" } else { "s" }
        );
    }

    Ok(if errors > 0 || skipped_total > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Outcome of fixing one file, before any write-back
struct FileFix {
    original: String,
    text: String,
    applied: usize,
    skipped: usize,
}

fn fix_file(analyzer: &Analyzer, path: &Path) -> Result<FileFix> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(fix_source(analyzer, path, &source))
}

/// Apply every offered fix to one source snapshot.
///
/// Fixes are offered up front so each carries stable handles; applying
/// them in report order lets later handles shift across earlier edits
/// and aborts cleanly when two fixes fought over the same span.
fn fix_source(analyzer: &Analyzer, path: &Path, source: &str) -> FileFix {
    let problems = analyzer.analyze_source(path, source);
    let mut document = Document::new(source);

    let offers: Vec<_> = problems
        .problems()
        .iter()
        .filter_map(|problem| problem.fix.as_ref())
        .map(|fix| document.offer(fix))
        .collect();

    let mut applied = 0;
    let mut skipped = 0;
    for offered in &offers {
        match document.apply(offered) {
            FixOutcome::Applied => applied += 1,
            FixOutcome::Aborted(_) => skipped += 1,
        }
    }

    FileFix {
        original: source.to_string(),
        text: document.text().to_string(),
        applied,
        skipped,
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Print a unified diff of the pending changes (dry-run output)
fn print_diff(path: &Path, old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();

    println!("--- a/{}", path_str);
    println!("+++ b/{}", path_str);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            print!("{}{}", sign, change);
            if change.missing_newline() {
                println!();
            }
        }
    }
}
