//! The `analyze` subcommand

use anyhow::Result;
use std::process::ExitCode;

use lupa_analyze::output::{format_problems, OutputFormat};
use lupa_analyze::{logging, Analyzer};

use crate::config;
use crate::AnalyzeArgs;

pub fn run(args: AnalyzeArgs) -> Result<ExitCode> {
    let settings = config::resolve(args.config.as_deref(), args.no_config, args.verbose)?;

    let format = OutputFormat::from_str(&args.format).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: text, json",
            args.format
        )
    })?;

    let mut inspection_config = settings.config.clone();
    if let Some(php) = &args.php {
        inspection_config.php_version = php.clone();
    }

    let mut analyzer = Analyzer::new(inspection_config);
    config::validate_inspection_names(&args.inspections, &analyzer.registry().all_names())?;
    analyzer.set_enabled(settings.effective_inspections(&args.inspections));
    analyzer.set_exclude(settings.exclude.clone());

    if let Some(log_path) = args.log.as_deref() {
        let path = logging::init_logger(Some(log_path))?;
        if args.verbose {
            println!("Debug log: {}", path.display());
        }
    }

    let paths = if args.paths.is_empty() {
        settings.paths.clone()
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        anyhow::bail!("No paths given. Pass paths on the command line or set them in .lupa.toml");
    }

    let problems = analyzer.analyze_paths(&paths)?;
    print!("{}", format_problems(&problems, format));

    Ok(if problems.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
