//! Text output format (default, human-readable)

use colored::*;
use std::collections::HashMap;

use super::Formatter;
use lupa_core::{ProblemCollection, Severity};

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, problems: &ProblemCollection) -> String {
        if problems.is_empty() {
            return format!(" {} No problems\n", "[OK]".green());
        }

        let mut output = String::new();

        // Group by file
        let mut files: HashMap<String, Vec<_>> = HashMap::new();
        for problem in problems.problems() {
            let path = problem.file.display().to_string();
            files.entry(path).or_default().push(problem);
        }

        let mut file_list: Vec<_> = files.keys().cloned().collect();
        file_list.sort();

        for file_path in file_list {
            let file_problems = &files[&file_path];

            output.push_str(&format!("\n -- {} --\n\n", file_path.bold()));

            for problem in file_problems.iter() {
                let severity_marker = match problem.severity {
                    Severity::Error => "ERROR".red().to_string(),
                    Severity::Warning => "WARNING".yellow().to_string(),
                    Severity::WeakWarning => "WEAK".dimmed().to_string(),
                };

                output.push_str(&format!(
                    " {} Line {}: {}\n",
                    severity_marker, problem.line, problem.message
                ));

                if let Some(fix) = &problem.fix {
                    output.push_str(&format!("       Fix: {}\n", fix.title.dimmed()));
                }
            }
        }

        let weak_count = problems
            .problems()
            .iter()
            .filter(|p| p.severity == Severity::WeakWarning)
            .count();

        output.push_str(&format!(
            "\n Found {} problem{}: {} error{}, {} warning{}, {} weak\n",
            problems.len(),
            plural(problems.len()),
            problems.error_count(),
            plural(problems.error_count()),
            problems.warning_count(),
            plural(problems.warning_count()),
            weak_count,
        ));

        output
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
