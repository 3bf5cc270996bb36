//! JSON output format

use serde::Serialize;
use std::collections::BTreeMap;

use super::Formatter;
use lupa_core::{Problem, ProblemCollection, Severity};

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput {
    totals: Totals,
    files: BTreeMap<String, FileProblems>,
}

#[derive(Serialize)]
struct Totals {
    problems: usize,
    errors: usize,
    warnings: usize,
}

#[derive(Serialize)]
struct FileProblems {
    problems: usize,
    messages: Vec<FileMessage>,
}

#[derive(Serialize)]
struct FileMessage {
    message: String,
    line: usize,
    column: usize,
    severity: &'static str,
    inspection: String,
    fixable: bool,
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::WeakWarning => "weak_warning",
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, problems: &ProblemCollection) -> String {
        let mut files: BTreeMap<String, Vec<&Problem>> = BTreeMap::new();
        for problem in problems.problems() {
            let path = problem.file.display().to_string();
            files.entry(path).or_default().push(problem);
        }

        let file_problems: BTreeMap<String, FileProblems> = files
            .into_iter()
            .map(|(path, path_problems)| {
                let messages: Vec<FileMessage> = path_problems
                    .iter()
                    .map(|problem| FileMessage {
                        message: problem.message.clone(),
                        line: problem.line,
                        column: problem.column,
                        severity: severity_name(problem.severity),
                        inspection: problem.inspection.clone(),
                        fixable: problem.fix.is_some(),
                    })
                    .collect();

                let entry = FileProblems {
                    problems: messages.len(),
                    messages,
                };
                (path, entry)
            })
            .collect();

        let output = JsonOutput {
            totals: Totals {
                problems: problems.len(),
                errors: problems.error_count(),
                warnings: problems.warning_count(),
            },
            files: file_problems,
        };

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mago_database::file::FileId;
    use mago_span::{Position, Span};
    use std::path::PathBuf;

    #[test]
    fn test_json_format() {
        let span = Span::new(FileId::zero(), Position::new(0), Position::new(1));
        let mut problem = Problem::error("non_secure_extract", "Needs second parameter", span);
        problem.file = PathBuf::from("a.php");
        problem.line = 4;
        problem.column = 1;

        let mut problems = ProblemCollection::new();
        problems.add(problem);

        let output = JsonFormatter.format(&problems);
        assert!(output.contains("\"errors\": 1"));
        assert!(output.contains("\"inspection\": \"non_secure_extract\""));
        assert!(output.contains("\"fixable\": false"));
        assert!(output.contains("Needs second parameter"));
    }

    #[test]
    fn test_json_format_empty() {
        let output = JsonFormatter.format(&ProblemCollection::new());
        assert!(output.contains("\"problems\": 0"));
    }
}
