//! Problem reports produced by inspections
//!
//! A problem pins a message and severity to a source span. It may carry a
//! fix: a titled set of fragment replacements that the document applier
//! can later turn into real edits.

use std::path::{Path, PathBuf};

use mago_span::Span;

/// Severity levels for reported problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    WeakWarning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::WeakWarning => write!(f, "weak warning"),
        }
    }
}

/// What kind of source fragment a fix edit intends to splice in.
///
/// The category decides how the fragment is validated before mutation:
/// expressions and statements are re-parsed in isolation, raw fragments
/// (sub-token rewrites, tag-spanning rewrites, deletions) are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentCategory {
    Expression,
    Statement,
    Raw,
}

/// One fragment replacement inside a fix
#[derive(Debug, Clone)]
pub struct FixEdit {
    /// The source span to replace
    pub span: Span,
    /// The replacement fragment
    pub replacement: String,
    /// How to validate the fragment before applying
    pub category: FragmentCategory,
}

impl FixEdit {
    /// Replace a span with an expression fragment
    pub fn expression(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            category: FragmentCategory::Expression,
        }
    }

    /// Replace a span with a statement fragment
    pub fn statement(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            category: FragmentCategory::Statement,
        }
    }

    /// Replace a span with raw text, bypassing fragment validation
    pub fn raw(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            category: FragmentCategory::Raw,
        }
    }
}

/// A quick-fix attached to a problem
#[derive(Debug, Clone)]
pub struct Fix {
    /// Human-readable fix title, shown in pickers and diffs
    pub title: String,
    /// The fragment replacements this fix performs
    pub edits: Vec<FixEdit>,
}

impl Fix {
    pub fn new(title: impl Into<String>, edits: Vec<FixEdit>) -> Self {
        Self {
            title: title.into(),
            edits,
        }
    }
}

/// A single problem found during inspection
#[derive(Debug, Clone)]
pub struct Problem {
    /// Identifier of the inspection that reported this (e.g. "power_operator")
    pub inspection: String,
    /// Problem severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// File where the problem was found
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// The offending source span
    pub span: Span,
    /// Optional quick-fix
    pub fix: Option<Fix>,
}

impl Problem {
    /// Create an error-severity problem
    pub fn error(inspection: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(inspection, Severity::Error, message, span)
    }

    /// Create a warning-severity problem
    pub fn warning(inspection: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(inspection, Severity::Warning, message, span)
    }

    /// Create a weak-warning-severity problem
    pub fn weak(inspection: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(inspection, Severity::WeakWarning, message, span)
    }

    fn with_severity(
        inspection: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            inspection: inspection.into(),
            severity,
            message: message.into(),
            file: PathBuf::new(),
            line: 0,
            column: 0,
            span,
            fix: None,
        }
    }

    /// Attach a quick-fix
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Fill in file path and line/column from the span's start offset
    pub fn locate(mut self, source: &str, file: &Path) -> Self {
        let (line, column) = line_column(source, self.span.start.offset as usize);
        self.file = file.to_path_buf();
        self.line = line;
        self.column = column;
        self
    }
}

/// Convert a byte offset to 1-based line and column numbers
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

/// A collection of problems with aggregation helpers
#[derive(Debug, Clone, Default)]
pub struct ProblemCollection {
    problems: Vec<Problem>,
}

impl ProblemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem to the collection
    pub fn add(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    /// Add multiple problems
    pub fn extend(&mut self, problems: Vec<Problem>) {
        self.problems.extend(problems);
    }

    /// Get all problems
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Consume and return the problems
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Count problems with error severity
    pub fn error_count(&self) -> usize {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Error)
            .count()
    }

    /// Count problems with warning severity
    pub fn warning_count(&self) -> usize {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Warning)
            .count()
    }

    /// Sort problems by file, then line, then column
    pub fn sort(&mut self) {
        self.problems.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.cmp(&b.line))
                .then(a.column.cmp(&b.column))
        });
    }
}
