//! Span-based source code editing with format preservation

use mago_span::Span;
use thiserror::Error;

/// Errors that can occur during edit application
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit span {start}..{end} out of bounds for source length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },
}

/// Represents a single code edit operation
#[derive(Debug, Clone)]
pub struct Edit {
    /// The source span to replace
    pub span: Span,
    /// The replacement text
    pub replacement: String,
    /// Human-readable description of the edit
    pub message: String,
}

impl Edit {
    /// Create a new edit
    pub fn new(span: Span, replacement: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            message: message.into(),
        }
    }

    /// Get the byte offset where this edit starts
    pub fn start_offset(&self) -> usize {
        self.span.start.offset as usize
    }

    /// Get the byte offset where this edit ends
    pub fn end_offset(&self) -> usize {
        self.span.end.offset as usize
    }
}

/// A named set of edits that must be applied together or not at all.
///
/// A single quick-fix often touches several places in the file (for
/// example merging a call chain rewrites one argument and deletes a
/// whole statement). Grouping them keeps a half-applied fix from ever
/// reaching disk.
#[derive(Debug, Clone)]
pub struct EditGroup {
    /// Human-readable title of the fix this group implements
    pub title: String,
    /// Member edits, in no particular order
    pub edits: Vec<Edit>,
}

impl EditGroup {
    pub fn new(title: impl Into<String>, edits: Vec<Edit>) -> Self {
        Self {
            title: title.into(),
            edits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Apply edits to source code, preserving surrounding formatting
///
/// Edits are applied in reverse order (from end to start) to maintain
/// valid offsets throughout the process.
///
/// # Arguments
/// * `source` - The original source code
/// * `edits` - Slice of edits to apply
///
/// # Returns
/// * `Ok(String)` - The modified source code
/// * `Err(EditError)` - If edits overlap or are out of bounds
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    // Sort edits by start position (descending) for safe replacement
    let mut sorted_edits: Vec<&Edit> = edits.iter().collect();
    sorted_edits.sort_by(|a, b| b.start_offset().cmp(&a.start_offset()));

    validate_edits(source.len(), &sorted_edits)?;

    // Apply edits from end to start
    let mut result = source.to_string();

    for edit in sorted_edits {
        let start = edit.start_offset();
        let end = edit.end_offset();

        // Get original text for whitespace analysis
        let original = &source[start..end];

        // Preserve leading whitespace from original
        let replacement = adjust_whitespace(original, &edit.replacement);

        result.replace_range(start..end, &replacement);
    }

    Ok(result)
}

/// Apply several edit groups as one atomic transaction.
///
/// Every edit from every group is validated against the source before
/// a single byte changes, so a conflict in one group rejects the whole
/// batch and the caller keeps the original text untouched.
pub fn apply_edit_groups(source: &str, groups: &[EditGroup]) -> Result<String, EditError> {
    let all_edits: Vec<Edit> = groups
        .iter()
        .flat_map(|group| group.edits.iter().cloned())
        .collect();

    apply_edits(source, &all_edits)
}

/// Check bounds and mutual overlap for a descending-sorted edit list
fn validate_edits(source_len: usize, sorted_edits: &[&Edit]) -> Result<(), EditError> {
    let mut prev_start: Option<usize> = None;

    for edit in sorted_edits {
        let start = edit.start_offset();
        let end = edit.end_offset();

        // Check bounds
        if end > source_len {
            return Err(EditError::SpanOutOfBounds {
                start,
                end,
                len: source_len,
            });
        }

        // Check for overlap with previous edit
        if let Some(prev) = prev_start {
            if end > prev {
                return Err(EditError::OverlappingEdits(start));
            }
        }

        prev_start = Some(start);
    }

    Ok(())
}

/// Widen a statement span so deleting it also swallows the whitespace
/// run up to the next token.
///
/// Removing just the statement text would leave its line's newline plus
/// any blank lines behind. Extending the end through the following
/// whitespace makes the next statement land right after the previous
/// one's separator, keeping indentation intact.
pub fn statement_deletion_span(source: &str, span: Span) -> Span {
    let start = span.start.offset as usize;
    let mut end = span.end.offset as usize;

    let bytes = source.as_bytes();
    while end < bytes.len() && (bytes[end] as char).is_ascii_whitespace() {
        end += 1;
    }

    Span::new(
        span.file_id,
        span.start,
        mago_span::Position::new(end as u32),
    )
}

/// Attempt to preserve whitespace patterns from original code
pub(crate) fn adjust_whitespace(original: &str, replacement: &str) -> String {
    // Simple heuristic: preserve leading whitespace
    let leading_ws: String = original
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    if !leading_ws.is_empty() && !replacement.starts_with(&leading_ws) {
        format!("{}{}", leading_ws, replacement.trim_start())
    } else {
        replacement.to_string()
    }
}
