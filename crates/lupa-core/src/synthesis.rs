//! Replacement fragment construction and validation
//!
//! Helpers for building the PHP text a fix splices in, plus the guard
//! that re-parses each fragment in isolation before it may touch the
//! document. A fix that would produce unparseable code must abort, not
//! write.

use bumpalo::Bump;
use mago_database::file::FileId;
use mago_span::HasSpan;
use mago_syntax::ast::*;
use mago_syntax::parser::parse_file_content;

use crate::classify::span_text;
use crate::edit::{Edit, EditGroup};
use crate::problem::FragmentCategory;

/// A validated batch of edits ready for mutation, carrying its fix title
#[derive(Debug, Clone)]
pub struct ReplacementPlan {
    pub title: String,
    pub edits: Vec<Edit>,
}

impl ReplacementPlan {
    pub fn new(title: impl Into<String>, edits: Vec<Edit>) -> Self {
        Self {
            title: title.into(),
            edits,
        }
    }

    pub fn into_edit_group(self) -> EditGroup {
        EditGroup::new(self.title, self.edits)
    }
}

/// Check if an expression needs parentheses when embedded as an operand
pub fn needs_parentheses(expr: &Expression<'_>) -> bool {
    matches!(
        expr,
        Expression::Binary(_)
            | Expression::Conditional(_)
            | Expression::Assignment(_)
            | Expression::UnaryPrefix(_)
    )
}

/// Render an expression as operand text, wrapping it when precedence
/// would otherwise change its meaning
pub fn operand_text(expr: &Expression<'_>, source: &str) -> String {
    let text = span_text(source, expr.span());
    if needs_parentheses(expr) {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

/// Render items as a short-syntax array literal
pub fn render_array(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// Render a comparison of a subject against `null`.
///
/// `yoda` puts the `null` operand first, matching codebases that prefer
/// constant-first comparisons.
pub fn render_null_comparison(subject: &str, equal: bool, yoda: bool) -> String {
    let operator = if equal { "===" } else { "!==" };
    if yoda {
        format!("null {} {}", operator, subject)
    } else {
        format!("{} {} null", subject, operator)
    }
}

/// Check that a fragment parses as a standalone expression
pub fn validate_expression(fragment: &str) -> bool {
    // Parenthesized so array and closure fragments stay expressions
    parses_cleanly(&format!("<?php ({});", fragment))
}

/// Check that a fragment parses as a standalone statement
pub fn validate_statement(fragment: &str) -> bool {
    parses_cleanly(&format!("<?php {}", fragment))
}

/// Validate a fragment according to its category.
///
/// Raw fragments are trusted: they cover sub-token rewrites and open-tag
/// spanning rewrites that cannot be parsed out of context. An empty
/// statement fragment is a deletion and is always fine.
pub fn validate_fragment(fragment: &str, category: FragmentCategory) -> bool {
    match category {
        FragmentCategory::Expression => validate_expression(fragment),
        FragmentCategory::Statement => {
            fragment.trim().is_empty() || validate_statement(fragment)
        }
        FragmentCategory::Raw => true,
    }
}

fn parses_cleanly(code: &str) -> bool {
    let arena = Bump::new();
    let file_id = FileId::zero();
    let (_, error) = parse_file_content(&arena, file_id, code);
    error.is_none()
}
