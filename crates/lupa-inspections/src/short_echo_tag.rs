//! Inspection: echo statements that span a whole PHP block
//!
//! A block containing nothing but one echo is template output, and the
//! dedicated echo tag says so in less syntax.
//!
//! Example: `<html><?php echo $title; ?></html>` becomes
//! `<html><?= $title; ?></html>`

use mago_span::{HasSpan, Position, Span};
use mago_syntax::ast::*;

use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE: &str = "'<?= ... ?>' could be used instead (but ensure that short_open_tag is enabled).";
const FIX_TITLE: &str = "Use '<?= ... ?>' instead";

const OPENING_TAG: &[u8] = b"<?php";
const ECHO_KEYWORD_LEN: usize = 4;

/// Check a parsed PHP program for echo statements alone in their tags
pub fn check_short_echo_tag<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = ShortEchoTagVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct ShortEchoTagVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for ShortEchoTagVisitor<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Echo(echo) = stmt {
            self.check_echo(echo.span());
        }
        true
    }
}

impl<'s> ShortEchoTagVisitor<'s> {
    fn check_echo(&mut self, span: Span) {
        let Some(tag_span) = self.opening_tag_span(span) else {
            return;
        };
        let after = &self.source[span.end.offset as usize..];
        if !after.trim_start().starts_with("?>") {
            return;
        }

        let keyword_span = Span::new(
            span.file_id,
            span.start,
            Position::new(span.start.offset + ECHO_KEYWORD_LEN as u32),
        );
        let fix = Fix::new(
            FIX_TITLE,
            vec![
                FixEdit::raw(tag_span, "<?=".to_string()),
                FixEdit::raw(self.keyword_deletion_span(span), String::new()),
            ],
        );
        self.problems
            .push(Problem::warning("short_echo_tag", MESSAGE, keyword_span).with_fix(fix));
    }

    /// The full opening tag directly before the echo, with only whitespace
    /// in between.
    fn opening_tag_span(&self, span: Span) -> Option<Span> {
        let head = self.source[..span.start.offset as usize].trim_end();
        let bytes = head.as_bytes();
        if bytes.len() < OPENING_TAG.len() {
            return None;
        }
        let tag_start = bytes.len() - OPENING_TAG.len();
        if !bytes[tag_start..].eq_ignore_ascii_case(OPENING_TAG) {
            return None;
        }
        Some(Span::new(
            span.file_id,
            Position::new(tag_start as u32),
            Position::new(bytes.len() as u32),
        ))
    }

    /// The echo keyword plus the whitespace run after it.
    fn keyword_deletion_span(&self, span: Span) -> Span {
        let bytes = self.source.as_bytes();
        let mut end = span.start.offset as usize + ECHO_KEYWORD_LEN;
        while end < bytes.len() && (bytes[end] as char).is_ascii_whitespace() {
            end += 1;
        }
        Span::new(span.file_id, span.start, Position::new(end as u32))
    }
}

use crate::registry::Inspection;

pub struct ShortEchoTagInspection;

impl Inspection for ShortEchoTagInspection {
    fn name(&self) -> &'static str {
        "short_echo_tag"
    }

    fn description(&self) -> &'static str {
        "Use the short echo tag for blocks that only echo a value"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_short_echo_tag(program, source, config)
    }
}
