//! Inspection: ob_get_contents() followed by ob_end_clean()
//!
//! Reading the output buffer and discarding it right after is what
//! ob_get_clean() does in one call. The capture call gets renamed and the
//! cleanup statement goes away.
//!
//! Example: `$html = ob_get_contents(); ob_end_clean();` becomes
//! `$html = ob_get_clean();`

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::{is_function_named, span_text};
use lupa_core::{statement_deletion_span, Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE: &str = "'ob_get_clean()' can be used instead.";
const FIX_TITLE: &str = "Use 'ob_get_clean()' instead";

/// Check a parsed PHP program for ob_get_contents()/ob_end_clean() pairs
pub fn check_ob_get_clean<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = ObGetCleanVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct ObGetCleanVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for ObGetCleanVisitor<'s> {
    fn visit_statement_sequence(&mut self, statements: &[&Statement<'a>], _source: &str) {
        for index in 1..statements.len() {
            self.check_pair(statements[index], statements[index - 1]);
        }
    }
}

impl<'s> ObGetCleanVisitor<'s> {
    fn check_pair<'a>(&mut self, statement: &Statement<'a>, previous: &Statement<'a>) {
        // The cleanup call must be a statement of its own, otherwise its
        // return value is in use and the statement cannot be dropped.
        let Statement::Expression(expr_stmt) = statement else {
            return;
        };
        let Expression::Call(Call::Function(func_call)) = &expr_stmt.expression else {
            return;
        };
        if !is_function_named(func_call, self.source, "ob_end_clean") {
            return;
        }

        let mut finder = CaptureCallFinder {
            source: self.source,
            found: None,
        };
        finder.traverse_statement(previous, self.source);
        let Some((call_span, callee_span)) = finder.found else {
            return;
        };

        let renamed = if span_text(self.source, callee_span).starts_with('\\') {
            "\\ob_get_clean".to_string()
        } else {
            "ob_get_clean".to_string()
        };
        let fix = Fix::new(
            FIX_TITLE,
            vec![
                FixEdit::raw(callee_span, renamed),
                FixEdit::statement(
                    statement_deletion_span(self.source, statement.span()),
                    String::new(),
                ),
            ],
        );
        self.problems
            .push(Problem::warning("ob_get_clean", MESSAGE, call_span).with_fix(fix));
    }
}

/// Finds the first plain ob_get_contents() call anywhere in a statement.
struct CaptureCallFinder<'s> {
    source: &'s str,
    found: Option<(Span, Span)>,
}

impl<'a, 's> Visitor<'a> for CaptureCallFinder<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if self.found.is_some() {
            return false;
        }
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "ob_get_contents") {
                self.found = Some((func_call.span(), func_call.function.span()));
                return false;
            }
        }
        true
    }
}

use crate::registry::Inspection;

pub struct ObGetCleanInspection;

impl Inspection for ObGetCleanInspection {
    fn name(&self) -> &'static str {
        "ob_get_clean"
    }

    fn description(&self) -> &'static str {
        "Collapse ob_get_contents() plus ob_end_clean() into ob_get_clean()"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_ob_get_clean(program, source, config)
    }
}
