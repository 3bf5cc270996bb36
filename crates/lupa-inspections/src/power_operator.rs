//! Inspection: pow() calls that can use the ** operator
//!
//! The ** exponentiation operator was introduced in PHP 5.6 and reads
//! better than the function call. Operands that are themselves compound
//! expressions get wrapped in parentheses, and so does the whole
//! replacement when the call sits inside a binary expression, since **
//! binds tighter than most operators.
//!
//! Example: `pow($x, $n + 1)` → `$x ** ($n + 1)`

use std::collections::HashSet;

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, is_function_named, span_text};
use lupa_core::synthesis::needs_parentheses;
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE_PATTERN: &str = "'%s' can be used instead";
const FIX_TITLE: &str = "Use ** operator instead";

/// Check a parsed PHP program for pow() calls replaceable with **
pub fn check_power_operator<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    if config.target_php_version() < PhpVersion::Php56 {
        return Vec::new();
    }

    let mut visitor = PowerOperatorVisitor {
        source,
        binary_operands: HashSet::new(),
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct PowerOperatorVisitor<'s> {
    source: &'s str,
    /// Spans of expressions that sit directly under a binary operator
    binary_operands: HashSet<(u32, u32)>,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for PowerOperatorVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Binary(binary) = expr {
            self.binary_operands.insert(span_key(binary.lhs.span()));
            self.binary_operands.insert(span_key(binary.rhs.span()));
        }

        if let Expression::Call(Call::Function(func_call)) = expr {
            if let Some(problem) = self.try_report_pow(expr, func_call) {
                self.problems.push(problem);
                return false;
            }
        }
        true
    }
}

impl<'s> PowerOperatorVisitor<'s> {
    fn try_report_pow<'a>(
        &self,
        expr: &Expression<'a>,
        func_call: &FunctionCall<'a>,
    ) -> Option<Problem> {
        if !is_function_named(func_call, self.source, "pow") {
            return None;
        }

        let arguments = argument_values(&func_call.argument_list);
        if arguments.len() != 2 {
            return None;
        }

        let base = arguments[0];
        let exponent = arguments[1];

        let base_text = wrapped_operand(base, self.source);
        let exponent_text = wrapped_operand(exponent, self.source);

        let call_span = expr.span();
        let inside_binary = self.binary_operands.contains(&span_key(call_span));
        let replacement = if inside_binary {
            format!("({} ** {})", base_text, exponent_text)
        } else {
            format!("{} ** {}", base_text, exponent_text)
        };

        let message = MESSAGE_PATTERN.replace("%s", &replacement);
        let fix = Fix::new(FIX_TITLE, vec![FixEdit::expression(call_span, replacement)]);
        Some(Problem::warning("power_operator", message, call_span).with_fix(fix))
    }
}

fn wrapped_operand(expr: &Expression<'_>, source: &str) -> String {
    let text = span_text(source, expr.span());
    if needs_parentheses(expr) {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

fn span_key(span: mago_span::Span) -> (u32, u32) {
    (span.start.offset, span.end.offset)
}

use crate::registry::Inspection;

pub struct PowerOperatorInspection;

impl Inspection for PowerOperatorInspection {
    fn name(&self) -> &'static str {
        "power_operator"
    }

    fn description(&self) -> &'static str {
        "Convert pow($x, $n) to $x ** $n"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_power_operator(program, source, config)
    }
}
