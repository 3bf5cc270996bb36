//! Inspection: assignments that can use compound operators
//!
//! `$x = $x + $y` carries the assigned variable twice. When the value
//! is a binary chain whose leftmost operand is the assigned variable
//! itself, the compound form says the same thing shorter. Chains with
//! more than one trailing operand are only collapsed for operators
//! where regrouping is safe; `$x = $x - $a - $b` is left alone since
//! `$x -= $a - $b` would regroup the subtraction.
//!
//! Example: `$x = $x + 1` → `$x += 1`

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{span_text, unwrap_parenthesized};
use lupa_core::equivalence::{are_equivalent, operator_symbol};
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_PATTERN: &str = "Can be safely refactored as '%s'.";
const FIX_TITLE: &str = "Use the short notation";

/// Check a parsed PHP program for assignments with a compound form
pub fn check_op_assign_short_syntax<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = OpAssignVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

/// Operators with a compound assignment spelling
fn has_compound_form(symbol: &str) -> bool {
    matches!(
        symbol,
        "+" | "-" | "*" | "/" | "%" | "." | "&" | "|" | "^" | "<<" | ">>"
    )
}

/// Operators where `$x op= $a op $b` regroups without changing the result
fn collapses_safely(symbol: &str) -> bool {
    matches!(symbol, "+" | "*" | "." | "&" | "|" | "^")
}

struct OpAssignVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for OpAssignVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Assignment(assign) = expr {
            if let Some(problem) = self.try_report(expr, assign) {
                self.problems.push(problem);
            }
        }
        true
    }
}

impl<'s> OpAssignVisitor<'s> {
    fn try_report<'a>(&self, expr: &Expression<'a>, assign: &Assignment<'a>) -> Option<Problem> {
        if !matches!(assign.operator, AssignmentOperator::Assign(_)) {
            return None;
        }

        let Expression::Binary(binary) = unwrap_parenthesized(&assign.rhs) else {
            return None;
        };

        let symbol = operator_symbol(&binary.operator);
        if !has_compound_form(symbol) {
            return None;
        }

        // Walk the left spine of the chain, collecting trailing operands
        let mut fragments: Vec<&Expression<'a>> = vec![&binary.rhs];
        let mut candidate: &Expression<'a> = &binary.lhs;
        while let Expression::Binary(current) = candidate {
            if operator_symbol(&current.operator) != symbol {
                break;
            }
            fragments.push(&current.rhs);
            candidate = &current.lhs;
        }

        if !are_equivalent(candidate, &assign.lhs, self.source) {
            return None;
        }

        // Collection walked right to left, flip back to source order
        fragments.reverse();
        if fragments.len() > 1 && !collapses_safely(symbol) {
            return None;
        }

        let separator = format!(" {} ", symbol);
        let tail = fragments
            .iter()
            .map(|fragment| span_text(self.source, fragment.span()))
            .collect::<Vec<_>>()
            .join(&separator);
        let replacement = format!(
            "{} {}= {}",
            span_text(self.source, candidate.span()),
            symbol,
            tail
        );

        let message = MESSAGE_PATTERN.replace("%s", &replacement);
        let fix = Fix::new(FIX_TITLE, vec![FixEdit::expression(expr.span(), replacement)]);
        Some(Problem::warning("op_assign_short_syntax", message, expr.span()).with_fix(fix))
    }
}

use crate::registry::Inspection;

pub struct OpAssignShortSyntaxInspection;

impl Inspection for OpAssignShortSyntaxInspection {
    fn name(&self) -> &'static str {
        "op_assign_short_syntax"
    }

    fn description(&self) -> &'static str {
        "Convert $x = $x op y to $x op= y"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_op_assign_short_syntax(program, source, config)
    }
}
