//! Inspection: constructs replaceable with the ?? operator
//!
//! PHP 7.0 introduced null coalescing, which folds the isset/ternary
//! dance into one operator. Ternaries are rewritten in place. If/else
//! constructs collapse whole statements: both branches returning, both
//! branches assigning the same variable, an assignment guarded by a
//! following conditional reassignment, and an if-return followed by a
//! sibling return.
//!
//! Example: `isset($a) ? $a : 'default'` → `$a ?? 'default'`

use mago_span::{HasSpan, Position, Span};
use mago_syntax::ast::*;

use lupa_core::classify::{
    argument_values, is_function_named, span_text, unwrap_parenthesized, variable_name,
};
use lupa_core::equivalence::are_equivalent;
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE_PATTERN: &str = "'%s' can be used instead (reduces cognitive load).";
const TERNARY_FIX_TITLE: &str = "Use null coalescing operator instead";
const STATEMENT_FIX_TITLE: &str = "Replace with null coalescing operator";

/// Check a parsed PHP program for ternaries and if/else constructs
/// replaceable with ??
pub fn check_null_coalescing<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    if config.target_php_version() < PhpVersion::Php70 {
        return Vec::new();
    }

    let mut visitor = NullCoalescingVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct NullCoalescingVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for NullCoalescingVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Conditional(ternary) = expr {
            self.check_ternary(expr, ternary);
        }
        true
    }

    fn visit_statement_sequence(&mut self, statements: &[&Statement<'a>], _source: &str) {
        for (index, statement) in statements.iter().enumerate() {
            if let Statement::If(if_stmt) = statement {
                self.check_if(if_stmt, statements, index);
            }
        }
    }
}

impl<'s> NullCoalescingVisitor<'s> {
    fn check_ternary<'a>(&mut self, expr: &Expression<'a>, ternary: &Conditional<'a>) {
        // The short form `?:` already behaves like coalescing
        let Some(then) = &ternary.then else {
            return;
        };

        let condition = unwrap_parenthesized(&ternary.condition);
        let Some(replacement) = self.coalescing_replacement(condition, then, &ternary.r#else)
        else {
            return;
        };

        let message = MESSAGE_PATTERN.replace("%s", &replacement);
        let fix = Fix::new(
            TERNARY_FIX_TITLE,
            vec![FixEdit::expression(expr.span(), replacement)],
        );
        self.problems
            .push(Problem::warning("null_coalescing", message, expr.span()).with_fix(fix));
    }

    fn check_if<'a>(&mut self, if_stmt: &If<'a>, statements: &[&Statement<'a>], index: usize) {
        let IfBody::Statement(body) = &if_stmt.body else {
            return;
        };
        if body.else_if_clauses.iter().next().is_some() {
            return;
        }
        let Some(branch) = single_branch_statement(body.statement) else {
            return;
        };

        let outcome = if let Some(else_clause) = &body.else_clause {
            self.else_branch_rewrite(if_stmt, branch, else_clause.statement)
        } else {
            self.sibling_rewrite(if_stmt, branch, statements, index)
        };
        let Some((drop_span, replacement)) = outcome else {
            return;
        };

        let message = MESSAGE_PATTERN.replace("%s", &replacement);
        let fix = Fix::new(
            STATEMENT_FIX_TITLE,
            vec![FixEdit::statement(drop_span, format!("{};", replacement))],
        );
        self.problems.push(
            Problem::warning("null_coalescing", message, if_keyword_span(if_stmt)).with_fix(fix),
        );
    }

    /// Both branches return or both assign the same variable; the whole
    /// if/else collapses to one statement
    fn else_branch_rewrite<'a>(
        &self,
        if_stmt: &If<'a>,
        branch: &Statement<'a>,
        else_statement: &Statement<'a>,
    ) -> Option<(Span, String)> {
        let else_branch = single_branch_statement(else_statement)?;
        let condition = unwrap_parenthesized(&if_stmt.condition);

        if let (Some(first), Some(second)) = (return_value(branch), return_value(else_branch)) {
            let coalescing = self.coalescing_replacement(condition, first, second)?;
            return Some((if_stmt.span(), format!("return {}", coalescing)));
        }

        let (if_target, if_value) = assignment_parts(branch, self.source)?;
        let (else_target, else_value) = assignment_parts(else_branch, self.source)?;
        if !are_equivalent(if_target, else_target, self.source) {
            return None;
        }
        let coalescing = self.coalescing_replacement(condition, if_value, else_value)?;
        let target_text = span_text(self.source, if_target.span());
        Some((if_stmt.span(), format!("{} = {}", target_text, coalescing)))
    }

    /// No else branch: pair the if body with the statement before
    /// (assignment being overridden) or after (fallthrough return)
    fn sibling_rewrite<'a>(
        &self,
        if_stmt: &If<'a>,
        branch: &Statement<'a>,
        statements: &[&Statement<'a>],
        index: usize,
    ) -> Option<(Span, String)> {
        let condition = unwrap_parenthesized(&if_stmt.condition);

        if let Some((if_target, if_value)) = assignment_parts(branch, self.source) {
            let previous_statement = *statements.get(index.checked_sub(1)?)?;
            let (previous_target, previous_value) = assignment_parts(previous_statement, self.source)?;
            if !are_equivalent(if_target, previous_target, self.source) {
                return None;
            }
            if is_reference_value(previous_value) {
                return None;
            }
            if matches!(previous_value, Expression::Assignment(_)) {
                return None;
            }
            let coalescing = self.coalescing_replacement(condition, if_value, previous_value)?;
            let drop_span = span_between(previous_statement.span(), if_stmt.span());
            let target_text = span_text(self.source, if_target.span());
            return Some((drop_span, format!("{} = {}", target_text, coalescing)));
        }

        let first = return_value(branch)?;
        let next_statement = *statements.get(index + 1)?;
        let second = return_value(next_statement)?;
        let coalescing = self.coalescing_replacement(condition, first, second)?;
        let drop_span = span_between(if_stmt.span(), next_statement.span());
        Some((drop_span, format!("return {}", coalescing)))
    }

    /// Build `candidate ?? alternative` out of the checked condition and
    /// the two branch values, or nothing if the pieces do not line up
    fn coalescing_replacement<'a>(
        &self,
        condition: &Expression<'a>,
        first: &Expression<'a>,
        second: &Expression<'a>,
    ) -> Option<String> {
        let (target, negated) = match condition {
            Expression::UnaryPrefix(unary)
                if matches!(unary.operator, UnaryPrefixOperator::Not(_)) =>
            {
                (unwrap_parenthesized(&unary.operand), true)
            }
            other => (other, false),
        };

        match target {
            Expression::Construct(Construct::Isset(isset)) => {
                let mut subjects = isset.values.iter();
                let subject = subjects.next()?;
                if subjects.next().is_some() {
                    return None;
                }
                let expects_to_be_set = !negated;
                let (candidate, alternative) = if expects_to_be_set {
                    (first, second)
                } else {
                    (second, first)
                };
                if !are_equivalent(candidate, subject, self.source) {
                    return None;
                }
                Some(self.render_coalescing(candidate, alternative))
            }
            Expression::Binary(binary) => {
                let identical = match binary.operator {
                    BinaryOperator::Identical(_) => true,
                    BinaryOperator::NotIdentical(_) => false,
                    _ => return None,
                };
                let subject = if is_null_literal(&binary.rhs) {
                    &binary.lhs
                } else if is_null_literal(&binary.lhs) {
                    &binary.rhs
                } else {
                    return None;
                };
                let expects_to_be_set = (!identical && !negated) || (identical && negated);
                let (candidate, alternative) = if expects_to_be_set {
                    (first, second)
                } else {
                    (second, first)
                };
                if !are_equivalent(candidate, subject, self.source) {
                    return None;
                }
                Some(self.render_coalescing(candidate, alternative))
            }
            Expression::Call(Call::Function(func_call)) => {
                if !is_function_named(func_call, self.source, "array_key_exists") {
                    return None;
                }
                let arguments = argument_values(&func_call.argument_list);
                if arguments.len() != 2 {
                    return None;
                }
                let expects_to_be_set = !negated;
                let (candidate, alternative) = if expects_to_be_set {
                    (first, second)
                } else {
                    (second, first)
                };
                let Expression::ArrayAccess(access) = candidate else {
                    return None;
                };
                if !is_null_literal(alternative) {
                    return None;
                }
                if !are_equivalent(&access.array, arguments[1], self.source) {
                    return None;
                }
                if !are_equivalent(&access.index, arguments[0], self.source) {
                    return None;
                }
                Some(self.render_coalescing(candidate, alternative))
            }
            _ => None,
        }
    }

    fn render_coalescing<'a>(
        &self,
        candidate: &Expression<'a>,
        alternative: &Expression<'a>,
    ) -> String {
        format!(
            "{} ?? {}",
            span_text(self.source, candidate.span()),
            span_text(self.source, alternative.span())
        )
    }
}

/// The only statement of a braced or bare branch
fn single_branch_statement<'a>(statement: &'a Statement<'a>) -> Option<&'a Statement<'a>> {
    match statement {
        Statement::Block(block) => {
            let statements = block.statements.as_slice();
            if statements.len() == 1 {
                Some(&statements[0])
            } else {
                None
            }
        }
        other => Some(other),
    }
}

fn return_value<'a>(statement: &'a Statement<'a>) -> Option<&'a Expression<'a>> {
    let Statement::Return(ret) = statement else {
        return None;
    };
    match &ret.value {
        Some(value) => Some(value),
        None => None,
    }
}

/// Target and value of a plain `$variable = ...;` statement
fn assignment_parts<'a, 'b>(
    statement: &'b Statement<'a>,
    source: &str,
) -> Option<(&'b Expression<'a>, &'b Expression<'a>)> {
    let Statement::Expression(expr_stmt) = statement else {
        return None;
    };
    let Expression::Assignment(assign) = &expr_stmt.expression else {
        return None;
    };
    if !matches!(assign.operator, AssignmentOperator::Assign(_)) {
        return None;
    }
    variable_name(&assign.lhs, source)?;
    Some((&assign.lhs, &assign.rhs))
}

fn is_null_literal(expr: &Expression<'_>) -> bool {
    matches!(expr, Expression::Literal(Literal::Null(_)))
}

fn is_reference_value(expr: &Expression<'_>) -> bool {
    matches!(expr, Expression::UnaryPrefix(unary)
        if matches!(unary.operator, UnaryPrefixOperator::Reference(_)))
}

fn if_keyword_span(if_stmt: &If<'_>) -> Span {
    let span = if_stmt.span();
    Span::new(
        span.file_id,
        span.start,
        Position::new(span.start.offset + 2),
    )
}

fn span_between(from: Span, to: Span) -> Span {
    Span::new(from.file_id, from.start, to.end)
}

use crate::registry::Inspection;

pub struct NullCoalescingInspection;

impl Inspection for NullCoalescingInspection {
    fn name(&self) -> &'static str {
        "null_coalescing"
    }

    fn description(&self) -> &'static str {
        "Collapse isset/null-check ternaries and ifs into ??"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_null_coalescing(program, source, config)
    }
}
