//! Inspection: ksort() before http_build_query() without SORT_STRING
//!
//! ksort() falls back to SORT_REGULAR, which orders numeric-string keys
//! numerically. http_build_query() output then depends on whether keys
//! happen to look like numbers. Sorting with SORT_STRING makes the query
//! string stable.
//!
//! Example: `ksort($params); return http_build_query($params);` wants
//! `ksort($params, SORT_STRING);`

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, is_function_named, span_text};
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_PATTERN: &str =
    "'%s' should be used instead, so http_build_query() produces result independent from key types.";
const FIX_TITLE: &str = "Add SORT_STRING as an argument";

/// Check a parsed PHP program for ksort()/http_build_query() pairs
pub fn check_inconsistent_query_build<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = QueryBuildVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct QueryBuildVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for QueryBuildVisitor<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Function(func) = stmt {
            let body: Vec<&Statement<'a>> = func.body.statements.iter().collect();
            self.scan_scope(&body);
        }
        true
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Closure(closure) = expr {
            let body: Vec<&Statement<'a>> = closure.body.statements.iter().collect();
            self.scan_scope(&body);
        }
        true
    }

    fn traverse_class_like_member(&mut self, member: &ClassLikeMember<'a>, source: &str) {
        if let ClassLikeMember::Method(method) = member {
            if let MethodBody::Concrete(body) = &method.body {
                let inner: Vec<&Statement<'a>> = body.statements.iter().collect();
                self.scan_scope(&inner);
                self.traverse_sequence(&inner, source);
            }
        }
    }
}

impl<'s> QueryBuildVisitor<'s> {
    /// One function-like body. Sort calls belong to their nearest scope, but
    /// the query call may sit anywhere below it, including inner closures.
    fn scan_scope<'a>(&mut self, statements: &[&Statement<'a>]) {
        let mut sorts = KsortFinder {
            source: self.source,
            calls: Vec::new(),
        };
        for statement in statements {
            sorts.traverse_statement(statement, self.source);
        }
        if sorts.calls.is_empty() {
            return;
        }

        let mut queries = QueryArgumentFinder {
            source: self.source,
            argument_spans: Vec::new(),
        };
        for statement in statements {
            queries.traverse_statement(statement, self.source);
        }
        if queries.argument_spans.is_empty() {
            return;
        }

        for (call_span, argument_span) in sorts.calls {
            let argument_text = span_text(self.source, argument_span);
            let matched = queries
                .argument_spans
                .iter()
                .any(|candidate| texts_match(argument_text, span_text(self.source, *candidate)));
            if matched {
                let replacement = format!("ksort({}, SORT_STRING)", argument_text);
                let message = MESSAGE_PATTERN.replace("%s", &replacement);
                let fix = Fix::new(
                    FIX_TITLE,
                    vec![FixEdit::expression(call_span, replacement)],
                );
                self.problems.push(
                    Problem::warning("inconsistent_query_build", message, call_span).with_fix(fix),
                );
            }
        }
    }
}

/// Sorting and building typically share a plain variable, so arguments are
/// matched by whitespace-insensitive text.
fn texts_match(a: &str, b: &str) -> bool {
    let strip = |text: &str| {
        text.chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>()
    };
    strip(a) == strip(b)
}

/// Collects single-argument ksort() calls, stopping at nested scopes.
struct KsortFinder<'s> {
    source: &'s str,
    calls: Vec<(Span, Span)>,
}

impl<'a, 's> Visitor<'a> for KsortFinder<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        !matches!(
            stmt,
            Statement::Function(_) | Statement::Class(_) | Statement::Trait(_)
        )
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if matches!(expr, Expression::Closure(_) | Expression::ArrowFunction(_)) {
            return false;
        }
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "ksort") {
                let arguments = argument_values(&func_call.argument_list);
                if arguments.len() == 1 {
                    self.calls.push((func_call.span(), arguments[0].span()));
                }
            }
        }
        true
    }
}

/// Collects the first argument of every http_build_query() call below the
/// scope, nested closures included.
struct QueryArgumentFinder<'s> {
    source: &'s str,
    argument_spans: Vec<Span>,
}

impl<'a, 's> Visitor<'a> for QueryArgumentFinder<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "http_build_query") {
                let arguments = argument_values(&func_call.argument_list);
                if !arguments.is_empty() {
                    self.argument_spans.push(arguments[0].span());
                }
            }
        }
        true
    }
}

use crate::registry::Inspection;

pub struct InconsistentQueryBuildInspection;

impl Inspection for InconsistentQueryBuildInspection {
    fn name(&self) -> &'static str {
        "inconsistent_query_build"
    }

    fn description(&self) -> &'static str {
        "Sort with SORT_STRING when the array feeds http_build_query()"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_inconsistent_query_build(program, source, config)
    }
}
