//! Inspection: legacy random API calls
//!
//! `rand()`, `srand()` and `getrandmax()` delegate to the platform's
//! libc generator. The mt_* family is faster and better distributed,
//! and PHP 7 adds the CSPRNG-backed `random_int()`. This inspection
//! recommends the strongest replacement the target PHP version allows.
//!
//! Example: `rand(1, 10)` → `random_int(1, 10)` on PHP 7+

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::{function_name, span_text};
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE_PATTERN: &str =
    "'%s(...)' has recommended replacement '%s(...)', consider migrating.";
const FIX_TITLE: &str = "Use the recommended function";

/// Check a parsed PHP program for legacy random API calls
pub fn check_random_api_migration<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    let suggest_random_int = config.suggest_random_int_migration
        && config.target_php_version() >= PhpVersion::Php70;

    let mut visitor = RandomApiVisitor {
        source,
        suggest_random_int,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

/// Replacements available everywhere
fn mt_mapping(name: &str) -> Option<&'static str> {
    match name {
        "srand" => Some("mt_srand"),
        "getrandmax" => Some("mt_getrandmax"),
        "rand" => Some("mt_rand"),
        _ => None,
    }
}

/// Replacements when random_int() is available
fn edge_mapping(name: &str) -> Option<&'static str> {
    match name {
        "srand" => Some("mt_srand"),
        "getrandmax" => Some("mt_getrandmax"),
        "rand" | "mt_rand" => Some("random_int"),
        _ => None,
    }
}

struct RandomApiVisitor<'s> {
    source: &'s str,
    suggest_random_int: bool,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for RandomApiVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            if let Some(problem) = self.try_report_call(expr.span(), func_call) {
                self.problems.push(problem);
            }
        }
        true
    }
}

impl<'s> RandomApiVisitor<'s> {
    fn try_report_call<'a>(
        &self,
        call_span: Span,
        func_call: &FunctionCall<'a>,
    ) -> Option<Problem> {
        let written_name = function_name(func_call, self.source)?;
        let lookup = written_name.to_ascii_lowercase();

        let mut suggestion = if self.suggest_random_int {
            edge_mapping(&lookup)?
        } else {
            mt_mapping(&lookup)?
        };

        // random_int() always takes two parameters
        if suggestion == "random_int" && func_call.argument_list.arguments.len() != 2 {
            if lookup == "rand" {
                suggestion = "mt_rand";
            } else {
                return None;
            }
        }

        let message = MESSAGE_PATTERN
            .replacen("%s", written_name, 1)
            .replacen("%s", suggestion, 1);

        let fix = self.rename_fix(func_call, suggestion)?;
        Some(Problem::warning("random_api_migration", message, call_span).with_fix(fix))
    }

    /// Rename the callee, preserving a fully-qualified prefix
    fn rename_fix<'a>(&self, func_call: &FunctionCall<'a>, suggestion: &str) -> Option<Fix> {
        if let Expression::Identifier(ident) = func_call.function {
            let ident_span = ident.span();
            let written = span_text(self.source, ident_span);
            let replacement = if written.starts_with('\\') {
                format!("\\{}", suggestion)
            } else {
                suggestion.to_string()
            };
            Some(Fix::new(
                FIX_TITLE,
                vec![FixEdit::expression(ident_span, replacement)],
            ))
        } else {
            None
        }
    }
}

use crate::registry::Inspection;

pub struct RandomApiMigrationInspection;

impl Inspection for RandomApiMigrationInspection {
    fn name(&self) -> &'static str {
        "random_api_migration"
    }

    fn description(&self) -> &'static str {
        "Migrate rand()/srand()/getrandmax() to the mt_/random_int APIs"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_random_api_migration(program, source, config)
    }
}
