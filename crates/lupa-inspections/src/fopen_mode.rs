//! Inspection: fopen() mode strings that are not binary-safe
//!
//! Without the 'b' flag the runtime may translate line endings on
//! platforms where text mode differs, corrupting binary payloads. The
//! documentation recommends always passing 'b', as the last flag before
//! an optional '+'. The windows-only 't' flag gets replaced outright.
//!
//! Example: `fopen($path, 'w+')` → `fopen($path, 'wb+')`

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, is_function_named, string_literal_value};
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_MISPLACED: &str = "The 'b' modifier needs to be the last one (e.g 'wb', 'wb+').";
const MESSAGE_MISSING: &str =
    "The mode is not binary-safe ('b' is missing, as documentation recommends).";
const MESSAGE_REPLACE_T: &str =
    "The mode is not binary-safe (replace 't' with 'b', as documentation recommends).";
const FIX_TITLE: &str = "Make mode binary-safe";

/// Check a parsed PHP program for fopen() calls with unsafe mode strings
pub fn check_fopen_mode<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = FopenModeVisitor {
        source,
        enforce_binary_flag: config.enforce_binary_mode_flag,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct FopenModeVisitor<'s> {
    source: &'s str,
    enforce_binary_flag: bool,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for FopenModeVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "fopen") {
                self.check_call(func_call);
            }
        }
        true
    }
}

impl<'s> FopenModeVisitor<'s> {
    fn check_call<'a>(&mut self, func_call: &FunctionCall<'a>) {
        let arguments = argument_values(&func_call.argument_list);
        if arguments.len() < 2 {
            return;
        }

        let mode_expr = arguments[1];
        let Some(mode) = string_literal_value(mode_expr, self.source) else {
            return;
        };
        if mode.is_empty() {
            return;
        }

        let corrected = binary_safe_mode(&mode);
        let fix = Fix::new(
            FIX_TITLE,
            vec![FixEdit::expression(
                mode_expr.span(),
                format!("'{}'", corrected),
            )],
        );

        if mode.contains('b') {
            if mode != corrected {
                self.problems.push(
                    Problem::error("fopen_mode", MESSAGE_MISPLACED, mode_expr.span())
                        .with_fix(fix),
                );
            }
        } else if mode.contains('t') {
            if self.enforce_binary_flag {
                self.problems.push(
                    Problem::warning("fopen_mode", MESSAGE_REPLACE_T, mode_expr.span())
                        .with_fix(fix),
                );
            }
        } else if self.enforce_binary_flag {
            self.problems.push(
                Problem::warning("fopen_mode", MESSAGE_MISSING, mode_expr.span()).with_fix(fix),
            );
        }
    }
}

/// Rewrite a mode string so the binary flag sits in its documented spot.
///
/// Strips any existing 'b', turns 't' into 'b', then injects 'b' before
/// the '+' or appends it at the end.
fn binary_safe_mode(mode: &str) -> String {
    let mut flags = mode.replace('b', "");

    if flags.contains('t') {
        flags = flags.replace('t', "b");
    }

    if !flags.contains('b') {
        if flags.contains('+') {
            flags = flags.replace('+', "b+");
        } else {
            flags.push('b');
        }
    }

    flags
}

use crate::registry::Inspection;

pub struct FopenModeInspection;

impl Inspection for FopenModeInspection {
    fn name(&self) -> &'static str {
        "fopen_mode"
    }

    fn description(&self) -> &'static str {
        "Enforce binary-safe and well-formed fopen() mode strings"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_fopen_mode(program, source, config)
    }
}
