//! Inspection: scope-introspection functions invoked dynamically
//!
//! Since PHP 7.1, calling compact(), extract(), func_get_args() and the
//! rest of the scope-introspection family through a variable or a
//! callback string emits a runtime warning and misbehaves, because the
//! callee no longer sees the calling scope.
//!
//! Example: `$fn = 'compact'; $fn('a');` → flagged

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, function_name};
use lupa_core::{discover, PhpValue, Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE_PATTERN: &str = "Emits a runtime warning (cannot call %s() dynamically).";

/// Check a parsed PHP program for dynamic calls to scope-introspection
/// functions
pub fn check_dynamic_scope_introspection<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    if config.target_php_version() < PhpVersion::Php71 {
        return Vec::new();
    }

    let mut visitor = DynamicScopeVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

/// Functions that read the calling scope and break when invoked
/// indirectly
fn is_scope_introspection(name: &str) -> bool {
    matches!(
        name,
        "compact"
            | "extract"
            | "func_get_arg"
            | "func_get_args"
            | "func_num_args"
            | "get_defined_vars"
            | "mb_parse_str"
            | "parse_str"
    )
}

/// Argument position holding the callback, for functions that take one
fn callback_position(name: &str) -> Option<usize> {
    match name {
        "call_user_func" | "call_user_func_array" | "array_map" => Some(0),
        "array_filter" | "array_reduce" | "array_walk" | "array_walk_recursive" => Some(1),
        _ => None,
    }
}

struct DynamicScopeVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for DynamicScopeVisitor<'s> {
    fn visit_statement_sequence(&mut self, statements: &[&Statement<'a>], source: &str) {
        for (index, stmt) in statements.iter().enumerate() {
            let mut finder = CallFinder {
                source: self.source,
                preceding: &statements[..index],
                problems: &mut self.problems,
            };
            finder.traverse_statement(stmt, source);
        }
    }
}

/// Scans one statement for calls, with the statements before it
/// available for resolving callback variables. Nested statement lists
/// get their own finder from the sequence hook.
struct CallFinder<'a, 'b, 's> {
    source: &'s str,
    preceding: &'b [&'b Statement<'a>],
    problems: &'b mut Vec<Problem>,
}

impl<'a, 'b, 's> Visitor<'a> for CallFinder<'a, 'b, 's> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            self.check_call(func_call);
        }
        true
    }

    fn traverse_sequence(&mut self, _statements: &[&Statement<'a>], _source: &str) {}
}

impl<'a, 'b, 's> CallFinder<'a, 'b, 's> {
    fn check_call(&mut self, func_call: &FunctionCall<'a>) {
        match function_name(func_call, self.source) {
            // Not a plain named call: the callee expression itself may
            // resolve to a function name string
            None => self.check_target(&func_call.function),
            Some(name) => {
                if let Some(position) = callback_position(&name.to_ascii_lowercase()) {
                    let arguments = argument_values(&func_call.argument_list);
                    if let Some(argument) = arguments.get(position) {
                        self.check_target(argument);
                    }
                }
            }
        }
    }

    fn check_target(&mut self, target: &Expression<'a>) {
        let values = discover(target, self.preceding, self.source);
        let Some(PhpValue::Str(resolved)) = values.as_singleton() else {
            return;
        };
        let callback = resolved.strip_prefix('\\').unwrap_or(resolved);
        if is_scope_introspection(callback) {
            self.problems.push(Problem::error(
                "dynamic_scope_introspection",
                MESSAGE_PATTERN.replace("%s", callback),
                target.span(),
            ));
        }
    }
}

use crate::registry::Inspection;

pub struct DynamicScopeIntrospectionInspection;

impl Inspection for DynamicScopeIntrospectionInspection {
    fn name(&self) -> &'static str {
        "dynamic_scope_introspection"
    }

    fn description(&self) -> &'static str {
        "Flag scope-introspection functions invoked through dynamic calls or callbacks"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_dynamic_scope_introspection(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use lupa_core::Severity;
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        check_with(source, &InspectionConfig::default())
    }

    fn check_with(source: &str, config: &InspectionConfig) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_dynamic_scope_introspection(program, source, config)
    }

    // ==================== Reporting Tests ====================

    #[test]
    fn test_variable_call_with_traced_name() {
        let problems = check_php("<?php\n$fn = 'compact';\n$fn('a', 'b');\n");
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "Emits a runtime warning (cannot call compact() dynamically)."
        );
        assert_eq!(problems[0].severity, Severity::Error);
    }

    #[test]
    fn test_string_literal_callee() {
        let problems = check_php("<?php 'extract'($data);");
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "Emits a runtime warning (cannot call extract() dynamically)."
        );
    }

    #[test]
    fn test_call_user_func_callback() {
        let problems = check_php("<?php call_user_func('func_get_args');");
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "Emits a runtime warning (cannot call func_get_args() dynamically)."
        );
    }

    #[test]
    fn test_array_map_callback_position() {
        let problems = check_php("<?php array_map('compact', $rows);");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_array_filter_callback_position() {
        let problems = check_php("<?php array_filter($rows, 'extract');");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_leading_backslash_stripped() {
        let problems = check_php("<?php call_user_func('\\parse_str', $raw);");
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "Emits a runtime warning (cannot call parse_str() dynamically)."
        );
    }

    #[test]
    fn test_callback_variable_traced() {
        let problems = check_php("<?php\n$cb = 'extract';\narray_walk($rows, $cb);\n");
        assert_eq!(problems.len(), 1);
    }

    // ==================== Skip Tests ====================

    #[test]
    fn test_direct_call_is_fine() {
        let problems = check_php("<?php compact('a', 'b');");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_unrelated_callback_is_fine() {
        let problems = check_php("<?php call_user_func('strlen', $value);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_unresolvable_callee_is_fine() {
        let problems = check_php("<?php\n$fn = $config->callback;\n$fn('a');\n");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_ambiguous_callee_is_fine() {
        let problems = check_php("<?php\n$fn = $c ? 'compact' : 'extract';\n$fn('a');\n");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_missing_callback_argument_is_fine() {
        let problems = check_php("<?php array_filter($rows);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_old_target_version_is_fine() {
        let config = InspectionConfig {
            php_version: "7.0".to_string(),
            ..InspectionConfig::default()
        };
        let problems = check_with("<?php\n$fn = 'compact';\n$fn('a');\n", &config);
        assert!(problems.is_empty());
    }
}
