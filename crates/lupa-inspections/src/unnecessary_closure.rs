//! Inspection: closures that merely forward to a named function
//!
//! When a callback passed to array_map() and friends does nothing but
//! call one function on its parameter, the function name itself can be
//! passed instead. Casts in the callback body map onto their function
//! counterparts (intval, floatval, strval, boolval).
//!
//! Example: `array_map(function ($v) { return trim($v); }, $a)`
//! → `array_map('trim', $a)`

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, function_name, span_text, variable_name};
use lupa_core::equivalence::are_equivalent;
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_PATTERN: &str = "The closure can be replaced with %s (reduces cognitive load).";
const FIX_TITLE: &str = "Inline the closure";

/// Check a parsed PHP program for closures replaceable with a function name
pub fn check_unnecessary_closure<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = UnnecessaryClosureVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

/// Functions that take a per-element callback, and the argument
/// position the callback sits at
fn callback_position(name: &str) -> Option<usize> {
    match name {
        "array_filter" => Some(1),
        "array_map" => Some(0),
        "array_walk" => Some(1),
        "array_walk_recursive" => Some(1),
        _ => None,
    }
}

struct UnnecessaryClosureVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for UnnecessaryClosureVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            self.check_call(func_call);
        }
        true
    }
}

impl<'s> UnnecessaryClosureVisitor<'s> {
    fn check_call<'a>(&mut self, func_call: &FunctionCall<'a>) {
        let Some(name) = function_name(func_call, self.source) else {
            return;
        };
        let Some(position) = callback_position(&name.to_ascii_lowercase()) else {
            return;
        };

        let arguments = argument_values(&func_call.argument_list);
        let Some(Expression::Closure(closure)) = arguments.get(position) else {
            return;
        };

        let parameters: Vec<_> = closure.parameter_list.parameters.iter().collect();
        let Some(first_parameter) = parameters.first() else {
            return;
        };

        let statements: Vec<_> = closure.body.statements.iter().collect();
        if statements.len() != 1 {
            return;
        }

        let Some(replacement) = self.body_replacement(statements[0], first_parameter) else {
            return;
        };

        let closure_span = closure.span();
        let message = MESSAGE_PATTERN.replace("%s", &replacement);
        let fix = Fix::new(
            FIX_TITLE,
            vec![FixEdit::expression(closure_span, replacement)],
        );
        self.problems
            .push(Problem::weak("unnecessary_closure", message, closure_span).with_fix(fix));
    }

    /// Quoted function name the closure body boils down to, if any
    fn body_replacement<'a>(
        &self,
        statement: &Statement<'a>,
        parameter: &FunctionLikeParameter<'a>,
    ) -> Option<String> {
        match statement {
            Statement::Return(ret) => {
                let value = ret.value.as_ref()?;
                match value {
                    Expression::Call(Call::Function(inner)) => {
                        if self.can_inline(inner, parameter) {
                            let callee = span_text(self.source, inner.function.span());
                            return Some(format!("'{}'", callee));
                        }
                        None
                    }
                    Expression::UnaryPrefix(unary) => {
                        let counterpart = cast_counterpart(span_text(
                            self.source,
                            unary.operator.span(),
                        ))?;
                        // The cast must apply to the parameter itself,
                        // otherwise the rest of the expression is lost
                        let parameter_name = span_text(self.source, parameter.variable.span());
                        if variable_name(&unary.operand, self.source) == Some(parameter_name) {
                            return Some(format!("'{}'", counterpart));
                        }
                        None
                    }
                    _ => None,
                }
            }
            Statement::Expression(expr_stmt) => {
                // `$x = f($x);` forwards through an assignment
                let Expression::Assignment(assign) = &expr_stmt.expression else {
                    return None;
                };
                if !matches!(assign.operator, AssignmentOperator::Assign(_)) {
                    return None;
                }
                if variable_name(&assign.lhs, self.source).is_none() {
                    return None;
                }
                let Expression::Call(Call::Function(inner)) = &*assign.rhs else {
                    return None;
                };
                if !self.can_inline(inner, parameter) {
                    return None;
                }
                let inner_arguments = argument_values(&inner.argument_list);
                if !are_equivalent(inner_arguments[0], &assign.lhs, self.source) {
                    return None;
                }
                let callee = span_text(self.source, inner.function.span());
                Some(format!("'{}'", callee))
            }
            _ => None,
        }
    }

    /// The inner call forwards the closure parameter untouched: one
    /// argument, the parameter variable itself, no type hint narrowing
    /// what the named function would receive
    fn can_inline<'a>(
        &self,
        inner: &FunctionCall<'a>,
        parameter: &FunctionLikeParameter<'a>,
    ) -> bool {
        if parameter.hint.is_some() {
            return false;
        }
        let arguments = argument_values(&inner.argument_list);
        if arguments.len() != 1 {
            return false;
        }
        let parameter_name = span_text(self.source, parameter.variable.span());
        variable_name(arguments[0], self.source) == Some(parameter_name)
    }
}

/// Map a cast operator spelling onto its function counterpart
fn cast_counterpart(operator_text: &str) -> Option<&'static str> {
    let spelling = operator_text
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
        .to_ascii_lowercase();
    match spelling.as_str() {
        "int" | "integer" => Some("intval"),
        "float" | "double" | "real" => Some("floatval"),
        "string" => Some("strval"),
        "bool" | "boolean" => Some("boolval"),
        _ => None,
    }
}

use crate::registry::Inspection;

pub struct UnnecessaryClosureInspection;

impl Inspection for UnnecessaryClosureInspection {
    fn name(&self) -> &'static str {
        "unnecessary_closure"
    }

    fn description(&self) -> &'static str {
        "Replace trivial forwarding closures with the function name"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_unnecessary_closure(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use lupa_core::{Document, FixOutcome, Severity};
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_unnecessary_closure(program, source, &InspectionConfig::default())
    }

    fn transform(source: &str) -> String {
        let problems = check_php(source);
        let mut document = Document::new(source);
        let offers: Vec<_> = problems
            .iter()
            .filter_map(|p| p.fix.as_ref())
            .map(|fix| document.offer(fix))
            .collect();
        for offered in &offers {
            assert!(matches!(document.apply(offered), FixOutcome::Applied));
        }
        document.text().to_string()
    }

    // ==================== Return Forwarding Tests ====================

    #[test]
    fn test_array_map_forwarding_closure() {
        let source = "<?php array_map(function ($v) { return trim($v); }, $values);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "The closure can be replaced with 'trim' (reduces cognitive load)."
        );
        assert_eq!(problems[0].severity, Severity::WeakWarning);
        assert_eq!(transform(source), "<?php array_map('trim', $values);");
    }

    #[test]
    fn test_array_filter_callback_in_second_position() {
        let source = "<?php array_filter($values, function ($v) { return is_numeric($v); });";
        assert_eq!(
            transform(source),
            "<?php array_filter($values, 'is_numeric');"
        );
    }

    #[test]
    fn test_array_walk_callback() {
        let source = "<?php array_walk($rows, function ($row) { return touch($row); });";
        assert_eq!(check_php(source).len(), 1);
    }

    #[test]
    fn test_qualified_callee_kept_as_written() {
        let source = "<?php array_map(function ($v) { return \\trim($v); }, $values);";
        assert_eq!(transform(source), "<?php array_map('\\trim', $values);");
    }

    #[test]
    fn test_fix_metadata() {
        let problems = check_php("<?php array_map(function ($v) { return trim($v); }, $a);");
        let fix = problems[0].fix.as_ref().unwrap();
        assert_eq!(fix.title, FIX_TITLE);
        assert_eq!(fix.edits.len(), 1);
    }

    // ==================== Cast Body Tests ====================

    #[test]
    fn test_int_cast_body() {
        let source = "<?php array_map(function ($v) { return (int) $v; }, $values);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "The closure can be replaced with 'intval' (reduces cognitive load)."
        );
        assert_eq!(transform(source), "<?php array_map('intval', $values);");
    }

    #[test]
    fn test_cast_spellings_map_to_counterparts() {
        assert_eq!(
            transform("<?php array_map(function ($v) { return (integer) $v; }, $a);"),
            "<?php array_map('intval', $a);"
        );
        assert_eq!(
            transform("<?php array_map(function ($v) { return (float) $v; }, $a);"),
            "<?php array_map('floatval', $a);"
        );
        assert_eq!(
            transform("<?php array_map(function ($v) { return (string) $v; }, $a);"),
            "<?php array_map('strval', $a);"
        );
        assert_eq!(
            transform("<?php array_map(function ($v) { return (bool) $v; }, $a);"),
            "<?php array_map('boolval', $a);"
        );
    }

    #[test]
    fn test_cast_of_compound_expression_is_skipped() {
        // (int) ($v * 2) does more than intval($v) would
        let source = "<?php array_map(function ($v) { return (int) ($v * 2); }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_cast_of_other_variable_is_skipped() {
        let source = "<?php array_map(function ($v) use ($w) { return (int) $w; }, $values);";
        assert!(check_php(source).is_empty());
    }

    // ==================== Assignment Body Tests ====================

    #[test]
    fn test_assignment_forwarding_closure() {
        let source = "<?php array_walk($rows, function (&$row) { $row = trim($row); });";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "The closure can be replaced with 'trim' (reduces cognitive load)."
        );
    }

    #[test]
    fn test_assignment_to_other_variable_is_skipped() {
        let source = "<?php array_walk($rows, function (&$row) { $out = trim($row); });";
        assert!(check_php(source).is_empty());
    }

    // ==================== Skip Tests ====================

    #[test]
    fn test_extra_work_in_body_is_skipped() {
        let source = "<?php array_map(function ($v) { return trim($v, '/'); }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_multiple_statements_are_skipped() {
        let source =
            "<?php array_map(function ($v) { $v = trim($v); return $v; }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_typed_parameter_is_skipped() {
        // The hint narrows what trim() would otherwise accept
        let source = "<?php array_map(function (string $v) { return trim($v); }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_parameterless_closure_is_skipped() {
        let source = "<?php array_map(function () { return rand(); }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_other_functions_are_skipped() {
        let source = "<?php usort($values, function ($a) { return intval($a); });";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_wrong_argument_forwarded_is_skipped() {
        let source = "<?php array_map(function ($v) { return trim($other); }, $values);";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_arrow_function_is_skipped() {
        let source = "<?php array_map(fn ($v) => trim($v), $values);";
        assert!(check_php(source).is_empty());
    }
}
