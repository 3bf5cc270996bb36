//! Inspection: array_merge() calls with cheaper equivalents
//!
//! Three patterns. Merging two array literals is just one literal.
//! Merging a literal into a variable that also receives the result is
//! array_push()/array_unshift() without the copy. Nested array_merge()
//! calls in the argument list flatten into the outer call.
//!
//! Example: `array_merge([1], [2])` → `[1, 2]`

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{
    argument_values, array_elements, is_array_expression, is_function_named, span_text,
    variable_name,
};
use lupa_core::equivalence::are_equivalent;
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_USE_ARRAY: &str = "'[...]' would fit more here (it also much faster).";
const MESSAGE_ARRAY_UNSHIFT: &str = "'array_unshift(...)' would fit more here (it also faster).";
const MESSAGE_ARRAY_PUSH: &str = "'array_push(...)' would fit more here (it also faster).";
const MESSAGE_NESTED_MERGE: &str =
    "Inlining nested 'array_merge(...)' in arguments is possible here (it also faster).";

const USE_ARRAY_FIX_TITLE: &str = "Replace with array declaration";
const UNSHIFT_FIX_TITLE: &str = "Use array_unshift(...) instead";
const PUSH_FIX_TITLE: &str = "Use array_push(...) instead";
const NESTED_FIX_TITLE: &str = "Inline nested array_merge(...) calls";

/// Check a parsed PHP program for array_merge() misuse
pub fn check_array_merge_misuse<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = ArrayMergeMisuseVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct ArrayMergeMisuseVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for ArrayMergeMisuseVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Assignment(assign) = expr {
            self.check_push_unshift(expr, assign);
        }
        if let Expression::Call(Call::Function(func_call)) = expr {
            self.check_literal_merge(expr, func_call);
            self.check_nested_merge(expr, func_call);
        }
        true
    }
}

impl<'s> ArrayMergeMisuseVisitor<'s> {
    /// `array_merge([...], [...])` is a single literal
    fn check_literal_merge<'a>(&mut self, expr: &Expression<'a>, func_call: &FunctionCall<'a>) {
        if !is_function_named(func_call, self.source, "array_merge") {
            return;
        }
        let arguments = argument_values(&func_call.argument_list);
        if arguments.len() != 2 {
            return;
        }
        if !is_array_expression(arguments[0]) || !is_array_expression(arguments[1]) {
            return;
        }

        let mut fragments = Vec::new();
        for argument in &arguments {
            if let Some(elements) = array_elements(argument) {
                for element in elements {
                    fragments.push(span_text(self.source, element.span()));
                }
            }
        }

        let replacement = format!("[{}]", fragments.join(", "));
        let fix = Fix::new(
            USE_ARRAY_FIX_TITLE,
            vec![FixEdit::expression(expr.span(), replacement)],
        );
        self.problems
            .push(Problem::warning("array_merge_misuse", MESSAGE_USE_ARRAY, expr.span()).with_fix(fix));
    }

    /// `$x = array_merge($x, [...])` appends in place, `$x = array_merge([...], $x)`
    /// prepends in place
    fn check_push_unshift<'a>(&mut self, expr: &Expression<'a>, assign: &Assignment<'a>) {
        if !matches!(assign.operator, AssignmentOperator::Assign(_)) {
            return;
        }
        let Expression::Call(Call::Function(func_call)) = &*assign.rhs else {
            return;
        };
        if !is_function_named(func_call, self.source, "array_merge") {
            return;
        }
        let arguments = argument_values(&func_call.argument_list);
        if arguments.len() != 2 {
            return;
        }

        let first_is_array = is_array_expression(arguments[0]);
        let second_is_array = is_array_expression(arguments[1]);
        if first_is_array == second_is_array {
            return;
        }
        let (array, destination) = if first_is_array {
            (arguments[0], arguments[1])
        } else {
            (arguments[1], arguments[0])
        };

        let Some(elements) = array_elements(array) else {
            return;
        };
        if elements.is_empty() {
            return;
        }
        // Keyed entries cannot become push/unshift arguments
        if elements
            .iter()
            .any(|element| matches!(element, ArrayElement::KeyValue(_)))
        {
            return;
        }
        if !are_equivalent(&assign.lhs, destination, self.source) {
            return;
        }

        let (message, title, callee) = if first_is_array {
            if variable_name(destination, self.source).is_none() {
                return;
            }
            (MESSAGE_ARRAY_UNSHIFT, UNSHIFT_FIX_TITLE, "array_unshift")
        } else {
            (MESSAGE_ARRAY_PUSH, PUSH_FIX_TITLE, "array_push")
        };

        let mut fragments = vec![span_text(self.source, destination.span())];
        for element in &elements {
            fragments.push(span_text(self.source, element.span()));
        }

        let replacement = format!("{}({})", callee, fragments.join(", "));
        let fix = Fix::new(title, vec![FixEdit::expression(expr.span(), replacement)]);
        self.problems
            .push(Problem::warning("array_merge_misuse", message, expr.span()).with_fix(fix));
    }

    /// `array_merge($a, array_merge($b, $c))` flattens into one call
    fn check_nested_merge<'a>(&mut self, expr: &Expression<'a>, func_call: &FunctionCall<'a>) {
        if !is_function_named(func_call, self.source, "array_merge") {
            return;
        }
        let arguments: Vec<_> = func_call.argument_list.arguments.iter().collect();
        if arguments.len() < 2 {
            return;
        }
        if !arguments
            .iter()
            .any(|argument| self.nested_merge_call(argument).is_some())
        {
            return;
        }

        let mut fragments = Vec::new();
        for argument in &arguments {
            if let Some(inner) = self.nested_merge_call(argument) {
                for inner_argument in inner.argument_list.arguments.iter() {
                    fragments.push(span_text(self.source, inner_argument.span()));
                }
            } else {
                fragments.push(span_text(self.source, argument.span()));
            }
        }

        let replacement = format!("array_merge({})", fragments.join(", "));
        let fix = Fix::new(
            NESTED_FIX_TITLE,
            vec![FixEdit::expression(expr.span(), replacement)],
        );
        self.problems.push(
            Problem::warning("array_merge_misuse", MESSAGE_NESTED_MERGE, expr.span()).with_fix(fix),
        );
    }

    /// An argument that is itself a plain array_merge() call. Spread and
    /// named arguments keep their prefix text and are never flattened.
    fn nested_merge_call<'a, 'b>(&self, argument: &'b Argument<'a>) -> Option<&'b FunctionCall<'a>> {
        let value = argument.value();
        if argument.span().start.offset != value.span().start.offset {
            return None;
        }
        let Expression::Call(Call::Function(inner)) = value else {
            return None;
        };
        if !is_function_named(inner, self.source, "array_merge") {
            return None;
        }
        Some(inner)
    }
}

use crate::registry::Inspection;

pub struct ArrayMergeMisuseInspection;

impl Inspection for ArrayMergeMisuseInspection {
    fn name(&self) -> &'static str {
        "array_merge_misuse"
    }

    fn description(&self) -> &'static str {
        "Replace array_merge() with literals, push/unshift, or a flattened call"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_array_merge_misuse(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use lupa_core::{Document, FixOutcome};
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_array_merge_misuse(program, source, &InspectionConfig::default())
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

    // ==================== Literal Merge Tests ====================

    #[test]
    fn test_two_literals_become_one() {
        let source = "<?php $x = array_merge([1, 2], [3]);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_USE_ARRAY);
        assert_eq!(transform(source), "<?php $x = [1, 2, 3];");
    }

    #[test]
    fn test_two_empty_literals() {
        assert_eq!(transform("<?php $x = array_merge([], []);"), "<?php $x = [];");
    }

    #[test]
    fn test_legacy_syntax_becomes_short() {
        let source = "<?php $x = array_merge(array(1), array(2));";
        assert_eq!(transform(source), "<?php $x = [1, 2];");
    }

    #[test]
    fn test_keyed_literals_keep_keys() {
        let source = "<?php $x = array_merge(['a' => 1], ['b' => 2]);";
        assert_eq!(transform(source), "<?php $x = ['a' => 1, 'b' => 2];");
    }

    // ==================== Push/Unshift Tests ====================

    #[test]
    fn test_append_becomes_array_push() {
        let source = "<?php $stack = array_merge($stack, [$job, $retry]);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ARRAY_PUSH);
        assert_eq!(problems[0].fix.as_ref().unwrap().title, PUSH_FIX_TITLE);
        assert_eq!(transform(source), "<?php array_push($stack, $job, $retry);");
    }

    #[test]
    fn test_prepend_becomes_array_unshift() {
        let source = "<?php $queue = array_merge(['first'], $queue);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ARRAY_UNSHIFT);
        assert_eq!(transform(source), "<?php array_unshift($queue, 'first');");
    }

    #[test]
    fn test_different_destination_is_skipped() {
        assert!(check_php("<?php $other = array_merge($stack, [1]);").is_empty());
    }

    #[test]
    fn test_keyed_element_is_skipped() {
        assert!(check_php("<?php $x = array_merge($x, ['k' => 1]);").is_empty());
    }

    #[test]
    fn test_empty_literal_is_skipped() {
        assert!(check_php("<?php $x = array_merge($x, []);").is_empty());
    }

    #[test]
    fn test_unshift_requires_plain_variable() {
        assert!(check_php("<?php $a['x'] = array_merge([1], $a['x']);").is_empty());
    }

    #[test]
    fn test_push_accepts_array_access_destination() {
        let source = "<?php $a['x'] = array_merge($a['x'], [1]);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ARRAY_PUSH);
        assert_eq!(transform(source), "<?php array_push($a['x'], 1);");
    }

    #[test]
    fn test_standalone_call_is_skipped() {
        // No assignment back into the source array
        assert!(check_php("<?php process(array_merge($x, [1]));").is_empty());
    }

    // ==================== Nested Merge Tests ====================

    #[test]
    fn test_nested_merge_is_flattened() {
        let source = "<?php $x = array_merge($a, array_merge($b, $c));";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_NESTED_MERGE);
        assert_eq!(transform(source), "<?php $x = array_merge($a, $b, $c);");
    }

    #[test]
    fn test_multiple_nested_merges_flatten_together() {
        let source = "<?php $x = array_merge(array_merge($a, $b), array_merge($c, $d));";
        assert_eq!(transform(source), "<?php $x = array_merge($a, $b, $c, $d);");
    }

    #[test]
    fn test_spread_argument_is_not_flattened() {
        let source = "<?php $x = array_merge($a, array_merge($b, $c), ...$rest);";
        assert_eq!(
            transform(source),
            "<?php $x = array_merge($a, $b, $c, ...$rest);"
        );
    }

    #[test]
    fn test_single_argument_is_skipped() {
        assert!(check_php("<?php $x = array_merge(array_merge($a, $b));").is_empty());
    }

    // ==================== General Skip Tests ====================

    #[test]
    fn test_plain_merge_is_skipped() {
        assert!(check_php("<?php $x = array_merge($a, $b);").is_empty());
    }

    #[test]
    fn test_other_functions_are_skipped() {
        assert!(check_php("<?php $x = array_replace([1], [2]);").is_empty());
    }

    #[test]
    fn test_single_literal_argument_is_skipped() {
        assert!(check_php("<?php $x = array_merge([1]);").is_empty());
    }
}
