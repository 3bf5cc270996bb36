//! Inspection: nested ternary operators
//!
//! A ternary inside another ternary's condition or branch reads
//! differently depending on the PHP version (left-associativity was
//! deprecated in 7.4) and is hard to follow either way. Chained elvis
//! operators (`$a ?: $b ?: $c`) are tolerated since they read linearly.
//!
//! Example: `$a ? $b : ($c ? $d : $e)` → flagged on the inner ternary

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::unwrap_parenthesized;
use lupa_core::{Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE: &str = "Nested ternary operator should not be used (maintainability issues).";

/// Check a parsed PHP program for ternaries nested inside other ternaries
pub fn check_nested_ternary<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = NestedTernaryVisitor {
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct NestedTernaryVisitor {
    problems: Vec<Problem>,
}

impl<'a> Visitor<'a> for NestedTernaryVisitor {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Conditional(ternary) = expr {
            if let Expression::Conditional(inner) = unwrap_parenthesized(&ternary.condition) {
                self.report(inner);
            }

            if let Some(then) = &ternary.then {
                if let Expression::Conditional(inner) = unwrap_parenthesized(then) {
                    self.report(inner);
                }
            }

            if let Expression::Conditional(inner) = unwrap_parenthesized(&ternary.r#else) {
                // `$a ?: $b ?: $c` chains stay readable, leave them alone
                let chained_directly = matches!(ternary.r#else, Expression::Conditional(_));
                let both_elvis = ternary.then.is_none() && inner.then.is_none();
                if !(chained_directly && both_elvis) {
                    self.report(inner);
                }
            }
        }
        true
    }
}

impl NestedTernaryVisitor {
    fn report(&mut self, inner: &Conditional<'_>) {
        self.problems
            .push(Problem::warning("nested_ternary", MESSAGE, inner.span()));
    }
}

use crate::registry::Inspection;

pub struct NestedTernaryInspection;

impl Inspection for NestedTernaryInspection {
    fn name(&self) -> &'static str {
        "nested_ternary"
    }

    fn description(&self) -> &'static str {
        "Flag nested ternary operators"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_nested_ternary(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;
    use lupa_core::classify::span_text;

    fn check_php(source: &str) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_nested_ternary(program, source, &InspectionConfig::default())
    }

    #[test]
    fn test_nested_in_else_branch() {
        let source = "<?php $x = $a ? $b : ($c ? $d : $e);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(span_text(source, problems[0].span), "$c ? $d : $e");
    }

    #[test]
    fn test_nested_in_then_branch() {
        let source = "<?php $x = $a ? ($b ? $c : $d) : $e;";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(span_text(source, problems[0].span), "$b ? $c : $d");
    }

    #[test]
    fn test_nested_in_condition() {
        let source = "<?php $x = ($a ? $b : $c) ? $d : $e;";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(span_text(source, problems[0].span), "$a ? $b : $c");
    }

    #[test]
    fn test_flat_ternary_is_fine() {
        let problems = check_php("<?php $x = $a ? $b : $c;");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_elvis_chain_is_tolerated() {
        let problems = check_php("<?php $x = $a ?: $b ?: $c;");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_parenthesized_elvis_chain_is_flagged() {
        let problems = check_php("<?php $x = $a ?: ($b ?: $c);");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_full_ternary_in_elvis_else_is_flagged() {
        let problems = check_php("<?php $x = $a ?: ($b ? $c : $d);");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_doubly_nested_reports_each_parent() {
        let source = "<?php $x = $a ? $b : ($c ? $d : ($e ? $f : $g));";
        let problems = check_php(source);
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_no_fix_is_offered() {
        let problems = check_php("<?php $x = $a ? $b : ($c ? $d : $e);");
        assert!(problems[0].fix.is_none());
    }
}
