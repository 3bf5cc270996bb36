//! Inspection: empty list() and [] assignment targets
//!
//! Destructuring into an empty list stopped being a silent no-op in
//! PHP 7.0 and now aborts the request with a fatal error. This applies
//! to plain assignments and to foreach destructuring alike.
//!
//! Example: `list() = $row;` and `foreach ($rows as []) {}` → flagged

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::{Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE: &str = "Provokes a PHP Fatal error (Cannot use empty list).";

/// Check a parsed PHP program for destructuring into empty lists
pub fn check_empty_list_assignment<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    if config.target_php_version() < PhpVersion::Php70 {
        return Vec::new();
    }

    let mut visitor = EmptyListVisitor {
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct EmptyListVisitor {
    problems: Vec<Problem>,
}

impl<'a> Visitor<'a> for EmptyListVisitor {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Foreach(foreach) = stmt {
            let value = match &foreach.target {
                ForeachTarget::Value(target) => &target.value,
                ForeachTarget::KeyValue(target) => &target.value,
            };
            if let Some(span) = empty_list_span(value) {
                self.report(span);
            }
        }
        true
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Assignment(assign) = expr {
            if matches!(assign.operator, AssignmentOperator::Assign(_)) {
                if let Some(span) = empty_list_span(&assign.lhs) {
                    self.report(span);
                }
            }
        }
        true
    }
}

impl EmptyListVisitor {
    fn report(&mut self, span: Span) {
        self.problems
            .push(Problem::error("empty_list_assignment", MESSAGE, span));
    }
}

/// Return the span of a list-like expression with no binding elements
fn empty_list_span(expr: &Expression<'_>) -> Option<Span> {
    let (span, populated) = match expr {
        Expression::List(list) => (list.span(), has_bindings(list.elements.iter())),
        Expression::Array(array) => (array.span(), has_bindings(array.elements.iter())),
        Expression::LegacyArray(array) => (array.span(), has_bindings(array.elements.iter())),
        _ => return None,
    };
    if populated {
        None
    } else {
        Some(span)
    }
}

/// Skipped slots like `list(,)` do not bind anything
fn has_bindings<'a, 'b>(mut elements: impl Iterator<Item = &'b ArrayElement<'a>>) -> bool
where
    'a: 'b,
{
    elements.any(|element| {
        matches!(
            element,
            ArrayElement::KeyValue(_) | ArrayElement::Value(_) | ArrayElement::Variadic(_)
        )
    })
}

use crate::registry::Inspection;

pub struct EmptyListAssignmentInspection;

impl Inspection for EmptyListAssignmentInspection {
    fn name(&self) -> &'static str {
        "empty_list_assignment"
    }

    fn description(&self) -> &'static str {
        "Flag empty list() / [] assignment targets (fatal at runtime)"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_empty_list_assignment(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_empty_list_assignment(program, source, &InspectionConfig::default())
    }

    #[test]
    fn test_empty_list_assignment() {
        let problems = check_php("<?php list() = $row;");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE);
    }

    #[test]
    fn test_empty_short_list_assignment() {
        let problems = check_php("<?php [] = $row;");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_empty_list_in_foreach() {
        let problems = check_php("<?php foreach ($rows as list()) {}");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_empty_short_list_in_keyed_foreach() {
        let problems = check_php("<?php foreach ($rows as $key => []) {}");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_populated_list_is_fine() {
        let problems = check_php("<?php list($a, $b) = $row;");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_populated_short_list_is_fine() {
        let problems = check_php("<?php [$a, $b] = $row; foreach ($rows as [$c]) {}");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_array_literal_rhs_is_not_a_target() {
        let problems = check_php("<?php $x = [];");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_php5_does_not_report() {
        let source = "<?php list() = $row;";
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        let config = InspectionConfig {
            php_version: "5.6".to_string(),
            ..Default::default()
        };
        let problems = check_empty_list_assignment(program, source, &config);
        assert!(problems.is_empty());
    }
}
