//! Inspection: extract() calls without the flags argument
//!
//! `extract($source)` with the default EXTR_OVERWRITE silently clobbers
//! any local variable whose name collides with a key in the source array.
//! Passing the flags argument makes the intended behaviour explicit.
//!
//! Example: `extract($_REQUEST)` → flagged, `extract($data, EXTR_SKIP)` → fine

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::is_function_named;
use lupa_core::{Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE: &str = "Please provide second parameter to clearly state intended behaviour.";

/// Check a parsed PHP program for extract() calls missing the flags argument
pub fn check_non_secure_extract<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = NonSecureExtractVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct NonSecureExtractVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for NonSecureExtractVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "extract")
                && func_call.argument_list.arguments.len() == 1
            {
                self.problems
                    .push(Problem::error("non_secure_extract", MESSAGE, expr.span()));
            }
        }
        true
    }
}

use crate::registry::Inspection;

pub struct NonSecureExtractInspection;

impl Inspection for NonSecureExtractInspection {
    fn name(&self) -> &'static str {
        "non_secure_extract"
    }

    fn description(&self) -> &'static str {
        "Require the second argument of extract()"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_non_secure_extract(program, source, config)
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
        check_non_secure_extract(program, source, &InspectionConfig::default())
    }

    #[test]
    fn test_single_argument_is_flagged() {
        let problems = check_php("<?php extract($_REQUEST);");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE);
    }

    #[test]
    fn test_flags_argument_is_fine() {
        let problems = check_php("<?php extract($data, EXTR_SKIP);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_prefix_argument_is_fine() {
        let problems = check_php("<?php extract($data, EXTR_PREFIX_ALL, 'p');");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_fully_qualified_call_is_flagged() {
        let problems = check_php("<?php \\extract($row);");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_other_functions_are_ignored() {
        let problems = check_php("<?php compact('a');");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_nested_call_is_found() {
        let problems = check_php("<?php function f($row) { extract($row); }");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_no_fix_is_offered() {
        let problems = check_php("<?php extract($row);");
        assert!(problems[0].fix.is_none());
    }
}
