//! Inspection: stream_select() polling with a too-small timeout
//!
//! A zero-second timeout turns stream_select() into a busy poll. When
//! the microseconds argument stays under the documented 200000 (200 ms)
//! the loop spins fast enough to pin a CPU and starve reconnects.
//! The microseconds argument is traced through local assignments, and
//! only a single provable value below the threshold is reported.
//!
//! Example: `stream_select($r, $w, $e, 0, 100)` → flagged

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{argument_values, is_function_named, span_text};
use lupa_core::{discover, PhpValue, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE: &str =
    "Might cause high CPU usage and connectivity issues (documentation advices using 200000 here, 200 ms).";

const MICROSECONDS_THRESHOLD: i64 = 200_000;

/// Check a parsed PHP program for stream_select() busy polling
pub fn check_stream_select_timeout<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = StreamSelectVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct StreamSelectVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for StreamSelectVisitor<'s> {
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

/// Scans one statement for stream_select() calls, with the statements
/// before it available for value tracing. Nested statement lists are
/// skipped here; the sequence hook spawns a finder for each of them
/// with their own context.
struct CallFinder<'a, 'b, 's> {
    source: &'s str,
    preceding: &'b [&'b Statement<'a>],
    problems: &'b mut Vec<Problem>,
}

impl<'a, 'b, 's> Visitor<'a> for CallFinder<'a, 'b, 's> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Expression::Call(Call::Function(func_call)) = expr {
            if is_function_named(func_call, self.source, "stream_select") {
                self.check_call(func_call);
            }
        }
        true
    }

    fn traverse_sequence(&mut self, _statements: &[&Statement<'a>], _source: &str) {}
}

impl<'a, 'b, 's> CallFinder<'a, 'b, 's> {
    fn check_call(&mut self, func_call: &FunctionCall<'a>) {
        let arguments = argument_values(&func_call.argument_list);
        if arguments.len() != 5 {
            return;
        }

        let seconds = arguments[3];
        let is_zero_seconds = matches!(seconds, Expression::Literal(Literal::Integer(_)))
            && span_text(self.source, seconds.span()) == "0";
        if !is_zero_seconds {
            return;
        }

        let microseconds = arguments[4];
        let values = discover(microseconds, self.preceding, self.source);
        if let Some(PhpValue::Int(value)) = values.as_singleton() {
            if *value < MICROSECONDS_THRESHOLD {
                self.problems.push(Problem::warning(
                    "stream_select_timeout",
                    MESSAGE,
                    microseconds.span(),
                ));
            }
        }
    }
}

use crate::registry::Inspection;

pub struct StreamSelectTimeoutInspection;

impl Inspection for StreamSelectTimeoutInspection {
    fn name(&self) -> &'static str {
        "stream_select_timeout"
    }

    fn description(&self) -> &'static str {
        "Flag stream_select() timeouts that cause high CPU usage"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_stream_select_timeout(program, source, config)
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
        check_stream_select_timeout(program, source, &InspectionConfig::default())
    }

    #[test]
    fn test_small_literal_timeout_is_flagged() {
        let problems = check_php("<?php stream_select($read, $write, $except, 0, 100);");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE);
    }

    #[test]
    fn test_zero_microseconds_is_flagged() {
        let problems = check_php("<?php stream_select($read, $write, $except, 0, 0);");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_traced_variable_timeout_is_flagged() {
        let source = "<?php $timeout = 100; stream_select($read, $write, $except, 0, $timeout);";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_documented_threshold_is_fine() {
        let problems = check_php("<?php stream_select($read, $write, $except, 0, 200000);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_nonzero_seconds_is_fine() {
        let problems = check_php("<?php stream_select($read, $write, $except, 1, 100);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_variable_seconds_is_fine() {
        let problems = check_php("<?php stream_select($read, $write, $except, $sec, 100);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_ambiguous_timeout_is_fine() {
        let source =
            "<?php $timeout = $fast ? 100 : 500000; stream_select($read, $write, $except, 0, $timeout);";
        let problems = check_php(source);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_untraceable_timeout_is_fine() {
        let problems =
            check_php("<?php stream_select($read, $write, $except, 0, $config->timeout);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_wrong_arity_is_fine() {
        let problems = check_php("<?php stream_select($read, $write, $except, 0);");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_outer_assignment_is_not_traced_into_loop() {
        // The loop body has its own statement context, the assignment
        // sits outside it and is not traced there
        let source = "<?php $usec = 50; while (true) { stream_select($r, $w, $e, 0, $usec); }";
        let problems = check_php(source);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_assignment_inside_same_block_is_traced() {
        let source = "<?php while (true) { $usec = 50; stream_select($r, $w, $e, 0, $usec); }";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
    }
}
