//! Inspection: array literals that defeat the packed hashtable layout
//!
//! Since PHP 7, arrays with ascending integer keys are stored as a
//! packed C array instead of a full hashtable. Keyed literals that are
//! numeric but out of order, or that spell their numeric keys as
//! strings, silently fall back to the slow layout.
//!
//! Example: `['2' => 'b', '1' => 'a', '3' => 'c']` → reorder and use
//! integer keys

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{array_elements, span_text, string_literal_value};
use lupa_core::{Problem, Visitor};

use crate::config::{InspectionConfig, PhpVersion};

const MESSAGE_REORDER: &str =
    "Reordering keys in natural ascending order would enable array optimizations here.";
const MESSAGE_USE_NUMERIC_KEYS: &str =
    "Using integer keys would enable array optimizations here.";

/// Check a parsed PHP program for array literals with packable keys
pub fn check_packed_hashtable<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    if config.target_php_version() < PhpVersion::Php70 {
        return Vec::new();
    }

    let mut visitor = PackedHashtableVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct PackedHashtableVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for PackedHashtableVisitor<'s> {
    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if let Some(elements) = array_elements(expr) {
            // Arrays need room to grow before the layout matters
            if elements.len() >= 3 {
                self.check_array(expr, &elements);
            }
        }
        true
    }
}

impl<'s> PackedHashtableVisitor<'s> {
    fn check_array<'a>(&mut self, expr: &Expression<'a>, elements: &[&ArrayElement<'a>]) {
        let mut has_string_indexes = false;
        let mut has_increasing_indexes = true;
        let mut last_index = i64::MIN;

        for element in elements {
            let ArrayElement::KeyValue(pair) = element else {
                return;
            };

            let Some((index, is_string)) = self.numeric_index(&pair.key) else {
                return;
            };

            has_string_indexes |= is_string;
            if index < last_index {
                has_increasing_indexes = false;
            }
            last_index = index;
        }

        if !has_increasing_indexes {
            self.problems.push(Problem::warning(
                "packed_hashtable",
                MESSAGE_REORDER,
                expr.span(),
            ));
        }
        if has_increasing_indexes && has_string_indexes {
            self.problems.push(Problem::warning(
                "packed_hashtable",
                MESSAGE_USE_NUMERIC_KEYS,
                expr.span(),
            ));
        }
    }

    /// Parse a literal key as a decimal integer, or bail on this array.
    ///
    /// Keys PHP would keep as strings ('01', 'abc') and int literals in
    /// other notations (0x10, 1_000) disqualify the whole literal.
    fn numeric_index<'a>(&self, key: &Expression<'a>) -> Option<(i64, bool)> {
        match key {
            Expression::Literal(Literal::String(_)) => {
                let contents = string_literal_value(key, self.source)?;
                if contents.len() > 1 && contents.starts_with('0') {
                    return None;
                }
                contents.parse::<i64>().ok().map(|index| (index, true))
            }
            Expression::Literal(Literal::Integer(int_lit)) => {
                let text: String = span_text(self.source, int_lit.span())
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                text.parse::<i64>().ok().map(|index| (index, false))
            }
            _ => None,
        }
    }
}

use crate::registry::Inspection;

pub struct PackedHashtableInspection;

impl Inspection for PackedHashtableInspection {
    fn name(&self) -> &'static str {
        "packed_hashtable"
    }

    fn description(&self) -> &'static str {
        "Suggest array layouts that enable packed hashtable optimizations"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_packed_hashtable(program, source, config)
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
        check_packed_hashtable(program, source, &InspectionConfig::default())
    }

    // ==================== Reordering ====================

    #[test]
    fn test_descending_int_keys_suggest_reorder() {
        let problems = check_php("<?php $a = [3 => 'c', 1 => 'a', 2 => 'b'];");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_REORDER);
    }

    #[test]
    fn test_out_of_order_string_keys_suggest_reorder_only() {
        let problems = check_php("<?php $a = ['2' => 'b', '1' => 'a', '3' => 'c'];");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_REORDER);
    }

    // ==================== Numeric Keys ====================

    #[test]
    fn test_ascending_string_keys_suggest_int_keys() {
        let problems = check_php("<?php $a = ['1' => 'a', '2' => 'b', '3' => 'c'];");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_USE_NUMERIC_KEYS);
    }

    #[test]
    fn test_mixed_key_styles_in_order_suggest_int_keys() {
        let problems = check_php("<?php $a = [1 => 'a', '2' => 'b', 3 => 'c'];");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_USE_NUMERIC_KEYS);
    }

    // ==================== Silent Cases ====================

    #[test]
    fn test_ascending_int_keys_are_silent() {
        assert!(check_php("<?php $a = [1 => 'a', 2 => 'b', 3 => 'c'];").is_empty());
    }

    #[test]
    fn test_repeated_keys_are_in_order() {
        assert!(check_php("<?php $a = [1 => 'a', 1 => 'b', 2 => 'c'];").is_empty());
    }

    #[test]
    fn test_small_arrays_are_skipped() {
        assert!(check_php("<?php $a = [2 => 'b', 1 => 'a'];").is_empty());
    }

    #[test]
    fn test_textual_keys_are_skipped() {
        assert!(check_php("<?php $a = ['one' => 1, 'two' => 2, 'three' => 3];").is_empty());
    }

    #[test]
    fn test_leading_zero_string_keys_are_skipped() {
        // PHP keeps '01' as a string key
        assert!(check_php("<?php $a = ['01' => 'a', '02' => 'b', '3' => 'c'];").is_empty());
    }

    #[test]
    fn test_hex_keys_are_skipped() {
        assert!(check_php("<?php $a = [0x3 => 'c', 0x1 => 'a', 0x2 => 'b'];").is_empty());
    }

    #[test]
    fn test_unkeyed_arrays_are_skipped() {
        assert!(check_php("<?php $a = ['a', 'b', 'c'];").is_empty());
    }

    #[test]
    fn test_partially_keyed_arrays_are_skipped() {
        assert!(check_php("<?php $a = [1 => 'a', 'b', 3 => 'c'];").is_empty());
    }

    #[test]
    fn test_expression_keys_are_skipped() {
        assert!(check_php("<?php $a = [$k => 'a', 2 => 'b', 3 => 'c'];").is_empty());
    }

    #[test]
    fn test_negative_int_keys_are_skipped() {
        // Unary minus keys are not literal tokens
        assert!(check_php("<?php $a = [-3 => 'c', 1 => 'a', 2 => 'b'];").is_empty());
    }

    #[test]
    fn test_legacy_array_syntax_is_checked() {
        let problems = check_php("<?php $a = array(3 => 'c', 1 => 'a', 2 => 'b');");
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_php5_is_silent() {
        let source = "<?php $a = [3 => 'c', 1 => 'a', 2 => 'b'];";
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        let config = InspectionConfig {
            php_version: "5.6".to_string(),
            ..Default::default()
        };
        assert!(check_packed_hashtable(program, source, &config).is_empty());
    }

    #[test]
    fn test_no_fix_is_offered() {
        let problems = check_php("<?php $a = [3 => 'c', 1 => 'a', 2 => 'b'];");
        assert!(problems[0].fix.is_none());
    }
}
