//! Structural equivalence of PHP expressions
//!
//! Decides whether two expressions denote the same computation, ignoring
//! presentation details the author could change freely: wrapping
//! parentheses, string quote style, integer radix, long versus short
//! array syntax, call-name casing, and whitespace.

use mago_span::HasSpan;
use mago_syntax::ast::*;

use crate::classify::{
    array_elements, function_name, integer_literal_value, span_text, string_literal_value,
    unwrap_parenthesized, variable_name,
};

/// Check whether two expressions from the same source are equivalent
pub fn are_equivalent<'a>(a: &Expression<'a>, b: &Expression<'a>, source: &str) -> bool {
    let a = unwrap_parenthesized(a);
    let b = unwrap_parenthesized(b);

    // Integer literals compare by value, so 0x10 matches 16
    if let (Some(x), Some(y)) = (integer_literal_value(a), integer_literal_value(b)) {
        return x == y;
    }

    // String literals compare by decoded content, so 'a' matches "a"
    if let (Some(x), Some(y)) = (string_literal_value(a, source), string_literal_value(b, source))
    {
        return x == y;
    }

    // Array literals compare element-wise regardless of syntax
    if let (Some(elements_a), Some(elements_b)) = (array_elements(a), array_elements(b)) {
        return arrays_equivalent(&elements_a, &elements_b, source);
    }

    match (a, b) {
        (Expression::Variable(Variable::Direct(_)), Expression::Variable(Variable::Direct(_))) => {
            // PHP variable names are case-sensitive
            variable_name(a, source) == variable_name(b, source)
        }
        (
            Expression::Call(Call::Function(call_a)),
            Expression::Call(Call::Function(call_b)),
        ) => calls_equivalent(call_a, call_b, source),
        (Expression::Binary(binary_a), Expression::Binary(binary_b)) => {
            operator_symbol(&binary_a.operator) == operator_symbol(&binary_b.operator)
                && are_equivalent(&binary_a.lhs, &binary_b.lhs, source)
                && are_equivalent(&binary_a.rhs, &binary_b.rhs, source)
        }
        _ => normalized_text(a, source) == normalized_text(b, source),
    }
}

fn arrays_equivalent(
    elements_a: &[&ArrayElement<'_>],
    elements_b: &[&ArrayElement<'_>],
    source: &str,
) -> bool {
    if elements_a.len() != elements_b.len() {
        return false;
    }

    elements_a
        .iter()
        .zip(elements_b.iter())
        .all(|(element_a, element_b)| match (element_a, element_b) {
            (ArrayElement::Value(value_a), ArrayElement::Value(value_b)) => {
                are_equivalent(&value_a.value, &value_b.value, source)
            }
            (ArrayElement::KeyValue(kv_a), ArrayElement::KeyValue(kv_b)) => {
                are_equivalent(&kv_a.key, &kv_b.key, source)
                    && are_equivalent(&kv_a.value, &kv_b.value, source)
            }
            _ => false,
        })
}

fn calls_equivalent<'a>(
    call_a: &FunctionCall<'a>,
    call_b: &FunctionCall<'a>,
    source: &str,
) -> bool {
    let (Some(name_a), Some(name_b)) = (
        function_name(call_a, source),
        function_name(call_b, source),
    ) else {
        // Dynamic callables fall back to text comparison
        return normalized_call_text(call_a, source) == normalized_call_text(call_b, source);
    };

    if !name_a.eq_ignore_ascii_case(name_b) {
        return false;
    }

    let args_a = &call_a.argument_list.arguments;
    let args_b = &call_b.argument_list.arguments;
    if args_a.len() != args_b.len() {
        return false;
    }

    args_a
        .iter()
        .zip(args_b.iter())
        .all(|(arg_a, arg_b)| are_equivalent(arg_a.value(), arg_b.value(), source))
}

/// Source text of an expression with every whitespace character removed
fn normalized_text(expr: &Expression<'_>, source: &str) -> String {
    span_text(source, expr.span())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn normalized_call_text(call: &FunctionCall<'_>, source: &str) -> String {
    span_text(source, call.span())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Map a binary operator to its symbolic spelling
pub fn operator_symbol(op: &BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Identical(_) => "===",
        BinaryOperator::NotIdentical(_) => "!==",
        BinaryOperator::Equal(_) => "==",
        BinaryOperator::NotEqual(_) => "!=",
        BinaryOperator::LessThan(_) => "<",
        BinaryOperator::GreaterThan(_) => ">",
        BinaryOperator::LessThanOrEqual(_) => "<=",
        BinaryOperator::GreaterThanOrEqual(_) => ">=",
        BinaryOperator::Addition(_) => "+",
        BinaryOperator::Subtraction(_) => "-",
        BinaryOperator::Multiplication(_) => "*",
        BinaryOperator::Division(_) => "/",
        BinaryOperator::Modulo(_) => "%",
        BinaryOperator::Exponentiation(_) => "**",
        BinaryOperator::StringConcat(_) => ".",
        BinaryOperator::And(_) => "&&",
        BinaryOperator::Or(_) => "||",
        BinaryOperator::BitwiseAnd(_) => "&",
        BinaryOperator::BitwiseOr(_) => "|",
        BinaryOperator::BitwiseXor(_) => "^",
        BinaryOperator::LeftShift(_) => "<<",
        BinaryOperator::RightShift(_) => ">>",
        BinaryOperator::NullCoalesce(_) => "??",
        BinaryOperator::Spaceship(_) => "<=>",
        BinaryOperator::LowAnd(_) => "and",
        BinaryOperator::LowOr(_) => "or",
        BinaryOperator::LowXor(_) => "xor",
        BinaryOperator::Instanceof(_) => "instanceof",
        BinaryOperator::AngledNotEqual(_) => "<>",
    }
}
