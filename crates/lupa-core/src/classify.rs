//! Structural classification of PHP AST nodes
//!
//! Inspections ask the same questions over and over: is this a call to a
//! given function, what string does this literal hold, which variable is
//! this. The helpers here answer them uniformly so each inspection can
//! stay focused on its own shape matching.

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

/// Slice the source text covered by a span
pub fn span_text<'s>(source: &'s str, span: Span) -> &'s str {
    &source[span.start.offset as usize..span.end.offset as usize]
}

/// Extract the name of a directly-named function call.
///
/// Returns `None` for dynamic callables like `$fn()` or `('strlen')()`.
/// A leading namespace backslash is stripped so `\pow(...)` and
/// `pow(...)` classify the same.
pub fn function_name<'s>(func_call: &FunctionCall<'_>, source: &'s str) -> Option<&'s str> {
    if let Expression::Identifier(ident) = func_call.function {
        let name = span_text(source, ident.span());
        Some(name.strip_prefix('\\').unwrap_or(name))
    } else {
        None
    }
}

/// Check whether a call targets a function by name, case-insensitively
pub fn is_function_named(func_call: &FunctionCall<'_>, source: &str, name: &str) -> bool {
    function_name(func_call, source)
        .map(|n| n.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

/// Collect argument value expressions in call order
pub fn argument_values<'a, 'b>(list: &'b ArgumentList<'a>) -> Vec<&'b Expression<'a>> {
    list.arguments.iter().map(|arg| arg.value()).collect()
}

/// Strip any number of wrapping parentheses
pub fn unwrap_parenthesized<'a, 'b>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    let mut current = expr;
    while let Expression::Parenthesized(paren) = current {
        current = &paren.expression;
    }
    current
}

/// Extract the name of a plain `$variable`, including the dollar sign
pub fn variable_name<'s>(expr: &Expression<'_>, source: &'s str) -> Option<&'s str> {
    if let Expression::Variable(Variable::Direct(var)) = expr {
        Some(span_text(source, var.span()))
    } else {
        None
    }
}

/// Get a string literal's text with its quotes
pub fn string_literal_raw<'s>(expr: &Expression<'_>, source: &'s str) -> Option<&'s str> {
    if let Expression::Literal(Literal::String(string_lit)) = expr {
        Some(span_text(source, string_lit.span()))
    } else {
        None
    }
}

/// Get the content of a string literal, between the quotes, unescaped.
///
/// Escape handling is limited to what quoted literals share: `\\` plus
/// the closing quote. Double-quoted interpolation never reaches here
/// since interpolated strings parse as composite nodes, not literals.
pub fn string_literal_value(expr: &Expression<'_>, source: &str) -> Option<String> {
    let raw = string_literal_raw(expr, source)?;
    if raw.len() < 2 {
        return None;
    }

    let quote = raw.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &raw[1..raw.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('\\') => value.push('\\'),
                Some(escaped) if escaped == quote => value.push(quote),
                Some('n') if quote == '"' => value.push('\n'),
                Some('t') if quote == '"' => value.push('\t'),
                Some('r') if quote == '"' => value.push('\r'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            }
        } else {
            value.push(c);
        }
    }

    Some(value)
}

/// Extract an integer literal's value, handling a leading minus sign
pub fn integer_literal_value(expr: &Expression<'_>) -> Option<i64> {
    match expr {
        Expression::Literal(Literal::Integer(int_lit)) => int_lit.value.map(|v| v as i64),
        Expression::UnaryPrefix(unary) => {
            if let UnaryPrefixOperator::Negation(_) = &unary.operator {
                if let Expression::Literal(Literal::Integer(int_lit)) = unary.operand {
                    return int_lit.value.map(|v| -(v as i64));
                }
            }
            None
        }
        _ => None,
    }
}

/// Check whether an expression is an array literal, either syntax
pub fn is_array_expression(expr: &Expression<'_>) -> bool {
    matches!(expr, Expression::Array(_) | Expression::LegacyArray(_))
}

/// Collect the elements of an array literal, either syntax
pub fn array_elements<'a, 'b>(expr: &'b Expression<'a>) -> Option<Vec<&'b ArrayElement<'a>>> {
    match expr {
        Expression::Array(array) => Some(array.elements.iter().collect()),
        Expression::LegacyArray(array) => Some(array.elements.iter().collect()),
        _ => None,
    }
}
