//! Conservative possible-value discovery for expressions
//!
//! Answers "what scalar values can this expression hold here" by looking
//! only at literals, ternary branches, and straight-line assignments among
//! the preceding sibling statements. Anything beyond that yields the
//! inconclusive set, so callers act only on evidence actually present in
//! the source.

use std::collections::BTreeSet;

use mago_span::HasSpan;
use mago_syntax::ast::*;

use crate::classify::{
    integer_literal_value, span_text, string_literal_value, unwrap_parenthesized, variable_name,
};
use crate::visitor::Visitor;

/// Assignment chains longer than this stop discovery
const MAX_TRACE_DEPTH: usize = 8;

/// A scalar PHP value that discovery can prove
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhpValue {
    Int(i64),
    Str(String),
    Bool(bool),
    Null,
}

impl std::fmt::Display for PhpValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhpValue::Int(value) => write!(f, "{}", value),
            PhpValue::Str(value) => write!(f, "'{}'", value),
            PhpValue::Bool(true) => write!(f, "true"),
            PhpValue::Bool(false) => write!(f, "false"),
            PhpValue::Null => write!(f, "null"),
        }
    }
}

/// The set of values an expression was proven to possibly hold.
///
/// The empty set means discovery gave up, not that the expression has no
/// value. A one-element set is the only actionable outcome for checks
/// that need certainty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueSet {
    values: BTreeSet<PhpValue>,
}

impl ValueSet {
    /// The inconclusive result: nothing could be proven
    pub fn inconclusive() -> Self {
        Self::default()
    }

    /// A set holding exactly one proven value
    pub fn singleton(value: PhpValue) -> Self {
        let mut values = BTreeSet::new();
        values.insert(value);
        Self { values }
    }

    /// True when discovery could not prove anything
    pub fn is_inconclusive(&self) -> bool {
        self.values.is_empty()
    }

    /// The proven value, if there is exactly one
    pub fn as_singleton(&self) -> Option<&PhpValue> {
        if self.values.len() == 1 {
            self.values.iter().next()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &PhpValue) -> bool {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhpValue> {
        self.values.iter()
    }

    /// Merge two conclusive sets; either side being inconclusive poisons
    /// the result
    pub fn union(self, other: ValueSet) -> ValueSet {
        if self.is_inconclusive() || other.is_inconclusive() {
            return ValueSet::inconclusive();
        }
        let mut values = self.values;
        values.extend(other.values);
        ValueSet { values }
    }
}

/// Discover the possible values of an expression.
///
/// `preceding` holds the sibling statements before the one containing the
/// expression, in source order. Assignment tracing walks them backwards.
pub fn discover<'a>(
    expr: &Expression<'a>,
    preceding: &[&Statement<'a>],
    source: &str,
) -> ValueSet {
    discover_at(expr, preceding, source, MAX_TRACE_DEPTH)
}

fn discover_at<'a>(
    expr: &Expression<'a>,
    preceding: &[&Statement<'a>],
    source: &str,
    depth: usize,
) -> ValueSet {
    if depth == 0 {
        return ValueSet::inconclusive();
    }

    let expr = unwrap_parenthesized(expr);

    if let Some(value) = literal_value(expr, source) {
        return ValueSet::singleton(value);
    }

    match expr {
        Expression::Conditional(ternary) => {
            // Short ternaries hide the then-branch, skip them
            let Some(then_expr) = &ternary.then else {
                return ValueSet::inconclusive();
            };
            let then_set = discover_at(then_expr, preceding, source, depth - 1);
            let else_set = discover_at(&ternary.r#else, preceding, source, depth - 1);
            then_set.union(else_set)
        }
        Expression::Variable(Variable::Direct(var)) => {
            let name = span_text(source, var.span());
            trace_assignments(name, preceding, source, depth)
        }
        _ => ValueSet::inconclusive(),
    }
}

/// Extract the value of a scalar literal expression, if it is one
pub fn literal_value(expr: &Expression<'_>, source: &str) -> Option<PhpValue> {
    if let Some(int) = integer_literal_value(expr) {
        return Some(PhpValue::Int(int));
    }
    if let Some(string) = string_literal_value(expr, source) {
        return Some(PhpValue::Str(string));
    }
    match expr {
        Expression::Literal(Literal::True(_)) => Some(PhpValue::Bool(true)),
        Expression::Literal(Literal::False(_)) => Some(PhpValue::Bool(false)),
        Expression::Literal(Literal::Null(_)) => Some(PhpValue::Null),
        _ => None,
    }
}

/// Walk preceding statements backwards looking for the closest write to
/// a variable.
///
/// A plain `$name = <rhs>` hands discovery over to the right-hand side.
/// Any other kind of write (compound assignment, increment, foreach
/// binding, destructuring, a write buried in a nested block) makes the
/// variable inconclusive, as does finding no write at all.
fn trace_assignments<'a>(
    name: &str,
    preceding: &[&Statement<'a>],
    source: &str,
    depth: usize,
) -> ValueSet {
    for (index, stmt) in preceding.iter().enumerate().rev() {
        let stmt = *stmt;
        if let Statement::Expression(expr_stmt) = stmt {
            if let Expression::Assignment(assign) = &expr_stmt.expression {
                if variable_name(&assign.lhs, source) == Some(name) {
                    if matches!(assign.operator, AssignmentOperator::Assign(_)) {
                        return discover_at(&assign.rhs, &preceding[..index], source, depth - 1);
                    }
                    return ValueSet::inconclusive();
                }
            }
        }

        if statement_writes(stmt, name, source) {
            return ValueSet::inconclusive();
        }
    }

    ValueSet::inconclusive()
}

/// Detect any write to a named variable anywhere inside a statement
fn statement_writes<'a>(stmt: &Statement<'a>, name: &str, source: &str) -> bool {
    if let Statement::Foreach(foreach) = stmt {
        if foreach_target_writes(&foreach.target, name, source) {
            return true;
        }
    }

    let mut scan = WriteScan {
        name,
        found: false,
    };
    scan.traverse_statement(stmt, source);
    scan.found
}

fn foreach_target_writes(target: &ForeachTarget<'_>, name: &str, source: &str) -> bool {
    match target {
        ForeachTarget::Value(value) => variable_name(&value.value, source) == Some(name),
        ForeachTarget::KeyValue(kv) => {
            variable_name(&kv.key, source) == Some(name)
                || variable_name(&kv.value, source) == Some(name)
        }
    }
}

struct WriteScan<'s> {
    name: &'s str,
    found: bool,
}

impl<'a> Visitor<'a> for WriteScan<'_> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, source: &str) -> bool {
        if self.found {
            return false;
        }
        if let Statement::Foreach(foreach) = stmt {
            if foreach_target_writes(&foreach.target, self.name, source) {
                self.found = true;
                return false;
            }
        }
        true
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, source: &str) -> bool {
        if self.found {
            return false;
        }

        match expr {
            Expression::Assignment(assign) => {
                if variable_name(&assign.lhs, source) == Some(self.name) {
                    self.found = true;
                } else if matches!(
                    &*assign.lhs,
                    Expression::List(_) | Expression::Array(_) | Expression::LegacyArray(_)
                ) && span_text(source, assign.lhs.span()).contains(self.name)
                {
                    // Destructuring: a textual hit is enough to give up
                    self.found = true;
                }
            }
            Expression::UnaryPostfix(postfix) => {
                // The only postfix operators are ++ and --, both writes
                if variable_name(&postfix.operand, source) == Some(self.name) {
                    self.found = true;
                }
            }
            Expression::UnaryPrefix(prefix) => {
                let text = span_text(source, prefix.span());
                if (text.starts_with("++") || text.starts_with("--"))
                    && variable_name(&prefix.operand, source) == Some(self.name)
                {
                    self.found = true;
                }
            }
            _ => {}
        }

        !self.found
    }
}
