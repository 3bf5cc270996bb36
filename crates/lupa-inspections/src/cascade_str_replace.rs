//! Inspection: str_replace() call chains that can be merged
//!
//! Consecutive str_replace() assignments threaded through one variable, and
//! str_replace() calls nested in the subject argument, collapse into a single
//! call with merged search and replace lists. Also flags replacement arrays
//! whose entries are all the same string.
//!
//! Example: `$x = str_replace('a', 'b', $s); $x = str_replace('c', 'd', $x);`
//! merges into `$x = str_replace(array('a', 'c'), array('b', 'd'), $s);`

use mago_span::HasSpan;
use mago_syntax::ast::*;

use lupa_core::classify::{
    argument_values, array_elements, function_name, span_text, string_literal_raw,
    unwrap_parenthesized, variable_name,
};
use lupa_core::equivalence::are_equivalent;
use lupa_core::{statement_deletion_span, Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_CASCADING: &str = "This call can be merged with the previous.";
const MESSAGE_NESTING: &str = "This call can be merged with its parent.";
const MESSAGE_SIMPLIFY: &str = "Can be replaced with the string from the array.";

const MERGE_FIX_TITLE: &str = "Merge excessive calls";
const SIMPLIFY_FIX_TITLE: &str = "Simplify this argument";

/// Check a parsed PHP program for mergeable str_replace() chains
pub fn check_cascade_str_replace<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = CascadeStrReplaceVisitor {
        source,
        short_arrays: config.prefer_short_array_syntax,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct CascadeStrReplaceVisitor<'s> {
    source: &'s str,
    short_arrays: bool,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for CascadeStrReplaceVisitor<'s> {
    fn visit_statement_sequence(&mut self, statements: &[&Statement<'a>], _source: &str) {
        for index in 0..statements.len() {
            self.check_statement(statements, index);
        }
    }
}

impl<'s> CascadeStrReplaceVisitor<'s> {
    fn check_statement<'a>(&mut self, statements: &[&Statement<'a>], index: usize) {
        let statement = statements[index];
        let Some((call, storage)) = self.replace_call_context(statement) else {
            return;
        };
        let arguments = argument_values(&call.argument_list);
        if arguments.len() != 3 {
            return;
        }

        if index > 0 {
            self.check_cascading(call, &arguments, storage, statements[index - 1]);
        }
        self.check_nested(call, arguments[2]);

        if array_elements(arguments[1]).is_some() {
            self.check_simplification(arguments[1]);
        } else if string_literal_raw(arguments[1], self.source).is_some()
            && array_elements(arguments[0]).is_some()
        {
            self.check_simplification(arguments[0]);
        }
    }

    /// A str_replace()/str_ireplace() call stored by this statement, either as
    /// the value of a plain assignment or as a return value. The storage slot
    /// is the assignment target, or `None` for returns.
    fn replace_call_context<'a, 'b>(
        &self,
        statement: &'b Statement<'a>,
    ) -> Option<(&'b FunctionCall<'a>, Option<&'b Expression<'a>>)> {
        match statement {
            Statement::Return(ret) => {
                let value = match &ret.value {
                    Some(value) => value,
                    None => return None,
                };
                Some((self.replace_call(value)?, None))
            }
            Statement::Expression(expr_stmt) => {
                let Expression::Assignment(assign) = &expr_stmt.expression else {
                    return None;
                };
                if !matches!(assign.operator, AssignmentOperator::Assign(_)) {
                    return None;
                }
                Some((self.replace_call(&assign.rhs)?, Some(&assign.lhs)))
            }
            _ => None,
        }
    }

    fn replace_call<'a, 'b>(&self, expr: &'b Expression<'a>) -> Option<&'b FunctionCall<'a>> {
        let value = unwrap_parenthesized(expr);
        let Expression::Call(Call::Function(func_call)) = value else {
            return None;
        };
        let name = function_name(func_call, self.source)?;
        if name.eq_ignore_ascii_case("str_replace") || name.eq_ignore_ascii_case("str_ireplace") {
            Some(func_call)
        } else {
            None
        }
    }

    /// `$x = str_replace(..., $subject); $x = str_replace(..., $x);` runs two
    /// passes over the same string. Both calls fold into one as long as the
    /// chain ends up in the variable it was threaded through.
    fn check_cascading<'a>(
        &mut self,
        call: &FunctionCall<'a>,
        arguments: &[&Expression<'a>],
        storage: Option<&Expression<'a>>,
        previous_statement: &Statement<'a>,
    ) {
        let Statement::Expression(expr_stmt) = previous_statement else {
            return;
        };
        let Expression::Assignment(previous_assign) = &expr_stmt.expression else {
            return;
        };
        if !matches!(previous_assign.operator, AssignmentOperator::Assign(_)) {
            return;
        }
        let Some(previous_call) = self.replace_call(&previous_assign.rhs) else {
            return;
        };

        // str_replace and str_ireplace do not mix
        let Some(current_name) = function_name(call, self.source) else {
            return;
        };
        let Some(previous_name) = function_name(previous_call, self.source) else {
            return;
        };
        if !current_name.eq_ignore_ascii_case(previous_name) {
            return;
        }

        let Some(transition) = variable_name(&previous_assign.lhs, self.source) else {
            return;
        };
        let Some(subject_name) = variable_name(arguments[2], self.source) else {
            return;
        };
        if transition != subject_name {
            return;
        }

        // The merged result must land where the chain already ends up. For a
        // return the intermediate variable itself is that slot.
        let result_storage = match storage {
            Some(container) => container,
            None => arguments[2],
        };
        if !are_equivalent(&previous_assign.lhs, result_storage, self.source) {
            return;
        }

        let Some(merged) = self.merged_call_text(call, previous_call) else {
            return;
        };
        let fix = Fix::new(
            MERGE_FIX_TITLE,
            vec![
                FixEdit::expression(call.span(), merged),
                FixEdit::statement(
                    statement_deletion_span(self.source, previous_statement.span()),
                    String::new(),
                ),
            ],
        );
        self.problems.push(
            Problem::warning("cascade_str_replace", MESSAGE_CASCADING, call.span()).with_fix(fix),
        );
    }

    /// `str_replace(..., str_replace(..., $subject))` with matching names
    /// inlines the inner call into the outer one.
    fn check_nested<'a>(&mut self, parent_call: &FunctionCall<'a>, subject: &Expression<'a>) {
        let Expression::Call(Call::Function(nested)) = subject else {
            return;
        };
        let Some(parent_name) = function_name(parent_call, self.source) else {
            return;
        };
        let Some(nested_name) = function_name(nested, self.source) else {
            return;
        };
        if !parent_name.eq_ignore_ascii_case(nested_name) {
            return;
        }

        let Some(merged) = self.merged_call_text(parent_call, nested) else {
            return;
        };
        let fix = Fix::new(
            MERGE_FIX_TITLE,
            vec![FixEdit::expression(parent_call.span(), merged)],
        );
        self.problems.push(
            Problem::warning("cascade_str_replace", MESSAGE_NESTING, nested.span()).with_fix(fix),
        );
    }

    /// Render the merged call. `eliminate` is the pass that runs first (the
    /// previous assignment, or the nested call), so its search and replace
    /// entries come first and its subject becomes the merged subject.
    fn merged_call_text<'a>(
        &self,
        patch: &FunctionCall<'a>,
        eliminate: &FunctionCall<'a>,
    ) -> Option<String> {
        let patch_arguments = argument_values(&patch.argument_list);
        let eliminate_arguments = argument_values(&eliminate.argument_list);
        if patch_arguments.len() != 3 || eliminate_arguments.len() != 3 {
            return None;
        }

        let mut searches = self.list_fragments(eliminate_arguments[0])?;
        searches.extend(self.list_fragments(patch_arguments[0])?);

        let replaces = self.merged_replaces(&patch_arguments, &eliminate_arguments)?;

        let subject = span_text(self.source, eliminate_arguments[2].span());
        let callee = span_text(self.source, patch.function.span());
        Some(format!(
            "{}({}, {}, {})",
            callee,
            self.render_list(&searches),
            replaces,
            subject
        ))
    }

    /// Replacement lists merge like search lists, with one shortcut: when both
    /// calls boil down to the same single replacement string, the merged call
    /// keeps that scalar instead of repeating it per search entry.
    fn merged_replaces(
        &self,
        patch_arguments: &[&Expression<'_>],
        eliminate_arguments: &[&Expression<'_>],
    ) -> Option<String> {
        if let (Some(to_scalar), Some(from_scalar)) = (
            self.scalar_replace(patch_arguments[1]),
            self.scalar_replace(eliminate_arguments[1]),
        ) {
            if to_scalar == from_scalar {
                return Some(to_scalar.to_string());
            }
        }

        let mut replaces = self.expanded_replaces(eliminate_arguments)?;
        replaces.extend(self.expanded_replaces(patch_arguments)?);
        Some(self.render_list(&replaces))
    }

    /// The replacement as a single string literal, unboxing one-element lists.
    fn scalar_replace(&self, argument: &Expression<'_>) -> Option<&'s str> {
        match array_elements(argument) {
            Some(elements) => {
                if elements.len() != 1 {
                    return None;
                }
                let ArrayElement::Value(value_element) = elements[0] else {
                    return None;
                };
                string_literal_raw(value_element.value, self.source)
            }
            None => string_literal_raw(argument, self.source),
        }
    }

    /// One replacement entry per search entry. A scalar replacement paired
    /// with a multi-entry search list repeats for each search, so positions
    /// stay aligned after the lists are concatenated.
    fn expanded_replaces(&self, arguments: &[&Expression<'_>]) -> Option<Vec<&'s str>> {
        let replace = arguments[1];
        match array_elements(replace) {
            Some(_) => self.list_fragments(replace),
            None => {
                let text = span_text(self.source, replace.span());
                let count = match array_elements(arguments[0]) {
                    Some(searches) if searches.len() > 1 => searches.len(),
                    _ => 1,
                };
                Some(vec![text; count])
            }
        }
    }

    /// Entry texts of an array argument, or the argument itself as a
    /// one-entry list. Keyed and spread entries cannot be concatenated
    /// positionally, so they block the merge.
    fn list_fragments(&self, argument: &Expression<'_>) -> Option<Vec<&'s str>> {
        match array_elements(argument) {
            Some(elements) => {
                let mut fragments = Vec::with_capacity(elements.len());
                for element in elements {
                    if !matches!(element, ArrayElement::Value(_)) {
                        return None;
                    }
                    fragments.push(span_text(self.source, element.span()));
                }
                Some(fragments)
            }
            None => Some(vec![span_text(self.source, argument.span())]),
        }
    }

    fn render_list(&self, fragments: &[&str]) -> String {
        if self.short_arrays {
            format!("[{}]", fragments.join(", "))
        } else {
            format!("array({})", fragments.join(", "))
        }
    }

    /// An array argument whose entries are all the same string literal is
    /// just that string.
    fn check_simplification<'a>(&mut self, list_expr: &Expression<'a>) {
        let Some(elements) = array_elements(list_expr) else {
            return;
        };
        if elements.is_empty() {
            return;
        }

        let mut single: Option<&str> = None;
        for element in elements {
            let ArrayElement::Value(value_element) = element else {
                return;
            };
            let Some(text) = string_literal_raw(value_element.value, self.source) else {
                return;
            };
            match single {
                None => single = Some(text),
                Some(seen) if seen == text => {}
                Some(_) => return,
            }
        }
        let Some(text) = single else {
            return;
        };

        let fix = Fix::new(
            SIMPLIFY_FIX_TITLE,
            vec![FixEdit::expression(list_expr.span(), text.to_string())],
        );
        self.problems.push(
            Problem::weak("cascade_str_replace", MESSAGE_SIMPLIFY, list_expr.span()).with_fix(fix),
        );
    }
}

use crate::registry::Inspection;

pub struct CascadeStrReplaceInspection;

impl Inspection for CascadeStrReplaceInspection {
    fn name(&self) -> &'static str {
        "cascade_str_replace"
    }

    fn description(&self) -> &'static str {
        "Merge chained or nested str_replace() calls and flatten single-string argument arrays"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_cascade_str_replace(program, source, config)
    }
}
