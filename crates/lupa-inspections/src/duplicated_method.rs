//! Inspection: methods duplicating the parent class method
//!
//! A method whose body matches the same-named method of its parent
//! class statement for statement adds nothing. With equal visibility it
//! can be dropped outright; with differing visibility it should proxy
//! to the parent so the body lives in one place. Only parent classes
//! declared in the same file are considered.
//!
//! Example: `class B extends A` re-declaring A's `render()` verbatim →
//! "Drop the method"

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::span_text;
use lupa_core::equivalence::are_equivalent;
use lupa_core::{statement_deletion_span, Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_IDENTICAL_PATTERN: &str =
    "'%s' method can be dropped, as it identical to parent's one.";
const MESSAGE_PROXY_PATTERN: &str =
    "'%s' method should call parent's one instead of duplicating code.";
const DROP_FIX_TITLE: &str = "Drop the method";
const PROXY_FIX_TITLE: &str = "Proxy call to parent";

/// Check a parsed PHP program for methods duplicating their parent's
pub fn check_duplicated_method<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    let mut classes = Vec::new();
    collect_classes(program.statements.as_slice(), &mut classes);

    let mut problems = Vec::new();
    for class in &classes {
        let Some(parent_name) = extends_name(class, source) else {
            continue;
        };
        let own_offset = class.name.span().start.offset;
        let parent = classes.iter().find(|candidate| {
            candidate.name.value.eq_ignore_ascii_case(&parent_name)
                && candidate.name.span().start.offset != own_offset
        });
        if let Some(parent) = parent {
            check_class_pair(class, parent, source, config, &mut problems);
        }
    }
    problems
}

fn collect_classes<'a, 'b>(statements: &'b [Statement<'a>], classes: &mut Vec<&'b Class<'a>>) {
    for statement in statements {
        match statement {
            Statement::Class(class) => classes.push(class),
            Statement::Namespace(ns) => {
                let inner = match &ns.body {
                    NamespaceBody::Implicit(body) => &body.statements,
                    NamespaceBody::BraceDelimited(body) => &body.statements,
                };
                collect_classes(inner.as_slice(), classes);
            }
            Statement::Block(block) => collect_classes(block.statements.as_slice(), classes),
            _ => {}
        }
    }
}

fn extends_name<'a>(class: &Class<'a>, source: &str) -> Option<String> {
    let extends = class.extends.as_ref()?;
    let parent = extends.types.iter().next()?;
    Some(
        span_text(source, parent.span())
            .trim_start_matches('\\')
            .to_string(),
    )
}

fn check_class_pair<'a>(
    class: &Class<'a>,
    parent: &Class<'a>,
    source: &str,
    config: &InspectionConfig,
    problems: &mut Vec<Problem>,
) {
    for member in class.members.iter() {
        let ClassLikeMember::Method(method) = member else {
            continue;
        };
        let MethodBody::Concrete(body) = &method.body else {
            continue;
        };
        let statements = body.statements.as_slice();
        if statements.is_empty() || statements.len() > config.max_duplicated_method_lines {
            continue;
        }

        let Some((parent_method, parent_body)) = find_concrete_method(parent, method.name.value)
        else {
            continue;
        };
        if access_level(parent_method) == Access::Private {
            continue;
        }
        let parent_statements = parent_body.statements.as_slice();
        if parent_statements.len() != statements.len() {
            continue;
        }
        let identical = statements
            .iter()
            .zip(parent_statements.iter())
            .all(|(own, theirs)| statements_equivalent(own, theirs, source));
        if !identical {
            continue;
        }

        if access_level(method) == access_level(parent_method) {
            let fix = Fix::new(
                DROP_FIX_TITLE,
                vec![FixEdit::statement(
                    statement_deletion_span(source, method.span()),
                    String::new(),
                )],
            );
            problems.push(
                Problem::warning(
                    "duplicated_method",
                    MESSAGE_IDENTICAL_PATTERN.replace("%s", method.name.value),
                    method.name.span(),
                )
                .with_fix(fix),
            );
        } else {
            let fix = Fix::new(
                PROXY_FIX_TITLE,
                vec![FixEdit::raw(body.span(), proxy_body(method, body, source))],
            );
            problems.push(
                Problem::warning(
                    "duplicated_method",
                    MESSAGE_PROXY_PATTERN.replace("%s", method.name.value),
                    method.name.span(),
                )
                .with_fix(fix),
            );
        }
    }
}

/// Look up a same-named method on the parent; an abstract match yields
/// None since there is no body to duplicate.
fn find_concrete_method<'a, 'b>(
    class: &'b Class<'a>,
    name: &str,
) -> Option<(&'b Method<'a>, &'b Block<'a>)> {
    for member in class.members.iter() {
        if let ClassLikeMember::Method(method) = member {
            if method.name.value.eq_ignore_ascii_case(name) {
                if let MethodBody::Concrete(body) = &method.body {
                    return Some((method, body));
                }
                return None;
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Protected,
    Private,
}

fn access_level(method: &Method<'_>) -> Access {
    for modifier in method.modifiers.iter() {
        match modifier {
            Modifier::Private(_) => return Access::Private,
            Modifier::Protected(_) => return Access::Protected,
            Modifier::Public(_) => return Access::Public,
            _ => {}
        }
    }
    Access::Public
}

/// Structural comparison of two statements. Expression and return
/// statements compare their expressions, everything else falls back to
/// whitespace-normalized text.
fn statements_equivalent<'a>(a: &Statement<'a>, b: &Statement<'a>, source: &str) -> bool {
    match (a, b) {
        (Statement::Expression(own), Statement::Expression(theirs)) => {
            are_equivalent(&own.expression, &theirs.expression, source)
        }
        (Statement::Return(own), Statement::Return(theirs)) => {
            match (&own.value, &theirs.value) {
                (Some(own_value), Some(their_value)) => {
                    are_equivalent(own_value, their_value, source)
                }
                (None, None) => true,
                _ => false,
            }
        }
        _ => normalized_text(source, a.span()) == normalized_text(source, b.span()),
    }
}

fn normalized_text(source: &str, span: Span) -> String {
    span_text(source, span)
        .split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the forwarding body for the proxy fix
fn proxy_body<'a>(method: &Method<'a>, body: &Block<'a>, source: &str) -> String {
    let mut arguments = Vec::new();
    for param in method.parameter_list.parameters.iter() {
        arguments.push(span_text(source, param.variable.span()).to_string());
    }
    let call = format!("parent::{}({})", method.name.value, arguments.join(", "));
    if returns_value(method, body, source) {
        format!("{{ return {}; }}", call)
    } else {
        format!("{{ {}; }}", call)
    }
}

fn returns_value<'a>(method: &Method<'a>, body: &Block<'a>, source: &str) -> bool {
    if let Some(return_hint) = &method.return_type_hint {
        return !matches!(&return_hint.hint, Hint::Void(_));
    }
    let mut finder = ReturnValueFinder { found: false };
    for statement in body.statements.iter() {
        finder.traverse_statement(statement, source);
    }
    finder.found
}

struct ReturnValueFinder {
    found: bool,
}

impl<'a> Visitor<'a> for ReturnValueFinder {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if self.found {
            return false;
        }
        if let Statement::Return(ret) = stmt {
            if ret.value.is_some() {
                self.found = true;
                return false;
            }
        }
        !matches!(stmt, Statement::Function(_) | Statement::Class(_))
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        !self.found && !matches!(expr, Expression::Closure(_) | Expression::ArrowFunction(_))
    }
}

use crate::registry::Inspection;

pub struct DuplicatedMethodInspection;

impl Inspection for DuplicatedMethodInspection {
    fn name(&self) -> &'static str {
        "duplicated_method"
    }

    fn description(&self) -> &'static str {
        "Flag methods that duplicate the parent class method body"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_duplicated_method(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use lupa_core::{Document, FixOutcome, Severity};
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        check_with(source, &InspectionConfig::default())
    }

    fn check_with(source: &str, config: &InspectionConfig) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_duplicated_method(program, source, config)
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

    // ==================== Reporting Tests ====================

    #[test]
    fn test_identical_method_can_be_dropped() {
        let source = "<?php\nclass A {\n    public function render()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    public function render()\n    {\n        return 1;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "'render' method can be dropped, as it identical to parent's one."
        );
        assert_eq!(problems[0].severity, Severity::Warning);
        assert_eq!(
            transform(source),
            "<?php\nclass A {\n    public function render()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    }\n"
        );
    }

    #[test]
    fn test_differing_access_proxies_to_parent() {
        let source = "<?php\nclass A {\n    protected function compute($a, $b)\n    {\n        return $a + $b;\n    }\n}\nclass B extends A {\n    public function compute($a, $b)\n    {\n        return $a + $b;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            problems[0].message,
            "'compute' method should call parent's one instead of duplicating code."
        );
        assert_eq!(
            transform(source),
            "<?php\nclass A {\n    protected function compute($a, $b)\n    {\n        return $a + $b;\n    }\n}\nclass B extends A {\n    public function compute($a, $b)\n    { return parent::compute($a, $b); }\n}\n"
        );
    }

    #[test]
    fn test_void_method_proxies_without_return() {
        let source = "<?php\nclass A {\n    protected function touch($path): void\n    {\n        $this->path = $path;\n    }\n}\nclass B extends A {\n    public function touch($path): void\n    {\n        $this->path = $path;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            transform(source),
            "<?php\nclass A {\n    protected function touch($path): void\n    {\n        $this->path = $path;\n    }\n}\nclass B extends A {\n    public function touch($path): void\n    { parent::touch($path); }\n}\n"
        );
    }

    #[test]
    fn test_multi_statement_bodies_compared() {
        let source = "<?php\nclass A {\n    public function reset()\n    {\n        $this->items = [];\n        $this->count = 0;\n    }\n}\nclass B extends A {\n    public function reset()\n    {\n        $this->items = [];\n        $this->count = 0;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
    }

    // ==================== Skip Tests ====================

    #[test]
    fn test_different_bodies_are_fine() {
        let source = "<?php\nclass A {\n    public function render()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    public function render()\n    {\n        return 2;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_different_statement_counts_are_fine() {
        let source = "<?php\nclass A {\n    public function render()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    public function render()\n    {\n        $this->log();\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_private_parent_method_is_fine() {
        let source = "<?php\nclass A {\n    private function render()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    private function render()\n    {\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_abstract_parent_method_is_fine() {
        let source = "<?php\nabstract class A {\n    abstract public function render();\n}\nclass B extends A {\n    public function render()\n    {\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_parent_outside_file_is_fine() {
        let source = "<?php\nclass B extends A {\n    public function render()\n    {\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_no_parent_is_fine() {
        let source = "<?php\nclass A {\n    public function render()\n    {\n        return 1;\n    }\n}\nclass B {\n    public function render()\n    {\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_empty_bodies_are_fine() {
        let source = "<?php\nclass A {\n    public function noop()\n    {\n    }\n}\nclass B extends A {\n    public function noop()\n    {\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_oversized_method_is_fine() {
        let config = InspectionConfig {
            max_duplicated_method_lines: 1,
            ..InspectionConfig::default()
        };
        let source = "<?php\nclass A {\n    public function reset()\n    {\n        $this->items = [];\n        $this->count = 0;\n    }\n}\nclass B extends A {\n    public function reset()\n    {\n        $this->items = [];\n        $this->count = 0;\n    }\n}\n";
        assert!(check_with(source, &config).is_empty());
    }

    #[test]
    fn test_missing_parent_method_is_fine() {
        let source = "<?php\nclass A {\n    public function other()\n    {\n        return 1;\n    }\n}\nclass B extends A {\n    public function render()\n    {\n        return 1;\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }
}
