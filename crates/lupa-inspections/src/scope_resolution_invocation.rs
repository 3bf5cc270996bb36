//! Inspection: instance methods invoked through the scope resolution operator
//!
//! `self::helper()` on a non-static method works, but it bypasses late
//! static binding and reads like a static call. Inside an instance method
//! the call belongs on `$this`.
//!
//! Example: `self::send()` inside an instance method becomes `$this->send()`

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::span_text;
use lupa_core::{Fix, FixEdit, Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_THIS_PATTERN: &str = "'$this->%s(...)' should be used instead.";
const MESSAGE_EXPRESSION_PATTERN: &str = "'...->%s(...)' should be used instead.";
const FIX_TITLE: &str = "Use -> instead";

/// Check a parsed PHP program for static-style calls to instance methods
pub fn check_scope_resolution_invocation<'a>(
    program: &Program<'a>,
    source: &str,
    _config: &InspectionConfig,
) -> Vec<Problem> {
    let mut visitor = ScopeResolutionVisitor {
        source,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

struct ScopeResolutionVisitor<'s> {
    source: &'s str,
    problems: Vec<Problem>,
}

impl<'a, 's> Visitor<'a> for ScopeResolutionVisitor<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Class(class) = stmt {
            self.check_class(class);
        }
        true
    }
}

struct MethodInfo {
    name: String,
    is_static: bool,
    is_concrete: bool,
}

impl<'s> ScopeResolutionVisitor<'s> {
    fn check_class<'a>(&mut self, class: &Class<'a>) {
        let mut methods = Vec::new();
        for member in class.members.iter() {
            if let ClassLikeMember::Method(method) = member {
                methods.push(MethodInfo {
                    name: method.name.value.to_ascii_lowercase(),
                    is_static: method.modifiers.get_static().is_some(),
                    is_concrete: matches!(method.body, MethodBody::Concrete(_)),
                });
            }
        }

        for member in class.members.iter() {
            if let ClassLikeMember::Method(method) = member {
                if let MethodBody::Concrete(body) = &method.body {
                    let mut scanner = MethodBodyScanner {
                        source: self.source,
                        class_name: class.name.value,
                        methods: &methods,
                        current_method: method.name.value,
                        current_is_static: method.modifiers.get_static().is_some(),
                        problems: &mut self.problems,
                    };
                    for statement in body.statements.iter() {
                        scanner.traverse_statement(statement, self.source);
                    }
                }
            }
        }
    }
}

/// Walks one method body. Closures get their own scope where `self::` no
/// longer means this method's class binding, so they are not descended into.
struct MethodBodyScanner<'c> {
    source: &'c str,
    class_name: &'c str,
    methods: &'c [MethodInfo],
    current_method: &'c str,
    current_is_static: bool,
    problems: &'c mut Vec<Problem>,
}

impl<'a, 'c> Visitor<'a> for MethodBodyScanner<'c> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        !matches!(stmt, Statement::Function(_) | Statement::Class(_))
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if matches!(expr, Expression::Closure(_) | Expression::ArrowFunction(_)) {
            return false;
        }
        if let Expression::Call(Call::StaticMethod(static_call)) = expr {
            self.check_call(static_call);
        }
        true
    }
}

impl<'c> MethodBodyScanner<'c> {
    fn check_call(&mut self, static_call: &StaticMethodCall<'_>) {
        let receiver = &*static_call.class;
        // Keywords and class names appear bare in receiver position, so the
        // span text identifies them exactly. `parent::` stays untouched.
        let receiver_text = span_text(self.source, receiver.span());
        let names_own_class = receiver_text == "self"
            || receiver_text == "static"
            || receiver_text == self.class_name;
        if !names_own_class {
            return;
        }

        let ClassLikeMemberSelector::Identifier(selector) = &static_call.method else {
            return;
        };
        let method_name = selector.value;

        let lowered = method_name.to_ascii_lowercase();
        let Some(target) = self.methods.iter().find(|info| info.name == lowered) else {
            return;
        };
        if target.is_static || !target.is_concrete {
            return;
        }
        if method_name.eq_ignore_ascii_case(self.current_method) {
            return;
        }

        if self.current_is_static {
            // No $this to rewrite to here
            let message = MESSAGE_EXPRESSION_PATTERN.replace("%s", method_name);
            self.problems.push(Problem::warning(
                "scope_resolution_invocation",
                message,
                static_call.span(),
            ));
        } else {
            let message = MESSAGE_THIS_PATTERN.replace("%s", method_name);
            let operator_span = Span::new(
                receiver.span().file_id,
                receiver.span().start,
                selector.span().start,
            );
            let fix = Fix::new(
                FIX_TITLE,
                vec![FixEdit::raw(operator_span, "$this->".to_string())],
            );
            self.problems.push(
                Problem::warning("scope_resolution_invocation", message, static_call.span())
                    .with_fix(fix),
            );
        }
    }
}

use crate::registry::Inspection;

pub struct ScopeResolutionInvocationInspection;

impl Inspection for ScopeResolutionInvocationInspection {
    fn name(&self) -> &'static str {
        "scope_resolution_invocation"
    }

    fn description(&self) -> &'static str {
        "Invoke instance methods through $this instead of the scope resolution operator"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_scope_resolution_invocation(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use lupa_core::{Document, FixOutcome, Severity};
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_scope_resolution_invocation(program, source, &InspectionConfig::default())
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
    fn test_self_call_from_instance_method() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        self::send();\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'$this->send(...)' should be used instead.");
        assert_eq!(problems[0].severity, Severity::Warning);
        assert_eq!(
            transform(source),
            "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        $this->send();\n    }\n}\n"
        );
    }

    #[test]
    fn test_static_receiver_rewritten() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        return static::send();\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            transform(source),
            "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        return $this->send();\n    }\n}\n"
        );
    }

    #[test]
    fn test_own_class_name_receiver_rewritten() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        Mailer::send();\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(
            transform(source),
            "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        $this->send();\n    }\n}\n"
        );
    }

    #[test]
    fn test_call_from_static_method_reported_without_fix() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public static function cron() {\n        self::send();\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'...->send(...)' should be used instead.");
        assert!(problems[0].fix.is_none());
    }

    #[test]
    fn test_arguments_preserved() {
        let source = "<?php\nclass Mailer {\n    public function send($to, $subject) {}\n    public function notify($user) {\n        self::send($user->email, 'hi');\n    }\n}\n";
        assert_eq!(
            transform(source),
            "<?php\nclass Mailer {\n    public function send($to, $subject) {}\n    public function notify($user) {\n        $this->send($user->email, 'hi');\n    }\n}\n"
        );
    }

    // ==================== Skip Tests ====================

    #[test]
    fn test_static_target_skipped() {
        let source = "<?php\nclass Mailer {\n    public static function send() {}\n    public function notify() {\n        self::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_recursion_skipped() {
        let source = "<?php\nclass Mailer {\n    public function send($retries) {\n        self::send($retries - 1);\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_unknown_method_skipped() {
        let source = "<?php\nclass Mailer {\n    public function notify() {\n        self::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_other_class_receiver_skipped() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        Logger::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_class_name_case_mismatch_skipped() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        mailer::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_parent_receiver_skipped() {
        let source = "<?php\nclass Mailer extends Base {\n    public function send() {}\n    public function notify() {\n        parent::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_call_inside_closure_skipped() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify() {\n        $fn = function () {\n            self::send();\n        };\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_abstract_target_skipped() {
        let source = "<?php\nabstract class Mailer {\n    abstract public function send();\n    public function notify() {\n        self::send();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_dynamic_selector_skipped() {
        let source = "<?php\nclass Mailer {\n    public function send() {}\n    public function notify($name) {\n        self::$name();\n    }\n}\n";
        assert!(check_php(source).is_empty());
    }
}
