//! Inspection: instanceof checks decided by the declared parameter type
//!
//! When a parameter's type hint already answers an `instanceof` check,
//! the check is dead weight: `Widget $w` makes `$w instanceof Widget`
//! always true, scalar-only hints make any `instanceof` always false,
//! and a nullable hint reduces the check to a null comparison. Class
//! relations are only judged from classes declared in the same file,
//! and any incomplete chain produces silence.
//!
//! Example: `function f(?Widget $w)` with `$w instanceof Widget` →
//! suggests `$w !== null`

use mago_span::{HasSpan, Span};
use mago_syntax::ast::*;

use lupa_core::classify::{span_text, unwrap_parenthesized, variable_name};
use lupa_core::{Problem, Visitor};

use crate::config::InspectionConfig;

const MESSAGE_ALWAYS_TRUE: &str = "It seems to be always true (same object type).";
const MESSAGE_NULL_CHECK_PATTERN: &str = "'%s' can be used instead.";
const MESSAGE_UNRELATED: &str = "It seems to be always false (classes are not related).";
const MESSAGE_NO_OBJECTS: &str = "It seems to be always false (no object types).";

/// Check a parsed PHP program for instanceof checks predetermined by
/// parameter types
pub fn check_instanceof_correctness<'a>(
    program: &Program<'a>,
    source: &str,
    config: &InspectionConfig,
) -> Vec<Problem> {
    let mut collector = ClassCollector {
        source,
        classes: Vec::new(),
    };
    collector.visit_program(program, source);
    let table = ClassTable {
        classes: collector.classes,
    };

    let mut visitor = InstanceofVisitor {
        source,
        yoda: config.yoda_comparisons(),
        classes: &table,
        problems: Vec::new(),
    };
    visitor.visit_program(program, source);
    visitor.problems
}

// ==================== In-file class relations ====================

/// One class declared in the file, names lowercased for lookup
struct ClassEntry {
    name: String,
    parent: Option<String>,
}

struct ClassTable {
    classes: Vec<ClassEntry>,
}

impl ClassTable {
    fn find(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|entry| entry.name == name)
    }

    /// The full ancestor chain of `name` including itself, or None when
    /// any link leaves the file.
    fn ancestors(&self, name: &str) -> Option<Vec<String>> {
        let mut chain = Vec::new();
        let mut current = self.find(name)?;
        loop {
            chain.push(current.name.clone());
            match &current.parent {
                None => return Some(chain),
                Some(parent) => {
                    if chain.contains(parent) {
                        // Inheritance cycle, malformed input
                        return None;
                    }
                    current = self.find(parent)?;
                }
            }
        }
    }

    /// True only when both chains are fully known and neither class
    /// sits in the other's chain. Single inheritance then rules out any
    /// common descendant.
    fn proves_unrelated(&self, declared: &str, checked: &str) -> bool {
        let declared = declared.to_ascii_lowercase();
        let checked = checked.to_ascii_lowercase();
        if declared == checked {
            return false;
        }
        let Some(declared_chain) = self.ancestors(&declared) else {
            return false;
        };
        let Some(checked_chain) = self.ancestors(&checked) else {
            return false;
        };
        !declared_chain.contains(&checked) && !checked_chain.contains(&declared)
    }
}

struct ClassCollector<'s> {
    source: &'s str,
    classes: Vec<ClassEntry>,
}

impl<'a, 's> Visitor<'a> for ClassCollector<'s> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Class(class) = stmt {
            let parent = class.extends.as_ref().and_then(|extends| {
                extends.types.iter().next().map(|parent| {
                    span_text(self.source, parent.span())
                        .trim_start_matches('\\')
                        .to_ascii_lowercase()
                })
            });
            self.classes.push(ClassEntry {
                name: class.name.value.to_ascii_lowercase(),
                parent,
            });
        }
        true
    }
}

// ==================== Declared parameter types ====================

/// What a parameter's hint proves about its values
enum DeclaredType {
    /// Exactly one class type, possibly nullable
    Object { name: String, nullable: bool },
    /// Only definite non-object scalars
    Scalars,
    /// Anything the analysis cannot reason about
    Unusable,
}

struct ParamInfo {
    name: String,
    declared: DeclaredType,
}

#[derive(Default)]
struct HintAtoms {
    classes: Vec<String>,
    has_scalar: bool,
    nullable: bool,
    opaque: bool,
}

fn collect_atoms(hint: &Hint<'_>, source: &str, atoms: &mut HintAtoms) {
    match hint {
        Hint::Nullable(nullable) => {
            atoms.nullable = true;
            collect_atoms(&nullable.hint, source, atoms);
        }
        Hint::Union(union) => {
            collect_atoms(&union.left, source, atoms);
            collect_atoms(&union.right, source, atoms);
        }
        Hint::Parenthesized(paren) => collect_atoms(&paren.hint, source, atoms),
        Hint::Null(_) => atoms.nullable = true,
        Hint::Integer(_)
        | Hint::String(_)
        | Hint::Float(_)
        | Hint::Bool(_)
        | Hint::Array(_)
        | Hint::True(_)
        | Hint::False(_) => atoms.has_scalar = true,
        Hint::Identifier(ident) => {
            let name = span_text(source, ident.span()).trim_start_matches('\\');
            if name.eq_ignore_ascii_case("self")
                || name.eq_ignore_ascii_case("static")
                || name.eq_ignore_ascii_case("parent")
            {
                atoms.opaque = true;
            } else {
                atoms.classes.push(name.to_string());
            }
        }
        // object, mixed, callable, iterable and intersections can all
        // hold objects of types the hint does not name
        _ => atoms.opaque = true,
    }
}

fn parse_hint(hint: &Hint<'_>, source: &str) -> DeclaredType {
    let mut atoms = HintAtoms::default();
    collect_atoms(hint, source, &mut atoms);
    if atoms.opaque {
        return DeclaredType::Unusable;
    }
    if atoms.classes.len() == 1 && !atoms.has_scalar {
        let name = atoms.classes.remove(0);
        return DeclaredType::Object {
            name,
            nullable: atoms.nullable,
        };
    }
    if atoms.classes.is_empty() && atoms.has_scalar {
        return DeclaredType::Scalars;
    }
    DeclaredType::Unusable
}

fn collect_parameters(list: &FunctionLikeParameterList<'_>, source: &str) -> Vec<ParamInfo> {
    let mut parameters = Vec::new();
    for param in list.parameters.iter() {
        let Some(hint) = param.hint.as_ref() else {
            continue;
        };
        // A variadic parameter is an array at runtime regardless of hint
        if span_text(source, param.span()).contains("...") {
            continue;
        }

        let mut declared = parse_hint(hint, source);
        if let Some(default) = param.default_value.as_ref() {
            // An = null default makes the hint implicitly nullable
            if matches!(&default.value, Expression::Literal(Literal::Null(_))) {
                if let DeclaredType::Object { nullable, .. } = &mut declared {
                    *nullable = true;
                }
            }
        }
        if matches!(declared, DeclaredType::Unusable) {
            continue;
        }

        parameters.push(ParamInfo {
            name: span_text(source, param.variable.span()).to_string(),
            declared,
        });
    }
    parameters
}

// ==================== Body scanning ====================

struct InstanceofVisitor<'s, 'c> {
    source: &'s str,
    yoda: bool,
    classes: &'c ClassTable,
    problems: Vec<Problem>,
}

impl<'a, 's, 'c> Visitor<'a> for InstanceofVisitor<'s, 'c> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        if let Statement::Function(func) = stmt {
            self.scan_body(&func.parameter_list, &func.body);
        }
        true
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        match expr {
            Expression::Closure(closure) => {
                self.scan_body(&closure.parameter_list, &closure.body);
            }
            Expression::ArrowFunction(arrow) => {
                let parameters = collect_parameters(&arrow.parameter_list, self.source);
                if !parameters.is_empty() {
                    let mut scanner = BodyScanner {
                        source: self.source,
                        yoda: self.yoda,
                        classes: self.classes,
                        parameters: &parameters,
                        consumed: Vec::new(),
                        problems: &mut self.problems,
                    };
                    scanner.traverse_expression(&arrow.expression, self.source);
                }
            }
            _ => {}
        }
        true
    }

    fn traverse_class_like_member(&mut self, member: &ClassLikeMember<'a>, source: &str) {
        if let ClassLikeMember::Method(method) = member {
            if let MethodBody::Concrete(body) = &method.body {
                self.scan_body(&method.parameter_list, body);
                let inner: Vec<&Statement<'a>> = body.statements.iter().collect();
                self.traverse_sequence(&inner, source);
            }
        }
    }
}

impl<'s, 'c> InstanceofVisitor<'s, 'c> {
    fn scan_body<'a>(&mut self, parameter_list: &FunctionLikeParameterList<'a>, body: &Block<'a>) {
        let parameters = collect_parameters(parameter_list, self.source);
        if parameters.is_empty() {
            return;
        }
        let mut scanner = BodyScanner {
            source: self.source,
            yoda: self.yoda,
            classes: self.classes,
            parameters: &parameters,
            consumed: Vec::new(),
            problems: &mut self.problems,
        };
        for statement in body.statements.iter() {
            scanner.traverse_statement(statement, self.source);
        }
    }
}

/// Walks one function-like body looking at instanceof checks on the
/// typed parameters. Nested function-likes have their own parameters
/// and are scanned separately.
struct BodyScanner<'b, 's> {
    source: &'s str,
    yoda: bool,
    classes: &'b ClassTable,
    parameters: &'b [ParamInfo],
    consumed: Vec<u32>,
    problems: &'b mut Vec<Problem>,
}

impl<'a, 'b, 's> Visitor<'a> for BodyScanner<'b, 's> {
    fn visit_statement(&mut self, stmt: &Statement<'a>, _source: &str) -> bool {
        !matches!(
            stmt,
            Statement::Function(_) | Statement::Class(_) | Statement::Trait(_)
        )
    }

    fn visit_expression(&mut self, expr: &Expression<'a>, _source: &str) -> bool {
        if matches!(expr, Expression::Closure(_) | Expression::ArrowFunction(_)) {
            return false;
        }

        if let Expression::UnaryPrefix(unary) = expr {
            if matches!(unary.operator, UnaryPrefixOperator::Not(_)) {
                let operand = unwrap_parenthesized(&unary.operand);
                if let Expression::Binary(binary) = operand {
                    if matches!(binary.operator, BinaryOperator::Instanceof(_)) {
                        self.check_instanceof(binary, Some(unary.span()));
                        self.consumed.push(binary.span().start.offset);
                        return true;
                    }
                }
            }
        }

        if let Expression::Binary(binary) = expr {
            if matches!(binary.operator, BinaryOperator::Instanceof(_))
                && !self.consumed.contains(&binary.span().start.offset)
            {
                self.check_instanceof(binary, None);
            }
        }

        true
    }
}

impl<'b, 's> BodyScanner<'b, 's> {
    fn check_instanceof<'a>(&mut self, binary: &Binary<'a>, negation: Option<Span>) {
        let subject = unwrap_parenthesized(&binary.lhs);
        let Some(subject_name) = variable_name(subject, self.source) else {
            return;
        };
        let Some(parameter) = self
            .parameters
            .iter()
            .find(|param| param.name == subject_name)
        else {
            return;
        };

        // The checked side must be a literal class reference
        let rhs = unwrap_parenthesized(&binary.rhs);
        if !matches!(rhs, Expression::Identifier(_)) {
            return;
        }
        let checked = span_text(self.source, rhs.span()).trim_start_matches('\\');
        if checked.eq_ignore_ascii_case("self")
            || checked.eq_ignore_ascii_case("static")
            || checked.eq_ignore_ascii_case("parent")
        {
            return;
        }

        match &parameter.declared {
            DeclaredType::Scalars => {
                self.problems.push(Problem::warning(
                    "instanceof_correctness",
                    MESSAGE_NO_OBJECTS,
                    binary.span(),
                ));
            }
            DeclaredType::Object { name, nullable } => {
                if name.eq_ignore_ascii_case(checked) {
                    if *nullable {
                        let subject_text = span_text(self.source, subject.span());
                        let (replacement, anchor) = match negation {
                            Some(unary_span) => (
                                render_null_comparison(subject_text, true, self.yoda),
                                unary_span,
                            ),
                            None => (
                                render_null_comparison(subject_text, false, self.yoda),
                                binary.span(),
                            ),
                        };
                        self.problems.push(Problem::warning(
                            "instanceof_correctness",
                            MESSAGE_NULL_CHECK_PATTERN.replace("%s", &replacement),
                            anchor,
                        ));
                    } else {
                        self.problems.push(Problem::warning(
                            "instanceof_correctness",
                            MESSAGE_ALWAYS_TRUE,
                            binary.span(),
                        ));
                    }
                } else if !*nullable && self.classes.proves_unrelated(name, checked) {
                    self.problems.push(Problem::warning(
                        "instanceof_correctness",
                        MESSAGE_UNRELATED,
                        binary.span(),
                    ));
                }
            }
            DeclaredType::Unusable => {}
        }
    }
}

/// The null comparison equivalent to a nullable-parameter instanceof
/// check. The plain check is true exactly when the value is not null.
fn render_null_comparison(subject: &str, negated: bool, yoda: bool) -> String {
    let operator = if negated { "===" } else { "!==" };
    if yoda {
        format!("null {} {}", operator, subject)
    } else {
        format!("{} {} null", subject, operator)
    }
}

use crate::registry::Inspection;

pub struct InstanceofCorrectnessInspection;

impl Inspection for InstanceofCorrectnessInspection {
    fn name(&self) -> &'static str {
        "instanceof_correctness"
    }

    fn description(&self) -> &'static str {
        "Flag instanceof checks already decided by the declared parameter type"
    }

    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem> {
        check_instanceof_correctness(program, source, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparisonStyle;
    use bumpalo::Bump;
    use lupa_core::Severity;
    use mago_database::file::FileId;

    fn check_php(source: &str) -> Vec<Problem> {
        check_with(source, &InspectionConfig::default())
    }

    fn check_with(source: &str, config: &InspectionConfig) -> Vec<Problem> {
        let arena = Bump::new();
        let file_id = FileId::new("test.php");
        let (program, _) = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        check_instanceof_correctness(program, source, config)
    }

    // ==================== Reporting Tests ====================

    #[test]
    fn test_same_single_type_is_always_true() {
        let source = "<?php\nfunction render(Widget $w) {\n    if ($w instanceof Widget) {\n        return 1;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ALWAYS_TRUE);
        assert_eq!(problems[0].severity, Severity::Warning);
    }

    #[test]
    fn test_nullable_type_suggests_null_check() {
        let source = "<?php\nfunction render(?Widget $w) {\n    if ($w instanceof Widget) {\n        return 1;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'$w !== null' can be used instead.");
    }

    #[test]
    fn test_union_with_null_suggests_null_check() {
        let source = "<?php\nfunction render(Widget|null $w) {\n    return $w instanceof Widget;\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'$w !== null' can be used instead.");
    }

    #[test]
    fn test_negated_nullable_suggests_equality() {
        let source = "<?php\nfunction render(?Widget $w) {\n    if (!($w instanceof Widget)) {\n        return null;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'$w === null' can be used instead.");
    }

    #[test]
    fn test_yoda_style_renders_constant_first() {
        let config = InspectionConfig {
            comparison_style: ComparisonStyle::Yoda,
            ..InspectionConfig::default()
        };
        let source = "<?php\nfunction render(?Widget $w) {\n    return $w instanceof Widget;\n}\n";
        let problems = check_with(source, &config);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'null !== $w' can be used instead.");
    }

    #[test]
    fn test_null_default_counts_as_nullable() {
        let source = "<?php\nfunction render(Widget $w = null) {\n    return $w instanceof Widget;\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "'$w !== null' can be used instead.");
    }

    #[test]
    fn test_scalar_type_is_always_false() {
        let source = "<?php\nfunction add(int $count) {\n    if ($count instanceof Widget) {\n        return 1;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_NO_OBJECTS);
    }

    #[test]
    fn test_scalar_union_is_always_false() {
        let source = "<?php\nfunction add(int|string $value) {\n    return $value instanceof Widget;\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_NO_OBJECTS);
    }

    #[test]
    fn test_unrelated_classes_are_always_false() {
        let source = "<?php\nclass Request {}\nclass Response {}\nfunction handle(Request $r) {\n    if ($r instanceof Response) {\n        return 1;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_UNRELATED);
    }

    #[test]
    fn test_method_parameter_is_checked() {
        let source = "<?php\nclass Renderer {\n    public function draw(Widget $w) {\n        return $w instanceof Widget;\n    }\n}\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ALWAYS_TRUE);
    }

    #[test]
    fn test_closure_parameter_is_checked() {
        let source = "<?php\n$fn = function (Widget $w) {\n    return $w instanceof Widget;\n};\n";
        let problems = check_php(source);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, MESSAGE_ALWAYS_TRUE);
    }

    // ==================== Skip Tests ====================

    #[test]
    fn test_subclass_check_is_fine() {
        let source = "<?php\nclass Base {}\nclass Child extends Base {}\nfunction f(Base $b) {\n    return $b instanceof Child;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_superclass_check_is_fine() {
        let source = "<?php\nclass Base {}\nclass Child extends Base {}\nfunction f(Child $c) {\n    return $c instanceof Base;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_unknown_parent_chain_is_fine() {
        let source = "<?php\nclass Request extends Message {}\nclass Response {}\nfunction f(Request $r) {\n    return $r instanceof Response;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_interface_check_is_fine() {
        let source = "<?php\ninterface Jsonable {}\nclass Request {}\nfunction f(Request $r) {\n    return $r instanceof Jsonable;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_untyped_parameter_is_fine() {
        let source = "<?php\nfunction f($x) {\n    return $x instanceof Widget;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_dynamic_class_reference_is_fine() {
        let source = "<?php\nfunction f(Widget $w, $class) {\n    return $w instanceof $class;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_local_variable_is_fine() {
        let source = "<?php\nfunction f(Widget $w) {\n    $other = load();\n    return $other instanceof Widget;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_union_of_two_classes_is_fine() {
        let source = "<?php\nfunction f(Widget|Panel $x) {\n    return $x instanceof Widget;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_variadic_parameter_is_fine() {
        let source = "<?php\nfunction f(Widget ...$all) {\n    return $all instanceof Widget;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_mixed_type_is_fine() {
        let source = "<?php\nfunction f(mixed $x) {\n    return $x instanceof Widget;\n}\n";
        assert!(check_php(source).is_empty());
    }

    #[test]
    fn test_shadowing_closure_parameter_is_isolated() {
        let source = "<?php\nfunction f(Widget $w) {\n    $fn = function ($w) {\n        return $w instanceof Widget;\n    };\n    return $fn;\n}\n";
        assert!(check_php(source).is_empty());
    }
}
