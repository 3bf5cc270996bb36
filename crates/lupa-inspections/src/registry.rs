//! Inspection trait and registry

use mago_syntax::ast::Program;
use std::collections::HashSet;

use lupa_core::Problem;

use crate::config::InspectionConfig;

/// A single inspection that can detect problems and suggest quick fixes
pub trait Inspection: Send + Sync {
    /// The unique identifier for this inspection (e.g., "power_operator")
    fn name(&self) -> &'static str;

    /// A short description of what this inspection reports
    fn description(&self) -> &'static str;

    /// Check a PHP program and return the problems found
    fn check<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
    ) -> Vec<Problem>;
}

/// Registry of all available inspections
pub struct InspectionRegistry {
    inspections: Vec<Box<dyn Inspection>>,
}

impl InspectionRegistry {
    /// Create a new registry with all built-in inspections
    pub fn new() -> Self {
        let mut registry = Self {
            inspections: Vec::new(),
        };

        registry.register(Box::new(super::array_merge_misuse::ArrayMergeMisuseInspection));
        registry.register(Box::new(super::cascade_str_replace::CascadeStrReplaceInspection));
        registry.register(Box::new(
            super::duplicated_method::DuplicatedMethodInspection,
        ));
        registry.register(Box::new(
            super::dynamic_scope_introspection::DynamicScopeIntrospectionInspection,
        ));
        registry.register(Box::new(
            super::empty_list_assignment::EmptyListAssignmentInspection,
        ));
        registry.register(Box::new(super::fopen_mode::FopenModeInspection));
        registry.register(Box::new(
            super::inconsistent_query_build::InconsistentQueryBuildInspection,
        ));
        registry.register(Box::new(
            super::instanceof_correctness::InstanceofCorrectnessInspection,
        ));
        registry.register(Box::new(super::nested_ternary::NestedTernaryInspection));
        registry.register(Box::new(super::non_secure_extract::NonSecureExtractInspection));
        registry.register(Box::new(super::null_coalescing::NullCoalescingInspection));
        registry.register(Box::new(super::ob_get_clean::ObGetCleanInspection));
        registry.register(Box::new(
            super::op_assign_short_syntax::OpAssignShortSyntaxInspection,
        ));
        registry.register(Box::new(super::packed_hashtable::PackedHashtableInspection));
        registry.register(Box::new(super::power_operator::PowerOperatorInspection));
        registry.register(Box::new(
            super::random_api_migration::RandomApiMigrationInspection,
        ));
        registry.register(Box::new(
            super::scope_resolution_invocation::ScopeResolutionInvocationInspection,
        ));
        registry.register(Box::new(super::short_echo_tag::ShortEchoTagInspection));
        registry.register(Box::new(
            super::stream_select_timeout::StreamSelectTimeoutInspection,
        ));
        registry.register(Box::new(
            super::unnecessary_closure::UnnecessaryClosureInspection,
        ));

        registry
    }

    /// Register a new inspection
    pub fn register(&mut self, inspection: Box<dyn Inspection>) {
        self.inspections.push(inspection);
    }

    /// Get all inspection names
    pub fn all_names(&self) -> Vec<&'static str> {
        self.inspections.iter().map(|i| i.name()).collect()
    }

    /// Get inspections filtered by enabled names
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Inspection> {
        self.inspections
            .iter()
            .filter(|i| enabled.contains(i.name()))
            .map(|i| i.as_ref())
            .collect()
    }

    /// Get all inspections with their descriptions (for --list)
    pub fn list_inspections(&self) -> Vec<(&'static str, &'static str)> {
        self.inspections
            .iter()
            .map(|i| (i.name(), i.description()))
            .collect()
    }

    /// Run all enabled inspections on a program
    pub fn check_all<'a>(
        &self,
        program: &Program<'a>,
        source: &str,
        config: &InspectionConfig,
        enabled: &HashSet<String>,
    ) -> Vec<Problem> {
        let mut problems = Vec::new();
        for inspection in self.get_enabled(enabled) {
            problems.extend(inspection.check(program, source, config));
        }
        problems
    }
}

impl Default for InspectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_inspections() {
        let registry = InspectionRegistry::new();
        let names = registry.all_names();
        assert_eq!(names.len(), 20);
        assert!(names.contains(&"power_operator"));
        assert!(names.contains(&"packed_hashtable"));
        assert!(names.contains(&"cascade_str_replace"));
    }

    #[test]
    fn test_names_are_unique() {
        let registry = InspectionRegistry::new();
        let names = registry.all_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_get_enabled_filters() {
        let registry = InspectionRegistry::new();
        let mut enabled = HashSet::new();
        enabled.insert("power_operator".to_string());
        let inspections = registry.get_enabled(&enabled);
        assert_eq!(inspections.len(), 1);
        assert_eq!(inspections[0].name(), "power_operator");
    }

    #[test]
    fn test_list_inspections_has_descriptions() {
        let registry = InspectionRegistry::new();
        for (name, description) in registry.list_inspections() {
            assert!(!name.is_empty());
            assert!(!description.is_empty());
        }
    }
}
