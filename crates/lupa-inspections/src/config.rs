//! Inspection configuration
//!
//! Settings that change what inspections report or how their fixes
//! render. The CLI deserializes this from the project's config file and
//! threads it through every check.

use serde::Deserialize;

/// Minimum PHP version the analyzed codebase targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhpVersion {
    Php56,
    Php70,
    Php71,
    Php72,
    Php73,
    Php74,
    Php80,
    Php81,
    Php82,
}

impl PhpVersion {
    /// Parse a version string like "7.4"
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "5.6" => Some(PhpVersion::Php56),
            "7.0" => Some(PhpVersion::Php70),
            "7.1" => Some(PhpVersion::Php71),
            "7.2" => Some(PhpVersion::Php72),
            "7.3" => Some(PhpVersion::Php73),
            "7.4" => Some(PhpVersion::Php74),
            "8.0" => Some(PhpVersion::Php80),
            "8.1" => Some(PhpVersion::Php81),
            "8.2" => Some(PhpVersion::Php82),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhpVersion::Php56 => "5.6",
            PhpVersion::Php70 => "7.0",
            PhpVersion::Php71 => "7.1",
            PhpVersion::Php72 => "7.2",
            PhpVersion::Php73 => "7.3",
            PhpVersion::Php74 => "7.4",
            PhpVersion::Php80 => "8.0",
            PhpVersion::Php81 => "8.1",
            PhpVersion::Php82 => "8.2",
        }
    }
}

/// Operand order for comparisons that fixes synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStyle {
    /// Subject first: `$x === null`
    #[default]
    Regular,
    /// Constant first: `null === $x`
    Yoda,
}

/// Settings shared by all inspections
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Minimum PHP version the codebase supports, e.g. "7.4"
    pub php_version: String,
    /// Render synthesized array literals as `[...]` instead of `array(...)`
    pub prefer_short_array_syntax: bool,
    /// Report rand()/mt_rand()/srand() with modern replacements
    pub suggest_random_int_migration: bool,
    /// Report fopen() modes missing the `b` flag
    pub enforce_binary_mode_flag: bool,
    /// Methods longer than this many lines are not checked for duplication
    pub max_duplicated_method_lines: usize,
    /// Operand order for comparisons fixes produce
    pub comparison_style: ComparisonStyle,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            php_version: "7.4".to_string(),
            prefer_short_array_syntax: false,
            suggest_random_int_migration: true,
            enforce_binary_mode_flag: true,
            max_duplicated_method_lines: 20,
            comparison_style: ComparisonStyle::Regular,
        }
    }
}

impl InspectionConfig {
    /// The parsed target version, falling back to 7.4 on bad input
    pub fn target_php_version(&self) -> PhpVersion {
        PhpVersion::parse(&self.php_version).unwrap_or(PhpVersion::Php74)
    }

    pub fn yoda_comparisons(&self) -> bool {
        self.comparison_style == ComparisonStyle::Yoda
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InspectionConfig::default();
        assert_eq!(config.target_php_version(), PhpVersion::Php74);
        assert!(!config.prefer_short_array_syntax);
        assert!(config.suggest_random_int_migration);
        assert!(config.enforce_binary_mode_flag);
        assert_eq!(config.max_duplicated_method_lines, 20);
        assert!(!config.yoda_comparisons());
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(PhpVersion::parse("7.0"), Some(PhpVersion::Php70));
        assert_eq!(PhpVersion::parse(" 8.1 "), Some(PhpVersion::Php81));
        assert_eq!(PhpVersion::parse("6.0"), None);
    }

    #[test]
    fn test_version_ordering() {
        assert!(PhpVersion::Php70 < PhpVersion::Php74);
        assert!(PhpVersion::Php82 > PhpVersion::Php56);
    }

    #[test]
    fn test_bad_version_string_falls_back() {
        let config = InspectionConfig {
            php_version: "banana".to_string(),
            ..Default::default()
        };
        assert_eq!(config.target_php_version(), PhpVersion::Php74);
    }
}
