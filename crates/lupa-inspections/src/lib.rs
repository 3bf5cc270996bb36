//! lupa-inspections: PHP code inspection implementations
//!
//! Available inspections:
//! - array_merge_misuse: Flag array_merge() calls better written as literals, push/unshift, or flattened
//! - cascade_str_replace: Merge consecutive or nested str_replace() calls
//! - duplicated_method: Drop or proxy methods identical to the parent's implementation
//! - dynamic_scope_introspection: Flag dynamic calls to compact(), extract() and friends
//! - empty_list_assignment: Flag empty list() / [] assignment targets (fatal at runtime)
//! - fopen_mode: Enforce binary-safe and well-formed fopen() mode strings
//! - inconsistent_query_build: Suggest ksort($p, SORT_STRING) before http_build_query()
//! - instanceof_correctness: Flag instanceof checks decided by parameter types alone
//! - nested_ternary: Flag nested ternary operators
//! - non_secure_extract: Require the second argument of extract()
//! - null_coalescing: Convert isset/null-check ternaries and if-statements to ??
//! - ob_get_clean: Convert ob_get_contents() + ob_end_clean() to ob_get_clean()
//! - op_assign_short_syntax: Convert $x = $x op y to $x op= y
//! - packed_hashtable: Suggest array layouts that enable packed hashtable optimizations
//! - power_operator: Convert pow($x, $n) to $x ** $n
//! - random_api_migration: Migrate rand()/srand()/getrandmax() to the mt_/random_int APIs
//! - scope_resolution_invocation: Convert self::method() to $this->method() where applicable
//! - short_echo_tag: Convert <?php echo ... ?> to <?= ... ?>
//! - stream_select_timeout: Flag stream_select() timeouts that cause high CPU usage
//! - unnecessary_closure: Inline closures that only forward to a named function

pub mod config;
pub mod registry;

pub mod array_merge_misuse;
pub mod cascade_str_replace;
pub mod duplicated_method;
pub mod dynamic_scope_introspection;
pub mod empty_list_assignment;
pub mod fopen_mode;
pub mod inconsistent_query_build;
pub mod instanceof_correctness;
pub mod nested_ternary;
pub mod non_secure_extract;
pub mod null_coalescing;
pub mod ob_get_clean;
pub mod op_assign_short_syntax;
pub mod packed_hashtable;
pub mod power_operator;
pub mod random_api_migration;
pub mod scope_resolution_invocation;
pub mod short_echo_tag;
pub mod stream_select_timeout;
pub mod unnecessary_closure;

pub use config::{ComparisonStyle, InspectionConfig, PhpVersion};
pub use registry::{Inspection, InspectionRegistry};

pub use array_merge_misuse::check_array_merge_misuse;
pub use cascade_str_replace::check_cascade_str_replace;
pub use duplicated_method::check_duplicated_method;
pub use dynamic_scope_introspection::check_dynamic_scope_introspection;
pub use empty_list_assignment::check_empty_list_assignment;
pub use fopen_mode::check_fopen_mode;
pub use inconsistent_query_build::check_inconsistent_query_build;
pub use instanceof_correctness::check_instanceof_correctness;
pub use nested_ternary::check_nested_ternary;
pub use non_secure_extract::check_non_secure_extract;
pub use null_coalescing::check_null_coalescing;
pub use ob_get_clean::check_ob_get_clean;
pub use op_assign_short_syntax::check_op_assign_short_syntax;
pub use packed_hashtable::check_packed_hashtable;
pub use power_operator::check_power_operator;
pub use random_api_migration::check_random_api_migration;
pub use scope_resolution_invocation::check_scope_resolution_invocation;
pub use short_echo_tag::check_short_echo_tag;
pub use stream_select_timeout::check_stream_select_timeout;
pub use unnecessary_closure::check_unnecessary_closure;
