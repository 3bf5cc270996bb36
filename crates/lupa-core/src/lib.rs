//! lupa-core: Core abstractions for PHP code inspection and repair
//!
//! This crate provides:
//! - `Edit`: A span-based code modification
//! - `EditGroup`: A group of related edits for atomic application
//! - `apply_edits()`: Function to apply edits preserving formatting
//! - `apply_edit_groups()`: Function to apply edit groups atomically
//! - `Visitor`: Trait for traversing PHP AST
//! - `classify`: Shared structural queries over AST nodes
//! - `values`: Conservative possible-value discovery
//! - `equivalence`: Structural expression equivalence
//! - `Problem` / `Fix`: Inspection reports and their quick-fixes
//! - `Document`: Fix application with stable handles and atomic mutation

pub mod classify;
mod document;
mod edit;
pub mod equivalence;
mod problem;
pub mod synthesis;
pub mod values;
pub mod visitor;

pub use document::{AbortReason, Document, FixOutcome, OfferedFix, StableHandle};
pub use edit::{
    apply_edit_groups, apply_edits, statement_deletion_span, Edit, EditError, EditGroup,
};
pub use problem::{
    line_column, Fix, FixEdit, FragmentCategory, Problem, ProblemCollection, Severity,
};
pub use synthesis::ReplacementPlan;
pub use values::{discover, PhpValue, ValueSet};
pub use visitor::{visit, Visitor};
