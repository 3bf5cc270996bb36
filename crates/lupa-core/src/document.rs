//! Mutable document state for applying fixes
//!
//! A document owns the current text of one file plus a log of every
//! replacement applied to it. Fixes are offered against a snapshot of
//! the text: offering pins each target span to a stable handle stamped
//! with the document's generation. Applying later replays the edit log
//! to find where each handle's span lives now, or learns that the span
//! was already rewritten and aborts the whole fix.
//!
//! An applied fix moves through resolving, synthesizing, and mutating in
//! that order. The text changes only in the final step, and only once
//! every edit has survived the earlier ones, so an aborted fix leaves
//! the document byte-identical to before.

use mago_database::file::FileId;
use mago_span::{Position, Span};

use crate::edit::{adjust_whitespace, apply_edits, Edit};
use crate::problem::{Fix, FragmentCategory};
use crate::synthesis::{validate_fragment, ReplacementPlan};

/// A span pinned to a document snapshot, surviving later edits.
///
/// Offsets are meaningful only together with the generation they were
/// minted at; the document replays newer edits to translate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableHandle {
    start: usize,
    end: usize,
    generation: u64,
}

/// One applied replacement, recorded for handle replay.
///
/// Offsets are in the coordinates of the text as it was just before the
/// generation that applied them.
#[derive(Debug, Clone, Copy)]
struct AppliedEdit {
    start: usize,
    end: usize,
    delta: isize,
    generation: u64,
}

/// A fix whose edit targets have been pinned to stable handles
#[derive(Debug, Clone)]
pub struct OfferedFix {
    /// Human-readable fix title
    pub title: String,
    edits: Vec<OfferedEdit>,
}

#[derive(Debug, Clone)]
struct OfferedEdit {
    handle: StableHandle,
    replacement: String,
    category: FragmentCategory,
}

/// Result of applying an offered fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    Applied,
    Aborted(AbortReason),
}

impl FixOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FixOutcome::Applied)
    }
}

/// Why an offered fix could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A target span was rewritten or invalidated since the fix was offered
    StaleHandle,
    /// A replacement fragment failed to parse for its category
    InvalidFragment,
    /// The resolved edits collide with each other
    EditConflict,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::StaleHandle => write!(f, "target span changed since the fix was offered"),
            AbortReason::InvalidFragment => write!(f, "replacement fragment does not parse"),
            AbortReason::EditConflict => write!(f, "edits conflict with each other"),
        }
    }
}

/// The evolving text of one file under fix application
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    generation: u64,
    /// Handles minted before this generation are dead
    fence: u64,
    log: Vec<AppliedEdit>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generation: 0,
            fence: 0,
            log: Vec::new(),
        }
    }

    /// The current text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current generation, bumped by every successful apply
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pin a span of the current text to a handle
    pub fn handle(&self, span: Span) -> StableHandle {
        StableHandle {
            start: span.start.offset as usize,
            end: span.end.offset as usize,
            generation: self.generation,
        }
    }

    /// Translate a handle to offsets in the current text.
    ///
    /// Returns `None` when a later edit rewrote any part of the span, or
    /// when the document was reloaded after the handle was minted.
    pub fn resolve(&self, handle: StableHandle) -> Option<(usize, usize)> {
        if handle.generation < self.fence {
            return None;
        }

        let mut start = handle.start;
        let mut end = handle.end;

        // Entries of one generation share pre-apply coordinates, so each
        // generation's shift accumulates before it moves the handle
        let mut index = 0;
        while index < self.log.len() {
            let generation = self.log[index].generation;
            let mut next = index;
            while next < self.log.len() && self.log[next].generation == generation {
                next += 1;
            }

            if generation > handle.generation {
                let mut shift = 0isize;
                for entry in &self.log[index..next] {
                    if entry.end <= start {
                        shift += entry.delta;
                    } else if entry.start < end {
                        return None;
                    }
                }
                start = (start as isize + shift) as usize;
                end = (end as isize + shift) as usize;
            }

            index = next;
        }

        Some((start, end))
    }

    /// Offer a fix against the current text, pinning its targets.
    ///
    /// Offering does not change the document. The returned fix can be
    /// applied later, after other fixes have run, and will notice if its
    /// targets were edited away in the meantime.
    pub fn offer(&self, fix: &Fix) -> OfferedFix {
        OfferedFix {
            title: fix.title.clone(),
            edits: fix
                .edits
                .iter()
                .map(|edit| OfferedEdit {
                    handle: self.handle(edit.span),
                    replacement: edit.replacement.clone(),
                    category: edit.category,
                })
                .collect(),
        }
    }

    /// Apply an offered fix, atomically.
    pub fn apply(&mut self, offered: &OfferedFix) -> FixOutcome {
        // Resolving: every handle must still point at live text
        let mut resolved: Vec<((usize, usize), &OfferedEdit)> =
            Vec::with_capacity(offered.edits.len());
        for edit in &offered.edits {
            match self.resolve(edit.handle) {
                Some(range) => resolved.push((range, edit)),
                None => return FixOutcome::Aborted(AbortReason::StaleHandle),
            }
        }

        // Synthesizing: every fragment must parse for its category
        for (_, edit) in &resolved {
            if !validate_fragment(&edit.replacement, edit.category) {
                return FixOutcome::Aborted(AbortReason::InvalidFragment);
            }
        }

        let plan = ReplacementPlan::new(
            offered.title.clone(),
            resolved
                .iter()
                .map(|((start, end), edit)| {
                    Edit::new(
                        offset_span(*start, *end),
                        edit.replacement.clone(),
                        offered.title.clone(),
                    )
                })
                .collect(),
        );

        // Mutating: the text changes only if the whole group lands
        let group = plan.into_edit_group();
        let new_text = match apply_edits(&self.text, &group.edits) {
            Ok(text) => text,
            Err(_) => return FixOutcome::Aborted(AbortReason::EditConflict),
        };

        self.generation += 1;
        for ((start, end), edit) in resolved {
            let applied = adjust_whitespace(&self.text[start..end], &edit.replacement);
            self.log.push(AppliedEdit {
                start,
                end,
                delta: applied.len() as isize - (end - start) as isize,
                generation: self.generation,
            });
        }
        self.text = new_text;

        FixOutcome::Applied
    }

    /// Replace the text wholesale, invalidating every outstanding handle
    pub fn reload(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.generation += 1;
        self.fence = self.generation;
        self.log.clear();
    }
}

fn offset_span(start: usize, end: usize) -> Span {
    Span::new(
        FileId::zero(),
        Position::new(start as u32),
        Position::new(end as u32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::FixEdit;

    fn fix_replacing(
        title: &str,
        start: u32,
        end: u32,
        replacement: &str,
        category: FragmentCategory,
    ) -> Fix {
        let span = offset_span(start as usize, end as usize);
        let edit = match category {
            FragmentCategory::Expression => FixEdit::expression(span, replacement),
            FragmentCategory::Statement => FixEdit::statement(span, replacement),
            FragmentCategory::Raw => FixEdit::raw(span, replacement),
        };
        Fix::new(title, vec![edit])
    }

    #[test]
    fn test_apply_simple_fix() {
        // "pow($a, 2)" occupies offsets 6..16
        let mut document = Document::new("<?php pow($a, 2);");
        let fix = fix_replacing("use operator", 6, 16, "$a ** 2", FragmentCategory::Expression);

        let offered = document.offer(&fix);
        assert_eq!(document.apply(&offered), FixOutcome::Applied);
        assert_eq!(document.text(), "<?php $a ** 2;");
        assert_eq!(document.generation(), 1);
    }

    #[test]
    fn test_handles_shift_across_earlier_edits() {
        //                0123456789012345678901234
        let mut document = Document::new("<?php f(pow(2, 3)); g(pow(4, 5));");
        // First call argument spans 8..17, second spans 22..31
        let first = fix_replacing("first", 8, 17, "2 ** 3", FragmentCategory::Expression);
        let second = fix_replacing("second", 22, 31, "4 ** 5", FragmentCategory::Expression);

        let offered_first = document.offer(&first);
        let offered_second = document.offer(&second);

        assert_eq!(document.apply(&offered_first), FixOutcome::Applied);
        // The second fix's target moved left by three bytes, the handle follows
        assert_eq!(document.apply(&offered_second), FixOutcome::Applied);
        assert_eq!(document.text(), "<?php f(2 ** 3); g(4 ** 5);");
    }

    #[test]
    fn test_overlapping_fix_aborts_as_stale() {
        let mut document = Document::new("<?php pow(pow(2, 3), 4);");
        // Outer call spans 6..23, inner spans 10..19
        let outer = fix_replacing("outer", 6, 23, "pow(2, 3) ** 4", FragmentCategory::Expression);
        let inner = fix_replacing("inner", 10, 19, "2 ** 3", FragmentCategory::Expression);

        let offered_outer = document.offer(&outer);
        let offered_inner = document.offer(&inner);

        assert_eq!(document.apply(&offered_outer), FixOutcome::Applied);
        assert_eq!(
            document.apply(&offered_inner),
            FixOutcome::Aborted(AbortReason::StaleHandle)
        );
        assert_eq!(document.text(), "<?php pow(2, 3) ** 4;");
    }

    #[test]
    fn test_invalid_fragment_aborts_without_mutation() {
        let mut document = Document::new("<?php pow($a, 2);");
        let before = document.text().to_string();
        let fix = fix_replacing("broken", 6, 16, "$a **", FragmentCategory::Expression);

        let offered = document.offer(&fix);
        assert_eq!(
            document.apply(&offered),
            FixOutcome::Aborted(AbortReason::InvalidFragment)
        );
        assert_eq!(document.text(), before);
        assert_eq!(document.generation(), 0);
    }

    #[test]
    fn test_multi_edit_fix_is_atomic() {
        let mut document = Document::new("<?php aa; bb;");
        let span_a = offset_span(6, 8);
        let span_b = offset_span(10, 12);
        let fix = Fix::new(
            "pair",
            vec![
                FixEdit::expression(span_a, "xx"),
                FixEdit::expression(span_b, "broken ("),
            ],
        );

        let before = document.text().to_string();
        let offered = document.offer(&fix);
        assert_eq!(
            document.apply(&offered),
            FixOutcome::Aborted(AbortReason::InvalidFragment)
        );
        assert_eq!(document.text(), before);
    }

    #[test]
    fn test_raw_fragments_skip_validation() {
        let mut document = Document::new("<?php echo $x; ?>");
        // Replace the whole echo statement including tags
        let fix = fix_replacing("short tag", 0, 17, "<?= $x ?>", FragmentCategory::Raw);

        let offered = document.offer(&fix);
        assert_eq!(document.apply(&offered), FixOutcome::Applied);
        assert_eq!(document.text(), "<?= $x ?>");
    }

    #[test]
    fn test_reload_invalidates_outstanding_handles() {
        let mut document = Document::new("<?php pow($a, 2);");
        let fix = fix_replacing("use operator", 6, 16, "$a ** 2", FragmentCategory::Expression);
        let offered = document.offer(&fix);

        document.reload("<?php entirely_different();");
        assert_eq!(
            document.apply(&offered),
            FixOutcome::Aborted(AbortReason::StaleHandle)
        );
        assert_eq!(document.text(), "<?php entirely_different();");
    }

    #[test]
    fn test_resolve_tracks_deltas_per_generation() {
        let mut document = Document::new("abcdef");
        let tail = document.handle(offset_span(4, 6));

        // Shrink "abcd" to "x" in one apply
        let fix = Fix::new("shrink", vec![FixEdit::raw(offset_span(0, 4), "x")]);
        let offered = document.offer(&fix);
        assert_eq!(document.apply(&offered), FixOutcome::Applied);
        assert_eq!(document.text(), "xef");

        assert_eq!(document.resolve(tail), Some((1, 3)));
    }

    #[test]
    fn test_resolve_returns_none_for_edited_span() {
        let mut document = Document::new("abcdef");
        let middle = document.handle(offset_span(2, 4));

        let fix = Fix::new("rewrite", vec![FixEdit::raw(offset_span(1, 5), "zz")]);
        let offered = document.offer(&fix);
        assert_eq!(document.apply(&offered), FixOutcome::Applied);

        assert_eq!(document.resolve(middle), None);
    }
}
