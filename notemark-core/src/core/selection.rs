//! Capturing and restoring a selection across document mutations.
//!
//! The selection is saved as a pair of linear offsets immediately before a
//! mutation and resolved back to live anchors immediately after it, so the
//! caret survives nodes being split, inserted or removed. Losing the caret is
//! never an error: capture yields `None` and restore quietly does nothing.

use crate::core::document::{Document, NodeId};
use crate::core::offset::{linear_to_node_offset, node_offset_to_linear, Anchor};

/// Zero-width space used as a caret landing spot after atomic nodes.
pub const CARET_PLACEHOLDER: &str = "\u{200B}";

/// A captured selection as linear offsets. `start` may exceed `end` when the
/// user selected backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOffsets {
    pub start: usize,
    pub end: usize,
}

impl SelectionOffsets {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The capabilities the tracker needs from a live selection object.
pub trait SelectionHandle {
    /// Where the selection starts, `None` when nothing is selected.
    fn anchor(&self) -> Option<Anchor>;
    /// Where the selection ends, `None` when nothing is selected.
    fn focus(&self) -> Option<Anchor>;
    fn set_start_and_end(&mut self, start: Anchor, end: Anchor);
    fn collapse(&mut self, at: Anchor);
    fn remove_all_ranges(&mut self);
}

/// A plain in-memory selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    range: Option<(Anchor, Anchor)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collapsed_at(at: Anchor) -> Self {
        Self { range: Some((at, at)) }
    }

    pub fn spanning(anchor: Anchor, focus: Anchor) -> Self {
        Self {
            range: Some((anchor, focus)),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self.range, Some((a, f)) if a == f)
    }
}

impl SelectionHandle for Selection {
    fn anchor(&self) -> Option<Anchor> {
        self.range.map(|(a, _)| a)
    }

    fn focus(&self) -> Option<Anchor> {
        self.range.map(|(_, f)| f)
    }

    fn set_start_and_end(&mut self, start: Anchor, end: Anchor) {
        self.range = Some((start, end));
    }

    fn collapse(&mut self, at: Anchor) {
        self.range = Some((at, at));
    }

    fn remove_all_ranges(&mut self) {
        self.range = None;
    }
}

/// Saves the current selection as linear offsets within `container`.
///
/// Returns `None` when nothing is selected or when the selection lives
/// outside `container`.
pub fn capture<S>(doc: &Document, container: NodeId, selection: &S) -> Option<SelectionOffsets>
where
    S: SelectionHandle + ?Sized,
{
    let anchor = selection.anchor()?;
    let focus = selection.focus()?;
    let common = doc.common_ancestor(anchor.node, focus.node)?;
    if !doc.contains(container, common) {
        return None;
    }

    Some(SelectionOffsets {
        start: node_offset_to_linear(doc, container, anchor.node, anchor.offset),
        end: node_offset_to_linear(doc, container, focus.node, focus.offset),
    })
}

/// Re-applies offsets saved by [`capture`].
///
/// Does nothing when `saved` is `None` or when either offset no longer maps
/// to a position inside `container`.
pub fn restore<S>(doc: &Document, container: NodeId, selection: &mut S, saved: Option<SelectionOffsets>)
where
    S: SelectionHandle + ?Sized,
{
    let Some(saved) = saved else {
        return;
    };
    let start = linear_to_node_offset(doc, container, saved.start);
    let end = linear_to_node_offset(doc, container, saved.end);
    match (start, end) {
        (Some(start), Some(end)) => selection.set_start_and_end(start, end),
        _ => log::debug!(
            "selection {}..{} no longer fits the container; leaving it unset",
            saved.start,
            saved.end
        ),
    }
}

/// Collapses the selection immediately after `node`.
///
/// A zero-width placeholder text node is inserted after `node` and the caret
/// is placed at its end, so the next character typed lands outside `node`.
/// Returns the placeholder, or `None` if `node` has no parent.
pub fn place_caret_after<S>(doc: &mut Document, selection: &mut S, node: NodeId) -> Option<NodeId>
where
    S: SelectionHandle + ?Sized,
{
    doc.parent(node)?;
    let placeholder = doc.create_text(CARET_PLACEHOLDER);
    doc.insert_after(node, placeholder)?;
    selection.remove_all_ranges();
    selection.collapse(Anchor::new(placeholder, doc.leaf_width(placeholder)));
    Some(placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(texts: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p);
        let leaves = texts
            .iter()
            .map(|t| {
                let n = doc.create_text(t);
                doc.append_child(p, n);
                n
            })
            .collect();
        (doc, p, leaves)
    }

    #[test]
    fn test_capture_without_selection_is_none() {
        let (doc, p, _) = paragraph(&["hello"]);
        assert_eq!(capture(&doc, p, &Selection::new()), None);
    }

    #[test]
    fn test_capture_outside_container_is_none() {
        let (mut doc, p, _) = paragraph(&["hello"]);
        let aside = doc.create_element("aside");
        let other = doc.create_text("sidebar");
        doc.append_child(doc.root(), aside);
        doc.append_child(aside, other);

        let sel = Selection::collapsed_at(Anchor::new(other, 2));
        assert_eq!(capture(&doc, p, &sel), None);
    }

    #[test]
    fn test_capture_spanning_two_leaves() {
        let (doc, p, leaves) = paragraph(&["abc", "defg"]);
        let sel = Selection::spanning(Anchor::new(leaves[0], 1), Anchor::new(leaves[1], 3));
        assert_eq!(capture(&doc, p, &sel), Some(SelectionOffsets { start: 1, end: 6 }));
    }

    #[test]
    fn test_reversed_selection_keeps_direction() {
        let (doc, p, leaves) = paragraph(&["abc", "defg"]);
        let sel = Selection::spanning(Anchor::new(leaves[1], 2), Anchor::new(leaves[0], 0));
        let saved = capture(&doc, p, &sel).unwrap();
        assert_eq!(saved, SelectionOffsets { start: 5, end: 0 });

        let mut restored = Selection::new();
        restore(&doc, p, &mut restored, Some(saved));
        assert_eq!(restored, sel);
    }

    #[test]
    fn test_capture_then_restore_reproduces_selection() {
        let (doc, p, leaves) = paragraph(&["abc", "defg"]);
        for sel in [
            Selection::collapsed_at(Anchor::new(leaves[0], 2)),
            Selection::spanning(Anchor::new(leaves[0], 1), Anchor::new(leaves[1], 4)),
        ] {
            let saved = capture(&doc, p, &sel);
            let mut restored = Selection::new();
            restore(&doc, p, &mut restored, saved);
            assert_eq!(restored, sel);
        }
    }

    #[test]
    fn test_restore_survives_a_text_split() {
        let (mut doc, p, leaves) = paragraph(&["abcdef"]);
        let sel = Selection::collapsed_at(Anchor::new(leaves[0], 5));
        let saved = capture(&doc, p, &sel);

        let tail = doc.split_text(leaves[0], 3).unwrap();

        let mut restored = Selection::new();
        restore(&doc, p, &mut restored, saved);
        assert_eq!(restored, Selection::collapsed_at(Anchor::new(tail, 2)));
    }

    #[test]
    fn test_restore_none_is_noop() {
        let (doc, p, leaves) = paragraph(&["abc"]);
        let original = Selection::collapsed_at(Anchor::new(leaves[0], 1));
        let mut sel = original;
        restore(&doc, p, &mut sel, None);
        assert_eq!(sel, original);
    }

    #[test]
    fn test_restore_past_end_is_abandoned() {
        let (doc, p, leaves) = paragraph(&["abc"]);
        let original = Selection::collapsed_at(Anchor::new(leaves[0], 1));
        let mut sel = original;
        restore(&doc, p, &mut sel, Some(SelectionOffsets { start: 1, end: 9 }));
        assert_eq!(sel, original);
    }

    #[test]
    fn test_place_caret_after_inserts_placeholder() {
        let (mut doc, p, leaves) = paragraph(&["abc", "def"]);
        let mut sel = Selection::spanning(Anchor::new(leaves[0], 0), Anchor::new(leaves[1], 1));

        let placeholder = place_caret_after(&mut doc, &mut sel, leaves[0]).unwrap();

        assert_eq!(doc.children(p), &[leaves[0], placeholder, leaves[1]]);
        assert_eq!(doc.text(placeholder), Some(CARET_PLACEHOLDER));
        assert!(sel.is_collapsed());
        assert_eq!(capture(&doc, p, &sel), Some(SelectionOffsets { start: 4, end: 4 }));
    }

    #[test]
    fn test_place_caret_after_detached_node_leaves_selection_alone() {
        let (mut doc, _, leaves) = paragraph(&["abc"]);
        let stray = doc.create_text("stray");
        let original = Selection::collapsed_at(Anchor::new(leaves[0], 1));
        let mut sel = original;

        let before = doc.node_count();

        assert_eq!(place_caret_after(&mut doc, &mut sel, stray), None);
        assert_eq!(sel, original);
        assert_eq!(doc.node_count(), before);
    }
}
