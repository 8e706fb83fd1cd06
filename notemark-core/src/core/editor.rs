//! Editing flows over a document and its selection.
//!
//! Every structural change follows the same discipline: correct a caret
//! that drifted into a marker, capture the selection as offsets, mutate the
//! tree, then restore or re-place the caret.

use crate::core::document::{Document, NodeId, NodeKind, MARKER_WIDTH};
use crate::core::html::strip_marker_internals;
use crate::core::marker::{create_marker, dispatch_click, escape_marker_if_inside, find_markers, ClickOutcome, MarkerListener};
use crate::core::offset::{node_offset_to_linear, Anchor};
use crate::core::selection::{capture, place_caret_after, restore, Selection, SelectionHandle, SelectionOffsets};
use crate::{ContentRef, Marker};

/// A document being edited, together with its selection.
pub struct Editor<S: SelectionHandle = Selection> {
    document: Document,
    selection: S,
    container: NodeId,
}

impl Editor<Selection> {
    /// An empty document with nothing selected.
    pub fn new() -> Self {
        let document = Document::new();
        let container = document.root();
        Self::with_selection(document, container, Selection::new())
    }
}

impl Default for Editor<Selection> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SelectionHandle> Editor<S> {
    pub fn with_selection(document: Document, container: NodeId, selection: S) -> Self {
        Self {
            document,
            selection,
            container,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut S {
        &mut self.selection
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The current selection as offsets within the container.
    pub fn caret_offsets(&self) -> Option<SelectionOffsets> {
        capture(&self.document, self.container, &self.selection)
    }

    /// Types `text` at the caret and leaves the caret after it.
    ///
    /// With no caret in the container, the text is appended at the end.
    pub fn type_text(&mut self, text: &str) {
        escape_marker_if_inside(&mut self.document, &mut self.selection);

        if let Some(caret) = self.caret() {
            if let Some(end) = self.document.insert_text(caret.node, caret.offset, text) {
                self.selection.collapse(Anchor::new(caret.node, end));
                return;
            }
        }

        let (parent, reference) = self.insertion_point();
        let node = self.document.create_text(text);
        self.document.insert_before(parent, node, reference);
        self.selection.collapse(Anchor::new(node, self.document.leaf_width(node)));
    }

    /// Inserts a marker at the caret, splitting the text there, and parks
    /// the caret right after it. Returns the marker node.
    pub fn insert_marker(&mut self, marker: Marker) -> NodeId {
        escape_marker_if_inside(&mut self.document, &mut self.selection);

        let (parent, reference) = self.insertion_point();
        let node = create_marker(&mut self.document, marker);
        self.document.insert_before(parent, node, reference);
        place_caret_after(&mut self.document, &mut self.selection, node);
        node
    }

    /// Removes the marker with `id`, keeping the caret where it was relative
    /// to the surrounding text. Returns `false` if there is no such marker.
    pub fn remove_marker(&mut self, id: &str) -> bool {
        let Some(node) = self.find_marker(id) else {
            return false;
        };
        let (Some(parent), Some(index)) = (self.document.parent(node), self.document.index_in_parent(node)) else {
            return false;
        };
        let position = node_offset_to_linear(&self.document, self.container, parent, index);
        let saved = self.caret_offsets().map(|offsets| SelectionOffsets {
            start: shift_past(offsets.start, position),
            end: shift_past(offsets.end, position),
        });

        self.document.detach(node);
        restore(&self.document, self.container, &mut self.selection, saved);
        true
    }

    /// Dispatches a click on `target` to the marker under it.
    pub fn click<L>(&mut self, target: NodeId, listener: &mut L) -> ClickOutcome
    where
        L: MarkerListener + ?Sized,
    {
        dispatch_click(&mut self.document, &mut self.selection, target, listener)
    }

    /// Marker nodes in the container, in document order.
    pub fn markers(&self) -> Vec<NodeId> {
        find_markers(&self.document, self.container)
    }

    /// The container's HTML ready for storage, with marker internals
    /// stripped, and the list of markers it references.
    pub fn save_content(&self) -> (String, Vec<ContentRef>) {
        let html = strip_marker_internals(&self.document.to_html(self.container));
        let contents = self
            .markers()
            .into_iter()
            .filter_map(|node| self.document.marker(node))
            .map(|marker| ContentRef {
                id: marker.id.clone(),
                content_type: marker.content_type.clone(),
                kind: marker.kind.clone(),
                name: marker.name.clone(),
            })
            .collect();
        (html, contents)
    }

    fn find_marker(&self, id: &str) -> Option<NodeId> {
        self.markers()
            .into_iter()
            .find(|&node| self.document.marker(node).is_some_and(|m| m.id == id))
    }

    /// The selection's focus, if it lies inside the container.
    fn caret(&self) -> Option<Anchor> {
        self.selection
            .focus()
            .filter(|focus| self.document.contains(self.container, focus.node))
    }

    /// Where a new node goes for the current caret, as a parent and the
    /// child to insert before. Splits a text node when the caret is inside
    /// one.
    fn insertion_point(&mut self) -> (NodeId, Option<NodeId>) {
        let Some(caret) = self.caret() else {
            return (self.container, None);
        };
        let doc = &mut self.document;
        if !matches!(doc.kind(caret.node), NodeKind::Text(_)) {
            return (caret.node, doc.children(caret.node).get(caret.offset).copied());
        }
        let Some(parent) = doc.parent(caret.node) else {
            return (self.container, None);
        };
        let width = doc.leaf_width(caret.node);
        if caret.offset == 0 {
            (parent, Some(caret.node))
        } else if caret.offset >= width {
            let next = doc
                .index_in_parent(caret.node)
                .and_then(|i| doc.children(parent).get(i + 1).copied());
            (parent, next)
        } else {
            (parent, doc.split_text(caret.node, caret.offset))
        }
    }
}

/// Moves an offset lying past a removed marker back by the marker's width.
fn shift_past(offset: usize, marker_position: usize) -> usize {
    if offset > marker_position {
        offset.saturating_sub(MARKER_WIDTH).max(marker_position)
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::CARET_PLACEHOLDER;
    use crate::ContentKind;

    fn editor_with_text(text: &str) -> (Editor, NodeId) {
        let mut editor = Editor::new();
        let root = editor.container();
        let node = editor.document_mut().create_text(text);
        editor.document_mut().append_child(root, node);
        (editor, node)
    }

    fn offsets(editor: &Editor) -> usize {
        editor.caret_offsets().map(|o| o.end).unwrap()
    }

    #[test]
    fn test_typing_into_empty_editor_appends_text() {
        let mut editor = Editor::new();
        editor.type_text("hi");
        editor.type_text(" there");

        assert_eq!(editor.document().text_content(editor.container()), "hi there");
        assert_eq!(offsets(&editor), 8);
    }

    #[test]
    fn test_typing_at_caret_in_middle_of_text() {
        let (mut editor, node) = editor_with_text("helo");
        editor.selection_mut().collapse(Anchor::new(node, 3));

        editor.type_text("l");

        assert_eq!(editor.document().text(node), Some("hello"));
        assert_eq!(editor.caret_offsets(), Some(SelectionOffsets { start: 4, end: 4 }));
    }

    #[test]
    fn test_insert_marker_splits_text_and_parks_caret_after() {
        let (mut editor, node) = editor_with_text("abcd");
        editor.selection_mut().collapse(Anchor::new(node, 2));

        let marker = editor.insert_marker(Marker::new("m1", "image/png", "cat.png", false));

        let root = editor.container();
        let children = editor.document().children(root).to_vec();
        assert_eq!(children.len(), 4);
        assert_eq!(editor.document().text(children[0]), Some("ab"));
        assert_eq!(children[1], marker);
        assert_eq!(editor.document().text(children[2]), Some(CARET_PLACEHOLDER));
        assert_eq!(editor.document().text(children[3]), Some("cd"));
        // "ab" + marker + placeholder
        assert_eq!(editor.caret_offsets(), Some(SelectionOffsets { start: 4, end: 4 }));
    }

    #[test]
    fn test_offsets_increase_while_typing_after_marker() {
        let (mut editor, node) = editor_with_text("ab");
        editor.selection_mut().collapse(Anchor::new(node, 2));
        editor.insert_marker(Marker::new("m1", "note", "Other note", true));

        let mut previous = offsets(&editor);
        for ch in ["x", "y", "z"] {
            editor.type_text(ch);
            let now = offsets(&editor);
            assert_eq!(now, previous + 1);
            previous = now;
        }
        assert!(!crate::core::marker::is_selection_inside_marker(editor.document(), editor.selection()));
        let text = editor.document().text_content(editor.container());
        assert!(text.ends_with("xyz"));
    }

    #[test]
    fn test_typing_with_caret_inside_marker_escapes_first() {
        let (mut editor, node) = editor_with_text("ab");
        editor.selection_mut().collapse(Anchor::new(node, 2));
        let marker = editor.insert_marker(Marker::new("m1", "table", "Budget", false));
        let label_text = {
            let doc = editor.document();
            doc.children(doc.children(marker)[1])[0]
        };
        editor.selection_mut().collapse(Anchor::new(label_text, 2));

        editor.type_text("!");

        assert_eq!(editor.document().text_content(marker), "Budget");
        assert_eq!(editor.document().marker(marker).map(|m| m.name.as_str()), Some("Budget"));
    }

    #[test]
    fn test_remove_marker_keeps_caret_relative_to_text() {
        let (mut editor, node) = editor_with_text("abcd");
        editor.selection_mut().collapse(Anchor::new(node, 2));
        editor.insert_marker(Marker::new("m1", "video/mp4", "clip.mp4", false));
        // caret after "ab" + marker + placeholder + "c"
        let tail = *editor.document().children(editor.container()).last().unwrap();
        editor.selection_mut().collapse(Anchor::new(tail, 1));
        assert_eq!(offsets(&editor), 5);

        assert!(editor.remove_marker("m1"));

        assert!(editor.markers().is_empty());
        assert_eq!(offsets(&editor), 4);
        let caret = editor.selection().focus().unwrap();
        assert_eq!(editor.document().text(caret.node), Some("cd"));
        assert_eq!(caret.offset, 1);
    }

    #[test]
    fn test_remove_unknown_marker_is_false() {
        let (mut editor, _) = editor_with_text("ab");
        assert!(!editor.remove_marker("nope"));
    }

    #[test]
    fn test_click_remove_control_then_remove() {
        let mut editor = Editor::new();
        let marker = editor.insert_marker(Marker::new("m1", "link", "Docs", false));
        let remove = editor.document().children(marker)[2];

        let outcome = editor.click(remove, &mut ());

        assert_eq!(outcome, ClickOutcome::RemoveRequested(marker));
        assert!(editor.remove_marker("m1"));
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_save_content_strips_markers_and_lists_them() {
        let (mut editor, node) = editor_with_text("see ");
        editor.selection_mut().collapse(Anchor::new(node, 4));
        editor.insert_marker(Marker::new("f1", "application/pdf", "report.pdf", false));
        editor.type_text("done");

        let (html, contents) = editor.save_content();

        assert_eq!(
            html,
            "see <content data-id=\"f1\" data-type=\"application/pdf\" data-name=\"report.pdf\"></content>\u{200B}done"
        );
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].id, "f1");
        assert_eq!(contents[0].kind, ContentKind::File);
        assert_eq!(crate::find_content_index(&contents, "f1"), Some(0));
    }
}
