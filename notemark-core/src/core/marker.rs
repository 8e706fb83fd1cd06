//! Embedded, non-editable content markers.
//!
//! A marker stands in for an attachment-like object (image, file, table,
//! another note, ...) inside rich text. It is built fully formed in one step,
//! occupies a single position in offset space, and can never hold the caret:
//! a selection that drifts inside one is moved to just after it.

use crate::core::document::{Document, NodeId, NodeKind};
use crate::core::selection::{place_caret_after, SelectionHandle};
use crate::{classify, ContentKind, Identified};
use serde::{Deserialize, Serialize};

/// Class applied to a marker's icon element.
pub const ICON_CLASS: &str = "content-marker-icon";
/// Class applied to a marker's name element.
pub const NAME_CLASS: &str = "content-marker-name";
/// Class applied to a marker's remove control.
pub const REMOVE_CLASS: &str = "ri-close-line";

/// The data carried by a marker node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Caller-supplied id, unique within a document.
    pub id: String,
    /// The raw type the marker was created with (`image/png`, `table`, ...).
    pub content_type: String,
    pub kind: ContentKind,
    pub name: String,
    pub readonly: bool,
}

impl Marker {
    pub fn new(id: impl Into<String>, content_type: impl Into<String>, name: impl Into<String>, readonly: bool) -> Self {
        let content_type = content_type.into();
        Self {
            id: id.into(),
            kind: classify(&content_type),
            content_type,
            name: name.into(),
            readonly,
        }
    }
}

impl Identified for Marker {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Receives marker activations.
pub trait MarkerListener {
    /// The marker body was clicked.
    fn on_click(&mut self, _marker: &Marker) {}
    /// The marker's remove control was clicked.
    fn on_remove(&mut self, _marker: &Marker) {}
}

/// Listener that ignores everything.
impl MarkerListener for () {}

/// What a click on a node turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The remove control of the marker at this node was hit.
    RemoveRequested(NodeId),
    /// The marker at this node was clicked and the caret moved after it.
    Activated(NodeId),
    /// The click did not land on a marker.
    Ignored,
}

/// Builds a detached marker node: icon, name and, unless read-only, a
/// remove control.
pub fn create_marker(doc: &mut Document, marker: Marker) -> NodeId {
    let icon_class = match marker.kind.style() {
        Some(style) => format!("{} {} {ICON_CLASS}", style.icon, style.color),
        None => ICON_CLASS.to_string(),
    };
    let name = marker.name.clone();
    let readonly = marker.readonly;

    let root = doc.create_node(NodeKind::Marker(marker));
    let icon = doc.create_element_with_class("i", &icon_class);
    let label = doc.create_element_with_class("span", NAME_CLASS);
    let label_text = doc.create_text(&name);
    doc.append_child(root, icon);
    doc.append_child(root, label);
    doc.append_child(label, label_text);

    if !readonly {
        let remove = doc.create_node(NodeKind::RemoveButton);
        doc.append_child(root, remove);
    }
    root
}

/// The marker enclosing the selection's common ancestor, if any.
pub fn selection_marker<S>(doc: &Document, selection: &S) -> Option<NodeId>
where
    S: SelectionHandle + ?Sized,
{
    let anchor = selection.anchor()?;
    let focus = selection.focus()?;
    let common = doc.common_ancestor(anchor.node, focus.node)?;
    doc.enclosing_marker(common)
}

pub fn is_selection_inside_marker<S>(doc: &Document, selection: &S) -> bool
where
    S: SelectionHandle + ?Sized,
{
    selection_marker(doc, selection).is_some()
}

/// Moves a selection that drifted inside a marker to just after it.
///
/// Returns `true` when a correction was made.
pub fn escape_marker_if_inside<S>(doc: &mut Document, selection: &mut S) -> bool
where
    S: SelectionHandle + ?Sized,
{
    let Some(marker) = selection_marker(doc, selection) else {
        return false;
    };
    log::debug!("caret drifted inside marker {marker:?}; moving it out");
    place_caret_after(doc, selection, marker).is_some()
}

/// Dispatches a click on `target`.
///
/// A hit on the remove control reports only `on_remove`; it never also
/// counts as a click on the marker body. A hit anywhere else inside a
/// marker reports `on_click` and parks the caret right after the marker.
pub fn dispatch_click<S, L>(doc: &mut Document, selection: &mut S, target: NodeId, listener: &mut L) -> ClickOutcome
where
    S: SelectionHandle + ?Sized,
    L: MarkerListener + ?Sized,
{
    let Some(marker_node) = doc.enclosing_marker(target) else {
        return ClickOutcome::Ignored;
    };
    let hit_remove = doc
        .self_and_ancestors(target)
        .take_while(|&n| n != marker_node)
        .any(|n| matches!(doc.kind(n), NodeKind::RemoveButton));

    if let Some(marker) = doc.marker(marker_node) {
        if hit_remove {
            listener.on_remove(marker);
            return ClickOutcome::RemoveRequested(marker_node);
        }
        listener.on_click(marker);
    }
    place_caret_after(doc, selection, marker_node);
    ClickOutcome::Activated(marker_node)
}

/// Marker nodes under `container` in document order.
pub fn find_markers(doc: &Document, container: NodeId) -> Vec<NodeId> {
    doc.leaves(container)
        .into_iter()
        .filter(|&n| doc.marker(n).is_some())
        .collect()
}

/// Index of the first entry whose id is `id`.
pub fn find_content_index<T: Identified>(contents: &[T], id: &str) -> Option<usize> {
    contents.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::offset::Anchor;
    use crate::core::selection::{capture, Selection, SelectionOffsets};

    #[derive(Default)]
    struct Recorder {
        clicked: Vec<String>,
        removed: Vec<String>,
    }

    impl MarkerListener for Recorder {
        fn on_click(&mut self, marker: &Marker) {
            self.clicked.push(marker.id.clone());
        }

        fn on_remove(&mut self, marker: &Marker) {
            self.removed.push(marker.id.clone());
        }
    }

    /// `<body>"ab"<marker/>"cd"</body>`
    fn doc_with_marker(readonly: bool) -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let ab = doc.create_text("ab");
        let cd = doc.create_text("cd");
        let marker = create_marker(&mut doc, Marker::new("m1", "application/pdf", "report.pdf", readonly));
        doc.append_child(doc.root(), ab);
        doc.append_child(doc.root(), marker);
        doc.append_child(doc.root(), cd);
        (doc, marker, ab)
    }

    fn name_text(doc: &Document, marker: NodeId) -> NodeId {
        let label = doc.children(marker)[1];
        doc.children(label)[0]
    }

    #[test]
    fn test_create_marker_builds_icon_name_and_remove() {
        let (doc, marker, _) = doc_with_marker(false);
        let children = doc.children(marker);
        assert_eq!(children.len(), 3);
        assert_eq!(
            doc.kind(children[0]),
            &NodeKind::Element {
                tag: "i".to_string(),
                class: Some("ri-folder-line text-indigo-500 content-marker-icon".to_string()),
            }
        );
        assert_eq!(doc.text_content(marker), "report.pdf");
        assert_eq!(doc.kind(children[2]), &NodeKind::RemoveButton);
        assert_eq!(doc.marker(marker).unwrap().kind, ContentKind::File);
    }

    #[test]
    fn test_readonly_marker_has_no_remove_control() {
        let (doc, marker, _) = doc_with_marker(true);
        assert_eq!(doc.children(marker).len(), 2);
    }

    #[test]
    fn test_selection_inside_marker_is_detected_and_escaped() {
        let (mut doc, marker, _) = doc_with_marker(false);
        let inner = name_text(&doc, marker);
        let mut sel = Selection::collapsed_at(Anchor::new(inner, 3));

        assert!(is_selection_inside_marker(&doc, &sel));
        assert!(escape_marker_if_inside(&mut doc, &mut sel));
        assert!(!is_selection_inside_marker(&doc, &sel));

        // "ab" + marker + placeholder
        assert_eq!(
            capture(&doc, doc.root(), &sel),
            Some(SelectionOffsets { start: 4, end: 4 })
        );
    }

    #[test]
    fn test_escape_outside_marker_is_noop() {
        let (mut doc, _, ab) = doc_with_marker(false);
        let original = Selection::collapsed_at(Anchor::new(ab, 1));
        let mut sel = original;
        assert!(!escape_marker_if_inside(&mut doc, &mut sel));
        assert_eq!(sel, original);
    }

    #[test]
    fn test_click_on_remove_does_not_fire_marker_click() {
        let (mut doc, marker, ab) = doc_with_marker(false);
        let remove = doc.children(marker)[2];
        let original = Selection::collapsed_at(Anchor::new(ab, 1));
        let mut sel = original;
        let mut recorder = Recorder::default();

        let outcome = dispatch_click(&mut doc, &mut sel, remove, &mut recorder);

        assert_eq!(outcome, ClickOutcome::RemoveRequested(marker));
        assert_eq!(recorder.removed, vec!["m1".to_string()]);
        assert!(recorder.clicked.is_empty());
        assert_eq!(sel, original);
    }

    #[test]
    fn test_click_on_marker_body_moves_caret_after_it() {
        let (mut doc, marker, _) = doc_with_marker(false);
        let inner = name_text(&doc, marker);
        let mut sel = Selection::new();
        let mut recorder = Recorder::default();

        let outcome = dispatch_click(&mut doc, &mut sel, inner, &mut recorder);

        assert_eq!(outcome, ClickOutcome::Activated(marker));
        assert_eq!(recorder.clicked, vec!["m1".to_string()]);
        assert!(recorder.removed.is_empty());
        assert_eq!(
            capture(&doc, doc.root(), &sel),
            Some(SelectionOffsets { start: 4, end: 4 })
        );
    }

    #[test]
    fn test_click_outside_marker_is_ignored() {
        let (mut doc, _, ab) = doc_with_marker(false);
        let mut sel = Selection::new();
        assert_eq!(dispatch_click(&mut doc, &mut sel, ab, &mut ()), ClickOutcome::Ignored);
        assert_eq!(sel, Selection::new());
    }

    #[test]
    fn test_find_markers_in_document_order() {
        let (mut doc, first, _) = doc_with_marker(true);
        let second = create_marker(&mut doc, Marker::new("m2", "table", "Budget", true));
        doc.append_child(doc.root(), second);
        assert_eq!(find_markers(&doc, doc.root()), vec![first, second]);
    }

    #[test]
    fn test_find_content_index() {
        let contents = vec![
            Marker::new("a", "note", "A", true),
            Marker::new("b", "note", "B", true),
        ];
        assert_eq!(find_content_index(&contents, "b"), Some(1));
        assert_eq!(find_content_index(&contents, "z"), None);
        assert_eq!(find_content_index::<Marker>(&[], "a"), None);
    }
}
