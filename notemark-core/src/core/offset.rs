//! Conversion between node-relative selection anchors and linear offsets.
//!
//! A linear offset counts characters from the start of a container's visible
//! text. Markers are atomic leaves worth [`MARKER_WIDTH`] each; anything
//! inside a marker maps to the marker's trailing edge.
//!
//! Anchor offsets follow the usual DOM convention: a character index for a
//! text node, a child index for every other node.

use crate::core::document::{Document, NodeId, NodeKind, MARKER_WIDTH};

/// One endpoint of a selection: a node plus an offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub node: NodeId,
    pub offset: usize,
}

impl Anchor {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Maps `(node, offset)` to a linear offset within `container`.
///
/// A node outside `container` maps to the end of its content.
pub fn node_offset_to_linear(doc: &Document, container: NodeId, node: NodeId, offset: usize) -> usize {
    if !doc.contains(container, node) {
        return content_length(doc, container);
    }

    if let Some(marker) = doc.enclosing_marker(node).filter(|&m| m != container) {
        return width_before(doc, container, marker).map_or_else(
            || content_length(doc, container),
            |before| before + MARKER_WIDTH,
        );
    }

    let position = match doc.kind(node) {
        NodeKind::Text(_) => {
            width_before(doc, container, node).map(|before| before + offset.min(doc.leaf_width(node)))
        }
        _ => match doc.children(node).get(offset) {
            Some(&child) => width_before(doc, container, child),
            None => width_before(doc, container, node).map(|before| before + content_length(doc, node)),
        },
    };
    position.unwrap_or_else(|| content_length(doc, container))
}

/// Maps a linear offset back to an anchor within `container`.
///
/// The first leaf whose end reaches `linear` wins, so a position on the
/// boundary between two text leaves resolves to the end of the earlier one.
/// Positions on either side of a marker resolve to child-index anchors in
/// the marker's parent. Returns `None` when `linear` lies past the end of
/// the content or the container has no leaves.
pub fn linear_to_node_offset(doc: &Document, container: NodeId, linear: usize) -> Option<Anchor> {
    let mut running = 0;
    for leaf in doc.leaves(container) {
        let width = doc.leaf_width(leaf);
        if linear <= running + width {
            let within = linear - running;
            return match doc.kind(leaf) {
                NodeKind::Marker(_) => {
                    let parent = doc.parent(leaf)?;
                    let index = doc.index_in_parent(leaf)?;
                    Some(Anchor::new(parent, index + within))
                }
                _ => Some(Anchor::new(leaf, within)),
            };
        }
        running += width;
    }
    None
}

/// Total linear length of `container`.
pub fn content_length(doc: &Document, container: NodeId) -> usize {
    doc.leaves(container).into_iter().map(|leaf| doc.leaf_width(leaf)).sum()
}

/// Sum of leaf widths that precede `target` in a document-order walk of
/// `container`, or `None` if the walk never reaches `target`.
fn width_before(doc: &Document, container: NodeId, target: NodeId) -> Option<usize> {
    let mut running = 0;
    let mut stack = vec![container];
    while let Some(id) = stack.pop() {
        if id == target {
            return Some(running);
        }
        match doc.kind(id) {
            NodeKind::Text(_) | NodeKind::Marker(_) => running += doc.leaf_width(id),
            _ => stack.extend(doc.children(id).iter().rev().copied()),
        }
    }
    None
}
