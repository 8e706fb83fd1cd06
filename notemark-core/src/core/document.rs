//! Arena-backed rich-text document tree.
//!
//! Every node lives in one `Vec` owned by the [`Document`] and is addressed by
//! a [`NodeId`]. Parent and child links are plain ids, so walking up from a
//! selection anchor and walking down over a container's leaves are both cheap
//! and borrow-free. Detached nodes stay in the arena; they are simply no
//! longer reachable from the root.
//!
//! The node kind is a typed discriminant: markers and their remove control
//! are recognised by pattern match, never by comparing tag strings.

use crate::Marker;

/// Width of a marker in linear offset space.
pub const MARKER_WIDTH: usize = 1;

/// Stable handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A structural element (`div`, `p`, `span`, `i`, ...).
    Element { tag: String, class: Option<String> },
    /// A text-bearing leaf.
    Text(String),
    /// The root of an embedded, non-editable marker.
    Marker(Marker),
    /// The remove control rendered inside an editable marker.
    RemoveButton,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rich-text document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document containing only an empty `body` root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element("body");
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a detached node of any kind.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_node(NodeKind::Element {
            tag: tag.to_string(),
            class: None,
        })
    }

    pub fn create_element_with_class(&mut self, tag: &str, class: &str) -> NodeId {
        self.create_node(NodeKind::Element {
            tag: tag.to_string(),
            class: Some(class.to_string()),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create_node(NodeKind::Text(text.to_string()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Text of a text node, `None` for every other kind.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The marker carried by `id`, if it is a marker root.
    pub fn marker(&self, id: NodeId) -> Option<&Marker> {
        match &self.nodes[id.0].kind {
            NodeKind::Marker(marker) => Some(marker),
            _ => None,
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Inserts `child` under `parent` before `reference`, or last when
    /// `reference` is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Inserts `child` as the next sibling of `reference`.
    ///
    /// Returns the shared parent, or `None` (and does nothing) when
    /// `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Option<NodeId> {
        let parent = self.parent(reference)?;
        self.detach(child);
        let index = self.index_in_parent(reference)? + 1;
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Some(parent)
    }

    /// Removes `id` from its parent. The subtree stays intact in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Iterates `id`, its parent, its grandparent and so on up to the root.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// Whether `node` is `ancestor` or lies somewhere beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.self_and_ancestors(node).any(|n| n == ancestor)
    }

    /// Deepest node containing both `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.self_and_ancestors(a).collect();
        self.self_and_ancestors(b).find(|n| chain.contains(n))
    }

    /// The marker root enclosing `id` (inclusive), if any.
    pub fn enclosing_marker(&self, id: NodeId) -> Option<NodeId> {
        self.self_and_ancestors(id)
            .find(|&n| matches!(self.kind(n), NodeKind::Marker(_)))
    }

    /// Text-bearing leaves under `container` in document order.
    ///
    /// Markers are atomic: they appear as a single leaf and the walk never
    /// descends into their internals.
    pub fn leaves(&self, container: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![container];
        while let Some(id) = stack.pop() {
            match self.kind(id) {
                NodeKind::Text(_) | NodeKind::Marker(_) => out.push(id),
                _ => stack.extend(self.children(id).iter().rev().copied()),
            }
        }
        out
    }

    /// Width of a leaf in linear offset space: characters for text,
    /// [`MARKER_WIDTH`] for a marker, zero for anything else.
    pub fn leaf_width(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Marker(_) => MARKER_WIDTH,
            _ => 0,
        }
    }

    /// Concatenated text of every text node under `id`, marker internals included.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            match self.kind(n) {
                NodeKind::Text(text) => out.push_str(text),
                _ => stack.extend(self.children(n).iter().rev().copied()),
            }
        }
        out
    }

    /// Inserts `text` into the text node `id` at character offset `offset`
    /// (clamped to the node's length). Returns the character offset just
    /// past the inserted text, or `None` when `id` is not a text node.
    pub fn insert_text(&mut self, id: NodeId, offset: usize, text: &str) -> Option<usize> {
        let NodeKind::Text(existing) = &mut self.nodes[id.0].kind else {
            return None;
        };
        let at = byte_index(existing, offset);
        existing.insert_str(at, text);
        Some(existing[..at].chars().count() + text.chars().count())
    }

    /// Splits the text node `id` at character `offset`, moving the tail into a
    /// new text node inserted right after it. Returns the new node.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        self.nodes[id.0].parent?;
        let NodeKind::Text(existing) = &mut self.nodes[id.0].kind else {
            return None;
        };
        let at = byte_index(existing, offset);
        let tail = existing.split_off(at);
        let new_node = self.create_text(&tail);
        self.insert_after(id, new_node)?;
        Some(new_node)
    }
}

/// Byte index of character `offset` in `s`, clamped to `s.len()`.
fn byte_index(s: &str, offset: usize) -> usize {
    s.char_indices().nth(offset).map_or(s.len(), |(b, _)| b)
}
