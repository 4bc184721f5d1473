//! Arena-backed mutable document tree.
//!
//! Nodes live in a flat vector and reference each other through `NodeId`
//! indices, so tree mutation during traversal never invalidates handles
//! held by a work list. Nodes detached by a splice stay in the arena
//! unreachable; the tree only lives for one treatment.

/// Stable handle into the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node is: the root document, an element, or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        tag: String,
        /// Attributes in document order.
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable ordered tree of document nodes.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    declaration: Option<String>,
}

impl DocumentTree {
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            declaration: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// XML declaration captured at parse time, re-emitted on serialization.
    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    pub fn set_declaration(&mut self, decl: Option<String>) {
        self.declaration = decl;
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData {
            kind: NodeKind::Element {
                tag: tag.to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeData {
            kind: NodeKind::Text(content.to_string()),
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    /// Element tag name, if the node is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Text content, if the node is a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    fn set_text(&mut self, id: NodeId, content: String) {
        if let NodeKind::Text(existing) = &mut self.nodes[id.0].kind {
            *existing = content;
        }
    }

    /// Set or replace an attribute on an element node.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            if let Some(pair) = attrs.iter_mut().find(|(k, _)| k == name) {
                pair.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Sibling immediately after `id` under its parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Replace `id` in its parent's child list with `replacements`, in
    /// order. The replaced node is detached and stays in the arena.
    pub fn replace_with(&mut self, id: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let pos = match self.nodes[parent.0].children.iter().position(|&c| c == id) {
            Some(p) => p,
            None => return,
        };
        self.nodes[id.0].parent = None;
        self.nodes[parent.0]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        for &r in replacements {
            self.nodes[r.0].parent = Some(parent);
        }
    }

    /// Detach and return all children of `id`.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &c in &children {
            self.nodes[c.0].parent = None;
        }
        children
    }

    /// Concatenated text of the node and all its descendants, in document
    /// order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.nodes[current.0].kind {
                NodeKind::Text(content) => out.push_str(content),
                _ => {
                    for &child in self.nodes[current.0].children.iter().rev() {
                        stack.push(child);
                    }
                }
            }
        }
        out
    }

    /// All descendants of `id` in pre-order document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.nodes[current.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Merge adjacent text siblings and drop empty text nodes, the way
    /// `Document.normalize()` does. Runs over the whole tree.
    pub fn normalize(&mut self) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let old = std::mem::take(&mut self.nodes[id.0].children);
            let mut merged: Vec<NodeId> = Vec::with_capacity(old.len());
            for child in old {
                match self.nodes[child.0].kind.clone() {
                    NodeKind::Text(content) => {
                        if content.is_empty() {
                            self.nodes[child.0].parent = None;
                            continue;
                        }
                        if let Some(&last) = merged.last() {
                            if let Some(prev) = self.text(last) {
                                let joined = format!("{prev}{content}");
                                self.set_text(last, joined);
                                self.nodes[child.0].parent = None;
                                continue;
                            }
                        }
                        merged.push(child);
                    }
                    _ => {
                        stack.push(child);
                        merged.push(child);
                    }
                }
            }
            self.nodes[id.0].children = merged;
        }
    }

    /// Structural equality with another tree: same kinds, tags, attribute
    /// sets, text, and child order. Arena indices are irrelevant.
    pub fn structural_eq(&self, other: &DocumentTree) -> bool {
        self.node_eq(self.root, other, other.root)
    }

    fn node_eq(&self, a: NodeId, other: &DocumentTree, b: NodeId) -> bool {
        let (da, db) = (&self.nodes[a.0], &other.nodes[b.0]);
        let kinds_match = match (&da.kind, &db.kind) {
            (NodeKind::Document, NodeKind::Document) => true,
            (NodeKind::Text(x), NodeKind::Text(y)) => x == y,
            (
                NodeKind::Element { tag: ta, attrs: aa },
                NodeKind::Element { tag: tb, attrs: ab },
            ) => {
                let mut sa = aa.clone();
                let mut sb = ab.clone();
                sa.sort();
                sb.sort();
                ta == tb && sa == sb
            }
            _ => false,
        };
        kinds_match
            && da.children.len() == db.children.len()
            && da
                .children
                .iter()
                .zip(db.children.iter())
                .all(|(&ca, &cb)| self.node_eq(ca, other, cb))
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(tree: &mut DocumentTree, text: &str) -> NodeId {
        let p = tree.create_element("p");
        let t = tree.create_text(text);
        tree.append_child(p, t);
        let root = tree.root();
        tree.append_child(root, p);
        p
    }

    #[test]
    fn test_replace_with_splices_in_order() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, "abc");
        let target = tree.children(p)[0];

        let before = tree.create_text("a");
        let q = tree.create_element("q");
        let after = tree.create_text("c");
        tree.replace_with(target, &[before, q, after]);

        assert_eq!(tree.children(p), &[before, q, after]);
        assert_eq!(tree.parent(q), Some(p));
        assert_eq!(tree.parent(target), None);
        assert_eq!(tree.next_sibling(q), Some(after));
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, "Il a dit ");
        let b = tree.create_element("b");
        let inner = tree.create_text("«bonjour»");
        tree.append_child(b, inner);
        tree.append_child(p, b);

        assert_eq!(tree.text_content(p), "Il a dit «bonjour»");
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, "one ");
        let empty = tree.create_text("");
        let tail = tree.create_text("two");
        tree.append_child(p, empty);
        tree.append_child(p, tail);

        tree.normalize();

        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text(tree.children(p)[0]), Some("one two"));
    }

    #[test]
    fn test_structural_eq_ignores_arena_order() {
        let mut a = DocumentTree::new();
        paragraph(&mut a, "x");

        let mut b = DocumentTree::new();
        // Allocate in a different order so the ids differ.
        let orphan = b.create_text("unused");
        let _ = orphan;
        paragraph(&mut b, "x");

        assert!(a.structural_eq(&b));

        let mut c = DocumentTree::new();
        paragraph(&mut c, "y");
        assert!(!a.structural_eq(&c));
    }
}
