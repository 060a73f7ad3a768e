//! DOM Tree structure

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{DomError, DomResult};
use crate::node::{ElementData, Node, NodeId, NodeType};

/// DOM tree that owns all nodes
pub struct DomTree {
    /// All nodes in the tree
    nodes: FxHashMap<NodeId, Node>,
    /// Next available node ID
    next_id: u32,
    /// Root document node
    document_id: NodeId,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        let document_id = NodeId::new(0);
        let document = Node::new(document_id, NodeType::Document);

        let mut nodes = FxHashMap::default();
        nodes.insert(document_id, document);

        Self {
            nodes,
            next_id: 1,
            document_id,
        }
    }

    /// Get the document (root) node ID
    pub fn document_id(&self) -> NodeId {
        self.document_id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get element data for a node, failing if it is missing or not an element
    pub fn element(&self, id: NodeId) -> DomResult<&ElementData> {
        let node = self.get(id).ok_or(DomError::NodeNotFound(id.0))?;
        node.as_element().ok_or(DomError::NotAnElement(id.0))
    }

    /// Mutable variant of [`DomTree::element`]
    pub fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        let node = self.get_mut(id).ok_or(DomError::NodeNotFound(id.0))?;
        node.as_element_mut().ok_or(DomError::NotAnElement(id.0))
    }

    fn allocate(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, node_type));
        id
    }

    /// Create a new detached element node
    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.allocate(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a new detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.allocate(NodeType::Text(content.into()))
    }

    /// Create a new detached comment node
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.allocate(NodeType::Comment(content.into()))
    }

    /// Create an element with attributes and append it to `parent`
    pub fn append_element(
        &mut self,
        parent_id: NodeId,
        tag_name: &str,
        attributes: &[(&str, &str)],
    ) -> DomResult<NodeId> {
        let id = self.create_element(tag_name);
        {
            let element = self.element_mut(id)?;
            for (name, value) in attributes {
                element.set_attribute(*name, *value);
            }
        }
        self.append_child(parent_id, id)?;
        Ok(id)
    }

    /// Append a child node to a parent
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> DomResult<()> {
        if parent_id == child_id || self.ancestors(parent_id).contains(&child_id) {
            return Err(DomError::HierarchyRequest { child: child_id.0 });
        }

        // Detach from any previous parent first
        let old_parent = self.get(child_id).ok_or(DomError::NodeNotFound(child_id.0))?.parent;
        if let Some(old_parent) = old_parent {
            self.remove_child(old_parent, child_id)?;
        }

        let last_child = {
            let parent = self.get(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.last().copied()
        };

        {
            let child = self.get_mut(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            child.parent = Some(parent_id);
            child.prev_sibling = last_child;
            child.next_sibling = None;
        }

        if let Some(last_child_id) = last_child {
            if let Some(last) = self.get_mut(last_child_id) {
                last.next_sibling = Some(child_id);
            }
        }

        let parent = self.get_mut(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
        parent.children.push(child_id);

        Ok(())
    }

    /// Remove a node from its parent
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> DomResult<()> {
        let (prev_sibling, next_sibling) = {
            let child = self.get(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
            (child.prev_sibling, child.next_sibling)
        };

        if let Some(prev_id) = prev_sibling {
            if let Some(prev) = self.get_mut(prev_id) {
                prev.next_sibling = next_sibling;
            }
        }
        if let Some(next_id) = next_sibling {
            if let Some(next) = self.get_mut(next_id) {
                next.prev_sibling = prev_sibling;
            }
        }

        {
            let parent = self.get_mut(parent_id).ok_or(DomError::NodeNotFound(parent_id.0))?;
            parent.children.retain(|id| *id != child_id);
        }

        let child = self.get_mut(child_id).ok_or(DomError::NodeNotFound(child_id.0))?;
        child.parent = None;
        child.prev_sibling = None;
        child.next_sibling = None;

        Ok(())
    }

    /// Get all children of a node
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    /// All descendants of a node in document (pre-)order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_descendants(id, &mut result);
        result
    }

    fn collect_descendants(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = self.get(id) {
            for &child_id in &node.children {
                result.push(child_id);
                self.collect_descendants(child_id, result);
            }
        }
    }

    /// Element descendants of the document, in document order
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.document_id)
            .into_iter()
            .filter(|&id| self.get(id).map(|n| n.is_element()).unwrap_or(false))
            .collect()
    }

    /// Ancestors of a node, nearest first (the node itself excluded)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent_id) = current {
            result.push(parent_id);
            current = self.get(parent_id).and_then(|n| n.parent);
        }
        result
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.document_id || self.ancestors(id).last() == Some(&self.document_id)
    }

    /// Get the text content of a node and all its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        for node_id in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(text) = self.get(node_id).and_then(|n| n.as_text()) {
                result.push_str(text);
            }
        }
        result
    }

    /// Get the number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (only has document node)
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Render the tree as indented markup for debugging
    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        self.print_node(self.document_id, 0, &mut output);
        output
    }

    fn print_node(&self, id: NodeId, depth: usize, output: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);

        match &node.node_type {
            NodeType::Document => output.push_str("#document\n"),
            NodeType::Element(elem) => {
                let mut attrs: Vec<String> = elem
                    .attributes
                    .iter()
                    .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                    .collect();
                // Hash map order is unstable
                attrs.sort();
                output.push_str(&format!("{}<{}{}>\n", indent, elem.tag_name, attrs.concat()));
            }
            NodeType::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    output.push_str(&format!("{}#text: {:?}\n", indent, trimmed));
                }
            }
            NodeType::Comment(text) => output.push_str(&format!("{}<!-- {} -->\n", indent, text)),
        }

        for &child_id in &node.children {
            self.print_node(child_id, depth + 1, output);
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let text = tree.create_text("Hello, World!");

        tree.append_child(tree.document_id(), html).unwrap();
        tree.append_child(html, body).unwrap();
        tree.append_child(body, text).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.text_content(body), "Hello, World!");
    }

    #[test]
    fn test_append_element_with_attributes() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let div = tree.append_element(root, "div", &[("id", "Div1"), ("class", "box")]).unwrap();

        let el = tree.element(div).unwrap();
        assert_eq!(el.id(), Some("Div1"));
        assert!(el.has_class("box"));
        assert!(tree.is_connected(div));
    }

    #[test]
    fn test_elements_in_document_order() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree.append_element(root, "div", &[]).unwrap();
        let b = tree.append_element(a, "span", &[]).unwrap();
        let c = tree.append_element(root, "p", &[]).unwrap();
        let text = tree.create_text("x");
        tree.append_child(b, text).unwrap();

        assert_eq!(tree.elements(), vec![a, b, c]);
        assert_eq!(tree.ancestors(b), vec![a, root]);
    }

    #[test]
    fn test_reparenting_detaches_from_old_parent() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree.append_element(root, "div", &[]).unwrap();
        let b = tree.append_element(root, "div", &[]).unwrap();
        let child = tree.append_element(a, "span", &[]).unwrap();

        tree.append_child(b, child).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), vec![child]);
    }

    #[test]
    fn test_cannot_append_ancestor() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree.append_element(root, "div", &[]).unwrap();
        let b = tree.append_element(a, "div", &[]).unwrap();

        assert!(matches!(tree.append_child(b, a), Err(DomError::HierarchyRequest { .. })));
    }
}
