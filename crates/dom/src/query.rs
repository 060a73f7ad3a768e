//! Simple DOM lookups (getElementById, getElementsByClassName, ...)
//!
//! Full selector queries need the CSS selector engine and live in the style
//! crate (`Document::query_selector_all`).

use crate::node::{ElementData, NodeId};
use crate::tree::DomTree;

/// Trait for querying the DOM
pub trait Queryable {
    /// Find the first element with the given ID attribute
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Find elements by tag name
    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId>;

    /// Find elements by class name
    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId>;
}

impl DomTree {
    fn filter_elements(&self, predicate: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| self.get(id).and_then(|n| n.as_element()).map(&predicate).unwrap_or(false))
            .collect()
    }
}

impl Queryable for DomTree {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.filter_elements(|e| e.id() == Some(id)).into_iter().next()
    }

    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        let tag_lower = tag_name.to_ascii_lowercase();
        self.filter_elements(|e| e.tag_name == tag_lower)
    }

    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId> {
        self.filter_elements(|e| e.has_class(class_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_element_by_id() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let html = tree.append_element(root, "html", &[]).unwrap();
        let div = tree.append_element(html, "div", &[("id", "test")]).unwrap();

        assert_eq!(tree.get_element_by_id("test"), Some(div));
        assert_eq!(tree.get_element_by_id("nonexistent"), None);
    }

    #[test]
    fn test_get_elements_by_class_and_tag() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree.append_element(root, "DIV", &[("class", "x y")]).unwrap();
        let b = tree.append_element(a, "span", &[("class", "y")]).unwrap();

        assert_eq!(tree.get_elements_by_class_name("y"), vec![a, b]);
        assert_eq!(tree.get_elements_by_tag_name("div"), vec![a]);
    }
}
