//! Rules as the mutation engine sees them
//!
//! A [`Rule`] is either a stylesheet rule or an element's inline style. Both
//! answer the same property questions; writes to an inline rule go back to
//! the element's `style` attribute.

use stylewright_css::{related_properties, DeclarationBlock};
use stylewright_dom::NodeId;

use crate::document::Document;
use crate::error::{StyleError, StyleResult};
use crate::stylesheet::RuleId;

/// A stylesheet rule or an element's inline style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Stylesheet(RuleId),
    Inline(NodeId),
}

impl Rule {
    pub fn is_inline(&self) -> bool {
        matches!(self, Rule::Inline(_))
    }

    /// Stylesheet rule id, if this is one
    pub fn rule_id(&self) -> Option<RuleId> {
        match self {
            Rule::Stylesheet(id) => Some(*id),
            Rule::Inline(_) => None,
        }
    }

    /// Selector text; inline rules have none
    pub fn selector_text(&self, doc: &Document) -> Option<String> {
        match self {
            Rule::Stylesheet(id) => doc.rule(*id).map(|r| r.selector_text().to_string()),
            Rule::Inline(_) => None,
        }
    }

    /// Whether the rule still exists in the document
    pub fn exists(&self, doc: &Document) -> bool {
        match self {
            Rule::Stylesheet(id) => doc.rule(*id).is_some(),
            Rule::Inline(element) => doc.tree().element(*element).is_ok(),
        }
    }

    /// Copy of the rule's declarations
    pub fn style(&self, doc: &Document) -> StyleResult<DeclarationBlock> {
        match self {
            Rule::Stylesheet(id) => doc.rule(*id).map(|r| r.style.clone()).ok_or(StyleError::RuleNotFound(*id)),
            Rule::Inline(element) => doc.inline_style(*element),
        }
    }

    /// Whether the rule declares `property`; with `check_shorthand`, a
    /// declaration of a related shorthand or longhand also counts
    pub fn has_property(&self, doc: &Document, property: &str, check_shorthand: bool) -> bool {
        let Ok(style) = self.style(doc) else {
            return false;
        };
        if style.get_property_value(property).is_some() {
            return true;
        }
        check_shorthand && related_properties(property).iter().any(|p| style.contains(p))
    }

    pub fn get_property_value(&self, doc: &Document, property: &str) -> Option<String> {
        self.style(doc).ok()?.get_property_value(property)
    }

    /// `"important"` or `""`
    pub fn get_property_priority(&self, doc: &Document, property: &str) -> &'static str {
        self.style(doc).map(|s| s.get_property_priority(property)).unwrap_or("")
    }

    pub fn is_important(&self, doc: &Document, property: &str) -> bool {
        self.get_property_priority(doc, property) == "important"
    }

    /// Set a property. Returns false when the value is rejected.
    pub fn set_property(&self, doc: &mut Document, property: &str, value: &str, important: bool) -> StyleResult<bool> {
        self.edit(doc, |style| style.set_property(property, value, important))
    }

    /// Remove a property, returning its old value
    pub fn remove_property(&self, doc: &mut Document, property: &str) -> StyleResult<Option<String>> {
        self.edit(doc, |style| style.remove_property(property))
    }

    fn edit<T>(&self, doc: &mut Document, f: impl FnOnce(&mut DeclarationBlock) -> T) -> StyleResult<T> {
        match self {
            Rule::Stylesheet(id) => {
                let rule = doc.rule_mut(*id).ok_or(StyleError::RuleNotFound(*id))?;
                Ok(f(&mut rule.style))
            }
            Rule::Inline(element) => {
                let mut style = doc.inline_style(*element)?;
                let result = f(&mut style);
                doc.set_inline_style(*element, &style)?;
                Ok(result)
            }
        }
    }
}
