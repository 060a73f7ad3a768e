//! Declaration blocks
//!
//! An ordered list of `property: value [!important]` entries, the part of a
//! rule (or of an inline `style` attribute) that carries its styles.

use std::fmt;

use crate::shorthand::{box_component, longhands, shorthands_for};
use crate::value::normalize_value;

/// A CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercase property name (custom properties keep their case)
    pub property: String,
    /// Normalized value
    pub value: String,
    pub important: bool,
}

/// Ordered set of declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

fn canonical_name(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        property.to_string()
    } else {
        property.to_ascii_lowercase()
    }
}

impl DeclarationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse declaration text such as `color: red; margin: 0 !important`.
    /// Invalid declarations are dropped.
    pub fn parse(text: &str) -> Self {
        let mut block = Self::new();
        for (property, value, important) in crate::parser::parse_declarations(text) {
            block.set_property(&property, &value, important);
        }
        block
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    fn find(&self, property: &str) -> Option<&Declaration> {
        let name = canonical_name(property);
        self.declarations.iter().find(|d| d.property == name)
    }

    /// Whether the property is declared directly in this block
    pub fn contains(&self, property: &str) -> bool {
        self.find(property).is_some()
    }

    /// Declared value of a property.
    ///
    /// A longhand not declared directly is read from the last box shorthand
    /// that sets it (`margin: 0 4px` answers `margin-left`).
    pub fn get_property_value(&self, property: &str) -> Option<String> {
        self.effective(property).map(|(value, _)| value)
    }

    /// `"important"` or `""`, as CSSOM reports priorities
    pub fn get_property_priority(&self, property: &str) -> &'static str {
        match self.effective(property) {
            Some((_, true)) => "important",
            _ => "",
        }
    }

    pub fn is_important(&self, property: &str) -> bool {
        self.get_property_priority(property) == "important"
    }

    fn effective(&self, property: &str) -> Option<(String, bool)> {
        let name = canonical_name(property);
        let shorthands = shorthands_for(&name);
        self.declarations.iter().rev().find_map(|d| {
            if d.property == name {
                Some((d.value.clone(), d.important))
            } else if shorthands.contains(&d.property.as_str()) {
                box_component(&d.property, &d.value, &name).map(|v| (v, d.important))
            } else {
                None
            }
        })
    }

    /// Set a property after validating and normalizing its value.
    ///
    /// The new declaration moves to the end of the block so that it takes
    /// precedence over any shorthand declared earlier. Returns false (and
    /// leaves the block untouched) when the value is rejected.
    pub fn set_property(&mut self, property: &str, value: &str, important: bool) -> bool {
        let name = canonical_name(property);
        let Some(normalized) = normalize_value(&name, value) else {
            return false;
        };
        self.declarations.retain(|d| d.property != name);
        self.declarations.push(Declaration { property: name, value: normalized, important });
        true
    }

    /// Remove a property (and, for a shorthand, its longhands). Returns the
    /// removed value of the property itself.
    pub fn remove_property(&mut self, property: &str) -> Option<String> {
        let name = canonical_name(property);
        let removed = self.find(&name).map(|d| d.value.clone());
        let nested = longhands(&name);
        self.declarations
            .retain(|d| d.property != name && !nested.contains(&d.property.as_str()));
        removed
    }

    /// Serialize as `a: b; c: d !important;`
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.property, d.value)
                } else {
                    format!("{}: {};", d.property, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for DeclarationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_read_back() {
        let block = DeclarationBlock::parse("color: #F00; margin-top: 0 !important");
        assert_eq!(block.len(), 2);
        assert_eq!(block.get_property_value("color").as_deref(), Some("rgb(255, 0, 0)"));
        assert_eq!(block.get_property_value("margin-top").as_deref(), Some("0px"));
        assert_eq!(block.get_property_priority("margin-top"), "important");
        assert_eq!(block.get_property_priority("color"), "");
    }

    #[test]
    fn test_invalid_declarations_are_dropped() {
        let block = DeclarationBlock::parse("color: nope; width: 10px; bogus: 1");
        assert_eq!(block.len(), 1);
        assert!(block.contains("width"));
    }

    #[test]
    fn test_rejected_value_leaves_block_untouched() {
        let mut block = DeclarationBlock::parse("color: red");
        assert!(!block.set_property("color", "12px", false));
        assert_eq!(block.get_property_value("color").as_deref(), Some("red"));
    }

    #[test]
    fn test_longhand_read_from_box_shorthand() {
        let block = DeclarationBlock::parse("margin-left: 9px; margin: 1px 2px");
        assert_eq!(block.get_property_value("margin-left").as_deref(), Some("2px"));

        let block = DeclarationBlock::parse("margin: 1px 2px; margin-left: 9px");
        assert_eq!(block.get_property_value("margin-left").as_deref(), Some("9px"));
    }

    #[test]
    fn test_set_moves_declaration_to_end() {
        let mut block = DeclarationBlock::parse("margin-left: 9px; margin: 1px");
        assert!(block.set_property("margin-left", "3px", false));
        assert_eq!(block.get_property_value("margin-left").as_deref(), Some("3px"));
        assert_eq!(block.css_text(), "margin: 1px; margin-left: 3px;");
    }

    #[test]
    fn test_remove_shorthand_removes_longhands() {
        let mut block = DeclarationBlock::parse("padding-top: 1px; padding: 2px; color: red");
        assert_eq!(block.remove_property("padding").as_deref(), Some("2px"));
        assert!(!block.contains("padding-top"));
        assert_eq!(block.css_text(), "color: red;");
        assert_eq!(block.remove_property("padding"), None);
    }

    #[test]
    fn test_css_text_with_priority() {
        let mut block = DeclarationBlock::new();
        block.set_property("Color", "Blue", true);
        assert_eq!(block.to_string(), "color: blue !important;");
    }
}
