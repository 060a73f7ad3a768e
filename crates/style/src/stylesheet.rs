//! Stylesheets and their rules

use std::cell::OnceCell;

use log::warn;
use stylewright_css::{
    calculate_specificity, get_specificity, split_selector_list, DeclarationBlock, Selector, Specificity,
    SpecificityList,
};

use crate::error::{StyleError, StyleResult};

/// Stable identifier of a rule, allocated by its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);

/// Stable identifier of a stylesheet, allocated by its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub u32);

/// One selector of a possibly grouped rule, parsed for matching
#[derive(Debug, Clone)]
pub struct ParsedSelector {
    /// Selector text as written
    pub text: String,
    /// `None` when the text does not parse; such a selector never matches
    pub selector: Option<Selector>,
    pub specificity: Specificity,
}

/// A style rule
#[derive(Debug, Clone)]
pub struct CssRule {
    id: RuleId,
    selector_text: String,
    pub style: DeclarationBlock,
    specificity: OnceCell<SpecificityList>,
    selectors: OnceCell<Vec<ParsedSelector>>,
}

impl CssRule {
    pub(crate) fn new(id: RuleId, selector_text: impl Into<String>, style: DeclarationBlock) -> Self {
        Self {
            id,
            selector_text: selector_text.into(),
            style,
            specificity: OnceCell::new(),
            selectors: OnceCell::new(),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    /// Replace the selector; cached specificity and parsed selectors are
    /// dropped and recomputed on next use
    pub fn set_selector_text(&mut self, selector_text: impl Into<String>) {
        self.selector_text = selector_text.into();
        self.specificity = OnceCell::new();
        self.selectors = OnceCell::new();
    }

    /// Selectors of this rule with their specificity, most specific first.
    /// Computed on first use.
    pub fn specificity(&self) -> &SpecificityList {
        self.specificity.get_or_init(|| get_specificity(&self.selector_text))
    }

    /// Whether [`CssRule::specificity`] has been computed since the last
    /// selector change
    pub fn has_specificity(&self) -> bool {
        self.specificity.get().is_some()
    }

    /// Selectors in written order, parsed for matching
    pub fn selectors(&self) -> &[ParsedSelector] {
        self.selectors.get_or_init(|| {
            split_selector_list(&self.selector_text)
                .into_iter()
                .map(|text| {
                    let selector = match Selector::parse(text) {
                        Ok(selector) => Some(selector),
                        Err(e) => {
                            warn!("Rule {:?} has an unmatchable selector: {}", self.id, e);
                            None
                        }
                    };
                    ParsedSelector { text: text.to_string(), selector, specificity: calculate_specificity(text) }
                })
                .collect()
        })
    }

    /// Serialize as `selector { declarations }`
    pub fn css_text(&self) -> String {
        if self.style.is_empty() {
            format!("{} {{ }}", self.selector_text)
        } else {
            format!("{} {{ {} }}", self.selector_text, self.style.css_text())
        }
    }
}

/// An ordered list of rules
#[derive(Debug, Clone)]
pub struct StyleSheet {
    id: SheetId,
    owner_id: Option<String>,
    /// A disabled sheet takes no part in matching
    pub disabled: bool,
    rules: Vec<CssRule>,
}

impl StyleSheet {
    pub(crate) fn new(id: SheetId, owner_id: Option<String>) -> Self {
        Self { id, owner_id, disabled: false, rules: Vec::new() }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Id of the element that owns the sheet, such as a `<style id=...>`
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Position of a rule in this sheet
    pub fn rule_index(&self, id: RuleId) -> Option<usize> {
        self.rules.iter().position(|r| r.id == id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&CssRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn rule_mut(&mut self, id: RuleId) -> Option<&mut CssRule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    pub fn rule_at(&self, index: usize) -> Option<&CssRule> {
        self.rules.get(index)
    }

    /// Insert a rule at `index` (`None` appends). Returns the index used.
    pub(crate) fn insert(&mut self, rule: CssRule, index: Option<usize>) -> StyleResult<usize> {
        let len = self.rules.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(StyleError::IndexOutOfRange { index, len });
        }
        self.rules.insert(index, rule);
        Ok(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> StyleResult<CssRule> {
        let len = self.rules.len();
        if index >= len {
            return Err(StyleError::IndexOutOfRange { index, len });
        }
        Ok(self.rules.remove(index))
    }

    /// Serialize every rule, one per line
    pub fn css_text(&self) -> String {
        self.rules.iter().map(CssRule::css_text).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u32, selector: &str, decls: &str) -> CssRule {
        CssRule::new(RuleId(id), selector, DeclarationBlock::parse(decls))
    }

    #[test]
    fn test_specificity_is_lazy_and_reset_on_selector_change() {
        let mut r = rule(1, ".b, #a", "color: red");
        assert!(!r.has_specificity());
        assert_eq!(r.specificity()[0].selector, "#a");
        assert!(r.has_specificity());

        r.set_selector_text("div");
        assert!(!r.has_specificity());
        assert_eq!(r.specificity().len(), 1);
        assert_eq!(r.specificity()[0].specificity, Specificity::new(0, 0, 1));
    }

    #[test]
    fn test_selectors_keep_written_order() {
        let r = rule(1, "p, #a > b, ][", "");
        let texts: Vec<&str> = r.selectors().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["p", "#a > b", "]["]);
        assert!(r.selectors()[1].selector.is_some());
        assert!(r.selectors()[2].selector.is_none());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut sheet = StyleSheet::new(SheetId(0), Some("main".into()));
        assert_eq!(sheet.insert(rule(1, "a", ""), None).unwrap(), 0);
        assert_eq!(sheet.insert(rule(2, "b", ""), None).unwrap(), 1);
        assert_eq!(sheet.insert(rule(3, "c", ""), Some(1)).unwrap(), 1);
        assert_eq!(sheet.rule_index(RuleId(2)), Some(2));
        assert!(matches!(
            sheet.insert(rule(4, "d", ""), Some(9)),
            Err(StyleError::IndexOutOfRange { index: 9, len: 3 })
        ));

        let removed = sheet.remove(1).unwrap();
        assert_eq!(removed.id(), RuleId(3));
        assert!(sheet.remove(5).is_err());
        assert_eq!(sheet.owner_id(), Some("main"));
    }

    #[test]
    fn test_css_text() {
        let mut sheet = StyleSheet::new(SheetId(0), None);
        sheet.insert(rule(1, "a", "color: red"), None).unwrap();
        sheet.insert(rule(2, ".gen-1", ""), None).unwrap();
        assert_eq!(sheet.css_text(), "a { color: red; }\n.gen-1 { }");
    }
}
