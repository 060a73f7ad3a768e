//! Document
//!
//! Owns the element tree and the ordered stylesheet list, and answers the
//! whole-document questions the style engine asks: which elements a selector
//! selects, which rules match an element, and which value wins the cascade.

use std::cell::Cell;

use log::{debug, warn};
use stylewright_css::{
    initial_value, is_inherited, normalize_selector_text, parse_rule, parse_stylesheet, DeclarationBlock, Selector,
    Specificity,
};
use stylewright_dom::{DomTree, NodeId};

use crate::error::{StyleError, StyleResult};
use crate::matching::{matches_selector_with_context, MatchingContext};
use crate::stylesheet::{CssRule, RuleId, SheetId, StyleSheet};

/// A document: element tree plus stylesheets
#[derive(Debug, Default)]
pub struct Document {
    tree: DomTree,
    sheets: Vec<StyleSheet>,
    next_rule_id: u32,
    next_sheet_id: u32,
    query_count: Cell<usize>,
}

/// Cascade sort key: importance, then inline, then specificity, then source
/// order (sheet, position)
type CascadeKey = (bool, bool, Specificity, usize, usize);

impl Document {
    pub fn new(tree: DomTree) -> Self {
        Self { tree, ..Default::default() }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Number of selector queries and matched-rule enumerations so far
    pub fn query_count(&self) -> usize {
        self.query_count.get()
    }

    fn count_query(&self) {
        self.query_count.set(self.query_count.get() + 1);
    }

    // Stylesheets

    pub fn sheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    pub fn sheet(&self, id: SheetId) -> Option<&StyleSheet> {
        self.sheets.iter().find(|s| s.id() == id)
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> Option<&mut StyleSheet> {
        self.sheets.iter_mut().find(|s| s.id() == id)
    }

    /// Position of a sheet in document order
    pub fn sheet_position(&self, id: SheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id() == id)
    }

    /// First sheet owned by the element with this id
    pub fn sheet_for_owner(&self, owner_id: &str) -> Option<SheetId> {
        self.sheets.iter().find(|s| s.owner_id() == Some(owner_id)).map(StyleSheet::id)
    }

    /// Append an empty stylesheet
    pub fn add_stylesheet(&mut self, owner_id: Option<&str>) -> SheetId {
        let id = SheetId(self.next_sheet_id);
        self.next_sheet_id += 1;
        self.sheets.push(StyleSheet::new(id, owner_id.map(str::to_string)));
        debug!("Added stylesheet {:?} owned by {:?}", id, owner_id);
        id
    }

    /// Append a stylesheet parsed from CSS text
    pub fn add_stylesheet_from_text(&mut self, owner_id: Option<&str>, css: &str) -> StyleResult<SheetId> {
        let rules = parse_stylesheet(css)?;
        let sheet = self.add_stylesheet(owner_id);
        for rule in rules {
            self.insert_rule_parts(sheet, &rule.selector_text, DeclarationBlock::parse(&rule.declarations), None)?;
        }
        Ok(sheet)
    }

    // Rules

    /// Insert a rule given as `selector { declarations }` text
    pub fn insert_rule(&mut self, sheet: SheetId, text: &str, index: Option<usize>) -> StyleResult<RuleId> {
        let rule = parse_rule(text).map_err(|_| StyleError::InvalidRuleText(text.trim().to_string()))?;
        self.insert_rule_parts(sheet, &rule.selector_text, DeclarationBlock::parse(&rule.declarations), index)
    }

    /// Insert a rule from a selector and a declaration block. `None` appends.
    pub fn insert_rule_parts(
        &mut self,
        sheet: SheetId,
        selector_text: &str,
        style: DeclarationBlock,
        index: Option<usize>,
    ) -> StyleResult<RuleId> {
        let selector_text = checked_selector(selector_text)?;

        let id = RuleId(self.next_rule_id);
        let rule = CssRule::new(id, selector_text, style);
        // Attach specificity at insertion
        rule.specificity();

        let target = self.sheet_mut(sheet).ok_or(StyleError::SheetNotFound(sheet))?;
        let index = target.insert(rule, index)?;
        self.next_rule_id += 1;
        debug!("Inserted rule {:?} into {:?} at {}", id, sheet, index);
        Ok(id)
    }

    /// Delete the rule at `index` of `sheet`
    pub fn delete_rule(&mut self, sheet: SheetId, index: usize) -> StyleResult<RuleId> {
        let target = self.sheet_mut(sheet).ok_or(StyleError::SheetNotFound(sheet))?;
        let rule = target.remove(index)?;
        debug!("Deleted rule {:?} from {:?} at {}", rule.id(), sheet, index);
        Ok(rule.id())
    }

    /// Sheet and position of a rule
    pub fn find_rule(&self, id: RuleId) -> Option<(SheetId, usize)> {
        self.sheets.iter().find_map(|s| s.rule_index(id).map(|index| (s.id(), index)))
    }

    pub fn rule(&self, id: RuleId) -> Option<&CssRule> {
        self.sheets.iter().find_map(|s| s.rule(id))
    }

    pub fn rule_mut(&mut self, id: RuleId) -> Option<&mut CssRule> {
        self.sheets.iter_mut().find_map(|s| s.rule_mut(id))
    }

    /// Replace a rule's selector text
    pub fn set_rule_selector(&mut self, id: RuleId, selector_text: &str) -> StyleResult<()> {
        let selector_text = checked_selector(selector_text)?;
        let rule = self.rule_mut(id).ok_or(StyleError::RuleNotFound(id))?;
        rule.set_selector_text(selector_text);
        rule.specificity();
        Ok(())
    }

    // Queries

    /// Every element the selector list selects, in document order.
    /// An unparsable selector selects nothing.
    pub fn query_selector_all(&self, selector_text: &str) -> Vec<NodeId> {
        self.count_query();
        let selectors = match Selector::parse_list(selector_text) {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!("Cannot query '{}': {}", selector_text, e);
                return Vec::new();
            }
        };

        let ctx = MatchingContext::new();
        self.tree
            .elements()
            .into_iter()
            .filter(|&id| selectors.iter().any(|sel| matches_selector_with_context(&self.tree, id, sel, &ctx)))
            .collect()
    }

    /// Whether `element` is selected by a single selector
    pub fn element_matches(&self, element: NodeId, selector_text: &str, ctx: &MatchingContext) -> bool {
        self.count_query();
        match Selector::parse(selector_text) {
            Ok(selector) => matches_selector_with_context(&self.tree, element, &selector, ctx),
            Err(e) => {
                warn!("Cannot match '{}': {}", selector_text, e);
                false
            }
        }
    }

    /// Rules matching an element in cascade order (sheet order, then
    /// position). `pseudo` selects a variant: a dynamic state such as
    /// `:hover` is treated as active, a pseudo-element such as `::before`
    /// becomes the target. Disabled sheets are skipped.
    pub fn matched_rules(&self, element: NodeId, pseudo: Option<&str>) -> Vec<RuleId> {
        self.count_query();
        let ctx = MatchingContext::for_pseudo(pseudo);
        self.collect_matched(element, &ctx).into_iter().map(|(rule, ..)| rule.id()).collect()
    }

    /// Matching rules with their sheet position, rule position and the
    /// highest specificity among their selectors that match
    fn collect_matched(&self, element: NodeId, ctx: &MatchingContext) -> Vec<(&CssRule, usize, usize, Specificity)> {
        let mut matched = Vec::new();
        for (sheet_index, sheet) in self.sheets.iter().enumerate().filter(|(_, s)| !s.disabled) {
            for (position, rule) in sheet.rules().iter().enumerate() {
                let best = rule
                    .selectors()
                    .iter()
                    .filter(|parsed| {
                        parsed
                            .selector
                            .as_ref()
                            .map(|sel| matches_selector_with_context(&self.tree, element, sel, ctx))
                            .unwrap_or(false)
                    })
                    .map(|parsed| parsed.specificity)
                    .max();
                if let Some(specificity) = best {
                    matched.push((rule, sheet_index, position, specificity));
                }
            }
        }
        matched
    }

    // Inline style

    /// Declarations of the element's `style` attribute
    pub fn inline_style(&self, element: NodeId) -> StyleResult<DeclarationBlock> {
        let data = self.tree.element(element)?;
        Ok(data.get_attribute("style").map(DeclarationBlock::parse).unwrap_or_default())
    }

    /// Write declarations back to the `style` attribute, removing it when
    /// the block is empty
    pub fn set_inline_style(&mut self, element: NodeId, style: &DeclarationBlock) -> StyleResult<()> {
        let data = self.tree.element_mut(element)?;
        if style.is_empty() {
            data.remove_attribute("style");
        } else {
            data.set_attribute("style", style.css_text());
        }
        Ok(())
    }

    // Computed style

    /// Value of `property` after the cascade, inheritance and defaulting
    pub fn computed_value(&self, element: NodeId, property: &str) -> Option<String> {
        let property = property.trim().to_ascii_lowercase();
        self.tree.element(element).ok()?;

        let declared = self.cascaded_value(element, &property);
        match declared.as_deref() {
            Some("inherit") => self.parent_value(element, &property),
            Some("initial") => initial_value(&property).map(str::to_string),
            Some("unset") | None if is_inherited(&property) => self.parent_value(element, &property),
            Some("unset") | None => initial_value(&property).map(str::to_string),
            Some(_) => declared,
        }
    }

    fn parent_value(&self, element: NodeId, property: &str) -> Option<String> {
        let parent = self.tree.get(element)?.parent?;
        if self.tree.element(parent).is_ok() {
            self.computed_value(parent, property)
        } else {
            initial_value(property).map(str::to_string)
        }
    }

    /// Winning declared value among matching rules and the inline style
    fn cascaded_value(&self, element: NodeId, property: &str) -> Option<String> {
        let ctx = MatchingContext::new();
        let mut best: Option<(CascadeKey, String)> = None;
        let mut consider = |key: CascadeKey, value: String| {
            if best.as_ref().map_or(true, |(current, _)| key >= *current) {
                best = Some((key, value));
            }
        };

        for (rule, sheet_index, position, specificity) in self.collect_matched(element, &ctx) {
            if let Some(value) = rule.style.get_property_value(property) {
                consider((rule.style.is_important(property), false, specificity, sheet_index, position), value);
            }
        }

        if let Ok(inline) = self.inline_style(element) {
            if let Some(value) = inline.get_property_value(property) {
                consider((inline.is_important(property), true, Specificity::default(), 0, 0), value);
            }
        }

        best.map(|(_, value)| value)
    }
}

/// Normalized selector text, rejecting empty selectors and braces
fn checked_selector(selector_text: &str) -> StyleResult<String> {
    let selector_text = normalize_selector_text(selector_text);
    if selector_text.is_empty() || selector_text.contains(['{', '}']) {
        return Err(StyleError::InvalidRuleText(selector_text));
    }
    Ok(selector_text)
}
