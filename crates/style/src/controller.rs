//! Styles Controller
//!
//! The mutation API over the active document. Every write goes through the
//! dominance resolver so that a change lands on the rule that actually
//! decides the property for the element, and never leaks onto other
//! elements: shared rules are overridden by a generated, class-scoped rule
//! instead of being edited.

use log::{debug, info};
use stylewright_css::{parse_rule, split_selector_list, DeclarationBlock};
use stylewright_dom::{NodeId, Queryable};

use crate::cache::RuleCache;
use crate::config::StylesConfig;
use crate::document::Document;
use crate::dominance::{Dominance, DominanceResolver, GroupDominance};
use crate::error::{StyleError, StyleResult};
use crate::matcher::MatchedRule;
use crate::override_rule::{self, override_selector, OverrideRule};
use crate::rule::Rule;
use crate::stylesheet::{RuleId, SheetId};

const CLASS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// The forms a new rule can be given in
#[derive(Debug, Clone, Copy)]
pub enum RuleSource<'a> {
    /// Complete rule text, `selector { declarations }`
    Text(&'a str),
    /// Selector and declaration text
    Declarations { selector: &'a str, declarations: &'a str },
    /// Selector and property/value pairs
    Properties { selector: &'a str, properties: &'a [(&'a str, &'a str)] },
}

pub struct StylesController {
    config: StylesConfig,
    document: Option<Document>,
    stage_sheet: Option<SheetId>,
    default_sheet: Option<SheetId>,
    cache: RuleCache,
    rng_state: u64,
}

impl Default for StylesController {
    fn default() -> Self {
        Self::with_config(StylesConfig::default())
    }
}

impl StylesController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StylesConfig) -> Self {
        Self {
            config,
            document: None,
            stage_sheet: None,
            default_sheet: None,
            cache: RuleCache::new(),
            rng_state: 0x9e37_79b9_7f4a_7c15,
        }
    }

    pub fn config(&self) -> &StylesConfig {
        &self.config
    }

    // Active document

    /// Make `document` the one being edited and locate its stage and
    /// default sheets. The default sheet is the sheet owned by the default
    /// id, else the last sheet unless that is the stage sheet; failing both,
    /// a new sheet owned by the default id is appended. Returns the
    /// previously active document.
    pub fn set_active_document(&mut self, mut document: Document) -> Option<Document> {
        let stage = document.sheet_for_owner(&self.config.stage_sheet_id);
        let default = document
            .sheet_for_owner(&self.config.default_sheet_id)
            .or_else(|| document.sheets().last().map(|s| s.id()).filter(|&id| Some(id) != stage))
            .unwrap_or_else(|| document.add_stylesheet(Some(&self.config.default_sheet_id)));

        info!("Active document has {} stylesheets (stage: {:?}, default: {:?})", document.sheets().len(), stage, default);
        self.stage_sheet = stage;
        self.default_sheet = Some(default);
        self.cache = RuleCache::new();
        self.document.replace(document)
    }

    /// Give up the active document
    pub fn take_document(&mut self) -> Option<Document> {
        self.stage_sheet = None;
        self.default_sheet = None;
        self.cache = RuleCache::new();
        self.document.take()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Direct access to the document. Changes made through it do not
    /// invalidate the rule cache.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    pub fn stage_sheet(&self) -> Option<SheetId> {
        self.stage_sheet
    }

    pub fn default_sheet(&self) -> Option<SheetId> {
        self.default_sheet
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// The cache, e.g. to attach element models
    pub fn cache_mut(&mut self) -> &mut RuleCache {
        &mut self.cache
    }

    fn doc(&self) -> StyleResult<&Document> {
        self.document.as_ref().ok_or(StyleError::NoActiveDocument)
    }

    fn doc_mut(&mut self) -> StyleResult<&mut Document> {
        self.document.as_mut().ok_or(StyleError::NoActiveDocument)
    }

    fn default_sheet_id(&self) -> StyleResult<SheetId> {
        self.default_sheet.ok_or(StyleError::NoActiveDocument)
    }

    fn resolver(&self) -> StyleResult<DominanceResolver<'_>> {
        Ok(DominanceResolver::new(self.doc()?, self.stage_sheet))
    }

    // Stylesheets

    /// Append an empty stylesheet owned by `owner_id`
    pub fn create_stylesheet(&mut self, owner_id: Option<&str>) -> StyleResult<SheetId> {
        Ok(self.doc_mut()?.add_stylesheet(owner_id))
    }

    pub fn sheet_for_owner(&self, owner_id: &str) -> Option<SheetId> {
        self.document.as_ref()?.sheet_for_owner(owner_id)
    }

    // Rules

    /// Insert a rule into `sheet` (default sheet when `None`) at `index`
    /// (end of sheet when `None`)
    pub fn add_rule(&mut self, source: RuleSource<'_>, sheet: Option<SheetId>, index: Option<usize>) -> StyleResult<RuleId> {
        let (selector, style) = match source {
            RuleSource::Text(text) => {
                let rule = parse_rule(text).map_err(|_| StyleError::InvalidRuleText(text.trim().to_string()))?;
                (rule.selector_text, DeclarationBlock::parse(&rule.declarations))
            }
            RuleSource::Declarations { selector, declarations } => {
                (selector.to_string(), DeclarationBlock::parse(declarations))
            }
            RuleSource::Properties { selector, properties } => {
                let mut style = DeclarationBlock::new();
                for (property, value) in properties {
                    if !style.set_property(property, value, false) {
                        debug!("Dropping invalid {}: {} from new rule", property, value);
                    }
                }
                (selector.to_string(), style)
            }
        };

        let sheet = match sheet {
            Some(sheet) => sheet,
            None => self.default_sheet_id()?,
        };
        let id = self.doc_mut()?.insert_rule_parts(sheet, &selector, style, index)?;
        self.invalidate_selector(&selector);
        Ok(id)
    }

    /// Delete a rule, returning the index it had in its sheet
    pub fn delete_rule(&mut self, rule: RuleId) -> StyleResult<usize> {
        let (sheet, index) = self.doc()?.find_rule(rule).ok_or(StyleError::RuleNotFound(rule))?;
        self.delete_rule_at(sheet, index)?;
        Ok(index)
    }

    /// Delete the rule at `index` of `sheet`
    pub fn delete_rule_at(&mut self, sheet: SheetId, index: usize) -> StyleResult<RuleId> {
        let id = self.doc_mut()?.delete_rule(sheet, index)?;
        self.cache.invalidate_rule(Rule::Stylesheet(id));
        Ok(id)
    }

    /// Position of a rule in its sheet
    pub fn rule_index(&self, rule: RuleId) -> Option<usize> {
        self.document.as_ref()?.find_rule(rule).map(|(_, index)| index)
    }

    /// Replace a rule's selector; its specificity is recomputed
    pub fn set_rule_selector(&mut self, rule: RuleId, selector: &str) -> StyleResult<()> {
        self.doc_mut()?.set_rule_selector(rule, selector)?;
        self.cache.invalidate_rule(Rule::Stylesheet(rule));
        self.invalidate_selector(selector);
        Ok(())
    }

    /// Make a rule unable to match by appending the disabled marker to each
    /// of its selectors. Disabling a disabled rule changes nothing.
    pub fn disable_rule(&mut self, rule: RuleId) -> StyleResult<()> {
        let marker = self.config.disabled_marker.clone();
        self.rewrite_selectors(rule, |sel| {
            if sel.ends_with(&marker) {
                sel.to_string()
            } else {
                format!("{}{}", sel, marker)
            }
        })
    }

    /// Undo [`StylesController::disable_rule`]. Enabling an enabled rule
    /// changes nothing.
    pub fn enable_rule(&mut self, rule: RuleId) -> StyleResult<()> {
        let marker = self.config.disabled_marker.clone();
        self.rewrite_selectors(rule, |sel| sel.strip_suffix(marker.as_str()).unwrap_or(sel).to_string())
    }

    fn rewrite_selectors(&mut self, rule: RuleId, f: impl Fn(&str) -> String) -> StyleResult<()> {
        let current = self.doc()?.rule(rule).ok_or(StyleError::RuleNotFound(rule))?.selector_text().to_string();
        let parts = split_selector_list(&current);
        let rewritten: Vec<String> = parts.iter().map(|sel| f(sel)).collect();
        if parts.iter().zip(&rewritten).all(|(a, b)| *a == b.as_str()) {
            return Ok(());
        }
        self.set_rule_selector(rule, &rewritten.join(", "))
    }

    // Queries

    /// Whether the rule declares `property`, optionally counting related
    /// shorthands and longhands
    pub fn has_property(&self, rule: Rule, property: &str, check_shorthand: bool) -> StyleResult<bool> {
        Ok(rule.has_property(self.doc()?, property, check_shorthand))
    }

    pub fn matching_rules(&self, element: NodeId, omit_pseudos: bool, use_stage: Option<bool>) -> StyleResult<Vec<MatchedRule>> {
        Ok(self.resolver()?.matcher().matching_rules(element, omit_pseudos, use_stage))
    }

    pub fn matches_multiple_elements(&self, rule: Rule) -> StyleResult<bool> {
        Ok(self.resolver()?.matches_multiple_elements(rule))
    }

    pub fn matches_elements_exclusively(&self, rule: Rule, elements: &[NodeId]) -> StyleResult<bool> {
        Ok(self.resolver()?.matches_elements_exclusively(rule, elements))
    }

    pub fn common_rules(&self, elements: &[NodeId]) -> StyleResult<Vec<RuleId>> {
        Ok(self.resolver()?.common_rules(elements))
    }

    pub fn dominant_rule_for_element(
        &self,
        element: NodeId,
        property: &str,
        return_override: bool,
        use_stage: Option<bool>,
    ) -> StyleResult<Option<Dominance>> {
        Ok(self.resolver()?.dominant_rule_for_element(element, property, return_override, use_stage))
    }

    pub fn dominant_rule_for_group(&self, elements: &[NodeId], property: &str) -> StyleResult<Option<GroupDominance>> {
        Ok(self.resolver()?.dominant_rule_for_group(elements, property))
    }

    // Classes

    /// A class name `<prefix>-<suffix>` not used by any element or rule in
    /// the active document. The prefix defaults to the configured generated
    /// (or group) prefix.
    pub fn generate_class_name(&mut self, prefix: Option<&str>, for_group: bool) -> StyleResult<String> {
        let prefix = match prefix {
            Some(prefix) => prefix.to_ascii_lowercase(),
            None if for_group => self.config.generated_group_prefix.to_ascii_lowercase(),
            None => self.config.generated_class_prefix.to_ascii_lowercase(),
        };

        loop {
            let name = format!("{}-{}", prefix, self.random_suffix());
            if !self.class_in_use(&name)? {
                return Ok(name);
            }
            debug!("Generated class {} already in use", name);
        }
    }

    fn random_suffix(&mut self) -> String {
        (0..self.config.generated_suffix_length.max(1))
            .map(|_| {
                // xorshift64*
                self.rng_state ^= self.rng_state >> 12;
                self.rng_state ^= self.rng_state << 25;
                self.rng_state ^= self.rng_state >> 27;
                let n = self.rng_state.wrapping_mul(0x2545_f491_4f6c_dd1d);
                CLASS_ALPHABET[(n >> 32) as usize % CLASS_ALPHABET.len()] as char
            })
            .collect()
    }

    fn class_in_use(&self, name: &str) -> StyleResult<bool> {
        let doc = self.doc()?;
        let on_element = !doc.tree().get_elements_by_class_name(name).is_empty();
        let dotted = format!(".{}", name);
        let in_rule = doc
            .sheets()
            .iter()
            .flat_map(|s| s.rules())
            .any(|r| r.selector_text().contains(&dotted));
        Ok(on_element || in_rule)
    }

    /// Add a class to an element. Returns false if it already had it.
    pub fn add_class(&mut self, element: NodeId, class: &str) -> StyleResult<bool> {
        let added = self.doc_mut()?.tree_mut().element_mut(element)?.add_class(class);
        if added {
            self.element_changed(element);
        }
        Ok(added)
    }

    /// Set an attribute on an element, keeping the rule cache consistent
    /// with the rules it now matches
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> StyleResult<()> {
        self.doc_mut()?.tree_mut().element_mut(element)?.set_attribute(name, value);
        self.element_changed(element);
        Ok(())
    }

    /// Drop cache entries a change to `element` may have made stale: its
    /// own, and those of rules that now match it and so may have become
    /// shared with other elements
    fn element_changed(&mut self, element: NodeId) {
        self.cache.clear(Some(element));
        if self.cache.is_empty() {
            return;
        }
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        for id in doc.matched_rules(element, None) {
            self.cache.invalidate_rule(Rule::Stylesheet(id));
        }
    }

    // Overrides

    /// Create a class-scoped rule that outranks `rule_to_override` for
    /// `element`. The class is not yet added to the element.
    ///
    /// For the inline style, a plain class rule is added to the default
    /// sheet; only an `!important` declaration there can win over it.
    pub fn create_override_rule(&mut self, rule_to_override: Rule, element: NodeId) -> StyleResult<OverrideRule> {
        let tag = self.doc()?.tree().element(element)?.tag_name.clone();
        let class_name = self.generate_class_name(Some(&tag), false)?;

        match rule_to_override {
            Rule::Stylesheet(id) => {
                let stage = self.stage_sheet;
                let created = override_rule::create_override_rule(self.doc_mut()?, stage, id, element, &class_name)?;
                self.cache.invalidate_rule(rule_to_override);
                Ok(created)
            }
            Rule::Inline(_) => {
                let sheet = self.default_sheet_id()?;
                let rule = self.doc_mut()?.insert_rule_parts(sheet, &format!(".{}", class_name), DeclarationBlock::new(), None)?;
                Ok(OverrideRule { class_name, rule })
            }
        }
    }

    // Declarations

    /// Set a property on a rule and return the value as stored.
    ///
    /// The property is removed first, then set with the requested priority.
    /// `None` means the value was rejected; the property is then absent.
    pub fn set_style(&mut self, rule: Rule, property: &str, value: &str, important: bool) -> StyleResult<Option<String>> {
        let doc = self.doc_mut()?;
        rule.remove_property(doc, property)?;
        rule.set_property(doc, property, value, important)?;
        let applied = rule.get_property_value(doc, property);
        if applied.is_none() {
            debug!("Rejected {}: {}", property, value);
            self.cache.invalidate_rule(rule);
        }
        Ok(applied)
    }

    /// [`StylesController::set_style`] for several properties
    pub fn set_styles(
        &mut self,
        rule: Rule,
        styles: &[(&str, &str)],
        important: bool,
    ) -> StyleResult<Vec<(String, Option<String>)>> {
        styles
            .iter()
            .map(|(property, value)| Ok((property.to_string(), self.set_style(rule, property, value, important)?)))
            .collect()
    }

    /// Remove a property from a rule, returning its old value
    pub fn delete_style(&mut self, rule: Rule, property: &str) -> StyleResult<Option<String>> {
        let removed = rule.remove_property(self.doc_mut()?, property)?;
        self.cache.invalidate_rule(rule);
        Ok(removed)
    }

    pub fn delete_styles(&mut self, rule: Rule, properties: &[&str]) -> StyleResult<Vec<Option<String>>> {
        properties.iter().map(|property| self.delete_style(rule, property)).collect()
    }

    // Element styles

    /// Style one element without affecting any other.
    ///
    /// The value lands on the cached rule, else on the dominant rule when it
    /// targets only this element, else on a new override scoped to the
    /// element by a generated class. With no candidate rule at all, a new
    /// class rule is created. Returns the stored value, `None` if rejected.
    pub fn set_element_style(
        &mut self,
        element: NodeId,
        property: &str,
        value: &str,
        is_stage: Option<bool>,
    ) -> StyleResult<Option<String>> {
        self.apply_element_style(element, property, value, is_stage).map(|(applied, _)| applied)
    }

    fn apply_element_style(
        &mut self,
        element: NodeId,
        property: &str,
        value: &str,
        is_stage: Option<bool>,
    ) -> StyleResult<(Option<String>, Rule)> {
        let doc = self.doc()?;
        let cached = self.cache.get(element, property).filter(|rule| rule.exists(doc));

        let (rule, use_important) = match cached {
            Some(rule) => (rule, rule.is_important(doc, property)),
            None => match self.dominant_rule_for_element(element, property, true, is_stage)? {
                None => {
                    let tag = doc.tree().element(element)?.tag_name.clone();
                    let class_name = self.generate_class_name(Some(&tag), false)?;
                    let selector = format!(".{}", class_name);
                    let id = self.add_rule(RuleSource::Declarations { selector: &selector, declarations: "" }, None, None)?;
                    self.add_class(element, &class_name)?;
                    debug!("New rule {} for {} on {}", selector, property, element);
                    (Rule::Stylesheet(id), false)
                }
                Some(Dominance::Rule(rule)) => {
                    let important = rule.is_important(self.doc()?, property);
                    (rule, important)
                }
                Some(Dominance::Override(request)) => {
                    let created = self.create_override_rule(request.rule_to_override, element)?;
                    self.add_class(element, &created.class_name)?;
                    // The inline style is only beaten by an important declaration
                    let important = request.use_important || request.rule_to_override.is_inline();
                    (Rule::Stylesheet(created.rule), important)
                }
            },
        };

        let applied = self.set_style(rule, property, value, use_important)?;
        if applied.is_some() && cached.is_none() {
            self.cache.set(element, property, rule);
        }
        Ok((applied, rule))
    }

    /// [`StylesController::set_element_style`] for several properties
    pub fn set_element_styles(
        &mut self,
        element: NodeId,
        styles: &[(&str, &str)],
        is_stage: Option<bool>,
    ) -> StyleResult<Vec<(String, Option<String>)>> {
        styles
            .iter()
            .map(|(property, value)| {
                Ok((property.to_string(), self.set_element_style(element, property, value, is_stage)?))
            })
            .collect()
    }

    /// Declared value of `property` for an element, from the rule that
    /// decides it. With `fallback_on_computed`, an undeclared property reads
    /// as its computed value; that answer is never cached.
    pub fn get_element_style(
        &mut self,
        element: NodeId,
        property: &str,
        fallback_on_computed: bool,
        is_stage: Option<bool>,
    ) -> StyleResult<Option<String>> {
        let doc = self.doc()?;
        let cached = self.cache.get(element, property).filter(|rule| rule.exists(doc));

        let rule = match cached {
            Some(rule) => Some(rule),
            None => match self.dominant_rule_for_element(element, property, false, is_stage)? {
                Some(Dominance::Rule(rule)) => Some(rule),
                Some(Dominance::Override(request)) => Some(request.rule_to_override),
                None => None,
            },
        };

        let doc = self.doc()?;
        match rule.and_then(|r| r.get_property_value(doc, property).map(|v| (r, v))) {
            Some((rule, value)) => {
                // Later writes reuse cached rules, so only cache what is safe to edit
                if cached.is_none() && !self.matches_multiple_elements(rule)? {
                    self.cache.set(element, property, rule);
                }
                Ok(Some(value))
            }
            None if fallback_on_computed => Ok(doc.computed_value(element, property)),
            None => Ok(None),
        }
    }

    /// Style a group of elements through one shared rule.
    ///
    /// A rule selecting exactly the group is reused when it already wins
    /// for every element; otherwise one override rule is created whose
    /// selectors rewrite each element's winning selector with a generated
    /// group class, and the class is added to every element. Elements are
    /// updated in order; a failure leaves earlier ones updated.
    pub fn set_group_style(&mut self, elements: &[NodeId], property: &str, value: &str) -> StyleResult<Option<String>> {
        let Some(dominance) = self.dominant_rule_for_group(elements, property)? else {
            return Ok(None);
        };

        let (rule, use_important) = match dominance {
            GroupDominance::Rule { rule, use_important } => {
                for &element in elements {
                    self.cache.clear(Some(element));
                }
                (Rule::Stylesheet(rule), use_important)
            }
            GroupDominance::Override { targets, include_plain, use_important } => {
                let class_name = self.generate_class_name(None, true)?;

                let mut selectors: Vec<String> = Vec::new();
                for target in &targets {
                    let selector = override_selector(&target.selector, &class_name);
                    if !selectors.contains(&selector) {
                        selectors.push(selector);
                    }
                }
                if include_plain {
                    selectors.push(format!(".{}", class_name));
                }

                // After the last overridden rule in cascade order
                let doc = self.doc()?;
                let placement = targets
                    .iter()
                    .filter_map(|t| {
                        let (sheet, index) = doc.find_rule(t.rule)?;
                        Some((doc.sheet_position(sheet)?, index, sheet))
                    })
                    .max();
                let (sheet, index) = match placement {
                    Some((_, index, sheet)) => (sheet, Some(index + 1)),
                    None => (self.default_sheet_id()?, None),
                };

                let selector = selectors.join(", ");
                let id = self.doc_mut()?.insert_rule_parts(sheet, &selector, DeclarationBlock::new(), index)?;
                debug!("Group override '{}' for {} elements", selector, elements.len());
                for &element in elements {
                    self.add_class(element, &class_name)?;
                }
                (Rule::Stylesheet(id), use_important)
            }
        };

        self.set_style(rule, property, value, use_important)
    }

    /// Move an element's inline declarations into a stylesheet rule.
    ///
    /// With `make_dominant`, each declaration is applied through
    /// [`StylesController::set_element_style`] and the last rule written is
    /// returned. Otherwise a rule is added to the default sheet with
    /// `selector`, or with a generated class that is then added to the
    /// element. The inline style itself is left in place.
    pub fn create_rule_from_inline_style(
        &mut self,
        element: NodeId,
        selector: Option<&str>,
        make_dominant: bool,
    ) -> StyleResult<Option<Rule>> {
        let inline = self.doc()?.inline_style(element)?;

        if make_dominant {
            let mut last = None;
            for declaration in inline.iter() {
                let (applied, rule) = self.apply_element_style(element, &declaration.property, &declaration.value, None)?;
                if applied.is_some() {
                    last = Some(rule);
                }
            }
            return Ok(last);
        }

        let (selector, class_name) = match selector {
            Some(selector) => (selector.to_string(), None),
            None => {
                let tag = self.doc()?.tree().element(element)?.tag_name.clone();
                let class_name = self.generate_class_name(Some(&tag), false)?;
                (format!(".{}", class_name), Some(class_name))
            }
        };
        let declarations = inline.css_text();
        let id = self.add_rule(RuleSource::Declarations { selector: &selector, declarations: &declarations }, None, None)?;
        if let Some(class_name) = class_name {
            self.add_class(element, &class_name)?;
        }
        Ok(Some(Rule::Stylesheet(id)))
    }

    /// Drop cached entries of every element `selector` now selects
    fn invalidate_selector(&mut self, selector: &str) {
        if self.cache.is_empty() {
            return;
        }
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        for element in doc.query_selector_all(selector) {
            self.cache.clear(Some(element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylewright_dom::DomTree;

    fn controller(css: &[(Option<&str>, &str)]) -> (StylesController, NodeId) {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let el = tree.append_element(root, "div", &[("id", "Div1")]).unwrap();
        let mut doc = Document::new(tree);
        for (owner, text) in css {
            doc.add_stylesheet_from_text(*owner, text).unwrap();
        }
        let mut controller = StylesController::new();
        controller.set_active_document(doc);
        (controller, el)
    }

    fn selector(controller: &StylesController, rule: RuleId) -> String {
        controller.document().unwrap().rule(rule).unwrap().selector_text().to_string()
    }

    #[test]
    fn test_no_document() {
        let mut controller = StylesController::new();
        assert!(matches!(controller.create_stylesheet(None), Err(StyleError::NoActiveDocument)));
        assert!(matches!(
            controller.set_element_style(NodeId(1), "color", "red", None),
            Err(StyleError::NoActiveDocument)
        ));
        assert!(controller.take_document().is_none());
    }

    #[test]
    fn test_default_sheet_selection() {
        let config = StylesConfig::default();

        let (c, _) = controller(&[]);
        let default = c.default_sheet().unwrap();
        assert_eq!(c.document().unwrap().sheet(default).unwrap().owner_id(), Some(config.default_sheet_id.as_str()));

        let (c, _) = controller(&[(Some("page"), "a { }"), (Some("other"), "b { }")]);
        assert_eq!(c.default_sheet(), c.sheet_for_owner("other"));
        assert_eq!(c.stage_sheet(), None);

        let (c, _) = controller(&[(Some("page"), ""), (Some(config.stage_sheet_id.as_str()), "")]);
        assert_eq!(c.stage_sheet(), c.sheet_for_owner(&config.stage_sheet_id));
        assert_eq!(c.default_sheet(), c.sheet_for_owner(&config.default_sheet_id));
        assert_eq!(c.document().unwrap().sheets().len(), 3);
    }

    #[test]
    fn test_add_rule_sources() {
        let (mut c, _) = controller(&[]);
        let a = c.add_rule(RuleSource::Text("a { color: red }"), None, None).unwrap();
        let b = c.add_rule(RuleSource::Declarations { selector: "b", declarations: "margin: 0" }, None, Some(0)).unwrap();
        let p = c
            .add_rule(RuleSource::Properties { selector: "p", properties: &[("color", "blue"), ("width", "wide")] }, None, None)
            .unwrap();

        assert_eq!(c.rule_index(b), Some(0));
        assert_eq!(c.rule_index(a), Some(1));
        let doc = c.document().unwrap();
        assert_eq!(doc.rule(p).unwrap().style.css_text(), "color: blue;");
        assert_eq!(doc.rule(b).unwrap().style.get_property_value("margin").as_deref(), Some("0px"));
        assert!(matches!(c.add_rule(RuleSource::Text("nope"), None, None), Err(StyleError::InvalidRuleText(_))));

        assert_eq!(c.delete_rule(b).unwrap(), 0);
        assert_eq!(c.rule_index(a), Some(0));
        assert!(matches!(c.delete_rule(b), Err(StyleError::RuleNotFound(_))));
    }

    #[test]
    fn test_disable_and_enable_are_symmetric() {
        let (mut c, el) = controller(&[(None, "#Div1, p { color: red }")]);
        let rule = c.document().unwrap().sheets()[0].rules()[0].id();
        let marker = c.config().disabled_marker.clone();

        c.disable_rule(rule).unwrap();
        assert_eq!(selector(&c, rule), format!("#Div1{m}, p{m}", m = marker));
        assert!(c.document().unwrap().matched_rules(el, None).is_empty());

        c.disable_rule(rule).unwrap();
        assert_eq!(selector(&c, rule), format!("#Div1{m}, p{m}", m = marker));

        c.enable_rule(rule).unwrap();
        assert_eq!(selector(&c, rule), "#Div1, p");
        c.enable_rule(rule).unwrap();
        assert_eq!(selector(&c, rule), "#Div1, p");
        assert_eq!(c.document().unwrap().matched_rules(el, None), vec![rule]);
    }

    #[test]
    fn test_set_rule_selector_recomputes_specificity() {
        let (mut c, _) = controller(&[(None, "p { }")]);
        let rule = c.document().unwrap().sheets()[0].rules()[0].id();
        c.set_rule_selector(rule, "#a .b").unwrap();
        let spec = &c.document().unwrap().rule(rule).unwrap().specificity()[0];
        assert_eq!(spec.selector, "#a .b");
        assert_eq!((spec.specificity.ids, spec.specificity.classes), (1, 1));
    }

    #[test]
    fn test_generate_class_name() {
        let (mut c, _) = controller(&[]);
        let name = c.generate_class_name(Some("DIV"), false).unwrap();
        assert!(name.starts_with("div-"));
        assert_eq!(name.len(), "div-".len() + 4);
        assert!(name["div-".len()..].chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));

        assert!(c.generate_class_name(None, false).unwrap().starts_with("gen-"));
        assert!(c.generate_class_name(None, true).unwrap().starts_with("group-"));
        assert_ne!(c.generate_class_name(None, false).unwrap(), c.generate_class_name(None, false).unwrap());
    }

    #[test]
    fn test_set_style_reads_back() {
        let (mut c, _) = controller(&[(None, "p { color: red }")]);
        let rule = Rule::Stylesheet(c.document().unwrap().sheets()[0].rules()[0].id());

        assert_eq!(c.set_style(rule, "color", "#00F", true).unwrap().as_deref(), Some("rgb(0, 0, 255)"));
        assert!(c.has_property(rule, "color", false).unwrap());
        assert_eq!(c.set_style(rule, "color", "bogus", false).unwrap(), None);
        assert!(!c.has_property(rule, "color", false).unwrap());

        let results = c.set_styles(rule, &[("margin-top", "2px"), ("width", "x")], false).unwrap();
        assert_eq!(results, vec![("margin-top".to_string(), Some("2px".to_string())), ("width".to_string(), None)]);
        assert_eq!(c.delete_styles(rule, &["margin-top", "color"]).unwrap(), vec![Some("2px".to_string()), None]);
    }

    #[test]
    fn test_add_class_clears_element_cache() {
        let (mut c, el) = controller(&[(None, "#Div1 { color: red }")]);
        c.cache_mut().attach_model(el);
        assert_eq!(c.get_element_style(el, "color", false, None).unwrap().as_deref(), Some("red"));
        assert!(c.cache().get(el, "color").is_some());

        assert!(c.add_class(el, "fresh").unwrap());
        assert!(c.cache().get(el, "color").is_none());
        assert!(!c.add_class(el, "fresh").unwrap());
    }

    #[test]
    fn test_create_rule_from_inline_style() {
        let (mut c, el) = controller(&[]);
        c.document_mut().unwrap().tree_mut().element_mut(el).unwrap().set_attribute("style", "color: red; width: 5px");

        let rule = c.create_rule_from_inline_style(el, None, false).unwrap().unwrap();
        let doc = c.document().unwrap();
        let text = rule.selector_text(doc).unwrap();
        let class = text.trim_start_matches('.');
        assert!(doc.tree().element(el).unwrap().has_class(class));
        assert_eq!(rule.get_property_value(doc, "width").as_deref(), Some("5px"));

        let named = c.create_rule_from_inline_style(el, Some("#Div1"), false).unwrap().unwrap();
        assert_eq!(named.selector_text(c.document().unwrap()).as_deref(), Some("#Div1"));
    }
}
