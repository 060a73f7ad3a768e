//! Rule Matcher
//!
//! Collects every rule that applies to an element, including rules that
//! only apply in a dynamic state or to a pseudo-element, and orders them
//! most specific first.

use log::error;
use rustc_hash::FxHashSet;
use stylewright_css::{compare_specificity, SelectorSpecificity};
use stylewright_dom::NodeId;

use crate::document::Document;
use crate::matching::MatchingContext;
use crate::stylesheet::{CssRule, RuleId, SheetId};

/// Pseudo variants looked up in addition to the element itself
pub const PSEUDO_VARIANTS: [&str; 12] = [
    ":link", ":visited", ":active", ":hover", ":focus", "::first-letter",
    "::first-line", ":first-child", "::before", "::after", ":lang", ":target",
];

/// A rule matching an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule {
    pub rule: RuleId,
    pub sheet: SheetId,
    /// Position of the sheet in the document
    pub sheet_index: usize,
    /// Position of the rule in its sheet
    pub position: usize,
    /// The rule's most specific selector that matches this element
    pub selector: SelectorSpecificity,
}

pub struct RuleMatcher<'a> {
    doc: &'a Document,
    stage_sheet: Option<SheetId>,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(doc: &'a Document, stage_sheet: Option<SheetId>) -> Self {
        Self { doc, stage_sheet }
    }

    /// Rules matching `element`, most specific first.
    ///
    /// Equal specificity goes to the later sheet, then to the later rule in
    /// the same sheet. `use_stage` restricts the result to the stage sheet
    /// (`Some(true)`), excludes it (`Some(false)`), or does not filter.
    pub fn matching_rules(&self, element: NodeId, omit_pseudos: bool, use_stage: Option<bool>) -> Vec<MatchedRule> {
        let variants = std::iter::once(None).chain(
            PSEUDO_VARIANTS.iter().copied().map(Some).filter(|_| !omit_pseudos),
        );

        let mut seen = FxHashSet::default();
        let mut matched = Vec::new();

        for pseudo in variants {
            let ctx = MatchingContext::for_pseudo(pseudo);
            for id in self.doc.matched_rules(element, pseudo) {
                if !seen.insert(id) {
                    continue;
                }
                let Some((sheet, position)) = self.doc.find_rule(id) else {
                    continue;
                };
                let is_stage = self.stage_sheet == Some(sheet);
                if use_stage.is_some_and(|use_stage| use_stage != is_stage) {
                    continue;
                }
                let (Some(rule), Some(sheet_index)) = (self.doc.rule(id), self.doc.sheet_position(sheet)) else {
                    continue;
                };
                let Some(selector) = self
                    .most_specific_selector(element, rule, &ctx)
                    .or_else(|| rule.specificity().first().cloned())
                else {
                    continue;
                };
                matched.push(MatchedRule { rule: id, sheet, sheet_index, position, selector });
            }
        }

        matched.sort_by(|a, b| {
            compare_specificity(&a.selector.specificity, &b.selector.specificity)
                .then(b.sheet_index.cmp(&a.sheet_index))
                .then(b.position.cmp(&a.position))
        });
        matched
    }

    /// The most specific of a rule's selectors that actually selects
    /// `element` under `ctx`, the context the rule was matched in.
    ///
    /// A single selector is returned as is. For a grouped rule each selector
    /// is tried against the element, most specific first; a selector that
    /// only applies in another state (`#a:hover` for the base context) is
    /// skipped. `None` means the element matches none of them, which should
    /// not happen for a rule that was matched against it.
    pub fn most_specific_selector(
        &self,
        element: NodeId,
        rule: &CssRule,
        ctx: &MatchingContext,
    ) -> Option<SelectorSpecificity> {
        let list = rule.specificity();
        if list.len() == 1 {
            return list.first().cloned();
        }

        let found = list.iter().find(|entry| self.doc.element_matches(element, &entry.selector, ctx));

        if found.is_none() {
            error!("No selector of '{}' matches element {}", rule.selector_text(), element);
        }
        found.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylewright_dom::DomTree;

    fn selectors(doc: &Document, matched: &[MatchedRule]) -> Vec<String> {
        matched.iter().map(|m| doc.rule(m.rule).unwrap().selector_text().to_string()).collect()
    }

    fn user_content() -> (Document, NodeId) {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let content = tree.append_element(root, "div", &[("id", "UserContent")]).unwrap();
        let div1 = tree.append_element(content, "div", &[("id", "Div1")]).unwrap();
        (Document::new(tree), div1)
    }

    #[test]
    fn test_id_and_type_ordering() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(
            None,
            "div#Div1 { background-color: black }
             #UserContent div#Div1 { background-color: blue }
             #UserContent #Div1 { background-color: white }
             div div#Div1 { background-color: red }",
        )
        .unwrap();

        let matched = RuleMatcher::new(&doc, None).matching_rules(div1, true, None);
        assert_eq!(
            selectors(&doc, &matched),
            vec!["#UserContent div#Div1", "#UserContent #Div1", "div div#Div1", "div#Div1"]
        );
    }

    #[test]
    fn test_later_rule_wins_tie() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(None, "#Div1 { color: red } #Div1 { color: blue }").unwrap();

        let matched = RuleMatcher::new(&doc, None).matching_rules(div1, true, None);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].position, 1);
        assert_eq!(matched[1].position, 0);
    }

    #[test]
    fn test_later_sheet_wins_tie() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(None, "div { } #Div1 { }").unwrap();
        doc.add_stylesheet_from_text(None, "#Div1 { }").unwrap();

        let matched = RuleMatcher::new(&doc, None).matching_rules(div1, true, None);
        assert_eq!(matched.iter().map(|m| (m.sheet_index, m.position)).collect::<Vec<_>>(), vec![(1, 0), (0, 1), (0, 0)]);
    }

    #[test]
    fn test_grouped_rule_uses_matching_selector() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(None, "#Other .x, div { } .y { }").unwrap();

        let matcher = RuleMatcher::new(&doc, None);
        let matched = matcher.matching_rules(div1, true, None);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].selector.selector, "div");
    }

    #[test]
    fn test_pseudo_variants_are_merged_once() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(None, "div:hover { } div { } div::before { }").unwrap();

        let matcher = RuleMatcher::new(&doc, None);
        assert_eq!(matcher.matching_rules(div1, true, None).len(), 1);

        let all = matcher.matching_rules(div1, false, None);
        let mut found = selectors(&doc, &all);
        found.sort();
        assert_eq!(found, vec!["div", "div::before", "div:hover"]);
    }

    #[test]
    fn test_stage_filter() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(Some("page"), "div { }").unwrap();
        let stage = doc.add_stylesheet_from_text(Some("stage"), "#Div1 { }").unwrap();

        let matcher = RuleMatcher::new(&doc, Some(stage));
        assert_eq!(matcher.matching_rules(div1, true, None).len(), 2);
        assert_eq!(selectors(&doc, &matcher.matching_rules(div1, true, Some(true))), vec!["#Div1"]);
        assert_eq!(selectors(&doc, &matcher.matching_rules(div1, true, Some(false))), vec!["div"]);
    }

    #[test]
    fn test_single_selector_needs_no_query() {
        let (mut doc, div1) = user_content();
        let sheet = doc.add_stylesheet(None);
        let id = doc.insert_rule(sheet, "p { }", None).unwrap();

        let before = doc.query_count();
        let matcher = RuleMatcher::new(&doc, None);
        let selector = matcher.most_specific_selector(div1, doc.rule(id).unwrap(), &MatchingContext::new());
        assert_eq!(selector.map(|s| s.selector).as_deref(), Some("p"));
        assert_eq!(doc.query_count(), before);
    }

    #[test]
    fn test_no_matching_selector_is_reported() {
        let (mut doc, div1) = user_content();
        let sheet = doc.add_stylesheet(None);
        let id = doc.insert_rule(sheet, "p, span { }", None).unwrap();

        let matcher = RuleMatcher::new(&doc, None);
        assert_eq!(matcher.most_specific_selector(div1, doc.rule(id).unwrap(), &MatchingContext::new()), None);
    }

    #[test]
    fn test_grouped_state_selector_does_not_match_base() {
        let (mut doc, div1) = user_content();
        doc.add_stylesheet_from_text(None, "#Div1:hover, div { color: blue } #Div1 { color: red }").unwrap();

        let matcher = RuleMatcher::new(&doc, None);
        let matched = matcher.matching_rules(div1, true, None);
        assert_eq!(selectors(&doc, &matched), vec!["#Div1", "#Div1:hover, div"]);
        assert_eq!(matched[1].selector.selector, "div");

        let grouped = doc.sheets()[0].rules()[0].id();
        let hover = MatchingContext::for_pseudo(Some(":hover"));
        let selector = matcher.most_specific_selector(div1, doc.rule(grouped).unwrap(), &hover);
        assert_eq!(selector.map(|s| s.selector).as_deref(), Some("#Div1:hover"));
    }
}
