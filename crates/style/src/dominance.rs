//! Dominance Resolver
//!
//! Finds the rule whose declaration of a property actually takes effect on
//! an element, and decides whether that rule is safe to edit in place or
//! needs a scoped override first.

use std::cmp::Ordering;

use log::debug;
use rustc_hash::FxHashSet;
use stylewright_css::compare_specificity;
use stylewright_dom::NodeId;

use crate::document::Document;
use crate::matcher::{MatchedRule, RuleMatcher};
use crate::rule::Rule;
use crate::stylesheet::{RuleId, SheetId};

/// Outcome of resolving the dominant rule for one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dominance {
    /// Edit this rule directly
    Rule(Rule),
    /// The winner selects other elements too; a scoped rule must be created
    Override(OverrideRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    /// The winner declares the property `!important`
    pub use_important: bool,
    pub rule_to_override: Rule,
}

/// Outcome of resolving one rule for a group of elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDominance {
    /// A rule selecting exactly the group already beats every element's
    /// own winner
    Rule { rule: RuleId, use_important: bool },
    /// One shared override rule is needed. Its selector list rewrites each
    /// target selector with the group class, plus the bare class when some
    /// element has no stylesheet winner to scope.
    Override { targets: Vec<OverrideTarget>, include_plain: bool, use_important: bool },
}

/// A per-element winner that a group override must outrank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideTarget {
    pub rule: RuleId,
    /// The winner's selector that matches the element
    pub selector: String,
}

/// Winner for one element and property
struct Winner {
    rule: Rule,
    /// `None` for the inline style
    matched: Option<MatchedRule>,
    important: bool,
}

pub struct DominanceResolver<'a> {
    doc: &'a Document,
    matcher: RuleMatcher<'a>,
}

impl<'a> DominanceResolver<'a> {
    pub fn new(doc: &'a Document, stage_sheet: Option<SheetId>) -> Self {
        Self { doc, matcher: RuleMatcher::new(doc, stage_sheet) }
    }

    pub fn matcher(&self) -> &RuleMatcher<'a> {
        &self.matcher
    }

    /// Whether editing the rule could affect more than one element. The
    /// inline style always counts as shared so that it is never edited in
    /// place when an override was asked for.
    pub fn matches_multiple_elements(&self, rule: Rule) -> bool {
        match rule {
            Rule::Inline(_) => true,
            Rule::Stylesheet(id) => match self.doc.rule(id) {
                Some(css_rule) => self.doc.query_selector_all(css_rule.selector_text()).len() > 1,
                None => false,
            },
        }
    }

    /// Whether every element the rule selects is one of `elements`
    pub fn matches_elements_exclusively(&self, rule: Rule, elements: &[NodeId]) -> bool {
        match rule {
            Rule::Inline(element) => elements.contains(&element),
            Rule::Stylesheet(id) => match self.doc.rule(id) {
                Some(css_rule) => self
                    .doc
                    .query_selector_all(css_rule.selector_text())
                    .iter()
                    .all(|el| elements.contains(el)),
                None => false,
            },
        }
    }

    /// The rule that decides `property` for `element`.
    ///
    /// When no matching rule declares the property, the first matching rule
    /// that selects only this element is returned instead, since editing it
    /// cannot leak onto other elements; `None` when there is no such rule.
    /// With `return_override`, a winner shared with other elements comes back
    /// as an [`OverrideRequest`].
    pub fn dominant_rule_for_element(
        &self,
        element: NodeId,
        property: &str,
        return_override: bool,
        use_stage: Option<bool>,
    ) -> Option<Dominance> {
        let matched = self.matcher.matching_rules(element, true, use_stage);

        let Some(winner) = self.winner(element, property, &matched) else {
            debug!("No rule declares {} for {}, looking for a single-target rule", property, element);
            return self.first_single_target_rule(&matched).map(Dominance::Rule);
        };

        if return_override && self.matches_multiple_elements(winner.rule) {
            debug!("Dominant rule {:?} for {} is shared, override needed", winner.rule, property);
            return Some(Dominance::Override(OverrideRequest {
                use_important: winner.important,
                rule_to_override: winner.rule,
            }));
        }
        Some(Dominance::Rule(winner.rule))
    }

    /// Inline style first, then matched rules in order; the first one
    /// declaring the property wins, preferring `!important` declarations
    fn winner(&self, element: NodeId, property: &str, matched: &[MatchedRule]) -> Option<Winner> {
        let candidates = std::iter::once((Rule::Inline(element), None))
            .chain(matched.iter().map(|m| (Rule::Stylesheet(m.rule), Some(m))));

        let defining: Vec<(Rule, Option<&MatchedRule>)> =
            candidates.filter(|(rule, _)| rule.has_property(self.doc, property, true)).collect();

        let important = defining.iter().find(|(rule, _)| rule.is_important(self.doc, property));
        let (rule, matched) = important.or_else(|| defining.first())?;
        Some(Winner { rule: *rule, matched: matched.cloned(), important: important.is_some() })
    }

    fn first_single_target_rule(&self, matched: &[MatchedRule]) -> Option<Rule> {
        matched
            .iter()
            .map(|m| Rule::Stylesheet(m.rule))
            .find(|rule| !self.matches_multiple_elements(*rule))
    }

    /// Rules matching every element, in the first element's order
    pub fn common_rules(&self, elements: &[NodeId]) -> Vec<RuleId> {
        let Some((first, rest)) = elements.split_first() else {
            return Vec::new();
        };

        let mut common: Vec<RuleId> = self.matcher.matching_rules(*first, true, None).iter().map(|m| m.rule).collect();
        for element in rest {
            if common.is_empty() {
                break;
            }
            let ids: FxHashSet<RuleId> = self.matcher.matching_rules(*element, true, None).iter().map(|m| m.rule).collect();
            common.retain(|id| ids.contains(id));
        }
        common
    }

    /// Resolve one rule to carry `property` for all `elements`.
    ///
    /// A rule selecting exactly the group is reused when it already outranks
    /// each element's own winner. Otherwise every winner becomes a target of
    /// a single shared override. `None` for an empty group.
    pub fn dominant_rule_for_group(&self, elements: &[NodeId], property: &str) -> Option<GroupDominance> {
        if elements.is_empty() {
            return None;
        }

        let exclusive: Vec<RuleId> = self
            .common_rules(elements)
            .into_iter()
            .filter(|id| self.matches_elements_exclusively(Rule::Stylesheet(*id), elements))
            .collect();

        let per_element: Vec<(Vec<MatchedRule>, Option<Winner>)> = elements
            .iter()
            .map(|&el| {
                let matched = self.matcher.matching_rules(el, true, None);
                let winner = self.winner(el, property, &matched);
                (matched, winner)
            })
            .collect();

        let use_important = per_element
            .iter()
            .filter_map(|(_, w)| w.as_ref())
            .any(|w| w.important || w.rule.is_inline());

        if let Some(&common) = exclusive.first() {
            let outranks_all = per_element.iter().all(|(matched, winner)| match winner {
                None => true,
                Some(w) if w.rule == Rule::Stylesheet(common) => true,
                // Only an important declaration can beat the inline style
                Some(Winner { matched: None, important, .. }) => !important,
                Some(Winner { matched: Some(w), important, .. }) => {
                    let mine = matched.iter().find(|m| m.rule == common);
                    // A normal winner loses to any important declaration
                    (use_important && !important) || mine.is_some_and(|c| outranks(c, w))
                }
            });
            if outranks_all {
                debug!("Common rule {:?} carries {} for the group", common, property);
                return Some(GroupDominance::Rule { rule: common, use_important });
            }
        }

        let mut targets: Vec<OverrideTarget> = Vec::new();
        let mut include_plain = false;
        for (_, winner) in &per_element {
            match winner.as_ref().and_then(|w| w.matched.as_ref()) {
                Some(m) => {
                    let target = OverrideTarget { rule: m.rule, selector: m.selector.selector.clone() };
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
                None => include_plain = true,
            }
        }
        Some(GroupDominance::Override { targets, include_plain, use_important })
    }
}

/// Whether `a` wins over `b` in the cascade for the same element
fn outranks(a: &MatchedRule, b: &MatchedRule) -> bool {
    match compare_specificity(&a.selector.specificity, &b.selector.specificity) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => (a.sheet_index, a.position) > (b.sheet_index, b.position),
    }
}
