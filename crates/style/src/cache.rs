//! Rule Cache
//!
//! Remembers which rule was resolved for an (element, property) pair so
//! repeated reads and writes skip whole-document queries. Only elements with
//! an attached model are cached; for any other element the cache is a
//! no-op. A reverse index lets every rule mutation drop exactly the entries
//! it affects.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use stylewright_dom::NodeId;

use crate::rule::Rule;

#[derive(Debug, Default)]
pub struct RuleCache {
    /// Per-element model: property -> resolved rule
    models: FxHashMap<NodeId, FxHashMap<String, Rule>>,
    /// Rule -> entries resolved to it
    by_rule: FxHashMap<Rule, FxHashSet<(NodeId, String)>>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable caching for an element
    pub fn attach_model(&mut self, element: NodeId) {
        self.models.entry(element).or_default();
    }

    /// Disable caching for an element, dropping its entries
    pub fn detach_model(&mut self, element: NodeId) {
        self.clear(Some(element));
        self.models.remove(&element);
    }

    pub fn has_model(&self, element: NodeId) -> bool {
        self.models.contains_key(&element)
    }

    pub fn get(&self, element: NodeId, property: &str) -> Option<Rule> {
        let rule = self.models.get(&element)?.get(property).copied();
        debug!("Rule cache {} for {} on {}", if rule.is_some() { "hit" } else { "miss" }, property, element);
        rule
    }

    /// Cache a rule. Returns false when the element has no model.
    pub fn set(&mut self, element: NodeId, property: &str, rule: Rule) -> bool {
        let Some(model) = self.models.get_mut(&element) else {
            return false;
        };
        if let Some(previous) = model.insert(property.to_string(), rule) {
            Self::unindex(&mut self.by_rule, previous, element, property);
        }
        self.by_rule.entry(rule).or_default().insert((element, property.to_string()));
        true
    }

    /// Drop the entries of one element, or of every element
    pub fn clear(&mut self, element: Option<NodeId>) {
        match element {
            Some(element) => {
                let Some(model) = self.models.get_mut(&element) else {
                    return;
                };
                for (property, rule) in model.drain() {
                    Self::unindex(&mut self.by_rule, rule, element, &property);
                }
            }
            None => {
                self.models.values_mut().for_each(FxHashMap::clear);
                self.by_rule.clear();
            }
        }
    }

    /// Drop every entry resolved to `rule`
    pub fn invalidate_rule(&mut self, rule: Rule) {
        let Some(entries) = self.by_rule.remove(&rule) else {
            return;
        };
        debug!("Invalidating {} cached entries for {:?}", entries.len(), rule);
        for (element, property) in entries {
            if let Some(model) = self.models.get_mut(&element) {
                model.remove(&property);
            }
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.models.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unindex(by_rule: &mut FxHashMap<Rule, FxHashSet<(NodeId, String)>>, rule: Rule, element: NodeId, property: &str) {
        if let Some(entries) = by_rule.get_mut(&rule) {
            entries.remove(&(element, property.to_string()));
            if entries.is_empty() {
                by_rule.remove(&rule);
            }
        }
    }
}
