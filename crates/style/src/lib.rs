//! Stylewright Style Engine
//!
//! Dominant-rule resolution and safe style mutation over a document's
//! stylesheets: rule matching, dominance, override synthesis, the rule
//! cache, and the [`StylesController`] that ties them together.

pub mod cache;
pub mod config;
pub mod controller;
pub mod document;
pub mod dominance;
pub mod error;
pub mod matcher;
pub mod matching;
pub mod override_rule;
pub mod rule;
pub mod stylesheet;

pub use cache::RuleCache;
pub use config::StylesConfig;
pub use controller::{RuleSource, StylesController};
pub use document::Document;
pub use dominance::{Dominance, DominanceResolver, GroupDominance, OverrideRequest, OverrideTarget};
pub use error::{StyleError, StyleResult};
pub use matcher::{MatchedRule, RuleMatcher, PSEUDO_VARIANTS};
pub use matching::{matches_selector, matches_selector_with_context, MatchingContext};
pub use override_rule::{create_override_rule, override_selector, OverrideRule};
pub use rule::Rule;
pub use stylesheet::{CssRule, ParsedSelector, RuleId, SheetId, StyleSheet};
