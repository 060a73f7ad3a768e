//! Override Synthesizer
//!
//! Creates a rule scoped to one element by a generated class, placed right
//! after the rule it overrides so that it wins any specificity tie.

use log::debug;
use stylewright_css::DeclarationBlock;
use stylewright_dom::NodeId;

use crate::document::Document;
use crate::error::{StyleError, StyleResult};
use crate::matcher::RuleMatcher;
use crate::matching::MatchingContext;
use crate::stylesheet::{RuleId, SheetId};

/// A synthesized override rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    /// Class the element must carry for the rule to apply
    pub class_name: String,
    pub rule: RuleId,
}

/// Create the override for `rule_to_override` as it applies to `element`.
///
/// The rule's selector that matches the element is rewritten with
/// [`override_selector`] and inserted, with no declarations, directly after
/// the overridden rule in the same sheet.
pub fn create_override_rule(
    doc: &mut Document,
    stage_sheet: Option<SheetId>,
    rule_to_override: RuleId,
    element: NodeId,
    class_name: &str,
) -> StyleResult<OverrideRule> {
    let selector = {
        let rule = doc.rule(rule_to_override).ok_or(StyleError::RuleNotFound(rule_to_override))?;
        RuleMatcher::new(doc, stage_sheet)
            .most_specific_selector(element, rule, &MatchingContext::new())
            .or_else(|| rule.specificity().first().cloned())
            .map(|s| s.selector)
            .ok_or(StyleError::RuleNotFound(rule_to_override))?
    };

    let (sheet, index) = doc.find_rule(rule_to_override).ok_or(StyleError::RuleNotFound(rule_to_override))?;
    let new_selector = override_selector(&selector, class_name);
    let rule = doc.insert_rule_parts(sheet, &new_selector, DeclarationBlock::new(), Some(index + 1))?;
    debug!("Override '{}' for '{}' inserted after {:?}", new_selector, selector, rule_to_override);

    Ok(OverrideRule { class_name: class_name.to_string(), rule })
}

/// Rewrite a selector so that its subject also requires `class_name`.
///
/// Only the last compound changes. A trailing pseudo-class or
/// pseudo-element is kept as written. If the compound has an id, the class
/// is appended; otherwise its last class or attribute selector is replaced
/// by the class, and a bare type gets the class appended.
pub fn override_selector(selector: &str, class_name: &str) -> String {
    let selector = selector.trim();
    let (prefix, last) = selector.split_at(last_compound_start(selector));
    let (base, pseudo) = last.split_at(top_level_find(last, |c| c == ':').unwrap_or(last.len()));

    let kept = if base.contains('#') {
        base
    } else {
        match top_level_positions(base, |c| c == '.' || c == '[').last() {
            Some(&segment) => &base[..segment],
            None => base,
        }
    };

    format!("{}{}.{}{}", prefix, kept, class_name, pseudo)
}

/// Byte offset where the last compound starts: after the last whitespace
/// or combinator outside brackets, parentheses and strings
fn last_compound_start(selector: &str) -> usize {
    top_level_positions(selector, |c| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
        .last()
        .map(|&i| i + selector[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0)
}

fn top_level_find(text: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    top_level_positions(text, pred).first().copied()
}

/// Offsets of characters matching `pred` outside brackets, parentheses and
/// strings. An opening bracket itself counts as top level.
fn top_level_positions(text: &str, pred: impl Fn(char) -> bool) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if depth == 0 && pred(c) {
            positions.push(i);
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylewright_css::calculate_specificity;
    use stylewright_dom::DomTree;

    #[test]
    fn test_type_subject_gets_class() {
        assert_eq!(override_selector("#Outer div", "div-x1y2"), "#Outer div.div-x1y2");
        assert_eq!(override_selector("div", "gen-1"), "div.gen-1");
        assert_eq!(override_selector("#a>div", "gen-1"), "#a>div.gen-1");
        assert_eq!(override_selector("ul > li", "gen-1"), "ul > li.gen-1");
    }

    #[test]
    fn test_multibyte_whitespace_boundary() {
        assert_eq!(override_selector("#Outer\u{a0}div", "gen-1"), "#Outer\u{a0}div.gen-1");
        assert_eq!(override_selector("ul\u{3000}li.x", "gen-1"), "ul\u{3000}li.gen-1");
    }

    #[test]
    fn test_pseudo_suffix_is_kept() {
        assert_eq!(override_selector("#Outer div:hover", "gen-1"), "#Outer div.gen-1:hover");
        assert_eq!(override_selector("a::before", "gen-1"), "a.gen-1::before");
        assert_eq!(override_selector("li:nth-child(2n + 1)", "gen-1"), "li.gen-1:nth-child(2n + 1)");
    }

    #[test]
    fn test_id_subject_appends() {
        assert_eq!(override_selector("#UserContent #Div1", "gen-1"), "#UserContent #Div1.gen-1");
        assert_eq!(override_selector("div#Div1.box", "gen-1"), "div#Div1.box.gen-1");
    }

    #[test]
    fn test_trailing_class_or_attribute_is_replaced() {
        assert_eq!(override_selector("div.a.b", "gen-1"), "div.a.gen-1");
        assert_eq!(override_selector("p[title='x.y z']", "gen-1"), "p.gen-1");
        assert_eq!(override_selector(".box:hover", "gen-1"), ".gen-1:hover");
    }

    #[test]
    fn test_specificity_gains_one_class() {
        let before = calculate_specificity("#Outer div");
        let after = calculate_specificity(&override_selector("#Outer div", "div-ab12"));
        assert_eq!((after.ids, after.classes, after.types), (before.ids, before.classes + 1, before.types));
    }

    #[test]
    fn test_create_override_rule_inserts_after() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let outer = tree.append_element(root, "div", &[("id", "Outer")]).unwrap();
        let el = tree.append_element(outer, "div", &[]).unwrap();
        let mut doc = Document::new(tree);
        let sheet = doc.add_stylesheet(None);
        let shared = doc.insert_rule(sheet, "p, #Outer div { color: blue }", None).unwrap();
        doc.insert_rule(sheet, "span { }", None).unwrap();

        let created = create_override_rule(&mut doc, None, shared, el, "div-ab12").unwrap();
        assert_eq!(created.class_name, "div-ab12");
        assert_eq!(doc.find_rule(created.rule), Some((sheet, 1)));

        let rule = doc.rule(created.rule).unwrap();
        assert_eq!(rule.selector_text(), "#Outer div.div-ab12");
        assert!(rule.style.is_empty());

        assert!(matches!(
            create_override_rule(&mut doc, None, RuleId(99), el, "x"),
            Err(StyleError::RuleNotFound(RuleId(99)))
        ));
    }
}
