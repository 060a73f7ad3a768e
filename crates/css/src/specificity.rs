//! Selector specificity
//!
//! Specificity used for ranking rules is computed by three independent
//! pattern scans over the selector text rather than from the parsed
//! selector. This keeps ranking consistent for selectors the matcher cannot
//! parse and mirrors how authoring tools have always counted.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use crate::selector::split_selector_list;

/// (id, class/attribute/pseudo, type) counts for one simple selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub types: u32,
}

impl Specificity {
    pub const fn new(ids: u32, classes: u32, types: u32) -> Self {
        Self { ids, classes, types }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.ids, self.classes, self.types)
    }
}

/// One entry of a grouped selector with its specificity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorSpecificity {
    pub selector: String,
    pub specificity: Specificity,
}

/// Per-rule specificity list, most specific first
pub type SpecificityList = SmallVec<[SelectorSpecificity; 2]>;

/// Compute the specificity of a single (ungrouped) selector.
///
/// The first parenthesized argument is removed before counting so that
/// `:nth-child(2n+1)` is not counted as extra tokens.
pub fn calculate_specificity(selector: &str) -> Specificity {
    let s = strip_first_argument(selector);
    Specificity {
        ids: count_ids(&s),
        classes: count_classes(&s),
        types: count_types(&s),
    }
}

/// Order two specificities, most specific first.
///
/// `Less` means `a` is more specific than `b`; `Equal` is a true tie left to
/// the caller to break by source order.
pub fn compare_specificity(a: &Specificity, b: &Specificity) -> Ordering {
    b.cmp(a)
}

/// Split a possibly grouped selector on commas and rank its parts
pub fn get_specificity(selector_text: &str) -> SpecificityList {
    let mut list: SpecificityList = split_selector_list(selector_text)
        .into_iter()
        .map(|sel| SelectorSpecificity {
            selector: sel.to_string(),
            specificity: calculate_specificity(sel),
        })
        .collect();
    // Stable: equal entries keep their written order
    list.sort_by(|a, b| compare_specificity(&a.specificity, &b.specificity));
    list
}

fn strip_first_argument(selector: &str) -> Cow<'_, str> {
    for (open, _) in selector.match_indices('(') {
        let rest = &selector[open + 1..];
        if rest.starts_with(')') {
            continue;
        }
        if let Some(close) = rest.find(')') {
            let mut stripped = String::with_capacity(selector.len());
            stripped.push_str(&selector[..open]);
            stripped.push_str(&rest[close + 1..]);
            return Cow::Owned(stripped);
        }
    }
    Cow::Borrowed(selector)
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `#` followed by a run of word characters or hyphens
fn count_ids(s: &str) -> u32 {
    let chars: Vec<char> = s.chars().collect();
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '#' {
            let run = chars[i + 1..].iter().take_while(|&&c| is_word(c) || c == '-').count();
            if run > 0 {
                count += 1;
                i += run + 1;
                continue;
            }
        }
        i += 1;
    }
    count
}

/// `.`, `:` or `[` followed by a run that stops at the next one of those or a
/// `+`/`>` combinator
fn count_classes(s: &str) -> u32 {
    let starts = |c: char| matches!(c, '.' | ':' | '[');
    let chars: Vec<char> = s.chars().collect();
    let mut count = 0;
    let mut i = 0;
    while i < chars.len() {
        if starts(chars[i]) {
            let run = chars[i + 1..]
                .iter()
                .take_while(|&&c| !starts(c) && c != '+' && c != '>')
                .count();
            if run > 0 {
                count += 1;
                i += run + 1;
                continue;
            }
        }
        i += 1;
    }
    count
}

/// A word at the start of the text or after whitespace, `+` or `>`
fn count_types(s: &str) -> u32 {
    let chars: Vec<char> = s.chars().collect();
    let word_run = |from: usize| chars[from.min(chars.len())..].iter().take_while(|&&c| is_word(c)).count();
    let mut count = 0;
    let mut i = 0;

    let leading = word_run(0);
    if leading > 0 {
        count += 1;
        i = leading;
    }

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == '+' || c == '>' {
            let run = word_run(i + 1);
            if run > 0 {
                count += 1;
                i += run + 1;
                continue;
            }
        }
        i += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(selector: &str) -> (u32, u32, u32) {
        let s = calculate_specificity(selector);
        (s.ids, s.classes, s.types)
    }

    #[test]
    fn test_hand_counted_selectors() {
        assert_eq!(spec("#a.b.c div"), (1, 2, 1));
        assert_eq!(spec("div"), (0, 0, 1));
        assert_eq!(spec(".box"), (0, 1, 0));
        assert_eq!(spec("#UserContent div#Div1"), (2, 0, 1));
        assert_eq!(spec("#UserContent #Div1"), (2, 0, 0));
        assert_eq!(spec("div div#Div1"), (1, 0, 2));
        assert_eq!(spec("div#Div1"), (1, 0, 1));
        assert_eq!(spec("ul > li + li"), (0, 0, 3));
    }

    #[test]
    fn test_attributes_and_pseudos_count_as_classes() {
        assert_eq!(spec("a[href]"), (0, 1, 1));
        assert_eq!(spec("a:hover"), (0, 1, 1));
        assert_eq!(spec("p::before"), (0, 1, 1));
    }

    #[test]
    fn test_parenthesized_argument_is_ignored() {
        assert_eq!(spec("li:nth-child(2n+1)"), (0, 1, 1));
        assert_eq!(spec("div:not(#x)"), (0, 1, 1));
    }

    #[test]
    fn test_id_pattern_accepts_hyphens() {
        assert_eq!(spec("#main-nav"), (1, 0, 0));
        assert_eq!(spec("#"), (0, 0, 0));
    }

    #[test]
    fn test_compare_orders_id_then_class_then_type() {
        let id = Specificity::new(1, 0, 0);
        let classes = Specificity::new(0, 5, 0);
        let types = Specificity::new(0, 0, 9);

        assert_eq!(compare_specificity(&id, &classes), Ordering::Less);
        assert_eq!(compare_specificity(&classes, &id), Ordering::Greater);
        assert_eq!(compare_specificity(&classes, &types), Ordering::Less);
        assert_eq!(compare_specificity(&types, &types), Ordering::Equal);
    }

    #[test]
    fn test_compare_is_antisymmetric_and_transitive() {
        let samples = [
            Specificity::new(0, 0, 1),
            Specificity::new(0, 1, 0),
            Specificity::new(0, 1, 2),
            Specificity::new(1, 0, 0),
            Specificity::new(2, 0, 1),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(compare_specificity(a, b), compare_specificity(b, a).reverse());
                for c in &samples {
                    if compare_specificity(a, b) == Ordering::Less
                        && compare_specificity(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_specificity(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn test_get_specificity_sorts_grouped_selector() {
        let list = get_specificity("#a, .b");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].selector, "#a");
        assert_eq!(list[1].selector, ".b");

        let list = get_specificity("p, #x span, .c");
        let order: Vec<&str> = list.iter().map(|s| s.selector.as_str()).collect();
        assert_eq!(order, vec!["#x span", ".c", "p"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Specificity::new(1, 2, 3).to_string(), "(1, 2, 3)");
    }
}
