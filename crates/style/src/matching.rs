//! Selector Matching
//!
//! Matches parsed selectors against DOM elements, walking from the subject
//! compound leftwards through the combinators.

use rustc_hash::FxHashSet;
use stylewright_css::{AttributeOp, Combinator, Compound, Selector, SimpleSelector};
use stylewright_dom::{DomTree, ElementData, NodeId, NodeType};

/// Dynamic states a rule lookup can ask to be treated as active
pub const DYNAMIC_STATES: [&str; 6] = ["link", "visited", "active", "hover", "focus", "target"];

/// Pseudo-elements a rule lookup can target
pub const PSEUDO_ELEMENTS: [&str; 4] = ["first-letter", "first-line", "before", "after"];

/// Context for dynamic pseudo-class matching (hover, focus, etc.)
#[derive(Debug, Clone, Default)]
pub struct MatchingContext {
    /// Elements currently being hovered
    pub hovered: FxHashSet<NodeId>,
    /// Element currently focused
    pub focused: Option<NodeId>,
    /// Dynamic state assumed active on the subject element, e.g. `hover`
    pub assumed_state: Option<String>,
    /// Pseudo-element being matched; `None` matches the element itself
    pub pseudo_element: Option<String>,
}

impl MatchingContext {
    /// Create a new empty matching context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a pseudo selector such as `:hover` or `::before`.
    ///
    /// Dynamic states are assumed active on the element, pseudo-elements
    /// become the match target, and anything else (`:first-child`, `:lang`)
    /// matches like the element itself.
    pub fn for_pseudo(pseudo: Option<&str>) -> Self {
        let mut ctx = Self::new();
        let Some(name) = pseudo.map(|p| p.trim_start_matches(':').to_ascii_lowercase()) else {
            return ctx;
        };
        if DYNAMIC_STATES.contains(&name.as_str()) {
            ctx.assumed_state = Some(name);
        } else if PSEUDO_ELEMENTS.contains(&name.as_str()) {
            ctx.pseudo_element = Some(name);
        }
        ctx
    }

    /// Create a context with a hovered element and its ancestors
    pub fn with_hover(tree: &DomTree, element_id: NodeId) -> Self {
        let mut ctx = Self::new();
        // :hover applies to every ancestor of the hovered element
        let mut current = Some(element_id);
        while let Some(id) = current {
            ctx.hovered.insert(id);
            current = tree.get(id).and_then(|n| n.parent);
        }
        ctx
    }

    /// Check if an element is hovered
    pub fn is_hovered(&self, element_id: NodeId) -> bool {
        self.hovered.contains(&element_id)
    }

    /// Check if an element is focused
    pub fn is_focused(&self, element_id: NodeId) -> bool {
        self.focused == Some(element_id)
    }

    fn assumes(&self, state: &str) -> bool {
        self.assumed_state.as_deref() == Some(state)
    }
}

/// Check if a selector matches a specific element in the DOM tree
pub fn matches_selector(tree: &DomTree, element_id: NodeId, selector: &Selector) -> bool {
    matches_selector_with_context(tree, element_id, selector, &MatchingContext::new())
}

/// Check if a selector matches with dynamic pseudo-class context (hover, focus, etc.)
pub fn matches_selector_with_context(
    tree: &DomTree,
    element_id: NodeId,
    selector: &Selector,
    context: &MatchingContext,
) -> bool {
    if selector.pseudo_element() != context.pseudo_element.as_deref() {
        return false;
    }
    if !matches_compound(tree, element_id, &selector.subject, context, true) {
        return false;
    }
    matches_ancestors(tree, element_id, &selector.ancestors, context)
}

/// Match the remaining compounds, backtracking over descendant and sibling
/// candidates until one chain fits
fn matches_ancestors(
    tree: &DomTree,
    element_id: NodeId,
    ancestors: &[(Combinator, Compound)],
    context: &MatchingContext,
) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };

    let try_candidate =
        |id: NodeId| matches_compound(tree, id, compound, context, false) && matches_ancestors(tree, id, rest, context);

    match combinator {
        Combinator::Child => parent_element(tree, element_id).map(try_candidate).unwrap_or(false),
        Combinator::Descendant => {
            let mut current = parent_element(tree, element_id);
            while let Some(id) = current {
                if try_candidate(id) {
                    return true;
                }
                current = parent_element(tree, id);
            }
            false
        }
        Combinator::NextSibling => previous_element_sibling(tree, element_id).map(try_candidate).unwrap_or(false),
        Combinator::SubsequentSibling => {
            let mut current = previous_element_sibling(tree, element_id);
            while let Some(id) = current {
                if try_candidate(id) {
                    return true;
                }
                current = previous_element_sibling(tree, id);
            }
            false
        }
    }
}

fn parent_element(tree: &DomTree, element_id: NodeId) -> Option<NodeId> {
    let parent = tree.get(element_id)?.parent?;
    tree.get(parent)?.is_element().then_some(parent)
}

fn previous_element_sibling(tree: &DomTree, element_id: NodeId) -> Option<NodeId> {
    let mut current = tree.get(element_id)?.prev_sibling;
    while let Some(id) = current {
        let node = tree.get(id)?;
        if node.is_element() {
            return Some(id);
        }
        current = node.prev_sibling;
    }
    None
}

/// Match a compound selector against an element
fn matches_compound(
    tree: &DomTree,
    element_id: NodeId,
    compound: &Compound,
    context: &MatchingContext,
    is_subject: bool,
) -> bool {
    let Some(element) = tree.get(element_id).and_then(|n| n.as_element()) else {
        return false;
    };

    compound
        .parts
        .iter()
        .all(|part| matches_simple_selector(tree, element_id, element, part, context, is_subject))
}

/// Match a single simple selector against an element
fn matches_simple_selector(
    tree: &DomTree,
    element_id: NodeId,
    element: &ElementData,
    part: &SimpleSelector,
    context: &MatchingContext,
    is_subject: bool,
) -> bool {
    match part {
        SimpleSelector::Universal => true,

        SimpleSelector::Type(tag) => element.tag_name.eq_ignore_ascii_case(tag),

        SimpleSelector::Class(class) => element.has_class(class),

        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),

        SimpleSelector::Attribute { name, op, value, case_insensitive } => {
            matches_attribute(element, name, op.as_ref(), value.as_deref(), *case_insensitive)
        }

        SimpleSelector::PseudoClass { name, args } => {
            if is_subject && context.assumes(name) {
                return true;
            }
            matches_pseudo_class(tree, element_id, element, name, args.as_deref(), context)
        }
    }
}

/// Match an attribute selector
fn matches_attribute(
    element: &ElementData,
    name: &str,
    op: Option<&AttributeOp>,
    expected_value: Option<&str>,
    case_insensitive: bool,
) -> bool {
    let Some(attr_value) = element.get_attribute(name) else {
        return false;
    };

    let Some(op) = op else {
        // [attr] just checks existence
        return true;
    };

    let Some(expected) = expected_value else {
        return false;
    };

    let (attr_value, expected) = if case_insensitive {
        (attr_value.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (attr_value.to_string(), expected.to_string())
    };

    match op {
        AttributeOp::Equals => attr_value == expected,
        AttributeOp::Includes => attr_value.split_whitespace().any(|w| w == expected),
        AttributeOp::DashMatch => dash_match(&attr_value, &expected),
        AttributeOp::PrefixMatch => !expected.is_empty() && attr_value.starts_with(&expected),
        AttributeOp::SuffixMatch => !expected.is_empty() && attr_value.ends_with(&expected),
        AttributeOp::SubstringMatch => !expected.is_empty() && attr_value.contains(&expected),
    }
}

fn dash_match(value: &str, expected: &str) -> bool {
    value == expected || value.starts_with(&format!("{}-", expected))
}

/// Match a pseudo-class
fn matches_pseudo_class(
    tree: &DomTree,
    element_id: NodeId,
    element: &ElementData,
    name: &str,
    args: Option<&str>,
    context: &MatchingContext,
) -> bool {
    match (name, args) {
        ("first-child", _) => element_index(tree, element_id, None, false) == Some(1),
        ("last-child", _) => element_index(tree, element_id, None, true) == Some(1),
        ("only-child", _) => {
            element_index(tree, element_id, None, false) == Some(1)
                && element_index(tree, element_id, None, true) == Some(1)
        }
        ("first-of-type", _) => element_index(tree, element_id, Some(&element.tag_name), false) == Some(1),
        ("last-of-type", _) => element_index(tree, element_id, Some(&element.tag_name), true) == Some(1),
        ("only-of-type", _) => {
            element_index(tree, element_id, Some(&element.tag_name), false) == Some(1)
                && element_index(tree, element_id, Some(&element.tag_name), true) == Some(1)
        }
        ("empty", _) => is_empty(tree, element_id),
        ("root", _) => tree.get(element_id).and_then(|n| n.parent) == Some(tree.document_id()),
        ("nth-child", Some(args)) => matches_nth(tree, element_id, None, args, false),
        ("nth-last-child", Some(args)) => matches_nth(tree, element_id, None, args, true),
        ("nth-of-type", Some(args)) => matches_nth(tree, element_id, Some(&element.tag_name), args, false),
        ("nth-last-of-type", Some(args)) => matches_nth(tree, element_id, Some(&element.tag_name), args, true),
        ("not", Some(args)) => match Selector::parse_list(args) {
            Ok(list) => !list
                .iter()
                .any(|sel| matches_compound(tree, element_id, &sel.subject, context, false)
                    && matches_ancestors(tree, element_id, &sel.ancestors, context)),
            Err(_) => false,
        },
        ("lang", Some(args)) => matches_lang(tree, element_id, args),
        ("link" | "any-link", _) => matches!(element.tag_name.as_str(), "a" | "area") && element.get_attribute("href").is_some(),
        ("enabled", _) => is_form_control(element) && element.get_attribute("disabled").is_none(),
        ("disabled", _) => is_form_control(element) && element.get_attribute("disabled").is_some(),
        ("checked", _) => element.get_attribute("checked").is_some() || element.get_attribute("selected").is_some(),
        ("required", _) => element.get_attribute("required").is_some(),
        ("optional", _) => is_form_control(element) && element.get_attribute("required").is_none(),
        ("read-only", _) => element.get_attribute("readonly").is_some(),
        ("read-write", _) => element.get_attribute("readonly").is_none(),

        ("hover", _) => context.is_hovered(element_id),
        ("focus", _) => context.is_focused(element_id),

        // No history, activation or fragment state in a static tree
        ("active" | "focus-within" | "focus-visible" | "visited" | "target", _) => false,

        _ => false,
    }
}

fn is_form_control(element: &ElementData) -> bool {
    matches!(
        element.tag_name.as_str(),
        "button" | "input" | "select" | "textarea" | "optgroup" | "option" | "fieldset"
    )
}

/// `:lang(xx)` against the nearest `lang` attribute on the element or an ancestor
fn matches_lang(tree: &DomTree, element_id: NodeId, args: &str) -> bool {
    let expected = args.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
    let lang = std::iter::once(element_id)
        .chain(tree.ancestors(element_id))
        .find_map(|id| tree.get(id)?.as_element()?.get_attribute("lang").map(str::to_ascii_lowercase));

    match lang {
        Some(lang) => !expected.is_empty() && dash_match(&lang, &expected),
        None => false,
    }
}

/// Check if element has no element children and no non-whitespace text
fn is_empty(tree: &DomTree, element_id: NodeId) -> bool {
    let Some(node) = tree.get(element_id) else {
        return false;
    };

    node.children.iter().all(|&child_id| match tree.get(child_id).map(|c| &c.node_type) {
        Some(NodeType::Element(_)) => false,
        Some(NodeType::Text(text)) => text.trim().is_empty(),
        _ => true,
    })
}

/// 1-based position among element siblings, optionally only those with
/// `tag_name`, counted from the end when `from_end` is set
fn element_index(tree: &DomTree, element_id: NodeId, tag_name: Option<&str>, from_end: bool) -> Option<usize> {
    let parent_id = tree.get(element_id)?.parent?;
    let parent = tree.get(parent_id)?;

    let siblings: Vec<NodeId> = parent
        .children
        .iter()
        .copied()
        .filter(|&id| {
            tree.get(id)
                .and_then(|n| n.as_element())
                .map(|e| tag_name.map_or(true, |t| e.tag_name == t))
                .unwrap_or(false)
        })
        .collect();

    let index = if from_end {
        siblings.iter().rev().position(|&id| id == element_id)
    } else {
        siblings.iter().position(|&id| id == element_id)
    };

    index.map(|i| i + 1)
}

fn matches_nth(tree: &DomTree, element_id: NodeId, tag_name: Option<&str>, args: &str, from_end: bool) -> bool {
    let Some((a, b)) = parse_nth_args(args) else {
        return false;
    };
    element_index(tree, element_id, tag_name, from_end)
        .map(|n| matches_an_plus_b(n as i32, a, b))
        .unwrap_or(false)
}

/// Parse an+b expression (e.g., "2n+1", "odd", "even", "3")
fn parse_nth_args(args: &str) -> Option<(i32, i32)> {
    let args: String = args.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();

    match args.as_str() {
        "odd" => Some((2, 1)),
        "even" => Some((2, 0)),
        _ => match args.find('n') {
            Some(n_pos) => {
                let a = match &args[..n_pos] {
                    "" | "+" => 1,
                    "-" => -1,
                    a => a.parse().ok()?,
                };
                let b = match &args[n_pos + 1..] {
                    "" => 0,
                    b => b.trim_start_matches('+').parse().ok()?,
                };
                Some((a, b))
            }
            None => Some((0, args.parse().ok()?)),
        },
    }
}

/// Check if index matches an+b formula
fn matches_an_plus_b(index: i32, a: i32, b: i32) -> bool {
    if a == 0 {
        return index == b;
    }

    let diff = index - b;
    if a > 0 {
        diff >= 0 && diff % a == 0
    } else {
        diff <= 0 && diff % a == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylewright_dom::Queryable;

    fn sel(text: &str) -> Selector {
        Selector::parse(text).unwrap()
    }

    #[test]
    fn test_simple_selectors() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let div = tree.append_element(root, "div", &[("id", "main"), ("class", "container")]).unwrap();

        assert!(matches_selector(&tree, div, &sel("div")));
        assert!(matches_selector(&tree, div, &sel(".container")));
        assert!(matches_selector(&tree, div, &sel("#main")));
        assert!(matches_selector(&tree, div, &sel("div.container#main")));
        assert!(matches_selector(&tree, div, &sel("*")));
        assert!(!matches_selector(&tree, div, &sel(".other")));
        assert!(!matches_selector(&tree, div, &sel("p")));
    }

    #[test]
    fn test_descendant_and_child_combinators() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let outer = tree.append_element(root, "div", &[("id", "Outer")]).unwrap();
        let section = tree.append_element(outer, "section", &[]).unwrap();
        let p = tree.append_element(section, "p", &[]).unwrap();

        assert!(matches_selector(&tree, p, &sel("#Outer p")));
        assert!(matches_selector(&tree, p, &sel("div section > p")));
        assert!(!matches_selector(&tree, p, &sel("#Outer > p")));
        assert!(matches_selector(&tree, p, &sel("#Outer > section > p")));
    }

    #[test]
    fn test_descendant_backtracking() {
        // <div class=a><div class=b><div><p>
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree.append_element(root, "div", &[("class", "a")]).unwrap();
        let b = tree.append_element(a, "div", &[("class", "b")]).unwrap();
        let inner = tree.append_element(b, "div", &[]).unwrap();
        let p = tree.append_element(inner, "p", &[]).unwrap();

        // The nearest div ancestor is not the one whose parent is .a
        assert!(matches_selector(&tree, p, &sel(".a > div p")));
        assert!(!matches_selector(&tree, p, &sel(".b > .a p")));
    }

    #[test]
    fn test_sibling_combinators() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let h1 = tree.append_element(root, "h1", &[]).unwrap();
        let text = tree.create_text(" ");
        tree.append_child(root, text).unwrap();
        let p1 = tree.append_element(root, "p", &[]).unwrap();
        let p2 = tree.append_element(root, "p", &[]).unwrap();

        assert!(matches_selector(&tree, p1, &sel("h1 + p")));
        assert!(!matches_selector(&tree, p2, &sel("h1 + p")));
        assert!(matches_selector(&tree, p2, &sel("h1 ~ p")));
        assert!(!matches_selector(&tree, h1, &sel("p ~ h1")));
    }

    #[test]
    fn test_attribute_selectors() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let a = tree
            .append_element(root, "a", &[("href", "https://example.com"), ("lang", "en-US"), ("rel", "nofollow noopener")])
            .unwrap();

        assert!(matches_selector(&tree, a, &sel("[href]")));
        assert!(matches_selector(&tree, a, &sel("[href^='https']")));
        assert!(matches_selector(&tree, a, &sel("[href$='.com']")));
        assert!(matches_selector(&tree, a, &sel("[href*=example]")));
        assert!(matches_selector(&tree, a, &sel("[lang|=en]")));
        assert!(matches_selector(&tree, a, &sel("[rel~=noopener]")));
        assert!(matches_selector(&tree, a, &sel("[lang='EN-us' i]")));
        assert!(!matches_selector(&tree, a, &sel("[lang='EN-us']")));
        assert!(!matches_selector(&tree, a, &sel("[title]")));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let ul = tree.append_element(root, "ul", &[]).unwrap();
        let items: Vec<NodeId> = (0..5).map(|_| tree.append_element(ul, "li", &[]).unwrap()).collect();

        assert!(matches_selector(&tree, items[0], &sel("li:first-child")));
        assert!(matches_selector(&tree, items[4], &sel("li:last-child")));
        assert!(matches_selector(&tree, items[2], &sel("li:nth-child(odd)")));
        assert!(matches_selector(&tree, items[1], &sel("li:nth-child(2n)")));
        assert!(matches_selector(&tree, items[2], &sel("li:nth-child(2n + 1)")));
        assert!(matches_selector(&tree, items[3], &sel("li:nth-last-child(2)")));
        assert!(matches_selector(&tree, items[1], &sel("li:nth-of-type(-n+2)")));
        assert!(!matches_selector(&tree, items[2], &sel("li:nth-of-type(-n+2)")));
        assert!(matches_selector(&tree, ul, &sel("ul:root")));
        assert!(matches_selector(&tree, items[0], &sel("li:empty")));
        assert!(!matches_selector(&tree, ul, &sel("ul:empty")));
        assert!(!matches_selector(&tree, items[0], &sel("li:only-child")));
    }

    #[test]
    fn test_not_and_lang() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let html = tree.append_element(root, "html", &[("lang", "fr-CA")]).unwrap();
        let p = tree.append_element(html, "p", &[("class", "note")]).unwrap();

        assert!(matches_selector(&tree, p, &sel("p:not(.intro)")));
        assert!(!matches_selector(&tree, p, &sel("p:not(.intro, .note)")));
        assert!(matches_selector(&tree, p, &sel("p:lang(fr)")));
        assert!(!matches_selector(&tree, p, &sel("p:lang(en)")));
    }

    #[test]
    fn test_dynamic_pseudo_classes_with_context() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let nav = tree.append_element(root, "nav", &[]).unwrap();
        let link = tree.append_element(nav, "a", &[("href", "#")]).unwrap();

        assert!(!matches_selector(&tree, link, &sel("a:hover")));
        assert!(matches_selector(&tree, link, &sel("a:link")));

        let ctx = MatchingContext::with_hover(&tree, link);
        assert!(matches_selector_with_context(&tree, link, &sel("nav:hover a:hover"), &ctx));

        let assumed = MatchingContext::for_pseudo(Some(":hover"));
        assert!(matches_selector_with_context(&tree, link, &sel("a:hover"), &assumed));
        // Only the subject takes the assumed state
        assert!(!matches_selector_with_context(&tree, link, &sel("nav:hover a"), &assumed));
    }

    #[test]
    fn test_pseudo_element_target() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let p = tree.append_element(root, "p", &[]).unwrap();

        let before = MatchingContext::for_pseudo(Some("::before"));
        assert!(matches_selector_with_context(&tree, p, &sel("p::before"), &before));
        assert!(!matches_selector_with_context(&tree, p, &sel("p"), &before));
        assert!(!matches_selector(&tree, p, &sel("p::before")));
        assert!(!matches_selector(&tree, p, &sel("p:after")));

        // Structural pseudos in a lookup use the element itself
        let first = MatchingContext::for_pseudo(Some(":first-child"));
        assert!(matches_selector_with_context(&tree, p, &sel("p"), &first));
    }

    #[test]
    fn test_form_states() {
        let mut tree = DomTree::new();
        let root = tree.document_id();
        let input = tree.append_element(root, "input", &[("disabled", ""), ("checked", "")]).unwrap();
        let div = tree.append_element(root, "div", &[]).unwrap();

        assert!(matches_selector(&tree, input, &sel("input:disabled")));
        assert!(!matches_selector(&tree, input, &sel("input:enabled")));
        assert!(matches_selector(&tree, input, &sel(":checked")));
        assert!(!matches_selector(&tree, div, &sel("div:enabled")));
        assert_eq!(tree.get_elements_by_tag_name("input"), vec![input]);
    }

    #[test]
    fn test_parse_nth_args() {
        assert_eq!(parse_nth_args("odd"), Some((2, 1)));
        assert_eq!(parse_nth_args(" 3n - 2 "), Some((3, -2)));
        assert_eq!(parse_nth_args("-n+3"), Some((-1, 3)));
        assert_eq!(parse_nth_args("4"), Some((0, 4)));
        assert_eq!(parse_nth_args("x"), None);
    }
}
