//! CSS Selector Parser
//!
//! Parses selector text into a structure the DOM matcher walks right to left.
//! Ranking rules by specificity does not use this parser; see
//! [`crate::specificity`].

use smallvec::SmallVec;

use crate::error::{CssError, CssResult, SourceLocation};
use crate::tokenizer::{Token, Tokenizer};

/// One complex selector, e.g. `#UserContent > div.box:hover`
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// The rightmost compound: the element the selector targets
    pub subject: Compound,
    /// Compounds to the left of the subject, nearest first, each paired with
    /// the combinator that links it to the compound on its right
    pub ancestors: Vec<(Combinator, Compound)>,
}

/// A run of simple selectors with no combinator between them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    pub parts: SmallVec<[SimpleSelector; 4]>,
    /// Pseudo-element such as `before` (without colons)
    pub pseudo_element: Option<String>,
}

/// A single simple selector
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    /// `*`
    Universal,
    /// `div`
    Type(String),
    /// `.container`
    Class(String),
    /// `#main`
    Id(String),
    /// `[type="text"]`
    Attribute {
        name: String,
        op: Option<AttributeOp>,
        value: Option<String>,
        case_insensitive: bool,
    },
    /// `:hover`, `:nth-child(2n)`
    PseudoClass {
        name: String,
        args: Option<String>,
    },
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// [attr=value]
    Equals,
    /// [attr~=value]
    Includes,
    /// [attr|=value]
    DashMatch,
    /// [attr^=value]
    PrefixMatch,
    /// [attr$=value]
    SuffixMatch,
    /// [attr*=value]
    SubstringMatch,
}

/// Selector combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    SubsequentSibling,
}

/// Pseudo-elements that may be written with a single colon
const LEGACY_PSEUDO_ELEMENTS: [&str; 4] = ["before", "after", "first-line", "first-letter"];

impl Selector {
    /// Parse a single complex selector
    pub fn parse(input: &str) -> CssResult<Self> {
        let mut parser = SelectorParser::new(input);
        let selector = parser.parse_selector()?;
        parser.skip_whitespace();
        match parser.peek() {
            Token::Eof => Ok(selector),
            _ => Err(CssError::invalid_selector(input, parser.location())),
        }
    }

    /// Parse a comma-separated list of selectors
    pub fn parse_list(input: &str) -> CssResult<Vec<Self>> {
        SelectorParser::new(input).parse_selector_list()
    }

    /// Pseudo-element targeted by this selector, if any
    pub fn pseudo_element(&self) -> Option<&str> {
        self.subject.pseudo_element.as_deref()
    }

    /// All compounds, rightmost first
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        std::iter::once(&self.subject).chain(self.ancestors.iter().map(|(_, c)| c))
    }
}

/// Split a selector list on top-level commas, trimming each entry.
///
/// Commas inside parentheses, brackets or strings (`:not(.a, .b)`) do not
/// split.
pub fn split_selector_list(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// Collapse runs of whitespace to one space and trim the ends.
///
/// Whitespace inside strings and attribute brackets is kept as written, so
/// `p[title='a  b']` still selects the same elements.
pub fn normalize_selector_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in text.trim().chars() {
        if quote.is_none() && depth == 0 && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            _ => {}
        }
        out.push(c);
    }
    out
}

struct SelectorParser<'a> {
    input: &'a str,
    tokenizer: Tokenizer<'a>,
    current: Token,
    /// Byte offset where `current` starts
    current_start: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token().unwrap_or(Token::Eof);
        Self { input, tokenizer, current, current_start: 0 }
    }

    fn location(&self) -> SourceLocation {
        self.tokenizer.location()
    }

    fn error(&self) -> CssError {
        CssError::invalid_selector(self.input.trim(), self.location())
    }

    fn advance(&mut self) -> CssResult<Token> {
        let start = self.tokenizer.position();
        let next = self.tokenizer.next_token()?;
        self.current_start = start;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn peek(&self) -> &Token {
        &self.current
    }

    fn skip_whitespace(&mut self) {
        while *self.peek() == Token::Whitespace {
            // Whitespace tokens never fail to advance past
            if self.advance().is_err() {
                break;
            }
        }
    }

    fn parse_selector_list(&mut self) -> CssResult<Vec<Selector>> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();

            match self.peek() {
                Token::Comma => {
                    self.advance()?;
                }
                Token::Eof => break,
                _ => return Err(self.error()),
            }
        }

        Ok(selectors)
    }

    fn parse_selector(&mut self) -> CssResult<Selector> {
        // Left to right: first compound, then (combinator, compound) pairs
        let mut first: Option<Compound> = None;
        let mut rest: Vec<(Combinator, Compound)> = Vec::new();

        loop {
            let had_whitespace = *self.peek() == Token::Whitespace;
            self.skip_whitespace();

            if matches!(self.peek(), Token::Eof | Token::Comma | Token::LeftBrace) {
                break;
            }

            let combinator = match self.try_parse_combinator()? {
                Some(comb) => {
                    self.skip_whitespace();
                    Some(comb)
                }
                None if had_whitespace && first.is_some() => Some(Combinator::Descendant),
                None => None,
            };

            match (combinator, first.is_some()) {
                (Some(_), false) => return Err(self.error()),
                (None, true) => return Err(self.error()),
                _ => {}
            }

            let compound = self.parse_compound()?;
            match combinator {
                Some(comb) => rest.push((comb, compound)),
                None => first = Some(compound),
            }
        }

        let first = first.ok_or_else(|| self.error())?;

        // Re-anchor on the rightmost compound
        let mut compounds: Vec<Compound> = vec![first];
        let mut combinators: Vec<Combinator> = Vec::new();
        for (comb, compound) in rest {
            combinators.push(comb);
            compounds.push(compound);
        }
        let subject = compounds.pop().ok_or_else(|| self.error())?;
        let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();

        Ok(Selector { subject, ancestors })
    }

    fn try_parse_combinator(&mut self) -> CssResult<Option<Combinator>> {
        let combinator = match self.peek() {
            Token::Delim('>') => Combinator::Child,
            Token::Delim('+') => Combinator::NextSibling,
            Token::Delim('~') => Combinator::SubsequentSibling,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(combinator))
    }

    fn parse_compound(&mut self) -> CssResult<Compound> {
        let mut compound = Compound::default();

        loop {
            match self.peek().clone() {
                Token::Delim('*') => {
                    self.advance()?;
                    compound.parts.push(SimpleSelector::Universal);
                }
                Token::Ident(name) => {
                    self.advance()?;
                    compound.parts.push(SimpleSelector::Type(name.to_ascii_lowercase()));
                }
                Token::Hash(name, _) => {
                    self.advance()?;
                    compound.parts.push(SimpleSelector::Id(name));
                }
                Token::Delim('.') => {
                    self.advance()?;
                    match self.advance()? {
                        Token::Ident(name) => compound.parts.push(SimpleSelector::Class(name)),
                        _ => return Err(self.error()),
                    }
                }
                Token::LeftBracket => {
                    let attribute = self.parse_attribute_selector()?;
                    compound.parts.push(attribute);
                }
                Token::Colon => self.parse_pseudo(&mut compound)?,
                _ => break,
            }
        }

        if compound.parts.is_empty() && compound.pseudo_element.is_none() {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_attribute_selector(&mut self) -> CssResult<SimpleSelector> {
        self.advance()?; // '['
        self.skip_whitespace();

        let name = match self.advance()? {
            Token::Ident(name) => name.to_ascii_lowercase(),
            _ => return Err(self.error()),
        };
        self.skip_whitespace();

        let op = match self.peek() {
            Token::Delim('=') => {
                self.advance()?;
                Some(AttributeOp::Equals)
            }
            Token::Delim(c @ ('~' | '|' | '^' | '$' | '*')) => {
                let op = match c {
                    '~' => AttributeOp::Includes,
                    '|' => AttributeOp::DashMatch,
                    '^' => AttributeOp::PrefixMatch,
                    '$' => AttributeOp::SuffixMatch,
                    _ => AttributeOp::SubstringMatch,
                };
                self.advance()?;
                if self.advance()? != Token::Delim('=') {
                    return Err(self.error());
                }
                Some(op)
            }
            _ => None,
        };

        let value = if op.is_some() {
            self.skip_whitespace();
            match self.advance()? {
                Token::Ident(v) | Token::String(v) => Some(v),
                Token::Number(n) => Some(n.to_string()),
                _ => return Err(self.error()),
            }
        } else {
            None
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        if let Token::Ident(flag) = self.peek() {
            if flag.eq_ignore_ascii_case("i") || flag.eq_ignore_ascii_case("s") {
                case_insensitive = flag.eq_ignore_ascii_case("i");
                self.advance()?;
                self.skip_whitespace();
            }
        }

        if self.advance()? != Token::RightBracket {
            return Err(self.error());
        }

        Ok(SimpleSelector::Attribute { name, op, value, case_insensitive })
    }

    fn parse_pseudo(&mut self, compound: &mut Compound) -> CssResult<()> {
        self.advance()?; // ':'
        let double_colon = *self.peek() == Token::Colon;
        if double_colon {
            self.advance()?;
        }

        let (name, args) = match self.advance()? {
            Token::Ident(name) => (name.to_ascii_lowercase(), None),
            Token::Function(name) => (name.to_ascii_lowercase(), Some(self.consume_arguments()?)),
            _ => return Err(self.error()),
        };

        if double_colon || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
            compound.pseudo_element = Some(name);
        } else {
            compound.parts.push(SimpleSelector::PseudoClass { name, args });
        }
        Ok(())
    }

    /// Raw argument text of a functional pseudo-class; the '(' is already consumed
    fn consume_arguments(&mut self) -> CssResult<String> {
        let start = self.current_start;
        let mut depth = 1usize;

        let end = loop {
            let token_start = self.current_start;
            match self.advance()? {
                Token::LeftParen | Token::Function(_) => depth += 1,
                Token::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        break token_start;
                    }
                }
                Token::Eof => return Err(self.error()),
                _ => {}
            }
        };

        Ok(self.input.get(start..end).unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(compound: &Compound) -> &[SimpleSelector] {
        &compound.parts
    }

    #[test]
    fn test_type_selector() {
        let sel = Selector::parse("DIV").unwrap();
        assert_eq!(parts(&sel.subject), &[SimpleSelector::Type("div".into())]);
        assert!(sel.ancestors.is_empty());
    }

    #[test]
    fn test_compound_selector() {
        let sel = Selector::parse("div.container#main").unwrap();
        assert_eq!(parts(&sel.subject), &[
            SimpleSelector::Type("div".into()),
            SimpleSelector::Class("container".into()),
            SimpleSelector::Id("main".into()),
        ]);
    }

    #[test]
    fn test_ancestors_are_nearest_first() {
        let sel = Selector::parse("#UserContent > section p").unwrap();
        assert_eq!(parts(&sel.subject), &[SimpleSelector::Type("p".into())]);
        assert_eq!(sel.ancestors.len(), 2);
        assert_eq!(sel.ancestors[0].0, Combinator::Descendant);
        assert_eq!(parts(&sel.ancestors[0].1), &[SimpleSelector::Type("section".into())]);
        assert_eq!(sel.ancestors[1].0, Combinator::Child);
        assert_eq!(parts(&sel.ancestors[1].1), &[SimpleSelector::Id("UserContent".into())]);
    }

    #[test]
    fn test_sibling_combinators() {
        let sel = Selector::parse("h1 + p").unwrap();
        assert_eq!(sel.ancestors[0].0, Combinator::NextSibling);

        let sel = Selector::parse("h1~p").unwrap();
        assert_eq!(sel.ancestors[0].0, Combinator::SubsequentSibling);
    }

    #[test]
    fn test_attribute_selectors() {
        let sel = Selector::parse("[type=\"text\" i]").unwrap();
        assert_eq!(parts(&sel.subject), &[SimpleSelector::Attribute {
            name: "type".into(),
            op: Some(AttributeOp::Equals),
            value: Some("text".into()),
            case_insensitive: true,
        }]);

        let sel = Selector::parse("a[href^='https']").unwrap();
        assert!(matches!(
            &sel.subject.parts[1],
            SimpleSelector::Attribute { op: Some(AttributeOp::PrefixMatch), .. }
        ));

        let sel = Selector::parse("[disabled]").unwrap();
        assert!(matches!(&sel.subject.parts[0], SimpleSelector::Attribute { op: None, .. }));
    }

    #[test]
    fn test_pseudo_class_and_element() {
        let sel = Selector::parse("a:hover::before").unwrap();
        assert_eq!(sel.pseudo_element(), Some("before"));
        assert!(matches!(&sel.subject.parts[1], SimpleSelector::PseudoClass { name, args: None } if name == "hover"));

        let legacy = Selector::parse("p:first-line").unwrap();
        assert_eq!(legacy.pseudo_element(), Some("first-line"));
    }

    #[test]
    fn test_functional_pseudo_class_args() {
        let sel = Selector::parse("li:nth-child(2n + 1)").unwrap();
        assert!(matches!(
            &sel.subject.parts[1],
            SimpleSelector::PseudoClass { name, args: Some(a) } if name == "nth-child" && a == "2n + 1"
        ));

        let sel = Selector::parse("li:not(.active)").unwrap();
        assert!(matches!(
            &sel.subject.parts[1],
            SimpleSelector::PseudoClass { name, args: Some(a) } if name == "not" && a == ".active"
        ));
    }

    #[test]
    fn test_selector_list() {
        let selectors = Selector::parse_list("div, .class , #id").unwrap();
        assert_eq!(selectors.len(), 3);
        assert_eq!(parts(&selectors[2].subject), &[SimpleSelector::Id("id".into())]);
    }

    #[test]
    fn test_split_selector_list() {
        assert_eq!(split_selector_list("#a, .b"), vec!["#a", ".b"]);
        assert_eq!(split_selector_list("p:not(.a, .b) ,[title='x,y']"), vec!["p:not(.a, .b)", "[title='x,y']"]);
        assert_eq!(split_selector_list("div"), vec!["div"]);
    }

    #[test]
    fn test_normalize_selector_text() {
        assert_eq!(normalize_selector_text("  #a \n\t div  >  p "), "#a div > p");
        assert_eq!(normalize_selector_text("p[title='a  b']  span"), "p[title='a  b'] span");
        assert_eq!(normalize_selector_text("a[ href ]"), "a[ href ]");
        assert_eq!(normalize_selector_text("#a\u{a0}div"), "#a div");
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("> div").is_err());
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse_list("a,,b").is_err());
        assert!(Selector::parse("a b)").is_err());
    }
}
