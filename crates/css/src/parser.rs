//! CSS Parser
//!
//! Splits stylesheet text into style rules while keeping each selector's
//! text exactly as written: ranking by specificity and rewriting selectors
//! both work on that text. At-rules are skipped.

use log::debug;

use crate::error::{CssError, CssResult, SourceLocation};

/// A style rule as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleText {
    /// Selector text, trimmed, comments removed
    pub selector_text: String,
    /// Declaration text between the braces
    pub declarations: String,
}

/// Parse a whole stylesheet
pub fn parse_stylesheet(input: &str) -> CssResult<Vec<RuleText>> {
    StylesheetParser::new(input).parse_rules()
}

/// Parse exactly one style rule, e.g. `div.a { color: red }`
pub fn parse_rule(input: &str) -> CssResult<RuleText> {
    let mut rules = parse_stylesheet(input)?;
    match (rules.pop(), rules.is_empty()) {
        (Some(rule), true) => Ok(rule),
        _ => Err(CssError::InvalidRule {
            text: input.trim().to_string(),
            location: SourceLocation::of_offset(input, 0),
        }),
    }
}

/// Split declaration text into `(property, value, important)` triples.
///
/// Entries without a colon or with an empty name or value are skipped; no
/// value validation happens here.
pub fn parse_declarations(input: &str) -> Vec<(String, String, bool)> {
    let text = strip_comments(input);
    split_outside(&text, ';')
        .into_iter()
        .filter_map(|entry| {
            let (property, value) = entry.split_once(':')?;
            let property = property.trim();
            let (value, important) = split_priority(value.trim());
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property.to_string(), value.to_string(), important))
        })
        .collect()
}

/// Separate a trailing `!important`
fn split_priority(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        let flag = value[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split on `delim` outside strings and parentheses
fn split_outside(text: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == delim && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Stylesheet parser
struct StylesheetParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> StylesheetParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::of_offset(self.input, self.position)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let rest = &self.input[self.position..];
            let trimmed = rest.trim_start();
            self.position += rest.len() - trimmed.len();
            if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.position += end + 4,
                    None => self.position = self.input.len(),
                }
            } else {
                break;
            }
        }
    }

    fn parse_rules(&mut self) -> CssResult<Vec<RuleText>> {
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace_and_comments();
            match self.peek() {
                None => break,
                Some('@') => self.skip_at_rule()?,
                // Stray closing braces and HTML comment markers
                Some('}') | Some(';') => {
                    self.advance();
                }
                Some(_) if self.input[self.position..].starts_with("<!--") => self.position += 4,
                Some(_) if self.input[self.position..].starts_with("-->") => self.position += 3,
                Some(_) => {
                    if let Some(rule) = self.parse_style_rule()? {
                        rules.push(rule);
                    }
                }
            }
        }

        Ok(rules)
    }

    fn parse_style_rule(&mut self) -> CssResult<Option<RuleText>> {
        let start = self.location();
        let prelude = self.consume_until(&['{'])?;
        if self.advance() != Some('{') {
            return Err(CssError::UnexpectedEof { location: self.location() });
        }
        let body_start = self.position;
        self.consume_block()?;
        let body = &self.input[body_start..self.position.saturating_sub(1)];

        let selector_text = strip_comments(&prelude).split_whitespace().collect::<Vec<_>>().join(" ");
        if selector_text.is_empty() {
            return Err(CssError::InvalidRule { text: prelude.trim().to_string(), location: start });
        }
        Ok(Some(RuleText { selector_text, declarations: body.trim().to_string() }))
    }

    fn skip_at_rule(&mut self) -> CssResult<()> {
        let prelude = self.consume_until(&['{', ';'])?;
        debug!("Skipping at-rule {}", prelude.trim());
        match self.advance() {
            Some('{') => self.consume_block(),
            _ => Ok(()),
        }
    }

    /// Consume text up to (not including) one of `stops`, outside strings
    fn consume_until(&mut self, stops: &[char]) -> CssResult<String> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                return Ok(self.input[start..self.position].to_string());
            }
            match c {
                '"' | '\'' => self.consume_string()?,
                '/' if self.input[self.position..].starts_with("/*") => self.skip_whitespace_and_comments(),
                _ => {
                    self.advance();
                }
            }
        }
        if stops.contains(&';') {
            // An at-rule may end with the input
            return Ok(self.input[start..].to_string());
        }
        Err(CssError::UnexpectedEof { location: self.location() })
    }

    /// Consume a block body; the opening brace is already consumed
    fn consume_block(&mut self) -> CssResult<()> {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => self.consume_string()?,
                '/' if self.input[self.position..].starts_with("/*") => self.skip_whitespace_and_comments(),
                '{' => {
                    depth += 1;
                    self.advance();
                }
                '}' => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        Err(CssError::UnexpectedEof { location: self.location() })
    }

    fn consume_string(&mut self) -> CssResult<()> {
        let start = self.location();
        let quote = self.advance();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '\n' => break,
                c if Some(c) == quote => return Ok(()),
                _ => {}
            }
        }
        Err(CssError::UnterminatedString { location: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rule() {
        let rules = parse_stylesheet("div { color: red; }").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector_text, "div");
        assert_eq!(rules[0].declarations, "color: red;");
    }

    #[test]
    fn test_selector_text_kept_verbatim() {
        let rules = parse_stylesheet("#UserContent   div#Div1,\n .a>b { }").unwrap();
        assert_eq!(rules[0].selector_text, "#UserContent div#Div1, .a>b");
        assert_eq!(rules[0].declarations, "");
    }

    #[test]
    fn test_multiple_rules_and_comments() {
        let css = "/* header */ a { color: blue } /* x */ b{margin:0}";
        let rules = parse_stylesheet(css).unwrap();
        let selectors: Vec<&str> = rules.iter().map(|r| r.selector_text.as_str()).collect();
        assert_eq!(selectors, vec!["a", "b"]);
    }

    #[test]
    fn test_at_rules_skipped() {
        let css = "@import url(x.css); @media screen { a { color: red } } p { color: blue }";
        let rules = parse_stylesheet(css).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector_text, "p");
    }

    #[test]
    fn test_braces_inside_strings() {
        let rules = parse_stylesheet("a::after { content: \"}\" } b { }").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].declarations, "content: \"}\"");
    }

    #[test]
    fn test_unterminated_block() {
        assert!(matches!(parse_stylesheet("a { color: red"), Err(CssError::UnexpectedEof { .. })));
        assert!(parse_stylesheet("a").is_err());
    }

    #[test]
    fn test_parse_single_rule() {
        let rule = parse_rule(".gen-1 { }").unwrap();
        assert_eq!(rule.selector_text, ".gen-1");
        assert!(parse_rule("a {} b {}").is_err());
        assert!(parse_rule("   ").is_err());
    }

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations("color: red; margin : 0 ! IMPORTANT;; background: url(a;b.png)");
        assert_eq!(decls, vec![
            ("color".to_string(), "red".to_string(), false),
            ("margin".to_string(), "0".to_string(), true),
            ("background".to_string(), "url(a;b.png)".to_string(), false),
        ]);
    }

    #[test]
    fn test_parse_declarations_skips_malformed() {
        let decls = parse_declarations("color; : red; width: ; /* c */ height: 1px");
        assert_eq!(decls, vec![("height".to_string(), "1px".to_string(), false)]);
    }
}
