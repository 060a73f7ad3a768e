//! CSS Tokenizer
//!
//! Tokenizes selector and value text following CSS Syntax Level 3 closely
//! enough for the selector engine and value normalizer. Comments are dropped;
//! runs of whitespace collapse into a single [`Token::Whitespace`].

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{CssError, CssResult, SourceLocation};

/// CSS Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (e.g., property names, keywords, type selectors)
    Ident(String),
    /// Function token (identifier immediately followed by '(')
    Function(String),
    /// At-keyword (e.g., @media)
    AtKeyword(String),
    /// Hash token (e.g., #id, #fff)
    Hash(String, HashType),
    /// Quoted string, quotes removed
    String(String),
    /// Unquoted url(...)
    Url(String),
    /// Number (without unit)
    Number(f32),
    /// Percentage
    Percentage(f32),
    /// Dimension (number with unit)
    Dimension(f32, String),
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    /// Any other single character
    Delim(char),
    Eof,
}

/// Hash token type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// Valid identifier after '#', usable as an ID selector
    Id,
    /// Anything else (e.g. `#0af`)
    Unrestricted,
}

/// CSS Tokenizer
pub struct Tokenizer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            position: 0,
        }
    }

    /// Get the current source location
    pub fn location(&self) -> SourceLocation {
        SourceLocation::of_offset(self.input, self.position)
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.position
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    fn advance_while(&mut self, mut keep: impl FnMut(char) -> bool, out: &mut String) {
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
    }

    /// Skip whitespace and comments; true if anything was skipped
    fn skip_trivia(&mut self) -> bool {
        let start = self.position;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_nth(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.advance() {
                        if c == '*' && self.peek() == Some('/') {
                            self.advance();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        self.position != start
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CssResult<Token> {
        if self.skip_trivia() {
            return Ok(Token::Whitespace);
        }

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let simple = match c {
            ':' => Some(Token::Colon),
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            _ => None,
        };
        if let Some(token) = simple {
            self.advance();
            return Ok(token);
        }

        match c {
            '"' | '\'' => self.consume_string(),
            '#' => {
                self.advance();
                let mut name = String::new();
                self.advance_while(is_ident_char, &mut name);
                if name.is_empty() {
                    return Ok(Token::Delim('#'));
                }
                let kind = if would_start_ident(&name) { HashType::Id } else { HashType::Unrestricted };
                Ok(Token::Hash(name, kind))
            }
            '@' => {
                self.advance();
                let mut name = String::new();
                self.advance_while(is_ident_char, &mut name);
                Ok(Token::AtKeyword(name))
            }
            _ if self.starts_number() => self.consume_numeric(),
            _ if would_start_ident(&self.input[self.position..]) => self.consume_ident_like(),
            _ => {
                self.advance();
                Ok(Token::Delim(c))
            }
        }
    }

    fn starts_number(&self) -> bool {
        let mut rest = self.input[self.position..].chars();
        let first = rest.next();
        let second = rest.next();
        let third = rest.next();
        match first {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => second.map(|c| c.is_ascii_digit()).unwrap_or(false),
            Some('+') | Some('-') => match second {
                Some(c) if c.is_ascii_digit() => true,
                Some('.') => third.map(|c| c.is_ascii_digit()).unwrap_or(false),
                _ => false,
            },
            _ => false,
        }
    }

    fn consume_string(&mut self) -> CssResult<Token> {
        let start = self.location();
        let quote = self.advance().unwrap_or('"');
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(Token::String(value)),
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        if escaped != '\n' {
                            value.push(escaped);
                        }
                    }
                }
                Some('\n') | None => return Err(CssError::UnterminatedString { location: start }),
                Some(c) => value.push(c),
            }
        }
    }

    fn consume_ident_like(&mut self) -> CssResult<Token> {
        let mut name = String::new();
        self.advance_while(is_ident_char, &mut name);

        if self.peek() != Some('(') {
            return Ok(Token::Ident(name));
        }
        self.advance();

        if name.eq_ignore_ascii_case("url") {
            self.skip_trivia();
            if !matches!(self.peek(), Some('"') | Some('\'')) {
                return self.consume_bare_url();
            }
        }
        Ok(Token::Function(name))
    }

    fn consume_bare_url(&mut self) -> CssResult<Token> {
        let mut url = String::new();
        loop {
            match self.advance() {
                Some(')') => return Ok(Token::Url(url)),
                Some(c) if c.is_ascii_whitespace() => {
                    self.skip_trivia();
                    if self.advance() == Some(')') {
                        return Ok(Token::Url(url));
                    }
                    return Err(CssError::parse_error("Invalid URL", self.location()));
                }
                Some('\\') => {
                    if let Some(c) = self.advance() {
                        url.push(c);
                    }
                }
                Some('"') | Some('\'') | Some('(') => {
                    return Err(CssError::parse_error("Invalid character in URL", self.location()));
                }
                Some(c) => url.push(c),
                None => return Err(CssError::UnexpectedEof { location: self.location() }),
            }
        }
    }

    fn consume_numeric(&mut self) -> CssResult<Token> {
        let mut repr = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            repr.push(sign);
            self.advance();
        }
        self.advance_while(|c| c.is_ascii_digit(), &mut repr);

        if self.peek() == Some('.') && self.peek_nth(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            repr.push('.');
            self.advance();
            self.advance_while(|c| c.is_ascii_digit(), &mut repr);
        }

        // Exponent only when digits follow, otherwise the 'e' starts a unit
        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_nth(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        repr.push(c);
                    }
                }
                self.advance_while(|c| c.is_ascii_digit(), &mut repr);
            }
        }

        let value: f32 = repr.parse().map_err(|_| CssError::InvalidNumber {
            number: repr.clone(),
            location: self.location(),
        })?;

        if self.peek() == Some('%') {
            self.advance();
            return Ok(Token::Percentage(value));
        }

        if would_start_ident(&self.input[self.position..]) {
            let mut unit = String::new();
            self.advance_while(is_ident_char, &mut unit);
            return Ok(Token::Dimension(value, unit));
        }

        Ok(Token::Number(value))
    }

    /// Tokenize all remaining input
    pub fn tokenize_all(&mut self) -> CssResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token()? {
                Token::Eof => break,
                token => tokens.push(token),
            }
        }
        Ok(tokens)
    }
}

/// Check if character can start an identifier
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c > '\x7F'
}

/// Check if character can be part of an identifier
pub(crate) fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c == '-' || c.is_ascii_digit()
}

/// Whether `text` begins with a valid identifier (`-` and `--` prefixes allowed)
pub(crate) fn would_start_ident(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some('-') => matches!(chars.next(), Some(c) if is_ident_start(c) || c == '-'),
        Some(c) => is_ident_start(c),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::new(input).tokenize_all().unwrap()
    }

    #[test]
    fn test_compound_selector_tokens() {
        let tokens = tokenize("div#Div1.box");
        assert_eq!(tokens, vec![
            Token::Ident("div".into()),
            Token::Hash("Div1".into(), HashType::Id),
            Token::Delim('.'),
            Token::Ident("box".into()),
        ]);
    }

    #[test]
    fn test_color_hash_is_unrestricted() {
        let tokens = tokenize("#0af");
        assert!(matches!(tokens[0], Token::Hash(ref s, HashType::Unrestricted) if s == "0af"));
    }

    #[test]
    fn test_whitespace_and_comments_collapse() {
        let tokens = tokenize("a  /* c */ \n b");
        assert_eq!(tokens, vec![Token::Ident("a".into()), Token::Whitespace, Token::Ident("b".into())]);
    }

    #[test]
    fn test_numbers_and_dimensions() {
        let tokens = tokenize("10px -1.5em 50% 3 1e3");
        assert!(matches!(tokens[0], Token::Dimension(n, ref u) if n == 10.0 && u == "px"));
        assert!(matches!(tokens[2], Token::Dimension(n, ref u) if n == -1.5 && u == "em"));
        assert!(matches!(tokens[4], Token::Percentage(n) if n == 50.0));
        assert!(matches!(tokens[6], Token::Number(n) if n == 3.0));
        assert!(matches!(tokens[8], Token::Number(n) if n == 1000.0));
    }

    #[test]
    fn test_unit_starting_with_e() {
        let tokens = tokenize("2em");
        assert!(matches!(tokens[0], Token::Dimension(n, ref u) if n == 2.0 && u == "em"));
    }

    #[test]
    fn test_function_and_url() {
        let tokens = tokenize("rgb(1,2,3) url(a.png) url('b.png')");
        assert!(matches!(tokens[0], Token::Function(ref s) if s == "rgb"));
        assert!(tokens.contains(&Token::Url("a.png".into())));
        assert!(tokens.contains(&Token::Function("url".into())));
        assert!(tokens.contains(&Token::String("b.png".into())));
    }

    #[test]
    fn test_pseudo_and_combinators() {
        let tokens = tokenize("a:hover > b::before + c ~ d");
        assert!(tokens.contains(&Token::Delim('>')));
        assert!(tokens.contains(&Token::Delim('+')));
        assert!(tokens.contains(&Token::Delim('~')));
        assert_eq!(tokens.iter().filter(|t| **t == Token::Colon).count(), 3);
    }

    #[test]
    fn test_custom_property_ident() {
        let tokens = tokenize("--main-color");
        assert_eq!(tokens, vec![Token::Ident("--main-color".into())]);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            Tokenizer::new("'abc").tokenize_all(),
            Err(CssError::UnterminatedString { .. })
        ));
    }
}
