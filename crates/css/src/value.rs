//! CSS Value validation and normalization
//!
//! Values are checked against the kind of value their property accepts and
//! rewritten into the form a style engine reports back: colors as
//! `rgb()`/`rgba()`, lowercase keywords, unitless zero lengths as `0px`.

use crate::properties::{get_property_info, is_custom_property, LengthRules, ValueKind};
use crate::shorthand::split_components;
use crate::tokenizer::{Token, Tokenizer};

/// Keywords every property accepts
const CSS_WIDE_KEYWORDS: [&str; 3] = ["inherit", "initial", "unset"];

/// Length units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Cm,
    Mm,
    In,
    Pt,
    Pc,
    Ch,
    Ex,
}

impl LengthUnit {
    /// Parse a unit string
    pub fn from_str(s: &str) -> Option<Self> {
        let unit = match s.to_ascii_lowercase().as_str() {
            "px" => LengthUnit::Px,
            "em" => LengthUnit::Em,
            "rem" => LengthUnit::Rem,
            "vw" => LengthUnit::Vw,
            "vh" => LengthUnit::Vh,
            "vmin" => LengthUnit::Vmin,
            "vmax" => LengthUnit::Vmax,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            "in" => LengthUnit::In,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            "ch" => LengthUnit::Ch,
            "ex" => LengthUnit::Ex,
            _ => return None,
        };
        Some(unit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Em => "em",
            LengthUnit::Rem => "rem",
            LengthUnit::Vw => "vw",
            LengthUnit::Vh => "vh",
            LengthUnit::Vmin => "vmin",
            LengthUnit::Vmax => "vmax",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::In => "in",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
            LengthUnit::Ch => "ch",
            LengthUnit::Ex => "ex",
        }
    }
}

/// Color value (RGBA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    fn from_packed(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parse a hex color string (without #)
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Color::rgb(digit(0)?, digit(1)?, digit(2)?)),
            4 => Some(Color::rgba(digit(0)?, digit(1)?, digit(2)?, digit(3)?)),
            6 => Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Color::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Get a named color
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name == "transparent" {
            return Some(Color::rgba(0, 0, 0, 0));
        }
        NAMED_COLORS
            .binary_search_by(|(n, _)| n.cmp(&name.as_str()))
            .ok()
            .map(|i| Color::from_packed(NAMED_COLORS[i].1))
    }

    /// Parse any supported color notation
    pub fn parse(text: &str) -> Option<Self> {
        let tokens = significant_tokens(text)?;
        match tokens.as_slice() {
            [Token::Hash(hex, _)] => Color::from_hex(hex),
            [Token::Ident(name)] => Color::from_name(name),
            [Token::Function(name), args @ .., Token::RightParen] => {
                let args: Vec<&Token> = args
                    .iter()
                    .filter(|t| !matches!(t, Token::Whitespace | Token::Comma | Token::Delim('/')))
                    .collect();
                match name.to_ascii_lowercase().as_str() {
                    "rgb" | "rgba" => parse_rgb(&args),
                    "hsl" | "hsla" => parse_hsl(&args),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Serialize as `rgb(r, g, b)` or `rgba(r, g, b, a)`
    pub fn to_css_string(&self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, format_alpha(self.a))
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgb(0, 0, 0)
    }
}

/// Shortest decimal alpha that maps back to the same byte
fn format_alpha(a: u8) -> String {
    for places in 2..=3 {
        let scale = 10f32.powi(places);
        let rounded = (a as f32 / 255.0 * scale).round() / scale;
        if (rounded * 255.0).round() as u8 == a {
            return format_number(rounded);
        }
    }
    format_number(a as f32 / 255.0)
}

fn parse_rgb(args: &[&Token]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let channel = |t: &Token| match t {
        Token::Number(n) => Some(n.round().clamp(0.0, 255.0) as u8),
        Token::Percentage(p) => Some((p / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8),
        _ => None,
    };
    let a = match args.get(3) {
        Some(t) => parse_alpha(t)?,
        None => 255,
    };
    Some(Color::rgba(channel(args[0])?, channel(args[1])?, channel(args[2])?, a))
}

fn parse_alpha(token: &Token) -> Option<u8> {
    match token {
        Token::Number(n) => Some((n.clamp(0.0, 1.0) * 255.0).round() as u8),
        Token::Percentage(p) => Some((p.clamp(0.0, 100.0) / 100.0 * 255.0).round() as u8),
        _ => None,
    }
}

fn parse_hsl(args: &[&Token]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let h = match args[0] {
        Token::Number(n) => *n,
        Token::Dimension(n, unit) if unit.eq_ignore_ascii_case("deg") => *n,
        Token::Dimension(n, unit) if unit.eq_ignore_ascii_case("turn") => *n * 360.0,
        _ => return None,
    };
    let fraction = |t: &Token| match t {
        Token::Percentage(p) => Some(p / 100.0),
        _ => None,
    };
    let s = fraction(args[1])?;
    let l = fraction(args[2])?;
    let a = match args.get(3) {
        Some(t) => parse_alpha(t)?,
        None => 255,
    };

    let (r, g, b) = hsl_to_rgb(h, s, l);
    let byte = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(Color::rgba(byte(r), byte(g), byte(b), a))
}

/// Convert HSL to RGB
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Format a number the way serialized CSS does: no trailing `.0`
pub fn format_number(n: f32) -> String {
    if n == n.trunc() && n.abs() < 1e9 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Tokens of `text` without leading/trailing whitespace; `None` on a
/// tokenizer error
fn significant_tokens(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Tokenizer::new(text).tokenize_all().ok()?;
    while tokens.last() == Some(&Token::Whitespace) {
        tokens.pop();
    }
    let leading = tokens.iter().take_while(|t| **t == Token::Whitespace).count();
    tokens.drain(..leading);
    Some(tokens)
}

fn single_token(text: &str) -> Option<Token> {
    let mut tokens = significant_tokens(text)?;
    if tokens.len() == 1 {
        tokens.pop()
    } else {
        None
    }
}

/// Braces, semicolons, bangs and unbalanced parentheses never belong in a value
fn is_well_formed(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '{' | '}' | ';' | '!' => return false,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Validate `text` as a value of `property` and return its normalized form.
///
/// Returns `None` when the property is unknown or the value is rejected;
/// this is the equivalent of a style engine reading back an empty value.
pub fn normalize_value(property: &str, text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || !is_well_formed(text) {
        return None;
    }
    if is_custom_property(property) {
        return Some(text.to_string());
    }

    let info = get_property_info(property)?;
    let lower = text.to_ascii_lowercase();
    if CSS_WIDE_KEYWORDS.contains(&lower.as_str()) {
        return Some(lower);
    }
    normalize_kind(&info.kind, text)
}

fn normalize_kind(kind: &ValueKind, text: &str) -> Option<String> {
    match kind {
        ValueKind::Color => normalize_color(text),
        ValueKind::Length(rules) => normalize_length(rules, text),
        ValueKind::Keyword(keywords) => match single_token(text)? {
            Token::Ident(name) => match_keyword(keywords, &name),
            _ => None,
        },
        ValueKind::Number { keywords, integer, negative } => match single_token(text)? {
            Token::Ident(name) => match_keyword(keywords, &name),
            Token::Number(n) if (*negative || n >= 0.0) && (!*integer || n == n.trunc()) => {
                Some(format_number(n))
            }
            _ => None,
        },
        ValueKind::Multiple(inner, max) => {
            let parts = split_components(text);
            if parts.is_empty() || parts.len() > *max {
                return None;
            }
            let normalized: Option<Vec<String>> = parts.iter().map(|p| normalize_kind(inner, p)).collect();
            normalized.map(|n| n.join(" "))
        }
        ValueKind::FreeForm => {
            // Still has to tokenize cleanly
            significant_tokens(text)?;
            Some(split_components(text).join(" "))
        }
    }
}

fn match_keyword(keywords: &[&str], name: &str) -> Option<String> {
    keywords
        .iter()
        .find(|k| k.eq_ignore_ascii_case(name))
        .map(|k| k.to_string())
}

fn normalize_color(text: &str) -> Option<String> {
    if let Some(Token::Ident(name)) = single_token(text) {
        let lower = name.to_ascii_lowercase();
        if lower == "currentcolor" || Color::from_name(&lower).is_some() {
            return Some(lower);
        }
        return None;
    }
    Color::parse(text).map(|c| c.to_css_string())
}

fn normalize_length(rules: &LengthRules, text: &str) -> Option<String> {
    let sign_ok = |n: f32| rules.negative || n >= 0.0;
    match single_token(text)? {
        Token::Ident(name) => match_keyword(rules.keywords, &name),
        Token::Dimension(n, unit) if sign_ok(n) => {
            LengthUnit::from_str(&unit).map(|u| format!("{}{}", format_number(n), u.as_str()))
        }
        Token::Percentage(n) if rules.percent && sign_ok(n) => Some(format!("{}%", format_number(n))),
        Token::Number(n) if rules.number && sign_ok(n) => Some(format_number(n)),
        Token::Number(n) if n == 0.0 => Some("0px".to_string()),
        _ => None,
    }
}

/// CSS named colors, sorted by name
static NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff), ("antiquewhite", 0xfaebd7), ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4), ("azure", 0xf0ffff), ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4), ("black", 0x000000), ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff), ("blueviolet", 0x8a2be2), ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887), ("cadetblue", 0x5f9ea0), ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e), ("coral", 0xff7f50), ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc), ("crimson", 0xdc143c), ("cyan", 0x00ffff),
    ("darkblue", 0x00008b), ("darkcyan", 0x008b8b), ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9), ("darkgreen", 0x006400), ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b), ("darkmagenta", 0x8b008b), ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00), ("darkorchid", 0x9932cc), ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a), ("darkseagreen", 0x8fbc8f), ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f), ("darkslategrey", 0x2f4f4f), ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3), ("deeppink", 0xff1493), ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969), ("dimgrey", 0x696969), ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222), ("floralwhite", 0xfffaf0), ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff), ("gainsboro", 0xdcdcdc), ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700), ("goldenrod", 0xdaa520), ("gray", 0x808080),
    ("green", 0x008000), ("greenyellow", 0xadff2f), ("grey", 0x808080),
    ("honeydew", 0xf0fff0), ("hotpink", 0xff69b4), ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082), ("ivory", 0xfffff0), ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa), ("lavenderblush", 0xfff0f5), ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd), ("lightblue", 0xadd8e6), ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff), ("lightgoldenrodyellow", 0xfafad2), ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90), ("lightgrey", 0xd3d3d3), ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a), ("lightseagreen", 0x20b2aa), ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899), ("lightslategrey", 0x778899), ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0), ("lime", 0x00ff00), ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6), ("magenta", 0xff00ff), ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa), ("mediumblue", 0x0000cd), ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db), ("mediumseagreen", 0x3cb371), ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a), ("mediumturquoise", 0x48d1cc), ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970), ("mintcream", 0xf5fffa), ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5), ("navajowhite", 0xffdead), ("navy", 0x000080),
    ("oldlace", 0xfdf5e6), ("olive", 0x808000), ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500), ("orangered", 0xff4500), ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa), ("palegreen", 0x98fb98), ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093), ("papayawhip", 0xffefd5), ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f), ("pink", 0xffc0cb), ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6), ("purple", 0x800080), ("rebeccapurple", 0x663399),
    ("red", 0xff0000), ("rosybrown", 0xbc8f8f), ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513), ("salmon", 0xfa8072), ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57), ("seashell", 0xfff5ee), ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0), ("skyblue", 0x87ceeb), ("slateblue", 0x6a5acd),
    ("slategray", 0x708090), ("slategrey", 0x708090), ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f), ("steelblue", 0x4682b4), ("tan", 0xd2b48c),
    ("teal", 0x008080), ("thistle", 0xd8bfd8), ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0), ("violet", 0xee82ee), ("wheat", 0xf5deb3),
    ("white", 0xffffff), ("whitesmoke", 0xf5f5f5), ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];
