//! CSS Property Definitions
//!
//! Known properties with the kind of value they accept, whether they inherit
//! and their initial value. Unknown property names are rejected by the value
//! normalizer, custom properties (`--name`) excepted.

/// Accepted shape of a length-like value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRules {
    /// Keywords accepted instead of a length
    pub keywords: &'static [&'static str],
    pub negative: bool,
    pub percent: bool,
    /// Plain numbers (e.g. `line-height: 1.5`)
    pub number: bool,
}

/// The kind of value a property accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Length(LengthRules),
    Keyword(&'static [&'static str]),
    Number {
        keywords: &'static [&'static str],
        integer: bool,
        negative: bool,
    },
    /// One to `max` whitespace-separated values of the inner kind
    Multiple(&'static ValueKind, usize),
    /// Anything syntactically well formed
    FreeForm,
}

/// Information about a CSS property
#[derive(Debug)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub kind: ValueKind,
    pub inherited: bool,
    /// Initial value in normalized form; empty for shorthands
    pub initial: &'static str,
}

impl PropertyInfo {
    const fn new(name: &'static str, kind: ValueKind, inherited: bool, initial: &'static str) -> Self {
        Self { name, kind, inherited, initial }
    }
}

const fn length(keywords: &'static [&'static str], negative: bool, percent: bool) -> ValueKind {
    ValueKind::Length(LengthRules { keywords, negative, percent, number: false })
}

const fn keyword(keywords: &'static [&'static str]) -> ValueKind {
    ValueKind::Keyword(keywords)
}

const NONE: &[&str] = &[];
const AUTO: &[&str] = &["auto"];
const BORDER_WIDTH_KW: &[&str] = &["thin", "medium", "thick"];
const BORDER_STYLE_KW: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];
const OVERFLOW_KW: &[&str] = &["visible", "hidden", "scroll", "auto", "clip"];
const FONT_SIZE_KW: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "larger", "smaller",
];
const ALIGN_KW: &[&str] = &[
    "normal", "stretch", "center", "start", "end", "flex-start", "flex-end", "baseline",
    "space-between", "space-around", "space-evenly", "left", "right",
];

const MARGIN_EDGE: ValueKind = length(AUTO, true, true);
const PADDING_EDGE: ValueKind = length(NONE, false, true);
const BORDER_WIDTH_EDGE: ValueKind = length(BORDER_WIDTH_KW, false, false);
const BORDER_STYLE_EDGE: ValueKind = keyword(BORDER_STYLE_KW);
const COLOR_EDGE: ValueKind = ValueKind::Color;
const RADIUS_EDGE: ValueKind = length(NONE, false, true);
const GAP_EDGE: ValueKind = length(&["normal"], false, true);

use ValueKind::{Color, FreeForm, Multiple};

static PROPERTIES: &[PropertyInfo] = &[
    // Inherited (text and font related)
    PropertyInfo::new("color", Color, true, "rgb(0, 0, 0)"),
    PropertyInfo::new("cursor", keyword(&[
        "auto", "default", "pointer", "text", "move", "wait", "help", "crosshair", "not-allowed",
        "grab", "grabbing", "none",
    ]), true, "auto"),
    PropertyInfo::new("direction", keyword(&["ltr", "rtl"]), true, "ltr"),
    PropertyInfo::new("font", FreeForm, true, ""),
    PropertyInfo::new("font-family", FreeForm, true, "serif"),
    PropertyInfo::new("font-size", length(FONT_SIZE_KW, false, true), true, "16px"),
    PropertyInfo::new("font-style", keyword(&["normal", "italic", "oblique"]), true, "normal"),
    PropertyInfo::new("font-variant", keyword(&["normal", "small-caps"]), true, "normal"),
    PropertyInfo::new("font-weight", ValueKind::Number {
        keywords: &["normal", "bold", "bolder", "lighter"],
        integer: true,
        negative: false,
    }, true, "normal"),
    PropertyInfo::new("letter-spacing", length(&["normal"], true, false), true, "normal"),
    PropertyInfo::new("line-height", ValueKind::Length(LengthRules {
        keywords: &["normal"],
        negative: false,
        percent: true,
        number: true,
    }), true, "normal"),
    PropertyInfo::new("list-style", FreeForm, true, ""),
    PropertyInfo::new("list-style-image", FreeForm, true, "none"),
    PropertyInfo::new("list-style-position", keyword(&["inside", "outside"]), true, "outside"),
    PropertyInfo::new("list-style-type", keyword(&[
        "disc", "circle", "square", "decimal", "lower-alpha", "upper-alpha", "lower-roman",
        "upper-roman", "none",
    ]), true, "disc"),
    PropertyInfo::new("quotes", FreeForm, true, "auto"),
    PropertyInfo::new("text-align", keyword(&["left", "right", "center", "justify", "start", "end"]), true, "start"),
    PropertyInfo::new("text-indent", length(NONE, true, true), true, "0px"),
    PropertyInfo::new("text-transform", keyword(&["none", "capitalize", "uppercase", "lowercase"]), true, "none"),
    PropertyInfo::new("visibility", keyword(&["visible", "hidden", "collapse"]), true, "visible"),
    PropertyInfo::new("white-space", keyword(&[
        "normal", "nowrap", "pre", "pre-wrap", "pre-line", "break-spaces",
    ]), true, "normal"),
    PropertyInfo::new("word-spacing", length(&["normal"], true, false), true, "normal"),

    // Box model and positioning
    PropertyInfo::new("display", keyword(&[
        "none", "inline", "block", "inline-block", "flex", "inline-flex", "grid", "inline-grid",
        "table", "table-row", "table-cell", "list-item", "contents",
    ]), false, "inline"),
    PropertyInfo::new("position", keyword(&["static", "relative", "absolute", "fixed", "sticky"]), false, "static"),
    PropertyInfo::new("top", length(AUTO, true, true), false, "auto"),
    PropertyInfo::new("right", length(AUTO, true, true), false, "auto"),
    PropertyInfo::new("bottom", length(AUTO, true, true), false, "auto"),
    PropertyInfo::new("left", length(AUTO, true, true), false, "auto"),
    PropertyInfo::new("float", keyword(&["none", "left", "right"]), false, "none"),
    PropertyInfo::new("clear", keyword(&["none", "left", "right", "both"]), false, "none"),
    PropertyInfo::new("z-index", ValueKind::Number { keywords: AUTO, integer: true, negative: true }, false, "auto"),
    PropertyInfo::new("overflow", keyword(OVERFLOW_KW), false, "visible"),
    PropertyInfo::new("overflow-x", keyword(OVERFLOW_KW), false, "visible"),
    PropertyInfo::new("overflow-y", keyword(OVERFLOW_KW), false, "visible"),
    PropertyInfo::new("width", length(AUTO, false, true), false, "auto"),
    PropertyInfo::new("height", length(AUTO, false, true), false, "auto"),
    PropertyInfo::new("min-width", length(AUTO, false, true), false, "auto"),
    PropertyInfo::new("min-height", length(AUTO, false, true), false, "auto"),
    PropertyInfo::new("max-width", length(&["none"], false, true), false, "none"),
    PropertyInfo::new("max-height", length(&["none"], false, true), false, "none"),
    PropertyInfo::new("box-sizing", keyword(&["content-box", "border-box"]), false, "content-box"),
    PropertyInfo::new("margin", Multiple(&MARGIN_EDGE, 4), false, ""),
    PropertyInfo::new("margin-top", MARGIN_EDGE, false, "0px"),
    PropertyInfo::new("margin-right", MARGIN_EDGE, false, "0px"),
    PropertyInfo::new("margin-bottom", MARGIN_EDGE, false, "0px"),
    PropertyInfo::new("margin-left", MARGIN_EDGE, false, "0px"),
    PropertyInfo::new("padding", Multiple(&PADDING_EDGE, 4), false, ""),
    PropertyInfo::new("padding-top", PADDING_EDGE, false, "0px"),
    PropertyInfo::new("padding-right", PADDING_EDGE, false, "0px"),
    PropertyInfo::new("padding-bottom", PADDING_EDGE, false, "0px"),
    PropertyInfo::new("padding-left", PADDING_EDGE, false, "0px"),

    // Borders and outline
    PropertyInfo::new("border", FreeForm, false, ""),
    PropertyInfo::new("border-top", FreeForm, false, ""),
    PropertyInfo::new("border-right", FreeForm, false, ""),
    PropertyInfo::new("border-bottom", FreeForm, false, ""),
    PropertyInfo::new("border-left", FreeForm, false, ""),
    PropertyInfo::new("border-width", Multiple(&BORDER_WIDTH_EDGE, 4), false, ""),
    PropertyInfo::new("border-top-width", BORDER_WIDTH_EDGE, false, "medium"),
    PropertyInfo::new("border-right-width", BORDER_WIDTH_EDGE, false, "medium"),
    PropertyInfo::new("border-bottom-width", BORDER_WIDTH_EDGE, false, "medium"),
    PropertyInfo::new("border-left-width", BORDER_WIDTH_EDGE, false, "medium"),
    PropertyInfo::new("border-style", Multiple(&BORDER_STYLE_EDGE, 4), false, ""),
    PropertyInfo::new("border-top-style", BORDER_STYLE_EDGE, false, "none"),
    PropertyInfo::new("border-right-style", BORDER_STYLE_EDGE, false, "none"),
    PropertyInfo::new("border-bottom-style", BORDER_STYLE_EDGE, false, "none"),
    PropertyInfo::new("border-left-style", BORDER_STYLE_EDGE, false, "none"),
    PropertyInfo::new("border-color", Multiple(&COLOR_EDGE, 4), false, ""),
    PropertyInfo::new("border-top-color", Color, false, "currentcolor"),
    PropertyInfo::new("border-right-color", Color, false, "currentcolor"),
    PropertyInfo::new("border-bottom-color", Color, false, "currentcolor"),
    PropertyInfo::new("border-left-color", Color, false, "currentcolor"),
    PropertyInfo::new("border-radius", Multiple(&RADIUS_EDGE, 4), false, "0px"),
    PropertyInfo::new("outline", FreeForm, false, ""),
    PropertyInfo::new("outline-width", BORDER_WIDTH_EDGE, false, "medium"),
    PropertyInfo::new("outline-style", BORDER_STYLE_EDGE, false, "none"),
    PropertyInfo::new("outline-color", Color, false, "currentcolor"),

    // Backgrounds and text decoration
    PropertyInfo::new("background", FreeForm, false, ""),
    PropertyInfo::new("background-color", Color, false, "rgba(0, 0, 0, 0)"),
    PropertyInfo::new("background-image", FreeForm, false, "none"),
    PropertyInfo::new("background-repeat", keyword(&[
        "repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round",
    ]), false, "repeat"),
    PropertyInfo::new("background-position", FreeForm, false, "0% 0%"),
    PropertyInfo::new("background-attachment", keyword(&["scroll", "fixed", "local"]), false, "scroll"),
    PropertyInfo::new("background-size", FreeForm, false, "auto"),
    PropertyInfo::new("vertical-align", length(&[
        "baseline", "sub", "super", "top", "text-top", "middle", "bottom", "text-bottom",
    ], true, true), false, "baseline"),
    PropertyInfo::new("text-decoration", FreeForm, false, "none"),
    PropertyInfo::new("text-decoration-line", keyword(&["none", "underline", "overline", "line-through"]), false, "none"),
    PropertyInfo::new("text-decoration-style", keyword(&["solid", "double", "dotted", "dashed", "wavy"]), false, "solid"),
    PropertyInfo::new("text-decoration-color", Color, false, "currentcolor"),
    PropertyInfo::new("content", FreeForm, false, "normal"),

    // Effects
    PropertyInfo::new("opacity", ValueKind::Number { keywords: NONE, integer: false, negative: false }, false, "1"),
    PropertyInfo::new("transform", FreeForm, false, "none"),
    PropertyInfo::new("transition", FreeForm, false, ""),
    PropertyInfo::new("animation", FreeForm, false, ""),

    // Flexbox
    PropertyInfo::new("flex", FreeForm, false, ""),
    PropertyInfo::new("flex-direction", keyword(&["row", "row-reverse", "column", "column-reverse"]), false, "row"),
    PropertyInfo::new("flex-wrap", keyword(&["nowrap", "wrap", "wrap-reverse"]), false, "nowrap"),
    PropertyInfo::new("flex-flow", FreeForm, false, ""),
    PropertyInfo::new("flex-grow", ValueKind::Number { keywords: NONE, integer: false, negative: false }, false, "0"),
    PropertyInfo::new("flex-shrink", ValueKind::Number { keywords: NONE, integer: false, negative: false }, false, "1"),
    PropertyInfo::new("flex-basis", length(&["auto", "content"], false, true), false, "auto"),
    PropertyInfo::new("justify-content", keyword(ALIGN_KW), false, "normal"),
    PropertyInfo::new("align-items", keyword(ALIGN_KW), false, "normal"),
    PropertyInfo::new("align-self", keyword(&[
        "auto", "normal", "stretch", "center", "start", "end", "flex-start", "flex-end", "baseline",
    ]), false, "auto"),
    PropertyInfo::new("align-content", keyword(ALIGN_KW), false, "normal"),
    PropertyInfo::new("order", ValueKind::Number { keywords: NONE, integer: true, negative: true }, false, "0"),
    PropertyInfo::new("gap", Multiple(&GAP_EDGE, 2), false, ""),
    PropertyInfo::new("row-gap", GAP_EDGE, false, "normal"),
    PropertyInfo::new("column-gap", GAP_EDGE, false, "normal"),
];

/// Look up a property by name (case-insensitive)
pub fn get_property_info(name: &str) -> Option<&'static PropertyInfo> {
    PROPERTIES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Whether the name is a custom property (`--name`)
pub fn is_custom_property(name: &str) -> bool {
    name.len() > 2 && name.starts_with("--")
}

/// Whether the property is known (or custom)
pub fn is_known_property(name: &str) -> bool {
    is_custom_property(name) || get_property_info(name).is_some()
}

/// Check if a property should be inherited
pub fn is_inherited(property: &str) -> bool {
    get_property_info(property).map(|p| p.inherited).unwrap_or(false)
}

/// Initial value of a property, `None` for unknown properties and shorthands
pub fn initial_value(property: &str) -> Option<&'static str> {
    get_property_info(property)
        .map(|p| p.initial)
        .filter(|v| !v.is_empty())
}

/// All known property names
pub fn property_names() -> impl Iterator<Item = &'static str> {
    PROPERTIES.iter().map(|p| p.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherited_properties() {
        assert!(is_inherited("color"));
        assert!(is_inherited("font-family"));
        assert!(is_inherited("line-height"));
        assert!(is_inherited("text-align"));
    }

    #[test]
    fn test_not_inherited_properties() {
        assert!(!is_inherited("display"));
        assert!(!is_inherited("margin"));
        assert!(!is_inherited("width"));
        assert!(!is_inherited("background-color"));
        assert!(!is_inherited("no-such-property"));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!(get_property_info("COLOR").map(|p| p.name), Some("color"));
        assert!(is_known_property("Margin-Top"));
    }

    #[test]
    fn test_custom_properties() {
        assert!(is_known_property("--brand-color"));
        assert!(!is_known_property("--"));
        assert!(!is_known_property("colour"));
    }

    #[test]
    fn test_initial_values() {
        assert_eq!(initial_value("margin-left"), Some("0px"));
        assert_eq!(initial_value("background-color"), Some("rgba(0, 0, 0, 0)"));
        assert_eq!(initial_value("margin"), None);
    }

    #[test]
    fn test_property_names_are_unique_and_lowercase() {
        let names: Vec<&str> = property_names().collect();
        for (i, name) in names.iter().enumerate() {
            assert_eq!(*name, name.to_ascii_lowercase());
            assert!(!names[i + 1..].contains(name), "duplicate {}", name);
        }
    }
}
