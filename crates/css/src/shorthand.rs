//! Shorthand property table
//!
//! Maps each shorthand to the properties it sets directly. Lookups are
//! transitive in both directions: `border` expands to `border-top`, which in
//! turn expands to `border-top-width`.

const SHORTHANDS: &[(&str, &[&str])] = &[
    ("margin", &["margin-top", "margin-right", "margin-bottom", "margin-left"]),
    ("padding", &["padding-top", "padding-right", "padding-bottom", "padding-left"]),
    ("border", &["border-top", "border-right", "border-bottom", "border-left", "border-width", "border-style", "border-color"]),
    ("border-top", &["border-top-width", "border-top-style", "border-top-color"]),
    ("border-right", &["border-right-width", "border-right-style", "border-right-color"]),
    ("border-bottom", &["border-bottom-width", "border-bottom-style", "border-bottom-color"]),
    ("border-left", &["border-left-width", "border-left-style", "border-left-color"]),
    ("border-width", &["border-top-width", "border-right-width", "border-bottom-width", "border-left-width"]),
    ("border-style", &["border-top-style", "border-right-style", "border-bottom-style", "border-left-style"]),
    ("border-color", &["border-top-color", "border-right-color", "border-bottom-color", "border-left-color"]),
    ("outline", &["outline-width", "outline-style", "outline-color"]),
    ("background", &[
        "background-color", "background-image", "background-repeat", "background-position",
        "background-attachment", "background-size",
    ]),
    ("font", &["font-style", "font-variant", "font-weight", "font-size", "line-height", "font-family"]),
    ("list-style", &["list-style-type", "list-style-position", "list-style-image"]),
    ("text-decoration", &["text-decoration-line", "text-decoration-style", "text-decoration-color"]),
    ("flex", &["flex-grow", "flex-shrink", "flex-basis"]),
    ("flex-flow", &["flex-direction", "flex-wrap"]),
    ("overflow", &["overflow-x", "overflow-y"]),
    ("gap", &["row-gap", "column-gap"]),
];

/// Shorthands whose value is a top/right/bottom/left list of up to four parts
const BOX_SHORTHANDS: &[&str] = &["margin", "padding", "border-width", "border-style", "border-color"];

/// Whether `property` is a shorthand
pub fn is_shorthand(property: &str) -> bool {
    direct_longhands(property).is_some()
}

fn direct_longhands(property: &str) -> Option<&'static [&'static str]> {
    SHORTHANDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
        .map(|(_, longhands)| *longhands)
}

/// Every property a shorthand sets, nested shorthands included
pub fn longhands(property: &str) -> Vec<&'static str> {
    let mut result = Vec::new();
    let mut pending: Vec<&'static str> = direct_longhands(property).map(|l| l.to_vec()).unwrap_or_default();
    while let Some(name) = pending.pop() {
        if result.contains(&name) {
            continue;
        }
        result.push(name);
        if let Some(nested) = direct_longhands(name) {
            pending.extend_from_slice(nested);
        }
    }
    result
}

/// Every shorthand that sets `property`, directly or through another shorthand
pub fn shorthands_for(property: &str) -> Vec<&'static str> {
    let mut result: Vec<&'static str> = Vec::new();
    let mut pending: Vec<String> = vec![property.to_ascii_lowercase()];
    while let Some(name) = pending.pop() {
        for (shorthand, longhands) in SHORTHANDS {
            if longhands.contains(&name.as_str()) && !result.contains(shorthand) {
                result.push(*shorthand);
                pending.push(shorthand.to_string());
            }
        }
    }
    result
}

/// Properties whose declaration affects `property`: the property itself, its
/// longhands and the shorthands that include it
pub fn related_properties(property: &str) -> Vec<String> {
    let mut related = vec![property.to_ascii_lowercase()];
    related.extend(longhands(property).into_iter().map(str::to_string));
    related.extend(shorthands_for(property).into_iter().map(str::to_string));
    related
}

/// Value a box shorthand implies for one of its longhands.
///
/// `margin: 1px 2px` gives `2px` for `margin-left`. Returns `None` when the
/// longhand is not one of the shorthand's four sides.
pub fn box_component(shorthand: &str, value: &str, longhand: &str) -> Option<String> {
    if !BOX_SHORTHANDS.iter().any(|s| s.eq_ignore_ascii_case(shorthand)) {
        return None;
    }
    let side = direct_longhands(shorthand)?
        .iter()
        .position(|l| l.eq_ignore_ascii_case(longhand))?;

    let parts = split_components(value);
    let index = match (parts.len(), side) {
        (1, _) => 0,
        (2, 0) | (2, 2) => 0,
        (2, _) => 1,
        (3, 0) => 0,
        (3, 1) | (3, 3) => 1,
        (3, _) => 2,
        (4, side) => side,
        _ => return None,
    };
    parts.get(index).map(|p| p.to_string())
}

/// Split a value on whitespace outside parentheses
pub(crate) fn split_components(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        parts.push(&value[s..]);
    }
    parts
}
