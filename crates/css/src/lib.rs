//! Stylewright CSS
//!
//! The text layer of the style engine: tokenizer, selector parser,
//! stylesheet and declaration parsing, value normalization, property and
//! shorthand tables, and selector specificity.

pub mod declaration;
pub mod error;
pub mod parser;
pub mod properties;
pub mod selector;
pub mod shorthand;
pub mod specificity;
pub mod tokenizer;
pub mod value;

pub use declaration::{Declaration, DeclarationBlock};
pub use error::{CssError, CssResult, SourceLocation};
pub use parser::{parse_declarations, parse_rule, parse_stylesheet, RuleText};
pub use properties::{initial_value, is_inherited, is_known_property};
pub use selector::{normalize_selector_text, split_selector_list, AttributeOp, Combinator, Compound, Selector, SimpleSelector};
pub use shorthand::{is_shorthand, longhands, related_properties, shorthands_for};
pub use specificity::{
    calculate_specificity, compare_specificity, get_specificity, SelectorSpecificity, Specificity,
    SpecificityList,
};
pub use tokenizer::{Token, Tokenizer};
pub use value::{normalize_value, Color};
