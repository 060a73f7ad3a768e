//! Style engine error types

use stylewright_css::CssError;
use stylewright_dom::{DomError, NodeId};
use thiserror::Error;

use crate::stylesheet::{RuleId, SheetId};

/// Style operation result type
pub type StyleResult<T> = Result<T, StyleError>;

/// Style engine errors
#[derive(Debug, Error)]
pub enum StyleError {
    #[error(transparent)]
    Css(#[from] CssError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("No active document")]
    NoActiveDocument,

    #[error("Rule not found: {0:?}")]
    RuleNotFound(RuleId),

    #[error("Stylesheet not found: {0:?}")]
    SheetNotFound(SheetId),

    #[error("{0} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid rule text '{0}'")]
    InvalidRuleText(String),

    #[error("Index {index} out of range for sheet with {len} rules")]
    IndexOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StyleError::NoActiveDocument.to_string(), "No active document");
        assert_eq!(
            StyleError::IndexOutOfRange { index: 4, len: 2 }.to_string(),
            "Index 4 out of range for sheet with 2 rules"
        );
        let err: StyleError = DomError::NodeNotFound(7).into();
        assert_eq!(err.to_string(), "Node not found: 7");
    }
}
