//! Stylewright DOM
//!
//! The element tree that style rules are matched against. Nodes live in an
//! arena owned by [`DomTree`] and are addressed by [`NodeId`].

mod node;
mod tree;
mod error;
mod query;

pub use node::{Node, NodeId, NodeType, ElementData};
pub use tree::DomTree;
pub use error::{DomError, DomResult};
pub use query::Queryable;
