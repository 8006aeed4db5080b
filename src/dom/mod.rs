//! DOM-like host tree.
//!
//! A minimal element tree with attribute nodes, a connected root and
//! viewport geometry. It is what the pool manufactures clones into and what
//! the viewport detector measures.

mod document;

pub use document::*;
