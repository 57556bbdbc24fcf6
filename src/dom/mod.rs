//! The live document as an owned tree.
//!
//! The live editor holds presentational markup that may have drifted far from
//! what the parser produced. This module reads that markup into a [`Node`]
//! tree for the walker and the page exporter, and writes a tree back out for
//! the styled-markup exporter.

mod entities;
mod reader;
mod tree;
mod writer;

pub use reader::{ROOT_TAG, parse_document, parse_fragment};
pub use tree::{Element, Node};
pub use writer::{inner_html, outer_html};
