//! Capability tags for presentational elements.
//!
//! The walker never trusts a fixed schema. Each element is tagged with what it
//! can do, and anything unrecognised falls through to the wrapper or leaf
//! paths.

use crate::block::{Alignment, SizeTier};
use crate::dom::Element;

/// Tags that make their parent a wrapper rather than a leaf.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "table", "blockquote", "hr",
    "img", "pre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Image,
    Rule,
    LineBreak,
    /// Level already collapsed to 1..=3.
    Heading(u8),
    List { ordered: bool },
    Table,
    Blockquote,
    Preformatted,
    Wrapper,
    Leaf,
}

pub fn classify(el: &Element) -> NodeKind {
    match el.tag.as_str() {
        "img" => NodeKind::Image,
        "hr" => NodeKind::Rule,
        "br" => NodeKind::LineBreak,
        "h1" => NodeKind::Heading(1),
        "h2" => NodeKind::Heading(2),
        "h3" | "h4" | "h5" | "h6" => NodeKind::Heading(3),
        "ul" => NodeKind::List { ordered: false },
        "ol" => NodeKind::List { ordered: true },
        "table" => NodeKind::Table,
        "blockquote" => NodeKind::Blockquote,
        "pre" => NodeKind::Preformatted,
        _ if has_block_children(el) => NodeKind::Wrapper,
        _ => NodeKind::Leaf,
    }
}

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Whether any direct child is a block-level element.
pub fn has_block_children(el: &Element) -> bool {
    el.element_children().any(|child| is_block_tag(&child.tag))
}

/// Alignment declared on the element itself, by class or inline style.
pub fn own_alignment(el: &Element) -> Option<Alignment> {
    if el.has_class(Alignment::Center.class_name()) {
        return Some(Alignment::Center);
    }
    if el.has_class(Alignment::Right.class_name()) {
        return Some(Alignment::Right);
    }
    match el.style("text-align").and_then(Alignment::from_css) {
        Some(Alignment::Left) | None => None,
        other => other,
    }
}

/// The element's own alignment, else its direct parent's, else left.
pub fn resolve_alignment(el: &Element, parent: Option<&Element>) -> Alignment {
    own_alignment(el)
        .or_else(|| parent.and_then(own_alignment))
        .unwrap_or_default()
}

/// Size tier from the element's classes; the default tier when none is set.
pub fn size_tier(el: &Element) -> SizeTier {
    el.classes()
        .find_map(SizeTier::from_class)
        .unwrap_or_default()
}
