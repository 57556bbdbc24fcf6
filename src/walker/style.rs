//! Inline style accumulation.
//!
//! A [`RunStyle`] is passed down by value. Each formatting element returns a
//! new style with its flag set, so siblings never see each other's styling.

use super::model::{Run, RunStyle};
use crate::dom::{Element, Node};

pub const MONO_FONT: &str = "Consolas";
pub const CODE_SHADING: &str = "F8FAFC";
pub const CODE_COLOR: &str = "4F46E5";
pub const QUOTE_COLOR: &str = "475569";
pub const HEADER_SHADING: &str = "F1F5F9";

impl RunStyle {
    /// Style for inline code and preformatted text.
    pub fn code() -> Self {
        Self::default().with_code()
    }

    /// Style for flattened blockquote text.
    pub fn quote() -> Self {
        Self {
            italic: true,
            color: Some(QUOTE_COLOR.to_string()),
            ..Self::default()
        }
    }

    fn with_code(mut self) -> Self {
        self.font = Some(MONO_FONT.to_string());
        self.shading = Some(CODE_SHADING.to_string());
        self.color = Some(CODE_COLOR.to_string());
        self
    }

    /// Style inside `el`, from its tag and inline CSS.
    #[must_use]
    pub fn enter(&self, el: &Element) -> Self {
        let mut next = self.clone();
        match el.tag.as_str() {
            "b" | "strong" => next.bold = true,
            "i" | "em" => next.italic = true,
            "u" => next.underline = true,
            "s" | "strike" | "del" => next.strike = true,
            "code" => next = next.with_code(),
            _ => {}
        }

        // The live editor's formatting commands may emit spans instead of tags
        if let Some(weight) = el.style("font-weight") {
            next.bold |= weight.eq_ignore_ascii_case("bold")
                || weight.parse::<u16>().is_ok_and(|w| w >= 600);
        }
        if let Some(style) = el.style("font-style") {
            next.italic |= style.eq_ignore_ascii_case("italic");
        }
        if let Some(decoration) = el.style("text-decoration") {
            let decoration = decoration.to_ascii_lowercase();
            next.underline |= decoration.contains("underline");
            next.strike |= decoration.contains("line-through");
        }
        next
    }
}

/// Collect the runs of everything inside `el`.
pub fn collect_runs(el: &Element, style: &RunStyle) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in &el.children {
        push_runs(child, style, &mut runs);
    }
    runs
}

/// Append the runs of one node. Images are dropped; line breaks become
/// break runs; any other element is descended with its style applied.
pub fn push_runs(node: &Node, style: &RunStyle, runs: &mut Vec<Run>) {
    match node {
        Node::Text(text) => {
            let text = flatten_newlines(text);
            if !text.is_empty() {
                runs.push(Run::new(text, style.clone()));
            }
        }
        Node::Element(el) => match el.tag.as_str() {
            "br" => runs.push(Run::line_break(style.clone())),
            "img" => {}
            _ => {
                let inner = style.enter(el);
                for child in &el.children {
                    push_runs(child, &inner, runs);
                }
            }
        },
    }
}

/// Newlines in inline text render as spaces.
pub fn flatten_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
