//! Serialize a tree back to markup.

use super::tree::{Element, Node};

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "col", "wbr"];

/// Markup of the element's children, without the element itself.
pub fn inner_html(el: &Element) -> String {
    let mut out = String::with_capacity(4096);
    for child in &el.children {
        serialize_node(child, &mut out);
    }
    out
}

/// Markup of the element including its own tag.
pub fn outer_html(el: &Element) -> String {
    let mut out = String::new();
    serialize_element(el, &mut out);
    out
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(el) => serialize_element(el, out),
    }
}

fn serialize_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (key, value) in &el.attrs {
        out.push_str(&format!(r#" {}="{}""#, key, escape_attr(value)));
    }

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        out.push_str(" />");
        return;
    }

    out.push('>');
    for child in &el.children {
        serialize_node(child, out);
    }
    out.push_str(&format!("</{}>", el.tag));
}

fn escape_text(text: &str) -> String {
    escape_markup(text, false)
}

fn escape_attr(text: &str) -> String {
    escape_markup(text, true)
}

fn escape_markup(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_children_only() {
        let tree = parse_fragment("<p>a <em>b</em></p><hr>").unwrap();
        assert_eq!(inner_html(&tree), "<p>a <em>b</em></p><hr />");
    }

    #[test]
    fn escapes_text_and_attributes() {
        let el = Element::new("p")
            .with_attr("title", "say \"hi\"")
            .with_text("1 < 2 & 3");
        assert_eq!(
            outer_html(&el),
            r#"<p title="say &quot;hi&quot;">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn empty_non_void_elements_keep_end_tag() {
        assert_eq!(outer_html(&Element::new("div")), "<div></div>");
    }

    #[test]
    fn preview_markup_survives_a_round_trip() {
        let markup = crate::markup_to_html("# T\n\n- a\n- **b**\n\n> q");
        let tree = parse_fragment(&markup).unwrap();
        assert_eq!(inner_html(&tree), markup);
    }
}
