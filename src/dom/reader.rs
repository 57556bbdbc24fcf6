//! Best-effort reader for live document markup.
//!
//! The markup is wrapped in a synthetic root element and fed through an XML
//! reader with end-name checks disabled. HTML void elements never take
//! children, and an end tag that matches an open ancestor closes everything
//! up to that ancestor.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::entities::{convert_html_entities, decode_entity, escape_stray_markup};
use super::tree::{Element, Node};
use crate::error::TreeError;

/// Tag of the synthetic element that holds the fragment.
pub const ROOT_TAG: &str = "root";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse a markup fragment into a tree under a synthetic root element.
///
/// # Errors
///
/// Returns an error if the reader hits malformed syntax it cannot skip over,
/// such as an unterminated tag.
pub fn parse_fragment(markup: &str) -> Result<Element, TreeError> {
    let markup = escape_stray_markup(&convert_html_entities(markup));
    let wrapped = format!("<{ROOT_TAG}>{markup}</{ROOT_TAG}>");

    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut root = Element::new(ROOT_TAG);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => break,
            Event::Eof => return Ok(root),
            _ => {}
        }
        buf.clear();
    }

    let mut open = Vec::new();
    parse_children(&mut reader, &mut root, &mut open)?;
    Ok(root)
}

/// Parse a saved page or a bare fragment.
///
/// When the markup contains a `body` element its children become the
/// children of the synthetic root, so page chrome never reaches the walker.
///
/// # Errors
///
/// Same as [`parse_fragment`].
pub fn parse_document(markup: &str) -> Result<Element, TreeError> {
    let root = parse_fragment(markup)?;
    Ok(match root.find("body") {
        Some(body) => Element {
            tag: ROOT_TAG.to_string(),
            attrs: Vec::new(),
            children: body.children.clone(),
        },
        None => root,
    })
}

/// Read children until the parent's end tag.
///
/// Returns the name of an ancestor whose end tag closed this element early.
fn parse_children<R: BufRead>(
    reader: &mut Reader<R>,
    parent: &mut Element,
    open: &mut Vec<String>,
) -> Result<Option<String>, TreeError> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let mut child = start_element(reader, &e);
                let mut pending = None;
                if !is_void(&child.tag) {
                    open.push(parent.tag.clone());
                    pending = parse_children(reader, &mut child, open)?;
                    open.pop();
                }
                parent.children.push(Node::Element(child));
                if let Some(name) = pending {
                    return Ok(if name == parent.tag { None } else { Some(name) });
                }
            }
            Event::Empty(e) => {
                let child = start_element(reader, &e);
                parent.children.push(Node::Element(child));
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(parent, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                append_text(parent, &decode_entity(&entity));
            }
            Event::CData(e) => {
                append_text(parent, &String::from_utf8_lossy(&e));
            }
            Event::End(e) => {
                let name = decode_name(reader, e.name().as_ref());
                if name == parent.tag {
                    return Ok(None);
                }
                if open.contains(&name) {
                    return Ok(Some(name));
                }
                // Stray end tag, e.g. `</br>`
            }
            Event::Eof => return Ok(None),
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn start_element<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Element {
    Element {
        tag: decode_name(reader, e.name().as_ref()),
        attrs: decode_attrs(reader, e),
        children: Vec::new(),
    }
}

fn decode_name<R: BufRead>(reader: &Reader<R>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            std::borrow::Cow::into_owned,
        )
        .to_ascii_lowercase()
}

fn decode_attrs<R: BufRead>(reader: &Reader<R>, e: &BytesStart) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    // HTML rules: unquoted and valueless attributes are accepted
    for attr in e.html_attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        attrs.push((key, value));
    }
    attrs
}

/// Append text, merging with a preceding text node.
fn append_text(node: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = node.children.last_mut() {
        last.push_str(text);
    } else {
        node.children.push(Node::Text(text.to_string()));
    }
}
