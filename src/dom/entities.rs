//! HTML entity to Unicode conversion.
//!
//! Named HTML entities are not known to the XML reader, so they are replaced
//! before parsing. The five XML entities are left for the reader. Bare `&`
//! and `<` that HTML treats as text are escaped so the reader sees them as
//! text too.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);")
        .expect("invalid reference regex")
});

/// Escape `&` that does not start a reference and `<` that does not start
/// a tag, comment or declaration.
pub fn escape_stray_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for (idx, ch) in html.char_indices() {
        let rest = &html[idx..];
        match ch {
            '&' if !REFERENCE_PATTERN.is_match(rest) => out.push_str("&amp;"),
            '<' if !starts_tag(&rest[1..]) => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn starts_tag(after: &str) -> bool {
    let mut chars = after.chars();
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some(c) => c.is_ascii_alphabetic() || c == '!' || c == '?',
        None => false,
    }
}

/// Replace named HTML entities with the characters they stand for.
pub fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            entity_to_unicode(&caps[1])
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "hellip" => "\u{2026}",
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "plusmn" => "\u{00b1}",
        "deg" => "\u{00b0}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",
        _ => return None,
    })
}

/// Decode an entity reference the XML reader reports, e.g. `amp` or `#x41`.
pub fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => entity_to_unicode(entity)
            .map(String::from)
            .unwrap_or_else(|| format!("&{entity};")),
    }
}
