//! Render parsed blocks as the live document markup.
//!
//! The output is an XHTML-compatible fragment (void elements self-close) using
//! the same tag and class vocabulary the tree walker understands.

use crate::block::{Block, Image, List, QuoteLine, Table};
use crate::inline::escape;

/// Convert blocks to live document markup
pub fn blocks_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        emit_block(block, &mut out);
    }
    out
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 3);
            out.push_str(&format!("<h{level}>{content}</h{level}>\n"));
        }
        Block::Paragraph { content } => {
            out.push_str("<p>");
            out.push_str(content);
            out.push_str("</p>\n");
        }
        Block::List(list) => list_to_html(list, out),
        Block::Table(table) => table_to_html(table, out),
        Block::CodeBlock { language, lines } => {
            out.push_str("<pre><code");
            if let Some(lang) = language {
                out.push_str(&format!(" class=\"language-{}\"", escape(lang)));
            }
            out.push('>');
            out.push_str(&escape(&lines.join("\n")));
            out.push_str("</code></pre>\n");
        }
        Block::Blockquote { lines } => {
            out.push_str("<blockquote>");
            for line in lines {
                quote_line_to_html(line, out);
            }
            out.push_str("</blockquote>\n");
        }
        Block::Rule => out.push_str("<hr />\n"),
        Block::Image(image) => image_to_html(image, out),
    }
}

fn list_to_html(list: &List, out: &mut String) {
    let tag = if list.ordered { "ol" } else { "ul" };
    out.push_str(&format!("<{tag}>"));
    for item in &list.items {
        out.push_str("<li>");
        out.push_str(item);
        out.push_str("</li>");
    }
    out.push_str(&format!("</{tag}>\n"));
}

fn table_to_html(table: &Table, out: &mut String) {
    out.push_str("<table>");
    if let Some(header) = &table.header {
        out.push_str("<thead><tr>");
        for cell in header {
            out.push_str("<th>");
            out.push_str(cell);
            out.push_str("</th>");
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(cell);
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>\n");
}

fn quote_line_to_html(line: &QuoteLine, out: &mut String) {
    match line {
        QuoteLine::Blank => out.push_str("<div class=\"quote-gap\"></div>"),
        QuoteLine::Text(text) => {
            out.push_str("<div>");
            out.push_str(text);
            out.push_str("</div>");
        }
        QuoteLine::Bullet(text) => quote_item("\u{2022}", text, out),
        QuoteLine::Numbered { label, text } => quote_item(&format!("{label}."), text, out),
    }
}

fn quote_item(marker: &str, text: &str, out: &mut String) {
    out.push_str("<div class=\"quote-item\"><span class=\"quote-marker\">");
    out.push_str(&escape(marker));
    out.push_str("</span> <span>");
    out.push_str(text);
    out.push_str("</span></div>");
}

fn image_to_html(image: &Image, out: &mut String) {
    out.push_str(&format!(
        "<img src=\"{}\" class=\"{} {}\" />\n",
        escape(&image.source),
        image.size.class_name(),
        image.align.class_name()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Alignment, SizeTier};
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn render(markup: &str) -> String {
        blocks_to_html(&parse(markup))
    }

    #[test]
    fn heading_and_paragraph() {
        assert_eq!(
            render("# Title\n\nHello **there**"),
            "<h1>Title</h1>\n<p>Hello <strong>there</strong></p>\n"
        );
    }

    #[test]
    fn unordered_list() {
        assert_eq!(render("- one\n- two"), "<ul><li>one</li><li>two</li></ul>\n");
    }

    #[test]
    fn table_with_header() {
        assert_eq!(
            render("| A | B |\n|---|---|\n| 1 | 2 |"),
            "<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>\n"
        );
    }

    #[test]
    fn code_block_is_escaped() {
        assert_eq!(
            render("```html\n<b>x</b>\n```"),
            "<pre><code class=\"language-html\">&lt;b&gt;x&lt;/b&gt;</code></pre>\n"
        );
    }

    #[test]
    fn blockquote_lines() {
        assert_eq!(
            render("> said\n> - point\n>\n> 1. first"),
            "<blockquote><div>said</div>\
             <div class=\"quote-item\"><span class=\"quote-marker\">\u{2022}</span> <span>point</span></div>\
             <div class=\"quote-gap\"></div>\
             <div class=\"quote-item\"><span class=\"quote-marker\">1.</span> <span>first</span></div>\
             </blockquote>\n"
        );
    }

    #[test]
    fn rule_and_image() {
        let image = Image {
            source: "data:image/png;base64,AAAA".to_string(),
            size: SizeTier::Half,
            align: Alignment::Center,
        };
        assert_eq!(
            blocks_to_html(&[Block::Rule, Block::Image(image)]),
            "<hr />\n<img src=\"data:image/png;base64,AAAA\" class=\"img-size-50 img-align-center\" />\n"
        );
    }
}
