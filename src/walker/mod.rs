//! Walk the live document tree into export-ready blocks.
//!
//! The tree is whatever the editor holds after arbitrary editing: wrappers
//! nested in wrappers, stray text under the root, unknown tags. Nothing here
//! fails. Unknown elements degrade to the wrapper or leaf paths and images
//! that cannot be decoded are skipped.

mod classify;
mod image;
mod model;
mod style;

pub use classify::{NodeKind, classify, resolve_alignment, size_tier};
pub use image::decode_data_uri;
pub use model::{
    ExportBlock, ImageBlock, ImageFormat, Paragraph, Run, RunStyle, TableBlock, TableCell,
    runs_text,
};
pub use style::{HEADER_SHADING, QUOTE_COLOR, collect_runs};

use crate::block::Alignment;
use crate::dom::{Element, Node};
use crate::error::ImageError;
use classify::is_block_tag;
use style::{flatten_newlines, push_runs};

/// Convert the children of `root` into a flat list of export blocks.
pub fn walk(root: &Element) -> Vec<ExportBlock> {
    let blocks: Vec<ExportBlock> = root
        .children
        .iter()
        .flat_map(|child| process_node(child, root))
        .collect();
    tracing::debug!(blocks = blocks.len(), "Walked document tree");
    blocks
}

fn process_node(node: &Node, parent: &Element) -> Vec<ExportBlock> {
    let el = match node {
        Node::Text(text) => return text_block(text).into_iter().collect(),
        Node::Element(el) => el,
    };

    match classify(el) {
        NodeKind::Image => image_block(el, parent)
            .map(ExportBlock::Image)
            .into_iter()
            .collect(),
        NodeKind::Rule => vec![ExportBlock::Rule],
        NodeKind::LineBreak => vec![ExportBlock::Paragraph(Paragraph::default())],
        NodeKind::Heading(level) => vec![ExportBlock::Heading {
            level,
            runs: collect_runs(el, &RunStyle::default()),
            alignment: resolve_alignment(el, Some(parent)),
        }],
        NodeKind::List { ordered } => vec![list_block(el, ordered)],
        NodeKind::Table => vec![ExportBlock::Table(table_block(el))],
        NodeKind::Blockquote => vec![ExportBlock::Paragraph(quote_paragraph(el))],
        NodeKind::Preformatted => vec![ExportBlock::Paragraph(preformatted(el))],
        NodeKind::Wrapper => el
            .children
            .iter()
            .flat_map(|child| process_node(child, el))
            .collect(),
        NodeKind::Leaf => leaf_block(el, parent).into_iter().collect(),
    }
}

fn text_block(text: &str) -> Option<ExportBlock> {
    if text.trim().is_empty() {
        return None;
    }
    let run = Run::new(flatten_newlines(text), RunStyle::default());
    Some(ExportBlock::Paragraph(Paragraph::new(
        vec![run],
        Alignment::Left,
    )))
}

fn leaf_block(el: &Element, parent: &Element) -> Option<ExportBlock> {
    let runs = collect_runs(el, &RunStyle::default().enter(el));
    if runs.is_empty() && !matches!(el.tag.as_str(), "p" | "div") {
        return None;
    }
    Some(ExportBlock::Paragraph(Paragraph::new(
        runs,
        resolve_alignment(el, Some(parent)),
    )))
}

fn image_block(el: &Element, parent: &Element) -> Option<ImageBlock> {
    let source = el.attr("src").unwrap_or_default();
    match decode_data_uri(source) {
        Ok((format, data)) => {
            let (width, height) = size_tier(el).dimensions();
            Some(ImageBlock {
                data,
                format,
                width,
                height,
                alignment: resolve_alignment(el, Some(parent)),
            })
        }
        Err(ImageError::NotDataUri) => {
            tracing::warn!(source = %truncate(source, 64), "Skipping image without embedded data");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Image export failed");
            None
        }
    }
}

fn list_block(el: &Element, ordered: bool) -> ExportBlock {
    let prefix_style = RunStyle {
        bold: true,
        ..RunStyle::default()
    };
    let items = el
        .element_children()
        .enumerate()
        .map(|(idx, item)| {
            let prefix = if ordered {
                format!("{}. ", idx + 1)
            } else {
                "\u{2022} ".to_string()
            };
            let mut runs = vec![Run::new(prefix, prefix_style.clone())];
            runs.extend(collect_runs(item, &RunStyle::default()));
            runs
        })
        .collect();
    ExportBlock::List { ordered, items }
}

fn table_block(el: &Element) -> TableBlock {
    let mut rows = Vec::new();
    find_within_table(el, &|tag| tag == "tr", &mut rows);

    let rows = rows
        .into_iter()
        .map(|row| {
            let mut cells = Vec::new();
            find_within_table(row, &|tag| tag == "td" || tag == "th", &mut cells);
            cells
                .into_iter()
                .map(|cell| {
                    let header = cell.tag == "th"
                        || matches!(cell.attr("role"), Some("columnheader" | "rowheader"));
                    TableCell {
                        paragraph: Paragraph::new(
                            collect_runs(cell, &RunStyle::default()),
                            resolve_alignment(cell, None),
                        ),
                        header,
                        shading: header.then(|| HEADER_SHADING.to_string()),
                    }
                })
                .collect()
        })
        .collect();
    TableBlock { rows }
}

/// Descendants whose tag matches, without entering nested tables or matches.
fn find_within_table<'a>(
    el: &'a Element,
    matches: &dyn Fn(&str) -> bool,
    out: &mut Vec<&'a Element>,
) {
    for child in el.element_children() {
        if matches(&child.tag) {
            out.push(child);
        } else if child.tag != "table" {
            find_within_table(child, matches, out);
        }
    }
}

fn quote_paragraph(el: &Element) -> Paragraph {
    let base = RunStyle::quote();
    let mut runs = Vec::new();
    for child in &el.children {
        match child {
            Node::Element(inner) if is_block_tag(&inner.tag) => {
                if !runs.is_empty() {
                    runs.push(Run::line_break(base.clone()));
                }
                let style = base.enter(inner);
                for grandchild in &inner.children {
                    push_runs(grandchild, &style, &mut runs);
                }
            }
            other => push_runs(other, &base, &mut runs),
        }
    }

    // Inner markup cannot override the quote's voice
    for run in &mut runs {
        run.style.italic = true;
        run.style.color = Some(QUOTE_COLOR.to_string());
    }
    Paragraph {
        runs,
        alignment: Alignment::Left,
        quote: true,
    }
}

fn preformatted(el: &Element) -> Paragraph {
    let style = RunStyle::code();
    let text = el.text_content().replace("\r\n", "\n");
    let mut runs = Vec::new();
    for (idx, line) in text.trim_end_matches('\n').split('\n').enumerate() {
        if idx > 0 {
            runs.push(Run::line_break(style.clone()));
        }
        if !line.is_empty() {
            runs.push(Run::new(line, style.clone()));
        }
    }
    Paragraph::new(runs, Alignment::Left)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;
    use pretty_assertions::assert_eq;
    use super::style::MONO_FONT;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn walk_markup(markup: &str) -> Vec<ExportBlock> {
        walk(&parse_fragment(markup).unwrap())
    }

    fn paragraph(block: &ExportBlock) -> &Paragraph {
        match block {
            ExportBlock::Paragraph(p) => p,
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn nested_wrappers_flatten_to_one_paragraph() {
        let blocks = walk_markup("<div><div><div><p><b>X</b></p></div></div></div>");
        assert_eq!(blocks.len(), 1);
        let p = paragraph(&blocks[0]);
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text, "X");
        assert!(p.runs[0].style.bold);
    }

    #[test]
    fn unmarked_paragraph_is_left_aligned() {
        let blocks = walk_markup("<p>plain</p>");
        assert_eq!(paragraph(&blocks[0]).alignment, Alignment::Left);
    }

    #[test]
    fn aligned_paragraph_inherits_from_parent_once() {
        let blocks = walk_markup(r#"<div style="text-align: center"><p>mid</p></div>"#);
        assert_eq!(paragraph(&blocks[0]).alignment, Alignment::Center);
    }

    #[test]
    fn sized_centred_image() {
        let blocks = walk_markup(&format!(
            r#"<img src="{PIXEL}" class="img-size-50 img-align-center" />"#
        ));
        let ExportBlock::Image(image) = &blocks[0] else {
            panic!("expected image, got {:?}", blocks[0]);
        };
        assert_eq!((image.width, image.height), (250, 165));
        assert_eq!(image.alignment, Alignment::Center);
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(&image.data[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn image_without_tier_gets_default_footprint() {
        let blocks = walk_markup(&format!(r#"<p><img src="{PIXEL}"></p>"#));
        let ExportBlock::Image(image) = &blocks[0] else {
            panic!("expected image, got {:?}", blocks[0]);
        };
        assert_eq!((image.width, image.height), (500, 330));
    }

    #[test]
    fn broken_images_are_skipped() {
        let blocks =
            walk_markup(r#"<img src="data:image/png;base64,@@@"><img src="a.png"><p>after</p>"#);
        assert_eq!(blocks.len(), 1);
        assert_eq!(paragraph(&blocks[0]).plain_text(), "after");
    }

    #[test]
    fn blockquote_lines_become_separated_italic_segments() {
        let blocks = walk_markup(
            "<blockquote><div>Line one</div><div><b>Line</b> two</div></blockquote>",
        );
        assert_eq!(blocks.len(), 1);
        let p = paragraph(&blocks[0]);
        assert!(p.quote);
        assert_eq!(p.plain_text(), "Line one\nLine two");
        assert!(p.runs.iter().all(|r| r.style.italic));
        assert!(
            p.runs
                .iter()
                .all(|r| r.style.color.as_deref() == Some(QUOTE_COLOR))
        );
        assert!(p.runs.iter().any(|r| r.style.bold));
    }

    #[test]
    fn ordered_and_unordered_list_prefixes() {
        let blocks = walk_markup("<ol><li>a</li><li>b</li></ol><ul><li>c</li></ul>");
        let ExportBlock::List { ordered, items } = &blocks[0] else {
            panic!("expected list");
        };
        assert!(ordered);
        assert_eq!(runs_text(&items[1]), "2. b");
        assert!(items[1][0].style.bold);
        assert!(!items[1][1].style.bold);

        let ExportBlock::List { items, .. } = &blocks[1] else {
            panic!("expected list");
        };
        assert_eq!(runs_text(&items[0]), "\u{2022} c");
    }

    #[test]
    fn table_rows_and_header_cells() {
        let blocks = walk_markup(
            "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>",
        );
        let ExportBlock::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0][0].header);
        assert_eq!(table.rows[0][0].shading.as_deref(), Some(HEADER_SHADING));
        assert!(!table.rows[1][0].header);
        assert_eq!(table.rows[1][0].shading, None);
        assert_eq!(table.rows[1][0].paragraph.plain_text(), "v");
    }

    #[test]
    fn header_roles_mark_data_cells() {
        let blocks = walk_markup(
            r#"<table><tr><td role="columnheader">H</td><td role="cell">x</td></tr><tr><td role="rowheader">R</td><td>v</td></tr></table>"#,
        );
        let ExportBlock::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        let headers: Vec<Vec<bool>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.header).collect())
            .collect();
        assert_eq!(headers, vec![vec![true, false], vec![true, false]]);
        assert_eq!(table.rows[1][0].shading.as_deref(), Some(HEADER_SHADING));
    }

    #[test]
    fn nested_table_rows_are_not_hoisted() {
        let blocks = walk_markup(
            "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>",
        );
        let ExportBlock::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn block_level_break_is_empty_paragraph() {
        let blocks = walk_markup("<p>a</p><br><p>b</p>");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], ExportBlock::Paragraph(Paragraph::default()));
    }

    #[test]
    fn empty_leaves() {
        let blocks = walk_markup("<div></div><span></span><p></p>");
        assert_eq!(blocks.len(), 2);
        assert!(paragraph(&blocks[0]).runs.is_empty());
    }

    #[test]
    fn stray_root_text() {
        let blocks = walk_markup("loose text\n<p>x</p>\n   ");
        assert_eq!(blocks.len(), 2);
        assert_eq!(paragraph(&blocks[0]).plain_text(), "loose text ");
    }

    #[test]
    fn headings_collect_runs_and_collapse() {
        let blocks = walk_markup("<h5><em>deep</em></h5>");
        let ExportBlock::Heading { level, runs, .. } = &blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(*level, 3);
        assert!(runs[0].style.italic);
    }

    #[test]
    fn preformatted_keeps_lines() {
        let blocks = walk_markup("<pre><code>fn a() {\n\n    b\n}\n</code></pre>");
        let p = paragraph(&blocks[0]);
        assert_eq!(p.plain_text(), "fn a() {\n\n    b\n}");
        assert!(
            p.runs
                .iter()
                .all(|r| r.style.font.as_deref() == Some(MONO_FONT))
        );
    }

    #[test]
    fn rule_between_paragraphs() {
        let blocks = walk_markup("<p>a</p><hr /><p>b</p>");
        assert_eq!(blocks[1], ExportBlock::Rule);
    }
}
