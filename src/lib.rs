mod block;
mod config;
mod dom;
mod error;
mod export;
mod inline;
mod parser;
mod preview;
mod walker;

pub use block::{Alignment, Block, Image, List, QuoteLine, SizeTier, Table};
pub use config::{Config, DocumentConfig, MarkupConfig, OutputConfig, PagesConfig};
pub use dom::{Element, Node, ROOT_TAG, inner_html, outer_html, parse_document, parse_fragment};
pub use error::{ExportError, ImageError, TreeError};
pub use export::{
    ExportFormat, STYLESHEET, TypstSource, export, normalize_for_pages, tree_to_typst,
    try_export, write_docx, write_html, write_pdf,
};
pub use inline::{escape, format_inline};
pub use preview::blocks_to_html;
pub use walker::{
    ExportBlock, ImageBlock, ImageFormat, NodeKind, Paragraph, Run, RunStyle, TableBlock,
    TableCell, classify, decode_data_uri, runs_text, walk,
};

/// Parse markup text into a vector of blocks.
pub fn parse(text: &str) -> Vec<Block> {
    parser::parse(text)
}

/// Convert markup text to the live document fragment.
pub fn markup_to_html(text: &str) -> String {
    blocks_to_html(&parse(text))
}

/// Convert markup text straight to a live document tree.
pub fn markup_to_tree(text: &str) -> Result<Element, TreeError> {
    parse_fragment(&markup_to_html(text))
}

/// Convert markup text to an export artifact.
pub fn markup_to_export(
    text: &str,
    format: ExportFormat,
    config: &Config,
) -> Result<Vec<u8>, ExportError> {
    let tree = markup_to_tree(text)?;
    try_export(format, &tree, config)
}

/// Convert markup text to PDF bytes.
pub fn markup_to_pdf(text: &str, config: &Config) -> Result<Vec<u8>, ExportError> {
    markup_to_export(text, ExportFormat::Pdf, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DRAFT: &str = "# Title\n\nSome **bold** text\n\n- a\n- b\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n> quoted\n> - point\n\n---\n\n```sh\nls -la\n```";

    #[test]
    fn draft_to_export_blocks() {
        let blocks = walk(&markup_to_tree(DRAFT).unwrap());
        assert_eq!(blocks.len(), 7);

        let ExportBlock::Heading { level, runs, .. } = &blocks[0] else {
            panic!("expected heading, got {:?}", blocks[0]);
        };
        assert_eq!(*level, 1);
        assert_eq!(runs_text(runs), "Title");

        let ExportBlock::Paragraph(p) = &blocks[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.plain_text(), "Some bold text");
        assert!(p.runs[1].style.bold);

        let ExportBlock::List { ordered, items } = &blocks[2] else {
            panic!("expected list");
        };
        assert!(!ordered);
        assert_eq!(runs_text(&items[1]), "\u{2022} b");

        let ExportBlock::Table(table) = &blocks[3] else {
            panic!("expected table");
        };
        assert!(table.rows[0][0].header);
        assert_eq!(table.rows[1][1].paragraph.plain_text(), "2");

        let ExportBlock::Paragraph(quote) = &blocks[4] else {
            panic!("expected quote");
        };
        assert!(quote.quote);
        assert_eq!(quote.plain_text(), "quoted\n\u{2022} point");

        assert_eq!(blocks[5], ExportBlock::Rule);

        let ExportBlock::Paragraph(code) = &blocks[6] else {
            panic!("expected code paragraph");
        };
        assert_eq!(code.plain_text(), "ls -la");
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(DRAFT), parse(DRAFT));
        assert_eq!(markup_to_html(DRAFT), markup_to_html(DRAFT));
    }

    #[test]
    fn draft_to_docx() {
        let bytes =
            markup_to_export(DRAFT, ExportFormat::Docx, &Config::compiled_default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn draft_to_html_keeps_live_markup() {
        let bytes =
            markup_to_export(DRAFT, ExportFormat::Html, &Config::compiled_default()).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<title>Exported Document</title>"));
    }

    #[test]
    fn exported_page_reads_back_as_the_same_tree() {
        let config = Config::compiled_default();
        let tree = markup_to_tree(DRAFT).unwrap();
        let page = String::from_utf8(
            markup_to_export(DRAFT, ExportFormat::Html, &config).unwrap(),
        )
        .unwrap();
        let reread = parse_document(&page).unwrap();
        assert_eq!(walk(&reread), walk(&tree));
    }

    #[test]
    fn blank_draft_is_not_exported() {
        assert!(matches!(
            markup_to_export("\n\n   \n", ExportFormat::Docx, &Config::compiled_default()),
            Err(ExportError::EmptyDocument)
        ));
    }
}
