use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use crate::block::{Alignment, SizeTier};
use crate::config::PagesConfig;
use crate::dom::{Element, Node};
use crate::error::ExportError;
use crate::walker::{ExportBlock, ImageBlock, Run, TableBlock, walk};

/// Fallback face bundled with the Typst fonts.
const FALLBACK_FONT: &str = "Libertinus Serif";

/// Typst markup plus the in-memory files it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypstSource {
    pub markup: String,
    /// `(path, bytes)` pairs resolvable from the main file.
    pub files: Vec<(String, Vec<u8>)>,
}

/// Render the tree to PDF bytes.
///
/// # Errors
///
/// Returns [`ExportError::Compile`] if Typst rejects the generated markup and
/// [`ExportError::Pdf`] if the compiled document cannot be written.
pub fn write_pdf(root: &Element, config: &PagesConfig) -> Result<Vec<u8>, ExportError> {
    let source = tree_to_typst(root, config);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(true);

    let files: Vec<(&str, Vec<u8>)> = source
        .files
        .iter()
        .map(|(path, data)| (path.as_str(), data.clone()))
        .collect();

    let engine = TypstEngine::builder()
        .main_file(source.markup)
        .search_fonts_with(font_options)
        .with_static_file_resolver(files)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| ExportError::Compile(format!("{e:?}")))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| ExportError::Pdf(format!("{e:?}")))
}

/// Clone the tree and force every image to a centred block no wider than
/// the page.
pub fn normalize_for_pages(root: &Element) -> Element {
    let mut clone = root.clone();
    normalize_images(&mut clone);
    clone
}

fn normalize_images(el: &mut Element) {
    if el.tag == "img" {
        let classes: Vec<String> = el
            .classes()
            .filter(|c| Alignment::from_class(c).is_none())
            .map(str::to_string)
            .chain(std::iter::once(Alignment::Center.class_name().to_string()))
            .collect();
        el.set_attr("class", classes.join(" "));
        el.set_attr("style", "display: block; margin: 0 auto; max-width: 100%;");
    }
    for child in &mut el.children {
        if let Node::Element(inner) = child {
            normalize_images(inner);
        }
    }
}

/// Lower the tree to Typst markup.
pub fn tree_to_typst(root: &Element, config: &PagesConfig) -> TypstSource {
    let blocks = walk(&normalize_for_pages(root));
    let mut source = TypstSource::default();
    let out = &mut source.markup;

    out.push_str(&format!(
        "#set page(paper: \"{}\", margin: {}in)\n",
        escape_str(&config.paper),
        config.margin_inches
    ));
    out.push_str(&format!(
        "#set text(font: (\"{}\", \"{FALLBACK_FONT}\"))\n",
        escape_str(&config.font)
    ));
    out.push_str("#set par(linebreaks: \"optimized\")\n\n");

    let mut i = 0;
    while i < blocks.len() {
        let block = &blocks[i];
        match block {
            ExportBlock::Heading { .. } => {
                // Keep heading with following content
                source.markup.push_str("#block(breakable: false)[\n");
                emit_block(block, &mut source);
                if i + 1 < blocks.len() {
                    i += 1;
                    emit_block(&blocks[i], &mut source);
                }
                source.markup.push_str("]\n\n");
            }
            _ => emit_block(block, &mut source),
        }
        i += 1;
    }

    tracing::debug!(
        blocks = blocks.len(),
        images = source.files.len(),
        "Lowered tree to Typst"
    );
    source
}

fn emit_block(block: &ExportBlock, source: &mut TypstSource) {
    let out = &mut source.markup;
    match block {
        ExportBlock::Heading {
            level,
            runs,
            alignment,
        } => {
            let mut line = "=".repeat(usize::from(*level));
            line.push(' ');
            runs_to_typst(runs, &mut line);
            push_aligned(*alignment, &line, out);
        }
        ExportBlock::Paragraph(paragraph) if paragraph.quote => {
            out.push_str("#quote(block: true)[");
            runs_to_typst(&paragraph.runs, out);
            out.push_str("]\n\n");
        }
        ExportBlock::Paragraph(paragraph) if paragraph.runs.is_empty() => {
            out.push_str("#v(1em)\n\n");
        }
        ExportBlock::Paragraph(paragraph) => {
            let mut line = String::new();
            runs_to_typst(&paragraph.runs, &mut line);
            push_aligned(paragraph.alignment, &line, out);
        }
        ExportBlock::List { ordered, items } => {
            let prefix = if *ordered { "+" } else { "-" };
            for item in items {
                out.push_str(prefix);
                out.push(' ');
                // Typst numbers and bullets the items itself
                runs_to_typst(item.get(1..).unwrap_or_default(), out);
                out.push('\n');
            }
            out.push('\n');
        }
        ExportBlock::Table(table) => {
            out.push_str("#block(breakable: false)[\n");
            table_to_typst(table, out);
            out.push_str("]\n\n");
        }
        ExportBlock::Rule => {
            out.push_str("#line(length: 100%)\n\n");
        }
        ExportBlock::Image(image) => emit_image(image, source),
    }
}

fn push_aligned(alignment: Alignment, content: &str, out: &mut String) {
    match alignment {
        Alignment::Left => out.push_str(content),
        Alignment::Center | Alignment::Right => {
            out.push_str(&format!("#align({})[{content}]", align_name(alignment)));
        }
    }
    out.push_str("\n\n");
}

fn align_name(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

fn emit_image(image: &ImageBlock, source: &mut TypstSource) {
    let path = format!(
        "img-{}.{}",
        source.files.len() + 1,
        image.format.extension()
    );
    let (full_width, _) = SizeTier::Full.dimensions();
    let percent = (image.width * 100 / full_width).min(100);
    source.markup.push_str(&format!(
        "#align({}, image(\"{path}\", width: {percent}%))\n\n",
        align_name(image.alignment)
    ));
    source.files.push((path, image.data.clone()));
}

fn runs_to_typst(runs: &[Run], out: &mut String) {
    for (idx, run) in runs.iter().enumerate() {
        run_to_typst(run, idx == 0, out);
    }
}

fn run_to_typst(run: &Run, first: bool, out: &mut String) {
    if run.line_break {
        out.push_str("#linebreak()");
        return;
    }
    if run.text.is_empty() {
        return;
    }

    let style = &run.style;
    let mut content = if style.font.is_some() {
        // Monospace runs are raw text
        format!("#raw(\"{}\")", escape_str(&run.text))
    } else {
        let mut text = String::new();
        escape_markup(&run.text, first, &mut text);
        text
    };

    if style.bold {
        content = format!("#strong[{content}]");
    }
    if style.italic {
        content = format!("#emph[{content}]");
    }
    if style.underline {
        content = format!("#underline[{content}]");
    }
    if style.strike {
        content = format!("#strike[{content}]");
    }
    if let (Some(color), None) = (&style.color, &style.font) {
        content = format!("#text(fill: rgb(\"#{}\"))[{content}]", escape_str(color));
    }
    out.push_str(&content);
}

/// Escape text for Typst markup mode.
fn escape_markup(text: &str, line_start: bool, out: &mut String) {
    // A leading `1.` would start a numbered list
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    let enum_marker = line_start && digits > 0 && text[digits..].starts_with('.');

    for (idx, ch) in text.chars().enumerate() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '/' | '=' | '-'
            | '+' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            '.' if enum_marker && idx == digits => out.push_str("\\."),
            // Would continue a preceding `#call` as field access or arguments
            '.' | '(' if idx == 0 && !line_start => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

/// Escape text for a Typst string literal.
fn escape_str(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn table_to_typst(table: &TableBlock, out: &mut String) {
    let col_count = table.column_count();
    if col_count == 0 {
        return;
    }

    out.push_str("#table(\n");
    out.push_str(&format!("  columns: {col_count},\n"));
    for row in &table.rows {
        for idx in 0..col_count {
            let Some(cell) = row.get(idx) else {
                out.push_str("  [],\n");
                continue;
            };
            let mut content = String::new();
            runs_to_typst(&cell.paragraph.runs, &mut content);
            match &cell.shading {
                Some(fill) => out.push_str(&format!(
                    "  table.cell(fill: rgb(\"#{}\"))[{content}],\n",
                    escape_str(fill)
                )),
                None => out.push_str(&format!("  [{content}],\n")),
            }
        }
    }
    out.push_str(")\n");
}
