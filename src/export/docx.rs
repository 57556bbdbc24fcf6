//! WordprocessingML package writer.
//!
//! Parts are built as strings and stored in a zip container. Element order
//! inside `w:pPr`, `w:rPr` and `w:tcPr` follows the schema sequence, which
//! strict consumers enforce.

use std::collections::BTreeSet;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::block::Alignment;
use crate::config::DocumentConfig;
use crate::error::ExportError;
use crate::walker::{ExportBlock, ImageBlock, ImageFormat, Paragraph, Run, TableBlock};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// US Letter in twips.
const PAGE_WIDTH: u32 = 12240;
const PAGE_HEIGHT: u32 = 15840;
const EMU_PER_PX: u64 = 9525;

const RULE_COLOR: &str = "CBD5E1";
const QUOTE_BORDER_COLOR: &str = "6366F1";
const CELL_BORDER_COLOR: &str = "CBD5E1";
const CELL_MARGIN: u32 = 180;

/// An image waiting to be stored under `word/media/`.
struct Media {
    name: String,
    format: ImageFormat,
    rel_id: String,
    data: Vec<u8>,
}

struct Body {
    xml: String,
    media: Vec<Media>,
    /// Width between the page margins in twips.
    text_width: u32,
}

/// Build a `.docx` package from walked blocks.
///
/// # Errors
///
/// Returns [`ExportError::EmptyDocument`] when there are no blocks, or a
/// container error from the zip writer.
pub fn write_docx(blocks: &[ExportBlock], config: &DocumentConfig) -> Result<Vec<u8>, ExportError> {
    if blocks.is_empty() {
        return Err(ExportError::EmptyDocument);
    }

    let mut body = Body {
        xml: String::new(),
        media: Vec::new(),
        text_width: PAGE_WIDTH.saturating_sub(2 * config.margin_twips()),
    };
    for block in blocks {
        emit_block(block, &mut body);
    }
    // A body may not end in a table
    if matches!(blocks.last(), Some(ExportBlock::Table(_))) {
        body.xml.push_str("<w:p/>");
    }

    let formats: BTreeSet<ImageFormat> = body.media.iter().map(|m| m.format).collect();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types(&formats).as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(package_rels().as_bytes())?;
    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(document_rels(&body.media).as_bytes())?;
    zip.start_file("word/styles.xml", options)?;
    zip.write_all(styles(config).as_bytes())?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(document(&body.xml, config).as_bytes())?;
    for media in &body.media {
        zip.start_file(format!("word/media/{}", media.name), options)?;
        zip.write_all(&media.data)?;
    }

    let cursor = zip.finish()?;
    tracing::debug!(
        blocks = blocks.len(),
        images = body.media.len(),
        "Built docx package"
    );
    Ok(cursor.into_inner())
}

fn emit_block(block: &ExportBlock, body: &mut Body) {
    let out = &mut body.xml;
    match block {
        ExportBlock::Paragraph(paragraph) if paragraph.quote => {
            let props = format!(
                r#"<w:pBdr><w:left w:val="single" w:sz="24" w:space="12" w:color="{QUOTE_BORDER_COLOR}"/></w:pBdr><w:spacing w:before="360" w:after="360"/><w:ind w:left="720"/>{}"#,
                jc(paragraph.alignment)
            );
            emit_paragraph(&props, &paragraph.runs, out);
        }
        ExportBlock::Paragraph(paragraph) => {
            let props = format!(
                r#"<w:spacing w:before="240" w:after="240" w:line="360" w:lineRule="auto"/>{}"#,
                jc(paragraph.alignment)
            );
            emit_paragraph(&props, &paragraph.runs, out);
        }
        ExportBlock::Heading {
            level,
            runs,
            alignment,
        } => {
            let props = format!(
                r#"<w:pStyle w:val="Heading{level}"/><w:spacing w:before="600" w:after="240"/>{}"#,
                jc(*alignment)
            );
            emit_paragraph(&props, runs, out);
        }
        ExportBlock::List { items, .. } => {
            for item in items {
                emit_paragraph(
                    r#"<w:spacing w:before="120" w:after="120"/><w:ind w:left="720" w:hanging="360"/>"#,
                    item,
                    out,
                );
            }
        }
        ExportBlock::Rule => {
            out.push_str(&format!(
                r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="12" w:space="1" w:color="{RULE_COLOR}"/></w:pBdr><w:spacing w:before="480" w:after="480"/></w:pPr></w:p>"#
            ));
        }
        ExportBlock::Table(table) => emit_table(table, body.text_width, out),
        ExportBlock::Image(image) => emit_image(image, body),
    }
}

fn jc(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "",
        Alignment::Center => r#"<w:jc w:val="center"/>"#,
        Alignment::Right => r#"<w:jc w:val="right"/>"#,
    }
}

fn emit_paragraph(props: &str, runs: &[Run], out: &mut String) {
    out.push_str("<w:p>");
    if !props.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(props);
        out.push_str("</w:pPr>");
    }
    for run in runs {
        emit_run(run, out);
    }
    out.push_str("</w:p>");
}

fn emit_run(run: &Run, out: &mut String) {
    out.push_str("<w:r>");
    let style = &run.style;
    let mut props = String::new();
    if let Some(font) = &style.font {
        let font = xml_escape(font.as_str());
        props.push_str(&format!(
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        ));
    }
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if style.strike {
        props.push_str("<w:strike/>");
    }
    if let Some(color) = &style.color {
        props.push_str(&format!(r#"<w:color w:val="{}"/>"#, xml_escape(color.as_str())));
    }
    if style.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(fill) = &style.shading {
        props.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
            xml_escape(fill.as_str())
        ));
    }
    if !props.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&props);
        out.push_str("</w:rPr>");
    }

    if run.line_break {
        out.push_str("<w:br/>");
    } else {
        out.push_str(r#"<w:t xml:space="preserve">"#);
        out.push_str(&xml_escape(run.text.as_str()));
        out.push_str("</w:t>");
    }
    out.push_str("</w:r>");
}

fn emit_table(table: &TableBlock, text_width: u32, out: &mut String) {
    let columns = table.column_count();
    if columns == 0 {
        return;
    }
    let border = |side: &str| {
        format!(r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="{CELL_BORDER_COLOR}"/>"#)
    };
    let sides = ["top", "left", "bottom", "right"];
    let cell_borders: String = sides.iter().map(|&side| border(side)).collect();

    out.push_str("<w:tbl><w:tblPr>");
    out.push_str(r#"<w:tblW w:w="5000" w:type="pct"/>"#);
    out.push_str("<w:tblBorders>");
    for &side in sides.iter().chain(&["insideH", "insideV"]) {
        out.push_str(&border(side));
    }
    out.push_str("</w:tblBorders><w:tblCellMar>");
    for side in sides {
        out.push_str(&format!(r#"<w:{side} w:w="{CELL_MARGIN}" w:type="dxa"/>"#));
    }
    out.push_str("</w:tblCellMar></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        out.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, text_width / columns as u32));
    }
    out.push_str("</w:tblGrid>");

    let empty = Paragraph::default();
    for row in &table.rows {
        out.push_str("<w:tr>");
        for idx in 0..columns {
            let cell = row.get(idx);
            out.push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/><w:tcBorders>"#);
            out.push_str(&cell_borders);
            out.push_str("</w:tcBorders>");
            if let Some(fill) = cell.and_then(|c| c.shading.as_deref()) {
                out.push_str(&format!(
                    r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                    xml_escape(fill)
                ));
            }
            out.push_str("</w:tcPr>");
            let paragraph = cell.map_or(&empty, |c| &c.paragraph);
            emit_paragraph(jc(paragraph.alignment), &paragraph.runs, out);
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn emit_image(image: &ImageBlock, body: &mut Body) {
    let n = body.media.len() + 1;
    let name = format!("image{n}.{}", image.format.extension());
    let rel_id = format!("rIdImage{n}");
    let cx = u64::from(image.width) * EMU_PER_PX;
    let cy = u64::from(image.height) * EMU_PER_PX;

    let out = &mut body.xml;
    out.push_str(&format!(
        r#"<w:p><w:pPr><w:spacing w:before="240" w:after="240"/>{}</w:pPr>"#,
        jc(image.alignment)
    ));
    out.push_str(&format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
            r#"<a:graphic><a:graphicData uri="{ns_pic}"><pic:pic>"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{n}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        cx = cx,
        cy = cy,
        n = n,
        ns_pic = NS_PIC,
        name = name,
        rel_id = rel_id,
    ));

    body.media.push(Media {
        name,
        format: image.format,
        rel_id,
        data: image.data.clone(),
    });
}

/// Escape text for a part, dropping characters XML 1.0 does not allow.
fn xml_escape(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r' | ' '..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..))
        .collect();
    escape(allowed.as_str()).into_owned()
}

fn content_types(formats: &BTreeSet<ImageFormat>) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in formats {
        out.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime()
        ));
    }
    out.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push_str("</Types>");
    out
}

fn package_rels() -> String {
    format!(
        r#"{XML_HEADER}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="word/document.xml"/></Relationships>"#
    )
}

fn document_rels(media: &[Media]) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    out.push_str(&format!(
        r#"<Relationship Id="rIdStyles" Type="{REL_BASE}/styles" Target="styles.xml"/>"#
    ));
    for m in media {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{REL_BASE}/image" Target="media/{}"/>"#,
            m.rel_id, m.name
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn styles(config: &DocumentConfig) -> String {
    let font = xml_escape(config.font.as_str());
    let color = xml_escape(config.color.as_str());
    let size = config.half_points();

    let mut out = String::from(XML_HEADER);
    out.push_str(&format!(r#"<w:styles xmlns:w="{NS_W}">"#));
    out.push_str(&format!(
        concat!(
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#,
            r#"<w:color w:val="{color}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
            "</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>",
            r#"<w:spacing w:after="0" w:line="360" w:lineRule="auto"/>"#,
            "</w:pPr></w:pPrDefault></w:docDefaults>",
        ),
        font = font,
        color = color,
        size = size,
    ));
    out.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);
    for (level, half_points) in [(1, size * 2), (2, size * 3 / 2), (3, size * 5 / 4)] {
        out.push_str(&format!(
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{level}">"#,
                r#"<w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:outlineLvl w:val="{outline}"/></w:pPr>"#,
                r#"<w:rPr><w:b/><w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/></w:rPr>"#,
                "</w:style>",
            ),
            level = level,
            outline = level - 1,
            sz = half_points,
        ));
    }
    out.push_str("</w:styles>");
    out
}

fn document(body: &str, config: &DocumentConfig) -> String {
    let margin = config.margin_twips();
    let mut out = String::from(XML_HEADER);
    out.push_str(&format!(
        r#"<w:document xmlns:w="{NS_W}" xmlns:r="{NS_R}" xmlns:wp="{NS_WP}" xmlns:a="{NS_A}" xmlns:pic="{NS_PIC}"><w:body>"#
    ));
    out.push_str(body);
    out.push_str(&format!(
        r#"<w:sectPr><w:pgSz w:w="{PAGE_WIDTH}" w:h="{PAGE_HEIGHT}"/><w:pgMar w:top="{margin}" w:right="{margin}" w:bottom="{margin}" w:left="{margin}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#
    ));
    out.push_str("</w:body></w:document>");
    out
}
