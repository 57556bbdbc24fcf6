use crate::block::Alignment;

/// Flattened inline style of a run. Every field is additive: once an
/// ancestor turns something on, descendants cannot turn it off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Font family override.
    pub font: Option<String>,
    /// Text colour as a hex triplet without `#`.
    pub color: Option<String>,
    /// Background fill as a hex triplet without `#`.
    pub shading: Option<String>,
}

/// A span of text with one flattened style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
    /// A forced line break; `text` is empty.
    pub line_break: bool,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            line_break: false,
        }
    }

    pub fn line_break(style: RunStyle) -> Self {
        Self {
            text: String::new(),
            style,
            line_break: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
    /// Flattened blockquote; writers indent and border it.
    pub quote: bool,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>, alignment: Alignment) -> Self {
        Self {
            runs,
            alignment,
            quote: false,
        }
    }

    /// Concatenated run text, with line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        runs_text(&self.runs)
    }
}

/// Image formats that can be embedded in exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            "image/gif" => Some(ImageFormat::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Footprint in pixels.
    pub width: u32,
    pub height: u32,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub paragraph: Paragraph,
    pub header: bool,
    pub shading: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    pub rows: Vec<Vec<TableCell>>,
}

impl TableBlock {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Export-ready block produced by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportBlock {
    Paragraph(Paragraph),
    Heading {
        level: u8,
        runs: Vec<Run>,
        alignment: Alignment,
    },
    Image(ImageBlock),
    Table(TableBlock),
    Rule,
    List {
        ordered: bool,
        items: Vec<Vec<Run>>,
    },
}

pub fn runs_text(runs: &[Run]) -> String {
    runs.iter()
        .map(|run| if run.line_break { "\n" } else { run.text.as_str() })
        .collect()
}
