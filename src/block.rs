use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// A single line inside a blockquote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteLine {
    Text(String),
    Bullet(String),
    Numbered { label: String, text: String },
    Blank,
}

/// A list (ordered or unordered). Items are formatted inline markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<String>,
}

/// A table. The header is only present when the table had more than one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// An image placed in the live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Usually a `data:` URI.
    pub source: String,
    pub size: SizeTier,
    pub align: Alignment,
}

impl Image {
    /// Embed raw image bytes as a `data:` URI.
    pub fn from_bytes(mime: &str, data: &[u8], size: SizeTier, align: Alignment) -> Self {
        let base64 = BASE64_STANDARD.encode(data);
        Self {
            source: format!("data:{mime};base64,{base64}"),
            size,
            align,
        }
    }
}

/// Block-level elements parsed from the markup dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        content: String,
    },
    Paragraph {
        content: String,
    },
    List(List),
    Table(Table),
    CodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    Blockquote {
        lines: Vec<QuoteLine>,
    },
    Rule,
    Image(Image),
}

/// Image size classes used by the live editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Quarter,
    Half,
    ThreeQuarter,
    #[default]
    Full,
}

impl SizeTier {
    pub const ALL: [SizeTier; 4] = [
        SizeTier::Quarter,
        SizeTier::Half,
        SizeTier::ThreeQuarter,
        SizeTier::Full,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            SizeTier::Quarter => "img-size-25",
            SizeTier::Half => "img-size-50",
            SizeTier::ThreeQuarter => "img-size-75",
            SizeTier::Full => "img-size-100",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.class_name() == class)
    }

    /// Export footprint in pixels. `Full` is also the default footprint.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            SizeTier::Quarter => (125, 80),
            SizeTier::Half => (250, 165),
            SizeTier::ThreeQuarter => (375, 245),
            SizeTier::Full => (500, 330),
        }
    }

    /// Width as a percentage of the text column.
    pub fn percent(self) -> u32 {
        match self {
            SizeTier::Quarter => 25,
            SizeTier::Half => 50,
            SizeTier::ThreeQuarter => 75,
            SizeTier::Full => 100,
        }
    }
}

/// Horizontal alignment of a block or image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn class_name(self) -> &'static str {
        match self {
            Alignment::Left => "img-align-left",
            Alignment::Center => "img-align-center",
            Alignment::Right => "img-align-right",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|align| align.class_name() == class)
    }

    /// Parse a CSS `text-align` value.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}
