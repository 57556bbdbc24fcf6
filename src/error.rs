//! Error types shared by the tree reader, the walker and the export adapters.

/// The presentational markup could not be read into a tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TreeError {
    /// XML-level parse error.
    #[error("markup parse error")]
    Xml(#[from] quick_xml::Error),

    /// Text could not be decoded.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}

/// An embedded image could not be turned into pixel data.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Only inline `data:` sources are embedded.
    #[error("image source is not a data URI")]
    NotDataUri,

    #[error("unsupported image type: {0}")]
    Unsupported(String),

    #[error("invalid base64 payload")]
    Decode(#[from] base64::DecodeError),
}

/// An export adapter failed. The artifact is abandoned.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    EmptyDocument,

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("package error")]
    Zip(#[from] zip::result::ZipError),

    #[error("could not read document tree")]
    Tree(#[from] TreeError),

    #[error("Typst compilation failed: {0}")]
    Compile(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
