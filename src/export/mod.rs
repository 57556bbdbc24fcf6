//! Export adapters.
//!
//! Every adapter is a pure function from the live tree to artifact bytes. The
//! tree is borrowed and never mutated; the page exporter works on its own
//! clone.

mod docx;
mod html;
mod pdf;

pub use docx::write_docx;
pub use html::{STYLESHEET, write_html};
pub use pdf::{TypstSource, normalize_for_pages, tree_to_typst, write_pdf};

use crate::config::Config;
use crate::dom::Element;
use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Docx,
    Html,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Run one adapter, logging instead of raising on failure.
///
/// Returns `None` when the export was abandoned; no partial artifact is ever
/// returned.
pub fn export(format: ExportFormat, root: &Element, config: &Config) -> Option<Vec<u8>> {
    match try_export(format, root, config) {
        Ok(bytes) => {
            tracing::info!(
                format = format.extension(),
                bytes = bytes.len(),
                "Export complete"
            );
            Some(bytes)
        }
        Err(e) => {
            tracing::error!(format = format.extension(), error = %e, "Export failed");
            None
        }
    }
}

/// Run one adapter.
///
/// # Errors
///
/// Returns [`ExportError::EmptyDocument`] when the tree has no visible
/// content, or the adapter's own failure.
pub fn try_export(
    format: ExportFormat,
    root: &Element,
    config: &Config,
) -> Result<Vec<u8>, ExportError> {
    if is_blank(root) {
        return Err(ExportError::EmptyDocument);
    }
    match format {
        ExportFormat::Docx => write_docx(&crate::walker::walk(root), &config.document),
        ExportFormat::Html => Ok(write_html(root, &config.markup).into_bytes()),
        ExportFormat::Pdf => write_pdf(root, &config.pages),
    }
}

/// No text and no self-contained visual element anywhere in the tree.
fn is_blank(el: &Element) -> bool {
    el.children.iter().all(|child| match child {
        crate::dom::Node::Text(text) => text.trim().is_empty(),
        crate::dom::Node::Element(inner) => {
            !matches!(inner.tag.as_str(), "img" | "hr") && is_blank(inner)
        }
    })
}
