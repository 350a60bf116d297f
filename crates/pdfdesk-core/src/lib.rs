//! PDF page extraction, format conversion and merging
//!
//! This crate holds everything behind the two screens of the app:
//! - `extract_pages`: copy selected pages of one PDF into a new PDF
//! - `convert_to_pdf` + `merge_pair`: normalize two uploads of mixed formats
//!   (PDF, raster image, text/markdown, DOCX) to PDF and concatenate them
//!
//! All operations are pure functions over byte buffers; nothing is cached or
//! shared between calls.

pub mod convert;
pub mod docx;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod format;
pub mod merge;
pub mod text_render;

mod page_tree;
// One fixture source for unit and integration tests.
#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_support;

pub use convert::convert_to_pdf;
pub use error::{FontLoadFailure, PdfDeskError};
pub use extract::extract_pages;
pub use fonts::{find_korean_font, load_font, ResolvedFont};
pub use format::{SourceFormat, UploadedFile, SUPPORTED_EXTENSIONS};
pub use merge::{merge_documents, merge_pair};
pub use text_render::render_text;

use serde::Serialize;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfDeskError> {
    let doc = page_tree::load(bytes)?;
    Ok(doc.get_pages().len() as u32)
}

/// Basic facts about an uploaded PDF, shown before the user picks pages.
#[derive(Debug, Clone, Serialize)]
pub struct PdfInfo {
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Parse a PDF and describe it.
pub fn pdf_info(bytes: &[u8]) -> Result<PdfInfo, PdfDeskError> {
    let doc = page_tree::load(bytes)?;
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(lopdf::Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();
    let text_field = |key: &[u8]| {
        info.and_then(|dict| dict.get(key).ok())
            .and_then(|obj| obj.as_str().ok())
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .filter(|s| !s.is_empty())
    };

    Ok(PdfInfo {
        page_count: doc.get_pages().len() as u32,
        version: doc.version.clone(),
        encrypted: doc.is_encrypted(),
        size_bytes: bytes.len(),
        title: text_field(b"Title"),
        author: text_field(b"Author"),
    })
}

/// Parse a page selection like "3, 1-2, 3" into page numbers.
///
/// Unlike a range filter this keeps the user's order and repeats:
/// "3, 1-2, 3" yields `[3, 1, 2, 3]`. Bounds are checked at extraction time.
pub fn parse_selection(input: &str) -> Result<Vec<u32>, PdfDeskError> {
    let mut pages = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            // Range like "1-3"
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| PdfDeskError::InvalidSelection(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| PdfDeskError::InvalidSelection(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(PdfDeskError::InvalidSelection(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            pages.extend(start..=end);
        } else {
            // Single page like "5"
            let page: u32 = part
                .parse()
                .map_err(|_| PdfDeskError::InvalidSelection(format!("Invalid page: {}", part)))?;
            pages.push(page);
        }
    }

    Ok(pages)
}
