//! PDF page extraction
//!
//! Builds a new document from selected pages of a source PDF. The selection
//! is 1-indexed and taken literally: pages come out in the order given, and a
//! page listed twice appears twice.

use tracing::debug;

use crate::error::PdfDeskError;
use crate::page_tree;

/// Extract `selection` (1-indexed, order and duplicates preserved) from `bytes`.
///
/// The algorithm:
/// 1. Reject an empty selection
/// 2. Parse the source and bounds-check every index
/// 3. Copy each selected page, in selection order, with inherited attributes resolved
/// 4. Replace the page tree with the copies and drop everything no longer referenced
pub fn extract_pages(bytes: &[u8], selection: &[u32]) -> Result<Vec<u8>, PdfDeskError> {
    if selection.is_empty() {
        return Err(PdfDeskError::EmptySelection);
    }

    let mut doc = page_tree::load(bytes)?;
    let page_ids = page_tree::page_ids(&doc);
    let page_count = page_ids.len() as u32;

    for &index in selection {
        if index < 1 || index > page_count {
            return Err(PdfDeskError::PageIndexOutOfRange { index, page_count });
        }
    }

    let pages = selection
        .iter()
        .map(|&index| page_tree::materialize_page(&doc, page_ids[index as usize - 1]))
        .collect::<Result<Vec<_>, _>>()?;

    page_tree::install_pages(&mut doc, pages);
    debug!(
        "Extracted {} pages from a {} page document",
        selection.len(),
        page_count
    );

    page_tree::finish(doc)
}
