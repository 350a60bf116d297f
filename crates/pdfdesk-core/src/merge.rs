//! PDF Merge algorithm
//!
//! Combines PDFs into a single document, all pages of the first followed by
//! all pages of the next, with no interleaving.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::error::PdfDeskError;
use crate::page_tree;

/// Merge two PDFs: every page of `first`, then every page of `second`.
pub fn merge_pair(first: &[u8], second: &[u8]) -> Result<Vec<u8>, PdfDeskError> {
    merge_documents(vec![first.to_vec(), second.to_vec()])
}

/// Merge any number of PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Parse every input; any failure fails the whole merge
/// 3. Create a new destination document
/// 4. For each source document:
///    a. Calculate ID offset to avoid conflicts
///    b. Copy its pages with inherited attributes resolved
///    c. Import all objects with remapped IDs
/// 5. Install the collected pages as the destination page tree, prune and save
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfDeskError> {
    if documents.is_empty() {
        return Err(PdfDeskError::OperationError("No documents to merge".into()));
    }

    let mut loaded_docs = Vec::with_capacity(documents.len());
    for (i, doc_bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(doc_bytes).map_err(|e| {
            PdfDeskError::MalformedPdf(format!("Failed to load document {}: {}", i + 1, e))
        })?;
        loaded_docs.push(doc);
    }

    let version = loaded_docs
        .iter()
        .map(|d| d.version.clone())
        .max()
        .unwrap_or_else(|| "1.7".to_string());
    let mut dest = Document::with_version(version);
    let mut dest_pages: Vec<Dictionary> = Vec::new();

    for source in loaded_docs {
        let id_offset = dest.max_id;

        for page_id in page_tree::page_ids(&source) {
            let page = page_tree::materialize_page(&source, page_id)?;
            dest_pages.push(remap_dictionary(page, id_offset));
        }

        let source_max_id = source.max_id;
        let mut remapped_objects = BTreeMap::new();
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            remapped_objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        dest.objects.extend(remapped_objects);

        dest.max_id = (source_max_id + id_offset).max(dest.max_id);
    }

    debug!("Merging {} pages from {} documents", dest_pages.len(), documents.len());
    page_tree::install_pages(&mut dest, dest_pages);
    page_tree::finish(dest)
}

fn remap_dictionary(mut dict: Dictionary, offset: u32) -> Dictionary {
    for (_, value) in dict.iter_mut() {
        *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
    }
    dict
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(remap_dictionary(dict, offset)),
        Object::Stream(mut stream) => {
            stream.dict = remap_dictionary(stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, page_labels};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_pair_combines_pages_in_order() {
        let doc_a = create_test_pdf(2, "DocA");
        let doc_b = create_test_pdf(3, "DocB");

        let merged = merge_pair(&doc_a, &doc_b).unwrap();

        assert_eq!(
            page_labels(&merged),
            vec![
                "DocA-Page-1",
                "DocA-Page-2",
                "DocB-Page-1",
                "DocB-Page-2",
                "DocB-Page-3"
            ]
        );
    }

    #[test]
    fn test_merge_same_document_twice() {
        let doc = create_test_pdf(2, "Same");
        let merged = merge_pair(&doc, &doc).unwrap();
        assert_eq!(
            page_labels(&merged),
            vec!["Same-Page-1", "Same-Page-2", "Same-Page-1", "Same-Page-2"]
        );
    }

    #[test]
    fn test_merge_multiple_documents() {
        let docs: Vec<Vec<u8>> = (0..5)
            .map(|i| create_test_pdf(1, &format!("Doc{}", i)))
            .collect();

        let merged = merge_documents(docs).unwrap();

        assert_eq!(
            page_labels(&merged),
            vec![
                "Doc0-Page-1",
                "Doc1-Page-1",
                "Doc2-Page-1",
                "Doc3-Page-1",
                "Doc4-Page-1"
            ]
        );
    }

    #[test]
    fn test_merge_handles_different_sizes() {
        let doc1 = create_test_pdf(10, "Large");
        let doc2 = create_test_pdf(1, "Small");

        let merged = merge_pair(&doc1, &doc2).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 11);
    }

    #[test]
    fn test_merge_malformed_second_fails() {
        let good = create_test_pdf(1, "Good");
        let err = merge_pair(&good, b"garbage").unwrap_err();
        assert!(matches!(err, PdfDeskError::MalformedPdf(ref msg) if msg.contains("document 2")));
    }

    #[test]
    fn test_merge_malformed_first_fails() {
        let good = create_test_pdf(1, "Good");
        let err = merge_pair(b"", &good).unwrap_err();
        assert!(matches!(err, PdfDeskError::MalformedPdf(ref msg) if msg.contains("document 1")));
    }

    #[test]
    fn test_merged_pages_point_at_new_tree() {
        let merged = merge_pair(&create_test_pdf(1, "A"), &create_test_pdf(1, "B")).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let catalog = doc.catalog().unwrap();
        let root_pages = catalog.get(b"Pages").unwrap().as_reference().unwrap();
        for id in doc.get_pages().values() {
            let page = doc.get_dictionary(*id).unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), root_pages);
        }
    }
}
