//! Page tree plumbing shared by extraction and merging
//!
//! Pages are moved between trees by value: each page dictionary is copied with
//! its inherited attributes filled in, then hung under a fresh flat `/Pages`
//! node. Whatever the old tree referenced and nothing else does is pruned
//! before saving.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::PdfDeskError;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfDeskError> {
    Document::load_mem(bytes).map_err(|e| PdfDeskError::MalformedPdf(e.to_string()))
}

/// Page object ids in page order.
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// A standalone copy of a page dictionary, with inherited attributes made explicit.
pub(crate) fn materialize_page(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Dictionary, PdfDeskError> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| {
            PdfDeskError::MalformedPdf(format!("Page {} {} R: {}", page_id.0, page_id.1, e))
        })?
        .clone();

    let mut parent = parent_of(&page);
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = parent_of(node);
    }

    Ok(page)
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Replace the document's catalog and page tree with one listing `pages` in order.
pub(crate) fn install_pages(doc: &mut Document, pages: Vec<Dictionary>) {
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for mut page in pages {
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(page);
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
}

/// Drop unreachable objects, compress streams and serialize.
pub(crate) fn finish(mut doc: Document) -> Result<Vec<u8>, PdfDeskError> {
    doc.prune_objects();
    doc.compress();
    save(doc)
}

pub(crate) fn save(mut doc: Document) -> Result<Vec<u8>, PdfDeskError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfDeskError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_pdf;

    /// Two pages under an intermediate node that carries MediaBox and Rotate.
    fn nested_tree_pdf() -> Document {
        let mut doc = Document::with_version("1.7");
        let root_id = doc.new_object_id();
        let mid_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..2 {
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(mid_id)),
            ]);
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let mid = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Parent", Object::Reference(root_id)),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(2)),
            ("Rotate", Object::Integer(90)),
        ]);
        doc.objects.insert(mid_id, Object::Dictionary(mid));

        let root = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(mid_id)])),
            ("Count", Object::Integer(2)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(400),
                ]),
            ),
        ]);
        doc.objects.insert(root_id, Object::Dictionary(root));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(root_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    #[test]
    fn test_materialize_pulls_inherited_attributes() {
        let doc = nested_tree_pdf();
        let first = page_ids(&doc)[0];
        let page = materialize_page(&doc, first).unwrap();

        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 300);
    }

    #[test]
    fn test_materialize_keeps_own_values() {
        let bytes = create_test_pdf(1, "Own");
        let doc = load(&bytes).unwrap();
        let page = materialize_page(&doc, page_ids(&doc)[0]).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[3].as_i64().unwrap(), 792);
    }

    #[test]
    fn test_install_pages_replaces_tree() {
        let mut doc = nested_tree_pdf();
        let ids = page_ids(&doc);
        let pages = vec![
            materialize_page(&doc, ids[1]).unwrap(),
            materialize_page(&doc, ids[0]).unwrap(),
            materialize_page(&doc, ids[1]).unwrap(),
        ];
        install_pages(&mut doc, pages);

        let bytes = finish(doc).unwrap();
        let reloaded = load(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
        for id in page_ids(&reloaded) {
            let page = reloaded.get_dictionary(id).unwrap();
            assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        }
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            load(b"not a pdf"),
            Err(PdfDeskError::MalformedPdf(_))
        ));
    }
}
