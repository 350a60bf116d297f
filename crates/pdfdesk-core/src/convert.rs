//! Format normalization
//!
//! Turns any supported upload into PDF bytes:
//! - PDF: returned untouched
//! - Raster images: one page, sized to the image at 72 dpi
//! - Text / Markdown: lossy UTF-8, laid out by the text renderer
//! - DOCX: paragraph text only, laid out by the text renderer

use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::docx;
use crate::error::PdfDeskError;
use crate::format::{SourceFormat, UploadedFile};
use crate::page_tree;
use crate::text_render;

/// Convert an uploaded file to PDF bytes.
///
/// `font` is only consulted for text and DOCX inputs; a font that cannot be
/// loaded falls back to the builtin face instead of failing.
pub fn convert_to_pdf(file: &UploadedFile, font: Option<&Path>) -> Result<Vec<u8>, PdfDeskError> {
    let format = SourceFormat::from_filename(&file.name)?;
    debug!("Converting {} ({} bytes) as {:?}", file.name, file.len(), format);
    convert_bytes(&file.bytes, format, font)
}

/// Convert raw bytes of an already classified input.
pub fn convert_bytes(
    bytes: &[u8],
    format: SourceFormat,
    font: Option<&Path>,
) -> Result<Vec<u8>, PdfDeskError> {
    match format {
        SourceFormat::Pdf => Ok(bytes.to_vec()),
        SourceFormat::Image(image_format) => image_to_pdf(bytes, image_format),
        SourceFormat::Text => Ok(text_to_pdf(bytes, font)),
        SourceFormat::Docx => {
            let text = docx::docx_to_text(bytes)?;
            Ok(text_render::render_text(&text, font))
        }
    }
}

/// Decode as UTF-8, replacing invalid sequences, and render.
pub fn text_to_pdf(bytes: &[u8], font: Option<&Path>) -> Vec<u8> {
    let text = String::from_utf8_lossy(bytes);
    text_render::render_text(&text, font)
}

/// Pixel data ready to be embedded as an image XObject.
struct FlatImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    pixels: Vec<u8>,
}

/// Reduce any decoded image to 8-bit gray or 8-bit RGB.
///
/// Alpha is dropped, not blended against a background.
fn flatten(image: DynamicImage) -> FlatImage {
    let (width, height) = (image.width(), image.height());
    match image.color() {
        ColorType::L8 | ColorType::L16 => FlatImage {
            width,
            height,
            color_space: "DeviceGray",
            pixels: image.to_luma8().into_raw(),
        },
        _ => FlatImage {
            width,
            height,
            color_space: "DeviceRGB",
            pixels: image.to_rgb8().into_raw(),
        },
    }
}

/// Wrap a single raster image as a one-page PDF.
pub fn image_to_pdf(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>, PdfDeskError> {
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PdfDeskError::ImageDecode(e.to_string()))?;
    let flat = flatten(decoded);
    debug!(
        "Embedding {}x{} {} image",
        flat.width, flat.height, flat.color_space
    );

    let compressed = deflate(&flat.pixels)
        .map_err(|e| PdfDeskError::OperationError(format!("Failed to compress image: {}", e)))?;
    build_image_document(&flat, compressed)
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn build_image_document(flat: &FlatImage, compressed: Vec<u8>) -> Result<Vec<u8>, PdfDeskError> {
    let (width, height) = (flat.width as i64, flat.height as i64);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width)),
        ("Height", Object::Integer(height)),
        ("ColorSpace", Object::Name(flat.color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    let image_id = doc.add_object(Stream::new(image_dict, compressed));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfDeskError::OperationError(format!("Failed to encode content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let resources = Dictionary::from_iter(vec![(
        "XObject",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Im0",
            Object::Reference(image_id),
        )])),
    )]);

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);
    let page_id = doc.add_object(page);

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    page_tree::save(doc)
}
