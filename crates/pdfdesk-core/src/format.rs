//! Input classification
//!
//! Uploads are tagged with a [`SourceFormat`] exactly once, from the filename
//! suffix. Everything downstream matches on the tag instead of the string.

use image::ImageFormat;

use crate::error::PdfDeskError;

/// An uploaded file: its declared name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased text after the last `.`; the whole name when there is no dot.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Every input kind the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Image(ImageFormat),
    Text,
    Docx,
}

/// Extensions accepted by the upload controls, in display order.
pub const SUPPORTED_EXTENSIONS: [&str; 10] = [
    "pdf", "png", "jpg", "jpeg", "bmp", "gif", "tiff", "txt", "md", "docx",
];

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Result<Self, PdfDeskError> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "pdf" => SourceFormat::Pdf,
            "png" => SourceFormat::Image(ImageFormat::Png),
            "jpg" | "jpeg" => SourceFormat::Image(ImageFormat::Jpeg),
            "bmp" => SourceFormat::Image(ImageFormat::Bmp),
            "gif" => SourceFormat::Image(ImageFormat::Gif),
            "tiff" => SourceFormat::Image(ImageFormat::Tiff),
            "txt" | "md" => SourceFormat::Text,
            "docx" => SourceFormat::Docx,
            other => return Err(PdfDeskError::UnsupportedFormat(other.to_string())),
        };
        Ok(format)
    }

    pub fn from_filename(name: &str) -> Result<Self, PdfDeskError> {
        Self::from_extension(&extension_of(name))
    }
}

fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}
