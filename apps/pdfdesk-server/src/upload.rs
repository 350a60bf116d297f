//! Multipart form collection and scoped font files

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use pdfdesk_core::UploadedFile;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ServerError;

/// Font suffixes accepted for the optional font upload.
const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// A fully read multipart form: file parts by field name, plain fields by name.
#[derive(Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain every part of the request.
    ///
    /// A file part with an empty filename and no content is what browsers send for an
    /// empty `<input type="file">`; it is treated as absent.
    pub async fn read(multipart: &mut Multipart, limit: usize) -> Result<Self, ServerError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| upload_error(e, "request", limit))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| upload_error(e, &name, limit))?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    debug!("Received {} ({} bytes) as '{}'", file_name, bytes.len(), name);
                    form.files
                        .insert(name, UploadedFile::new(file_name, bytes.to_vec()));
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| upload_error(e, &name, limit))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// A required file part.
    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile, ServerError> {
        self.take_file(name)
            .ok_or_else(|| ServerError::InvalidRequest(format!("Missing file '{}'", name)))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn upload_error(err: MultipartError, part: &str, limit: usize) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(limit)
    } else {
        ServerError::InvalidRequest(format!("Failed to read '{}': {}", part, err))
    }
}

/// An uploaded font on disk for the lifetime of one conversion.
///
/// The file is deleted when this value is dropped, whichever way the
/// conversion ends.
pub struct ScopedFont {
    file: NamedTempFile,
}

impl ScopedFont {
    pub fn write(upload: &UploadedFile) -> Result<Self, ServerError> {
        let ext = upload.extension();
        if !FONT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ServerError::InvalidRequest(format!(
                "Unsupported font type '{}'. Upload a .ttf, .otf or .ttc file",
                ext
            )));
        }

        let mut file = tempfile::Builder::new()
            .prefix("pdfdesk-font-")
            .suffix(&format!(".{}", ext))
            .tempfile()
            .map_err(|e| ServerError::Internal(format!("Failed to create temp file: {}", e)))?;
        file.write_all(&upload.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| ServerError::Internal(format!("Failed to write font: {}", e)))?;

        debug!("Uploaded font {} staged at {}", upload.name, file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
