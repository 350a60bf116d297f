//! Error types for the pdfdesk server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfdesk_core::PdfDeskError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Pdf(#[from] PdfDeskError),

    #[error("Conversion timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Pdf(err) => match err {
                PdfDeskError::UnsupportedFormat(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
                }
                PdfDeskError::EmptySelection => (StatusCode::BAD_REQUEST, "EMPTY_SELECTION"),
                PdfDeskError::PageIndexOutOfRange { .. } => {
                    (StatusCode::BAD_REQUEST, "PAGE_OUT_OF_RANGE")
                }
                PdfDeskError::InvalidSelection(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_SELECTION")
                }
                PdfDeskError::MalformedPdf(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_PDF")
                }
                PdfDeskError::ImageDecode(_) | PdfDeskError::Docx(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "CONVERSION_FAILED")
                }
                PdfDeskError::OperationError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ServerError::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ServerError::InvalidRequest(msg) | ServerError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
