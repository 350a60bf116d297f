//! API handlers for the pdfdesk server
//!
//! Provides REST endpoints for:
//! - PDF inspection (page count before selecting pages)
//! - Page extraction
//! - Two-file conversion and merging

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use pdfdesk_core::{
    convert_to_pdf, extract_pages, merge_pair, parse_selection, pdf_info, PdfDeskError,
    PdfInfo, SourceFormat,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::upload::{ScopedFont, UploadForm};
use crate::AppState;

const EXTRACT_FILENAME: &str = "extracted_pages.pdf";
const MERGE_FILENAME: &str = "merged.pdf";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfdesk-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub info: PdfInfo,
}

/// Handler: POST /api/info
pub async fn handle_info(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<InfoResponse>, ServerError> {
    let mut form = UploadForm::read(&mut multipart, state.max_upload_bytes).await?;
    let file = form.require_file("file")?;
    require_pdf(&file.name)?;

    let info = run_blocking(&state, move || pdf_info(&file.bytes)).await?;
    debug!("Info: {} pages, PDF {}", info.page_count, info.version);

    Ok(Json(InfoResponse {
        success: true,
        info,
    }))
}

/// Handler: POST /api/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let mut form = UploadForm::read(&mut multipart, state.max_upload_bytes).await?;
    let file = form.require_file("file")?;
    require_pdf(&file.name)?;

    let selection = parse_selection(form.field("pages").unwrap_or_default())?;
    info!(
        "Extract request: {} ({} bytes), pages {:?}",
        file.name,
        file.len(),
        selection
    );

    let pdf = run_blocking(&state, move || extract_pages(&file.bytes, &selection)).await?;

    info!("Extracted PDF: {} bytes", pdf.len());
    Ok(pdf_download(pdf, EXTRACT_FILENAME))
}

/// Handler: POST /api/merge
pub async fn handle_merge(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let mut form = UploadForm::read(&mut multipart, state.max_upload_bytes).await?;
    let (first, second) = match (form.take_file("file1"), form.take_file("file2")) {
        (Some(first), Some(second)) => (first, second),
        _ => {
            return Err(ServerError::InvalidRequest(
                "Upload two files to merge".into(),
            ))
        }
    };

    // Reject unknown formats before any conversion work starts.
    SourceFormat::from_filename(&first.name)?;
    SourceFormat::from_filename(&second.name)?;

    let scoped_font = form.take_file("font").map(|f| ScopedFont::write(&f)).transpose()?;
    let default_font = state.default_font.clone();

    info!(
        "Merge request: {} ({} bytes) + {} ({} bytes), uploaded font: {}",
        first.name,
        first.len(),
        second.name,
        second.len(),
        scoped_font.is_some()
    );

    // The scoped font moves into the job so it outlives the conversion, even
    // past a timeout.
    let pdf = run_blocking(&state, move || {
        let font = scoped_font
            .as_ref()
            .map(|f| f.path().to_path_buf())
            .or(default_font);
        let first_pdf = convert_to_pdf(&first, font.as_deref())?;
        let second_pdf = convert_to_pdf(&second, font.as_deref())?;
        merge_pair(&first_pdf, &second_pdf)
    })
    .await?;

    info!("Merged PDF: {} bytes", pdf.len());
    Ok(pdf_download(pdf, MERGE_FILENAME))
}

fn require_pdf(name: &str) -> Result<(), ServerError> {
    match SourceFormat::from_filename(name)? {
        SourceFormat::Pdf => Ok(()),
        _ => Err(ServerError::InvalidRequest(format!(
            "'{}' is not a PDF file",
            name
        ))),
    }
}

/// Run a conversion on the blocking pool, bounded by the configured timeout.
async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, PdfDeskError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(job);
    let joined = tokio::time::timeout(Duration::from_millis(state.timeout_ms), task)
        .await
        .map_err(|_| ServerError::Timeout(state.timeout_ms))?;
    let result = joined.map_err(|e| ServerError::Internal(format!("Worker task failed: {}", e)))?;
    Ok(result?)
}

fn pdf_download(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}
