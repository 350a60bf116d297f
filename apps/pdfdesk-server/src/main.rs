//! pdfdesk server
//!
//! Serves the browser UI and the two conversion endpoints behind it:
//!
//! - Page extraction: one PDF + a page selection → `extracted_pages.pdf`
//! - Two-file merge: two uploads of mixed formats → `merged.pdf`
//!
//! ## Architecture
//!
//! Every request is self-contained: uploaded bytes are read, converted on a
//! blocking worker, and the result is streamed back as a download. Nothing is
//! stored between requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod upload;

use api::{handle_extract, handle_health, handle_index, handle_info, handle_merge};

/// Command-line arguments for the pdfdesk server
#[derive(Parser, Debug)]
#[command(name = "pdfdesk-server")]
#[command(about = "Browser-based PDF page extraction and file merging")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Per-request conversion timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Maximum request body size in megabytes
    #[arg(long, default_value = "50")]
    max_upload_mb: usize,

    /// Font for text and DOCX inputs (defaults to an installed Korean font)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Conversion timeout in milliseconds
    pub timeout_ms: u64,
    /// Font used for text and DOCX inputs when none is uploaded
    pub default_font: Option<PathBuf>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

/// Routes without transport-level middleware (rate limiting, CORS).
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // UI
        .route("/", get(handle_index))
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/info", post(handle_info))
        .route("/api/extract", post(handle_extract))
        .route("/api/merge", post(handle_merge))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfdesk server on {}:{}", args.host, args.port);

    let default_font = args.font.clone().or_else(pdfdesk_core::find_korean_font);
    match &default_font {
        Some(path) => info!("Default font: {}", path.display()),
        None => warn!("No Korean font found; text inputs will use the builtin Latin font"),
    }

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let state = AppState {
        timeout_ms: args.timeout_ms,
        default_font,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Conversion timeout: {}ms", args.timeout_ms);

    // The governor keys on the peer address.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
