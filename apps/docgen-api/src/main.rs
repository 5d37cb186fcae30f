//! Document Generator API Server
//!
//! Fills `{{KEY}}` placeholders in Word templates from JSON requests and
//! converts the result to PDF. Provides REST API endpoints for:
//!
//! - Offer letters, termination letters, certificates and experience letters
//! - Downloading generated DOCX/PDF files
//! - Health and template listing
//!
//! ## Architecture
//!
//! Handlers are thin: they validate the request body against the document
//! kind's schema and hand off to `docgen_core::DocumentGenerator`. After each
//! generation a retention sweep trims the output directory to the newest
//! `--retain` files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use docgen_core::{
    DisabledConverter, DocumentGenerator, DocumentKind, LibreOfficeConverter, PdfConverter,
    RetentionSweeper, DEFAULT_RETAIN,
};
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
#[cfg(test)]
mod tests;

use api::{handle_download, handle_generate, handle_health, handle_list_templates, handle_root};

/// Command-line arguments for the document generator
#[derive(Parser, Debug)]
#[command(name = "docgen-api")]
#[command(about = "Document generator: Word templates to DOCX and PDF")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "DOCGEN_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory holding the .docx templates
    #[arg(long, env = "DOCGEN_TEMPLATES_DIR", default_value = "./templates")]
    templates_dir: PathBuf,

    /// Directory generated files are written to (created if missing)
    #[arg(long, env = "DOCGEN_OUTPUT_DIR", default_value = "./generated_docs")]
    output_dir: PathBuf,

    /// Number of generated files to keep
    #[arg(long, env = "DOCGEN_RETAIN", default_value_t = DEFAULT_RETAIN)]
    retain: usize,

    /// LibreOffice executable used for PDF conversion
    #[arg(long, env = "DOCGEN_CONVERTER", default_value = LibreOfficeConverter::DEFAULT_PROGRAM)]
    converter: String,

    /// Skip PDF conversion and produce DOCX only
    #[arg(long, env = "DOCGEN_NO_PDF")]
    no_pdf: bool,

    /// PDF conversion timeout in seconds
    #[arg(long, env = "DOCGEN_CONVERT_TIMEOUT_SECS", default_value = "120")]
    convert_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
pub struct AppState {
    pub generator: DocumentGenerator,
    pub sweeper: RetentionSweeper,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/templates", get(handle_list_templates))
        .route("/download/:filename", get(handle_download));

    for kind in DocumentKind::ALL {
        app = app.route(
            &format!("/generate/{}", kind.route()),
            post(
                move |State(state): State<Arc<AppState>>, Json(body): Json<Map<String, Value>>| {
                    handle_generate(kind, state, body)
                },
            ),
        );
    }

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(log_level.into())
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting document generator on {}:{}", args.host, args.port);

    tokio::fs::create_dir_all(&args.output_dir).await?;
    if !tokio::fs::try_exists(&args.templates_dir).await.unwrap_or(false) {
        warn!(
            "Templates directory {} does not exist, every generation will fail",
            args.templates_dir.display()
        );
    }

    let converter: Arc<dyn PdfConverter> = if args.no_pdf {
        Arc::new(DisabledConverter)
    } else {
        Arc::new(LibreOfficeConverter::new(
            args.converter.clone(),
            Duration::from_secs(args.convert_timeout_secs),
        ))
    };

    // Create shared state
    let state = Arc::new(AppState {
        generator: DocumentGenerator::new(&args.templates_dir, &args.output_dir, converter),
        sweeper: RetentionSweeper::new(&args.output_dir, args.retain),
    });

    let app = router(state.clone());

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Templates: {}", args.templates_dir.display());
    info!(
        "Output: {} (keeping newest {})",
        args.output_dir.display(),
        state.sweeper.keep()
    );
    info!("PDF converter: {}", state.generator.converter_name());

    axum::serve(listener, app).await?;

    Ok(())
}
