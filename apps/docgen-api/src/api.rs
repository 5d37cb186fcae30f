//! API handlers for the document generator
//!
//! Provides REST endpoints for:
//! - Document generation, one route per document kind
//! - Downloading generated files
//! - Health and template listing

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::Response,
    Json,
};
use docgen_core::{extract_fields, DocumentKind};
use serde::Serialize;
use serde_json::{Map, Value};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::AppState;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MIME: &str = "application/pdf";

/// Service info response
#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Handler: GET /
pub async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Document Generator API is running",
    })
}

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
        service: "docgen-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Template list response
#[derive(Serialize)]
pub struct TemplateListResponse {
    pub success: bool,
    pub templates: Vec<TemplateInfo>,
    pub count: usize,
}

/// Document kind metadata
#[derive(Serialize)]
pub struct TemplateInfo {
    pub kind: DocumentKind,
    pub route: String,
    pub template_file: &'static str,
    pub required_fields: Vec<&'static str>,
    /// Whether the template file is present in the templates directory
    pub available: bool,
}

/// Handler: GET /templates
pub async fn handle_list_templates(State(state): State<Arc<AppState>>) -> Json<TemplateListResponse> {
    let mut templates = Vec::with_capacity(DocumentKind::ALL.len());
    for kind in DocumentKind::ALL {
        let available = tokio::fs::try_exists(state.generator.template_path(kind))
            .await
            .unwrap_or(false);
        templates.push(TemplateInfo {
            kind,
            route: format!("/generate/{}", kind.route()),
            template_file: kind.template_file(),
            required_fields: kind.fields().iter().map(|spec| spec.field).collect(),
            available,
        });
    }

    let count = templates.len();
    Json(TemplateListResponse {
        success: true,
        templates,
        count,
    })
}

/// Generation response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub docx_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Handler: POST /generate/{kind}
///
/// Registered once per [`DocumentKind`]; the kind is bound when the route is
/// built.
pub async fn handle_generate(
    kind: DocumentKind,
    state: Arc<AppState>,
    body: Map<String, Value>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let fields = extract_fields(kind.fields(), &body)?;
    debug!(kind = %kind, fields = fields.len(), "Validated request");

    let document = state.generator.generate(kind, &fields).await?;

    // runs in the background, the response does not wait for it
    state.sweeper.spawn();

    info!(
        kind = %kind,
        docx = %document.docx_filename,
        pdf = document.pdf_filename.as_deref().unwrap_or("-"),
        "Document generated"
    );

    Ok(Json(GenerateResponse {
        success: true,
        message: format!("{} generated successfully", kind.label()),
        docx_url: download_url(&document.docx_filename),
        pdf_url: document.pdf_filename.as_deref().map(download_url),
        warning: document.warning,
    }))
}

/// Handler: GET /download/:filename
pub async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    if !is_plain_filename(&filename) {
        warn!(filename = %filename, "Rejected download name");
        return Err(ApiError::InvalidFilename(filename));
    }

    let path = state.generator.output_dir().join(&filename);
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ApiError::FileNotFound(filename));
    }

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status().is_success() {
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type(&filename)),
        );
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}

pub fn download_url(filename: &str) -> String {
    format!("/download/{}", filename)
}

/// MIME type by extension: `.docx` is a Word document, anything else a PDF.
///
/// The match is case-sensitive; generated names are always lowercase.
pub fn content_type(filename: &str) -> &'static str {
    if filename.ends_with(".docx") {
        DOCX_MIME
    } else {
        PDF_MIME
    }
}

/// A single path component made of `[A-Za-z0-9._-]`, not hidden and not `..`.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
