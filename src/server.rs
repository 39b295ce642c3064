//! HTTP surface for the browser wizard.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET  | `/health`      | `{"status":"ok"}` |
//! | POST | `/api/extract` | extracted course facts |
//! | POST | `/api/compose` | `{markdown, layoutSpec, titleMatches}` |
//! | POST | `/api/review`  | `{report}` |
//! | POST | `/api/render`  | `application/pdf` attachment |
//!
//! Every failure is `{"error": "<message>"}` with the status from
//! [`WizardError::status_code`]. A body that is not valid JSON for the
//! endpoint gets 400 `Invalid JSON body`.

use crate::error::WizardError;
use crate::pipeline::compose::ComposeRequest;
use crate::pipeline::extract::ExtractRequest;
use crate::pipeline::render::RenderRequest;
use crate::pipeline::review::ReviewRequest;
use crate::wizard::Wizard;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Response header carrying the suggested PDF file name.
pub const SUGGESTED_FILENAME_HEADER: &str = "x-suggested-filename";

const INVALID_JSON: &str = "Invalid JSON body";

impl IntoResponse for WizardError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn bad_json(rejection: JsonRejection) -> Response {
    info!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": INVALID_JSON })),
    )
        .into_response()
}

/// Build the router around a shared [`Wizard`].
pub fn router(wizard: Arc<Wizard>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/extract", post(extract_endpoint))
        .route("/api/compose", post(compose_endpoint))
        .route("/api/review", post(review_endpoint))
        .route("/api/render", post(render_endpoint))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(wizard)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(wizard: Arc<Wizard>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Whitepaper wizard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(wizard)).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn extract_endpoint(
    State(wizard): State<Arc<Wizard>>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(e),
    };
    match wizard.extract(&req).await {
        Ok(data) => Json(data).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn compose_endpoint(
    State(wizard): State<Arc<Wizard>>,
    body: Result<Json<ComposeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(e),
    };
    match wizard.compose(&req).await {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn review_endpoint(
    State(wizard): State<Arc<Wizard>>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(e),
    };
    match wizard.review(&req).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn render_endpoint(
    State(wizard): State<Arc<Wizard>>,
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(e),
    };
    let pdf = match wizard.render(&req).await {
        Ok(pdf) => pdf,
        Err(e) => return e.into_response(),
    };

    // Sanitised names are plain ASCII, so these header values always parse.
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", pdf.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let suggested = HeaderValue::from_str(&pdf.filename)
        .unwrap_or_else(|_| HeaderValue::from_static("whitepaper.pdf"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (HeaderName::from_static(SUGGESTED_FILENAME_HEADER), suggested),
        ],
        pdf.bytes,
    )
        .into_response()
}
