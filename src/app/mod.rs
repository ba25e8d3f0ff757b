pub mod registration_store;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::analysis::{AnalysisConfig, AnalysisService};
use crate::formats::{Classification, ErrorBody, MessageBody, OcrRequest, RegisterRequest};
use crate::gateway;
use registration_store::RegistrationStore;

#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<dyn AnalysisService>,
    pub analysis_config: Arc<AnalysisConfig>,
    pub registrations: Arc<dyn RegistrationStore>,
    /// Request body cap for `/api/ocr`; `None` lifts it entirely.
    pub max_upload_bytes: Option<usize>,
}

/// Base64 PDFs are about 4/3 of the file size, so this admits scans of
/// roughly 48 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Reads `DOCCLASSIFY_MAX_UPLOAD_BYTES`. Unset means the default; `0` means
/// no limit.
pub fn max_upload_bytes_from_env() -> anyhow::Result<Option<usize>> {
    let raw = std::env::var("DOCCLASSIFY_MAX_UPLOAD_BYTES").unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Some(DEFAULT_MAX_UPLOAD_BYTES));
    }
    let bytes = raw
        .parse::<usize>()
        .with_context(|| format!("invalid DOCCLASSIFY_MAX_UPLOAD_BYTES={raw:?}"))?;
    Ok((bytes > 0).then_some(bytes))
}

pub fn router(state: AppState) -> Router {
    let upload_limit = match state.max_upload_bytes {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/ocr", post(ocr_handler).layer(upload_limit))
        .route("/api/register", post(register_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
}

async fn ocr_handler(
    State(state): State<AppState>,
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Result<Json<Vec<Classification>>, ApiError> {
    let Json(request) = payload.map_err(|err| {
        tracing::warn!(error = %err.body_text(), "invalid ocr body");
        api_error(
            rejection_status(&err),
            format!("invalid request body: {}", err.body_text()),
        )
    })?;

    // Forwarded verbatim; the analysis service owns base64 decoding.
    if request.pdf_binary.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "pdfBinary is required"));
    }

    tracing::info!(
        encoded_bytes = request.pdf_binary.len(),
        client_page_count = ?request.page_count,
        "ocr request"
    );

    let structure = gateway::structure_request(
        &state.analysis_config,
        request.pdf_binary,
        request.classification_prompt,
    );
    match gateway::classify_pdf(state.analysis.as_ref(), &structure).await {
        Ok(classifications) => Ok(Json(classifications)),
        Err(err) => {
            tracing::error!(error = ?err, "classification failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

/// Oversized bodies keep their 413; every other unreadable body is a 500.
fn rejection_status(rejection: &JsonRejection) -> StatusCode {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return StatusCode::PAYLOAD_TOO_LARGE;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

fn message(status: StatusCode, message: &str) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message: message.to_owned(),
        }),
    )
}

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> (StatusCode, Json<MessageBody>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(err) => {
            tracing::error!(error = %err.body_text(), "invalid registration body");
            return message(
                rejection_status(&err),
                "an error occurred during registration",
            );
        }
    };

    let classifications = request.classifications.unwrap_or_default();
    if classifications.is_empty() {
        return message(StatusCode::BAD_REQUEST, "no classification data");
    }

    match state.registrations.register(&classifications).await {
        Ok(()) => message(StatusCode::OK, "registration complete"),
        Err(err) => {
            tracing::error!(?err, "registration failed");
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "an error occurred during registration",
            )
        }
    }
}
