//! HTTP surface of the gateway.
//!
//! CRUD routes are a thin passthrough to the document store; `/match`
//! hands off to the match orchestrator. Failures come back as
//! structured `{"error": {"kind", "message"}}` bodies and never take
//! the process down.

use axum::extract::{FromRequest, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use facegate_core::matcher::{MatchEngine, MatchError};
use facegate_core::store::{PersonStore, StoreError};
use facegate_core::types::{MatchOutcome, PersonPatch, PersonRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PersonStore>,
    engine: Arc<MatchEngine>,
}

impl AppState {
    pub fn new(store: Arc<dyn PersonStore>, engine: Arc<MatchEngine>) -> Self {
        Self { store, engine }
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add", post(add))
        .route("/list", get(list))
        .route("/update", post(update).put(update))
        .route("/delete", get(delete).delete(delete))
        .route("/match", post(match_probe))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Error response: status code plus a machine-readable kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": { "kind": self.kind, "message": self.message }
        }));
        (self.status, body).into_response()
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        let (status, kind) = match &err {
            MatchError::Decode(_) => (StatusCode::BAD_REQUEST, "decode_error"),
            MatchError::NoFaceDetected => (StatusCode::BAD_REQUEST, "no_face_detected"),
            MatchError::Store(_) => (StatusCode::BAD_GATEWAY, "store_unavailable"),
            MatchError::Embed(_) => (StatusCode::BAD_GATEWAY, "embedder_unavailable"),
            MatchError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

/// JSON body extractor that keeps rejections inside the gateway's
/// error envelope: a missing or malformed body is a 400 with
/// `{"error": {...}}`, never axum's default plain-text 422.
struct ApiJson<T>(T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let (status, kind) = match &err {
            StoreError::Unavailable(_) => (StatusCode::BAD_GATEWAY, "store_unavailable"),
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            StoreError::Rejected(_) => (StatusCode::BAD_GATEWAY, "store_rejected"),
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatchRequest {
    base64: String,
}

async fn add(
    State(state): State<AppState>,
    ApiJson(record): ApiJson<PersonRecord>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.put(&record).await?;
    tracing::info!(name = %record.name, "record added");
    Ok(Json(json!({ "success": true })))
}

/// One record when `?id=` is given, the whole collection otherwise.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = match query.id {
        Some(id) => serde_json::to_value(state.store.get(&id).await?),
        None => serde_json::to_value(state.store.stream_all().await?),
    }
    .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(body))
}

/// Merge-update: the body needs a `name`; everything else, the image
/// included, is optional and merged into the stored record.
async fn update(
    State(state): State<AppState>,
    ApiJson(patch): ApiJson<PersonPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.update(&patch).await?;
    tracing::info!(name = %patch.name, "record updated");
    Ok(Json(json!({ "success": true })))
}

async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("missing id query parameter"))?;
    state.store.delete(&id).await?;
    tracing::info!(name = %id, "record deleted");
    Ok(Json(json!({ "success": true })))
}

async fn match_probe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MatchRequest>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let outcome = state.engine.identify(&request.base64).await?;
    Ok(Json(outcome))
}
