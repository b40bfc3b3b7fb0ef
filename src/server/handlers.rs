//! HTTP route handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::RelayError;
use crate::server::state::AppState;
use crate::store::{NewResponse, ResponseLog};
use crate::types::{RelayPayload, RelayReply};

/// `POST /process-payload`: relay a chat payload upstream and log the result.
///
/// The upstream call happens first; the response row is written before the
/// content is returned, so a logged row exists for every reply the caller
/// ever sees.
pub async fn process_payload(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RelayPayload>,
) -> Result<Json<RelayReply>, RelayError> {
    let completion = state.upstream.complete(&payload).await?;

    let message = serde_json::to_string(&payload)
        .map_err(|e| RelayError::Persistence(e.to_string()))?;
    let record = NewResponse {
        message,
        completion_id: completion.completion_id,
        model_used: completion.model_used,
        created_timestamp: completion.created_timestamp,
        content: completion.content,
        prompt_tokens: completion.prompt_tokens,
        completion_tokens: completion.completion_tokens,
        total_tokens: completion.total_tokens,
    };

    // The log connection lives only for this one insert; it is dropped on
    // every exit path, success or error.
    let id = ResponseLog::open(&state.db_path)
        .and_then(|log| log.insert(&record))
        .map_err(|e| RelayError::Persistence(e.to_string()))?;

    tracing::info!(
        record = id,
        model = %record.model_used,
        total_tokens = record.total_tokens,
        "relayed completion"
    );

    Ok(Json(RelayReply {
        content: record.content,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /responses`: page through logged responses, newest first.
pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    let offset = params.offset.unwrap_or(0);

    let result = ResponseLog::open(&state.db_path).and_then(|log| {
        let records = log.list(limit, offset)?;
        let total = log.count()?;
        Ok((records, total))
    });

    match result {
        Ok((records, total)) => (
            StatusCode::OK,
            Json(json!({
                "total": total,
                "limit": limit,
                "offset": offset,
                "responses": records,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

/// `GET /responses/:id`: fetch one logged response.
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match ResponseLog::open(&state.db_path).and_then(|log| log.get(id)) {
        Ok(Some(record)) => (StatusCode::OK, Json(json!(record))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Response not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

/// `GET /stats`: row count and token totals across the whole log.
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match ResponseLog::open(&state.db_path).and_then(|log| log.stats()) {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
