use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use tracing::error;

use cf_fight_core::protocol::{
    CreateRoomRequest, ErrorBody, HandleQuery, HealthResponse, RoomCodeRequest, RoomResponse,
    SessionIdRequest, SoloResponse, SoloSetRequest, SolvedResponse, ValidHandle,
};

use crate::error::SessionError;
use crate::judge;
use crate::orchestrator;
use crate::state::AppState;

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
            details: Vec::new(),
        }),
    )
        .into_response()
}

/// Read a JSON request body leniently: an empty body counts as `{}`, so
/// missing fields are reported by the operation rather than the extractor.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, SessionError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| SessionError::Validation {
        message: "Invalid request body".into(),
        details: vec![e.to_string()],
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Health ──────────────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: "CF Fight backend running".into(),
    })
}

// ── Judge lookups ───────────────────────────────────────────────────────

pub async fn validate_handle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HandleQuery>,
) -> Response {
    let Some(handle) = non_blank(query.handle) else {
        return bad_request("Missing handle");
    };

    let check = judge::validate_handle(state.judge.as_ref(), &handle).await;
    match check.info {
        Some(info) if check.valid => Json(ValidHandle {
            valid: true,
            handle,
            rating: info.rating,
            rank: info.rank,
        })
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "valid": false, "error": check.error })),
        )
            .into_response(),
    }
}

/// Debug listing of everything a handle has solved.
pub async fn solved(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HandleQuery>,
) -> Response {
    let Some(handle) = non_blank(query.handle) else {
        return bad_request("Missing handle");
    };

    match judge::solved_set(state.judge.as_ref(), &handle).await {
        Ok(set) => {
            let mut solved: Vec<String> = set.into_iter().map(|k| k.to_string()).collect();
            solved.sort();
            Json(SolvedResponse {
                handle,
                solved_count: solved.len(),
                solved,
            })
            .into_response()
        }
        Err(e) => {
            error!(%handle, error = %e, "failed to fetch solved problems");
            SessionError::from(e).into_response()
        }
    }
}

// ── Duel rooms ──────────────────────────────────────────────────────────

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RoomResponse>, SessionError> {
    let req: CreateRoomRequest = parse_body(&body)?;
    orchestrator::create_duel(&state, req).await.map(Json)
}

pub async fn join_room(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RoomResponse>, SessionError> {
    let req: RoomCodeRequest = parse_body(&body)?;
    let code = non_blank(req.room_code)
        .ok_or_else(|| SessionError::validation("roomCode is required"))?;
    orchestrator::join_duel(&state, &code).map(Json)
}

pub async fn start_room(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RoomResponse>, SessionError> {
    let req: RoomCodeRequest = parse_body(&body)?;
    let code = non_blank(req.room_code)
        .ok_or_else(|| SessionError::validation("roomCode is required"))?;
    orchestrator::start_duel(&state, &code).map(Json)
}

pub async fn room_status(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, SessionError> {
    orchestrator::join_duel(&state, &code).map(Json)
}

pub async fn refresh_solves(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, SessionError> {
    orchestrator::refresh_duel(&state, &code).await.map(Json)
}

// ── Solo sessions ───────────────────────────────────────────────────────

pub async fn solo_set(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SoloResponse>, SessionError> {
    let req: SoloSetRequest = parse_body(&body)?;
    orchestrator::create_solo(&state, req).await.map(Json)
}

pub async fn solo_refresh(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SoloResponse>, SessionError> {
    let req: SessionIdRequest = parse_body(&body)?;
    let id = non_blank(req.session_id)
        .ok_or_else(|| SessionError::validation("sessionId is required"))?;
    orchestrator::refresh_solo(&state, &id).await.map(Json)
}

pub async fn solo_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SoloResponse>, SessionError> {
    orchestrator::solo_status(&state, &id).map(Json)
}

// ── Fallback ────────────────────────────────────────────────────────────

pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".into(),
            details: Vec::new(),
        }),
    )
}
