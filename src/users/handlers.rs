use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};

use super::{
    dto::{normalize_identifier, ListParams, UserPayload},
    error::AccountError,
    repo_types::{PagedResult, User},
};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(find_all).post(store))
        .route("/users/:id", get(find).put(update).delete(delete))
}

/// Error body returned to callers: `{ id, code, detail, status }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub id: String,
    pub code: u16,
    pub detail: String,
    pub status: String,
    #[serde(skip)]
    http: StatusCode,
}

impl ApiError {
    fn new(state: &AppState, op: &str, http: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            id: format!("{}.{}", state.config.service_name, op),
            code: http.as_u16(),
            detail: detail.into(),
            status: http.canonical_reason().unwrap_or_default().to_string(),
            http,
        }
    }

    fn bad_request(state: &AppState, op: &str, detail: impl Into<String>) -> Self {
        Self::new(state, op, StatusCode::BAD_REQUEST, detail)
    }

    fn from_account(state: &AppState, op: &str, e: AccountError) -> Self {
        let http = match e {
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::AlreadyExists => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(state, op, http, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.http, Json(self)).into_response()
    }
}

#[instrument(skip(state))]
pub async fn find(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<User>, ApiError> {
    let identifier = normalize_identifier(&identifier);
    state.accounts.find(&identifier).await.map(Json).map_err(|e| {
        warn!(error = %e, %identifier, "find failed");
        ApiError::from_account(&state, "find", e)
    })
}

#[instrument(skip(state, payload))]
pub async fn store(
    State(state): State<AppState>,
    Json(mut payload): Json<UserPayload>,
) -> Result<StatusCode, ApiError> {
    if let Err(msg) = payload.validate(true) {
        warn!(email = %payload.email, reason = %msg, "invalid user");
        return Err(ApiError::bad_request(&state, "store", msg));
    }

    state
        .accounts
        .store(payload.into())
        .await
        .map_err(|e| {
            warn!(error = %e, "store failed");
            ApiError::from_account(&state, "store", e)
        })?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<UserPayload>,
) -> Result<StatusCode, ApiError> {
    if let Err(msg) = payload.validate(false) {
        warn!(user_id = %id, reason = %msg, "invalid user");
        return Err(ApiError::bad_request(&state, "update", msg));
    }

    state
        .accounts
        .update(&id, payload.into())
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %id, "update failed");
            ApiError::from_account(&state, "update", e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn find_all(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult>, ApiError> {
    let Query(p) = query.map_err(|e| {
        warn!(error = %e, "invalid list query");
        ApiError::bad_request(&state, "findAll", e.body_text())
    })?;
    state
        .accounts
        .find_all(p.page, p.limit, &p.order_by, &p.order_type)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "find_all failed");
            ApiError::from_account(&state, "findAll", e)
        })
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete(&id).await.map_err(|e| {
        warn!(error = %e, user_id = %id, "delete failed");
        ApiError::from_account(&state, "delete", e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}
