//! Route handlers for the query API.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use releasewatch_shared::{PersistedUpdate, ReleaseWatchError};

use crate::AppState;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Query string of `GET /updates`.
///
/// `limit` is taken as text so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatesQuery {
    pub tool: Option<String>,
    pub limit: Option<String>,
}

/// Public view of a persisted update. Identity, row id and revision stay internal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateView {
    pub tool: String,
    pub version: String,
    pub date: NaiveDate,
    pub description: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PersistedUpdate> for UpdateView {
    fn from(u: PersistedUpdate) -> Self {
        Self {
            tool: u.tool,
            version: u.version,
            date: u.date,
            description: u.description,
            link: u.link,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Storage failures surface as 500 with the raw message.
pub struct ApiError(ReleaseWatchError);

impl From<ReleaseWatchError> for ApiError {
    fn from(e: ReleaseWatchError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "ReleaseWatch API is running",
    }))
}

/// `GET /updates?tool=<substring>&limit=<n>`, newest first.
pub async fn list_updates(
    State(state): State<AppState>,
    Query(query): Query<UpdatesQuery>,
) -> Result<Json<Vec<UpdateView>>, ApiError> {
    let limit = parse_limit(query.limit.as_deref()).unwrap_or(state.default_limit);
    let updates = state
        .storage
        .list_updates(query.tool.as_deref(), limit)
        .await?;

    Ok(Json(updates.into_iter().map(UpdateView::from).collect()))
}

/// `OPTIONS` always succeeds, whether or not the CORS layer answered it first.
pub async fn options() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Positive integer, or `None` when missing or malformed.
fn parse_limit(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
