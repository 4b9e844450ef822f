//! Inbound webhook endpoints the gateway drives.

use axum::{extract::State, routing::post, Json, Router};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::ClickForm;
use crate::protocol::{validator, CallbackRequest, CallbackResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/click/prepare", post(handle_prepare))
        .route("/click/complete", post(handle_complete))
}

/// PREPARE: reserve/validate a prospective charge. Dry run only.
pub async fn handle_prepare(
    State(state): State<AppState>,
    ClickForm(req): ClickForm<CallbackRequest>,
) -> Result<Json<CallbackResponse>> {
    let conn = state.db.get()?;
    let response = validator::handle_prepare(&conn, &state.click, &req)?;
    Ok(Json(response))
}

/// COMPLETE: confirm or fail the charge.
pub async fn handle_complete(
    State(state): State<AppState>,
    ClickForm(req): ClickForm<CallbackRequest>,
) -> Result<Json<CallbackResponse>> {
    let conn = state.db.get()?;
    let response = validator::handle_complete(&conn, &state.click, &req)?;
    Ok(Json(response))
}
