//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors become a JSON body with a 4xx status.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

fn bad_request(error: String) -> impl IntoResponse {
  (StatusCode::BAD_REQUEST, Json(ErrorOut { error }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(name_len = body.name.len()))]
pub async fn http_post_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> impl IntoResponse {
  let (session_id, view) = start_session(&state, &body.name).await;
  info!(target: "session", id = %session_id, "HTTP session started");
  Json(StartOut { session_id, view })
}

#[instrument(level = "debug", skip(state), fields(%q.session_id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> impl IntoResponse {
  match session_view(&state, &q.session_id).await {
    Ok(view) => Json(view).into_response(),
    Err(e) => bad_request(e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_stop(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> impl IntoResponse {
  match do_stop(&state, &body.session_id).await {
    Ok(view) => Json(view).into_response(),
    Err(e) => bad_request(e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_advance(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> impl IntoResponse {
  match do_advance(&state, &body.session_id).await {
    Ok(view) => Json(view).into_response(),
    Err(e) => bad_request(e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_reboot(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> impl IntoResponse {
  match do_reboot(&state, &body.session_id).await {
    Ok(()) => Json(OkOut { ok: true }).into_response(),
    Err(e) => bad_request(e).into_response(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (entries, notice) = state.board_top().await;
  Json(LeaderboardOut { entries, notice })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_admin_pace(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AdminPaceIn>,
) -> impl IntoResponse {
  match admin_set_pace(&state, &body.password, body.reveal_interval_ms).await {
    Ok(message) => Json(AdminOut { message }).into_response(),
    Err(e) => (StatusCode::FORBIDDEN, Json(ErrorOut { error: e })).into_response(),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_admin_reset(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AdminResetIn>,
) -> impl IntoResponse {
  match admin_reset_board(&state, &body.password).await {
    Ok(message) => Json(AdminOut { message }).into_response(),
    Err(e) => (StatusCode::FORBIDDEN, Json(ErrorOut { error: e })).into_response(),
  }
}
