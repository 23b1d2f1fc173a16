//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request;
//! the front end polls `View` on its render interval to animate the typing.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "killswitch_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "killswitch_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        // NOTE: the raw text may carry the admin password; log length only.
        debug!(target = "killswitch_backend", len = txt.len(), "WS message received");
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "killswitch_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "killswitch_backend", "WebSocket disconnected");
}

#[instrument(level = "debug", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Start { name } => {
      let (session_id, view) = start_session(state, &name).await;
      tracing::info!(target: "session", id = %session_id, "WS session started");
      ServerWsMessage::Started { session_id, view }
    }

    ClientWsMessage::View { session_id } => match session_view(state, &session_id).await {
      Ok(view) => ServerWsMessage::Session { view },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Stop { session_id } => match do_stop(state, &session_id).await {
      Ok(view) => {
        tracing::info!(target: "session", id = %session_id, "WS kill-switch pressed");
        ServerWsMessage::Session { view }
      }
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Advance { session_id } => match do_advance(state, &session_id).await {
      Ok(view) => ServerWsMessage::Session { view },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Reboot { session_id } => match do_reboot(state, &session_id).await {
      Ok(()) => ServerWsMessage::AdminOk { message: "Session rebooted.".into() },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Leaderboard => {
      let (entries, notice) = state.board_top().await;
      ServerWsMessage::Leaderboard { entries, notice }
    }

    ClientWsMessage::AdminSetPace { password, reveal_interval_ms } => {
      match admin_set_pace(state, &password, reveal_interval_ms).await {
        Ok(message) => ServerWsMessage::AdminOk { message },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::AdminResetBoard { password } => {
      match admin_reset_board(state, &password).await {
        Ok(message) => ServerWsMessage::AdminOk { message },
        Err(message) => ServerWsMessage::Error { message },
      }
    }
  }
}
