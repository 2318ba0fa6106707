use axum::Router;
use axum::routing::get;

use crate::handlers::ws::ws_handler;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws/session/{persona_id}", get(ws_handler))
}
