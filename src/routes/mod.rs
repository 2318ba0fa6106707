mod api;
mod ws;

use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
pub fn router() -> Router<AppState> {
    Router::new().merge(api::routes()).merge(ws::routes())
}
