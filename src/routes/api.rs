use axum::Router;
use axum::routing::{get, post};

use crate::handlers::api;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/personas", get(api::list_personas))
        .route("/personas/{id}", get(api::get_persona))
        .route("/products", get(api::list_products))
        .route("/products/{id}", get(api::get_product))
        .route("/evaluations", post(api::create_evaluation))
}
