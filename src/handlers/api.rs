//! REST handlers: catalogs, health, and evaluation.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::errors::{AppError, AppResult};
use crate::eval::{self, EvaluationReport, EvaluationRequest};
use crate::persona::{self, Persona};
use crate::products::Product;
use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pitchroom",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_personas() -> Json<Vec<Persona>> {
    Json(persona::all().to_vec())
}

pub async fn get_persona(Path(id): Path<String>) -> AppResult<Json<Persona>> {
    persona::find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("persona {id}")))
}

pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.products.all().to_vec())
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    state
        .products
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Score a finished session transcript.
pub async fn create_evaluation(
    Json(request): Json<EvaluationRequest>,
) -> AppResult<Json<EvaluationReport>> {
    let report = eval::evaluate(&request)?;
    Ok(Json(report))
}
