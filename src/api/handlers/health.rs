use axum::{extract::State, Json};

use crate::api::{state::AppState, types::HealthResponse};

/// GET /api/predict -- liveness probe that also reports model status
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.model();
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "ISL Predict Server is running".to_string(),
        model_path: model.model_path().display().to_string(),
        model_loaded: model.is_loaded(),
    })
}
