use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, PredictionDto};
use crate::predictor::Disease;

#[derive(Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

/// Prediction failures are boundary errors: a bad vector becomes a
/// user-visible message, and no state is touched.
fn run_prediction(
    state: &AppState,
    disease: Disease,
    features: &[f64],
) -> Result<Json<ApiResponse<PredictionDto>>, ApiError> {
    let label = state
        .models()
        .model(disease)
        .predict(features)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    Ok(Json(ApiResponse::success(PredictionDto { label })))
}

/// POST /predict/diabetes
/// Expects 8 features
pub async fn predict_diabetes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<ApiResponse<PredictionDto>>, ApiError> {
    run_prediction(&state, Disease::Diabetes, &payload.features)
}

/// POST /predict/heart
/// Expects 13 features
pub async fn predict_heart_disease(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<ApiResponse<PredictionDto>>, ApiError> {
    run_prediction(&state, Disease::HeartDisease, &payload.features)
}

/// POST /predict/parkinsons
/// Expects 22 features
pub async fn predict_parkinsons(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictRequest>,
) -> Result<Json<ApiResponse<PredictionDto>>, ApiError> {
    run_prediction(&state, Disease::Parkinsons, &payload.features)
}
