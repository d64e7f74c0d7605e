use serde::{Deserialize, Serialize};

pub use crate::ml::PredictionResult;

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_path: String,
    pub model_loaded: bool,
}
