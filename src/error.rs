use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the prediction server
#[derive(Error, Debug)]
pub enum ServeError {
    // Caller input errors
    #[error("{0}")]
    Validation(String),

    // Model artifact errors (retried on the next request)
    #[error("Model not loaded")]
    Model(#[from] ModelError),

    // Input/model contract mismatch
    #[error("{0}")]
    Shape(#[from] ShapeError),

    // Engine execution errors
    #[error("{0}")]
    Inference(#[from] InferenceError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ServeError
pub type Result<T> = std::result::Result<T, ServeError>;

/// Model artifact could not be loaded or allocated
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    #[error("model file not found: {path}")]
    NotFound { path: String },

    #[error("failed to load model {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("model declares no {0} tensor")]
    MissingTensor(&'static str),

    #[error("model support not compiled in (enable the `onnx` feature)")]
    Unsupported,
}

/// Structural mismatch between the landmark input and the model contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Cannot reshape features to {expected}-length vector. Got {got}")]
    Reshape { expected: usize, got: usize },

    #[error("Cannot flatten features to {expected}-length vector. Got {got}")]
    Flatten { expected: usize, got: usize },

    #[error(
        "cannot reshape input of shape {input:?} ({input_len} elements) into {expected:?} ({expected_len} elements)"
    )]
    Mismatch {
        input: Vec<usize>,
        input_len: usize,
        expected: Vec<usize>,
        expected_len: usize,
    },

    #[error("generic reshape from {input:?} to {expected:?} is disabled")]
    GenericReshapeDisabled {
        input: Vec<usize>,
        expected: Vec<usize>,
    },
}

/// Engine rejected the tensor or failed while executing
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    #[error("input tensor shape {got:?} does not match model input {expected:?}")]
    InputRejected { got: Vec<usize>, expected: Vec<String> },

    #[error("inference failed: {0}")]
    Execution(String),

    #[error("inference timed out after {0}ms")]
    Timeout(u64),

    #[error("model produced no output")]
    EmptyOutput,

    #[error("model output has {got} classes, label alphabet has {max}")]
    UnknownClass { got: usize, max: usize },
}

impl ServeError {
    /// HTTP status for this error kind. Only caller input is a 4xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServeError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Underlying detail shown next to the top-level message.
    fn details(&self) -> Option<String> {
        match self {
            ServeError::Model(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// JSON error body: `{"error": ..., "details": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ServeError> for ErrorBody {
    fn from(err: &ServeError) -> Self {
        Self {
            error: err.to_string(),
            details: err.details(),
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}
