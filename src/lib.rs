pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod ml;
pub mod server;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use error::{InferenceError, ModelError, Result, ServeError, ShapeError};
pub use ml::{
    LandmarkTensor, ModelHandle, PredictionResult, Predictor, ShapeNegotiator, LABELS,
};
