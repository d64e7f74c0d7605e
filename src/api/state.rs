use std::sync::Arc;

use crate::config::AppConfig;
use crate::ml::{
    default_loader, EngineLoader, InferenceInvoker, ModelHandle, Predictor, ShapeNegotiator,
};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Prediction pipeline (holds the process-wide model handle)
    pub predictor: Predictor,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }

    /// Build state from configuration using the compiled-in engine backend.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_loader(config, default_loader())
    }

    /// Build state from configuration with an explicit engine loader.
    pub fn with_loader(config: &AppConfig, loader: Arc<dyn EngineLoader>) -> Self {
        let handle = Arc::new(ModelHandle::new(config.model.path.clone(), loader));
        let predictor = Predictor::new(
            handle,
            ShapeNegotiator::new(config.shape.allow_generic_reshape),
            InferenceInvoker::new(config.model.inference_timeout()),
        );
        Self::new(predictor)
    }

    pub fn model(&self) -> &ModelHandle {
        self.predictor.handle()
    }
}
