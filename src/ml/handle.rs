//! Process-wide model handle with lazy, retrying initialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::ModelError;
use crate::ml::engine::{EngineLoader, InferenceEngine};

/// A loaded engine plus the per-sample input shape it expects.
#[derive(Clone)]
pub struct LoadedModel {
    pub engine: Arc<dyn InferenceEngine>,
    /// Declared input shape without the batch dimension.
    pub expected_input: Vec<usize>,
}

/// Owns the model for the lifetime of the process.
///
/// The first successful [`acquire`](Self::acquire) caches the engine and it
/// is never reloaded. Failures are not cached, so every call after a failed
/// load tries again. Concurrent first calls wait on the same load.
pub struct ModelHandle {
    path: PathBuf,
    loader: Arc<dyn EngineLoader>,
    cell: OnceCell<LoadedModel>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>, loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
            cell: OnceCell::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn acquire(&self) -> Result<&LoadedModel, ModelError> {
        self.cell.get_or_try_init(|| self.load()).await
    }

    async fn load(&self) -> Result<LoadedModel, ModelError> {
        info!(path = %self.path.display(), "loading model");
        let loader = Arc::clone(&self.loader);
        let path = self.path.clone();
        let engine = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| ModelError::Load {
                path: self.path.display().to_string(),
                reason: format!("load task failed: {e}"),
            })
            .and_then(|r| r)
            .map_err(|e| {
                warn!(error = %e, "model load failed; retrying on next request");
                e
            })?;

        let spec = engine.input_spec();
        let expected_input = spec.expected_input().ok_or_else(|| ModelError::Load {
            path: self.path.display().to_string(),
            reason: format!("input shape {spec} has a dynamic feature dimension"),
        })?;

        info!(
            input = %engine.input_spec(),
            output = %engine.output_spec(),
            "model ready"
        );
        Ok(LoadedModel {
            engine,
            expected_input,
        })
    }
}
