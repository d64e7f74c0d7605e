//! Full prediction pipeline: negotiate shape, invoke, normalize.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::ml::handle::ModelHandle;
use crate::ml::invoke::InferenceInvoker;
use crate::ml::normalize::PredictionResult;
use crate::ml::shape::ShapeNegotiator;
use crate::ml::tensor::LandmarkTensor;

#[derive(Clone)]
pub struct Predictor {
    handle: Arc<ModelHandle>,
    negotiator: ShapeNegotiator,
    invoker: InferenceInvoker,
}

impl Predictor {
    pub fn new(
        handle: Arc<ModelHandle>,
        negotiator: ShapeNegotiator,
        invoker: InferenceInvoker,
    ) -> Self {
        Self {
            handle,
            negotiator,
            invoker,
        }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub async fn predict(&self, landmarks: LandmarkTensor) -> Result<PredictionResult> {
        let model = self.handle.acquire().await?;

        let input = self
            .negotiator
            .reconcile(landmarks, &model.expected_input)
            .map_err(|e| {
                warn!(error = %e, expected = ?model.expected_input, "shape negotiation failed");
                e
            })?;
        debug!(shape = ?input.shape(), "input shape resolved");

        let scores = self
            .invoker
            .run(Arc::clone(&model.engine), input)
            .await?;
        let result = PredictionResult::from_scores(&scores)?;

        debug!(label = %result.label, score = result.score, "prediction complete");
        Ok(result)
    }
}
