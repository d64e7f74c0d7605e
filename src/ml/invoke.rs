//! One request/response cycle against a loaded engine.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::InferenceError;
use crate::ml::engine::{Dim, InferenceEngine};
use crate::ml::tensor::LandmarkTensor;

#[derive(Debug, Clone, Copy)]
pub struct InferenceInvoker {
    timeout: Duration,
}

impl InferenceInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one single-sample pass and return the raw class scores.
    ///
    /// Engine execution happens on a blocking thread and is bounded by the
    /// configured timeout. A timed-out pass is abandoned, not cancelled.
    pub async fn run(
        &self,
        engine: Arc<dyn InferenceEngine>,
        input: LandmarkTensor,
    ) -> Result<Vec<f32>, InferenceError> {
        let (shape, data) = batched(engine.as_ref(), input)?;

        let task = tokio::task::spawn_blocking(move || engine.run(&shape, data));
        let output = match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| InferenceError::Execution(format!("inference task failed: {e}")))??,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                warn!(timeout_ms = ms, "inference timed out; blocking pass left running");
                return Err(InferenceError::Timeout(ms));
            }
        };

        if output.data.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }
        // Strip the batch dimension: keep the first sample only.
        let per_sample = match output.shape.split_first() {
            Some((_, rest)) if !rest.is_empty() => rest.iter().product(),
            _ => output.data.len(),
        };
        let mut scores = output.data;
        scores.truncate(per_sample);
        Ok(scores)
    }
}

/// Prepend the batch dimension and check the tensor against the declared input.
fn batched(
    engine: &dyn InferenceEngine,
    input: LandmarkTensor,
) -> Result<(Vec<usize>, Vec<f32>), InferenceError> {
    let spec = engine.input_spec();
    if let Some(batch) = spec.batch() {
        if !batch.accepts(1) {
            debug!(declared = %batch, "model declares a batch size other than 1; sending 1");
        }
    }

    let (sample_shape, data) = input.into_parts();
    let declared = spec.per_sample();
    let fits = declared.len() == sample_shape.len()
        && declared.iter().zip(&sample_shape).all(|(d, n)| d.accepts(*n));
    if !fits {
        return Err(InferenceError::InputRejected {
            got: sample_shape,
            expected: declared.iter().map(Dim::to_string).collect(),
        });
    }

    let mut shape = Vec::with_capacity(sample_shape.len() + 1);
    shape.push(1);
    shape.extend(sample_shape);
    Ok((shape, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::engine::{EngineOutput, TensorSpec};
    use crate::ml::shape::ShapeNegotiator;
    use std::sync::Mutex;

    /// Records the bound tensor and echoes a fixed output.
    struct RecordingEngine {
        input: TensorSpec,
        output: TensorSpec,
        bound: Mutex<Option<(Vec<usize>, Vec<f32>)>>,
        reply: EngineOutput,
        delay: Duration,
    }

    impl RecordingEngine {
        fn new(input: Vec<Dim>, reply: EngineOutput) -> Self {
            Self {
                input: TensorSpec::new(input),
                output: TensorSpec::new(vec![Dim::Fixed(1), Dim::Fixed(26)]),
                bound: Mutex::new(None),
                reply,
                delay: Duration::ZERO,
            }
        }
    }

    impl InferenceEngine for RecordingEngine {
        fn input_spec(&self) -> &TensorSpec {
            &self.input
        }

        fn output_spec(&self) -> &TensorSpec {
            &self.output
        }

        fn run(&self, shape: &[usize], data: Vec<f32>) -> Result<EngineOutput, InferenceError> {
            std::thread::sleep(self.delay);
            *self.bound.lock().unwrap() = Some((shape.to_vec(), data));
            Ok(self.reply.clone())
        }
    }

    fn joints_input() -> Vec<Dim> {
        vec![Dim::Any, Dim::Fixed(60), Dim::Fixed(21), Dim::Fixed(6)]
    }

    fn scores_reply() -> EngineOutput {
        EngineOutput {
            shape: vec![1, 26],
            data: (0..26).map(|v| v as f32).collect(),
        }
    }

    #[tokio::test]
    async fn negotiated_tensor_is_bound_in_order() {
        let engine = Arc::new(RecordingEngine::new(joints_input(), scores_reply()));
        let values: Vec<f32> = (0..60 * 126).map(|v| v as f32 * 0.5).collect();
        let input = LandmarkTensor::new(vec![60, 126], values.clone()).unwrap();
        let input = ShapeNegotiator::default().reconcile(input, &[60, 21, 6]).unwrap();

        let scores = InferenceInvoker::new(Duration::from_secs(1))
            .run(engine.clone(), input)
            .await
            .unwrap();
        assert_eq!(scores.len(), 26);

        let (shape, data) = engine.bound.lock().unwrap().clone().unwrap();
        assert_eq!(shape, vec![1, 60, 21, 6]);
        assert_eq!(data, values);
    }

    #[tokio::test]
    async fn batch_dimension_is_stripped() {
        let reply = EngineOutput {
            shape: vec![2, 3],
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };
        let engine = Arc::new(RecordingEngine::new(vec![Dim::Fixed(1), Dim::Fixed(2)], reply));
        let input = LandmarkTensor::new(vec![2], vec![0.0, 0.0]).unwrap();
        let scores = InferenceInvoker::new(Duration::from_secs(1))
            .run(engine, input)
            .await
            .unwrap();
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn fixed_batch_other_than_one_is_tolerated() {
        let engine = Arc::new(RecordingEngine::new(vec![Dim::Fixed(4), Dim::Fixed(2)], scores_reply()));
        let input = LandmarkTensor::new(vec![2], vec![0.0, 0.0]).unwrap();
        let result = InferenceInvoker::new(Duration::from_secs(1))
            .run(engine.clone(), input)
            .await;
        assert!(result.is_ok());
        let (shape, _) = engine.bound.lock().unwrap().clone().unwrap();
        assert_eq!(shape, vec![1, 2]);
    }

    #[tokio::test]
    async fn mismatched_sample_shape_is_rejected() {
        let engine = Arc::new(RecordingEngine::new(joints_input(), scores_reply()));
        let input = LandmarkTensor::new(vec![30, 21, 6], vec![0.0; 30 * 126]).unwrap();
        let err = InferenceInvoker::new(Duration::from_secs(1))
            .run(engine, input)
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InputRejected { .. }));
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let mut engine = RecordingEngine::new(vec![Dim::Fixed(1), Dim::Fixed(2)], scores_reply());
        engine.delay = Duration::from_millis(200);
        let input = LandmarkTensor::new(vec![2], vec![0.0, 0.0]).unwrap();
        let err = InferenceInvoker::new(Duration::from_millis(20))
            .run(Arc::new(engine), input)
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Timeout(20)));
    }
}
