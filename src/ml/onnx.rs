//! ONNX inference backend (pure Rust via `tract-onnx`).
//!
//! Keeps deployment free of native inference runtimes.

use std::path::Path;
use std::sync::Arc;

use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;
use tracing::{debug, info};

use crate::error::{InferenceError, ModelError};
use crate::ml::engine::{Dim, EngineLoader, EngineOutput, InferenceEngine, TensorSpec};

pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input: TensorSpec,
    output: TensorSpec,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model, optimize it and record its declared shapes.
    ///
    /// A symbolic batch dimension is pinned to 1 so the optimizer can
    /// specialize the graph; feature dimensions are taken as declared.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ModelError::NotFound { path: display });
        }
        let load_err = |stage: &str, e: TractError| ModelError::Load {
            path: display.clone(),
            reason: format!("{stage}: {e}"),
        };

        let mut model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| load_err("onnx load failed", e))?;

        let declared = model
            .clone()
            .into_typed()
            .map_err(|e| load_err("onnx type analysis failed", e))?;
        let input = declared_spec(
            declared
                .input_fact(0)
                .map_err(|_| ModelError::MissingTensor("input"))?,
        );

        if matches!(input.batch(), Some(Dim::Any)) {
            let mut shape = tvec!(1usize);
            for d in input.per_sample() {
                let Some(n) = d.fixed() else {
                    return Err(ModelError::Load {
                        path: display.clone(),
                        reason: format!("input shape {input} has a dynamic feature dimension"),
                    });
                };
                shape.push(n);
            }
            debug!(?shape, "pinning symbolic batch dimension");
            model = model
                .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
                .map_err(|e| load_err("onnx input fact failed", e))?;
        }

        let optimized = model
            .into_optimized()
            .map_err(|e| load_err("onnx optimize failed", e))?;
        let output = declared_spec(
            optimized
                .output_fact(0)
                .map_err(|_| ModelError::MissingTensor("output"))?,
        );
        let plan = optimized
            .into_runnable()
            .map_err(|e| load_err("onnx runnable failed", e))?;

        info!(path = %path.display(), %input, %output, "onnx model loaded");
        Ok(Self {
            plan,
            input,
            output,
        })
    }
}

fn declared_spec(fact: &TypedFact) -> TensorSpec {
    TensorSpec::new(
        fact.shape
            .iter()
            .map(|d| d.to_usize().map(Dim::Fixed).unwrap_or(Dim::Any))
            .collect(),
    )
}

impl InferenceEngine for OnnxModel {
    fn input_spec(&self) -> &TensorSpec {
        &self.input
    }

    fn output_spec(&self) -> &TensorSpec {
        &self.output
    }

    fn run(&self, shape: &[usize], data: Vec<f32>) -> Result<EngineOutput, InferenceError> {
        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(tract_ndarray::IxDyn(shape), data)
            .map_err(|e| InferenceError::Execution(format!("onnx input reshape failed: {e}")))?
            .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| InferenceError::Execution(format!("onnx run failed: {e}")))?;
        let Some(out0) = outputs.first() else {
            return Err(InferenceError::EmptyOutput);
        };

        let arr = out0
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Execution(format!("onnx output decode failed: {e}")))?;

        Ok(EngineOutput {
            shape: arr.shape().to_vec(),
            data: arr.iter().copied().collect(),
        })
    }
}

/// [`EngineLoader`] backed by [`OnnxModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxLoader;

impl EngineLoader for OnnxLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn InferenceEngine>, ModelError> {
        Ok(Arc::new(OnnxModel::load(path)?))
    }
}
