//! Landmark inference pipeline.
//!
//! Leaf-first: [`engine`] is the backend seam, [`handle`] owns the loaded
//! model, [`shape`] and [`invoke`] prepare and run one pass, [`normalize`]
//! turns scores into a letter, and [`predictor`] strings them together.

pub mod engine;
pub mod handle;
pub mod invoke;
pub mod normalize;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod shape;
pub mod tensor;

pub use engine::{default_loader, Dim, EngineLoader, EngineOutput, InferenceEngine, TensorSpec};
pub use handle::{LoadedModel, ModelHandle};
pub use invoke::InferenceInvoker;
pub use normalize::{normalize, PredictionResult, LABELS};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxLoader, OnnxModel};
pub use predictor::Predictor;
pub use shape::{ShapeNegotiator, FEATURES_PER_STEP};
pub use tensor::LandmarkTensor;
