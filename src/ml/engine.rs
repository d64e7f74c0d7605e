//! Inference engine seam.
//!
//! The server only needs a narrow capability from the numeric backend:
//! load an artifact, report declared tensor shapes, run one pass. Keeping
//! that behind a trait lets the request pipeline run against stub engines.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{InferenceError, ModelError};

/// A declared tensor dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    /// Symbolic or unknown size (typically the batch dimension).
    Any,
}

impl Dim {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(n),
            Dim::Any => None,
        }
    }

    pub fn accepts(self, n: usize) -> bool {
        match self {
            Dim::Fixed(d) => d == n,
            Dim::Any => true,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Any => f.write_str("?"),
        }
    }
}

/// Declared shape of a model tensor, batch dimension first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub dims: Vec<Dim>,
}

impl TensorSpec {
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    pub fn batch(&self) -> Option<Dim> {
        self.dims.first().copied()
    }

    /// Dimensions after the batch dimension.
    pub fn per_sample(&self) -> &[Dim] {
        self.dims.get(1..).unwrap_or(&[])
    }

    /// Per-sample shape with every dimension concrete.
    ///
    /// `None` when a dimension past the batch is dynamic; shape
    /// negotiation needs concrete sizes.
    pub fn expected_input(&self) -> Option<Vec<usize>> {
        self.per_sample().iter().map(|d| d.fixed()).collect()
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str("]")
    }
}

/// Raw engine output with its batch-including shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// A loaded, ready-to-run model.
pub trait InferenceEngine: Send + Sync {
    fn input_spec(&self) -> &TensorSpec;

    fn output_spec(&self) -> &TensorSpec;

    /// Run one synchronous pass. `shape` includes the batch dimension.
    fn run(&self, shape: &[usize], data: Vec<f32>) -> Result<EngineOutput, InferenceError>;
}

/// Creates engines from an artifact on disk.
pub trait EngineLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn InferenceEngine>, ModelError>;
}

/// Loader for the compiled-in backend.
#[cfg(feature = "onnx")]
pub fn default_loader() -> Arc<dyn EngineLoader> {
    Arc::new(crate::ml::onnx::OnnxLoader)
}

/// Loader for the compiled-in backend.
#[cfg(not(feature = "onnx"))]
pub fn default_loader() -> Arc<dyn EngineLoader> {
    Arc::new(UnsupportedLoader)
}

#[cfg(not(feature = "onnx"))]
struct UnsupportedLoader;

#[cfg(not(feature = "onnx"))]
impl EngineLoader for UnsupportedLoader {
    fn load(&self, _path: &Path) -> Result<Arc<dyn InferenceEngine>, ModelError> {
        Err(ModelError::Unsupported)
    }
}
