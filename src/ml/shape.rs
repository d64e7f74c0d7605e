//! Shape negotiation between client landmarks and the model input.
//!
//! Models exported at different times declare either a structured
//! `[time, 21, 6]` or a flattened `[time, 126]` input. Both carry the same
//! values in the same order, so a request in either encoding is
//! reinterpreted (never resized) into whatever the loaded model declares.

use tracing::{debug, warn};

use crate::error::ShapeError;
use crate::ml::tensor::LandmarkTensor;

/// Hand joints per time-step.
pub const JOINTS: usize = 21;
/// Features per joint.
pub const CHANNELS: usize = 6;
/// Features per time-step: 21 joints x 6 channels.
pub const FEATURES_PER_STEP: usize = JOINTS * CHANNELS;

#[derive(Debug, Clone, Copy)]
pub struct ShapeNegotiator {
    allow_generic_reshape: bool,
}

impl Default for ShapeNegotiator {
    fn default() -> Self {
        Self {
            allow_generic_reshape: true,
        }
    }
}

impl ShapeNegotiator {
    pub fn new(allow_generic_reshape: bool) -> Self {
        Self {
            allow_generic_reshape,
        }
    }

    /// Reconcile `input` with `expected` (batch dimension excluded).
    ///
    /// A rank-3 model whose trailing dims hold 126 features always gets
    /// `[time, 21, 6]`; other trailing splits are left for the invoker to
    /// reject against the declared input.
    pub fn reconcile(
        &self,
        input: LandmarkTensor,
        expected: &[usize],
    ) -> Result<LandmarkTensor, ShapeError> {
        if input.shape() == expected {
            return Ok(input);
        }

        if expected.len() == 3 && expected[1] * expected[2] == FEATURES_PER_STEP {
            let (time, flat) = flatten_time_major(&input);
            if flat != FEATURES_PER_STEP {
                return Err(ShapeError::Reshape {
                    expected: FEATURES_PER_STEP,
                    got: flat,
                });
            }
            debug!(from = ?input.shape(), to = ?expected, "reinterpreting flat landmarks as joints");
            return reshape(input, vec![time, JOINTS, CHANNELS]);
        }

        if expected.len() == 2 && expected[1] == FEATURES_PER_STEP {
            let (time, flat) = flatten_time_major(&input);
            if flat != FEATURES_PER_STEP {
                return Err(ShapeError::Flatten {
                    expected: FEATURES_PER_STEP,
                    got: flat,
                });
            }
            debug!(from = ?input.shape(), to = ?expected, "flattening landmarks per time-step");
            return reshape(input, vec![time, FEATURES_PER_STEP]);
        }

        if !self.allow_generic_reshape {
            return Err(ShapeError::GenericReshapeDisabled {
                input: input.shape().to_vec(),
                expected: expected.to_vec(),
            });
        }
        warn!(
            from = ?input.shape(),
            to = ?expected,
            "using generic reshape; input layout is not a known landmark encoding"
        );
        reshape(input, expected.to_vec())
    }
}

/// Leading (time) dimension and the per-step element count for `[time, -1]`.
fn flatten_time_major(input: &LandmarkTensor) -> (usize, usize) {
    let time = input.shape().first().copied().unwrap_or(0);
    let flat = if time == 0 { 0 } else { input.len() / time };
    (time, flat)
}

fn reshape(input: LandmarkTensor, target: Vec<usize>) -> Result<LandmarkTensor, ShapeError> {
    let input_shape = input.shape().to_vec();
    let input_len = input.len();
    let expected_len = target.iter().product();
    input.reshaped(target.clone()).ok_or(ShapeError::Mismatch {
        input: input_shape,
        input_len,
        expected: target,
        expected_len,
    })
}
