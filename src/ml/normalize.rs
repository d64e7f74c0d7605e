//! Probability post-processing for classifier scores.
//!
//! The model already emits near-probabilities (post-softmax), so this is a
//! clamp-and-renormalize rather than a softmax.

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Label alphabet, index-aligned with the model output.
pub const LABELS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Lower clip bound; keeps the sum strictly positive.
pub const PROB_FLOOR: f32 = 1e-9;

/// Final prediction returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub score: f32,
    pub probabilities: Vec<f32>,
}

/// Clip every score into `[PROB_FLOOR, 1]` and rescale to sum to 1.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    let clipped: Vec<f32> = scores
        .iter()
        .map(|s| if s.is_nan() { PROB_FLOOR } else { s.clamp(PROB_FLOOR, 1.0) })
        .collect();
    let sum: f32 = clipped.iter().sum();
    clipped.into_iter().map(|p| p / sum).collect()
}

/// Index of the largest probability. Ties go to the lowest index.
pub fn argmax(probs: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &p) in probs.iter().enumerate() {
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((idx, p)),
        }
    }
    best.map(|(idx, _)| idx)
}

impl PredictionResult {
    /// Normalize raw scores and pick the winning letter.
    pub fn from_scores(scores: &[f32]) -> Result<Self, InferenceError> {
        let probabilities = normalize(scores);
        let top = argmax(&probabilities).ok_or(InferenceError::EmptyOutput)?;
        let label = LABELS.get(top).ok_or(InferenceError::UnknownClass {
            got: probabilities.len(),
            max: LABELS.len(),
        })?;

        Ok(Self {
            label: label.to_string(),
            score: probabilities[top],
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(idx: usize) -> Vec<f32> {
        let mut v = vec![0.0; 26];
        v[idx] = 1.0;
        v
    }

    #[test]
    fn sums_to_one_and_stays_positive() {
        let raw = vec![-3.0, 0.0, 7.5, 0.2, f32::INFINITY, f32::NEG_INFINITY, 0.4];
        let probs = normalize(&raw);
        assert_eq!(probs.len(), raw.len());
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|p| *p > 0.0 && *p <= 1.0));
    }

    #[test]
    fn nan_is_floored() {
        let probs = normalize(&[f32::NAN, 1.0]);
        assert!(probs[0] > 0.0 && probs[0] < 1e-6);
    }

    #[test]
    fn idempotent_on_distribution() {
        let once = normalize(&[0.1, 0.2, 0.3, 0.4]);
        let twice = normalize(&once);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn one_hot_a() {
        let result = PredictionResult::from_scores(&one_hot(0)).unwrap();
        assert_eq!(result.label, "A");
        let expected = 1.0 / (1.0 + 25.0 * PROB_FLOOR);
        assert!((result.score - expected).abs() < 1e-6);
        assert_eq!(result.probabilities.len(), 26);
    }

    #[test]
    fn last_letter() {
        let result = PredictionResult::from_scores(&one_hot(25)).unwrap();
        assert_eq!(result.label, "Z");
    }

    #[test]
    fn ties_pick_first() {
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn too_many_classes() {
        let mut scores = vec![0.0; 27];
        scores[26] = 1.0;
        let err = PredictionResult::from_scores(&scores).unwrap_err();
        assert!(matches!(err, InferenceError::UnknownClass { got: 27, .. }));
    }

    #[test]
    fn empty_output() {
        assert!(matches!(
            PredictionResult::from_scores(&[]),
            Err(InferenceError::EmptyOutput)
        ));
    }
}
