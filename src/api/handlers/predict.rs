use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::{state::AppState, types::PredictionResult};
use crate::error::{Result, ServeError};
use crate::ml::LandmarkTensor;

/// POST /api/predict
///
/// Body: `{"landmarks": [[...], ...]}` with 60 time-steps of either 126 flat
/// features or 21 joints x 6 channels. Every failure is turned into a JSON
/// `{"error": ...}` body; nothing escapes the handler.
pub async fn predict_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<PredictionResult>, ServeError> {
    match run_prediction(&state, &body).await {
        Ok(result) => {
            info!(label = %result.label, score = result.score, "prediction served");
            Ok(Json(result))
        }
        Err(e) => {
            if e.status_code() == StatusCode::BAD_REQUEST {
                warn!(error = %e, "rejected prediction request");
            } else {
                error!(error = %e, "prediction failed");
            }
            Err(e)
        }
    }
}

async fn run_prediction(state: &AppState, body: &[u8]) -> Result<PredictionResult> {
    let landmarks = parse_landmarks(body)?;
    state.predictor.predict(landmarks).await
}

/// Decode the request body into a landmark tensor.
pub fn parse_landmarks(body: &[u8]) -> Result<LandmarkTensor> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| ServeError::Validation(format!("Invalid JSON body: {e}")))?;

    let Value::Object(fields) = payload else {
        return Err(ServeError::Validation(
            "request body must be a JSON object".to_string(),
        ));
    };

    match fields.get("landmarks") {
        Some(value) if !is_blank(value) => LandmarkTensor::from_json(value),
        _ => Err(ServeError::Validation("Missing landmarks".to_string())),
    }
}

/// Absent-equivalent values: `null`, `false`, `0`, and empty containers.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(body: &str) -> bool {
        matches!(
            parse_landmarks(body.as_bytes()),
            Err(ServeError::Validation(msg)) if msg == "Missing landmarks"
        )
    }

    #[test]
    fn blank_landmarks_are_missing() {
        assert!(missing("{}"));
        assert!(missing(r#"{"landmarks": null}"#));
        assert!(missing(r#"{"landmarks": []}"#));
        assert!(missing(r#"{"other": [[1]]}"#));
    }

    #[test]
    fn invalid_json_is_validation() {
        let err = parse_landmarks(b"{not json").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid JSON body"));
    }

    #[test]
    fn non_object_body_is_validation() {
        let err = parse_landmarks(b"[1, 2]").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parses_nested_landmarks() {
        let t = parse_landmarks(br#"{"landmarks": [[0.1, 0.2], [0.3, 0.4]]}"#).unwrap();
        assert_eq!(t.shape(), &[2, 2]);
    }

    #[test]
    fn wide_first_entry_nesting_is_bad_request() {
        let zeros = vec!["0"; 99_999].join(",");
        let body = format!(r#"{{"landmarks": [[[0,{zeros}],{zeros}],{zeros}]}}"#);
        assert!(body.len() < 2 * 1024 * 1024);

        let err = parse_landmarks(body.as_bytes()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
