//! Request and response bodies of the prediction endpoint

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Label a score; only scores strictly above `threshold` are positive
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
}

impl PredictionRequest {
    /// Validate a raw request body.
    ///
    /// The body must be a JSON object whose `text` field is a string. A
    /// missing or `null` field is reported as [`ValidationError::MissingText`].
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;

        match value.get("text") {
            None | Some(Value::Null) => Err(ValidationError::MissingText),
            Some(Value::String(text)) => Ok(Self { text: text.clone() }),
            Some(_) => Err(ValidationError::TextNotString),
        }
    }
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub sentiment: Sentiment,
    /// Raw model score in [0, 1]
    pub probability: f64,
}

impl PredictionResponse {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        Self {
            sentiment: Sentiment::from_score(score, threshold),
            probability: score,
        }
    }
}

/// Error body shared by 400 and 500 responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub tokenizer_vocab_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_from_score() {
        assert_eq!(Sentiment::from_score(0.82, 0.5), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(0.12, 0.5), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(0.5, 0.5), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(0.500001, 0.5), Sentiment::Positive);
    }

    #[test]
    fn test_request_from_body() {
        let request = PredictionRequest::from_body(br#"{"text": "I love this product"}"#).unwrap();
        assert_eq!(request.text, "I love this product");

        // Extra fields are ignored
        let request = PredictionRequest::from_body(br#"{"text": "", "lang": "en"}"#).unwrap();
        assert_eq!(request.text, "");
    }

    #[test]
    fn test_request_validation_errors() {
        assert_eq!(
            PredictionRequest::from_body(b"{}"),
            Err(ValidationError::MissingText)
        );
        assert_eq!(
            PredictionRequest::from_body(br#"{"text": null}"#),
            Err(ValidationError::MissingText)
        );
        assert_eq!(
            PredictionRequest::from_body(b"[1, 2]"),
            Err(ValidationError::MissingText)
        );
        assert_eq!(
            PredictionRequest::from_body(br#"{"text": 42}"#),
            Err(ValidationError::TextNotString)
        );
        assert!(matches!(
            PredictionRequest::from_body(b"{\"text\": "),
            Err(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_response_serialization() {
        let response = PredictionResponse::from_score(0.82, 0.5);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"sentiment": "positive", "probability": 0.82})
        );
    }

    #[test]
    fn test_error_body_omits_empty_details() {
        let body = serde_json::to_string(&ErrorBody::new("No text provided for prediction")).unwrap();
        assert_eq!(body, r#"{"error":"No text provided for prediction"}"#);

        let body = ErrorBody::new("Prediction failed").with_details("boom");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "Prediction failed", "details": "boom"})
        );
    }
}
