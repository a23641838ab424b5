//! Error types for each stage of the service.
//!
//! Startup stages (fetch, load) fail fatally; request stages (validation,
//! prediction) are recovered by the HTTP layer and mapped to 400/500 responses.

use std::path::PathBuf;

/// Failure to retrieve an artifact from the object store.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("object gs://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("permission denied for gs://{bucket}/{key}: {reason}")]
    PermissionDenied {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("object store returned HTTP {status} for gs://{bucket}/{key}")]
    Status {
        bucket: String,
        key: String,
        status: u16,
    },

    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("failed to obtain credentials: {reason}")]
    Credentials { reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for RetrievalError {
    fn from(e: reqwest::Error) -> Self {
        RetrievalError::Network {
            reason: e.to_string(),
        }
    }
}

/// Failure to turn a local artifact into an in-memory model or tokenizer.
#[derive(Debug, thiserror::Error)]
pub enum DeserializationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tokenizer document {}: {reason}", path.display())]
    Tokenizer { path: PathBuf, reason: String },

    #[error("failed to load model {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}

/// Malformed or incomplete request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No text provided for prediction")]
    MissingText,

    #[error("Text must be a string")]
    TextNotString,

    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),
}

/// Failure while preprocessing or scoring a single request.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("inference failed: {reason}")]
    Inference { reason: String },

    #[error("model produced no output")]
    EmptyOutput,

    #[error("model score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("prediction task aborted: {reason}")]
    Aborted { reason: String },
}

/// Fatal failure before the listener is bound
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_text_message() {
        assert_eq!(
            ValidationError::MissingText.to_string(),
            "No text provided for prediction"
        );
    }

    #[test]
    fn test_retrieval_error_names_object() {
        let err = RetrievalError::NotFound {
            bucket: "models-bucket".to_string(),
            key: "models/tokenizer.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "object gs://models-bucket/models/tokenizer.json not found"
        );
    }

    #[test]
    fn test_score_out_of_range_message() {
        let err = PredictionError::ScoreOutOfRange(1.5);
        assert!(err.to_string().contains("1.5"));
    }
}
