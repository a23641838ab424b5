//! Sentiment Service Library
//!
//! Fetches a sentiment model and tokenizer from cloud object storage, loads
//! them once, and serves single-text predictions over HTTP.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod service;
pub mod startup;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{DeserializationError, PredictionError, RetrievalError, StartupError, ValidationError};
pub use models::{KerasTokenizer, OnnxSentimentModel, SentimentModel};
pub use server::{router, AppState};
pub use service::SentimentService;
pub use storage::{ArtifactFetcher, ArtifactRef, GcsClient, ObjectStore};
pub use types::{PredictionRequest, PredictionResponse, Sentiment};
