//! Type definitions for the sentiment service

pub mod prediction;

pub use prediction::{
    ErrorBody, HealthResponse, PredictionRequest, PredictionResponse, Sentiment,
};
