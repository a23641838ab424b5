//! Text-to-sentiment prediction.
//!
//! [`SentimentService`] is the immutable context built at startup: it owns the
//! tokenizer and the model and is shared by reference with every request.

use crate::config::InferenceConfig;
use crate::error::PredictionError;
use crate::models::inference::SentimentModel;
use crate::models::sequence::{pad_sequence, Truncating};
use crate::models::tokenizer::KerasTokenizer;
use crate::types::PredictionResponse;
use tracing::debug;

pub struct SentimentService {
    tokenizer: KerasTokenizer,
    model: Box<dyn SentimentModel>,
    max_len: usize,
    truncating: Truncating,
    threshold: f64,
}

impl SentimentService {
    pub fn new(
        tokenizer: KerasTokenizer,
        model: Box<dyn SentimentModel>,
        config: &InferenceConfig,
    ) -> Self {
        Self {
            tokenizer,
            model,
            max_len: config.max_len,
            truncating: config.truncating,
            threshold: config.threshold,
        }
    }

    /// Tokenize `text` and normalize it to the model's input length
    pub fn preprocess(&self, text: &str) -> Vec<i64> {
        let sequence = self.tokenizer.text_to_sequence(text);
        pad_sequence(&sequence, self.max_len, self.truncating)
    }

    /// Score `text` and label the result
    pub fn predict(&self, text: &str) -> Result<PredictionResponse, PredictionError> {
        let padded = self.preprocess(text);
        let score = self.model.score(&padded)?;

        if !(0.0..=1.0).contains(&score) {
            return Err(PredictionError::ScoreOutOfRange(score));
        }

        let response = PredictionResponse::from_score(score, self.threshold);
        debug!(
            model = %self.model.name(),
            score = score,
            sentiment = response.sentiment.as_str(),
            "Prediction complete"
        );
        Ok(response)
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.vocab_size()
    }
}
