//! Startup sequence: fetch artifacts, then load them.
//!
//! Every step must succeed before the service exists, so the process never
//! serves with only one of the model and tokenizer in memory.

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::models::inference::OnnxSentimentModel;
use crate::models::tokenizer::KerasTokenizer;
use crate::service::SentimentService;
use crate::storage::{ArtifactFetcher, ArtifactRef, ObjectStore};
use tracing::info;

/// Make both artifacts available locally and build the prediction service
pub async fn bootstrap<S: ObjectStore>(
    config: &AppConfig,
    store: S,
) -> Result<SentimentService, StartupError> {
    let fetcher = ArtifactFetcher::new(store);
    let tokenizer_ref = ArtifactRef::tokenizer(config);
    let model_ref = ArtifactRef::model(config);

    fetcher.ensure_local(&tokenizer_ref).await?;
    fetcher.ensure_local(&model_ref).await?;

    let model = OnnxSentimentModel::load(&model_ref.local_path, &config.inference)?;
    let tokenizer = KerasTokenizer::load(&tokenizer_ref.local_path)?;

    info!(
        max_len = config.inference.max_len,
        threshold = config.inference.threshold,
        "Prediction service ready"
    );
    Ok(SentimentService::new(tokenizer, Box::new(model), &config.inference))
}
