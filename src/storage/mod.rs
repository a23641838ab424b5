//! Artifact retrieval from cloud object storage

pub mod fetcher;
pub mod gcs;

pub use fetcher::{ArtifactFetcher, FetchOutcome};
pub use gcs::GcsClient;

use crate::config::{AppConfig, ArtifactConfig};
use crate::error::RetrievalError;
use std::future::Future;
use std::path::{Path, PathBuf};

/// A remote object and the local file it is cached in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Name used in logs ("model", "tokenizer")
    pub name: String,
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
}

impl ArtifactRef {
    pub fn new(name: &str, bucket: &str, artifact: &ArtifactConfig) -> Self {
        Self {
            name: name.to_string(),
            bucket: bucket.to_string(),
            key: artifact.key.clone(),
            local_path: PathBuf::from(&artifact.local_path),
        }
    }

    /// The serialized model
    pub fn model(config: &AppConfig) -> Self {
        Self::new("model", &config.storage.bucket, &config.artifacts.model)
    }

    /// The serialized tokenizer
    pub fn tokenizer(config: &AppConfig) -> Self {
        Self::new("tokenizer", &config.storage.bucket, &config.artifacts.tokenizer)
    }
}

/// Blob store able to copy one object to a local file
pub trait ObjectStore {
    /// Download `bucket/key` to `dest`, returning the number of bytes written
    fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, RetrievalError>> + Send;
}
