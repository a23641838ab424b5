//! Local caching of remote artifacts.
//!
//! An artifact counts as fetched as soon as a file exists at its local path.
//! There is no staleness check, checksum or retry.

use super::{ArtifactRef, ObjectStore};
use crate::error::RetrievalError;
use tracing::{error, info};

/// Result of [`ArtifactFetcher::ensure_local`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A local copy already existed; nothing was downloaded
    AlreadyPresent,
    /// The object was downloaded
    Downloaded { bytes: u64 },
}

/// Makes artifacts available on local disk
pub struct ArtifactFetcher<S> {
    store: S,
}

impl<S: ObjectStore> ArtifactFetcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Download `artifact` unless its local file already exists
    pub async fn ensure_local(&self, artifact: &ArtifactRef) -> Result<FetchOutcome, RetrievalError> {
        let exists = tokio::fs::try_exists(&artifact.local_path)
            .await
            .map_err(|source| RetrievalError::Io {
                path: artifact.local_path.clone(),
                source,
            })?;

        if exists {
            info!(
                artifact = %artifact.name,
                path = %artifact.local_path.display(),
                "Using local copy"
            );
            return Ok(FetchOutcome::AlreadyPresent);
        }

        info!(
            artifact = %artifact.name,
            bucket = %artifact.bucket,
            key = %artifact.key,
            "Downloading artifact from object store"
        );

        match self
            .store
            .download(&artifact.bucket, &artifact.key, &artifact.local_path)
            .await
        {
            Ok(bytes) => {
                info!(
                    artifact = %artifact.name,
                    path = %artifact.local_path.display(),
                    bytes = bytes,
                    "Artifact downloaded successfully"
                );
                Ok(FetchOutcome::Downloaded { bytes })
            }
            Err(e) => {
                error!(artifact = %artifact.name, error = %e, "Error downloading artifact");
                Err(e)
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that counts downloads and serves a fixed payload
    struct CountingStore {
        payload: Vec<u8>,
        downloads: AtomicUsize,
    }

    impl CountingStore {
        fn new(payload: &[u8]) -> Self {
            Self {
                payload: payload.to_vec(),
                downloads: AtomicUsize::new(0),
            }
        }
    }

    impl ObjectStore for CountingStore {
        async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, RetrievalError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if key.ends_with("missing.json") {
                return Err(RetrievalError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
            std::fs::write(dest, &self.payload).map_err(|source| RetrievalError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
            Ok(self.payload.len() as u64)
        }
    }

    fn artifact(dir: &Path, key: &str) -> ArtifactRef {
        ArtifactRef {
            name: "tokenizer".to_string(),
            bucket: "bucket".to_string(),
            key: key.to_string(),
            local_path: PathBuf::from(dir).join("tokenizer.json"),
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(dir.path(), "models/tokenizer.json");
        let fetcher = ArtifactFetcher::new(CountingStore::new(b"{\"config\": {}}"));

        let first = fetcher.ensure_local(&artifact).await.unwrap();
        assert_eq!(first, FetchOutcome::Downloaded { bytes: 14 });

        let second = fetcher.ensure_local(&artifact).await.unwrap();
        assert_eq!(second, FetchOutcome::AlreadyPresent);
        assert_eq!(fetcher.store().downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(dir.path(), "models/tokenizer.json");
        std::fs::write(&artifact.local_path, b"stale").unwrap();

        let fetcher = ArtifactFetcher::new(CountingStore::new(b"fresh"));
        let outcome = fetcher.ensure_local(&artifact).await.unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(fetcher.store().downloads.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&artifact.local_path).unwrap(), b"stale");
    }

    #[tokio::test]
    async fn test_missing_object_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(dir.path(), "models/missing.json");
        let fetcher = ArtifactFetcher::new(CountingStore::new(b""));

        let err = fetcher.ensure_local(&artifact).await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound { .. }));
        assert!(!artifact.local_path.exists());
    }
}
