//! Google Cloud Storage client over the JSON API.
//!
//! Objects are read with `GET /storage/v1/b/{bucket}/o/{key}?alt=media` and
//! streamed into `<dest>.part`, which is renamed over `dest` once the body is
//! complete. A failed download leaves the `.part` file behind.

use super::ObjectStore;
use crate::config::{CredentialsMode, StorageConfig};
use crate::error::RetrievalError;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Environment variable read for `credentials = "token"` when no token is configured
pub const ACCESS_TOKEN_ENV: &str = "GCS_ACCESS_TOKEN";

const METADATA_TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";

/// How requests are authorized
#[derive(Debug, Clone)]
enum Credentials {
    Anonymous,
    Token(String),
    Metadata { token_url: Url },
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Object-store client for one storage endpoint
#[derive(Debug, Clone)]
pub struct GcsClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl GcsClient {
    /// Create a client from configuration
    pub fn new(config: &StorageConfig) -> Result<Self, RetrievalError> {
        let endpoint = parse_base_url(&config.endpoint)?;

        let credentials = match config.credentials {
            CredentialsMode::Anonymous => Credentials::Anonymous,
            CredentialsMode::Token => {
                let token = config
                    .token
                    .clone()
                    .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| RetrievalError::Credentials {
                        reason: format!("no storage.token configured and {ACCESS_TOKEN_ENV} is unset"),
                    })?;
                Credentials::Token(token)
            }
            CredentialsMode::Metadata => {
                let base = parse_base_url(&config.metadata_endpoint)?;
                let token_url = base.join(METADATA_TOKEN_PATH).map_err(|e| {
                    RetrievalError::Credentials {
                        reason: format!("invalid metadata endpoint: {e}"),
                    }
                })?;
                Credentials::Metadata { token_url }
            }
        };

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            credentials,
        })
    }

    /// Media download URL of `bucket/key`
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, RetrievalError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| RetrievalError::Network {
                reason: format!("storage endpoint {} cannot take a path", self.endpoint),
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", key]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Bearer token for the next request, if any
    async fn bearer_token(&self) -> Result<Option<String>, RetrievalError> {
        match &self.credentials {
            Credentials::Anonymous => Ok(None),
            Credentials::Token(token) => Ok(Some(token.clone())),
            Credentials::Metadata { token_url } => {
                let response = self
                    .http
                    .get(token_url.clone())
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| RetrievalError::Credentials {
                        reason: format!("metadata server unreachable: {e}"),
                    })?;

                if !response.status().is_success() {
                    return Err(RetrievalError::Credentials {
                        reason: format!("metadata server returned HTTP {}", response.status()),
                    });
                }

                let token: MetadataToken =
                    response.json().await.map_err(|e| RetrievalError::Credentials {
                        reason: format!("invalid metadata token response: {e}"),
                    })?;
                Ok(Some(token.access_token))
            }
        }
    }
}

impl ObjectStore for GcsClient {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, RetrievalError> {
        let url = self.object_url(bucket, key)?;

        let mut request = self.http.get(url);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(bucket = %bucket, key = %key, status = status.as_u16(), "Object store responded");

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(RetrievalError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let reason = response.text().await.unwrap_or_default();
                return Err(RetrievalError::PermissionDenied {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    reason,
                });
            }
            other => {
                return Err(RetrievalError::Status {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    status: other.as_u16(),
                })
            }
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let part = partial_path(dest);
        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|source| io_error(&part, source))?;

        let mut written = 0_u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|source| io_error(&part, source))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|source| io_error(&part, source))?;
        drop(file);

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|source| io_error(dest, source))?;

        Ok(written)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, RetrievalError> {
    let url = Url::parse(raw).map_err(|e| RetrievalError::Network {
        reason: format!("invalid URL {raw:?}: {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(RetrievalError::Network {
            reason: format!("URL {raw:?} cannot be used as a base"),
        });
    }
    Ok(url)
}

/// Temporary download target next to `dest`
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> RetrievalError {
    RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    }
}
