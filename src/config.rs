//! Configuration management for the sentiment service

use crate::models::sequence::Truncating;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the listen port (Cloud Run convention)
pub const PORT_ENV: &str = "PORT";

/// How the object-store client authenticates
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsMode {
    /// No Authorization header (public buckets, local emulators)
    Anonymous,
    /// Static bearer token from config or `GCS_ACCESS_TOKEN`
    Token,
    /// Access token from the GCE / Cloud Run metadata server
    #[default]
    Metadata,
}

/// Element type of the model's input tensor
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Keras `Input` layers default to float32, which is what tf2onnx exports
    #[default]
    Float32,
    Int32,
    Int64,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port, overridden by `PORT`
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding both artifacts
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Base URL of the storage JSON API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Authentication mode
    #[serde(default)]
    pub credentials: CredentialsMode,
    /// Bearer token for `credentials = "token"`
    #[serde(default)]
    pub token: Option<String>,
    /// Metadata server base URL for `credentials = "metadata"`
    #[serde(default = "default_metadata_endpoint")]
    pub metadata_endpoint: String,
}

fn default_bucket() -> String {
    "my_machine_learning_model".to_string()
}

fn default_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_metadata_endpoint() -> String {
    "http://metadata.google.internal".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            endpoint: default_endpoint(),
            credentials: CredentialsMode::default(),
            token: None,
            metadata_endpoint: default_metadata_endpoint(),
        }
    }
}

/// Remote key and local cache path of one artifact
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    pub key: String,
    pub local_path: String,
}

/// The two artifacts the service needs
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_model_artifact")]
    pub model: ArtifactConfig,
    #[serde(default = "default_tokenizer_artifact")]
    pub tokenizer: ArtifactConfig,
}

fn default_model_artifact() -> ArtifactConfig {
    ArtifactConfig {
        key: "models/sentiment_analysis_model.onnx".to_string(),
        local_path: "sentiment_analysis_model.onnx".to_string(),
    }
}

fn default_tokenizer_artifact() -> ArtifactConfig {
    ArtifactConfig {
        key: "models/tokenizer.json".to_string(),
        local_path: "tokenizer.json".to_string(),
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model: default_model_artifact(),
            tokenizer: default_tokenizer_artifact(),
        }
    }
}

/// Preprocessing and inference configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Fixed sequence length fed to the model
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Scores strictly above this are positive
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Which end to cut when a text has more than `max_len` tokens
    #[serde(default)]
    pub truncating: Truncating,
    /// Element type of the input tensor
    #[serde(default)]
    pub input_type: InputType,
    /// Output tensor to read; first output when unset
    #[serde(default)]
    pub output_name: Option<String>,
    /// Number of ONNX Runtime intra-op threads (default: 1)
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_max_len() -> usize {
    20
}

fn default_threshold() -> f64 {
    0.5
}

fn default_intra_threads() -> usize {
    1
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            threshold: default_threshold(),
            truncating: Truncating::default(),
            input_type: InputType::default(),
            output_name: None,
            intra_threads: default_intra_threads(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config/config.toml`, the environment and `PORT`
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// The file is optional; `SENTIMENT__<SECTION>__<KEY>` variables override
    /// it and `PORT` overrides `server.port`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("SENTIMENT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.apply_port_override(std::env::var(PORT_ENV).ok())?;
        Ok(app)
    }

    /// Replace the listen port with the value of `PORT`, if one was given
    pub fn apply_port_override(&mut self, value: Option<String>) -> Result<()> {
        if let Some(raw) = value {
            self.server.port = raw
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got {raw:?}"))?;
        }
        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
