//! ONNX model loader

use crate::error::DeserializationError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the token sequence
    pub input_name: String,
    /// Output name for the sentiment score
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    intra_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with the specified number of threads
    pub fn with_threads(intra_threads: usize) -> Self {
        Self {
            intra_threads: intra_threads.max(1),
        }
    }

    /// Load a single ONNX model from file.
    ///
    /// `output_name` selects the score output; the first declared output is
    /// used when it is `None`.
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        output_name: Option<&str>,
    ) -> Result<LoadedModel, DeserializationError> {
        let path = path.as_ref();
        let model_error = |reason: String| DeserializationError::Model {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(model_error("model file not found".to_string()));
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-model")
            .to_string();

        info!(model = %name, path = %path.display(), threads = self.intra_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| model_error(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_error(e.to_string()))?
            .with_intra_threads(self.intra_threads)
            .map_err(|e| model_error(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| model_error(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| model_error("model declares no inputs".to_string()))?;

        let output_name = match output_name {
            Some(wanted) => session
                .outputs
                .iter()
                .find(|o| o.name == wanted)
                .map(|o| o.name.clone())
                .ok_or_else(|| model_error(format!("model has no output named {wanted:?}")))?,
            None => session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| model_error("model declares no outputs".to_string()))?,
        };

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            output_name,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { intra_threads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment_analysis_model.onnx");

        let err = ModelLoader::default().load_model(&path, None).err().unwrap();
        assert!(matches!(err, DeserializationError::Model { .. }));
        assert!(err.to_string().contains("model file not found"));
    }

    #[test]
    fn test_thread_count_floor() {
        assert_eq!(ModelLoader::with_threads(0).intra_threads, 1);
        assert_eq!(ModelLoader::with_threads(4).intra_threads, 4);
    }
}
