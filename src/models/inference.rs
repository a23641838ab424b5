//! Sentiment scoring backed by ONNX Runtime

use crate::config::{InferenceConfig, InputType};
use crate::error::{DeserializationError, PredictionError};
use crate::models::loader::{LoadedModel, ModelLoader};
use ort::value::{DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// A model mapping one fixed-length index sequence to a scalar score.
///
/// Implementations must be safe to call from several request handlers at
/// once and must not change between calls.
pub trait SentimentModel: Send + Sync {
    /// Score a single padded sequence
    fn score(&self, sequence: &[i64]) -> Result<f64, PredictionError>;

    /// Human-readable model name
    fn name(&self) -> &str;
}

/// Sentiment model running an ONNX graph with input `[1, max_len]` and a
/// single-unit output whose `[0][0]` element is the score
pub struct OnnxSentimentModel {
    /// `Session::run` takes `&mut self`, so calls are serialized
    model: Mutex<LoadedModel>,
    name: String,
    input_type: InputType,
}

impl OnnxSentimentModel {
    /// Load the model at `path` with the given inference settings
    pub fn load<P: AsRef<Path>>(
        path: P,
        config: &InferenceConfig,
    ) -> Result<Self, DeserializationError> {
        let loader = ModelLoader::with_threads(config.intra_threads);
        let model = loader.load_model(path, config.output_name.as_deref())?;

        Ok(Self {
            name: model.name.clone(),
            model: Mutex::new(model),
            input_type: config.input_type,
        })
    }

    /// Build the `[1, len]` input tensor in the element type the graph expects
    fn input_tensor(&self, sequence: &[i64]) -> Result<DynValue, PredictionError> {
        let shape = vec![1_i64, sequence.len() as i64];
        let tensor_error = |e: ort::Error| PredictionError::Inference {
            reason: format!("failed to create input tensor: {e}"),
        };

        let value = match self.input_type {
            InputType::Float32 => {
                let data: Vec<f32> = sequence.iter().map(|&v| v as f32).collect();
                Tensor::from_array((shape, data))
                    .map_err(tensor_error)?
                    .into_dyn()
            }
            InputType::Int32 => {
                let data = sequence
                    .iter()
                    .map(|&v| {
                        i32::try_from(v).map_err(|_| PredictionError::Inference {
                            reason: format!("token index {v} does not fit an int32 input"),
                        })
                    })
                    .collect::<Result<Vec<i32>, _>>()?;
                Tensor::from_array((shape, data))
                    .map_err(tensor_error)?
                    .into_dyn()
            }
            InputType::Int64 => Tensor::from_array((shape, sequence.to_vec()))
                .map_err(tensor_error)?
                .into_dyn(),
        };
        Ok(value)
    }
}

impl SentimentModel for OnnxSentimentModel {
    fn score(&self, sequence: &[i64]) -> Result<f64, PredictionError> {
        let input = self.input_tensor(sequence)?;

        let mut guard = self.model.lock().map_err(|e| PredictionError::Inference {
            reason: format!("session lock poisoned: {e}"),
        })?;
        let LoadedModel {
            session,
            input_name,
            output_name,
            ..
        } = &mut *guard;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(|e| PredictionError::Inference {
                reason: e.to_string(),
            })?;

        let output = outputs
            .get(output_name.as_str())
            .ok_or(PredictionError::EmptyOutput)?;

        let (_shape, data) =
            output
                .try_extract_tensor::<f32>()
                .map_err(|e| PredictionError::Inference {
                    reason: format!("output is not a float tensor: {e}"),
                })?;

        let score = data.first().copied().ok_or(PredictionError::EmptyOutput)? as f64;
        debug!(model = %self.name, score = score, "Model inference complete");
        Ok(score)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_non_onnx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment_analysis_model.onnx");
        std::fs::write(&path, b"HDF\x89 definitely not an onnx graph").unwrap();

        let result = OnnxSentimentModel::load(&path, &InferenceConfig::default());
        assert!(matches!(result, Err(DeserializationError::Model { .. })));
    }

    // Fixture graphs: embedding_input [1, 20] -> Cast(float) -> ReduceMean(axis 1)
    // -> outputs "mean" [1, 1] and "score" = Sigmoid(mean) [1, 1]. One file per
    // input element type.
    fn fixture(suffix: &str) -> String {
        format!(
            "{}/tests/fixtures/mean_sigmoid_{suffix}.onnx",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    fn config(input_type: InputType, output_name: Option<&str>) -> InferenceConfig {
        InferenceConfig {
            input_type,
            output_name: output_name.map(str::to_string),
            ..InferenceConfig::default()
        }
    }

    /// Twenty elements summing to 20, so the mean is 1.0
    fn sequence() -> Vec<i64> {
        let mut seq = vec![2, 3, 4, 5, 6];
        seq.resize(20, 0);
        seq
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    #[test]
    fn test_score_each_input_type() {
        for (suffix, input_type) in [
            ("f32", InputType::Float32),
            ("i32", InputType::Int32),
            ("i64", InputType::Int64),
        ] {
            let model = OnnxSentimentModel::load(fixture(suffix), &config(input_type, Some("score")))
                .unwrap();
            assert_eq!(model.name(), format!("mean_sigmoid_{suffix}"));

            let score = model.score(&sequence()).unwrap();
            assert!((score - sigmoid(1.0)).abs() < 1e-5, "{suffix}: got {score}");

            // All padding scores exactly sigmoid(0)
            let score = model.score(&[0; 20]).unwrap();
            assert!((score - 0.5).abs() < 1e-6, "{suffix}: got {score}");
        }
    }

    #[test]
    fn test_output_selection() {
        // First declared output is the raw mean
        let model = OnnxSentimentModel::load(fixture("f32"), &config(InputType::Float32, None)).unwrap();
        let score = model.score(&sequence()).unwrap();
        assert!((score - 1.0).abs() < 1e-6, "got {score}");

        let result = OnnxSentimentModel::load(
            fixture("f32"),
            &config(InputType::Float32, Some("dense_1")),
        );
        match result {
            Err(DeserializationError::Model { reason, .. }) => {
                assert!(reason.contains("dense_1"), "{reason}")
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("unknown output name accepted"),
        }
    }

    #[test]
    fn test_wrong_input_type_is_prediction_error() {
        let model = OnnxSentimentModel::load(fixture("f32"), &config(InputType::Int64, Some("score")))
            .unwrap();
        assert!(matches!(
            model.score(&sequence()),
            Err(PredictionError::Inference { .. })
        ));
    }

    #[test]
    fn test_index_too_large_for_int32() {
        let model = OnnxSentimentModel::load(fixture("i32"), &config(InputType::Int32, Some("score")))
            .unwrap();
        let mut seq = sequence();
        seq[0] = i64::from(i32::MAX) + 1;

        match model.score(&seq) {
            Err(PredictionError::Inference { reason }) => {
                assert!(reason.contains("does not fit an int32"), "{reason}")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
