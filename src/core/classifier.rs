// Classifier boundary
// Maps a feature vector to a probability distribution over the 26 letters.
// Backed by ONNX Runtime when the `ml-onnx` feature is enabled; a null
// fallback keeps the crate compiling (and the pipeline reporting "not
// ready") without it.

use crate::core::features::FeatureVector;
use crate::models::gesture::{ClassScores, GestureError, GestureResult};

/// Inference boundary consumed by the gesture detector.
///
/// Input shape `[1, 126]` float32, output shape `[1, 26]` (one probability
/// per letter A-Z). Implementations must not accumulate per-call state:
/// inference runs on every qualifying frame of a continuous stream.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> GestureResult<ClassScores>;

    /// Whether the model loaded and inference calls can succeed.
    fn is_ready(&self) -> bool;

    fn model_info(&self) -> String;
}

// ==============================================================================
// ONNX Runtime Implementation
// ==============================================================================

#[cfg(feature = "ml-onnx")]
pub mod onnx {
    use super::*;
    use crate::core::features::FEATURE_LEN;
    use crate::models::gesture::ALPHABET_LEN;
    use ndarray::Array2;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;
    use std::sync::Mutex;

    const INPUT_NAME: &str = "input";
    const OUTPUT_NAME: &str = "output";

    pub struct OnnxClassifier {
        // Session::run needs &mut; the detector holds the classifier behind
        // an Arc, so serialize calls here.
        session: Mutex<Session>,
        info: String,
    }

    impl OnnxClassifier {
        pub fn load(model_path: &Path) -> GestureResult<Self> {
            let session = Session::builder()
                .map_err(|e| GestureError::ModelLoadFailed(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| GestureError::ModelLoadFailed(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e| GestureError::ModelLoadFailed(e.to_string()))?;

            println!("Loaded alphabet classifier from {:?}", model_path);

            Ok(Self {
                session: Mutex::new(session),
                info: format!("ONNX alphabet classifier ({})", model_path.display()),
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn classify(&self, features: &FeatureVector) -> GestureResult<ClassScores> {
            let input = Array2::from_shape_vec((1, FEATURE_LEN), features.to_vec())
                .map_err(|e| GestureError::InferenceFailed(e.to_string()))?;
            let tensor = Tensor::from_array(input)
                .map_err(|e| GestureError::InferenceFailed(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| GestureError::InferenceFailed("poisoned session lock".to_string()))?;

            // Outputs are extracted and dropped within this call; nothing is
            // retained across frames, keeping memory flat under streaming.
            let outputs = session
                .run(ort::inputs![INPUT_NAME => tensor])
                .map_err(|e| GestureError::InferenceFailed(e.to_string()))?;

            let probabilities: ndarray::ArrayViewD<f32> = outputs[OUTPUT_NAME]
                .try_extract_array()
                .map_err(|e| GestureError::InferenceFailed(e.to_string()))?;

            if probabilities.len() < ALPHABET_LEN {
                return Err(GestureError::InferenceFailed(format!(
                    "expected {} class scores, got {}",
                    ALPHABET_LEN,
                    probabilities.len()
                )));
            }

            // Accept either [1, 26] or flat [26] output layouts
            let mut scores = [0.0f32; ALPHABET_LEN];
            for (slot, probability) in scores.iter_mut().zip(probabilities.iter()) {
                *slot = *probability;
            }

            Ok(ClassScores(scores))
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            self.info.clone()
        }
    }
}

// ==============================================================================
// Null Implementation (no ML feature enabled)
// ==============================================================================

/// Placeholder classifier used when no inference backend is configured.
///
/// Reports not-ready; the pipeline surfaces this as a `NotReady` status and
/// emits no detection events, rather than erroring per frame.
pub struct NullClassifier;

impl Classifier for NullClassifier {
    fn classify(&self, _features: &FeatureVector) -> GestureResult<ClassScores> {
        Err(GestureError::NotInitialized)
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn model_info(&self) -> String {
        "Null classifier (enable 'ml-onnx' for actual inference)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::FEATURE_LEN;

    #[test]
    fn test_null_classifier_reports_not_ready() {
        let classifier = NullClassifier;
        assert!(!classifier.is_ready());

        let features = [0.0f32; FEATURE_LEN];
        assert!(matches!(
            classifier.classify(&features),
            Err(GestureError::NotInitialized)
        ));
    }
}
