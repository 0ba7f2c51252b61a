// Model file loader and cache
// Handles fetching and caching the hand-landmark and alphabet-classifier
// model files consumed by the landmark provider and the classifier.

use crate::models::gesture::{GestureError, GestureResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a model file comes from
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Local file path (e.g. bundled with the application)
    LocalFile(PathBuf),
    /// Direct URL
    Url(String),
}

/// Model metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub source: ModelSource,
    pub size_bytes: Option<u64>,
}

/// Caches model files under a local directory so repeated pipeline starts
/// never re-fetch them.
pub struct ModelStore {
    cache_dir: PathBuf,
}

impl ModelStore {
    pub fn new(cache_dir: PathBuf) -> GestureResult<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn is_cached(&self, model: &ModelInfo) -> bool {
        self.model_path(&model.name).exists()
    }

    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.cache_dir.join(model_name)
    }

    /// Fetch a model into the cache if it is not already there, returning the
    /// local path. Blocking; meant to run once at pipeline construction.
    pub fn ensure_model(&self, model: &ModelInfo) -> GestureResult<PathBuf> {
        let model_path = self.model_path(&model.name);

        if self.is_cached(model) {
            println!("Model {} already cached at {:?}", model.name, model_path);
            return Ok(model_path);
        }

        println!("Fetching model {} from {:?}", model.name, model.source);

        match &model.source {
            ModelSource::LocalFile(path) => {
                fs::copy(path, &model_path)?;
            }
            ModelSource::Url(url) => {
                let response = reqwest::blocking::get(url)
                    .map_err(|e| GestureError::DownloadFailed(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(GestureError::DownloadFailed(format!(
                        "{} returned HTTP {}",
                        url,
                        response.status()
                    )));
                }

                let bytes = response
                    .bytes()
                    .map_err(|e| GestureError::DownloadFailed(e.to_string()))?;
                fs::write(&model_path, &bytes)?;
            }
        }

        Ok(model_path)
    }

    pub fn clear_cache(&self) -> GestureResult<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    pub fn cache_size(&self) -> GestureResult<u64> {
        let mut total_size = 0u64;

        if self.cache_dir.exists() {
            for entry in fs::read_dir(&self.cache_dir)? {
                let entry = entry?;
                let metadata = entry.metadata()?;
                if metadata.is_file() {
                    total_size += metadata.len();
                }
            }
        }

        Ok(total_size)
    }
}

// ==============================================================================
// Predefined Model Configurations
// ==============================================================================

/// Hand landmark model consumed by the external landmark provider
pub fn hand_landmarker() -> ModelInfo {
    ModelInfo {
        name: "hand-landmarker".to_string(),
        version: "v1".to_string(),
        source: ModelSource::Url(
            "https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/latest/hand_landmarker.task".to_string()
        ),
        size_bytes: Some(10_000_000), // ~10 MB
    }
}

/// Pre-trained sign-alphabet classifier ([1, 126] -> [1, 26])
pub fn alphabet_classifier() -> ModelInfo {
    ModelInfo {
        name: "sign-alphabet".to_string(),
        version: "v1".to_string(),
        source: ModelSource::LocalFile(PathBuf::from("models/sign_alphabet.onnx")),
        size_bytes: Some(250_000), // ~250 KB, small dense net
    }
}
