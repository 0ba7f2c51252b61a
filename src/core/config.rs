use crate::models::gesture::{ConfirmerConfig, DetectorConfig, GestureError, GestureResult, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Landmark provider settings
    pub tracker: TrackerConfig,
    /// Per-frame detector settings
    pub detector: DetectorConfig,
    /// Confirmation state machine settings
    pub confirmer: ConfirmerConfig,
    /// Where downloaded/cached model files live
    pub model_cache_dir: PathBuf,
    /// Points awarded per confirmed letter
    pub points_per_letter: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());

        let mut model_cache_dir = PathBuf::from(home);
        model_cache_dir.push(".signsense");
        model_cache_dir.push("models");

        Self {
            tracker: TrackerConfig::default(),
            detector: DetectorConfig::default(),
            confirmer: ConfirmerConfig::default(),
            model_cache_dir,
            points_per_letter: 10,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file, creating it with defaults if it doesn't
    /// exist yet.
    pub fn load() -> GestureResult<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: PipelineConfig = serde_json::from_str(&contents)
                .map_err(|e| GestureError::InvalidConfig(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> GestureResult<()> {
        self.validate()?;

        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| GestureError::InvalidConfig(e.to_string()))?;
        std::fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> GestureResult<()> {
        if self.tracker.max_num_hands == 0 || self.tracker.max_num_hands > 2 {
            return Err(GestureError::InvalidConfig(format!(
                "Invalid max_num_hands: {}. Must be 1 or 2",
                self.tracker.max_num_hands
            )));
        }

        for (name, value) in [
            ("min_detection_confidence", self.tracker.min_detection_confidence),
            ("min_tracking_confidence", self.tracker.min_tracking_confidence),
            ("confidence_threshold", self.detector.confidence_threshold),
            ("confidence_floor", self.confirmer.confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GestureError::InvalidConfig(format!(
                    "Invalid {}: {}. Must be between 0.0 and 1.0",
                    name, value
                )));
            }
        }

        if !(0.0..0.5).contains(&self.detector.edge_margin) {
            return Err(GestureError::InvalidConfig(format!(
                "Invalid edge margin: {}. Must be between 0.0 and 0.5",
                self.detector.edge_margin
            )));
        }

        if self.detector.cooldown_ms == 0 || self.detector.cooldown_ms > 10_000 {
            return Err(GestureError::InvalidConfig(format!(
                "Invalid cooldown: {} ms. Must be between 1 and 10000",
                self.detector.cooldown_ms
            )));
        }

        if self.confirmer.hold_ms == 0 || self.confirmer.hold_ms > 30_000 {
            return Err(GestureError::InvalidConfig(format!(
                "Invalid hold window: {} ms. Must be between 1 and 30000",
                self.confirmer.hold_ms
            )));
        }

        if self.confirmer.tick_ms == 0 || self.confirmer.tick_ms > self.confirmer.hold_ms {
            return Err(GestureError::InvalidConfig(format!(
                "Invalid tick interval: {} ms. Must be between 1 and the hold window",
                self.confirmer.tick_ms
            )));
        }

        Ok(())
    }

    /// Get the configuration file path
    fn get_config_path() -> GestureResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| GestureError::InvalidConfig("Could not determine home directory".to_string()))?;

        let mut path = PathBuf::from(home);
        path.push(".signsense");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
