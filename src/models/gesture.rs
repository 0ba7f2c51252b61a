// Data models for gesture classification and confirmation

use serde::{Deserialize, Serialize};

/// Size of the gesture alphabet (letters A through Z).
pub const ALPHABET_LEN: usize = 26;

// ==============================================================================
// Gesture Label
// ==============================================================================

/// A single letter of the gesture alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub struct Letter(u8);

impl Letter {
    /// Build a letter from its class index (0 = A, 25 = Z).
    pub fn from_index(index: usize) -> Option<Self> {
        if index < ALPHABET_LEN {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_char(self) -> char {
        (b'A' + self.0) as char
    }
}

impl TryFrom<char> for Letter {
    type Error = GestureError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Self(upper as u8 - b'A'))
        } else {
            Err(GestureError::InvalidLabel(c))
        }
    }
}

impl From<Letter> for char {
    fn from(letter: Letter) -> char {
        letter.as_char()
    }
}

impl std::fmt::Display for Letter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ==============================================================================
// Classifier Output
// ==============================================================================

/// Probability distribution over the 26 gesture classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassScores(pub [f32; ALPHABET_LEN]);

impl ClassScores {
    /// The arg-max class and its probability.
    pub fn top(&self) -> (Letter, f32) {
        let mut best = 0usize;
        for (i, score) in self.0.iter().enumerate() {
            if *score > self.0[best] {
                best = i;
            }
        }
        // best < ALPHABET_LEN by construction
        (Letter(best as u8), self.0[best])
    }
}

// ==============================================================================
// Detection Events
// ==============================================================================

/// One detection result per processed frame.
///
/// `label == None` signals "no qualifying hand visible" (hand removed, or the
/// arg-max probability fell below the detector's confidence threshold).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub label: Option<Letter>,
    pub confidence: f32,
}

impl DetectionEvent {
    pub fn none() -> Self {
        Self { label: None, confidence: 0.0 }
    }

    pub fn positive(label: Letter, confidence: f32) -> Self {
        Self {
            label: Some(label),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

// ==============================================================================
// Confirmation State
// ==============================================================================

/// Read-only view of the confirmation state machine, consumed by the UI and
/// the exercise controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationSnapshot {
    pub expected: Option<Letter>,
    pub accumulating: bool,
    /// Hold progress in `[0, 1]` toward the confirmation window.
    pub progress: f32,
    pub is_correct: bool,
    pub is_incorrect: bool,
}

/// Exercise-level game state, owned exclusively by the exercise session.
///
/// The confirmation state machine only reports progress; it never drives
/// transitions between exercise items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Idle,
    Detecting,
    Transitioning,
    Completed,
}

impl GameState {
    pub fn to_string(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Detecting => "detecting",
            GameState::Transitioning => "transitioning",
            GameState::Completed => "completed",
        }
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

/// Configuration for the external landmark provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum simultaneous hands to track (default: 2)
    pub max_num_hands: u32,
    /// Enable high tracking smoothing
    pub smooth_landmarks: bool,
    /// Minimum confidence for initial hand detection (default: 0.5)
    pub min_detection_confidence: f32,
    /// Minimum confidence for frame-to-frame tracking (default: 0.7)
    pub min_tracking_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_num_hands: 2,
            smooth_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.7,
        }
    }
}

/// Configuration for the per-frame gesture detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Arg-max probabilities at or below this are treated as no-gesture
    pub confidence_threshold: f32,
    /// Minimum interval between emitted positive classifications
    pub cooldown_ms: u64,
    /// Inward margin (fraction of frame) for the full-visibility gate
    pub edge_margin: f32,
    /// Landmarks closer to the camera than this relative depth fail the gate
    pub min_depth: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            cooldown_ms: 1000,
            edge_margin: 0.05,
            min_depth: -0.5,
        }
    }
}

/// Configuration for the gesture confirmation state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmerConfig {
    /// How long a correct gesture must be held before it confirms
    pub hold_ms: u64,
    /// Progress polling interval
    pub tick_ms: u64,
    /// Last-sample confidence required at the end of the hold window
    pub confidence_floor: f32,
    /// How long the "incorrect" transient flag stays raised
    pub incorrect_flash_ms: u64,
}

impl Default for ConfirmerConfig {
    fn default() -> Self {
        Self {
            hold_ms: 2000,
            tick_ms: 100,
            confidence_floor: 0.6,
            incorrect_flash_ms: 300,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    #[error("Classifier not initialized")]
    NotInitialized,

    #[error("Detector already running")]
    AlreadyRunning,

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Model download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid gesture label: {0}")]
    InvalidLabel(char),

    #[error("Content source failed: {0}")]
    ContentUnavailable(String),

    #[error("Event channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type GestureResult<T> = Result<T, GestureError>;
