// Data models for hand landmark streams
//
// The landmark provider delivers, per captured frame, zero or more detected
// hands as 21 normalized 3D points each. All of these types are frame-scoped:
// they are created by the provider callback and discarded once the frame has
// been processed.

use serde::{Deserialize, Serialize};

/// Number of landmarks per detected hand (wrist + finger joints).
pub const HAND_LANDMARK_COUNT: usize = 21;

/// A single 3D landmark in normalized frame coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the frame; `z` is relative depth
/// with the wrist as reference (negative values are closer to the camera).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Hand landmark indices (21 total), matching the provider's ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    /// The five fingertip landmarks, used by the visibility gate.
    pub const FINGERTIPS: [HandLandmark; 5] = [
        HandLandmark::ThumbTip,
        HandLandmark::IndexFingerTip,
        HandLandmark::MiddleFingerTip,
        HandLandmark::RingFingerTip,
        HandLandmark::PinkyTip,
    ];

    /// The five palm/knuckle landmarks (thumb CMC + four finger MCPs).
    pub const KNUCKLES: [HandLandmark; 5] = [
        HandLandmark::ThumbCmc,
        HandLandmark::IndexFingerMcp,
        HandLandmark::MiddleFingerMcp,
        HandLandmark::RingFingerMcp,
        HandLandmark::PinkyMcp,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One detected hand: an ordered sequence of 21 landmarks.
///
/// No hand identity persists across frames; the provider produces fresh
/// instances every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Whether all 21 landmarks were reported for this hand.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == HAND_LANDMARK_COUNT
    }

    pub fn get(&self, landmark: HandLandmark) -> Option<&Landmark> {
        self.landmarks.get(landmark.index())
    }

    /// The wrist landmark, reference point for feature normalization.
    pub fn wrist(&self) -> Option<&Landmark> {
        self.get(HandLandmark::Wrist)
    }
}

/// Per-frame payload from the landmark provider boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_ms: i64,
    pub hands: Vec<Hand>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: i64, hands: Vec<Hand>) -> Self {
        Self { timestamp_ms, hands }
    }

    /// Build a frame stamped with the current wall-clock time.
    pub fn now(hands: Vec<Hand>) -> Self {
        Self::new(chrono::Utc::now().timestamp_millis(), hands)
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}
