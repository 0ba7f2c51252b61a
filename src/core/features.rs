// Feature encoding - converts detected hands into the classifier input vector

use crate::models::hand::{Hand, HAND_LANDMARK_COUNT};

/// Coordinates per landmark (x, y, z).
const COORDS_PER_LANDMARK: usize = 3;

/// Slots per hand in the feature vector: 21 landmarks x 3 coordinates.
pub const HAND_FEATURE_LEN: usize = HAND_LANDMARK_COUNT * COORDS_PER_LANDMARK;

/// Total feature vector length: two hands x 63 slots.
pub const FEATURE_LEN: usize = 2 * HAND_FEATURE_LEN;

/// Fixed-length classifier input: [leftHand(63), rightHand(63)], each hand as
/// 21 x (x, y, z) in landmark index order, wrist-relative.
pub type FeatureVector = [f32; FEATURE_LEN];

/// Encode up to two detected hands into a fixed-length feature vector.
///
/// A single hand fills the right-hand slot; with two hands, the hand whose
/// wrist is further left on screen (smaller x) takes the left slot. Each
/// present hand is normalized by subtracting its own wrist coordinates from
/// every landmark; absent slots stay zero.
///
/// Malformed input (wrong landmark count, more than two hands) soft-fails to
/// zeros rather than erroring: a misencoded frame yields a wrong
/// classification, never a dead stream.
pub fn encode_hands(hands: &[Hand]) -> FeatureVector {
    let mut features = [0.0f32; FEATURE_LEN];

    match hands {
        [] => {}
        [hand] => {
            encode_hand_into(hand, &mut features, HAND_FEATURE_LEN);
        }
        [first, second] => {
            let first_x = first.wrist().map(|w| w.x).unwrap_or(0.0);
            let second_x = second.wrist().map(|w| w.x).unwrap_or(0.0);

            let (left, right) = if first_x <= second_x {
                (first, second)
            } else {
                (second, first)
            };

            encode_hand_into(left, &mut features, 0);
            encode_hand_into(right, &mut features, HAND_FEATURE_LEN);
        }
        _ => {
            // Upstream caps tracking at two hands; anything else is malformed.
        }
    }

    features
}

/// Write one hand's wrist-relative coordinates into its 63-slot window.
fn encode_hand_into(hand: &Hand, features: &mut FeatureVector, offset: usize) {
    if !hand.is_complete() {
        return; // slot stays zero
    }

    let wrist = match hand.wrist() {
        Some(w) => *w,
        None => return,
    };

    for (i, landmark) in hand.landmarks.iter().enumerate() {
        let base = offset + i * COORDS_PER_LANDMARK;
        features[base] = landmark.x - wrist.x;
        features[base + 1] = landmark.y - wrist.y;
        features[base + 2] = landmark.z - wrist.z;
    }
}
