// Full-hand visibility gate
//
// A hand only qualifies for classification when it is entirely inside the
// frame: truncated hands produce spurious low-confidence classifications, so
// they are tracked for drawing purposes only and never reach the classifier.

use crate::models::hand::{Hand, HandLandmark, Landmark};

/// Whether a hand qualifies for classification.
///
/// Requires all 21 landmarks to be present, the wrist and all five fingertips
/// to lie within `edge_margin` of every frame edge and no closer to the
/// camera than `min_depth`, and the five palm/knuckle landmarks to be
/// present.
pub fn hand_fully_visible(hand: &Hand, edge_margin: f32, min_depth: f32) -> bool {
    if !hand.is_complete() {
        return false;
    }

    let wrist = match hand.wrist() {
        Some(w) => w,
        None => return false,
    };

    if !landmark_in_bounds(wrist, edge_margin, min_depth) {
        return false;
    }

    for tip in HandLandmark::FINGERTIPS {
        match hand.get(tip) {
            Some(landmark) if landmark_in_bounds(landmark, edge_margin, min_depth) => {}
            _ => return false,
        }
    }

    for knuckle in HandLandmark::KNUCKLES {
        if hand.get(knuckle).is_none() {
            return false;
        }
    }

    true
}

fn landmark_in_bounds(landmark: &Landmark, edge_margin: f32, min_depth: f32) -> bool {
    landmark.x >= edge_margin
        && landmark.x <= 1.0 - edge_margin
        && landmark.y >= edge_margin
        && landmark.y <= 1.0 - edge_margin
        && landmark.z >= min_depth
}
