//! Real-time sign-language alphabet gesture recognition pipeline.
//!
//! Camera frames flow from an external landmark provider through the
//! [`core::detector::GestureDetector`] (visibility gating, feature encoding,
//! classifier inference, rate limiting) into the
//! [`core::confirmer::GestureConfirmer`], which decides when a sustained
//! correct gesture confirms the expected letter. The
//! [`core::pipeline::GesturePipeline`] owns the whole stack for the lifetime
//! of the application and hands out attach/detach lifecycles to exercise
//! views; [`core::exercise::ExerciseSession`] drives letter and word
//! practice on top of it.

pub mod core;
pub mod models;

pub use crate::core::classifier::{Classifier, NullClassifier};
pub use crate::core::config::PipelineConfig;
pub use crate::core::confirmer::{ConfirmerEvent, GestureConfirmer};
pub use crate::core::detector::GestureDetector;
pub use crate::core::exercise::{
    ContentSource, ExercisePlan, ExerciseSession, LetterDrill, SessionAdvance, WordDrill,
};
pub use crate::core::features::{encode_hands, FeatureVector, FEATURE_LEN};
pub use crate::core::pipeline::{GesturePipeline, PipelineStatus};
pub use crate::models::gesture::{
    ConfirmationSnapshot, DetectionEvent, GameState, GestureError, GestureResult, Letter,
};
pub use crate::models::hand::{Hand, HandLandmark, Landmark, LandmarkFrame};

#[cfg(feature = "ml-onnx")]
pub use crate::core::classifier::onnx::OnnxClassifier;
