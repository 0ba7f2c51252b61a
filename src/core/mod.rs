pub mod classifier;
pub mod config;
pub mod confirmer;
pub mod detector;
pub mod exercise;
pub mod features;
pub mod model_store;
pub mod pipeline;
pub mod visibility;
