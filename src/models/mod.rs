// Data models for hand landmark streams and gesture classification

pub mod gesture;
pub mod hand;
