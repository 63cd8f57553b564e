pub mod activity;
pub mod classifier;
pub mod feature_extractor;
pub mod form_scorer;
pub mod geometry;
pub mod keypoint;
pub mod scoring;
pub mod spectrum;
pub mod stabilizer;
pub mod statistics;
pub mod temporal_window;
