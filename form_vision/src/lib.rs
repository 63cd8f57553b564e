// THEORY:
// This file is the main entry point for the `form_vision` library crate. It
// exposes the `ActivitySession` (and its `SessionConfig`, `Assessment` and
// `WindowStatistics` types) as the high-level interface of the form engine: feed it
// one frame of body keypoints at a time and read back what the person is doing
// and how well.
//
// The biomechanics live in `core_modules`, leaves first: geometry, keypoints,
// feature extraction, the temporal window, spectral and window statistics, the
// classifier with its stabilizer, and the form scorer. `summary` condenses a whole
// session into a report, and `parallel_pipeline` hosts many sessions on a pool of
// tokio workers.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod summary;
