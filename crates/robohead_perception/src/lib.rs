//! # Robohead Perception
//!
//! Runs on the perception thread. Turns raw per-cycle detections into:
//!
//! - an [`EnvironmentAggregator`] holding smoothed brightness, motion level and
//!   face-presence bookkeeping, shared with the render thread behind a mutex;
//! - a [`GazeTracker`] that reduces detections to one smoothed gaze target and
//!   publishes it on a watch channel the render loop reads every frame.

mod environment;
mod gaze;

pub use environment::EnvironmentAggregator;
pub use gaze::{normalize_center, GazeTracker};
