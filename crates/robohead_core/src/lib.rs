//! # Robohead Core
//!
//! Shared vocabulary for the behavior engine: the value types that cross crate
//! and thread boundaries, the mood catalog, configuration, and the traits the
//! engine uses to talk to its external collaborators (camera pipeline, mood
//! sink, eye renderer).

pub mod config;
pub mod error;
pub mod math;
pub mod mood;

pub use config::{
    AnimationConfig, DisplayConfig, EnvironmentConfig, LoggingConfig, MoodEngineConfig,
    RoboheadConfig, SinkConfig, TrackingConfig,
};
pub use error::ConfigError;
pub use mood::{Mood, MoodCatalog};

use serde::{Deserialize, Serialize};

/// Normalized gaze point in `[-1, 1]²`, or `None` when no subject is tracked.
pub type GazeTarget = Option<(f32, f32)>;

/// Detection bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box area; negative extents count as empty.
    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Everything one perception cycle hands to the core.
#[derive(Debug, Clone, Default)]
pub struct PerceptionFrame {
    /// Mean luminance of the frame (0-255 scale for 8-bit greyscale)
    pub brightness: f32,
    pub detections: Vec<BoundingBox>,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Point-in-time copy of the aggregated environment signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Exponentially smoothed brightness
    pub brightness: f32,
    /// Fraction of the frame covered by detections (0.0 - 1.0)
    pub motion_level: f32,
    pub face_present: bool,
    /// How long the current face has been continuously present
    pub face_continuous_secs: f64,
    /// Seconds since the last face loss; infinite if none was ever recorded
    pub face_lost_ago: f64,
    /// Monotonic time the snapshot was taken at
    pub timestamp: f64,
}

impl EnvironmentSnapshot {
    /// A quiet, well-lit scene with nobody around.
    pub fn empty(brightness: f32, timestamp: f64) -> Self {
        Self {
            brightness,
            motion_level: 0.0,
            face_present: false,
            face_continuous_secs: 0.0,
            face_lost_ago: f64::INFINITY,
            timestamp,
        }
    }

    pub fn has_lost_face(&self) -> bool {
        self.face_lost_ago.is_finite()
    }
}

/// Complete state of one eye for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeState {
    /// Pupil position, 0.0 = center, -1.0..1.0
    pub pupil_x: f32,
    pub pupil_y: f32,
    /// Eyelid closure, 0.0 = open, 1.0 = fully closed
    pub upper_eyelid: f32,
    pub lower_eyelid: f32,
    /// Pupil dilation multiplier (1.0 = normal)
    pub pupil_scale: f32,
    /// Negative = angry, positive = surprised
    pub brow_angle: f32,
    pub squint: f32,
    pub is_left: bool,
}

impl EyeState {
    pub fn new(is_left: bool) -> Self {
        Self {
            pupil_x: 0.0,
            pupil_y: 0.0,
            upper_eyelid: 0.0,
            lower_eyelid: 0.0,
            pupil_scale: 1.0,
            brow_angle: 0.0,
            squint: 0.0,
            is_left,
        }
    }
}

/// Accepts mood-change requests. The sink owns the set of valid ids.
pub trait MoodSink {
    /// Returns `false` if the id was rejected.
    fn set_mood(&mut self, id: &str) -> bool;
}

/// Consumes the eye pose produced every render frame.
pub trait EyeRenderer {
    fn render(&mut self, left: &EyeState, right: &EyeState);
}

/// Camera + detector pipeline. One call = one perception cycle.
pub trait Perception: Send {
    fn capture(&mut self) -> anyhow::Result<PerceptionFrame>;
}

impl<S: MoodSink + ?Sized> MoodSink for Box<S> {
    fn set_mood(&mut self, id: &str) -> bool {
        (**self).set_mood(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_area_and_center() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert!((b.area() - 1200.0).abs() < 1e-6);
        assert_eq!(b.center(), (25.0, 40.0));
    }

    #[test]
    fn test_negative_extent_is_empty() {
        let b = BoundingBox::new(0.0, 0.0, -5.0, 10.0);
        assert_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_empty_snapshot_never_lost_face() {
        let snap = EnvironmentSnapshot::empty(50.0, 1.0);
        assert!(!snap.has_lost_face());
        assert!(!snap.face_present);
    }

    #[test]
    fn test_eye_state_defaults() {
        let eye = EyeState::new(true);
        assert!(eye.is_left);
        assert_eq!(eye.pupil_scale, 1.0);
        assert_eq!(eye.upper_eyelid, 0.0);
    }
}
