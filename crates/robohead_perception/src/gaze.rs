//! Gaze target smoothing
//!
//! Picks the closest subject (largest box) each cycle, maps it into the
//! robot's own frame of reference and low-pass filters it. A target survives
//! short detection dropouts and is dropped only after `lost_timeout`.

use robohead_core::math::{clamp, lerp};
use robohead_core::{BoundingBox, ConfigError, GazeTarget, PerceptionFrame, TrackingConfig};
use tokio::sync::watch;

/// Reduces raw detections to one smoothed, normalized gaze target.
pub struct GazeTracker {
    smoothing: f32,
    lost_timeout: f64,
    last_detection_time: Option<f64>,
    /// Latest un-smoothed target; kept after the timeout, only `current` is cleared
    raw: GazeTarget,
    current: GazeTarget,

    /// Render loop subscribes to this
    target_tx: watch::Sender<GazeTarget>,
    target_rx: watch::Receiver<GazeTarget>,
}

impl GazeTracker {
    pub fn new(config: &TrackingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (target_tx, target_rx) = watch::channel(None);
        Ok(Self {
            smoothing: config.smoothing,
            lost_timeout: config.lost_timeout,
            last_detection_time: None,
            raw: None,
            current: None,
            target_tx,
            target_rx,
        })
    }

    /// Process one cycle of detections. Returns the smoothed target, or `None`
    /// when nothing has been seen for longer than `lost_timeout`.
    pub fn update(
        &mut self,
        detections: &[BoundingBox],
        frame_w: u32,
        frame_h: u32,
        now: f64,
    ) -> GazeTarget {
        let target = self.step(detections, frame_w, frame_h, now);
        self.target_tx.send_replace(target);
        target
    }

    pub fn update_frame(&mut self, frame: &PerceptionFrame, now: f64) -> GazeTarget {
        self.update(&frame.detections, frame.frame_width, frame.frame_height, now)
    }

    fn step(&mut self, detections: &[BoundingBox], frame_w: u32, frame_h: u32, now: f64) -> GazeTarget {
        if let Some(biggest) = largest(detections) {
            self.raw = Some(normalize_center(biggest, frame_w, frame_h));
            self.last_detection_time = Some(now);
        }

        let timed_out = match self.last_detection_time {
            Some(last) => now - last > self.lost_timeout,
            None => true,
        };
        if timed_out {
            if self.current.take().is_some() {
                tracing::debug!("Gaze target lost after {:.2}s timeout", self.lost_timeout);
            }
            return None;
        }

        let (rx, ry) = self.raw?;
        self.current = Some(match self.current {
            None => (rx, ry),
            Some((cx, cy)) => (
                clamp(lerp(cx, rx, self.smoothing), -1.0, 1.0),
                clamp(lerp(cy, ry, self.smoothing), -1.0, 1.0),
            ),
        });
        self.current
    }

    /// Latest smoothed target without advancing the tracker.
    pub fn current(&self) -> GazeTarget {
        self.current
    }

    /// Receiver that always holds the most recent published target.
    pub fn subscribe(&self) -> watch::Receiver<GazeTarget> {
        self.target_rx.clone()
    }
}

/// Largest box by area; the first one wins ties.
fn largest(detections: &[BoundingBox]) -> Option<&BoundingBox> {
    let mut best: Option<&BoundingBox> = None;
    for b in detections {
        match best {
            Some(current) if b.area() <= current.area() => {}
            _ => best = Some(b),
        }
    }
    best
}

/// Normalize a box center to `[-1, 1]²` and mirror x.
///
/// The camera faces the viewer, so its left is the robot's right: a subject
/// at pixel x = 0 must produce gaze x = +1.
pub fn normalize_center(b: &BoundingBox, frame_w: u32, frame_h: u32) -> (f32, f32) {
    let (px, py) = b.center();
    let w = (frame_w as f32).max(1.0);
    let h = (frame_h as f32).max(1.0);
    let cx = clamp(px / w * 2.0 - 1.0, -1.0, 1.0);
    let cy = clamp(py / h * 2.0 - 1.0, -1.0, 1.0);
    (-cx, cy)
}
