//! Thread-safe environment signal buffer
//!
//! Single writer (perception thread), any number of readers (render loop at
//! the mood sub-rate, debug views). Every field lives behind one mutex so a
//! snapshot never mixes values from two different updates.

use robohead_core::{BoundingBox, ConfigError, EnvironmentConfig, EnvironmentSnapshot, PerceptionFrame};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Signals {
    brightness: f32,
    motion_level: f32,
    face_present: bool,
    face_appeared_at: f64,
    face_lost_at: Option<f64>,
    face_continuous_secs: f64,
    last_update: Option<f64>,
}

/// Aggregates high-rate perception samples into smoothed signals.
#[derive(Debug)]
pub struct EnvironmentAggregator {
    brightness_tau: f64,
    signals: Mutex<Signals>,
}

impl EnvironmentAggregator {
    pub fn new(config: &EnvironmentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            brightness_tau: config.brightness_tau,
            signals: Mutex::new(Signals {
                brightness: config.initial_brightness,
                motion_level: 0.0,
                face_present: false,
                face_appeared_at: 0.0,
                face_lost_at: None,
                face_continuous_secs: 0.0,
                last_update: None,
            }),
        })
    }

    // The guarded data is plain numbers; a panicked writer cannot leave it
    // in a state worse than "one update behind".
    fn lock(&self) -> MutexGuard<'_, Signals> {
        self.signals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one perception cycle into the aggregate.
    pub fn update(
        &self,
        raw_brightness: f32,
        detections: &[BoundingBox],
        face_present: bool,
        frame_w: u32,
        frame_h: u32,
        now: f64,
    ) {
        let motion = motion_level(detections, frame_w, frame_h);

        let mut s = self.lock();
        let dt = s.last_update.map_or(0.0, |last| now - last);
        s.last_update = Some(now);

        // Single-pole low-pass; alpha <= 1 keeps it from overshooting
        if dt > 0.0 && raw_brightness.is_finite() {
            let alpha = (dt / self.brightness_tau).clamp(0.0, 1.0) as f32;
            s.brightness += alpha * (raw_brightness - s.brightness);
        }

        s.motion_level = motion;

        match (s.face_present, face_present) {
            (false, true) => {
                s.face_appeared_at = now;
                s.face_continuous_secs = 0.0;
                tracing::debug!("Face appeared at {:.2}", now);
            }
            (true, true) => {
                s.face_continuous_secs = (now - s.face_appeared_at).max(0.0);
            }
            (true, false) => {
                s.face_lost_at = Some(now);
                s.face_continuous_secs = 0.0;
                tracing::debug!("Face lost at {:.2}", now);
            }
            (false, false) => {}
        }
        s.face_present = face_present;
    }

    pub fn update_from_frame(&self, frame: &PerceptionFrame, face_present: bool, now: f64) {
        self.update(
            frame.brightness,
            &frame.detections,
            face_present,
            frame.frame_width,
            frame.frame_height,
            now,
        );
    }

    /// Consistent point-in-time copy of all signals.
    pub fn snapshot(&self, now: f64) -> EnvironmentSnapshot {
        let s = self.lock();
        EnvironmentSnapshot {
            brightness: s.brightness,
            motion_level: s.motion_level,
            face_present: s.face_present,
            face_continuous_secs: s.face_continuous_secs,
            face_lost_ago: s
                .face_lost_at
                .map_or(f64::INFINITY, |lost| (now - lost).max(0.0)),
            timestamp: now,
        }
    }

    pub fn brightness(&self) -> f32 {
        self.lock().brightness
    }
}

/// Fraction of the frame covered by detection boxes, capped at 1.
fn motion_level(detections: &[BoundingBox], frame_w: u32, frame_h: u32) -> f32 {
    if detections.is_empty() {
        return 0.0;
    }
    let frame_area = (frame_w as f64 * frame_h as f64).max(1.0);
    let total: f64 = detections.iter().map(|b| b.area() as f64).sum();
    (total / frame_area).min(1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn aggregator() -> EnvironmentAggregator {
        EnvironmentAggregator::new(&EnvironmentConfig::default()).unwrap()
    }

    #[test]
    fn test_motion_level_is_area_fraction() {
        let agg = aggregator();
        let boxes = [BoundingBox::new(0.0, 0.0, 40.0, 30.0)];
        agg.update(50.0, &boxes, false, 160, 120, 0.1);
        let snap = agg.snapshot(0.1);
        assert!((snap.motion_level - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_motion_level_capped_at_one() {
        let agg = aggregator();
        let boxes = [
            BoundingBox::new(0.0, 0.0, 160.0, 120.0),
            BoundingBox::new(0.0, 0.0, 160.0, 120.0),
        ];
        agg.update(50.0, &boxes, false, 160, 120, 0.1);
        assert_eq!(agg.snapshot(0.1).motion_level, 1.0);
    }

    #[test]
    fn test_no_boxes_means_no_motion() {
        let agg = aggregator();
        agg.update(50.0, &[BoundingBox::new(0.0, 0.0, 10.0, 10.0)], false, 160, 120, 0.1);
        agg.update(50.0, &[], false, 160, 120, 0.2);
        assert_eq!(agg.snapshot(0.2).motion_level, 0.0);
    }

    #[test]
    fn test_zero_frame_size_does_not_divide_by_zero() {
        let agg = aggregator();
        agg.update(50.0, &[BoundingBox::new(0.0, 0.0, 0.5, 0.5)], false, 0, 0, 0.1);
        let m = agg.snapshot(0.1).motion_level;
        assert!(m.is_finite() && (0.0..=1.0).contains(&m));
    }

    #[test]
    fn test_brightness_smoothing_step() {
        let agg = aggregator(); // tau = 1.0, starts at 50
        agg.update(50.0, &[], false, 160, 120, 0.0);
        agg.update(150.0, &[], false, 160, 120, 0.5);
        // alpha = 0.5 -> halfway
        assert!((agg.brightness() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_brightness_ignores_non_positive_dt() {
        let agg = aggregator();
        agg.update(50.0, &[], false, 160, 120, 1.0);
        agg.update(200.0, &[], false, 160, 120, 1.0);
        agg.update(200.0, &[], false, 160, 120, 0.5);
        assert_eq!(agg.brightness(), 50.0);
    }

    #[test]
    fn test_large_dt_snaps_to_raw() {
        let agg = aggregator();
        agg.update(50.0, &[], false, 160, 120, 0.0);
        agg.update(10.0, &[], false, 160, 120, 5.0);
        assert_eq!(agg.brightness(), 10.0);
    }

    #[test]
    fn test_face_edges() {
        let agg = aggregator();
        agg.update(50.0, &[], true, 160, 120, 1.0);
        assert_eq!(agg.snapshot(1.0).face_continuous_secs, 0.0);

        agg.update(50.0, &[], true, 160, 120, 3.5);
        let snap = agg.snapshot(3.5);
        assert!(snap.face_present);
        assert!((snap.face_continuous_secs - 2.5).abs() < 1e-9);
        assert!(snap.face_lost_ago.is_infinite());

        agg.update(50.0, &[], false, 160, 120, 4.0);
        let snap = agg.snapshot(6.0);
        assert!(!snap.face_present);
        assert_eq!(snap.face_continuous_secs, 0.0);
        assert!((snap.face_lost_ago - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_continuous_secs_resets_on_reappearance() {
        let agg = aggregator();
        agg.update(50.0, &[], true, 160, 120, 0.0);
        agg.update(50.0, &[], true, 160, 120, 10.0);
        agg.update(50.0, &[], false, 160, 120, 11.0);
        agg.update(50.0, &[], true, 160, 120, 12.0);
        assert_eq!(agg.snapshot(12.0).face_continuous_secs, 0.0);
        agg.update(50.0, &[], true, 160, 120, 13.0);
        assert!((agg.snapshot(13.0).face_continuous_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_from_other_thread() {
        let agg = Arc::new(aggregator());
        let writer = Arc::clone(&agg);
        let handle = std::thread::spawn(move || {
            for i in 0..200 {
                let t = i as f64 * 0.01;
                writer.update(100.0, &[], i % 2 == 0, 160, 120, t);
            }
        });
        for _ in 0..200 {
            let snap = agg.snapshot(2.0);
            // Either absent with zero duration, or present; never torn
            if !snap.face_present {
                assert_eq!(snap.face_continuous_secs, 0.0);
            }
            assert!(snap.brightness >= 50.0 && snap.brightness <= 100.0);
        }
        handle.join().unwrap();
    }
}
