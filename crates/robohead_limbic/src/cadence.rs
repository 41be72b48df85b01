//! Cadence configuration for the render loop
//!
//! The render loop runs at the display frame rate; the mood engine is ticked
//! from inside that loop at a much lower sub-rate.

use robohead_core::DisplayConfig;
use std::time::Duration;

/// Frame and mood intervals for the render loop
#[derive(Debug, Clone)]
pub struct CadenceConfig {
    /// How often a frame is animated and rendered (default: 30 Hz)
    pub frame_interval: Duration,
    /// How often the mood engine is ticked (default: 500ms)
    pub mood_interval: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / 30.0),
            mood_interval: Duration::from_millis(500),
        }
    }
}

impl CadenceConfig {
    pub fn from_display(display: &DisplayConfig) -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / display.fps_target.max(1) as f64),
            mood_interval: Duration::from_secs_f64(display.mood_tick_secs),
        }
    }

    /// Smooth motion for capable displays
    pub fn fast() -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / 60.0),
            mood_interval: Duration::from_millis(250),
        }
    }

    /// Resource-constrained boards
    pub fn slow() -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / 15.0),
            mood_interval: Duration::from_secs(1),
        }
    }

    /// Very fast cadence for testing
    pub fn testing() -> Self {
        Self {
            frame_interval: Duration::from_millis(10),
            mood_interval: Duration::from_millis(50),
        }
    }

    pub fn mood_cadence(&self) -> MoodCadence {
        MoodCadence::new(self.mood_interval.as_secs_f64())
    }
}

/// Gate deciding which render frames also tick the mood engine.
#[derive(Debug, Clone)]
pub struct MoodCadence {
    interval: f64,
    last: Option<f64>,
}

impl MoodCadence {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval: interval_secs.max(0.0),
            last: None,
        }
    }

    /// Returns the time since the previous mood tick when one is due.
    /// The first call only starts the clock.
    pub fn poll(&mut self, now: f64) -> Option<f64> {
        match self.last {
            None => {
                self.last = Some(now);
                None
            }
            Some(last) if now - last >= self.interval => {
                self.last = Some(now);
                Some(now - last)
            }
            Some(_) => None,
        }
    }
}
