//! Eye animation state machine
//!
//! Two independent sub-machines run every frame:
//! - gaze: `Tracking` a supplied target, or `Idle` wandering between random
//!   points; both feed the same smooth-pursuit lerp
//! - blink: `Open` accumulating time until the next blink, or `Blinking`
//!   sweeping a triangle-wave eyelid closure

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robohead_core::math::{clamp, lerp, uniform};
use robohead_core::{AnimationConfig, ConfigError, EyeState, GazeTarget};

/// Lower lid follows the upper lid at this ratio.
const LOWER_LID_RATIO: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeMode {
    Tracking,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkPhase {
    Open,
    /// `progress` runs 0 -> 1 over `blink_duration`
    Blinking { progress: f64 },
}

/// Eyelid closure for a blink at `progress` (0 = open, 0.5 = shut, 1 = open).
pub fn blink_closure(progress: f64) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    let closure = if p < 0.5 { p * 2.0 } else { (1.0 - p) * 2.0 };
    closure as f32
}

/// Produces animated eye pairs each frame.
pub struct EyeAnimator<R: Rng = StdRng> {
    config: AnimationConfig,
    rng: R,

    mode: GazeMode,
    current_gaze: (f32, f32),
    target_gaze: (f32, f32),
    /// Seconds since a target was last supplied
    no_target_time: f64,

    idle_target: (f32, f32),
    idle_timer: f64,
    idle_next: f64,

    blink: BlinkPhase,
    blink_timer: f64,
    next_blink: f64,

    left: EyeState,
    right: EyeState,
}

impl EyeAnimator<StdRng> {
    pub fn from_entropy(config: AnimationConfig) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::from_entropy())
    }

    pub fn seeded(config: AnimationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> EyeAnimator<R> {
    pub fn new(config: AnimationConfig, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let idle_next = uniform(&mut rng, config.idle_interval_min, config.idle_interval_max);
        let next_blink = uniform(&mut rng, config.blink_interval_min, config.blink_interval_max);
        Ok(Self {
            config,
            rng,
            mode: GazeMode::Idle,
            current_gaze: (0.0, 0.0),
            target_gaze: (0.0, 0.0),
            no_target_time: 0.0,
            idle_target: (0.0, 0.0),
            idle_timer: 0.0,
            idle_next,
            blink: BlinkPhase::Open,
            blink_timer: 0.0,
            next_blink,
            left: EyeState::new(true),
            right: EyeState::new(false),
        })
    }

    /// Advance by `dt` seconds. `target` is the normalized gaze point, if any.
    pub fn update(&mut self, dt: f64, target: GazeTarget) -> (EyeState, EyeState) {
        let dt = dt.max(0.0);

        match target {
            Some(point) => {
                if self.mode == GazeMode::Idle {
                    tracing::debug!("Eyes: idle -> tracking");
                }
                self.mode = GazeMode::Tracking;
                self.target_gaze = point;
                self.no_target_time = 0.0;
            }
            None => {
                self.no_target_time += dt;
                if self.mode == GazeMode::Tracking
                    && self.no_target_time > self.config.tracking_debounce_secs
                {
                    tracing::debug!(
                        "Eyes: tracking -> idle after {:.2}s without target",
                        self.no_target_time
                    );
                    self.mode = GazeMode::Idle;
                }
                // Inside the debounce window the last real target is held
                if self.mode == GazeMode::Idle {
                    self.update_idle(dt);
                    self.target_gaze = self.idle_target;
                }
            }
        }

        let k = self.config.pursuit_smoothing;
        self.current_gaze = (
            lerp(self.current_gaze.0, self.target_gaze.0, k),
            lerp(self.current_gaze.1, self.target_gaze.1, k),
        );

        self.update_blink(dt);
        let closure = match self.blink {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Blinking { progress } => blink_closure(progress),
        };

        for eye in [&mut self.left, &mut self.right] {
            eye.pupil_x = clamp(self.current_gaze.0, -1.0, 1.0);
            eye.pupil_y = clamp(self.current_gaze.1, -1.0, 1.0);
            eye.upper_eyelid = closure;
            eye.lower_eyelid = closure * LOWER_LID_RATIO;
        }

        // Slight convergence, as if focusing on something close
        self.left.pupil_x += self.config.vergence;
        self.right.pupil_x -= self.config.vergence;

        tracing::trace!(
            "Eyes: gaze=({:.2}, {:.2}) lid={:.2} mode={:?}",
            self.current_gaze.0,
            self.current_gaze.1,
            closure,
            self.mode
        );

        (self.left, self.right)
    }

    fn update_idle(&mut self, dt: f64) {
        self.idle_timer += dt;
        if self.idle_timer >= self.idle_next {
            let rx = self.config.idle_range_x as f64;
            let ry = self.config.idle_range_y as f64;
            self.idle_target = (
                uniform(&mut self.rng, -rx, rx) as f32,
                uniform(&mut self.rng, -ry, ry) as f32,
            );
            self.idle_timer = 0.0;
            self.idle_next = uniform(
                &mut self.rng,
                self.config.idle_interval_min,
                self.config.idle_interval_max,
            );
        }
    }

    fn update_blink(&mut self, dt: f64) {
        match self.blink {
            BlinkPhase::Blinking { progress } => {
                let progress = progress + dt / self.config.blink_duration;
                if progress >= 1.0 {
                    self.blink = BlinkPhase::Open;
                    self.blink_timer = 0.0;
                    self.next_blink = uniform(
                        &mut self.rng,
                        self.config.blink_interval_min,
                        self.config.blink_interval_max,
                    );
                } else {
                    self.blink = BlinkPhase::Blinking { progress };
                }
            }
            BlinkPhase::Open => {
                self.blink_timer += dt;
                if self.blink_timer >= self.next_blink {
                    self.blink = BlinkPhase::Blinking { progress: 0.0 };
                }
            }
        }
    }

    pub fn mode(&self) -> GazeMode {
        self.mode
    }

    pub fn blink_phase(&self) -> BlinkPhase {
        self.blink
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.blink, BlinkPhase::Blinking { .. })
    }

    /// Smoothed gaze before clamping and vergence.
    pub fn gaze(&self) -> (f32, f32) {
        self.current_gaze
    }
}
