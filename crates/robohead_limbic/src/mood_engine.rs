//! Autonomous mood engine
//!
//! A finite state machine ticked at ~2 Hz from the render loop. Each tick it
//! reads one environment snapshot, updates its edge detectors and sustained
//! brightness timers, and runs the handler for the current state. Every
//! timer it needs is a plain field on the engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robohead_core::math::uniform;
use robohead_core::{ConfigError, EnvironmentSnapshot, Mood, MoodEngineConfig, MoodSink};
use serde::{Deserialize, Serialize};

/// Brief mood flashes while idle.
const IDLE_PERSONALITY: [Mood; 5] = [
    Mood::Surprised,
    Mood::Mischievous,
    Mood::Wink,
    Mood::Star,
    Mood::Tired,
];

/// Rotation while bored, in order.
const BORED_MOODS: [Mood; 4] = [Mood::Tired, Mood::Confused, Mood::Sleepy, Mood::Sad];

/// Affection flashes while bonded.
const BONDED_AFFECTION: [Mood; 4] = [Mood::Happy, Mood::Love, Mood::Wink, Mood::Celebrating];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodState {
    Sleeping,
    Waking,
    Idle,
    Engaged,
    Bonded,
    Bored,
}

/// Observability view of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEngineStatus {
    pub enabled: bool,
    pub state: MoodState,
    /// Seconds left on a manual override pause, 0 when none
    pub override_remaining: f64,
}

/// Drives a [`MoodSink`] from environment history.
pub struct MoodEngine<S: MoodSink, R: Rng = StdRng> {
    config: MoodEngineConfig,
    sink: S,
    rng: R,

    state: MoodState,
    /// Set on the first active tick, then on every transition
    state_entered: Option<f64>,

    enabled: bool,
    manual_override_until: f64,

    /// Start of the current run of bright / dark snapshots
    bright_since: Option<f64>,
    dark_since: Option<f64>,
    prev_face_present: bool,

    /// Pending return to neutral after a transient mood
    revert_at: Option<f64>,
    /// Waking: the one-off tired -> neutral switch
    waking_halfway_at: Option<f64>,
    next_personality: Option<f64>,
    next_affection: f64,
    bored_index: usize,
    bored_next_switch: f64,
}

impl<S: MoodSink> MoodEngine<S, StdRng> {
    pub fn from_entropy(config: MoodEngineConfig, sink: S) -> Result<Self, ConfigError> {
        Self::new(config, sink, StdRng::from_entropy())
    }

    pub fn seeded(config: MoodEngineConfig, sink: S, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, sink, StdRng::seed_from_u64(seed))
    }
}

impl<S: MoodSink, R: Rng> MoodEngine<S, R> {
    pub fn new(config: MoodEngineConfig, sink: S, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!("MoodEngine initialized (state={:?})", MoodState::Idle);
        Ok(Self {
            config,
            sink,
            rng,
            state: MoodState::Idle,
            state_entered: None,
            enabled: true,
            manual_override_until: f64::NEG_INFINITY,
            bright_since: None,
            dark_since: None,
            prev_face_present: false,
            revert_at: None,
            waking_halfway_at: None,
            next_personality: None,
            next_affection: 0.0,
            bored_index: 0,
            bored_next_switch: 0.0,
        })
    }

    pub fn state(&self) -> MoodState {
        self.state
    }

    pub fn state_entered(&self) -> Option<f64> {
        self.state_entered
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        tracing::info!("MoodEngine {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Someone picked a mood by hand: hold off automatic changes for a while.
    pub fn notify_manual_mood(&mut self, now: f64) {
        self.manual_override_until = now + self.config.manual_pause_secs;
        tracing::info!(
            "Auto-mood paused for {:.1}s (manual override)",
            self.config.manual_pause_secs
        );
    }

    pub fn status(&self, now: f64) -> MoodEngineStatus {
        MoodEngineStatus {
            enabled: self.enabled,
            state: self.state,
            override_remaining: (self.manual_override_until - now).max(0.0),
        }
    }

    /// Advance the state machine with a fresh snapshot.
    pub fn tick(&mut self, dt: f64, env: &EnvironmentSnapshot) {
        if !self.enabled {
            return;
        }
        let now = env.timestamp;
        // Frozen: no timers, no edges, no transitions
        if now < self.manual_override_until {
            return;
        }
        let entered = *self.state_entered.get_or_insert(now);

        let face_appeared = env.face_present && !self.prev_face_present;
        let face_lost = !env.face_present && self.prev_face_present;
        self.prev_face_present = env.face_present;

        if env.brightness < self.config.sleep_brightness {
            self.dark_since.get_or_insert(now);
        } else {
            self.dark_since = None;
        }
        if env.brightness >= self.config.wake_brightness {
            self.bright_since.get_or_insert(now);
        } else {
            self.bright_since = None;
        }

        tracing::trace!(
            "MoodEngine tick: dt={:.2} state={:?} brightness={:.1} face={} motion={:.2}",
            dt,
            self.state,
            env.brightness,
            env.face_present,
            env.motion_level
        );

        // Darkness wins over everything else
        if self.state != MoodState::Sleeping && held_for(self.dark_since, now, self.config.dark_to_sleep_secs) {
            self.enter_sleeping(now);
            return;
        }

        match self.state {
            MoodState::Sleeping => self.tick_sleeping(now, face_appeared),
            MoodState::Waking => self.tick_waking(now, entered),
            MoodState::Idle => self.tick_idle(now, entered, face_appeared, env.motion_level),
            MoodState::Engaged => self.tick_engaged(now, env),
            MoodState::Bonded => self.tick_bonded(now, env.face_present, face_lost),
            MoodState::Bored => self.tick_bored(now, face_appeared),
        }
    }

    fn transition(&mut self, to: MoodState, now: f64) {
        tracing::info!("MoodEngine: {:?} -> {:?}", self.state, to);
        self.state = to;
        self.state_entered = Some(now);
    }

    /// Forward one request to the sink; a rejection is logged, never retried.
    fn request(&mut self, mood: Mood) -> bool {
        let accepted = self.sink.set_mood(mood.as_str());
        if !accepted {
            tracing::warn!(
                "Mood sink rejected '{}' (state={:?}), continuing",
                mood,
                self.state
            );
        }
        accepted
    }

    /// Show `mood` now and fall back to neutral after `secs`.
    fn flash(&mut self, mood: Mood, now: f64, secs: f64) {
        tracing::debug!("MoodEngine flash: {} for {:.1}s", mood, secs);
        self.request(mood);
        self.revert_at = Some(now + secs);
    }

    fn revert_if_due(&mut self, now: f64) {
        if let Some(at) = self.revert_at {
            if now >= at {
                self.revert_at = None;
                self.request(Mood::Neutral);
            }
        }
    }

    fn draw_personality_wait(&mut self) -> f64 {
        uniform(
            &mut self.rng,
            self.config.personality_interval_min,
            self.config.personality_interval_max,
        )
    }

    fn draw_affection_wait(&mut self) -> f64 {
        uniform(
            &mut self.rng,
            self.config.bonded_affection_interval_min,
            self.config.bonded_affection_interval_max,
        )
    }

    fn draw_flash_secs(&mut self) -> f64 {
        uniform(&mut self.rng, self.config.flash_min_secs, self.config.flash_max_secs)
    }

    fn pick(&mut self, pool: &[Mood]) -> Mood {
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn enter_sleeping(&mut self, now: f64) {
        self.transition(MoodState::Sleeping, now);
        self.revert_at = None;
        self.waking_halfway_at = None;
        self.request(Mood::Sleepy);
    }

    fn enter_idle(&mut self, now: f64) {
        self.transition(MoodState::Idle, now);
        let wait = self.draw_personality_wait();
        self.next_personality = Some(now + wait);
    }

    // --- SLEEPING ---
    fn tick_sleeping(&mut self, now: f64, face_appeared: bool) {
        if face_appeared || held_for(self.bright_since, now, self.config.bright_to_wake_secs) {
            self.transition(MoodState::Waking, now);
            self.request(Mood::Tired);
            self.waking_halfway_at = Some(now + self.config.waking_duration / 2.0);
        }
    }

    // --- WAKING ---
    fn tick_waking(&mut self, now: f64, entered: f64) {
        if let Some(at) = self.waking_halfway_at {
            if now >= at {
                self.waking_halfway_at = None;
                self.request(Mood::Neutral);
            }
        }

        if now - entered >= self.config.waking_duration {
            self.waking_halfway_at = None;
            self.enter_idle(now);
            self.request(Mood::Neutral);
        }
    }

    // --- IDLE ---
    fn tick_idle(&mut self, now: f64, entered: f64, face_appeared: bool, motion: f32) {
        self.revert_if_due(now);

        if face_appeared {
            self.transition(MoodState::Engaged, now);
            self.flash(Mood::Happy, now, self.config.greeting_flash_secs);
            return;
        }

        if motion > self.config.motion_surprise_threshold && self.revert_at.is_none() {
            self.flash(Mood::Surprised, now, self.config.surprise_flash_secs);
            let wait = self.draw_personality_wait();
            self.next_personality = Some(now + wait);
            return;
        }

        if now - entered >= self.config.idle_to_bored_secs {
            self.transition(MoodState::Bored, now);
            self.revert_at = None;
            self.bored_index = 0;
            self.request(BORED_MOODS[0]);
            self.bored_next_switch = now + self.config.bored_mood_cycle_secs;
            return;
        }

        let next = match self.next_personality {
            Some(next) => next,
            None => {
                // Engine started in Idle without an entry tick
                let next = now + self.draw_personality_wait();
                self.next_personality = Some(next);
                next
            }
        };
        if now >= next && self.revert_at.is_none() {
            let mood = self.pick(&IDLE_PERSONALITY);
            let secs = self.draw_flash_secs();
            self.flash(mood, now, secs);
            let wait = self.draw_personality_wait();
            self.next_personality = Some(now + wait);
        }
    }

    // --- ENGAGED ---
    fn tick_engaged(&mut self, now: f64, env: &EnvironmentSnapshot) {
        self.revert_if_due(now);

        if env.face_present && env.face_continuous_secs >= self.config.engaged_to_bonded_secs {
            self.transition(MoodState::Bonded, now);
            self.revert_at = None;
            self.request(Mood::Neutral);
            let wait = self.draw_affection_wait();
            self.next_affection = now + wait;
            return;
        }

        if !env.face_present && env.face_lost_ago >= self.config.face_lost_to_idle_secs {
            self.enter_idle(now);
            self.flash(Mood::Sad, now, self.config.greeting_flash_secs);
        }
    }

    // --- BONDED ---
    fn tick_bonded(&mut self, now: f64, face_present: bool, face_lost: bool) {
        // No grace period here, unlike Engaged
        if face_lost {
            self.enter_idle(now);
            self.flash(Mood::Sad, now, self.config.greeting_flash_secs);
            return;
        }

        self.revert_if_due(now);

        if face_present && now >= self.next_affection {
            let mood = self.pick(&BONDED_AFFECTION);
            let secs = self.draw_flash_secs();
            self.flash(mood, now, secs);
            let wait = self.draw_affection_wait();
            self.next_affection = now + wait;
        }
    }

    // --- BORED ---
    fn tick_bored(&mut self, now: f64, face_appeared: bool) {
        if face_appeared {
            self.transition(MoodState::Engaged, now);
            self.flash(Mood::Excited, now, self.config.greeting_flash_secs);
            return;
        }

        if now >= self.bored_next_switch {
            self.bored_index = (self.bored_index + 1) % BORED_MOODS.len();
            self.request(BORED_MOODS[self.bored_index]);
            self.bored_next_switch = now + self.config.bored_mood_cycle_secs;
        }
    }
}

/// True when a condition that started at `since` has lasted `secs` by `now`.
fn held_for(since: Option<f64>, now: f64, secs: f64) -> bool {
    since.map_or(false, |start| now - start >= secs)
}
