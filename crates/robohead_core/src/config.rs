use crate::error::{in_range, interval, non_negative, positive, ConfigError};
use crate::mood::{Mood, MoodCatalog};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoboheadConfig {
    pub display: DisplayConfig,
    pub environment: EnvironmentConfig,
    pub tracking: TrackingConfig,
    pub animation: AnimationConfig,
    pub mood_engine: MoodEngineConfig,
    pub logging: LoggingConfig,
    pub sink: SinkConfig,
}

impl RoboheadConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied and the result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: RoboheadConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        config.validate().with_context(|| "Invalid configuration")?;
        Ok(config)
    }

    /// Defaults plus env var overrides, validated. For runs without a config file.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| "Invalid environment overrides")?;
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return defaults
    /// with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                if let Err(e) = cfg.validate() {
                    tracing::warn!("Environment overrides rejected ({}), using plain defaults", e);
                    cfg = Self::default();
                }
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ROBOHEAD_FPS_TARGET") {
            if let Ok(n) = v.parse() {
                self.display.fps_target = n;
            }
        }
        if let Ok(v) = std::env::var("ROBOHEAD_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("ROBOHEAD_MANUAL_PAUSE_SECS") {
            if let Ok(n) = v.parse() {
                self.mood_engine.manual_pause_secs = n;
            }
        }
        if let Ok(v) = std::env::var("ROBOHEAD_BRIGHTNESS_TAU") {
            if let Ok(n) = v.parse() {
                self.environment.brightness_tau = n;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.display.validate()?;
        self.environment.validate()?;
        self.tracking.validate()?;
        self.animation.validate()?;
        self.mood_engine.validate()?;
        self.sink.catalog()?;
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fps_target: u32,
    /// Interval between mood engine ticks (~2 Hz)
    pub mood_tick_secs: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps_target: 30,
            mood_tick_secs: 0.5,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("display.fps_target", self.fps_target as f64, 1.0, 240.0)?;
        positive("display.mood_tick_secs", self.mood_tick_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Time constant of the brightness low-pass filter
    pub brightness_tau: f64,
    /// Starting brightness guess before the first frame arrives
    pub initial_brightness: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            brightness_tau: 1.0,
            initial_brightness: 50.0,
        }
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("environment.brightness_tau", self.brightness_tau)?;
        in_range(
            "environment.initial_brightness",
            self.initial_brightness as f64,
            0.0,
            255.0,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Exponential smoothing factor applied to the gaze target
    pub smoothing: f32,
    /// Seconds without a detection before the target is dropped
    pub lost_timeout: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            frame_width: 160,
            frame_height: 120,
            smoothing: 0.3,
            lost_timeout: 0.5,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("tracking.smoothing", self.smoothing as f64, 0.0, 1.0)?;
        non_negative("tracking.lost_timeout", self.lost_timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub blink_interval_min: f64,
    pub blink_interval_max: f64,
    pub blink_duration: f64,
    pub pursuit_smoothing: f32,
    pub idle_interval_min: f64,
    pub idle_interval_max: f64,
    pub idle_range_x: f32,
    pub idle_range_y: f32,
    /// How long the target may be missing before tracking gives way to idle
    pub tracking_debounce_secs: f64,
    /// Convergence offset added to the left pupil and subtracted from the right
    pub vergence: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            blink_interval_min: 2.0,
            blink_interval_max: 6.0,
            blink_duration: 0.2,
            pursuit_smoothing: 0.15,
            idle_interval_min: 1.5,
            idle_interval_max: 4.0,
            idle_range_x: 0.6,
            idle_range_y: 0.3,
            tracking_debounce_secs: 0.3,
            vergence: 0.03,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        interval(
            "animation.blink_interval",
            self.blink_interval_min,
            self.blink_interval_max,
        )?;
        positive("animation.blink_duration", self.blink_duration)?;
        in_range(
            "animation.pursuit_smoothing",
            self.pursuit_smoothing as f64,
            0.0,
            1.0,
        )?;
        interval(
            "animation.idle_interval",
            self.idle_interval_min,
            self.idle_interval_max,
        )?;
        in_range("animation.idle_range_x", self.idle_range_x as f64, 0.0, 1.0)?;
        in_range("animation.idle_range_y", self.idle_range_y as f64, 0.0, 1.0)?;
        non_negative("animation.tracking_debounce_secs", self.tracking_debounce_secs)?;
        in_range("animation.vergence", self.vergence as f64, 0.0, 0.5)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoodEngineConfig {
    /// Below this smoothed brightness the room counts as dark
    pub sleep_brightness: f32,
    /// At or above this smoothed brightness the room counts as lit
    pub wake_brightness: f32,
    pub dark_to_sleep_secs: f64,
    pub bright_to_wake_secs: f64,
    pub waking_duration: f64,
    pub idle_to_bored_secs: f64,
    pub engaged_to_bonded_secs: f64,
    pub face_lost_to_idle_secs: f64,
    pub bored_mood_cycle_secs: f64,
    pub personality_interval_min: f64,
    pub personality_interval_max: f64,
    pub bonded_affection_interval_min: f64,
    pub bonded_affection_interval_max: f64,
    pub manual_pause_secs: f64,
    /// Motion level (0-1) that triggers a surprised flash while idle
    pub motion_surprise_threshold: f32,
    /// How long greeting/farewell transients (happy, excited, sad) last
    pub greeting_flash_secs: f64,
    pub surprise_flash_secs: f64,
    /// Randomized duration range of personality and affection flashes
    pub flash_min_secs: f64,
    pub flash_max_secs: f64,
}

impl Default for MoodEngineConfig {
    fn default() -> Self {
        Self {
            sleep_brightness: 15.0,
            wake_brightness: 40.0,
            dark_to_sleep_secs: 30.0,
            bright_to_wake_secs: 5.0,
            waking_duration: 3.0,
            idle_to_bored_secs: 120.0,
            engaged_to_bonded_secs: 60.0,
            face_lost_to_idle_secs: 5.0,
            bored_mood_cycle_secs: 8.0,
            personality_interval_min: 15.0,
            personality_interval_max: 40.0,
            bonded_affection_interval_min: 10.0,
            bonded_affection_interval_max: 20.0,
            manual_pause_secs: 60.0,
            motion_surprise_threshold: 0.3,
            greeting_flash_secs: 3.0,
            surprise_flash_secs: 2.0,
            flash_min_secs: 2.0,
            flash_max_secs: 4.0,
        }
    }
}

impl MoodEngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range(
            "mood_engine.sleep_brightness",
            self.sleep_brightness as f64,
            0.0,
            255.0,
        )?;
        in_range(
            "mood_engine.wake_brightness",
            self.wake_brightness as f64,
            0.0,
            255.0,
        )?;
        if self.sleep_brightness > self.wake_brightness {
            return Err(ConfigError::InvertedInterval {
                field: "mood_engine.sleep_brightness/wake_brightness",
                min: self.sleep_brightness as f64,
                max: self.wake_brightness as f64,
            });
        }
        for (field, value) in [
            ("mood_engine.dark_to_sleep_secs", self.dark_to_sleep_secs),
            ("mood_engine.bright_to_wake_secs", self.bright_to_wake_secs),
            ("mood_engine.waking_duration", self.waking_duration),
            ("mood_engine.idle_to_bored_secs", self.idle_to_bored_secs),
            ("mood_engine.engaged_to_bonded_secs", self.engaged_to_bonded_secs),
            ("mood_engine.face_lost_to_idle_secs", self.face_lost_to_idle_secs),
            ("mood_engine.manual_pause_secs", self.manual_pause_secs),
            ("mood_engine.greeting_flash_secs", self.greeting_flash_secs),
            ("mood_engine.surprise_flash_secs", self.surprise_flash_secs),
        ] {
            non_negative(field, value)?;
        }
        positive("mood_engine.bored_mood_cycle_secs", self.bored_mood_cycle_secs)?;
        interval(
            "mood_engine.personality_interval",
            self.personality_interval_min,
            self.personality_interval_max,
        )?;
        interval(
            "mood_engine.bonded_affection_interval",
            self.bonded_affection_interval_min,
            self.bonded_affection_interval_max,
        )?;
        interval("mood_engine.flash", self.flash_min_secs, self.flash_max_secs)?;
        in_range(
            "mood_engine.motion_surprise_threshold",
            self.motion_surprise_threshold as f64,
            0.0,
            1.0,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Mood ids the active eye style can display
    pub moods: Vec<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            moods: Mood::ALL.iter().map(|m| m.as_str().to_string()).collect(),
        }
    }
}

impl SinkConfig {
    pub fn catalog(&self) -> Result<MoodCatalog, ConfigError> {
        MoodCatalog::from_ids(&self.moods)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RoboheadConfig::default();
        assert_eq!(cfg.display.fps_target, 30);
        assert_eq!(cfg.tracking.lost_timeout, 0.5);
        assert_eq!(cfg.sink.moods.len(), Mood::ALL.len());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[mood_engine]
idle_to_bored_secs = 30.0
"#;
        let cfg: RoboheadConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.mood_engine.idle_to_bored_secs, 30.0);
        // Defaults for unspecified fields
        assert_eq!(cfg.mood_engine.dark_to_sleep_secs, 30.0);
        assert_eq!(cfg.animation.blink_duration, 0.2);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[display]
fps_target = 24
mood_tick_secs = 0.25

[environment]
brightness_tau = 2.0
initial_brightness = 10.0

[tracking]
frame_width = 320
frame_height = 240
smoothing = 0.5
lost_timeout = 1.0

[animation]
blink_interval_min = 1.0
blink_interval_max = 3.0
vergence = 0.05

[mood_engine]
sleep_brightness = 10.0
wake_brightness = 60.0
bored_mood_cycle_secs = 4.0

[logging]
level = "debug"

[sink]
moods = ["neutral", "happy", "sad"]
"#;
        let cfg: RoboheadConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.display.fps_target, 24);
        assert_eq!(cfg.environment.brightness_tau, 2.0);
        assert_eq!(cfg.tracking.frame_width, 320);
        assert_eq!(cfg.animation.vergence, 0.05);
        assert_eq!(cfg.mood_engine.wake_brightness, 60.0);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.sink.catalog().unwrap().len(), 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let mut cfg = RoboheadConfig::default();
        cfg.animation.blink_interval_min = 8.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedInterval { .. })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut cfg = MoodEngineConfig::default();
        cfg.waking_duration = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NegativeDuration { .. })
        ));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut cfg = MoodEngineConfig::default();
        cfg.motion_surprise_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut cfg = TrackingConfig::default();
        cfg.smoothing = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_sleep_above_wake_rejected() {
        let mut cfg = MoodEngineConfig::default();
        cfg.sleep_brightness = 80.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unknown_sink_mood_rejected() {
        let mut cfg = RoboheadConfig::default();
        cfg.sink.moods.push("grumpy".to_string());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UnknownMood("grumpy".to_string()))
        );
    }

    #[test]
    fn test_infinite_duration_rejected() {
        let cfg: RoboheadConfig = toml::from_str("[display]\nmood_tick_secs = inf\n").unwrap();
        assert!(cfg.display.mood_tick_secs.is_infinite());
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotFinite {
                field: "display.mood_tick_secs",
                ..
            })
        ));

        let mut cfg = MoodEngineConfig::default();
        cfg.manual_pause_secs = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!(
            "robohead_invalid_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[animation]\nblink_interval_min = 9.0\nblink_interval_max = 1.0\n",
        )
        .unwrap();
        let result = RoboheadConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("animation.blink_interval"));
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("ROBOHEAD_FPS_TARGET", "15");
        std::env::set_var("ROBOHEAD_MANUAL_PAUSE_SECS", "5.5");

        let mut cfg = RoboheadConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.display.fps_target, 15);
        assert_eq!(cfg.mood_engine.manual_pause_secs, 5.5);

        // Clean up env vars before testing defaults
        std::env::remove_var("ROBOHEAD_FPS_TARGET");
        std::env::remove_var("ROBOHEAD_MANUAL_PAUSE_SECS");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = RoboheadConfig::load_or_default("/nonexistent/robohead.toml");
        assert_eq!(cfg.display.fps_target, 30);

        // Part 3: a bad override is an error, not a silent fallback
        std::env::set_var("ROBOHEAD_MANUAL_PAUSE_SECS", "-3");
        let result = RoboheadConfig::from_env();
        std::env::remove_var("ROBOHEAD_MANUAL_PAUSE_SECS");
        assert!(result.is_err());
        assert!(RoboheadConfig::from_env().is_ok());
    }
}
