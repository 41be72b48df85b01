//! Property-based tests for the mood engine.
//!
//! Feeds arbitrary environment histories through the engine and checks that
//! it only ever asks for known moods, respects a manual pause and always
//! ends up asleep in a room that stays dark.

use proptest::prelude::*;
use robohead_core::{EnvironmentSnapshot, MoodEngineConfig};
use robohead_limbic::{CatalogSink, MoodEngine, MoodState};

// ============================================================================
// Strategies
// ============================================================================

/// One perception step: (brightness, motion, face present).
fn arb_step() -> impl Strategy<Value = (f32, f32, bool)> {
    (0.0f32..=255.0, 0.0f32..=1.0, any::<bool>())
}

fn arb_history() -> impl Strategy<Value = Vec<(f32, f32, bool)>> {
    prop::collection::vec(arb_step(), 1..400)
}

/// Turn raw steps into snapshots 0.5s apart, tracking face timing the way
/// the aggregator does.
fn snapshots(steps: &[(f32, f32, bool)]) -> Vec<EnvironmentSnapshot> {
    let mut out = Vec::with_capacity(steps.len());
    let mut face = false;
    let mut appeared_at = 0.0;
    let mut lost_at: Option<f64> = None;
    for (i, &(brightness, motion, present)) in steps.iter().enumerate() {
        let now = i as f64 * 0.5;
        if present && !face {
            appeared_at = now;
        } else if !present && face {
            lost_at = Some(now);
        }
        face = present;
        out.push(EnvironmentSnapshot {
            brightness,
            motion_level: motion,
            face_present: present,
            face_continuous_secs: if present { now - appeared_at } else { 0.0 },
            face_lost_ago: lost_at.map_or(f64::INFINITY, |t| now - t),
            timestamp: now,
        });
    }
    out
}

/// Shorter timers so histories of a few hundred ticks visit every state.
fn fast_config() -> MoodEngineConfig {
    MoodEngineConfig {
        dark_to_sleep_secs: 5.0,
        bright_to_wake_secs: 2.0,
        idle_to_bored_secs: 20.0,
        engaged_to_bonded_secs: 10.0,
        personality_interval_min: 3.0,
        personality_interval_max: 8.0,
        bonded_affection_interval_min: 2.0,
        bonded_affection_interval_max: 5.0,
        ..MoodEngineConfig::default()
    }
}

// ============================================================================
// MoodEngine
// ============================================================================

proptest! {
    /// Every request the engine makes is a mood the full catalog knows.
    #[test]
    fn only_known_moods_requested(steps in arb_history(), seed in any::<u64>()) {
        let mut engine = MoodEngine::seeded(fast_config(), CatalogSink::default(), seed).unwrap();
        for snap in snapshots(&steps) {
            engine.tick(0.5, &snap);
        }
        prop_assert_eq!(engine.sink().rejections(), 0);
    }

    /// While paused the engine neither transitions nor touches the sink.
    #[test]
    fn manual_pause_freezes_engine(steps in arb_history(), seed in any::<u64>()) {
        let config = MoodEngineConfig {
            manual_pause_secs: 10_000.0,
            ..fast_config()
        };
        let mut engine = MoodEngine::seeded(config, CatalogSink::default(), seed).unwrap();
        engine.notify_manual_mood(0.0);
        for snap in snapshots(&steps) {
            engine.tick(0.5, &snap);
        }
        prop_assert_eq!(engine.state(), MoodState::Idle);
        prop_assert_eq!(engine.sink().changes(), 0);
        prop_assert!(engine.state_entered().is_none());
    }

    /// A disabled engine behaves like a paused one.
    #[test]
    fn disabled_engine_is_inert(steps in arb_history(), seed in any::<u64>()) {
        let mut engine = MoodEngine::seeded(fast_config(), CatalogSink::default(), seed).unwrap();
        engine.set_enabled(false);
        for snap in snapshots(&steps) {
            engine.tick(0.5, &snap);
        }
        prop_assert_eq!(engine.state(), MoodState::Idle);
        prop_assert_eq!(engine.sink().changes(), 0);
    }

    /// Whatever happened before, a long dark stretch with nobody around
    /// ends in SLEEPING with the sleepy expression.
    #[test]
    fn sustained_darkness_always_sleeps(steps in arb_history(), seed in any::<u64>()) {
        let config = fast_config();
        let dark_ticks = (config.dark_to_sleep_secs / 0.5) as usize + 2;
        let mut engine = MoodEngine::seeded(config, CatalogSink::default(), seed).unwrap();

        let mut all = steps.clone();
        all.extend(std::iter::repeat((0.0, 0.0, false)).take(dark_ticks));
        for snap in snapshots(&all) {
            engine.tick(0.5, &snap);
        }
        prop_assert_eq!(engine.state(), MoodState::Sleeping);
        prop_assert_eq!(engine.sink().active(), robohead_core::Mood::Sleepy);
    }

    /// Override time left never exceeds the configured pause.
    #[test]
    fn override_remaining_bounded(at in 0.0f64..1000.0, later in 0.0f64..1000.0) {
        let config = fast_config();
        let pause = config.manual_pause_secs;
        let mut engine = MoodEngine::seeded(config, CatalogSink::default(), 0).unwrap();
        engine.notify_manual_mood(at);
        let remaining = engine.status(at + later).override_remaining;
        prop_assert!((0.0..=pause).contains(&remaining));
    }
}
