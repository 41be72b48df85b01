//! # Robohead Limbic System
//!
//! Low-frequency mood regulation. The render loop ticks the [`MoodEngine`] at
//! roughly 2 Hz with an environment snapshot; the engine walks a
//! sleep/wake and social-engagement arc and asks a [`MoodSink`] for the
//! matching expression.
//!
//! ## States
//!
//! ```text
//! SLEEPING -(bright / face)-> WAKING -(waking_duration)-> IDLE
//!                                                          |
//!          face appears --> ENGAGED -(long face)-> BONDED  |
//!                            ^    |                  |     |
//!                            |    +-(face gone)------+-> IDLE (sad)
//!                            |                             |
//!          face appears --- BORED <-(long idle, no face)---+
//!
//! dark for dark_to_sleep_secs -> SLEEPING, from anywhere
//! ```
//!
//! ## Time Scales
//!
//! - Render cadence (~30 Hz): eye animation, handled elsewhere
//! - Mood cadence (~2 Hz): this crate, see [`MoodCadence`]

mod cadence;
mod mood_engine;
mod sink;

pub use cadence::{CadenceConfig, MoodCadence};
pub use mood_engine::{MoodEngine, MoodEngineStatus, MoodState};
pub use robohead_core::MoodSink;
pub use sink::CatalogSink;
