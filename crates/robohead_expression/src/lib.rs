//! # Robohead Expression
//!
//! The fast half of the face: every render frame the [`EyeAnimator`] turns
//! `(dt, gaze target)` into a left/right [`EyeState`](robohead_core::EyeState)
//! pair. It knows nothing about moods; those are layered on by the renderer.

mod animator;

pub use animator::{blink_closure, BlinkPhase, EyeAnimator, GazeMode};
