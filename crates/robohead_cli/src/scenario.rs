//! Scripted perception sources
//!
//! Stand in for the camera + detector pair when no hardware is attached.
//! Each scenario is a deterministic function of elapsed time; sensor noise is
//! drawn from the injected generator.

use crate::runtime::Clock;
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robohead_core::{BoundingBox, Perception, PerceptionFrame};

const FACE_SIZE: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Lit room; a visitor drops by for a little over a minute every 90s
    Day,
    /// Dark, empty room
    Night,
    /// Lit room with someone in front of the eyes the whole time
    Visitor,
}

/// What the camera would see at a given moment, before noise.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub brightness: f32,
    pub subject: Option<BoundingBox>,
}

impl Scenario {
    pub fn scene_at(self, t: f64, width: u32, height: u32) -> Scene {
        match self {
            Scenario::Day => {
                let phase = t % 90.0;
                let present = (10.0..75.0).contains(&phase);
                Scene {
                    brightness: 170.0,
                    subject: present.then(|| wandering_face(t, 0.4, width, height)),
                }
            }
            Scenario::Night => Scene {
                brightness: 4.0,
                subject: None,
            },
            Scenario::Visitor => Scene {
                brightness: 150.0,
                subject: Some(wandering_face(t, 0.9, width, height)),
            },
        }
    }
}

/// A face-sized box drifting around the frame on two slow sinusoids.
fn wandering_face(t: f64, speed: f64, width: u32, height: u32) -> BoundingBox {
    let (w, h) = (width as f32, height as f32);
    let cx = w / 2.0 + (w / 3.0) * (t * speed).sin() as f32;
    let cy = h / 2.0 + (h / 5.0) * (t * speed * 0.6).cos() as f32;
    BoundingBox::new(
        cx - FACE_SIZE / 2.0,
        cy - FACE_SIZE / 2.0,
        FACE_SIZE,
        FACE_SIZE,
    )
}

/// [`Perception`] source playing back a [`Scenario`].
pub struct ScriptedCamera<R: Rng = StdRng> {
    scenario: Scenario,
    clock: Clock,
    rng: R,
    width: u32,
    height: u32,
}

impl ScriptedCamera<StdRng> {
    pub fn new(scenario: Scenario, clock: Clock, width: u32, height: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(scenario, clock, width, height, rng)
    }
}

impl<R: Rng> ScriptedCamera<R> {
    pub fn with_rng(scenario: Scenario, clock: Clock, width: u32, height: u32, rng: R) -> Self {
        Self {
            scenario,
            clock,
            rng,
            width,
            height,
        }
    }
}

impl<R: Rng + Send> Perception for ScriptedCamera<R> {
    fn capture(&mut self) -> anyhow::Result<PerceptionFrame> {
        let scene = self
            .scenario
            .scene_at(self.clock.now(), self.width, self.height);
        let noise: f32 = self.rng.gen_range(-3.0..=3.0);
        Ok(PerceptionFrame {
            brightness: (scene.brightness + noise).clamp(0.0, 255.0),
            detections: scene.subject.into_iter().collect(),
            frame_width: self.width,
            frame_height: self.height,
        })
    }
}
