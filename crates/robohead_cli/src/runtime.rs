//! Process wiring: the perception thread and the async render loop.

use anyhow::{anyhow, Result};
use robohead_core::{EyeRenderer, EyeState, GazeTarget, MoodSink, Perception};
use robohead_expression::EyeAnimator;
use robohead_limbic::{CadenceConfig, MoodEngine};
use robohead_perception::{EnvironmentAggregator, GazeTracker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Target capture rate of the perception thread.
const PERCEPTION_INTERVAL: Duration = Duration::from_millis(66);

/// Monotonic seconds since process start, shared by both threads.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Renderer for headless runs: eye states go to the trace log.
#[derive(Debug)]
pub struct TraceRenderer {
    frames: u64,
    /// Emit a debug summary every this many frames
    summary_every: u64,
}

impl TraceRenderer {
    pub fn new(summary_every: u64) -> Self {
        Self {
            frames: 0,
            summary_every: summary_every.max(1),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl EyeRenderer for TraceRenderer {
    fn render(&mut self, left: &EyeState, right: &EyeState) {
        self.frames += 1;
        trace!(
            "frame {}: pupil=({:.2},{:.2}) lid={:.2}/{:.2}",
            self.frames,
            left.pupil_x,
            left.pupil_y,
            left.upper_eyelid,
            right.upper_eyelid
        );
        if self.frames % self.summary_every == 0 {
            debug!(
                "Rendered {} frames (left pupil {:.2},{:.2})",
                self.frames, left.pupil_x, left.pupil_y
            );
        }
    }
}

/// Capture loop on a dedicated OS thread. The gaze target is published
/// through the tracker's watch channel; everything else goes into the
/// aggregator. Exits between cycles once `running` clears.
pub fn spawn_perception<P>(
    mut source: P,
    mut tracker: GazeTracker,
    aggregator: Arc<EnvironmentAggregator>,
    running: Arc<AtomicBool>,
    clock: Clock,
) -> Result<JoinHandle<()>>
where
    P: Perception + 'static,
{
    let handle = std::thread::Builder::new()
        .name("perception".into())
        .spawn(move || {
            info!("Perception thread started");
            let mut frame_count = 0u32;
            let mut fps_timer = clock.now();

            while running.load(Ordering::Relaxed) {
                let started = Instant::now();
                match source.capture() {
                    Ok(frame) => {
                        let now = clock.now();
                        let target = tracker.update_frame(&frame, now);
                        // A live gaze target is what counts as "someone is there"
                        aggregator.update_from_frame(&frame, target.is_some(), now);

                        frame_count += 1;
                        if now - fps_timer >= 1.0 {
                            debug!("Perception at {:.1} fps", frame_count as f64 / (now - fps_timer));
                            frame_count = 0;
                            fps_timer = now;
                        }
                    }
                    Err(e) => warn!("Capture failed: {:#}", e),
                }
                if let Some(rest) = PERCEPTION_INTERVAL.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
            info!("Perception thread stopped");
        })?;
    Ok(handle)
}

/// Everything the render loop owns.
pub struct RenderLoop<S: MoodSink, E: EyeRenderer> {
    pub cadence: CadenceConfig,
    pub animator: EyeAnimator,
    pub engine: MoodEngine<S>,
    pub renderer: E,
    pub aggregator: Arc<EnvironmentAggregator>,
    pub gaze: watch::Receiver<GazeTarget>,
    pub clock: Clock,
}

impl<S: MoodSink, E: EyeRenderer> RenderLoop<S, E> {
    /// Animate and render every frame, tick the mood engine at its sub-rate.
    /// Returns on Ctrl-C or once `duration` has elapsed.
    pub async fn run(&mut self, duration: Option<Duration>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.cadence.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut mood_cadence = self.cadence.mood_cadence();

        let stop = async move {
            match duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(stop);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut last_frame = self.clock.now();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.clock.now();
                    let dt = now - last_frame;
                    last_frame = now;

                    let target = *self.gaze.borrow();
                    let (left, right) = self.animator.update(dt, target);
                    self.renderer.render(&left, &right);

                    if let Some(mood_dt) = mood_cadence.poll(now) {
                        let snapshot = self.aggregator.snapshot(now);
                        self.engine.tick(mood_dt, &snapshot);
                    }
                }
                res = &mut ctrl_c => {
                    res.map_err(|e| anyhow!("Failed to listen for Ctrl-C: {}", e))?;
                    info!("Ctrl-C received, shutting down");
                    break;
                }
                _ = &mut stop => {
                    info!("Run duration reached, shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}
