//! Timed, cancellable replay of a timeline

use crate::cancel::{CancelToken, WaitOutcome, WaitPolicy};
use crate::injector::{InjectError, InputInjector};
use remacro_core::{EventKind, MacroEvent};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_SPEED: f64 = 1.3;
pub const DEFAULT_LOOP_COUNT: u32 = 1;

/// Speed multiplier and repeat count, already sanitised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    speed: f64,
    loops: u32,
}

impl PlaybackParams {
    /// Non-positive (or non-finite) speed becomes 1.0; non-positive loop
    /// counts become 1.
    pub fn new(speed: f64, loops: i64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        let loops = if loops > 0 {
            u32::try_from(loops).unwrap_or(u32::MAX)
        } else {
            1
        };
        Self { speed, loops }
    }

    /// From user-entered text; anything unparseable falls back like an
    /// out-of-range value does.
    pub fn parse(speed: &str, loops: &str) -> Self {
        Self::new(
            speed.trim().parse().unwrap_or(1.0),
            loops.trim().parse().unwrap_or(1),
        )
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// How long to wait before `event` at this speed
    pub fn scaled_wait(&self, event: &MacroEvent) -> Duration {
        let delay = event.delay_before();
        if delay <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(delay / self.speed).unwrap_or(Duration::MAX)
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            loops: DEFAULT_LOOP_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    /// Actions handed to the injector successfully
    pub actions: usize,
    /// Key events whose key could not be resolved
    pub skipped: usize,
    /// Actions the injector rejected for other reasons
    pub failed: usize,
    pub loops_completed: u32,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Replays events against an injector
#[derive(Debug, Clone, Default)]
pub struct Player {
    params: PlaybackParams,
    wait: WaitPolicy,
}

impl Player {
    pub fn new(params: PlaybackParams) -> Self {
        Self {
            params,
            wait: WaitPolicy::default(),
        }
    }

    pub fn wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn params(&self) -> PlaybackParams {
        self.params
    }

    /// Play `events` start to finish, `loops` times.
    ///
    /// The token is checked before each event's wait, between wait chunks
    /// and again right before the action, and a cancel at any of those
    /// points ends the whole run, including remaining loops.
    pub fn play(
        &self,
        events: &[MacroEvent],
        injector: &mut dyn InputInjector,
        cancel: &CancelToken,
    ) -> PlaybackReport {
        let started = Instant::now();
        let mut report = PlaybackReport::default();

        'outer: for pass in 0..self.params.loops {
            debug!(pass = pass + 1, of = self.params.loops, "playback pass");
            for event in events {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'outer;
                }
                let wait = self.params.scaled_wait(event);
                if self.wait.wait(wait, cancel) == WaitOutcome::Cancelled || cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'outer;
                }

                match execute(injector, event) {
                    Ok(()) => {
                        debug!(%event, "injected");
                        report.actions += 1;
                    }
                    Err(InjectError::UnresolvedKey(key)) => {
                        warn!(key = %key, "skipping key with no injectable mapping");
                        report.skipped += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, %event, "injection failed");
                        report.failed += 1;
                    }
                }
            }
            report.loops_completed += 1;
        }

        report.elapsed = started.elapsed();
        report
    }
}

fn execute(injector: &mut dyn InputInjector, event: &MacroEvent) -> Result<(), InjectError> {
    match &event.kind {
        EventKind::PointerClick { x, y } => injector.click(*x, *y),
        EventKind::KeyDown { key } => injector.key_down(key),
        EventKind::KeyUp { key } => injector.key_up(key),
    }
}
