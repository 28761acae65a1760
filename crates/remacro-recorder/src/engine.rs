//! The engine - state machine and control surface
//!
//! One [`Engine`] owns the timeline, the `Idle`/`Recording`/`Playing` state
//! and the cancel token. Every request goes through it and comes back as a
//! `remacro_core::Result`, so callers never see a panic or an unhandled
//! error. Clones are handles to the same engine.
//!
//! Playback runs on its own thread with a snapshot of the timeline; the
//! calling thread stays free to service [`Engine::request_cancel`].

use crate::cancel::{CancelToken, WaitPolicy};
use crate::capture::{route, CaptureSession, ControlSignal, Hotkeys, Notification, Route};
use crate::injector::InputInjector;
use crate::playback::{PlaybackParams, PlaybackReport, Player};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use remacro_core::storage::{self, MacroDocument};
use remacro_core::{parse_delay, Error, MacroEvent, Result, Timeline};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Recording,
    Playing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineState::Idle => "idle",
            EngineState::Recording => "recording",
            EngineState::Playing => "playing",
        })
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub wait: WaitPolicy,
    pub hotkeys: Hotkeys,
    /// Playback parameters used when play is triggered by hotkey
    pub playback: PlaybackParams,
    /// Capacity of the notification channel; extra notifications are dropped
    pub notify_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            hotkeys: Hotkeys::default(),
            playback: PlaybackParams::default(),
            notify_buffer: 1024,
        }
    }
}

/// Things observers may want to show
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChanged(EngineState),
    EventCaptured { index: usize, event: MacroEvent },
    CancelRequested,
    PlaybackFinished(PlaybackReport),
}

struct Inner {
    config: EngineConfig,
    state: Mutex<EngineState>,
    capture: Mutex<CaptureSession>,
    timeline: Mutex<Timeline>,
    playback: Mutex<PlaybackParams>,
    cancel: CancelToken,
    injector: Arc<Mutex<Box<dyn InputInjector>>>,
    player: Mutex<Option<thread::JoinHandle<PlaybackReport>>>,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub fn new(injector: Box<dyn InputInjector>) -> Self {
        Self::with_config(EngineConfig::default(), injector)
    }

    pub fn with_config(config: EngineConfig, injector: Box<dyn InputInjector>) -> Self {
        let (events_tx, events_rx) = bounded(config.notify_buffer.max(1));
        Self {
            inner: Arc::new(Inner {
                capture: Mutex::new(CaptureSession::new(config.hotkeys.clone())),
                playback: Mutex::new(config.playback),
                config,
                state: Mutex::new(EngineState::Idle),
                timeline: Mutex::new(Timeline::new()),
                cancel: CancelToken::new(),
                injector: Arc::new(Mutex::new(injector)),
                player: Mutex::new(None),
                events_tx,
                events_rx,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn state(&self) -> EngineState {
        *self.inner.state.lock()
    }

    /// Snapshot of the current timeline
    pub fn timeline(&self) -> Timeline {
        self.inner.timeline.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.timeline.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observer notifications. Delivery is best effort: when nobody drains
    /// the channel and it fills up, new notifications are dropped.
    pub fn notifications(&self) -> &Receiver<EngineEvent> {
        &self.inner.events_rx
    }

    fn notify(&self, event: EngineEvent) {
        let _ = self.inner.events_tx.try_send(event);
    }

    fn set_state(&self, state: &mut EngineState, next: EngineState) {
        if *state != next {
            info!(from = %state, to = %next, "engine state");
            *state = next;
            self.notify(EngineEvent::StateChanged(next));
        }
    }

    // Recording

    /// Start a new recording, discarding the current timeline.
    pub fn start_recording(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if *state != EngineState::Idle {
            return Err(Error::busy("start recording", *state));
        }
        self.inner.capture.lock().reset();
        self.inner.timeline.lock().clear();
        self.set_state(&mut state, EngineState::Recording);
        Ok(())
    }

    /// Stop recording. The last captured event is dropped on the assumption
    /// that it is the click or key press that triggered the stop. This is a
    /// heuristic: a genuine final action captured just before a hotkey stop
    /// is lost too. Returns the dropped event, if any. Stopping while idle
    /// does nothing.
    pub fn stop_recording(&self) -> Result<Option<MacroEvent>> {
        let mut state = self.inner.state.lock();
        match *state {
            EngineState::Idle => Ok(None),
            EngineState::Playing => Err(Error::busy("stop recording", *state)),
            EngineState::Recording => Ok(self.stop_recording_locked(&mut state)),
        }
    }

    fn stop_recording_locked(&self, state: &mut EngineState) -> Option<MacroEvent> {
        let dropped = self.inner.timeline.lock().pop();
        if let Some(ev) = &dropped {
            debug!(event = %ev, "dropped trailing event");
        }
        self.set_state(state, EngineState::Idle);
        dropped
    }

    pub fn toggle_recording(&self) -> Result<()> {
        match self.state() {
            EngineState::Recording => self.stop_recording().map(|_| ()),
            _ => self.start_recording(),
        }
    }

    /// Append the event for `n` if recording. Anything that doesn't qualify
    /// is dropped quietly; capture never fails.
    pub fn record(&self, n: &Notification) -> Option<usize> {
        let state = self.inner.state.lock();
        if *state != EngineState::Recording {
            return None;
        }
        let event = self.inner.capture.lock().capture(n)?;
        let index = self.inner.timeline.lock().push(event.clone());
        drop(state);

        debug!(index, %event, "captured");
        self.notify(EngineEvent::EventCaptured { index, event });
        Some(index)
    }

    /// Route one listener notification: hotkeys run their control request,
    /// everything else goes to capture. Errors from control requests are
    /// returned for display; they never disturb a recording.
    pub fn handle(&self, n: &Notification) -> Result<()> {
        match route(&self.inner.config.hotkeys, &n.input) {
            Route::Control(signal) => self.signal(signal),
            Route::Capture => {
                self.record(n);
                Ok(())
            }
            Route::Ignore => Ok(()),
        }
    }

    pub fn signal(&self, signal: ControlSignal) -> Result<()> {
        debug!(?signal, "control signal");
        match signal {
            ControlSignal::ToggleRecording => self.toggle_recording(),
            ControlSignal::Play => self.play_with(self.playback_params()),
            ControlSignal::Cancel => self.request_cancel(),
        }
    }

    // Playback

    pub fn playback_params(&self) -> PlaybackParams {
        *self.inner.playback.lock()
    }

    /// Parameters used by hotkey-triggered playback
    pub fn set_playback_params(&self, params: PlaybackParams) {
        *self.inner.playback.lock() = params;
    }

    /// Play the timeline `loop_count` times at `speed`. Out-of-range values
    /// fall back to 1.0 and 1. Returns once the playback thread is started.
    pub fn play(&self, speed: f64, loop_count: i64) -> Result<()> {
        self.play_with(PlaybackParams::new(speed, loop_count))
    }

    pub fn play_with(&self, params: PlaybackParams) -> Result<()> {
        let mut state = self.inner.state.lock();
        if *state != EngineState::Idle {
            return Err(Error::busy("play", *state));
        }
        let events = self.inner.timeline.lock().events().to_vec();
        if events.is_empty() {
            return Err(Error::empty_timeline());
        }

        // A finished run may still be returning from its thread.
        if let Some(previous) = self.inner.player.lock().take() {
            let _ = previous.join();
        }

        self.inner.cancel.reset();
        self.set_state(&mut state, EngineState::Playing);
        drop(state);

        info!(
            events = events.len(),
            speed = params.speed(),
            loops = params.loops(),
            "playback started"
        );
        let player = Player::new(params).wait_policy(self.inner.config.wait);
        let engine = self.clone();
        let handle = thread::Builder::new()
            .name("remacro-playback".into())
            .spawn(move || engine.run_playback(player, events))
            .map_err(|e| {
                let mut state = self.inner.state.lock();
                self.set_state(&mut state, EngineState::Idle);
                Error::from(e)
            })?;
        *self.inner.player.lock() = Some(handle);
        Ok(())
    }

    fn run_playback(&self, player: Player, events: Vec<MacroEvent>) -> PlaybackReport {
        let back_to_idle = IdleOnExit(self);
        let report = {
            let mut injector = self.inner.injector.lock();
            player.play(&events, &mut **injector, &self.inner.cancel)
        };

        if report.cancelled {
            info!(actions = report.actions, "playback cancelled");
        } else {
            info!(
                actions = report.actions,
                skipped = report.skipped,
                failed = report.failed,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "playback finished"
            );
        }

        drop(back_to_idle);
        self.notify(EngineEvent::PlaybackFinished(report.clone()));
        report
    }

    /// Block until the current (or last) playback thread ends.
    pub fn wait_for_playback(&self) -> Option<PlaybackReport> {
        let handle = self.inner.player.lock().take()?;
        handle.join().ok()
    }

    /// Cancel playback (takes effect within one wait chunk) or stop a
    /// recording. Does nothing while idle.
    pub fn request_cancel(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        match *state {
            EngineState::Playing => {
                info!("cancel requested");
                self.inner.cancel.cancel();
                drop(state);
                self.notify(EngineEvent::CancelRequested);
            }
            EngineState::Recording => {
                self.stop_recording_locked(&mut state);
            }
            EngineState::Idle => {}
        }
        Ok(())
    }

    // Editing

    fn edit<T>(&self, operation: &str, f: impl FnOnce(&mut Timeline) -> Result<T>) -> Result<T> {
        let state = self.inner.state.lock();
        if *state != EngineState::Idle {
            return Err(Error::busy(operation, *state));
        }
        let mut timeline = self.inner.timeline.lock();
        f(&mut timeline)
    }

    pub fn clear(&self) -> Result<()> {
        self.edit("clear", |t| {
            t.clear();
            Ok(())
        })
    }

    /// Remove events at 0-based `indices`; out-of-range ones are ignored.
    pub fn delete(&self, indices: &[usize]) -> Result<usize> {
        self.edit("delete events", |t| Ok(t.delete(indices)))
    }

    /// Replace one event's delay with user-entered text.
    pub fn update_delay(&self, index: usize, value: &str) -> Result<()> {
        self.edit("edit delays", |t| {
            let delay = parse_delay(value)?;
            t.set_delay(index, delay)
        })
    }

    pub fn add_delay(&self, indices: &[usize], delta: f64) -> Result<usize> {
        self.edit("edit delays", |t| t.add_delay(indices, delta))
    }

    // Files

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = self.inner.state.lock();
        if *state == EngineState::Recording {
            return Err(Error::busy("save", *state));
        }
        let timeline = self.inner.timeline.lock().clone();
        drop(state);

        if timeline.is_empty() {
            return Err(Error::empty_timeline());
        }
        storage::save(path.as_ref(), &timeline)?;
        info!(path = %path.as_ref().display(), events = timeline.len(), "macro saved");
        Ok(())
    }

    /// Replace the timeline from a file. On any error the current timeline
    /// is left as it was.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<MacroDocument> {
        let path = path.as_ref();
        self.edit("load", |t| {
            let doc = storage::load(path)?;
            if doc.skipped > 0 {
                warn!(skipped = doc.skipped, "skipped events of unknown type");
            }
            *t = doc.timeline.clone();
            info!(path = %path.display(), events = t.len(), version = doc.version, "macro loaded");
            Ok(doc)
        })
    }
}

/// Returns the engine to `Idle` when playback ends, including by panic.
struct IdleOnExit<'a>(&'a Engine);

impl Drop for IdleOnExit<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("playback thread panicked");
        }
        let mut state = self.0.inner.state.lock();
        self.0.inner.cancel.reset();
        self.0.set_state(&mut state, EngineState::Idle);
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .field("events", &self.len())
            .finish()
    }
}
