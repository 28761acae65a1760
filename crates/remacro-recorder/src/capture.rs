//! Turning system-wide input notifications into macro events
//!
//! Platform listeners run on their own threads and only ever send
//! timestamped [`Notification`]s down a channel. The control surface drains
//! that channel and feeds each notification to the engine, which either
//! treats it as a control hotkey or hands it to the [`CaptureSession`].

use crossbeam_channel::{Receiver, Sender};
use remacro_core::{EventKind, KeySymbol, MacroEvent, SpecialKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u8),
}

/// Raw input as reported by a platform listener
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    ButtonPress { button: PointerButton, x: i32, y: i32 },
    ButtonRelease { button: PointerButton, x: i32, y: i32 },
    KeyPress(KeySymbol),
    KeyRelease(KeySymbol),
}

/// Input plus the moment the listener saw it
#[derive(Debug, Clone)]
pub struct Notification {
    pub at: Instant,
    pub input: RawInput,
}

impl Notification {
    pub fn new(at: Instant, input: RawInput) -> Self {
        Self { at, input }
    }

    pub fn now(input: RawInput) -> Self {
        Self::new(Instant::now(), input)
    }
}

/// The three requests that drive the engine from anywhere on the desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    ToggleRecording,
    Play,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotkeys {
    pub toggle_recording: KeySymbol,
    pub play: KeySymbol,
    pub cancel: KeySymbol,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            toggle_recording: KeySymbol::Special(SpecialKey::F(9)),
            play: KeySymbol::Special(SpecialKey::F(10)),
            cancel: KeySymbol::Special(SpecialKey::Esc),
        }
    }
}

impl Hotkeys {
    pub fn signal_for(&self, key: &KeySymbol) -> Option<ControlSignal> {
        if key.matches(&self.toggle_recording) {
            Some(ControlSignal::ToggleRecording)
        } else if key.matches(&self.play) {
            Some(ControlSignal::Play)
        } else if key.matches(&self.cancel) {
            Some(ControlSignal::Cancel)
        } else {
            None
        }
    }

    pub fn is_hotkey(&self, key: &KeySymbol) -> bool {
        self.signal_for(key).is_some()
    }
}

/// Where a notification should go
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Control(ControlSignal),
    Capture,
    /// Release of a hotkey; neither a signal nor macro content
    Ignore,
}

pub fn route(hotkeys: &Hotkeys, input: &RawInput) -> Route {
    match input {
        RawInput::KeyPress(key) => hotkeys
            .signal_for(key)
            .map(Route::Control)
            .unwrap_or(Route::Capture),
        RawInput::KeyRelease(key) if hotkeys.is_hotkey(key) => Route::Ignore,
        _ => Route::Capture,
    }
}

/// Per-recording capture state: the hotkey filter and the time of the last
/// captured event.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    hotkeys: Hotkeys,
    last_event_time: Option<Instant>,
}

impl CaptureSession {
    pub fn new(hotkeys: Hotkeys) -> Self {
        Self {
            hotkeys,
            last_event_time: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_event_time = None;
    }

    /// Build the macro event for `n`, or `None` if it doesn't qualify.
    /// Only primary-button presses and non-hotkey key presses/releases are
    /// captured. The first captured event of a session gets a zero delay.
    pub fn capture(&mut self, n: &Notification) -> Option<MacroEvent> {
        let kind = match &n.input {
            RawInput::ButtonPress {
                button: PointerButton::Primary,
                x,
                y,
            } => EventKind::PointerClick { x: *x, y: *y },
            RawInput::ButtonPress { .. } | RawInput::ButtonRelease { .. } => return None,
            RawInput::KeyPress(key) | RawInput::KeyRelease(key) if self.hotkeys.is_hotkey(key) => {
                return None
            }
            RawInput::KeyPress(key) => EventKind::KeyDown { key: key.clone() },
            RawInput::KeyRelease(key) => EventKind::KeyUp { key: key.clone() },
        };

        let delay = self
            .last_event_time
            .map(|last| n.at.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_event_time = Some(n.at);
        Some(MacroEvent::new(kind, delay))
    }
}

/// Owns the listener threads of a platform back-end
pub struct ListenerHandle {
    stop: Arc<AtomicBool>,
    rx: Receiver<Notification>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn new(
        stop: Arc<AtomicBool>,
        rx: Receiver<Notification>,
        threads: Vec<thread::JoinHandle<()>>,
    ) -> Self {
        Self { stop, rx, threads }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Notification> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    /// Signal the listener threads and wait for those that can exit.
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        for t in self.threads {
            if t.is_finished() {
                let _ = t.join();
            }
        }
    }
}

/// Send without blocking; a full or closed channel drops the notification.
pub(crate) fn deliver(tx: &Sender<Notification>, input: RawInput) {
    let _ = tx.try_send(Notification::now(input));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn press(base: Instant, ms: u64, key: impl Into<KeySymbol>) -> Notification {
        Notification::new(at(base, ms), RawInput::KeyPress(key.into()))
    }

    fn click(base: Instant, ms: u64, button: PointerButton) -> Notification {
        Notification::new(at(base, ms), RawInput::ButtonPress { button, x: 7, y: 8 })
    }

    #[test]
    fn first_event_has_zero_delay_then_deltas() {
        let base = Instant::now();
        let mut session = CaptureSession::new(Hotkeys::default());

        let first = session.capture(&click(base, 500, PointerButton::Primary)).unwrap();
        let second = session.capture(&press(base, 750, 'a')).unwrap();
        let third = session
            .capture(&Notification::new(at(base, 2750), RawInput::KeyRelease('a'.into())))
            .unwrap();

        assert_eq!(first, MacroEvent::click(7, 8, 0.0));
        assert!((second.delay_before() - 0.25).abs() < 1e-9);
        assert_eq!(third.kind, EventKind::KeyUp { key: 'a'.into() });
        assert!((third.delay_before() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn releases_and_other_buttons_are_not_captured() {
        let base = Instant::now();
        let mut session = CaptureSession::new(Hotkeys::default());

        assert!(session.capture(&click(base, 0, PointerButton::Secondary)).is_none());
        assert!(session.capture(&click(base, 0, PointerButton::Middle)).is_none());
        let release = Notification::new(
            base,
            RawInput::ButtonRelease { button: PointerButton::Primary, x: 1, y: 1 },
        );
        assert!(session.capture(&release).is_none());

        // Ignored input does not move the delay origin
        let first = session.capture(&click(base, 900, PointerButton::Primary)).unwrap();
        assert_eq!(first.delay_before(), 0.0);
    }

    #[test]
    fn hotkeys_are_never_captured() {
        let base = Instant::now();
        let mut session = CaptureSession::new(Hotkeys::default());
        for key in [SpecialKey::F(9), SpecialKey::F(10), SpecialKey::Esc] {
            assert!(session.capture(&press(base, 0, key)).is_none());
            let release = Notification::new(base, RawInput::KeyRelease(key.into()));
            assert!(session.capture(&release).is_none());
        }
        assert!(session.capture(&press(base, 0, SpecialKey::F(8))).is_some());
    }

    #[test]
    fn reset_starts_a_new_delay_origin() {
        let base = Instant::now();
        let mut session = CaptureSession::new(Hotkeys::default());
        session.capture(&press(base, 0, 'x'));
        session.reset();
        assert_eq!(session.capture(&press(base, 5000, 'y')).unwrap().delay_before(), 0.0);
    }

    #[test]
    fn routing_splits_hotkeys_from_content() {
        let hk = Hotkeys::default();
        assert_eq!(
            route(&hk, &RawInput::KeyPress(SpecialKey::F(9).into())),
            Route::Control(ControlSignal::ToggleRecording)
        );
        assert_eq!(
            route(&hk, &RawInput::KeyPress(SpecialKey::F(10).into())),
            Route::Control(ControlSignal::Play)
        );
        assert_eq!(
            route(&hk, &RawInput::KeyPress(SpecialKey::Esc.into())),
            Route::Control(ControlSignal::Cancel)
        );
        assert_eq!(route(&hk, &RawInput::KeyRelease(SpecialKey::Esc.into())), Route::Ignore);
        assert_eq!(route(&hk, &RawInput::KeyPress('q'.into())), Route::Capture);
    }
}
