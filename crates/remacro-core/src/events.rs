//! Macro events - one captured action plus the wait before it

use crate::keys::KeySymbol;
use std::fmt;

/// What a macro event does when replayed
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Primary-button click at absolute screen coordinates
    PointerClick { x: i32, y: i32 },
    KeyDown { key: KeySymbol },
    KeyUp { key: KeySymbol },
}

/// One captured action.
///
/// `delay_before` is seconds since the previous event (or since recording
/// started, for the first one). It is never negative: every constructor and
/// mutator clamps at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroEvent {
    pub kind: EventKind,
    delay_before: f64,
}

impl MacroEvent {
    pub fn new(kind: EventKind, delay_before: f64) -> Self {
        Self {
            kind,
            delay_before: clamp_delay(delay_before),
        }
    }

    pub fn click(x: i32, y: i32, delay_before: f64) -> Self {
        Self::new(EventKind::PointerClick { x, y }, delay_before)
    }

    pub fn key_down(key: impl Into<KeySymbol>, delay_before: f64) -> Self {
        Self::new(EventKind::KeyDown { key: key.into() }, delay_before)
    }

    pub fn key_up(key: impl Into<KeySymbol>, delay_before: f64) -> Self {
        Self::new(EventKind::KeyUp { key: key.into() }, delay_before)
    }

    pub fn delay_before(&self) -> f64 {
        self.delay_before
    }

    pub fn set_delay_before(&mut self, delay: f64) {
        self.delay_before = clamp_delay(delay);
    }

    /// Shift the delay by `delta` seconds, never going below zero
    pub fn add_delay(&mut self, delta: f64) {
        self.set_delay_before(self.delay_before + delta);
    }

    pub fn key(&self) -> Option<&KeySymbol> {
        match &self.kind {
            EventKind::KeyDown { key } | EventKind::KeyUp { key } => Some(key),
            EventKind::PointerClick { .. } => None,
        }
    }
}

/// NaN counts as negative here.
fn clamp_delay(delay: f64) -> f64 {
    if delay > 0.0 {
        delay
    } else {
        0.0
    }
}

impl fmt::Display for MacroEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::PointerClick { x, y } => write!(f, "Left click at ({}, {})", x, y)?,
            EventKind::KeyDown { key } => write!(f, "Key down {}", key)?,
            EventKind::KeyUp { key } => write!(f, "Key up {}", key)?,
        }
        write!(f, "  delay={:.3}s", self.delay_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SpecialKey;

    #[test]
    fn constructors_clamp_negative_delays() {
        assert_eq!(MacroEvent::click(1, 2, -0.5).delay_before(), 0.0);
        assert_eq!(MacroEvent::key_down('a', f64::NAN).delay_before(), 0.0);
        assert_eq!(MacroEvent::key_up('a', 0.25).delay_before(), 0.25);
    }

    #[test]
    fn add_delay_clamps_at_zero() {
        let mut ev = MacroEvent::click(0, 0, 0.05);
        ev.add_delay(-1000.0);
        assert_eq!(ev.delay_before(), 0.0);
        ev.add_delay(1.5);
        assert_eq!(ev.delay_before(), 1.5);
    }

    #[test]
    fn display_is_one_line() {
        assert_eq!(
            MacroEvent::click(10, 20, 0.1234).to_string(),
            "Left click at (10, 20)  delay=0.123s"
        );
        assert_eq!(
            MacroEvent::key_down(SpecialKey::Enter, 0.0).to_string(),
            "Key down enter  delay=0.000s"
        );
    }
}
