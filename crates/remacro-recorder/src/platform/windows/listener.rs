//! rdev listener
//!
//! rdev reports button presses without a position, so the last pointer
//! move is tracked and attached to each press.

use super::keymap;
use crate::capture::{deliver, ListenerHandle, Notification, PointerButton, RawInput};
use crossbeam_channel::bounded;
use rdev::{Button, EventType};
use remacro_core::Result;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

pub fn listen(buffer: usize) -> Result<ListenerHandle> {
    let (tx, rx) = bounded::<Notification>(buffer.max(1));
    let stop = Arc::new(AtomicBool::new(false));

    let stop1 = stop.clone();
    let thread = thread::Builder::new()
        .name("remacro-rdev".into())
        .spawn(move || {
            let x = AtomicI32::new(0);
            let y = AtomicI32::new(0);
            debug!("rdev listener running");

            // rdev::listen never returns while the hook is alive; after
            // `stop` the callback just drops everything.
            let result = rdev::listen(move |event| {
                if stop1.load(Ordering::Relaxed) {
                    return;
                }
                let pos = || (x.load(Ordering::Relaxed), y.load(Ordering::Relaxed));
                let input = match event.event_type {
                    EventType::MouseMove { x: mx, y: my } => {
                        x.store(mx as i32, Ordering::Relaxed);
                        y.store(my as i32, Ordering::Relaxed);
                        None
                    }
                    EventType::ButtonPress(b) => {
                        let (x, y) = pos();
                        Some(RawInput::ButtonPress { button: button(b), x, y })
                    }
                    EventType::ButtonRelease(b) => {
                        let (x, y) = pos();
                        Some(RawInput::ButtonRelease { button: button(b), x, y })
                    }
                    EventType::KeyPress(k) => Some(RawInput::KeyPress(keymap::key_for_rdev(k))),
                    EventType::KeyRelease(k) => {
                        Some(RawInput::KeyRelease(keymap::key_for_rdev(k)))
                    }
                    EventType::Wheel { .. } => None,
                };
                if let Some(input) = input {
                    deliver(&tx, input);
                }
            });

            if let Err(e) = result {
                error!(error = ?e, "rdev listener failed");
            }
        })?;

    Ok(ListenerHandle::new(stop, rx, vec![thread]))
}

fn button(b: Button) -> PointerButton {
    match b {
        Button::Left => PointerButton::Primary,
        Button::Right => PointerButton::Secondary,
        Button::Middle => PointerButton::Middle,
        Button::Unknown(n) => PointerButton::Other(n),
    }
}
