//! CGEvent injection

use super::keymap;
use crate::injector::{InjectError, InputInjector};
use remacro_core::KeySymbol;
use std::time::Duration;

use cidre::cg;

// Raw FFI for CGEventPost (not exposed by cidre)
#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventPost(tap: u32, event: *const std::ffi::c_void);
}

const HID_EVENT_TAP: u32 = 0;

/// Post an event to the system
fn post_event(event: &cg::Event) {
    unsafe {
        CGEventPost(HID_EVENT_TAP, event as *const _ as *const std::ffi::c_void);
    }
}

#[derive(Debug, Default)]
pub struct MacInjector;

impl MacInjector {
    pub fn new() -> Self {
        Self
    }

    fn mouse(&self, kind: cg::EventType, pos: cg::Point) -> Result<(), InjectError> {
        let evt = cg::Event::mouse(None, kind, pos, cg::MouseButton::Left)
            .ok_or_else(|| InjectError::Failed("could not create mouse event".into()))?;
        post_event(&evt);
        Ok(())
    }

    fn key(&self, key: &KeySymbol, down: bool) -> Result<(), InjectError> {
        let (keycode, shift) =
            keymap::code_for_key(key).ok_or_else(|| InjectError::UnresolvedKey(key.encode()))?;
        let mut evt = cg::Event::keyboard(None, keycode, down)
            .ok_or_else(|| InjectError::Failed("could not create keyboard event".into()))?;
        if shift {
            evt.set_flags(cg::EventFlags(keymap::FLAG_SHIFT));
        }
        post_event(&evt);
        Ok(())
    }
}

impl InputInjector for MacInjector {
    fn click(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        let pos = cg::Point {
            x: x as f64,
            y: y as f64,
        };
        self.mouse(cg::EventType::MOUSE_MOVED, pos)?;
        self.mouse(cg::EventType::LEFT_MOUSE_DOWN, pos)?;
        std::thread::sleep(Duration::from_millis(10));
        self.mouse(cg::EventType::LEFT_MOUSE_UP, pos)
    }

    fn key_down(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        self.key(key, true)
    }

    fn key_up(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        self.key(key, false)
    }
}
