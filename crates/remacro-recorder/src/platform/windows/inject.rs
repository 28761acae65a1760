//! SendInput injection

use super::keymap;
use crate::injector::{InjectError, InputInjector};
use remacro_core::KeySymbol;
use std::time::Duration;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

#[derive(Debug, Default)]
pub struct WinInjector;

impl WinInjector {
    pub fn new() -> Self {
        Self
    }

    fn key(&self, key: &KeySymbol, key_up: bool) -> Result<(), InjectError> {
        let input = match key {
            KeySymbol::Special(k) => keymap::vk_for_special(*k)
                .map(|vk| make_key_input(vk, key_up))
                .ok_or_else(|| InjectError::UnresolvedKey(key.encode()))?,
            KeySymbol::VirtualKey(vk) => u16::try_from(*vk)
                .map(|vk| make_key_input(vk, key_up))
                .map_err(|_| InjectError::UnresolvedKey(key.encode()))?,
            KeySymbol::Char(c) => char_input(*c, key_up)
                .ok_or_else(|| InjectError::UnresolvedKey(key.encode()))?,
            KeySymbol::Unresolved(raw) => return Err(InjectError::UnresolvedKey(raw.clone())),
        };
        send_inputs(&[input])
    }
}

impl InputInjector for WinInjector {
    fn click(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        unsafe {
            SetCursorPos(x, y)
                .map_err(|e| InjectError::Failed(format!("failed to move cursor: {e:?}")))?;
        }
        std::thread::sleep(Duration::from_millis(10));
        send_inputs(&[
            make_mouse_input(MOUSEEVENTF_LEFTDOWN),
            make_mouse_input(MOUSEEVENTF_LEFTUP),
        ])
    }

    fn key_down(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        self.key(key, false)
    }

    fn key_up(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        self.key(key, true)
    }
}

/// Layout key for `c` when there is one, otherwise a unicode keystroke
fn char_input(c: char, key_up: bool) -> Option<INPUT> {
    let mut units = [0u16; 2];
    let encoded = c.encode_utf16(&mut units);
    if encoded.len() != 1 {
        return None;
    }
    let code = encoded[0];
    let scan = unsafe { VkKeyScanW(code) };
    if scan == -1 {
        Some(make_unicode_input(code, key_up))
    } else {
        Some(make_key_input((scan as u16) & 0xFF, key_up))
    }
}

fn make_mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn make_key_input(vk: u16, key_up: bool) -> INPUT {
    let flags = if key_up { KEYEVENTF_KEYUP } else { KEYBD_EVENT_FLAGS(0) };

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn make_unicode_input(char_code: u16, key_up: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: char_code,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send_inputs(inputs: &[INPUT]) -> Result<(), InjectError> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };

    if sent as usize != inputs.len() {
        return Err(InjectError::Failed(format!(
            "SendInput sent {} of {}",
            sent,
            inputs.len()
        )));
    }
    Ok(())
}
