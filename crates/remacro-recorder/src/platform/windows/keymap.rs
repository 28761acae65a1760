//! rdev keys and Win32 virtual keys <-> key symbols

use remacro_core::{KeySymbol, SpecialKey};
use rdev::Key;

/// Symbol for a captured key. Letters are reported lowercase; keys rdev
/// can't name keep their raw code.
pub fn key_for_rdev(key: Key) -> KeySymbol {
    if let Some(c) = base_char(key) {
        return KeySymbol::Char(c);
    }
    let special = match key {
        Key::Alt => SpecialKey::Alt,
        Key::AltGr => SpecialKey::AltGr,
        Key::Backspace => SpecialKey::Backspace,
        Key::CapsLock => SpecialKey::CapsLock,
        Key::ControlLeft => SpecialKey::CtrlL,
        Key::ControlRight => SpecialKey::CtrlR,
        Key::Delete | Key::KpDelete => SpecialKey::Delete,
        Key::DownArrow => SpecialKey::Down,
        Key::End => SpecialKey::End,
        Key::Escape => SpecialKey::Esc,
        Key::F1 => SpecialKey::F(1),
        Key::F2 => SpecialKey::F(2),
        Key::F3 => SpecialKey::F(3),
        Key::F4 => SpecialKey::F(4),
        Key::F5 => SpecialKey::F(5),
        Key::F6 => SpecialKey::F(6),
        Key::F7 => SpecialKey::F(7),
        Key::F8 => SpecialKey::F(8),
        Key::F9 => SpecialKey::F(9),
        Key::F10 => SpecialKey::F(10),
        Key::F11 => SpecialKey::F(11),
        Key::F12 => SpecialKey::F(12),
        Key::Home => SpecialKey::Home,
        Key::Insert => SpecialKey::Insert,
        Key::LeftArrow => SpecialKey::Left,
        Key::MetaLeft => SpecialKey::CmdL,
        Key::MetaRight => SpecialKey::CmdR,
        Key::NumLock => SpecialKey::NumLock,
        Key::PageDown => SpecialKey::PageDown,
        Key::PageUp => SpecialKey::PageUp,
        Key::Pause => SpecialKey::Pause,
        Key::PrintScreen => SpecialKey::PrintScreen,
        Key::Return | Key::KpReturn => SpecialKey::Enter,
        Key::RightArrow => SpecialKey::Right,
        Key::ScrollLock => SpecialKey::ScrollLock,
        Key::ShiftLeft => SpecialKey::ShiftL,
        Key::ShiftRight => SpecialKey::ShiftR,
        Key::Space => SpecialKey::Space,
        Key::Tab => SpecialKey::Tab,
        Key::UpArrow => SpecialKey::Up,
        Key::Unknown(code) => return KeySymbol::VirtualKey(code),
        _ => return KeySymbol::Unresolved(format!("{key:?}")),
    };
    KeySymbol::Special(special)
}

fn base_char(key: Key) -> Option<char> {
    Some(match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        Key::Comma => ',',
        Key::Dot => '.',
        Key::SemiColon => ';',
        Key::Quote => '\'',
        Key::BackQuote => '`',
        Key::Slash | Key::KpDivide => '/',
        Key::BackSlash | Key::IntlBackslash => '\\',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::Minus | Key::KpMinus => '-',
        Key::Equal => '=',
        Key::KpPlus => '+',
        Key::KpMultiply => '*',
        _ => return None,
    })
}

/// Win32 virtual-key code for a named key
pub fn vk_for_special(key: SpecialKey) -> Option<u16> {
    Some(match key {
        SpecialKey::Backspace => 0x08,
        SpecialKey::Tab => 0x09,
        SpecialKey::Enter => 0x0D,
        SpecialKey::Shift => 0x10,
        SpecialKey::Ctrl => 0x11,
        SpecialKey::Alt => 0x12,
        SpecialKey::Pause => 0x13,
        SpecialKey::CapsLock => 0x14,
        SpecialKey::Esc => 0x1B,
        SpecialKey::Space => 0x20,
        SpecialKey::PageUp => 0x21,
        SpecialKey::PageDown => 0x22,
        SpecialKey::End => 0x23,
        SpecialKey::Home => 0x24,
        SpecialKey::Left => 0x25,
        SpecialKey::Up => 0x26,
        SpecialKey::Right => 0x27,
        SpecialKey::Down => 0x28,
        SpecialKey::PrintScreen => 0x2C,
        SpecialKey::Insert => 0x2D,
        SpecialKey::Delete => 0x2E,
        SpecialKey::Cmd | SpecialKey::CmdL => 0x5B,
        SpecialKey::CmdR => 0x5C,
        SpecialKey::Menu => 0x5D,
        SpecialKey::F(n) if (1..=20).contains(&n) => 0x70 + u16::from(n) - 1,
        SpecialKey::F(_) => return None,
        SpecialKey::NumLock => 0x90,
        SpecialKey::ScrollLock => 0x91,
        SpecialKey::ShiftL => 0xA0,
        SpecialKey::ShiftR => 0xA1,
        SpecialKey::CtrlL => 0xA2,
        SpecialKey::CtrlR => 0xA3,
        SpecialKey::AltL => 0xA4,
        SpecialKey::AltR | SpecialKey::AltGr => 0xA5,
        SpecialKey::MediaVolumeMute => 0xAD,
        SpecialKey::MediaVolumeDown => 0xAE,
        SpecialKey::MediaVolumeUp => 0xAF,
        SpecialKey::MediaNext => 0xB0,
        SpecialKey::MediaPrevious => 0xB1,
        SpecialKey::MediaPlayPause => 0xB3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkeys_map_both_ways() {
        assert_eq!(key_for_rdev(Key::F9), SpecialKey::F(9).into());
        assert_eq!(key_for_rdev(Key::Escape), SpecialKey::Esc.into());
        assert_eq!(vk_for_special(SpecialKey::F(10)), Some(0x79));
        assert_eq!(vk_for_special(SpecialKey::F(20)), Some(0x83));
    }

    #[test]
    fn letters_are_lowercase_and_unknown_codes_survive() {
        assert_eq!(key_for_rdev(Key::KeyQ), KeySymbol::Char('q'));
        assert_eq!(key_for_rdev(Key::Unknown(255)), KeySymbol::VirtualKey(255));
    }
}
