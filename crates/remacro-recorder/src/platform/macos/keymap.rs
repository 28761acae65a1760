//! macOS virtual keycodes <-> key symbols

use remacro_core::{KeySymbol, SpecialKey};

pub const FLAG_CAPS: u64 = 0x10000;
pub const FLAG_SHIFT: u64 = 0x20000;
pub const FLAG_CTRL: u64 = 0x40000;
pub const FLAG_ALT: u64 = 0x80000;
pub const FLAG_CMD: u64 = 0x100000;

// Generic modifier names come before the sided ones so that decoding a
// keycode yields `shift`, not `shift_l`.
const SPECIAL_CODES: &[(SpecialKey, u16)] = &[
    (SpecialKey::Enter, 36),
    (SpecialKey::Tab, 48),
    (SpecialKey::Space, 49),
    (SpecialKey::Backspace, 51),
    (SpecialKey::Esc, 53),
    (SpecialKey::Cmd, 55),
    (SpecialKey::CmdL, 55),
    (SpecialKey::CmdR, 54),
    (SpecialKey::Shift, 56),
    (SpecialKey::ShiftL, 56),
    (SpecialKey::ShiftR, 60),
    (SpecialKey::CapsLock, 57),
    (SpecialKey::Alt, 58),
    (SpecialKey::AltL, 58),
    (SpecialKey::AltR, 61),
    (SpecialKey::AltGr, 61),
    (SpecialKey::Ctrl, 59),
    (SpecialKey::CtrlL, 59),
    (SpecialKey::CtrlR, 62),
    (SpecialKey::MediaVolumeUp, 72),
    (SpecialKey::MediaVolumeDown, 73),
    (SpecialKey::MediaVolumeMute, 74),
    (SpecialKey::Menu, 110),
    (SpecialKey::Insert, 114),
    (SpecialKey::Home, 115),
    (SpecialKey::PageUp, 116),
    (SpecialKey::Delete, 117),
    (SpecialKey::End, 119),
    (SpecialKey::PageDown, 121),
    (SpecialKey::Left, 123),
    (SpecialKey::Right, 124),
    (SpecialKey::Down, 125),
    (SpecialKey::Up, 126),
    (SpecialKey::F(1), 122),
    (SpecialKey::F(2), 120),
    (SpecialKey::F(3), 99),
    (SpecialKey::F(4), 118),
    (SpecialKey::F(5), 96),
    (SpecialKey::F(6), 97),
    (SpecialKey::F(7), 98),
    (SpecialKey::F(8), 100),
    (SpecialKey::F(9), 101),
    (SpecialKey::F(10), 109),
    (SpecialKey::F(11), 103),
    (SpecialKey::F(12), 111),
    (SpecialKey::F(13), 105),
    (SpecialKey::F(14), 107),
    (SpecialKey::F(15), 113),
    (SpecialKey::F(16), 106),
    (SpecialKey::F(17), 64),
    (SpecialKey::F(18), 79),
    (SpecialKey::F(19), 80),
    (SpecialKey::F(20), 90),
];

/// Symbol for a key event's keycode
pub fn key_for_code(keycode: u16, flags: u64) -> KeySymbol {
    if let Some((key, _)) = SPECIAL_CODES.iter().find(|(_, c)| *c == keycode) {
        return KeySymbol::Special(*key);
    }
    let shift = flags & (FLAG_SHIFT | FLAG_CAPS) != 0;
    match keycode_to_char(keycode, shift) {
        Some(c) => KeySymbol::Char(c),
        None => KeySymbol::VirtualKey(u32::from(keycode)),
    }
}

/// For FLAGS_CHANGED events: the modifier and the flag bit that is set
/// while it is held
pub fn modifier_for_code(keycode: u16) -> Option<(SpecialKey, u64)> {
    let mask = match keycode {
        54 | 55 => FLAG_CMD,
        56 | 60 => FLAG_SHIFT,
        57 => FLAG_CAPS,
        58 | 61 => FLAG_ALT,
        59 | 62 => FLAG_CTRL,
        _ => return None,
    };
    match key_for_code(keycode, 0) {
        KeySymbol::Special(key) => Some((key, mask)),
        _ => None,
    }
}

/// Keycode to inject for `key`, and whether it needs shift held
pub fn code_for_key(key: &KeySymbol) -> Option<(u16, bool)> {
    match key {
        KeySymbol::Special(k) => SPECIAL_CODES
            .iter()
            .find(|(s, _)| s == k)
            .map(|(_, c)| (*c, false)),
        KeySymbol::Char(c) => char_to_keycode(*c),
        KeySymbol::VirtualKey(vk) => u16::try_from(*vk).ok().map(|c| (c, false)),
        KeySymbol::Unresolved(_) => None,
    }
}

fn keycode_to_char(keycode: u16, shift: bool) -> Option<char> {
    let c = match keycode {
        // Letters
        0 => 'a', 1 => 's', 2 => 'd', 3 => 'f', 4 => 'h', 5 => 'g', 6 => 'z', 7 => 'x',
        8 => 'c', 9 => 'v', 11 => 'b', 12 => 'q', 13 => 'w', 14 => 'e', 15 => 'r',
        16 => 'y', 17 => 't', 31 => 'o', 32 => 'u', 34 => 'i', 35 => 'p', 37 => 'l',
        38 => 'j', 40 => 'k', 45 => 'n', 46 => 'm',
        // Numbers
        18 => if shift { '!' } else { '1' },
        19 => if shift { '@' } else { '2' },
        20 => if shift { '#' } else { '3' },
        21 => if shift { '$' } else { '4' },
        22 => if shift { '^' } else { '6' },
        23 => if shift { '%' } else { '5' },
        24 => if shift { '+' } else { '=' },
        25 => if shift { '(' } else { '9' },
        26 => if shift { '&' } else { '7' },
        27 => if shift { '_' } else { '-' },
        28 => if shift { '*' } else { '8' },
        29 => if shift { ')' } else { '0' },
        // Punctuation
        30 => if shift { '}' } else { ']' },
        33 => if shift { '{' } else { '[' },
        39 => if shift { '"' } else { '\'' },
        41 => if shift { ':' } else { ';' },
        42 => if shift { '|' } else { '\\' },
        43 => if shift { '<' } else { ',' },
        44 => if shift { '?' } else { '/' },
        47 => if shift { '>' } else { '.' },
        50 => if shift { '~' } else { '`' },
        _ => return None,
    };

    if shift && c.is_ascii_lowercase() {
        Some(c.to_ascii_uppercase())
    } else {
        Some(c)
    }
}

/// Convert char to (keycode, needs_shift)
fn char_to_keycode(c: char) -> Option<(u16, bool)> {
    Some(match c {
        'a' | 'A' => (0, c.is_uppercase()),
        'b' | 'B' => (11, c.is_uppercase()),
        'c' | 'C' => (8, c.is_uppercase()),
        'd' | 'D' => (2, c.is_uppercase()),
        'e' | 'E' => (14, c.is_uppercase()),
        'f' | 'F' => (3, c.is_uppercase()),
        'g' | 'G' => (5, c.is_uppercase()),
        'h' | 'H' => (4, c.is_uppercase()),
        'i' | 'I' => (34, c.is_uppercase()),
        'j' | 'J' => (38, c.is_uppercase()),
        'k' | 'K' => (40, c.is_uppercase()),
        'l' | 'L' => (37, c.is_uppercase()),
        'm' | 'M' => (46, c.is_uppercase()),
        'n' | 'N' => (45, c.is_uppercase()),
        'o' | 'O' => (31, c.is_uppercase()),
        'p' | 'P' => (35, c.is_uppercase()),
        'q' | 'Q' => (12, c.is_uppercase()),
        'r' | 'R' => (15, c.is_uppercase()),
        's' | 'S' => (1, c.is_uppercase()),
        't' | 'T' => (17, c.is_uppercase()),
        'u' | 'U' => (32, c.is_uppercase()),
        'v' | 'V' => (9, c.is_uppercase()),
        'w' | 'W' => (13, c.is_uppercase()),
        'x' | 'X' => (7, c.is_uppercase()),
        'y' | 'Y' => (16, c.is_uppercase()),
        'z' | 'Z' => (6, c.is_uppercase()),
        '0' | ')' => (29, c == ')'),
        '1' | '!' => (18, c == '!'),
        '2' | '@' => (19, c == '@'),
        '3' | '#' => (20, c == '#'),
        '4' | '$' => (21, c == '$'),
        '5' | '%' => (23, c == '%'),
        '6' | '^' => (22, c == '^'),
        '7' | '&' => (26, c == '&'),
        '8' | '*' => (28, c == '*'),
        '9' | '(' => (25, c == '('),
        ' ' => (49, false),
        '\n' | '\r' => (36, false),
        '\t' => (48, false),
        '-' | '_' => (27, c == '_'),
        '=' | '+' => (24, c == '+'),
        '[' | '{' => (33, c == '{'),
        ']' | '}' => (30, c == '}'),
        '\\' | '|' => (42, c == '|'),
        ';' | ':' => (41, c == ':'),
        '\'' | '"' => (39, c == '"'),
        ',' | '<' => (43, c == '<'),
        '.' | '>' => (47, c == '>'),
        '/' | '?' => (44, c == '?'),
        '`' | '~' => (50, c == '~'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkeys_decode_to_their_names() {
        assert_eq!(key_for_code(101, 0), SpecialKey::F(9).into());
        assert_eq!(key_for_code(109, 0), SpecialKey::F(10).into());
        assert_eq!(key_for_code(53, 0), SpecialKey::Esc.into());
    }

    #[test]
    fn chars_respect_shift() {
        assert_eq!(key_for_code(0, 0), KeySymbol::Char('a'));
        assert_eq!(key_for_code(0, FLAG_SHIFT), KeySymbol::Char('A'));
        assert_eq!(key_for_code(18, FLAG_SHIFT), KeySymbol::Char('!'));
        assert_eq!(key_for_code(200, 0), KeySymbol::VirtualKey(200));
    }

    #[test]
    fn captured_keys_map_back_to_their_codes() {
        for code in [0u16, 18, 36, 49, 56, 60, 101, 123, 200] {
            let key = key_for_code(code, 0);
            assert_eq!(code_for_key(&key).map(|(c, _)| c), Some(code), "{key}");
        }
        assert_eq!(code_for_key(&KeySymbol::Unresolved("x".into())), None);
    }
}
