//! Key identities and their string encoding
//!
//! A key is stored as one string in macro files:
//!
//! - `"a"`: a printable character, stored literally
//! - `"Key.shift"`: a named special key
//! - `"KeyCode.vk.65"`: a platform virtual-key code with no symbolic name
//!
//! Decoding never fails. Strings that match none of the forms (or name a
//! special key we don't know) become [`KeySymbol::Unresolved`] so a whole
//! file is never rejected because of one odd key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const SPECIAL_PREFIX: &str = "Key.";
const VK_PREFIX: &str = "KeyCode.vk.";

/// Keys that have a name rather than a printable character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Alt,
    AltL,
    AltR,
    AltGr,
    Backspace,
    CapsLock,
    Cmd,
    CmdL,
    CmdR,
    Ctrl,
    CtrlL,
    CtrlR,
    Delete,
    Down,
    End,
    Enter,
    Esc,
    /// Function keys F1..=F20
    F(u8),
    Home,
    Insert,
    Left,
    Menu,
    NumLock,
    PageDown,
    PageUp,
    Pause,
    PrintScreen,
    Right,
    ScrollLock,
    Shift,
    ShiftL,
    ShiftR,
    Space,
    Tab,
    Up,
    MediaPlayPause,
    MediaVolumeMute,
    MediaVolumeDown,
    MediaVolumeUp,
    MediaPrevious,
    MediaNext,
}

const MAX_FUNCTION_KEY: u8 = 20;

const NAMES: &[(SpecialKey, &str)] = &[
    (SpecialKey::Alt, "alt"),
    (SpecialKey::AltL, "alt_l"),
    (SpecialKey::AltR, "alt_r"),
    (SpecialKey::AltGr, "alt_gr"),
    (SpecialKey::Backspace, "backspace"),
    (SpecialKey::CapsLock, "caps_lock"),
    (SpecialKey::Cmd, "cmd"),
    (SpecialKey::CmdL, "cmd_l"),
    (SpecialKey::CmdR, "cmd_r"),
    (SpecialKey::Ctrl, "ctrl"),
    (SpecialKey::CtrlL, "ctrl_l"),
    (SpecialKey::CtrlR, "ctrl_r"),
    (SpecialKey::Delete, "delete"),
    (SpecialKey::Down, "down"),
    (SpecialKey::End, "end"),
    (SpecialKey::Enter, "enter"),
    (SpecialKey::Esc, "esc"),
    (SpecialKey::Home, "home"),
    (SpecialKey::Insert, "insert"),
    (SpecialKey::Left, "left"),
    (SpecialKey::Menu, "menu"),
    (SpecialKey::NumLock, "num_lock"),
    (SpecialKey::PageDown, "page_down"),
    (SpecialKey::PageUp, "page_up"),
    (SpecialKey::Pause, "pause"),
    (SpecialKey::PrintScreen, "print_screen"),
    (SpecialKey::Right, "right"),
    (SpecialKey::ScrollLock, "scroll_lock"),
    (SpecialKey::Shift, "shift"),
    (SpecialKey::ShiftL, "shift_l"),
    (SpecialKey::ShiftR, "shift_r"),
    (SpecialKey::Space, "space"),
    (SpecialKey::Tab, "tab"),
    (SpecialKey::Up, "up"),
    (SpecialKey::MediaPlayPause, "media_play_pause"),
    (SpecialKey::MediaVolumeMute, "media_volume_mute"),
    (SpecialKey::MediaVolumeDown, "media_volume_down"),
    (SpecialKey::MediaVolumeUp, "media_volume_up"),
    (SpecialKey::MediaPrevious, "media_previous"),
    (SpecialKey::MediaNext, "media_next"),
];

impl SpecialKey {
    pub fn name(&self) -> String {
        match self {
            SpecialKey::F(n) => format!("f{}", n),
            other => NAMES
                .iter()
                .find(|(k, _)| k == other)
                .map(|(_, n)| n.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(n) = name.strip_prefix('f').and_then(|d| d.parse::<u8>().ok()) {
            return (1..=MAX_FUNCTION_KEY).contains(&n).then_some(SpecialKey::F(n));
        }
        NAMES.iter().find(|(_, n)| *n == name).map(|(k, _)| *k)
    }

    /// Generic form of a sided modifier (`ShiftL` -> `Shift`)
    pub fn unsided(&self) -> Self {
        match self {
            SpecialKey::AltL | SpecialKey::AltR => SpecialKey::Alt,
            SpecialKey::CmdL | SpecialKey::CmdR => SpecialKey::Cmd,
            SpecialKey::CtrlL | SpecialKey::CtrlR => SpecialKey::Ctrl,
            SpecialKey::ShiftL | SpecialKey::ShiftR => SpecialKey::Shift,
            other => *other,
        }
    }
}

/// Identity of a pressed or released key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    Char(char),
    Special(SpecialKey),
    /// Platform virtual-key code; meaning depends on the OS that recorded it
    VirtualKey(u32),
    /// No symbol could be derived. The original text is kept so saving
    /// the macro again does not lose it.
    Unresolved(String),
}

impl KeySymbol {
    pub fn encode(&self) -> String {
        match self {
            KeySymbol::Char(c) => c.to_string(),
            KeySymbol::Special(k) => format!("{}{}", SPECIAL_PREFIX, k.name()),
            KeySymbol::VirtualKey(vk) => format!("{}{}", VK_PREFIX, vk),
            KeySymbol::Unresolved(raw) => raw.clone(),
        }
    }

    pub fn decode(s: &str) -> Self {
        if let Some(code) = s.strip_prefix(VK_PREFIX) {
            return code
                .parse::<u32>()
                .map(KeySymbol::VirtualKey)
                .unwrap_or_else(|_| KeySymbol::Unresolved(s.to_string()));
        }
        if let Some(name) = s.strip_prefix(SPECIAL_PREFIX) {
            return SpecialKey::from_name(name)
                .map(KeySymbol::Special)
                .unwrap_or_else(|| KeySymbol::Unresolved(s.to_string()));
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeySymbol::Char(c),
            // Quoted form: 'a'
            (Some('\''), Some(c)) if s.chars().count() == 3 && s.ends_with('\'') => {
                KeySymbol::Char(c)
            }
            _ => KeySymbol::Unresolved(s.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, KeySymbol::Unresolved(_))
    }

    /// Same key ignoring left/right and letter case.
    pub fn matches(&self, other: &KeySymbol) -> bool {
        match (self, other) {
            (KeySymbol::Special(a), KeySymbol::Special(b)) => a.unsided() == b.unsided(),
            (KeySymbol::Char(a), KeySymbol::Char(b)) => a.to_lowercase().eq(b.to_lowercase()),
            (a, b) => a == b,
        }
    }
}

impl From<SpecialKey> for KeySymbol {
    fn from(k: SpecialKey) -> Self {
        KeySymbol::Special(k)
    }
}

impl From<char> for KeySymbol {
    fn from(c: char) -> Self {
        KeySymbol::Char(c)
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(c) => write!(f, "'{}'", c.escape_default()),
            KeySymbol::Special(k) => write!(f, "{}", k.name()),
            KeySymbol::VirtualKey(vk) => write!(f, "vk {}", vk),
            KeySymbol::Unresolved(raw) => write!(f, "? {}", raw),
        }
    }
}

impl Serialize for KeySymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for KeySymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(KeySymbol::decode(&s))
    }
}
