//! Keyboard key vocabulary
//!
//! Key names follow the usual desktop-automation conventions: named keys are
//! matched case-insensitively and accept common aliases (`esc`, `pgup`,
//! `cmd`, ...), while any other single character stands for itself.

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest function key accepted by [`Key::from_name`]
pub const MAX_FUNCTION_KEY: u8 = 24;

/// JSON Schema `format` of a string holding a key name
pub const KEY_NAME_FORMAT: &str = "key-name";

/// A recognized keyboard key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Key {
    Return,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
    NumLock,
    ScrollLock,
    Insert,
    PrintScreen,
    Pause,
    Help,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    PlayPause,
    NextTrack,
    PrevTrack,
    Stop,
    /// Function key `F1`..=`F24`
    Function(u8),
    /// Any other single character
    Char(char),
}

/// Error returned for a key name outside the vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a recognized key name")]
pub struct UnrecognizedKey(pub String);

impl Key {
    /// Parse a key name, returning `None` if it is not recognized
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(match c {
                '\n' | '\r' => Self::Return,
                '\t' => Self::Tab,
                ' ' => Self::Space,
                '\u{8}' => Self::Backspace,
                other => Self::Char(other),
            });
        }

        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => Self::Return,
            "esc" | "escape" => Self::Escape,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" => Self::PageUp,
            "pagedown" | "pgdn" => Self::PageDown,
            "shift" | "shiftleft" | "shiftright" => Self::Shift,
            "ctrl" | "ctrlleft" | "ctrlright" | "control" => Self::Control,
            "alt" | "altleft" | "altright" | "option" | "optionleft" | "optionright" => Self::Alt,
            "win" | "winleft" | "winright" | "cmd" | "command" | "super" | "meta" => Self::Meta,
            "capslock" => Self::CapsLock,
            "numlock" => Self::NumLock,
            "scrolllock" => Self::ScrollLock,
            "insert" => Self::Insert,
            "printscreen" | "print" | "prntscrn" | "prtsc" | "prtscr" => Self::PrintScreen,
            "pause" => Self::Pause,
            "help" => Self::Help,
            "volumeup" => Self::VolumeUp,
            "volumedown" => Self::VolumeDown,
            "volumemute" => Self::VolumeMute,
            "playpause" => Self::PlayPause,
            "nexttrack" => Self::NextTrack,
            "prevtrack" => Self::PrevTrack,
            "stop" => Self::Stop,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if (1..=MAX_FUNCTION_KEY).contains(&n) {
                    Self::Function(n)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }

    /// Whether this key is a modifier usually held in a combination
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Shift | Self::Control | Self::Alt | Self::Meta)
    }
}

impl FromStr for Key {
    type Err = UnrecognizedKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnrecognizedKey(s.to_string()))
    }
}

impl TryFrom<String> for Key {
    type Error = UnrecognizedKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Return => "enter",
            Self::Escape => "esc",
            Self::Tab => "tab",
            Self::Space => "space",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Home => "home",
            Self::End => "end",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Shift => "shift",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::Meta => "win",
            Self::CapsLock => "capslock",
            Self::NumLock => "numlock",
            Self::ScrollLock => "scrolllock",
            Self::Insert => "insert",
            Self::PrintScreen => "printscreen",
            Self::Pause => "pause",
            Self::Help => "help",
            Self::VolumeUp => "volumeup",
            Self::VolumeDown => "volumedown",
            Self::VolumeMute => "volumemute",
            Self::PlayPause => "playpause",
            Self::NextTrack => "nexttrack",
            Self::PrevTrack => "prevtrack",
            Self::Stop => "stop",
            Self::Function(n) => return write!(f, "f{}", n),
            Self::Char(c) => return write!(f, "{}", c),
        };
        f.write_str(name)
    }
}

/// Key names travel as strings tagged with [`KEY_NAME_FORMAT`]
impl JsonSchema for Key {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        "Key".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "format": KEY_NAME_FORMAT,
        })
    }
}
