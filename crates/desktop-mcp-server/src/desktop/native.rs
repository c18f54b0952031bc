//! Native desktop backed by enigo (input) and xcap (capture)

use super::{Capabilities, Desktop, Direction, InputSession};
use crate::errors::DesktopError;
use desktop_mcp_protocol::{Key, MouseButton, ScreenSize};
use enigo::{Coordinate, Enigo, Keyboard, Mouse, Settings};
use image::RgbaImage;
use xcap::Monitor;

/// The real desktop of the machine the server runs on
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDesktop;

impl NativeDesktop {
    pub fn new() -> Self {
        Self
    }

    /// Detect optional capabilities once at startup
    pub fn probe(&self) -> Capabilities {
        match primary_monitor() {
            Ok(monitor) => {
                tracing::info!(
                    "Screen capture available (primary monitor {}x{})",
                    monitor.width(),
                    monitor.height()
                );
                Capabilities::all()
            }
            Err(e) => {
                tracing::warn!(
                    "Screen capture unavailable: {}. Image tools (find_image_on_screen, \
                     take_screenshot) will not be available.",
                    e
                );
                Capabilities { imaging: false }
            }
        }
    }
}

impl Desktop for NativeDesktop {
    fn input(&self) -> Result<Box<dyn InputSession>, DesktopError> {
        let enigo = Enigo::new(&Settings::default()).map_err(DesktopError::connection)?;
        Ok(Box::new(EnigoSession { enigo }))
    }

    fn capture(&self) -> Result<RgbaImage, DesktopError> {
        primary_monitor()?
            .capture_image()
            .map_err(DesktopError::capture)
    }
}

/// Pick the primary monitor, falling back to the first one reported
fn primary_monitor() -> Result<Monitor, DesktopError> {
    let monitors = Monitor::all().map_err(DesktopError::capture)?;
    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary() {
            return Ok(monitor);
        }
        if fallback.is_none() {
            fallback = Some(monitor);
        }
    }
    fallback.ok_or(DesktopError::NoMonitor)
}

struct EnigoSession {
    enigo: Enigo,
}

impl InputSession for EnigoSession {
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<(), DesktopError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(DesktopError::input)
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<(), DesktopError> {
        let button = match button {
            MouseButton::Left => enigo::Button::Left,
            MouseButton::Right => enigo::Button::Right,
            MouseButton::Middle => enigo::Button::Middle,
        };
        self.enigo
            .button(button, to_enigo_direction(direction))
            .map_err(DesktopError::input)
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<(), DesktopError> {
        let key = to_enigo_key(key)?;
        self.enigo
            .key(key, to_enigo_direction(direction))
            .map_err(DesktopError::input)
    }

    fn text(&mut self, text: &str) -> Result<(), DesktopError> {
        self.enigo.text(text).map_err(DesktopError::input)
    }

    fn main_display(&mut self) -> Result<ScreenSize, DesktopError> {
        let (width, height) = self.enigo.main_display().map_err(DesktopError::input)?;
        let width = u32::try_from(width).map_err(DesktopError::input)?;
        let height = u32::try_from(height).map_err(DesktopError::input)?;
        Ok(ScreenSize { width, height })
    }
}

fn to_enigo_direction(direction: Direction) -> enigo::Direction {
    match direction {
        Direction::Press => enigo::Direction::Press,
        Direction::Release => enigo::Direction::Release,
        Direction::Click => enigo::Direction::Click,
    }
}

fn to_enigo_key(key: Key) -> Result<enigo::Key, DesktopError> {
    use enigo::Key as K;

    let mapped = match key {
        Key::Return => K::Return,
        Key::Escape => K::Escape,
        Key::Tab => K::Tab,
        Key::Space => K::Space,
        Key::Backspace => K::Backspace,
        Key::Delete => K::Delete,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Shift => K::Shift,
        Key::Control => K::Control,
        Key::Alt => K::Alt,
        Key::Meta => K::Meta,
        Key::CapsLock => K::CapsLock,
        Key::Help => K::Help,
        Key::VolumeUp => K::VolumeUp,
        Key::VolumeDown => K::VolumeDown,
        Key::VolumeMute => K::VolumeMute,
        Key::PlayPause => K::MediaPlayPause,
        Key::NextTrack => K::MediaNextTrack,
        Key::PrevTrack => K::MediaPrevTrack,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        Key::NumLock => K::Numlock,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        Key::Insert => K::Insert,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        Key::Pause => K::Pause,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        Key::Stop => K::MediaStop,
        #[cfg(target_os = "windows")]
        Key::PrintScreen => K::Snapshot,
        #[cfg(all(unix, not(target_os = "macos")))]
        Key::PrintScreen => K::Print,
        #[cfg(target_os = "windows")]
        Key::ScrollLock => K::Scroll,
        #[cfg(all(unix, not(target_os = "macos")))]
        Key::ScrollLock => K::ScrollLock,
        Key::Function(n) => function_key(n).ok_or_else(|| unsupported(key))?,
        Key::Char(c) => K::Unicode(c),
        // Keys enigo has no code for on this platform
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported(key)),
    };
    Ok(mapped)
}

fn function_key(n: u8) -> Option<enigo::Key> {
    use enigo::Key as K;

    let key = match n {
        1 => K::F1,
        2 => K::F2,
        3 => K::F3,
        4 => K::F4,
        5 => K::F5,
        6 => K::F6,
        7 => K::F7,
        8 => K::F8,
        9 => K::F9,
        10 => K::F10,
        11 => K::F11,
        12 => K::F12,
        13 => K::F13,
        14 => K::F14,
        15 => K::F15,
        16 => K::F16,
        17 => K::F17,
        18 => K::F18,
        19 => K::F19,
        20 => K::F20,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        21 => K::F21,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        22 => K::F22,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        23 => K::F23,
        #[cfg(any(target_os = "windows", all(unix, not(target_os = "macos"))))]
        24 => K::F24,
        _ => return None,
    };
    Some(key)
}

fn unsupported(key: Key) -> DesktopError {
    DesktopError::Input(format!("key '{}' is not supported on this platform", key))
}
