//! Platform seam for input injection and screen capture
//!
//! Tool adapters only talk to the desktop through [`Desktop`]. The native
//! implementation drives the real OS; tests use a recording fake.

mod native;

#[cfg(test)]
pub mod fake;

pub use native::NativeDesktop;

use crate::errors::DesktopError;
use desktop_mcp_protocol::{Key, MouseButton, ScreenSize};
use image::RgbaImage;

/// How a button or key primitive is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Press,
    Release,
    Click,
}

/// One connection to the input system, scoped to a single tool call
pub trait InputSession {
    /// Move the pointer to absolute screen coordinates
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<(), DesktopError>;

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<(), DesktopError>;

    fn key(&mut self, key: Key, direction: Direction) -> Result<(), DesktopError>;

    /// Enter a string as typed text
    fn text(&mut self, text: &str) -> Result<(), DesktopError>;

    /// Size of the main display in pixels
    fn main_display(&mut self) -> Result<ScreenSize, DesktopError>;
}

/// Access to the shared desktop
///
/// All methods block; callers run them on the blocking thread pool.
pub trait Desktop: Send + Sync {
    /// Open an input session
    fn input(&self) -> Result<Box<dyn InputSession>, DesktopError>;

    /// Capture the full primary screen
    fn capture(&self) -> Result<RgbaImage, DesktopError>;
}

/// Optional collaborators detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Screen capture (and therefore image tools) is usable
    pub imaging: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self { imaging: true }
    }
}
