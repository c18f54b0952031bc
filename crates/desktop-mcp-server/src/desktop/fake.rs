//! Recording desktop used by tests

use super::{Desktop, Direction, InputSession};
use crate::errors::DesktopError;
use desktop_mcp_protocol::{Key, MouseButton, ScreenSize};
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// A primitive observed by the fake desktop
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Move(i32, i32),
    Button(MouseButton, Direction),
    Key(Key, Direction),
    Text(String),
    Capture,
}

pub struct FakeDesktop {
    events: Arc<Mutex<Vec<Event>>>,
    screen: RgbaImage,
    failing_key: Option<Key>,
    fail_connect: bool,
    fail_capture: bool,
}

impl FakeDesktop {
    pub fn new(screen: RgbaImage) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            screen,
            failing_key: None,
            fail_connect: false,
            fail_capture: false,
        }
    }

    /// A desktop whose screen is deterministic noise
    pub fn with_noise(width: u32, height: u32) -> Self {
        Self::new(noise_image(width, height, 0x5eed))
    }

    /// Reject any primitive that touches `key`
    pub fn failing_key(mut self, key: Key) -> Self {
        self.failing_key = Some(key);
        self
    }

    pub fn failing_connection(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn screen(&self) -> &RgbaImage {
        &self.screen
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Desktop for FakeDesktop {
    fn input(&self) -> Result<Box<dyn InputSession>, DesktopError> {
        if self.fail_connect {
            return Err(DesktopError::connection("display refused connection"));
        }
        Ok(Box::new(FakeSession {
            events: Arc::clone(&self.events),
            failing_key: self.failing_key,
            size: ScreenSize {
                width: self.screen.width(),
                height: self.screen.height(),
            },
        }))
    }

    fn capture(&self) -> Result<RgbaImage, DesktopError> {
        self.record(Event::Capture);
        if self.fail_capture {
            return Err(DesktopError::capture("framebuffer unavailable"));
        }
        Ok(self.screen.clone())
    }
}

struct FakeSession {
    events: Arc<Mutex<Vec<Event>>>,
    failing_key: Option<Key>,
    size: ScreenSize,
}

impl FakeSession {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl InputSession for FakeSession {
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<(), DesktopError> {
        self.record(Event::Move(x, y));
        Ok(())
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<(), DesktopError> {
        self.record(Event::Button(button, direction));
        Ok(())
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<(), DesktopError> {
        if self.failing_key == Some(key) {
            return Err(DesktopError::input(format!("cannot map key {}", key)));
        }
        self.record(Event::Key(key, direction));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), DesktopError> {
        self.record(Event::Text(text.to_string()));
        Ok(())
    }

    fn main_display(&mut self) -> Result<ScreenSize, DesktopError> {
        Ok(self.size)
    }
}

/// Deterministic RGB noise
pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut state = seed | 1;
    RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let [r, g, b, ..] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}
