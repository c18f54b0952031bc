//! Common protocol definitions for desktop-mcp
//!
//! This crate defines the transport-independent types exchanged between
//! callers and the desktop automation server.

mod error;
mod keys;

pub use error::{ErrorKind, ErrorSignal, ToolError};
pub use keys::{KEY_NAME_FORMAT, Key, MAX_FUNCTION_KEY, UnrecognizedKey};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Arguments of a tool call, keyed by parameter name
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// A named tool invocation as received from the transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Build a call from a JSON object literal; non-objects give no arguments
    pub fn from_json(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => Arguments::new(),
        };
        Self::new(name, arguments)
    }
}

/// Screen-space pixel coordinates (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Outcome of an image search: the match center, or `None` when not found
pub type MatchResult = Option<Point>;

/// Size of the main screen in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Mouse buttons that can be clicked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[schemars(inline)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// Raster encodings produced by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }
}

/// An encoded raster image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            format: ImageFormat::Png,
        }
    }
}
