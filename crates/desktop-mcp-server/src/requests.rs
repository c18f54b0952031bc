//! Typed tool requests
//!
//! Each request type is the single declaration of its tool's parameters: the
//! advertised input schema is generated from it, and arguments are validated
//! against that schema before being deserialized here.

use crate::constants::DEFAULT_CONFIDENCE;
use desktop_mcp_protocol::{Arguments, Key, MouseButton, ToolError};
use rmcp::schemars;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Request for move_to tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveToRequest {
    #[schemars(description = "The x-coordinate to move to.")]
    pub x: i32,
    #[schemars(description = "The y-coordinate to move to.")]
    pub y: i32,
}

/// Request for click tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClickRequest {
    #[schemars(description = "The x-coordinate to click at.")]
    pub x: i32,
    #[schemars(description = "The y-coordinate to click at.")]
    pub y: i32,
    #[schemars(description = "Which mouse button to click.")]
    #[serde(default)]
    pub button: MouseButton,
    #[schemars(description = "Number of clicks.", range(min = 1))]
    #[serde(default = "default_clicks")]
    pub clicks: u32,
}

/// Request for type_text tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TypeTextRequest {
    #[schemars(description = "The text to type.")]
    pub text: String,
    #[schemars(description = "Interval in seconds between key presses.", range(min = 0.0))]
    #[serde(default)]
    pub interval: f64,
}

/// Request for press_key tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PressKeyRequest {
    #[schemars(description = "The name of the key to press (e.g., 'enter', 'esc', 'f1').")]
    pub key: Key,
}

/// Request for press_hotkey tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PressHotkeyRequest {
    #[schemars(
        description = "A list of key names to press simultaneously (e.g., ['ctrl', 'c'] for copy).",
        length(min = 1)
    )]
    pub keys: Vec<Key>,
}

/// Request for find_image_on_screen tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FindImageRequest {
    #[schemars(description = "Base64-encoded image data (e.g., PNG, JPEG) to find on the screen.")]
    pub image_data_base64: String,
    #[schemars(
        description = "Confidence level (0.0 to 1.0) for the match.",
        range(min = 0.0, max = 1.0)
    )]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

/// Request for tools that take no arguments
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EmptyRequest {}

fn default_clicks() -> u32 {
    1
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// Deserialize validated arguments into a typed request
pub fn parse<T: DeserializeOwned>(arguments: Arguments) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|e| ToolError::invalid_argument("arguments", e.to_string()))
}
