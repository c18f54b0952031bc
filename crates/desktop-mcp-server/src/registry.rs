//! Tool catalog and dispatcher
//!
//! The registry owns the fixed set of tool descriptors built at startup and
//! routes each call through validation to its adapter.

use crate::desktop::{Capabilities, Desktop};
use crate::requests::{
    ClickRequest, EmptyRequest, FindImageRequest, MoveToRequest, PressHotkeyRequest,
    PressKeyRequest, TypeTextRequest, parse,
};
use crate::schema::ParamSchema;
use crate::tools::{find_image, input, screenshot};
use desktop_mcp_protocol::{EncodedImage, MatchResult, ScreenSize, ToolCall, ToolError};
use std::sync::Arc;

/// Every tool the server offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    MoveTo,
    Click,
    TypeText,
    PressKey,
    PressHotkey,
    FindImageOnScreen,
    TakeScreenshot,
    GetScreenSize,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::MoveTo,
        ToolKind::Click,
        ToolKind::TypeText,
        ToolKind::PressKey,
        ToolKind::PressHotkey,
        ToolKind::FindImageOnScreen,
        ToolKind::TakeScreenshot,
        ToolKind::GetScreenSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::MoveTo => "move_to",
            ToolKind::Click => "click",
            ToolKind::TypeText => "type_text",
            ToolKind::PressKey => "press_key",
            ToolKind::PressHotkey => "press_hotkey",
            ToolKind::FindImageOnScreen => "find_image_on_screen",
            ToolKind::TakeScreenshot => "take_screenshot",
            ToolKind::GetScreenSize => "get_screen_size",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ToolKind::MoveTo => "Move Mouse",
            ToolKind::Click => "Click Mouse",
            ToolKind::TypeText => "Type Text",
            ToolKind::PressKey => "Press Key",
            ToolKind::PressHotkey => "Press Hotkey",
            ToolKind::FindImageOnScreen => "Find Image on Screen",
            ToolKind::TakeScreenshot => "Take Screenshot",
            ToolKind::GetScreenSize => "Get Screen Size",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::MoveTo => "Move the mouse cursor to the specified screen coordinates (x, y).",
            ToolKind::Click => {
                "Click the mouse at the specified screen coordinates (x, y) with a specific \
                 button and number of clicks."
            }
            ToolKind::TypeText => "Type the given text using the keyboard.",
            ToolKind::PressKey => "Press a single keyboard key.",
            ToolKind::PressHotkey => "Press a combination of keys simultaneously.",
            ToolKind::FindImageOnScreen => {
                "Locate the center coordinates of an image on the screen. Returns {\"x\": int, \
                 \"y\": int} of the center of the best match if found, otherwise null."
            }
            ToolKind::TakeScreenshot => "Take a screenshot of the entire screen.",
            ToolKind::GetScreenSize => "Get the width and height of the main screen.",
        }
    }

    /// Only observes the desktop
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            ToolKind::FindImageOnScreen | ToolKind::TakeScreenshot | ToolKind::GetScreenSize
        )
    }

    /// Needs screen capture to be available
    pub fn requires_imaging(self) -> bool {
        matches!(self, ToolKind::FindImageOnScreen | ToolKind::TakeScreenshot)
    }

    /// Input schema generated from the tool's request type
    fn schema(self) -> ParamSchema {
        match self {
            ToolKind::MoveTo => ParamSchema::of::<MoveToRequest>(),
            ToolKind::Click => ParamSchema::of::<ClickRequest>(),
            ToolKind::TypeText => ParamSchema::of::<TypeTextRequest>(),
            ToolKind::PressKey => ParamSchema::of::<PressKeyRequest>(),
            ToolKind::PressHotkey => ParamSchema::of::<PressHotkeyRequest>(),
            ToolKind::FindImageOnScreen => ParamSchema::of::<FindImageRequest>(),
            ToolKind::TakeScreenshot | ToolKind::GetScreenSize => ParamSchema::of::<EmptyRequest>(),
        }
    }
}

/// Immutable description of one tool
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub schema: ParamSchema,
    pub read_only: bool,
    pub destructive: bool,
    pub open_world: bool,
}

impl ToolDescriptor {
    fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            name: kind.name(),
            title: kind.title(),
            description: kind.description(),
            schema: kind.schema(),
            read_only: kind.is_read_only(),
            destructive: !kind.is_read_only(),
            open_world: true,
        }
    }
}

/// Successful result of a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// JSON acknowledgement from an input tool
    Message(String),
    Location(MatchResult),
    Image(EncodedImage),
    ScreenSize(ScreenSize),
}

/// The tool catalog plus the desktop it drives
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    desktop: Arc<dyn Desktop>,
    capabilities: Capabilities,
}

impl ToolRegistry {
    pub fn new(desktop: Arc<dyn Desktop>, capabilities: Capabilities) -> Self {
        Self {
            descriptors: ToolKind::ALL.into_iter().map(ToolDescriptor::new).collect(),
            desktop,
            capabilities,
        }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Route one call to its adapter
    ///
    /// Nothing touches the desktop unless the call names a known tool, its
    /// dependencies are available and its arguments validate.
    pub async fn dispatch(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        let ToolCall { name, arguments } = call;
        let descriptor = self
            .descriptor(&name)
            .ok_or_else(|| ToolError::UnknownTool(name.clone()))?;

        if descriptor.kind.requires_imaging() && !self.capabilities.imaging {
            return Err(ToolError::DependencyUnavailable {
                tool: name,
                dependency: "screen capture",
            });
        }

        let arguments = descriptor.schema.validate(arguments)?;
        tracing::debug!("Dispatching {}", descriptor.name);

        let desktop = &self.desktop;
        match descriptor.kind {
            ToolKind::MoveTo => input::move_to(desktop, parse(arguments)?)
                .await
                .map(ToolOutput::Message),
            ToolKind::Click => input::click(desktop, parse(arguments)?)
                .await
                .map(ToolOutput::Message),
            ToolKind::TypeText => input::type_text(desktop, parse(arguments)?)
                .await
                .map(ToolOutput::Message),
            ToolKind::PressKey => input::press_key(desktop, parse(arguments)?)
                .await
                .map(ToolOutput::Message),
            ToolKind::PressHotkey => input::press_hotkey(desktop, parse(arguments)?)
                .await
                .map(ToolOutput::Message),
            ToolKind::FindImageOnScreen => {
                find_image::find_image_on_screen(desktop, parse(arguments)?)
                    .await
                    .map(ToolOutput::Location)
            }
            ToolKind::TakeScreenshot => screenshot::take_screenshot(desktop)
                .await
                .map(ToolOutput::Image),
            ToolKind::GetScreenSize => screenshot::get_screen_size(desktop)
                .await
                .map(ToolOutput::ScreenSize),
        }
    }
}
