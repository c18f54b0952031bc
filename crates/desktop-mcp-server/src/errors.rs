//! Error types for the platform seam
//!
//! Adapters convert these into caller-facing [`ToolError`]s at their boundary.

use desktop_mcp_protocol::ToolError;
use thiserror::Error;

/// Errors that can occur while talking to the desktop
#[derive(Debug, Error)]
pub enum DesktopError {
    /// Failed to open a connection to the input system
    #[error("Failed to connect to the input system: {0}")]
    Connection(String),

    /// An input primitive was rejected by the platform
    #[error("Input rejected by the platform: {0}")]
    Input(String),

    /// No monitor was reported by the capture backend
    #[error("No monitors found")]
    NoMonitor,

    /// The capture backend failed
    #[error("Screen capture failed: {0}")]
    Capture(String),
}

impl DesktopError {
    pub fn connection(e: impl std::fmt::Display) -> Self {
        Self::Connection(e.to_string())
    }

    pub fn input(e: impl std::fmt::Display) -> Self {
        Self::Input(e.to_string())
    }

    pub fn capture(e: impl std::fmt::Display) -> Self {
        Self::Capture(e.to_string())
    }

    /// Wrap as an ActionFailed error with context
    pub fn into_action_failed(self, context: impl std::fmt::Display) -> ToolError {
        ToolError::ActionFailed(format!("{}: {}", context, self))
    }

    /// Wrap as a CaptureFailed error with context
    pub fn into_capture_failed(self, context: impl std::fmt::Display) -> ToolError {
        ToolError::CaptureFailed(format!("{}: {}", context, self))
    }
}
