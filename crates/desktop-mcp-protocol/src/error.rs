//! Caller-facing error taxonomy
//!
//! Every failed tool call ends as exactly one [`ToolError`], which is
//! rendered to the caller as an [`ErrorSignal`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The small set of error kinds a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Arguments failed schema, constraint or decoding checks
    InvalidArgument,
    /// No tool with the requested name is registered
    UnknownTool,
    /// An input-injection primitive failed
    ActionFailed,
    /// The screen capture primitive failed
    CaptureFailed,
    /// Image search failed for a reason other than "no match"
    MatchFailed,
    /// A collaborator needed by the tool was not available at startup
    DependencyUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownTool => "unknown_tool",
            Self::ActionFailed => "action_failed",
            Self::CaptureFailed => "capture_failed",
            Self::MatchFailed => "match_failed",
            Self::DependencyUnavailable => "dependency_unavailable",
        }
    }
}

/// Errors produced while dispatching a tool call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Invalid argument '{param}': {reason}")]
    InvalidArgument { param: String, reason: String },

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("{0}")]
    ActionFailed(String),

    #[error("{0}")]
    CaptureFailed(String),

    #[error("{0}")]
    MatchFailed(String),

    #[error("{tool} is unavailable: {dependency} could not be initialized at startup")]
    DependencyUnavailable {
        tool: String,
        dependency: &'static str,
    },
}

impl ToolError {
    /// Create an InvalidArgument error
    pub fn invalid_argument(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::ActionFailed(_) => ErrorKind::ActionFailed,
            Self::CaptureFailed(_) => ErrorKind::CaptureFailed,
            Self::MatchFailed(_) => ErrorKind::MatchFailed,
            Self::DependencyUnavailable { .. } => ErrorKind::DependencyUnavailable,
        }
    }

    /// Render this error as the signal returned to the caller
    pub fn to_signal(&self) -> ErrorSignal {
        let param = match self {
            Self::InvalidArgument { param, .. } => Some(param.clone()),
            _ => None,
        };
        ErrorSignal {
            kind: self.kind(),
            message: self.to_string(),
            param,
        }
    }
}

/// Structured error returned to the caller of a failed tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSignal {
    #[serde(rename = "error")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}
