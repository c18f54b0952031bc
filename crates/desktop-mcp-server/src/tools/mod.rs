//! MCP tool implementations
//!
//! This module contains the adapters that turn validated requests into
//! desktop primitives. The registry routes calls here.

pub mod find_image;
pub mod input;
pub mod screenshot;

use crate::desktop::Desktop;
use desktop_mcp_protocol::ToolError;
use serde_json::json;
use std::sync::Arc;

/// Helper to create a success JSON response
pub fn success_response(message: impl Into<String>) -> String {
    json!({
        "success": true,
        "message": message.into()
    })
    .to_string()
}

/// Run a blocking desktop job on the blocking thread pool
///
/// A panic inside the job is reported through `on_join_error` instead of
/// unwinding into the transport.
pub(crate) async fn run_blocking<T, F>(
    desktop: &Arc<dyn Desktop>,
    on_join_error: fn(String) -> ToolError,
    job: F,
) -> Result<T, ToolError>
where
    F: FnOnce(&dyn Desktop) -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    let desktop = Arc::clone(desktop);
    match tokio::task::spawn_blocking(move || job(desktop.as_ref())).await {
        Ok(result) => result,
        Err(e) => Err(on_join_error(format!("Desktop task failed: {}", e))),
    }
}
