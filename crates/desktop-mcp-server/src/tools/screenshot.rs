//! Screenshot tool implementations

use super::input::perform;
use super::run_blocking;
use crate::desktop::Desktop;
use desktop_mcp_protocol::{EncodedImage, ScreenSize, ToolError};
use image::RgbaImage;
use std::io::Cursor;
use std::sync::Arc;

/// Capture the primary screen as PNG
pub async fn take_screenshot(desktop: &Arc<dyn Desktop>) -> Result<EncodedImage, ToolError> {
    run_blocking(desktop, ToolError::CaptureFailed, |desktop| {
        let frame = desktop
            .capture()
            .map_err(|e| e.into_capture_failed("Failed to take screenshot"))?;
        tracing::debug!("Captured {}x{} frame", frame.width(), frame.height());
        encode_png(&frame)
            .map_err(|e| ToolError::CaptureFailed(format!("Failed to encode screenshot: {}", e)))
    })
    .await
}

/// Encode a captured frame losslessly
pub fn encode_png(frame: &RgbaImage) -> Result<EncodedImage, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    frame.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(EncodedImage::png(buffer.into_inner()))
}

/// Report the main display size
pub async fn get_screen_size(desktop: &Arc<dyn Desktop>) -> Result<ScreenSize, ToolError> {
    run_blocking(desktop, ToolError::CaptureFailed, |desktop| {
        perform(desktop, |session| session.main_display())
            .map_err(|e| e.into_capture_failed("Failed to get screen size"))
    })
    .await
}
