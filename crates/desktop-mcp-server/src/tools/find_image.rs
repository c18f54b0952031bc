//! Image search tool implementation

use super::run_blocking;
use crate::desktop::Desktop;
use crate::matcher;
use crate::requests::FindImageRequest;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use desktop_mcp_protocol::{MatchResult, ToolError};
use image::{GrayImage, imageops};
use std::sync::Arc;

const PARAM: &str = "image_data_base64";

/// Standard alphabet, padding optional
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Locate a reference image on the primary screen
pub async fn find_image_on_screen(
    desktop: &Arc<dyn Desktop>,
    request: FindImageRequest,
) -> Result<MatchResult, ToolError> {
    let FindImageRequest {
        image_data_base64,
        confidence,
    } = request;

    run_blocking(desktop, ToolError::MatchFailed, move |desktop| {
        let bytes = decode_base64(&image_data_base64)?;
        let needle = decode_reference(&bytes)?;

        let frame = desktop.capture().map_err(|e| {
            ToolError::MatchFailed(format!("Failed to capture screen for matching: {}", e))
        })?;
        let haystack = imageops::grayscale(&frame);

        let found = matcher::locate(&haystack, &needle, confidence);
        match &found {
            Some(m) => tracing::debug!(
                "Reference {}x{} matched at ({}, {}) with score {:.4}",
                m.width,
                m.height,
                m.left,
                m.top,
                m.score
            ),
            None => tracing::debug!(
                "Reference {}x{} not found (confidence {})",
                needle.width(),
                needle.height(),
                confidence
            ),
        }
        Ok(found.map(|m| m.center()))
    })
    .await
}

/// Decode base64 text, tolerating whitespace, missing padding and a data URI prefix
pub fn decode_base64(text: &str) -> Result<Vec<u8>, ToolError> {
    let payload = match text.trim_start().strip_prefix("data:") {
        Some(uri) => match uri.split_once(',') {
            Some((header, data)) if header.ends_with(";base64") => data,
            _ => {
                return Err(ToolError::invalid_argument(
                    PARAM,
                    "data URI must use base64 encoding",
                ));
            }
        },
        None => text,
    };

    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(ToolError::invalid_argument(PARAM, "image data is empty"));
    }

    LENIENT
        .decode(cleaned.as_bytes())
        .map_err(|e| ToolError::invalid_argument(PARAM, format!("invalid base64: {}", e)))
}

/// Decode image bytes into a grayscale reference
pub fn decode_reference(bytes: &[u8]) -> Result<GrayImage, ToolError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ToolError::invalid_argument(PARAM, format!("cannot decode image: {}", e)))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ToolError::invalid_argument(PARAM, "image has no pixels"));
    }
    Ok(image.to_luma8())
}
