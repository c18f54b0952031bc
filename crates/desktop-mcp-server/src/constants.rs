//! Constants used throughout the MCP server
//!
//! This module centralizes magic numbers for better maintainability.

/// Default listen address for the HTTP transport
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port for the HTTP transport
pub const DEFAULT_PORT: u16 = 8792;

/// Path the MCP endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

/// Default confidence for `find_image_on_screen`
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Size (in pixels) each side of a reference image is reduced towards on the coarse level
pub const COARSE_MIN_SIDE: u32 = 12;

/// Upper bound on the pyramid downsampling factor
pub const MAX_PYRAMID_FACTOR: u32 = 8;

/// Coarse placements re-scored at full resolution (more on ties)
pub const REFINE_CANDIDATES: usize = 16;
