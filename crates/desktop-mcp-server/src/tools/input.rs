//! Input tool implementations (move_to, click, type_text, press_key, press_hotkey)

use super::{run_blocking, success_response};
use crate::desktop::{Desktop, Direction, InputSession};
use crate::errors::DesktopError;
use crate::requests::{
    ClickRequest, MoveToRequest, PressHotkeyRequest, PressKeyRequest, TypeTextRequest,
};
use desktop_mcp_protocol::{Key, ToolError};
use std::sync::Arc;
use std::time::Duration;

/// Open an input session and run `action` on it
pub(crate) fn perform<T>(
    desktop: &dyn Desktop,
    action: impl FnOnce(&mut dyn InputSession) -> Result<T, DesktopError>,
) -> Result<T, DesktopError> {
    let mut session = desktop.input()?;
    action(session.as_mut())
}

/// Move the mouse cursor to the given screen coordinates
pub async fn move_to(
    desktop: &Arc<dyn Desktop>,
    request: MoveToRequest,
) -> Result<String, ToolError> {
    let MoveToRequest { x, y } = request;
    run_blocking(desktop, ToolError::ActionFailed, move |desktop| {
        perform(desktop, |session| session.move_mouse(x, y))
            .map_err(|e| e.into_action_failed(format!("Failed to move mouse to ({}, {})", x, y)))
    })
    .await?;
    Ok(success_response(format!("Moved mouse to ({}, {})", x, y)))
}

/// Click at the given coordinates
pub async fn click(desktop: &Arc<dyn Desktop>, request: ClickRequest) -> Result<String, ToolError> {
    let ClickRequest {
        x,
        y,
        button,
        clicks,
    } = request;
    let summary = format!(
        "({}, {}) with {} button, {} times",
        x,
        y,
        button.as_str(),
        clicks
    );

    let context = format!("Failed to click at {}", summary);
    run_blocking(desktop, ToolError::ActionFailed, move |desktop| {
        perform(desktop, |session| {
            session.move_mouse(x, y)?;
            for _ in 0..clicks {
                session.button(button, Direction::Click)?;
            }
            Ok(())
        })
        .map_err(|e| e.into_action_failed(context))
    })
    .await?;
    Ok(success_response(format!("Clicked at {}", summary)))
}

/// Type text, optionally pausing between characters
pub async fn type_text(
    desktop: &Arc<dyn Desktop>,
    request: TypeTextRequest,
) -> Result<String, ToolError> {
    let TypeTextRequest { text, interval } = request;
    let interval = Duration::try_from_secs_f64(interval)
        .map_err(|e| ToolError::invalid_argument("interval", e.to_string()))?;
    let count = text.chars().count();

    run_blocking(desktop, ToolError::ActionFailed, move |desktop| {
        perform(desktop, |session| type_with_interval(session, &text, interval))
            .map_err(|e| e.into_action_failed("Failed to type text"))
    })
    .await?;
    Ok(success_response(format!("Typed {} characters", count)))
}

fn type_with_interval(
    session: &mut dyn InputSession,
    text: &str,
    interval: Duration,
) -> Result<(), DesktopError> {
    if text.is_empty() {
        return Ok(());
    }
    if interval.is_zero() {
        return session.text(text);
    }

    let mut buf = [0u8; 4];
    for (i, c) in text.chars().enumerate() {
        if i > 0 {
            std::thread::sleep(interval);
        }
        session.text(c.encode_utf8(&mut buf))?;
    }
    Ok(())
}

/// Press and release a single key
pub async fn press_key(
    desktop: &Arc<dyn Desktop>,
    request: PressKeyRequest,
) -> Result<String, ToolError> {
    let key = request.key;
    run_blocking(desktop, ToolError::ActionFailed, move |desktop| {
        perform(desktop, |session| session.key(key, Direction::Click))
            .map_err(|e| e.into_action_failed(format!("Failed to press key '{}'", key)))
    })
    .await?;
    Ok(success_response(format!("Pressed key '{}'", key)))
}

/// Press a key combination with all keys held together
pub async fn press_hotkey(
    desktop: &Arc<dyn Desktop>,
    request: PressHotkeyRequest,
) -> Result<String, ToolError> {
    let keys = request.keys;
    let combo = keys
        .iter()
        .map(Key::to_string)
        .collect::<Vec<_>>()
        .join("+");

    let context = format!("Failed to press hotkey combination {}", combo);
    run_blocking(desktop, ToolError::ActionFailed, move |desktop| {
        perform(desktop, |session| hold_combination(session, &keys))
            .map_err(|e| e.into_action_failed(context))
    })
    .await?;
    Ok(success_response(format!("Pressed hotkey {}", combo)))
}

/// Press `keys` in order, then release them in reverse order
///
/// If a press fails, the keys already held are released before returning.
fn hold_combination(session: &mut dyn InputSession, keys: &[Key]) -> Result<(), DesktopError> {
    for (held, key) in keys.iter().enumerate() {
        if let Err(e) = session.key(*key, Direction::Press) {
            release_all(session, &keys[..held]);
            return Err(e);
        }
    }

    let mut result = Ok(());
    for key in keys.iter().rev() {
        if let Err(e) = session.key(*key, Direction::Release) {
            tracing::warn!("Failed to release key '{}': {}", key, e);
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

fn release_all(session: &mut dyn InputSession, keys: &[Key]) {
    for key in keys.iter().rev() {
        if let Err(e) = session.key(*key, Direction::Release) {
            tracing::warn!("Failed to release key '{}' after aborted hotkey: {}", key, e);
        }
    }
}
