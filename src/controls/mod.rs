//! Custom playback controls for EmbedPlayer
//!
//! This module provides the overlay rendered on top of the embedded
//! player and the auto-hide policy governing its visibility. The overlay
//! itself is pure presentation: it turns the current player state into a
//! positioned scene and answers hit-tests, while all effects flow through
//! [`ControlIntent`] values handled by the playback session.

pub mod autohide;
pub mod overlay;

pub use autohide::AutoHideTimer;
pub use overlay::{ControlHit, ElementKind, OverlayElement, OverlayScene, Rect};

use crate::host::{Key, KeyModifiers};
use crate::utils::PlayerConfig;

/// A user-requested playback action, independent of the input that
/// produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlIntent {
    /// Toggle between playing and paused
    TogglePlay,

    /// Seek to an absolute position in seconds
    SeekTo(f64),

    /// Seek relative to the current position
    SeekBy(f64),

    /// Seek to a fraction of the media duration (0.0 - 1.0)
    SeekToFraction(f64),

    /// Set the volume percentage
    SetVolume(i64),

    /// Adjust the volume relative to the current level
    AdjustVolume(i64),

    /// Toggle muted state
    ToggleMute,

    /// Set an explicit playback rate
    SetRate(f64),

    /// Step through the configured playback rates
    StepRate(i32),

    /// Toggle fullscreen through the host surface
    ToggleFullscreen,

    /// Leave fullscreen if active
    ExitFullscreen,

    /// Tear the player down and mount it again
    Reload,
}

/// Map a key press to a control intent
///
/// Returns `None` for keys the player does not handle so the host can
/// keep its own bindings working.
pub fn intent_for_key(
    key: &Key,
    modifiers: &KeyModifiers,
    config: &PlayerConfig,
) -> Option<ControlIntent> {
    // Chorded keys belong to the host
    if modifiers.ctrl || modifiers.alt || modifiers.meta {
        return None;
    }

    let intent = match key {
        Key::Space | Key::Enter => ControlIntent::TogglePlay,
        Key::Left => ControlIntent::SeekBy(-config.seek_step_secs),
        Key::Right => ControlIntent::SeekBy(config.seek_step_secs),
        Key::Up => ControlIntent::AdjustVolume(config.volume_step as i64),
        Key::Down => ControlIntent::AdjustVolume(-(config.volume_step as i64)),
        Key::M => ControlIntent::ToggleMute,
        Key::F => ControlIntent::ToggleFullscreen,
        Key::Escape => ControlIntent::ExitFullscreen,
        Key::Home => ControlIntent::SeekToFraction(0.0),
        Key::End => ControlIntent::SeekToFraction(1.0),
        Key::Minus => ControlIntent::StepRate(-1),
        Key::Plus => ControlIntent::StepRate(1),
        Key::Num0 => ControlIntent::SeekToFraction(0.0),
        Key::Num1 => ControlIntent::SeekToFraction(0.1),
        Key::Num2 => ControlIntent::SeekToFraction(0.2),
        Key::Num3 => ControlIntent::SeekToFraction(0.3),
        Key::Num4 => ControlIntent::SeekToFraction(0.4),
        Key::Num5 => ControlIntent::SeekToFraction(0.5),
        Key::Num6 => ControlIntent::SeekToFraction(0.6),
        Key::Num7 => ControlIntent::SeekToFraction(0.7),
        Key::Num8 => ControlIntent::SeekToFraction(0.8),
        Key::Num9 => ControlIntent::SeekToFraction(0.9),
        _ => return None,
    };
    Some(intent)
}

/// Pick the next playback rate from the configured list
///
/// The current rate snaps to the closest configured entry before
/// stepping; steps past either end stay on the end rate.
pub fn step_rate(rates: &[f64], current: f64, step: i32) -> Option<f64> {
    if rates.is_empty() {
        return None;
    }

    let mut index = 0;
    let mut best = f64::MAX;
    for (i, rate) in rates.iter().enumerate() {
        let distance = (rate - current).abs();
        if distance < best {
            best = distance;
            index = i;
        }
    }

    let stepped = (index as i64 + step as i64).clamp(0, rates.len() as i64 - 1) as usize;
    Some(rates[stepped])
}
