//! Raw engine callback mapping
//!
//! Provider runtimes report lifecycle through loosely-typed callbacks: a
//! name plus an optional numeric payload. This module converts those raw
//! callbacks into the closed [`EngineEvent`] type at the boundary, so the
//! state reducer only ever sees known variants. Unknown names and codes
//! are logged and dropped here.

use log::{debug, warn};

/// Raw callback event as delivered by a provider runtime binding
#[derive(Debug, Clone, PartialEq)]
pub struct RawEngineEvent {
    /// Callback name, e.g. "ready", "statechange", "error"
    pub name: String,

    /// Numeric payload for callbacks that carry one
    pub data: Option<i64>,
}

impl RawEngineEvent {
    /// The ready callback: the player accepted its container and commands
    pub fn ready() -> Self {
        Self {
            name: "ready".to_string(),
            data: None,
        }
    }

    /// A state-change callback with the provider's numeric state code
    pub fn state_change(code: i64) -> Self {
        Self {
            name: "statechange".to_string(),
            data: Some(code),
        }
    }

    /// An error callback with the provider's numeric error code
    pub fn error(code: i64) -> Self {
        Self {
            name: "error".to_string(),
            data: Some(code),
        }
    }
}

/// Playback states reported by the provider runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Player exists but playback has not started
    Unstarted,

    /// Media finished
    Ended,

    /// Actively playing
    Playing,

    /// Paused by a command or native control
    Paused,

    /// Stalled waiting for data
    Buffering,

    /// Media loaded and cued, not yet started
    Cued,
}

impl EngineState {
    /// Map a provider state code to a known state
    ///
    /// Uses the numeric scheme shared by the iframe-style provider APIs:
    /// -1 unstarted, 0 ended, 1 playing, 2 paused, 3 buffering, 5 cued.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(EngineState::Unstarted),
            0 => Some(EngineState::Ended),
            1 => Some(EngineState::Playing),
            2 => Some(EngineState::Paused),
            3 => Some(EngineState::Buffering),
            5 => Some(EngineState::Cued),
            _ => None,
        }
    }

    /// The provider's numeric code for this state
    pub fn code(&self) -> i64 {
        match self {
            EngineState::Unstarted => -1,
            EngineState::Ended => 0,
            EngineState::Playing => 1,
            EngineState::Paused => 2,
            EngineState::Buffering => 3,
            EngineState::Cued => 5,
        }
    }
}

/// Lifecycle events after boundary mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The player is ready for commands
    Ready,

    /// The player moved to a new playback state
    StateChanged(EngineState),

    /// The player reported a playback error code
    Error(u32),
}

/// Convert a raw callback into a closed engine event
///
/// Callback names are matched case-insensitively with an optional "on"
/// prefix, so "onStateChange" and "statechange" are equivalent. Unknown
/// names, unknown state codes, and malformed payloads yield `None`.
pub fn map_raw_event(raw: &RawEngineEvent) -> Option<EngineEvent> {
    let name = raw.name.trim().to_ascii_lowercase();
    let name = name.strip_prefix("on").unwrap_or(&name);

    match name {
        "ready" => Some(EngineEvent::Ready),
        "statechange" => {
            let code = match raw.data {
                Some(code) => code,
                None => {
                    warn!("State-change callback without a state code, dropping");
                    return None;
                }
            };
            match EngineState::from_code(code) {
                Some(state) => Some(EngineEvent::StateChanged(state)),
                None => {
                    debug!("Ignoring unknown engine state code {}", code);
                    None
                }
            }
        }
        "error" => {
            let code = match raw.data {
                Some(code) if code >= 0 => code as u32,
                _ => {
                    warn!("Error callback without a usable code, dropping");
                    return None;
                }
            };
            Some(EngineEvent::Error(code))
        }
        _ => {
            debug!("Ignoring unknown engine callback {:?}", raw.name);
            None
        }
    }
}

/// Human-readable reason for a provider playback error code
///
/// Known codes follow the iframe-style provider APIs; anything else gets
/// a generic reason. The code itself is always part of the surfaced
/// message so support can trace it.
pub fn playback_error_reason(code: u32) -> &'static str {
    match code {
        2 => "the request contained an invalid parameter",
        5 => "the media cannot be played in this player",
        100 => "the video was not found or is private",
        101 | 150 => "the video owner does not allow embedded playback",
        _ => "the provider reported an unrecognized playback error",
    }
}
