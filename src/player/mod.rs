//! Player module for EmbedPlayer
//!
//! This module owns the playback control core: the controller wrapping
//! the one live embedded-player instance, the canonical state plus the
//! reducer every update flows through, the synchronizer task reconciling
//! engine events with the metric poll, and the outward component tying
//! it all together.

pub mod controller;
pub mod state;
pub mod sync;
pub mod video_player;

pub use controller::{PlayerController, PlayerHandle};
pub use state::{PlayerState, SyncInput, reduce};
pub use video_player::{PlayerCallbacks, PlayerProps, VideoPlayer, VideoPlayerBuilder};

use crate::utils::error::EmbedPlayerError;

/// Playback status of the player component
///
/// Exactly one status holds at any instant. `Ended` and `Error` are
/// terminal for the current source; a new source starts over at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Nothing mounted yet
    Idle,

    /// Runtime loading or player creation in progress
    Loading,

    /// Player created and ready for commands
    Ready,

    /// Actively playing
    Playing,

    /// Paused
    Paused,

    /// Stalled waiting for data
    Buffering,

    /// Media finished
    Ended,

    /// A terminal failure occurred
    Error,
}

impl PlayerStatus {
    /// Whether this status ends the current source
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerStatus::Ended | PlayerStatus::Error)
    }

    /// Whether the metric poll should run in this status
    pub fn should_poll(&self) -> bool {
        matches!(self, PlayerStatus::Playing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Idle => "idle",
            PlayerStatus::Loading => "loading",
            PlayerStatus::Ready => "ready",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
            PlayerStatus::Buffering => "buffering",
            PlayerStatus::Ended => "ended",
            PlayerStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of terminal failure put the player into `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No provider URL shape matched the source
    UnresolvedSource,

    /// The provider runtime could not be fetched
    ScriptLoad,

    /// The external player could not be created
    PlayerCreation,

    /// The engine reported a playback error code
    Playback { code: u32 },
}

impl FailureKind {
    /// Whether the overlay should offer a user-triggered reload
    ///
    /// Unresolved sources stay unresolved and playback errors are owned
    /// by the provider, so only the load and creation failures retry.
    pub fn offers_reload(&self) -> bool {
        matches!(self, FailureKind::ScriptLoad | FailureKind::PlayerCreation)
    }
}

/// Terminal failure carried by [`PlayerState`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackFailure {
    /// Failure classification
    pub kind: FailureKind,

    /// Message surfaced to the user; always includes the provider code
    /// for playback errors
    pub message: String,
}

impl PlaybackFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a terminal error; `None` for transient kinds that never
    /// surface through state
    pub fn from_error(error: &EmbedPlayerError) -> Option<Self> {
        let kind = match error {
            EmbedPlayerError::UnresolvedSource(_) => FailureKind::UnresolvedSource,
            EmbedPlayerError::ScriptLoad(_) => FailureKind::ScriptLoad,
            EmbedPlayerError::PlayerCreation(_) => FailureKind::PlayerCreation,
            EmbedPlayerError::Playback { code, .. } => FailureKind::Playback { code: *code },
            _ => return None,
        };
        Some(Self::new(kind, error.to_string()))
    }
}

/// Best-effort metric read from the embedded player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Playback position in seconds
    pub current_time: f64,

    /// Media duration in seconds; 0.0 while unknown
    pub duration: f64,

    /// Volume percentage (0 - 100)
    pub volume: u32,

    /// Whether audio is muted
    pub muted: bool,

    /// Fraction of the media buffered (0.0 - 1.0)
    pub buffered_fraction: f64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            volume: 0,
            muted: false,
            buffered_fraction: 0.0,
        }
    }
}

impl Snapshot {
    /// Buffered position in seconds
    pub fn buffered_time(&self) -> f64 {
        self.buffered_fraction * self.duration
    }
}

/// Signals the reducer emits for the callback dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerSignal {
    /// Playback started or resumed
    Played,

    /// Playback paused
    Paused,

    /// Media finished; emitted at most once per source
    Ended,

    /// The playback position advanced to this many seconds
    TimeUpdate(f64),
}
