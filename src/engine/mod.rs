//! Engine module for EmbedPlayer
//!
//! This module defines the boundary to the externally-hosted player
//! runtime. The runtime is opaque: it renders into a host-supplied
//! container, accepts imperative commands, and reports lifecycle through
//! raw callback events. Everything provider-specific lives behind the
//! [`EmbedEngine`] and [`EmbeddedPlayer`] traits; raw callback payloads
//! are mapped into closed event types in [`events`] before any player
//! logic sees them.

pub mod events;
pub mod sim;

pub use events::{EngineEvent, EngineState, RawEngineEvent};
pub use sim::{ScriptedFetcher, SimProbe, SimScript, SimulatedEngine};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::host::ContainerHandle;
use crate::source::{ProviderKind, ResolvedSource};
use crate::utils::error::Result;

/// Channel end the engine uses to deliver raw callback events
pub type EventSink = mpsc::UnboundedSender<RawEngineEvent>;

/// Embed-time options passed to the external player constructor
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOptions {
    /// Begin playback as soon as the player is ready
    pub autoplay: bool,

    /// Show the provider's native control chrome
    pub native_controls: bool,

    /// Leave the provider's native keyboard shortcuts enabled
    pub keyboard: bool,

    /// Allow the provider's related-content overlays
    pub related_overlays: bool,

    /// Initial volume (0 - 100)
    pub initial_volume: u32,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self::chromeless()
    }
}

impl EmbedOptions {
    /// Options for the custom-controls mode: every piece of native chrome off
    pub fn chromeless() -> Self {
        Self {
            autoplay: false,
            native_controls: false,
            keyboard: false,
            related_overlays: false,
            initial_volume: 70,
        }
    }

    /// Options for the native-chrome fallback mode
    pub fn native_chrome() -> Self {
        Self {
            autoplay: false,
            native_controls: true,
            keyboard: true,
            related_overlays: false,
            initial_volume: 70,
        }
    }
}

/// Engine trait defining the interface to a provider runtime
///
/// One engine instance represents one loaded provider runtime. Engines are
/// shared process-wide behind an `Arc` once the loader reports readiness.
#[async_trait]
pub trait EmbedEngine: Send + Sync {
    /// Whether this runtime can play media from the given provider
    fn supports(&self, provider: ProviderKind) -> bool;

    /// Create an embedded player bound to a container
    ///
    /// # Arguments
    ///
    /// * `container` - Attached container the player renders into
    /// * `source` - Resolved media to load
    /// * `options` - Embed-time options (autoplay, chrome flags)
    /// * `events` - Sink receiving the player's raw callback events
    ///
    /// # Returns
    ///
    /// Returns the live player instance, or `PlayerCreation` when the
    /// container is detached or the external constructor fails
    async fn create_player(
        &self,
        container: &ContainerHandle,
        source: &ResolvedSource,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn EmbeddedPlayer>>;
}

/// One live external player instance
///
/// Commands are imperative and fire-and-forget; reads are synchronous
/// best-effort queries against the runtime bridge. Callers do not see this
/// trait directly: `PlayerController` owns the instance and guards every
/// call against the player lifecycle.
pub trait EmbeddedPlayer: Send + Sync {
    /// Begin or resume playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Seek to a position in seconds
    ///
    /// # Arguments
    ///
    /// * `seconds` - Target position; already clamped by the controller
    fn seek_to(&self, seconds: f64) -> Result<()>;

    /// Set the volume as a percentage (0 - 100)
    fn set_volume(&self, percent: u32) -> Result<()>;

    /// Mute audio without changing the stored volume
    fn mute(&self) -> Result<()>;

    /// Restore audio at the stored volume
    fn unmute(&self) -> Result<()>;

    /// Set the playback rate multiplier
    fn set_playback_rate(&self, rate: f64) -> Result<()>;

    /// Current playback position in seconds
    fn current_time(&self) -> Result<f64>;

    /// Media duration in seconds
    fn duration(&self) -> Result<f64>;

    /// Current volume percentage (0 - 100)
    fn volume(&self) -> Result<u32>;

    /// Whether audio is muted
    fn is_muted(&self) -> Result<bool>;

    /// Fraction of the media buffered so far (0.0 - 1.0)
    fn buffered_fraction(&self) -> Result<f64>;

    /// Release the underlying native player
    ///
    /// Safe to call more than once; later calls are no-ops.
    fn destroy(&mut self);
}
