//! Host surface module for EmbedPlayer
//!
//! This module abstracts the surface the player mounts into: the container
//! element the external engine renders to, the input events the host
//! forwards, and the host's fullscreen mechanism. Fullscreen state is
//! owned by the host; the player only ever mirrors the host's
//! fullscreen-change notifications.

use tokio::sync::mpsc;

use crate::utils::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Re-export the headless implementation
pub mod headless;
pub use headless::{FullscreenPolicy, HeadlessHost};

/// Channel end the host uses to deliver input and fullscreen events
pub type HostEventSink = mpsc::UnboundedSender<HostEvent>;

/// Host surface trait defining the interface for mount targets
pub trait HostSurface: Send + Sync {
    /// Attach a player session and obtain the render container
    ///
    /// # Arguments
    ///
    /// * `events` - Sink receiving host input and fullscreen events
    ///
    /// # Returns
    ///
    /// Returns a live container handle, or a `Host` error when no
    /// container can be provided
    fn attach(&self, events: HostEventSink) -> Result<ContainerHandle>;

    /// Detach the current container, invalidating outstanding handles
    fn detach(&self);

    /// Ask the host to enter fullscreen on the player's root container
    ///
    /// Success means the request was accepted, not that fullscreen is
    /// active; the host confirms through `HostEvent::FullscreenChanged`.
    fn request_fullscreen(&self) -> Result<()>;

    /// Ask the host to leave fullscreen
    fn exit_fullscreen(&self) -> Result<()>;

    /// Current fullscreen state as the host sees it
    fn is_fullscreen(&self) -> bool;

    /// What kinds of input this host can deliver
    fn input_capabilities(&self) -> InputCapabilities;

    /// Current container size in logical pixels
    fn viewport(&self) -> (f32, f32);
}

/// Handle to the container an embedded player renders into
///
/// The handle stays valid until the host detaches; creating a player
/// against a detached handle fails.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    id: u64,
    attached: Arc<AtomicBool>,
}

impl ContainerHandle {
    /// Create a handle; the host keeps the flag to invalidate it later
    pub fn new(id: u64, attached: Arc<AtomicBool>) -> Self {
        Self { id, attached }
    }

    /// Host-assigned container id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the container is still attached to the host
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// Input and fullscreen events forwarded by the host
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Pointer moved over the player at position
    PointerMoved { x: f32, y: f32 },

    /// Pointer button pressed at position
    PointerPressed { x: f32, y: f32 },

    /// Pointer button released at position
    PointerReleased { x: f32, y: f32 },

    /// Touch tap at position
    TouchTap { x: f32, y: f32 },

    /// Key pressed
    KeyPressed { key: Key, modifiers: KeyModifiers },

    /// The host's fullscreen element changed
    FullscreenChanged(bool),

    /// The container was removed from the host
    ContainerDetached,
}

/// Keyboard key types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    // Media controls
    Space,
    Enter,
    Escape,

    // Navigation
    Left,
    Right,
    Up,
    Down,

    // Seek
    Home,
    End,

    // Playback speed
    Minus,
    Plus,

    // Other
    F,  // Fullscreen
    M,  // Mute

    // Numbers 0-9
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    // Other keys can be added as needed
    Other(String),
}

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,  // Windows/Super/Command key
}

impl Default for KeyModifiers {
    fn default() -> Self {
        Self {
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }
}

/// What kinds of input a host surface can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCapabilities {
    /// Pointer hover is available (desktop-style input)
    pub hover: bool,

    /// Touch input is available
    pub touch: bool,
}

impl Default for InputCapabilities {
    fn default() -> Self {
        Self {
            hover: true,
            touch: false,
        }
    }
}
