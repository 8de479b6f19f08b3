//! Imperative command surface over the embedded player
//!
//! The controller owns at most one live player handle. Commands are
//! best-effort: they no-op without a live handle, bounded inputs are
//! clamped before dispatch, and engine command failures are logged
//! rather than surfaced. The metric poll is the one fallible read path.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};

use crate::engine::{EmbedEngine, EmbedOptions, EmbeddedPlayer, EventSink};
use crate::host::ContainerHandle;
use crate::player::Snapshot;
use crate::source::ResolvedSource;
use crate::utils::clamp;
use crate::utils::error::{EmbedPlayerError, Result};

static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to one live embedded player
pub struct PlayerHandle {
    id: u64,
    player: Box<dyn EmbeddedPlayer>,
}

impl PlayerHandle {
    /// Process-unique id of this player instance
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle").field("id", &self.id).finish()
    }
}

/// Command surface for a single embedded player
pub struct PlayerController {
    engine: std::sync::Arc<dyn EmbedEngine>,
    handle: Option<PlayerHandle>,
    last_snapshot: Snapshot,
}

impl PlayerController {
    pub fn new(engine: std::sync::Arc<dyn EmbedEngine>) -> Self {
        Self {
            engine,
            handle: None,
            last_snapshot: Snapshot::default(),
        }
    }

    /// Create the embedded player inside the given container
    ///
    /// Any previous handle is destroyed first; the controller never
    /// holds more than one live player.
    pub async fn create(
        &mut self,
        container: &ContainerHandle,
        source: &ResolvedSource,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<u64> {
        if self.handle.is_some() {
            debug!("Replacing live player before create");
            self.destroy();
        }

        let player = self
            .engine
            .create_player(container, source, options, events)
            .await?;
        let id = NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed);
        info!("Created player {} for {}", id, source);

        self.handle = Some(PlayerHandle { id, player });
        self.last_snapshot = Snapshot {
            volume: clamp(options.initial_volume, 0, 100),
            ..Snapshot::default()
        };
        Ok(id)
    }

    /// Destroy the live player, if any; safe to call repeatedly
    pub fn destroy(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!("Destroying player {}", handle.id);
            handle.player.destroy();
        }
    }

    pub fn has_player(&self) -> bool {
        self.handle.is_some()
    }

    /// Id of the live player, if one exists
    pub fn player_id(&self) -> Option<u64> {
        self.handle.as_ref().map(|h| h.id)
    }

    pub fn play(&mut self) {
        self.command("play", |p| p.play());
    }

    pub fn pause(&mut self) {
        self.command("pause", |p| p.pause());
    }

    /// Seek to an absolute position, clamped into the known media range
    ///
    /// While the duration is still unknown only the lower bound applies.
    pub fn seek_to(&mut self, position: f64) {
        let target = clamp_position(position, self.last_snapshot.duration);
        self.last_snapshot.current_time = target;
        self.command("seek", |p| p.seek_to(target));
    }

    /// Seek relative to the last known position
    pub fn seek_by(&mut self, delta: f64) {
        self.seek_to(self.last_snapshot.current_time + delta);
    }

    /// Set the volume percentage, clamped to 0 - 100
    pub fn set_volume(&mut self, volume: i64) {
        let level = clamp_volume(volume);
        self.last_snapshot.volume = level;
        self.command("set_volume", |p| p.set_volume(level));
    }

    /// Adjust the volume relative to the last known level
    pub fn adjust_volume(&mut self, delta: i64) {
        self.set_volume(self.last_snapshot.volume as i64 + delta);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.last_snapshot.muted = muted;
        if muted {
            self.command("mute", |p| p.mute());
        } else {
            self.command("unmute", |p| p.unmute());
        }
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.last_snapshot.muted);
    }

    /// Request a playback rate change; returns whether it was dispatched
    pub fn set_playback_rate(&mut self, rate: f64) -> bool {
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring invalid playback rate {}", rate);
            return false;
        }
        if self.handle.is_none() {
            debug!("Ignoring set_playback_rate command without a live player");
            return false;
        }
        self.command("set_playback_rate", |p| p.set_playback_rate(rate));
        true
    }

    /// Best-effort metric read; fields that fail keep their last value
    pub fn snapshot(&mut self) -> Snapshot {
        let Some(handle) = self.handle.as_ref() else {
            return self.last_snapshot;
        };
        let player = handle.player.as_ref();
        let mut snap = self.last_snapshot;

        if let Ok(time) = player.current_time() {
            snap.current_time = time;
        }
        if let Ok(duration) = player.duration() {
            snap.duration = duration;
        }
        if let Ok(volume) = player.volume() {
            snap.volume = volume;
        }
        if let Ok(muted) = player.is_muted() {
            snap.muted = muted;
        }
        if let Ok(buffered) = player.buffered_fraction() {
            snap.buffered_fraction = buffered;
        }

        self.last_snapshot = snap;
        snap
    }

    /// Full metric read for a poll cycle; any failed field fails the cycle
    pub fn poll_metrics(&mut self) -> Result<Snapshot> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| EmbedPlayerError::Sync("No live player to poll".to_string()))?;
        let player = handle.player.as_ref();

        let snap = Snapshot {
            current_time: player.current_time()?,
            duration: player.duration()?,
            volume: player.volume()?,
            muted: player.is_muted()?,
            buffered_fraction: player.buffered_fraction()?,
        };
        self.last_snapshot = snap;
        Ok(snap)
    }

    /// Most recent metrics without touching the engine
    pub fn last_snapshot(&self) -> Snapshot {
        self.last_snapshot
    }

    fn command<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(&mut dyn EmbeddedPlayer) -> Result<()>,
    {
        let Some(handle) = self.handle.as_mut() else {
            debug!("Ignoring {} command without a live player", name);
            return;
        };
        if let Err(e) = f(handle.player.as_mut()) {
            warn!("Command {} on player {} failed: {}", name, handle.id, e);
        }
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Clamp a seek target into the known media range
fn clamp_position(position: f64, known_duration: f64) -> f64 {
    let low = if position.is_finite() { position.max(0.0) } else { 0.0 };
    if known_duration > 0.0 {
        low.min(known_duration)
    } else {
        low
    }
}

/// Clamp a volume command to the 0 - 100 percentage range
fn clamp_volume(volume: i64) -> u32 {
    clamp(volume, 0, 100) as u32
}
