//! Canonical player state and the reducer
//!
//! Every state update flows through [`reduce`]: engine lifecycle events,
//! poll snapshots, host fullscreen changes, and terminal failures. Engine
//! events drive the status transitions; the poll only refines metric
//! fields and never changes status. Once a source reaches a terminal
//! status the reducer absorbs every further input except the host
//! fullscreen mirror.

use log::{debug, info, warn};

use crate::engine::events::playback_error_reason;
use crate::engine::{EngineEvent, EngineState};
use crate::player::{FailureKind, PlaybackFailure, PlayerSignal, PlayerStatus, Snapshot};
use crate::utils::clamp;

/// Canonical playback state, owned by the synchronizer
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Current playback status
    pub status: PlayerStatus,

    /// Playback position in seconds
    pub current_time: f64,

    /// Media duration in seconds; 0.0 while unknown
    pub duration: f64,

    /// Buffered position in seconds
    pub buffered_time: f64,

    /// Volume level (0 to 100)
    pub volume: u32,

    /// Muted state
    pub muted: bool,

    /// Playback rate multiplier
    pub playback_rate: f64,

    /// Fullscreen state; mirrors the host surface only
    pub fullscreen: bool,

    /// Terminal failure, set when status is `Error`
    pub failure: Option<PlaybackFailure>,
}

impl PlayerState {
    /// Fresh state for a new source
    pub fn new(initial_volume: u32) -> Self {
        Self {
            status: PlayerStatus::Idle,
            current_time: 0.0,
            duration: 0.0,
            buffered_time: 0.0,
            volume: clamp(initial_volume, 0, 100),
            muted: false,
            playback_rate: 1.0,
            fullscreen: false,
            failure: None,
        }
    }

    /// Message of the terminal failure, when one occurred
    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(70)
    }
}

/// Inputs feeding the reducer, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SyncInput {
    /// Mount began: the runtime load or player creation is in flight
    LoadStarted,

    /// A mapped engine lifecycle event
    Engine(EngineEvent),

    /// A poll-cycle metric snapshot
    Poll(Snapshot),

    /// The host's fullscreen element changed
    FullscreenChanged(bool),

    /// A rate command was accepted by the engine
    RateChanged(f64),

    /// A terminal failure outside the engine event stream
    Fatal(PlaybackFailure),
}

/// Apply one input to the state, returning the signals to dispatch
pub fn reduce(state: &mut PlayerState, input: SyncInput) -> Vec<PlayerSignal> {
    let mut signals = Vec::new();

    match input {
        // The fullscreen mirror tracks the host in every status,
        // terminal ones included
        SyncInput::FullscreenChanged(fullscreen) => {
            if state.fullscreen != fullscreen {
                state.fullscreen = fullscreen;
                debug!("Fullscreen mirrored to {}", fullscreen);
            }
        }
        _ if state.status.is_terminal() => {
            debug!("Absorbing {:?} in terminal status {}", input, state.status);
        }
        SyncInput::LoadStarted => {
            if state.status == PlayerStatus::Idle {
                transition(state, PlayerStatus::Loading);
            }
        }
        SyncInput::Engine(event) => reduce_engine_event(state, event, &mut signals),
        SyncInput::Poll(snapshot) => apply_snapshot(state, &snapshot, &mut signals),
        SyncInput::RateChanged(rate) => {
            if rate.is_finite() && rate > 0.0 {
                state.playback_rate = rate;
            } else {
                warn!("Ignoring invalid playback rate {}", rate);
            }
        }
        SyncInput::Fatal(failure) => enter_error(state, failure),
    }

    signals
}

fn reduce_engine_event(state: &mut PlayerState, event: EngineEvent, signals: &mut Vec<PlayerSignal>) {
    match event {
        EngineEvent::Ready => {
            if state.status == PlayerStatus::Loading {
                transition(state, PlayerStatus::Ready);
            } else {
                debug!("Ready event in status {}, ignoring", state.status);
            }
        }
        EngineEvent::StateChanged(engine_state) => {
            reduce_engine_state(state, engine_state, signals);
        }
        EngineEvent::Error(code) => {
            let failure = PlaybackFailure::new(
                FailureKind::Playback { code },
                format!("Playback error {}: {}", code, playback_error_reason(code)),
            );
            enter_error(state, failure);
        }
    }
}

fn reduce_engine_state(
    state: &mut PlayerState,
    engine_state: EngineState,
    signals: &mut Vec<PlayerSignal>,
) {
    let prev = state.status;
    let next = match engine_state {
        // The player exists but nothing happened yet
        EngineState::Unstarted => {
            debug!("Unstarted report in status {}, ignoring", prev);
            return;
        }
        // Media cued without autoplay: paused at the start
        EngineState::Cued => {
            if prev == PlayerStatus::Ready {
                PlayerStatus::Paused
            } else {
                debug!("Cued report in status {}, ignoring", prev);
                return;
            }
        }
        EngineState::Playing => {
            if matches!(prev, PlayerStatus::Ready | PlayerStatus::Paused | PlayerStatus::Buffering) {
                PlayerStatus::Playing
            } else if prev == PlayerStatus::Playing {
                return;
            } else {
                debug!("Playing report in status {}, ignoring", prev);
                return;
            }
        }
        EngineState::Paused => {
            if matches!(prev, PlayerStatus::Ready | PlayerStatus::Playing | PlayerStatus::Buffering) {
                PlayerStatus::Paused
            } else if prev == PlayerStatus::Paused {
                return;
            } else {
                debug!("Paused report in status {}, ignoring", prev);
                return;
            }
        }
        EngineState::Buffering => {
            if prev == PlayerStatus::Playing {
                PlayerStatus::Buffering
            } else {
                debug!("Buffering report in status {}, ignoring", prev);
                return;
            }
        }
        EngineState::Ended => {
            if matches!(prev, PlayerStatus::Playing | PlayerStatus::Paused | PlayerStatus::Buffering) {
                PlayerStatus::Ended
            } else {
                debug!("Ended report in status {}, ignoring", prev);
                return;
            }
        }
    };

    transition(state, next);

    match next {
        PlayerStatus::Playing => signals.push(PlayerSignal::Played),
        PlayerStatus::Paused => {
            // A pause out of active playback is user-visible; the initial
            // cued report is not
            if matches!(prev, PlayerStatus::Playing | PlayerStatus::Buffering) {
                signals.push(PlayerSignal::Paused);
            }
        }
        PlayerStatus::Ended => {
            if state.duration > 0.0 {
                state.current_time = state.duration;
            }
            signals.push(PlayerSignal::Ended);
        }
        _ => {}
    }
}

/// Refine metric fields from a poll snapshot; status never changes here
fn apply_snapshot(state: &mut PlayerState, snapshot: &Snapshot, signals: &mut Vec<PlayerSignal>) {
    if snapshot.duration.is_finite() && snapshot.duration > 0.0 {
        state.duration = snapshot.duration;
    }

    let candidate = if snapshot.current_time.is_finite() {
        snapshot.current_time.max(0.0)
    } else {
        state.current_time
    };
    let clamped = if state.duration > 0.0 {
        clamp(candidate, 0.0, state.duration)
    } else {
        candidate
    };
    let moved = (clamped - state.current_time).abs() > f64::EPSILON;
    state.current_time = clamped;

    let buffered = if snapshot.buffered_fraction.is_finite() {
        clamp(snapshot.buffered_fraction, 0.0, 1.0) * state.duration
    } else {
        state.buffered_time
    };
    state.buffered_time = buffered;

    state.volume = clamp(snapshot.volume, 0, 100);
    state.muted = snapshot.muted;

    if moved && state.status == PlayerStatus::Playing {
        signals.push(PlayerSignal::TimeUpdate(state.current_time));
    }
}

fn enter_error(state: &mut PlayerState, failure: PlaybackFailure) {
    warn!("Playback failed: {}", failure.message);
    state.failure = Some(failure);
    transition(state, PlayerStatus::Error);
}

fn transition(state: &mut PlayerState, next: PlayerStatus) {
    info!("Player status changed: {} -> {}", state.status, next);
    state.status = next;
}
