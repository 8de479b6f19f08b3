//! Playback session task
//!
//! One task per mounted player owns the whole session: it resolves the
//! source, waits for the shared runtime, creates the embedded player,
//! then funnels engine events, host input, control intents, and the
//! metric poll through the reducer. The task is also the single place
//! teardown happens: when it returns, polling has already stopped, the
//! overlay timer disarms, and the embedded player is destroyed, in that
//! order, no matter which path ended the session.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::controls::overlay::{self, ControlHit};
use crate::controls::{intent_for_key, step_rate, AutoHideTimer, ControlIntent};
use crate::engine::events::map_raw_event;
use crate::engine::{EmbedOptions, EngineEvent};
use crate::host::{HostEvent, HostSurface};
use crate::loader::EngineLoader;
use crate::player::controller::PlayerController;
use crate::player::state::{reduce, PlayerState, SyncInput};
use crate::player::video_player::PlayerCallbacks;
use crate::player::{FailureKind, PlaybackFailure, PlayerSignal, PlayerStatus, Snapshot};
use crate::source::{resolve, VideoDescriptor};
use crate::utils::error::EmbedPlayerError;
use crate::utils::Config;

/// Overlay interaction state owned by the session
pub(crate) struct UiState {
    pub(crate) timer: AutoHideTimer,

    /// In-progress seek drag, as a fraction of the bar width
    pub(crate) scrub: Option<f64>,
}

/// State shared between the session task and the mounted component
pub(crate) struct SharedSync {
    pub(crate) state: Mutex<PlayerState>,
    pub(crate) ui: Mutex<UiState>,
}

impl SharedSync {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            state: Mutex::new(PlayerState::new(config.player.default_volume)),
            ui: Mutex::new(UiState {
                timer: AutoHideTimer::new(config.hide_delay()),
                scrub: None,
            }),
        }
    }
}

/// Everything a session task needs from the mounting component
pub(crate) struct SessionDeps {
    pub(crate) descriptor: VideoDescriptor,
    pub(crate) autoplay: bool,
    pub(crate) custom_controls: bool,
    pub(crate) config: Config,
    pub(crate) loader: Arc<EngineLoader>,
    pub(crate) host: Arc<dyn HostSurface>,
    pub(crate) shared: Arc<SharedSync>,
    pub(crate) callbacks: Arc<PlayerCallbacks>,
    pub(crate) status_tx: Arc<watch::Sender<PlayerStatus>>,
    pub(crate) intent_rx: mpsc::UnboundedReceiver<ControlIntent>,
    pub(crate) shutdown_rx: watch::Receiver<bool>,
}

/// Run one playback session to completion
pub(crate) async fn run(deps: SessionDeps) {
    let SessionDeps {
        descriptor,
        autoplay,
        custom_controls,
        config,
        loader,
        host,
        shared,
        callbacks,
        status_tx,
        mut intent_rx,
        mut shutdown_rx,
    } = deps;

    let mut session = Session {
        shared,
        callbacks,
        status_tx,
        host,
        config,
        custom_controls,
        status: PlayerStatus::Idle,
        published: PlayerStatus::Idle,
        controller: None,
    };

    drive(
        &mut session,
        descriptor,
        autoplay,
        loader,
        &mut intent_rx,
        &mut shutdown_rx,
    )
    .await;

    // Ordered teardown on every exit path: drive() returning stopped the
    // poll, then the overlay timer disarms, then the player is destroyed.
    session.shared.ui.lock().timer.disarm();
    if let Some(mut controller) = session.controller.take() {
        controller.destroy();
    }
    debug!("Session teardown complete");
}

async fn drive(
    session: &mut Session,
    descriptor: VideoDescriptor,
    autoplay: bool,
    loader: Arc<EngineLoader>,
    intent_rx: &mut mpsc::UnboundedReceiver<ControlIntent>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    session.apply(SyncInput::LoadStarted);

    if let Some(hint) = descriptor.duration_hint {
        session.seed_duration(hint);
    }

    let resolved = match resolve(&descriptor) {
        Ok(resolved) => resolved,
        Err(e) => {
            session.fatal(&e, FailureKind::UnresolvedSource);
            return;
        }
    };
    info!("Resolved video {} to {}", descriptor.id, resolved);

    // The runtime fetch is shared process-wide; unmounting while it is
    // in flight abandons this session without cancelling the fetch
    let engine = tokio::select! {
        _ = shutdown_rx.changed() => return,
        result = loader.await_ready() => match result {
            Ok(engine) => engine,
            Err(e) => {
                session.fatal(&e, FailureKind::ScriptLoad);
                return;
            }
        },
    };

    if !engine.supports(resolved.provider) {
        let e = EmbedPlayerError::PlayerCreation(format!(
            "no engine support for provider {}",
            resolved.provider
        ));
        session.fatal(&e, FailureKind::PlayerCreation);
        return;
    }

    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let container = match session.host.attach(host_tx) {
        Ok(container) => container,
        Err(e) => {
            session.fatal(&e, FailureKind::PlayerCreation);
            return;
        }
    };

    // Hosts without hover have no passive reveal, so the overlay skips
    // the inactivity countdown and taps alone toggle its visibility
    let capabilities = session.host.input_capabilities();
    session
        .shared
        .ui
        .lock()
        .timer
        .set_countdown_bypass(!capabilities.hover);

    let mut options = if session.custom_controls {
        EmbedOptions::chromeless()
    } else {
        EmbedOptions::native_chrome()
    };
    options.autoplay = autoplay;
    options.initial_volume = session.config.player.default_volume;

    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
    let mut controller = PlayerController::new(engine);
    let created = tokio::select! {
        _ = shutdown_rx.changed() => return,
        result = controller.create(&container, &resolved, &options, raw_tx) => result,
    };
    if let Err(e) = created {
        session.fatal(&e, FailureKind::PlayerCreation);
        return;
    }
    session.controller = Some(controller);

    let mut poll = tokio::time::interval(session.config.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let poll_armed = session.status.should_poll();
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            Some(raw) = raw_rx.recv() => {
                if let Some(event) = map_raw_event(&raw) {
                    // Engine-driven transitions refresh metrics right away
                    // so position and duration are fresh between polls
                    let refresh = matches!(event, EngineEvent::Ready | EngineEvent::StateChanged(_));
                    session.apply(SyncInput::Engine(event));
                    if refresh {
                        session.refresh_metrics();
                    }
                }
            }
            Some(event) = host_rx.recv() => {
                if !session.handle_host_event(event) {
                    break;
                }
            }
            Some(intent) = intent_rx.recv() => {
                session.apply_intent(intent);
            }
            _ = poll.tick(), if poll_armed => {
                session.poll_cycle();
            }
        }
    }
}

struct Session {
    shared: Arc<SharedSync>,
    callbacks: Arc<PlayerCallbacks>,
    status_tx: Arc<watch::Sender<PlayerStatus>>,
    host: Arc<dyn HostSurface>,
    config: Config,
    custom_controls: bool,

    /// Local copy of the current status, avoiding a lock per check
    status: PlayerStatus,
    published: PlayerStatus,
    controller: Option<PlayerController>,
}

impl Session {
    /// Feed one input through the reducer and fan out the results
    fn apply(&mut self, input: SyncInput) {
        let signals = {
            let mut state = self.shared.state.lock();
            let signals = reduce(&mut state, input);
            self.status = state.status;
            signals
        };

        if self.status != self.published {
            self.status_tx.send_replace(self.status);
            self.published = self.status;
        }

        // Callbacks run without any lock held
        for signal in &signals {
            match signal {
                PlayerSignal::Played => self.callbacks.played(),
                PlayerSignal::Paused => self.callbacks.paused(),
                PlayerSignal::Ended => self.callbacks.ended(),
                PlayerSignal::TimeUpdate(time) => self.callbacks.time_update(*time),
            }
        }
    }

    /// Route a terminal error into state
    fn fatal(&mut self, error: &EmbedPlayerError, fallback: FailureKind) {
        let failure = PlaybackFailure::from_error(error)
            .unwrap_or_else(|| PlaybackFailure::new(fallback, error.to_string()));
        self.apply(SyncInput::Fatal(failure));
    }

    /// Pre-fill the duration from the descriptor hint
    fn seed_duration(&mut self, hint: f64) {
        let seed = {
            let state = self.shared.state.lock();
            Snapshot {
                current_time: state.current_time,
                duration: hint,
                volume: state.volume,
                muted: state.muted,
                buffered_fraction: 0.0,
            }
        };
        self.apply(SyncInput::Poll(seed));
    }

    /// Best-effort metric refresh outside the poll cadence
    fn refresh_metrics(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let snapshot = controller.snapshot();
        self.apply(SyncInput::Poll(snapshot));
    }

    /// One scheduled poll cycle; a failed read skips the cycle
    fn poll_cycle(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        match controller.poll_metrics() {
            Ok(snapshot) => self.apply(SyncInput::Poll(snapshot)),
            Err(e) => warn!("Sync error, skipping poll cycle: {}", e),
        }
    }

    /// Apply a control intent; returns nothing, effects flow back as events
    fn apply_intent(&mut self, intent: ControlIntent) {
        // A finished or failed source only honors fullscreen and reload
        if self.status.is_terminal()
            && !matches!(
                intent,
                ControlIntent::ToggleFullscreen
                    | ControlIntent::ExitFullscreen
                    | ControlIntent::Reload
            )
        {
            debug!("Dropping {:?} in terminal status {}", intent, self.status);
            return;
        }

        match intent {
            ControlIntent::ToggleFullscreen => {
                // Status changes only when the host confirms via event
                let result = if self.host.is_fullscreen() {
                    self.host.exit_fullscreen()
                } else {
                    self.host.request_fullscreen()
                };
                if let Err(e) = result {
                    warn!("Fullscreen request failed: {}", e);
                }
                return;
            }
            ControlIntent::ExitFullscreen => {
                if self.host.is_fullscreen() {
                    if let Err(e) = self.host.exit_fullscreen() {
                        warn!("Fullscreen exit failed: {}", e);
                    }
                }
                return;
            }
            ControlIntent::Reload => {
                self.callbacks.reload_requested();
                return;
            }
            _ => {}
        }

        let Some(controller) = self.controller.as_mut() else {
            debug!("Dropping {:?} without a live player", intent);
            return;
        };

        match intent {
            ControlIntent::TogglePlay => match self.status {
                PlayerStatus::Playing | PlayerStatus::Buffering => controller.pause(),
                PlayerStatus::Ready | PlayerStatus::Paused => controller.play(),
                status => debug!("Ignoring toggle in status {}", status),
            },
            ControlIntent::SeekTo(position) => controller.seek_to(position),
            ControlIntent::SeekBy(delta) => controller.seek_by(delta),
            ControlIntent::SeekToFraction(fraction) => {
                let duration = self.shared.state.lock().duration;
                if duration > 0.0 {
                    controller.seek_to(fraction.clamp(0.0, 1.0) * duration);
                } else {
                    debug!("Ignoring fractional seek with unknown duration");
                }
            }
            ControlIntent::SetVolume(volume) => controller.set_volume(volume),
            ControlIntent::AdjustVolume(delta) => controller.adjust_volume(delta),
            ControlIntent::ToggleMute => controller.toggle_mute(),
            ControlIntent::SetRate(rate) => {
                if controller.set_playback_rate(rate) {
                    self.apply(SyncInput::RateChanged(rate));
                }
            }
            ControlIntent::StepRate(step) => {
                let current = self.shared.state.lock().playback_rate;
                let rates = self.config.player.playback_rates.clone();
                if let Some(rate) = step_rate(&rates, current, step) {
                    if (rate - current).abs() > f64::EPSILON && controller.set_playback_rate(rate) {
                        self.apply(SyncInput::RateChanged(rate));
                    }
                }
            }
            ControlIntent::ToggleFullscreen
            | ControlIntent::ExitFullscreen
            | ControlIntent::Reload => {}
        }
    }

    /// Process one host event; returns false when the session must end
    fn handle_host_event(&mut self, event: HostEvent) -> bool {
        let now = Instant::now();
        match event {
            HostEvent::FullscreenChanged(fullscreen) => {
                self.apply(SyncInput::FullscreenChanged(fullscreen));
            }
            HostEvent::ContainerDetached => {
                info!("Container detached, ending session");
                return false;
            }
            HostEvent::PointerMoved { x, .. } => {
                if !self.custom_controls {
                    return true;
                }
                let viewport = self.host.viewport();
                let mut ui = self.shared.ui.lock();
                ui.timer.note_interaction(now);
                if ui.scrub.is_some() {
                    ui.scrub = Some(overlay::scrub_fraction(viewport, &self.config.overlay, x));
                }
            }
            HostEvent::PointerPressed { x, y } => {
                if !self.custom_controls {
                    return true;
                }
                self.shared.ui.lock().timer.note_interaction(now);
                match overlay::hit_test(self.host.viewport(), &self.config.overlay, x, y) {
                    Some(ControlHit::SeekBar { fraction }) => {
                        self.shared.ui.lock().scrub = Some(fraction);
                    }
                    Some(hit) => {
                        if let Some(intent) = self.intent_for_hit(hit) {
                            self.apply_intent(intent);
                        }
                    }
                    None => {}
                }
            }
            HostEvent::PointerReleased { x, .. } => {
                if !self.custom_controls {
                    return true;
                }
                let dragging = self.shared.ui.lock().scrub.take().is_some();
                if dragging {
                    // One seek per drag, issued on release
                    let fraction =
                        overlay::scrub_fraction(self.host.viewport(), &self.config.overlay, x);
                    self.apply_intent(ControlIntent::SeekToFraction(fraction));
                }
            }
            HostEvent::TouchTap { x, y } => {
                if !self.custom_controls {
                    return true;
                }
                let visible = self.shared.ui.lock().timer.is_visible(self.status, now);
                if !visible {
                    // The first tap only reveals the controls
                    self.shared.ui.lock().timer.toggle_touch(self.status, now);
                    return true;
                }
                match overlay::hit_test(self.host.viewport(), &self.config.overlay, x, y) {
                    Some(ControlHit::SeekBar { fraction }) => {
                        self.shared.ui.lock().timer.note_interaction(now);
                        self.apply_intent(ControlIntent::SeekToFraction(fraction));
                    }
                    Some(hit) => {
                        self.shared.ui.lock().timer.note_interaction(now);
                        if let Some(intent) = self.intent_for_hit(hit) {
                            self.apply_intent(intent);
                        }
                    }
                    None => {
                        // Background tap dismisses the controls
                        self.shared.ui.lock().timer.toggle_touch(self.status, now);
                    }
                }
            }
            HostEvent::KeyPressed { key, modifiers } => {
                if !self.custom_controls {
                    return true;
                }
                self.shared.ui.lock().timer.note_interaction(now);
                if let Some(intent) = intent_for_key(&key, &modifiers, &self.config.player) {
                    self.apply_intent(intent);
                }
            }
        }
        true
    }

    fn intent_for_hit(&self, hit: ControlHit) -> Option<ControlIntent> {
        match hit {
            ControlHit::PlayPause => Some(ControlIntent::TogglePlay),
            ControlHit::SeekBar { fraction } => Some(ControlIntent::SeekToFraction(fraction)),
            ControlHit::Volume => Some(ControlIntent::ToggleMute),
            ControlHit::Rate => Some(ControlIntent::StepRate(1)),
            ControlHit::Fullscreen => Some(ControlIntent::ToggleFullscreen),
            ControlHit::Notice => {
                let reloadable = self
                    .shared
                    .state
                    .lock()
                    .failure
                    .as_ref()
                    .map(|f| f.kind.offers_reload())
                    .unwrap_or(false);
                if self.status == PlayerStatus::Error && reloadable {
                    Some(ControlIntent::Reload)
                } else {
                    None
                }
            }
        }
    }
}
