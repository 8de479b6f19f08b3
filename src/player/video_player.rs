//! The mountable video player component
//!
//! [`VideoPlayer`] is the embedder-facing surface: construct it with a
//! builder, mount it to start a playback session, observe it through the
//! status watch, state reads, and callbacks, and drive it with control
//! intents. Mounting never returns an error; every failure travels
//! through state as an `Error` status with a classified failure.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::controls::overlay::{self, OverlayScene};
use crate::controls::ControlIntent;
use crate::host::HostSurface;
use crate::loader::EngineLoader;
use crate::player::state::PlayerState;
use crate::player::sync::{self, SessionDeps, SharedSync};
use crate::player::{FailureKind, PlayerStatus};
use crate::source::VideoDescriptor;
use crate::utils::error::{EmbedPlayerError, Result};
use crate::utils::Config;

/// Callbacks the embedder receives from a playback session
///
/// All callbacks run on the session task; keep them short and hand
/// longer work to the embedder's own executor.
#[derive(Default)]
pub struct PlayerCallbacks {
    on_play: Option<Box<dyn Fn() + Send + Sync>>,
    on_pause: Option<Box<dyn Fn() + Send + Sync>>,
    on_ended: Option<Box<dyn Fn() + Send + Sync>>,
    on_time_update: Option<Box<dyn Fn(f64) + Send + Sync>>,
    on_reload_requested: Option<Box<dyn Fn() + Send + Sync>>,
}

impl PlayerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when playback starts or resumes
    pub fn on_play(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_play = Some(Box::new(f));
        self
    }

    /// Called when playback pauses out of active playback
    pub fn on_pause(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_pause = Some(Box::new(f));
        self
    }

    /// Called exactly once when the media finishes
    pub fn on_ended(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_ended = Some(Box::new(f));
        self
    }

    /// Called with the position on every poll cycle while playing
    pub fn on_time_update(mut self, f: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_time_update = Some(Box::new(f));
        self
    }

    /// Called when the user asks for a reload from the failure notice
    pub fn on_reload_requested(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reload_requested = Some(Box::new(f));
        self
    }

    pub(crate) fn played(&self) {
        if let Some(f) = &self.on_play {
            f();
        }
    }

    pub(crate) fn paused(&self) {
        if let Some(f) = &self.on_pause {
            f();
        }
    }

    pub(crate) fn ended(&self) {
        if let Some(f) = &self.on_ended {
            f();
        }
    }

    pub(crate) fn time_update(&self, time: f64) {
        if let Some(f) = &self.on_time_update {
            f(time);
        }
    }

    pub(crate) fn reload_requested(&self) {
        if let Some(f) = &self.on_reload_requested {
            f();
        }
    }
}

/// Construction-time properties of a [`VideoPlayer`]
#[derive(Debug, Clone)]
pub struct PlayerProps {
    /// The video to play
    pub video: VideoDescriptor,

    /// Begin playback as soon as the player is ready
    pub autoplay: bool,

    /// Styling hook the host applies to the player container
    pub container_class: String,

    /// Use the custom overlay instead of the provider's native chrome
    pub custom_controls: bool,
}

/// Builder for [`VideoPlayer`]
pub struct VideoPlayerBuilder {
    props: PlayerProps,
    config: Option<Config>,
    loader: Option<Arc<EngineLoader>>,
    host: Option<Arc<dyn HostSurface>>,
    callbacks: PlayerCallbacks,
}

impl VideoPlayerBuilder {
    fn new(video: VideoDescriptor) -> Self {
        Self {
            props: PlayerProps {
                video,
                autoplay: false,
                container_class: "embed-player".to_string(),
                custom_controls: true,
            },
            config: None,
            loader: None,
            host: None,
            callbacks: PlayerCallbacks::default(),
        }
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.props.autoplay = autoplay;
        self
    }

    pub fn container_class(mut self, class: impl Into<String>) -> Self {
        self.props.container_class = class.into();
        self
    }

    /// Disable the custom overlay and fall back to native provider chrome
    ///
    /// The session, state machine, and callbacks behave identically; only
    /// the embed options and the overlay differ.
    pub fn custom_controls(mut self, custom_controls: bool) -> Self {
        self.props.custom_controls = custom_controls;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a specific loader instead of the process-global one
    pub fn loader(mut self, loader: Arc<EngineLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn host(mut self, host: Arc<dyn HostSurface>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn callbacks(mut self, callbacks: PlayerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Assemble the player
    ///
    /// # Returns
    ///
    /// Returns a `Config` error when no host surface was provided or no
    /// loader is available (neither set here nor installed globally)
    pub fn build(self) -> Result<VideoPlayer> {
        let host = self
            .host
            .ok_or_else(|| EmbedPlayerError::Config("no host surface provided".to_string()))?;
        let loader = self
            .loader
            .or_else(EngineLoader::global)
            .ok_or_else(|| EmbedPlayerError::Config("no engine loader available".to_string()))?;
        let config = self.config.unwrap_or_default();

        let (status_tx, _) = watch::channel(PlayerStatus::Idle);
        let shared = Arc::new(SharedSync::new(&config));

        Ok(VideoPlayer {
            props: self.props,
            config,
            loader,
            host,
            callbacks: Arc::new(self.callbacks),
            status_tx: Arc::new(status_tx),
            shared,
            session: None,
        })
    }
}

struct SessionHandle {
    task: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    intent_tx: mpsc::UnboundedSender<ControlIntent>,
}

/// A mountable, observable playback component for one video
pub struct VideoPlayer {
    props: PlayerProps,
    config: Config,
    loader: Arc<EngineLoader>,
    host: Arc<dyn HostSurface>,
    callbacks: Arc<PlayerCallbacks>,
    status_tx: Arc<watch::Sender<PlayerStatus>>,
    shared: Arc<SharedSync>,
    session: Option<SessionHandle>,
}

impl VideoPlayer {
    pub fn builder(video: VideoDescriptor) -> VideoPlayerBuilder {
        VideoPlayerBuilder::new(video)
    }

    /// Start a playback session for the configured video
    ///
    /// Mounting never fails directly; resolution, load, and creation
    /// failures surface as an `Error` status. Must be called from within
    /// a Tokio runtime. Mounting while mounted is a no-op.
    pub fn mount(&mut self) {
        if self.session.is_some() {
            debug!("Ignoring mount on an already mounted player");
            return;
        }
        info!("Mounting player for video {}", self.props.video.id);

        // Each session gets fresh shared state; the status watch resets
        // with it rather than holding the previous session's last value
        self.shared = Arc::new(SharedSync::new(&self.config));
        self.status_tx.send_replace(PlayerStatus::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();

        let deps = SessionDeps {
            descriptor: self.props.video.clone(),
            autoplay: self.props.autoplay,
            custom_controls: self.props.custom_controls,
            config: self.config.clone(),
            loader: self.loader.clone(),
            host: self.host.clone(),
            shared: self.shared.clone(),
            callbacks: self.callbacks.clone(),
            status_tx: self.status_tx.clone(),
            intent_rx,
            shutdown_rx,
        };
        let task = tokio::spawn(sync::run(deps));

        self.session = Some(SessionHandle {
            task,
            shutdown_tx,
            intent_tx,
        });
    }

    /// Tear the session down and release the container
    ///
    /// Waits for the ordered teardown to finish: the poll stops, the
    /// overlay timer disarms, and the embedded player is destroyed before
    /// the host detaches. Safe to call when not mounted.
    pub async fn unmount(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        info!("Unmounting player for video {}", self.props.video.id);

        let _ = session.shutdown_tx.send(true);
        if session.task.await.is_err() {
            warn!("Session task ended abnormally during unmount");
        }
        self.host.detach();
    }

    /// Remount from scratch, retrying a failed runtime load if that is
    /// what broke the previous session
    pub async fn reload(&mut self) {
        let failure = self.shared.state.lock().failure.clone();
        if let Some(failure) = failure {
            if failure.kind == FailureKind::ScriptLoad && self.loader.reset_for_retry() {
                info!("Retrying runtime load on reload");
            }
        }

        self.unmount().await;
        self.mount();
    }

    /// Send a control intent into the running session
    ///
    /// Intents are dropped when the player is not mounted.
    pub fn dispatch(&self, intent: ControlIntent) {
        let Some(session) = &self.session else {
            debug!("Dropping {:?} while unmounted", intent);
            return;
        };
        let _ = session.intent_tx.send(intent);
    }

    /// Current canonical state
    pub fn state(&self) -> PlayerState {
        self.shared.state.lock().clone()
    }

    /// Current status without cloning the full state
    pub fn status(&self) -> PlayerStatus {
        *self.status_tx.borrow()
    }

    /// Watch channel following every status change
    pub fn status_updates(&self) -> watch::Receiver<PlayerStatus> {
        self.status_tx.subscribe()
    }

    /// The overlay as it should be drawn right now
    ///
    /// With native chrome enabled the scene is always empty; the provider
    /// draws its own controls.
    pub fn scene(&self, now: Instant) -> OverlayScene {
        if !self.props.custom_controls {
            return OverlayScene {
                opacity: 0.0,
                elements: Vec::new(),
            };
        }

        let state = self.shared.state.lock().clone();
        let (opacity, scrub) = {
            let ui = self.shared.ui.lock();
            (ui.timer.opacity(state.status, now), ui.scrub)
        };
        let title = self.props.video.title.as_str();
        overlay::build_scene(
            &state,
            Some(title).filter(|t| !t.is_empty()),
            self.host.viewport(),
            &self.config.overlay,
            opacity,
            scrub,
        )
    }

    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    pub fn props(&self) -> &PlayerProps {
        &self.props
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        // Signal the session so teardown runs even without an explicit
        // unmount; the task finishes on the runtime in the background
        if let Some(session) = self.session.take() {
            let _ = session.shutdown_tx.send(true);
        }
    }
}
