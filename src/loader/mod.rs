//! External runtime loader for EmbedPlayer
//!
//! The provider runtime is fetched at most once per process lifetime, no
//! matter how many players mount concurrently. The first subscriber arms
//! the fetch; everyone else waits on the broadcast load state. Subscribers
//! arriving after the load completed resolve immediately. A failed fetch
//! is sticky until the reload affordance arms a retry.

use async_trait::async_trait;
use log::{info, warn};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::engine::EmbedEngine;
use crate::utils::error::{EmbedPlayerError, IntoPlayerError, Result};

static GLOBAL_LOADER: OnceCell<Arc<EngineLoader>> = OnceCell::new();

/// Fetches the provider runtime and hands back the engine it exposes
#[async_trait]
pub trait RuntimeFetcher: Send + Sync {
    /// Perform the one-time runtime fetch
    ///
    /// # Returns
    ///
    /// Returns the loaded engine, or a `ScriptLoad` error
    async fn fetch(&self) -> Result<Arc<dyn EmbedEngine>>;
}

/// Broadcast load state of the provider runtime
#[derive(Clone)]
pub enum LoadPhase {
    /// No fetch armed yet
    Idle,

    /// A fetch is in flight
    Loading,

    /// The runtime is loaded and the engine is available
    Ready(Arc<dyn EmbedEngine>),

    /// The fetch failed; sticky until a retry is armed
    Failed(String),
}

impl LoadPhase {
    fn name(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "idle",
            LoadPhase::Loading => "loading",
            LoadPhase::Ready(_) => "ready",
            LoadPhase::Failed(_) => "failed",
        }
    }
}

impl fmt::Debug for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-wide loader for the provider runtime
pub struct EngineLoader {
    fetcher: Arc<dyn RuntimeFetcher>,
    phase: watch::Sender<LoadPhase>,
    armed: Mutex<bool>,
}

impl EngineLoader {
    /// Create a loader around a runtime fetcher
    pub fn new(fetcher: Arc<dyn RuntimeFetcher>) -> Self {
        let (phase, _) = watch::channel(LoadPhase::Idle);
        Self {
            fetcher,
            phase,
            armed: Mutex::new(false),
        }
    }

    /// Install the process-wide default loader
    ///
    /// # Returns
    ///
    /// `true` if this loader became the default, `false` if one was
    /// already installed
    pub fn install_global(loader: Arc<EngineLoader>) -> bool {
        GLOBAL_LOADER.set(loader).is_ok()
    }

    /// The process-wide default loader, if one was installed
    pub fn global() -> Option<Arc<EngineLoader>> {
        GLOBAL_LOADER.get().cloned()
    }

    /// Wait until the runtime is loaded, arming the fetch if needed
    ///
    /// Resolves immediately when the runtime is already loaded; otherwise
    /// subscribes to the load broadcast. Concurrent callers share one
    /// fetch.
    ///
    /// # Returns
    ///
    /// The loaded engine, or `ScriptLoad` if the fetch failed
    pub async fn await_ready(&self) -> Result<Arc<dyn EmbedEngine>> {
        self.ensure_fetch();
        self.subscribe().wait().await
    }

    /// Subscribe to the load broadcast without arming a fetch
    pub fn subscribe(&self) -> ReadinessHandle {
        ReadinessHandle {
            rx: self.phase.subscribe(),
        }
    }

    /// Current load phase
    pub fn phase(&self) -> LoadPhase {
        self.phase.borrow().clone()
    }

    /// Arm a new fetch after a failure
    ///
    /// # Returns
    ///
    /// `true` if a retry was armed, `false` when the loader was not in
    /// the failed phase
    pub fn reset_for_retry(&self) -> bool {
        let mut armed = self.armed.lock();
        if !matches!(&*self.phase.borrow(), LoadPhase::Failed(_)) {
            return false;
        }
        *armed = false;
        let _ = self.phase.send(LoadPhase::Idle);
        info!("Runtime loader reset, retry armed");
        true
    }

    /// Spawn the fetch task exactly once per armed cycle.
    ///
    /// The fetch itself is not cancellable; a completion broadcast with no
    /// remaining subscribers is simply dropped by the channel.
    fn ensure_fetch(&self) {
        let mut armed = self.armed.lock();
        if *armed {
            return;
        }
        *armed = true;

        let _ = self.phase.send(LoadPhase::Loading);
        let fetcher = self.fetcher.clone();
        let phase = self.phase.clone();

        tokio::spawn(async move {
            info!("Fetching provider runtime");
            match fetcher.fetch().await {
                Ok(engine) => {
                    info!("Provider runtime ready");
                    let _ = phase.send(LoadPhase::Ready(engine));
                }
                Err(e) => {
                    warn!("Provider runtime fetch failed: {}", e);
                    let _ = phase.send(LoadPhase::Failed(e.to_string()));
                }
            }
        });
    }
}

/// Subscription to the runtime load broadcast
pub struct ReadinessHandle {
    rx: watch::Receiver<LoadPhase>,
}

impl ReadinessHandle {
    /// The engine right now, without waiting
    ///
    /// `None` while the load is still idle or in flight.
    pub fn resolved(&self) -> Option<Result<Arc<dyn EmbedEngine>>> {
        match &*self.rx.borrow() {
            LoadPhase::Ready(engine) => Some(Ok(engine.clone())),
            LoadPhase::Failed(reason) => Some(Err(EmbedPlayerError::ScriptLoad(reason.clone()))),
            _ => None,
        }
    }

    /// Wait for the load to finish
    pub async fn wait(mut self) -> Result<Arc<dyn EmbedEngine>> {
        loop {
            let phase = self.rx.borrow_and_update().clone();
            match phase {
                LoadPhase::Ready(engine) => return Ok(engine),
                LoadPhase::Failed(reason) => return Err(EmbedPlayerError::ScriptLoad(reason)),
                _ => {}
            }

            self.rx
                .changed()
                .await
                .loader_err("Runtime loader dropped before completing")?;
        }
    }
}
