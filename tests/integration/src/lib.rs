//! Integration test utilities for EmbedPlayer
//!
//! This module provides common utilities for integration testing including:
//! - Descriptor fixture generation
//! - A full player harness around the simulated provider runtime
//! - Callback recording and wait helpers
//! - A mockable runtime fetcher

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use embedplayer::source::VideoDescriptor;

/// Test fixture for integration tests
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub descriptors: DescriptorFiles,
}

/// Collection of descriptor files covering the supported source shapes
pub struct DescriptorFiles {
    pub watch_url: PathBuf,
    pub short_link: PathBuf,
    pub explicit_id: PathBuf,
    pub numeric_vimeo: PathBuf,
    pub unresolvable: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with generated descriptor files
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let descriptors = DescriptorFiles::generate(&temp_dir)?;

        Ok(Self {
            temp_dir,
            descriptors,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a descriptor back from one of the generated files
    pub fn load_descriptor(&self, path: &Path) -> Result<VideoDescriptor> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl DescriptorFiles {
    /// Generate descriptor files in the given directory
    fn generate(dir: &TempDir) -> Result<Self> {
        let watch_url = Self::write(
            dir,
            "watch_url.json",
            &VideoDescriptor::new(
                "lecture-01",
                "Intro Lecture",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            )
            .with_duration_hint(1800.0),
        )?;

        let short_link = Self::write(
            dir,
            "short_link.json",
            &VideoDescriptor::new("lecture-02", "Short Link", "https://youtu.be/jNQXAC9IVRw?t=42"),
        )?;

        let explicit_id = Self::write(
            dir,
            "explicit_id.json",
            &VideoDescriptor::new("lecture-03", "Explicit Id", "https://malformed.example/???")
                .with_explicit_id("M7lc1UVf-VE"),
        )?;

        let numeric_vimeo = Self::write(
            dir,
            "numeric_vimeo.json",
            &VideoDescriptor::new("lecture-04", "Vimeo Upload", "https://vimeo.com/76979871"),
        )?;

        let unresolvable = Self::write(
            dir,
            "unresolvable.json",
            &VideoDescriptor::new("lecture-05", "Broken Link", "not a url and not an id either"),
        )?;

        Ok(Self {
            watch_url,
            short_link,
            explicit_id,
            numeric_vimeo,
            unresolvable,
        })
    }

    fn write(dir: &TempDir, name: &str, descriptor: &VideoDescriptor) -> Result<PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(descriptor)?)?;
        Ok(path)
    }
}

/// A full player rig around the simulated provider runtime
pub mod harness {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use embedplayer::engine::{ScriptedFetcher, SimProbe, SimScript, SimulatedEngine};
    use embedplayer::host::headless::{FullscreenPolicy, HeadlessHost};
    use embedplayer::loader::EngineLoader;
    use embedplayer::player::{PlayerCallbacks, PlayerStatus, VideoPlayer};
    use embedplayer::source::VideoDescriptor;
    use embedplayer::utils::Config;

    /// How long wait helpers block before declaring a test stuck
    const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Configuration shortened for tests: fast polls and a hide delay
    /// a test can actually sit out
    pub fn test_config() -> Config {
        let mut config = Config::default();
        config.player.poll_interval_ms = 25;
        config.overlay.hide_delay_ms = 120;
        config
    }

    /// A descriptor that resolves without network access
    pub fn demo_descriptor() -> VideoDescriptor {
        VideoDescriptor::new(
            "vid-1",
            "Intro Lecture",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        )
    }

    /// An assembled player with probes into every seam
    ///
    /// The player is not mounted yet; tests mount it themselves so they
    /// can subscribe to status updates first.
    pub struct PlayerHarness {
        pub player: VideoPlayer,
        pub probe: SimProbe,
        pub fetcher: Arc<ScriptedFetcher>,
        pub loader: Arc<EngineLoader>,
        pub host: Arc<HeadlessHost>,
    }

    impl PlayerHarness {
        pub fn builder() -> HarnessBuilder {
            HarnessBuilder::new()
        }
    }

    /// Builder assembling a [`PlayerHarness`] piece by piece
    pub struct HarnessBuilder {
        script: SimScript,
        descriptor: VideoDescriptor,
        autoplay: bool,
        custom_controls: bool,
        touch: bool,
        fullscreen_policy: FullscreenPolicy,
        failing_fetches: usize,
        config: Config,
        callbacks: PlayerCallbacks,
    }

    impl HarnessBuilder {
        pub fn new() -> Self {
            Self {
                script: SimScript::default(),
                descriptor: demo_descriptor(),
                autoplay: false,
                custom_controls: true,
                touch: false,
                fullscreen_policy: FullscreenPolicy::Accept,
                failing_fetches: 0,
                config: test_config(),
                callbacks: PlayerCallbacks::new(),
            }
        }

        pub fn script(mut self, script: SimScript) -> Self {
            self.script = script;
            self
        }

        pub fn descriptor(mut self, descriptor: VideoDescriptor) -> Self {
            self.descriptor = descriptor;
            self
        }

        pub fn autoplay(mut self) -> Self {
            self.autoplay = true;
            self
        }

        pub fn native_controls(mut self) -> Self {
            self.custom_controls = false;
            self
        }

        pub fn touch_host(mut self) -> Self {
            self.touch = true;
            self
        }

        pub fn reject_fullscreen(mut self) -> Self {
            self.fullscreen_policy = FullscreenPolicy::Reject;
            self
        }

        /// Make the runtime fetch fail this many times before succeeding
        pub fn failing_fetches(mut self, failures: usize) -> Self {
            self.failing_fetches = failures;
            self
        }

        pub fn config(mut self, config: Config) -> Self {
            self.config = config;
            self
        }

        pub fn callbacks(mut self, callbacks: PlayerCallbacks) -> Self {
            self.callbacks = callbacks;
            self
        }

        pub fn build(self) -> Result<PlayerHarness> {
            let engine = Arc::new(SimulatedEngine::new(self.script));
            let probe = engine.probe();

            let fetcher = if self.failing_fetches > 0 {
                ScriptedFetcher::failing(engine, self.failing_fetches)
            } else {
                ScriptedFetcher::new(engine)
            };
            let fetcher = Arc::new(fetcher.with_delay(Duration::from_millis(1)));
            let loader = Arc::new(EngineLoader::new(fetcher.clone()));

            let host = HeadlessHost::with_fullscreen_policy(self.fullscreen_policy);
            let host = Arc::new(if self.touch { host.with_touch() } else { host });

            let player = VideoPlayer::builder(self.descriptor)
                .autoplay(self.autoplay)
                .custom_controls(self.custom_controls)
                .config(self.config)
                .loader(loader.clone())
                .host(host.clone())
                .callbacks(self.callbacks)
                .build()?;

            Ok(PlayerHarness {
                player,
                probe,
                fetcher,
                loader,
                host,
            })
        }
    }

    impl Default for HarnessBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Block until the player publishes the wanted status
    pub async fn wait_for_status(player: &VideoPlayer, wanted: PlayerStatus) {
        let mut rx = player.status_updates();
        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                if *rx.borrow_and_update() == wanted {
                    break;
                }
                rx.changed().await.expect("status channel closed");
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "never reached status {}, last was {}",
                wanted,
                player.status()
            )
        });
    }

    /// Poll until the predicate holds
    pub async fn wait_until(what: &str, mut predicate: impl FnMut() -> bool) {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            while !predicate() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what));
    }
}

/// Recording callbacks for asserting on playback milestones
pub mod callback_log {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use embedplayer::player::PlayerCallbacks;

    /// Shared counters recording every callback crossing
    #[derive(Default)]
    pub struct CallbackLog {
        plays: AtomicUsize,
        pauses: AtomicUsize,
        ends: AtomicUsize,
        reloads: AtomicUsize,
        times: Mutex<Vec<f64>>,
    }

    impl CallbackLog {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Player callbacks that record into the given log
        pub fn callbacks(log: &Arc<CallbackLog>) -> PlayerCallbacks {
            PlayerCallbacks::new()
                .on_play({
                    let log = log.clone();
                    move || {
                        log.plays.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .on_pause({
                    let log = log.clone();
                    move || {
                        log.pauses.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .on_ended({
                    let log = log.clone();
                    move || {
                        log.ends.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .on_time_update({
                    let log = log.clone();
                    move |time| {
                        log.times.lock().expect("time log poisoned").push(time);
                    }
                })
                .on_reload_requested({
                    let log = log.clone();
                    move || {
                        log.reloads.fetch_add(1, Ordering::SeqCst);
                    }
                })
        }

        pub fn plays(&self) -> usize {
            self.plays.load(Ordering::SeqCst)
        }

        pub fn pauses(&self) -> usize {
            self.pauses.load(Ordering::SeqCst)
        }

        pub fn ends(&self) -> usize {
            self.ends.load(Ordering::SeqCst)
        }

        pub fn reloads(&self) -> usize {
            self.reloads.load(Ordering::SeqCst)
        }

        /// Every reported playback position, in arrival order
        pub fn times(&self) -> Vec<f64> {
            self.times.lock().expect("time log poisoned").clone()
        }
    }
}

/// Mockable runtime fetcher for loader expectations
pub mod mock_fetcher {
    use std::sync::Arc;

    use embedplayer::engine::EmbedEngine;
    use embedplayer::loader::RuntimeFetcher;
    use embedplayer::utils::error::Result;

    mockall::mock! {
        /// Scriptable stand-in for the provider runtime fetch
        pub Fetcher {}

        #[async_trait::async_trait]
        impl RuntimeFetcher for Fetcher {
            async fn fetch(&self) -> Result<Arc<dyn EmbedEngine>>;
        }
    }
}
