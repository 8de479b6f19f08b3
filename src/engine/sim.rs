//! Deterministic simulated engine
//!
//! Scripted in-process implementation of the engine traits, used by the
//! demo binary and the test suite. Ready timing, media duration, playback
//! errors and read failures are all configurable through [`SimScript`],
//! and a [`SimProbe`] records every boundary crossing so tests can assert
//! on engine traffic without touching a real provider runtime.

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::engine::{EmbedEngine, EmbedOptions, EmbeddedPlayer, EventSink, RawEngineEvent};
use crate::host::ContainerHandle;
use crate::loader::RuntimeFetcher;
use crate::source::{ProviderKind, ResolvedSource};
use crate::utils::clamp;
use crate::utils::error::{EmbedPlayerError, Result};

/// Script controlling a simulated playback session
#[derive(Debug, Clone)]
pub struct SimScript {
    /// Delay before the ready callback fires
    pub ready_delay: Duration,

    /// Fail player creation with this message
    pub create_failure: Option<String>,

    /// Media duration in seconds
    pub duration: f64,

    /// Emit a playback error with this code once the clock passes this position
    pub error_at: Option<(f64, u32)>,

    /// Every metric read fails
    pub fail_reads: bool,

    /// Playback clock granularity
    pub tick: Duration,
}

impl Default for SimScript {
    fn default() -> Self {
        Self {
            ready_delay: Duration::from_millis(5),
            create_failure: None,
            duration: 300.0,
            error_at: None,
            fail_reads: false,
            tick: Duration::from_millis(20),
        }
    }
}

impl SimScript {
    /// Script with the given media duration in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Script whose player creation fails
    pub fn failing_creation(mut self, message: impl Into<String>) -> Self {
        self.create_failure = Some(message.into());
        self
    }

    /// Script that reports a playback error at the given clock position
    pub fn with_error_at(mut self, seconds: f64, code: u32) -> Self {
        self.error_at = Some((seconds, code));
        self
    }

    /// Script whose metric reads all fail
    pub fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Script with a custom ready delay
    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }
}

/// Counters recording traffic across the engine boundary
#[derive(Clone, Default)]
pub struct SimProbe {
    creates: Arc<AtomicUsize>,
    destroys: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl SimProbe {
    /// Number of players successfully created
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of players destroyed
    pub fn destroy_count(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Number of metric reads issued
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Every command issued, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    /// How many commands start with the given name
    pub fn command_count(&self, name: &str) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.starts_with(name))
            .count()
    }

    fn record_command(&self, command: String) {
        self.commands.lock().push(command);
    }
}

/// Deterministic scripted implementation of [`EmbedEngine`]
pub struct SimulatedEngine {
    script: SimScript,
    probe: SimProbe,
}

impl SimulatedEngine {
    pub fn new(script: SimScript) -> Self {
        Self {
            script,
            probe: SimProbe::default(),
        }
    }

    /// Probe shared by every player this engine creates
    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl EmbedEngine for SimulatedEngine {
    fn supports(&self, _provider: ProviderKind) -> bool {
        true
    }

    async fn create_player(
        &self,
        container: &ContainerHandle,
        source: &ResolvedSource,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn EmbeddedPlayer>> {
        if let Some(message) = &self.script.create_failure {
            return Err(EmbedPlayerError::PlayerCreation(message.clone()));
        }
        if !container.is_attached() {
            return Err(EmbedPlayerError::PlayerCreation(
                "container is detached".to_string(),
            ));
        }

        debug!("Simulated player created for {}", source);
        self.probe.creates.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::new(Mutex::new(SimPlayback {
            current_time: 0.0,
            duration: self.script.duration,
            volume: clamp(options.initial_volume, 0, 100),
            muted: false,
            rate: 1.0,
            playing: false,
            destroyed: false,
            ended_sent: false,
            error_sent: false,
        }));

        let ready_task = spawn_ready(
            shared.clone(),
            events.clone(),
            self.script.ready_delay,
            options.autoplay,
        );
        let clock_task = spawn_clock(shared.clone(), events.clone(), self.script.clone());

        Ok(Box::new(SimPlayer {
            shared,
            sink: events,
            script: self.script.clone(),
            probe: self.probe.clone(),
            ready_task,
            clock_task,
        }))
    }
}

/// Mutable playback state shared between the player and its clock task
struct SimPlayback {
    current_time: f64,
    duration: f64,
    volume: u32,
    muted: bool,
    rate: f64,
    playing: bool,
    destroyed: bool,
    ended_sent: bool,
    error_sent: bool,
}

impl SimPlayback {
    fn buffered_fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        // Buffer runs a tenth of the media ahead of the playhead
        clamp(
            (self.current_time + self.duration * 0.1) / self.duration,
            0.0,
            1.0,
        )
    }
}

fn spawn_ready(
    shared: Arc<Mutex<SimPlayback>>,
    sink: EventSink,
    delay: Duration,
    autoplay: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = sink.send(RawEngineEvent::ready());

        if autoplay {
            shared.lock().playing = true;
            let _ = sink.send(RawEngineEvent::state_change(1));
        } else {
            let _ = sink.send(RawEngineEvent::state_change(5));
        }
    })
}

fn spawn_clock(
    shared: Arc<Mutex<SimPlayback>>,
    sink: EventSink,
    script: SimScript,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tick_secs = script.tick.as_secs_f64();
        loop {
            tokio::time::sleep(script.tick).await;

            let event = {
                let mut state = shared.lock();
                if state.destroyed {
                    break;
                }
                if !state.playing {
                    continue;
                }

                state.current_time += tick_secs * state.rate;

                let error_due = script
                    .error_at
                    .filter(|(at, _)| state.current_time >= *at && !state.error_sent);
                if let Some((_, code)) = error_due {
                    state.error_sent = true;
                    state.playing = false;
                    Some(RawEngineEvent::error(code as i64))
                } else if state.current_time >= state.duration && !state.ended_sent {
                    state.current_time = state.duration;
                    state.playing = false;
                    state.ended_sent = true;
                    Some(RawEngineEvent::state_change(0))
                } else {
                    None
                }
            };

            if let Some(event) = event {
                let _ = sink.send(event);
            }
        }
    })
}

/// One simulated player session
struct SimPlayer {
    shared: Arc<Mutex<SimPlayback>>,
    sink: EventSink,
    script: SimScript,
    probe: SimProbe,
    ready_task: JoinHandle<()>,
    clock_task: JoinHandle<()>,
}

impl SimPlayer {
    fn guard(&self) -> Result<()> {
        if self.shared.lock().destroyed {
            return Err(EmbedPlayerError::Internal(
                "command issued on a destroyed player".to_string(),
            ));
        }
        Ok(())
    }

    fn read<T>(&self, read: impl FnOnce(&SimPlayback) -> T) -> Result<T> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_reads {
            return Err(EmbedPlayerError::Sync(
                "simulated read failure".to_string(),
            ));
        }
        let state = self.shared.lock();
        if state.destroyed {
            return Err(EmbedPlayerError::Sync(
                "read issued on a destroyed player".to_string(),
            ));
        }
        Ok(read(&state))
    }
}

impl EmbeddedPlayer for SimPlayer {
    fn play(&self) -> Result<()> {
        self.guard()?;
        self.probe.record_command("play".to_string());

        let mut state = self.shared.lock();
        if state.ended_sent {
            // Replaying from the end restarts the clock
            state.current_time = 0.0;
            state.ended_sent = false;
        }
        state.playing = true;
        let _ = self.sink.send(RawEngineEvent::state_change(1));
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.guard()?;
        self.probe.record_command("pause".to_string());

        self.shared.lock().playing = false;
        let _ = self.sink.send(RawEngineEvent::state_change(2));
        Ok(())
    }

    fn seek_to(&self, seconds: f64) -> Result<()> {
        self.guard()?;
        self.probe.record_command(format!("seek {}", seconds));

        let mut state = self.shared.lock();
        state.current_time = clamp(seconds, 0.0, state.duration);
        if state.current_time < state.duration {
            state.ended_sent = false;
        }
        Ok(())
    }

    fn set_volume(&self, percent: u32) -> Result<()> {
        self.guard()?;
        self.probe.record_command(format!("volume {}", percent));

        self.shared.lock().volume = clamp(percent, 0, 100);
        Ok(())
    }

    fn mute(&self) -> Result<()> {
        self.guard()?;
        self.probe.record_command("mute".to_string());

        self.shared.lock().muted = true;
        Ok(())
    }

    fn unmute(&self) -> Result<()> {
        self.guard()?;
        self.probe.record_command("unmute".to_string());

        self.shared.lock().muted = false;
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.guard()?;
        self.probe.record_command(format!("rate {}", rate));

        self.shared.lock().rate = rate;
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        self.read(|s| s.current_time)
    }

    fn duration(&self) -> Result<f64> {
        self.read(|s| s.duration)
    }

    fn volume(&self) -> Result<u32> {
        self.read(|s| s.volume)
    }

    fn is_muted(&self) -> Result<bool> {
        self.read(|s| s.muted)
    }

    fn buffered_fraction(&self) -> Result<f64> {
        self.read(|s| s.buffered_fraction())
    }

    fn destroy(&mut self) {
        let mut state = self.shared.lock();
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        drop(state);

        self.ready_task.abort();
        self.clock_task.abort();
        self.probe.destroys.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated player destroyed");
    }
}

impl Drop for SimPlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Runtime fetcher returning a shared simulated engine
pub struct ScriptedFetcher {
    engine: Arc<SimulatedEngine>,
    delay: Duration,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(engine: Arc<SimulatedEngine>) -> Self {
        Self {
            engine,
            delay: Duration::from_millis(10),
            failures: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Fetcher that fails this many times before succeeding
    pub fn failing(engine: Arc<SimulatedEngine>, failures: usize) -> Self {
        let fetcher = Self::new(engine);
        fetcher.failures.store(failures, Ordering::SeqCst);
        fetcher
    }

    /// Set the simulated network delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches performed
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<Arc<dyn EmbedEngine>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(EmbedPlayerError::ScriptLoad(
                "simulated fetch failure".to_string(),
            ));
        }

        Ok(self.engine.clone())
    }
}
