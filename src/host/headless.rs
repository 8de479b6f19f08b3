//! Headless host surface
//!
//! In-process host implementation backing the demo binary and the test
//! suite: an always-available container, scripted input injection, and a
//! configurable fullscreen policy so rejected requests can be exercised.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::host::{
    ContainerHandle, HostEvent, HostEventSink, HostSurface, InputCapabilities, Key, KeyModifiers,
};
use crate::utils::error::{EmbedPlayerError, Result};

/// How the headless host answers fullscreen requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenPolicy {
    /// Grant requests and broadcast the change
    Accept,

    /// Refuse requests without changing state
    Reject,
}

/// Headless implementation of [`HostSurface`]
#[derive(Clone)]
pub struct HeadlessHost {
    inner: Arc<HostInner>,
}

struct HostInner {
    sinks: Mutex<Vec<HostEventSink>>,
    containers: Mutex<Vec<Arc<AtomicBool>>>,
    fullscreen: AtomicBool,
    policy: FullscreenPolicy,
    capabilities: Mutex<InputCapabilities>,
    viewport: Mutex<(f32, f32)>,
    next_container: AtomicU64,
}

impl HeadlessHost {
    /// Create a host with desktop input, accepted fullscreen and a 1280x720 viewport
    pub fn new() -> Self {
        Self::with_fullscreen_policy(FullscreenPolicy::Accept)
    }

    /// Create a host with the given fullscreen policy
    pub fn with_fullscreen_policy(policy: FullscreenPolicy) -> Self {
        Self {
            inner: Arc::new(HostInner {
                sinks: Mutex::new(Vec::new()),
                containers: Mutex::new(Vec::new()),
                fullscreen: AtomicBool::new(false),
                policy,
                capabilities: Mutex::new(InputCapabilities::default()),
                viewport: Mutex::new((1280.0, 720.0)),
                next_container: AtomicU64::new(1),
            }),
        }
    }

    /// Switch the host to touch-style input (no hover)
    pub fn with_touch(self) -> Self {
        *self.inner.capabilities.lock() = InputCapabilities {
            hover: false,
            touch: true,
        };
        self
    }

    /// Set the container size in logical pixels
    pub fn with_viewport(self, width: f32, height: f32) -> Self {
        *self.inner.viewport.lock() = (width, height);
        self
    }

    /// Inject a pointer move
    pub fn pointer_move(&self, x: f32, y: f32) {
        self.broadcast(HostEvent::PointerMoved { x, y });
    }

    /// Inject a pointer press
    pub fn pointer_down(&self, x: f32, y: f32) {
        self.broadcast(HostEvent::PointerPressed { x, y });
    }

    /// Inject a pointer release
    pub fn pointer_up(&self, x: f32, y: f32) {
        self.broadcast(HostEvent::PointerReleased { x, y });
    }

    /// Inject a touch tap
    pub fn tap(&self, x: f32, y: f32) {
        self.broadcast(HostEvent::TouchTap { x, y });
    }

    /// Inject a key press without modifiers
    pub fn key(&self, key: Key) {
        self.broadcast(HostEvent::KeyPressed {
            key,
            modifiers: KeyModifiers::default(),
        });
    }

    /// Inject a key press with modifiers
    pub fn key_with_modifiers(&self, key: Key, modifiers: KeyModifiers) {
        self.broadcast(HostEvent::KeyPressed { key, modifiers });
    }

    /// Simulate a fullscreen change initiated by the host itself,
    /// bypassing the request path
    pub fn force_fullscreen_change(&self, fullscreen: bool) {
        self.inner.fullscreen.store(fullscreen, Ordering::Release);
        self.broadcast(HostEvent::FullscreenChanged(fullscreen));
    }

    fn broadcast(&self, event: HostEvent) {
        let mut sinks = self.inner.sinks.lock();
        sinks.retain(|sink| sink.send(event.clone()).is_ok());
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSurface for HeadlessHost {
    fn attach(&self, events: HostEventSink) -> Result<ContainerHandle> {
        let id = self.inner.next_container.fetch_add(1, Ordering::Relaxed);
        let flag = Arc::new(AtomicBool::new(true));

        self.inner.containers.lock().push(flag.clone());
        self.inner.sinks.lock().push(events);

        Ok(ContainerHandle::new(id, flag))
    }

    fn detach(&self) {
        for flag in self.inner.containers.lock().drain(..) {
            flag.store(false, Ordering::Release);
        }
        self.broadcast(HostEvent::ContainerDetached);
    }

    fn request_fullscreen(&self) -> Result<()> {
        match self.inner.policy {
            FullscreenPolicy::Accept => {
                self.inner.fullscreen.store(true, Ordering::Release);
                self.broadcast(HostEvent::FullscreenChanged(true));
                Ok(())
            }
            FullscreenPolicy::Reject => Err(EmbedPlayerError::Host(
                "fullscreen request rejected by host".to_string(),
            )),
        }
    }

    fn exit_fullscreen(&self) -> Result<()> {
        if self.inner.fullscreen.swap(false, Ordering::AcqRel) {
            self.broadcast(HostEvent::FullscreenChanged(false));
        }
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.inner.fullscreen.load(Ordering::Acquire)
    }

    fn input_capabilities(&self) -> InputCapabilities {
        *self.inner.capabilities.lock()
    }

    fn viewport(&self) -> (f32, f32) {
        *self.inner.viewport.lock()
    }
}
