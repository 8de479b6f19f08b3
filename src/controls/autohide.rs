//! Auto-hide policy for the controls overlay
//!
//! The timer is a pure policy consulted at render time: it never hides
//! the controls unless playback is actually running, and touch input
//! replaces the hover-driven reveal with an explicit tap toggle.

use std::time::{Duration, Instant};

use crate::player::PlayerStatus;

/// How long the fade-out takes once the hide delay expires
const FADE: Duration = Duration::from_millis(200);

/// Inactivity-driven visibility policy for the overlay
#[derive(Debug, Clone)]
pub struct AutoHideTimer {
    hide_delay: Duration,
    bypass_countdown: bool,
    last_interaction: Instant,
    force_hidden: bool,
    disarmed: bool,
}

impl AutoHideTimer {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            hide_delay,
            bypass_countdown: false,
            last_interaction: Instant::now(),
            force_hidden: false,
            disarmed: false,
        }
    }

    /// Skip the inactivity countdown entirely
    ///
    /// Hosts without hover input have no passive way to bring the
    /// controls back, so the overlay stays up during playback and an
    /// explicit tap is the only thing that hides it.
    pub fn set_countdown_bypass(&mut self, bypass: bool) {
        self.bypass_countdown = bypass;
    }

    /// Record pointer or keyboard activity, revealing the controls
    pub fn note_interaction(&mut self, now: Instant) {
        if self.disarmed {
            return;
        }
        self.last_interaction = now;
        self.force_hidden = false;
    }

    /// Toggle visibility from a touch tap; returns whether the controls
    /// are visible afterwards
    ///
    /// While not playing the controls cannot be dismissed, so a tap only
    /// refreshes the reveal.
    pub fn toggle_touch(&mut self, status: PlayerStatus, now: Instant) -> bool {
        if self.disarmed {
            return false;
        }
        if status == PlayerStatus::Playing && self.is_visible(status, now) {
            self.force_hidden = true;
            false
        } else {
            self.last_interaction = now;
            self.force_hidden = false;
            true
        }
    }

    /// Overlay opacity at this instant: 1.0 visible, 0.0 hidden, and
    /// values in between while fading out
    pub fn opacity(&self, status: PlayerStatus, now: Instant) -> f32 {
        if self.disarmed {
            return 0.0;
        }
        // The overlay only ever hides during active playback
        if status != PlayerStatus::Playing {
            return 1.0;
        }
        if self.force_hidden {
            return 0.0;
        }
        if self.bypass_countdown {
            return 1.0;
        }

        let elapsed = now.duration_since(self.last_interaction);
        if elapsed <= self.hide_delay {
            return 1.0;
        }
        let into_fade = elapsed - self.hide_delay;
        if into_fade >= FADE {
            0.0
        } else {
            1.0 - into_fade.as_secs_f32() / FADE.as_secs_f32()
        }
    }

    pub fn is_visible(&self, status: PlayerStatus, now: Instant) -> bool {
        self.opacity(status, now) > 0.0
    }

    /// Stop the timer for teardown; the overlay reads as hidden from
    /// here on and interactions are ignored
    pub fn disarm(&mut self) {
        self.disarmed = true;
    }

    pub fn is_disarmed(&self) -> bool {
        self.disarmed
    }
}
