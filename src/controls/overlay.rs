//! Scene construction and hit-testing for the controls overlay
//!
//! Everything here is pure: [`build_scene`] turns the player state into
//! positioned elements for the host to draw, and [`hit_test`] answers
//! which control a point lands on. Hit results depend only on geometry,
//! never on the overlay's current opacity, so controls keep working
//! while they fade.

use crate::player::{PlayerState, PlayerStatus};
use crate::utils::{format_media_time, OverlayConfig};

/// Side padding around the control bar contents
const PADDING: f32 = 12.0;

/// Square button side length inside the control bar
const BUTTON: f32 = 32.0;

/// Width reserved for the time label
const TIME_LABEL_WIDTH: f32 = 132.0;

/// An axis-aligned region in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// One positioned element of the overlay scene
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    pub kind: ElementKind,
    pub rect: Rect,
}

/// What an overlay element shows
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Combined play/pause button
    PlayPause {
        playing: bool,
    },

    /// Seek bar with played and buffered fills
    SeekBar {
        played: f32,    // 0.0 to 1.0
        buffered: f32,  // 0.0 to 1.0
    },

    /// Elapsed and total time, e.g. "01:05 / 10:00"
    TimeLabel {
        text: String,
    },

    /// Mute toggle showing the current level
    VolumeButton {
        muted: bool,
        level: u32,  // 0 to 100
    },

    /// Playback rate cycler
    RateButton {
        rate: f64,
    },

    /// Fullscreen toggle
    FullscreenButton {
        active: bool,
    },

    /// Loading/buffering spinner
    Spinner,

    /// Video title shown along the top edge
    Title {
        text: String,
    },

    /// Failure notice, optionally offering a reload
    Notice {
        message: String,
        reloadable: bool,
    },
}

/// The overlay as the host should draw it this frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayScene {
    /// Opacity applied to the whole overlay (0.0 to 1.0)
    pub opacity: f32,
    pub elements: Vec<OverlayElement>,
}

impl OverlayScene {
    fn empty(opacity: f32) -> Self {
        Self {
            opacity,
            elements: Vec::new(),
        }
    }
}

/// Which control a pointer position lands on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlHit {
    PlayPause,
    /// The seek bar, with the fraction of the bar width hit
    SeekBar { fraction: f64 },
    Volume,
    Rate,
    Fullscreen,
    /// The failure notice area
    Notice,
}

/// Control regions for a given viewport
#[derive(Debug, Clone, Copy)]
struct ControlRegions {
    bar: Rect,
    play: Rect,
    time: Rect,
    volume: Rect,
    rate: Rect,
    fullscreen: Rect,
    seek_bar: Rect,
    /// Clickable band around the seek bar, wider than its visual height
    seek_band: Rect,
    notice: Rect,
    title: Rect,
}

fn regions(viewport: (f32, f32), config: &OverlayConfig) -> ControlRegions {
    let (w, h) = viewport;
    let bar = Rect::new(0.0, h - config.controls_height, w, config.controls_height);
    let button_y = bar.y + (bar.h - BUTTON) / 2.0;

    let seek_y = bar.y - 6.0 - config.seek_bar_height;
    let seek_bar = Rect::new(PADDING, seek_y, w - 2.0 * PADDING, config.seek_bar_height);
    let band_h = (config.seek_bar_height * config.seek_click_tolerance).max(config.seek_bar_height);
    let seek_band = Rect::new(
        seek_bar.x,
        seek_bar.y + seek_bar.h / 2.0 - band_h / 2.0,
        seek_bar.w,
        band_h,
    );

    let fullscreen = Rect::new(w - PADDING - BUTTON, button_y, BUTTON, BUTTON);
    let rate = Rect::new(fullscreen.x - 8.0 - BUTTON, button_y, BUTTON, BUTTON);
    let volume = Rect::new(rate.x - 8.0 - BUTTON, button_y, BUTTON, BUTTON);

    let play = Rect::new(PADDING, button_y, BUTTON, BUTTON);
    let time = Rect::new(play.x + BUTTON + 8.0, button_y, TIME_LABEL_WIDTH, BUTTON);

    let notice = Rect::new(w * 0.1, h / 2.0 - 48.0, w * 0.8, 96.0);
    let title = Rect::new(0.0, 0.0, w, 36.0);

    ControlRegions {
        bar,
        play,
        time,
        volume,
        rate,
        fullscreen,
        seek_bar,
        seek_band,
        notice,
        title,
    }
}

/// Find the control under a point, independent of overlay visibility
pub fn hit_test(viewport: (f32, f32), config: &OverlayConfig, x: f32, y: f32) -> Option<ControlHit> {
    let regions = regions(viewport, config);

    if regions.seek_band.contains(x, y) {
        let fraction = ((x - regions.seek_band.x) / regions.seek_band.w).clamp(0.0, 1.0);
        return Some(ControlHit::SeekBar {
            fraction: fraction as f64,
        });
    }
    if regions.play.contains(x, y) {
        return Some(ControlHit::PlayPause);
    }
    if regions.volume.contains(x, y) {
        return Some(ControlHit::Volume);
    }
    if regions.rate.contains(x, y) {
        return Some(ControlHit::Rate);
    }
    if regions.fullscreen.contains(x, y) {
        return Some(ControlHit::Fullscreen);
    }
    if regions.notice.contains(x, y) {
        return Some(ControlHit::Notice);
    }
    None
}

/// Fraction of the seek bar width under a pointer x position
///
/// Used while scrubbing, where the drag tracks horizontal movement
/// regardless of how far the pointer strays vertically.
pub fn scrub_fraction(viewport: (f32, f32), config: &OverlayConfig, x: f32) -> f64 {
    let band = regions(viewport, config).seek_band;
    ((x - band.x) / band.w).clamp(0.0, 1.0) as f64
}

/// Build the overlay scene for the current state
///
/// # Arguments
///
/// * `state` - Canonical player state
/// * `title` - Video title, shown when the config enables it
/// * `viewport` - Container size in logical pixels
/// * `config` - Overlay layout configuration
/// * `opacity` - Visibility from the auto-hide policy
/// * `scrub` - In-progress drag position as a fraction, overriding the
///   played fill while the user scrubs
pub fn build_scene(
    state: &PlayerState,
    title: Option<&str>,
    viewport: (f32, f32),
    config: &OverlayConfig,
    opacity: f32,
    scrub: Option<f64>,
) -> OverlayScene {
    let regions = regions(viewport, config);

    match state.status {
        PlayerStatus::Idle => OverlayScene::empty(opacity),
        PlayerStatus::Loading => {
            let mut scene = OverlayScene::empty(opacity);
            scene.elements.push(spinner(viewport));
            scene
        }
        PlayerStatus::Error => {
            let message = state
                .error_message()
                .unwrap_or("Playback failed")
                .to_string();
            let reloadable = state
                .failure
                .as_ref()
                .map(|f| f.kind.offers_reload())
                .unwrap_or(false);
            // Failure notices ignore the auto-hide opacity
            OverlayScene {
                opacity: 1.0,
                elements: vec![OverlayElement {
                    kind: ElementKind::Notice {
                        message,
                        reloadable,
                    },
                    rect: regions.notice,
                }],
            }
        }
        _ => {
            let mut scene = OverlayScene::empty(opacity);

            if config.show_title {
                if let Some(text) = title {
                    scene.elements.push(OverlayElement {
                        kind: ElementKind::Title {
                            text: text.to_string(),
                        },
                        rect: regions.title,
                    });
                }
            }

            let playing = matches!(state.status, PlayerStatus::Playing | PlayerStatus::Buffering);
            scene.elements.push(OverlayElement {
                kind: ElementKind::PlayPause { playing },
                rect: regions.play,
            });

            let played = scrub.unwrap_or_else(|| fraction_of(state.current_time, state.duration));
            scene.elements.push(OverlayElement {
                kind: ElementKind::SeekBar {
                    played: played.clamp(0.0, 1.0) as f32,
                    buffered: fraction_of(state.buffered_time, state.duration) as f32,
                },
                rect: regions.seek_bar,
            });

            scene.elements.push(OverlayElement {
                kind: ElementKind::TimeLabel {
                    text: format!(
                        "{} / {}",
                        format_media_time(state.current_time),
                        format_media_time(state.duration)
                    ),
                },
                rect: regions.time,
            });

            scene.elements.push(OverlayElement {
                kind: ElementKind::VolumeButton {
                    muted: state.muted,
                    level: state.volume,
                },
                rect: regions.volume,
            });
            scene.elements.push(OverlayElement {
                kind: ElementKind::RateButton {
                    rate: state.playback_rate,
                },
                rect: regions.rate,
            });
            scene.elements.push(OverlayElement {
                kind: ElementKind::FullscreenButton {
                    active: state.fullscreen,
                },
                rect: regions.fullscreen,
            });

            if state.status == PlayerStatus::Buffering {
                scene.elements.push(spinner(viewport));
            }

            scene
        }
    }
}

fn spinner(viewport: (f32, f32)) -> OverlayElement {
    let (w, h) = viewport;
    OverlayElement {
        kind: ElementKind::Spinner,
        rect: Rect::new(w / 2.0 - 24.0, h / 2.0 - 24.0, 48.0, 48.0),
    }
}

fn fraction_of(value: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        (value / duration).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
