//! Integration tests for the controls overlay and host input
//!
//! These tests verify the overlay against a live player session:
//! - Pointer and touch interaction with the rendered scene
//! - Auto-hide behaviour during playback
//! - Scrubbing, keyboard shortcuts, and fullscreen round-trips
//! - The failure notice and native-controls passthrough

use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use embedplayer::controls::{ControlIntent, ElementKind};
use embedplayer::host::{Key, KeyModifiers};
use embedplayer::player::{PlayerStatus, VideoPlayer};
use embedplayer_integration_tests::callback_log::CallbackLog;
use embedplayer_integration_tests::harness::{wait_for_status, wait_until, PlayerHarness};

/// Center of the first scene element the picker matches
fn center_of(player: &VideoPlayer, pick: fn(&ElementKind) -> bool) -> (f32, f32) {
    let scene = player.scene(Instant::now());
    let rect = scene
        .elements
        .iter()
        .find(|e| pick(&e.kind))
        .map(|e| e.rect)
        .expect("element not in scene");
    (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
}

fn opacity(player: &VideoPlayer) -> f32 {
    player.scene(Instant::now()).opacity
}

fn seek_bar_played(player: &VideoPlayer) -> Option<f32> {
    player
        .scene(Instant::now())
        .elements
        .iter()
        .find_map(|e| match e.kind {
            ElementKind::SeekBar { played, .. } => Some(played),
            _ => None,
        })
}

/// Parsed values of every seek command the engine received
fn seek_values(h: &PlayerHarness) -> Vec<f64> {
    h.probe
        .commands()
        .iter()
        .filter_map(|c| c.strip_prefix("seek ").and_then(|v| v.parse().ok()))
        .collect()
}

#[tokio::test]
async fn test_play_button_click_toggles_playback() -> Result<()> {
    let mut h = PlayerHarness::builder().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    let (x, y) = center_of(&h.player, |k| matches!(k, ElementKind::PlayPause { .. }));
    h.host.pointer_down(x, y);
    h.host.pointer_up(x, y);
    wait_for_status(&h.player, PlayerStatus::Playing).await;

    h.host.pointer_down(x, y);
    h.host.pointer_up(x, y);
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    assert_eq!(h.probe.command_count("play"), 1);
    assert_eq!(h.probe.command_count("pause"), 1);

    Ok(())
}

#[tokio::test]
async fn test_hidden_overlay_still_takes_clicks() -> Result<()> {
    let mut h = PlayerHarness::builder().autoplay().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Playing).await;

    // Let the auto-hide delay and fade run out
    sleep(Duration::from_millis(600)).await;
    assert_eq!(opacity(&h.player), 0.0);

    // Hit-testing ignores opacity, so the click still lands
    let (x, y) = center_of(&h.player, |k| matches!(k, ElementKind::PlayPause { .. }));
    h.host.pointer_down(x, y);
    h.host.pointer_up(x, y);
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    // And the press revealed the controls again
    assert_eq!(opacity(&h.player), 1.0);

    Ok(())
}

#[tokio::test]
async fn test_overlay_hides_only_while_playing() -> Result<()> {
    let mut h = PlayerHarness::builder().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    // Paused players keep their controls up no matter how long
    sleep(Duration::from_millis(600)).await;
    assert_eq!(opacity(&h.player), 1.0);

    h.player.dispatch(ControlIntent::TogglePlay);
    wait_for_status(&h.player, PlayerStatus::Playing).await;
    sleep(Duration::from_millis(600)).await;
    assert_eq!(opacity(&h.player), 0.0);

    // Pointer activity brings them back
    h.host.pointer_move(640.0, 500.0);
    wait_until("controls revealed", || opacity(&h.player) == 1.0).await;

    Ok(())
}

#[tokio::test]
async fn test_touch_reveal_act_dismiss_cycle() -> Result<()> {
    let mut h = PlayerHarness::builder().touch_host().autoplay().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Playing).await;

    // Without hover there is no inactivity countdown: quiet playback
    // leaves the controls at full opacity
    sleep(Duration::from_millis(600)).await;
    assert_eq!(opacity(&h.player), 1.0);

    // So taps act on the control they hit straight away
    let (x, y) = center_of(&h.player, |k| matches!(k, ElementKind::PlayPause { .. }));
    h.host.tap(x, y);
    wait_for_status(&h.player, PlayerStatus::Paused).await;
    h.host.tap(x, y);
    wait_for_status(&h.player, PlayerStatus::Playing).await;

    // A background tap dismisses during playback
    h.host.tap(400.0, 500.0);
    wait_until("controls dismissed", || opacity(&h.player) == 0.0).await;
    assert_eq!(h.player.status(), PlayerStatus::Playing);

    // While hidden the next tap only reveals, even on a control
    h.host.tap(x, y);
    wait_until("controls revealed", || opacity(&h.player) == 1.0).await;
    assert_eq!(h.player.status(), PlayerStatus::Playing);
    assert_eq!(h.probe.command_count("pause"), 1);

    // And they stay up with no further interaction
    sleep(Duration::from_millis(600)).await;
    assert_eq!(opacity(&h.player), 1.0);

    Ok(())
}

#[tokio::test]
async fn test_scrub_issues_single_seek_on_release() -> Result<()> {
    let mut h = PlayerHarness::builder().autoplay().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Playing).await;

    // Press on the seek band at 20% of the width
    h.host.pointer_down(263.2, 664.0);

    // Drag to the middle; vertical stray must not cancel the scrub, and
    // the preview fill follows the pointer instead of the playhead
    h.host.pointer_move(640.0, 400.0);
    wait_until("scrub preview at half", || {
        seek_bar_played(&h.player).is_some_and(|p| (p - 0.5).abs() < 1.0e-3)
    })
    .await;
    assert_eq!(h.probe.command_count("seek"), 0);

    // Release at 80%; exactly one seek goes out
    h.host.pointer_move(1016.8, 664.0);
    h.host.pointer_up(1016.8, 664.0);
    wait_until("seek issued", || h.probe.command_count("seek") == 1).await;

    let seeks = seek_values(&h);
    assert_eq!(seeks.len(), 1);
    assert!(
        (seeks[0] - 240.0).abs() < 0.5,
        "seek went to {} instead of ~240",
        seeks[0]
    );

    // Playback resumes from the new position
    wait_until("position after seek", || {
        let t = h.player.state().current_time;
        (239.0..=250.0).contains(&t)
    })
    .await;
    assert_eq!(h.probe.command_count("seek"), 1);

    Ok(())
}

#[tokio::test]
async fn test_keyboard_shortcuts_drive_playback() -> Result<()> {
    let mut h = PlayerHarness::builder().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    h.host.key(Key::Space);
    wait_for_status(&h.player, PlayerStatus::Playing).await;
    wait_until("first poll", || h.player.state().current_time > 0.0).await;

    // Right arrow steps forward by the configured ten seconds
    h.host.key(Key::Right);
    wait_until("seek issued", || h.probe.command_count("seek") == 1).await;
    let seeks = seek_values(&h);
    assert!(
        (seeks[0] - 10.0).abs() < 2.0,
        "step seek went to {}",
        seeks[0]
    );

    // Volume up from the default 70
    h.host.key(Key::Up);
    wait_until("volume raised", || h.player.state().volume == 75).await;

    h.host.key(Key::M);
    wait_until("muted", || h.player.state().muted).await;

    h.host.key(Key::F);
    wait_until("fullscreen entered", || h.player.state().fullscreen).await;
    h.host.key(Key::Escape);
    wait_until("fullscreen left", || !h.player.state().fullscreen).await;

    // Number keys jump to tenths of the duration
    h.host.key(Key::Num5);
    wait_until("fraction seek issued", || h.probe.command_count("seek") == 2).await;
    let seeks = seek_values(&h);
    assert!(
        (seeks[1] - 150.0).abs() < 1.0,
        "fraction seek went to {}",
        seeks[1]
    );

    // Chorded keys are left for the embedding application
    h.host.key_with_modifiers(
        Key::Space,
        KeyModifiers {
            ctrl: true,
            ..Default::default()
        },
    );
    sleep(Duration::from_millis(60)).await;
    assert_eq!(h.player.status(), PlayerStatus::Playing);
    assert_eq!(h.probe.command_count("pause"), 0);

    Ok(())
}

#[tokio::test]
async fn test_rejected_fullscreen_leaves_state_unchanged() -> Result<()> {
    let mut h = PlayerHarness::builder().reject_fullscreen().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    h.host.key(Key::F);
    sleep(Duration::from_millis(80)).await;
    assert!(!h.player.state().fullscreen);

    Ok(())
}

#[tokio::test]
async fn test_host_fullscreen_changes_mirror_into_state() -> Result<()> {
    let mut h = PlayerHarness::builder().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    // The host may change fullscreen on its own, e.g. the user pressing
    // the platform shortcut
    h.host.force_fullscreen_change(true);
    wait_until("fullscreen on", || h.player.state().fullscreen).await;

    h.host.force_fullscreen_change(false);
    wait_until("fullscreen off", || !h.player.state().fullscreen).await;

    Ok(())
}

#[tokio::test]
async fn test_notice_click_requests_reload() -> Result<()> {
    let log = CallbackLog::new();
    let mut h = PlayerHarness::builder()
        .failing_fetches(1)
        .callbacks(CallbackLog::callbacks(&log))
        .build()?;

    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Error).await;

    // The failure scene is a reloadable notice at full opacity
    let scene = h.player.scene(Instant::now());
    assert_eq!(scene.opacity, 1.0);
    assert!(scene.elements.iter().any(|e| matches!(
        e.kind,
        ElementKind::Notice {
            reloadable: true,
            ..
        }
    )));

    // Clicking it asks the embedder to reload
    let (x, y) = center_of(&h.player, |k| matches!(k, ElementKind::Notice { .. }));
    h.host.pointer_down(x, y);
    h.host.pointer_up(x, y);
    wait_until("reload requested", || log.reloads() == 1).await;

    // The embedder then drives the actual reload
    h.player.reload().await;
    wait_for_status(&h.player, PlayerStatus::Paused).await;
    assert_eq!(h.fetcher.fetch_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_native_controls_render_nothing() -> Result<()> {
    let mut h = PlayerHarness::builder().native_controls().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    let scene = h.player.scene(Instant::now());
    assert!(scene.elements.is_empty());

    // Host input passes through to the provider surface untouched
    h.host.pointer_down(28.0, 696.0);
    h.host.pointer_up(28.0, 696.0);
    sleep(Duration::from_millis(60)).await;
    assert_eq!(h.player.status(), PlayerStatus::Paused);
    assert_eq!(h.probe.command_count("play"), 0);

    // Programmatic intents still work without the overlay
    h.player.dispatch(ControlIntent::TogglePlay);
    wait_for_status(&h.player, PlayerStatus::Playing).await;
    assert!(h.player.scene(Instant::now()).elements.is_empty());

    Ok(())
}
