//! Integration tests for the process-wide runtime loader
//!
//! These tests verify:
//! - Exactly one global loader installs per process
//! - Players built without an explicit loader fall back to the global one
//! - An explicit loader always beats the global fallback
//!
//! The global loader is process state, so these tests live in their own
//! binary and run serially.

use anyhow::Result;
use once_cell::sync::Lazy;
use serial_test::serial;
use std::sync::Arc;

use embedplayer::engine::{EmbedEngine, ScriptedFetcher, SimProbe, SimScript, SimulatedEngine};
use embedplayer::host::HeadlessHost;
use embedplayer::loader::EngineLoader;
use embedplayer::player::{PlayerStatus, VideoPlayer};
use embedplayer_integration_tests::harness::{
    demo_descriptor, test_config, wait_for_status, PlayerHarness,
};
use embedplayer_integration_tests::mock_fetcher::MockFetcher;

/// Install the global loader exactly once for this binary
///
/// The mock enforces at most one runtime fetch no matter how many
/// players mount or which test runs first.
static GLOBAL_PROBE: Lazy<SimProbe> = Lazy::new(|| {
    let engine = Arc::new(SimulatedEngine::new(SimScript::default()));
    let probe = engine.probe();
    let shared: Arc<dyn EmbedEngine> = engine;

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move || Ok(shared.clone()));

    assert!(
        EngineLoader::install_global(Arc::new(EngineLoader::new(Arc::new(fetcher)))),
        "another loader was installed first"
    );
    probe
});

#[tokio::test]
#[serial]
async fn test_global_loader_installs_once() -> Result<()> {
    Lazy::force(&GLOBAL_PROBE);

    // A later install loses and the first loader stays in place
    let engine = Arc::new(SimulatedEngine::new(SimScript::default()));
    let fetcher = Arc::new(ScriptedFetcher::new(engine));
    let loser = Arc::new(EngineLoader::new(fetcher.clone()));
    assert!(!EngineLoader::install_global(loser));
    assert!(EngineLoader::global().is_some());
    assert_eq!(fetcher.fetch_count(), 0);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_players_fall_back_to_global_loader() -> Result<()> {
    Lazy::force(&GLOBAL_PROBE);
    let created_before = GLOBAL_PROBE.create_count();

    // No explicit loader on either builder
    let mut first = VideoPlayer::builder(demo_descriptor())
        .config(test_config())
        .host(Arc::new(HeadlessHost::new()))
        .build()?;
    let mut second = VideoPlayer::builder(demo_descriptor())
        .config(test_config())
        .host(Arc::new(HeadlessHost::new()))
        .build()?;

    first.mount();
    second.mount();
    wait_for_status(&first, PlayerStatus::Paused).await;
    wait_for_status(&second, PlayerStatus::Paused).await;

    // Both players got their own embedded player out of the shared
    // runtime; the mock would fail a second fetch
    assert_eq!(GLOBAL_PROBE.create_count(), created_before + 2);

    first.unmount().await;
    second.unmount().await;

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_explicit_loader_overrides_global() -> Result<()> {
    Lazy::force(&GLOBAL_PROBE);
    let created_before = GLOBAL_PROBE.create_count();

    let mut h = PlayerHarness::builder().build()?;
    h.player.mount();
    wait_for_status(&h.player, PlayerStatus::Paused).await;

    // The harness loader took the fetch; the global runtime saw nothing
    assert_eq!(h.fetcher.fetch_count(), 1);
    assert_eq!(GLOBAL_PROBE.create_count(), created_before);

    Ok(())
}
