//! EmbedPlayer - a provider-agnostic playback control layer for
//! externally-hosted embeddable video players
//!
//! The crate is organized around the seams of an embedded playback
//! session:
//! - [`source`] resolves raw video metadata to a provider and media id
//! - [`loader`] fetches the provider runtime once per process
//! - [`engine`] abstracts the players that runtime creates
//! - [`player`] owns the canonical playback state and the session task
//!   that keeps it true
//! - [`controls`] maps user input to playback intents and builds the
//!   overlay scene
//! - [`host`] is the surface the embedder mounts the player into

pub mod controls;
pub mod engine;
pub mod host;
pub mod loader;
pub mod player;
pub mod source;
pub mod utils;
