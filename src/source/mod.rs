//! Source resolution module for EmbedPlayer
//!
//! This module turns the raw video metadata handed over by the host
//! application into a provider-specific media identifier. Resolution is
//! deterministic and happens exactly once per mount; everything downstream
//! works with the immutable [`ResolvedSource`].

pub mod resolver;

pub use resolver::{resolve, resolve_url};

use serde::{Deserialize, Serialize};

/// Video providers with a known embeddable player runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// YouTube-style provider: 11-character alphanumeric media ids
    YouTube,

    /// Vimeo-style provider: numeric media ids
    Vimeo,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::YouTube => write!(f, "youtube"),
            ProviderKind::Vimeo => write!(f, "vimeo"),
        }
    }
}

/// A provider plus the media identifier extracted from the descriptor.
///
/// Derived once by the resolver and immutable afterwards. Resolution
/// failure produces no `ResolvedSource` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    /// Which provider runtime can play this media
    pub provider: ProviderKind,

    /// Provider-specific media identifier
    pub media_id: String,
}

impl ResolvedSource {
    pub fn new(provider: ProviderKind, media_id: impl Into<String>) -> Self {
        Self {
            provider,
            media_id: media_id.into(),
        }
    }
}

impl std::fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.media_id)
    }
}

/// Immutable video metadata handed over by the host application.
///
/// Created by the caller and never mutated by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    /// Host-application identifier for this video
    pub id: String,

    /// Display title
    pub title: String,

    /// Raw URL as entered upstream; resolution input unless an explicit id is set
    pub raw_url: String,

    /// Explicit media identifier, taking precedence over URL matching
    #[serde(default)]
    pub explicit_id: Option<String>,

    /// Expected duration in seconds, when known upstream
    #[serde(default)]
    pub duration_hint: Option<f64>,

    /// Content category label
    #[serde(default)]
    pub category: String,

    /// Faculty or department attribution
    #[serde(default)]
    pub faculty: Option<String>,
}

impl VideoDescriptor {
    /// Create a descriptor from the fields every caller has
    pub fn new(id: impl Into<String>, title: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            raw_url: raw_url.into(),
            explicit_id: None,
            duration_hint: None,
            category: String::new(),
            faculty: None,
        }
    }

    /// Set an explicit media identifier that bypasses URL matching
    pub fn with_explicit_id(mut self, media_id: impl Into<String>) -> Self {
        self.explicit_id = Some(media_id.into());
        self
    }

    /// Set the expected duration in seconds
    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }
}
