//! URL shape matching for the supported providers
//!
//! Resolution tries an ordered list of pattern matchers and returns the
//! first match. The same input always yields the same result; anything
//! unmatched is an unresolved source, which is fatal for the player
//! instance but not for the host application.

use url::Url;

use crate::source::{ProviderKind, ResolvedSource, VideoDescriptor};
use crate::utils::error::{EmbedPlayerError, Result};

/// Resolve a descriptor into a provider-specific media identifier.
///
/// An explicit identifier on the descriptor takes precedence over URL
/// matching and is validated against the known id shapes.
///
/// # Arguments
///
/// * `descriptor` - Video metadata handed over by the host application
///
/// # Returns
///
/// The resolved source, or `UnresolvedSource` when nothing matches
pub fn resolve(descriptor: &VideoDescriptor) -> Result<ResolvedSource> {
    if let Some(explicit) = &descriptor.explicit_id {
        return match_bare_id(explicit.trim())
            .ok_or_else(|| EmbedPlayerError::unresolved(explicit.clone()));
    }

    resolve_url(&descriptor.raw_url)
}

/// Resolve a raw URL string into a provider-specific media identifier.
///
/// Matchers are tried in order: provider URL shapes first (long-form watch
/// URL, short link, embed path), then bare identifiers (11-character id,
/// all-digit id). Scheme-less inputs that look like URLs are retried with
/// an https prefix before falling through to the bare matchers.
pub fn resolve_url(input: &str) -> Result<ResolvedSource> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EmbedPlayerError::unresolved(input));
    }

    if let Some(source) = parse_as_url(trimmed).as_ref().and_then(match_parsed) {
        return Ok(source);
    }

    if let Some(source) = match_bare_id(trimmed) {
        return Ok(source);
    }

    Err(EmbedPlayerError::unresolved(input))
}

/// Parse the input as a URL, retrying scheme-less host-like strings
fn parse_as_url(input: &str) -> Option<Url> {
    match Url::parse(input) {
        Ok(url) => Some(url),
        Err(_) if input.contains('/') || input.contains('.') => {
            Url::parse(&format!("https://{}", input)).ok()
        }
        Err(_) => None,
    }
}

/// Run the host-specific matchers against a parsed URL
fn match_parsed(url: &Url) -> Option<ResolvedSource> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    match host {
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match_youtube_paths(url)
        }
        "youtu.be" => first_segment(url)
            .filter(|id| is_youtube_id(id))
            .map(|id| ResolvedSource::new(ProviderKind::YouTube, id)),
        "vimeo.com" => digit_segment(url)
            .map(|id| ResolvedSource::new(ProviderKind::Vimeo, id)),
        "player.vimeo.com" => match_vimeo_player_path(url),
        _ => None,
    }
}

/// Long-form watch URL and the path-embedded id shapes
fn match_youtube_paths(url: &Url) -> Option<ResolvedSource> {
    if url.path() == "/watch" {
        let id = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?;
        return Some(id)
            .filter(|id| is_youtube_id(id))
            .map(|id| ResolvedSource::new(ProviderKind::YouTube, id));
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["embed", id] | ["shorts", id] | ["live", id] | ["v", id] if is_youtube_id(id) => {
            Some(ResolvedSource::new(ProviderKind::YouTube, *id))
        }
        _ => None,
    }
}

/// player.vimeo.com/video/<digits>
fn match_vimeo_player_path(url: &Url) -> Option<ResolvedSource> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["video", id] if is_numeric_id(id) => {
            Some(ResolvedSource::new(ProviderKind::Vimeo, *id))
        }
        _ => None,
    }
}

/// Bare identifiers: 11-character id first, then all-digit id
fn match_bare_id(input: &str) -> Option<ResolvedSource> {
    if is_youtube_id(input) {
        return Some(ResolvedSource::new(ProviderKind::YouTube, input));
    }
    if is_numeric_id(input) {
        return Some(ResolvedSource::new(ProviderKind::Vimeo, input));
    }
    None
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// First all-digit path segment, covering /<id> and /channels/<name>/<id>
fn digit_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| is_numeric_id(s))
        .map(|s| s.to_string())
}

fn is_youtube_id(s: &str) -> bool {
    s.len() == 11
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
