//! Streaming search seam.
//!
//! The engine never talks to a provider API itself; the host supplies a
//! [`SearchProvider`] and the engine converts its results into queueable
//! tracks. Provider failure is folded into an empty result list so the UI
//! path does not need an error branch.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::backend::remote::canonicalize;
use crate::queue::{MediaHandle, SourceKind, UnifiedTrack};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search provider failed: {0}")]
    Provider(String),
}

/// One remote search hit, as the provider reports it.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Provider-scoped track id, already unique across sources.
    pub id: String,
    pub name: String,
    pub artist: String,
    pub duration: Option<Duration>,
    pub cover_url: Option<String>,
    /// Raw provider video identifier; may be a bare id, a prefixed id or a
    /// share URL. Canonicalized on conversion.
    pub external_id: String,
}

pub trait SearchProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Run a search, folding provider errors into "no results".
pub fn search_or_empty(provider: &dyn SearchProvider, query: &str, limit: usize) -> Vec<SearchResult> {
    match provider.search(query, limit) {
        Ok(results) => results,
        Err(e) => {
            warn!(query, "search failed, returning no results: {e}");
            Vec::new()
        }
    }
}

impl SearchResult {
    /// Convert into a queueable remote track. The media handle holds the
    /// canonical video id, which may be empty for an unusable hit; the
    /// controller's play path handles that case.
    pub fn into_track(self) -> UnifiedTrack {
        let video_id = canonicalize(&self.external_id);
        UnifiedTrack {
            id: self.id,
            title: clean_title(&self.name),
            artist: self.artist,
            source: SourceKind::Remote,
            media: MediaHandle::Video(video_id),
            cover_art: self.cover_url,
            duration_hint: self.duration,
        }
    }
}

/// Strip upload-style noise like "(Official Video)" or "[Lyric Video]"
/// from a provider title.
pub fn clean_title(title: &str) -> String {
    const NOISE: [&str; 6] = ["official", "lyric", "lyrics", "audio", "video", "visualizer"];

    let mut out = String::with_capacity(title.len());
    let mut rest = title;
    while let Some(open) = rest.find(['(', '[']) {
        let close_char = if rest.as_bytes()[open] == b'(' { ')' } else { ']' };
        let Some(close) = rest[open..].find(close_char).map(|i| open + i) else {
            break;
        };
        let inner = rest[open + 1..close].trim().to_ascii_lowercase();
        let noisy = NOISE.iter().any(|n| inner.starts_with(n) || inner.ends_with(n));

        out.push_str(&rest[..open]);
        if !noisy {
            out.push_str(&rest[open..=close]);
        }
        rest = &rest[close + close_char.len_utf8()..];
    }
    out.push_str(rest);

    let cleaned = out.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned
    }
}
