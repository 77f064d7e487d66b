//! Unified track model and play queue.
//!
//! A `UnifiedTrack` describes one playable entry regardless of where its
//! audio comes from; the `Queue` keeps insertion order and is idempotent on
//! track ids so the same search result or file cannot be enqueued twice.

use std::path::PathBuf;
use std::time::Duration;

use crate::library::LocalTrack;

/// Which engine is responsible for playing a track.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Decoded and played in-process from a file.
    Local,
    /// Driven through the embedded remote player.
    Remote,
}

/// The resolved media reference behind a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaHandle {
    /// Path to a decodable audio file.
    Path(PathBuf),
    /// Canonical remote video id. May be empty, which marks the track
    /// unplayable (see `backend::remote::canonicalize`).
    Video(String),
}

#[derive(Debug, Clone)]
pub struct UnifiedTrack {
    /// Unique within the queue.
    pub id: String,
    pub title: String,
    pub artist: String,
    pub source: SourceKind,
    pub media: MediaHandle,
    pub cover_art: Option<String>,
    /// Advisory only; the active backend re-derives the real duration.
    pub duration_hint: Option<Duration>,
}

impl UnifiedTrack {
    pub fn from_local(track: &LocalTrack) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_else(|| "Unknown".to_string()),
            source: SourceKind::Local,
            media: MediaHandle::Path(track.path.clone()),
            cover_art: None,
            duration_hint: track.duration,
        }
    }

    /// The bare remote id, if this is a remote track.
    pub fn video_id(&self) -> Option<&str> {
        match &self.media {
            MediaHandle::Video(id) => Some(id.as_str()),
            MediaHandle::Path(_) => None,
        }
    }
}

/// Ordered play queue. Insertion order is the next/previous order.
#[derive(Debug, Default)]
pub struct Queue {
    tracks: Vec<UnifiedTrack>,
}

impl Queue {
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Append a track. Enqueueing an id that is already present is a no-op;
    /// returns whether the queue changed.
    pub fn push(&mut self, track: UnifiedTrack) -> bool {
        if self.position(&track.id).is_some() {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove by id. Safe when the id is absent; returns whether anything
    /// was removed. This never touches playback state.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != id);
        self.tracks.len() != before
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&UnifiedTrack> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[UnifiedTrack] {
        &self.tracks
    }

    /// Replace every local entry with `tracks`, keeping remote entries in
    /// place. Used when a new folder is loaded.
    pub fn replace_local(&mut self, tracks: Vec<UnifiedTrack>) {
        self.tracks.retain(|t| t.source != SourceKind::Local);
        for t in tracks {
            self.push(t);
        }
    }
}
