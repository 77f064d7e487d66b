use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LocalTrack {
    /// Stable id derived from the file path; unique within one scan.
    pub id: String,
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// From the tag header. The backend re-derives the authoritative value
    /// from the decoder once the track is actually playing.
    pub duration: Option<Duration>,
}

/// Derive a stable track id from a path.
pub fn track_id_for_path(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("local-{:016x}", hasher.finish())
}
