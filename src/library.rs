//! Local library: folder scanning and track metadata.
//!
//! Scanning walks a folder for audio files and reads tags with lofty; the
//! resulting `LocalTrack`s are what the local backend plays and what
//! `UnifiedTrack::from_local` lifts into the shared queue.

mod model;
mod scan;

pub use model::*;
pub use scan::scan;
