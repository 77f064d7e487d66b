//! duet: a unified playback engine.
//!
//! One queue and one set of transport controls over two very different
//! sources: local audio files decoded in-process (with a multi-band
//! equalizer and a frequency analyzer in the signal path) and remote
//! videos driven through an embedded provider player. The host owns the
//! shell around the engine: it supplies the remote device, calls
//! [`UnifiedPlayer::tick`] on an interval and renders the published
//! snapshot.

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod eq;
pub mod export;
pub mod library;
pub mod player;
pub mod queue;
pub mod search;

pub use player::{PlaybackSnapshot, PlayerNotice, UnifiedPlayer};
pub use queue::{MediaHandle, SourceKind, UnifiedTrack};
