//! Unified playback controller.
//!
//! One façade over the local and remote backends: a single queue, a single
//! current track, one set of transport verbs, and a host-driven `tick` that
//! pumps remote events, fires deferred error recovery and refreshes the
//! published snapshot.

mod controller;

pub use controller::{PlaybackSnapshot, PlayerNotice, UnifiedPlayer};
