//! Playback backends.
//!
//! `local` decodes files on a dedicated audio thread; `remote` drives an
//! embedded provider player through the [`remote::RemoteDevice`] seam. Both
//! expose the same transport verbs through [`PlaybackBackend`] so the
//! controller can dispatch without caring which one is active.

pub mod local;
pub mod remote;

use std::time::Duration;

/// Transport verbs shared by both backends. Every method is safe to call in
/// any state; a verb that does not apply right now is a no-op.
pub trait PlaybackBackend {
    fn resume(&mut self);
    fn pause(&mut self);
    fn toggle_play_pause(&mut self);
    fn stop(&mut self);
    /// Absolute position.
    fn seek(&mut self, position: Duration);
    /// Clamped to 0..1.
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn is_playing(&self) -> bool;
}
