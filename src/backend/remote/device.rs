use std::time::Duration;

use thiserror::Error;

/// Events surfaced by the embedded player, drained once per engine tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The player finished initializing and will accept loads.
    Ready,
    Playing,
    Paused,
    /// The current video ran out on its own.
    Ended,
    /// Numeric provider error code, see [`RemoteError::from_code`].
    Error(u32),
}

/// Seam over the embedded provider player. The real device lives in the
/// host shell; the engine only ever sees this trait, which also makes the
/// whole remote path scriptable in tests.
pub trait RemoteDevice: Send {
    fn load(&mut self, video_id: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    /// Drain every event produced since the last poll.
    fn poll_events(&mut self) -> Vec<DeviceEvent>;
}

/// Builds a fresh device, used on first mount and whenever the backend has
/// to tear a wedged player down and remount it.
pub type DeviceFactory = Box<dyn FnMut() -> Box<dyn RemoteDevice> + Send>;

/// Classified provider playback failures. Every one of these makes the
/// current video unplayable and triggers the controller's skip recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("invalid video id")]
    InvalidId,
    #[error("player internal error")]
    PlayerInternal,
    #[error("video unavailable")]
    Unavailable,
    #[error("video cannot be played embedded")]
    EmbedRestricted,
}

impl RemoteError {
    /// Map a numeric provider code onto a classified error. Codes outside
    /// the known set are not fatal and map to `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            2 => Some(Self::InvalidId),
            5 => Some(Self::PlayerInternal),
            101 => Some(Self::Unavailable),
            150 => Some(Self::EmbedRestricted),
            _ => None,
        }
    }
}
