//! Remote playback backend.
//!
//! Drives an embedded provider player through the [`RemoteDevice`] seam.
//! The device initializes asynchronously, so a load requested before it
//! reports ready is parked and replayed on the ready event instead of being
//! dropped or sent into the void.

mod device;
mod ident;

pub use device::{DeviceEvent, DeviceFactory, RemoteDevice, RemoteError};
pub use ident::canonicalize;

use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::PlaybackBackend;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RemoteState {
    /// Device mounted but not yet ready for loads.
    Uninitialized,
    /// Idle and accepting loads.
    Ready,
    Playing,
    Paused,
    /// The last video ran to its end.
    Ended,
    /// A classified provider error; stays here until the next load.
    Error,
}

/// What the controller must react to after a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Ended,
    Failed(RemoteError),
}

pub struct RemoteBackend {
    factory: DeviceFactory,
    device: Option<Box<dyn RemoteDevice>>,
    state: RemoteState,
    /// Video id parked until the device reports ready.
    pending: Option<String>,
    volume: f32,
}

impl RemoteBackend {
    pub fn new(factory: DeviceFactory) -> Self {
        Self {
            factory,
            device: None,
            state: RemoteState::Uninitialized,
            pending: None,
            volume: 1.0,
        }
    }

    pub fn state(&self) -> RemoteState {
        self.state
    }

    /// Mount a device if none exists. With `recreate` the current device is
    /// torn down first; used to recover a wedged player.
    pub fn ensure_mounted(&mut self, recreate: bool) {
        if self.device.is_some() && !recreate {
            return;
        }
        if self.device.is_some() {
            debug!("remounting remote device");
        }
        self.device = Some((self.factory)());
        self.state = RemoteState::Uninitialized;
        self.pending = None;
    }

    /// Load a canonical video id and start playing. Callers canonicalize
    /// first; an empty id is a hard precondition violation and is rejected
    /// without touching the device.
    pub fn load_and_play(&mut self, video_id: &str) -> Result<(), RemoteError> {
        if video_id.is_empty() {
            return Err(RemoteError::InvalidId);
        }
        self.ensure_mounted(false);
        if self.state == RemoteState::Uninitialized {
            debug!(video_id, "device not ready, parking load");
            self.pending = Some(video_id.to_string());
            return Ok(());
        }
        self.start(video_id);
        Ok(())
    }

    fn start(&mut self, video_id: &str) {
        let volume = self.volume;
        if let Some(device) = self.device.as_mut() {
            device.load(video_id);
            device.set_volume(volume);
            device.play();
            // Optimistic; corrected by the next polled event if wrong.
            self.state = RemoteState::Playing;
        }
    }

    /// Drain device events, advance the state machine, and report what the
    /// controller has to act on.
    pub fn poll(&mut self) -> Vec<RemoteEvent> {
        let Some(device) = self.device.as_mut() else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for event in device.poll_events() {
            match event {
                DeviceEvent::Ready => {
                    if self.state == RemoteState::Uninitialized {
                        self.state = RemoteState::Ready;
                    }
                    if let Some(video_id) = self.pending.take() {
                        self.start(&video_id);
                    }
                }
                DeviceEvent::Playing => self.state = RemoteState::Playing,
                DeviceEvent::Paused => self.state = RemoteState::Paused,
                DeviceEvent::Ended => {
                    self.state = RemoteState::Ended;
                    out.push(RemoteEvent::Ended);
                }
                DeviceEvent::Error(code) => match RemoteError::from_code(code) {
                    Some(error) => {
                        warn!(code, %error, "remote playback failed");
                        self.state = RemoteState::Error;
                        out.push(RemoteEvent::Failed(error));
                    }
                    None => debug!(code, "ignoring unclassified player code"),
                },
            }
        }
        out
    }

    fn device_mut(&mut self) -> Option<&mut Box<dyn RemoteDevice>> {
        self.device.as_mut()
    }
}

impl PlaybackBackend for RemoteBackend {
    fn resume(&mut self) {
        if matches!(self.state, RemoteState::Paused | RemoteState::Ended)
            && let Some(device) = self.device_mut()
        {
            device.play();
            self.state = RemoteState::Playing;
        }
    }

    fn pause(&mut self) {
        if self.state == RemoteState::Playing
            && let Some(device) = self.device_mut()
        {
            device.pause();
            self.state = RemoteState::Paused;
        }
    }

    fn toggle_play_pause(&mut self) {
        match self.state {
            RemoteState::Playing => self.pause(),
            RemoteState::Paused | RemoteState::Ended => self.resume(),
            _ => {}
        }
    }

    fn stop(&mut self) {
        self.pending = None;
        if let Some(device) = self.device_mut() {
            device.stop();
            // Whatever the old playback left queued is stale now; readiness
            // is the one event that must survive the flush.
            let became_ready = device
                .poll_events()
                .iter()
                .any(|e| *e == DeviceEvent::Ready);
            if self.state != RemoteState::Uninitialized || became_ready {
                self.state = RemoteState::Ready;
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        if matches!(self.state, RemoteState::Playing | RemoteState::Paused)
            && let Some(device) = self.device_mut()
        {
            device.seek(position);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        let volume = self.volume;
        if let Some(device) = self.device_mut() {
            device.set_volume(volume);
        }
    }

    fn position(&self) -> Duration {
        self.device.as_ref().map(|d| d.position()).unwrap_or_default()
    }

    fn duration(&self) -> Option<Duration> {
        self.device.as_ref().and_then(|d| d.duration())
    }

    fn is_playing(&self) -> bool {
        self.state == RemoteState::Playing
    }
}

#[cfg(test)]
mod tests;
