use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::PlaybackBackend;

use super::{DeviceEvent, RemoteBackend, RemoteDevice, RemoteError, RemoteEvent, RemoteState};

#[derive(Default)]
struct FakeInner {
    events: VecDeque<DeviceEvent>,
    calls: Vec<String>,
    loaded: Option<String>,
    devices_built: usize,
}

#[derive(Clone, Default)]
struct FakeHandle(Arc<Mutex<FakeInner>>);

impl FakeHandle {
    fn push(&self, event: DeviceEvent) {
        self.0.lock().unwrap().events.push_back(event);
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    fn loaded(&self) -> Option<String> {
        self.0.lock().unwrap().loaded.clone()
    }

    fn devices_built(&self) -> usize {
        self.0.lock().unwrap().devices_built
    }

    fn factory(&self) -> super::DeviceFactory {
        let handle = self.clone();
        Box::new(move || {
            handle.0.lock().unwrap().devices_built += 1;
            Box::new(FakeDevice(handle.clone())) as Box<dyn RemoteDevice>
        })
    }
}

struct FakeDevice(FakeHandle);

impl RemoteDevice for FakeDevice {
    fn load(&mut self, video_id: &str) {
        let mut inner = self.0.0.lock().unwrap();
        inner.calls.push(format!("load:{video_id}"));
        inner.loaded = Some(video_id.to_string());
    }

    fn play(&mut self) {
        self.0.0.lock().unwrap().calls.push("play".into());
    }

    fn pause(&mut self) {
        self.0.0.lock().unwrap().calls.push("pause".into());
    }

    fn stop(&mut self) {
        self.0.0.lock().unwrap().calls.push("stop".into());
    }

    fn seek(&mut self, position: Duration) {
        self.0.0.lock().unwrap().calls.push(format!("seek:{}", position.as_millis()));
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.0.lock().unwrap().calls.push(format!("volume:{volume:.2}"));
    }

    fn position(&self) -> Duration {
        Duration::from_secs(12)
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs(240))
    }

    fn poll_events(&mut self) -> Vec<DeviceEvent> {
        self.0.0.lock().unwrap().events.drain(..).collect()
    }
}

#[test]
fn empty_id_is_rejected_without_touching_the_device() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    assert_eq!(backend.load_and_play(""), Err(RemoteError::InvalidId));
    assert!(handle.calls().is_empty());
    assert_eq!(handle.devices_built(), 0);
}

#[test]
fn load_before_ready_is_parked_and_replayed_on_ready() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    backend.load_and_play("dQw4w9WgXcQ").unwrap();
    assert_eq!(backend.state(), RemoteState::Uninitialized);
    assert!(handle.calls().is_empty());

    handle.push(DeviceEvent::Ready);
    let events = backend.poll();
    assert!(events.is_empty());
    assert_eq!(backend.state(), RemoteState::Playing);
    assert_eq!(handle.loaded().as_deref(), Some("dQw4w9WgXcQ"));
    assert!(handle.calls().iter().any(|c| c == "play"));
}

#[test]
fn load_after_ready_fires_immediately() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    backend.ensure_mounted(false);
    handle.push(DeviceEvent::Ready);
    backend.poll();

    backend.load_and_play("dQw4w9WgXcQ").unwrap();
    assert_eq!(backend.state(), RemoteState::Playing);
    assert_eq!(handle.loaded().as_deref(), Some("dQw4w9WgXcQ"));
}

#[test]
fn classified_errors_surface_to_the_controller() {
    for (code, expected) in [
        (2, RemoteError::InvalidId),
        (5, RemoteError::PlayerInternal),
        (101, RemoteError::Unavailable),
        (150, RemoteError::EmbedRestricted),
    ] {
        let handle = FakeHandle::default();
        let mut backend = RemoteBackend::new(handle.factory());
        backend.ensure_mounted(false);
        handle.push(DeviceEvent::Ready);
        backend.poll();
        backend.load_and_play("dQw4w9WgXcQ").unwrap();

        handle.push(DeviceEvent::Error(code));
        let events = backend.poll();
        assert_eq!(events, vec![RemoteEvent::Failed(expected)]);
        assert_eq!(backend.state(), RemoteState::Error);
    }
}

#[test]
fn unclassified_codes_are_ignored() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());
    backend.ensure_mounted(false);
    handle.push(DeviceEvent::Ready);
    backend.poll();
    backend.load_and_play("dQw4w9WgXcQ").unwrap();

    handle.push(DeviceEvent::Error(42));
    assert!(backend.poll().is_empty());
    assert_eq!(backend.state(), RemoteState::Playing);
}

#[test]
fn ended_event_is_reported_once() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());
    backend.ensure_mounted(false);
    handle.push(DeviceEvent::Ready);
    backend.poll();
    backend.load_and_play("dQw4w9WgXcQ").unwrap();

    handle.push(DeviceEvent::Ended);
    assert_eq!(backend.poll(), vec![RemoteEvent::Ended]);
    assert!(backend.poll().is_empty());
    assert_eq!(backend.state(), RemoteState::Ended);
}

#[test]
fn stop_clears_a_parked_load() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    backend.load_and_play("dQw4w9WgXcQ").unwrap();
    backend.stop();

    handle.push(DeviceEvent::Ready);
    backend.poll();
    assert_eq!(handle.loaded(), None);
}

#[test]
fn stop_before_ready_does_not_fake_readiness() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    backend.load_and_play("aaaaaaaaaaa").unwrap();
    backend.stop();
    assert_eq!(backend.state(), RemoteState::Uninitialized);

    // The next load must park too; the device never reported ready.
    backend.load_and_play("bbbbbbbbbbb").unwrap();
    assert!(handle.calls().iter().all(|c| !c.starts_with("load:")));

    handle.push(DeviceEvent::Ready);
    backend.poll();
    assert_eq!(handle.loaded().as_deref(), Some("bbbbbbbbbbb"));
}

#[test]
fn stop_flushes_stale_device_events() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());
    backend.ensure_mounted(false);
    handle.push(DeviceEvent::Ready);
    backend.poll();
    backend.load_and_play("dQw4w9WgXcQ").unwrap();

    handle.push(DeviceEvent::Error(150));
    backend.stop();
    assert!(backend.poll().is_empty());
    assert_eq!(backend.state(), RemoteState::Ready);
}

#[test]
fn stop_keeps_a_readiness_event_found_in_the_flush() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());
    backend.ensure_mounted(false);

    handle.push(DeviceEvent::Ready);
    backend.stop();
    assert_eq!(backend.state(), RemoteState::Ready);

    backend.load_and_play("dQw4w9WgXcQ").unwrap();
    assert_eq!(handle.loaded().as_deref(), Some("dQw4w9WgXcQ"));
}

#[test]
fn remount_builds_a_fresh_device() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    backend.ensure_mounted(false);
    assert_eq!(handle.devices_built(), 1);
    backend.ensure_mounted(false);
    assert_eq!(handle.devices_built(), 1);

    backend.ensure_mounted(true);
    assert_eq!(handle.devices_built(), 2);
    assert_eq!(backend.state(), RemoteState::Uninitialized);
}

#[test]
fn pause_and_resume_follow_the_state_machine() {
    let handle = FakeHandle::default();
    let mut backend = RemoteBackend::new(handle.factory());

    // Transport on an unmounted backend is a no-op.
    backend.pause();
    backend.toggle_play_pause();
    assert!(handle.calls().is_empty());

    backend.ensure_mounted(false);
    handle.push(DeviceEvent::Ready);
    backend.poll();
    backend.load_and_play("dQw4w9WgXcQ").unwrap();

    backend.pause();
    assert_eq!(backend.state(), RemoteState::Paused);
    backend.toggle_play_pause();
    assert_eq!(backend.state(), RemoteState::Playing);
    assert!(backend.is_playing());
}
