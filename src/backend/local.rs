//! Local playback backend.
//!
//! Decoding and output live on a dedicated audio thread; this module is the
//! channel-based handle the controller talks to. Shared playback state is
//! published by the thread into an `Arc<Mutex<_>>` snapshot that reads never
//! block on audio work.

mod advance;
mod thread;

pub use advance::{next_index, on_end_index, prev_index};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzer::AnalyzerHandle;
use crate::backend::PlaybackBackend;
use crate::eq::Equalizer;
use crate::library::LocalTrack;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// No repeat, but the queue still wraps from the last track to the first.
    #[default]
    Off,
    /// Replay the current track when it ends.
    One,
    /// Loop the whole list.
    All,
}

/// Commands accepted by the audio thread.
#[derive(Debug)]
pub enum LocalCmd {
    LoadTracks(Vec<LocalTrack>),
    Play(usize),
    TogglePause,
    Pause,
    Resume,
    Stop,
    Next,
    Prev,
    Seek(Duration),
    SetVolume(f32),
    SetShuffle(bool),
    SetRepeat(RepeatMode),
    Quit,
}

/// Snapshot of what the audio thread is doing, refreshed at least every tick.
#[derive(Debug, Clone)]
pub struct LocalPlayback {
    pub index: Option<usize>,
    pub track_id: Option<String>,
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    pub playing: bool,
    pub volume: f32,
    pub track_count: usize,
    /// How many commands the thread has processed so far. Compare with
    /// [`LocalBackend::commands_sent`] to tell a settled snapshot from one
    /// that predates an in-flight command.
    pub commands_handled: u64,
}

impl Default for LocalPlayback {
    fn default() -> Self {
        Self {
            index: None,
            track_id: None,
            elapsed: Duration::ZERO,
            duration: None,
            playing: false,
            volume: 1.0,
            track_count: 0,
            commands_handled: 0,
        }
    }
}

pub type SharedPlayback = Arc<Mutex<LocalPlayback>>;

pub struct LocalBackend {
    tx: Sender<LocalCmd>,
    playback: SharedPlayback,
    sent: AtomicU64,
    handle: Option<JoinHandle<()>>,
}

impl LocalBackend {
    /// Spawn the audio thread. When no output device can be opened the
    /// thread still runs the full playback state machine, simulating track
    /// progress from metadata durations.
    pub fn new(
        eq: Equalizer,
        analyzer: AnalyzerHandle,
        volume: f32,
        shuffle: bool,
        repeat: RepeatMode,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let playback: SharedPlayback = Arc::new(Mutex::new(LocalPlayback {
            volume: volume.clamp(0.0, 1.0),
            ..LocalPlayback::default()
        }));

        let shared = Arc::clone(&playback);
        let handle = std::thread::spawn(move || {
            thread::run(rx, shared, eq, analyzer, volume, shuffle, repeat);
        });

        Self {
            tx,
            playback,
            sent: AtomicU64::new(0),
            handle: Some(handle),
        }
    }

    /// Fire-and-forget send. A closed channel only happens after `quit`.
    pub fn send(&self, cmd: LocalCmd) {
        if self.tx.send(cmd).is_err() {
            warn!("local audio thread is gone, command dropped");
        } else {
            self.sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total commands handed to the audio thread. The thread echoes its own
    /// count back in [`LocalPlayback::commands_handled`]; until the two meet,
    /// the snapshot describes a state some queued command will replace.
    pub fn commands_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn info(&self) -> LocalPlayback {
        match self.playback.lock() {
            Ok(g) => g.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    pub fn load_tracks(&self, tracks: Vec<LocalTrack>) {
        self.send(LocalCmd::LoadTracks(tracks));
    }

    pub fn play_index(&self, index: usize) {
        self.send(LocalCmd::Play(index));
    }

    pub fn next(&self) {
        self.send(LocalCmd::Next);
    }

    pub fn previous(&self) {
        self.send(LocalCmd::Prev);
    }

    pub fn set_shuffle(&self, shuffle: bool) {
        self.send(LocalCmd::SetShuffle(shuffle));
    }

    pub fn set_repeat(&self, repeat: RepeatMode) {
        self.send(LocalCmd::SetRepeat(repeat));
    }

    /// Shut the audio thread down and wait for it.
    pub fn quit(&mut self) {
        let _ = self.tx.send(LocalCmd::Quit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LocalBackend {
    fn drop(&mut self) {
        self.quit();
    }
}

impl PlaybackBackend for LocalBackend {
    fn resume(&mut self) {
        self.send(LocalCmd::Resume);
    }

    fn pause(&mut self) {
        self.send(LocalCmd::Pause);
    }

    fn toggle_play_pause(&mut self) {
        self.send(LocalCmd::TogglePause);
    }

    fn stop(&mut self) {
        self.send(LocalCmd::Stop);
    }

    fn seek(&mut self, position: Duration) {
        self.send(LocalCmd::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(LocalCmd::SetVolume(volume));
    }

    fn position(&self) -> Duration {
        self.info().elapsed
    }

    fn duration(&self) -> Option<Duration> {
        self.info().duration
    }

    fn is_playing(&self) -> bool {
        self.info().playing
    }
}
