use std::time::{Duration, Instant};

use tracing::warn;

use crate::analyzer::{AnalyzerHandle, FrequencyAnalyzer};
use crate::backend::PlaybackBackend;
use crate::backend::local::{LocalBackend, RepeatMode};
use crate::backend::remote::{DeviceFactory, RemoteBackend, RemoteEvent, canonicalize};
use crate::config::Settings;
use crate::eq::Equalizer;
use crate::library::LocalTrack;
use crate::queue::{MediaHandle, Queue, SourceKind, UnifiedTrack};
use crate::search::SearchResult;

/// What the engine is doing right now, refreshed on every tick. Position
/// and duration come from whichever backend owns the current track.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub current: Option<UnifiedTrack>,
    pub playing: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub volume: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            playing: false,
            position: Duration::ZERO,
            duration: None,
            volume: 1.0,
        }
    }
}

/// User-facing note about something that went wrong, drained by the host.
#[derive(Debug, Clone)]
pub struct PlayerNotice {
    pub message: String,
}

#[derive(Debug, Copy, Clone)]
struct PendingSkip {
    /// Playback generation the failure belonged to. A skip from a stale
    /// generation is dropped, so a timer can never fire over a track the
    /// user has since chosen manually.
    generation: u64,
    due: Instant,
}

pub struct UnifiedPlayer {
    queue: Queue,
    current: Option<UnifiedTrack>,
    generation: u64,
    local: LocalBackend,
    local_ids: Vec<String>,
    /// Commands-sent watermark taken when the local track list or current
    /// track changed; identity syncs wait for the thread to reach it.
    local_seq: u64,
    remote: RemoteBackend,
    equalizer: Equalizer,
    analyzer: FrequencyAnalyzer,
    volume: f32,
    pending_skip: Option<PendingSkip>,
    error_skip_delay: Duration,
    notices: Vec<PlayerNotice>,
    snapshot: PlaybackSnapshot,
}

impl UnifiedPlayer {
    pub fn new(settings: &Settings, remote_factory: DeviceFactory) -> Self {
        let equalizer = Equalizer::new(settings.equalizer.clone());
        let analyzer_handle = AnalyzerHandle::new();
        let volume = settings.playback.volume.clamp(0.0, 1.0);
        let local = LocalBackend::new(
            equalizer.clone(),
            analyzer_handle.clone(),
            volume,
            settings.playback.shuffle,
            settings.playback.repeat,
        );

        Self {
            queue: Queue::new(),
            current: None,
            generation: 0,
            local,
            local_ids: Vec::new(),
            local_seq: 0,
            remote: RemoteBackend::new(remote_factory),
            equalizer,
            analyzer: FrequencyAnalyzer::new(analyzer_handle),
            volume,
            pending_skip: None,
            error_skip_delay: Duration::from_millis(settings.engine.error_skip_delay_ms),
            notices: Vec::new(),
            snapshot: PlaybackSnapshot::default(),
        }
    }

    /// Replace the local side of the queue with a freshly scanned folder.
    pub fn load_local_tracks(&mut self, tracks: Vec<LocalTrack>) {
        self.local_ids = tracks.iter().map(|t| t.id.clone()).collect();
        let unified = tracks.iter().map(UnifiedTrack::from_local).collect();
        self.queue.replace_local(unified);
        self.local.load_tracks(tracks);
        self.local_seq = self.local.commands_sent();
    }

    /// Start `track`, stopping whichever backend is currently audible so
    /// the two can never play at once. Bumps the playback generation, which
    /// cancels any error recovery scheduled for the previous track.
    pub fn play_track(&mut self, track: UnifiedTrack) {
        self.generation += 1;
        self.pending_skip = None;

        match track.source {
            SourceKind::Local => {
                self.remote.stop();
                let Some(index) = self.local_ids.iter().position(|id| *id == track.id) else {
                    warn!(id = %track.id, "local track not in the loaded folder");
                    return;
                };
                self.local.set_volume(self.volume);
                self.local.play_index(index);
                self.local_seq = self.local.commands_sent();
                self.current = Some(track);
            }
            SourceKind::Remote => {
                self.local.pause();
                let video_id = canonicalize(track.video_id().unwrap_or(""));
                let mut track = track;
                if video_id.is_empty() {
                    // Unplayable id: recover like a playback error, without
                    // ever handing the empty id to the device.
                    self.notice(format!("Cannot play \"{}\": unusable video id", track.title));
                    self.current = Some(track);
                    self.schedule_skip();
                    self.refresh_snapshot();
                    return;
                }
                track.media = MediaHandle::Video(video_id.clone());
                self.current = Some(track);
                self.remote.set_volume(self.volume);
                if let Err(error) = self.remote.load_and_play(&video_id) {
                    self.notice(format!("Remote playback failed: {error}"));
                    self.schedule_skip();
                }
            }
        }
        self.refresh_snapshot();
    }

    /// Append to the queue; enqueueing a track that is already present is a
    /// no-op. Returns whether the queue changed.
    pub fn add_to_queue(&mut self, track: UnifiedTrack) -> bool {
        self.queue.push(track)
    }

    /// Ingest a batch of search results into the queue. Returns how many
    /// entries were actually added.
    pub fn add_search_results(&mut self, results: Vec<SearchResult>) -> usize {
        results
            .into_iter()
            .filter(|r| self.queue.push(r.clone().into_track()))
            .count()
    }

    /// Remove by id. Never alters what is currently playing, even when the
    /// removed id is the current track.
    pub fn remove_from_queue(&mut self, id: &str) -> bool {
        self.queue.remove(id)
    }

    pub fn queue(&self) -> &[UnifiedTrack] {
        self.queue.tracks()
    }

    pub fn current(&self) -> Option<&UnifiedTrack> {
        self.current.as_ref()
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    pub fn previous(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, direction: isize) {
        let len = self.queue.len();
        if len == 0 {
            return;
        }
        let Some(position) = self.current.as_ref().and_then(|t| self.queue.position(&t.id)) else {
            return;
        };
        let target = (position as isize + direction).rem_euclid(len as isize) as usize;
        if let Some(track) = self.queue.get(target).cloned() {
            self.play_track(track);
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if let Some(backend) = self.active_backend() {
            backend.toggle_play_pause();
        }
        self.refresh_snapshot();
    }

    pub fn seek(&mut self, position: Duration) {
        if let Some(backend) = self.active_backend() {
            backend.seek(position);
        }
        self.refresh_snapshot();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        let target = self.volume;
        if let Some(backend) = self.active_backend() {
            backend.set_volume(target);
        }
        self.refresh_snapshot();
    }

    pub fn set_shuffle(&self, shuffle: bool) {
        self.local.set_shuffle(shuffle);
    }

    pub fn set_repeat(&self, repeat: RepeatMode) {
        self.local.set_repeat(repeat);
    }

    /// Host-driven heartbeat, called every couple hundred milliseconds:
    /// pumps remote events, fires due error recovery and refreshes the
    /// snapshot.
    pub fn tick(&mut self) {
        for event in self.remote.poll() {
            match event {
                RemoteEvent::Ended => {
                    if matches!(&self.current, Some(t) if t.source == SourceKind::Remote) {
                        self.advance_from_current();
                    }
                }
                RemoteEvent::Failed(error) => {
                    // A failure drained after the user already switched to a
                    // local track belongs to playback that no longer exists.
                    let Some(track) = &self.current else { continue };
                    if track.source != SourceKind::Remote {
                        continue;
                    }
                    let title = track.title.clone();
                    self.notice(format!("Playback failed for \"{title}\": {error}"));
                    self.schedule_skip();
                }
            }
        }

        if let Some(pending) = self.pending_skip
            && pending.due <= Instant::now()
        {
            self.pending_skip = None;
            if pending.generation == self.generation {
                self.advance_from_current();
            }
        }

        self.sync_local_identity();
        self.refresh_snapshot();
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.clone()
    }

    /// Latest analyzer frame; total, 128 bins, silence-decayed when idle or
    /// when the current track is remote.
    pub fn frequency_data(&mut self) -> Vec<u8> {
        self.analyzer.sample()
    }

    /// The equalizer only shapes locally decoded audio; remote playback
    /// keeps the settings but cannot apply them.
    pub fn can_use_equalizer(&self) -> bool {
        matches!(&self.current, Some(t) if t.source == SourceKind::Local)
    }

    pub fn equalizer(&self) -> &Equalizer {
        &self.equalizer
    }

    pub fn take_notices(&mut self) -> Vec<PlayerNotice> {
        std::mem::take(&mut self.notices)
    }

    fn active_backend(&mut self) -> Option<&mut dyn PlaybackBackend> {
        match &self.current {
            Some(t) if t.source == SourceKind::Local => Some(&mut self.local),
            Some(_) => Some(&mut self.remote),
            None => None,
        }
    }

    /// Move to the queue entry after the current one. Used for both natural
    /// track end and error recovery; a queue with nowhere else to go stops
    /// playback instead of looping over the same entry.
    fn advance_from_current(&mut self) {
        let Some(current) = self.current.clone() else {
            return;
        };
        let len = self.queue.len();
        let Some(position) = self.queue.position(&current.id) else {
            self.stop_current();
            self.notice("Nothing left to play".to_string());
            return;
        };
        let target = (position + 1) % len;
        if target == position {
            self.stop_current();
            self.notice("Nothing left to play".to_string());
            return;
        }
        if let Some(track) = self.queue.get(target).cloned() {
            self.play_track(track);
        }
    }

    fn stop_current(&mut self) {
        self.remote.stop();
        self.local.stop();
        self.current = None;
    }

    /// One deferred skip per failure; a second error on the same generation
    /// does not push the deadline out.
    fn schedule_skip(&mut self) {
        if self.pending_skip.is_some() {
            return;
        }
        self.pending_skip = Some(PendingSkip {
            generation: self.generation,
            due: Instant::now() + self.error_skip_delay,
        });
    }

    /// The local backend advances on its own at end of track; pull the new
    /// identity back into the unified view.
    fn sync_local_identity(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        if current.source != SourceKind::Local {
            return;
        }
        let info = self.local.info();
        if info.commands_handled < self.local_seq {
            // The audio thread has not caught up with the last play or load
            // command; its snapshot still describes whatever came before.
            return;
        }
        match info.track_id {
            Some(id) if id != current.id => {
                if let Some(position) = self.queue.position(&id) {
                    self.current = self.queue.get(position).cloned();
                }
            }
            None if info.index.is_none() => {
                // The backend ran out of playable tracks.
                self.current = None;
            }
            _ => {}
        }
    }

    fn refresh_snapshot(&mut self) {
        let (playing, position, duration) = match &self.current {
            Some(t) if t.source == SourceKind::Local => {
                let info = self.local.info();
                (info.playing, info.elapsed, info.duration)
            }
            Some(_) => (
                self.remote.is_playing(),
                self.remote.position(),
                self.remote.duration(),
            ),
            None => (false, Duration::ZERO, None),
        };
        self.snapshot = PlaybackSnapshot {
            current: self.current.clone(),
            playing,
            position,
            duration,
            volume: self.volume,
        };
    }

    fn notice(&mut self, message: String) {
        warn!("{message}");
        self.notices.push(PlayerNotice { message });
    }

    #[cfg(test)]
    pub(crate) fn local_backend_playing(&self) -> bool {
        self.local.is_playing()
    }
}
