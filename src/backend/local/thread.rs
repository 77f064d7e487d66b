use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::AnalyzerHandle;
use crate::eq::{EqChain, Equalizer};
use crate::library::LocalTrack;

use super::advance::{next_index, on_end_index, prev_index};
use super::{LocalCmd, RepeatMode, SharedPlayback};

const TICK: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
enum SinkError {
    #[error("cannot open file: {0}")]
    Open(#[from] std::io::Error),
    #[error("cannot decode file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

struct AudioThread {
    stream: Option<OutputStream>,
    playback: SharedPlayback,
    eq: Equalizer,
    analyzer: AnalyzerHandle,
    tracks: Vec<LocalTrack>,
    index: Option<usize>,
    sink: Option<Sink>,
    paused: bool,
    started_at: Option<Instant>,
    accumulated: Duration,
    duration: Option<Duration>,
    volume: f32,
    shuffle: bool,
    repeat: RepeatMode,
    commands_handled: u64,
}

pub(super) fn run(
    rx: Receiver<LocalCmd>,
    playback: SharedPlayback,
    eq: Equalizer,
    analyzer: AnalyzerHandle,
    volume: f32,
    shuffle: bool,
    repeat: RepeatMode,
) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            warn!("no audio output available, running headless: {e}");
            None
        }
    };

    let mut thread = AudioThread {
        stream,
        playback,
        eq,
        analyzer,
        tracks: Vec::new(),
        index: None,
        sink: None,
        paused: true,
        started_at: None,
        accumulated: Duration::ZERO,
        duration: None,
        volume: volume.clamp(0.0, 1.0),
        shuffle,
        repeat,
        commands_handled: 0,
    };
    thread.publish();

    loop {
        match rx.recv_timeout(TICK) {
            Ok(LocalCmd::Quit) => break,
            Ok(cmd) => {
                thread.handle(cmd);
                thread.commands_handled += 1;
            }
            Err(RecvTimeoutError::Timeout) => thread.on_tick(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
        thread.publish();
    }
    thread.stop_sink();
}

impl AudioThread {
    fn handle(&mut self, cmd: LocalCmd) {
        match cmd {
            LocalCmd::LoadTracks(tracks) => {
                debug!(count = tracks.len(), "local track list replaced");
                self.clear_current();
                self.tracks = tracks;
            }
            LocalCmd::Play(index) => {
                if index < self.tracks.len() {
                    self.play_with_recovery(index);
                } else {
                    warn!(index, count = self.tracks.len(), "play index out of range");
                }
            }
            LocalCmd::TogglePause => {
                if self.index.is_some() {
                    if self.paused {
                        self.resume();
                    } else {
                        self.pause();
                    }
                } else if !self.tracks.is_empty() {
                    // Nothing loaded yet: toggling starts the first track.
                    self.play_with_recovery(0);
                }
            }
            LocalCmd::Pause => self.pause(),
            LocalCmd::Resume => self.resume(),
            LocalCmd::Stop => self.clear_current(),
            LocalCmd::Next => {
                if let Some(target) =
                    next_index(self.index, self.tracks.len(), self.shuffle, &mut rand::rng())
                {
                    self.play_with_recovery(target);
                }
            }
            LocalCmd::Prev => {
                if let Some(target) = prev_index(self.index, self.tracks.len()) {
                    self.play_with_recovery(target);
                }
            }
            LocalCmd::Seek(position) => self.seek(position),
            LocalCmd::SetVolume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
                if let Some(sink) = &self.sink {
                    sink.set_volume(self.volume);
                }
            }
            LocalCmd::SetShuffle(shuffle) => self.shuffle = shuffle,
            LocalCmd::SetRepeat(repeat) => self.repeat = repeat,
            LocalCmd::Quit => unreachable!("handled by the run loop"),
        }
    }

    /// Periodic work while idle on the channel: detect end of track and
    /// advance.
    fn on_tick(&mut self) {
        if !self.playing() {
            return;
        }
        let ended = match &self.sink {
            Some(sink) => sink.empty(),
            // Headless playback ends when the known duration elapses.
            None => self.duration.is_some_and(|d| self.elapsed() >= d),
        };
        if ended {
            self.advance_after_end();
        }
    }

    fn advance_after_end(&mut self) {
        let Some(current) = self.index else { return };
        match on_end_index(
            current,
            self.tracks.len(),
            self.repeat,
            self.shuffle,
            &mut rand::rng(),
        ) {
            Some(target) => self.play_with_recovery(target),
            None => self.clear_current(),
        }
    }

    /// Start `index`; when the file fails to open or decode, treat it like
    /// an instantly-ended track and walk forward. The walk is capped at one
    /// full pass so a directory of unreadable files cannot spin.
    fn play_with_recovery(&mut self, index: usize) {
        let len = self.tracks.len();
        let mut target = index;
        for _ in 0..len {
            if self.start(target, Duration::ZERO) {
                return;
            }
            target = (target + 1) % len;
        }
        warn!("no playable track found, stopping");
        self.clear_current();
    }

    fn start(&mut self, index: usize, at: Duration) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.stop_sink();

        let track = self.tracks[index].clone();
        match self.build_sink(&track, at) {
            Ok((sink, total)) => {
                self.duration = total.or(track.duration);
                if let Some(sink) = &sink {
                    sink.play();
                }
                self.sink = sink;
                self.index = Some(index);
                self.paused = false;
                self.accumulated = at;
                self.started_at = Some(Instant::now());
                info!(title = %track.title, "playing local track");
                true
            }
            Err(e) => {
                warn!(path = %track.path.display(), "skipping unplayable track: {e}");
                false
            }
        }
    }

    /// Decode `track` into a sink wired through the equalizer chain and the
    /// analyzer tap. Headless mode still opens the decoder so unreadable
    /// files fail the same way, then drops it and simulates.
    fn build_sink(
        &self,
        track: &LocalTrack,
        at: Duration,
    ) -> Result<(Option<Sink>, Option<Duration>), SinkError> {
        let file = File::open(&track.path)?;
        let decoder = Decoder::new(BufReader::new(file))?;
        let total = decoder.total_duration();

        let Some(stream) = &self.stream else {
            return Ok((None, total));
        };

        let source = self.analyzer.tap(EqChain::new(decoder.skip_duration(at), &self.eq));
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume);
        sink.pause();
        sink.append(source);
        Ok((Some(sink), total))
    }

    fn pause(&mut self) {
        if self.index.is_none() || self.paused {
            return;
        }
        self.accumulated = self.elapsed();
        self.started_at = None;
        self.paused = true;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if self.index.is_none() || !self.paused {
            return;
        }
        self.paused = false;
        self.started_at = Some(Instant::now());
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    /// Absolute seek, implemented by rebuilding the sink at the target
    /// offset. Pause state survives the rebuild.
    fn seek(&mut self, position: Duration) {
        let Some(index) = self.index else { return };
        let position = match self.duration {
            Some(d) => position.min(d),
            None => position,
        };
        let was_paused = self.paused;
        if self.start(index, position) && was_paused {
            self.pause();
        }
    }

    fn clear_current(&mut self) {
        self.stop_sink();
        self.index = None;
        self.paused = true;
        self.accumulated = Duration::ZERO;
        self.started_at = None;
        self.duration = None;
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn playing(&self) -> bool {
        self.index.is_some() && !self.paused
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    fn publish(&self) {
        let mut info = match self.playback.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        info.index = self.index;
        info.track_id = self.index.and_then(|i| self.tracks.get(i)).map(|t| t.id.clone());
        info.elapsed = if self.index.is_some() {
            self.elapsed()
        } else {
            Duration::ZERO
        };
        info.duration = self.duration;
        info.playing = self.playing();
        info.volume = self.volume;
        info.track_count = self.tracks.len();
        info.commands_handled = self.commands_handled;
    }
}
