use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use duet::backend::remote::{DeviceEvent, RemoteDevice};
use duet::config::Settings;
use duet::library::scan;
use duet::queue::{MediaHandle, SourceKind, UnifiedTrack};
use duet::{UnifiedPlayer, export};

/// Stand-in remote device for the headless demo: reports ready immediately
/// and logs every verb instead of driving a real embedded player.
#[derive(Default)]
struct LoggingDevice {
    events: VecDeque<DeviceEvent>,
    position: Duration,
}

impl LoggingDevice {
    fn new() -> Self {
        let mut device = Self::default();
        device.events.push_back(DeviceEvent::Ready);
        device
    }
}

impl RemoteDevice for LoggingDevice {
    fn load(&mut self, video_id: &str) {
        info!(video_id, "remote: load");
        self.position = Duration::ZERO;
    }

    fn play(&mut self) {
        info!("remote: play");
    }

    fn pause(&mut self) {
        info!("remote: pause");
    }

    fn stop(&mut self) {
        info!("remote: stop");
    }

    fn seek(&mut self, position: Duration) {
        info!(secs = position.as_secs(), "remote: seek");
        self.position = position;
    }

    fn set_volume(&mut self, volume: f32) {
        info!(volume, "remote: volume");
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn poll_events(&mut self) -> Vec<DeviceEvent> {
        self.events.drain(..).collect()
    }
}

fn load_settings() -> Settings {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to load config, using defaults: {e}");
            Settings::default()
        }
    };
    if let Err(e) = settings.validate() {
        warn!("invalid config, using defaults: {e}");
        return Settings::default();
    }
    settings
}

fn print_status(player: &UnifiedPlayer) {
    let snapshot = player.snapshot();
    match &snapshot.current {
        Some(track) => {
            let state = if snapshot.playing { "playing" } else { "paused" };
            let position = snapshot.position.as_secs();
            let duration = snapshot
                .duration
                .map(|d| format!("{}s", d.as_secs()))
                .unwrap_or_else(|| "?".to_string());
            println!(
                "{state}: {} - {} [{position}s / {duration}] vol {:.2}",
                track.artist, track.title, snapshot.volume
            );
        }
        None => println!("stopped"),
    }
}

fn print_queue(player: &UnifiedPlayer) {
    for (i, track) in player.queue().iter().enumerate() {
        let kind = match track.source {
            SourceKind::Local => "local",
            SourceKind::Remote => "remote",
        };
        println!("{i:3}  [{kind}]  {} - {}", track.artist, track.title);
    }
}

fn handle_command(player: &mut UnifiedPlayer, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return true };
    let arg = parts.next();

    match cmd {
        "list" | "ls" => print_queue(player),
        "play" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(index) => match player.queue().get(index).cloned() {
                Some(track) => player.play_track(track),
                None => println!("no queue entry {index}"),
            },
            None => println!("usage: play <index>"),
        },
        "queue" => match arg {
            Some(raw) => {
                let track = UnifiedTrack {
                    id: format!("remote-{raw}"),
                    title: raw.to_string(),
                    artist: "Remote".to_string(),
                    source: SourceKind::Remote,
                    media: MediaHandle::Video(raw.to_string()),
                    cover_art: None,
                    duration_hint: None,
                };
                if !player.add_to_queue(track) {
                    println!("already queued");
                }
            }
            None => println!("usage: queue <video-id-or-url>"),
        },
        "remove" => match arg {
            Some(id) => {
                if !player.remove_from_queue(id) {
                    println!("no such track");
                }
            }
            None => println!("usage: remove <track-id>"),
        },
        "p" | "toggle" => player.toggle_play_pause(),
        "next" | "n" => player.next(),
        "prev" => player.previous(),
        "seek" => match arg.and_then(|a| a.parse::<u64>().ok()) {
            Some(secs) => player.seek(Duration::from_secs(secs)),
            None => println!("usage: seek <seconds>"),
        },
        "vol" => match arg.and_then(|a| a.parse::<f32>().ok()) {
            Some(volume) => player.set_volume(volume),
            None => println!("usage: vol <0..1>"),
        },
        "eq" => match (arg, parts.next()) {
            (Some("on"), _) => player.equalizer().set_enabled(true),
            (Some("off"), _) => player.equalizer().set_enabled(false),
            (Some(band), Some(gain)) => {
                match (band.parse::<usize>(), gain.parse::<f32>()) {
                    (Ok(band), Ok(gain)) => player.equalizer().set_band_gain(band, gain),
                    _ => println!("usage: eq <band> <gain-db>"),
                }
            }
            _ => {
                if !player.can_use_equalizer() {
                    println!("equalizer has no effect on remote playback");
                }
                for (i, (f, g)) in player
                    .equalizer()
                    .band_frequencies()
                    .iter()
                    .zip(player.equalizer().effective_gains())
                    .enumerate()
                {
                    println!("{i}: {f} Hz -> {g:+.1} dB");
                }
            }
        },
        "intensity" => match arg.and_then(|a| a.parse::<f32>().ok()) {
            Some(v) => player.equalizer().set_intensity(v),
            None => println!("usage: intensity <0..2>"),
        },
        "export" => match (player.current().cloned(), arg) {
            (Some(track), Some(out)) => match &track.media {
                MediaHandle::Path(input) => {
                    let settings = player.equalizer().settings();
                    match export::render_wav(input, &settings, Path::new(out)) {
                        Ok(()) => println!("wrote {out}"),
                        Err(e) => println!("export failed: {e}"),
                    }
                }
                MediaHandle::Video(_) => println!("cannot export a remote track"),
            },
            _ => println!("usage: export <out.wav> (with a local track current)"),
        },
        "status" | "s" => print_status(player),
        "quit" | "q" => return false,
        other => println!("unknown command: {other}"),
    }
    true
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = load_settings();
    let dir = std::env::args().nth(1).unwrap_or_else(|| "Music".to_string());
    let tracks = scan(Path::new(&dir), &settings.library);
    info!(count = tracks.len(), dir, "scanned library");

    let factory: duet::backend::remote::DeviceFactory =
        Box::new(|| Box::new(LoggingDevice::new()) as Box<dyn RemoteDevice>);
    let mut player = UnifiedPlayer::new(&settings, factory);
    player.load_local_tracks(tracks);

    // Commands come from a reader thread so the tick loop never blocks on stdin.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let tick = Duration::from_millis(settings.engine.sync_interval_ms);
    println!("duet ready; try: list, play <n>, queue <id>, p, next, prev, seek <s>, vol <v>, eq, export <f>, quit");

    'outer: loop {
        while let Ok(line) = line_rx.try_recv() {
            if !handle_command(&mut player, &line) {
                break 'outer;
            }
        }
        player.tick();
        for notice in player.take_notices() {
            println!("! {}", notice.message);
        }
        std::thread::sleep(tick);
    }
}
