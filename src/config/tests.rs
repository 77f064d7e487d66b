use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use crate::backend::local::RepeatMode;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_duet_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", "/tmp/duet-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/duet-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("duet")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("duet")
            .join("config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
volume = 0.4
shuffle = true
repeat = "one"

[engine]
sync_interval_ms = 100
error_skip_delay_ms = 250

[equalizer]
intensity = 1.5
enabled = false

[library]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("DUET__PLAYBACK__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.volume, 0.4);
    assert!(s.playback.shuffle);
    assert!(matches!(s.playback.repeat, RepeatMode::One));
    assert_eq!(s.engine.sync_interval_ms, 100);
    assert_eq!(s.engine.error_skip_delay_ms, 250);
    assert_eq!(s.equalizer.intensity, 1.5);
    assert!(!s.equalizer.enabled);
    // Bands keep their defaults when the file does not list any.
    assert_eq!(s.equalizer.bands.len(), 7);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[engine]
error_skip_delay_ms = 500
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("DUET_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("DUET__ENGINE__ERROR_SKIP_DELAY_MS", "50");

    let s = Settings::load().unwrap();
    assert_eq!(s.engine.error_skip_delay_ms, 50);
}

#[test]
fn settings_round_trip_through_toml() {
    let defaults = Settings::default();
    let rendered = toml::to_string(&defaults).unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed.playback.volume, defaults.playback.volume);
    assert_eq!(parsed.engine.sync_interval_ms, defaults.engine.sync_interval_ms);
    assert_eq!(parsed.equalizer, defaults.equalizer);
    assert_eq!(parsed.library.extensions, defaults.library.extensions);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    s.playback.volume = 1.4;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.engine.sync_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.equalizer.bands[0].gain_db = 30.0;
    assert!(s.validate().is_err());
}
