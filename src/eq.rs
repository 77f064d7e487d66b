//! Multi-band peaking equalizer.
//!
//! `EqualizerSettings` is the declarative model (band gains, intensity,
//! enabled); `Equalizer` is the shared control handle whose changes are
//! picked up by every live `EqChain` wired into a playing sink. Gain moves
//! are smoothed inside the chain so slider drags never click.

mod biquad;
mod chain;
mod settings;

pub use biquad::Peaking;
pub use chain::EqChain;
pub use settings::{EqualizerBand, EqualizerSettings, GAIN_DB_MAX, GAIN_DB_MIN, INTENSITY_MAX};

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

/// Shared, clonable control over the equalizer. One of these is created per
/// engine and handed to the local backend, which wires a fresh filter chain
/// for every sink it builds; all chains follow this handle.
#[derive(Clone)]
pub struct Equalizer {
    inner: Arc<EqShared>,
}

struct EqShared {
    settings: Mutex<EqualizerSettings>,
    // Bumped on every change so chains can refresh cheaply.
    epoch: AtomicU64,
}

impl Equalizer {
    pub fn new(settings: EqualizerSettings) -> Self {
        Self {
            inner: Arc::new(EqShared {
                settings: Mutex::new(settings),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Set one band's gain in dB (clamped to -12..+12). An out-of-range
    /// index is logged and ignored; it never interrupts playback.
    pub fn set_band_gain(&self, index: usize, gain_db: f32) {
        let mut settings = self.lock();
        if !settings.set_band_gain(index, gain_db) {
            warn!(index, bands = settings.bands.len(), "equalizer band index out of range");
            return;
        }
        drop(settings);
        self.bump();
    }

    /// Global intensity multiplier (clamped to 0..2).
    pub fn set_intensity(&self, intensity: f32) {
        self.lock().set_intensity(intensity);
        self.bump();
    }

    /// When disabled every effective gain collapses to 0 dB; the stored band
    /// gains are preserved and come back when re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
        self.bump();
    }

    /// The gains actually applied to the filters, in band order.
    pub fn effective_gains(&self) -> Vec<f32> {
        self.lock().effective_gains()
    }

    pub fn band_frequencies(&self) -> Vec<f32> {
        self.lock().bands.iter().map(|b| b.frequency).collect()
    }

    pub fn settings(&self) -> EqualizerSettings {
        self.lock().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EqualizerSettings> {
        // A poisoned lock only means a panicked writer; the settings stay valid.
        match self.inner.settings.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        }
    }
}
