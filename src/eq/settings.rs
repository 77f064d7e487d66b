use serde::{Deserialize, Serialize};

/// Band gain bounds in dB.
pub const GAIN_DB_MIN: f32 = -12.0;
pub const GAIN_DB_MAX: f32 = 12.0;

/// Intensity scales every band gain; 1.0 is neutral.
pub const INTENSITY_MAX: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerBand {
    /// Center frequency in Hz.
    pub frequency: f32,
    /// Stored gain in dB, before intensity scaling.
    pub gain_db: f32,
    pub label: String,
}

impl Default for EqualizerBand {
    fn default() -> Self {
        Self {
            frequency: 1000.0,
            gain_db: 0.0,
            label: "1kHz".to_string(),
        }
    }
}

impl EqualizerBand {
    fn new(frequency: f32, label: &str) -> Self {
        Self {
            frequency,
            gain_db: 0.0,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    pub bands: Vec<EqualizerBand>,
    /// Global multiplier on every band gain, 0..2.
    pub intensity: f32,
    /// Disabled collapses the effective gains to 0 dB without losing the
    /// stored per-band values.
    pub enabled: bool,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            bands: vec![
                EqualizerBand::new(60.0, "60Hz"),
                EqualizerBand::new(150.0, "150Hz"),
                EqualizerBand::new(400.0, "400Hz"),
                EqualizerBand::new(1000.0, "1kHz"),
                EqualizerBand::new(2500.0, "2.5kHz"),
                EqualizerBand::new(6000.0, "6kHz"),
                EqualizerBand::new(16000.0, "16kHz"),
            ],
            intensity: 1.0,
            enabled: true,
        }
    }
}

impl EqualizerSettings {
    /// Store a clamped gain for one band. Returns false when the index does
    /// not name a band.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> bool {
        match self.bands.get_mut(index) {
            Some(band) => {
                band.gain_db = gain_db.clamp(GAIN_DB_MIN, GAIN_DB_MAX);
                true
            }
            None => false,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, INTENSITY_MAX);
    }

    /// The gain each filter should actually apply, in band order:
    /// `gain_db * intensity` while enabled, 0 dB otherwise.
    pub fn effective_gains(&self) -> Vec<f32> {
        self.bands
            .iter()
            .map(|band| {
                if self.enabled {
                    band.gain_db * self.intensity
                } else {
                    0.0
                }
            })
            .collect()
    }
}
