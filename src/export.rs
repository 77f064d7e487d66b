//! Offline equalized render.
//!
//! Re-decodes a local file, applies the current equalizer settings through
//! the same peaking filters the live path uses (gains snapped, no ramp-in)
//! and writes a 16-bit PCM WAV. Remote tracks cannot be rendered; there is
//! no local signal to process.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, Source};
use thiserror::Error;
use tracing::info;

use crate::eq::{EqualizerSettings, Peaking};

const BAND_Q: f32 = 1.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot open input: {0}")]
    Open(#[from] std::io::Error),
    #[error("cannot decode input: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("cannot write output: {0}")]
    Wav(#[from] hound::Error),
}

/// Render `input` through `settings` into a WAV file at `output`.
pub fn render_wav(input: &Path, settings: &EqualizerSettings, output: &Path) -> Result<(), ExportError> {
    let file = File::open(input)?;
    let decoder = Decoder::new(BufReader::new(file))?;
    let channels = decoder.channels().max(1);
    let sample_rate = decoder.sample_rate();

    let gains = settings.effective_gains();
    let mut banks: Vec<Vec<Peaking>> = (0..channels)
        .map(|_| {
            settings
                .bands
                .iter()
                .zip(&gains)
                .map(|(band, &gain)| {
                    let mut filter = Peaking::new(band.frequency, BAND_Q, sample_rate as f32);
                    filter.set_target_gain_db(gain);
                    filter.snap_to_target();
                    filter
                })
                .collect()
        })
        .collect();

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)?;

    let mut written = 0u64;
    for (i, sample) in decoder.enumerate() {
        let bank = &mut banks[i % channels as usize];
        let mut out = sample;
        for filter in bank.iter_mut() {
            out = filter.process(out);
        }
        writer.write_sample((out.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        written += 1;
    }
    writer.finalize()?;

    info!(samples = written, output = %output.display(), "rendered equalized wav");
    Ok(())
}
