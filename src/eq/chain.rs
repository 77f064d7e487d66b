use rodio::Source;
use std::time::Duration;

use super::{Equalizer, Peaking};

const BAND_Q: f32 = 1.0;

// Samples between target refreshes and smoothing steps. Small enough that a
// slider drag lands within a couple of milliseconds of audio.
const BLOCK_SAMPLES: usize = 64;

/// Filter chain wired between a decoded source and its sink.
///
/// Keeps one bank of peaking filters per channel (interleaved samples cycle
/// through the banks) and follows the shared [`Equalizer`] handle, so gain
/// changes made while the track plays are picked up within one block.
pub struct EqChain<S> {
    inner: S,
    eq: Equalizer,
    // banks[channel][band]
    banks: Vec<Vec<Peaking>>,
    channel: usize,
    samples_in_block: usize,
    last_epoch: u64,
    channels: u16,
    sample_rate: u32,
}

impl<S> EqChain<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, eq: &Equalizer) -> Self {
        let channels = inner.channels().max(1);
        let sample_rate = inner.sample_rate();
        let frequencies = eq.band_frequencies();

        let banks = (0..channels)
            .map(|_| {
                frequencies
                    .iter()
                    .map(|&f| Peaking::new(f, BAND_Q, sample_rate as f32))
                    .collect()
            })
            .collect();

        let mut chain = Self {
            inner,
            eq: eq.clone(),
            banks,
            channel: 0,
            samples_in_block: 0,
            last_epoch: u64::MAX,
            channels,
            sample_rate,
        };
        chain.refresh_targets();
        for bank in &mut chain.banks {
            for filter in bank {
                filter.snap_to_target();
            }
        }
        chain
    }

    fn refresh_targets(&mut self) {
        let epoch = self.eq.epoch();
        if epoch == self.last_epoch {
            return;
        }
        self.last_epoch = epoch;
        let gains = self.eq.effective_gains();
        for bank in &mut self.banks {
            for (filter, &gain) in bank.iter_mut().zip(&gains) {
                filter.set_target_gain_db(gain);
            }
        }
    }

    fn on_block_boundary(&mut self) {
        self.refresh_targets();
        for bank in &mut self.banks {
            for filter in bank.iter_mut() {
                filter.advance_smoothing(BLOCK_SAMPLES / self.channels as usize);
            }
        }

        // Decoders can switch parameters between spans.
        let rate = self.inner.sample_rate();
        if rate != self.sample_rate {
            self.sample_rate = rate;
            for bank in &mut self.banks {
                for filter in bank.iter_mut() {
                    filter.set_sample_rate(rate as f32);
                    filter.reset_state();
                }
            }
        }
    }
}

impl<S> Iterator for EqChain<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;

        let bank = &mut self.banks[self.channel];
        let mut out = sample;
        for filter in bank.iter_mut() {
            out = filter.process(out);
        }

        self.channel = (self.channel + 1) % self.channels as usize;
        self.samples_in_block += 1;
        if self.samples_in_block >= BLOCK_SAMPLES {
            self.samples_in_block = 0;
            self.on_block_boundary();
        }

        Some(out)
    }
}

impl<S> Source for EqChain<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}
