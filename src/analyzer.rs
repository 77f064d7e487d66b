//! Frequency-domain analyzer for visualizers.
//!
//! An [`AnalyzerTap`] sits at the tail of the local filter chain and copies
//! samples into a shared ring buffer; [`FrequencyAnalyzer::sample`] turns the
//! latest window into 128 magnitude bins on demand. Polling is driven by the
//! host render loop, never by the audio thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rodio::Source;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Number of magnitude bins returned per frame.
pub const FREQ_BINS: usize = 128;

// Two samples per output bin; half-spectrum of a 256-point FFT.
const FFT_SIZE: usize = FREQ_BINS * 2;

// Ring capacity; enough history that a slow poller still sees real audio.
const BUFFER_SAMPLES: usize = 4096;

// Inter-frame smoothing: new = 0.8 * previous + 0.2 * current.
const SMOOTHING: f32 = 0.8;

// Per-poll decay applied while no fresh samples arrive.
const IDLE_DECAY: f32 = 0.85;

struct AnalyzerShared {
    samples: Mutex<VecDeque<f32>>,
    writes: AtomicU64,
}

impl AnalyzerShared {
    fn push(&self, sample: f32) {
        let mut buf = match self.samples.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        if buf.len() == BUFFER_SAMPLES {
            buf.pop_front();
        }
        buf.push_back(sample);
        self.writes.fetch_add(1, Ordering::Release);
    }
}

/// Clonable producer-side handle. The local backend holds one and wraps
/// every sink source with [`AnalyzerHandle::tap`].
#[derive(Clone)]
pub struct AnalyzerHandle {
    shared: Arc<AnalyzerShared>,
}

impl AnalyzerHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(AnalyzerShared {
                samples: Mutex::new(VecDeque::with_capacity(BUFFER_SAMPLES)),
                writes: AtomicU64::new(0),
            }),
        }
    }

    pub fn tap<S>(&self, inner: S) -> AnalyzerTap<S>
    where
        S: Source<Item = f32>,
    {
        AnalyzerTap {
            inner,
            shared: Arc::clone(&self.shared),
        }
    }

    #[cfg(test)]
    fn push(&self, sample: f32) {
        self.shared.push(sample);
    }
}

impl Default for AnalyzerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Pass-through source that mirrors every sample into the analyzer buffer.
pub struct AnalyzerTap<S> {
    inner: S,
    shared: Arc<AnalyzerShared>,
}

impl<S> Iterator for AnalyzerTap<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        self.shared.push(sample);
        Some(sample)
    }
}

impl<S> Source for AnalyzerTap<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Consumer side. Owned by the controller; `sample` is total and always
/// returns exactly [`FREQ_BINS`] values, decaying toward silence when the
/// audio path is idle, failed, or simply not local.
pub struct FrequencyAnalyzer {
    handle: AnalyzerHandle,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    last: Vec<u8>,
    last_writes: u64,
}

impl FrequencyAnalyzer {
    pub fn new(handle: AnalyzerHandle) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let window = (0..FFT_SIZE)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();
        Self {
            handle,
            fft,
            window,
            last: vec![0; FREQ_BINS],
            last_writes: 0,
        }
    }

    /// Latest magnitude frame, one byte per bin.
    pub fn sample(&mut self) -> Vec<u8> {
        let writes = self.handle.shared.writes.load(Ordering::Acquire);
        if writes == self.last_writes {
            for v in &mut self.last {
                *v = (*v as f32 * IDLE_DECAY) as u8;
            }
            return self.last.clone();
        }
        self.last_writes = writes;

        let window_samples: Vec<f32> = {
            let buf = match self.handle.shared.samples.lock() {
                Ok(g) => g,
                Err(p) => p.into_inner(),
            };
            let skip = buf.len().saturating_sub(FFT_SIZE);
            buf.iter().skip(skip).copied().collect()
        };

        let mut frame: Vec<Complex<f32>> = self
            .window
            .iter()
            .zip(window_samples.iter().chain(std::iter::repeat(&0.0)))
            .map(|(w, s)| Complex::new(w * s, 0.0))
            .collect();
        self.fft.process(&mut frame);

        for (i, bin) in frame.iter().take(FREQ_BINS).enumerate() {
            // Hann window halves the coherent gain, fold that back in.
            let magnitude = (bin.norm() * 4.0 / FFT_SIZE as f32).min(1.0);
            let level = (magnitude.sqrt() * 255.0) as u8;
            let smoothed = SMOOTHING * self.last[i] as f32 + (1.0 - SMOOTHING) * level as f32;
            self.last[i] = smoothed as u8;
        }
        self.last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::buffer::SamplesBuffer;

    #[test]
    fn sample_is_total_before_any_audio() {
        let mut analyzer = FrequencyAnalyzer::new(AnalyzerHandle::new());
        let frame = analyzer.sample();
        assert_eq!(frame.len(), FREQ_BINS);
        assert!(frame.iter().all(|&v| v == 0));
    }

    #[test]
    fn tap_is_a_transparent_passthrough() {
        let handle = AnalyzerHandle::new();
        let samples: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let tapped: Vec<f32> = handle
            .tap(SamplesBuffer::new(1, 48_000, samples.clone()))
            .collect();
        assert_eq!(tapped, samples);
    }

    #[test]
    fn a_loud_tone_produces_nonzero_bins() {
        let handle = AnalyzerHandle::new();
        let mut analyzer = FrequencyAnalyzer::new(handle.clone());

        let sample_rate = 48_000u32;
        let tone: Vec<f32> = (0..2048)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * 3000.0 * t).sin()
            })
            .collect();
        for _ in handle.tap(SamplesBuffer::new(1, sample_rate, tone)) {}

        // Several polls so the 0.8 smoothing has caught up.
        let mut frame = analyzer.sample();
        for _ in 0..8 {
            // Keep the write counter moving like a live stream would.
            handle.push(0.5);
            frame = analyzer.sample();
        }
        assert_eq!(frame.len(), FREQ_BINS);
        assert!(frame.iter().any(|&v| v > 0));
    }

    #[test]
    fn idle_frames_decay_toward_silence() {
        let handle = AnalyzerHandle::new();
        let mut analyzer = FrequencyAnalyzer::new(handle.clone());

        let tone: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.4).sin()).collect();
        for _ in handle.tap(SamplesBuffer::new(1, 48_000, tone)) {}
        let live = analyzer.sample();
        assert!(live.iter().any(|&v| v > 0));

        let mut previous: u32 = live.iter().map(|&v| v as u32).sum();
        for _ in 0..64 {
            let frame = analyzer.sample();
            let total: u32 = frame.iter().map(|&v| v as u32).sum();
            assert!(total <= previous);
            previous = total;
        }
        assert_eq!(previous, 0);
    }
}
