/// Peaking (bell) biquad, RBJ cookbook coefficients, direct form I.
///
/// Gain changes are ramped toward the target with a one-pole smoother
/// (roughly a 100 ms time constant) so live slider moves do not click.
#[derive(Debug, Clone)]
pub struct Peaking {
    frequency: f32,
    q: f32,
    sample_rate: f32,

    gain_db: f32,
    target_gain_db: f32,

    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

const SMOOTHING_SECS: f32 = 0.1;

// Below this the ramp snaps to the target instead of chasing it forever.
const SNAP_DB: f32 = 0.01;

impl Peaking {
    pub fn new(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            frequency,
            q,
            sample_rate,
            gain_db: 0.0,
            target_gain_db: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn set_target_gain_db(&mut self, gain_db: f32) {
        self.target_gain_db = gain_db;
    }

    /// Jump straight to the target gain. Used for offline rendering where
    /// a ramp-in would color the head of the file.
    pub fn snap_to_target(&mut self) {
        self.gain_db = self.target_gain_db;
        self.update_coefficients();
    }

    /// Move the smoothed gain toward the target as if `samples` samples of
    /// audio had elapsed, then refresh the coefficients.
    pub fn advance_smoothing(&mut self, samples: usize) {
        if (self.gain_db - self.target_gain_db).abs() < SNAP_DB {
            if self.gain_db != self.target_gain_db {
                self.snap_to_target();
            }
            return;
        }
        let decay = (-(samples as f32) / (SMOOTHING_SECS * self.sample_rate)).exp();
        self.gain_db = self.target_gain_db + (self.gain_db - self.target_gain_db) * decay;
        self.update_coefficients();
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn reset_state(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate > 0.0 && sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        let a = 10.0_f32.powf(self.gain_db / 40.0);
        let w0 = 2.0 * std::f32::consts::PI * self.frequency / self.sample_rate;
        let alpha = w0.sin() / (2.0 * self.q);
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha / a;
        self.b0 = (1.0 + alpha * a) / a0;
        self.b1 = (-2.0 * cos_w0) / a0;
        self.b2 = (1.0 - alpha * a) / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha / a) / a0;
    }
}
