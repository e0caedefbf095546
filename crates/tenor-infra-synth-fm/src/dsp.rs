use std::f32::consts::{PI, TAU};

/// Frequency offset, in Hz, of a shift by `cents` around `freq`.
pub fn cents_to_hz_delta(freq: f32, cents: f32) -> f32 {
    freq * (2.0_f32.powf(cents / 1200.0) - 1.0)
}

pub fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[inline]
pub fn advance_phase(phase: f32, freq: f32, sample_rate_hz: f32) -> f32 {
    (phase + TAU * freq / sample_rate_hz).rem_euclid(TAU)
}

/// White noise from a xorshift32 generator.
#[derive(Clone, Debug)]
pub struct NoiseSource {
    rng: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self { rng: seed.max(1) }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// RBJ cookbook biquad, transposed direct form II.
#[derive(Clone, Debug)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// Band-pass with 0 dB peak gain.
    pub fn band_pass(sample_rate_hz: f32, center_hz: f32, q: f32) -> Self {
        let (cos_w, alpha) = Self::prewarp(sample_rate_hz, center_hz, q);
        let a0 = 1.0 + alpha;
        Self::normalized(alpha, 0.0, -alpha, a0, -2.0 * cos_w, 1.0 - alpha)
    }

    pub fn peaking(sample_rate_hz: f32, center_hz: f32, q: f32, gain_db: f32) -> Self {
        let (cos_w, alpha) = Self::prewarp(sample_rate_hz, center_hz, q);
        let a = 10.0_f32.powf(gain_db / 40.0);
        let a0 = 1.0 + alpha / a;
        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_w,
            1.0 - alpha * a,
            a0,
            -2.0 * cos_w,
            1.0 - alpha / a,
        )
    }

    fn prewarp(sample_rate_hz: f32, center_hz: f32, q: f32) -> (f32, f32) {
        let nyquist = sample_rate_hz * 0.5;
        let center = center_hz.clamp(10.0, nyquist * 0.95);
        let w0 = 2.0 * PI * center / sample_rate_hz;
        let alpha = w0.sin() / (2.0 * q.max(0.05));
        (w0.cos(), alpha)
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cents_delta_matches_octave() {
        assert_relative_eq!(cents_to_hz_delta(220.0, 1200.0), 220.0, epsilon = 1e-3);
        assert_relative_eq!(cents_to_hz_delta(440.0, 0.0), 0.0);
        assert!(cents_to_hz_delta(440.0, -30.0) < 0.0);
    }

    #[test]
    fn noise_stays_in_unit_range() {
        let mut noise = NoiseSource::new(7);
        for _ in 0..10_000 {
            let s = noise.next_sample();
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn band_pass_rejects_dc() {
        let mut filter = Biquad::band_pass(48_000.0, 2_000.0, 1.0);
        let mut last = 1.0;
        for _ in 0..48_000 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 1e-3);
    }
}
