use parking_lot::Mutex;
use std::f32::consts::TAU;
use tenor_ports::synth::AnalyserTap;

pub const DEFAULT_WINDOW: usize = 2048;

/// Rolling window of the master output.
pub struct Analyser {
    ring: Mutex<Ring>,
}

struct Ring {
    buf: Vec<f32>,
    write: usize,
    filled: usize,
}

impl Analyser {
    pub fn new(window: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                buf: vec![0.0; window.max(16)],
                write: 0,
                filled: 0,
            }),
        }
    }

    /// Audio thread side. Skips the block rather than wait on a reader.
    pub fn push_block(&self, samples: &[f32]) {
        let Some(mut ring) = self.ring.try_lock() else {
            return;
        };
        let len = ring.buf.len();
        for &sample in samples {
            let write = ring.write;
            ring.buf[write] = sample;
            ring.write = (write + 1) % len;
        }
        ring.filled = (ring.filled + samples.len()).min(len);
    }

    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.buf.iter_mut().for_each(|s| *s = 0.0);
        ring.write = 0;
        ring.filled = 0;
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl AnalyserTap for Analyser {
    fn time_domain(&self, out: &mut [f32]) -> usize {
        let ring = self.ring.lock();
        let len = ring.buf.len();
        let count = out.len().min(ring.filled);
        let start = (ring.write + len - count) % len;
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            *slot = ring.buf[(start + i) % len];
        }
        count
    }

    fn frequency_magnitudes(&self, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }
        let mut window = vec![0.0; self.window_len()];
        let n = self.time_domain(&mut window);
        let window = &window[..n];
        if n < 2 {
            out.iter_mut().for_each(|m| *m = 0.0);
            return;
        }

        let half = n / 2;
        let bins = out.len();
        for (k, magnitude) in out.iter_mut().enumerate() {
            let index = ((k + 1) * half / bins).max(1) as f32;
            let mut re = 0.0_f32;
            let mut im = 0.0_f32;
            for (i, &x) in window.iter().enumerate() {
                let hann = 0.5 - 0.5 * (TAU * i as f32 / (n - 1) as f32).cos();
                let angle = TAU * index * i as f32 / n as f32;
                re += x * hann * angle.cos();
                im -= x * hann * angle.sin();
            }
            *magnitude = 2.0 * (re * re + im * im).sqrt() / n as f32;
        }
    }

    fn window_len(&self) -> usize {
        self.ring.lock().buf.len()
    }
}
