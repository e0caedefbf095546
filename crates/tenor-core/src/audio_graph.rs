use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tenor_ports::audio::AudioRenderCallback;
use tenor_ports::synth::SynthPort;
use tenor_ports::types::SampleTime;

pub const LIMITER_CEILING: f32 = 0.98;

pub struct AudioClock {
    sample_time: AtomicU64,
}

impl AudioClock {
    pub fn new() -> Self {
        Self {
            sample_time: AtomicU64::new(0),
        }
    }

    pub fn set(&self, sample_time: SampleTime) {
        self.sample_time.store(sample_time, Ordering::Relaxed);
    }

    pub fn get(&self) -> SampleTime {
        self.sample_time.load(Ordering::Relaxed)
    }
}

impl Default for AudioClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Device callback: pulls the synth and runs a peak limiter over each block.
pub struct AudioGraph {
    synth: Arc<dyn SynthPort>,
    clock: Arc<AudioClock>,
    limiter_gain: Mutex<f32>,
}

impl AudioGraph {
    pub fn new(synth: Arc<dyn SynthPort>, clock: Arc<AudioClock>) -> Self {
        Self {
            synth,
            clock,
            limiter_gain: Mutex::new(1.0),
        }
    }

    pub fn limiter_gain(&self) -> f32 {
        *self.limiter_gain.lock()
    }

    fn limit(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        let mut peak = 0.0_f32;
        for (l, r) in out_l.iter().zip(out_r.iter()) {
            peak = peak.max(l.abs()).max(r.abs());
        }

        let target_gain = if peak > LIMITER_CEILING {
            LIMITER_CEILING / peak
        } else {
            1.0
        };

        let mut gain = self.limiter_gain.lock();
        let coeff = if target_gain < *gain { 0.25 } else { 0.01 };
        let new_gain = (*gain + coeff * (target_gain - *gain)).clamp(0.0, 1.0);
        *gain = new_gain;

        if new_gain < 0.999 {
            for value in out_l.iter_mut().chain(out_r.iter_mut()) {
                *value *= new_gain;
            }
        }
    }
}

impl AudioRenderCallback for AudioGraph {
    fn render(&self, sample_time_start: SampleTime, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        let out_l = &mut out_l[..frames];
        let out_r = &mut out_r[..frames];

        out_l.fill(0.0);
        out_r.fill(0.0);
        self.synth.render(frames, out_l, out_r);
        self.limit(out_l, out_r);

        self.clock
            .set(sample_time_start.saturating_add(frames as u64));
    }
}
