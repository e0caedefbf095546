pub mod analyser;
pub mod automation;
pub mod dsp;
pub mod voice;

pub use analyser::Analyser;
pub use automation::AutomationParam;
pub use voice::{normalize_velocity, Voice, VoiceParams, VoiceSnapshot};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tenor_ports::synth::{AnalyserTap, SynthError, SynthPort};
use tenor_ports::types::{Note, Velocity, Volume01};

/// Polyphonic FM saxophone voice engine, one voice per sounding note.
pub struct FmSaxSynth {
    inner: Mutex<Inner>,
    master: AtomicU32,
    analyser: Arc<Analyser>,
}

struct Inner {
    sample_rate_hz: f32,
    frames_rendered: u64,
    params: VoiceParams,
    voices: HashMap<Note, Voice>,
    releasing: Vec<Voice>,
    seed_counter: u32,
    mix: Vec<f32>,
}

impl FmSaxSynth {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self::build(sample_rate_hz, VoiceParams::default())
    }

    pub fn with_params(sample_rate_hz: u32, params: VoiceParams) -> Result<Self, SynthError> {
        params.validate()?;
        Ok(Self::build(sample_rate_hz, params))
    }

    fn build(sample_rate_hz: u32, params: VoiceParams) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sample_rate_hz: sample_rate_hz.max(1) as f32,
                frames_rendered: 0,
                params,
                voices: HashMap::new(),
                releasing: Vec::new(),
                seed_counter: 0x9E37_79B9,
                mix: Vec::new(),
            }),
            master: AtomicU32::new(0.8_f32.to_bits()),
            analyser: Arc::new(Analyser::default()),
        }
    }

    pub fn set_params(&self, params: VoiceParams) -> Result<(), SynthError> {
        params.validate()?;
        self.inner.lock().params = params;
        Ok(())
    }

    pub fn params(&self) -> VoiceParams {
        self.inner.lock().params.clone()
    }

    /// Engine clock in seconds: frames rendered so far over the sample rate.
    pub fn now(&self) -> f64 {
        self.inner.lock().now()
    }

    pub fn voice_snapshot(&self, note: Note) -> Option<VoiceSnapshot> {
        let inner = self.inner.lock();
        let now = inner.now();
        inner.voices.get(&note).map(|voice| voice.snapshot(now))
    }

    pub fn live_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.inner.lock().voices.keys().copied().collect();
        notes.sort_unstable();
        notes
    }

    /// Voices released but still ringing out.
    pub fn releasing_count(&self) -> usize {
        self.inner.lock().releasing.len()
    }
}

impl Default for FmSaxSynth {
    fn default() -> Self {
        Self::new(48_000)
    }
}

impl Inner {
    fn now(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate_hz as f64
    }

    fn next_seed(&mut self) -> u32 {
        self.seed_counter = self.seed_counter.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.seed_counter
    }

    fn note_on(&mut self, note: Note, velocity: Velocity) {
        if let Some(stolen) = self.voices.remove(&note) {
            log::debug!("stealing voice for note {}", stolen.note());
            drop(stolen);
        }
        let now = self.now();
        let seed = self.next_seed();
        let voice = Voice::start(note, velocity, now, &self.params, self.sample_rate_hz, seed);
        self.voices.insert(note, voice);
    }

    fn note_off(&mut self, note: Note) {
        let Some(mut voice) = self.voices.remove(&note) else {
            return;
        };
        let now = self.now();
        voice.release(now, self.params.release, self.params.stop_guard);
        self.releasing.push(voice);
    }

    fn all_notes_off(&mut self) {
        let notes: Vec<Note> = self.voices.keys().copied().collect();
        for note in notes {
            self.note_off(note);
        }
    }

    fn render(&mut self, frames: usize, master: f32) -> &[f32] {
        if self.mix.len() < frames {
            self.mix.resize(frames, 0.0);
        }
        let start = self.now();
        let sample_rate_hz = self.sample_rate_hz;
        let step = 1.0 / sample_rate_hz as f64;

        let Inner {
            voices,
            releasing,
            mix,
            ..
        } = self;
        let mix = &mut mix[..frames];
        mix.iter_mut().for_each(|s| *s = 0.0);

        for voice in voices.values_mut().chain(releasing.iter_mut()) {
            for (i, out) in mix.iter_mut().enumerate() {
                let time = start + i as f64 * step;
                if voice.is_finished(time) {
                    break;
                }
                *out += voice.render_sample(time, sample_rate_hz);
            }
        }

        for sample in mix.iter_mut() {
            *sample *= master;
        }

        self.frames_rendered = self.frames_rendered.saturating_add(frames as u64);
        let end = self.now();
        self.releasing.retain(|voice| !voice.is_finished(end));
        for voice in self.voices.values_mut().chain(self.releasing.iter_mut()) {
            voice.prune(end);
        }

        &self.mix[..frames]
    }
}

impl SynthPort for FmSaxSynth {
    fn set_sample_rate(&self, sample_rate_hz: u32) {
        let mut inner = self.inner.lock();
        let now = inner.now();
        let rate = sample_rate_hz.max(1) as f32;
        inner.sample_rate_hz = rate;
        // keep the clock continuous across the change
        inner.frames_rendered = (now * rate as f64).round() as u64;
    }

    fn note_on(&self, note: Note, velocity: Velocity) {
        self.inner.lock().note_on(note, velocity);
    }

    fn note_off(&self, note: Note) {
        self.inner.lock().note_off(note);
    }

    fn all_notes_off(&self) {
        self.inner.lock().all_notes_off();
    }

    fn set_volume(&self, volume: Volume01) {
        let volume = Volume01::new(volume.get());
        self.master.store(volume.get().to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> Volume01 {
        Volume01(f32::from_bits(self.master.load(Ordering::Relaxed)))
    }

    fn is_playing(&self) -> bool {
        !self.inner.lock().voices.is_empty()
    }

    fn analyser(&self) -> Arc<dyn AnalyserTap> {
        self.analyser.clone()
    }

    fn render(&self, frames: usize, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = frames.min(out_l.len()).min(out_r.len());
        let master = self.volume().get();
        let mut inner = self.inner.lock();
        let mix = inner.render(frames, master);
        out_l[..frames].copy_from_slice(mix);
        out_r[..frames].copy_from_slice(mix);
        self.analyser.push_block(mix);
    }
}
