use crate::automation::AutomationParam;
use crate::dsp::{advance_phase, cents_to_hz_delta, midi_to_hz, Biquad, NoiseSource};
use serde::{Deserialize, Serialize};
use tenor_ports::synth::SynthError;
use tenor_ports::types::{Note, Velocity, MIDI_VELOCITY_MAX};

/// Timbre and envelope settings shared by every voice. Times are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain_ratio: f32,
    pub release: f32,
    /// Oscillators keep running this long after the release ramp ends.
    pub stop_guard: f32,
    pub peak_gain: f32,

    pub modulation_attack: f32,
    pub modulation_decay: f32,
    pub mod1_ratio: f32,
    pub mod1_index: f32,
    pub mod1_sustain: f32,
    pub mod2_ratio: f32,
    pub mod2_index: f32,
    pub mod2_sustain: f32,

    pub pitch_bend_cents: f32,
    pub pitch_bend_time: f32,

    pub vibrato_rate_hz: f32,
    pub vibrato_depth_cents: f32,
    pub vibrato_onset: f32,
    pub vibrato_fade: f32,

    pub noise_attack_level: f32,
    pub noise_hold_level: f32,
    pub breath_center_hz: f32,
    pub breath_q: f32,

    pub formant_hz: f32,
    pub formant_q: f32,
    pub formant_gain_db: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            attack: 0.035,
            decay: 0.18,
            sustain_ratio: 0.7,
            release: 0.15,
            stop_guard: 0.02,
            peak_gain: 0.3,

            modulation_attack: 0.015,
            modulation_decay: 0.2,
            mod1_ratio: 2.0,
            mod1_index: 1.4,
            mod1_sustain: 0.45,
            mod2_ratio: 3.0,
            mod2_index: 0.5,
            mod2_sustain: 0.35,

            pitch_bend_cents: -35.0,
            pitch_bend_time: 0.06,

            vibrato_rate_hz: 5.2,
            vibrato_depth_cents: 14.0,
            vibrato_onset: 0.3,
            vibrato_fade: 0.5,

            noise_attack_level: 0.06,
            noise_hold_level: 0.012,
            breath_center_hz: 2_200.0,
            breath_q: 0.9,

            formant_hz: 1_100.0,
            formant_q: 1.4,
            formant_gain_db: 6.0,
        }
    }
}

impl VoiceParams {
    pub fn validate(&self) -> Result<(), SynthError> {
        let times = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
            ("stop_guard", self.stop_guard),
            ("modulation_attack", self.modulation_attack),
            ("modulation_decay", self.modulation_decay),
            ("pitch_bend_time", self.pitch_bend_time),
            ("vibrato_onset", self.vibrato_onset),
            ("vibrato_fade", self.vibrato_fade),
        ];
        for (name, value) in times {
            if !value.is_finite() || value < 0.0 {
                return Err(SynthError::InvalidParams(format!(
                    "{name} must be a non-negative time, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain_ratio) {
            return Err(SynthError::InvalidParams(format!(
                "sustain_ratio must be within [0, 1], got {}",
                self.sustain_ratio
            )));
        }
        if self.peak_gain < 0.0 {
            return Err(SynthError::InvalidParams("peak_gain must be >= 0".to_string()));
        }
        Ok(())
    }
}

pub fn normalize_velocity(velocity: Velocity) -> f32 {
    (velocity.min(MIDI_VELOCITY_MAX) as f32) / MIDI_VELOCITY_MAX as f32
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSnapshot {
    pub note: Note,
    pub frequency_hz: f32,
    pub velocity: f32,
    pub started_at: f64,
    pub peak_gain: f32,
    pub mod1_peak_hz: f32,
    pub mod2_peak_hz: f32,
    pub gain_now: f32,
    pub released_at: Option<f64>,
    pub stop_at: Option<f64>,
}

/// One sounding note: carrier with two sine modulators, vibrato LFO,
/// band-passed breath noise and a formant peak, under an amplitude envelope.
pub struct Voice {
    note: Note,
    frequency_hz: f32,
    velocity: f32,
    started_at: f64,
    peak_gain: f32,
    mod1_peak_hz: f32,
    mod2_peak_hz: f32,
    released_at: Option<f64>,
    stop_at: Option<f64>,

    gain: AutomationParam,
    mod1_depth: AutomationParam,
    mod2_depth: AutomationParam,
    noise_gain: AutomationParam,
    pitch_offset: AutomationParam,
    vibrato_depth: AutomationParam,

    mod1_ratio: f32,
    mod2_ratio: f32,
    vibrato_rate_hz: f32,

    carrier_phase: f32,
    mod1_phase: f32,
    mod2_phase: f32,
    vibrato_phase: f32,

    noise: NoiseSource,
    breath_filter: Biquad,
    formant_filter: Biquad,
}

impl Voice {
    pub fn start(
        note: Note,
        velocity: Velocity,
        now: f64,
        params: &VoiceParams,
        sample_rate_hz: f32,
        seed: u32,
    ) -> Self {
        let frequency_hz = midi_to_hz(note);
        let velocity = normalize_velocity(velocity);
        let peak_gain = params.peak_gain * velocity;

        let attack_end = now + params.attack as f64;
        let decay_end = attack_end + params.decay as f64;

        let mut gain = AutomationParam::new(0.0);
        gain.set_value_at_time(0.0, now);
        gain.linear_ramp_to_value_at_time(peak_gain, attack_end);
        gain.linear_ramp_to_value_at_time(peak_gain * params.sustain_ratio, decay_end);

        let mut pitch_offset = AutomationParam::new(0.0);
        pitch_offset.set_value_at_time(
            cents_to_hz_delta(frequency_hz, params.pitch_bend_cents),
            now,
        );
        pitch_offset.linear_ramp_to_value_at_time(0.0, now + params.pitch_bend_time as f64);

        let mod_peak_end = now + params.modulation_attack as f64;
        let mod_sustain_end = mod_peak_end + params.modulation_decay as f64;
        let mod1_peak = frequency_hz * params.mod1_index * velocity;
        let mod2_peak = frequency_hz * params.mod2_index * velocity;
        let mod1_depth = Self::modulation_envelope(
            now,
            mod_peak_end,
            mod_sustain_end,
            mod1_peak,
            mod1_peak * params.mod1_sustain,
        );
        let mod2_depth = Self::modulation_envelope(
            now,
            mod_peak_end,
            mod_sustain_end,
            mod2_peak,
            mod2_peak * params.mod2_sustain,
        );

        let vibrato_start = now + params.vibrato_onset as f64;
        let mut vibrato_depth = AutomationParam::new(0.0);
        vibrato_depth.set_value_at_time(0.0, now);
        vibrato_depth.set_value_at_time(0.0, vibrato_start);
        vibrato_depth.linear_ramp_to_value_at_time(
            cents_to_hz_delta(frequency_hz, params.vibrato_depth_cents),
            vibrato_start + params.vibrato_fade as f64,
        );

        let mut noise_gain = AutomationParam::new(0.0);
        noise_gain.set_value_at_time(0.0, now);
        noise_gain.linear_ramp_to_value_at_time(params.noise_attack_level, attack_end);
        noise_gain.linear_ramp_to_value_at_time(params.noise_hold_level, decay_end);

        Self {
            note,
            frequency_hz,
            velocity,
            started_at: now,
            peak_gain,
            mod1_peak_hz: mod1_peak,
            mod2_peak_hz: mod2_peak,
            released_at: None,
            stop_at: None,
            gain,
            mod1_depth,
            mod2_depth,
            noise_gain,
            pitch_offset,
            vibrato_depth,
            mod1_ratio: params.mod1_ratio,
            mod2_ratio: params.mod2_ratio,
            vibrato_rate_hz: params.vibrato_rate_hz,
            carrier_phase: 0.0,
            mod1_phase: 0.0,
            mod2_phase: 0.0,
            vibrato_phase: 0.0,
            noise: NoiseSource::new(seed),
            breath_filter: Biquad::band_pass(
                sample_rate_hz,
                params.breath_center_hz,
                params.breath_q,
            ),
            formant_filter: Biquad::peaking(
                sample_rate_hz,
                params.formant_hz,
                params.formant_q,
                params.formant_gain_db,
            ),
        }
    }

    fn modulation_envelope(
        now: f64,
        peak_at: f64,
        sustain_at: f64,
        peak: f32,
        sustain: f32,
    ) -> AutomationParam {
        let mut depth = AutomationParam::new(0.0);
        depth.set_value_at_time(0.0, now);
        depth.linear_ramp_to_value_at_time(peak, peak_at);
        depth.linear_ramp_to_value_at_time(sustain, sustain_at);
        depth
    }

    /// Ramps every enveloped param from wherever it is right now down to zero,
    /// then schedules the oscillators to stop.
    pub fn release(&mut self, now: f64, release: f32, stop_guard: f32) {
        let release_end = now + release as f64;
        for param in [
            &mut self.gain,
            &mut self.mod1_depth,
            &mut self.mod2_depth,
            &mut self.noise_gain,
        ] {
            param.cancel_and_hold_at(now);
            param.linear_ramp_to_value_at_time(0.0, release_end);
        }
        self.released_at = Some(now);
        self.stop_at = Some(release_end + stop_guard as f64);
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.stop_at.is_some_and(|stop_at| now >= stop_at)
    }

    pub fn note(&self) -> Note {
        self.note
    }

    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    pub fn snapshot(&self, now: f64) -> VoiceSnapshot {
        VoiceSnapshot {
            note: self.note,
            frequency_hz: self.frequency_hz,
            velocity: self.velocity,
            started_at: self.started_at,
            peak_gain: self.peak_gain,
            mod1_peak_hz: self.mod1_peak_hz,
            mod2_peak_hz: self.mod2_peak_hz,
            gain_now: self.gain.value_at(now),
            released_at: self.released_at,
            stop_at: self.stop_at,
        }
    }

    #[inline]
    pub fn render_sample(&mut self, time: f64, sample_rate_hz: f32) -> f32 {
        let vibrato = self.vibrato_depth.value_at(time) * self.vibrato_phase.sin();
        let mod1 = self.mod1_depth.value_at(time) * self.mod1_phase.sin();
        let mod2 = self.mod2_depth.value_at(time) * self.mod2_phase.sin();
        let carrier_hz =
            self.frequency_hz + self.pitch_offset.value_at(time) + vibrato + mod1 + mod2;

        let tone = self.carrier_phase.sin();
        let breath = self.breath_filter.process(self.noise.next_sample())
            * self.noise_gain.value_at(time);
        let shaped = self.formant_filter.process(tone + breath);

        self.carrier_phase = advance_phase(self.carrier_phase, carrier_hz, sample_rate_hz);
        self.mod1_phase =
            advance_phase(self.mod1_phase, self.frequency_hz * self.mod1_ratio, sample_rate_hz);
        self.mod2_phase =
            advance_phase(self.mod2_phase, self.frequency_hz * self.mod2_ratio, sample_rate_hz);
        self.vibrato_phase =
            advance_phase(self.vibrato_phase, self.vibrato_rate_hz, sample_rate_hz);

        shaped * self.gain.value_at(time)
    }

    /// Called once per render block.
    pub fn prune(&mut self, time: f64) {
        for param in [
            &mut self.gain,
            &mut self.mod1_depth,
            &mut self.mod2_depth,
            &mut self.noise_gain,
            &mut self.pitch_offset,
            &mut self.vibrato_depth,
        ] {
            param.prune(time);
        }
    }
}
