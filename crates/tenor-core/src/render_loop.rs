//! Per-frame interaction: idle rotation, waveform bars, pointer routing.

use crate::controller::MidiController;
use std::sync::Arc;
use tenor_domain_fingering::{strip_back_face, trigger_note_for};
use tenor_ports::scene::{PointerNdc, ScenePort};
use tenor_ports::synth::SynthPort;
use tenor_ports::types::Note;

pub const IDLE_DAMPING: f32 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Velocity multiplier applied each frame while not dragging.
    pub idle_damping: f32,
    /// Radians of rotation per unit of horizontal pointer travel.
    pub drag_sensitivity: f32,
    pub waveform_bars: usize,
    pub waveform_smoothing: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            idle_damping: IDLE_DAMPING,
            drag_sensitivity: std::f32::consts::PI,
            waveform_bars: 32,
            waveform_smoothing: 0.3,
        }
    }
}

/// Bar-style waveform: one smoothed magnitude per bar.
#[derive(Clone, Debug)]
pub struct WaveformBars {
    smoothed: Vec<f32>,
    smoothing: f32,
    active: bool,
}

impl WaveformBars {
    pub fn new(bars: usize, smoothing: f32) -> Self {
        Self {
            smoothed: vec![0.0; bars.max(1)],
            smoothing: smoothing.clamp(0.0, 1.0),
            active: false,
        }
    }

    /// Downsamples by picking every `len / bars`-th sample.
    pub fn update(&mut self, samples: &[f32]) {
        self.active = true;
        if samples.is_empty() {
            return;
        }
        let bars = self.smoothed.len();
        let step = (samples.len() / bars).max(1);
        let a = self.smoothing;
        for (i, bar) in self.smoothed.iter_mut().enumerate() {
            let sample = samples.get(i * step).copied().unwrap_or(0.0);
            *bar = *bar * (1.0 - a) + sample.abs() * a;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bars(&self) -> &[f32] {
        &self.smoothed
    }
}

pub struct InteractionLoop {
    synth: Arc<dyn SynthPort>,
    scene: Option<Arc<dyn ScenePort>>,
    config: InteractionConfig,
    clock_seconds: f64,
    rotation: f32,
    velocity: f32,
    drag_last_x: Option<f32>,
    held_note: Option<Note>,
    waveform: WaveformBars,
    samples: Vec<f32>,
}

impl InteractionLoop {
    pub fn new(synth: Arc<dyn SynthPort>, config: InteractionConfig) -> Self {
        let window = synth.analyser().window_len();
        Self {
            synth,
            scene: None,
            waveform: WaveformBars::new(config.waveform_bars, config.waveform_smoothing),
            config,
            clock_seconds: 0.0,
            rotation: 0.0,
            velocity: 0.0,
            drag_last_x: None,
            held_note: None,
            samples: vec![0.0; window],
        }
    }

    pub fn set_scene(&mut self, scene: Arc<dyn ScenePort>) {
        scene.set_model_rotation(self.rotation);
        self.scene = Some(scene);
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Waveform settings changed; restarts the smoothing.
    pub fn set_waveform(&mut self, bars: usize, smoothing: f32) {
        self.config.waveform_bars = bars;
        self.config.waveform_smoothing = smoothing;
        self.waveform = WaveformBars::new(bars, smoothing);
    }

    /// One display frame. `dt` is the time since the previous frame.
    pub fn frame(&mut self, dt: f64) {
        self.clock_seconds += dt.max(0.0);

        if self.drag_last_x.is_none() {
            self.velocity *= self.config.idle_damping;
            self.rotation += self.velocity;
        }

        if self.synth.is_playing() {
            let written = self.synth.analyser().time_domain(&mut self.samples);
            self.waveform.update(&self.samples[..written]);
        } else {
            self.waveform.deactivate();
        }

        if let Some(scene) = &self.scene {
            scene.set_time_uniform(self.clock_seconds as f32);
            scene.set_model_rotation(self.rotation);
            scene.render();
        }
    }

    /// A press on an interactive key plays its note; anything else starts a drag.
    pub fn pointer_down(&mut self, controller: &mut MidiController, at: PointerNdc) {
        let hit = self
            .scene
            .as_ref()
            .and_then(|scene| scene.pick(at))
            .and_then(|name| trigger_note_for(strip_back_face(&name)));

        match hit {
            Some(note) => {
                self.release_held(controller);
                controller.note_on_default(note);
                self.held_note = Some(note);
            }
            None => {
                self.drag_last_x = Some(at.x);
                self.velocity = 0.0;
            }
        }
    }

    pub fn pointer_move(&mut self, at: PointerNdc) {
        let Some(last_x) = self.drag_last_x else {
            return;
        };
        let delta = (at.x - last_x) * self.config.drag_sensitivity;
        self.rotation += delta;
        self.velocity = delta;
        self.drag_last_x = Some(at.x);
    }

    pub fn pointer_up(&mut self, controller: &mut MidiController) {
        self.drag_last_x = None;
        self.release_held(controller);
    }

    pub fn pointer_leave(&mut self, controller: &mut MidiController) {
        self.pointer_up(controller);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_last_x.is_some()
    }

    pub fn held_note(&self) -> Option<Note> {
        self.held_note
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn clock_seconds(&self) -> f64 {
        self.clock_seconds
    }

    pub fn waveform(&self) -> &WaveformBars {
        &self.waveform
    }

    fn release_held(&mut self, controller: &mut MidiController) {
        if let Some(note) = self.held_note.take() {
            controller.note_off(note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bars_smooth_towards_magnitude() {
        let mut bars = WaveformBars::new(4, 0.5);
        let samples = [-1.0_f32; 16];
        bars.update(&samples);
        assert!(bars.is_active());
        assert_relative_eq!(bars.bars()[0], 0.5);
        bars.update(&samples);
        assert_relative_eq!(bars.bars()[3], 0.75);
    }

    #[test]
    fn bars_pick_evenly_spaced_samples() {
        let mut bars = WaveformBars::new(2, 1.0);
        bars.update(&[0.1, 0.9, 0.2, 0.8]);
        assert_relative_eq!(bars.bars()[0], 0.1);
        assert_relative_eq!(bars.bars()[1], 0.2);
    }

    #[test]
    fn deactivate_keeps_last_values() {
        let mut bars = WaveformBars::new(1, 1.0);
        bars.update(&[0.4]);
        bars.deactivate();
        assert!(!bars.is_active());
        assert_relative_eq!(bars.bars()[0], 0.4);
    }
}
