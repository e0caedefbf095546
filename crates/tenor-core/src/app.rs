use crate::audio_engine::AudioEngine;
use crate::controller::{ControllerEvent, ControllerEventKind, MidiController, SubscriptionId};
use crate::diagnostics::{export_diagnostics, DiagnosticsReport};
use crate::highlight::HighlightBinder;
use crate::ipc::{Command, Event, NoteEvent};
use crate::render_loop::{InteractionConfig, InteractionLoop, WaveformBars};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tenor_domain_fingering::written_name;
use tenor_ports::audio::{AudioError, AudioOutputPort};
use tenor_ports::midi::{MidiError, MidiInputPort};
use tenor_ports::scene::{SceneError, ScenePort};
use tenor_ports::storage::{SettingsDto, StorageError, StoragePort};
use tenor_ports::synth::{SynthError, SynthPort};
use tenor_ports::types::AudioConfig;

const RECENT_EVENTS: usize = 20;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("midi error: {0}")]
    Midi(#[from] MidiError),
    #[error("synth error: {0}")]
    Synth(#[from] SynthError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

pub struct AppPorts {
    pub audio: Arc<dyn AudioOutputPort>,
    pub midi: Arc<dyn MidiInputPort>,
    pub synth: Arc<dyn SynthPort>,
    pub storage: Option<Box<dyn StoragePort>>,
}

/// Owns the controller and routes its notes to the synth and, once a scene
/// is attached, to the highlight binder.
pub struct AppCore {
    midi_port: Arc<dyn MidiInputPort>,
    audio_port: Arc<dyn AudioOutputPort>,
    synth: Arc<dyn SynthPort>,
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
    controller: MidiController,
    audio: AudioEngine,
    interaction: InteractionLoop,
    binder: Option<Arc<HighlightBinder>>,
    binder_subscriptions: Vec<SubscriptionId>,
    captured: Arc<Mutex<Vec<ControllerEvent>>>,
    events: VecDeque<Event>,
    recent: VecDeque<NoteEvent>,
    last_recent_emit: Instant,
    audio_unavailable: bool,
}

impl AppCore {
    pub fn new(ports: AppPorts) -> Self {
        let settings = match ports.storage.as_ref().map(|storage| storage.load_settings()) {
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                log::warn!("settings unreadable, using defaults: {err}");
                SettingsDto::default()
            }
            None => SettingsDto::default(),
        };

        ports.synth.set_volume(settings.master_volume);

        let mut controller = MidiController::new();
        let synth = ports.synth.clone();
        controller.subscribe(
            ControllerEventKind::NoteOn,
            Arc::new(move |event: &ControllerEvent| {
                if let ControllerEvent::NoteOn { note, velocity, .. } = event {
                    synth.note_on(*note, *velocity);
                }
            }),
        );
        let synth = ports.synth.clone();
        controller.subscribe(
            ControllerEventKind::NoteOff,
            Arc::new(move |event: &ControllerEvent| {
                if let ControllerEvent::NoteOff { note, .. } = event {
                    synth.note_off(*note);
                }
            }),
        );

        let captured = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            ControllerEventKind::NoteOn,
            ControllerEventKind::NoteOff,
            ControllerEventKind::DevicesChanged,
        ] {
            let sink = captured.clone();
            controller.subscribe(
                kind,
                Arc::new(move |event: &ControllerEvent| sink.lock().push(event.clone())),
            );
        }

        let audio = AudioEngine::new(
            ports.audio.clone(),
            ports.synth.clone(),
            AudioConfig {
                sample_rate_hz: settings.sample_rate_hz,
                channels: 2,
                buffer_size_frames: settings.audio_buffer_size_frames,
            },
            settings.selected_audio_out.clone(),
        );

        let interaction = InteractionLoop::new(
            ports.synth.clone(),
            InteractionConfig {
                waveform_bars: settings.waveform_bars,
                waveform_smoothing: settings.waveform_smoothing,
                ..InteractionConfig::default()
            },
        );

        Self {
            midi_port: ports.midi,
            audio_port: ports.audio,
            synth: ports.synth,
            storage: ports.storage,
            settings,
            controller,
            audio,
            interaction,
            binder: None,
            binder_subscriptions: Vec::new(),
            captured,
            events: VecDeque::new(),
            recent: VecDeque::with_capacity(RECENT_EVENTS),
            last_recent_emit: Instant::now(),
            audio_unavailable: false,
        }
    }

    /// Subscribes to every MIDI input. False means pointer input only.
    pub fn init_midi(&mut self) -> bool {
        self.controller.init(self.midi_port.clone())
    }

    /// Opens and resumes the output. False means the instrument stays silent.
    pub fn init_audio(&mut self) -> bool {
        let ready = self.audio.init()
            && match self.audio.resume() {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("audio resume failed: {err}");
                    false
                }
            };
        self.audio_unavailable = !ready;
        self.emit_audio_state();
        ready
    }

    pub fn attach_scene(&mut self, scene: Arc<dyn ScenePort>) {
        self.detach_binder();
        let binder = Arc::new(HighlightBinder::new(
            scene.clone(),
            self.settings.highlight_policy,
        ));
        self.binder_subscriptions = binder.attach(&mut self.controller).to_vec();
        self.binder = Some(binder);
        self.interaction.set_scene(scene);
        self.events.push_back(Event::SceneLoaded);
    }

    /// A failed load leaves the controller and synth usable.
    pub fn scene_failed(&mut self, err: &SceneError) {
        log::error!("scene load failed: {err}");
        self.events.push_back(Event::SceneFailed {
            message: err.to_string(),
        });
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), AppError> {
        match cmd {
            Command::ListMidiInputs => {
                let devices = self.midi_port.list_inputs()?;
                self.events.push_back(Event::MidiInputsUpdated { devices });
            }
            Command::ListAudioOutputs => {
                let devices = self.audio_port.list_outputs()?;
                self.events.push_back(Event::AudioOutputsUpdated { devices });
            }
            Command::SelectAudioOutput { device_id, config } => {
                self.audio.select_output(device_id.clone(), config)?;
                self.settings.selected_audio_out = Some(device_id);
                if let Some(config) = config {
                    self.settings.sample_rate_hz = config.sample_rate_hz;
                    self.settings.audio_buffer_size_frames = config.buffer_size_frames;
                }
                self.emit_audio_state();
                self.settings_changed();
            }
            Command::ResumeAudio => {
                self.audio_unavailable = false;
                self.init_audio();
            }
            Command::SetMasterVolume { volume } => {
                self.audio.set_volume(volume);
                self.settings.master_volume = self.audio.volume();
                self.settings_changed();
            }
            Command::SetHighlightPolicy { policy } => {
                if let Some(binder) = &self.binder {
                    binder.set_policy(policy);
                }
                self.settings.highlight_policy = policy;
                self.settings_changed();
            }
            Command::SetWaveform { bars, smoothing } => {
                let bars = bars.max(1);
                let smoothing = smoothing.clamp(0.0, 1.0);
                self.interaction.set_waveform(bars, smoothing);
                self.settings.waveform_bars = bars;
                self.settings.waveform_smoothing = smoothing;
                self.settings_changed();
            }
            Command::NoteOn { note, velocity } => {
                self.ensure_audio();
                match velocity {
                    Some(velocity) => self.controller.note_on(note, velocity),
                    None => self.controller.note_on_default(note),
                }
            }
            Command::NoteOff { note } => self.controller.note_off(note),
            Command::AllNotesOff => self.controller.all_notes_off(),
            Command::PointerDown { at } => {
                self.ensure_audio();
                self.interaction.pointer_down(&mut self.controller, at);
            }
            Command::PointerMove { at } => self.interaction.pointer_move(at),
            Command::PointerUp => self.interaction.pointer_up(&mut self.controller),
            Command::PointerLeave => self.interaction.pointer_leave(&mut self.controller),
            Command::ExportDiagnostics { path } => {
                let audio_outputs = self.audio_port.list_outputs().unwrap_or_else(|err| {
                    log::warn!("audio outputs unavailable for diagnostics: {err}");
                    Vec::new()
                });
                let report = DiagnosticsReport {
                    settings: self.settings.clone(),
                    midi_inputs: self.controller.devices().to_vec(),
                    audio_outputs,
                    active_notes: self.controller.active_notes(),
                    highlighted_keys: self
                        .binder
                        .as_ref()
                        .map(|binder| binder.highlighted_keys())
                        .unwrap_or_default(),
                    recent_events: self.recent.iter().copied().collect(),
                };
                export_diagnostics(Path::new(&path), report)?;
            }
        }
        self.flush_controller_events();
        Ok(())
    }

    /// One display frame: hardware input first, then the render loop.
    pub fn tick(&mut self, dt: f64) {
        self.controller.poll();
        self.flush_controller_events();
        self.interaction.frame(dt);
        self.emit_recent_events();
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn controller(&self) -> &MidiController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MidiController {
        &mut self.controller
    }

    pub fn binder(&self) -> Option<&Arc<HighlightBinder>> {
        self.binder.as_ref()
    }

    pub fn interaction(&self) -> &InteractionLoop {
        &self.interaction
    }

    pub fn waveform(&self) -> &WaveformBars {
        self.interaction.waveform()
    }

    pub fn synth(&self) -> &Arc<dyn SynthPort> {
        &self.synth
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn recent_events(&self) -> Vec<NoteEvent> {
        self.recent.iter().copied().collect()
    }

    pub fn shutdown(&mut self) {
        self.controller.all_notes_off();
        self.flush_controller_events();
        self.controller.shutdown();
        self.audio.close();
    }

    /// Audio starts on the first note. After a failure only `ResumeAudio` retries.
    fn ensure_audio(&mut self) {
        if !self.audio_unavailable && !self.audio.is_running() {
            self.init_audio();
        }
    }

    fn detach_binder(&mut self) {
        for id in self.binder_subscriptions.drain(..) {
            self.controller.unsubscribe(id);
        }
        if let Some(binder) = self.binder.take() {
            binder.clear();
        }
    }

    fn flush_controller_events(&mut self) {
        let captured: Vec<ControllerEvent> = std::mem::take(&mut *self.captured.lock());
        let mut started_note = false;
        for event in captured {
            match event {
                ControllerEvent::NoteOn {
                    note,
                    velocity,
                    display_name,
                } => {
                    started_note = true;
                    self.record_recent(NoteEvent::On { note, velocity });
                    self.events.push_back(Event::NoteOn {
                        note,
                        velocity,
                        display_name,
                        written_name: written_name(note),
                    });
                }
                ControllerEvent::NoteOff { note, display_name } => {
                    self.record_recent(NoteEvent::Off { note });
                    self.events.push_back(Event::NoteOff { note, display_name });
                }
                ControllerEvent::DevicesChanged { devices } => {
                    self.events.push_back(Event::MidiInputsUpdated { devices });
                }
            }
        }
        if started_note {
            self.ensure_audio();
        }
    }

    fn record_recent(&mut self, event: NoteEvent) {
        if self.recent.len() >= RECENT_EVENTS {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    fn emit_recent_events(&mut self) {
        if self.last_recent_emit.elapsed() < Duration::from_millis(50) {
            return;
        }
        if !self.recent.is_empty() {
            self.events.push_back(Event::RecentNoteEvents {
                events: self.recent.iter().copied().collect(),
            });
        }
        self.last_recent_emit = Instant::now();
    }

    fn emit_audio_state(&mut self) {
        self.events.push_back(Event::AudioStateUpdated {
            initialized: self.audio.is_initialized(),
            running: self.audio.is_running(),
        });
    }

    fn settings_changed(&mut self) {
        self.events.push_back(Event::SettingsUpdated {
            settings: self.settings.clone(),
        });
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.save_settings(&self.settings) {
                log::warn!("settings not saved: {err}");
            }
        }
    }
}

impl Drop for AppCore {
    fn drop(&mut self) {
        self.detach_binder();
    }
}
