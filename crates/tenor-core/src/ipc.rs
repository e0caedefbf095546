use serde::{Deserialize, Serialize};
use tenor_ports::scene::PointerNdc;
use tenor_ports::storage::{HighlightPolicy, SettingsDto};
use tenor_ports::types::{
    AudioConfig, AudioOutputDevice, DeviceId, MidiInputDevice, Note, Velocity, Volume01,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    ListMidiInputs,
    ListAudioOutputs,
    SelectAudioOutput { device_id: DeviceId, config: Option<AudioConfig> },
    ResumeAudio,
    SetMasterVolume { volume: Volume01 },
    SetHighlightPolicy { policy: HighlightPolicy },
    SetWaveform { bars: usize, smoothing: f32 },
    NoteOn { note: Note, velocity: Option<Velocity> },
    NoteOff { note: Note },
    AllNotesOff,
    PointerDown { at: PointerNdc },
    PointerMove { at: PointerNdc },
    PointerUp,
    PointerLeave,
    ExportDiagnostics { path: String },
}

/// Note traffic as kept in the recent-events log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NoteEvent {
    On { note: Note, velocity: Velocity },
    Off { note: Note },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    MidiInputsUpdated { devices: Vec<MidiInputDevice> },
    AudioOutputsUpdated { devices: Vec<AudioOutputDevice> },
    SettingsUpdated { settings: SettingsDto },
    AudioStateUpdated { initialized: bool, running: bool },
    NoteOn { note: Note, velocity: Velocity, display_name: String, written_name: String },
    NoteOff { note: Note, display_name: String },
    SceneLoaded,
    SceneFailed { message: String },
    RecentNoteEvents { events: Vec<NoteEvent> },
}
