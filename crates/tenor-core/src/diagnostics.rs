use crate::ipc::NoteEvent;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tenor_ports::storage::{SettingsDto, StorageError};
use tenor_ports::types::{AudioOutputDevice, MidiInputDevice, Note};

#[derive(Serialize)]
struct AppVersion {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct DeviceSnapshot {
    midi_inputs: Vec<MidiInputDevice>,
    audio_outputs: Vec<AudioOutputDevice>,
}

#[derive(Serialize)]
struct NoteSnapshot {
    active_notes: Vec<Note>,
    highlighted_keys: Vec<String>,
    recent_events: Vec<NoteEvent>,
}

/// Everything a bug report needs about the running instrument.
pub struct DiagnosticsReport {
    pub settings: SettingsDto,
    pub midi_inputs: Vec<MidiInputDevice>,
    pub audio_outputs: Vec<AudioOutputDevice>,
    pub active_notes: Vec<Note>,
    pub highlighted_keys: Vec<String>,
    pub recent_events: Vec<NoteEvent>,
}

pub fn export_diagnostics(dir: &Path, report: DiagnosticsReport) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::Io(e.to_string()))?;

    let app_version = AppVersion {
        name: "TenorKey".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let platform = PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    write_json(&dir.join("app_version.json"), &app_version)?;
    write_json(&dir.join("platform.json"), &platform)?;
    write_json(&dir.join("settings.json"), &report.settings)?;
    write_json(
        &dir.join("device_snapshot.json"),
        &DeviceSnapshot {
            midi_inputs: report.midi_inputs,
            audio_outputs: report.audio_outputs,
        },
    )?;
    write_json(
        &dir.join("notes.json"),
        &NoteSnapshot {
            active_notes: report.active_notes,
            highlighted_keys: report.highlighted_keys,
            recent_events: report.recent_events,
        },
    )?;

    log::info!("diagnostics written to {}", dir.display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
    fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
}
