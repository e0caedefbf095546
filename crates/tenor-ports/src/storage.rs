use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_master_volume() -> Volume01 {
    Volume01::new(0.8)
}

fn default_sample_rate_hz() -> u32 {
    48_000
}

fn default_midi_client_name() -> String {
    "TenorKey".to_string()
}

fn default_waveform_bars() -> usize {
    32
}

fn default_waveform_smoothing() -> f32 {
    0.3
}

fn default_device_poll_interval_ms() -> u64 {
    500
}

/// How the highlight binder treats a key shared by several sounding notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HighlightPolicy {
    /// A key stays lit while any sounding note's fingering needs it.
    #[default]
    RefCounted,
    /// Each note off clears every key of its fingering, even if another note shares it.
    PerKey,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    #[serde(default = "default_midi_client_name")]
    pub midi_client_name: String,
    pub selected_audio_out: Option<DeviceId>,
    pub audio_buffer_size_frames: Option<u32>,
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,
    #[serde(default = "default_master_volume")]
    pub master_volume: Volume01,
    pub highlight_policy: HighlightPolicy,
    #[serde(default = "default_waveform_bars")]
    pub waveform_bars: usize,
    #[serde(default = "default_waveform_smoothing")]
    pub waveform_smoothing: f32,
    pub scene_path: Option<String>,
    #[serde(default = "default_device_poll_interval_ms")]
    pub device_poll_interval_ms: u64,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            midi_client_name: default_midi_client_name(),
            selected_audio_out: None,
            audio_buffer_size_frames: None,
            sample_rate_hz: default_sample_rate_hz(),
            master_volume: default_master_volume(),
            highlight_policy: HighlightPolicy::default(),
            waveform_bars: default_waveform_bars(),
            waveform_smoothing: default_waveform_smoothing(),
            scene_path: None,
            device_poll_interval_ms: default_device_poll_interval_ms(),
        }
    }
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}
