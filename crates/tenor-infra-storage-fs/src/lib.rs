use std::fs;
use std::path::{Path, PathBuf};
use tenor_ports::storage::{SettingsDto, StorageError, StoragePort};

pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(base.join("TenorKey"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { base_dir }
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsDto::default());
        }
        Self::read_json(&path)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        Self::write_json(&self.settings_path(), s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tenor_ports::storage::HighlightPolicy;
    use tenor_ports::types::Volume01;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("tenorkey-{name}-{nanos}"))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let storage = FsStorage::new(temp_dir("missing"));
        let settings = storage.load_settings().expect("defaults");
        assert_eq!(settings.waveform_bars, 32);
        assert_eq!(settings.highlight_policy, HighlightPolicy::RefCounted);
    }

    #[test]
    fn settings_roundtrip() {
        let dir = temp_dir("roundtrip");
        let storage = FsStorage::new(dir.clone());
        let settings = SettingsDto {
            master_volume: Volume01::new(0.25),
            highlight_policy: HighlightPolicy::PerKey,
            scene_path: Some("sax.json".to_string()),
            ..SettingsDto::default()
        };
        storage.save_settings(&settings).expect("save");

        let loaded = storage.load_settings().expect("load");
        assert_eq!(loaded.master_volume, Volume01::new(0.25));
        assert_eq!(loaded.highlight_policy, HighlightPolicy::PerKey);
        assert_eq!(loaded.scene_path.as_deref(), Some("sax.json"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = temp_dir("partial");
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join("settings.json"), br#"{ "waveform_bars": 12 }"#).expect("write");

        let loaded = FsStorage::new(dir.clone()).load_settings().expect("load");
        assert_eq!(loaded.waveform_bars, 12);
        assert_eq!(loaded.sample_rate_hz, 48_000);
        assert_eq!(loaded.midi_client_name, "TenorKey");

        let _ = fs::remove_dir_all(&dir);
    }
}
