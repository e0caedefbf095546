//! Lazily opened output stream feeding the shared synth.

use crate::audio_graph::{AudioClock, AudioGraph};
use std::sync::Arc;
use tenor_ports::audio::{AudioError, AudioOutputPort, AudioRenderCallback, AudioStreamHandle};
use tenor_ports::synth::SynthPort;
use tenor_ports::types::{AudioConfig, DeviceId, Volume01};

pub struct AudioEngine {
    port: Arc<dyn AudioOutputPort>,
    synth: Arc<dyn SynthPort>,
    clock: Arc<AudioClock>,
    config: AudioConfig,
    device: Option<DeviceId>,
    stream: Option<Box<dyn AudioStreamHandle>>,
}

impl AudioEngine {
    pub fn new(
        port: Arc<dyn AudioOutputPort>,
        synth: Arc<dyn SynthPort>,
        config: AudioConfig,
        device: Option<DeviceId>,
    ) -> Self {
        Self {
            port,
            synth,
            clock: Arc::new(AudioClock::new()),
            config,
            device,
            stream: None,
        }
    }

    /// Opens the output stream once. Later calls return true without reopening.
    pub fn init(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }
        match self.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                true
            }
            Err(err) => {
                log::warn!("audio unavailable: {err}");
                false
            }
        }
    }

    /// Starts pulling audio if the stream is suspended. Streams open suspended.
    pub fn resume(&mut self) -> Result<(), AudioError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AudioError::DeviceUnavailable("audio not initialised".to_string()))?;
        if stream.is_suspended() {
            stream.resume()?;
            log::debug!("audio resumed");
        }
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), AudioError> {
        match self.stream.as_ref() {
            Some(stream) if !stream.is_suspended() => stream.suspend(),
            _ => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream
            .as_ref()
            .map(|stream| !stream.is_suspended())
            .unwrap_or(false)
    }

    pub fn is_initialized(&self) -> bool {
        self.stream.is_some()
    }

    /// Reopens on another device; the new stream is resumed if the old one was running.
    pub fn select_output(
        &mut self,
        device: DeviceId,
        config: Option<AudioConfig>,
    ) -> Result<(), AudioError> {
        let was_running = self.is_running();
        self.close();
        self.device = Some(device);
        if let Some(config) = config {
            self.config = config;
        }
        let stream = self.open()?;
        self.stream = Some(stream);
        if was_running {
            self.resume()?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.close();
        }
    }

    pub fn set_volume(&self, volume: Volume01) {
        self.synth.set_volume(volume);
    }

    pub fn volume(&self) -> Volume01 {
        self.synth.volume()
    }

    pub fn device(&self) -> Option<&DeviceId> {
        self.device.as_ref()
    }

    pub fn config(&self) -> AudioConfig {
        self.config
    }

    pub fn sample_time(&self) -> u64 {
        self.clock.get()
    }

    fn open(&mut self) -> Result<Box<dyn AudioStreamHandle>, AudioError> {
        let device = match self.device.clone() {
            Some(device) => device,
            None => self
                .port
                .default_output()?
                .ok_or_else(|| AudioError::DeviceNotFound("no default output".to_string()))?,
        };

        self.synth.set_sample_rate(self.config.sample_rate_hz);
        let graph = AudioGraph::new(self.synth.clone(), self.clock.clone());
        let stream = self.port.open_output(
            &device,
            self.config,
            Arc::new(graph) as Arc<dyn AudioRenderCallback>,
        )?;

        log::info!(
            "audio output {device} opened at {} Hz",
            self.config.sample_rate_hz
        );
        self.device = Some(device);
        Ok(stream)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.close();
    }
}
