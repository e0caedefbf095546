use crate::types::*;
use std::{sync::Arc, time::Instant};

/// One raw message as delivered by the transport; decoding happens in the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMidiMessage {
    pub at: Instant,
    pub bytes: [u8; 3],
    pub len: u8,
}

impl RawMidiMessage {
    pub fn new(at: Instant, message: &[u8]) -> Self {
        let mut bytes = [0u8; 3];
        let len = message.len().min(3);
        bytes[..len].copy_from_slice(&message[..len]);
        Self {
            at,
            bytes,
            len: len as u8,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MidiError {
    #[error("midi not supported on this platform")]
    Unsupported,
    #[error("midi access denied: {0}")]
    PermissionDenied(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// MIDI input stream handle: drop closes it.
pub trait MidiInputStream: Send {
    fn close(self: Box<Self>);
}

/// Device watch handle: drop stops watching.
pub trait DeviceWatch: Send {
    fn stop(self: Box<Self>);
}

pub type RawMessageCallback = Arc<dyn Fn(RawMidiMessage) + Send + Sync + 'static>;
pub type DevicesChangedCallback = Arc<dyn Fn() + Send + Sync + 'static>;

pub trait MidiInputPort: Send + Sync {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError>;

    /// Open input stream: implementation should invoke cb from a background thread/callback.
    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: RawMessageCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError>;

    /// Notify whenever the set of available inputs changes.
    fn watch_devices(&self, cb: DevicesChangedCallback) -> Result<Box<dyn DeviceWatch>, MidiError>;
}
