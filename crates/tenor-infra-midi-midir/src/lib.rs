use midir::{Ignore, MidiInput};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tenor_ports::midi::{
    DeviceWatch, DevicesChangedCallback, MidiError, MidiInputPort, MidiInputStream,
    RawMessageCallback, RawMidiMessage,
};
use tenor_ports::types::{DeviceId, DeviceState, MidiInputDevice};

pub struct MidirMidiInputPort {
    client_name: String,
    poll_interval: Duration,
}

impl MidirMidiInputPort {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(50));
        self
    }

    fn create_midi_in(client_name: &str) -> Result<MidiInput, MidiError> {
        MidiInput::new(client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }

    fn device_id(index: usize, name: &str) -> DeviceId {
        DeviceId(format!("midir:{}:{}", index, name))
    }

    fn port_names(midi_in: &MidiInput) -> Vec<String> {
        midi_in
            .ports()
            .iter()
            .map(|port| {
                midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| "Unknown Input".to_string())
            })
            .collect()
    }
}

impl Default for MidirMidiInputPort {
    fn default() -> Self {
        Self::new("TenorKey")
    }
}

pub struct MidirMidiInputStream {
    connection: Option<midir::MidiInputConnection<RawMessageCallback>>,
}

impl MidiInputStream for MidirMidiInputStream {
    fn close(mut self: Box<Self>) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
        }
    }
}

pub struct MidirDeviceWatch {
    stop_tx: mpsc::Sender<()>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl DeviceWatch for MidirDeviceWatch {
    fn stop(mut self: Box<Self>) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

impl MidiInputPort for MidirMidiInputPort {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError> {
        let midi_in = Self::create_midi_in(&self.client_name)?;
        let devices = Self::port_names(&midi_in)
            .into_iter()
            .enumerate()
            .map(|(index, name)| MidiInputDevice {
                id: Self::device_id(index, &name),
                name,
                manufacturer: None,
                state: DeviceState::Connected,
            })
            .collect();
        Ok(devices)
    }

    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: RawMessageCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError> {
        let mut midi_in = Self::create_midi_in(&self.client_name)?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let mut selected = None;
        for (index, port) in ports.iter().enumerate() {
            let name = midi_in
                .port_name(port)
                .unwrap_or_else(|_| "Unknown Input".to_string());
            if &Self::device_id(index, &name) == device_id {
                selected = Some(port.clone());
                break;
            }
        }

        let port = selected.ok_or_else(|| MidiError::DeviceNotFound(device_id.to_string()))?;

        let connection = midi_in
            .connect(
                &port,
                "tenorkey-midi-input",
                move |_stamp, message, callback| {
                    (callback)(RawMidiMessage::new(Instant::now(), message));
                },
                cb,
            )
            .map_err(|e| MidiError::Backend(e.to_string()))?;

        Ok(Box::new(MidirMidiInputStream {
            connection: Some(connection),
        }))
    }

    /// midir has no hot-plug notifications, so a background thread polls the port list.
    fn watch_devices(
        &self,
        cb: DevicesChangedCallback,
    ) -> Result<Box<dyn DeviceWatch>, MidiError> {
        let client_name = format!("{}-watch", self.client_name);
        let initial = Self::port_names(&Self::create_midi_in(&client_name)?);
        let interval = self.poll_interval;
        let (stop_tx, stop_rx) = mpsc::channel();

        let join_handle = thread::spawn(move || {
            let mut known = initial;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
                let midi_in = match Self::create_midi_in(&client_name) {
                    Ok(midi_in) => midi_in,
                    Err(err) => {
                        log::warn!("midi device poll failed: {err}");
                        continue;
                    }
                };
                let current = Self::port_names(&midi_in);
                if current != known {
                    log::info!("midi inputs changed: {:?} -> {:?}", known, current);
                    known = current;
                    (cb)();
                }
            }
        });

        Ok(Box::new(MidirDeviceWatch {
            stop_tx,
            join_handle: Some(join_handle),
        }))
    }
}
