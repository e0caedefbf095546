//! MIDI input controller: one note on/off stream for hardware and pointer input.

use parking_lot::Mutex;
use rtrb::{Consumer, Producer, RingBuffer};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tenor_domain_fingering::{display_name, is_in_range};
use tenor_ports::midi::{DeviceWatch, MidiInputPort, MidiInputStream, RawMidiMessage};
use tenor_ports::types::{DeviceId, MidiInputDevice, Note, Velocity, MIDI_VELOCITY_MAX};

pub const DEFAULT_VELOCITY: Velocity = MIDI_VELOCITY_MAX;

const RAW_QUEUE_CAPACITY: usize = 1024;

const STATUS_NOTE_OFF: u8 = 0x8;
const STATUS_NOTE_ON: u8 = 0x9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerEventKind {
    NoteOn,
    NoteOff,
    DevicesChanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    NoteOn {
        note: Note,
        velocity: Velocity,
        display_name: String,
    },
    NoteOff {
        note: Note,
        display_name: String,
    },
    DevicesChanged {
        devices: Vec<MidiInputDevice>,
    },
}

impl ControllerEvent {
    pub fn kind(&self) -> ControllerEventKind {
        match self {
            ControllerEvent::NoteOn { .. } => ControllerEventKind::NoteOn,
            ControllerEvent::NoteOff { .. } => ControllerEventKind::NoteOff,
            ControllerEvent::DevicesChanged { .. } => ControllerEventKind::DevicesChanged,
        }
    }
}

pub type Listener = Arc<dyn Fn(&ControllerEvent) + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A decoded channel voice message. The channel is kept for logging only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        note: Note,
        velocity: Velocity,
    },
    NoteOff {
        channel: u8,
        note: Note,
    },
}

/// Note-on with velocity 0 decodes as note-off. Anything else returns `None`.
pub fn decode_message(bytes: &[u8]) -> Option<MidiMessage> {
    if bytes.len() < 3 {
        return None;
    }
    let (status, note, velocity) = (bytes[0], bytes[1], bytes[2]);
    let command = status >> 4;
    let channel = status & 0x0F;
    let note = note & 0x7F;
    let velocity = velocity & 0x7F;

    match command {
        STATUS_NOTE_ON if velocity > 0 => Some(MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        }),
        STATUS_NOTE_ON | STATUS_NOTE_OFF => Some(MidiMessage::NoteOff { channel, note }),
        _ => None,
    }
}

pub struct MidiController {
    active: BTreeSet<Note>,
    listeners: Vec<(SubscriptionId, ControllerEventKind, Listener)>,
    next_subscription: u64,
    port: Option<Arc<dyn MidiInputPort>>,
    streams: HashMap<DeviceId, Box<dyn MidiInputStream>>,
    devices: Vec<MidiInputDevice>,
    watch: Option<Box<dyn DeviceWatch>>,
    devices_dirty: Arc<AtomicBool>,
    raw_tx: Arc<Mutex<Producer<RawMidiMessage>>>,
    raw_rx: Consumer<RawMidiMessage>,
}

impl MidiController {
    pub fn new() -> Self {
        let (producer, consumer) = RingBuffer::new(RAW_QUEUE_CAPACITY);
        Self {
            active: BTreeSet::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            port: None,
            streams: HashMap::new(),
            devices: Vec::new(),
            watch: None,
            devices_dirty: Arc::new(AtomicBool::new(false)),
            raw_tx: Arc::new(Mutex::new(producer)),
            raw_rx: consumer,
        }
    }

    /// Acquires the MIDI transport and subscribes to every input.
    /// Returns false when MIDI is unavailable; manual note input keeps working.
    pub fn init(&mut self, port: Arc<dyn MidiInputPort>) -> bool {
        if self.port.is_some() {
            return true;
        }

        let devices = match port.list_inputs() {
            Ok(devices) => devices,
            Err(err) => {
                log::warn!("midi unavailable: {err}");
                return false;
            }
        };

        let dirty = self.devices_dirty.clone();
        match port.watch_devices(Arc::new(move || dirty.store(true, Ordering::Release))) {
            Ok(watch) => self.watch = Some(watch),
            Err(err) => log::warn!("midi hot-plug notifications unavailable: {err}"),
        }

        self.port = Some(port);
        self.reconcile(devices);
        log::info!("midi ready with {} input(s)", self.devices.len());
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.port.is_some()
    }

    pub fn subscribe(&mut self, kind: ControllerEventKind, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Out-of-range notes are ignored. A repeated note on for a sounding note still emits.
    pub fn note_on(&mut self, note: Note, velocity: Velocity) {
        if !is_in_range(note) {
            log::trace!("note {note} out of range, ignored");
            return;
        }
        let velocity = velocity.min(MIDI_VELOCITY_MAX);
        self.active.insert(note);
        self.emit(&ControllerEvent::NoteOn {
            note,
            velocity,
            display_name: display_name(note),
        });
    }

    pub fn note_on_default(&mut self, note: Note) {
        self.note_on(note, DEFAULT_VELOCITY);
    }

    pub fn note_off(&mut self, note: Note) {
        if !self.active.remove(&note) {
            return;
        }
        self.emit(&ControllerEvent::NoteOff {
            note,
            display_name: display_name(note),
        });
    }

    pub fn all_notes_off(&mut self) {
        let sounding: Vec<Note> = self.active.iter().copied().collect();
        for note in sounding {
            self.note_off(note);
        }
    }

    /// Drains queued hardware messages and applies pending device changes.
    /// Call once per frame from the thread that owns the controller.
    pub fn poll(&mut self) {
        if self.devices_dirty.swap(false, Ordering::AcqRel) {
            self.resync_devices();
        }

        while let Ok(message) = self.raw_rx.pop() {
            self.handle_raw(message.as_slice());
        }
    }

    pub fn handle_raw(&mut self, bytes: &[u8]) {
        match decode_message(bytes) {
            Some(MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            }) => {
                log::debug!("midi ch{channel} note on {note} vel {velocity}");
                self.note_on(note, velocity);
            }
            Some(MidiMessage::NoteOff { channel, note }) => {
                log::debug!("midi ch{channel} note off {note}");
                self.note_off(note);
            }
            None => log::trace!("midi message ignored: {bytes:02X?}"),
        }
    }

    pub fn active_notes(&self) -> Vec<Note> {
        self.active.iter().copied().collect()
    }

    pub fn is_active(&self, note: Note) -> bool {
        self.active.contains(&note)
    }

    pub fn devices(&self) -> &[MidiInputDevice] {
        &self.devices
    }

    /// Closes all device streams and stops watching. Note state is kept.
    pub fn shutdown(&mut self) {
        for (_, stream) in self.streams.drain() {
            stream.close();
        }
        if let Some(watch) = self.watch.take() {
            watch.stop();
        }
        self.devices.clear();
        self.port = None;
    }

    fn resync_devices(&mut self) {
        let Some(port) = self.port.clone() else {
            return;
        };
        match port.list_inputs() {
            Ok(devices) => {
                self.reconcile(devices);
                let devices = self.devices.clone();
                self.emit(&ControllerEvent::DevicesChanged { devices });
            }
            Err(err) => log::warn!("midi re-enumeration failed: {err}"),
        }
    }

    fn reconcile(&mut self, devices: Vec<MidiInputDevice>) {
        let Some(port) = self.port.clone() else {
            return;
        };

        let gone: Vec<DeviceId> = self
            .streams
            .keys()
            .filter(|id| !devices.iter().any(|d| &d.id == *id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(stream) = self.streams.remove(&id) {
                log::info!("midi input {id} disconnected");
                stream.close();
            }
        }

        for device in &devices {
            if self.streams.contains_key(&device.id) {
                continue;
            }
            let producer = self.raw_tx.clone();
            let cb = Arc::new(move |message: RawMidiMessage| {
                if producer.lock().push(message).is_err() {
                    log::warn!("midi queue full, message dropped");
                }
            });
            match port.open_input(&device.id, cb) {
                Ok(stream) => {
                    log::info!("midi input {} ({}) connected", device.name, device.id);
                    self.streams.insert(device.id.clone(), stream);
                }
                Err(err) => log::warn!("could not open midi input {}: {err}", device.name),
            }
        }

        self.devices = devices;
    }

    fn emit(&self, event: &ControllerEvent) {
        let kind = event.kind();
        for (_, listen_kind, listener) in &self.listeners {
            if *listen_kind == kind {
                listener(event);
            }
        }
    }
}

impl Default for MidiController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MidiController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
