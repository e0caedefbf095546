use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tenor_core::{ControllerEvent, ControllerEventKind, MidiController};
use tenor_domain_fingering::TENOR_RANGE;
use tenor_ports::midi::{
    DeviceWatch, DevicesChangedCallback, MidiError, MidiInputPort, MidiInputStream,
    RawMessageCallback, RawMidiMessage,
};
use tenor_ports::types::{DeviceId, DeviceState, MidiInputDevice};

#[derive(Default)]
struct FakeMidiPort {
    devices: Mutex<Vec<MidiInputDevice>>,
    open: Arc<Mutex<HashMap<DeviceId, RawMessageCallback>>>,
    watcher: Mutex<Option<DevicesChangedCallback>>,
    denied: bool,
}

struct FakeStream {
    id: DeviceId,
    open: Arc<Mutex<HashMap<DeviceId, RawMessageCallback>>>,
}

impl MidiInputStream for FakeStream {
    fn close(self: Box<Self>) {
        self.open.lock().remove(&self.id);
    }
}

struct FakeWatch;

impl DeviceWatch for FakeWatch {
    fn stop(self: Box<Self>) {}
}

impl FakeMidiPort {
    fn with_devices(names: &[&str]) -> Arc<Self> {
        let port = Self::default();
        *port.devices.lock() = names.iter().map(|name| device(name)).collect();
        Arc::new(port)
    }

    fn send(&self, name: &str, bytes: &[u8]) {
        let cb = self.open.lock().get(&DeviceId(name.to_string())).cloned();
        if let Some(cb) = cb {
            cb(RawMidiMessage::new(Instant::now(), bytes));
        }
    }

    fn plug(&self, devices: &[&str]) {
        *self.devices.lock() = devices.iter().map(|name| device(name)).collect();
        if let Some(cb) = self.watcher.lock().clone() {
            cb();
        }
    }

    fn open_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.open.lock().keys().map(|id| id.0.clone()).collect();
        ids.sort();
        ids
    }
}

impl MidiInputPort for FakeMidiPort {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError> {
        if self.denied {
            return Err(MidiError::PermissionDenied("blocked".to_string()));
        }
        Ok(self.devices.lock().clone())
    }

    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: RawMessageCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError> {
        self.open.lock().insert(device_id.clone(), cb);
        Ok(Box::new(FakeStream {
            id: device_id.clone(),
            open: self.open.clone(),
        }))
    }

    fn watch_devices(&self, cb: DevicesChangedCallback) -> Result<Box<dyn DeviceWatch>, MidiError> {
        *self.watcher.lock() = Some(cb);
        Ok(Box::new(FakeWatch))
    }
}

fn device(name: &str) -> MidiInputDevice {
    MidiInputDevice {
        id: DeviceId(name.to_string()),
        name: name.to_string(),
        manufacturer: Some("Acme".to_string()),
        state: DeviceState::Connected,
    }
}

fn recording(controller: &mut MidiController) -> Arc<Mutex<Vec<ControllerEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        ControllerEventKind::NoteOn,
        ControllerEventKind::NoteOff,
        ControllerEventKind::DevicesChanged,
    ] {
        let sink = seen.clone();
        controller.subscribe(
            kind,
            Arc::new(move |event: &ControllerEvent| sink.lock().push(event.clone())),
        );
    }
    seen
}

fn note_on(note: u8, velocity: u8, name: &str) -> ControllerEvent {
    ControllerEvent::NoteOn {
        note,
        velocity,
        display_name: name.to_string(),
    }
}

fn note_off(note: u8, name: &str) -> ControllerEvent {
    ControllerEvent::NoteOff {
        note,
        display_name: name.to_string(),
    }
}

#[test]
fn device_note_on_then_note_off() {
    let port = FakeMidiPort::with_devices(&["keys"]);
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    assert!(controller.init(port.clone()));

    port.send("keys", &[0x90, 67, 100]);
    controller.poll();
    assert!(controller.is_active(67));

    port.send("keys", &[0x80, 67, 0]);
    controller.poll();

    assert_eq!(
        seen.lock().as_slice(),
        &[note_on(67, 100, "G4"), note_off(67, "G4")]
    );
    assert!(controller.active_notes().is_empty());
}

#[test]
fn note_on_then_off_emits_one_of_each() {
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);

    controller.note_on(60, 90);
    controller.note_off(60);

    assert_eq!(
        seen.lock().as_slice(),
        &[note_on(60, 90, "C4"), note_off(60, "C4")]
    );
    assert!(!controller.is_active(60));
}

#[test]
fn note_off_without_note_on_is_silent() {
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    controller.note_on(50, 100);

    controller.note_off(61);

    assert_eq!(seen.lock().len(), 1);
    assert_eq!(controller.active_notes(), vec![50]);
}

#[test]
fn out_of_range_notes_are_ignored() {
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);

    controller.note_on(TENOR_RANGE.min - 1, 100);
    controller.note_on(TENOR_RANGE.max + 1, 100);
    controller.note_on(0, 100);
    controller.note_on(127, 100);

    assert!(seen.lock().is_empty());
    assert!(controller.active_notes().is_empty());
}

#[test]
fn all_notes_off_releases_each_once() {
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    for note in [48, 55, 60] {
        controller.note_on_default(note);
    }
    seen.lock().clear();

    controller.all_notes_off();

    assert_eq!(
        seen.lock().as_slice(),
        &[note_off(48, "C3"), note_off(55, "G3"), note_off(60, "C4")]
    );
    assert!(controller.active_notes().is_empty());

    controller.all_notes_off();
    assert_eq!(seen.lock().len(), 3);
}

#[test]
fn repeated_note_on_still_emits() {
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    controller.note_on(60, 100);
    controller.note_on(60, 80);

    assert_eq!(
        seen.lock().as_slice(),
        &[note_on(60, 100, "C4"), note_on(60, 80, "C4")]
    );
    assert_eq!(controller.active_notes(), vec![60]);
}

#[test]
fn zero_velocity_note_on_from_any_channel_releases() {
    let port = FakeMidiPort::with_devices(&["keys"]);
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    controller.init(port.clone());

    port.send("keys", &[0x9A, 64, 70]);
    port.send("keys", &[0x95, 64, 0]);
    port.send("keys", &[0xB0, 64, 127]);
    controller.poll();

    assert_eq!(
        seen.lock().as_slice(),
        &[note_on(64, 70, "E4"), note_off(64, "E4")]
    );
}

#[test]
fn every_input_is_subscribed() {
    let port = FakeMidiPort::with_devices(&["a", "b"]);
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    controller.init(port.clone());

    port.send("a", &[0x90, 60, 100]);
    port.send("b", &[0x90, 62, 100]);
    controller.poll();

    assert_eq!(controller.active_notes(), vec![60, 62]);
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(port.open_ids(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn hot_plug_reconciles_subscriptions() {
    let port = FakeMidiPort::with_devices(&["a"]);
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);
    controller.init(port.clone());

    port.plug(&["b"]);
    controller.poll();

    assert_eq!(port.open_ids(), vec!["b".to_string()]);
    assert_eq!(controller.devices(), &[device("b")]);
    assert_eq!(
        seen.lock().as_slice(),
        &[ControllerEvent::DevicesChanged {
            devices: vec![device("b")]
        }]
    );
}

#[test]
fn denied_access_still_allows_manual_notes() {
    let port = Arc::new(FakeMidiPort {
        denied: true,
        ..FakeMidiPort::default()
    });
    let mut controller = MidiController::new();
    let seen = recording(&mut controller);

    assert!(!controller.init(port));
    assert!(!controller.is_initialized());

    controller.note_on_default(60);
    assert_eq!(seen.lock().as_slice(), &[note_on(60, 127, "C4")]);
}

#[test]
fn disconnect_keeps_note_state() {
    let port = FakeMidiPort::with_devices(&["a"]);
    let mut controller = MidiController::new();
    controller.init(port.clone());
    port.send("a", &[0x90, 60, 100]);
    controller.poll();

    port.plug(&[]);
    controller.poll();

    assert!(controller.is_active(60));
    assert!(controller.devices().is_empty());
}
