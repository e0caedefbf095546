//! Lights up the key parts of the sounding notes' fingerings.

use crate::controller::{ControllerEvent, ControllerEventKind, MidiController, SubscriptionId};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tenor_domain_fingering::{fingering_for, fingering_uses_key, key_category};
use tenor_ports::scene::{MaterialKind, MaterialRef, PartId, ScenePort};
use tenor_ports::storage::HighlightPolicy;
use tenor_ports::types::Note;

#[derive(Default)]
struct HighlightState {
    highlighted: BTreeSet<String>,
    originals: HashMap<PartId, MaterialRef>,
    lit_notes: BTreeSet<Note>,
}

pub struct HighlightBinder {
    scene: Arc<dyn ScenePort>,
    policy: Mutex<HighlightPolicy>,
    state: Mutex<HighlightState>,
}

impl HighlightBinder {
    pub fn new(scene: Arc<dyn ScenePort>, policy: HighlightPolicy) -> Self {
        Self {
            scene,
            policy: Mutex::new(policy),
            state: Mutex::new(HighlightState::default()),
        }
    }

    pub fn policy(&self) -> HighlightPolicy {
        *self.policy.lock()
    }

    pub fn set_policy(&self, policy: HighlightPolicy) {
        *self.policy.lock() = policy;
    }

    /// No-op when the key is already lit or has no part in the scene.
    pub fn highlight(&self, key: &str) {
        let mut state = self.state.lock();
        self.highlight_locked(&mut state, key);
    }

    pub fn unhighlight(&self, key: &str) {
        let mut state = self.state.lock();
        self.unhighlight_locked(&mut state, key);
    }

    pub fn is_highlighted(&self, key: &str) -> bool {
        self.state.lock().highlighted.contains(key)
    }

    pub fn highlighted_keys(&self) -> Vec<String> {
        self.state.lock().highlighted.iter().cloned().collect()
    }

    pub fn on_note_on(&self, note: Note) {
        let mut state = self.state.lock();
        state.lit_notes.insert(note);
        for key in fingering_for(note) {
            self.highlight_locked(&mut state, key);
        }
    }

    pub fn on_note_off(&self, note: Note) {
        let policy = self.policy();
        let mut state = self.state.lock();
        state.lit_notes.remove(&note);
        for key in fingering_for(note) {
            let still_needed = policy == HighlightPolicy::RefCounted
                && state
                    .lit_notes
                    .iter()
                    .any(|other| fingering_uses_key(*other, key));
            if !still_needed {
                self.unhighlight_locked(&mut state, key);
            }
        }
    }

    /// Restores every lit key.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.lit_notes.clear();
        let keys: Vec<String> = state.highlighted.iter().cloned().collect();
        for key in keys {
            self.unhighlight_locked(&mut state, &key);
        }
    }

    /// Follows the controller's note events and catches up with notes already sounding.
    pub fn attach(self: &Arc<Self>, controller: &mut MidiController) -> [SubscriptionId; 2] {
        for note in controller.active_notes() {
            self.on_note_on(note);
        }

        let binder = self.clone();
        let on = controller.subscribe(
            ControllerEventKind::NoteOn,
            Arc::new(move |event: &ControllerEvent| {
                if let ControllerEvent::NoteOn { note, .. } = event {
                    binder.on_note_on(*note);
                }
            }),
        );
        let binder = self.clone();
        let off = controller.subscribe(
            ControllerEventKind::NoteOff,
            Arc::new(move |event: &ControllerEvent| {
                if let ControllerEvent::NoteOff { note, .. } = event {
                    binder.on_note_off(*note);
                }
            }),
        );
        [on, off]
    }

    fn highlight_locked(&self, state: &mut HighlightState, key: &str) {
        if state.highlighted.contains(key) {
            return;
        }
        let Some(part) = self.scene.find_part(key) else {
            return;
        };
        let Some(highlight) = self.scene.material(MaterialKind::Highlight) else {
            log::warn!("scene has no highlight material");
            return;
        };

        if !state.originals.contains_key(&part) {
            if let Some(current) = self.scene.part_material(part) {
                state.originals.insert(part, current);
            }
        }

        self.scene.set_part_material(part, highlight.clone());
        if let Some(back) = self.scene.back_face_of(part) {
            self.scene.set_part_material(back, highlight);
        }
        state.highlighted.insert(key.to_string());
    }

    fn unhighlight_locked(&self, state: &mut HighlightState, key: &str) {
        if !state.highlighted.remove(key) {
            return;
        }
        let Some(part) = self.scene.find_part(key) else {
            return;
        };

        let restored = self
            .scene
            .material(key_category(key).material_kind())
            .or_else(|| state.originals.get(&part).cloned());
        if let Some(material) = restored {
            self.scene.set_part_material(part, material);
        }

        if let Some(back) = self.scene.back_face_of(part) {
            if let Some(glass_back) = self.scene.material(MaterialKind::GlassBack) {
                self.scene.set_part_material(back, glass_back);
            }
        }
    }
}
