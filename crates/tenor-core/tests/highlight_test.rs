use pretty_assertions::assert_eq;
use std::sync::Arc;
use tenor_core::{HighlightBinder, MidiController};
use tenor_domain_fingering::{fingering_for, ALL_KEYS, LH_A, LH_B, OCTAVE_KEY, REED};
use tenor_infra_scene_static::{
    CameraDescription, PartDescription, SceneDescription, StaticScene,
};
use tenor_ports::scene::{same_material, MaterialKind, ScenePort};
use tenor_ports::storage::HighlightPolicy;

// 60 sounds written D5 and 71 written C#6; both use the octave key.
const D5: u8 = 60;
const C_SHARP_6: u8 = 71;

fn scene() -> Arc<StaticScene> {
    Arc::new(StaticScene::builtin().unwrap())
}

fn binder(scene: &Arc<StaticScene>, policy: HighlightPolicy) -> Arc<HighlightBinder> {
    Arc::new(HighlightBinder::new(scene.clone(), policy))
}

fn material_kind(scene: &StaticScene, name: &str) -> MaterialKind {
    let part = scene.find_part(name).unwrap();
    scene.part_material(part).unwrap().kind
}

#[test]
fn highlight_round_trip_restores_identical_material() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);

    for key in ALL_KEYS {
        let part = scene.find_part(key).unwrap();
        let before = scene.part_material(part).unwrap();

        binder.highlight(key);
        assert_eq!(material_kind(&scene, key), MaterialKind::Highlight);

        binder.unhighlight(key);
        let after = scene.part_material(part).unwrap();
        assert!(same_material(&before, &after), "{key} not restored");
    }
}

#[test]
fn back_face_follows_highlight() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);
    let back = format!("{REED}_back");

    binder.highlight(REED);
    assert_eq!(material_kind(&scene, &back), MaterialKind::Highlight);

    binder.unhighlight(REED);
    assert_eq!(material_kind(&scene, &back), MaterialKind::GlassBack);
    assert_eq!(material_kind(&scene, REED), MaterialKind::Reed);
}

#[test]
fn repeated_highlight_is_a_no_op() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);
    let part = scene.find_part(LH_A).unwrap();
    let before = scene.part_material(part).unwrap();

    binder.highlight(LH_A);
    binder.highlight(LH_A);
    binder.unhighlight(LH_A);

    assert!(!binder.is_highlighted(LH_A));
    assert!(same_material(&before, &scene.part_material(part).unwrap()));

    binder.unhighlight(LH_A);
    assert!(same_material(&before, &scene.part_material(part).unwrap()));
}

#[test]
fn shared_key_stays_lit_while_needed() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);

    binder.on_note_on(D5);
    binder.on_note_on(C_SHARP_6);
    binder.on_note_off(C_SHARP_6);

    assert!(binder.is_highlighted(OCTAVE_KEY));
    assert_eq!(material_kind(&scene, OCTAVE_KEY), MaterialKind::Highlight);

    binder.on_note_off(D5);
    assert!(binder.highlighted_keys().is_empty());
    assert_eq!(material_kind(&scene, OCTAVE_KEY), MaterialKind::Keycap);
}

#[test]
fn per_key_policy_clears_shared_key_early() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::PerKey);

    binder.on_note_on(D5);
    binder.on_note_on(C_SHARP_6);
    binder.on_note_off(C_SHARP_6);

    assert!(!binder.is_highlighted(OCTAVE_KEY));
    assert!(binder.is_highlighted(LH_B));
}

#[test]
fn retriggered_note_releases_with_one_note_off() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);

    binder.on_note_on(D5);
    binder.on_note_on(D5);
    binder.on_note_off(D5);

    assert!(binder.highlighted_keys().is_empty());
}

#[test]
fn note_on_lights_exactly_its_fingering() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);

    binder.on_note_on(D5);

    let mut expected: Vec<String> = fingering_for(D5).iter().map(|k| k.to_string()).collect();
    expected.sort();
    assert_eq!(binder.highlighted_keys(), expected);
}

#[test]
fn missing_parts_are_skipped() {
    let description = SceneDescription {
        parts: vec![PartDescription {
            name: REED.to_string(),
            material: MaterialKind::Reed,
            min: [-1.0, -1.0, 0.0],
            max: [1.0, 1.0, 0.5],
            back_face: false,
        }],
        camera: CameraDescription::default(),
    };
    let scene = Arc::new(StaticScene::from_description(&description).unwrap());
    let binder = binder(&scene, HighlightPolicy::RefCounted);

    binder.on_note_on(D5);
    assert!(binder.highlighted_keys().is_empty());

    binder.on_note_on(59);
    assert_eq!(binder.highlighted_keys(), vec![REED.to_string()]);
    binder.on_note_off(59);
    assert_eq!(material_kind(&scene, REED), MaterialKind::Reed);
}

#[test]
fn attached_binder_follows_controller() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);
    let mut controller = MidiController::new();
    controller.note_on_default(C_SHARP_6);

    binder.attach(&mut controller);
    assert!(binder.is_highlighted(OCTAVE_KEY));

    controller.note_on_default(D5);
    controller.all_notes_off();
    assert!(binder.highlighted_keys().is_empty());
}

#[test]
fn clear_restores_everything() {
    let scene = scene();
    let binder = binder(&scene, HighlightPolicy::RefCounted);
    binder.on_note_on(D5);
    binder.on_note_on(59);

    binder.clear();

    assert!(binder.highlighted_keys().is_empty());
    for key in ALL_KEYS {
        assert_ne!(material_kind(&scene, key), MaterialKind::Highlight);
    }
}
