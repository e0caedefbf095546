use pretty_assertions::assert_eq;
use std::io::Write;
use tenor_domain_fingering::{key_category, ALL_KEYS, LH_A, OCTAVE_KEY, REED};
use tenor_infra_scene_static::{
    CameraDescription, PartDescription, SceneDescription, SceneLoad, StaticScene,
};
use tenor_ports::scene::{same_material, MaterialKind, PointerNdc, SceneError, ScenePort};

fn builtin() -> StaticScene {
    StaticScene::builtin().unwrap()
}

#[test]
fn every_key_has_a_back_face_with_glass_back_material() {
    let scene = builtin();
    let glass_back = scene.material(MaterialKind::GlassBack).unwrap();
    for key in ALL_KEYS {
        let front = scene.find_part(key).unwrap();
        let back = scene.back_face_of(front).unwrap();
        assert!(same_material(&scene.part_material(back).unwrap(), &glass_back));
        assert_eq!(scene.find_part(&format!("{key}_back")), Some(back));
    }
}

#[test]
fn key_material_matches_its_category() {
    let scene = builtin();
    for key in ALL_KEYS {
        let part = scene.find_part(key).unwrap();
        let material = scene.part_material(part).unwrap();
        assert_eq!(material.kind, key_category(key).material_kind());
        let shared = scene.material(material.kind).unwrap();
        assert!(same_material(&material, &shared));
    }
}

#[test]
fn pick_at_projected_centre_hits_that_key() {
    let scene = builtin();
    for key in [OCTAVE_KEY, REED, LH_A] {
        let at = scene.project(key).unwrap();
        assert_eq!(scene.pick(at).as_deref(), Some(key));
    }
}

#[test]
fn pick_outside_everything_misses() {
    let scene = builtin();
    assert_eq!(scene.pick(PointerNdc { x: 0.99, y: 0.99 }), None);
}

#[test]
fn pick_between_keys_hits_body() {
    let scene = builtin();
    // gap between the first two columns, first row
    let left = scene.project(ALL_KEYS[0]).unwrap();
    let right = scene.project(ALL_KEYS[1]).unwrap();
    let gap = PointerNdc {
        x: (left.x + right.x) * 0.5,
        y: left.y,
    };
    assert_eq!(scene.pick(gap).as_deref(), Some("body"));
}

#[test]
fn rotation_moves_keys_under_the_pointer() {
    let scene = builtin();
    let at = scene.project(ALL_KEYS[0]).unwrap();
    scene.set_model_rotation(std::f32::consts::FRAC_PI_2);
    assert_ne!(scene.pick(at).as_deref(), Some(ALL_KEYS[0]));

    let rotated = scene.project(ALL_KEYS[0]).unwrap();
    assert_eq!(scene.pick(rotated).as_deref(), Some(ALL_KEYS[0]));
}

#[test]
fn render_counts_frames_and_keeps_uniforms() {
    let scene = builtin();
    scene.set_time_uniform(1.5);
    scene.render();
    scene.render();
    assert_eq!(scene.frames_rendered(), 2);
    assert_eq!(scene.time_uniform(), 1.5);
}

#[test]
fn duplicate_part_names_are_rejected() {
    let part = PartDescription {
        name: "reed".to_string(),
        material: MaterialKind::Reed,
        min: [0.0, 0.0, 0.0],
        max: [1.0, 1.0, 1.0],
        back_face: false,
    };
    let description = SceneDescription {
        parts: vec![part.clone(), part],
        camera: CameraDescription::default(),
    };
    assert!(matches!(
        StaticScene::from_description(&description),
        Err(SceneError::Parse(_))
    ));
}

#[test]
fn generated_back_face_cannot_shadow_an_explicit_part() {
    let part = |name: &str, material, back_face| PartDescription {
        name: name.to_string(),
        material,
        min: [0.0, 0.0, 0.0],
        max: [1.0, 1.0, 1.0],
        back_face,
    };
    let description = SceneDescription {
        parts: vec![
            part("lh_b_back", MaterialKind::GlassBack, false),
            part("lh_b", MaterialKind::Pearl, true),
        ],
        camera: CameraDescription::default(),
    };
    assert!(matches!(
        StaticScene::from_description(&description),
        Err(SceneError::Parse(_))
    ));
}

#[test]
fn description_parses_from_json_with_default_camera() {
    let json = br#"{ "parts": [
        { "name": "reed", "material": "reed",
          "min": [-1, -1, 0], "max": [1, 1, 0.5], "back_face": true }
    ] }"#;
    let description = SceneDescription::from_json(json).unwrap();
    assert_eq!(description.camera, CameraDescription::default());

    let scene = StaticScene::from_description(&description).unwrap();
    assert_eq!(scene.part_names(), vec!["reed".to_string(), "reed_back".to_string()]);
    assert_eq!(scene.pick(PointerNdc { x: 0.0, y: 0.0 }).as_deref(), Some("reed"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        SceneDescription::from_json(b"{ parts: "),
        Err(SceneError::Parse(_))
    ));
}

#[test]
fn loader_reads_file_off_thread() {
    let dir = std::env::temp_dir().join(format!("tenor-scene-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scene.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(serde_json::to_string(&SceneDescription::builtin()).unwrap().as_bytes())
        .unwrap();
    drop(file);

    let scene = SceneLoad::spawn(Some(path)).wait().unwrap();
    assert!(scene.find_part(OCTAVE_KEY).is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn loader_reports_missing_file() {
    let load = SceneLoad::spawn(Some("/nonexistent/tenor/scene.json".into()));
    assert!(matches!(load.wait(), Err(SceneError::Io(_))));
}

#[test]
fn try_finish_yields_once() {
    let mut load = SceneLoad::spawn(None);
    let mut outcome = None;
    for _ in 0..500 {
        if let Some(result) = load.try_finish() {
            outcome = Some(result);
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    assert!(outcome.unwrap().is_ok());
    assert!(!load.is_pending());
    assert!(load.try_finish().is_none());
}
