use pretty_assertions::assert_eq;
use tenor_domain_fingering::{
    display_name, fingering_for, is_in_range, is_interactive_key, key_category, strip_back_face,
    trigger_note_for, KeyCategory, ALL_KEYS, CLICKABLE_KEYS, OCTAVE_KEY, REED, TENOR_RANGE,
};

#[test]
fn every_in_range_note_has_a_fingering() {
    for note in TENOR_RANGE.notes() {
        let keys = fingering_for(note);
        assert!(!keys.is_empty(), "note {note} has no fingering");
        assert_eq!(keys, fingering_for(note));
    }
    assert_eq!(TENOR_RANGE.len(), 33);
}

#[test]
fn out_of_range_notes_resolve_to_nothing() {
    for note in [0u8, 43, 77, 100, 127] {
        assert!(!is_in_range(note));
        assert!(fingering_for(note).is_empty());
    }
    assert!(is_in_range(44));
    assert!(is_in_range(76));
}

#[test]
fn fingerings_only_reference_known_keys() {
    for note in TENOR_RANGE.notes() {
        for key in fingering_for(note) {
            assert!(ALL_KEYS.contains(key), "unknown key {key} in note {note}");
        }
    }
}

#[test]
fn fingerings_have_no_duplicate_keys() {
    for note in TENOR_RANGE.notes() {
        let keys = fingering_for(note);
        for (i, key) in keys.iter().enumerate() {
            assert!(!keys[i + 1..].contains(key), "note {note} lists {key} twice");
        }
    }
}

#[test]
fn upper_register_shares_the_octave_key() {
    let with_octave = TENOR_RANGE
        .notes()
        .filter(|note| fingering_for(*note).contains(&OCTAVE_KEY))
        .count();
    assert_eq!(with_octave, 17);
    assert_eq!(fingering_for(59), &[REED]);
}

#[test]
fn display_names_follow_midi_octaves() {
    assert_eq!(display_name(60), "C4");
    assert_eq!(display_name(69), "A4");
    assert_eq!(display_name(44), "G#2");
    assert_eq!(display_name(76), "E5");
}

#[test]
fn clickable_keys_trigger_in_range_notes() {
    for (key, _) in CLICKABLE_KEYS {
        let note = trigger_note_for(key).expect("clickable key must trigger");
        assert!(is_in_range(note), "{key} triggers {note}");
        assert!(is_interactive_key(key));
        assert!(ALL_KEYS.contains(&key));
    }
}

#[test]
fn unknown_keys_are_not_interactive() {
    assert_eq!(trigger_note_for("bell"), None);
    assert!(!is_interactive_key(""));
    assert_eq!(key_category("bell"), KeyCategory::Glass);
}

#[test]
fn back_face_suffix_is_stripped() {
    assert_eq!(strip_back_face("lh_b_back"), "lh_b");
    assert_eq!(strip_back_face("lh_b"), "lh_b");
    assert_eq!(key_category(strip_back_face("low_c_back")), KeyCategory::Roller);
}
