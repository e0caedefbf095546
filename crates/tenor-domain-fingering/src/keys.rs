use serde::{Deserialize, Serialize};
use tenor_ports::scene::MaterialKind;
use tenor_ports::types::Note;

pub type KeyId = &'static str;

pub const OCTAVE_KEY: KeyId = "octave_key";
pub const REED: KeyId = "reed";

// left hand stack
pub const LH_B: KeyId = "lh_b";
pub const LH_BIS: KeyId = "lh_bis";
pub const LH_A: KeyId = "lh_a";
pub const LH_G: KeyId = "lh_g";
pub const G_SHARP: KeyId = "g_sharp";
pub const LOW_C_SHARP: KeyId = "low_c_sharp";
pub const LOW_B: KeyId = "low_b";
pub const LOW_B_FLAT: KeyId = "low_b_flat";
pub const PALM_D: KeyId = "palm_d";
pub const PALM_E_FLAT: KeyId = "palm_e_flat";
pub const PALM_F: KeyId = "palm_f";

// right hand stack
pub const RH_F: KeyId = "rh_f";
pub const RH_E: KeyId = "rh_e";
pub const RH_D: KeyId = "rh_d";
pub const LOW_E_FLAT: KeyId = "low_e_flat";
pub const LOW_C: KeyId = "low_c";
pub const SIDE_E: KeyId = "side_e";
pub const SIDE_F_SHARP: KeyId = "side_f_sharp";

/// Scene parts drawn behind a key share its name plus this suffix.
pub const BACK_FACE_SUFFIX: &str = "_back";

pub const ALL_KEYS: [KeyId; 20] = [
    OCTAVE_KEY,
    REED,
    LH_B,
    LH_BIS,
    LH_A,
    LH_G,
    G_SHARP,
    LOW_C_SHARP,
    LOW_B,
    LOW_B_FLAT,
    PALM_D,
    PALM_E_FLAT,
    PALM_F,
    RH_F,
    RH_E,
    RH_D,
    LOW_E_FLAT,
    LOW_C,
    SIDE_E,
    SIDE_F_SHARP,
];

/// Surface finish of a key part, used to pick its resting material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCategory {
    Roller,
    Pearl,
    Reed,
    Keycap,
    Glass,
}

impl KeyCategory {
    pub fn material_kind(self) -> MaterialKind {
        match self {
            KeyCategory::Roller => MaterialKind::Roller,
            KeyCategory::Pearl => MaterialKind::Pearl,
            KeyCategory::Reed => MaterialKind::Reed,
            KeyCategory::Keycap => MaterialKind::Keycap,
            KeyCategory::Glass => MaterialKind::Glass,
        }
    }
}

pub fn key_category(key: &str) -> KeyCategory {
    match key {
        LH_B | LH_A | LH_G | RH_F | RH_E | RH_D => KeyCategory::Pearl,
        LOW_E_FLAT | LOW_C | LOW_C_SHARP | LOW_B | LOW_B_FLAT => KeyCategory::Roller,
        REED => KeyCategory::Reed,
        OCTAVE_KEY | LH_BIS | G_SHARP | PALM_D | PALM_E_FLAT | PALM_F | SIDE_E | SIDE_F_SHARP => {
            KeyCategory::Keycap
        }
        _ => KeyCategory::Glass,
    }
}

/// Single-press triggers: pressing the key alone sounds the note it is named after.
/// The note's full fingering may need more keys than this one.
pub const CLICKABLE_KEYS: [(KeyId, Note); 20] = [
    (LOW_B_FLAT, 44),
    (LOW_B, 45),
    (LOW_C, 46),
    (LOW_C_SHARP, 47),
    (RH_D, 48),
    (LOW_E_FLAT, 49),
    (RH_E, 50),
    (RH_F, 51),
    (LH_G, 53),
    (G_SHARP, 54),
    (LH_A, 55),
    (LH_BIS, 56),
    (LH_B, 57),
    (REED, 59),
    (OCTAVE_KEY, 60),
    (PALM_D, 72),
    (PALM_E_FLAT, 73),
    (SIDE_E, 74),
    (PALM_F, 75),
    (SIDE_F_SHARP, 76),
];

pub fn trigger_note_for(key: &str) -> Option<Note> {
    CLICKABLE_KEYS
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, note)| *note)
}

pub fn is_interactive_key(key: &str) -> bool {
    trigger_note_for(key).is_some()
}

/// `lh_b_back` -> `lh_b`; other names pass through.
pub fn strip_back_face(name: &str) -> &str {
    name.strip_suffix(BACK_FACE_SUFFIX).unwrap_or(name)
}

pub fn back_face_name(key: &str) -> String {
    format!("{key}{BACK_FACE_SUFFIX}")
}
