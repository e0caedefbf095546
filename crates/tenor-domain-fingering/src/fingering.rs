use crate::keys::*;
use crate::range::TENOR_RANGE;
use tenor_ports::types::Note;

const LOW_STACK: &[KeyId] = &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D];

// Indexed by `note - TENOR_RANGE.min`; comments give the written pitch.
static FINGERINGS: [&[KeyId]; 33] = [
    &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_B_FLAT], // Bb3
    &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_B],      // B3
    &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_C],      // C4
    &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_C_SHARP], // C#4
    LOW_STACK,                                          // D4
    &[LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_E_FLAT], // Eb4
    &[LH_B, LH_A, LH_G, RH_F, RH_E],                   // E4
    &[LH_B, LH_A, LH_G, RH_F],                         // F4
    &[LH_B, LH_A, LH_G, RH_E],                         // F#4
    &[LH_B, LH_A, LH_G],                               // G4
    &[LH_B, LH_A, LH_G, G_SHARP],                      // G#4
    &[LH_B, LH_A],                                     // A4
    &[LH_B, LH_BIS],                                   // Bb4
    &[LH_B],                                           // B4
    &[LH_A],                                           // C5
    &[REED],                                           // C#5, open
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, RH_F, RH_E, RH_D], // D5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, RH_F, RH_E, RH_D, LOW_E_FLAT], // Eb5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, RH_F, RH_E],       // E5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, RH_F],             // F5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, RH_E],             // F#5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G],                   // G5
    &[OCTAVE_KEY, LH_B, LH_A, LH_G, G_SHARP],          // G#5
    &[OCTAVE_KEY, LH_B, LH_A],                         // A5
    &[OCTAVE_KEY, LH_B, LH_BIS],                       // Bb5
    &[OCTAVE_KEY, LH_B],                               // B5
    &[OCTAVE_KEY, LH_A],                               // C6
    &[OCTAVE_KEY],                                     // C#6
    &[OCTAVE_KEY, PALM_D],                             // D6
    &[OCTAVE_KEY, PALM_D, PALM_E_FLAT],                // Eb6
    &[OCTAVE_KEY, PALM_D, PALM_E_FLAT, SIDE_E],        // E6
    &[OCTAVE_KEY, PALM_D, PALM_E_FLAT, SIDE_E, PALM_F], // F6
    &[OCTAVE_KEY, PALM_D, PALM_E_FLAT, SIDE_E, PALM_F, SIDE_F_SHARP], // F#6
];

/// Keys engaged for `note`; empty for anything outside the instrument.
pub fn fingering_for(note: Note) -> &'static [KeyId] {
    if !TENOR_RANGE.contains(note) {
        return &[];
    }
    FINGERINGS
        .get((note - TENOR_RANGE.min) as usize)
        .copied()
        .unwrap_or(&[])
}

pub fn fingering_uses_key(note: Note, key: &str) -> bool {
    fingering_for(note).iter().any(|k| *k == key)
}
