use crate::range::TENOR_RANGE;
use tenor_ports::types::Note;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Concert name with MIDI octave numbering: 60 -> "C4".
pub fn display_name(note: Note) -> String {
    name_of(note as i32)
}

/// Name as written on a tenor part.
pub fn written_name(note: Note) -> String {
    name_of(note as i32 + TENOR_RANGE.transposition as i32)
}

fn name_of(pitch: i32) -> String {
    let pitch_class = PITCH_CLASSES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{pitch_class}{octave}")
}
