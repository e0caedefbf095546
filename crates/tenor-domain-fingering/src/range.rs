use serde::Serialize;
use tenor_ports::types::Note;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InstrumentRange {
    pub min: Note,
    pub max: Note,
    /// Semitones from concert to written pitch. Display only.
    pub transposition: i8,
}

/// Concert Ab2..E5, written Bb3..F#6 (tenor sounds a major ninth lower).
pub const TENOR_RANGE: InstrumentRange = InstrumentRange {
    min: 44,
    max: 76,
    transposition: 14,
};

impl InstrumentRange {
    pub fn contains(&self, note: Note) -> bool {
        self.min <= note && note <= self.max
    }

    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    pub fn notes(&self) -> impl Iterator<Item = Note> {
        self.min..=self.max
    }
}

pub fn is_in_range(note: Note) -> bool {
    TENOR_RANGE.contains(note)
}
