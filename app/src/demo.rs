//! A short scripted phrase for trying the instrument without a controller.

use tenor_core::Command;
use tenor_ports::types::Note;

const NOTE_SECONDS: f64 = 0.35;
const GAP_SECONDS: f64 = 0.05;

// Concert pitches: a Db major scale, then back down to the tonic.
const PHRASE: [Note; 10] = [49, 51, 53, 54, 56, 58, 60, 61, 56, 49];

pub struct DemoPhrase {
    next: usize,
    sounding: Option<(Note, f64)>,
    next_start: f64,
}

impl DemoPhrase {
    pub fn new() -> Self {
        Self {
            next: 0,
            sounding: None,
            next_start: 0.0,
        }
    }

    /// Commands due at `elapsed` seconds since the phrase started.
    pub fn step(&mut self, elapsed: f64) -> Vec<Command> {
        let mut commands = Vec::new();

        if let Some((note, until)) = self.sounding {
            if elapsed >= until {
                commands.push(Command::NoteOff { note });
                self.sounding = None;
                self.next_start = until + GAP_SECONDS;
            }
        }

        if self.sounding.is_none() && elapsed >= self.next_start {
            if let Some(note) = PHRASE.get(self.next).copied() {
                commands.push(Command::NoteOn {
                    note,
                    velocity: Some(100),
                });
                self.sounding = Some((note, elapsed + NOTE_SECONDS));
                self.next += 1;
            }
        }

        commands
    }

    pub fn is_finished(&self) -> bool {
        self.next >= PHRASE.len() && self.sounding.is_none()
    }
}

impl Default for DemoPhrase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenor_domain_fingering::is_in_range;

    #[test]
    fn phrase_stays_on_the_instrument() {
        assert!(PHRASE.iter().all(|note| is_in_range(*note)));
    }

    #[test]
    fn every_note_on_is_followed_by_its_note_off() {
        let mut demo = DemoPhrase::new();
        let mut held: Option<Note> = None;
        let mut played = 0;
        let mut t = 0.0;
        while !demo.is_finished() && t < 30.0 {
            for command in demo.step(t) {
                match command {
                    Command::NoteOn { note, .. } => {
                        assert_eq!(held, None);
                        held = Some(note);
                        played += 1;
                    }
                    Command::NoteOff { note } => {
                        assert_eq!(held, Some(note));
                        held = None;
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
            t += 1.0 / 60.0;
        }
        assert!(demo.is_finished());
        assert_eq!(played, PHRASE.len());
        assert_eq!(held, None);
    }
}
