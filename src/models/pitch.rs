//! Pitch, key signature and clef representation
//!
//! Pitches are stored the way MusicXML spells them (step + alter + octave),
//! with helpers to move between spelled pitches, MIDI numbers and key
//! signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diatonic step (pitch letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    const ALL: [Step; 7] = [Step::C, Step::D, Step::E, Step::F, Step::G, Step::A, Step::B];

    /// Parse a MusicXML `<step>` value
    pub fn from_letter(letter: &str) -> Option<Step> {
        match letter.trim() {
            "C" => Some(Step::C),
            "D" => Some(Step::D),
            "E" => Some(Step::E),
            "F" => Some(Step::F),
            "G" => Some(Step::G),
            "A" => Some(Step::A),
            "B" => Some(Step::B),
            _ => None,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }

    /// Semitones above C
    pub fn semitones(&self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    fn natural_at(pitch_class: i32) -> Option<Step> {
        Self::ALL.into_iter().find(|s| s.semitones() == pitch_class)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// A spelled pitch
///
/// `alter` is in whole semitones (-2 = double flat, 2 = double sharp).
/// Octave 4 contains middle C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    pub octave: i32,
    pub alter: i32,
}

impl Pitch {
    pub fn new(step: Step, octave: i32, alter: i32) -> Self {
        Self { step, octave, alter }
    }

    /// MIDI note number (C4 = 60)
    pub fn midi_number(&self) -> i32 {
        (self.octave + 1) * 12 + self.step.semitones() + self.alter
    }

    /// Spell a MIDI note number.
    ///
    /// Naturals are preferred; black keys are spelled with flats in flat
    /// keys and with sharps otherwise.
    pub fn from_midi_number(number: i32, key: KeySignature) -> Self {
        let pitch_class = number.rem_euclid(12);
        let octave = number.div_euclid(12) - 1;

        if let Some(step) = Step::natural_at(pitch_class) {
            return Pitch::new(step, octave, 0);
        }

        // Black keys sit between two naturals, so neither lookup can miss.
        if key.fifths < 0 {
            let step = Step::natural_at(pitch_class + 1).unwrap_or(Step::C);
            Pitch::new(step, octave, -1)
        } else {
            let step = Step::natural_at(pitch_class - 1).unwrap_or(Step::C);
            Pitch::new(step, octave, 1)
        }
    }

    /// Transpose by a number of semitones, respelling for the given key
    pub fn transpose(&self, semitones: i32, key: KeySignature) -> Self {
        Pitch::from_midi_number(self.midi_number() + semitones, key)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step)?;
        let accidental = if self.alter > 0 { "#" } else { "b" };
        for _ in 0..self.alter.unsigned_abs() {
            f.write_str(accidental)?;
        }
        write!(f, "{}", self.octave)
    }
}

/// Key signature as a position on the circle of fifths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeySignature {
    pub fifths: i32,
}

impl KeySignature {
    pub fn new(fifths: i32) -> Self {
        Self { fifths }
    }

    /// Pitch class (0 = C) of the major tonic
    pub fn tonic_pitch_class(&self) -> i32 {
        (self.fifths * 7).rem_euclid(12)
    }

    /// Key whose major tonic has the given pitch class.
    ///
    /// Six-accidental keys resolve to the flat side (G flat, not F sharp).
    pub fn from_pitch_class(pitch_class: i32) -> Self {
        // 7 is its own inverse modulo 12.
        let fifths = (pitch_class * 7).rem_euclid(12);
        let fifths = if fifths > 5 { fifths - 12 } else { fifths };
        Self { fifths }
    }

    /// Move the key by a number of semitones (e.g. written to concert pitch)
    pub fn transpose(&self, semitones: i32) -> Self {
        if semitones.rem_euclid(12) == 0 {
            return *self;
        }
        Self::from_pitch_class(self.tonic_pitch_class() + semitones)
    }
}

/// A clef: sign plus staff position of the clef's reference line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    /// MusicXML sign (G, F, C, percussion, TAB, ...)
    pub sign: String,
    /// Staff position in steps from the middle line (0 = middle line,
    /// negative = below)
    pub staff_position: i32,
    /// Octave displacement (`clef-octave-change`)
    pub octave: Option<i32>,
}

impl Clef {
    /// Build from a MusicXML sign and written line number (1 = bottom line).
    pub fn from_line(sign: &str, line: Option<i32>, octave: Option<i32>) -> Self {
        let line = line.unwrap_or_else(|| Self::default_line(sign));
        Self {
            sign: sign.to_string(),
            staff_position: (line - 3) * 2,
            octave,
        }
    }

    /// Written line number recovered from the staff position
    pub fn line(&self) -> i32 {
        self.staff_position / 2 + 3
    }

    fn default_line(sign: &str) -> i32 {
        match sign {
            "G" => 2,
            "F" => 4,
            _ => 3,
        }
    }
}
