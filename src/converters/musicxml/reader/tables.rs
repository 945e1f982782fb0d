//! Lookup tables for MusicXML enumerated values

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::{Accidental, CurveSide, Fraction, Marking, OttavaType};

lazy_static! {
    /// `<type>` names to fractions of a whole note, including spellings seen
    /// in the wild
    static ref RHYTHM_TYPES: HashMap<&'static str, (i64, i64)> = {
        let mut m = HashMap::new();
        m.insert("maxima", (8, 1));
        m.insert("long", (4, 1));
        m.insert("breve", (2, 1));
        m.insert("whole", (1, 1));
        m.insert("half", (1, 2));
        m.insert("quarter", (1, 4));
        m.insert("quater", (1, 4));
        m.insert("eighth", (1, 8));
        m.insert("eigth", (1, 8));
        m.insert("quaver", (1, 8));
        m.insert("8th", (1, 8));
        m.insert("semiquaver", (1, 16));
        m.insert("sixteenth", (1, 16));
        m.insert("16th", (1, 16));
        m.insert("32nd", (1, 32));
        m.insert("32th", (1, 32));
        m.insert("64th", (1, 64));
        m.insert("128th", (1, 128));
        m.insert("256th", (1, 256));
        m.insert("512th", (1, 512));
        m.insert("1024th", (1, 1024));
        m
    };

    static ref ACCIDENTALS: HashMap<&'static str, Accidental> = {
        let mut m = HashMap::new();
        m.insert("sharp", Accidental::Sharp);
        m.insert("natural", Accidental::Natural);
        m.insert("flat", Accidental::Flat);
        m.insert("double-sharp", Accidental::DoubleSharp);
        m.insert("sharp-sharp", Accidental::DoubleSharp);
        m.insert("flat-flat", Accidental::DoubleFlat);
        m.insert("double-flat", Accidental::DoubleFlat);
        m.insert("natural-sharp", Accidental::NaturalSharp);
        m.insert("natural-flat", Accidental::NaturalFlat);
        m
    };

    static ref ARTICULATIONS: HashMap<&'static str, Marking> = {
        let mut m = HashMap::new();
        m.insert("accent", Marking::Accent);
        m.insert("breath-mark", Marking::Breath);
        m.insert("soft-accent", Marking::SoftAccent);
        m.insert("spiccato", Marking::Spiccato);
        m.insert("staccato", Marking::Staccato);
        m.insert("staccatissimo", Marking::Staccatissimo);
        m.insert("stress", Marking::Stress);
        m.insert("strong-accent", Marking::StrongAccent);
        m.insert("tenuto", Marking::Tenuto);
        m.insert("unstress", Marking::Unstress);
        m
    };
}

/// Default number of tremolo strokes when `<tremolo>` has no text
pub const DEFAULT_TREMOLO_MARKS: u32 = 3;

pub fn rhythm_type(name: &str) -> Option<Fraction> {
    RHYTHM_TYPES
        .get(name.trim())
        .map(|&(numer, denom)| Fraction::new(numer, denom))
}

pub fn accidental(name: &str) -> Option<Accidental> {
    ACCIDENTALS.get(name.trim()).copied()
}

/// Shift for an `<octave-shift>` size and type. MusicXML `down` means the
/// notes sound higher than written (8va); size 16 is a common misspelling of 15.
pub fn octave_shift(size: &str, shift_type: &str) -> Option<OttavaType> {
    match (size.trim(), shift_type) {
        ("8", "down") => Some(OttavaType::OctaveUp),
        ("8", "up") => Some(OttavaType::OctaveDown),
        ("15" | "16", "down") => Some(OttavaType::TwoOctavesUp),
        ("15" | "16", "up") => Some(OttavaType::TwoOctavesDown),
        ("22", "down") => Some(OttavaType::ThreeOctavesUp),
        ("22", "up") => Some(OttavaType::ThreeOctavesDown),
        _ => None,
    }
}

pub fn articulation(name: &str) -> Option<Marking> {
    ARTICULATIONS.get(name).copied()
}

/// Curve side from `placement` (above/below) or `orientation` (over/under)
pub fn curve_side(placement: Option<&str>, orientation: Option<&str>) -> Option<CurveSide> {
    match placement {
        Some("above") => return Some(CurveSide::Up),
        Some("below") => return Some(CurveSide::Down),
        _ => {}
    }
    match orientation {
        Some("over") => Some(CurveSide::Up),
        Some("under") => Some(CurveSide::Down),
        _ => None,
    }
}
