//! Value projections shared by the MNX emitters

use crate::converters::musicxml::errors::ExportError;
use crate::models::{Fraction, Marking, OttavaType, Pitch, RhythmicDuration, TimeSignature};

/// Note value names by fraction of a whole note, longest first
const NOTE_VALUE_BASES: [(i64, i64, &str); 17] = [
    (16, 1, "duplexMaxima"),
    (8, 1, "maxima"),
    (4, 1, "longa"),
    (2, 1, "breve"),
    (1, 1, "whole"),
    (1, 2, "half"),
    (1, 4, "quarter"),
    (1, 8, "eighth"),
    (1, 16, "16th"),
    (1, 32, "32nd"),
    (1, 64, "64th"),
    (1, 128, "128th"),
    (1, 256, "256th"),
    (1, 512, "512th"),
    (1, 1024, "1024th"),
    (1, 2048, "2048th"),
    (1, 4096, "4096th"),
];

fn unmapped(fraction: Fraction) -> ExportError {
    ExportError::UnmappedDuration(format!("{}/{}", fraction.numer(), fraction.denom()))
}

/// MNX note value name of a base fraction ("quarter", "16th", ...)
pub fn note_value_base(fraction: Fraction) -> Result<&'static str, ExportError> {
    NOTE_VALUE_BASES
        .iter()
        .find(|(numer, denom, _)| Fraction::new(*numer, *denom) == fraction)
        .map(|(_, _, name)| *name)
        .ok_or_else(|| unmapped(fraction))
}

/// Duration microsyntax: `*N` for multiples of a whole, `/D` for fractions,
/// then one `d` per dot (`/4d` is a dotted quarter).
pub fn duration(duration: &RhythmicDuration) -> Result<String, ExportError> {
    let fraction = duration.fraction;
    let mut result = if fraction > Fraction::from_integer(1) {
        if !fraction.is_integer() {
            return Err(unmapped(fraction));
        }
        format!("*{}", fraction.numer())
    } else {
        if *fraction.numer() != 1 {
            return Err(unmapped(fraction));
        }
        format!("/{}", fraction.denom())
    };
    for _ in 0..duration.dots {
        result.push('d');
    }
    Ok(result)
}

/// Pitch microsyntax: step, `#`/`b` per semitone of alter, octave (`Bbb3`)
pub fn pitch(pitch: &Pitch) -> String {
    pitch.to_string()
}

pub fn time_signature(time: &TimeSignature) -> String {
    format!("{}/{}", time.count, time.unit)
}

/// Unreduced tuplet term as `numerator/denominator`
pub fn ratio_term((numerator, denominator): (i64, i64)) -> String {
    format!("{}/{}", numerator, denominator)
}

pub fn ending_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// MNX-Common `<octave-shift type>`; 8va (sounding higher) is `-8`.
pub fn octave_shift_type(shift: OttavaType) -> &'static str {
    match shift {
        OttavaType::OctaveUp => "-8",
        OttavaType::OctaveDown => "8",
        OttavaType::TwoOctavesUp => "-15",
        OttavaType::TwoOctavesDown => "15",
        OttavaType::ThreeOctavesUp => "-22",
        OttavaType::ThreeOctavesDown => "22",
    }
}

/// Element name of a marking in MNX-Common
pub fn marking_element(marking: &Marking) -> &'static str {
    match marking {
        Marking::Accent => "accent",
        Marking::Breath => "breath",
        Marking::SoftAccent => "soft-accent",
        Marking::Spiccato => "spiccato",
        Marking::Staccato => "staccato",
        Marking::Staccatissimo => "staccatissimo",
        Marking::Stress => "stress",
        Marking::StrongAccent => "strong-accent",
        Marking::Tenuto => "tenuto",
        Marking::Tremolo { .. } => "tremolo",
        Marking::Unstress => "unstress",
    }
}

/// Object key of a marking in MNX/JSON
pub fn marking_key(marking: &Marking) -> &'static str {
    match marking {
        Marking::SoftAccent => "softAccent",
        Marking::StrongAccent => "strongAccent",
        other => marking_element(other),
    }
}
