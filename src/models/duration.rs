//! Rhythmic values and positions
//!
//! Durations are exact fractions of a whole note (`num_rational::Ratio`),
//! never floating point.

use num_rational::Ratio;
use std::fmt;

/// Fraction of a whole note
pub type Fraction = Ratio<i64>;

/// A written rhythmic value: base fraction of a whole note plus dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RhythmicDuration {
    pub fraction: Fraction,
    pub dots: u32,
}

impl RhythmicDuration {
    pub fn new(fraction: Fraction, dots: u32) -> Self {
        Self { fraction, dots }
    }

    /// Sounding length including dots (a dotted quarter is 3/8).
    pub fn value(&self) -> Fraction {
        let denominator = 1i64 << self.dots;
        self.fraction * Fraction::new(2 * denominator - 1, denominator)
    }
}

/// Tuplet ratio: `inner_multiple` notes of `unit` in the time of
/// `outer_multiple` notes of `unit` (a triplet of eighths is 3 × 1/8 in 2 × 1/8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupletRatio {
    pub inner_multiple: i64,
    pub outer_multiple: i64,
    pub unit: RhythmicDuration,
}

impl TupletRatio {
    pub fn new(inner_multiple: i64, outer_multiple: i64, unit: RhythmicDuration) -> Self {
        Self { inner_multiple, outer_multiple, unit }
    }

    /// Unreduced (numerator, denominator) of the inner duration
    pub fn inner(&self) -> (i64, i64) {
        (
            self.inner_multiple * self.unit.fraction.numer(),
            *self.unit.fraction.denom(),
        )
    }

    /// Unreduced (numerator, denominator) of the outer duration
    pub fn outer(&self) -> (i64, i64) {
        (
            self.outer_multiple * self.unit.fraction.numer(),
            *self.unit.fraction.denom(),
        )
    }

    /// Factor applied to the written durations of the tuplet's content
    pub fn scale(&self) -> Fraction {
        Fraction::new(self.outer_multiple, self.inner_multiple)
    }
}

/// Where an event sits within the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RhythmicPosition {
    /// Zero-based bar index
    pub bar: usize,
    /// Offset from the start of the bar, as a fraction of a whole note
    pub fraction: Fraction,
    /// Index within a grace note group, for grace events
    pub grace_index: Option<usize>,
}

impl fmt::Display for RhythmicPosition {
    /// `bar:numerator/denominator` with a one-based bar number
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.bar + 1,
            self.fraction.numer(),
            self.fraction.denom()
        )
    }
}
