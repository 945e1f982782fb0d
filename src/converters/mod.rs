//! Format converters
//!
//! This module contains the MusicXML input side of the converter.

pub mod musicxml;

// Re-export for convenience
pub use musicxml::{
    convert,
    get_score,
    ConversionSettings,
    OutputFormat,
};
