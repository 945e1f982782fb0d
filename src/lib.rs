//! MusicXML to MNX converter
//!
//! Reads compressed (`.mxl`) or plain MusicXML into an in-memory score and
//! writes it out as MNX (JSON) or MNX-Common (XML).
//!
//! ```ignore
//! let bytes = std::fs::read("score.mxl")?;
//! let mnx = mnx_converter::convert(&bytes, None)?;
//! ```

pub mod converters;
pub mod models;
pub mod renderers;

// Re-export commonly used types
pub use converters::musicxml::errors::*;
pub use converters::{convert, get_score, ConversionSettings, OutputFormat};
pub use models::Score;
