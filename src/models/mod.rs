//! Score model for the converter
//!
//! The reader builds a [`Score`] from MusicXML; the MNX emitters only read it.

pub mod duration;
pub mod notation;
pub mod pitch;
pub mod score;

// Re-export commonly used types
pub use duration::*;
pub use notation::*;
pub use pitch::*;
pub use score::*;
