//! MusicXML to MNX converter
//!
//! # Overview
//!
//! The conversion follows a four-stage pipeline:
//! 1. **Extract**: unzip compressed MusicXML (`.mxl`) or take the raw bytes
//! 2. **Parse**: decode and parse with roxmltree, viewed measure-major
//! 3. **Read**: build the [`Score`] model
//! 4. **Emit**: project the score to MNX/JSON or MNX-Common/XML
//!
//! # Basic Usage
//!
//! ```ignore
//! use mnx_converter::{convert, ConversionSettings, OutputFormat};
//!
//! let musicxml = br#"<score-partwise>
//!   <part-list><score-part id="P1"/></part-list>
//!   <part id="P1">
//!     <measure number="1">
//!       <note>
//!         <pitch><step>C</step><octave>4</octave></pitch>
//!         <duration>1</duration>
//!         <type>quarter</type>
//!       </note>
//!     </measure>
//!   </part>
//! </score-partwise>"#;
//!
//! let settings = ConversionSettings { format: OutputFormat::Xml };
//! println!("{}", convert(musicxml, Some(settings))?);
//! ```

pub mod container;
pub mod document;
pub mod errors;
pub mod reader;

use std::fmt;
use std::str::FromStr;

pub use errors::{DataError, ExportError, ImportError, NotationError, NotationResult};
pub use reader::MusicXmlReader;

use crate::models::Score;
use crate::renderers::mnx;

/// Output document flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// MNX (JSON)
    #[default]
    Json,
    /// MNX-Common (XML)
    Xml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(format!("Unknown output format '{}' (expected json or xml)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Xml => f.write_str("xml"),
        }
    }
}

/// Conversion settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSettings {
    pub format: OutputFormat,
}

/// Read a score from compressed or uncompressed MusicXML bytes.
pub fn get_score(filedata: &[u8]) -> NotationResult<Score> {
    let payload = container::extract_musicxml(filedata)?;
    let text = document::decode_text(&payload)?;
    let doc = document::parse_xml(&text)?;
    let timewise = document::to_timewise(&doc)?;
    MusicXmlReader::new().read(&timewise)
}

/// Convert MusicXML bytes to an MNX document.
///
/// # Arguments
///
/// * `filedata` - MusicXML document, raw or zip-compressed
/// * `settings` - Optional conversion settings (uses defaults if None)
pub fn convert(filedata: &[u8], settings: Option<ConversionSettings>) -> NotationResult<String> {
    let settings = settings.unwrap_or_default();

    let score = get_score(filedata)?;
    log::debug!(
        "Read {} part(s), {} bar(s); writing {}",
        score.parts.len(),
        score.bars.len(),
        settings.format
    );

    let output = match settings.format {
        OutputFormat::Json => mnx::json::write_score(&score)?,
        OutputFormat::Xml => mnx::common::write_score(&score)?,
    };
    Ok(output)
}
