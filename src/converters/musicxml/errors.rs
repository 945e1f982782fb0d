//! Error types for MusicXML → MNX conversion
//!
//! Import errors happen before the input is known to be MusicXML, data errors
//! after. Export errors come from the emitters. All of them are fatal.

use std::fmt;

use roxmltree::Node;
use thiserror::Error;

use crate::models::ModelError;

pub type NotationResult<T> = Result<T, NotationError>;

/// Top-level conversion error type
#[derive(Debug, Clone, Error)]
pub enum NotationError {
    /// Input could not be confirmed as MusicXML
    #[error("{0}")]
    Import(#[from] ImportError),

    /// MusicXML violates a required constraint
    #[error("{0}")]
    Data(#[from] DataError),

    /// Structural assumption violated while building the score (indicates a bug
    /// or badly broken nesting in the input)
    #[error("Internal conversion error: {0}")]
    Internal(String),

    /// Score cannot be represented in the output format
    #[error("{0}")]
    Export(#[from] ExportError),
}

impl From<ModelError> for NotationError {
    fn from(err: ModelError) -> Self {
        NotationError::Internal(err.to_string())
    }
}

/// Errors raised while locating and parsing the MusicXML payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid zip archive: {0}")]
    InvalidZip(String),

    #[error("Zip file is missing META-INF/container.xml.")]
    MissingContainer,

    #[error("XML syntax error when parsing META-INF/container.xml.")]
    InvalidContainer,

    #[error("Missing 'rootfile' element in META-INF/container.xml.")]
    MissingRootfile,

    #[error("Missing 'full-path' attribute on 'rootfile' element.")]
    MissingFullPath,

    #[error("Missing or empty MusicXML file within zip archive.")]
    MissingMusicXml,

    #[error("Could not decode document text: {0}")]
    Encoding(String),

    #[error("XML syntax error: {0}")]
    InvalidXml(String),

    #[error("Didn't find 'score-partwise' or 'score-timewise' (root element is '{0}').")]
    UnsupportedRoot(String),

    #[error("Couldn't convert partwise to timewise: no <part> elements.")]
    NoParts,
}

/// Constraint violation in otherwise well-formed MusicXML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataError {
    pub message: String,
    /// 1-based source line of the offending element
    pub line: Option<u32>,
}

impl DataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    /// Error located at the start of `node`
    pub fn at(node: Node, message: impl Into<String>) -> Self {
        Self::at_line(source_line(node), message)
    }

    /// Error at a line recorded earlier, once the node is out of reach
    pub fn at_line(line: u32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

/// 1-based source row where `node` starts
pub fn source_line(node: Node) -> u32 {
    node.document().text_pos_at(node.range().start).row
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DataError {}

/// Errors raised by the MNX emitters
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Invalid duration fraction {0}")]
    UnmappedDuration(String),

    #[error("XML write error: {0}")]
    Xml(String),

    #[error("JSON write error: {0}")]
    Json(String),
}

impl From<quick_xml::Error> for ExportError {
    fn from(err: quick_xml::Error) -> Self {
        ExportError::Xml(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Json(err.to_string())
    }
}
