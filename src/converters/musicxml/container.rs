//! Compressed MusicXML (.mxl) payload extraction
//!
//! A compressed file is a zip archive whose `META-INF/container.xml` names the
//! MusicXML document inside. Anything that isn't a zip is passed through as
//! raw MusicXML.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::document::{decode_text, get_child, parse_xml};
use super::errors::ImportError;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Zip local file header signature
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub fn is_zip(filedata: &[u8]) -> bool {
    filedata.starts_with(ZIP_MAGIC)
}

/// Return the MusicXML bytes held in `filedata`, unzipping if necessary.
///
/// The result is not guaranteed to be MusicXML.
pub fn extract_musicxml(filedata: &[u8]) -> Result<Vec<u8>, ImportError> {
    if !is_zip(filedata) {
        return Ok(filedata.to_vec());
    }

    let mut archive = ZipArchive::new(Cursor::new(filedata))
        .map_err(|e| ImportError::InvalidZip(e.to_string()))?;

    let container = read_entry(&mut archive, CONTAINER_PATH).ok_or(ImportError::MissingContainer)?;
    let full_path = rootfile_path(&container)?;

    if let Some(data) = read_entry(&mut archive, &full_path).filter(|d| !d.is_empty()) {
        return Ok(data);
    }

    // The container can name the rootfile with a different encoding of a
    // non-ASCII filename than the archive uses. Take any other .xml entry.
    log::debug!(
        "Rootfile '{}' not readable, scanning archive for a MusicXML entry",
        full_path
    );
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for name in names {
        if name.to_lowercase().ends_with(".xml") && name != CONTAINER_PATH {
            if let Some(data) = read_entry(&mut archive, &name).filter(|d| !d.is_empty()) {
                return Ok(data);
            }
        }
    }

    Err(ImportError::MissingMusicXml)
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).ok()?;
    Some(data)
}

/// `full-path` of the first `rootfiles/rootfile` in a container descriptor
fn rootfile_path(container: &[u8]) -> Result<String, ImportError> {
    let text = decode_text(container).map_err(|_| ImportError::InvalidContainer)?;
    let doc = parse_xml(&text).map_err(|_| ImportError::InvalidContainer)?;

    let rootfile = get_child(doc.root_element(), "rootfiles")
        .and_then(|rootfiles| get_child(rootfiles, "rootfile"))
        .ok_or(ImportError::MissingRootfile)?;

    rootfile
        .attribute("full-path")
        .map(str::to_string)
        .ok_or(ImportError::MissingFullPath)
}
