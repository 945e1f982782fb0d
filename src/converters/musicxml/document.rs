//! XML parsing layer for MusicXML documents
//!
//! Decodes the payload text, parses it with roxmltree and presents the score
//! measure-major: a `score-partwise` tree is viewed as `score-timewise` without
//! copying any nodes.

use roxmltree::{Document, Node, ParsingOptions};

use super::errors::ImportError;

// ============================================================================
// TEXT AND XML
// ============================================================================

/// Decode document bytes: UTF-8 (with or without BOM) or BOM-marked UTF-16.
pub fn decode_text(data: &[u8]) -> Result<String, ImportError> {
    if let Some(rest) = data.strip_prefix(b"\xEF\xBB\xBF") {
        return utf8(rest);
    }
    if let Some(rest) = data.strip_prefix(b"\xFF\xFE") {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = data.strip_prefix(b"\xFE\xFF") {
        return utf16(rest, u16::from_be_bytes);
    }
    utf8(data)
}

fn utf8(data: &[u8]) -> Result<String, ImportError> {
    String::from_utf8(data.to_vec()).map_err(|e| ImportError::Encoding(e.to_string()))
}

fn utf16(data: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, ImportError> {
    if data.len() % 2 != 0 {
        return Err(ImportError::Encoding("odd number of bytes in UTF-16 text".to_string()));
    }
    let units: Vec<u16> = data.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).map_err(|e| ImportError::Encoding(e.to_string()))
}

/// Parse XML text. DTDs are allowed (MusicXML always carries one) but never
/// fetched.
pub fn parse_xml(text: &str) -> Result<Document<'_>, ImportError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Document::parse_with_options(text, options).map_err(|e| ImportError::InvalidXml(e.to_string()))
}

// ============================================================================
// TIMEWISE VIEW
// ============================================================================

/// Measure-major view of a MusicXML score
pub struct TimewiseScore<'a, 'input> {
    pub part_list: Option<Node<'a, 'input>>,
    pub measures: Vec<TimewiseMeasure<'a, 'input>>,
}

/// One `<measure>` across all parts
pub struct TimewiseMeasure<'a, 'input> {
    pub parts: Vec<MeasurePart<'a, 'input>>,
}

/// One part's content within one measure
#[derive(Clone, Copy)]
pub struct MeasurePart<'a, 'input> {
    /// `id` of the `<part>` this content belongs to
    pub part_id: Option<&'a str>,
    /// Element whose children are the measure content: the partwise
    /// `<measure>` or the timewise `<part>`
    pub node: Node<'a, 'input>,
}

impl<'a, 'input> MeasurePart<'a, 'input> {
    /// Content elements in document order
    pub fn children(&self) -> impl Iterator<Item = Node<'a, 'input>> {
        element_children(self.node)
    }
}

/// Present the document measure-major.
///
/// For `score-partwise` the measure count comes from the first `<part>`;
/// measures beyond it in later parts are skipped.
pub fn to_timewise<'a, 'input>(
    doc: &'a Document<'input>,
) -> Result<TimewiseScore<'a, 'input>, ImportError> {
    let root = doc.root_element();
    let part_list = get_child(root, "part-list");

    match root.tag_name().name() {
        "score-timewise" => {
            let measures = get_children(root, "measure")
                .map(|measure| TimewiseMeasure {
                    parts: get_children(measure, "part")
                        .map(|part| MeasurePart {
                            part_id: part.attribute("id"),
                            node: part,
                        })
                        .collect(),
                })
                .collect();
            Ok(TimewiseScore {
                part_list,
                measures,
            })
        }
        "score-partwise" => {
            let parts: Vec<Node> = get_children(root, "part").collect();
            let first = parts.first().ok_or(ImportError::NoParts)?;

            let mut measures: Vec<TimewiseMeasure> = get_children(*first, "measure")
                .map(|_| TimewiseMeasure {
                    parts: Vec::with_capacity(parts.len()),
                })
                .collect();

            for part in &parts {
                for (index, measure) in get_children(*part, "measure").enumerate() {
                    match measures.get_mut(index) {
                        Some(timewise) => timewise.parts.push(MeasurePart {
                            part_id: part.attribute("id"),
                            node: measure,
                        }),
                        None => {
                            log::debug!(
                                "Skipping measure {} of part {:?}: not in the first part",
                                index + 1,
                                part.attribute("id")
                            );
                        }
                    }
                }
            }

            Ok(TimewiseScore {
                part_list,
                measures,
            })
        }
        other => Err(ImportError::UnsupportedRoot(other.to_string())),
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Element children of a node
pub fn element_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Get first child element with given tag name
pub fn get_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// All child elements with given tag name
pub fn get_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Trimmed text content of a node, `None` when empty
pub fn get_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|s| !s.is_empty())
}

/// Get text content of first child with given tag
pub fn get_child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    get_child(node, tag).and_then(get_text)
}
