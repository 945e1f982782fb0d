//! `<attributes>` and `<barline>` parsing

use roxmltree::Node;

use super::{MeasureContext, MusicXmlReader};
use crate::converters::musicxml::document::{element_children, get_child, get_child_text, get_text};
use crate::converters::musicxml::errors::{DataError, NotationResult};
use crate::models::{
    Clef, Ending, EndingType, Fraction, KeySignature, PositionedClef, TimeDisplay, TimeSignature,
};

/// Repeat count when `times` is absent or unparsable
const DEFAULT_REPEAT_TIMES: u32 = 2;

impl MusicXmlReader {
    pub(super) fn read_attributes(&mut self, attributes: Node, context: &MeasureContext) -> NotationResult<()> {
        // The key is given in written pitch, so the transposition has to be
        // known before any <key> of the same block.
        if context.bar == 0 {
            if let Some(transpose) = get_child(attributes, "transpose") {
                let semitones = parse_transpose(transpose)?;
                if let Some(part) = self.score.part_mut(&context.part_id) {
                    part.transpose = semitones;
                }
            }
        }

        for node in element_children(attributes) {
            match node.tag_name().name() {
                "clef" => {
                    let clef = parse_clef(node)?;
                    let divisions = self.divisions(&context.part_id);
                    let positioned = PositionedClef {
                        clef,
                        position: Fraction::new(context.position, divisions * 4),
                    };
                    if let Some(bar_part) = self.score.bars[context.bar].bar_parts.get_mut(&context.part_id) {
                        bar_part.clefs.push(positioned);
                    }
                }
                "divisions" => {
                    let divisions = parse_divisions(node)?;
                    self.state.part_divisions.insert(context.part_id.clone(), divisions);
                }
                "key" => {
                    if let Some(written) = parse_key(node)? {
                        let transpose = self
                            .score
                            .part(&context.part_id)
                            .map(|p| p.transpose)
                            .unwrap_or(0);
                        self.score.bars[context.bar].key = Some(written.transpose(transpose));
                    }
                }
                "time" => {
                    self.score.bars[context.bar].time = Some(parse_time(node)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(super) fn read_barline(&mut self, barline: Node, bar_index: usize) -> NotationResult<()> {
        let bar = &mut self.score.bars[bar_index];
        for node in element_children(barline) {
            match node.tag_name().name() {
                "repeat" => match node.attribute("direction") {
                    Some("forward") => bar.repeat_start = true,
                    Some("backward") => {
                        bar.repeat_end = node
                            .attribute("times")
                            .and_then(|t| t.trim().parse::<u32>().ok())
                            .unwrap_or(DEFAULT_REPEAT_TIMES);
                    }
                    Some(_) => {}
                    None => {
                        return Err(DataError::at(node, "<repeat> missing 'direction' attribute.").into())
                    }
                },
                "ending" => match node.attribute("type") {
                    Some("start") => {
                        let numbers = parse_ending_numbers(node.attribute("number").unwrap_or(""));
                        if numbers.is_empty() {
                            log::debug!("Ignoring <ending type=\"start\"> without a usable number");
                        } else {
                            bar.start_ending = Some(Ending {
                                ending_type: EndingType::Start,
                                numbers,
                            });
                        }
                    }
                    Some("stop") => {
                        bar.stop_ending = Some(Ending {
                            ending_type: EndingType::Stop,
                            numbers: Vec::new(),
                        })
                    }
                    Some("discontinue") => {
                        bar.stop_ending = Some(Ending {
                            ending_type: EndingType::Discontinue,
                            numbers: Vec::new(),
                        })
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_int(node: Node, what: &str) -> NotationResult<Option<i32>> {
    match get_text(node) {
        None => Ok(None),
        Some(text) => text
            .parse::<i32>()
            .map(Some)
            .map_err(|_| DataError::at(node, format!("Invalid <{}> value \"{}\".", what, text)).into()),
    }
}

fn parse_divisions(node: Node) -> NotationResult<i64> {
    match get_text(node).and_then(|t| t.parse::<i64>().ok()) {
        Some(divisions) if divisions > 0 => Ok(divisions),
        _ => Err(DataError::at(
            node,
            format!("Invalid <divisions> value \"{}\".", node.text().unwrap_or("")),
        )
        .into()),
    }
}

/// Semitones from written to concert pitch: chromatic + 12 × octave-change
fn parse_transpose(transpose: Node) -> NotationResult<i32> {
    let chromatic = match get_child(transpose, "chromatic") {
        Some(node) => parse_int(node, "chromatic")?.unwrap_or(0),
        None => 0,
    };
    let octave_change = match get_child(transpose, "octave-change") {
        Some(node) => parse_int(node, "octave-change")?.unwrap_or(0),
        None => 0,
    };
    Ok(chromatic + 12 * octave_change)
}

/// Traditional keys only; a `<key>` without `<fifths>` yields `None`.
fn parse_key(key: Node) -> NotationResult<Option<KeySignature>> {
    match get_child(key, "fifths") {
        Some(node) => Ok(parse_int(node, "fifths")?.map(KeySignature::new)),
        None => {
            log::debug!("Ignoring <key> without <fifths>");
            Ok(None)
        }
    }
}

fn parse_time(time: Node) -> NotationResult<TimeSignature> {
    let display = match time.attribute("symbol") {
        Some("common") => Some(TimeDisplay::Common),
        Some("cut") => Some(TimeDisplay::Cut),
        _ => None,
    };

    let beats = get_child_text(time, "beats").and_then(parse_beats);
    let beat_type = get_child_text(time, "beat-type").and_then(|t| t.parse::<u32>().ok());

    match (beats, beat_type) {
        (Some(count), Some(unit)) if count > 0 && unit > 0 => Ok(TimeSignature { count, unit, display }),
        _ if display == Some(TimeDisplay::Common) => Ok(TimeSignature {
            count: 4,
            unit: 4,
            display,
        }),
        _ => Err(DataError::at(time, "Invalid <time> element.").into()),
    }
}

/// `<beats>` text; additive values like "3+2" are summed.
fn parse_beats(text: &str) -> Option<u32> {
    text.split('+')
        .map(|part| part.trim().parse::<u32>().ok())
        .sum()
}

fn parse_clef(clef: Node) -> NotationResult<Clef> {
    let sign = get_child_text(clef, "sign")
        .ok_or_else(|| DataError::at(clef, "<clef> missing <sign>."))?;
    let line = match get_child(clef, "line") {
        Some(node) => parse_int(node, "line")?,
        None => None,
    };
    let octave = match get_child(clef, "clef-octave-change") {
        Some(node) => parse_int(node, "clef-octave-change")?.filter(|&o| o != 0),
        None => None,
    };
    Ok(Clef::from_line(sign, line, octave))
}

/// Ending numbers from a comma/whitespace separated list; junk is skipped.
fn parse_ending_numbers(text: &str) -> Vec<u32> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|n| n.parse::<u32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml_doc(xml: &str) -> roxmltree::Document<'_> {
        roxmltree::Document::parse(xml).unwrap()
    }

    #[test]
    fn test_parse_time_variants() {
        let doc = xml_doc("<time><beats>3</beats><beat-type>8</beat-type></time>");
        assert_eq!(parse_time(doc.root_element()).unwrap(), TimeSignature::new(3, 8));

        let doc = xml_doc(r#"<time symbol="common"/>"#);
        let time = parse_time(doc.root_element()).unwrap();
        assert_eq!((time.count, time.unit, time.display), (4, 4, Some(TimeDisplay::Common)));

        let doc = xml_doc(r#"<time symbol="cut"><beats>2</beats><beat-type>2</beat-type></time>"#);
        assert_eq!(parse_time(doc.root_element()).unwrap().display, Some(TimeDisplay::Cut));

        let doc = xml_doc("<time><beats>3+2</beats><beat-type>8</beat-type></time>");
        assert_eq!(parse_time(doc.root_element()).unwrap().count, 5);

        let doc = xml_doc("<time><senza-misura/></time>");
        assert!(parse_time(doc.root_element()).is_err());
    }

    #[test]
    fn test_parse_clef_defaults_line_by_sign() {
        let doc = xml_doc("<clef><sign>F</sign></clef>");
        assert_eq!(parse_clef(doc.root_element()).unwrap().staff_position, 2);

        let doc = xml_doc("<clef><sign>G</sign><line>2</line><clef-octave-change>-1</clef-octave-change></clef>");
        let clef = parse_clef(doc.root_element()).unwrap();
        assert_eq!(clef.staff_position, -2);
        assert_eq!(clef.octave, Some(-1));

        let doc = xml_doc("<clef><line>2</line></clef>");
        assert!(parse_clef(doc.root_element()).is_err());
    }

    #[test]
    fn test_parse_transpose() {
        let doc = xml_doc("<transpose><diatonic>-1</diatonic><chromatic>-2</chromatic></transpose>");
        assert_eq!(parse_transpose(doc.root_element()).unwrap(), -2);

        let doc = xml_doc(
            "<transpose><chromatic>-2</chromatic><octave-change>-1</octave-change></transpose>",
        );
        assert_eq!(parse_transpose(doc.root_element()).unwrap(), -14);
    }

    #[test]
    fn test_parse_ending_numbers() {
        assert_eq!(parse_ending_numbers("1, 2"), vec![1, 2]);
        assert_eq!(parse_ending_numbers("1 2,3"), vec![1, 2, 3]);
        assert!(parse_ending_numbers("").is_empty());
        assert!(parse_ending_numbers("last").is_empty());
    }

    #[test]
    fn test_invalid_divisions() {
        let doc = xml_doc("<divisions>zero</divisions>");
        assert!(parse_divisions(doc.root_element()).is_err());
        let doc = xml_doc("<divisions>0</divisions>");
        assert!(parse_divisions(doc.root_element()).is_err());
        let doc = xml_doc("<divisions>480</divisions>");
        assert_eq!(parse_divisions(doc.root_element()).unwrap(), 480);
    }
}
