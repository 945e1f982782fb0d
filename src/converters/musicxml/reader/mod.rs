//! Stateful MusicXML reader
//!
//! Walks a measure-major MusicXML tree once and builds a [`Score`]. MusicXML
//! encodes ties, slurs, tuplets, beams and octave shifts as numbered start/stop
//! markers scattered across notes and measures; the reader keeps one tracking
//! table per relationship and resolves them as markers close.
//!
//! ```text
//! <measure> ─┬─ <part> ── attributes / note / backup / ... ─┐
//!            │                                              ├─ finalize (slurs,
//!            └─ <part> ── ...                               │   tuplets, beams,
//!                                                           ┘   octave shifts)
//! ```
//!
//! A reader is single-use: construct it, call [`MusicXmlReader::read`] once.

mod attributes;
mod finalize;
mod notes;
pub mod tables;

use std::collections::{BTreeMap, HashMap};

use roxmltree::Node;

use super::document::{element_children, get_child, get_child_text, get_children, MeasurePart, TimewiseScore};
use super::errors::{DataError, NotationResult};
use crate::models::{
    Bar, BarPart, Beam, CurveSide, OttavaType, Part, Pitch, Score, TupletRatio,
};

// ============================================================================
// TRACKING TABLES
// ============================================================================

/// Note waiting for a `<tied type="stop">`
#[derive(Debug, Clone)]
struct OpenTie {
    note_id: String,
    pitch: Pitch,
    side: Option<CurveSide>,
}

#[derive(Debug, Clone)]
struct OpenSlur {
    side: Option<CurveSide>,
    /// `default-x` of the start marker, used to tell incoming from outgoing
    default_x: Option<String>,
    start_event: String,
    start_note: Option<String>,
}

/// Slur whose stop marker has been seen
#[derive(Debug, Clone)]
struct SlurSpan {
    start: OpenSlur,
    end_event: String,
    end_note: Option<String>,
}

#[derive(Debug, Clone)]
struct OpenTuplet {
    /// Only events of this voice join the tuplet
    voice: String,
    ratio: Option<TupletRatio>,
    members: Vec<String>,
}

#[derive(Debug, Clone)]
struct TupletSpan {
    ratio: TupletRatio,
    members: Vec<String>,
}

#[derive(Debug, Clone)]
struct OpenBeam {
    beam: Beam,
    /// Bar the beam began in; root beams are attached there
    bar: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BeamMarker {
    Begin,
    Continue,
    End,
    ForwardHook,
    BackwardHook,
}

/// A `<beam>` value and the source line it was read from
#[derive(Debug, Clone, Copy)]
struct BeamMark {
    marker: BeamMarker,
    line: u32,
}

/// Beam markers of one event, by beam number
#[derive(Debug, Clone)]
struct EventBeams {
    event_id: String,
    markers: BTreeMap<u32, BeamMark>,
}

#[derive(Debug, Clone)]
struct OpenOctaveShift {
    shift: OttavaType,
    /// Affected events in encounter order
    members: Vec<String>,
}

/// Document-scoped state of one read
#[derive(Debug, Default)]
struct ReaderState {
    /// Part id → current `<divisions>` (units per quarter note)
    part_divisions: HashMap<String, i64>,
    /// Part id → ties in open order
    open_ties: HashMap<String, Vec<OpenTie>>,
    /// MusicXML slur number → open slur
    open_slurs: BTreeMap<i32, OpenSlur>,
    complete_slurs: Vec<SlurSpan>,
    /// (part id, tuplet number) → open tuplet
    open_tuplets: BTreeMap<(String, String), OpenTuplet>,
    complete_tuplets: Vec<TupletSpan>,
    /// Part id → beam number → open beam; persists across measures
    open_beams: HashMap<String, BTreeMap<u32, OpenBeam>>,
    /// Beam markers of the current measure part, in event order
    beam_markers: Vec<EventBeams>,
    octave_shift: Option<OpenOctaveShift>,
    complete_octave_shifts: Vec<OpenOctaveShift>,
    /// Set while consecutive grace notes are being grouped
    grace_open: bool,
    next_event_id: u32,
    next_note_id: u32,
}

impl ReaderState {
    fn new_event_id(&mut self) -> String {
        self.next_event_id += 1;
        format!("event{}", self.next_event_id)
    }

    fn new_note_id(&mut self) -> String {
        self.next_note_id += 1;
        format!("note{}", self.next_note_id)
    }
}

/// Position within the measure part being read
struct MeasureContext {
    bar: usize,
    part_id: String,
    /// Cursor in raw `<duration>` units
    position: i64,
}

// ============================================================================
// READER
// ============================================================================

pub struct MusicXmlReader {
    score: Score,
    state: ReaderState,
}

impl Default for MusicXmlReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicXmlReader {
    pub fn new() -> Self {
        Self {
            score: Score::new(),
            state: ReaderState::default(),
        }
    }

    /// Build a score from a measure-major MusicXML tree.
    pub fn read(mut self, document: &TimewiseScore) -> NotationResult<Score> {
        self.read_part_list(document.part_list)?;

        for (index, measure) in document.measures.iter().enumerate() {
            let mut bar = Bar::new(index);
            for part in &self.score.parts {
                bar.bar_parts.insert(part.part_id.clone(), BarPart::default());
            }
            self.score.bars.push(bar);

            for (position, measure_part) in measure.parts.iter().enumerate() {
                let part_id = self.resolve_part_id(measure_part, position)?;
                self.read_measure_part(index, part_id, measure_part)?;
            }
        }

        self.report_unclosed();
        Ok(self.score)
    }

    fn read_part_list(&mut self, part_list: Option<Node>) -> NotationResult<()> {
        let part_list = match part_list {
            Some(node) => node,
            None => return Ok(()),
        };

        // <part-group> entries carry no parts.
        for score_part in get_children(part_list, "score-part") {
            let part_id = score_part
                .attribute("id")
                .ok_or_else(|| DataError::at(score_part, "<score-part> missing 'id' attribute."))?;
            let name = get_child_text(score_part, "part-name").map(str::to_string);
            self.score.parts.push(Part::new(part_id, name));
        }
        Ok(())
    }

    /// Match a measure part to a `<score-part>` by id, then by position.
    fn resolve_part_id(&self, measure_part: &MeasurePart, position: usize) -> NotationResult<String> {
        if let Some(part) = measure_part.part_id.and_then(|id| self.score.part(id)) {
            return Ok(part.part_id.clone());
        }
        match self.score.parts.get(position) {
            Some(part) => Ok(part.part_id.clone()),
            None => Err(DataError::at(
                measure_part.node,
                format!(
                    "Part {} doesn't match any <score-part>.",
                    measure_part.part_id.unwrap_or("(no id)")
                ),
            )
            .into()),
        }
    }

    fn read_measure_part(
        &mut self,
        bar: usize,
        part_id: String,
        measure_part: &MeasurePart,
    ) -> NotationResult<()> {
        let mut context = MeasureContext {
            bar,
            part_id,
            position: 0,
        };
        self.state.grace_open = false;

        for node in measure_part.children() {
            match node.tag_name().name() {
                "attributes" => self.read_attributes(node, &context)?,
                "backup" => {
                    context.position -= read_forward_backup(node);
                    self.state.grace_open = false;
                }
                "forward" => {
                    context.position += read_forward_backup(node);
                    self.state.grace_open = false;
                }
                "barline" => self.read_barline(node, context.bar)?,
                "direction" => self.read_direction(node)?,
                "note" => {
                    context.position += self.read_note(node, &context)?;
                }
                _ => {}
            }
        }

        self.finalize_measure_part(&context)
    }

    fn read_direction(&mut self, direction: Node) -> NotationResult<()> {
        for direction_type in get_children(direction, "direction-type") {
            for node in element_children(direction_type) {
                if node.tag_name().name() == "octave-shift" {
                    self.read_octave_shift(node)?;
                }
            }
        }
        Ok(())
    }

    fn read_octave_shift(&mut self, node: Node) -> NotationResult<()> {
        match node.attribute("type") {
            Some(shift_type @ ("up" | "down")) => {
                let size = node.attribute("size").unwrap_or("8");
                let shift = tables::octave_shift(size, shift_type).ok_or_else(|| {
                    DataError::at(
                        node,
                        format!("Unsupported <octave-shift> type/size combination {}/{}.", shift_type, size),
                    )
                })?;
                if self.state.octave_shift.is_some() {
                    // Nested shifts are not supported; the open one stays in force.
                    log::warn!("Ignoring <octave-shift> inside another octave shift");
                    return Ok(());
                }
                self.state.octave_shift = Some(OpenOctaveShift {
                    shift,
                    members: Vec::new(),
                });
            }
            Some("stop") => match self.state.octave_shift.take() {
                Some(open) if open.members.is_empty() => {
                    log::debug!("Discarding octave shift that covers no notes");
                }
                Some(open) => self.state.complete_octave_shifts.push(open),
                None => log::debug!("Ignoring <octave-shift type=\"stop\"> with no open shift"),
            },
            _ => {}
        }
        Ok(())
    }

    /// Divisions per quarter note currently in force for a part
    fn divisions(&self, part_id: &str) -> i64 {
        self.state.part_divisions.get(part_id).copied().unwrap_or(1)
    }

    fn report_unclosed(&self) {
        for (part_id, beams) in &self.state.open_beams {
            for number in beams.keys() {
                log::warn!("Discarding beam {} left open at the end of part {}", number, part_id);
            }
        }
        for (part_id, number) in self.state.open_tuplets.keys() {
            log::warn!("Discarding tuplet {} left open at the end of part {}", number, part_id);
        }
        for number in self.state.open_slurs.keys() {
            log::debug!("Discarding slur {} left open at the end of the score", number);
        }
        if self.state.octave_shift.is_some() {
            log::debug!("Discarding octave shift left open at the end of the score");
        }
    }
}

/// Cursor movement of a `<forward>`/`<backup>`; missing or invalid counts as 0
fn read_forward_backup(node: Node) -> i64 {
    get_child(node, "duration")
        .and_then(|d| d.text())
        .and_then(parse_duration_units)
        .unwrap_or(0)
}

/// Raw `<duration>` value. MusicXML allows decimals; they are rounded.
fn parse_duration_units(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
