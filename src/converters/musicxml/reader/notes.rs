//! `<note>` parsing
//!
//! A note is read in two phases: its children are collected into a
//! [`NoteRecord`], then the record is placed into the score (new event, chord
//! member or grace note) and its notations are fed to the tracking tables.

use std::collections::BTreeMap;

use roxmltree::Node;

use super::{
    parse_duration_units, tables, BeamMark, BeamMarker, EventBeams, MeasureContext, MusicXmlReader,
    OpenSlur, OpenTie, OpenTuplet, SlurSpan, TupletSpan,
};
use crate::converters::musicxml::document::{element_children, get_child, get_child_text, get_text};
use crate::converters::musicxml::errors::{source_line, DataError, NotationResult};
use crate::models::{
    Accidental, Event, EventItem, Fraction, GraceNoteGroup, Marking, Note, Pitch, RhythmicDuration,
    Sequence, SequenceItem, Step, Tie, TupletRatio,
};

/// Most augmentation dots a written value may carry
const MAX_DOTS: u32 = 4;

/// Raw content of one `<note>`
struct NoteRecord<'a, 'input> {
    voice: String,
    is_chord: bool,
    is_grace: bool,
    is_rest: bool,
    pitch: Option<Pitch>,
    accidental: Option<Accidental>,
    note_type: Option<Fraction>,
    dots: u32,
    /// Raw `<duration>` units
    duration: Option<i64>,
    time_modification: Option<Node<'a, 'input>>,
    beams: BTreeMap<u32, BeamMark>,
    notations: Vec<Node<'a, 'input>>,
}

impl MusicXmlReader {
    /// Read a `<note>`; returns the raw duration the cursor advances by.
    pub(super) fn read_note(&mut self, node: Node, context: &MeasureContext) -> NotationResult<i64> {
        let record = collect_note(node)?;

        let divisions = self.divisions(&context.part_id);
        let written = match (record.note_type, record.duration) {
            (Some(fraction), _) => Some(RhythmicDuration::new(fraction, record.dots)),
            (None, Some(units)) => Some(RhythmicDuration::new(Fraction::new(units, divisions * 4), 0)),
            (None, None) => None,
        };
        let ratio = record
            .time_modification
            .map(|tm| parse_time_modification(tm, record.note_type))
            .transpose()?;
        let markings = parse_markings(&record.notations)?;

        let (item, note) = if record.is_rest {
            (EventItem::Rest, None)
        } else {
            let pitch = record
                .pitch
                .ok_or_else(|| DataError::at(node, "Got a <note> without <pitch>."))?;
            let mut note = Note::new(self.state.new_note_id(), pitch);
            note.accidental = record.accidental;
            let id = note.id.clone();
            (EventItem::Note(note), Some((id, pitch)))
        };

        let event_id = {
            let state = &mut self.state;
            let bar_part = self.score.bars[context.bar]
                .bar_parts
                .entry(context.part_id.clone())
                .or_default();
            let sequence = bar_part.sequence_or_create(&record.voice);
            let event_id = place_item(sequence, node, &record, written, item, markings, state.grace_open, || {
                state.new_event_id()
            })?;
            state.grace_open = record.is_grace;
            event_id
        };

        let note_id = note.as_ref().map(|(id, _)| id.as_str());
        let mut closing_tuplets = Vec::new();
        for notations in &record.notations {
            for marker in element_children(*notations) {
                match marker.tag_name().name() {
                    "tied" => match &note {
                        Some((id, pitch)) => self.read_tied(marker, &context.part_id, id, *pitch),
                        None => log::debug!("Ignoring <tied> on a rest"),
                    },
                    "slur" => self.read_slur(marker, &event_id, note_id),
                    "tuplet" => {
                        let number = marker.attribute("number").unwrap_or("1").trim().to_string();
                        match marker.attribute("type") {
                            Some("start") => {
                                self.state.open_tuplets.insert(
                                    (context.part_id.clone(), number),
                                    OpenTuplet {
                                        voice: record.voice.clone(),
                                        ratio,
                                        members: Vec::new(),
                                    },
                                );
                            }
                            Some("stop") => closing_tuplets.push((number, marker)),
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
        }

        self.add_tuplet_member(&context.part_id, &record.voice, &event_id);
        for (number, marker) in closing_tuplets {
            self.close_tuplet(&context.part_id, number, ratio, marker)?;
        }

        if !record.beams.is_empty() {
            // Chord members repeat the beams of the first note.
            let seen = self.state.beam_markers.last().map(|b| b.event_id == event_id).unwrap_or(false);
            if !seen {
                self.state.beam_markers.push(EventBeams {
                    event_id: event_id.clone(),
                    markers: record.beams.clone(),
                });
            }
        }

        if let Some(shift) = self.state.octave_shift.as_mut() {
            if shift.members.last() != Some(&event_id) {
                shift.members.push(event_id);
            }
        }

        if record.is_chord || record.is_grace {
            Ok(0)
        } else {
            Ok(record.duration.unwrap_or(0))
        }
    }

    fn read_tied(&mut self, tied: Node, part_id: &str, note_id: &str, pitch: Pitch) {
        match tied.attribute("type") {
            Some("start") => self.open_tie(tied, part_id, note_id, pitch),
            Some("stop") => self.close_tie(part_id, note_id, pitch),
            Some("continue") => {
                self.close_tie(part_id, note_id, pitch);
                self.open_tie(tied, part_id, note_id, pitch);
            }
            _ => {}
        }
    }

    fn open_tie(&mut self, tied: Node, part_id: &str, note_id: &str, pitch: Pitch) {
        let side = tables::curve_side(tied.attribute("placement"), tied.attribute("orientation"));
        self.state
            .open_ties
            .entry(part_id.to_string())
            .or_default()
            .push(OpenTie {
                note_id: note_id.to_string(),
                pitch,
                side,
            });
    }

    /// End the earliest open tie on an equal pitch.
    fn close_tie(&mut self, part_id: &str, note_id: &str, pitch: Pitch) {
        let open = self.state.open_ties.entry(part_id.to_string()).or_default();
        let index = open
            .iter()
            .position(|tie| tie.note_id != note_id && tie.pitch == pitch);
        let tie = match index {
            Some(index) => open.remove(index),
            None => {
                log::debug!("No open tie ends on {} ({})", note_id, pitch);
                return;
            }
        };

        if let Some(start) = self.score.note_mut(&tie.note_id) {
            start.ties.push(Tie {
                target: note_id.to_string(),
                side: tie.side,
            });
        }
        if let Some(end) = self.score.note_mut(note_id) {
            end.is_referenced = true;
        }
    }

    fn read_slur(&mut self, slur: Node, event_id: &str, note_id: Option<&str>) {
        let number = slur
            .attribute("number")
            .and_then(|n| n.trim().parse::<i32>().ok())
            .unwrap_or(1);

        match slur.attribute("type") {
            Some("start") => {
                let open = OpenSlur {
                    side: tables::curve_side(slur.attribute("placement"), slur.attribute("orientation")),
                    default_x: slur.attribute("default-x").map(str::to_string),
                    start_event: event_id.to_string(),
                    start_note: note_id.map(str::to_string),
                };
                if self.state.open_slurs.insert(number, open).is_some() {
                    log::debug!("Slur {} restarted before it was stopped", number);
                }
            }
            Some("stop") => match self.state.open_slurs.remove(&number) {
                Some(start) => self.state.complete_slurs.push(SlurSpan {
                    start,
                    end_event: event_id.to_string(),
                    end_note: note_id.map(str::to_string),
                }),
                None => log::debug!("Dropping <slur type=\"stop\"> {} without a matching start", number),
            },
            _ => {}
        }
    }

    fn add_tuplet_member(&mut self, part_id: &str, voice: &str, event_id: &str) {
        for ((tuplet_part, _), tuplet) in self.state.open_tuplets.iter_mut() {
            if tuplet_part == part_id
                && tuplet.voice == voice
                && tuplet.members.last().map(String::as_str) != Some(event_id)
            {
                tuplet.members.push(event_id.to_string());
            }
        }
    }

    fn close_tuplet(
        &mut self,
        part_id: &str,
        number: String,
        stop_ratio: Option<TupletRatio>,
        marker: Node,
    ) -> NotationResult<()> {
        let open = match self.state.open_tuplets.remove(&(part_id.to_string(), number)) {
            Some(open) => open,
            None => {
                log::debug!("Dropping <tuplet type=\"stop\"> without a matching start");
                return Ok(());
            }
        };
        let ratio = open
            .ratio
            .or(stop_ratio)
            .ok_or_else(|| DataError::at(marker, "<tuplet> without <time-modification>."))?;
        if !open.members.is_empty() {
            self.state.complete_tuplets.push(TupletSpan {
                ratio,
                members: open.members,
            });
        }
        Ok(())
    }
}

/// Put a note or rest into its sequence and return the id of its event.
#[allow(clippy::too_many_arguments)]
fn place_item(
    sequence: &mut Sequence,
    node: Node,
    record: &NoteRecord,
    written: Option<RhythmicDuration>,
    item: EventItem,
    markings: Vec<Marking>,
    grace_open: bool,
    new_event_id: impl FnOnce() -> String,
) -> NotationResult<String> {
    let chord_event = if !record.is_chord {
        None
    } else if record.is_grace {
        match sequence.items.last_mut() {
            Some(SequenceItem::Grace(group)) => group.events.last_mut(),
            _ => None,
        }
    } else {
        sequence.last_event_mut()
    };

    if let Some(event) = chord_event {
        if let Some(duration) = written {
            if duration != event.duration {
                return Err(DataError::at(
                    node,
                    "Two separate <note>s within the same chord had different durations.",
                )
                .into());
            }
        }
        event.items.push(item);
        for marking in markings {
            event.add_marking(marking);
        }
        return Ok(event.id.clone());
    }

    let duration = written
        .ok_or_else(|| DataError::at(node, "<note> has neither <type> nor <duration>."))?;
    let mut event = Event::new(new_event_id(), duration);
    event.items.push(item);
    for marking in markings {
        event.add_marking(marking);
    }
    let event_id = event.id.clone();

    if record.is_grace {
        match sequence.items.last_mut() {
            Some(SequenceItem::Grace(group)) if grace_open => group.events.push(event),
            _ => sequence.items.push(SequenceItem::Grace(GraceNoteGroup { events: vec![event] })),
        }
    } else {
        sequence.items.push(SequenceItem::Event(event));
    }
    Ok(event_id)
}

// ============================================================================
// ELEMENT PARSERS
// ============================================================================

fn collect_note<'a, 'input>(note: Node<'a, 'input>) -> NotationResult<NoteRecord<'a, 'input>> {
    let mut record = NoteRecord {
        voice: String::new(),
        is_chord: false,
        is_grace: false,
        is_rest: false,
        pitch: None,
        accidental: None,
        note_type: None,
        dots: 0,
        duration: None,
        time_modification: None,
        beams: BTreeMap::new(),
        notations: Vec::new(),
    };

    for node in element_children(note) {
        match node.tag_name().name() {
            "accidental" => {
                let text = get_text(node).unwrap_or("");
                let accidental = tables::accidental(text).ok_or_else(|| {
                    DataError::at(node, format!("Got unsupported <accidental> value {}.", text))
                })?;
                record.accidental = Some(accidental);
            }
            "beam" => {
                let (number, marker) = parse_beam(node)?;
                record.beams.entry(number).or_insert(BeamMark {
                    marker,
                    line: source_line(node),
                });
            }
            "chord" => record.is_chord = true,
            "dot" => {
                record.dots += 1;
                if record.dots > MAX_DOTS {
                    return Err(DataError::at(node, format!("Got more than {} <dot>s on a <note>.", MAX_DOTS)).into());
                }
            }
            "duration" => {
                let text = get_text(node).unwrap_or("");
                let units = parse_duration_units(text).ok_or_else(|| {
                    DataError::at(node, format!("Invalid <duration> value \"{}\".", text))
                })?;
                record.duration = Some(units);
            }
            "grace" => record.is_grace = true,
            "notations" => record.notations.push(node),
            "pitch" => record.pitch = Some(parse_pitch(node)?),
            "unpitched" => record.pitch = parse_unpitched(node)?,
            "rest" => record.is_rest = true,
            "time-modification" => record.time_modification = Some(node),
            "type" => record.note_type = Some(parse_type(node)?),
            "voice" => record.voice = get_text(node).unwrap_or("").to_string(),
            _ => {}
        }
    }
    Ok(record)
}

fn parse_pitch(pitch: Node) -> NotationResult<Pitch> {
    let step_text = get_child_text(pitch, "step")
        .ok_or_else(|| DataError::at(pitch, "Missing <step> for <pitch>."))?;
    let step = Step::from_letter(step_text)
        .ok_or_else(|| DataError::at(pitch, format!("Invalid <step> \"{}\" for <pitch>.", step_text)))?;

    let octave = get_child_text(pitch, "octave")
        .ok_or_else(|| DataError::at(pitch, "Missing <octave> for <pitch>."))?
        .parse::<i32>()
        .map_err(|_| DataError::at(pitch, "Invalid <octave> for <pitch>."))?;

    let alter = match get_child(pitch, "alter") {
        Some(node) => parse_alter(node)?,
        None => 0,
    };

    Ok(Pitch::new(step, octave, alter))
}

/// Whole-semitone `<alter>`; microtones are rejected.
fn parse_alter(alter: Node) -> NotationResult<i32> {
    let text = get_text(alter).unwrap_or("0");
    match text.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() <= 8.0 => Ok(value as i32),
        Ok(_) => Err(DataError::at(alter, format!("Unsupported microtonal <alter> \"{}\".", text)).into()),
        Err(_) => Err(DataError::at(alter, "Invalid <alter> for <pitch>.").into()),
    }
}

/// Staff position of an unpitched (percussion) note, as a pitch
fn parse_unpitched(unpitched: Node) -> NotationResult<Option<Pitch>> {
    let step = match get_child_text(unpitched, "display-step").and_then(Step::from_letter) {
        Some(step) => step,
        None => return Ok(None),
    };
    let octave = get_child_text(unpitched, "display-octave")
        .and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| DataError::at(unpitched, "Missing <display-octave> for <unpitched>."))?;
    Ok(Some(Pitch::new(step, octave, 0)))
}

fn parse_type(node: Node) -> NotationResult<Fraction> {
    let text = get_text(node).unwrap_or("");
    tables::rhythm_type(text).ok_or_else(|| {
        DataError::at(node, format!("Unsupported <{}> \"{}\".", node.tag_name().name(), text)).into()
    })
}

fn parse_beam(beam: Node) -> NotationResult<(u32, BeamMarker)> {
    let number = match beam.attribute("number") {
        None => 1,
        Some(text) => match text.trim().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => return Err(DataError::at(beam, format!("Invalid <beam> number \"{}\".", text)).into()),
        },
    };
    let marker = match get_text(beam).unwrap_or("") {
        "begin" => BeamMarker::Begin,
        "continue" => BeamMarker::Continue,
        "end" => BeamMarker::End,
        "forward hook" => BeamMarker::ForwardHook,
        "backward hook" => BeamMarker::BackwardHook,
        other => {
            return Err(DataError::at(beam, format!("Unsupported <beam> value \"{}\".", other)).into())
        }
    };
    Ok((number, marker))
}

/// Tuplet ratio of a note: actual-notes in the time of normal-notes of the
/// normal type (the note's own type unless given).
fn parse_time_modification(time_mod: Node, note_type: Option<Fraction>) -> NotationResult<TupletRatio> {
    let mut actual = None;
    let mut normal = None;
    let mut normal_type = None;
    let mut normal_dots = 0;

    for node in element_children(time_mod) {
        let tag = node.tag_name().name();
        match tag {
            "actual-notes" | "normal-notes" => {
                let value = get_text(node)
                    .and_then(|t| t.parse::<i64>().ok())
                    .filter(|&v| v > 0)
                    .ok_or_else(|| DataError::at(node, format!("Invalid <{}> for <time-modification>.", tag)))?;
                if tag == "actual-notes" {
                    actual = Some(value);
                } else {
                    normal = Some(value);
                }
            }
            "normal-type" => normal_type = Some(parse_type(node)?),
            "normal-dot" => {
                normal_dots += 1;
                if normal_dots > MAX_DOTS {
                    return Err(DataError::at(node, format!("Got more than {} <normal-dot>s.", MAX_DOTS)).into());
                }
            }
            _ => {}
        }
    }

    let actual = actual.ok_or_else(|| DataError::at(time_mod, "Missing <actual-notes> for <time-modification>."))?;
    let normal = normal.ok_or_else(|| DataError::at(time_mod, "Missing <normal-notes> for <time-modification>."))?;
    let unit = normal_type
        .or(note_type)
        .ok_or_else(|| DataError::at(time_mod, "<time-modification> needs a <type> or <normal-type>."))?;

    Ok(TupletRatio::new(actual, normal, RhythmicDuration::new(unit, normal_dots)))
}

/// Articulations and single-note tremolos of all `<notations>` of a note
fn parse_markings(notations: &[Node]) -> NotationResult<Vec<Marking>> {
    let mut markings: Vec<Marking> = Vec::new();
    let mut add = |marking: Marking| {
        if !markings.iter().any(|m| m.same_kind(&marking)) {
            markings.push(marking);
        }
    };

    for notation in notations {
        for node in element_children(*notation) {
            match node.tag_name().name() {
                "articulations" => {
                    for articulation in element_children(node) {
                        if let Some(marking) = tables::articulation(articulation.tag_name().name()) {
                            add(marking);
                        }
                    }
                }
                "ornaments" => {
                    for ornament in element_children(node) {
                        if ornament.tag_name().name() != "tremolo" {
                            continue;
                        }
                        // start/stop tremolos span two notes and are not markings.
                        if let None | Some("single") | Some("unmeasured") = ornament.attribute("type") {
                            add(Marking::Tremolo {
                                marks: parse_tremolo_marks(ornament)?,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(markings)
}

fn parse_tremolo_marks(tremolo: Node) -> NotationResult<u32> {
    match get_text(tremolo) {
        None => Ok(tables::DEFAULT_TREMOLO_MARKS),
        Some(text) => text.parse::<u32>().map_err(|_| {
            DataError::at(tremolo, format!("Invalid <tremolo> marks \"{}\".", text)).into()
        }),
    }
}
