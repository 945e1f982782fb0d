//! MNX (JSON) emitter
//!
//! The score is projected onto serde structs, turned into a `serde_json::Value`
//! (whose maps keep keys sorted) and pretty-printed with 2-space indentation.
//! Ids are written only for events and notes something refers to.

use std::collections::BTreeMap;

use serde::Serialize;

use super::microformat;
use crate::converters::musicxml::errors::ExportError;
use crate::models::{
    Bar, BarPart, Beam, Event, EventItem, Marking, Note, Part, PositionedClef, RhythmicDuration,
    Score, Sequence, SequenceDirection, SequenceItem, Slur, SlurKind, Tuplet,
};

const MNX_VERSION: u32 = 1;

// ============================================================================
// DOCUMENT SHAPE
// ============================================================================

#[derive(Debug, Serialize)]
struct MnxDocument {
    mnx: MnxHeader,
    global: Global,
    parts: Vec<PartJson>,
}

#[derive(Debug, Serialize)]
struct MnxHeader {
    version: u32,
}

#[derive(Debug, Serialize)]
struct Global {
    measures: Vec<GlobalMeasure>,
}

/// Serializes as `{}`
#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GlobalMeasure {
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<TimeJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<KeyJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_start: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_end: Option<RepeatEnd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ending: Option<EndingJson>,
}

#[derive(Debug, Serialize)]
struct TimeJson {
    count: u32,
    unit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct KeyJson {
    fifths: i32,
}

#[derive(Debug, Serialize)]
struct RepeatEnd {
    #[serde(skip_serializing_if = "Option::is_none")]
    times: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EndingJson {
    numbers: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct PartJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    measures: Vec<PartMeasure>,
}

#[derive(Debug, Serialize)]
struct PartMeasure {
    sequences: Vec<SequenceJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clefs: Option<Vec<ClefJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beams: Option<Vec<BeamJson>>,
}

#[derive(Debug, Serialize)]
struct ClefJson {
    clef: ClefValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<PositionJson>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClefValue {
    sign: String,
    staff_position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    octave: Option<i32>,
}

#[derive(Debug, Serialize)]
struct PositionJson {
    fraction: [i64; 2],
}

#[derive(Debug, Serialize)]
struct BeamJson {
    events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inner: Option<Vec<BeamJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<Vec<BeamHookJson>>,
}

#[derive(Debug, Serialize)]
struct BeamHookJson {
    event: String,
    direction: &'static str,
}

#[derive(Debug, Serialize)]
struct SequenceJson {
    content: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentItem {
    Event(EventJson),
    Tuplet(TupletJson),
    Grace(GraceJson),
    Ottava(OttavaJson),
}

#[derive(Debug, Serialize)]
struct NoteValue {
    base: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dots: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EventJson {
    duration: NoteValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rest: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<Vec<NoteJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slurs: Option<Vec<SlurJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    markings: Option<BTreeMap<&'static str, MarkingJson>>,
}

#[derive(Debug, Serialize)]
struct MarkingJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    marks: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteJson {
    pitch: PitchJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accidental_display: Option<AccidentalDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tie: Option<TieJson>,
}

#[derive(Debug, Serialize)]
struct PitchJson {
    step: &'static str,
    octave: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    alter: Option<i32>,
}

#[derive(Debug, Serialize)]
struct AccidentalDisplay {
    show: bool,
}

#[derive(Debug, Serialize)]
struct TieJson {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<&'static str>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlurJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct TupletJson {
    inner: TupletTerm,
    outer: TupletTerm,
    content: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
struct TupletTerm {
    duration: NoteValue,
    multiple: i64,
}

#[derive(Debug, Serialize)]
struct GraceJson {
    content: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
struct OttavaJson {
    value: i32,
    end: String,
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Serialize a score as an MNX JSON document.
pub fn write_score(score: &Score) -> Result<String, ExportError> {
    let document = MnxDocument {
        mnx: MnxHeader { version: MNX_VERSION },
        global: Global {
            measures: score.bars.iter().map(|bar| encode_global_measure(score, bar)).collect(),
        },
        parts: score
            .parts
            .iter()
            .map(|part| encode_part(score, part))
            .collect::<Result<_, _>>()?,
    };

    // Value maps are BTreeMaps, so this sorts every object's keys.
    let value = serde_json::to_value(&document)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn encode_global_measure(score: &Score, bar: &Bar) -> GlobalMeasure {
    let mut measure = GlobalMeasure::default();

    if let Some(time) = bar.time.filter(|_| score.time_changed(bar.index)) {
        measure.time = Some(TimeJson {
            count: time.count,
            unit: time.unit,
            display: time.display.map(|d| d.as_str()),
        });
    }
    if let Some(key) = bar.key.filter(|_| score.key_changed(bar.index)) {
        measure.key = Some(KeyJson { fifths: key.fifths });
    }
    if bar.repeat_start {
        measure.repeat_start = Some(Empty {});
    }
    if bar.repeat_end > 0 {
        measure.repeat_end = Some(RepeatEnd {
            times: Some(bar.repeat_end).filter(|&times| times > 2),
        });
    }
    if let Some(ending) = &bar.start_ending {
        measure.ending = Some(EndingJson {
            numbers: ending.numbers.clone(),
        });
    }
    measure
}

fn encode_part(score: &Score, part: &Part) -> Result<PartJson, ExportError> {
    let empty = BarPart::default();
    let measures = score
        .bars
        .iter()
        .map(|bar| encode_part_measure(bar.bar_parts.get(&part.part_id).unwrap_or(&empty)))
        .collect::<Result<_, _>>()?;
    Ok(PartJson {
        name: part.name.clone(),
        measures,
    })
}

fn encode_part_measure(bar_part: &BarPart) -> Result<PartMeasure, ExportError> {
    let sequences = bar_part
        .sequences
        .iter()
        .map(encode_sequence)
        .collect::<Result<_, _>>()?;
    let clefs = Some(bar_part.clefs.iter().map(encode_clef).collect::<Vec<_>>()).filter(|c| !c.is_empty());
    let beams = Some(bar_part.beams.iter().map(encode_beam).collect::<Vec<_>>()).filter(|b| !b.is_empty());
    Ok(PartMeasure { sequences, clefs, beams })
}

fn encode_clef(positioned: &PositionedClef) -> ClefJson {
    let position = &positioned.position;
    ClefJson {
        clef: ClefValue {
            sign: positioned.clef.sign.clone(),
            staff_position: positioned.clef.staff_position,
            octave: positioned.clef.octave,
        },
        position: if *position.numer() != 0 {
            Some(PositionJson {
                fraction: [*position.numer(), *position.denom()],
            })
        } else {
            None
        },
    }
}

fn encode_beam(beam: &Beam) -> BeamJson {
    BeamJson {
        events: beam.events.clone(),
        inner: Some(beam.children.iter().map(encode_beam).collect::<Vec<_>>()).filter(|b| !b.is_empty()),
        hooks: Some(
            beam.hooks
                .iter()
                .map(|hook| BeamHookJson {
                    event: hook.event.clone(),
                    direction: hook.direction.as_str(),
                })
                .collect::<Vec<_>>(),
        )
        .filter(|h| !h.is_empty()),
    }
}

fn encode_sequence(sequence: &Sequence) -> Result<SequenceJson, ExportError> {
    Ok(SequenceJson {
        content: encode_items(&sequence.items)?,
    })
}

fn encode_items(items: &[SequenceItem]) -> Result<Vec<ContentItem>, ExportError> {
    items.iter().map(encode_item).collect()
}

fn encode_item(item: &SequenceItem) -> Result<ContentItem, ExportError> {
    Ok(match item {
        SequenceItem::Event(event) => ContentItem::Event(encode_event(event)?),
        SequenceItem::Tuplet(tuplet) => ContentItem::Tuplet(encode_tuplet(tuplet)?),
        SequenceItem::Grace(group) => ContentItem::Grace(GraceJson {
            content: group
                .events
                .iter()
                .map(|event| encode_event(event).map(ContentItem::Event))
                .collect::<Result<_, _>>()?,
        }),
        SequenceItem::Direction(SequenceDirection::Ottava(ottava)) => ContentItem::Ottava(OttavaJson {
            value: ottava.shift.octaves(),
            end: ottava.end.clone(),
        }),
    })
}

fn encode_note_value(duration: &RhythmicDuration) -> Result<NoteValue, ExportError> {
    Ok(NoteValue {
        base: microformat::note_value_base(duration.fraction)?,
        dots: Some(duration.dots).filter(|&dots| dots > 0),
    })
}

fn encode_event(event: &Event) -> Result<EventJson, ExportError> {
    let (rest, notes) = if event.is_rest() {
        (Some(Empty {}), None)
    } else {
        let notes = event
            .items
            .iter()
            .filter_map(|item| match item {
                EventItem::Note(note) => Some(encode_note(note)),
                EventItem::Rest => None,
            })
            .collect::<Vec<_>>();
        (None, Some(notes))
    };

    let slurs = Some(event.slurs.iter().map(encode_slur).collect::<Vec<_>>()).filter(|s| !s.is_empty());
    let markings = Some(
        event
            .markings
            .iter()
            .map(|marking| (microformat::marking_key(marking), encode_marking(marking)))
            .collect::<BTreeMap<_, _>>(),
    )
    .filter(|m| !m.is_empty());

    Ok(EventJson {
        duration: encode_note_value(&event.duration)?,
        id: event.is_referenced.then(|| event.id.clone()),
        rest,
        notes,
        slurs,
        markings,
    })
}

fn encode_marking(marking: &Marking) -> MarkingJson {
    match marking {
        Marking::Tremolo { marks } => MarkingJson { marks: Some(*marks) },
        _ => MarkingJson { marks: None },
    }
}

fn encode_note(note: &Note) -> NoteJson {
    if note.ties.len() > 1 {
        log::warn!(
            "Note {} has {} outgoing ties; only the first is written",
            note.id,
            note.ties.len()
        );
    }
    NoteJson {
        pitch: PitchJson {
            step: note.pitch.step.letter(),
            octave: note.pitch.octave,
            alter: Some(note.pitch.alter).filter(|&alter| alter != 0),
        },
        id: note.is_referenced.then(|| note.id.clone()),
        accidental_display: note.accidental.map(|_| AccidentalDisplay { show: true }),
        tie: note.ties.first().map(|tie| TieJson {
            target: tie.target.clone(),
            side: tie.side.map(|s| s.as_str()),
        }),
    }
}

fn encode_slur(slur: &Slur) -> SlurJson {
    let side = slur.side.map(|s| s.as_str());
    match &slur.kind {
        SlurKind::Incomplete(location) => SlurJson {
            location: Some(location.as_str()),
            side,
            ..SlurJson::default()
        },
        SlurKind::Complete {
            end_event,
            start_note,
            end_note,
        } => SlurJson {
            target: Some(end_event.clone()),
            start_note: start_note.clone(),
            end_note: end_note.clone(),
            side,
            ..SlurJson::default()
        },
    }
}

fn encode_tuplet(tuplet: &Tuplet) -> Result<TupletJson, ExportError> {
    let ratio = &tuplet.ratio;
    Ok(TupletJson {
        inner: TupletTerm {
            duration: encode_note_value(&ratio.unit)?,
            multiple: ratio.inner_multiple,
        },
        outer: TupletTerm {
            duration: encode_note_value(&ratio.unit)?,
            multiple: ratio.outer_multiple,
        },
        content: encode_items(&tuplet.items)?,
    })
}
