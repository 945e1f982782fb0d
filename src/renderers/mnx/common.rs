//! MNX-Common (XML) emitter
//!
//! Builds a small element tree in document order, then streams it through a
//! `quick_xml::Writer` with 2-space indentation.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;

use super::microformat;
use crate::converters::musicxml::errors::ExportError;
use crate::models::{
    Bar, BarPart, Beam, Event, EventItem, Marking, Note, Part, Score, Sequence, SequenceDirection,
    SequenceItem, Slur, SlurKind,
};

// ============================================================================
// ELEMENT TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct XmlNode {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<XmlNode>,
    text: Option<String>,
}

impl XmlNode {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((key, value.into()));
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn child(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), ExportError> {
        let mut start = BytesStart::new(self.name);
        for (key, value) in &self.attributes {
            start.push_attribute((*key, value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(XmlEvent::Empty(start))?;
            return Ok(());
        }

        writer.write_event(XmlEvent::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(XmlEvent::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(XmlEvent::End(BytesEnd::new(self.name)))?;
        Ok(())
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Serialize a score as an MNX-Common XML document.
pub fn write_score(score: &Score) -> Result<String, ExportError> {
    let mut root = XmlNode::new("mnx");

    let mut global = XmlNode::new("global");
    for bar in &score.bars {
        global.child(global_measure(score, bar));
    }
    root.child(global);

    for part in &score.parts {
        root.child(part_element(score, part)?);
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    root.write(&mut writer)?;
    String::from_utf8(writer.into_inner()).map_err(|e| ExportError::Xml(e.to_string()))
}

fn global_measure(score: &Score, bar: &Bar) -> XmlNode {
    let mut directions = Vec::new();

    if let Some(time) = bar.time.filter(|_| score.time_changed(bar.index)) {
        directions.push(XmlNode::new("time").attr("signature", microformat::time_signature(&time)));
    }
    if let Some(key) = bar.key.filter(|_| score.key_changed(bar.index)) {
        directions.push(XmlNode::new("key").attr("fifths", key.fifths.to_string()));
    }
    if bar.repeat_start {
        directions.push(XmlNode::new("repeat").attr("type", "start"));
    }
    if let Some(ending) = &bar.start_ending {
        directions.push(
            XmlNode::new("ending")
                .attr("type", ending.ending_type.as_str())
                .attr("number", microformat::ending_numbers(&ending.numbers)),
        );
    }
    if let Some(ending) = &bar.stop_ending {
        directions.push(XmlNode::new("ending").attr("type", ending.ending_type.as_str()));
    }
    if bar.repeat_end > 0 {
        let mut repeat = XmlNode::new("repeat").attr("type", "end");
        if bar.repeat_end > 2 {
            repeat = repeat.attr("times", bar.repeat_end.to_string());
        }
        directions.push(repeat);
    }

    let mut measure = XmlNode::new("measure");
    if !directions.is_empty() {
        let mut wrapper = XmlNode::new("directions");
        wrapper.children = directions;
        measure.child(wrapper);
    }
    measure
}

fn part_element(score: &Score, part: &Part) -> Result<XmlNode, ExportError> {
    let mut element = XmlNode::new("part");
    if let Some(name) = &part.name {
        element.child(XmlNode::new("part-name").text(name.as_str()));
    }

    let empty = BarPart::default();
    for bar in &score.bars {
        let bar_part = bar.bar_parts.get(&part.part_id).unwrap_or(&empty);
        element.child(part_measure(bar_part)?);
    }
    Ok(element)
}

fn part_measure(bar_part: &BarPart) -> Result<XmlNode, ExportError> {
    let mut measure = XmlNode::new("measure");

    if !bar_part.clefs.is_empty() {
        let mut directions = XmlNode::new("directions");
        for positioned in &bar_part.clefs {
            let mut clef = XmlNode::new("clef")
                .attr("sign", positioned.clef.sign.as_str())
                .attr("line", positioned.clef.line().to_string());
            if let Some(octave) = positioned.clef.octave {
                clef = clef.attr("octave", octave.to_string());
            }
            directions.child(clef);
        }
        measure.child(directions);
    }

    if !bar_part.beams.is_empty() {
        let mut beams = XmlNode::new("beams");
        for beam in &bar_part.beams {
            beams.child(beam_element(beam));
        }
        measure.child(beams);
    }

    for sequence in &bar_part.sequences {
        measure.child(sequence_element(sequence)?);
    }
    Ok(measure)
}

fn beam_element(beam: &Beam) -> XmlNode {
    let mut element = XmlNode::new("beam").attr("events", beam.events.join(" "));
    for child in &beam.children {
        element.child(beam_element(child));
    }
    for hook in &beam.hooks {
        element.child(
            XmlNode::new("beam-hook")
                .attr("event", hook.event.as_str())
                .attr("direction", hook.direction.as_str()),
        );
    }
    element
}

fn sequence_element(sequence: &Sequence) -> Result<XmlNode, ExportError> {
    let mut element = XmlNode::new("sequence");
    write_items(&mut element, &sequence.items)?;
    Ok(element)
}

fn write_items(parent: &mut XmlNode, items: &[SequenceItem]) -> Result<(), ExportError> {
    for item in items {
        match item {
            SequenceItem::Event(event) => parent.child(event_element(event)?),
            SequenceItem::Tuplet(tuplet) => {
                let mut element = XmlNode::new("tuplet")
                    .attr("inner", microformat::ratio_term(tuplet.ratio.inner()))
                    .attr("outer", microformat::ratio_term(tuplet.ratio.outer()));
                write_items(&mut element, &tuplet.items)?;
                parent.child(element);
            }
            SequenceItem::Grace(group) => {
                let mut element = XmlNode::new("grace");
                for event in &group.events {
                    element.child(event_element(event)?);
                }
                parent.child(element);
            }
            SequenceItem::Direction(SequenceDirection::Ottava(ottava)) => {
                let mut directions = XmlNode::new("directions");
                directions.child(
                    XmlNode::new("octave-shift")
                        .attr("type", microformat::octave_shift_type(ottava.shift))
                        .attr("end", ottava.end.as_str()),
                );
                parent.child(directions);
            }
        }
    }
    Ok(())
}

fn event_element(event: &Event) -> Result<XmlNode, ExportError> {
    let mut element = XmlNode::new("event").attr("value", microformat::duration(&event.duration)?);
    if event.is_referenced {
        element = element.attr("id", event.id.as_str());
    }

    for item in &event.items {
        match item {
            EventItem::Note(note) => element.child(note_element(note)),
            EventItem::Rest => element.child(XmlNode::new("rest")),
        }
    }

    if !event.markings.is_empty() {
        let mut markings = XmlNode::new("markings");
        for marking in &event.markings {
            markings.child(marking_element(marking));
        }
        element.child(markings);
    }

    for slur in &event.slurs {
        element.child(slur_element(slur));
    }
    Ok(element)
}

fn note_element(note: &Note) -> XmlNode {
    let mut element = XmlNode::new("note").attr("pitch", microformat::pitch(&note.pitch));
    if note.is_referenced {
        element = element.attr("id", note.id.as_str());
    }
    if let Some(accidental) = note.accidental {
        element = element.attr("accidental", accidental.as_str());
    }
    for tie in &note.ties {
        let mut tied = XmlNode::new("tied").attr("target", tie.target.as_str());
        if let Some(side) = tie.side {
            tied = tied.attr("side", side.as_str());
        }
        element.child(tied);
    }
    element
}

fn marking_element(marking: &Marking) -> XmlNode {
    let element = XmlNode::new(microformat::marking_element(marking));
    match marking {
        Marking::Tremolo { marks } => element.attr("marks", marks.to_string()),
        _ => element,
    }
}

fn slur_element(slur: &Slur) -> XmlNode {
    let mut element = XmlNode::new("slur");
    match &slur.kind {
        SlurKind::Incomplete(location) => {
            element = element.attr("location", location.as_str());
        }
        SlurKind::Complete {
            end_event,
            start_note,
            end_note,
        } => {
            element = element.attr("target", end_event.as_str());
            if let Some(note) = start_note {
                element = element.attr("start-note", note.as_str());
            }
            if let Some(note) = end_note {
                element = element.attr("end-note", note.as_str());
            }
        }
    }
    if let Some(side) = slur.side {
        element = element.attr("side", side.as_str());
    }
    element
}
