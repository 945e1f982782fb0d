//! Score entity graph
//!
//! The graph is built once by the MusicXML reader and then only read by the
//! emitters. Cross references (ties, slurs, beams) are string ids; the
//! lookups here resolve them by linear scan.

use std::collections::BTreeMap;

use thiserror::Error;

use super::duration::{Fraction, RhythmicDuration, RhythmicPosition, TupletRatio};
use super::notation::{
    Accidental, Beam, Ending, Marking, Ottava, PositionedClef, Slur, Tie, TimeSignature,
};
use super::pitch::{KeySignature, Pitch};

/// Key assumed before any `<key>` is seen
pub const DEFAULT_KEY: KeySignature = KeySignature { fifths: 0 };

/// Structural assumption violated while reshaping the graph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Could not fold items: event {0} not found")]
    EventNotFound(String),

    #[error("Could not fold items: {0}")]
    NotContiguous(String),

    #[error("Could not fold items: empty item list")]
    EmptyFold,
}

// ============================================================================
// SCORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Score {
    pub parts: Vec<Part>,
    pub bars: Vec<Bar>,
}

/// Where an event lives: bar index, part id, sequence index within the BarPart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLocation {
    pub bar: usize,
    pub part_id: String,
    pub sequence: usize,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(&self, part_id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.part_id == part_id)
    }

    pub fn part_mut(&mut self, part_id: &str) -> Option<&mut Part> {
        self.parts.iter_mut().find(|p| p.part_id == part_id)
    }

    /// Every event in the score, bar by bar
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.bars
            .iter()
            .flat_map(|bar| bar.bar_parts.values())
            .flat_map(|bar_part| bar_part.sequences.iter())
            .flat_map(|sequence| sequence.events())
    }

    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut Event> + '_ {
        self.bars
            .iter_mut()
            .flat_map(|bar| bar.bar_parts.values_mut())
            .flat_map(|bar_part| bar_part.sequences.iter_mut())
            .flat_map(|sequence| sequence.events_mut())
    }

    pub fn event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events_mut().find(|e| e.id == event_id)
    }

    pub fn event_containing_note(&self, note_id: &str) -> Option<&Event> {
        self.events().find(|e| e.note(note_id).is_some())
    }

    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.events_mut().find_map(|e| e.note_mut(note_id))
    }

    pub fn locate_event(&self, event_id: &str) -> Option<EventLocation> {
        for bar in &self.bars {
            for (part_id, bar_part) in &bar.bar_parts {
                if let Some(sequence) = bar_part
                    .sequences
                    .iter()
                    .position(|s| s.item_index_of(event_id).is_some())
                {
                    return Some(EventLocation {
                        bar: bar.index,
                        part_id: part_id.clone(),
                        sequence,
                    });
                }
            }
        }
        None
    }

    fn sequence_mut(&mut self, location: &EventLocation) -> Option<&mut Sequence> {
        self.bars
            .get_mut(location.bar)?
            .bar_parts
            .get_mut(&location.part_id)?
            .sequences
            .get_mut(location.sequence)
    }

    /// Bar-relative position of an event
    pub fn event_position(&self, event_id: &str) -> Option<RhythmicPosition> {
        for bar in &self.bars {
            for bar_part in bar.bar_parts.values() {
                for sequence in &bar_part.sequences {
                    let mut offset = Fraction::from_integer(0);
                    let scale = Fraction::from_integer(1);
                    if let Some((fraction, grace_index)) =
                        position_in(&sequence.items, event_id, &mut offset, scale)
                    {
                        return Some(RhythmicPosition {
                            bar: bar.index,
                            fraction,
                            grace_index,
                        });
                    }
                }
            }
        }
        None
    }

    /// Replace the run of items spanning `members` with one Tuplet.
    pub fn fold_tuplet(&mut self, members: &[String], ratio: TupletRatio) -> Result<(), ModelError> {
        let first = members.first().ok_or(ModelError::EmptyFold)?;
        let location = self
            .locate_event(first)
            .ok_or_else(|| ModelError::EventNotFound(first.clone()))?;
        let sequence = self
            .sequence_mut(&location)
            .ok_or_else(|| ModelError::EventNotFound(first.clone()))?;
        sequence.fold_tuplet(members, ratio)
    }

    /// Insert a direction right before the top-level item holding `event_id`.
    pub fn insert_direction_before(
        &mut self,
        event_id: &str,
        direction: SequenceDirection,
    ) -> Result<(), ModelError> {
        let location = self
            .locate_event(event_id)
            .ok_or_else(|| ModelError::EventNotFound(event_id.to_string()))?;
        let sequence = self
            .sequence_mut(&location)
            .ok_or_else(|| ModelError::EventNotFound(event_id.to_string()))?;
        let index = sequence
            .item_index_of(event_id)
            .ok_or_else(|| ModelError::EventNotFound(event_id.to_string()))?;
        sequence.items.insert(index, SequenceItem::Direction(direction));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Effective key/time
    // ------------------------------------------------------------------

    /// Key in force at a bar, looking back to the last bar that set one
    pub fn active_key(&self, bar_index: usize) -> KeySignature {
        self.bars
            .iter()
            .take(bar_index + 1)
            .rev()
            .find_map(|bar| bar.key)
            .unwrap_or(DEFAULT_KEY)
    }

    /// Bar 0 is compared against [`DEFAULT_KEY`], so an explicit C major
    /// opening key is not a change.
    pub fn key_changed(&self, bar_index: usize) -> bool {
        let previous = match bar_index {
            0 => DEFAULT_KEY,
            _ => self.active_key(bar_index - 1),
        };
        previous != self.active_key(bar_index)
    }

    pub fn active_time(&self, bar_index: usize) -> Option<TimeSignature> {
        self.bars
            .iter()
            .take(bar_index + 1)
            .rev()
            .find_map(|bar| bar.time)
    }

    pub fn time_changed(&self, bar_index: usize) -> bool {
        bar_index == 0 || self.active_time(bar_index - 1) != self.active_time(bar_index)
    }
}

fn position_in(
    items: &[SequenceItem],
    event_id: &str,
    offset: &mut Fraction,
    scale: Fraction,
) -> Option<(Fraction, Option<usize>)> {
    for item in items {
        match item {
            SequenceItem::Event(event) => {
                if event.id == event_id {
                    return Some((*offset, None));
                }
                *offset += event.duration.value() * scale;
            }
            SequenceItem::Tuplet(tuplet) => {
                let inner_scale = scale * tuplet.ratio.scale();
                if let Some(found) = position_in(&tuplet.items, event_id, offset, inner_scale) {
                    return Some(found);
                }
            }
            SequenceItem::Grace(group) => {
                if let Some(index) = group.events.iter().position(|e| e.id == event_id) {
                    return Some((*offset, Some(index)));
                }
            }
            SequenceItem::Direction(_) => {}
        }
    }
    None
}

// ============================================================================
// PARTS AND BARS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub part_id: String,
    pub name: Option<String>,
    /// Semitones from written to concert pitch
    pub transpose: i32,
}

impl Part {
    pub fn new(part_id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            part_id: part_id.into(),
            name,
            transpose: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bar {
    /// Zero-based index of this bar in the score
    pub index: usize,
    pub time: Option<TimeSignature>,
    /// In concert pitch
    pub key: Option<KeySignature>,
    pub repeat_start: bool,
    /// 0 = no repeat, 2 = plain repeat, more = play N times
    pub repeat_end: u32,
    pub start_ending: Option<Ending>,
    pub stop_ending: Option<Ending>,
    pub bar_parts: BTreeMap<String, BarPart>,
}

impl Bar {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BarPart {
    pub sequences: Vec<Sequence>,
    pub clefs: Vec<PositionedClef>,
    /// Beams that begin in this bar
    pub beams: Vec<Beam>,
}

impl BarPart {
    pub fn sequence_or_create(&mut self, voice: &str) -> &mut Sequence {
        let index = match self.sequences.iter().position(|s| s.voice == voice) {
            Some(index) => index,
            None => {
                self.sequences.push(Sequence::new(voice));
                self.sequences.len() - 1
            }
        };
        &mut self.sequences[index]
    }
}

// ============================================================================
// SEQUENCES
// ============================================================================

/// One voice within a BarPart
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    /// Unique within the BarPart; empty when the voice is unspecified
    pub voice: String,
    pub items: Vec<SequenceItem>,
}

impl Sequence {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            items: Vec::new(),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.items.iter().flat_map(|item| item.events())
    }

    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut Event> + '_ {
        self.items.iter_mut().flat_map(|item| item.events_mut())
    }

    /// Last top-level event (chord notes merge into it)
    pub fn last_event_mut(&mut self) -> Option<&mut Event> {
        self.items.iter_mut().rev().find_map(|item| match item {
            SequenceItem::Event(event) => Some(event),
            _ => None,
        })
    }

    /// Index of the top-level item that is or contains the event
    pub fn item_index_of(&self, event_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.contains_event(event_id))
    }

    /// Replace the contiguous items spanning `members` with a Tuplet.
    pub fn fold_tuplet(&mut self, members: &[String], ratio: TupletRatio) -> Result<(), ModelError> {
        let (first, last) = match (members.first(), members.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ModelError::EmptyFold),
        };
        let start = self
            .item_index_of(first)
            .ok_or_else(|| ModelError::EventNotFound(first.clone()))?;
        let end = self
            .item_index_of(last)
            .ok_or_else(|| ModelError::EventNotFound(last.clone()))?;
        if end < start {
            return Err(ModelError::NotContiguous(format!(
                "{} comes after {} in voice '{}'",
                first, last, self.voice
            )));
        }
        for member in members {
            match self.item_index_of(member) {
                Some(index) if (start..=end).contains(&index) => {}
                _ => {
                    return Err(ModelError::NotContiguous(format!(
                        "{} is outside the run {}..{} in voice '{}'",
                        member, first, last, self.voice
                    )))
                }
            }
        }

        let folded: Vec<SequenceItem> = self.items.drain(start..=end).collect();
        self.items.insert(
            start,
            SequenceItem::Tuplet(Tuplet {
                ratio,
                items: folded,
            }),
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum SequenceItem {
    Event(Event),
    Tuplet(Tuplet),
    Grace(GraceNoteGroup),
    Direction(SequenceDirection),
}

impl SequenceItem {
    pub fn events(&self) -> Box<dyn Iterator<Item = &Event> + '_> {
        match self {
            SequenceItem::Event(event) => Box::new(std::iter::once(event)),
            SequenceItem::Tuplet(tuplet) => Box::new(tuplet.items.iter().flat_map(|i| i.events())),
            SequenceItem::Grace(group) => Box::new(group.events.iter()),
            SequenceItem::Direction(_) => Box::new(std::iter::empty()),
        }
    }

    pub fn events_mut(&mut self) -> Box<dyn Iterator<Item = &mut Event> + '_> {
        match self {
            SequenceItem::Event(event) => Box::new(std::iter::once(event)),
            SequenceItem::Tuplet(tuplet) => {
                Box::new(tuplet.items.iter_mut().flat_map(|i| i.events_mut()))
            }
            SequenceItem::Grace(group) => Box::new(group.events.iter_mut()),
            SequenceItem::Direction(_) => Box::new(std::iter::empty()),
        }
    }

    pub fn contains_event(&self, event_id: &str) -> bool {
        self.events().any(|e| e.id == event_id)
    }
}

/// Ratio-scaled group of items
#[derive(Debug, Clone)]
pub struct Tuplet {
    pub ratio: TupletRatio,
    pub items: Vec<SequenceItem>,
}

/// Consecutive grace events; takes no time
#[derive(Debug, Clone, Default)]
pub struct GraceNoteGroup {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub enum SequenceDirection {
    Ottava(Ottava),
}

// ============================================================================
// EVENTS
// ============================================================================

/// A rest, a single note or a chord
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub duration: RhythmicDuration,
    pub items: Vec<EventItem>,
    /// Slurs starting here
    pub slurs: Vec<Slur>,
    pub markings: Vec<Marking>,
    /// Set when a slur or beam refers to this event's id
    pub is_referenced: bool,
}

impl Event {
    pub fn new(id: impl Into<String>, duration: RhythmicDuration) -> Self {
        Self {
            id: id.into(),
            duration,
            items: Vec::new(),
            slurs: Vec::new(),
            markings: Vec::new(),
            is_referenced: false,
        }
    }

    /// True when the event holds only rests
    pub fn is_rest(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| matches!(i, EventItem::Rest))
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> + '_ {
        self.items.iter().filter_map(|item| match item {
            EventItem::Note(note) => Some(note),
            EventItem::Rest => None,
        })
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes().find(|n| n.id == note_id)
    }

    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.items.iter_mut().find_map(|item| match item {
            EventItem::Note(note) if note.id == note_id => Some(note),
            _ => None,
        })
    }

    /// Add a marking unless one of the same kind is already present
    pub fn add_marking(&mut self, marking: Marking) {
        if !self.markings.iter().any(|m| m.same_kind(&marking)) {
            self.markings.push(marking);
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventItem {
    Note(Note),
    Rest,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub id: String,
    pub pitch: Pitch,
    /// Accidental explicitly rendered in the source
    pub accidental: Option<Accidental>,
    /// Ties starting on this note
    pub ties: Vec<Tie>,
    /// Set when a tie or slur refers to this note's id
    pub is_referenced: bool,
}

impl Note {
    pub fn new(id: impl Into<String>, pitch: Pitch) -> Self {
        Self {
            id: id.into(),
            pitch,
            accidental: None,
            ties: Vec::new(),
            is_referenced: false,
        }
    }
}
