//! End-of-measure resolution of slurs, tuplets, beams and octave shifts
//!
//! Runs after every measure part, in this order. The four passes are
//! independent of each other.

use super::{BeamMark, BeamMarker, MeasureContext, MusicXmlReader, OpenBeam, SlurSpan};
use crate::converters::musicxml::errors::{DataError, NotationError, NotationResult};
use crate::models::{
    Beam, BeamHook, HookDirection, Ottava, Score, SequenceDirection, Slur, SlurKind, SlurLocation,
};

impl MusicXmlReader {
    pub(super) fn finalize_measure_part(&mut self, context: &MeasureContext) -> NotationResult<()> {
        self.resolve_slurs();
        self.fold_tuplets()?;
        self.resolve_beams(context)?;
        self.resolve_octave_shifts()
    }

    // ------------------------------------------------------------------
    // Slurs
    // ------------------------------------------------------------------

    fn resolve_slurs(&mut self) {
        let batch = std::mem::take(&mut self.state.complete_slurs);

        for (index, span) in batch.iter().enumerate() {
            let start = &span.start;
            let kind = if start.start_event == span.end_event {
                SlurKind::Incomplete(incomplete_location(start.default_x.as_deref()))
            } else {
                if let Some(end_event) = self.score.event_mut(&span.end_event) {
                    end_event.is_referenced = true;
                }

                let (start_note, end_note) = if targets_notes(&batch, index) {
                    (start.start_note.clone(), span.end_note.clone())
                } else {
                    (None, None)
                };
                for note_id in start_note.iter().chain(end_note.iter()) {
                    if let Some(note) = self.score.note_mut(note_id) {
                        note.is_referenced = true;
                    }
                }

                SlurKind::Complete {
                    end_event: span.end_event.clone(),
                    start_note,
                    end_note,
                }
            };

            if let Some(start_event) = self.score.event_mut(&start.start_event) {
                start_event.slurs.push(Slur {
                    kind,
                    side: start.side,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Tuplets
    // ------------------------------------------------------------------

    fn fold_tuplets(&mut self) -> NotationResult<()> {
        let mut tuplets = std::mem::take(&mut self.state.complete_tuplets);
        // Inner tuplets have fewer members and must be folded first.
        tuplets.sort_by_key(|t| t.members.len());
        for tuplet in tuplets {
            self.score.fold_tuplet(&tuplet.members, tuplet.ratio)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Beams
    // ------------------------------------------------------------------

    fn resolve_beams(&mut self, context: &MeasureContext) -> NotationResult<()> {
        let markers = std::mem::take(&mut self.state.beam_markers);
        let open = self.state.open_beams.entry(context.part_id.clone()).or_default();

        for event in markers {
            let mut ending = Vec::new();

            for (&number, &BeamMark { marker, line }) in &event.markers {
                match marker {
                    BeamMarker::Begin => {
                        if number > 1 && !open.contains_key(&(number - 1)) {
                            let message = format!("<beam number=\"{}\"> begins without an open beam {}.", number, number - 1);
                            return Err(DataError::at_line(line, message).into());
                        }
                        let beam = Beam {
                            events: vec![event.event_id.clone()],
                            ..Beam::default()
                        };
                        if open.insert(number, OpenBeam { beam, bar: context.bar }).is_some() {
                            log::warn!("Beam {} restarted before it ended", number);
                        }
                    }
                    BeamMarker::Continue | BeamMarker::End => match open.get_mut(&number) {
                        Some(current) => {
                            if current.beam.events.last() != Some(&event.event_id) {
                                current.beam.events.push(event.event_id.clone());
                            }
                            if marker == BeamMarker::End {
                                ending.push(number);
                            }
                        }
                        None => log::debug!("Ignoring beam {} {:?} with no open beam", number, marker),
                    },
                    BeamMarker::ForwardHook | BeamMarker::BackwardHook => {
                        let direction = if marker == BeamMarker::ForwardHook {
                            HookDirection::Right
                        } else {
                            HookDirection::Left
                        };
                        match number.checked_sub(1).and_then(|parent| open.get_mut(&parent)) {
                            Some(parent) => parent.beam.hooks.push(BeamHook {
                                event: event.event_id.clone(),
                                direction,
                            }),
                            None => log::debug!("Ignoring beam hook {} with no parent beam", number),
                        }
                    }
                }
            }

            // Close higher numbers first so secondary beams ending on the
            // same event nest into their parent before it closes.
            ending.sort_unstable_by(|a, b| b.cmp(a));
            for number in ending {
                let closed = match open.remove(&number) {
                    Some(closed) => closed,
                    None => continue,
                };
                if number == 1 {
                    attach_root_beam(&mut self.score, &context.part_id, closed)?;
                } else {
                    match open.get_mut(&(number - 1)) {
                        Some(parent) => parent.beam.children.push(closed.beam),
                        None => log::debug!("Dropping beam {} whose parent already ended", number),
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Octave shifts
    // ------------------------------------------------------------------

    fn resolve_octave_shifts(&mut self) -> NotationResult<()> {
        let shifts = std::mem::take(&mut self.state.complete_octave_shifts);
        for shift in shifts {
            let (first, last) = match (shift.members.first(), shift.members.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => continue,
            };
            let end = self
                .score
                .event_position(last)
                .ok_or_else(|| NotationError::Internal(format!("Octave shift end {} not found", last)))?;
            self.score.insert_direction_before(
                first,
                SequenceDirection::Ottava(Ottava {
                    shift: shift.shift,
                    end: end.to_string(),
                }),
            )?;
        }
        Ok(())
    }
}

/// Store a finished primary beam in the bar it began in and mark every
/// event it names as referenced.
fn attach_root_beam(score: &mut Score, part_id: &str, closed: OpenBeam) -> NotationResult<()> {
    let mut ids = Vec::new();
    collect_beam_events(&closed.beam, &mut ids);
    for id in &ids {
        if let Some(event) = score.event_mut(id) {
            event.is_referenced = true;
        }
    }

    let bar_part = score
        .bars
        .get_mut(closed.bar)
        .and_then(|bar| bar.bar_parts.get_mut(part_id))
        .ok_or_else(|| NotationError::Internal(format!("No bar {} for beam in part {}", closed.bar, part_id)))?;
    bar_part.beams.push(closed.beam);
    Ok(())
}

fn collect_beam_events(beam: &Beam, ids: &mut Vec<String>) {
    ids.extend(beam.events.iter().cloned());
    ids.extend(beam.hooks.iter().map(|h| h.event.clone()));
    for child in &beam.children {
        collect_beam_events(child, ids);
    }
}

/// A `default-x` starting with a negative number puts the slur before the note.
fn incomplete_location(default_x: Option<&str>) -> SlurLocation {
    let mut chars = default_x.unwrap_or("").chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) if c.is_ascii_digit() => SlurLocation::Incoming,
        _ => SlurLocation::Outgoing,
    }
}

/// Two slurs in one batch joining the same pair of events must be attached
/// to specific chord notes.
fn targets_notes(batch: &[SlurSpan], index: usize) -> bool {
    let this = &batch[index];
    batch.iter().enumerate().any(|(other_index, other)| {
        other_index != index
            && other.start.start_event == this.start.start_event
            && other.end_event == this.end_event
    })
}
