//! Unit tests for the MusicXML reader

use super::*;
use crate::converters::musicxml::document::{parse_xml, to_timewise};
use crate::converters::musicxml::errors::NotationError;
use crate::models::{
    Event, Fraction, HookDirection, KeySignature, Note, OttavaType, SequenceDirection, SequenceItem,
    SlurKind, SlurLocation, Step, TimeDisplay,
};

fn read_score(musicxml: &str) -> NotationResult<Score> {
    let doc = parse_xml(musicxml)?;
    let timewise = to_timewise(&doc)?;
    MusicXmlReader::new().read(&timewise)
}

/// One-part partwise document; `measures` starts on line 7.
fn single_part(measures: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Music</part-name></score-part>
  </part-list>
  <part id="P1">
{}
  </part>
</score-partwise>"#,
        measures
    )
}

fn items(score: &Score, bar: usize) -> &[SequenceItem] {
    &score.bars[bar].bar_parts["P1"].sequences[0].items
}

fn event_at(score: &Score, bar: usize, index: usize) -> &Event {
    match &items(score, bar)[index] {
        SequenceItem::Event(event) => event,
        other => panic!("Expected event, got {:?}", other),
    }
}

fn first_note(event: &Event) -> &Note {
    event.notes().next().expect("event has no notes")
}

fn data_error(result: NotationResult<Score>) -> DataError {
    match result {
        Err(NotationError::Data(err)) => err,
        Err(other) => panic!("Expected data error, got {:?}", other),
        Ok(_) => panic!("Expected data error, got a score"),
    }
}

#[test]
fn test_read_single_quarter_note() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes>
        <divisions>1</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <voice>1</voice>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(score.parts.len(), 1);
    assert_eq!(score.parts[0].name.as_deref(), Some("Music"));
    assert_eq!(score.bars.len(), 1);
    assert_eq!(score.bars[0].key, Some(KeySignature::new(0)));
    assert_eq!(score.bars[0].time.map(|t| (t.count, t.unit)), Some((4, 4)));

    let bar_part = &score.bars[0].bar_parts["P1"];
    assert_eq!(bar_part.sequences.len(), 1);
    assert_eq!(bar_part.sequences[0].voice, "1");
    assert_eq!(bar_part.clefs.len(), 1);
    assert_eq!(bar_part.clefs[0].clef.staff_position, -2);
    assert_eq!(bar_part.clefs[0].position, Fraction::from_integer(0));

    let event = event_at(&score, 0, 0);
    assert_eq!(event.duration.fraction, Fraction::new(1, 4));
    assert_eq!(event.duration.dots, 0);
    assert!(!event.is_referenced);
    assert!(event.slurs.is_empty());

    let note = first_note(event);
    assert_eq!(note.pitch.step, Step::C);
    assert_eq!(note.pitch.octave, 4);
    assert_eq!(note.pitch.alter, 0);
    assert!(!note.is_referenced);
}

#[test]
fn test_duration_falls_back_to_divisions() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note>
        <pitch><step>A</step><alter>-1</alter><octave>3</octave></pitch>
        <duration>3</duration>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let event = event_at(&score, 0, 0);
    assert_eq!(event.duration.fraction, Fraction::new(3, 8));
    assert_eq!(first_note(event).pitch.alter, -1);
}

#[test]
fn test_tied_notes_reference_their_target() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="start" orientation="under"/></notations>
      </note>
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="stop"/></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let first = first_note(event_at(&score, 0, 0));
    let second = first_note(event_at(&score, 0, 1));

    assert_eq!(first.ties.len(), 1);
    assert_eq!(first.ties[0].target, second.id);
    assert_eq!(first.ties[0].side, Some(crate::models::CurveSide::Down));
    assert!(second.is_referenced);
    assert!(!first.is_referenced);
}

#[test]
fn test_tie_stop_ignores_other_pitches() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="start"/></notations>
      </note>
      <note>
        <pitch><step>F</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="stop"/></notations>
      </note>
    </measure>
    <measure number="2">
      <note>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="stop"/></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let start = first_note(event_at(&score, 0, 0));
    let wrong_pitch = first_note(event_at(&score, 0, 1));
    let end = first_note(event_at(&score, 1, 0));

    assert_eq!(start.ties.len(), 1);
    assert_eq!(start.ties[0].target, end.id);
    assert!(!wrong_pitch.is_referenced);
    assert!(end.is_referenced);
}

#[test]
fn test_tie_continue_chains_notes() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>G</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="start"/></notations>
      </note>
      <note>
        <pitch><step>G</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="continue"/></notations>
      </note>
      <note>
        <pitch><step>G</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><tied type="stop"/></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let notes: Vec<&Note> = (0..3).map(|i| first_note(event_at(&score, 0, i))).collect();
    assert_eq!(notes[0].ties[0].target, notes[1].id);
    assert_eq!(notes[1].ties[0].target, notes[2].id);
    assert!(notes[2].ties.is_empty());
}

#[test]
fn test_chord_notes_share_one_event() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><articulations><staccato/></articulations></notations>
      </note>
      <note>
        <chord/>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><articulations><staccato/><accent/></articulations></notations>
      </note>
      <note>
        <pitch><step>G</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(items(&score, 0).len(), 2);

    let chord = event_at(&score, 0, 0);
    assert_eq!(chord.notes().count(), 2);
    assert_eq!(chord.markings, vec![crate::models::Marking::Staccato, crate::models::Marking::Accent]);

    // The chord member does not advance the cursor.
    let position = score.event_position(&event_at(&score, 0, 1).id).unwrap();
    assert_eq!(position.fraction, Fraction::new(1, 4));
}

#[test]
fn test_chord_duration_mismatch_is_a_data_error() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <note>
        <chord/>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>half</type>
      </note>
    </measure>"#,
    );

    let err = data_error(read_score(&musicxml));
    assert!(err.message.contains("different durations"));
    assert_eq!(err.line, Some(13));
}

#[test]
fn test_missing_pitch_reports_line() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <duration>1</duration>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let err = data_error(read_score(&musicxml));
    assert_eq!(err.message, "Got a <note> without <pitch>.");
    assert_eq!(err.line, Some(8));
    assert_eq!(err.to_string(), "Got a <note> without <pitch>. (line 8)");
}

#[test]
fn test_triplet_is_folded() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes><divisions>3</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
        <notations><tuplet type="start" bracket="yes"/></notations>
      </note>
      <note>
        <pitch><step>D</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
      </note>
      <note>
        <pitch><step>E</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
        <notations><tuplet type="stop"/></notations>
      </note>
      <note>
        <pitch><step>F</step><octave>5</octave></pitch>
        <duration>3</duration>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let sequence = items(&score, 0);
    assert_eq!(sequence.len(), 2);

    match &sequence[0] {
        SequenceItem::Tuplet(tuplet) => {
            assert_eq!(tuplet.items.len(), 3);
            assert_eq!(tuplet.ratio.inner(), (3, 8));
            assert_eq!(tuplet.ratio.outer(), (2, 8));
        }
        other => panic!("Expected tuplet, got {:?}", other),
    }

    let last = event_at(&score, 0, 1);
    assert_eq!(score.event_position(&last.id).unwrap().fraction, Fraction::new(1, 4));
}

#[test]
fn test_slurs() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="stop" number="2"/></notations>
      </note>
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="start" number="1" placement="above"/></notations>
      </note>
      <note>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="stop" number="1"/></notations>
      </note>
      <note>
        <pitch><step>F</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations>
          <slur type="start" number="1" default-x="-12"/>
          <slur type="stop" number="1"/>
        </notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();

    // Unmatched stop is dropped.
    assert!(event_at(&score, 0, 0).slurs.is_empty());

    let start = event_at(&score, 0, 1);
    let end = event_at(&score, 0, 2);
    assert_eq!(start.slurs.len(), 1);
    assert_eq!(
        start.slurs[0].kind,
        SlurKind::Complete {
            end_event: end.id.clone(),
            start_note: None,
            end_note: None,
        }
    );
    assert_eq!(start.slurs[0].side, Some(crate::models::CurveSide::Up));
    assert!(end.is_referenced);

    let incomplete = event_at(&score, 0, 3);
    assert_eq!(incomplete.slurs[0].kind, SlurKind::Incomplete(SlurLocation::Incoming));
    assert!(!incomplete.is_referenced);
}

#[test]
fn test_parallel_slurs_between_chords_target_notes() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="start" number="1" placement="below"/></notations>
      </note>
      <note>
        <chord/>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="start" number="2" placement="above"/></notations>
      </note>
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="stop" number="1"/></notations>
      </note>
      <note>
        <chord/>
        <pitch><step>F</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="stop" number="2"/></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let start = event_at(&score, 0, 0);
    let end = event_at(&score, 0, 1);
    let start_notes: Vec<&Note> = start.notes().collect();
    let end_notes: Vec<&Note> = end.notes().collect();
    assert_eq!(start_notes.len(), 2);
    assert_eq!(end_notes.len(), 2);

    assert_eq!(start.slurs.len(), 2);
    for (slur, (from, to)) in start.slurs.iter().zip(start_notes.iter().zip(end_notes.iter())) {
        assert_eq!(
            slur.kind,
            SlurKind::Complete {
                end_event: end.id.clone(),
                start_note: Some(from.id.clone()),
                end_note: Some(to.id.clone()),
            }
        );
    }
    assert!(end.is_referenced);
    assert!(start_notes.iter().chain(end_notes.iter()).all(|note| note.is_referenced));
}

#[test]
fn test_single_slur_between_chords_targets_events() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="start" number="1"/></notations>
      </note>
      <note>
        <chord/>
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><slur type="stop" number="1"/></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let start = event_at(&score, 0, 0);
    assert_eq!(
        start.slurs[0].kind,
        SlurKind::Complete {
            end_event: event_at(&score, 0, 1).id.clone(),
            start_note: None,
            end_note: None,
        }
    );
    assert!(start.notes().all(|note| !note.is_referenced));
}

#[test]
fn test_secondary_beams_and_hooks() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes><divisions>4</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>16th</type>
        <beam number="1">begin</beam>
        <beam number="2">begin</beam>
      </note>
      <note>
        <pitch><step>D</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>16th</type>
        <beam number="1">continue</beam>
        <beam number="2">end</beam>
      </note>
      <note>
        <pitch><step>E</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>16th</type>
        <beam number="1">continue</beam>
        <beam number="2">backward hook</beam>
      </note>
      <note>
        <pitch><step>F</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>16th</type>
        <beam number="1">end</beam>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let bar_part = &score.bars[0].bar_parts["P1"];
    assert_eq!(bar_part.beams.len(), 1);

    let ids: Vec<String> = (0..4).map(|i| event_at(&score, 0, i).id.clone()).collect();
    let beam = &bar_part.beams[0];
    assert_eq!(beam.events, ids);
    assert_eq!(beam.children.len(), 1);
    assert_eq!(beam.children[0].events, ids[..2].to_vec());
    assert_eq!(beam.hooks.len(), 1);
    assert_eq!(beam.hooks[0].event, ids[2]);
    assert_eq!(beam.hooks[0].direction, HookDirection::Left);

    for index in 0..4 {
        assert!(event_at(&score, 0, index).is_referenced);
    }
}

#[test]
fn test_beam_spanning_barline_stays_in_first_bar() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <beam number="1">begin</beam>
      </note>
    </measure>
    <measure number="2">
      <note>
        <pitch><step>D</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <beam number="1">end</beam>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(score.bars[0].bar_parts["P1"].beams.len(), 1);
    assert!(score.bars[1].bar_parts["P1"].beams.is_empty());
    assert_eq!(score.bars[0].bar_parts["P1"].beams[0].events.len(), 2);
}

#[test]
fn test_secondary_beam_without_parent_is_a_data_error() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>16th</type>
        <beam number="2">begin</beam>
      </note>
    </measure>"#,
    );

    let err = data_error(read_score(&musicxml));
    assert!(err.message.contains("without an open beam 1"));
    assert!(!err.message.contains("event"));
    assert_eq!(err.line, Some(12));
}

#[test]
fn test_octave_shift_becomes_ottava() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <direction>
        <direction-type><octave-shift type="down" size="8" number="1"/></direction-type>
      </direction>
      <note>
        <pitch><step>C</step><octave>6</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <note>
        <pitch><step>D</step><octave>6</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <direction>
        <direction-type><octave-shift type="stop" size="8" number="1"/></direction-type>
      </direction>
      <note>
        <pitch><step>E</step><octave>6</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let sequence = items(&score, 0);
    assert_eq!(sequence.len(), 4);
    match &sequence[0] {
        SequenceItem::Direction(SequenceDirection::Ottava(ottava)) => {
            assert_eq!(ottava.shift, OttavaType::OctaveUp);
            assert_eq!(ottava.end, "1:1/4");
        }
        other => panic!("Expected ottava, got {:?}", other),
    }
}

#[test]
fn test_nested_octave_shift_is_ignored() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <direction>
        <direction-type><octave-shift type="up" size="8"/></direction-type>
      </direction>
      <direction>
        <direction-type><octave-shift type="up" size="15"/></direction-type>
      </direction>
      <note>
        <pitch><step>C</step><octave>3</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <direction>
        <direction-type><octave-shift type="stop"/></direction-type>
      </direction>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let ottavas: Vec<OttavaType> = items(&score, 0)
        .iter()
        .filter_map(|item| match item {
            SequenceItem::Direction(SequenceDirection::Ottava(ottava)) => Some(ottava.shift),
            _ => None,
        })
        .collect();
    assert_eq!(ottavas, vec![OttavaType::OctaveDown]);
}

#[test]
fn test_grace_notes_are_grouped() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <grace slash="yes"/>
        <pitch><step>B</step><octave>4</octave></pitch>
        <type>16th</type>
      </note>
      <note>
        <grace/>
        <pitch><step>C</step><octave>5</octave></pitch>
        <type>16th</type>
      </note>
      <note>
        <pitch><step>D</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let sequence = items(&score, 0);
    assert_eq!(sequence.len(), 2);
    match &sequence[0] {
        SequenceItem::Grace(group) => assert_eq!(group.events.len(), 2),
        other => panic!("Expected grace group, got {:?}", other),
    }

    let main = event_at(&score, 0, 1);
    let position = score.event_position(&main.id).unwrap();
    assert_eq!(position.fraction, Fraction::from_integer(0));
    assert_eq!(position.grace_index, None);
}

#[test]
fn test_voices_and_mid_measure_clef() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note>
        <pitch><step>E</step><octave>5</octave></pitch>
        <duration>2</duration>
        <voice>1</voice>
        <type>quarter</type>
      </note>
      <attributes>
        <clef><sign>F</sign><line>4</line></clef>
      </attributes>
      <backup><duration>2</duration></backup>
      <note>
        <pitch><step>C</step><octave>3</octave></pitch>
        <duration>2</duration>
        <voice>2</voice>
        <type>quarter</type>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    let bar_part = &score.bars[0].bar_parts["P1"];
    let voices: Vec<&str> = bar_part.sequences.iter().map(|s| s.voice.as_str()).collect();
    assert_eq!(voices, vec!["1", "2"]);

    assert_eq!(bar_part.clefs.len(), 1);
    assert_eq!(bar_part.clefs[0].clef.sign, "F");
    assert_eq!(bar_part.clefs[0].position, Fraction::new(1, 4));
}

#[test]
fn test_transposed_key_is_stored_in_concert_pitch() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <attributes>
        <divisions>1</divisions>
        <key><fifths>2</fifths></key>
        <time symbol="common"><beats>4</beats><beat-type>4</beat-type></time>
        <transpose><diatonic>-1</diatonic><chromatic>-2</chromatic></transpose>
      </attributes>
    </measure>
    <measure number="2">
      <attributes><key><fifths>2</fifths></key></attributes>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(score.parts[0].transpose, -2);
    assert_eq!(score.bars[0].key, Some(KeySignature::new(0)));
    assert_eq!(score.bars[0].time.and_then(|t| t.display), Some(TimeDisplay::Common));
    // Concert C major in the first bar is the default key, not a change.
    assert!(!score.key_changed(0));
    assert!(!score.key_changed(1));
}

#[test]
fn test_repeats_and_endings() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <barline location="left">
        <ending number="1, 2" type="start"/>
        <repeat direction="forward"/>
      </barline>
    </measure>
    <measure number="2">
      <barline location="right">
        <ending number="1" type="stop"/>
        <repeat direction="backward" times="3"/>
      </barline>
    </measure>
    <measure number="3">
      <barline location="right">
        <repeat direction="backward"/>
      </barline>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert!(score.bars[0].repeat_start);
    assert_eq!(score.bars[0].start_ending.as_ref().map(|e| e.numbers.clone()), Some(vec![1, 2]));
    assert_eq!(
        score.bars[1].stop_ending.as_ref().map(|e| e.ending_type),
        Some(crate::models::EndingType::Stop)
    );
    assert_eq!(score.bars[1].repeat_end, 3);
    assert_eq!(score.bars[2].repeat_end, 2);
}

#[test]
fn test_repeat_without_direction_is_a_data_error() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <barline><repeat/></barline>
    </measure>"#,
    );

    let err = data_error(read_score(&musicxml));
    assert_eq!(err.line, Some(8));
}

#[test]
fn test_parts_match_by_position_when_ids_differ() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Flute</part-name></score-part>
    <part-group type="start" number="1"/>
    <score-part id="P2"><part-name>Oboe</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <note><rest/><duration>4</duration><type>whole</type></note>
    </measure>
  </part>
  <part id="renamed">
    <measure number="1">
      <note><rest/><duration>4</duration><type>whole</type></note>
    </measure>
  </part>
</score-partwise>"#;

    let score = read_score(musicxml).unwrap();
    assert_eq!(score.parts.len(), 2);
    assert_eq!(score.bars[0].bar_parts["P2"].sequences.len(), 1);
    let rest = score.bars[0].bar_parts["P2"].sequences[0].events().next().unwrap();
    assert!(rest.is_rest());
}

#[test]
fn test_unmatched_part_is_a_data_error() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"/>
  </part-list>
  <part id="P1"><measure number="1"/></part>
  <part id="P9"><measure number="1"/></part>
</score-partwise>"#;

    let err = data_error(read_score(musicxml));
    assert!(err.message.contains("P9"));
}

#[test]
fn test_absent_part_gets_empty_bar_part() {
    let musicxml = r#"<?xml version="1.0"?>
<score-timewise version="3.1">
  <part-list>
    <score-part id="P1"/>
    <score-part id="P2"/>
  </part-list>
  <measure number="1">
    <part id="P1">
      <note><rest/><duration>1</duration><type>quarter</type></note>
    </part>
  </measure>
</score-timewise>"#;

    let score = read_score(musicxml).unwrap();
    assert!(score.bars[0].bar_parts["P2"].sequences.is_empty());
    assert_eq!(score.bars[0].bar_parts["P1"].sequences.len(), 1);
}

#[test]
fn test_tremolo_marks() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>A</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><ornaments><tremolo type="single"/></ornaments></notations>
      </note>
      <note>
        <pitch><step>A</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <notations><ornaments><tremolo type="start">2</tremolo></ornaments></notations>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(
        event_at(&score, 0, 0).markings,
        vec![crate::models::Marking::Tremolo { marks: 3 }]
    );
    assert!(event_at(&score, 0, 1).markings.is_empty());
}

#[test]
fn test_too_many_dots_is_a_data_error() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <dot/>
        <dot/>
        <dot/>
        <dot/>
        <dot/>
      </note>
    </measure>"#,
    );

    let err = data_error(read_score(&musicxml));
    assert!(err.message.contains("<dot>"));
    assert_eq!(err.line, Some(16));
}

#[test]
fn test_four_dots_are_accepted() {
    let musicxml = single_part(
        r#"    <measure number="1">
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <dot/>
        <dot/>
        <dot/>
        <dot/>
      </note>
    </measure>"#,
    );

    let score = read_score(&musicxml).unwrap();
    assert_eq!(event_at(&score, 0, 0).duration.dots, 4);
}
