//! Notational markings attached to bars, events and notes

use super::duration::Fraction;
use super::pitch::Clef;

/// Time signature with an optional display hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub count: u32,
    pub unit: u32,
    pub display: Option<TimeDisplay>,
}

impl TimeSignature {
    pub fn new(count: u32, unit: u32) -> Self {
        Self { count, unit, display: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDisplay {
    Common,
    Cut,
}

impl TimeDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeDisplay::Common => "common",
            TimeDisplay::Cut => "cut",
        }
    }
}

/// Volta bracket boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ending {
    pub ending_type: EndingType,
    /// Pass numbers; empty for stop/discontinue
    pub numbers: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndingType {
    Start,
    Stop,
    Discontinue,
}

impl EndingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndingType::Start => "start",
            EndingType::Stop => "stop",
            EndingType::Discontinue => "discontinue",
        }
    }
}

/// Clef change at an offset within a bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedClef {
    pub clef: Clef,
    pub position: Fraction,
}

/// Accidental shown on a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Sharp,
    Natural,
    Flat,
    DoubleSharp,
    DoubleFlat,
    NaturalSharp,
    NaturalFlat,
}

impl Accidental {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accidental::Sharp => "sharp",
            Accidental::Natural => "natural",
            Accidental::Flat => "flat",
            Accidental::DoubleSharp => "double-sharp",
            Accidental::DoubleFlat => "double-flat",
            Accidental::NaturalSharp => "natural-sharp",
            Accidental::NaturalFlat => "natural-flat",
        }
    }
}

/// Curve placement for ties and slurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveSide {
    Up,
    Down,
}

impl CurveSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveSide::Up => "up",
            CurveSide::Down => "down",
        }
    }
}

/// Tie from the owning note to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tie {
    /// Id of the note the tie ends on
    pub target: String,
    pub side: Option<CurveSide>,
}

/// Slur starting on the owning event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slur {
    pub kind: SlurKind,
    pub side: Option<CurveSide>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlurKind {
    /// Ends on a different event
    Complete {
        end_event: String,
        /// Set only when the slur is attached to specific chord notes
        start_note: Option<String>,
        end_note: Option<String>,
    },
    /// Starts and ends on the same event
    Incomplete(SlurLocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlurLocation {
    Incoming,
    Outgoing,
}

impl SlurLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlurLocation::Incoming => "incoming",
            SlurLocation::Outgoing => "outgoing",
        }
    }
}

/// Articulation or ornament on an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marking {
    Accent,
    Breath,
    SoftAccent,
    Spiccato,
    Staccato,
    Staccatissimo,
    Stress,
    StrongAccent,
    Tenuto,
    Tremolo { marks: u32 },
    Unstress,
}

impl Marking {
    /// Whether two markings are the same kind, ignoring data
    pub fn same_kind(&self, other: &Marking) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Primary or secondary beam
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Beam {
    /// Ids of beamed events, in order
    pub events: Vec<String>,
    /// Secondary beams nested under this level
    pub children: Vec<Beam>,
    pub hooks: Vec<BeamHook>,
}

/// Partial beam on a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamHook {
    pub event: String,
    pub direction: HookDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDirection {
    /// MusicXML `backward hook`
    Left,
    /// MusicXML `forward hook`
    Right,
}

impl HookDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookDirection::Left => "left",
            HookDirection::Right => "right",
        }
    }
}

/// Octave shift region (8va, 15mb, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ottava {
    pub shift: OttavaType,
    /// Position of the last affected event, `bar:num/den`
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OttavaType {
    /// 8va: sounds an octave above the written notes
    OctaveUp,
    OctaveDown,
    TwoOctavesUp,
    TwoOctavesDown,
    ThreeOctavesUp,
    ThreeOctavesDown,
}

impl OttavaType {
    /// Signed number of octaves the notes sound away from the written pitch
    pub fn octaves(&self) -> i32 {
        match self {
            OttavaType::OctaveUp => 1,
            OttavaType::OctaveDown => -1,
            OttavaType::TwoOctavesUp => 2,
            OttavaType::TwoOctavesDown => -2,
            OttavaType::ThreeOctavesUp => 3,
            OttavaType::ThreeOctavesDown => -3,
        }
    }
}
