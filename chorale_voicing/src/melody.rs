// Melody text parsing and scale-degree analysis.
//
// Melody text is a whitespace-separated list of `NOTE[:eighths]` tokens
// ("E4", "F#5:4", "Bb3:2", "Bn3"); `_` or `r` (optionally `r:4`) is a rest.
// Notes without a length take the timeline's default note length. Times are
// eighth-note ticks from the start of the piece.
//
// Analysis maps a pitch to its best-fit scale degree in the key. Diatonic
// pitches map directly. Chromatic pitches are read as an altered neighbor
// degree, with the written accidental choosing the direction: a sharp raises
// the degree below, a flat lowers the degree above, and an explicit natural
// raises in flat keys and lowers in sharp keys.

use crate::config::TimelineSpec;
use crate::error::HarmonyError;
use chorale_theory::{AccidentalHint, Key, parse_note};
use serde::{Deserialize, Serialize};

/// A sounding melody note on the eighth-note timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyEvent {
    pub pitch: u8,
    pub hint: AccidentalHint,
    pub start: u32,
    pub duration: u32,
}

impl MelodyEvent {
    /// Exclusive end tick.
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }
}

/// Direction a chromatic note alters its degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alteration {
    Raised,
    Lowered,
}

/// Scale-degree reading of one melody pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyAnalysis {
    pub pitch: u8,
    pub pitch_class: u8,
    /// 1-based degree the pitch is read as (altered by `offset`).
    pub degree: u8,
    pub is_diatonic: bool,
    /// Semitones from the degree's diatonic pitch class; 0 when diatonic.
    pub offset: i8,
    pub hint: AccidentalHint,
}

impl MelodyAnalysis {
    /// Semitones above the tonic.
    pub fn interval_from_tonic(&self, key: &Key) -> u8 {
        (self.pitch_class + 12 - key.tonic) % 12
    }
}

/// Parse melody text into timed events. Rests advance time only.
pub fn parse_melody(text: &str, timeline: &TimelineSpec) -> Result<Vec<MelodyEvent>, HarmonyError> {
    let mut events = Vec::new();
    let mut time = 0u32;
    for (index, token) in text.split_whitespace().enumerate() {
        let (name, length) = match token.split_once(':') {
            Some((name, len)) => {
                let len: u32 = len.parse().map_err(|_| HarmonyError::BadDuration {
                    index,
                    token: token.to_string(),
                })?;
                if len == 0 {
                    return Err(HarmonyError::BadDuration {
                        index,
                        token: token.to_string(),
                    });
                }
                (name, len)
            }
            None => (token, timeline.eighths_per_note),
        };
        let next = time
            .checked_add(length)
            .ok_or_else(|| HarmonyError::BadDuration {
                index,
                token: token.to_string(),
            })?;
        if matches!(name, "_" | "r" | "R") {
            time = next;
            continue;
        }
        let note = parse_note(name).map_err(|source| HarmonyError::MelodyParse {
            index,
            token: token.to_string(),
            source,
        })?;
        events.push(MelodyEvent {
            pitch: note.pitch,
            hint: note.hint,
            start: time,
            duration: length,
        });
        time = next;
    }
    Ok(events)
}

/// Direction a chromatic pitch is read in, if the hint gives one.
pub fn alteration(key: &Key, hint: AccidentalHint) -> Option<Alteration> {
    match hint {
        AccidentalHint::None => None,
        AccidentalHint::Sharp => Some(Alteration::Raised),
        AccidentalHint::Flat => Some(Alteration::Lowered),
        AccidentalHint::Natural => Some(if key.uses_flats() {
            Alteration::Raised
        } else {
            Alteration::Lowered
        }),
    }
}

/// Read `pitch` as a (possibly altered) degree of `key`.
pub fn analyze_note(key: &Key, pitch: u8, hint: AccidentalHint) -> MelodyAnalysis {
    let pc = pitch % 12;
    let mut analysis = MelodyAnalysis {
        pitch,
        pitch_class: pc,
        degree: 1,
        is_diatonic: false,
        offset: 0,
        hint,
    };
    if let Some(degree) = key.scale_degree(pc) {
        analysis.degree = degree;
        analysis.is_diatonic = true;
        return analysis;
    }
    let raised = key.scale_degree((pc + 11) % 12).map(|d| (d, 1));
    let lowered = key.scale_degree((pc + 1) % 12).map(|d| (d, -1));
    let reading = match alteration(key, hint) {
        Some(Alteration::Lowered) => lowered.or(raised),
        Some(Alteration::Raised) | None => raised.or(lowered),
    };
    if let Some((degree, offset)) = reading {
        analysis.degree = degree;
        analysis.offset = offset;
    }
    analysis
}

/// Analyze every event of a melody.
pub fn analyze_melody(key: &Key, melody: &[MelodyEvent]) -> Vec<MelodyAnalysis> {
    melody
        .iter()
        .map(|e| analyze_note(key, e.pitch, e.hint))
        .collect()
}
