// Chord events and the regions the voicing engine walks.
//
// A `ChordRegion` is a span of the eighth-note timeline owning exactly one
// `ChordEvent` plus the melody notes that start inside it. Its index is its
// position in the sequence. The event's melody pitch is the melody note
// sounding at the chord's onset or, when the onset falls in a rest, the
// first note starting inside the region; that is the pitch the soprano is
// locked to.
//
// Regions come from two places: a progression string laid out on a fixed
// grid (`build_regions`), or the harmonizer's chosen steps
// (`regions_from_steps`, in harmonize.rs).

use crate::config::TimelineSpec;
use crate::error::HarmonyError;
use crate::melody::MelodyEvent;
use chorale_theory::{ChordRecipe, ChordTones, Key, chord_symbol, parse_chord_identifier};
use serde::{Deserialize, Serialize};

/// One chord on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub key: Key,
    pub recipe: ChordRecipe,
    /// The identifier as written (or chosen by the harmonizer).
    pub label: String,
    pub start: u32,
    pub melody_pitch: Option<u8>,
}

impl ChordEvent {
    pub fn symbol(&self) -> String {
        chord_symbol(&self.key, &self.recipe)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordRegion {
    pub index: usize,
    pub start: u32,
    /// Exclusive end tick.
    pub end: u32,
    pub event: ChordEvent,
    pub melody: Vec<MelodyEvent>,
}

impl ChordRegion {
    /// Pitch the soprano must sound, if the region is melody-locked.
    pub fn melody_lock(&self) -> Option<u8> {
        self.event.melody_pitch
    }

    pub fn duration(&self) -> u32 {
        self.end - self.start
    }
}

/// Ordered chord tones of an event: root, third, fifth and the seventh when
/// present.
pub fn chord_tone_pitch_classes(event: &ChordEvent) -> ChordTones {
    event.recipe.tones(&event.key)
}

/// The melody note sounding at `tick`, if any.
pub(crate) fn sounding_at(melody: &[MelodyEvent], tick: u32) -> Option<&MelodyEvent> {
    melody
        .iter()
        .find(|m| m.start <= tick && tick - m.start < m.duration)
}

/// Lay a progression out on the timeline, one chord per
/// `eighths_per_chord`, and attach the melody.
///
/// Tokens are whitespace-separated; `|` bar lines are ignored. The first
/// token that fails to parse fails the whole request.
pub fn build_regions(
    progression: &str,
    key: &Key,
    timeline: &TimelineSpec,
    melody: &[MelodyEvent],
) -> Result<Vec<ChordRegion>, HarmonyError> {
    if timeline.eighths_per_chord == 0 {
        return Err(HarmonyError::InvalidTimeline);
    }
    let tokens: Vec<&str> = progression
        .split_whitespace()
        .filter(|t| *t != "|")
        .collect();
    let mut regions = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.into_iter().enumerate() {
        let recipe =
            parse_chord_identifier(key, token).map_err(|source| HarmonyError::Parse {
                index,
                token: token.to_string(),
                source,
            })?;
        let span = u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_mul(timeline.eighths_per_chord))
            .and_then(|start| Some((start, start.checked_add(timeline.eighths_per_chord)?)));
        let Some((start, end)) = span else {
            return Err(HarmonyError::InvalidTimeline);
        };
        let inside: Vec<MelodyEvent> = melody
            .iter()
            .filter(|m| m.start >= start && m.start < end)
            .copied()
            .collect();
        let lock = sounding_at(melody, start)
            .or_else(|| inside.first())
            .map(|m| m.pitch);
        regions.push(ChordRegion {
            index,
            start,
            end,
            event: ChordEvent {
                key: *key,
                recipe,
                label: token.to_string(),
                start,
                melody_pitch: lock,
            },
            melody: inside,
        });
    }
    Ok(regions)
}
