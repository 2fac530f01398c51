// Session configuration: timeline, voicing options and harmonizer settings.
//
// `SessionConfig` groups the three parameter sets a request needs and loads
// them from JSON. Every field has a default, so a config file only needs to
// name what it changes. The engine itself never reads globals; callers pass
// `VoicingOptions` and `HeuristicSettings` explicitly.
//
// See also: engine.rs (consumes `VoicingOptions`), harmonize.rs (consumes
// `HeuristicSettings`), region.rs (consumes `TimelineSpec`).

use crate::error::HarmonyError;
use serde::{Deserialize, Serialize};

/// Only four-part textures are supported.
pub const SUPPORTED_VOICE_COUNT: u8 = 4;

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// How chord events are laid out in time. Times are in eighth-note ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSpec {
    /// Length of one chord in a progression, in eighth notes.
    pub eighths_per_chord: u32,
    /// Default length of a melody note without an explicit duration.
    pub eighths_per_note: u32,
    pub tempo_bpm: u16,
}

impl Default for TimelineSpec {
    fn default() -> Self {
        TimelineSpec {
            eighths_per_chord: 8,
            eighths_per_note: 8,
            tempo_bpm: 72,
        }
    }
}

// ---------------------------------------------------------------------------
// Voicing
// ---------------------------------------------------------------------------

/// Register and constraint options for the voice-realization engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicingOptions {
    /// Pin the soprano to the melody pitch of melody-locked regions.
    pub use_melody_constraint: bool,
    pub voice_count: u8,
    /// Octave (C4 = 60 convention) around which the upper voices center.
    pub root_octave: i8,
    /// Octave at the bottom of the bass band.
    pub bass_octave: i8,
    /// Lowest pitch any upper voice may take.
    pub upper_min: u8,
    /// Highest pitch any upper voice may take.
    pub upper_max: u8,
}

impl Default for VoicingOptions {
    fn default() -> Self {
        VoicingOptions {
            use_melody_constraint: true,
            voice_count: SUPPORTED_VOICE_COUNT,
            root_octave: 4,
            bass_octave: 2,
            upper_min: 48,
            upper_max: 79,
        }
    }
}

impl VoicingOptions {
    /// Reject configurations the engine cannot realize.
    pub fn validate(&self) -> Result<(), HarmonyError> {
        if self.voice_count != SUPPORTED_VOICE_COUNT {
            return Err(HarmonyError::UnsupportedVoiceCount(self.voice_count));
        }
        if self.upper_max > 127 || self.upper_min as u16 + 12 > self.upper_max as u16 {
            return Err(HarmonyError::InvalidRegister {
                min: self.upper_min,
                max: self.upper_max,
            });
        }
        if !(0..=8).contains(&self.root_octave) || !(0..=8).contains(&self.bass_octave) {
            return Err(HarmonyError::InvalidRegister {
                min: self.upper_min,
                max: self.upper_max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harmonizer
// ---------------------------------------------------------------------------

/// Preferences for the melody harmonizer's chord selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    /// Open on the tonic chord when it fits the first melody note.
    pub prefer_tonic_start: bool,
    /// Keep the previous chord when it also fits the current note.
    pub prefer_continuity: bool,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        HeuristicSettings {
            prefer_tonic_start: true,
            prefer_continuity: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeline: TimelineSpec,
    pub voicing: VoicingOptions,
    pub heuristic: HeuristicSettings,
}

impl SessionConfig {
    /// Parse a config from JSON. Missing fields take their defaults; the
    /// voicing options are validated.
    pub fn from_json(json: &str) -> Result<Self, HarmonyError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.voicing.validate()?;
        if config.timeline.eighths_per_chord == 0 || config.timeline.eighths_per_note == 0 {
            return Err(HarmonyError::InvalidTimeline);
        }
        Ok(config)
    }
}
