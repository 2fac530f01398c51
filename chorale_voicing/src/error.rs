// Error type for region building, voicing and configuration.
//
// Parse failures carry the token index and text so the caller can point at
// the offending chord or note. `VoicingInfeasible` reports the region and
// both pitch-class sets so a failed coverage check can be read without
// re-running the engine. An unharmonizable melody note is not an error; the
// harmonizer leaves that step unresolved instead.

use chorale_theory::{NoteParseError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmonyError {
    #[error("chord {index} ('{token}'): {source}")]
    Parse {
        index: usize,
        token: String,
        source: ParseError,
    },

    #[error("melody note {index} ('{token}'): {source}")]
    MelodyParse {
        index: usize,
        token: String,
        source: NoteParseError,
    },

    #[error("melody token {index} ('{token}') has an invalid duration")]
    BadDuration { index: usize, token: String },

    #[error(
        "region {region} cannot be voiced: required pitch classes {required:?}, realized {realized:?}"
    )]
    VoicingInfeasible {
        region: usize,
        required: Vec<u8>,
        realized: Vec<u8>,
    },

    #[error("unsupported voice count {0}; only four voices are supported")]
    UnsupportedVoiceCount(u8),

    #[error("invalid register bounds {min}..={max}; the upper range must span at least an octave")]
    InvalidRegister { min: u8, max: u8 },

    #[error("timeline lengths must be positive and fit the tick range")]
    InvalidTimeline,

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
