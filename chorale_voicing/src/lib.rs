// Chorale voicing: four-part harmonization and voice leading.
//
// Given a key and either a chord progression (optionally under a melody) or
// a bare melody to harmonize, produces deterministic SATB voicings that
// cover each chord's essential tones, keep the voices uncrossed, lock the
// soprano to the melody and resolve sevenths and augmented fifths in the
// lane that held them.
//
// Architecture:
// - config.rs: Timeline, voicing options, harmonizer settings (JSON-loadable)
// - error.rs: `HarmonyError`
// - melody.rs: Melody text parsing and scale-degree analysis
// - region.rs: Chord events laid out as timeline regions
// - satb.rs: Voice lanes and `VoicedChord`
// - priority.rs: Required / Preferred / Optional chord-tone tiers
// - placement.rs: Register bands and the octave-placement solver
// - allocate.rs: Per-region tone-to-lane allocation
// - tendency.rs: Seventh and augmented-fifth resolution across regions
// - continuity.rs: Motion-minimizing re-arrangement of unpinned lanes
// - engine.rs: `voice_lead_regions`, the single left-to-right sweep
// - diagnostics.rs: `DiagnosticsSink` and its sinks
// - tension.rs: Tension classification of realized voicings
// - candidates.rs: Chord candidates per melody note
// - harmonize.rs: Melody harmonization and regions from chosen steps
// - regression.rs: Regression fixtures and their checks
// - midi.rs / lilypond.rs / export.rs: MIDI, LilyPond and JSON output
//
// Music theory (keys, chord recipes, parsing, spelling) lives in
// `chorale_theory`.

pub mod allocate;
pub mod candidates;
pub mod config;
pub mod continuity;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod export;
pub mod harmonize;
pub mod lilypond;
pub mod melody;
pub mod midi;
pub mod placement;
pub mod priority;
pub mod region;
pub mod regression;
pub mod satb;
pub mod tendency;
pub mod tension;

pub use config::{HeuristicSettings, SessionConfig, TimelineSpec, VoicingOptions};
pub use diagnostics::{CollectingSink, DiagnosticEvent, DiagnosticsSink, LogSink, NoopSink};
pub use engine::voice_lead_regions;
pub use error::HarmonyError;
pub use harmonize::{HarmonizedChordStep, harmonize_melody, regions_from_steps};
pub use melody::{MelodyEvent, parse_melody};
pub use region::{ChordEvent, ChordRegion, build_regions, chord_tone_pitch_classes};
pub use satb::{Lane, VoicedChord};
