// Music-theory primitives shared by the chorale workspace.
//
// Modules:
// - key.rs: `Mode` and `Key` (tonic + mode), degree ↔ pitch-class mapping.
// - chord.rs: `ChordRecipe`, `ChordTones`, qualities, tensions, roles.
// - parse.rs: Roman-numeral and chord-symbol parsing into recipes.
// - pitch.rs: note-name parsing with accidental hints, pitch spelling.
// - symbol.rs: display names (lead-sheet symbols, Roman numerals).
//
// Everything here is pure and deterministic. The voicing engine and the
// harmonizer live in `chorale_voicing`.

pub mod chord;
pub mod key;
pub mod parse;
pub mod pitch;
pub mod symbol;

pub use chord::{
    ChordRecipe, ChordRole, ChordTones, Extension, SeventhQuality, Tension, Tensions,
    TriadQuality, build_chord_pitches, is_augmented_fifth,
};
pub use key::{Key, Mode, degree_pitch_class};
pub use parse::{ParseError, parse_chord_identifier};
pub use pitch::{
    AccidentalHint, NoteParseError, ParsedNote, parse_note, spell_midi, spell_pitch_class,
};
pub use symbol::{chord_symbol, roman_numeral};
