// Note names, spelling hints and pitch formatting.
//
// Melody text arrives as note names ("E4", "Bb3", "F#5", "Bn3"). Parsing a
// name yields the MIDI pitch plus an `AccidentalHint` recording how the note
// was written; the harmonizer uses the hint to tell enharmonic readings
// apart (Db vs C#). Spelling goes the other way, for display only: pitch
// classes are named from the key's side of the circle of fifths, and chord
// roots are named from their scale degree's letter plus accidentals so that
// bII in C prints as Db rather than C#.
//
// MIDI convention: C4 = 60, so octave n starts at 12 * (n + 1).

use crate::key::Key;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Natural pitch classes of the letters C through B.
const LETTER_PCS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// How a melody note was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccidentalHint {
    /// No accidental written.
    #[default]
    None,
    /// Explicit natural sign.
    Natural,
    Sharp,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteParseError {
    #[error("empty note name")]
    Empty,
    #[error("'{0}' does not start with a note letter A-G")]
    BadLetter(String),
    #[error("'{0}' is missing an octave number")]
    MissingOctave(String),
    #[error("'{0}' has an invalid octave")]
    BadOctave(String),
    #[error("'{0}' is outside the MIDI range")]
    OutOfRange(String),
}

/// A parsed note name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNote {
    pub pitch: u8,
    pub hint: AccidentalHint,
}

/// Index of a letter in C..B, case-insensitive.
pub fn letter_index(c: char) -> Option<usize> {
    LETTERS.iter().position(|&l| l == c.to_ascii_uppercase())
}

/// Natural pitch class of a letter index.
pub fn letter_pitch_class(index: usize) -> u8 {
    LETTER_PCS[index % 7]
}

/// Consume leading accidentals. Returns (semitone shift, hint, bytes used).
pub fn read_accidentals(s: &str) -> (i8, AccidentalHint, usize) {
    let mut shift = 0i8;
    let mut hint = AccidentalHint::None;
    let mut used = 0;
    for c in s.chars() {
        match c {
            '#' | '♯' => {
                shift += 1;
                hint = AccidentalHint::Sharp;
            }
            'b' | '♭' => {
                shift -= 1;
                hint = AccidentalHint::Flat;
            }
            'n' | '♮' => hint = AccidentalHint::Natural,
            _ => break,
        }
        used += c.len_utf8();
    }
    (shift, hint, used)
}

/// Parse a note name such as "E4", "Bb3", "F#5" or "Bn3" (explicit natural).
pub fn parse_note(text: &str) -> Result<ParsedNote, NoteParseError> {
    let text = text.trim();
    let mut chars = text.chars();
    let first = chars.next().ok_or(NoteParseError::Empty)?;
    let letter = letter_index(first).ok_or_else(|| NoteParseError::BadLetter(text.to_string()))?;
    let rest = &text[first.len_utf8()..];
    let (shift, hint, used) = read_accidentals(rest);
    let octave_text = &rest[used..];
    if octave_text.is_empty() {
        return Err(NoteParseError::MissingOctave(text.to_string()));
    }
    let octave: i16 = octave_text
        .parse()
        .map_err(|_| NoteParseError::BadOctave(text.to_string()))?;
    let pitch = (octave + 1) * 12 + letter_pitch_class(letter) as i16 + shift as i16;
    if !(0..=127).contains(&pitch) {
        return Err(NoteParseError::OutOfRange(text.to_string()));
    }
    Ok(ParsedNote {
        pitch: pitch as u8,
        hint,
    })
}

/// Name of a pitch class using the key's side of the circle of fifths.
pub fn spell_pitch_class(pc: u8, key: &Key) -> &'static str {
    if key.uses_flats() {
        FLAT_NAMES[(pc % 12) as usize]
    } else {
        SHARP_NAMES[(pc % 12) as usize]
    }
}

/// Name of a MIDI pitch with octave, e.g. "Bb3".
pub fn spell_midi(pitch: u8, key: &Key) -> String {
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", spell_pitch_class(pitch % 12, key), octave)
}

/// Letter index (0 = C) of the key's tonic as written in its signature.
fn tonic_letter(key: &Key) -> usize {
    let name = spell_pitch_class(key.tonic, key);
    name.chars().next().and_then(letter_index).unwrap_or(0)
}

/// Spell the note on a scale degree after a chromatic offset, using the
/// degree's letter: degree 2 lowered by one in C is "Db", degree 4 raised
/// by one is "F#".
pub fn spell_degree(key: &Key, degree: u8, offset: i8) -> String {
    let letter = (tonic_letter(key) + (degree.max(1) - 1) as usize) % 7;
    let target = (key.degree_pitch_class(degree) as i16 + offset as i16).rem_euclid(12);
    let natural = letter_pitch_class(letter) as i16;
    let mut diff = (target - natural).rem_euclid(12);
    if diff > 6 {
        diff -= 12;
    }
    let accidental = match diff {
        -2 => "bb",
        -1 => "b",
        1 => "#",
        2 => "##",
        _ => "",
    };
    format!("{}{}", LETTERS[letter], accidental)
}
