// Keys and diatonic modes.
//
// A `Key` is a tonic pitch class plus one of the seven diatonic modes. Each
// mode is a rotation of the major-scale step pattern (2,2,1,2,2,2,1); the key
// maps scale degrees to pitch classes and back, which is all the harmonizer
// and the voicing engine need to know about tonality.
//
// Degrees are 1-based throughout the public API (degree 1 = tonic), matching
// Roman numerals. `pitch_class_at` takes a 0-based index for callers that walk
// the scale as an array.
//
// Used by chord.rs (recipe → pitch classes), parse.rs (numeral and symbol
// roots), pitch.rs (key-side spelling) and the voicing crate's melody analyzer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Major-scale step pattern in semitones. Every diatonic mode is a rotation.
const IONIAN_STEPS: [u8; 7] = [2, 2, 1, 2, 2, 2, 1];

/// The seven diatonic modes, in rotation order of the major scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// C D E F G A B: the major scale.
    Ionian,
    /// D E F G A B C: minor with raised 6th.
    Dorian,
    /// E F G A B C D: minor with lowered 2nd.
    Phrygian,
    /// F G A B C D E: major with raised 4th.
    Lydian,
    /// G A B C D E F: major with lowered 7th.
    Mixolydian,
    /// A B C D E F G: natural minor.
    Aeolian,
    /// B C D E F G A: diminished tonic triad.
    Locrian,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    /// Position of this mode in the rotation (Ionian = 0).
    fn rotation(self) -> usize {
        match self {
            Mode::Ionian => 0,
            Mode::Dorian => 1,
            Mode::Phrygian => 2,
            Mode::Lydian => 3,
            Mode::Mixolydian => 4,
            Mode::Aeolian => 5,
            Mode::Locrian => 6,
        }
    }

    /// The 7-step interval pattern of this mode, starting from its tonic.
    pub fn step_pattern(self) -> [u8; 7] {
        let r = self.rotation();
        std::array::from_fn(|i| IONIAN_STEPS[(i + r) % 7])
    }

    /// Semitone offsets from the tonic to each of the seven degrees.
    pub fn intervals(self) -> [u8; 7] {
        let steps = self.step_pattern();
        let mut out = [0u8; 7];
        for i in 1..7 {
            out[i] = out[i - 1] + steps[i - 1];
        }
        out
    }

    /// Semitones from the parent major scale's tonic up to this mode's tonic.
    /// D Dorian sits 2 semitones above its parent C major.
    pub fn offset_from_parent_major(self) -> u8 {
        Mode::Ionian.intervals()[self.rotation()]
    }

    /// Look up a mode by name (case-insensitive). Accepts "major"/"minor"
    /// as aliases for Ionian/Aeolian.
    pub fn from_name(name: &str) -> Option<Mode> {
        match name.to_ascii_lowercase().as_str() {
            "ionian" | "major" => Some(Mode::Ionian),
            "dorian" => Some(Mode::Dorian),
            "phrygian" => Some(Mode::Phrygian),
            "lydian" => Some(Mode::Lydian),
            "mixolydian" => Some(Mode::Mixolydian),
            "aeolian" | "minor" => Some(Mode::Aeolian),
            "locrian" => Some(Mode::Locrian),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        };
        f.write_str(name)
    }
}

/// A tonic pitch class plus a mode. Immutable for a harmonization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Pitch class of the tonic (0 = C, 2 = D, ...).
    pub tonic: u8,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: u8, mode: Mode) -> Self {
        Key {
            tonic: tonic % 12,
            mode,
        }
    }

    /// C Ionian.
    pub fn c_major() -> Self {
        Key::new(0, Mode::Ionian)
    }

    /// Pitch class at a 0-based scale index. Indices wrap every 7 steps.
    pub fn pitch_class_at(&self, index: usize) -> u8 {
        (self.tonic + self.mode.intervals()[index % 7]) % 12
    }

    /// Pitch class of a 1-based scale degree (1 = tonic). Degrees outside
    /// 1–7 wrap.
    pub fn degree_pitch_class(&self, degree: u8) -> u8 {
        self.pitch_class_at((degree.max(1) - 1) as usize)
    }

    /// The 1-based degree whose pitch class is `pc`, or None if `pc` is not
    /// in the scale.
    pub fn scale_degree(&self, pc: u8) -> Option<u8> {
        let rel = (pc % 12 + 12 - self.tonic) % 12;
        self.mode
            .intervals()
            .iter()
            .position(|&iv| iv == rel)
            .map(|i| i as u8 + 1)
    }

    pub fn is_diatonic(&self, pc: u8) -> bool {
        self.scale_degree(pc).is_some()
    }

    /// Pitch class of the parent major scale's tonic (C for D Dorian).
    pub fn parent_major_tonic(&self) -> u8 {
        (self.tonic + 12 - self.mode.offset_from_parent_major()) % 12
    }

    /// Whether this key's signature is written with flats. C-major-family
    /// keys and sharp keys return false.
    pub fn uses_flats(&self) -> bool {
        matches!(self.parent_major_tonic(), 1 | 3 | 5 | 8 | 10)
    }
}

/// Pitch class of a 1-based degree in `key`.
pub fn degree_pitch_class(key: &Key, degree: u8) -> u8 {
    key.degree_pitch_class(degree)
}
