// Chord recipes and their tone sets.
//
// A `ChordRecipe` describes a chord's structure relative to a key: which
// scale degree carries the root, the triad quality, an optional seventh, a
// chromatic root offset (for borrowed and applied chords like bII or V/V),
// and any requested upper tensions. Recipes are produced by parse.rs and are
// never mutated afterwards; the `with_*` builders return new values.
//
// `ChordTones` is the ordered pitch-class list [root, third, fifth, seventh?].
// The order is load-bearing: the voicing engine identifies the seventh and
// the augmented fifth by index, and the priority classifier keys off roles.
//
// Interval lookups are exhaustive matches over the quality enums rather than
// tables, so adding a quality forces every lookup to be revisited.

use crate::key::Key;
use serde::{Deserialize, Serialize};

/// Quality of the underlying triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriadQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl TriadQuality {
    /// Semitones from root to third.
    pub fn third(self) -> u8 {
        match self {
            TriadQuality::Major | TriadQuality::Augmented => 4,
            TriadQuality::Minor | TriadQuality::Diminished => 3,
        }
    }

    /// Semitones from root to fifth.
    pub fn fifth(self) -> u8 {
        match self {
            TriadQuality::Major | TriadQuality::Minor => 7,
            TriadQuality::Diminished => 6,
            TriadQuality::Augmented => 8,
        }
    }

    /// True for the qualities whose fifth is not perfect.
    pub fn has_altered_fifth(self) -> bool {
        matches!(self, TriadQuality::Diminished | TriadQuality::Augmented)
    }

    /// True when the third is major (Major, Augmented).
    pub fn has_major_third(self) -> bool {
        self.third() == 4
    }
}

/// Whether the chord carries a seventh. Derived from `SeventhQuality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    None,
    Seventh,
}

/// Quality of the chordal seventh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeventhQuality {
    None,
    Major7,
    Minor7,
    Dominant7,
    HalfDiminished7,
    Diminished7,
}

impl SeventhQuality {
    /// Semitones from root to seventh, or None when there is no seventh.
    pub fn interval(self) -> Option<u8> {
        match self {
            SeventhQuality::None => None,
            SeventhQuality::Major7 => Some(11),
            SeventhQuality::Minor7
            | SeventhQuality::Dominant7
            | SeventhQuality::HalfDiminished7 => Some(10),
            SeventhQuality::Diminished7 => Some(9),
        }
    }
}

/// Upper-structure tensions a chord identifier may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tension {
    FlatNine,
    Nine,
    SharpNine,
    Eleven,
    SharpEleven,
    Thirteen,
}

impl Tension {
    pub const ALL: [Tension; 6] = [
        Tension::FlatNine,
        Tension::Nine,
        Tension::SharpNine,
        Tension::Eleven,
        Tension::SharpEleven,
        Tension::Thirteen,
    ];

    fn bit(self) -> u8 {
        match self {
            Tension::FlatNine => 1 << 0,
            Tension::Nine => 1 << 1,
            Tension::SharpNine => 1 << 2,
            Tension::Eleven => 1 << 3,
            Tension::SharpEleven => 1 << 4,
            Tension::Thirteen => 1 << 5,
        }
    }

    /// Semitones above the root, reduced to within an octave.
    pub fn interval(self) -> u8 {
        match self {
            Tension::FlatNine => 1,
            Tension::Nine => 2,
            Tension::SharpNine => 3,
            Tension::Eleven => 5,
            Tension::SharpEleven => 6,
            Tension::Thirteen => 9,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Tension::FlatNine => "b9",
            Tension::Nine => "9",
            Tension::SharpNine => "#9",
            Tension::Eleven => "11",
            Tension::SharpEleven => "#11",
            Tension::Thirteen => "13",
        }
    }
}

/// Set of requested tensions, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tensions(u8);

impl Tensions {
    pub fn empty() -> Self {
        Tensions(0)
    }

    pub fn with(self, tension: Tension) -> Self {
        Tensions(self.0 | tension.bit())
    }

    pub fn contains(&self, tension: Tension) -> bool {
        self.0 & tension.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Requested tensions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Tension> + '_ {
        Tension::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

/// Functional role of a chord tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordRole {
    Root,
    Third,
    Fifth,
    Seventh,
}

impl ChordRole {
    pub const ALL: [ChordRole; 4] = [
        ChordRole::Root,
        ChordRole::Third,
        ChordRole::Fifth,
        ChordRole::Seventh,
    ];

    /// Position of this role in a `ChordTones` list.
    pub fn index(self) -> usize {
        match self {
            ChordRole::Root => 0,
            ChordRole::Third => 1,
            ChordRole::Fifth => 2,
            ChordRole::Seventh => 3,
        }
    }
}

/// Immutable description of a chord relative to a key.
///
/// The extension is derived from the seventh quality, so "seventh quality is
/// None iff extension is None" holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChordRecipe {
    degree: u8,
    quality: TriadQuality,
    seventh: SeventhQuality,
    root_offset: i8,
    tensions: Tensions,
}

impl ChordRecipe {
    /// A plain triad on a 1-based scale degree.
    pub fn triad(degree: u8, quality: TriadQuality) -> Self {
        ChordRecipe {
            degree: degree.clamp(1, 7),
            quality,
            seventh: SeventhQuality::None,
            root_offset: 0,
            tensions: Tensions::empty(),
        }
    }

    /// The diatonic triad on `degree` in `key` (quality read from the mode).
    pub fn diatonic(key: &Key, degree: u8) -> Self {
        let root = key.degree_pitch_class(degree);
        let third = (key.degree_pitch_class(degree + 2) + 12 - root) % 12;
        let fifth = (key.degree_pitch_class(degree + 4) + 12 - root) % 12;
        let quality = match (third, fifth) {
            (4, 8) => TriadQuality::Augmented,
            (4, _) => TriadQuality::Major,
            (3, 6) => TriadQuality::Diminished,
            _ => TriadQuality::Minor,
        };
        ChordRecipe::triad(degree, quality)
    }

    pub fn with_seventh(self, seventh: SeventhQuality) -> Self {
        ChordRecipe { seventh, ..self }
    }

    pub fn with_root_offset(self, root_offset: i8) -> Self {
        ChordRecipe { root_offset, ..self }
    }

    pub fn with_tension(self, tension: Tension) -> Self {
        ChordRecipe {
            tensions: self.tensions.with(tension),
            ..self
        }
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn quality(&self) -> TriadQuality {
        self.quality
    }

    pub fn seventh(&self) -> SeventhQuality {
        self.seventh
    }

    pub fn extension(&self) -> Extension {
        match self.seventh {
            SeventhQuality::None => Extension::None,
            _ => Extension::Seventh,
        }
    }

    pub fn has_seventh(&self) -> bool {
        self.extension() == Extension::Seventh
    }

    pub fn root_offset(&self) -> i8 {
        self.root_offset
    }

    pub fn tensions(&self) -> Tensions {
        self.tensions
    }

    /// A diminished triad without any seventh.
    pub fn is_plain_diminished(&self) -> bool {
        self.quality == TriadQuality::Diminished && !self.has_seventh()
    }

    /// Pitch class of the root in `key`.
    pub fn root_pitch_class(&self, key: &Key) -> u8 {
        let diatonic = key.degree_pitch_class(self.degree) as i16;
        (diatonic + self.root_offset as i16).rem_euclid(12) as u8
    }

    /// Ordered chord tones in `key`.
    pub fn tones(&self, key: &Key) -> ChordTones {
        let root = self.root_pitch_class(key);
        let third = (root + self.quality.third()) % 12;
        let fifth = (root + self.quality.fifth()) % 12;
        match self.seventh.interval() {
            Some(iv) => ChordTones::seventh(root, third, fifth, (root + iv) % 12),
            None => ChordTones::triad(root, third, fifth),
        }
    }
}

/// Ordered chord-tone pitch classes: root, third, fifth, and the seventh
/// when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChordTones {
    tones: [u8; 4],
    len: u8,
}

impl ChordTones {
    pub fn triad(root: u8, third: u8, fifth: u8) -> Self {
        ChordTones {
            tones: [root, third, fifth, 0],
            len: 3,
        }
    }

    pub fn seventh(root: u8, third: u8, fifth: u8, seventh: u8) -> Self {
        ChordTones {
            tones: [root, third, fifth, seventh],
            len: 4,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.tones[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> u8 {
        self.tones[0]
    }

    pub fn third(&self) -> u8 {
        self.tones[1]
    }

    pub fn fifth(&self) -> u8 {
        self.tones[2]
    }

    pub fn seventh_tone(&self) -> Option<u8> {
        (self.len == 4).then_some(self.tones[3])
    }

    /// Pitch class for a role, if the chord has that role.
    pub fn get(&self, role: ChordRole) -> Option<u8> {
        let i = role.index();
        (i < self.len as usize).then_some(self.tones[i])
    }

    pub fn contains(&self, pc: u8) -> bool {
        self.as_slice().contains(&(pc % 12))
    }

    /// Role of a pitch class within this chord.
    pub fn role_of(&self, pc: u8) -> Option<ChordRole> {
        self.as_slice()
            .iter()
            .position(|&t| t == pc % 12)
            .map(|i| ChordRole::ALL[i])
    }
}

/// True when `role` is the augmented fifth of `recipe`.
pub fn is_augmented_fifth(recipe: &ChordRecipe, role: ChordRole) -> bool {
    role == ChordRole::Fifth && recipe.quality() == TriadQuality::Augmented
}

/// Reference-octave realization: the chord tones stacked upward from the
/// root in `octave` (MIDI convention, C4 = 60).
pub fn build_chord_pitches(key: &Key, recipe: &ChordRecipe, octave: i8) -> Vec<u8> {
    let tones = recipe.tones(key);
    let base = (octave as i16 + 1) * 12 + tones.root() as i16;
    let mut out = Vec::with_capacity(tones.len());
    let mut last = base;
    for (i, &pc) in tones.as_slice().iter().enumerate() {
        let mut pitch = base - tones.root() as i16 + pc as i16;
        while i > 0 && pitch <= last {
            pitch += 12;
        }
        last = pitch;
        out.push(pitch.clamp(0, 127) as u8);
    }
    out
}
