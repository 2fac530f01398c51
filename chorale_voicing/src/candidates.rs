// Chord candidates for a single melody note.
//
// Diatonic notes draw from a fixed table of chord roots per scale degree,
// rendered as the mode's own diatonic triad numerals (so degree 2 in Aeolian
// offers "ii°", not "ii"). Chromatic notes are only harmonized in Ionian and
// only when the spelling says which way the note is altered; the interval
// above the tonic then picks up to two borrowed or applied chords. Every
// label is resolved through the chord-identifier parser, and a candidate
// survives only if the melody pitch class is one of its chord tones.
//
// An empty candidate list is a normal outcome; the harmonizer decides what
// to do with it.

use crate::melody::{Alteration, MelodyAnalysis, alteration};
use chorale_theory::{
    ChordRecipe, Key, Mode, chord_symbol, parse_chord_identifier, roman_numeral,
};
use serde::{Deserialize, Serialize};

/// Chord roots tried for each diatonic melody degree, best first.
const DIATONIC_ROOTS: [&[u8]; 7] = [
    &[1, 6, 4],
    &[5, 2, 7],
    &[1, 3, 6],
    &[4, 2, 7],
    &[5, 1],
    &[4, 6, 2],
    &[5, 7, 3],
];

/// Chromatic numerals by semitones above the tonic, for lowered notes.
fn lowered_numerals(interval: u8) -> &'static [&'static str] {
    match interval {
        1 => &["bII"],
        3 => &["bIII", "iv7"],
        8 => &["iv", "bVI"],
        10 => &["bVII", "V7/IV"],
        _ => &[],
    }
}

/// Chromatic numerals by semitones above the tonic, for raised notes.
fn raised_numerals(interval: u8) -> &'static [&'static str] {
    match interval {
        1 => &["V/ii", "vii°7/ii"],
        3 => &["V/iii", "vii°/iii"],
        6 => &["V/V", "vii°/V"],
        8 => &["V/vi", "I+"],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub recipe: ChordRecipe,
    /// Roman numeral, also the key into the transition table.
    pub label: String,
    /// Absolute chord symbol in the key, for display.
    pub symbol: String,
    pub justification: String,
}

impl Candidate {
    /// The tonic chord: degree 1 with no chromatic alteration.
    pub fn is_tonic(&self) -> bool {
        self.recipe.degree() == 1 && self.recipe.root_offset() == 0
    }
}

fn resolve(key: &Key, label: &str, pitch_class: u8, justification: String) -> Option<Candidate> {
    let recipe = parse_chord_identifier(key, label).ok()?;
    recipe.tones(key).contains(pitch_class).then(|| Candidate {
        recipe,
        label: label.to_string(),
        symbol: chord_symbol(key, &recipe),
        justification,
    })
}

/// Ordered candidates for one analyzed melody note.
pub fn generate_candidates(key: &Key, analysis: &MelodyAnalysis) -> Vec<Candidate> {
    let pc = analysis.pitch_class;
    if analysis.is_diatonic {
        let roots = DIATONIC_ROOTS[(analysis.degree.clamp(1, 7) - 1) as usize];
        return roots
            .iter()
            .filter_map(|&root| {
                let label = roman_numeral(key, &ChordRecipe::diatonic(key, root));
                let why = format!("melody degree {} is a tone of {label}", analysis.degree);
                resolve(key, &label, pc, why)
            })
            .collect();
    }
    if key.mode != Mode::Ionian {
        return Vec::new();
    }
    let Some(direction) = alteration(key, analysis.hint) else {
        return Vec::new();
    };
    let interval = analysis.interval_from_tonic(key);
    let (labels, word) = match direction {
        Alteration::Lowered => (lowered_numerals(interval), "lowered"),
        Alteration::Raised => (raised_numerals(interval), "raised"),
    };
    labels
        .iter()
        .filter_map(|label| {
            let why = format!("{word} note {interval} semitones above the tonic suggests {label}");
            resolve(key, label, pc, why)
        })
        .collect()
}
