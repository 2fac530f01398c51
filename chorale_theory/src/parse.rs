// Chord identifier parsing: Roman numerals and absolute chord symbols.
//
// Two notations resolve to the same `ChordRecipe`:
//
// - Roman numerals, relative to the key: "I", "ii", "V7", "vii°7", "bVI",
//   "N6", "V/V", "vii°7/ii", "I+", "iiø7". Case gives major/minor; a leading
//   b/# alters the root relative to the parallel major, and "/target" builds
//   an applied chord on the target degree using major-scale intervals.
// - Absolute symbols: "G7", "Fm", "Caug", "Abdim", "Bbmaj7", "F#m7b5",
//   "C7(b9)". The root letter is placed on the nearest scale degree of the
//   key with a chromatic offset.
//
// Quality suffixes are matched longest-first from a fixed table so that
// "m7b5" wins over "m7" and "m", and "maj7" wins over "m".
//
// Consumed by the voicing crate's region builder and candidate generator.

use crate::chord::{ChordRecipe, SeventhQuality, Tension, TriadQuality};
use crate::key::{Key, Mode};
use crate::pitch::{letter_index, letter_pitch_class, read_accidentals};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty chord identifier")]
    Empty,
    #[error("'{0}' is not a valid Roman numeral")]
    InvalidNumeral(String),
    #[error("unknown chord quality '{suffix}' in '{text}'")]
    UnknownQuality { text: String, suffix: String },
    #[error("unknown tension '{tension}' in '{text}'")]
    UnknownTension { text: String, tension: String },
    #[error("invalid applied-chord target in '{0}'")]
    InvalidTarget(String),
}

/// Quality implied by a suffix: triad, seventh, implied tension.
type SuffixEntry = (&'static str, Option<TriadQuality>, SeventhQuality, Option<Tension>);

/// Symbol suffixes. A `None` triad quality means "major" for symbols.
/// Sorted longest-first at lookup time.
const SYMBOL_SUFFIXES: &[SuffixEntry] = &[
    ("", None, SeventhQuality::None, None),
    ("m", Some(TriadQuality::Minor), SeventhQuality::None, None),
    ("min", Some(TriadQuality::Minor), SeventhQuality::None, None),
    ("-", Some(TriadQuality::Minor), SeventhQuality::None, None),
    ("dim", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("°", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("o", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("aug", Some(TriadQuality::Augmented), SeventhQuality::None, None),
    ("+", Some(TriadQuality::Augmented), SeventhQuality::None, None),
    ("7", None, SeventhQuality::Dominant7, None),
    ("9", None, SeventhQuality::Dominant7, Some(Tension::Nine)),
    ("11", None, SeventhQuality::Dominant7, Some(Tension::Eleven)),
    ("13", None, SeventhQuality::Dominant7, Some(Tension::Thirteen)),
    ("maj7", None, SeventhQuality::Major7, None),
    ("M7", None, SeventhQuality::Major7, None),
    ("Δ7", None, SeventhQuality::Major7, None),
    ("Δ", None, SeventhQuality::Major7, None),
    ("maj9", None, SeventhQuality::Major7, Some(Tension::Nine)),
    ("m7", Some(TriadQuality::Minor), SeventhQuality::Minor7, None),
    ("min7", Some(TriadQuality::Minor), SeventhQuality::Minor7, None),
    ("-7", Some(TriadQuality::Minor), SeventhQuality::Minor7, None),
    ("m9", Some(TriadQuality::Minor), SeventhQuality::Minor7, Some(Tension::Nine)),
    ("m11", Some(TriadQuality::Minor), SeventhQuality::Minor7, Some(Tension::Eleven)),
    ("mMaj7", Some(TriadQuality::Minor), SeventhQuality::Major7, None),
    ("mM7", Some(TriadQuality::Minor), SeventhQuality::Major7, None),
    ("m7b5", Some(TriadQuality::Diminished), SeventhQuality::HalfDiminished7, None),
    ("ø", Some(TriadQuality::Diminished), SeventhQuality::HalfDiminished7, None),
    ("ø7", Some(TriadQuality::Diminished), SeventhQuality::HalfDiminished7, None),
    ("dim7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("°7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("o7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("aug7", Some(TriadQuality::Augmented), SeventhQuality::Dominant7, None),
    ("+7", Some(TriadQuality::Augmented), SeventhQuality::Dominant7, None),
    ("7#5", Some(TriadQuality::Augmented), SeventhQuality::Dominant7, None),
];

/// Numeral suffixes. A `None` triad quality means "read from the numeral's
/// case"; the seventh entry for plain "7" is resolved against that case.
const NUMERAL_SUFFIXES: &[SuffixEntry] = &[
    ("", None, SeventhQuality::None, None),
    ("°", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("o", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("dim", Some(TriadQuality::Diminished), SeventhQuality::None, None),
    ("+", Some(TriadQuality::Augmented), SeventhQuality::None, None),
    ("aug", Some(TriadQuality::Augmented), SeventhQuality::None, None),
    ("7", None, SeventhQuality::Dominant7, None),
    ("9", None, SeventhQuality::Dominant7, Some(Tension::Nine)),
    ("11", None, SeventhQuality::Dominant7, Some(Tension::Eleven)),
    ("13", None, SeventhQuality::Dominant7, Some(Tension::Thirteen)),
    ("maj7", None, SeventhQuality::Major7, None),
    ("M7", None, SeventhQuality::Major7, None),
    ("Δ7", None, SeventhQuality::Major7, None),
    ("ø", Some(TriadQuality::Diminished), SeventhQuality::HalfDiminished7, None),
    ("ø7", Some(TriadQuality::Diminished), SeventhQuality::HalfDiminished7, None),
    ("°7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("o7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("dim7", Some(TriadQuality::Diminished), SeventhQuality::Diminished7, None),
    ("+7", Some(TriadQuality::Augmented), SeventhQuality::Dominant7, None),
    ("aug7", Some(TriadQuality::Augmented), SeventhQuality::Dominant7, None),
];

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Parse a Roman numeral or absolute chord symbol into a recipe for `key`.
pub fn parse_chord_identifier(key: &Key, text: &str) -> Result<ChordRecipe, ParseError> {
    let text = text.trim();
    let first = text.chars().next().ok_or(ParseError::Empty)?;
    if ('A'..='G').contains(&first) {
        parse_symbol(key, text)
    } else {
        parse_numeral(key, text)
    }
}

// ── Absolute symbols ──

fn parse_symbol(key: &Key, text: &str) -> Result<ChordRecipe, ParseError> {
    let mut chars = text.chars();
    let letter = chars.next().and_then(letter_index).ok_or(ParseError::Empty)?;
    let rest = &text[1..];
    let (shift, _, used) = read_accidentals(rest);
    let root_pc = (letter_pitch_class(letter) as i16 + shift as i16).rem_euclid(12) as u8;
    let rest = &rest[used..];

    let (entry, rest) = match_suffix(SYMBOL_SUFFIXES, rest);
    let (_, triad, seventh, implied) = entry;
    let quality = triad.unwrap_or(TriadQuality::Major);

    let (degree, offset) = place_root(key, root_pc, shift);
    let mut recipe = ChordRecipe::triad(degree, quality)
        .with_root_offset(offset)
        .with_seventh(seventh);
    if let Some(t) = implied {
        recipe = recipe.with_tension(t);
    }
    apply_tensions(text, recipe, rest)
}

/// Place a root pitch class on a degree of `key`, preferring the spelling
/// implied by the accidental that was written.
fn place_root(key: &Key, root_pc: u8, written_shift: i8) -> (u8, i8) {
    if let Some(degree) = key.scale_degree(root_pc) {
        return (degree, 0);
    }
    let above = key.scale_degree((root_pc + 1) % 12);
    let below = key.scale_degree((root_pc + 11) % 12);
    match (written_shift > 0, above, below) {
        (true, _, Some(d)) => (d, 1),
        (_, Some(d), _) => (d, -1),
        (_, None, Some(d)) => (d, 1),
        // Every pitch class is within a semitone of a diatonic mode's scale.
        (_, None, None) => (1, (root_pc as i16 - key.tonic as i16).rem_euclid(12) as i8),
    }
}

// ── Roman numerals ──

fn parse_numeral(key: &Key, text: &str) -> Result<ChordRecipe, ParseError> {
    let (body, target) = match text.split_once('/') {
        Some((body, target)) => (body, Some(target)),
        None => (text, None),
    };

    // Neapolitan shorthand.
    if body == "N" || body == "N6" {
        if target.is_some() {
            return Err(ParseError::InvalidTarget(text.to_string()));
        }
        return Ok(numeral_recipe(key, 2, -1, TriadQuality::Major, SeventhQuality::None));
    }

    let (shift, _, used) = read_accidentals(body);
    let rest = &body[used..];
    let numeral_len = rest
        .char_indices()
        .find(|(_, c)| !matches!(c, 'I' | 'V' | 'i' | 'v'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let numeral = &rest[..numeral_len];
    let degree = NUMERALS
        .iter()
        .position(|n| n.eq_ignore_ascii_case(numeral))
        .map(|i| i as u8 + 1)
        .ok_or_else(|| ParseError::InvalidNumeral(text.to_string()))?;
    let is_upper = numeral.chars().all(|c| c.is_ascii_uppercase());
    let is_lower = numeral.chars().all(|c| c.is_ascii_lowercase());
    if !is_upper && !is_lower {
        return Err(ParseError::InvalidNumeral(text.to_string()));
    }
    let case_quality = if is_upper {
        TriadQuality::Major
    } else {
        TriadQuality::Minor
    };

    let (entry, rest) = match_suffix(NUMERAL_SUFFIXES, &rest[numeral_len..]);
    let (_, triad, seventh, implied) = entry;
    let quality = triad.unwrap_or(case_quality);
    // Plain "7" on a lowercase numeral is a minor seventh chord.
    let seventh = match (seventh, triad, quality) {
        (SeventhQuality::Dominant7, None, TriadQuality::Minor) => SeventhQuality::Minor7,
        (s, _, _) => s,
    };

    let mut recipe = match target {
        None => numeral_recipe(key, degree, shift, quality, seventh),
        Some(target) => applied_recipe(key, text, degree, shift, quality, seventh, target)?,
    };
    if let Some(t) = implied {
        recipe = recipe.with_tension(t);
    }
    apply_tensions(text, recipe, rest)
}

/// A numeral's recipe. Unaltered numerals sit on the key's own degree;
/// altered ones ("bVI") are measured from the parallel major.
fn numeral_recipe(
    key: &Key,
    degree: u8,
    shift: i8,
    quality: TriadQuality,
    seventh: SeventhQuality,
) -> ChordRecipe {
    let offset = if shift == 0 {
        0
    } else {
        let major = Key::new(key.tonic, Mode::Ionian);
        let target = major.degree_pitch_class(degree) as i16 + shift as i16;
        signed_offset(target - key.degree_pitch_class(degree) as i16)
    };
    ChordRecipe::triad(degree, quality)
        .with_root_offset(offset)
        .with_seventh(seventh)
}

/// An applied chord: `degree` counted in the major scale of `target`.
fn applied_recipe(
    key: &Key,
    text: &str,
    degree: u8,
    shift: i8,
    quality: TriadQuality,
    seventh: SeventhQuality,
    target: &str,
) -> Result<ChordRecipe, ParseError> {
    let target_recipe = parse_numeral(key, target)
        .map_err(|_| ParseError::InvalidTarget(text.to_string()))?;
    let target_root = target_recipe.root_pitch_class(key);
    let local = Key::new(target_root, Mode::Ionian);
    let root_pc = (local.degree_pitch_class(degree) as i16 + shift as i16).rem_euclid(12);
    let home_degree = ((target_recipe.degree() - 1 + degree - 1) % 7) + 1;
    let offset = signed_offset(root_pc - key.degree_pitch_class(home_degree) as i16);
    Ok(ChordRecipe::triad(home_degree, quality)
        .with_root_offset(offset)
        .with_seventh(seventh))
}

// ── Shared helpers ──

/// Reduce a semitone difference to the range -6..=5.
fn signed_offset(diff: i16) -> i8 {
    let d = diff.rem_euclid(12);
    if d > 5 { (d - 12) as i8 } else { d as i8 }
}

/// Longest suffix in `table` that prefixes `rest`.
fn match_suffix<'a>(table: &'static [SuffixEntry], rest: &'a str) -> (SuffixEntry, &'a str) {
    let mut best = table[0];
    for entry in table {
        if rest.starts_with(entry.0) && entry.0.len() > best.0.len() {
            best = *entry;
        }
    }
    (best, &rest[best.0.len()..])
}

/// Parse trailing tension tokens like "b9", "(#11)", "9,13".
fn apply_tensions(
    text: &str,
    mut recipe: ChordRecipe,
    rest: &str,
) -> Result<ChordRecipe, ParseError> {
    let cleaned: String = rest
        .chars()
        .map(|c| if matches!(c, '(' | ')' | ',') { ' ' } else { c })
        .collect();
    for token in split_tension_tokens(&cleaned) {
        let tension = match token.as_str() {
            "b9" => Tension::FlatNine,
            "9" => Tension::Nine,
            "#9" => Tension::SharpNine,
            "11" => Tension::Eleven,
            "#11" => Tension::SharpEleven,
            "13" => Tension::Thirteen,
            _ => {
                let err = if recipe.has_seventh() || token.chars().any(|c| c.is_ascii_digit()) {
                    ParseError::UnknownTension {
                        text: text.to_string(),
                        tension: token,
                    }
                } else {
                    ParseError::UnknownQuality {
                        text: text.to_string(),
                        suffix: rest.to_string(),
                    }
                };
                return Err(err);
            }
        };
        recipe = recipe.with_tension(tension);
    }
    Ok(recipe)
}

/// Split "b9#11" or "b9 13" into individual tension tokens. A token is an
/// optional accidental followed by digits.
fn split_tension_tokens(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in s.chars() {
        let starts_new = matches!(c, 'b' | '#' | ' ')
            && current.chars().last().is_some_and(|l| l.is_ascii_digit());
        if starts_new || c == ' ' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if c == ' ' {
                continue;
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
