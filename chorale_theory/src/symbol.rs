// Display names for chord recipes.
//
// `chord_symbol` renders a recipe as an absolute lead-sheet symbol in a key
// ("G7", "Dbmaj7", "F#m7b5(b9)"), using degree-based root spelling from
// pitch.rs. `roman_numeral` renders the numeral for an unaltered recipe
// ("V7", "vii°", "iiø7"); chromatic recipes get their accidental prefix.
// Both are display-only and round-trip through parse.rs for the common
// qualities.

use crate::chord::{ChordRecipe, SeventhQuality, TriadQuality};
use crate::key::Key;
use crate::pitch::spell_degree;

const UPPER: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Lead-sheet symbol for `recipe` in `key`.
pub fn chord_symbol(key: &Key, recipe: &ChordRecipe) -> String {
    let root = spell_degree(key, recipe.degree(), recipe.root_offset());
    let suffix = match (recipe.quality(), recipe.seventh()) {
        (TriadQuality::Major, SeventhQuality::None) => "",
        (TriadQuality::Minor, SeventhQuality::None) => "m",
        (TriadQuality::Diminished, SeventhQuality::None) => "dim",
        (TriadQuality::Augmented, SeventhQuality::None) => "aug",
        (TriadQuality::Major, SeventhQuality::Dominant7 | SeventhQuality::Minor7) => "7",
        (TriadQuality::Major, SeventhQuality::Major7) => "maj7",
        (TriadQuality::Minor, SeventhQuality::Minor7 | SeventhQuality::Dominant7) => "m7",
        (TriadQuality::Minor, SeventhQuality::Major7) => "mMaj7",
        (TriadQuality::Diminished, SeventhQuality::Diminished7) => "dim7",
        (
            TriadQuality::Diminished,
            SeventhQuality::HalfDiminished7 | SeventhQuality::Minor7 | SeventhQuality::Dominant7,
        ) => "m7b5",
        (TriadQuality::Augmented, SeventhQuality::Dominant7 | SeventhQuality::Minor7) => "aug7",
        (TriadQuality::Augmented, SeventhQuality::Major7) => "augMaj7",
        (TriadQuality::Major | TriadQuality::Augmented, SeventhQuality::HalfDiminished7) => "7",
        (TriadQuality::Major | TriadQuality::Augmented, SeventhQuality::Diminished7) => "6",
        (TriadQuality::Minor, SeventhQuality::HalfDiminished7) => "m7",
        (TriadQuality::Minor, SeventhQuality::Diminished7) => "m6",
        (TriadQuality::Diminished, SeventhQuality::Major7) => "dimMaj7",
    };
    format!("{root}{suffix}{}", tension_suffix(recipe))
}

/// Roman numeral for `recipe` relative to `key`'s parallel major when the
/// root is altered ("bII"), or its own degree when it is not ("ii").
pub fn roman_numeral(key: &Key, recipe: &ChordRecipe) -> String {
    let numeral = UPPER[(recipe.degree() - 1) as usize];
    let numeral = match recipe.quality() {
        TriadQuality::Major | TriadQuality::Augmented => numeral.to_string(),
        TriadQuality::Minor | TriadQuality::Diminished => numeral.to_ascii_lowercase(),
    };
    let prefix = match recipe.root_offset() {
        0 => String::new(),
        offset => {
            let major = Key::new(key.tonic, crate::key::Mode::Ionian);
            let root = recipe.root_pitch_class(key) as i16;
            let diff = (root - major.degree_pitch_class(recipe.degree()) as i16).rem_euclid(12);
            match diff {
                0 => String::new(),
                1 => "#".to_string(),
                11 => "b".to_string(),
                _ if offset > 0 => "#".repeat(offset as usize),
                _ => "b".repeat(offset.unsigned_abs() as usize),
            }
        }
    };
    let suffix = match (recipe.quality(), recipe.seventh()) {
        (TriadQuality::Diminished, SeventhQuality::None) => "°",
        (TriadQuality::Augmented, SeventhQuality::None) => "+",
        (TriadQuality::Diminished, SeventhQuality::HalfDiminished7) => "ø7",
        (TriadQuality::Diminished, SeventhQuality::Diminished7) => "°7",
        (TriadQuality::Augmented, SeventhQuality::Dominant7) => "+7",
        (_, SeventhQuality::Major7) => "maj7",
        (_, SeventhQuality::None) => "",
        (_, _) => "7",
    };
    format!("{prefix}{numeral}{suffix}{}", tension_suffix(recipe))
}

fn tension_suffix(recipe: &ChordRecipe) -> String {
    let tensions = recipe.tensions();
    if tensions.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = tensions.iter().map(|t| t.symbol()).collect();
    format!("({})", names.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Tension;
    use crate::key::Mode;
    use crate::parse::parse_chord_identifier;

    #[test]
    fn test_chord_symbols() {
        let c = Key::c_major();
        let sym = |text: &str| chord_symbol(&c, &parse_chord_identifier(&c, text).unwrap());
        assert_eq!(sym("V7"), "G7");
        assert_eq!(sym("bII"), "Db");
        assert_eq!(sym("vii°"), "Bdim");
        assert_eq!(sym("V/V"), "D");
        assert_eq!(sym("iiø7"), "Dm7b5");
        assert_eq!(sym("I+"), "Caug");
    }

    #[test]
    fn test_symbol_with_tensions() {
        let c = Key::c_major();
        let g7b9 = ChordRecipe::triad(5, TriadQuality::Major)
            .with_seventh(SeventhQuality::Dominant7)
            .with_tension(Tension::FlatNine);
        assert_eq!(chord_symbol(&c, &g7b9), "G7(b9)");
    }

    #[test]
    fn test_roman_numerals() {
        let c = Key::c_major();
        assert_eq!(roman_numeral(&c, &ChordRecipe::diatonic(&c, 2)), "ii");
        assert_eq!(roman_numeral(&c, &ChordRecipe::diatonic(&c, 7)), "vii°");
        let bvi = parse_chord_identifier(&c, "bVI").unwrap();
        assert_eq!(roman_numeral(&c, &bvi), "bVI");

        let a_minor = Key::new(9, Mode::Aeolian);
        assert_eq!(roman_numeral(&a_minor, &ChordRecipe::diatonic(&a_minor, 1)), "i");
        assert_eq!(roman_numeral(&a_minor, &ChordRecipe::diatonic(&a_minor, 2)), "ii°");
    }

    #[test]
    fn test_symbol_spelling_in_flat_key() {
        let f = Key::new(5, Mode::Ionian);
        let iv = ChordRecipe::diatonic(&f, 4);
        assert_eq!(chord_symbol(&f, &iv), "Bb");
    }
}
