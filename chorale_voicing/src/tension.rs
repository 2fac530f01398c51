// Tension classification for display.
//
// Looks at a realized voicing and names every sounding pitch class that is
// not a chord tone but sits a b9, 9, #9, 11 or #11 above the root. Ninths
// are reported as color tones. A natural 11 is a color tone over a chord
// with a minor third; over a major third it reads as a suspension (flagged
// as clashing when the third also sounds), except over a major seventh
// without its third, where it is a plain non-chord tone. A #11 is a color
// tone over a major third and a non-chord tone otherwise.
//
// The report also lists tensions the chord identifier asked for that no
// voice sounds. Nothing here feeds back into the voicing.

use crate::satb::VoicedChord;
use chorale_theory::{ChordRecipe, Key, SeventhQuality, Tension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneClass {
    ColorTone,
    Suspension { clash: bool },
    NonChordTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensionNote {
    pub pitch_class: u8,
    pub tension: Tension,
    pub class: ToneClass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensionReport {
    pub realized: Vec<TensionNote>,
    /// Requested by the identifier but not sounding.
    pub missing: Vec<Tension>,
}

fn tension_at(interval: u8) -> Option<Tension> {
    match interval {
        1 => Some(Tension::FlatNine),
        2 => Some(Tension::Nine),
        3 => Some(Tension::SharpNine),
        5 => Some(Tension::Eleven),
        6 => Some(Tension::SharpEleven),
        _ => None,
    }
}

pub fn classify_tensions(key: &Key, recipe: &ChordRecipe, voiced: &VoicedChord) -> TensionReport {
    let tones = recipe.tones(key);
    let root = tones.root();
    let sounding = voiced.distinct_pitch_classes();
    let major_third = recipe.quality().has_major_third();
    let third_sounds = sounding.contains(&tones.third());

    let mut report = TensionReport::default();
    for &pc in &sounding {
        if tones.contains(pc) {
            continue;
        }
        let Some(tension) = tension_at((pc + 12 - root) % 12) else {
            continue;
        };
        let class = match tension {
            Tension::FlatNine | Tension::Nine | Tension::SharpNine | Tension::Thirteen => {
                ToneClass::ColorTone
            }
            Tension::Eleven if !major_third => ToneClass::ColorTone,
            Tension::Eleven if third_sounds => ToneClass::Suspension { clash: true },
            Tension::Eleven if recipe.seventh() == SeventhQuality::Major7 => {
                ToneClass::NonChordTone
            }
            Tension::Eleven => ToneClass::Suspension { clash: false },
            Tension::SharpEleven if major_third => ToneClass::ColorTone,
            Tension::SharpEleven => ToneClass::NonChordTone,
        };
        report.realized.push(TensionNote {
            pitch_class: pc,
            tension,
            class,
        });
    }
    report.missing = recipe
        .tensions()
        .iter()
        .filter(|t| !sounding.contains(&((root + t.interval()) % 12)))
        .collect();
    report
}
