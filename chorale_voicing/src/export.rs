// JSON export of a voiced progression.
//
// `VoicingReport` is the serializable summary the CLI writes with `--json`:
// the key, one entry per region (identifier, display symbol, Roman numeral,
// the four pitches with their spellings, the melody lock and the tension
// classification), and the harmonizer's steps when the regions came from a
// melody.

use crate::harmonize::HarmonizedChordStep;
use crate::region::ChordRegion;
use crate::satb::{Lane, VoicedChord};
use crate::tension::{TensionReport, classify_tensions};
use chorale_theory::{Key, roman_numeral, spell_midi};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionReport {
    pub index: usize,
    pub start: u32,
    pub end: u32,
    pub label: String,
    pub symbol: String,
    pub numeral: String,
    /// Bass, tenor, alto, soprano.
    pub pitches: [u8; 4],
    pub spelled: Vec<String>,
    pub melody_lock: Option<u8>,
    pub tensions: TensionReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicingReport {
    pub key: Key,
    pub regions: Vec<RegionReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<HarmonizedChordStep>,
}

impl VoicingReport {
    pub fn new(
        key: &Key,
        regions: &[ChordRegion],
        voiced: &[VoicedChord],
        steps: &[HarmonizedChordStep],
    ) -> Self {
        let regions = regions
            .iter()
            .zip(voiced)
            .map(|(region, chord)| RegionReport {
                index: region.index,
                start: region.start,
                end: region.end,
                label: region.event.label.clone(),
                symbol: region.event.symbol(),
                numeral: roman_numeral(key, &region.event.recipe),
                pitches: chord.pitches,
                spelled: Lane::ALL
                    .iter()
                    .map(|&lane| spell_midi(chord.pitch(lane), key))
                    .collect(),
                melody_lock: region.melody_lock(),
                tensions: classify_tensions(key, &region.event.recipe, chord),
            })
            .collect();
        VoicingReport {
            key: *key,
            regions,
            steps: steps.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn write_json(report: &VoicingReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, report.to_json()?)?;
    Ok(())
}
