// Melody harmonization: one chord per melody note.
//
// Each note is analyzed, given candidates (candidates.rs), and one candidate
// is chosen with a small amount of state, the previously chosen chord:
//
// - First note: the tonic chord when `prefer_tonic_start` is set and it is
//   a candidate, otherwise the first candidate.
// - Later notes with no candidates reuse the previous chord as-is.
// - Later notes with candidates keep the previous chord when
//   `prefer_continuity` is set and it is still a candidate; otherwise the
//   transition table keyed by the previous label names preferred successors
//   (I → ii/IV, then V; ii and IV → V/I; V → I/vi; vi → ii/IV; iii → vi;
//   vii° → I/iii). Within a preference set the generator's order decides.
//   Labels the table does not cover fall back to the first candidate.
//
// A note with nothing to choose from and nothing to reuse is left
// unresolved and contributes no region.

use crate::candidates::{Candidate, generate_candidates};
use crate::config::HeuristicSettings;
use crate::melody::{MelodyAnalysis, MelodyEvent, analyze_note};
use crate::region::{ChordEvent, ChordRegion};
use chorale_theory::Key;
use serde::{Deserialize, Serialize};

/// One harmonized melody note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonizedChordStep {
    pub event: MelodyEvent,
    pub analysis: MelodyAnalysis,
    pub candidates: Vec<Candidate>,
    /// None when the step is unresolved.
    pub chosen: Option<Candidate>,
    pub reason: String,
}

/// Preferred successor sets for a previous label, tried in order.
fn transitions(previous: &str) -> &'static [&'static [&'static str]] {
    match previous {
        "I" => &[&["ii", "IV"], &["V"]],
        "ii" | "IV" => &[&["V", "I"]],
        "V" => &[&["I", "vi"]],
        "vi" => &[&["ii", "IV"]],
        "iii" => &[&["vi"]],
        "vii°" => &[&["I", "iii"]],
        _ => &[],
    }
}

fn choose_first(candidates: &[Candidate], settings: &HeuristicSettings) -> (usize, &'static str) {
    if settings.prefer_tonic_start
        && let Some(i) = candidates.iter().position(Candidate::is_tonic)
    {
        return (i, "tonic start");
    }
    (0, "first candidate")
}

fn choose_next(
    candidates: &[Candidate],
    previous: &Candidate,
    settings: &HeuristicSettings,
) -> (usize, String) {
    if settings.prefer_continuity
        && let Some(i) = candidates.iter().position(|c| c.label == previous.label)
    {
        return (i, format!("continuity with {}", previous.label));
    }
    for preferred in transitions(&previous.label) {
        if let Some(i) = candidates
            .iter()
            .position(|c| preferred.contains(&c.label.as_str()))
        {
            return (i, format!("{} -> {}", previous.label, candidates[i].label));
        }
    }
    (0, "first candidate".to_string())
}

/// Pick a chord for every melody note.
pub fn harmonize_melody(
    melody: &[MelodyEvent],
    key: &Key,
    settings: &HeuristicSettings,
) -> Vec<HarmonizedChordStep> {
    let mut steps: Vec<HarmonizedChordStep> = Vec::with_capacity(melody.len());
    let mut previous: Option<Candidate> = None;
    for (i, event) in melody.iter().enumerate() {
        let analysis = analyze_note(key, event.pitch, event.hint);
        let candidates = generate_candidates(key, &analysis);
        let (chosen, reason) = match (&previous, candidates.is_empty()) {
            (Some(prev), true) if i > 0 => (Some(prev.clone()), "reused".to_string()),
            (_, true) => (None, "no candidate fits".to_string()),
            (None, false) if i == 0 => {
                let (idx, why) = choose_first(&candidates, settings);
                (Some(candidates[idx].clone()), why.to_string())
            }
            (None, false) => (Some(candidates[0].clone()), "first candidate".to_string()),
            (Some(prev), false) => {
                let (idx, why) = choose_next(&candidates, prev, settings);
                (Some(candidates[idx].clone()), why)
            }
        };
        if chosen.is_some() {
            previous = chosen.clone();
        }
        steps.push(HarmonizedChordStep {
            event: *event,
            analysis,
            candidates,
            chosen,
            reason,
        });
    }
    steps
}

/// One region per resolved step, spanning the step's melody note. The
/// soprano of each region is locked to that note.
pub fn regions_from_steps(key: &Key, steps: &[HarmonizedChordStep]) -> Vec<ChordRegion> {
    steps
        .iter()
        .filter_map(|step| step.chosen.as_ref().map(|c| (step, c)))
        .enumerate()
        .map(|(index, (step, chosen))| ChordRegion {
            index,
            start: step.event.start,
            end: step.event.end(),
            event: ChordEvent {
                key: *key,
                recipe: chosen.recipe,
                label: chosen.label.clone(),
                start: step.event.start,
                melody_pitch: Some(step.event.pitch),
            },
            melody: vec![step.event],
        })
        .collect()
}
