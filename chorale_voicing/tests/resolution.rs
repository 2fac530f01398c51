// Integration tests: tendency-tone resolution across whole progressions.
//
// Every lane that holds a chordal seventh must land on the pitch class a
// semitone (else a whole tone) below when the next chord has one; every lane
// holding an augmented fifth must land a semitone above when the next chord
// has that. A melody-locked soprano is exempt. Checked over named
// progressions and a grid of chord sequences, with and without a melody.

use chorale_theory::{AccidentalHint, Key, TriadQuality};
use chorale_voicing::{
    ChordRegion, Lane, MelodyEvent, NoopSink, TimelineSpec, VoicedChord, VoicingOptions,
    build_regions, parse_melody, voice_lead_regions,
};

const CHORDS: [&str; 13] = [
    "C", "Dm", "Em", "F", "G", "Am", "G7", "C7", "A7", "E7", "Caug", "Fm", "Bdim",
];

/// Pitch class `lane` must move to from region `i - 1` into region `i`.
fn expected_resolution(
    key: &Key,
    regions: &[ChordRegion],
    prev: &VoicedChord,
    i: usize,
    lane: Lane,
) -> Option<u8> {
    let prev_recipe = regions[i - 1].event.recipe;
    let prev_tones = prev_recipe.tones(key);
    let tones = regions[i].event.recipe.tones(key);
    let held = prev.pitch_class(lane);
    if prev_tones.seventh_tone() == Some(held) {
        [11, 10]
            .into_iter()
            .map(|down| (held + down) % 12)
            .find(|&pc| tones.contains(pc))
    } else if prev_recipe.quality() == TriadQuality::Augmented && held == prev_tones.fifth() {
        Some((held + 1) % 12).filter(|&pc| tones.contains(pc))
    } else {
        None
    }
}

fn assert_resolved(key: &Key, regions: &[ChordRegion], voiced: &[VoicedChord], label: &str) {
    for i in 1..regions.len() {
        for lane in Lane::ALL {
            if lane == Lane::Soprano && regions[i].melody_lock().is_some() {
                continue;
            }
            if let Some(want) = expected_resolution(key, regions, &voiced[i - 1], i, lane) {
                assert_eq!(
                    voiced[i].pitch_class(lane),
                    want,
                    "{label}: {lane} into region {i}, {:?} -> {:?}",
                    voiced[i - 1].pitches,
                    voiced[i].pitches
                );
            }
        }
    }
}

fn voice(
    key: &Key,
    progression: &str,
    melody: &[MelodyEvent],
) -> (Vec<ChordRegion>, Vec<VoicedChord>) {
    let regions = build_regions(progression, key, &TimelineSpec::default(), melody).unwrap();
    let voiced = voice_lead_regions(key, &regions, &VoicingOptions::default(), &mut NoopSink)
        .unwrap_or_else(|e| panic!("{progression}: {e}"));
    (regions, voiced)
}

#[test]
fn test_named_progressions_resolve() {
    let key = Key::c_major();
    let progressions = [
        "C G7 Em", "C C7 A7", "C Caug A7", "C7 Fm", "C Caug F", "G7 C", "C7 F Bdim",
    ];
    for progression in progressions {
        let (regions, voiced) = voice(&key, progression, &[]);
        assert_resolved(&key, &regions, &voiced, progression);
    }
}

#[test]
fn test_seventh_resolves_below_a_low_melody() {
    let key = Key::c_major();
    let melody = parse_melody("G4 C4", &TimelineSpec::default()).unwrap();
    let (regions, voiced) = voice(&key, "G7 C", &melody);
    assert_eq!(voiced[1].pitch(Lane::Soprano), 60);
    assert_resolved(&key, &regions, &voiced, "G7 C / G4 C4");
    let f_lanes = voiced[0].lanes_holding(5);
    assert!(!f_lanes.is_empty());
    for lane in f_lanes {
        assert_eq!(voiced[1].pitch_class(lane), 4);
    }
}

#[test]
fn test_three_chord_grid_resolves() {
    let key = Key::c_major();
    for a in CHORDS {
        for b in CHORDS {
            for c in CHORDS {
                let progression = format!("{a} {b} {c}");
                let (regions, voiced) = voice(&key, &progression, &[]);
                assert_resolved(&key, &regions, &voiced, &progression);
            }
        }
    }
}

#[test]
fn test_grid_under_melody_resolves() {
    // Each chord carries its third as the melody, between C4 and B4.
    let key = Key::c_major();
    let timeline = TimelineSpec::default();
    for a in CHORDS {
        for b in CHORDS {
            let progression = format!("{a} {b}");
            let unlocked = build_regions(&progression, &key, &timeline, &[]).unwrap();
            let melody: Vec<MelodyEvent> = unlocked
                .iter()
                .map(|r| MelodyEvent {
                    pitch: 60 + r.event.recipe.tones(&key).third(),
                    hint: AccidentalHint::None,
                    start: r.start,
                    duration: r.end - r.start,
                })
                .collect();
            let (regions, voiced) = voice(&key, &progression, &melody);
            for (region, chord) in regions.iter().zip(&voiced) {
                assert_eq!(Some(chord.pitch(Lane::Soprano)), region.melody_lock());
            }
            assert_resolved(&key, &regions, &voiced, &progression);
        }
    }
}
