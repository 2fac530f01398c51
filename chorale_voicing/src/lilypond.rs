// LilyPond sheet music output from voiced regions.
//
// Converts a voiced progression into a LilyPond (.ly) text file that can be
// engraved into PDF/SVG sheet music. Each of the four lanes gets its own
// staff in a ChoirStaff, and the soprano carries the chord symbol of every
// region as a markup. When the melody moves within a region it gets an
// extra staff above the choir.
//
// Like midi.rs, each lane is first flattened into note/rest events with
// durations, then serialized. LilyPond requires durations expressed as
// power-of-two note values (with optional dots), and notes crossing
// barlines must be split into tied segments.
//
// Pitch names follow the key's signature side (bes in F major, ais in B
// major). Uses absolute pitches (not \relative).

use crate::melody::MelodyEvent;
use crate::midi::melody_needs_track;
use crate::region::ChordRegion;
use crate::satb::{Lane, VoicedChord};
use chorale_theory::{Key, Mode};
use std::fmt::Write;
use std::path::Path;

/// Pitch class names in LilyPond notation for flat keys.
const LY_FLAT_NAMES: [&str; 12] = [
    "c", "des", "d", "ees", "e", "f", "ges", "g", "aes", "a", "bes", "b",
];

/// Pitch class names in LilyPond notation for sharp keys and C.
const LY_SHARP_NAMES: [&str; 12] = [
    "c", "cis", "d", "dis", "e", "f", "fis", "g", "gis", "a", "ais", "b",
];

/// Eighth notes per 4/4 bar.
const BAR_LENGTH: usize = 8;

fn ly_pitch_name(pc: u8, key: &Key) -> &'static str {
    if key.uses_flats() {
        LY_FLAT_NAMES[(pc % 12) as usize]
    } else {
        LY_SHARP_NAMES[(pc % 12) as usize]
    }
}

/// Convert a MIDI pitch number to a LilyPond absolute pitch string.
///
/// LilyPond's `c` with no octave marks = MIDI 48 (C3).
/// Each `'` raises one octave, each `,` lowers one octave.
pub fn midi_to_ly_note(midi_pitch: u8, key: &Key) -> String {
    let octave = (midi_pitch / 12) as i8 - 4; // 0 at MIDI 48-59
    let mut result = ly_pitch_name(midi_pitch % 12, key).to_string();
    let mark = if octave > 0 { '\'' } else { ',' };
    for _ in 0..octave.unsigned_abs() {
        result.push(mark);
    }
    result
}

/// A valid LilyPond duration: note value (in eighth-note beats) and its
/// text representation.
const DURATION_TABLE: [(usize, &str); 6] = [
    (8, "1"),  // whole note
    (6, "2."), // dotted half
    (4, "2"),  // half note
    (3, "4."), // dotted quarter
    (2, "4"),  // quarter note
    (1, "8"),  // eighth note
];

/// Decompose a duration (in eighth-note beats) into LilyPond duration
/// strings, largest first. Multiple parts are connected with ties.
pub fn decompose_duration(mut beats: usize) -> Vec<&'static str> {
    let mut parts = Vec::new();
    for &(value, name) in &DURATION_TABLE {
        while beats >= value {
            parts.push(name);
            beats -= value;
        }
    }
    parts
}

/// Split a duration at 4/4 barlines. A note starting at `start_beat` that
/// crosses a barline is split into pieces that each fit within one bar.
pub fn split_at_barlines(start_beat: usize, duration: usize) -> Vec<usize> {
    let mut fragments = Vec::new();
    let mut remaining = duration;
    let mut pos = start_beat;
    while remaining > 0 {
        let bar_end = (pos / BAR_LENGTH + 1) * BAR_LENGTH;
        let frag = remaining.min(bar_end - pos);
        fragments.push(frag);
        remaining -= frag;
        pos += frag;
    }
    fragments
}

/// The `\key` command for a key. Aeolian is written \minor and Ionian
/// \major.
pub fn key_to_ly(key: &Key) -> String {
    let mode_name = match key.mode {
        Mode::Ionian => "major",
        Mode::Dorian => "dorian",
        Mode::Phrygian => "phrygian",
        Mode::Lydian => "lydian",
        Mode::Mixolydian => "mixolydian",
        Mode::Aeolian => "minor",
        Mode::Locrian => "locrian",
    };
    format!("\\key {} \\{}", ly_pitch_name(key.tonic, key), mode_name)
}

/// A note or rest in one staff, in eighth-note beats.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StaffEvent {
    Note {
        pitch: u8,
        start: usize,
        duration: usize,
        markup: Option<String>,
    },
    Rest {
        start: usize,
        duration: usize,
    },
}

/// Fill gaps between `(pitch, start, end, markup)` notes with rests.
fn with_rests(notes: impl Iterator<Item = (u8, u32, u32, Option<String>)>) -> Vec<StaffEvent> {
    let mut events = Vec::new();
    let mut pos = 0usize;
    for (pitch, start, end, markup) in notes {
        let (start, end) = (start as usize, end as usize);
        if start > pos {
            events.push(StaffEvent::Rest {
                start: pos,
                duration: start - pos,
            });
        }
        events.push(StaffEvent::Note {
            pitch,
            start,
            duration: end - start,
            markup,
        });
        pos = end;
    }
    events
}

fn lane_events(regions: &[ChordRegion], voiced: &[VoicedChord], lane: Lane) -> Vec<StaffEvent> {
    with_rests(regions.iter().zip(voiced).map(|(region, chord)| {
        let markup = (lane == Lane::Soprano).then(|| region.event.symbol());
        (chord.pitch(lane), region.start, region.end, markup)
    }))
}

fn melody_events(melody: &[MelodyEvent]) -> Vec<StaffEvent> {
    with_rests(
        melody
            .iter()
            .map(|m| (m.pitch, m.start, m.end(), None)),
    )
}

/// Serialize staff events as a LilyPond music expression.
fn render_music(events: &[StaffEvent], key: &Key) -> String {
    let mut out = String::new();
    for event in events {
        let (start, duration, name, markup) = match event {
            StaffEvent::Note {
                pitch,
                start,
                duration,
                markup,
            } => (*start, *duration, midi_to_ly_note(*pitch, key), markup.as_deref()),
            StaffEvent::Rest { start, duration } => (*start, *duration, "r".to_string(), None),
        };
        let is_note = matches!(event, StaffEvent::Note { .. });
        let fragments = split_at_barlines(start, duration);
        let mut first = true;
        for (i, frag) in fragments.iter().enumerate() {
            let parts = decompose_duration(*frag);
            for (j, dur_str) in parts.iter().enumerate() {
                if !out.is_empty() {
                    out.push(' ');
                }
                let _ = write!(out, "{name}{dur_str}");
                if first && let Some(text) = markup {
                    let _ = write!(out, "^\\markup {{ \"{}\" }}", text.replace('"', "\\\""));
                }
                first = false;
                let more = j + 1 < parts.len() || i + 1 < fragments.len();
                if is_note && more {
                    out.push('~');
                }
            }
        }
    }
    out
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Generate a complete LilyPond file from voiced regions.
pub fn score_to_lilypond(
    key: &Key,
    regions: &[ChordRegion],
    voiced: &[VoicedChord],
    melody: &[MelodyEvent],
    tempo_bpm: u16,
    title: Option<&str>,
) -> String {
    let mut ly = String::new();
    ly.push_str("\\version \"2.24.0\"\n\n");

    let subtitle = format!(
        "{} on {}",
        title_case(&key.mode.to_string()),
        ly_pitch_name(key.tonic, key).to_uppercase()
    );
    let _ = write!(
        ly,
        "\\header {{\n  title = \"{}\"\n  subtitle = \"{}\"\n}}\n\n",
        title.unwrap_or("Chorale"),
        subtitle
    );
    let _ = write!(
        ly,
        "global = {{\n  {} \\time 4/4 \\tempo 4 = {}\n}}\n\n",
        key_to_ly(key),
        tempo_bpm
    );

    let with_melody = !melody.is_empty() && melody_needs_track(regions, melody);
    if with_melody {
        let music = render_music(&melody_events(melody), key);
        let _ = write!(ly, "melody = \\absolute {{\n  \\global\n  {music}\n}}\n\n");
    }

    // Staves run top-down: soprano first.
    let lanes = [Lane::Soprano, Lane::Alto, Lane::Tenor, Lane::Bass];
    let clefs = ["treble", "treble", "\"treble_8\"", "bass"];
    for lane in lanes {
        let music = render_music(&lane_events(regions, voiced, lane), key);
        let _ = write!(
            ly,
            "{} = \\absolute {{\n  \\global\n  {}\n}}\n\n",
            lane.name().to_lowercase(),
            music
        );
    }

    ly.push_str("\\score {\n  <<\n");
    if with_melody {
        ly.push_str(
            "    \\new Staff = \"Melody\" \\with { instrumentName = \"Melody\" } {\n      \\clef treble\n      \\melody\n    }\n",
        );
    }
    ly.push_str("    \\new ChoirStaff <<\n");
    for (lane, clef) in lanes.iter().zip(clefs) {
        let _ = writeln!(
            ly,
            "      \\new Staff = \"{name}\" \\with {{ instrumentName = \"{name}\" }} {{\n        \\clef {clef}\n        \\{var}\n      }}",
            name = lane.name(),
            var = lane.name().to_lowercase(),
        );
    }
    ly.push_str("    >>\n  >>\n");
    ly.push_str("  \\layout { }\n");
    ly.push_str("  \\midi { }\n");
    ly.push_str("}\n");
    ly
}

/// Write a LilyPond file from voiced regions.
pub fn write_lilypond(
    key: &Key,
    regions: &[ChordRegion],
    voiced: &[VoicedChord],
    melody: &[MelodyEvent],
    tempo_bpm: u16,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let ly = score_to_lilypond(key, regions, voiced, melody, tempo_bpm, None);
    std::fs::write(path, ly)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineSpec;
    use crate::region::build_regions;

    #[test]
    fn test_midi_to_ly_note_octaves() {
        let c = Key::c_major();
        assert_eq!(midi_to_ly_note(48, &c), "c");
        assert_eq!(midi_to_ly_note(60, &c), "c'");
        assert_eq!(midi_to_ly_note(84, &c), "c'''");
        assert_eq!(midi_to_ly_note(36, &c), "c,");
        assert_eq!(midi_to_ly_note(24, &c), "c,,");
    }

    #[test]
    fn test_midi_to_ly_note_follows_key() {
        let f = Key::new(5, Mode::Ionian);
        let e = Key::new(4, Mode::Ionian);
        assert_eq!(midi_to_ly_note(70, &f), "bes'");
        assert_eq!(midi_to_ly_note(70, &e), "ais'");
        assert_eq!(midi_to_ly_note(61, &Key::c_major()), "cis'");
    }

    #[test]
    fn test_decompose_duration() {
        assert_eq!(decompose_duration(8), vec!["1"]);
        assert_eq!(decompose_duration(3), vec!["4."]);
        // 5 = half + eighth
        assert_eq!(decompose_duration(5), vec!["2", "8"]);
        assert_eq!(decompose_duration(7), vec!["2.", "8"]);
        assert_eq!(decompose_duration(0), Vec::<&str>::new());
    }

    #[test]
    fn test_split_at_barlines() {
        assert_eq!(split_at_barlines(0, 4), vec![4]);
        assert_eq!(split_at_barlines(6, 4), vec![2, 2]);
        assert_eq!(split_at_barlines(4, 20), vec![4, 8, 8]);
        assert_eq!(split_at_barlines(8, 8), vec![8]);
    }

    #[test]
    fn test_key_to_ly() {
        assert_eq!(key_to_ly(&Key::new(2, Mode::Dorian)), "\\key d \\dorian");
        assert_eq!(key_to_ly(&Key::new(9, Mode::Aeolian)), "\\key a \\minor");
        assert_eq!(key_to_ly(&Key::new(10, Mode::Ionian)), "\\key bes \\major");
        assert_eq!(key_to_ly(&Key::new(11, Mode::Locrian)), "\\key b \\locrian");
    }

    #[test]
    fn test_gaps_become_rests_and_ties_cross_bars() {
        let events = with_rests([(60u8, 2u32, 12u32, None)].into_iter());
        assert_eq!(events.len(), 2);
        let music = render_music(&events, &Key::c_major());
        assert_eq!(music, "r4 c'2.~ c'2");
    }

    #[test]
    fn test_score_structure() {
        let key = Key::c_major();
        let regions = build_regions("C G7", &key, &TimelineSpec::default(), &[]).unwrap();
        let voiced = [VoicedChord::new([48, 55, 64, 72]), VoicedChord::new([43, 53, 59, 71])];
        let ly = score_to_lilypond(&key, &regions, &voiced, &[], 72, Some("Test Piece"));

        assert!(ly.contains("\\version"), "Missing version: {ly}");
        assert!(ly.contains("Test Piece"));
        assert!(ly.contains("Ionian on C"));
        assert!(ly.contains("\\key c \\major"));
        assert!(ly.contains("\\tempo 4 = 72"));
        assert!(ly.contains("ChoirStaff"));
        assert!(ly.contains("\\clef \"treble_8\""));
        assert!(ly.contains("\\clef bass"));
        assert!(ly.contains("c''1^\\markup { \"C\" }"), "{ly}");
        assert!(ly.contains("b'1^\\markup { \"G7\" }"), "{ly}");
        assert!(!ly.contains("\\melody"));
    }
}
