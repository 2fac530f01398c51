// MIDI output from voiced regions.
//
// Converts a voiced progression into a Standard MIDI File (SMF) for
// playback. Each lane maps to its own MIDI track, soprano first, and sounds
// its pitch for the full span of every region. A lane that keeps the same
// pitch across a region boundary is held rather than re-struck. When the
// melody has more notes than the soprano's one-per-region, it gets a fifth
// track of its own.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1
// (multi-track).

use crate::melody::MelodyEvent;
use crate::region::ChordRegion;
use crate::satb::{Lane, VoicedChord};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per eighth note, the timeline's unit.
const TICKS_PER_EIGHTH: u32 = TICKS_PER_QUARTER as u32 / 2;

/// Choir aahs.
const CHOIR_PROGRAM: u8 = 52;

const VELOCITY: u8 = 80;

/// A sounding note in eighth-note ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    pitch: u8,
    start: u32,
    end: u32,
}

/// Lane pitches laid out over the regions, merging held pitches.
fn lane_spans(regions: &[ChordRegion], voiced: &[VoicedChord], lane: Lane) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for (region, chord) in regions.iter().zip(voiced) {
        let pitch = chord.pitch(lane);
        match spans.last_mut() {
            Some(last) if last.pitch == pitch && last.end == region.start => last.end = region.end,
            _ => spans.push(Span {
                pitch,
                start: region.start,
                end: region.end,
            }),
        }
    }
    spans
}

fn melody_spans(melody: &[MelodyEvent]) -> Vec<Span> {
    melody
        .iter()
        .map(|m| Span {
            pitch: m.pitch,
            start: m.start,
            end: m.end(),
        })
        .collect()
}

fn meta(kind: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(kind),
    }
}

fn note_track(name: &'static str, channel: u4, spans: &[Span]) -> Track<'static> {
    let mut track: Track<'static> = vec![
        meta(MetaMessage::TrackName(name.as_bytes())),
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(CHOIR_PROGRAM),
                },
            },
        },
    ];
    let mut last_event_tick: u32 = 0;
    for span in spans {
        let on_tick = span.start.saturating_mul(TICKS_PER_EIGHTH);
        let off_tick = span.end.saturating_mul(TICKS_PER_EIGHTH);
        track.push(TrackEvent {
            delta: u28::new(on_tick.saturating_sub(last_event_tick)),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key: u7::new(span.pitch),
                    vel: u7::new(VELOCITY),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(off_tick.saturating_sub(on_tick)),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key: u7::new(span.pitch),
                    vel: u7::new(0),
                },
            },
        });
        last_event_tick = off_tick;
    }
    track.push(meta(MetaMessage::EndOfTrack));
    track
}

/// Whether the melody carries notes the soprano lane does not.
pub(crate) fn melody_needs_track(regions: &[ChordRegion], melody: &[MelodyEvent]) -> bool {
    regions.iter().any(|r| r.melody.len() > 1)
        || melody.len() != regions.iter().filter(|r| r.melody_lock().is_some()).count()
}

/// Convert voiced regions to an in-memory SMF.
pub fn score_to_smf(
    regions: &[ChordRegion],
    voiced: &[VoicedChord],
    melody: &[MelodyEvent],
    tempo_bpm: u16,
) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let tempo_microseconds = 60_000_000 / u32::from(tempo_bpm.max(1));
    smf.tracks.push(vec![
        meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        meta(MetaMessage::EndOfTrack),
    ]);

    for (channel, lane) in Lane::ALL.iter().rev().enumerate() {
        let spans = lane_spans(regions, voiced, *lane);
        smf.tracks
            .push(note_track(lane.name(), u4::new(channel as u8), &spans));
    }

    if !melody.is_empty() && melody_needs_track(regions, melody) {
        smf.tracks
            .push(note_track("Melody", u4::new(4), &melody_spans(melody)));
    }
    smf
}

/// Convert voiced regions to MIDI and write to a file.
pub fn write_midi(
    regions: &[ChordRegion],
    voiced: &[VoicedChord],
    melody: &[MelodyEvent],
    tempo_bpm: u16,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let smf = score_to_smf(regions, voiced, melody, tempo_bpm);
    let mut buf = Vec::new();
    smf.write(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineSpec;
    use crate::melody::parse_melody;
    use crate::region::build_regions;
    use chorale_theory::Key;

    fn regions(progression: &str, melody: &[MelodyEvent]) -> Vec<ChordRegion> {
        build_regions(progression, &Key::c_major(), &TimelineSpec::default(), melody).unwrap()
    }

    #[test]
    fn test_held_pitches_merge() {
        let regions = regions("C F", &[]);
        let voiced = [VoicedChord::new([48, 55, 64, 72]), VoicedChord::new([53, 57, 65, 72])];
        let soprano = lane_spans(&regions, &voiced, Lane::Soprano);
        assert_eq!(
            soprano,
            vec![Span {
                pitch: 72,
                start: 0,
                end: 16
            }]
        );
        assert_eq!(lane_spans(&regions, &voiced, Lane::Bass).len(), 2);
    }

    #[test]
    fn test_score_to_smf_tracks() {
        let regions = regions("C G", &[]);
        let voiced = [VoicedChord::new([48, 55, 64, 72]), VoicedChord::new([43, 55, 62, 71])];
        let smf = score_to_smf(&regions, &voiced, &[], 72);
        // 1 tempo track + 4 lane tracks
        assert_eq!(smf.tracks.len(), 5);
        assert_eq!(
            smf.tracks[1][0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(b"Soprano"))
        );
    }

    #[test]
    fn test_busy_melody_gets_its_own_track() {
        let melody = parse_melody("E4:4 D4:4 C4", &TimelineSpec::default()).unwrap();
        let regions = regions("C G", &melody);
        let voiced = [VoicedChord::new([48, 55, 60, 64]), VoicedChord::new([43, 55, 59, 62])];
        let smf = score_to_smf(&regions, &voiced, &melody, 72);
        assert_eq!(smf.tracks.len(), 6);
    }

    #[test]
    fn test_far_ticks_saturate() {
        let melody = [MelodyEvent {
            pitch: 64,
            hint: chorale_theory::AccidentalHint::None,
            start: u32::MAX - 4,
            duration: 8,
        }];
        let spans = melody_spans(&melody);
        assert_eq!(spans[0].end, u32::MAX);
        let regions = regions("C", &[]);
        let voiced = [VoicedChord::new([48, 55, 64, 72])];
        let smf = score_to_smf(&regions, &voiced, &melody, 72);
        assert_eq!(smf.tracks.len(), 6);
    }

    #[test]
    fn test_smf_serializes() {
        let regions = regions("C", &[]);
        let voiced = [VoicedChord::new([48, 55, 64, 72])];
        let mut buf = Vec::new();
        score_to_smf(&regions, &voiced, &[], 90)
            .write(&mut buf)
            .unwrap();
        assert_eq!(&buf[..4], b"MThd");
    }
}
