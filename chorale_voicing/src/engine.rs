// The voice-realization engine.
//
// `voice_lead_regions` walks the regions once, left to right. For each
// region it allocates tones to lanes (allocate.rs), resolves the previous
// region's tendency tones into it (tendency.rs), lets the unpinned lanes
// re-arrange for smoother motion (continuity.rs), and finally checks that
// every Required tone sounds and that a plain diminished triad kept its
// root, third and fifth. Each stage sees the final voicing of the region
// before it.
//
// The engine is deterministic: ties in the placement cost are broken by
// pitch, and the arrangement search is exhaustive.

use crate::allocate::{allocate, infeasible, required_tones};
use crate::config::VoicingOptions;
use crate::continuity::improve_continuity;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, emit};
use crate::error::HarmonyError;
use crate::placement::{LaneTarget, Reference, RegisterBands};
use crate::region::ChordRegion;
use crate::satb::{Lane, VoicedChord};
use crate::tendency::{CurrentChord, PriorChord, resolve_tendencies};
use chorale_theory::{ChordRecipe, ChordTones, Key};

/// Voice every region of a progression in four parts.
pub fn voice_lead_regions(
    key: &Key,
    regions: &[ChordRegion],
    options: &VoicingOptions,
    sink: &mut dyn DiagnosticsSink,
) -> Result<Vec<VoicedChord>, HarmonyError> {
    options.validate()?;
    let bands = RegisterBands::from_options(options);
    let mut voiced: Vec<VoicedChord> = Vec::with_capacity(regions.len());
    let mut prior: Option<(ChordRecipe, ChordTones)> = None;

    for (index, region) in regions.iter().enumerate() {
        let recipe = region.event.recipe;
        let tones = recipe.tones(key);
        let lock = region
            .melody_lock()
            .filter(|_| options.use_melody_constraint);
        let reference = voiced
            .last()
            .map_or(Reference::Anchors, |v| Reference::Previous(v.pitches));

        let allocated = allocate(index, &recipe, &tones, lock, &bands, &reference, sink)?;

        let mut pitches = allocated;
        let mut forced = [None; 4];
        if let (Some((prev_recipe, prev_tones)), Some(prev)) = (&prior, voiced.last()) {
            let resolution = resolve_tendencies(
                &PriorChord {
                    recipe: prev_recipe,
                    tones: prev_tones,
                    pitches: prev.pitches,
                },
                &CurrentChord {
                    index,
                    recipe: &recipe,
                    tones: &tones,
                    lock,
                    allocated,
                },
                &bands,
                sink,
            );
            pitches = resolution.pitches;
            forced = resolution.forced;
        }

        let pinned = pinned_lanes(&pitches, &forced, lock, tones.root());
        pitches = improve_continuity(index, pitches, &pinned, &bands, &reference, sink);

        check_region(index, &recipe, &tones, lock, pitches)?;
        emit(sink, || DiagnosticEvent::RegionVoiced { region: index, pitches });
        voiced.push(VoicedChord::new(pitches));
        prior = Some((recipe, tones));
    }
    Ok(voiced)
}

/// Lanes the continuity pass must leave alone.
fn pinned_lanes(
    pitches: &[u8; 4],
    forced: &[Option<u8>; 4],
    lock: Option<u8>,
    root: u8,
) -> [Option<LaneTarget>; 4] {
    let mut pinned: [Option<LaneTarget>; 4] = forced.map(|f| f.map(LaneTarget::Exact));
    if let Some(pitch) = lock {
        pinned[Lane::Soprano.index()] = Some(LaneTarget::Exact(pitch));
    }
    if pinned[Lane::Bass.index()].is_none() && pitches[Lane::Bass.index()] % 12 == root {
        pinned[Lane::Bass.index()] = Some(LaneTarget::Class(root));
    }
    pinned
}

/// Final per-region guarantees: ordering, melody lock, Required coverage and
/// diminished identity.
fn check_region(
    index: usize,
    recipe: &ChordRecipe,
    tones: &ChordTones,
    lock: Option<u8>,
    pitches: [u8; 4],
) -> Result<(), HarmonyError> {
    let required = required_tones(recipe, tones);
    let sounding = pitches.map(|p| p % 12);
    let covered = required.iter().all(|pc| sounding.contains(pc));
    let identity = !recipe.is_plain_diminished()
        || [tones.root(), tones.third(), tones.fifth()]
            .iter()
            .all(|pc| sounding.contains(pc));
    let ordered = pitches.windows(2).all(|w| w[0] <= w[1]);
    let locked = lock.is_none_or(|p| pitches[Lane::Soprano.index()] == p);
    if covered && identity && ordered && locked {
        Ok(())
    } else {
        Err(infeasible(index, &required, &pitches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineSpec;
    use crate::diagnostics::{CollectingSink, NoopSink};
    use crate::melody::parse_melody;
    use crate::region::build_regions;

    /// Counts `record` calls; reports itself disabled.
    struct CountingSink {
        record_calls: usize,
    }

    impl DiagnosticsSink for CountingSink {
        fn enabled(&self) -> bool {
            false
        }

        fn record(&mut self, _event: &DiagnosticEvent) {
            self.record_calls += 1;
        }
    }

    fn voice(progression: &str, melody: &str) -> Vec<VoicedChord> {
        let key = Key::c_major();
        let timeline = TimelineSpec::default();
        let melody = parse_melody(melody, &timeline).unwrap();
        let regions = build_regions(progression, &key, &timeline, &melody).unwrap();
        voice_lead_regions(&key, &regions, &VoicingOptions::default(), &mut NoopSink).unwrap()
    }

    #[test]
    fn test_augmented_chain_with_melody() {
        let voiced = voice("C Caug F", "E4 E4 C4");
        let pitches: Vec<[u8; 4]> = voiced.iter().map(|v| v.pitches).collect();
        assert_eq!(pitches, vec![[48, 55, 60, 64], [48, 56, 60, 64], [53, 57, 57, 60]]);
    }

    #[test]
    fn test_seventh_chain() {
        let voiced = voice("C7 Fm", "");
        assert_eq!(voiced[0].pitches, [48, 58, 64, 67]);
        assert_eq!(voiced[1].pitches, [53, 56, 60, 68]);
    }

    #[test]
    fn test_dominant_seventh_resolves_in_same_lane() {
        let voiced = voice("G7 C", "");
        let f_lanes = voiced[0].lanes_holding(5);
        assert_eq!(f_lanes.len(), 1);
        let lane = f_lanes[0];
        assert_eq!(voiced[1].pitch(lane), voiced[0].pitch(lane) - 1);
    }

    #[test]
    fn test_melody_constraint_can_be_disabled() {
        let key = Key::c_major();
        let timeline = TimelineSpec::default();
        let melody = parse_melody("G5", &timeline).unwrap();
        let regions = build_regions("C", &key, &timeline, &melody).unwrap();
        let options = VoicingOptions {
            use_melody_constraint: false,
            ..Default::default()
        };
        let voiced = voice_lead_regions(&key, &regions, &options, &mut NoopSink).unwrap();
        assert_ne!(voiced[0].pitch(Lane::Soprano), 79);
    }

    #[test]
    fn test_rejects_unsupported_voice_count() {
        let options = VoicingOptions {
            voice_count: 3,
            ..Default::default()
        };
        let err = voice_lead_regions(&Key::c_major(), &[], &options, &mut NoopSink).unwrap_err();
        assert!(matches!(err, HarmonyError::UnsupportedVoiceCount(3)));
    }

    #[test]
    fn test_disabled_sink_is_never_invoked() {
        let key = Key::c_major();
        let timeline = TimelineSpec::default();
        let regions = build_regions("C7 Fm Caug F G7 C", &key, &timeline, &[]).unwrap();
        let mut sink = CountingSink { record_calls: 0 };
        voice_lead_regions(&key, &regions, &VoicingOptions::default(), &mut sink).unwrap();
        assert_eq!(sink.record_calls, 0);
    }

    #[test]
    fn test_collecting_sink_sees_every_region() {
        let key = Key::c_major();
        let timeline = TimelineSpec::default();
        let regions = build_regions("C7 Fm", &key, &timeline, &[]).unwrap();
        let mut sink = CollectingSink::new();
        voice_lead_regions(&key, &regions, &VoicingOptions::default(), &mut sink).unwrap();
        let voiced_events = sink
            .events
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::RegionVoiced { .. }))
            .count();
        assert_eq!(voiced_events, 2);
        assert!(sink.events.contains(&DiagnosticEvent::TendencyForced {
            region: 1,
            lane: Lane::Tenor,
            from_pc: 10,
            to_pc: 8,
        }));
    }
}
