// Tendency-tone resolution between adjacent regions.
//
// A chordal seventh resolves down: every lane that held the previous
// region's seventh moves to the pitch class a semitone below if that is a
// chord tone of the current region, otherwise a whole tone below if that
// is, otherwise it is left alone. An augmented fifth resolves up a semitone
// when that is a chord tone. The lane keeps its identity, so the resolution
// happens in the voice that carried the tendency tone. A melody-locked
// soprano is never forced.
//
// The forced lane tries the resolution pitch in its own octave first and
// any other octave after that. For each of those the other lanes are
// settled two ways and the cheaper result wins:
//
// - keep the allocation: every other lane keeps its tone, and a tone the
//   forcing pushed out is re-assigned to a lane that doubles something
//   (never leaving a seventh or altered fifth doubled);
// - re-arrange: every unpinned lane is chosen afresh from the Required
//   tones still missing plus the allocator's fill.
//
// If neither places, every admissible doubling is tried for the unpinned
// lanes. All of this runs in the register bands first and then in the
// widened bands. Only when nothing places is the resolution dropped and the
// allocator's voicing kept.

use crate::allocate::{best_arrangement, doubling_fills, fill_pool, required_tones};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, emit};
use crate::placement::{Cost, LaneTarget, Reference, RegisterBands, solve};
use crate::satb::Lane;
use chorale_theory::{ChordRecipe, ChordTones, TriadQuality};

/// The previous region, as the resolution step sees it.
#[derive(Debug, Clone, Copy)]
pub struct PriorChord<'a> {
    pub recipe: &'a ChordRecipe,
    pub tones: &'a ChordTones,
    pub pitches: [u8; 4],
}

/// The current region and its fresh allocation.
#[derive(Debug, Clone, Copy)]
pub struct CurrentChord<'a> {
    pub index: usize,
    pub recipe: &'a ChordRecipe,
    pub tones: &'a ChordTones,
    pub lock: Option<u8>,
    pub allocated: [u8; 4],
}

/// Where a lane holding a tendency tone has to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pull {
    pub pc: u8,
    /// The resolution pitch in the lane's own octave, if it is a MIDI pitch.
    pub nearest: Option<u8>,
}

/// Outcome of resolving into the current region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub pitches: [u8; 4],
    /// Realized pitch of every lane the resolution pinned.
    pub forced: [Option<u8>; 4],
}

impl Resolution {
    fn unchanged(pitches: [u8; 4]) -> Self {
        Resolution {
            pitches,
            forced: [None; 4],
        }
    }

    fn pulled(pitches: [u8; 4], pulls: &[Option<Pull>; 4]) -> Self {
        Resolution {
            pitches,
            forced: std::array::from_fn(|i| pulls[i].map(|_| pitches[i])),
        }
    }
}

/// Which lanes of the previous region must resolve, and to what.
pub fn tendency_pulls(prior: &PriorChord<'_>, current: &CurrentChord<'_>) -> [Option<Pull>; 4] {
    let mut pulls = [None; 4];
    let locked_soprano = current.lock.is_some();
    for lane in Lane::ALL {
        if lane == Lane::Soprano && locked_soprano {
            continue;
        }
        let prev = prior.pitches[lane.index()];
        let pc = prev % 12;
        if prior.tones.seventh_tone() == Some(pc) {
            pulls[lane.index()] = [1, 2]
                .into_iter()
                .find(|step| current.tones.contains((pc + 12 - step) % 12))
                .map(|step| Pull {
                    pc: (pc + 12 - step) % 12,
                    nearest: prev.checked_sub(step),
                });
        } else if prior.recipe.quality() == TriadQuality::Augmented
            && pc == prior.tones.fifth()
            && current.tones.contains((pc + 1) % 12)
        {
            pulls[lane.index()] = Some(Pull {
                pc: (pc + 1) % 12,
                nearest: prev.checked_add(1).filter(|p| *p <= 127),
            });
        }
    }
    pulls
}

fn targets_for(pcs: &[u8; 4], pins: &[Option<LaneTarget>; 4]) -> [LaneTarget; 4] {
    std::array::from_fn(|i| pins[i].unwrap_or(LaneTarget::Class(pcs[i])))
}

/// Forced lanes moved, every other lane keeping its allocated tone. Returns
/// the placement and the repairs it needed.
fn keep_allocation(
    current: &CurrentChord<'_>,
    pins: &[Option<LaneTarget>; 4],
    bands: &RegisterBands,
    reference: &Reference,
) -> Option<([u8; 4], Cost, Vec<(Lane, u8)>)> {
    let before = current.allocated.map(|p| p % 12);
    let mut pcs = before;
    for (pc, pin) in pcs.iter_mut().zip(pins) {
        if let Some(target) = pin {
            *pc = target.pitch_class();
        }
    }

    // Tones the forcing pushed out, Required ones first.
    let required = required_tones(current.recipe, current.tones);
    let mut displaced: Vec<u8> = before
        .iter()
        .copied()
        .filter(|pc| !pcs.contains(pc))
        .collect();
    displaced.sort_unstable();
    displaced.dedup();
    displaced.sort_by_key(|pc| !required.contains(pc));

    let root = current.tones.root();
    let mut repairs = Vec::new();
    for tone in displaced {
        let movable = Lane::ALL.into_iter().filter(|&lane| {
            let pc = pcs[lane.index()];
            pins[lane.index()].is_none()
                && !(lane == Lane::Bass && pc == root)
                && pcs.iter().filter(|&&q| q == pc).count() > 1
        });
        let mut best: Option<(Lane, Cost)> = None;
        for lane in movable {
            let mut trial = pcs;
            trial[lane.index()] = tone;
            if let Some((_, cost)) = solve(&targets_for(&trial, pins), bands, reference)
                && best.as_ref().is_none_or(|(_, c)| cost < *c)
            {
                best = Some((lane, cost));
            }
        }
        match best {
            Some((lane, _)) => {
                pcs[lane.index()] = tone;
                repairs.push((lane, tone));
            }
            None if required.contains(&tone) => return None,
            None => {}
        }
    }
    if doubles_undoublable(current, &pcs) {
        return None;
    }
    solve(&targets_for(&pcs, pins), bands, reference).map(|(p, cost)| (p, cost, repairs))
}

/// Whether `pcs` sounds the seventh or an altered fifth more than once.
fn doubles_undoublable(current: &CurrentChord<'_>, pcs: &[u8; 4]) -> bool {
    let altered_fifth = current
        .recipe
        .quality()
        .has_altered_fifth()
        .then(|| current.tones.fifth());
    [current.tones.seventh_tone(), altered_fifth]
        .into_iter()
        .flatten()
        .any(|tone| pcs.iter().filter(|&&pc| pc == tone).count() > 1)
}

/// Every unpinned lane chosen afresh. With `any_fill` the fill runs over
/// every admissible doubling instead of the allocator's order.
fn rearrange(
    current: &CurrentChord<'_>,
    pins: &[Option<LaneTarget>; 4],
    bands: &RegisterBands,
    reference: &Reference,
    any_fill: bool,
) -> Option<([u8; 4], Cost)> {
    let (recipe, tones) = (current.recipe, current.tones);
    let root = tones.root();
    let sounding: Vec<u8> = pins.iter().flatten().map(|t| t.pitch_class()).collect();
    let mut missing: Vec<u8> = required_tones(recipe, tones)
        .into_iter()
        .filter(|pc| !sounding.contains(pc))
        .collect();
    let mut lanes: Vec<Lane> = Lane::ALL
        .into_iter()
        .filter(|l| pins[l.index()].is_none())
        .collect();
    if missing.len() > lanes.len() {
        return None;
    }
    let base = (*pins).map(|pin| pin.unwrap_or(LaneTarget::Class(root)));

    // The bass keeps the root whenever the rest still fits above it.
    let bass_root = lanes.first() == Some(&Lane::Bass)
        && (missing.contains(&root) || (sounding.contains(&root) && missing.len() < lanes.len()));
    let mut present = sounding;
    if bass_root {
        lanes.remove(0);
        missing.retain(|&pc| pc != root);
        present.push(root);
    }
    present.extend(&missing);

    if !any_fill {
        let pool = fill_pool(recipe, tones, missing, &present, lanes.len());
        return best_arrangement(&base, &lanes, &pool, bands, reference);
    }
    doubling_fills(recipe, tones, lanes.len() - missing.len())
        .into_iter()
        .filter_map(|fill| {
            let pool = [missing.as_slice(), fill.as_slice()].concat();
            best_arrangement(&base, &lanes, &pool, bands, reference)
        })
        .min_by(|a, b| a.1.cmp(&b.1))
}

/// Resolve the previous region's tendency tones into the current one.
pub fn resolve_tendencies(
    prior: &PriorChord<'_>,
    current: &CurrentChord<'_>,
    bands: &RegisterBands,
    sink: &mut dyn DiagnosticsSink,
) -> Resolution {
    let pulls = tendency_pulls(prior, current);
    if pulls.iter().all(Option::is_none) {
        return Resolution::unchanged(current.allocated);
    }
    let region = current.index;
    for lane in Lane::ALL {
        if let Some(pull) = pulls[lane.index()] {
            emit(sink, || DiagnosticEvent::TendencyForced {
                region,
                lane,
                from_pc: prior.pitches[lane.index()] % 12,
                to_pc: pull.pc,
            });
        }
    }

    let reference = Reference::Previous(prior.pitches);
    let pins_with = |exact: bool| -> [Option<LaneTarget>; 4] {
        std::array::from_fn(|i| match pulls[i] {
            Some(Pull { pc, nearest }) => Some(match nearest.filter(|_| exact) {
                Some(p) => LaneTarget::Exact(p),
                None => LaneTarget::Class(pc),
            }),
            None if i == Lane::Soprano.index() => current.lock.map(LaneTarget::Exact),
            None => None,
        })
    };
    let nearest_pins = pins_with(true);
    let any_octave_pins = pins_with(false);

    let widened = bands.widened();
    for bands in [bands, &widened] {
        for pins in [&nearest_pins, &any_octave_pins] {
            let kept = keep_allocation(current, pins, bands, &reference);
            let moved = rearrange(current, pins, bands, &reference, false);
            match (kept, moved) {
                (Some((pitches, cost, repairs)), moved)
                    if moved.is_none_or(|(_, other)| cost <= other) =>
                {
                    for (lane, pc) in repairs {
                        emit(sink, || DiagnosticEvent::ToneRepaired { region, lane, pc });
                    }
                    return Resolution::pulled(pitches, &pulls);
                }
                (_, Some((pitches, _))) => {
                    emit(sink, || DiagnosticEvent::ResolutionRearranged { region, pitches });
                    return Resolution::pulled(pitches, &pulls);
                }
                _ => {}
            }
            if let Some((pitches, _)) = rearrange(current, pins, bands, &reference, true) {
                emit(sink, || DiagnosticEvent::ResolutionRearranged { region, pitches });
                return Resolution::pulled(pitches, &pulls);
            }
        }
    }
    emit(sink, || DiagnosticEvent::ResolutionSkipped { region });
    Resolution::unchanged(current.allocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::allocate;
    use crate::config::VoicingOptions;
    use crate::diagnostics::{CollectingSink, NoopSink};
    use chorale_theory::{Key, parse_chord_identifier};

    struct Pair {
        prev_recipe: ChordRecipe,
        prev_tones: ChordTones,
        recipe: ChordRecipe,
        tones: ChordTones,
    }

    fn pair(prev: &str, next: &str) -> Pair {
        let key = Key::c_major();
        let prev_recipe = parse_chord_identifier(&key, prev).unwrap();
        let recipe = parse_chord_identifier(&key, next).unwrap();
        Pair {
            prev_tones: prev_recipe.tones(&key),
            prev_recipe,
            tones: recipe.tones(&key),
            recipe,
        }
    }

    fn bands() -> RegisterBands {
        RegisterBands::from_options(&VoicingOptions::default())
    }

    #[test]
    fn test_seventh_resolves_down_by_step() {
        let p = pair("C7", "Fm");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [48, 58, 64, 67],
        };
        let allocated = allocate(
            1,
            &p.recipe,
            &p.tones,
            None,
            &bands(),
            &Reference::Previous(prior.pitches),
            &mut NoopSink,
        )
        .unwrap();
        assert_eq!(allocated, [53, 60, 65, 68]);
        let current = CurrentChord {
            index: 1,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: None,
            allocated,
        };
        // Bb has no A in F minor, so it falls a whole tone to Ab.
        let pull = Pull {
            pc: 8,
            nearest: Some(56),
        };
        assert_eq!(tendency_pulls(&prior, &current), [None, Some(pull), None, None]);

        let mut sink = CollectingSink::new();
        let res = resolve_tendencies(&prior, &current, &bands(), &mut sink);
        assert_eq!(res.pitches, [53, 56, 60, 68]);
        assert!(sink.events.contains(&DiagnosticEvent::ToneRepaired {
            region: 1,
            lane: Lane::Alto,
            pc: 0,
        }));
    }

    #[test]
    fn test_seventh_prefers_half_step() {
        let p = pair("G7", "C");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [43, 59, 62, 65],
        };
        let current = CurrentChord {
            index: 1,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: None,
            allocated: [48, 55, 64, 72],
        };
        let pull = Pull {
            pc: 4,
            nearest: Some(64),
        };
        assert_eq!(tendency_pulls(&prior, &current), [None, None, None, Some(pull)]);
        let res = resolve_tendencies(&prior, &current, &bands(), &mut NoopSink);
        assert_eq!(res.pitches[3], 64);
        assert!(res.pitches.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_augmented_fifth_resolves_up() {
        let p = pair("Caug", "F");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [48, 56, 60, 64],
        };
        let current = CurrentChord {
            index: 2,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: Some(60),
            allocated: [53, 53, 57, 60],
        };
        let res = resolve_tendencies(&prior, &current, &bands(), &mut NoopSink);
        assert_eq!(res.pitches, [53, 57, 57, 60]);
        assert_eq!(res.forced, [None, Some(57), None, None]);
    }

    #[test]
    fn test_locked_soprano_is_never_forced() {
        let p = pair("G7", "C");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [43, 59, 62, 65],
        };
        let current = CurrentChord {
            index: 1,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: Some(67),
            allocated: [48, 60, 64, 67],
        };
        assert_eq!(tendency_pulls(&prior, &current), [None; 4]);
    }

    #[test]
    fn test_kept_allocation_never_doubles_the_seventh() {
        // The soprano's G falls to F#, which the held tenor already sounds.
        let p = pair("A7", "Gmaj7");
        let current = CurrentChord {
            index: 1,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: None,
            allocated: [43, 54, 59, 62],
        };
        let reference = Reference::Previous([45, 57, 61, 67]);
        let pins = [None, Some(LaneTarget::Exact(54)), None, Some(LaneTarget::Exact(66))];
        assert!(keep_allocation(&current, &pins, &bands(), &reference).is_none());
        let soprano_only = [None, None, None, Some(LaneTarget::Exact(66))];
        let (pitches, _) = rearrange(&current, &soprano_only, &bands(), &reference, false).unwrap();
        assert_eq!(pitches, [43, 59, 62, 66]);
    }

    #[test]
    fn test_falls_back_to_another_octave() {
        // A3 would sit above the melody's G3, so the tenor takes A2.
        let p = pair("C7", "F");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [48, 58, 64, 67],
        };
        let current = CurrentChord {
            index: 4,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: Some(55),
            allocated: [41, 45, 48, 55],
        };
        assert_eq!(tendency_pulls(&prior, &current)[1].and_then(|p| p.nearest), Some(57));
        let mut sink = CollectingSink::new();
        let res = resolve_tendencies(&prior, &current, &bands(), &mut sink);
        assert_eq!(res.pitches, [41, 45, 48, 55]);
        assert_eq!(res.forced, [None, Some(45), None, None]);
        assert!(!sink.events.contains(&DiagnosticEvent::ResolutionSkipped { region: 4 }));
    }

    #[test]
    fn test_rearranges_when_no_doubled_lane_can_repair() {
        // The soprano's F falls to E4; the displaced G only fits if the
        // tenor and alto are chosen again.
        let p = pair("G7", "Em");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [43, 59, 62, 65],
        };
        let current = CurrentChord {
            index: 2,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: None,
            allocated: [40, 59, 64, 67],
        };
        let mut sink = CollectingSink::new();
        let res = resolve_tendencies(&prior, &current, &bands(), &mut sink);
        assert_eq!(res.pitches, [40, 55, 59, 64]);
        assert_eq!(res.forced, [None, None, None, Some(64)]);
        assert!(sink.events.contains(&DiagnosticEvent::ResolutionRearranged {
            region: 2,
            pitches: [40, 55, 59, 64],
        }));
    }

    #[test]
    fn test_resolves_below_a_low_melody() {
        // The alto's F cannot fall to E4 under a C4 melody; E3 is legal once
        // the bands widen.
        let p = pair("G7", "C");
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [43, 59, 65, 67],
        };
        let current = CurrentChord {
            index: 1,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: Some(60),
            allocated: [48, 52, 55, 60],
        };
        let res = resolve_tendencies(&prior, &current, &bands(), &mut NoopSink);
        assert_eq!(res.pitches[2], 52);
        assert_eq!(res.pitches[3], 60);
        assert_eq!(res.forced[2], Some(52));
        assert!(res.pitches.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_skipped_when_no_octave_fits() {
        // No A fits the narrowed tenor band under the melody's G3, even
        // widened.
        let p = pair("C7", "F");
        let narrow = RegisterBands {
            bands: [(36, 60), (58, 67), (53, 72), (60, 79)],
            anchors: [48, 57, 62, 69],
        };
        let prior = PriorChord {
            recipe: &p.prev_recipe,
            tones: &p.prev_tones,
            pitches: [48, 58, 64, 67],
        };
        let current = CurrentChord {
            index: 4,
            recipe: &p.recipe,
            tones: &p.tones,
            lock: Some(55),
            allocated: [41, 45, 48, 55],
        };
        let mut sink = CollectingSink::new();
        let res = resolve_tendencies(&prior, &current, &narrow, &mut sink);
        assert_eq!(res, Resolution::unchanged([41, 45, 48, 55]));
        assert!(sink.events.contains(&DiagnosticEvent::ResolutionSkipped { region: 4 }));
    }
}
