// Per-region tone allocation.
//
// Decides which pitch class each lane sounds and hands the octave choice to
// the placement solver. The order of business:
//
// 1. A melody lock pins the soprano to the melody pitch.
// 2. Required tones the melody does not already supply must each get a free
//    lane; if there are more of them than free lanes the region is
//    infeasible.
// 3. The bass takes the root (root position) whenever the remaining
//    required tones still fit in the upper lanes; otherwise it joins the
//    pool and the solver may invert the chord.
// 4. Leftover lanes take Preferred, then Optional tones not yet sounding,
//    then doublings in the order root, perfect fifth, third. Sevenths and
//    altered fifths are never doubled.
//
// Every distinct arrangement of the pooled tones over the pooled lanes is
// placed by the solver and the cheapest wins. If nothing fits the register
// bands, the search is repeated once with the bands widened by an octave.

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, emit};
use crate::error::HarmonyError;
use crate::placement::{Cost, LaneTarget, Reference, RegisterBands, solve};
use crate::priority::{ToneTier, priority};
use crate::satb::Lane;
use chorale_theory::{ChordRecipe, ChordRole, ChordTones};

/// Pitch classes of the Required tones, in chord-tone order.
pub fn required_tones(recipe: &ChordRecipe, tones: &ChordTones) -> Vec<u8> {
    tones_in_tier(recipe, tones, ToneTier::Required)
}

fn tones_in_tier(recipe: &ChordRecipe, tones: &ChordTones, tier: ToneTier) -> Vec<u8> {
    tones
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(i, _)| priority(recipe, ChordRole::ALL[*i]) == tier)
        .map(|(_, &pc)| pc)
        .collect()
}

/// Tones that may be doubled, in doubling preference order.
fn doubling_order(recipe: &ChordRecipe, tones: &ChordTones) -> Vec<u8> {
    let mut order = vec![tones.root()];
    if !recipe.quality().has_altered_fifth() {
        order.push(tones.fifth());
    }
    order.push(tones.third());
    order
}

/// Tones for `slots` lanes: `pool` first, then Preferred and Optional tones
/// not in `present`, then doublings.
pub(crate) fn fill_pool(
    recipe: &ChordRecipe,
    tones: &ChordTones,
    mut pool: Vec<u8>,
    present: &[u8],
    slots: usize,
) -> Vec<u8> {
    let mut present = present.to_vec();
    for tier in [ToneTier::Preferred, ToneTier::Optional] {
        for pc in tones_in_tier(recipe, tones, tier) {
            if pool.len() < slots && !present.contains(&pc) {
                pool.push(pc);
                present.push(pc);
            }
        }
    }
    for &pc in doubling_order(recipe, tones).iter().cycle() {
        if pool.len() >= slots {
            break;
        }
        pool.push(pc);
    }
    pool
}

/// Every multiset of `slots` tones drawn from the doubling tones.
pub(crate) fn doubling_fills(
    recipe: &ChordRecipe,
    tones: &ChordTones,
    slots: usize,
) -> Vec<Vec<u8>> {
    fn walk(options: &[u8], slots: usize, current: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
        if current.len() == slots {
            out.push(current.clone());
            return;
        }
        for (i, &pc) in options.iter().enumerate() {
            current.push(pc);
            walk(&options[i..], slots, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    walk(&doubling_order(recipe, tones), slots, &mut Vec::new(), &mut out);
    out
}

/// All distinct orderings of `items`.
pub(crate) fn distinct_permutations(items: &[u8]) -> Vec<Vec<u8>> {
    fn walk(remaining: &mut Vec<u8>, current: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
        if remaining.is_empty() {
            out.push(current.clone());
            return;
        }
        let mut seen = Vec::new();
        for i in 0..remaining.len() {
            let item = remaining[i];
            if seen.contains(&item) {
                continue;
            }
            seen.push(item);
            remaining.remove(i);
            current.push(item);
            walk(remaining, current, out);
            current.pop();
            remaining.insert(i, item);
        }
    }
    let mut out = Vec::new();
    walk(&mut items.to_vec(), &mut Vec::new(), &mut out);
    out
}

/// Cheapest placement over every arrangement of `pool` across `lanes`, with
/// the other lanes taken from `base`.
pub(crate) fn best_arrangement(
    base: &[LaneTarget; 4],
    lanes: &[Lane],
    pool: &[u8],
    bands: &RegisterBands,
    reference: &Reference,
) -> Option<([u8; 4], Cost)> {
    let mut best: Option<([u8; 4], Cost)> = None;
    for arrangement in distinct_permutations(pool) {
        let mut targets = *base;
        for (lane, &pc) in lanes.iter().zip(&arrangement) {
            targets[lane.index()] = LaneTarget::Class(pc);
        }
        if let Some((pitches, cost)) = solve(&targets, bands, reference)
            && best.as_ref().is_none_or(|(_, c)| cost < *c)
        {
            best = Some((pitches, cost));
        }
    }
    best
}

pub(crate) fn infeasible(region: usize, required: &[u8], realized: &[u8]) -> HarmonyError {
    let mut realized = realized.iter().map(|p| p % 12).collect::<Vec<_>>();
    realized.sort_unstable();
    realized.dedup();
    HarmonyError::VoicingInfeasible {
        region,
        required: required.to_vec(),
        realized,
    }
}

/// Assign and place the four lanes of one region.
pub fn allocate(
    region: usize,
    recipe: &ChordRecipe,
    tones: &ChordTones,
    lock: Option<u8>,
    bands: &RegisterBands,
    reference: &Reference,
    sink: &mut dyn DiagnosticsSink,
) -> Result<[u8; 4], HarmonyError> {
    let melody_pc = lock.map(|p| p % 12);
    let required = required_tones(recipe, tones);
    let missing: Vec<u8> = required
        .iter()
        .copied()
        .filter(|&pc| Some(pc) != melody_pc)
        .collect();
    let free = if lock.is_some() { 3 } else { 4 };
    if missing.len() > free {
        return Err(infeasible(region, &required, &melody_pc.into_iter().collect::<Vec<_>>()));
    }

    let root = tones.root();
    let bass_root = missing.contains(&root) || (melody_pc == Some(root) && missing.len() < free);

    let mut base = [LaneTarget::Class(root); 4];
    let mut lanes = Vec::with_capacity(4);
    if !bass_root {
        lanes.push(Lane::Bass);
    }
    lanes.extend([Lane::Tenor, Lane::Alto]);
    match lock {
        Some(pitch) => base[Lane::Soprano.index()] = LaneTarget::Exact(pitch),
        None => lanes.push(Lane::Soprano),
    }

    let mut present: Vec<u8> = melody_pc.into_iter().collect();
    if bass_root {
        present.push(root);
    }
    let pool: Vec<u8> = missing
        .iter()
        .copied()
        .filter(|&pc| !(bass_root && pc == root))
        .collect();
    present.extend(&pool);
    let pool = fill_pool(recipe, tones, pool, &present, lanes.len());

    if let Some((pitches, _)) = best_arrangement(&base, &lanes, &pool, bands, reference) {
        return Ok(pitches);
    }
    emit(sink, || DiagnosticEvent::BandsWidened { region });
    best_arrangement(&base, &lanes, &pool, &bands.widened(), reference)
        .map(|(pitches, _)| pitches)
        .ok_or_else(|| infeasible(region, &required, &[present, pool].concat()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoicingOptions;
    use crate::diagnostics::{CollectingSink, NoopSink};
    use chorale_theory::{Key, SeventhQuality, TriadQuality, parse_chord_identifier};

    fn bands() -> RegisterBands {
        RegisterBands::from_options(&VoicingOptions::default())
    }

    fn run(text: &str, lock: Option<u8>, reference: Reference) -> Result<[u8; 4], HarmonyError> {
        let key = Key::c_major();
        let recipe = parse_chord_identifier(&key, text).unwrap();
        allocate(0, &recipe, &recipe.tones(&key), lock, &bands(), &reference, &mut NoopSink)
    }

    fn sorted_pcs(pitches: [u8; 4]) -> Vec<u8> {
        let mut pcs: Vec<u8> = pitches.iter().map(|p| p % 12).collect();
        pcs.sort_unstable();
        pcs
    }

    #[test]
    fn test_distinct_permutations() {
        assert_eq!(distinct_permutations(&[1, 2, 3]).len(), 6);
        assert_eq!(distinct_permutations(&[1, 1, 2]).len(), 3);
        assert_eq!(distinct_permutations(&[]).len(), 1);
    }

    #[test]
    fn test_doubling_fills() {
        let key = Key::c_major();
        let c = parse_chord_identifier(&key, "C").unwrap();
        assert_eq!(doubling_fills(&c, &c.tones(&key), 2).len(), 6);
        let aug = parse_chord_identifier(&key, "Caug").unwrap();
        let fills = doubling_fills(&aug, &aug.tones(&key), 1);
        assert_eq!(fills, vec![vec![0], vec![4]]);
        assert_eq!(doubling_fills(&c, &c.tones(&key), 0), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_fill_pool_prefers_missing_fifth() {
        let key = Key::c_major();
        let c = parse_chord_identifier(&key, "C").unwrap();
        assert_eq!(fill_pool(&c, &c.tones(&key), vec![4], &[0, 4], 3), vec![4, 7, 0]);
    }

    #[test]
    fn test_melody_locked_triad() {
        let pitches = run("C", Some(64), Reference::Anchors).unwrap();
        assert_eq!(pitches, [48, 55, 60, 64]);
    }

    #[test]
    fn test_dominant_seventh_keeps_seventh_and_root_bass() {
        let pitches = run("C7", None, Reference::Anchors).unwrap();
        assert_eq!(pitches, [48, 58, 64, 67]);
    }

    #[test]
    fn test_follows_previous_voicing() {
        let pitches = run("Fm", None, Reference::Previous([48, 58, 64, 67])).unwrap();
        assert_eq!(pitches, [53, 60, 65, 68]);
    }

    #[test]
    fn test_diminished_triad_doubles_root() {
        let pitches = run("Fdim", None, Reference::Anchors).unwrap();
        assert_eq!(pitches[0] % 12, 5);
        assert_eq!(sorted_pcs(pitches), vec![5, 5, 8, 11]);
    }

    #[test]
    fn test_never_doubles_seventh_or_augmented_fifth() {
        let pitches = run("Caug", None, Reference::Anchors).unwrap();
        assert_eq!(pitches.iter().filter(|p| *p % 12 == 8).count(), 1);
        let g7 = run("G7", Some(67), Reference::Anchors).unwrap();
        assert_eq!(g7.iter().filter(|p| *p % 12 == 5).count(), 1);
        assert_eq!(g7[3], 67);
    }

    #[test]
    fn test_too_many_required_tones() {
        // Four required tones and a melody note that is none of them.
        let key = Key::c_major();
        let recipe = ChordRecipe::triad(7, TriadQuality::Diminished)
            .with_seventh(SeventhQuality::Diminished7);
        let err = allocate(
            3,
            &recipe,
            &recipe.tones(&key),
            Some(72),
            &bands(),
            &Reference::Anchors,
            &mut NoopSink,
        )
        .unwrap_err();
        match err {
            HarmonyError::VoicingInfeasible { region, required, realized } => {
                assert_eq!(region, 3);
                assert_eq!(required, vec![11, 2, 5, 8]);
                assert_eq!(realized, vec![0]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_widens_bands_for_extreme_melody() {
        let key = Key::c_major();
        let recipe = parse_chord_identifier(&key, "C").unwrap();
        let mut sink = CollectingSink::new();
        // A soprano below the alto and soprano bands forces the retry.
        let pitches = allocate(
            5,
            &recipe,
            &recipe.tones(&key),
            Some(52),
            &bands(),
            &Reference::Anchors,
            &mut sink,
        )
        .unwrap();
        assert_eq!(pitches[3], 52);
        assert!(pitches.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(sink.events, vec![DiagnosticEvent::BandsWidened { region: 5 }]);
    }
}
