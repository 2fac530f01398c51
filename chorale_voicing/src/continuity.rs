// Continuity adjustment.
//
// After allocation and tendency resolution, the lanes that are not pinned
// may trade pitch classes and octaves if that makes the move from the
// previous region smoother. Pinned lanes are the melody-locked soprano,
// lanes forced by a tendency resolution, and a bass holding the root. Only
// the free lanes' pitch classes are permuted, so the region's multiset of
// pitch classes (and with it every coverage guarantee) is unchanged. A new
// arrangement is adopted only when its cost is strictly lower.

use crate::allocate::best_arrangement;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, emit};
use crate::placement::{LaneTarget, Reference, RegisterBands, cost_of};
use crate::satb::Lane;

/// Re-arrange the free lanes of `pitches` if that lowers the cost.
/// `pinned[i]` is the target of every lane that must not move.
pub fn improve_continuity(
    region: usize,
    pitches: [u8; 4],
    pinned: &[Option<LaneTarget>; 4],
    bands: &RegisterBands,
    reference: &Reference,
    sink: &mut dyn DiagnosticsSink,
) -> [u8; 4] {
    let free: Vec<Lane> = Lane::ALL
        .into_iter()
        .filter(|l| pinned[l.index()].is_none())
        .collect();
    if free.is_empty() {
        return pitches;
    }
    let base: [LaneTarget; 4] = std::array::from_fn(|i| {
        pinned[i].unwrap_or(LaneTarget::Class(pitches[i] % 12))
    });
    let pool: Vec<u8> = free.iter().map(|l| pitches[l.index()] % 12).collect();
    let current = cost_of(pitches, bands, reference);
    match best_arrangement(&base, &free, &pool, bands, reference) {
        Some((better, cost)) if cost < current => {
            emit(sink, || DiagnosticEvent::ContinuityAdjusted {
                region,
                before: pitches,
                after: better,
            });
            better
        }
        _ => pitches,
    }
}
