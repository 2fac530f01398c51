// Octave placement: register bands, the voice-leading cost and the solver.
//
// Given one target per lane (an exact pitch, or a pitch class to be placed in
// the lane's band), `solve` enumerates every octave choice that keeps the
// lanes ordered Bass ≤ Tenor ≤ Alto ≤ Soprano and returns the cheapest.
//
// Cost is compared lexicographically:
//   1. total absolute motion against the previous region's pitches (or, for
//      the first region, distance to the canonical anchors),
//   2. the largest single-lane leap (zero when measuring against anchors),
//   3. upper spacing, soprano minus tenor,
//   4. distance from the band centers,
//   5. the pitches themselves, so ties go to the lower voicing.
//
// Bands are derived from `VoicingOptions`. With the defaults they are
// Bass 36–60, Tenor 48–67, Alto 53–72, Soprano 60–79, close to standard
// SATB ranges. A band set can be widened by an octave on each side for the
// single retry the allocator allows before giving up.

use crate::config::VoicingOptions;
use crate::satb::Lane;

/// MIDI pitch of C in `octave` (C4 = 60).
fn c_of(octave: i8) -> i16 {
    (octave as i16 + 1) * 12
}

fn clamp_midi(p: i16) -> u8 {
    p.clamp(0, 127) as u8
}

/// What a lane must sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneTarget {
    /// This exact pitch; the band is not consulted.
    Exact(u8),
    /// Any octave of this pitch class inside the lane's band.
    Class(u8),
}

impl LaneTarget {
    pub fn pitch_class(self) -> u8 {
        match self {
            LaneTarget::Exact(p) => p % 12,
            LaneTarget::Class(pc) => pc % 12,
        }
    }
}

/// What motion is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Previous([u8; 4]),
    Anchors,
}

/// Inclusive pitch band and anchor pitch per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBands {
    pub bands: [(u8, u8); 4],
    pub anchors: [u8; 4],
}

impl RegisterBands {
    pub fn from_options(options: &VoicingOptions) -> Self {
        let bass_low = c_of(options.bass_octave);
        let upper_center = c_of(options.root_octave);
        let (lo, hi) = (options.upper_min as i16, options.upper_max as i16);
        RegisterBands {
            bands: [
                (clamp_midi(bass_low), clamp_midi(bass_low + 24)),
                (clamp_midi(lo), clamp_midi(hi - 12)),
                (clamp_midi(lo + 5), clamp_midi(hi - 7)),
                (clamp_midi(lo + 12), clamp_midi(hi)),
            ],
            anchors: [
                clamp_midi(bass_low + 12),
                clamp_midi(upper_center - 3),
                clamp_midi(upper_center + 2),
                clamp_midi(upper_center + 9),
            ],
        }
    }

    /// Every band extended by an octave in both directions.
    pub fn widened(&self) -> Self {
        RegisterBands {
            bands: self
                .bands
                .map(|(lo, hi)| (lo.saturating_sub(12), hi.saturating_add(12).min(127))),
            anchors: self.anchors,
        }
    }

    pub fn band(&self, lane: Lane) -> (u8, u8) {
        self.bands[lane.index()]
    }
}

/// Voice-leading cost; smaller is better. Field order is comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost {
    pub motion: u32,
    pub max_leap: u32,
    pub spread: u32,
    pub center: u32,
    pub pitches: [u8; 4],
}

/// Cost of a concrete placement.
pub fn cost_of(pitches: [u8; 4], bands: &RegisterBands, reference: &Reference) -> Cost {
    let (motion, max_leap) = match reference {
        Reference::Previous(prev) => {
            let leaps = std::array::from_fn::<u32, 4, _>(|i| pitches[i].abs_diff(prev[i]) as u32);
            (leaps.iter().sum(), leaps.iter().copied().max().unwrap_or(0))
        }
        Reference::Anchors => {
            let dist: u32 = (0..4)
                .map(|i| pitches[i].abs_diff(bands.anchors[i]) as u32)
                .sum();
            (dist, 0)
        }
    };
    let spread = pitches[Lane::Soprano.index()].saturating_sub(pitches[Lane::Tenor.index()]) as u32;
    let center = (0..4)
        .map(|i| {
            let (lo, hi) = bands.bands[i];
            (2 * pitches[i] as i32 - (lo as i32 + hi as i32)).unsigned_abs()
        })
        .sum();
    Cost {
        motion,
        max_leap,
        spread,
        center,
        pitches,
    }
}

/// Pitches a lane may take for `target`, ascending.
fn options_for(target: LaneTarget, band: (u8, u8)) -> Vec<u8> {
    match target {
        LaneTarget::Exact(p) => vec![p],
        LaneTarget::Class(pc) => (band.0..=band.1).filter(|p| p % 12 == pc % 12).collect(),
    }
}

/// Cheapest ordered placement of `targets`, or None if no octave choice
/// keeps the lanes ordered within their bands.
pub fn solve(
    targets: &[LaneTarget; 4],
    bands: &RegisterBands,
    reference: &Reference,
) -> Option<([u8; 4], Cost)> {
    let choices: [Vec<u8>; 4] = std::array::from_fn(|i| options_for(targets[i], bands.bands[i]));
    let mut best: Option<([u8; 4], Cost)> = None;
    for &b in &choices[0] {
        for &t in choices[1].iter().filter(|&&t| t >= b) {
            for &a in choices[2].iter().filter(|&&a| a >= t) {
                for &s in choices[3].iter().filter(|&&s| s >= a) {
                    let pitches = [b, t, a, s];
                    let cost = cost_of(pitches, bands, reference);
                    if best.as_ref().is_none_or(|(_, c)| cost < *c) {
                        best = Some((pitches, cost));
                    }
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_bands() -> RegisterBands {
        RegisterBands::from_options(&VoicingOptions::default())
    }

    #[test]
    fn test_default_bands_and_anchors() {
        let bands = default_bands();
        assert_eq!(bands.bands, [(36, 60), (48, 67), (53, 72), (60, 79)]);
        assert_eq!(bands.anchors, [48, 57, 62, 69]);
    }

    #[test]
    fn test_widened_bands_clamp() {
        let bands = RegisterBands {
            bands: [(5, 20), (30, 40), (50, 60), (110, 120)],
            anchors: [10, 35, 55, 115],
        };
        let wide = bands.widened();
        assert_eq!(wide.bands[0], (0, 32));
        assert_eq!(wide.bands[3], (98, 127));
    }

    #[test]
    fn test_solve_first_region_uses_anchors() {
        // C major triad with melody E4 on top.
        let targets = [
            LaneTarget::Class(0),
            LaneTarget::Class(7),
            LaneTarget::Class(0),
            LaneTarget::Exact(64),
        ];
        let (pitches, cost) = solve(&targets, &default_bands(), &Reference::Anchors).unwrap();
        assert_eq!(pitches, [48, 55, 60, 64]);
        assert_eq!(cost.motion, 9);
        assert_eq!(cost.max_leap, 0);
    }

    #[test]
    fn test_solve_minimizes_motion() {
        let targets = [
            LaneTarget::Class(0),
            LaneTarget::Class(8),
            LaneTarget::Class(0),
            LaneTarget::Exact(64),
        ];
        let prev = Reference::Previous([48, 55, 60, 64]);
        let (pitches, cost) = solve(&targets, &default_bands(), &prev).unwrap();
        assert_eq!(pitches, [48, 56, 60, 64]);
        assert_eq!(cost.motion, 1);
        assert_eq!(cost.max_leap, 1);
    }

    #[test]
    fn test_solve_rejects_crossing() {
        // A tenor A would force the alto F above the pinned soprano, so only
        // the F-under-A arrangement fits.
        let crossed = [
            LaneTarget::Class(5),
            LaneTarget::Class(9),
            LaneTarget::Class(5),
            LaneTarget::Exact(60),
        ];
        let prev = Reference::Previous([48, 56, 60, 64]);
        assert!(solve(&crossed, &default_bands(), &prev).is_none());

        let targets = [
            LaneTarget::Class(5),
            LaneTarget::Class(5),
            LaneTarget::Class(9),
            LaneTarget::Exact(60),
        ];
        let (pitches, _) = solve(&targets, &default_bands(), &prev).unwrap();
        assert_eq!(pitches, [53, 53, 57, 60]);

        let impossible = [
            LaneTarget::Class(0),
            LaneTarget::Exact(70),
            LaneTarget::Class(0),
            LaneTarget::Exact(60),
        ];
        assert!(solve(&impossible, &default_bands(), &Reference::Anchors).is_none());
    }

    #[test]
    fn test_cost_orders_by_spread_after_motion() {
        let bands = default_bands();
        let close = cost_of([48, 58, 64, 67], &bands, &Reference::Anchors);
        let open = cost_of([48, 55, 64, 70], &bands, &Reference::Anchors);
        assert_eq!(close.motion, open.motion);
        assert!(close < open);
    }
}
