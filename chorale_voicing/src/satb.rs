// The four voice lanes and the per-region voicing they produce.
//
// Lanes are indexed bottom-up (Bass = 0 … Soprano = 3) so that the ordering
// constraint Bass ≤ Tenor ≤ Alto ≤ Soprano is "pitches are non-decreasing by
// index". A lane's identity is positional and persists across the whole
// progression, which is what lets tendency tones be tracked from one region
// to the next.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Voice lane, ordered from the bottom of the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Bass = 0,
    Tenor = 1,
    Alto = 2,
    Soprano = 3,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Bass, Lane::Tenor, Lane::Alto, Lane::Soprano];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Bass => "Bass",
            Lane::Tenor => "Tenor",
            Lane::Alto => "Alto",
            Lane::Soprano => "Soprano",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Four absolute MIDI pitches, indexed by `Lane`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoicedChord {
    pub pitches: [u8; 4],
}

impl VoicedChord {
    pub fn new(pitches: [u8; 4]) -> Self {
        VoicedChord { pitches }
    }

    pub fn pitch(&self, lane: Lane) -> u8 {
        self.pitches[lane.index()]
    }

    pub fn pitch_class(&self, lane: Lane) -> u8 {
        self.pitches[lane.index()] % 12
    }

    /// Pitch classes by lane.
    pub fn pitch_classes(&self) -> [u8; 4] {
        self.pitches.map(|p| p % 12)
    }

    /// Sorted, deduplicated pitch classes.
    pub fn distinct_pitch_classes(&self) -> Vec<u8> {
        let mut pcs = self.pitch_classes().to_vec();
        pcs.sort_unstable();
        pcs.dedup();
        pcs
    }

    /// Lanes currently sounding pitch class `pc`.
    pub fn lanes_holding(&self, pc: u8) -> Vec<Lane> {
        Lane::ALL
            .into_iter()
            .filter(|&l| self.pitch_class(l) == pc % 12)
            .collect()
    }

    /// True when no lane sits above the lane above it.
    pub fn is_ordered(&self) -> bool {
        self.pitches.windows(2).all(|w| w[0] <= w[1])
    }
}
