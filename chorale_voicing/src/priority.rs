// Chord-tone priority tiers.
//
// Every role of a chord gets a tier that tells the allocator how hard to try
// to sound it: Required tones must appear in every realization, Preferred
// tones are filled next, Optional tones only when voices remain. Root and
// third are always Required. The fifth is Required when it is altered
// (diminished or augmented), because dropping it would change the chord's
// identity. A seventh is Required whenever the chord has one.

use chorale_theory::{ChordRecipe, ChordRole, SeventhQuality, TriadQuality};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToneTier {
    Optional,
    Preferred,
    Required,
}

/// Tier of `role` in `recipe`.
pub fn priority(recipe: &ChordRecipe, role: ChordRole) -> ToneTier {
    match role {
        ChordRole::Root | ChordRole::Third => ToneTier::Required,
        ChordRole::Fifth => match recipe.quality() {
            TriadQuality::Diminished | TriadQuality::Augmented => ToneTier::Required,
            TriadQuality::Major | TriadQuality::Minor => ToneTier::Optional,
        },
        ChordRole::Seventh => match recipe.seventh() {
            SeventhQuality::None => ToneTier::Optional,
            SeventhQuality::Major7
            | SeventhQuality::Minor7
            | SeventhQuality::Dominant7
            | SeventhQuality::HalfDiminished7
            | SeventhQuality::Diminished7 => ToneTier::Required,
        },
    }
}

/// Number of Required tones: root and third, plus an altered fifth, plus the
/// seventh when `has_seventh`.
pub fn count_required_tones(recipe: &ChordRecipe, has_seventh: bool) -> usize {
    let altered_fifth = recipe.quality().has_altered_fifth() as usize;
    2 + altered_fifth + has_seventh as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_third_always_required() {
        for quality in [
            TriadQuality::Major,
            TriadQuality::Minor,
            TriadQuality::Diminished,
            TriadQuality::Augmented,
        ] {
            let recipe = ChordRecipe::triad(1, quality);
            assert_eq!(priority(&recipe, ChordRole::Root), ToneTier::Required);
            assert_eq!(priority(&recipe, ChordRole::Third), ToneTier::Required);
        }
    }

    #[test]
    fn test_fifth_tier_follows_quality() {
        let major = ChordRecipe::triad(1, TriadQuality::Major);
        let dim = ChordRecipe::triad(7, TriadQuality::Diminished);
        let aug = ChordRecipe::triad(1, TriadQuality::Augmented);
        assert_eq!(priority(&major, ChordRole::Fifth), ToneTier::Optional);
        assert_eq!(priority(&dim, ChordRole::Fifth), ToneTier::Required);
        assert_eq!(priority(&aug, ChordRole::Fifth), ToneTier::Required);
    }

    #[test]
    fn test_seventh_tier() {
        let triad = ChordRecipe::triad(5, TriadQuality::Major);
        let g7 = triad.with_seventh(SeventhQuality::Dominant7);
        assert_eq!(priority(&triad, ChordRole::Seventh), ToneTier::Optional);
        assert_eq!(priority(&g7, ChordRole::Seventh), ToneTier::Required);
    }

    #[test]
    fn test_count_required_tones() {
        let g7 = ChordRecipe::triad(5, TriadQuality::Major).with_seventh(SeventhQuality::Dominant7);
        assert_eq!(count_required_tones(&g7, true), 3);
        let bdim7 = ChordRecipe::triad(7, TriadQuality::Diminished)
            .with_seventh(SeventhQuality::Diminished7);
        assert_eq!(count_required_tones(&bdim7, true), 4);
        assert_eq!(count_required_tones(&ChordRecipe::triad(1, TriadQuality::Minor), false), 2);
    }
}
