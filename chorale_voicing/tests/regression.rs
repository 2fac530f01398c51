// Integration tests: the regression fixtures.
//
// Runs every case from `regression::cases()` through the full engine and
// checks the per-scenario outcomes, including the expected Skips.

use chorale_voicing::regression::{CheckSet, Outcome, cases, run_case};
use chorale_voicing::satb::Lane;

fn case_named(name: &str) -> chorale_voicing::regression::RegressionCase {
    cases()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no case named {name}"))
}

#[test]
fn test_every_case_passes() {
    for case in cases() {
        let report = run_case(&case);
        assert!(report.passed(), "{}: {:?}", case.name, report.results);
        assert!(!report.voiced.is_empty(), "{}", case.name);
    }
}

#[test]
fn test_dominant_seventh_has_no_flat_seven_lane() {
    let report = run_case(&case_named("dominant seventh to tonic"));
    assert!(matches!(report.outcome_of("expectation 0"), Some(Outcome::Skip(_))));
    assert_eq!(report.outcome_of("seventh resolution"), Some(&Outcome::Pass));
    // No melody anywhere.
    assert!(matches!(report.outcome_of("melody lock"), Some(Outcome::Skip(_))));
}

#[test]
fn test_secondary_dominant_seventh_falls_by_step() {
    let report = run_case(&case_named("secondary dominant to borrowed minor subdominant"));
    assert_eq!(report.outcome_of("expectation 0"), Some(&Outcome::Pass));
    let lanes = report.voiced[0].lanes_holding(10);
    assert_eq!(lanes, vec![Lane::Tenor]);
    assert_eq!(report.voiced[1].pitch_class(Lane::Tenor), 8);
}

#[test]
fn test_augmented_fifth_rises_under_melody() {
    let report = run_case(&case_named("augmented passing chord under a melody"));
    for i in 0..3 {
        assert_eq!(
            report.outcome_of(&format!("expectation {i}")),
            Some(&Outcome::Pass),
            "expectation {i}"
        );
    }
    assert_eq!(report.outcome_of("augmented resolution"), Some(&Outcome::Pass));
    assert_eq!(report.outcome_of("melody lock"), Some(&Outcome::Pass));
    let last = report.voiced[2];
    assert!(last.pitch(Lane::Alto) >= last.pitch(Lane::Tenor));
}

#[test]
fn test_lone_diminished_triad_doubles_one_tone() {
    let case = case_named("lone diminished triad");
    assert!(!case.checks.contains(CheckSet::SEVENTH_RESOLUTION));
    let report = run_case(&case);
    assert!(report.passed());
    // Only the enabled checks plus the one expectation ran.
    assert_eq!(report.results.len(), 4);
}

#[test]
fn test_diminished_chain_keeps_identity() {
    let report = run_case(&case_named("chain of minor-third diminished triads"));
    assert_eq!(report.voiced.len(), 8);
    assert_eq!(report.outcome_of("diminished identity"), Some(&Outcome::Pass));
    assert!(matches!(report.outcome_of("seventh resolution"), Some(Outcome::Skip(_))));
    assert!(matches!(report.outcome_of("augmented resolution"), Some(Outcome::Skip(_))));
}
