// Chorale voicing CLI entry point.
//
// Voices a chord progression (optionally under a melody) or harmonizes a
// bare melody, then writes MIDI and, on request, LilyPond and JSON. The
// pipeline: configuration → regions → voicing → MIDI → extra outputs.
//
// Usage:
//   cargo run -p chorale_voicing --bin voice -- [output.mid] [--key C] [--mode ionian]
//     (--progression TEXT [--melody TEXT] | --harmonize TEXT)
//     [--ly FILE] [--json FILE] [--config FILE] [--trace]
//   cargo run -p chorale_voicing --bin voice -- --regression
//
// Modes: ionian, dorian, phrygian, lydian, mixolydian, aeolian, locrian

use chorale_theory::pitch::{letter_index, letter_pitch_class, read_accidentals};
use chorale_theory::{Key, Mode, roman_numeral, spell_midi, spell_pitch_class};
use chorale_voicing::diagnostics::{CollectingSink, DiagnosticsSink, NoopSink};
use chorale_voicing::export::{VoicingReport, write_json};
use chorale_voicing::harmonize::{harmonize_melody, regions_from_steps};
use chorale_voicing::lilypond::write_lilypond;
use chorale_voicing::melody::parse_melody;
use chorale_voicing::midi::write_midi;
use chorale_voicing::region::build_regions;
use chorale_voicing::regression::{cases, run_case};
use chorale_voicing::satb::Lane;
use chorale_voicing::{SessionConfig, voice_lead_regions};
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if has_flag(&args, "--regression") {
        std::process::exit(run_regression());
    }

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("chorale.mid");
    let key_name: String = parse_flag(&args, "--key").unwrap_or_else(|| "C".to_string());
    let mode_name: String = parse_flag(&args, "--mode").unwrap_or_else(|| "ionian".to_string());
    let progression: Option<String> = parse_flag(&args, "--progression");
    let melody_text: String = parse_flag(&args, "--melody").unwrap_or_default();
    let harmonize_text: Option<String> = parse_flag(&args, "--harmonize");
    let ly_path: Option<String> = parse_flag(&args, "--ly");
    let json_path: Option<String> = parse_flag(&args, "--json");
    let config_path: Option<String> = parse_flag(&args, "--config");
    let trace = has_flag(&args, "--trace");

    let key = match parse_key(&key_name, &mode_name) {
        Some(key) => key,
        None => fail(&format!("Unknown key '{key_name}' or mode '{mode_name}'.")),
    };

    println!("=== Chorale Voicing ===");
    println!("Output: {}", output_path);
    println!("Key: {} {}", spell_pitch_class(key.tonic, &key), key.mode);
    println!();

    println!("[1/5] Loading configuration...");
    let config = match &config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| fail(&format!("Cannot read {path}: {e}")));
            SessionConfig::from_json(&text).unwrap_or_else(|e| fail(&e.to_string()))
        }
        None => {
            println!("  Using defaults.");
            SessionConfig::default()
        }
    };
    println!(
        "  {} eighths per chord, {} BPM.",
        config.timeline.eighths_per_chord, config.timeline.tempo_bpm
    );

    println!("[2/5] Building regions...");
    let (melody, regions, steps) = match (&progression, &harmonize_text) {
        (Some(progression), None) => {
            let melody = parse_melody(&melody_text, &config.timeline)
                .unwrap_or_else(|e| fail(&e.to_string()));
            let regions = build_regions(progression, &key, &config.timeline, &melody)
                .unwrap_or_else(|e| fail(&e.to_string()));
            (melody, regions, Vec::new())
        }
        (None, Some(text)) => {
            let melody =
                parse_melody(text, &config.timeline).unwrap_or_else(|e| fail(&e.to_string()));
            let steps = harmonize_melody(&melody, &key, &config.heuristic);
            for step in &steps {
                match &step.chosen {
                    Some(chord) => println!(
                        "  {} -> {} ({}): {}",
                        spell_midi(step.event.pitch, &key),
                        chord.label,
                        chord.symbol,
                        step.reason
                    ),
                    None => println!("  {} -> unresolved", spell_midi(step.event.pitch, &key)),
                }
            }
            let regions = regions_from_steps(&key, &steps);
            (melody, regions, steps)
        }
        _ => fail("Give exactly one of --progression or --harmonize."),
    };
    println!("  {} regions.", regions.len());

    println!("[3/5] Voicing...");
    let mut collecting = CollectingSink::new();
    let mut noop = NoopSink;
    let sink: &mut dyn DiagnosticsSink = if trace { &mut collecting } else { &mut noop };
    let voiced = voice_lead_regions(&key, &regions, &config.voicing, sink)
        .unwrap_or_else(|e| fail(&e.to_string()));
    for (region, chord) in regions.iter().zip(&voiced) {
        let names: Vec<String> = Lane::ALL
            .iter()
            .rev()
            .map(|&lane| spell_midi(chord.pitch(lane), &key))
            .collect();
        println!(
            "  {:>2}  {:<8} {:<6} S/A/T/B {}",
            region.index,
            region.event.symbol(),
            roman_numeral(&key, &region.event.recipe),
            names.join(" ")
        );
    }
    if trace {
        for event in &collecting.events {
            println!("  trace: {}", event);
        }
    }

    println!("[4/5] Writing MIDI to {}...", output_path);
    if let Err(e) = write_midi(
        &regions,
        &voiced,
        &melody,
        config.timeline.tempo_bpm,
        Path::new(output_path),
    ) {
        fail(&format!("Error writing MIDI: {e}"));
    }

    println!("[5/5] Writing extra outputs...");
    if let Some(path) = &ly_path {
        if let Err(e) = write_lilypond(
            &key,
            &regions,
            &voiced,
            &melody,
            config.timeline.tempo_bpm,
            Path::new(path),
        ) {
            fail(&format!("Error writing LilyPond: {e}"));
        }
        println!("  LilyPond: {}", path);
    }
    if let Some(path) = &json_path {
        let report = VoicingReport::new(&key, &regions, &voiced, &steps);
        if let Err(e) = write_json(&report, Path::new(path)) {
            fail(&format!("Error writing JSON: {e}"));
        }
        println!("  JSON: {}", path);
    }

    println!();
    println!("Play with: timidity {} (or any MIDI player)", output_path);
}

/// Run every regression case; returns the process exit code.
fn run_regression() -> i32 {
    let mut failed = 0;
    for case in cases() {
        let report = run_case(&case);
        println!("{}", report.name);
        for result in &report.results {
            println!("  {:<22} {}", result.name, result.outcome);
        }
        if !report.passed() {
            failed += 1;
        }
    }
    if failed > 0 {
        eprintln!("{failed} regression case(s) failed.");
        1
    } else {
        println!("All regression cases passed.");
        0
    }
}

/// Tonic name ("C", "F#", "Bb") plus mode name.
fn parse_key(tonic: &str, mode: &str) -> Option<Key> {
    let mut chars = tonic.chars();
    let letter = letter_index(chars.next()?)?;
    let (shift, _, used) = read_accidentals(chars.as_str());
    if used != chars.as_str().len() {
        return None;
    }
    let pc = (letter_pitch_class(letter) as i16 + shift as i16).rem_euclid(12) as u8;
    Some(Key::new(pc, Mode::from_name(mode)?))
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
