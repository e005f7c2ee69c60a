// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for Accompanist
//!
//! These tests drive the public API from melody file to harmonized file.

use std::fs;

use accompanist::config::RunConfig;
use accompanist::harmony::chord::{major_triad, minor_triad, Chord};
use accompanist::harmony::{fitness, EvolutionDriver, EvolutionSettings, HarmonyContext, Individual};
use accompanist::midi::{ExportNote, ExportTrack, Melody, MidiExporter};
use accompanist::music::{Key, Mode, Note};
use accompanist::{HarmonizeError, KeySource, Session};
use tempfile::tempdir;

/// Build a single-track melody file
fn melody_file(ppqn: u16, notes: &[(u64, u8, u64)]) -> Vec<u8> {
    let mut exporter = MidiExporter::new();
    exporter.set_ppqn(ppqn);
    exporter.set_tempo(110.0);
    let mut track = ExportTrack::new("Lead", 0);
    for &(tick, note, duration) in notes {
        track.add_note(ExportNote::new(tick, note, 96, duration));
    }
    exporter.add_track(track);
    exporter.to_bytes().unwrap()
}

/// Two bars outlining A minor
fn a_minor_tune() -> Vec<u8> {
    melody_file(
        384,
        &[
            (0, 57, 768),
            (768, 60, 384),
            (1152, 64, 384),
            (1536, 62, 384),
            (1920, 60, 384),
            (2304, 59, 384),
            (2688, 57, 384),
        ],
    )
}

fn seeded(seed: u64) -> RunConfig {
    RunConfig {
        population_size: 30,
        generations: 25,
        seed: Some(seed),
        ..Default::default()
    }
}

/// Test the whole pipeline from input file to output file
#[test]
fn test_end_to_end_harmonization() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("lament.mid");
    fs::write(&input, a_minor_tune()).unwrap();

    let session = Session::new(seeded(8)).unwrap();
    let report = session.run(&input).unwrap();

    assert_eq!(report.key, Key::new(Note::A, Mode::Minor));
    assert!(matches!(report.key_source, KeySource::Detected { .. }));
    assert_eq!(report.output_path, dir.path().join("lament-harmonized-Am.mid"));
    assert_eq!(report.harmonization.best.len(), 8);

    // The written file holds the melody plus the chords an octave down
    let written = Melody::load(&report.output_path).unwrap();
    let melody: Vec<u8> = written
        .notes
        .iter()
        .filter(|n| n.channel == 0)
        .map(|n| n.note)
        .collect();
    assert_eq!(melody, vec![57, 60, 64, 62, 60, 59, 57]);

    let chord_notes: Vec<_> = written.notes.iter().filter(|n| n.channel == 1).collect();
    let voiced = report
        .harmonization
        .best
        .chords()
        .iter()
        .filter(|c| !c.is_rest())
        .count();
    assert_eq!(chord_notes.len(), voiced * 3 - report.skipped_notes);
    assert!(chord_notes.iter().all(|n| n.velocity == 45 && n.duration == 384));
}

/// Test that a seed reproduces the run exactly
#[test]
fn test_seeded_runs_are_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tune.mid");
    fs::write(&input, a_minor_tune()).unwrap();

    let first_out = dir.path().join("first.mid");
    let second_out = dir.path().join("second.mid");

    let mut config = seeded(99);
    config.output.path = Some(first_out.to_string_lossy().into_owned());
    let first = Session::new(config.clone()).unwrap().run(&input).unwrap();

    config.output.path = Some(second_out.to_string_lossy().into_owned());
    let second = Session::new(config).unwrap().run(&input).unwrap();

    assert_eq!(first.harmonization.best, second.harmonization.best);
    assert_eq!(first.harmonization.history, second.harmonization.history);
    assert_eq!(fs::read(&first_out).unwrap(), fs::read(&second_out).unwrap());
}

/// Test that a configured key bypasses detection
#[test]
fn test_configured_key() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tune.mid");
    fs::write(&input, a_minor_tune()).unwrap();

    let config = RunConfig {
        key: Some("C major".to_string()),
        ..seeded(4)
    };
    let report = Session::new(config).unwrap().run(&input).unwrap();
    assert_eq!(report.key, Key::new(Note::C, Mode::Major));
    assert_eq!(report.key_source, KeySource::Configured);
    assert!(report.output_path.ends_with("tune-harmonized-C.mid"));
}

/// Test config loading feeding a session
#[test]
fn test_config_file_drives_session() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("run.yaml");
    fs::write(
        &config_path,
        r#"
population_size: 16
generations: 8
seed: 21
output:
  velocity: 70
  program: 24
"#,
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let session = Session::new(config).unwrap();
    let melody = Melody::from_bytes(&a_minor_tune()).unwrap();
    let (key, _) = session.resolve_key(&melody).unwrap();
    let harmonization = session.harmonize(&melody, key).unwrap();
    let (exporter, _) = session.build_exporter(&melody, &harmonization);

    let chords = &exporter.tracks()[1];
    assert_eq!(chords.program, Some(24));
    assert!(chords.notes.iter().all(|n| n.velocity == 70));
}

/// Test rejection of unusable input
#[test]
fn test_bad_inputs() {
    let dir = tempdir().unwrap();

    let empty = dir.path().join("empty.mid");
    fs::write(&empty, melody_file(384, &[])).unwrap();
    assert!(matches!(Melody::load(&empty), Err(HarmonizeError::EmptyMelody)));
    assert!(Session::new(seeded(1)).unwrap().run(&empty).is_err());

    let garbage = dir.path().join("garbage.mid");
    fs::write(&garbage, b"RIFF....").unwrap();
    assert!(matches!(Melody::load(&garbage), Err(HarmonizeError::Midi(_))));

    let bad_key = RunConfig {
        key: Some("Cb major".to_string()),
        ..seeded(1)
    };
    assert!(Session::new(bad_key).is_err());
}

/// Test that evolution prefers diatonic, well-led progressions
#[test]
fn test_evolution_finds_consonant_progression() {
    let context = HarmonyContext::new(Key::new(Note::C, Mode::Major), 5);
    let settings = EvolutionSettings {
        population_size: 80,
        generations: 80,
        report_interval: Some(20),
        seed: Some(2024),
    };

    let result = EvolutionDriver::new(context.clone(), settings).run(8);
    assert_eq!(result.history.len(), 4);
    assert_eq!(result.fitness, fitness(&context, result.best.chords()));

    // A tonic vamp scores well; the same vamp in the wrong quality does not
    let vamp = Individual::new(vec![major_triad(60); 8]);
    let wrong_quality = Individual::new(vec![minor_triad(60); 8]);
    assert!(fitness(&context, vamp.chords()) > 0);
    assert!(fitness(&context, wrong_quality.chords()) < 0);
    assert!(result.fitness > fitness(&context, wrong_quality.chords()));

    let rests = Individual::new(vec![Chord::Rest; 8]);
    assert_eq!(fitness(&context, rests.chords()), 0);
}
