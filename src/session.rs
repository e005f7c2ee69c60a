// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! One harmonization job, from input melody file to output MIDI file.
//!
//! The session settles the key (configured or detected), sizes the chord
//! sequence from the melody length, runs the evolution and writes the
//! melody back out together with the winning chord track.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use crate::config::RunConfig;
use crate::harmony::{EvolutionDriver, Harmonization, HarmonyContext};
use crate::midi::export::{render_chords, ExportTrack, MidiExporter};
use crate::midi::reader::Melody;
use crate::music::scale::Key;

/// Melody track channel
const MELODY_CHANNEL: u8 = 0;

/// Chord track channel
const CHORD_CHANNEL: u8 = 1;

/// Tempo written when the input has none
const DEFAULT_TEMPO: f64 = 120.0;

/// Where the run's key came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeySource {
    /// Set in the configuration or on the command line
    Configured,
    /// Estimated from the melody
    Detected { correlation: f64 },
}

/// Summary of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub key: Key,
    pub key_source: KeySource,
    pub harmonization: Harmonization,
    pub output_path: PathBuf,
    /// Chord notes dropped for falling outside the MIDI range
    pub skipped_notes: usize,
}

/// Harmonization job runner
pub struct Session {
    config: RunConfig,
}

impl Session {
    /// Create a session after validating its configuration
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate().context("Invalid run configuration")?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Configured key, or the best match for the melody
    pub fn resolve_key(&self, melody: &Melody) -> Result<(Key, KeySource)> {
        if let Some(key) = self.config.resolve_key()? {
            return Ok((key, KeySource::Configured));
        }

        let estimate = melody
            .detect_key()
            .ok_or_else(|| anyhow!("Could not detect a key for the melody"))?;
        Ok((
            estimate.key,
            KeySource::Detected {
                correlation: estimate.correlation,
            },
        ))
    }

    /// Run the evolution for a melody in `key`
    pub fn harmonize(&self, melody: &Melody, key: Key) -> Result<Harmonization> {
        let context = HarmonyContext::for_melody(key, melody.absolute_pitches())
            .ok_or_else(|| anyhow!("Melody contains no notes"))?
            .with_weights(self.config.weights);

        let length = melody.beat_groups();
        let mut driver = EvolutionDriver::new(context, self.config.evolution_settings());
        let harmonization = driver.run(length);
        if harmonization.best.len() != length {
            bail!(
                "Population died out: best harmonization has {} chords, expected {}",
                harmonization.best.len(),
                length
            );
        }
        Ok(harmonization)
    }

    /// Build the output file: the melody followed by the chord track.
    /// Also returns the number of chord notes that had to be dropped.
    pub fn build_exporter(
        &self,
        melody: &Melody,
        harmonization: &Harmonization,
    ) -> (MidiExporter, usize) {
        let mut exporter = MidiExporter::new();
        exporter.set_ppqn(melody.ticks_per_beat);
        exporter.set_tempo(melody.tempo_bpm.unwrap_or(DEFAULT_TEMPO));

        let mut melody_track = ExportTrack::new("Melody", MELODY_CHANNEL);
        melody_track.add_melody_notes(&melody.notes);
        exporter.add_track(melody_track);

        let output = &self.config.output;
        let (notes, skipped) = render_chords(&harmonization.best, &output.rendering());
        let mut chord_track =
            ExportTrack::new("Chords", CHORD_CHANNEL).with_program(output.program);
        for note in notes {
            chord_track.add_note(note);
        }
        exporter.add_track(chord_track);

        (exporter, skipped)
    }

    /// Configured output path, or one derived from the input name and key
    pub fn output_path(&self, input: &Path, key: Key) -> PathBuf {
        match &self.config.output.path {
            Some(path) => PathBuf::from(path),
            None => default_output_path(input, key),
        }
    }

    /// Harmonize `input` and write the result
    pub fn run(&self, input: &Path) -> Result<SessionReport> {
        let melody = Melody::load(input)
            .with_context(|| format!("Failed to read melody: {:?}", input))?;

        let (key, key_source) = self.resolve_key(&melody)?;
        match key_source {
            KeySource::Configured => info!(key = %key, "Using configured key"),
            KeySource::Detected { correlation } => {
                info!(key = %key, correlation, "Detected key")
            }
        }

        let harmonization = self.harmonize(&melody, key)?;
        let (exporter, skipped_notes) = self.build_exporter(&melody, &harmonization);

        let output_path = self.output_path(input, key);
        exporter
            .export(&output_path)
            .with_context(|| format!("Failed to write MIDI file: {:?}", output_path))?;
        info!(
            path = %output_path.display(),
            fitness = harmonization.fitness,
            "Wrote harmonization"
        );

        Ok(SessionReport {
            key,
            key_source,
            harmonization,
            output_path,
            skipped_notes,
        })
    }
}

/// `<stem>-harmonized-<Tonic>[m].mid` beside the input file
pub fn default_output_path(input: &Path, key: Key) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "melody".to_string());
    input.with_file_name(format!("{}-harmonized-{}.mid", stem, key.short_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::export::ExportNote;
    use crate::music::scale::{Mode, Note};
    use tempfile::tempdir;

    fn melody_bytes(notes: &[(u64, u8, u64)]) -> Vec<u8> {
        let mut exporter = MidiExporter::new();
        exporter.set_ppqn(480);
        exporter.set_tempo(90.0);
        let mut track = ExportTrack::new("Melody", 0);
        for &(tick, note, duration) in notes {
            track.add_note(ExportNote::new(tick, note, 100, duration));
        }
        exporter.add_track(track);
        exporter.to_bytes().unwrap()
    }

    fn c_major_melody() -> Melody {
        let bytes = melody_bytes(&[
            (0, 60, 384),
            (384, 64, 384),
            (768, 67, 384),
            (1152, 72, 384),
            (1536, 65, 384),
            (1920, 69, 384),
            (2304, 67, 384),
            (2688, 60, 384),
        ]);
        Melody::from_bytes(&bytes).unwrap()
    }

    fn quick_config() -> RunConfig {
        RunConfig {
            population_size: 20,
            generations: 10,
            seed: Some(17),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = RunConfig {
            population_size: 2,
            ..Default::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn test_harmonize_fails_when_population_dies_out() {
        // Bypasses validation to reach the engine with a dwindling population
        let session = Session {
            config: RunConfig {
                population_size: 2,
                ..quick_config()
            },
        };
        let melody = c_major_melody();
        assert!(session.harmonize(&melody, Key::new(Note::C, Mode::Major)).is_err());
    }

    #[test]
    fn test_resolve_key() {
        let melody = c_major_melody();

        let session = Session::new(quick_config()).unwrap();
        let (key, source) = session.resolve_key(&melody).unwrap();
        assert_eq!(key, Key::new(Note::C, Mode::Major));
        assert!(matches!(source, KeySource::Detected { .. }));

        let configured = Session::new(RunConfig {
            key: Some("D minor".to_string()),
            ..quick_config()
        })
        .unwrap();
        let (key, source) = configured.resolve_key(&melody).unwrap();
        assert_eq!(key, Key::new(Note::D, Mode::Minor));
        assert_eq!(source, KeySource::Configured);
    }

    #[test]
    fn test_harmonize_covers_melody() {
        let melody = c_major_melody();
        let session = Session::new(quick_config()).unwrap();
        let result = session.harmonize(&melody, Key::new(Note::C, Mode::Major)).unwrap();
        // 3072 ticks = 2 bars
        assert_eq!(result.best.len(), 8);
        assert_eq!(result.seed, 17);
    }

    #[test]
    fn test_build_exporter() {
        let melody = c_major_melody();
        let session = Session::new(quick_config()).unwrap();
        let result = session.harmonize(&melody, Key::new(Note::C, Mode::Major)).unwrap();

        let (exporter, skipped) = session.build_exporter(&melody, &result);
        assert_eq!(skipped, 0);
        assert_eq!(exporter.ppqn(), 480);
        assert!((exporter.tempo() - 90.0).abs() < 0.01);

        let tracks = exporter.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].notes.len(), 8);
        assert_eq!(tracks[1].program, Some(0));
        let voiced = result.best.chords().iter().filter(|c| !c.is_rest()).count();
        assert_eq!(tracks[1].notes.len(), voiced * 3);
        assert!(tracks[1].notes.iter().all(|n| n.velocity == 45));
    }

    #[test]
    fn test_fast_tempo_is_carried_over() {
        let mut exporter = MidiExporter::new();
        exporter.set_tempo(400.0);
        let mut track = ExportTrack::new("Melody", 0);
        track.add_note(ExportNote::new(0, 72, 100, 384));
        exporter.add_track(track);
        let melody = Melody::from_bytes(&exporter.to_bytes().unwrap()).unwrap();

        let session = Session::new(quick_config()).unwrap();
        let result = session.harmonize(&melody, Key::new(Note::C, Mode::Major)).unwrap();
        let (out, _) = session.build_exporter(&melody, &result);
        assert!((out.tempo() - 400.0).abs() < 0.01);

        let written = Melody::from_bytes(&out.to_bytes().unwrap()).unwrap();
        assert!((written.tempo_bpm.unwrap() - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_default_output_path() {
        let input = Path::new("/tmp/songs/tune.mid");
        assert_eq!(
            default_output_path(input, Key::new(Note::A, Mode::Minor)),
            PathBuf::from("/tmp/songs/tune-harmonized-Am.mid")
        );
        assert_eq!(
            default_output_path(input, Key::new(Note::Fs, Mode::Major)),
            PathBuf::from("/tmp/songs/tune-harmonized-F#.mid")
        );
    }

    #[test]
    fn test_run_writes_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tune.mid");
        let bytes = melody_bytes(&[(0, 60, 768), (768, 64, 384), (1152, 67, 384)]);
        std::fs::write(&input, bytes).unwrap();

        let session = Session::new(quick_config()).unwrap();
        let report = session.run(&input).unwrap();

        assert_eq!(report.key, Key::new(Note::C, Mode::Major));
        assert!(matches!(report.key_source, KeySource::Detected { .. }));
        assert_eq!(report.harmonization.best.len(), 4);
        assert!(report.output_path.exists());
        assert_eq!(
            report.output_path.file_name().unwrap(),
            "tune-harmonized-C.mid"
        );

        let written = Melody::load(&report.output_path).unwrap();
        assert_eq!(written.ticks_per_beat, 480);
        let melody: Vec<u8> = written
            .notes
            .iter()
            .filter(|note| note.channel == 0)
            .map(|note| note.note)
            .collect();
        assert_eq!(melody, vec![60, 64, 67]);
    }

    #[test]
    fn test_run_missing_input() {
        let session = Session::new(quick_config()).unwrap();
        assert!(session.run(Path::new("/nonexistent/tune.mid")).is_err());
    }
}
