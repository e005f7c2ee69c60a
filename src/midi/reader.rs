// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file melody reader.
//!
//! Extracts what the harmonizer needs from an input file: the note-on
//! pitches in time order, the notes themselves for re-emission, the total
//! duration, ticks per beat and the opening tempo.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::debug;

use super::{beat_groups, DEFAULT_TICKS_PER_BEAT};
use crate::error::{HarmonizeError, Result};
use crate::music::key_detect::{detect_key, pitch_class_histogram, KeyEstimate};
use crate::music::scale::Pitch;

/// A melody note with absolute timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyNote {
    /// Start tick
    pub tick: u64,
    /// MIDI note number
    pub note: u8,
    /// Note-on velocity
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Duration in ticks
    pub duration: u64,
}

impl MelodyNote {
    /// End tick
    pub fn end_tick(&self) -> u64 {
        self.tick + self.duration
    }
}

/// A parsed monophonic melody
#[derive(Debug, Clone, PartialEq)]
pub struct Melody {
    /// Notes ordered by start tick
    pub notes: Vec<MelodyNote>,
    /// Every note-on pitch in time order
    pub pitches: Vec<u8>,
    /// Sum of all event delta times across every track
    pub duration_ticks: u64,
    /// Ticks per quarter note
    pub ticks_per_beat: u16,
    /// First tempo found in the file
    pub tempo_bpm: Option<f64>,
}

/// One timed event collected while walking the tracks
struct TimedEvent {
    tick: u64,
    channel: u8,
    key: u8,
    /// Note-on velocity, or `None` for a release
    velocity: Option<u8>,
}

impl Melody {
    /// Load and parse a MIDI file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let melody = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.as_ref().display(),
            notes = melody.notes.len(),
            duration = melody.duration_ticks,
            "Loaded melody"
        );
        Ok(melody)
    }

    /// Parse a melody from SMF bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(ticks) => ticks.as_int(),
            Timing::Timecode(..) => DEFAULT_TICKS_PER_BEAT,
        };

        let mut duration_ticks = 0u64;
        let mut tempo_bpm = None;
        let mut events = Vec::new();

        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                let delta = event.delta.as_int() as u64;
                tick += delta;
                duration_ticks += delta;

                match event.kind {
                    TrackEventKind::Midi { channel, message } => {
                        let (key, velocity) = match message {
                            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                                (key.as_int(), Some(vel.as_int()))
                            }
                            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                                (key.as_int(), None)
                            }
                            _ => continue,
                        };
                        events.push(TimedEvent {
                            tick,
                            channel: channel.as_int(),
                            key,
                            velocity,
                        });
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(micros)) if tempo_bpm.is_none() => {
                        let micros = micros.as_int();
                        if micros > 0 {
                            tempo_bpm = Some(60_000_000.0 / micros as f64);
                        }
                    }
                    _ => {}
                }
            }
        }

        // Stable: simultaneous events keep track order
        events.sort_by_key(|event| event.tick);
        let (notes, pitches) = Self::pair_notes(&events);

        if pitches.is_empty() {
            return Err(HarmonizeError::EmptyMelody);
        }

        Ok(Self {
            notes,
            pitches,
            duration_ticks,
            ticks_per_beat,
            tempo_bpm,
        })
    }

    /// Match note-ons with their releases. A repeated note-on closes the
    /// sounding note first; notes never released end at the last event.
    fn pair_notes(events: &[TimedEvent]) -> (Vec<MelodyNote>, Vec<u8>) {
        let mut sounding: HashMap<(u8, u8), (u64, u8)> = HashMap::new();
        let mut notes = Vec::new();
        let mut pitches = Vec::new();

        let close =
            |notes: &mut Vec<MelodyNote>, channel: u8, key: u8, start: (u64, u8), end: u64| {
                notes.push(MelodyNote {
                    tick: start.0,
                    note: key,
                    velocity: start.1,
                    channel,
                    duration: end.saturating_sub(start.0),
                });
            };

        for event in events {
            let slot = (event.channel, event.key);
            if let Some(start) = sounding.remove(&slot) {
                close(&mut notes, event.channel, event.key, start, event.tick);
            }
            if let Some(velocity) = event.velocity {
                pitches.push(event.key);
                sounding.insert(slot, (event.tick, velocity));
            }
        }

        let last_tick = events.last().map_or(0, |event| event.tick);
        for ((channel, key), start) in sounding {
            close(&mut notes, channel, key, start, last_tick);
        }

        notes.sort_by_key(|note| (note.tick, note.note));
        (notes, pitches)
    }

    /// Lowest note-on pitch
    pub fn lowest_pitch(&self) -> Option<u8> {
        self.pitches.iter().min().copied()
    }

    /// Melody pitches as absolute pitches
    pub fn absolute_pitches(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.pitches.iter().map(|&p| p as Pitch)
    }

    /// Number of chords needed to cover the melody
    pub fn beat_groups(&self) -> usize {
        beat_groups(self.duration_ticks)
    }

    /// Duration-weighted pitch-class histogram
    pub fn histogram(&self) -> [f64; 12] {
        pitch_class_histogram(
            self.notes
                .iter()
                .map(|note| (note.note, note.duration.max(1) as f64)),
        )
    }

    /// Estimate the melody's key
    pub fn detect_key(&self) -> Option<KeyEstimate> {
        detect_key(&self.histogram())
    }
}
