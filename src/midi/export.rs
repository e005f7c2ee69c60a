// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Writes the original melody and the generated chord track as a Type 1
//! MIDI file: a tempo track followed by one track per part. Tracks are
//! assembled as `midly` events and encoded by `midly`.

use std::io;
use std::path::Path;

use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use tracing::warn;

use super::reader::MelodyNote;
use super::{DEFAULT_TICKS_PER_BEAT, TICKS_PER_BEAT_GROUP};
use crate::harmony::individual::Individual;
use crate::music::scale::Pitch;

/// Largest delta time a track event can carry
const MAX_DELTA: u64 = 0x0FFF_FFFF;

/// Largest tempo value (microseconds per quarter note)
const MAX_TEMPO_MICROS: f64 = 0xFF_FFFF as f64;

/// A track for export
#[derive(Debug, Clone)]
pub struct ExportTrack {
    /// Track name
    pub name: String,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Notes in this track
    pub notes: Vec<ExportNote>,
    /// Program change at start (None = no change)
    pub program: Option<u8>,
}

impl ExportTrack {
    /// Create a new export track
    pub fn new(name: impl Into<String>, channel: u8) -> Self {
        Self {
            name: name.into(),
            channel,
            notes: Vec::new(),
            program: None,
        }
    }

    /// Add a note
    pub fn add_note(&mut self, note: ExportNote) {
        self.notes.push(note);
    }

    /// Add notes read from an input melody
    pub fn add_melody_notes(&mut self, notes: &[MelodyNote]) {
        for melody_note in notes {
            self.notes.push(ExportNote {
                tick: melody_note.tick,
                note: melody_note.note,
                velocity: melody_note.velocity,
                duration: melody_note.duration,
            });
        }
    }

    /// Set program
    pub fn with_program(mut self, program: u8) -> Self {
        self.program = Some(program);
        self
    }

    /// Events of this track in playing order, as (absolute tick, event)
    fn timed_events(&self) -> Vec<(u64, TrackEventKind<'_>)> {
        let channel = u4::new(self.channel & 0x0F);
        let name = TrackEventKind::Meta(MetaMessage::TrackName(self.name.as_bytes()));
        let mut events = vec![(0, name)];

        if let Some(program) = self.program {
            events.push((
                0,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange {
                        program: u7::new(program & 0x7F),
                    },
                },
            ));
        }

        let mut notes = Vec::with_capacity(self.notes.len() * 2);
        for note in &self.notes {
            let key = u7::new(note.note & 0x7F);
            notes.push((
                note.tick,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(note.velocity & 0x7F),
                    },
                },
            ));
            notes.push((
                note.end_tick(),
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key,
                        vel: u7::new(0),
                    },
                },
            ));
        }

        // Releases sort ahead of attacks on the same tick
        notes.sort_by_key(|(tick, kind)| {
            let attack = matches!(
                kind,
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                }
            );
            (*tick, attack)
        });
        events.extend(notes);
        events
    }
}

/// A note for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// Note number (0-127)
    pub note: u8,
    /// Velocity (1-127)
    pub velocity: u8,
    /// Duration in ticks
    pub duration: u64,
}

impl ExportNote {
    /// Create a new export note
    pub fn new(tick: u64, note: u8, velocity: u8, duration: u64) -> Self {
        Self {
            tick,
            note,
            velocity,
            duration,
        }
    }

    /// End tick
    pub fn end_tick(&self) -> u64 {
        self.tick + self.duration
    }
}

/// How chords are rendered into notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordRendering {
    /// Semitones added to every chord pitch
    pub transpose: Pitch,
    /// Note-on velocity
    pub velocity: u8,
    /// Length of one beat-group in ticks
    pub beat_ticks: u64,
}

impl Default for ChordRendering {
    fn default() -> Self {
        Self {
            transpose: -12,
            velocity: 45,
            beat_ticks: TICKS_PER_BEAT_GROUP,
        }
    }
}

/// Turn a harmonization into notes, one beat-group per chord.
///
/// Rests only advance time. Pitches pushed outside 0-127 by the transpose
/// are dropped and counted in the returned total.
pub fn render_chords(
    individual: &Individual,
    rendering: &ChordRendering,
) -> (Vec<ExportNote>, usize) {
    let mut notes = Vec::new();
    let mut skipped = 0;

    for (index, chord) in individual.chords().iter().enumerate() {
        let tick = index as u64 * rendering.beat_ticks;
        for &pitch in chord.pitches() {
            let shifted = pitch + rendering.transpose;
            match u8::try_from(shifted) {
                Ok(note) if note <= 127 => {
                    notes.push(ExportNote::new(
                        tick,
                        note,
                        rendering.velocity,
                        rendering.beat_ticks,
                    ));
                }
                _ => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Dropped chord notes outside the MIDI range");
    }
    (notes, skipped)
}

/// Convert absolute-tick events to a `midly` track closed by end-of-track
fn to_track<'a>(events: Vec<(u64, TrackEventKind<'a>)>) -> Track<'a> {
    let mut track = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0u64;

    for (tick, kind) in events {
        let delta = tick.saturating_sub(last_tick).min(MAX_DELTA);
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind,
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// Type 1 MIDI file writer
pub struct MidiExporter {
    /// PPQN (ticks per quarter note)
    ppqn: u16,
    /// Tempo in BPM
    tempo: f64,
    /// Time signature
    time_sig: (u8, u8),
    /// Tracks to export
    tracks: Vec<ExportTrack>,
}

impl MidiExporter {
    /// Create a new exporter
    pub fn new() -> Self {
        Self {
            ppqn: DEFAULT_TICKS_PER_BEAT,
            tempo: 120.0,
            time_sig: (4, 4),
            tracks: Vec::new(),
        }
    }

    /// Set PPQN (1-32767)
    pub fn set_ppqn(&mut self, ppqn: u16) {
        self.ppqn = ppqn.clamp(1, 0x7FFF);
    }

    /// Get PPQN
    pub fn ppqn(&self) -> u16 {
        self.ppqn
    }

    /// Set tempo. Any positive tempo is kept as given.
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.tempo = bpm;
        } else {
            warn!(bpm, kept = self.tempo, "Ignoring unusable tempo");
        }
    }

    /// Get tempo
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Set time signature
    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        self.time_sig = (numerator.max(1), denominator.max(1));
    }

    /// Get time signature
    pub fn time_signature(&self) -> (u8, u8) {
        self.time_sig
    }

    /// Add a track
    pub fn add_track(&mut self, track: ExportTrack) {
        self.tracks.push(track);
    }

    /// Get tracks
    pub fn tracks(&self) -> &[ExportTrack] {
        &self.tracks
    }

    /// Tempo as microseconds per quarter note, limited to what the file
    /// format can store
    fn tempo_micros(&self) -> u32 {
        let micros = (60_000_000.0 / self.tempo).round();
        if !(1.0..=MAX_TEMPO_MICROS).contains(&micros) {
            warn!(bpm = self.tempo, "Tempo outside the MIDI file range, clamping");
        }
        micros.clamp(1.0, MAX_TEMPO_MICROS) as u32
    }

    /// Build the in-memory file: tempo track, then one track per part
    pub fn to_smf(&self) -> Smf<'_> {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(self.ppqn)),
        ));

        // Denominator is expressed as power of 2
        let denom_power = (self.time_sig.1 as f64).log2() as u8;
        let tempo_events = vec![
            (0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(self.tempo_micros())))),
            (
                0,
                TrackEventKind::Meta(MetaMessage::TimeSignature(
                    self.time_sig.0,
                    denom_power,
                    24, // MIDI clocks per metronome click
                    8,  // 32nd notes per MIDI quarter note
                )),
            ),
            (0, TrackEventKind::Meta(MetaMessage::TrackName(b"Tempo"))),
        ];
        smf.tracks.push(to_track(tempo_events));

        for track in &self.tracks {
            smf.tracks.push(to_track(track.timed_events()));
        }

        smf
    }

    /// Export to file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.to_smf().save(path)
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.to_smf().write_std(&mut buffer)?;
        Ok(buffer)
    }
}

impl Default for MidiExporter {
    fn default() -> Self {
        Self::new()
    }
}
