// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI file input and output.
//!
//! The harmonizer works in beat-groups: one chord per quarter of a 4/4 bar,
//! measured at 384 ticks per beat-group regardless of the input resolution.

pub mod export;
pub mod reader;

pub use export::{render_chords, ChordRendering, ExportNote, ExportTrack, MidiExporter};
pub use reader::{Melody, MelodyNote};

/// Ticks in one beat-group
pub const TICKS_PER_BEAT_GROUP: u64 = 384;

/// Ticks in one 4/4 bar
pub const TICKS_PER_BAR: u64 = 4 * TICKS_PER_BEAT_GROUP;

/// Resolution used when a file carries SMPTE timing
pub const DEFAULT_TICKS_PER_BEAT: u16 = 384;

/// Number of chords needed to cover `duration_ticks`: whole bars, rounded
/// up, four chords each
pub fn beat_groups(duration_ticks: u64) -> usize {
    let bars = (duration_ticks + TICKS_PER_BAR - 1) / TICKS_PER_BAR;
    bars as usize * 4
}
