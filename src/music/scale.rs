// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale and key system for harmonization.
//!
//! Provides tonic names, major/minor keys, and the diatonic scale of a key
//! laid out as absolute MIDI pitches in a single octave.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HarmonizeError, Result};

/// Absolute MIDI pitch. Valid notes are 0-127, but chords may carry
/// out-of-range pitches which the fitness function penalizes.
pub type Pitch = i32;

/// Semitones in an octave
pub const OCTAVE: Pitch = 12;

/// Tonic names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C#
    D,
    Ds, // D#
    E,
    F,
    Fs, // F#
    G,
    Gs, // G#
    A,
    As, // A#
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse one of the 12 recognized tonic spellings ("C", "C#", ... "B").
    ///
    /// Flats and double accidentals are rejected rather than guessed at.
    pub fn parse(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        Note::ALL
            .iter()
            .copied()
            .find(|note| note.name() == upper)
            .ok_or_else(|| HarmonizeError::UnknownTonic(s.to_string()))
    }

    /// Canonical spelling
    pub fn name(self) -> &'static str {
        CHROMATIC[self.pitch_class() as usize]
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// Parse "major" or "minor" (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(Mode::Major),
            "minor" => Ok(Mode::Minor),
            _ => Err(HarmonizeError::UnknownMode(s.to_string())),
        }
    }

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A musical key with tonic and mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: Note,
    pub mode: Mode,
}

impl Key {
    /// Create a new key
    pub fn new(tonic: Note, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    /// Parse a key from strings
    pub fn from_parts(tonic: &str, mode: &str) -> Result<Self> {
        Ok(Key::new(Note::parse(tonic)?, Mode::parse(mode)?))
    }

    /// Parse a key such as "F# minor"
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(tonic), Some(mode), None) => Key::from_parts(tonic, mode),
            _ => Err(HarmonizeError::InvalidConfig(format!(
                "key must look like \"C major\", got {:?}",
                s
            ))),
        }
    }

    /// Short label used in output file names ("C#", "Am")
    pub fn short_name(&self) -> String {
        match self.mode {
            Mode::Major => self.tonic.to_string(),
            Mode::Minor => format!("{}m", self.tonic),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

/// Chromatic order used to place spelled names inside an octave.
/// `B#` sits at index 12, i.e. in the next octave.
const CHROMATIC: [&str; 13] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B", "B#",
];

/// Major scale spellings, indexed by tonic pitch class
const MAJOR_SCALES: [[&str; 7]; 12] = [
    ["C", "D", "E", "F", "G", "A", "B"],
    ["C#", "D#", "E#", "F#", "G#", "A#", "B#"],
    ["D", "E", "F#", "G", "A", "B", "C#"],
    ["D#", "F", "G", "G#", "A#", "C", "D"],
    ["E", "F#", "G#", "A", "B", "C#", "D#"],
    ["F", "G", "A", "A#", "C", "D", "E"],
    ["F#", "G#", "A#", "B", "C#", "D#", "E#"],
    ["G", "A", "B", "C", "D", "E", "F#"],
    ["G#", "A#", "B#", "C#", "D#", "E#", "F#"],
    ["A", "B", "C#", "D", "E", "F#", "G#"],
    ["A#", "C", "D", "D#", "F", "G", "A"],
    ["B", "C#", "D#", "E", "F#", "G#", "A#"],
];

/// Natural minor scale spellings, indexed by tonic pitch class
const MINOR_SCALES: [[&str; 7]; 12] = [
    ["C", "D", "D#", "F", "G", "G#", "A#"],
    ["C#", "D#", "E", "F#", "G#", "A", "B"],
    ["D", "E", "F", "G", "A", "A#", "C"],
    ["D#", "F", "F#", "G#", "A#", "B", "C#"],
    ["E", "F#", "G", "A", "B", "C", "D"],
    ["F", "G", "G#", "A#", "C", "C#", "D#"],
    ["F#", "G#", "A", "B", "C#", "D", "E"],
    ["G", "A", "A#", "C", "D", "D#", "F"],
    ["G#", "A#", "B", "C#", "D#", "E", "F#"],
    ["A", "B", "C", "D", "E", "F", "G"],
    ["A#", "C", "C#", "D#", "F", "F#", "G#"],
    ["B", "C#", "D", "E", "F#", "G", "A"],
];

/// Position of a spelled name in the chromatic order. `E#` is F.
fn chromatic_index(name: &str) -> Pitch {
    if name == "E#" {
        return 5;
    }
    match CHROMATIC.iter().position(|&n| n == name) {
        Some(index) => index as Pitch,
        None => unreachable!("scale table spelling {name:?} has no chromatic index"),
    }
}

/// The seven diatonic pitches of a key, placed in one octave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    key: Key,
    octave: Pitch,
    pitches: [Pitch; 7],
}

impl Scale {
    /// Build the scale of `key` in `octave` (pitch = 12 * octave + index)
    pub fn new(key: Key, octave: Pitch) -> Self {
        let base = OCTAVE * octave;
        let pitches = Self::spelling_of(key).map(|name| base + chromatic_index(name));
        Self {
            key,
            octave,
            pitches,
        }
    }

    /// Spelled scale names for a key
    pub fn spelling_of(key: Key) -> [&'static str; 7] {
        let index = key.tonic.pitch_class() as usize;
        match key.mode {
            Mode::Major => MAJOR_SCALES[index],
            Mode::Minor => MINOR_SCALES[index],
        }
    }

    /// Get the key
    pub fn key(&self) -> Key {
        self.key
    }

    /// Get the octave this scale was laid out in
    pub fn octave(&self) -> Pitch {
        self.octave
    }

    /// Scale pitches in degree order
    pub fn pitches(&self) -> &[Pitch; 7] {
        &self.pitches
    }

    /// Check if an absolute pitch is one of the scale pitches
    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.contains(&pitch)
    }

    /// Get the scale degree (0-based) of an absolute pitch
    pub fn degree_of(&self, pitch: Pitch) -> Option<usize> {
        self.pitches.iter().position(|&p| p == pitch)
    }

    /// Get the pitch at a scale degree (0-based)
    pub fn pitch_at_degree(&self, degree: usize) -> Option<Pitch> {
        self.pitches.get(degree).copied()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (octave {})", self.key, self.octave)
    }
}
