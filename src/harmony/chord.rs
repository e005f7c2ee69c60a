// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord vocabulary.
//!
//! Every chord is built by one of a fixed set of generators from a root
//! pitch. Generated triads remember their shape (kind and root) so the
//! fitness function can check harmonic function without comparing pitch
//! content. Rest is its own variant and carries no pitches.

use std::fmt;

use crate::music::scale::{Pitch, OCTAVE};

/// Chord shapes available to the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordKind {
    Major,
    Minor,
    FirstInversionMajor,
    FirstInversionMinor,
    SecondInversionMajor,
    SecondInversionMinor,
    Diminished,
    Sus2,
    Sus4,
}

impl ChordKind {
    /// All sounding chord kinds
    pub const ALL: [ChordKind; 9] = [
        ChordKind::Major,
        ChordKind::Minor,
        ChordKind::FirstInversionMajor,
        ChordKind::FirstInversionMinor,
        ChordKind::SecondInversionMajor,
        ChordKind::SecondInversionMinor,
        ChordKind::Diminished,
        ChordKind::Sus2,
        ChordKind::Sus4,
    ];

    /// Semitone offsets from the root, in voice order.
    ///
    /// Inversions put the raised root first, so position 0 is not the
    /// lowest sounding pitch for them.
    pub fn offsets(self) -> [Pitch; 3] {
        match self {
            ChordKind::Major => [0, 4, 7],
            ChordKind::Minor => [0, 3, 7],
            ChordKind::FirstInversionMajor => [OCTAVE, 4, 7],
            ChordKind::FirstInversionMinor => [OCTAVE, 3, 7],
            ChordKind::SecondInversionMajor => [OCTAVE, OCTAVE + 4, 7],
            ChordKind::SecondInversionMinor => [OCTAVE, OCTAVE + 3, 7],
            ChordKind::Diminished => [0, 3, 6],
            ChordKind::Sus2 => [0, 2, 7],
            ChordKind::Sus4 => [0, 5, 7],
        }
    }

    /// Whether this kind is one of the inversion voicings
    pub fn is_inversion(self) -> bool {
        matches!(
            self,
            ChordKind::FirstInversionMajor
                | ChordKind::FirstInversionMinor
                | ChordKind::SecondInversionMajor
                | ChordKind::SecondInversionMinor
        )
    }

    /// Build a chord of this kind on `root`
    pub fn build(self, root: Pitch) -> Chord {
        let offsets = self.offsets();
        Chord::Voiced(Triad {
            pitches: offsets.map(|offset| root + offset),
            shape: Some(Shape { kind: self, root }),
        })
    }

    /// Get a human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ChordKind::Major => "major",
            ChordKind::Minor => "minor",
            ChordKind::FirstInversionMajor => "major/1st",
            ChordKind::FirstInversionMinor => "minor/1st",
            ChordKind::SecondInversionMajor => "major/2nd",
            ChordKind::SecondInversionMinor => "minor/2nd",
            ChordKind::Diminished => "dim",
            ChordKind::Sus2 => "sus2",
            ChordKind::Sus4 => "sus4",
        }
    }
}

impl fmt::Display for ChordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Provenance of a generated triad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub kind: ChordKind,
    pub root: Pitch,
}

/// Three ordered pitches, optionally tagged with the generator that made them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triad {
    pitches: [Pitch; 3],
    shape: Option<Shape>,
}

impl Triad {
    /// Create an untagged triad from raw pitches.
    ///
    /// Untagged triads never satisfy a harmonic-function rule.
    pub fn from_pitches(pitches: [Pitch; 3]) -> Self {
        Self {
            pitches,
            shape: None,
        }
    }

    /// Pitches in voice order
    pub fn pitches(&self) -> &[Pitch; 3] {
        &self.pitches
    }

    /// Generator provenance, if known
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Highest pitch
    pub fn highest(&self) -> Pitch {
        self.pitches[0].max(self.pitches[1]).max(self.pitches[2])
    }
}

/// One beat-group of the harmonization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chord {
    Voiced(Triad),
    Rest,
}

impl Chord {
    /// Create an untagged chord from raw pitches
    pub fn from_pitches(pitches: [Pitch; 3]) -> Self {
        Chord::Voiced(Triad::from_pitches(pitches))
    }

    /// Sounding pitches (empty for a rest)
    pub fn pitches(&self) -> &[Pitch] {
        match self {
            Chord::Voiced(triad) => triad.pitches.as_slice(),
            Chord::Rest => &[],
        }
    }

    /// Check if this is a rest
    pub fn is_rest(&self) -> bool {
        matches!(self, Chord::Rest)
    }

    /// Generator provenance, if any
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Chord::Voiced(triad) => triad.shape(),
            Chord::Rest => None,
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Rest => write!(f, "rest"),
            Chord::Voiced(triad) => {
                let [a, b, c] = triad.pitches;
                match triad.shape {
                    Some(shape) => write!(f, "{}@{} [{} {} {}]", shape.kind, shape.root, a, b, c),
                    None => write!(f, "[{} {} {}]", a, b, c),
                }
            }
        }
    }
}

/// Generator signature shared by every vocabulary entry
pub type ChordGenerator = fn(Pitch) -> Chord;

pub fn major_triad(root: Pitch) -> Chord {
    ChordKind::Major.build(root)
}

pub fn minor_triad(root: Pitch) -> Chord {
    ChordKind::Minor.build(root)
}

pub fn first_inversion_major(root: Pitch) -> Chord {
    ChordKind::FirstInversionMajor.build(root)
}

pub fn first_inversion_minor(root: Pitch) -> Chord {
    ChordKind::FirstInversionMinor.build(root)
}

pub fn second_inversion_major(root: Pitch) -> Chord {
    ChordKind::SecondInversionMajor.build(root)
}

pub fn second_inversion_minor(root: Pitch) -> Chord {
    ChordKind::SecondInversionMinor.build(root)
}

pub fn diminished(root: Pitch) -> Chord {
    ChordKind::Diminished.build(root)
}

pub fn sus2(root: Pitch) -> Chord {
    ChordKind::Sus2.build(root)
}

pub fn sus4(root: Pitch) -> Chord {
    ChordKind::Sus4.build(root)
}

/// Silence for one beat-group; the root is ignored
pub fn rest(_root: Pitch) -> Chord {
    Chord::Rest
}

/// Every generator the search draws from, rest included
pub const VOCABULARY: [ChordGenerator; 10] = [
    major_triad,
    minor_triad,
    first_inversion_major,
    first_inversion_minor,
    second_inversion_major,
    second_inversion_minor,
    diminished,
    sus2,
    sus4,
    rest,
];
