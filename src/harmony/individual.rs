// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! A candidate harmonization: one chord per beat-group.

use std::fmt;

use super::chord::Chord;

/// Ordered chord sequence covering the whole melody
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Individual {
    chords: Vec<Chord>,
}

impl Individual {
    /// Create an individual from chords
    pub fn new(chords: Vec<Chord>) -> Self {
        Self { chords }
    }

    /// Number of beat-groups
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    /// Check if this individual has no chords
    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Chords in order
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    /// Mutable access for in-place operators. The length cannot change.
    pub fn chords_mut(&mut self) -> &mut [Chord] {
        &mut self.chords
    }

    /// Split point used by crossover
    pub fn midpoint(&self) -> usize {
        self.chords.len() / 2
    }

    /// Consume into the chord list
    pub fn into_chords(self) -> Vec<Chord> {
        self.chords
    }
}

impl From<Vec<Chord>> for Individual {
    fn from(chords: Vec<Chord>) -> Self {
        Self::new(chords)
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", chord)?;
        }
        Ok(())
    }
}
