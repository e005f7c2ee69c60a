// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Evolutionary harmonization engine.
//!
//! This module holds the chord vocabulary, the fitness function, the
//! population operators and the generation loop. Everything here is pure
//! apart from the random source handed in by the caller; the key and
//! octave of a run travel in a [`HarmonyContext`].

pub mod chord;
pub mod evolution;
pub mod fitness;
pub mod individual;
pub mod population;

use std::ops::RangeInclusive;

use crate::music::scale::{Key, Pitch, Scale, OCTAVE};

pub use chord::{Chord, ChordKind, Shape, Triad};
pub use evolution::{
    EvolutionDriver, EvolutionSettings, GenerationStats, Harmonization, MIN_POPULATION,
};
pub use fitness::{fitness, FitnessBreakdown, FitnessWeights};
pub use individual::Individual;
pub use population::Population;

/// Read-only facts about one harmonization run
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonyContext {
    key: Key,
    octave: Pitch,
    scale: Scale,
    weights: FitnessWeights,
}

impl HarmonyContext {
    /// Create a context with default fitness weights
    pub fn new(key: Key, octave: Pitch) -> Self {
        Self {
            key,
            octave,
            scale: Scale::new(key, octave),
            weights: FitnessWeights::default(),
        }
    }

    /// Create a context whose octave is that of the lowest melody pitch.
    ///
    /// Returns `None` for an empty melody.
    pub fn for_melody<I>(key: Key, pitches: I) -> Option<Self>
    where
        I: IntoIterator<Item = Pitch>,
    {
        let lowest = pitches.into_iter().min()?;
        Some(Self::new(key, lowest.div_euclid(OCTAVE)))
    }

    /// Replace the fitness weights
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Get the key
    pub fn key(&self) -> Key {
        self.key
    }

    /// Octave of the melody's lowest note
    pub fn octave(&self) -> Pitch {
        self.octave
    }

    /// Diatonic scale in the melody octave
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Fitness weights
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Roots that random chords are drawn from
    pub fn root_range(&self) -> RangeInclusive<Pitch> {
        let base = OCTAVE * self.octave;
        base..=base + OCTAVE - 1
    }
}
