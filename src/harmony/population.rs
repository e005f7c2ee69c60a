// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Population operators: random creation, mutation, crossover and
//! truncation selection.
//!
//! All randomness comes from the caller's RNG so a seeded run is
//! reproducible. Empty individuals and empty populations pass through
//! every operator unchanged.

use std::cmp::Reverse;
use std::slice;

use rand::Rng;

use super::chord::{Chord, VOCABULARY};
use super::fitness::fitness;
use super::individual::Individual;
use super::HarmonyContext;

/// A generation of candidate harmonizations
pub type Population = Vec<Individual>;

/// Draw one chord: uniform generator (rest included), uniform root in the
/// melody octave
pub fn random_chord<R: Rng + ?Sized>(context: &HarmonyContext, rng: &mut R) -> Chord {
    let generator = VOCABULARY[rng.gen_range(0..VOCABULARY.len())];
    let root = rng.gen_range(context.root_range());
    generator(root)
}

/// Create a random individual of `length` chords
pub fn create_individual<R: Rng + ?Sized>(
    context: &HarmonyContext,
    length: usize,
    rng: &mut R,
) -> Individual {
    let chords = (0..length).map(|_| random_chord(context, rng)).collect();
    Individual::new(chords)
}

/// Create `size` independent random individuals
pub fn create_population<R: Rng + ?Sized>(
    context: &HarmonyContext,
    size: usize,
    length: usize,
    rng: &mut R,
) -> Population {
    (0..size)
        .map(|_| create_individual(context, length, rng))
        .collect()
}

/// Re-roll one random position if that chord, scored on its own, is
/// negative. Returns whether the chord was replaced.
///
/// Scoring a lone chord leaves out voice leading, which makes this a cheap
/// local check rather than a full re-evaluation.
pub fn mutate<R: Rng + ?Sized>(
    context: &HarmonyContext,
    individual: &mut Individual,
    rng: &mut R,
) -> bool {
    if individual.is_empty() {
        return false;
    }

    let index = rng.gen_range(0..individual.len());
    let chord = individual.chords()[index];
    if fitness(context, slice::from_ref(&chord)) < 0 {
        individual.chords_mut()[index] = random_chord(context, rng);
        true
    } else {
        false
    }
}

/// Single-point crossover at each parent's midpoint.
///
/// The first child takes `a`'s front and `b`'s back; the second the reverse.
pub fn crossover(a: &Individual, b: &Individual) -> (Individual, Individual) {
    let (a_front, a_back) = a.chords().split_at(a.midpoint());
    let (b_front, b_back) = b.chords().split_at(b.midpoint());

    let child1 = [a_front, b_back].concat();
    let child2 = [b_front, a_back].concat();
    (Individual::new(child1), Individual::new(child2))
}

/// Keep the fitter half (rounded down) of the population
pub fn select(context: &HarmonyContext, mut population: Population) -> Population {
    let keep = population.len() / 2;
    population.sort_by_cached_key(|individual| Reverse(fitness(context, individual.chords())));
    population.truncate(keep);
    population
}

/// Fittest individual with its score
pub fn best<'a>(
    context: &HarmonyContext,
    population: &'a [Individual],
) -> Option<(&'a Individual, i64)> {
    population
        .iter()
        .map(|individual| (individual, fitness(context, individual.chords())))
        .max_by_key(|(_, score)| *score)
}
