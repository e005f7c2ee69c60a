// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Generation loop.
//!
//! Each generation halves the population by truncation selection, then
//! regrows it from the survivors: one mutant per survivor, plus two
//! crossover children per pair. Mutation edits the chosen survivor in place
//! and the next generation gets a copy, so crossover later in the same
//! generation draws from the mutated survivors. A population of `s`
//! survivors grows to `s + 2 * (s / 2)`, which is one short of the original
//! size when `s` is odd. The loop always runs the full generation budget.
//!
//! Below [`MIN_POPULATION`] the arithmetic shrinks the population to
//! nothing within a few generations.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::individual::Individual;
use super::population::{self, Population};
use super::HarmonyContext;

/// Smallest population that keeps its size from one generation to the next
pub const MIN_POPULATION: usize = 4;

/// Parameters of one evolutionary run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionSettings {
    /// Initial population size
    pub population_size: usize,
    /// Number of generations to run
    pub generations: usize,
    /// Generations between progress reports (default: a tenth of the run)
    pub report_interval: Option<usize>,
    /// RNG seed; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 300,
            report_interval: None,
            seed: None,
        }
    }
}

impl EvolutionSettings {
    /// Effective reporting interval, never zero
    pub fn report_every(&self) -> usize {
        self.report_interval
            .unwrap_or(self.generations / 10)
            .max(1)
    }
}

/// Fitness summary of one generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// 1-based generation number
    pub generation: usize,
    pub max: i64,
    pub min: i64,
    pub mean: f64,
    pub size: usize,
}

impl GenerationStats {
    /// Summarize a population. Returns `None` when it is empty.
    pub fn measure(
        context: &HarmonyContext,
        population: &[Individual],
        generation: usize,
    ) -> Option<Self> {
        let scores: Vec<i64> = population
            .iter()
            .map(|individual| super::fitness(context, individual.chords()))
            .collect();

        let max = *scores.iter().max()?;
        let min = *scores.iter().min()?;
        let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;

        Some(Self {
            generation,
            max,
            min,
            mean,
            size: scores.len(),
        })
    }
}

/// Result of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct Harmonization {
    /// Fittest individual of the final population
    pub best: Individual,
    /// Its fitness
    pub fitness: i64,
    /// Statistics recorded at each reporting interval
    pub history: Vec<GenerationStats>,
    /// Seed the run used
    pub seed: u64,
}

/// Runs the evolutionary search for one harmonization job
pub struct EvolutionDriver {
    context: HarmonyContext,
    settings: EvolutionSettings,
    seed: u64,
    rng: StdRng,
}

impl EvolutionDriver {
    /// Create a driver. Without a configured seed one is drawn from
    /// entropy so the run can still be replayed.
    pub fn new(context: HarmonyContext, settings: EvolutionSettings) -> Self {
        let seed = settings
            .seed
            .unwrap_or_else(|| StdRng::from_entropy().gen());
        Self {
            context,
            settings,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Get the context
    pub fn context(&self) -> &HarmonyContext {
        &self.context
    }

    /// Get the settings
    pub fn settings(&self) -> &EvolutionSettings {
        &self.settings
    }

    /// Seed in use
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Regrow a selected population with mutants and crossover children.
    ///
    /// Survivors picked for mutation are changed in `selected` itself.
    pub fn evolve(&mut self, selected: &mut [Individual]) -> Population {
        let survivors = selected.len();
        let mut next = Vec::with_capacity(survivors + 2 * (survivors / 2));

        for _ in 0..survivors {
            if let Some(parent) = selected.choose_mut(&mut self.rng) {
                population::mutate(&self.context, parent, &mut self.rng);
                next.push(parent.clone());
            }
        }

        for _ in 0..survivors / 2 {
            let (Some(a), Some(b)) = (
                selected.choose(&mut self.rng),
                selected.choose(&mut self.rng),
            ) else {
                break;
            };
            let (child1, child2) = population::crossover(a, b);
            next.push(child1);
            next.push(child2);
        }

        next
    }

    /// One generation: selection followed by regrowth
    pub fn step(&mut self, population: Population) -> Population {
        let mut selected = population::select(&self.context, population);
        self.evolve(&mut selected)
    }

    /// Run the full generation budget on individuals of `length` chords
    pub fn run(&mut self, length: usize) -> Harmonization {
        let settings = self.settings;
        info!(
            key = %self.context.key(),
            octave = self.context.octave(),
            length,
            population = settings.population_size,
            generations = settings.generations,
            seed = self.seed,
            "Starting evolution"
        );

        let mut population = population::create_population(
            &self.context,
            settings.population_size,
            length,
            &mut self.rng,
        );
        let report_every = settings.report_every();
        let mut history = Vec::new();

        for generation in 1..=settings.generations {
            population = self.step(population);

            if generation % report_every == 0 {
                let stats = GenerationStats::measure(&self.context, &population, generation);
                if let Some(stats) = stats {
                    info!(
                        "Generation {}/{} : max {} : min {} : mean {:.1}",
                        generation, settings.generations, stats.max, stats.min, stats.mean
                    );
                    history.push(stats);
                } else {
                    debug!(generation, "Population is empty");
                }
            }
        }

        let (best, fitness) = match population::best(&self.context, &population) {
            Some((best, fitness)) => (best.clone(), fitness),
            None => (Individual::default(), 0),
        };
        info!(fitness, chords = best.len(), "Evolution finished");

        Harmonization {
            best,
            fitness,
            history,
            seed: self.seed,
        }
    }
}
