// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Run configuration.
//!
//! A run is described by a YAML or TOML file. Every field has a default, so
//! an empty file is a valid configuration. Command-line flags are applied on
//! top of whatever the file sets.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::harmony::{EvolutionSettings, FitnessWeights, MIN_POPULATION};
use crate::midi::export::ChordRendering;
use crate::midi::TICKS_PER_BEAT_GROUP;
use crate::music::scale::{Key, Pitch};

/// Root configuration for one harmonization run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Initial population size
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// RNG seed (random when absent)
    pub seed: Option<u64>,
    /// Generations between progress reports
    pub report_interval: Option<usize>,
    /// Fixed key such as "A minor"; skips detection when set
    pub key: Option<String>,
    /// Fitness score constants
    pub weights: FitnessWeights,
    /// Output rendering
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 300,
            seed: None,
            report_interval: None,
            key: None,
            weights: FitnessWeights::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a configuration file. `.toml` files are read as TOML, anything
    /// else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let is_toml = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a configuration from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check every field for a usable value
    pub fn validate(&self) -> Result<()> {
        if self.population_size < MIN_POPULATION {
            bail!("population_size must be at least {}", MIN_POPULATION);
        }
        if self.generations == 0 {
            bail!("generations must be at least 1");
        }
        if self.report_interval == Some(0) {
            bail!("report_interval must be at least 1");
        }
        self.output.validate()?;
        self.weights.validate().context("Invalid fitness weights")?;
        self.resolve_key()?;
        Ok(())
    }

    /// Parse the configured key, if any
    pub fn resolve_key(&self) -> Result<Option<Key>> {
        self.key
            .as_deref()
            .map(|text| Key::parse(text).with_context(|| format!("Invalid key: {:?}", text)))
            .transpose()
    }

    /// Evolution parameters for the engine
    pub fn evolution_settings(&self) -> EvolutionSettings {
        EvolutionSettings {
            population_size: self.population_size,
            generations: self.generations,
            report_interval: self.report_interval,
            seed: self.seed,
        }
    }
}

/// How the chord track is written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Chord note velocity (1-127)
    pub velocity: u8,
    /// General MIDI program for the chord track (0-127)
    pub program: u8,
    /// Semitones added to every chord pitch
    pub transpose: Pitch,
    /// Output file; derived from the input name when absent
    pub path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            velocity: 45,
            program: 0,
            transpose: -12,
            path: None,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=127).contains(&self.velocity) {
            bail!("output.velocity must be between 1 and 127");
        }
        if self.program > 127 {
            bail!("output.program must be between 0 and 127");
        }
        Ok(())
    }

    /// Rendering parameters for the chord track
    pub fn rendering(&self) -> ChordRendering {
        ChordRendering {
            transpose: self.transpose,
            velocity: self.velocity,
            beat_ticks: TICKS_PER_BEAT_GROUP,
        }
    }
}
