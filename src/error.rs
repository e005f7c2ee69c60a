// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the harmonizer.

use thiserror::Error;

/// Errors raised by the harmonizer library
#[derive(Debug, Error)]
pub enum HarmonizeError {
    /// Tonic name is not one of the 12 recognized spellings
    #[error("Unknown tonic name: {0:?}")]
    UnknownTonic(String),

    /// Mode is neither major nor minor
    #[error("Unknown mode: {0:?} (expected \"major\" or \"minor\")")]
    UnknownMode(String),

    /// Run configuration violates a constraint
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// MIDI data could not be parsed
    #[error("MIDI parse error: {0}")]
    Midi(#[from] midly::Error),

    /// The input file holds no note-on events
    #[error("Melody contains no notes")]
    EmptyMelody,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for harmonizer operations
pub type Result<T> = std::result::Result<T, HarmonizeError>;
