// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Accompanist - evolutionary melody harmonizer.
//!
//! Reads a monophonic melody from a MIDI file, evolves a sequence of triads
//! to accompany it (one chord per beat-group) and writes the melody back out
//! with the chord track added.

pub mod config;
pub mod error;
pub mod harmony;
pub mod midi;
pub mod music;
pub mod session;

pub use config::{OutputConfig, RunConfig};
pub use error::{HarmonizeError, Result};
pub use session::{KeySource, Session, SessionReport};
