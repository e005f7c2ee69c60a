// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for the harmonizer.
//!
//! This module provides tonic names, major/minor keys, diatonic scales laid
//! out as absolute pitches, and key detection for melodies.

pub mod key_detect;
pub mod scale;

pub use key_detect::{detect_key, pitch_class_histogram, KeyEstimate};
pub use scale::{Key, Mode, Note, Pitch, Scale, OCTAVE};
