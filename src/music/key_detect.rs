// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Key detection for monophonic melodies.
//!
//! Builds a duration-weighted pitch-class histogram and correlates it with
//! the Krumhansl-Kessler major and minor profiles rotated to each of the
//! 12 tonics. The best-correlated of the 24 candidates wins.

use super::scale::{Key, Mode, Note};

/// Krumhansl-Kessler major key profile (tonic first)
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile (tonic first)
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// A detected key with its profile correlation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEstimate {
    pub key: Key,
    /// Pearson correlation with the winning profile (-1.0 - 1.0)
    pub correlation: f64,
}

/// Accumulate a pitch-class histogram from (pitch, weight) pairs
pub fn pitch_class_histogram<I>(notes: I) -> [f64; 12]
where
    I: IntoIterator<Item = (u8, f64)>,
{
    let mut histogram = [0.0; 12];
    for (pitch, weight) in notes {
        histogram[(pitch % 12) as usize] += weight.max(0.0);
    }
    histogram
}

/// Pearson correlation between the histogram and a profile rotated to `tonic`
fn correlate(histogram: &[f64; 12], profile: &[f64; 12], tonic: usize) -> f64 {
    let mean_h = histogram.iter().sum::<f64>() / 12.0;
    let mean_p = profile.iter().sum::<f64>() / 12.0;

    let mut covariance = 0.0;
    let mut var_h = 0.0;
    let mut var_p = 0.0;
    for (i, &p) in profile.iter().enumerate() {
        let h = histogram[(i + tonic) % 12] - mean_h;
        let p = p - mean_p;
        covariance += h * p;
        var_h += h * h;
        var_p += p * p;
    }

    let denom = (var_h * var_p).sqrt();
    if denom <= f64::EPSILON {
        0.0
    } else {
        covariance / denom
    }
}

/// Estimate the key of a pitch-class histogram.
///
/// Returns `None` when the histogram is empty. Ties resolve to the first
/// candidate in chromatic order, major before minor.
pub fn detect_key(histogram: &[f64; 12]) -> Option<KeyEstimate> {
    if histogram.iter().all(|&w| w <= 0.0) {
        return None;
    }

    let mut best: Option<KeyEstimate> = None;
    for &tonic in Note::ALL.iter() {
        for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
            let correlation = correlate(histogram, profile, tonic.pitch_class() as usize);
            if best.map_or(true, |b| correlation > b.correlation) {
                best = Some(KeyEstimate {
                    key: Key::new(tonic, mode),
                    correlation,
                });
            }
        }
    }
    best
}
