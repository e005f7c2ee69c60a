// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fitness evaluation for chord sequences.
//!
//! A sequence is scored by four independent terms that are simply summed:
//!
//! - note validity: pitches outside the MIDI range are all but disqualifying
//! - scale conformance: off-scale pitches, plus a harmonic-function rule that
//!   restricts which chord kinds may sit on each scale degree
//! - octave discipline: chords reaching above the melody's octave
//! - voice leading: common tones between neighbouring chords are rewarded
//!
//! Higher is better. Scores are unbounded and not normalized.

use serde::{Deserialize, Serialize};

use super::chord::{Chord, ChordKind, Triad};
use super::HarmonyContext;
use crate::error::{HarmonizeError, Result};
use crate::music::scale::{Mode, Pitch, OCTAVE};

/// Lowest and highest valid MIDI pitch
const MIDI_RANGE: std::ops::RangeInclusive<Pitch> = 0..=127;

/// Score constants for each fitness term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Per pitch outside 0-127
    pub invalid_note: i64,
    /// Per chord whose kind does not fit its scale degree
    pub harmonic_mismatch: i64,
    /// Per pitch outside the scale
    pub off_scale: i64,
    /// Per octave the chord's top note sits above the melody octave
    pub octave_excess: i64,
    /// Per pitch shared with the previous chord
    pub common_tone: i64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            invalid_note: -1_000_000,
            harmonic_mismatch: -1_000,
            off_scale: -100,
            octave_excess: -100,
            common_tone: 150,
        }
    }
}

impl FitnessWeights {
    /// Check sign and ordering constraints between the terms.
    ///
    /// A chord has at most two neighbours sharing three tones each, so six
    /// common-tone bonuses must stay below one harmonic mismatch.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(HarmonizeError::InvalidConfig(msg.to_string()));

        if self.invalid_note >= 0
            || self.harmonic_mismatch >= 0
            || self.off_scale >= 0
            || self.octave_excess >= 0
        {
            return fail("penalty weights must be negative");
        }
        if self.common_tone <= 0 {
            return fail("common_tone must be positive");
        }
        if self.invalid_note > self.harmonic_mismatch.saturating_mul(100) {
            return fail("invalid_note must be at least 100x harmonic_mismatch");
        }
        if self.harmonic_mismatch >= self.off_scale {
            return fail("harmonic_mismatch must outweigh off_scale");
        }
        if self.off_scale < self.octave_excess.saturating_mul(2)
            || self.octave_excess < self.off_scale.saturating_mul(2)
        {
            return fail("octave_excess and off_scale must be within a factor of two");
        }
        if self.common_tone.saturating_mul(6) >= -self.harmonic_mismatch {
            return fail("six common_tone bonuses must stay below one harmonic_mismatch");
        }
        Ok(())
    }
}

/// Per-term fitness of one chord sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitnessBreakdown {
    pub validity: i64,
    pub scale: i64,
    pub harmonic: i64,
    pub octave: i64,
    pub similarity: i64,
}

impl FitnessBreakdown {
    /// Evaluate every term against `chords`
    pub fn evaluate(context: &HarmonyContext, chords: &[Chord]) -> Self {
        Self {
            validity: note_validity(context, chords),
            scale: scale_membership(context, chords),
            harmonic: harmonic_function(context, chords),
            octave: octave_discipline(context, chords),
            similarity: voice_leading(context, chords),
        }
    }

    /// Sum of all terms
    pub fn total(&self) -> i64 {
        self.validity + self.scale + self.harmonic + self.octave + self.similarity
    }
}

/// Total fitness of a chord sequence
pub fn fitness(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    FitnessBreakdown::evaluate(context, chords).total()
}

/// Penalty for pitches outside the MIDI range
pub fn note_validity(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    let invalid = chords
        .iter()
        .flat_map(|chord| chord.pitches())
        .filter(|pitch| !MIDI_RANGE.contains(pitch))
        .count() as i64;
    invalid * context.weights().invalid_note
}

/// Penalty for pitches outside the scale.
///
/// Voices 0 and 1 may also sit one octave above a scale pitch, which is
/// where inversions place their raised notes.
pub fn scale_membership(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    let scale = context.scale();
    let mut misses = 0i64;
    for chord in chords {
        for (voice, &pitch) in chord.pitches().iter().enumerate() {
            if scale.contains(pitch) {
                continue;
            }
            if voice < 2 && scale.contains(pitch - OCTAVE) {
                continue;
            }
            misses += 1;
        }
    }
    misses * context.weights().off_scale
}

/// Chord kinds allowed on a root-position scale degree
pub fn allowed_kinds(mode: Mode, degree: usize) -> Option<&'static [ChordKind]> {
    use ChordKind::*;

    let kinds: &'static [ChordKind] = match (mode, degree) {
        (Mode::Major, 0 | 1 | 4 | 5) => &[Major, Sus2, Sus4],
        (Mode::Major, 2) => &[Minor, Sus4],
        (Mode::Major, 3) => &[Major, Sus2],
        (Mode::Major, 6) => &[Diminished],
        (Mode::Minor, 0 | 2 | 3 | 6) => &[Minor, Sus2, Sus4],
        (Mode::Minor, 1) => &[Diminished],
        (Mode::Minor, 4) => &[Minor, Sus4],
        (Mode::Minor, 5) => &[Major, Sus2],
        _ => return None,
    };
    Some(kinds)
}

/// Degrees and inversion kinds allowed when the first voice sits an octave
/// above the scale
pub fn allowed_inversions(mode: Mode) -> (&'static [usize], &'static [ChordKind]) {
    match mode {
        Mode::Major => (
            &[0, 1, 2, 3, 4, 5],
            &[ChordKind::FirstInversionMajor, ChordKind::SecondInversionMajor],
        ),
        Mode::Minor => (
            &[0, 2, 3, 4, 5, 6],
            &[ChordKind::FirstInversionMinor, ChordKind::SecondInversionMinor],
        ),
    }
}

/// Whether the triad was built as one of `kinds` on `root`
fn built_as(triad: &Triad, root: Pitch, kinds: &[ChordKind]) -> bool {
    triad
        .shape()
        .is_some_and(|shape| shape.root == root && kinds.contains(&shape.kind))
}

/// Whether a single chord breaks the harmonic-function rule
fn breaks_harmonic_function(context: &HarmonyContext, triad: &Triad) -> bool {
    let scale = context.scale();
    let mode = context.key().mode;
    let first = triad.pitches()[0];

    if let Some(degree) = scale.degree_of(first) {
        return match allowed_kinds(mode, degree) {
            Some(kinds) => !built_as(triad, first, kinds),
            None => false,
        };
    }

    let lowered = first - OCTAVE;
    if let Some(degree) = scale.degree_of(lowered) {
        let (degrees, kinds) = allowed_inversions(mode);
        return !(degrees.contains(&degree) && built_as(triad, lowered, kinds));
    }

    // Neither in the scale nor an octave above it: not checked
    false
}

/// Penalty for chords whose kind does not match their scale degree
pub fn harmonic_function(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    let mismatches = chords
        .iter()
        .filter(|chord| match chord {
            Chord::Voiced(triad) => breaks_harmonic_function(context, triad),
            Chord::Rest => false,
        })
        .count() as i64;
    mismatches * context.weights().harmonic_mismatch
}

/// Penalty for chords whose top note climbs above the melody octave
pub fn octave_discipline(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    let mut excess = 0i64;
    for chord in chords {
        if let Chord::Voiced(triad) = chord {
            let chord_octave = triad.highest().div_euclid(OCTAVE);
            if chord_octave > context.octave() {
                excess += (chord_octave - context.octave()) as i64;
            }
        }
    }
    excess * context.weights().octave_excess
}

/// Reward for tones held over from the previous chord
pub fn voice_leading(context: &HarmonyContext, chords: &[Chord]) -> i64 {
    let shared = chords
        .windows(2)
        .map(|pair| {
            let previous = pair[0].pitches();
            pair[1]
                .pitches()
                .iter()
                .filter(|pitch| previous.contains(pitch))
                .count() as i64
        })
        .sum::<i64>();
    shared * context.weights().common_tone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::chord::*;
    use crate::music::scale::{Key, Note};

    fn c_major() -> HarmonyContext {
        HarmonyContext::new(Key::new(Note::C, Mode::Major), 5)
    }

    fn a_minor() -> HarmonyContext {
        HarmonyContext::new(Key::new(Note::A, Mode::Minor), 5)
    }

    #[test]
    fn test_empty_sequence_scores_zero() {
        assert_eq!(fitness(&c_major(), &[]), 0);
        assert_eq!(FitnessBreakdown::evaluate(&a_minor(), &[]), FitnessBreakdown::default());
    }

    #[test]
    fn test_invalid_notes_are_catastrophic() {
        let ctx = c_major();
        let penalty = ctx.weights().invalid_note;

        let high = fitness(&ctx, &[Chord::from_pitches([60, 64, 128])]);
        let clamped = fitness(&ctx, &[Chord::from_pitches([60, 64, 127])]);
        assert!(high - clamped <= penalty);

        let low = fitness(&ctx, &[Chord::from_pitches([-1, 64, 67])]);
        let clamped = fitness(&ctx, &[Chord::from_pitches([0, 64, 67])]);
        assert!(low - clamped <= penalty);
    }

    #[test]
    fn test_rest_scores_nothing() {
        let ctx = c_major();
        assert_eq!(fitness(&ctx, &[Chord::Rest]), 0);
        assert_eq!(fitness(&ctx, &[Chord::Rest, Chord::Rest, Chord::Rest]), 0);
    }

    #[test]
    fn test_scale_membership() {
        let ctx = c_major();
        assert_eq!(scale_membership(&ctx, &[major_triad(60)]), 0);

        // C# E# G#: only F (65) is diatonic
        let off = scale_membership(&ctx, &[major_triad(61)]);
        assert!(off <= 2 * ctx.weights().off_scale);
    }

    #[test]
    fn test_octave_allowance_for_first_two_voices() {
        let ctx = c_major();
        // 72 and 76 sit one octave above C and E
        assert_eq!(scale_membership(&ctx, &[second_inversion_major(60)]), 0);
        // The third voice gets no allowance
        assert_eq!(
            scale_membership(&ctx, &[Chord::from_pitches([60, 64, 79])]),
            ctx.weights().off_scale
        );
    }

    #[test]
    fn test_harmonic_function_major_key() {
        let ctx = c_major();
        let penalty = ctx.weights().harmonic_mismatch;

        // Degree 2 (E) takes minor or sus4
        assert_eq!(harmonic_function(&ctx, &[major_triad(64)]), penalty);
        assert_eq!(harmonic_function(&ctx, &[minor_triad(64)]), 0);
        assert_eq!(harmonic_function(&ctx, &[sus4(64)]), 0);

        // Degrees 0, 1, 4, 5 take major and suspensions
        assert_eq!(harmonic_function(&ctx, &[major_triad(60)]), 0);
        assert_eq!(harmonic_function(&ctx, &[sus2(67)]), 0);
        assert_eq!(harmonic_function(&ctx, &[minor_triad(69)]), penalty);

        // Degree 3 (F) refuses sus4, degree 6 (B) only diminished
        assert_eq!(harmonic_function(&ctx, &[sus4(65)]), penalty);
        assert_eq!(harmonic_function(&ctx, &[diminished(71)]), 0);
        assert_eq!(harmonic_function(&ctx, &[major_triad(71)]), penalty);
    }

    #[test]
    fn test_supertonic_takes_major_in_major_key() {
        let ctx = c_major();
        let penalty = ctx.weights().harmonic_mismatch;

        // Degree 1 (D) follows the major/sus2/sus4 row
        assert_eq!(harmonic_function(&ctx, &[major_triad(62)]), 0);
        assert_eq!(harmonic_function(&ctx, &[sus2(62)]), 0);
        assert_eq!(harmonic_function(&ctx, &[sus4(62)]), 0);
        assert_eq!(harmonic_function(&ctx, &[minor_triad(62)]), penalty);
    }

    #[test]
    fn test_harmonic_function_minor_key() {
        let ctx = a_minor();
        let penalty = ctx.weights().harmonic_mismatch;
        let scale = ctx.scale().clone();

        let tonic = scale.pitch_at_degree(0).unwrap();
        let supertonic = scale.pitch_at_degree(1).unwrap();
        let submediant = scale.pitch_at_degree(5).unwrap();

        assert_eq!(harmonic_function(&ctx, &[minor_triad(tonic)]), 0);
        assert_eq!(harmonic_function(&ctx, &[major_triad(tonic)]), penalty);
        assert_eq!(harmonic_function(&ctx, &[diminished(supertonic)]), 0);
        assert_eq!(harmonic_function(&ctx, &[major_triad(submediant)]), 0);
    }

    #[test]
    fn test_harmonic_function_inversions() {
        let ctx = c_major();
        let penalty = ctx.weights().harmonic_mismatch;

        // First voice 72 is C an octave up: only major inversions on degrees 0-5
        assert_eq!(harmonic_function(&ctx, &[first_inversion_major(60)]), 0);
        assert_eq!(harmonic_function(&ctx, &[second_inversion_major(67)]), 0);
        assert_eq!(harmonic_function(&ctx, &[first_inversion_minor(60)]), penalty);
        // B is degree 6, outside the inversion degrees
        assert_eq!(harmonic_function(&ctx, &[first_inversion_major(71)]), penalty);

        let ctx = a_minor();
        let tonic = ctx.scale().pitch_at_degree(0).unwrap();
        let supertonic = ctx.scale().pitch_at_degree(1).unwrap();
        assert_eq!(harmonic_function(&ctx, &[second_inversion_minor(tonic)]), 0);
        assert_eq!(harmonic_function(&ctx, &[first_inversion_minor(supertonic)]), penalty);
    }

    #[test]
    fn test_unrelated_roots_are_exempt() {
        let ctx = c_major();
        // C# is neither in the scale nor an octave above it
        assert_eq!(harmonic_function(&ctx, &[major_triad(61)]), 0);
        assert_eq!(harmonic_function(&ctx, &[Chord::Rest]), 0);
    }

    #[test]
    fn test_untagged_triad_never_matches() {
        let ctx = c_major();
        assert_eq!(
            harmonic_function(&ctx, &[Chord::from_pitches([60, 64, 67])]),
            ctx.weights().harmonic_mismatch
        );
    }

    #[test]
    fn test_octave_discipline() {
        let ctx = c_major();
        let unit = ctx.weights().octave_excess;

        // Top note 67 stays in octave 5
        assert_eq!(octave_discipline(&ctx, &[major_triad(60)]), 0);
        // Top note 76 reaches octave 6
        assert_eq!(octave_discipline(&ctx, &[second_inversion_major(60)]), unit);
        // Two octaves too high costs double
        assert_eq!(octave_discipline(&ctx, &[major_triad(84)]), 2 * unit);
        assert_eq!(octave_discipline(&ctx, &[major_triad(40)]), 0);
        assert_eq!(octave_discipline(&ctx, &[Chord::Rest]), 0);
    }

    #[test]
    fn test_voice_leading() {
        let ctx = c_major();
        let bonus = ctx.weights().common_tone;

        assert_eq!(voice_leading(&ctx, &[major_triad(60), major_triad(60)]), 3 * bonus);
        assert_eq!(voice_leading(&ctx, &[major_triad(60), major_triad(66)]), 0);
        // C-E-G to E-G-B shares two tones
        assert_eq!(voice_leading(&ctx, &[major_triad(60), minor_triad(64)]), 2 * bonus);
        // A single chord has no predecessor
        assert_eq!(voice_leading(&ctx, &[major_triad(60)]), 0);
        // Rests break the chain
        assert_eq!(
            voice_leading(&ctx, &[major_triad(60), Chord::Rest, major_triad(60)]),
            0
        );
    }

    #[test]
    fn test_total_is_sum_of_terms() {
        let ctx = c_major();
        let chords = [major_triad(60), major_triad(62), sus4(67), Chord::Rest, major_triad(61)];
        let breakdown = FitnessBreakdown::evaluate(&ctx, &chords);
        assert_eq!(
            breakdown.total(),
            breakdown.validity
                + breakdown.scale
                + breakdown.harmonic
                + breakdown.octave
                + breakdown.similarity
        );
        assert_eq!(fitness(&ctx, &chords), breakdown.total());
    }

    #[test]
    fn test_good_progression_beats_bad_one() {
        let ctx = c_major();
        // C, Em, Dsus2, C: diatonic, inside the octave, sharing tones
        let good = [major_triad(60), minor_triad(64), sus2(62), major_triad(60)];
        let bad = [major_triad(61), minor_triad(60), major_triad(64), first_inversion_minor(66)];
        assert!(fitness(&ctx, &good) > fitness(&ctx, &bad));
        assert!(fitness(&ctx, &good) > 0);
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(FitnessWeights::default().validate().is_ok());
    }

    #[test]
    fn test_weight_validation() {
        let weights = FitnessWeights {
            common_tone: 400,
            ..Default::default()
        };
        assert!(weights.validate().is_err());

        let weights = FitnessWeights {
            off_scale: 100,
            ..Default::default()
        };
        assert!(weights.validate().is_err());

        let weights = FitnessWeights {
            harmonic_mismatch: -50,
            ..Default::default()
        };
        assert!(weights.validate().is_err());

        let weights = FitnessWeights {
            invalid_note: -5_000,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }
}
