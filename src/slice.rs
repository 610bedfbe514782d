// Copyright 2024-2025 qoac-rs developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Slice codec: up to 20 samples of one channel against one scale factor,
//! packed into a big-endian 64-bit word.

use crate::constant::SLICE_LEN;
use crate::lms::Lms;
use crate::quant::clamp;
use crate::quant::clamp_s16;
use crate::quant::div;
use crate::quant::DEQUANT_TABLE;
use crate::quant::QUANT_TABLE;

/// Outcome of quantizing one slice against a trial scale factor.
pub(crate) struct Trial {
    /// Packed slice word, still right-aligned. Short slices are
    /// left-shifted by the frame encoder once a trial wins.
    pub(crate) word: u64,
    /// Squared reconstruction error over the slice.
    pub(crate) error: u64,
    /// Error plus the per-sample weights penalty, used for ranking.
    pub(crate) rank: u64,
    /// LMS state after encoding the slice.
    pub(crate) lms: Lms,
}

/// Quantizes `samples` (one channel, at most [`SLICE_LEN`] of them)
/// against `scale_factor`.
///
/// Bails out as soon as the accumulated error reaches `rank_limit`: such a
/// trial can no longer beat the best one, so the partial word is returned
/// unfinished and the caller's acceptance test rejects it.
pub(crate) fn encode(
    samples: &[i16],
    scale_factor: usize,
    lms: &Lms,
    penalty_squared: u64,
    rank_limit: u64,
) -> Trial {
    debug_assert!(samples.len() <= SLICE_LEN);
    let mut lms = *lms;
    let mut word = scale_factor as u64;
    let mut rank = 0u64;
    let mut error = 0u64;

    for &sample in samples {
        let predicted = lms.predict();
        let residual = i32::from(sample) - predicted;
        let scaled = div(residual, scale_factor);
        let quantized = QUANT_TABLE[(clamp(scaled, -8, 8) + 8) as usize];
        let dequantized = DEQUANT_TABLE[scale_factor][quantized as usize];
        let reconstructed = clamp_s16(predicted + dequantized);

        let delta = i64::from(sample) - i64::from(reconstructed);
        let error_squared = (delta * delta) as u64;
        rank += error_squared + penalty_squared;
        error += error_squared;
        if error >= rank_limit {
            break;
        }

        lms.update(reconstructed, dequantized);
        word = (word << 3) | u64::from(quantized);
    }

    Trial {
        word,
        error,
        rank,
        lms,
    }
}

/// Expands one slice word into `dest`, advancing `lms`.
///
/// `dest` holds at most [`SLICE_LEN`] samples; shorter only for the final
/// slice of a stream.
pub(crate) fn decode(mut word: u64, lms: &mut Lms, dest: &mut [i16]) {
    debug_assert!(dest.len() <= SLICE_LEN);
    let scale_factor = ((word >> 60) & 0xf) as usize;
    for out in dest {
        let predicted = lms.predict();
        let quantized = ((word >> 57) & 0x7) as usize;
        let dequantized = DEQUANT_TABLE[scale_factor][quantized];
        let reconstructed = clamp_s16(predicted + dequantized);

        *out = reconstructed;
        word <<= 3;

        lms.update(reconstructed, dequantized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|t| (t as i16) * 250).collect()
    }

    #[test]
    fn full_slice_word_carries_the_scale_factor_on_top() {
        let samples = ramp(SLICE_LEN);
        for sf in [0usize, 7, 15] {
            let trial = encode(&samples, sf, &Lms::seeded(), 0, u64::MAX);
            assert_eq!((trial.word >> 60) & 0xf, sf as u64);
        }
    }

    #[test]
    fn quantization_indices_stack_in_sample_order() {
        let samples = ramp(SLICE_LEN);
        let sf = 9;
        let trial = encode(&samples, sf, &Lms::seeded(), 0, u64::MAX);

        // Re-run the quantization loop and compare each 3-bit field, from
        // bit 59 downward.
        let mut lms = Lms::seeded();
        for (i, &sample) in samples.iter().enumerate() {
            let predicted = lms.predict();
            let scaled = div(i32::from(sample) - predicted, sf);
            let quantized = QUANT_TABLE[(clamp(scaled, -8, 8) + 8) as usize];
            let dequantized = DEQUANT_TABLE[sf][quantized as usize];
            let reconstructed = clamp_s16(predicted + dequantized);
            lms.update(reconstructed, dequantized);

            let field = (trial.word >> (57 - 3 * i)) & 0x7;
            assert_eq!(field, u64::from(quantized), "sample {i}");
        }
    }

    #[test]
    fn decode_replays_the_encoder_reconstruction() {
        let samples = ramp(SLICE_LEN);
        let initial = Lms::seeded();
        let trial = encode(&samples, 5, &initial, 0, u64::MAX);

        let mut lms = initial;
        let mut decoded = [0i16; SLICE_LEN];
        decode(trial.word, &mut lms, &mut decoded);

        // Encoder and decoder walk the same reconstruction path, so their
        // LMS states agree afterwards.
        assert_eq!(lms, trial.lms);
    }

    #[test]
    fn early_exit_reports_a_losing_error() {
        let samples = ramp(SLICE_LEN);
        let trial = encode(&samples, 0, &Lms::seeded(), 0, 1);
        assert!(trial.error >= 1);
    }

    #[test]
    fn error_is_zero_only_for_exactly_representable_input() {
        // A zero signal against scale factor 0 still reconstructs to +/-1
        // because quantization index 0 maps to a positive residual.
        let samples = [0i16; SLICE_LEN];
        let lms = Lms::default();
        let trial = encode(&samples, 0, &lms, 0, u64::MAX);
        assert!(trial.error > 0);
        assert_eq!(trial.error, SLICE_LEN as u64);
    }
}
