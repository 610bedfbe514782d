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

//! Frame codec: the 8-byte header, the per-channel LMS prelude, and the
//! brute-force scale-factor search.

use crate::constant::FRAME_HEADER_SIZE;
use crate::constant::LMS_STATE_SIZE;
use crate::constant::MAX_CHANNELS;
use crate::constant::SLICE_LEN;
use crate::error::DecodeError;
use crate::lms::Lms;
use crate::slice;
use crate::stream::StreamDesc;

/// Total byte size of a frame with the given geometry.
pub(crate) fn byte_size(channels: usize, slices: usize) -> usize {
    FRAME_HEADER_SIZE + LMS_STATE_SIZE * channels + 8 * slices * channels
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_be_bytes(bytes[at..at + 8].try_into().unwrap())
}

/// Encodes one frame into `out` and accumulates the squared reconstruction
/// error into `error_count`.
///
/// `samples` is the interleaved window for this frame; the channel LMS
/// states are carried across frames by the caller and serialized here.
pub(crate) fn encode(
    samples: &[i16],
    desc: &StreamDesc,
    lms: &mut [Lms],
    out: &mut Vec<u8>,
    error_count: &mut u64,
) {
    let channels = desc.channels as usize;
    let frame_len = samples.len() / channels;
    let slices = (frame_len + SLICE_LEN - 1) / SLICE_LEN;

    let header = (u64::from(desc.channels) << 56)
        | (u64::from(desc.sample_rate) << 32)
        | ((frame_len as u64) << 16)
        | byte_size(channels, slices) as u64;
    out.extend_from_slice(&header.to_be_bytes());

    for state in lms.iter().take(channels) {
        let (history, weights) = state.to_wire();
        out.extend_from_slice(&history.to_be_bytes());
        out.extend_from_slice(&weights.to_be_bytes());
    }

    // Slices are interleaved per channel: L0 R0 L1 R1 ...
    let mut prev_sf = [0usize; MAX_CHANNELS];
    let mut buf = [0i16; SLICE_LEN];
    for sample_index in (0..frame_len).step_by(SLICE_LEN) {
        let len = SLICE_LEN.min(frame_len - sample_index);
        for (c, state) in lms.iter_mut().enumerate().take(channels) {
            for (i, slot) in buf[..len].iter_mut().enumerate() {
                *slot = samples[(sample_index + i) * channels + c];
            }

            let (scale_factor, best) = best_scale_factor(&buf[..len], state, prev_sf[c]);
            prev_sf[c] = scale_factor;
            *state = best.lms;
            *error_count += best.error;

            // Left-align short slices so the unused low bits read as zero.
            let word = best.word << (3 * (SLICE_LEN - len));
            out.extend_from_slice(&word.to_be_bytes());
        }
    }
}

/// Brute-force search over all 16 scale factors.
///
/// Starts at the previous slice's winner since neighboring slices
/// correlate strongly. Earlier trials win ties; later trials must strictly
/// improve on the best rank seen so far.
fn best_scale_factor(samples: &[i16], lms: &Lms, prev_sf: usize) -> (usize, slice::Trial) {
    let penalty_squared = lms.weights_penalty_squared();

    let mut scale_factor = prev_sf % 16;
    let mut best = slice::encode(samples, scale_factor, lms, penalty_squared, u64::MAX);
    let mut best_rank = best.rank;

    for i in 1..16 {
        let sf = (i + prev_sf) % 16;
        let trial = slice::encode(samples, sf, lms, penalty_squared, best_rank);
        if trial.error < best_rank {
            best_rank = trial.rank;
            best = trial;
            scale_factor = sf;
        }
    }
    (scale_factor, best)
}

/// Decodes one frame from `bytes` into `out`.
///
/// Returns the per-channel sample count and the bytes consumed. `out` is
/// the interleaved destination window starting at the frame's first
/// sample.
pub(crate) fn decode(
    bytes: &[u8],
    desc: &StreamDesc,
    lms: &mut [Lms],
    out: &mut [i16],
) -> Result<(usize, usize), DecodeError> {
    let channels = desc.channels as usize;
    if bytes.len() < FRAME_HEADER_SIZE + LMS_STATE_SIZE * channels {
        return Err(DecodeError::FrameTooSmall);
    }

    let header = read_u64(bytes, 0);
    let f_channels = ((header >> 56) & 0xff) as u32;
    let f_sample_rate = ((header >> 32) & 0xff_ffff) as u32;
    let f_samples = ((header >> 16) & 0xffff) as usize;
    let f_size = (header & 0xffff) as usize;

    if f_channels != desc.channels || f_sample_rate != desc.sample_rate {
        return Err(DecodeError::InvalidFrame);
    }
    let data_size = f_size
        .checked_sub(FRAME_HEADER_SIZE + LMS_STATE_SIZE * channels)
        .ok_or(DecodeError::InvalidFrame)?;
    let num_slices = data_size / 8;
    if f_size > bytes.len()
        || f_samples * channels > num_slices * SLICE_LEN
        || f_samples * channels > out.len()
    {
        return Err(DecodeError::InvalidFrame);
    }

    let mut p = FRAME_HEADER_SIZE;
    for state in lms.iter_mut().take(channels) {
        let history = read_u64(bytes, p);
        let weights = read_u64(bytes, p + 8);
        *state = Lms::from_wire(history, weights);
        p += LMS_STATE_SIZE;
    }

    let mut buf = [0i16; SLICE_LEN];
    for sample_index in (0..f_samples).step_by(SLICE_LEN) {
        let len = SLICE_LEN.min(f_samples - sample_index);
        for (c, state) in lms.iter_mut().enumerate().take(channels) {
            if p + 8 > f_size {
                return Err(DecodeError::InvalidFrame);
            }
            slice::decode(read_u64(bytes, p), state, &mut buf[..len]);
            p += 8;

            for (i, &sample) in buf[..len].iter().enumerate() {
                out[(sample_index + i) * channels + c] = sample;
            }
        }
    }

    Ok((f_samples, p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::FRAME_LEN;

    fn stereo_desc() -> StreamDesc {
        StreamDesc {
            channels: 2,
            sample_rate: 44100,
            samples: FRAME_LEN as u32,
        }
    }

    fn encode_one(samples: &[i16], desc: &StreamDesc) -> (Vec<u8>, Vec<Lms>) {
        let mut lms = vec![Lms::seeded(); desc.channels as usize];
        let mut out = Vec::new();
        let mut error_count = 0;
        encode(samples, desc, &mut lms, &mut out, &mut error_count);
        (out, lms)
    }

    #[test]
    fn header_records_the_frame_geometry() {
        let desc = stereo_desc();
        let samples = vec![0i16; 100 * 2];
        let (out, _) = encode_one(&samples, &desc);

        let header = read_u64(&out, 0);
        assert_eq!((header >> 56) & 0xff, 2);
        assert_eq!((header >> 32) & 0xff_ffff, 44100);
        assert_eq!((header >> 16) & 0xffff, 100);
        // 100 samples make 5 slices per channel.
        assert_eq!(header & 0xffff, byte_size(2, 5) as u64);
        assert_eq!(out.len(), byte_size(2, 5));
    }

    #[test]
    fn prelude_carries_the_entry_lms_state() {
        let desc = stereo_desc();
        let samples = vec![0i16; 40];
        let (out, _) = encode_one(&samples, &desc);

        let expected = Lms::seeded().to_wire();
        assert_eq!(read_u64(&out, 8), expected.0);
        assert_eq!(read_u64(&out, 16), expected.1);
    }

    #[test]
    fn decode_round_trips_an_encoded_frame() {
        let desc = stereo_desc();
        let samples: Vec<i16> = (0..90 * 2).map(|t| ((t * 37) % 2000) as i16 - 1000).collect();
        let (out, encoder_lms) = encode_one(&samples, &desc);

        let mut lms = vec![Lms::default(); 2];
        let mut decoded = vec![0i16; 90 * 2];
        let (frame_samples, consumed) =
            decode(&out, &desc, &mut lms, &mut decoded).expect("frame must decode");

        assert_eq!(frame_samples, 90);
        assert_eq!(consumed, out.len());
        // Decoder state converges to the encoder's committed state.
        assert_eq!(lms, encoder_lms);
    }

    #[test]
    fn decode_rejects_short_input() {
        let desc = stereo_desc();
        let mut lms = vec![Lms::default(); 2];
        let mut out = vec![0i16; 16];
        assert_eq!(
            decode(&[0u8; 16], &desc, &mut lms, &mut out),
            Err(DecodeError::FrameTooSmall)
        );
    }

    #[test]
    fn decode_rejects_channel_mismatch() {
        let desc = stereo_desc();
        let samples = vec![0i16; 40];
        let (mut out, _) = encode_one(&samples, &desc);

        // Rewrite the channel count field to 3.
        out[0] = 3;
        let mut lms = vec![Lms::default(); 2];
        let mut decoded = vec![0i16; 40];
        assert_eq!(
            decode(&out, &desc, &mut lms, &mut decoded),
            Err(DecodeError::InvalidFrame)
        );
    }

    #[test]
    fn decode_rejects_oversized_frame_size() {
        let desc = stereo_desc();
        let samples = vec![0i16; 40];
        let (mut out, _) = encode_one(&samples, &desc);

        // Claim a size beyond the available bytes.
        let bogus = (out.len() + 8) as u16;
        out[6..8].copy_from_slice(&bogus.to_be_bytes());
        let mut lms = vec![Lms::default(); 2];
        let mut decoded = vec![0i16; 40];
        assert_eq!(
            decode(&out, &desc, &mut lms, &mut decoded),
            Err(DecodeError::InvalidFrame)
        );
    }

    #[test]
    fn decode_rejects_sample_counts_beyond_slice_capacity() {
        let desc = stereo_desc();
        let samples = vec![0i16; 40];
        let (mut out, _) = encode_one(&samples, &desc);

        // 21 samples would need two slices per channel; only one is present.
        out[4..6].copy_from_slice(&21u16.to_be_bytes());
        let mut lms = vec![Lms::default(); 2];
        let mut decoded = vec![0i16; 21 * 2];
        assert_eq!(
            decode(&out, &desc, &mut lms, &mut decoded),
            Err(DecodeError::InvalidFrame)
        );
    }
}
