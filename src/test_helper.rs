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

//! Helpers shared by the unit and end-to-end tests.

/// Interleaves per-channel signals into the channel-interleaved layout the
/// codec consumes. Channels are truncated to the shortest one.
pub fn interleave(channels: &[Vec<i16>]) -> Vec<i16> {
    let len = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len * channels.len());
    for t in 0..len {
        for ch in channels {
            out.push(ch[t]);
        }
    }
    out
}

/// Peak signal-to-noise ratio between two equally sized sample buffers, in
/// dB. Identical buffers come out as infinity.
pub fn psnr(reference: &[i16], decoded: &[i16]) -> f64 {
    assert_eq!(reference.len(), decoded.len());
    let error_sum: u64 = reference
        .iter()
        .zip(decoded)
        .map(|(&a, &b)| {
            let d = i64::from(a) - i64::from(b);
            (d * d) as u64
        })
        .sum();
    let rms = (error_sum as f64 / reference.len() as f64).sqrt();
    -20.0 * (rms / 32768.0).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaving_alternates_channels() {
        let out = interleave(&[vec![1, 3, 5], vec![2, 4, 6]]);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn psnr_of_identical_buffers_is_infinite() {
        let signal = vec![123i16; 32];
        assert!(psnr(&signal, &signal).is_infinite());
    }

    #[test]
    fn psnr_drops_with_added_error() {
        let reference = vec![0i16; 1000];
        let slightly_off = vec![1i16; 1000];
        let very_off = vec![1000i16; 1000];
        assert!(psnr(&reference, &slightly_off) > psnr(&reference, &very_off));
        assert!(psnr(&reference, &very_off) > 0.0);
    }
}
