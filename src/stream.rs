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

//! Stream codec: file-header handling, the frame loop, and the encoder
//! entry point.

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::constant::FILE_HEADER_SIZE;
use crate::constant::FRAME_HEADER_SIZE;
use crate::constant::FRAME_LEN;
use crate::constant::LMS_STATE_SIZE;
use crate::constant::MAGIC;
use crate::constant::MAX_CHANNELS;
use crate::constant::MAX_SAMPLE_RATE;
use crate::constant::MIN_FILE_SIZE;
use crate::constant::SLICE_LEN;
use crate::error::DecodeError;
use crate::error::EncodeError;
use crate::frame;
use crate::lms::Lms;

/// Describes a QOA stream: channel count, sample rate, and per-channel
/// sample count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct StreamDesc {
    /// Number of interleaved channels (`1..=8`).
    pub channels: u32,
    /// Sample rate in Hz (24-bit field on the wire).
    pub sample_rate: u32,
    /// Samples per channel.
    pub samples: u32,
}

impl StreamDesc {
    /// Playback duration of the described stream.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.samples) / f64::from(self.sample_rate))
    }
}

/// Inspects the first 16 bytes of a QOA stream and returns its descriptor.
///
/// The channel count and sample rate live in the first frame header, so 16
/// bytes are required even though the file header itself is 8.
///
/// # Errors
///
/// Returns [`DecodeError::FileTooSmall`], [`DecodeError::BadMagic`],
/// [`DecodeError::NoSamples`], or [`DecodeError::InvalidStreamHeader`]
/// depending on which prefix check fails.
///
/// # Examples
///
/// ```
/// let header = [
///     0x71, 0x6f, 0x61, 0x66, // "qoaf"
///     0x00, 0x01, 0x58, 0x88, // 88200 samples per channel
///     0x02, 0x00, 0xac, 0x44, // 2 channels at 44100 Hz
///     0x14, 0x00, 0x00, 0x00, // rest of the first frame header
/// ];
/// let desc = qoac::decode_header(&header).unwrap();
/// assert_eq!(desc.channels, 2);
/// assert_eq!(desc.sample_rate, 44100);
/// assert_eq!(desc.samples, 88200);
/// ```
pub fn decode_header(bytes: &[u8]) -> Result<StreamDesc, DecodeError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(DecodeError::FileTooSmall);
    }

    let file_header = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
    if (file_header >> 32) as u32 != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let samples = file_header as u32;
    if samples == 0 {
        return Err(DecodeError::NoSamples);
    }

    // Peek into the first frame header for the channel count and rate.
    let frame_header = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
    let channels = ((frame_header >> 56) & 0xff) as u32;
    let sample_rate = ((frame_header >> 32) & 0xff_ffff) as u32;
    if channels == 0 || sample_rate == 0 {
        return Err(DecodeError::InvalidStreamHeader);
    }

    Ok(StreamDesc {
        channels,
        sample_rate,
        samples,
    })
}

/// Decodes a complete QOA byte stream into interleaved 16-bit samples.
///
/// A truncated stream is not an error as long as every frame present
/// parses cleanly: the returned descriptor's `samples` reflects what was
/// actually emitted and the buffer is sized to match.
///
/// # Errors
///
/// Returns the header errors of [`decode_header`], or
/// [`DecodeError::FrameTooSmall`]/[`DecodeError::InvalidFrame`] when a
/// frame fails to parse.
pub fn decode(bytes: &[u8]) -> Result<(StreamDesc, Vec<i16>), DecodeError> {
    let mut desc = decode_header(bytes)?;
    let channels = desc.channels as usize;
    let mut data = vec![0i16; desc.samples as usize * channels];
    let mut lms = vec![Lms::default(); channels];

    let mut p = FILE_HEADER_SIZE;
    let mut emitted = 0usize;
    loop {
        let (frame_samples, consumed) =
            frame::decode(&bytes[p..], &desc, &mut lms, &mut data[emitted * channels..])?;
        p += consumed;
        emitted += frame_samples;
        if consumed == 0 || emitted >= desc.samples as usize || p >= bytes.len() {
            break;
        }
    }

    log::debug!(
        "decoded {emitted} of {} samples per channel across {} bytes",
        desc.samples,
        p
    );
    desc.samples = emitted as u32;
    data.truncate(emitted * channels);
    Ok((desc, data))
}

/// Returns whether the file at `path` starts with the QOA magic bytes.
///
/// # Errors
///
/// Propagates I/O errors other than a short read; files shorter than the
/// magic are simply not QOA.
pub fn is_qoa_file<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    let mut magic = [0u8; 4];
    match File::open(path)?.read_exact(&mut magic) {
        Ok(()) => Ok(magic == MAGIC.to_be_bytes()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// QOA encoder for one fixed set of stream parameters.
///
/// # Examples
///
/// ```
/// let mut encoder = qoac::Encoder::new(44100, 2, 20).unwrap();
/// let bytes = encoder.encode(&[0i16; 40]).unwrap();
/// assert_eq!(&bytes[0..4], b"qoaf");
/// ```
#[derive(Clone, Debug)]
pub struct Encoder {
    desc: StreamDesc,
    error_count: u64,
}

impl Encoder {
    /// Builds an encoder after validating the stream parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvalidParameters`] when channels fall
    /// outside `1..=8`, the sample rate outside `1..=16_777_215`, or
    /// `samples` is zero.
    pub fn new(sample_rate: u32, channels: u32, samples: u32) -> Result<Self, EncodeError> {
        if channels == 0
            || channels > MAX_CHANNELS as u32
            || sample_rate == 0
            || sample_rate > MAX_SAMPLE_RATE
            || samples == 0
        {
            return Err(EncodeError::InvalidParameters);
        }
        Ok(Self {
            desc: StreamDesc {
                channels,
                sample_rate,
                samples,
            },
            error_count: 0,
        })
    }

    /// Returns the stream descriptor this encoder was built for.
    pub const fn desc(&self) -> StreamDesc {
        self.desc
    }

    /// Encodes channel-interleaved `samples` into a QOA byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::SampleCountMismatch`] unless the buffer
    /// holds exactly `channels * samples` values.
    pub fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>, EncodeError> {
        let channels = self.desc.channels as usize;
        let samples_per_channel = self.desc.samples as usize;
        let total = samples_per_channel * channels;
        if samples.len() != total {
            return Err(EncodeError::SampleCountMismatch {
                expected: total,
                actual: samples.len(),
            });
        }

        let num_frames = (samples_per_channel + FRAME_LEN - 1) / FRAME_LEN;
        let num_slices = (samples_per_channel + SLICE_LEN - 1) / SLICE_LEN;
        let encoded_size = FILE_HEADER_SIZE
            + num_frames * (FRAME_HEADER_SIZE + LMS_STATE_SIZE * channels)
            + num_slices * 8 * channels;

        let mut out = Vec::with_capacity(encoded_size);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.desc.samples.to_be_bytes());

        let mut lms = vec![Lms::seeded(); channels];
        self.error_count = 0;
        for window in samples.chunks(FRAME_LEN * channels) {
            frame::encode(window, &self.desc, &mut lms, &mut out, &mut self.error_count);
        }
        debug_assert_eq!(out.len(), encoded_size);

        log::debug!(
            "encoded {num_frames} frames ({encoded_size} bytes), psnr {:.2} dB",
            self.psnr()
        );
        Ok(out)
    }

    /// Sum of squared reconstruction errors accumulated by the last
    /// encode.
    pub const fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Peak signal-to-noise ratio of the last encode, in dB.
    pub fn psnr(&self) -> f64 {
        let n = f64::from(self.desc.samples) * f64::from(self.desc.channels);
        let rms = (self.error_count as f64 / n).sqrt();
        -20.0 * (rms / 32768.0).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper;

    #[test]
    fn encoded_file_header_is_bit_exact() {
        let samples_per_channel = 88200u32;
        let signal = vec![0i16; samples_per_channel as usize * 2];
        let mut encoder = Encoder::new(44100, 2, samples_per_channel).unwrap();
        let bytes = encoder.encode(&signal).unwrap();
        assert_eq!(
            &bytes[0..8],
            &[0x71, 0x6f, 0x61, 0x66, 0x00, 0x01, 0x58, 0x88]
        );
    }

    #[test]
    fn header_decodes_a_minimal_valid_prefix() {
        let bytes = [
            0x71, 0x6f, 0x61, 0x66, 0x00, 0x00, 0x00, 0x01, //
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ];
        let desc = decode_header(&bytes).unwrap();
        assert_eq!(
            desc,
            StreamDesc {
                channels: 1,
                sample_rate: 131_844,
                samples: 1,
            }
        );
    }

    #[test]
    fn header_rejects_bad_magic() {
        let bytes = [0u8; 16];
        assert_eq!(decode_header(&bytes), Err(DecodeError::BadMagic));
    }

    #[test]
    fn header_rejects_zero_samples() {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(b"qoaf");
        assert_eq!(decode_header(&bytes), Err(DecodeError::NoSamples));
    }

    #[test]
    fn header_rejects_zero_channels_or_rate() {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(b"qoaf");
        bytes[7] = 0x01;
        assert_eq!(decode_header(&bytes), Err(DecodeError::InvalidStreamHeader));
    }

    #[test]
    fn header_rejects_short_input() {
        assert_eq!(decode_header(&[0x71; 8]), Err(DecodeError::FileTooSmall));
        assert_eq!(decode_header(&[]), Err(DecodeError::FileTooSmall));
    }

    #[test]
    fn encoder_rejects_out_of_range_parameters() {
        assert!(matches!(
            Encoder::new(44100, 0, 1),
            Err(EncodeError::InvalidParameters)
        ));
        assert!(Encoder::new(44100, 9, 1).is_err());
        assert!(Encoder::new(0, 2, 1).is_err());
        assert!(Encoder::new(1 << 24, 2, 1).is_err());
        assert!(Encoder::new(44100, 2, 0).is_err());
        assert!(Encoder::new((1 << 24) - 1, 8, 1).is_ok());
        assert!(Encoder::new(1, 1, 1).is_ok());
    }

    #[test]
    fn encoder_rejects_mismatched_buffers() {
        let mut encoder = Encoder::new(44100, 2, 100).unwrap();
        assert_eq!(
            encoder.encode(&vec![0i16; 199]),
            Err(EncodeError::SampleCountMismatch {
                expected: 200,
                actual: 199,
            })
        );
        assert!(encoder.encode(&vec![0i16; 201]).is_err());
    }

    #[test]
    fn encoded_size_is_exact() {
        // 5121 samples: one full frame plus a one-slice frame.
        let samples_per_channel = 5121;
        let signal = vec![100i16; samples_per_channel * 2];
        let mut encoder = Encoder::new(48000, 2, samples_per_channel as u32).unwrap();
        let bytes = encoder.encode(&signal).unwrap();

        let expected = 8 + 2 * (8 + 16 * 2) + 257 * 8 * 2;
        assert_eq!(bytes.len(), expected);
    }

    #[test]
    fn decode_recovers_from_truncation() {
        // Two frames; cut the stream at the first frame boundary.
        let samples_per_channel = 5121u32;
        let signal = vec![1000i16; samples_per_channel as usize];
        let mut encoder = Encoder::new(24000, 1, samples_per_channel).unwrap();
        let bytes = encoder.encode(&signal).unwrap();

        let first_frame_end = 8 + 8 + 16 + 256 * 8;
        let (desc, decoded) = decode(&bytes[..first_frame_end]).unwrap();
        assert_eq!(desc.samples, FRAME_LEN as u32);
        assert_eq!(decoded.len(), FRAME_LEN);
    }

    #[test]
    fn decode_reports_garbage_after_the_header() {
        let mut bytes = vec![0u8; 24];
        bytes[0..4].copy_from_slice(b"qoaf");
        bytes[7] = 40; // 40 samples declared
        bytes[8] = 1; // 1 channel
        bytes[10] = 0xac;
        bytes[11] = 0x44; // 44100 Hz
        // Only 16 bytes remain after the file header, less than the 24 a
        // one-channel frame needs.
        assert_eq!(decode(&bytes).unwrap_err(), DecodeError::FrameTooSmall);
    }

    #[test]
    fn round_trip_preserves_descriptor_and_length() {
        let signal = test_helper::interleave(&[
            (0..2000).map(|t| ((t * 13) % 5000 - 2500) as i16).collect(),
            (0..2000).map(|t| ((t * 7) % 3000 - 1500) as i16).collect(),
        ]);
        let mut encoder = Encoder::new(22050, 2, 2000).unwrap();
        let bytes = encoder.encode(&signal).unwrap();
        let (desc, decoded) = decode(&bytes).unwrap();

        assert_eq!(desc, encoder.desc());
        assert_eq!(decoded.len(), signal.len());
    }

    #[test]
    fn is_qoa_file_sniffs_the_magic() {
        let dir = tempfile::tempdir().unwrap();
        let qoa_path = dir.path().join("a.qoa");
        let other_path = dir.path().join("b.bin");
        let short_path = dir.path().join("c.bin");

        let mut encoder = Encoder::new(8000, 1, 20).unwrap();
        std::fs::write(&qoa_path, encoder.encode(&[0i16; 20]).unwrap()).unwrap();
        std::fs::write(&other_path, b"RIFF....WAVE").unwrap();
        std::fs::write(&short_path, b"qo").unwrap();

        assert!(is_qoa_file(&qoa_path).unwrap());
        assert!(!is_qoa_file(&other_path).unwrap());
        assert!(!is_qoa_file(&short_path).unwrap());
        assert!(is_qoa_file(dir.path().join("missing.qoa")).is_err());
    }
}
