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

//! Error types for the decoder, the encoder, and the sample reader.
//!
//! QOA carries no error correction. Every failure is returned to the
//! caller; nothing is retried or logged inside the codec.

use std::error::Error;
use std::fmt;

/// Enum of failures the decoder can report.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Input is shorter than the 16-byte minimum (file header plus first
    /// frame header).
    FileTooSmall,
    /// File header magic is not `qoaf`.
    BadMagic,
    /// File header declares zero samples. This also rejects streaming-mode
    /// files, which use a zero count on purpose.
    NoSamples,
    /// First frame header declares zero channels or a zero sample rate.
    InvalidStreamHeader,
    /// Remaining input is shorter than the minimum frame for the declared
    /// channel count.
    FrameTooSmall,
    /// A frame header contradicts the stream: channel or sample-rate
    /// mismatch, a size exceeding the remaining input, or more samples
    /// than its slices can hold.
    InvalidFrame,
}

impl Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileTooSmall => write!(f, "input is smaller than the 16-byte minimum"),
            Self::BadMagic => write!(f, "missing `qoaf` magic bytes"),
            Self::NoSamples => write!(f, "header declares zero samples"),
            Self::InvalidStreamHeader => {
                write!(f, "first frame header has zero channels or sample rate")
            }
            Self::FrameTooSmall => write!(f, "remaining input is too short for a frame"),
            Self::InvalidFrame => write!(f, "frame header is inconsistent with the stream"),
        }
    }
}

/// Enum of failures the encoder can report.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum EncodeError {
    /// Stream parameters out of range: channels outside `1..=8`, sample
    /// rate outside `1..=16_777_215`, or zero samples.
    InvalidParameters,
    /// The sample buffer does not hold exactly `channels * samples`
    /// values.
    SampleCountMismatch {
        /// Required buffer length.
        expected: usize,
        /// Provided buffer length.
        actual: usize,
    },
}

impl Error for EncodeError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters => write!(f, "stream parameters are out of range"),
            Self::SampleCountMismatch { expected, actual } => write!(
                f,
                "sample buffer holds {actual} values but the stream needs {expected}"
            ),
        }
    }
}

/// Enum of failures from seeking a [`Reader`].
///
/// [`Reader`]: crate::Reader
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SeekError {
    /// The target position lies before the start of the buffer.
    Invalid,
    /// The target position lies past the end of the buffer.
    PastEnd,
}

impl Error for SeekError {}

impl fmt::Display for SeekError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "seek target is before the start of the stream"),
            Self::PastEnd => write!(f, "seek target is past the end of the stream"),
        }
    }
}
