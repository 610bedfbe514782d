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

//! Pull-style access to decoded audio.

use std::io;
use std::io::Read;
use std::io::SeekFrom;
use std::time::Duration;

use crate::error::SeekError;
use crate::stream::StreamDesc;

/// Sequential byte source over a decoded sample buffer.
///
/// Each read emits little-endian `i16` bytes and advances the cursor; the
/// end of the buffer reads as EOF. Seeking is measured in samples, not
/// bytes.
#[derive(Clone, Debug)]
pub struct Reader {
    data: Vec<i16>,
    pos: usize,
}

impl Reader {
    /// Wraps a decoded sample buffer.
    pub fn new(data: Vec<i16>) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of samples consumed so far.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Total number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Moves the cursor to the sample offset described by `pos`.
    ///
    /// # Errors
    ///
    /// [`SeekError::Invalid`] when the target lies before the start,
    /// [`SeekError::PastEnd`] when it lies past the end.
    pub fn seek_samples(&mut self, pos: SeekFrom) -> Result<usize, SeekError> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.pos as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.data.len() as i128 + i128::from(delta),
        };
        if target < 0 {
            return Err(SeekError::Invalid);
        }
        if target > self.data.len() as i128 {
            return Err(SeekError::PastEnd);
        }
        self.pos = target as usize;
        Ok(self.pos)
    }
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let take = (buf.len() / 2).min(self.data.len() - self.pos);
        for (i, &sample) in self.data[self.pos..self.pos + take].iter().enumerate() {
            buf[2 * i..2 * i + 2].copy_from_slice(&sample.to_le_bytes());
        }
        self.pos += take;
        Ok(take * 2)
    }
}

/// A fully decoded stream bundled with its descriptor, ready for playback.
///
/// Iterates over the interleaved samples. With the `rodio` feature it also
/// implements `rodio::Source`, so it can be appended to a sink directly.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    desc: StreamDesc,
    reader: Reader,
}

impl DecodedAudio {
    /// Bundles a descriptor with its decoded interleaved samples.
    pub fn new(desc: StreamDesc, samples: Vec<i16>) -> Self {
        debug_assert_eq!(
            samples.len(),
            desc.channels as usize * desc.samples as usize
        );
        Self {
            desc,
            reader: Reader::new(samples),
        }
    }

    /// Number of interleaved channels.
    pub const fn channels(&self) -> u32 {
        self.desc.channels
    }

    /// Sample rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.desc.sample_rate
    }

    /// Playback duration.
    pub fn duration(&self) -> Duration {
        self.desc.duration()
    }

    /// Unwraps into the underlying byte reader.
    pub fn into_reader(self) -> Reader {
        self.reader
    }
}

impl Iterator for DecodedAudio {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        let sample = *self.reader.data.get(self.reader.pos)?;
        self.reader.pos += 1;
        Some(sample)
    }
}

#[cfg(feature = "rodio")]
mod rodio_integration {
    use std::time::Duration;

    use super::DecodedAudio;

    impl rodio::Source for DecodedAudio {
        fn current_frame_len(&self) -> Option<usize> {
            None
        }

        fn channels(&self) -> u16 {
            self.desc.channels as u16
        }

        fn sample_rate(&self) -> u32 {
            self.desc.sample_rate
        }

        fn total_duration(&self) -> Option<Duration> {
            Some(self.duration())
        }
    }
}
