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

//! Format constants.

/// Magic number at the start of every QOA file (`qoaf`).
pub const MAGIC: u32 = u32::from_be_bytes(*b"qoaf");

/// Smallest parseable input: the file header plus one frame header.
pub const MIN_FILE_SIZE: usize = 16;

/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: usize = 8;

/// Size of a frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Samples per channel carried by one 64-bit slice.
pub const SLICE_LEN: usize = 20;

/// Slices per channel in every frame except possibly the last.
pub const SLICES_PER_FRAME: usize = 256;

/// Samples per channel in a full frame.
pub const FRAME_LEN: usize = SLICES_PER_FRAME * SLICE_LEN;

/// Taps in the LMS predictor; also the element count of the serialized
/// history and weight vectors.
pub const LMS_LEN: usize = 4;

/// Serialized LMS state size per channel (history plus weights).
pub const LMS_STATE_SIZE: usize = 16;

/// Highest channel count the decoder supports.
pub const MAX_CHANNELS: usize = 8;

/// Highest sample rate the 24-bit header field can carry.
pub const MAX_SAMPLE_RATE: u32 = (1 << 24) - 1;
