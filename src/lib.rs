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

#![doc = include_str!("../README.md")]
// Note that clippy attributes should be in sync with those declared in
// "qoac-bin/src/main.rs".
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

pub mod constant;
pub mod error;
pub(crate) mod frame;
pub(crate) mod lms;
pub(crate) mod quant;
pub mod reader;
pub mod sigen;
pub(crate) mod slice;
pub(crate) mod stream;

#[cfg(any(test, doctest, feature = "test_helper"))]
pub mod test_helper;

// import global entry points
pub use reader::DecodedAudio;
pub use reader::Reader;
pub use stream::decode;
pub use stream::decode_header;
pub use stream::is_qoa_file;
pub use stream::Encoder;
pub use stream::StreamDesc;
