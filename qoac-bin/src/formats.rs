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

//! Audio-file adapters for the `convert` command.
//!
//! The codec only ever sees interleaved 16-bit PCM; everything
//! format-specific stays behind [`read_input`] and [`write_output`] so an
//! adapter can be added or replaced without touching the rest of the CLI.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use qoac::error::DecodeError;
use qoac::error::EncodeError;

/// File extensions `convert` accepts on either side.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["qoa", "wav", "mp3", "ogg", "flac"];

/// Interleaved 16-bit PCM with its stream parameters.
pub struct PcmAudio {
    pub sample_rate: u32,
    pub channels: u32,
    pub samples: Vec<i16>,
}

impl PcmAudio {
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

/// Statistics reported after writing an output file.
pub struct WriteReport {
    pub bytes_written: usize,
    /// Encoder quality in dB; present for QOA outputs.
    pub psnr: Option<f64>,
    /// Output bitrate in kbit/s; present for QOA outputs.
    pub bitrate: Option<f64>,
}

/// Enum of failures from conversion validation and the adapters.
#[derive(Debug)]
pub enum FormatError {
    /// Input and output share the same extension.
    SameExtension,
    /// An extension outside [`SUPPORTED_EXTENSIONS`].
    UnsupportedExtension(String),
    /// Neither side of the conversion is a `.qoa` file.
    NoQoaSide,
    /// The extension is recognized but this build ships no adapter for it.
    UnsupportedCodec(String),
    /// A WAV file the adapter cannot digest (QOA is 16-bit integer PCM).
    UnsupportedWav(String),
    /// QOA decoding failure.
    Decode(DecodeError),
    /// QOA encoding failure.
    Encode(EncodeError),
    /// File system failure.
    Io(io::Error),
    /// WAV parsing or writing failure.
    Wav(hound::Error),
}

impl Error for FormatError {}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameExtension => {
                write!(f, "input and output must use different extensions")
            }
            Self::UnsupportedExtension(ext) => {
                write!(
                    f,
                    "extension `{ext}` is not supported (expected one of {})",
                    SUPPORTED_EXTENSIONS.join(", ")
                )
            }
            Self::NoQoaSide => write!(f, "either the input or the output must be a .qoa file"),
            Self::UnsupportedCodec(ext) => {
                write!(f, "no `{ext}` adapter is available in this build")
            }
            Self::UnsupportedWav(detail) => {
                write!(f, "only 16-bit integer PCM WAV is supported, got {detail}")
            }
            Self::Decode(e) => write!(f, "QOA decode failed: {e}"),
            Self::Encode(e) => write!(f, "QOA encode failed: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Wav(e) => write!(f, "WAV error: {e}"),
        }
    }
}

impl From<DecodeError> for FormatError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<EncodeError> for FormatError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<hound::Error> for FormatError {
    fn from(e: hound::Error) -> Self {
        Self::Wav(e)
    }
}

fn extension(path: &Path) -> Result<String, FormatError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| FormatError::UnsupportedExtension(path.display().to_string()))
}

/// Checks the `convert` extension rules: different extensions, both
/// supported, and at least one side `.qoa`.
pub fn validate_conversion(input: &Path, output: &Path) -> Result<(), FormatError> {
    let in_ext = extension(input)?;
    let out_ext = extension(output)?;

    if in_ext == out_ext {
        return Err(FormatError::SameExtension);
    }
    for ext in [&in_ext, &out_ext] {
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(FormatError::UnsupportedExtension(ext.clone()));
        }
    }
    if in_ext != "qoa" && out_ext != "qoa" {
        return Err(FormatError::NoQoaSide);
    }
    Ok(())
}

/// Loads an input file into PCM, dispatching on the extension.
pub fn read_input(path: &Path) -> Result<PcmAudio, FormatError> {
    match extension(path)?.as_str() {
        "qoa" => {
            let bytes = fs::read(path)?;
            let (desc, samples) = qoac::decode(&bytes)?;
            Ok(PcmAudio {
                sample_rate: desc.sample_rate,
                channels: desc.channels,
                samples,
            })
        }
        "wav" => read_wav(path),
        other => Err(FormatError::UnsupportedCodec(other.to_owned())),
    }
}

fn read_wav(path: &Path) -> Result<PcmAudio, FormatError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(FormatError::UnsupportedWav(format!(
            "{}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let mut samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    // Drop trailing samples of an incomplete final inter-channel frame.
    let channels = usize::from(spec.channels);
    samples.truncate(samples.len() / channels * channels);

    Ok(PcmAudio {
        sample_rate: spec.sample_rate,
        channels: u32::from(spec.channels),
        samples,
    })
}

/// Writes PCM to an output file, dispatching on the extension.
pub fn write_output(path: &Path, audio: &PcmAudio) -> Result<WriteReport, FormatError> {
    match extension(path)?.as_str() {
        "qoa" => write_qoa(path, audio),
        "wav" => write_wav(path, audio),
        other => Err(FormatError::UnsupportedCodec(other.to_owned())),
    }
}

fn write_qoa(path: &Path, audio: &PcmAudio) -> Result<WriteReport, FormatError> {
    let samples_per_channel = audio.samples_per_channel();
    let mut encoder = qoac::Encoder::new(
        audio.sample_rate,
        audio.channels,
        samples_per_channel as u32,
    )?;
    let bytes = encoder.encode(&audio.samples)?;
    fs::write(path, &bytes)?;

    let seconds = samples_per_channel as f64 / f64::from(audio.sample_rate);
    Ok(WriteReport {
        bytes_written: bytes.len(),
        psnr: Some(encoder.psnr()),
        bitrate: Some(bytes.len() as f64 * 8.0 / seconds / 1000.0),
    })
}

fn write_wav(path: &Path, audio: &PcmAudio) -> Result<WriteReport, FormatError> {
    let spec = hound::WavSpec {
        channels: audio.channels as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &audio.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(WriteReport {
        bytes_written: fs::metadata(path)?.len() as usize,
        psnr: None,
        bitrate: None,
    })
}
