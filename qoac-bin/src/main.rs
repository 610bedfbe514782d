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

//! A simple QOA utility: convert between QOA and other audio formats, and
//! play QOA files.

// Note that clippy attributes should be in sync with those declared in
// "src/lib.rs" of the library crate.
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use log::debug;
use log::LevelFilter;

mod display;
mod formats;

// Error codes taken from "sysexits.h".
const EX_DATAERR: u8 = 65;
const EX_NOINPUT: u8 = 66;
const EX_CANTCREAT: u8 = 73;
const EX_IOERR: u8 = 74;

/// A simple QOA utility.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct ProgramArgs {
    /// Suppress informational output.
    #[clap(long, global = true)]
    quiet: bool,
    /// Enable debug logging.
    #[clap(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert between QOA and other audio formats.
    Convert(ConvertArgs),
    /// Play QOA files, or directories searched for them.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Path of the input audio file.
    input: PathBuf,
    /// Path of the output audio file.
    output: PathBuf,
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Play a single file without any progress output.
    #[clap(long)]
    no_tui: bool,
    /// Files to play, or directories to search for QOA files.
    #[clap(required = true)]
    paths: Vec<PathBuf>,
}

fn main_convert_body(args: &ConvertArgs, quiet: bool) -> Result<(), u8> {
    formats::validate_conversion(&args.input, &args.output).map_err(|e| {
        display::show_error_msg("Unsupported conversion.", Some(&e));
        EX_DATAERR
    })?;

    if !quiet {
        let _ = display::show_converting(&args.input, &args.output);
    }
    let started = Instant::now();

    let audio = formats::read_input(&args.input).map_err(|e| {
        display::show_error_msg("Failed to read the input file.", Some(&e));
        EX_NOINPUT
    })?;
    debug!(
        "input: {} Hz, {} channels, {} samples/channel",
        audio.sample_rate,
        audio.channels,
        audio.samples_per_channel()
    );

    let report = formats::write_output(&args.output, &audio).map_err(|e| {
        display::show_error_msg("Failed to write the output file.", Some(&e));
        EX_CANTCREAT
    })?;

    if !quiet {
        let _ = display::show_converted(&args.output, started.elapsed(), &report);
    }
    Ok(())
}

/// Collects QOA files under `path` (recursively for directories), sniffing
/// the magic bytes rather than trusting extensions. Lexical order.
fn collect_qoa_files(path: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    if std::fs::metadata(path)?.is_dir() {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        for entry in entries {
            collect_qoa_files(&entry, files)?;
        }
    } else if qoac::is_qoa_file(path)? {
        files.push(path.to_path_buf());
    }
    Ok(())
}

fn main_play_body(args: &PlayArgs, quiet: bool) -> Result<(), u8> {
    let mut files = Vec::new();
    for path in &args.paths {
        collect_qoa_files(path, &mut files).map_err(|e| {
            display::show_error_msg("Failed to scan for QOA files.", Some(&e));
            EX_IOERR
        })?;
    }
    if files.is_empty() {
        display::show_error_msg::<io::Error>("No QOA files found.", None);
        return Err(EX_NOINPUT);
    }
    if args.no_tui {
        files.truncate(1);
    }

    let (_stream, handle) = rodio::OutputStream::try_default().map_err(|e| {
        display::show_error_msg("Failed to open the audio output device.", Some(&e));
        EX_IOERR
    })?;
    let sink = rodio::Sink::try_new(&handle).map_err(|e| {
        display::show_error_msg("Failed to create the playback sink.", Some(&e));
        EX_IOERR
    })?;

    for (n, file) in files.iter().enumerate() {
        let bytes = std::fs::read(file).map_err(|e| {
            display::show_error_msg("Failed to read the QOA file.", Some(&e));
            EX_NOINPUT
        })?;
        let (desc, samples) = qoac::decode(&bytes).map_err(|e| {
            display::show_error_msg("Failed to decode the QOA file.", Some(&e));
            EX_DATAERR
        })?;
        debug!("{}: {desc:?}", file.display());

        let audio = qoac::DecodedAudio::new(desc, samples);
        if !quiet && !args.no_tui {
            let _ = display::show_playing(file, n + 1, files.len(), &audio);
        }
        sink.append(audio);
        sink.sleep_until_end();
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = ProgramArgs::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Off
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(level)
        .parse_env("QOAC_LOG")
        .init();

    if !args.quiet {
        let _ = display::show_banner();
    }

    match args.command {
        Commands::Convert(ref cmd) => main_convert_body(cmd, args.quiet),
        Commands::Play(ref cmd) => main_play_body(cmd, args.quiet),
    }
    .map_or_else(ExitCode::from, |()| ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    use qoac::sigen::Signal;
    use qoac::sigen::Sine;

    #[test]
    fn arg_parser() {
        match ProgramArgs::try_parse_from(["qoac", "convert", "in.wav", "out.qoa"])
            .expect("args should parse")
            .command
        {
            Commands::Convert(args) => {
                assert_eq!(args.input, PathBuf::from("in.wav"));
                assert_eq!(args.output, PathBuf::from("out.qoa"));
            }
            x @ Commands::Play(_) => panic!("result should be convert args, but {x:?}"),
        }

        let parsed = ProgramArgs::try_parse_from(["qoac", "--quiet", "play", "--no-tui", "a.qoa"])
            .expect("args should parse");
        assert!(parsed.quiet);
        match parsed.command {
            Commands::Play(args) => {
                assert!(args.no_tui);
                assert_eq!(args.paths, vec![PathBuf::from("a.qoa")]);
            }
            x @ Commands::Convert(_) => panic!("result should be play args, but {x:?}"),
        }

        assert!(ProgramArgs::try_parse_from(["qoac", "play"]).is_err());
        assert!(ProgramArgs::try_parse_from(["qoac", "convert", "only-one"]).is_err());
    }

    fn generate_test_wav(path: &Path, channels: u16, sample_rate: u32, len: usize) {
        let mut signals = vec![];
        for ch in 0..channels {
            signals.push(
                Sine::new(sample_rate as usize / 440, 0.6)
                    .noise_with_seed(u64::from(ch), 0.05)
                    .to_vec_i16(len),
            );
        }

        let mut writer = hound::WavWriter::create(
            path,
            hound::WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
        )
        .expect("should be able to create the test wav");
        for t in 0..len {
            for s in &signals {
                writer
                    .write_sample(s[t])
                    .expect("should be able to write a sample");
            }
        }
        writer.finalize().expect("should finalize the test wav");
    }

    fn psnr(reference: &[i16], decoded: &[i16]) -> f64 {
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

    #[test]
    fn integration_wav_qoa_wav() {
        let tmpdir = tempfile::tempdir().unwrap();
        let source_path = tmpdir.path().join("source.wav");
        let qoa_path = tmpdir.path().join("compressed.qoa");
        let decoded_path = tmpdir.path().join("decoded.wav");

        generate_test_wav(&source_path, 2, 44100, 44100);

        main_convert_body(
            &ConvertArgs {
                input: source_path.clone(),
                output: qoa_path.clone(),
            },
            true,
        )
        .expect("wav -> qoa should succeed");
        assert!(qoac::is_qoa_file(&qoa_path).unwrap());

        main_convert_body(
            &ConvertArgs {
                input: qoa_path,
                output: decoded_path.clone(),
            },
            true,
        )
        .expect("qoa -> wav should succeed");

        let original = formats::read_input(&source_path).unwrap();
        let decoded = formats::read_input(&decoded_path).unwrap();
        assert_eq!(decoded.sample_rate, original.sample_rate);
        assert_eq!(decoded.channels, original.channels);
        assert_eq!(decoded.samples.len(), original.samples.len());

        let quality = psnr(&original.samples, &decoded.samples);
        assert!(quality > 30.0, "psnr = {quality:.2} dB");
    }

    #[test]
    fn encoding_is_deterministic() {
        let len = 6000;
        let signal = Sine::new(97, 0.5).noise_with_seed(7, 0.1).to_vec_i16(len);

        let encode = || {
            let mut encoder = qoac::Encoder::new(32000, 1, len as u32).unwrap();
            encoder.encode(&signal).unwrap()
        };
        let first = encode();
        let second = encode();

        assert_eq!(md5::compute(&first), md5::compute(&second));
        assert!(first.len() > 16);
    }
}
