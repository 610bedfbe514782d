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

//! Colored terminal output for the CLI.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use termcolor::Color;
use termcolor::ColorChoice;
use termcolor::ColorSpec;
use termcolor::StandardStream;
use termcolor::WriteColor;

use crate::formats::WriteReport;

const CRATE_VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
    Some(v) => v,
    None => "unknown",
};

fn terminal_output() -> StandardStream {
    StandardStream::stderr(ColorChoice::Auto)
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().to_string(),
    )
}

/// Outputs the initial banner.
pub fn show_banner() -> Result<(), std::io::Error> {
    let mut termout = terminal_output();
    termout.set_color(ColorSpec::new().set_bold(true))?;
    write!(termout, "{:>10} ", "qoac")?;
    termout.reset()?;
    writeln!(termout, "v{CRATE_VERSION}")
}

/// Outputs an error message with an optional cause below it.
pub fn show_error_msg<E: std::error::Error>(msg: &str, cause: Option<&E>) {
    let mut termout = terminal_output();
    let _ = termout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(termout, "{:>10} ", "Error");
    let _ = termout.reset();
    let _ = writeln!(termout, "{msg}");
    if let Some(cause) = cause {
        let _ = writeln!(termout, "{:>10} {cause}", "");
    }
}

/// Outputs the pre-conversion line.
pub fn show_converting(input: &Path, output: &Path) -> Result<(), std::io::Error> {
    let mut termout = terminal_output();
    termout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(termout, "{:>10} ", "Converting")?;
    termout.reset()?;
    writeln!(termout, "{} => {}", file_name(input), file_name(output))
}

/// Outputs the post-conversion summary.
pub fn show_converted(
    output: &Path,
    convert_time: Duration,
    report: &WriteReport,
) -> Result<(), std::io::Error> {
    let mut termout = terminal_output();
    termout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(termout, "{:>10} ", "Converted")?;
    termout.reset()?;
    writeln!(
        termout,
        "{} [{} bytes / {:.3} s]",
        file_name(output),
        report.bytes_written,
        convert_time.as_secs_f32()
    )?;
    if let (Some(psnr), Some(bitrate)) = (report.psnr, report.bitrate) {
        write!(termout, "{:>10} ", "")?;
        writeln!(termout, "psnr = {psnr:.2} dB, bitrate = {bitrate:.2} kbit/s")?;
    }
    Ok(())
}

/// Outputs the per-file playback line.
pub fn show_playing(
    path: &Path,
    index: usize,
    total: usize,
    audio: &qoac::DecodedAudio,
) -> Result<(), std::io::Error> {
    let mut termout = terminal_output();
    termout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(termout, "{:>10} ", "Playing")?;
    termout.reset()?;
    writeln!(
        termout,
        "{} ({index}/{total}) [{} ch, {} Hz, {:.1} s]",
        file_name(path),
        audio.channels(),
        audio.sample_rate(),
        audio.duration().as_secs_f32()
    )
}
