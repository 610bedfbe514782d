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

//! Deterministic test-signal generators.
//!
//! Primarily for the test suite, but public so the benches and the
//! external fuzz harness can build inputs from the same vocabulary.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Generators producing floating-point waveforms in `[-1, 1]`.
pub trait Signal {
    /// Generates the signal from `sample_offset` onward and fills `dest`.
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f32]);

    /// Generates `len` samples quantized to the 16-bit PCM range.
    fn to_vec_i16(&self, len: usize) -> Vec<i16> {
        let mut buffer = vec![0.0f32; len];
        self.fill_buffer(0, &mut buffer);
        buffer
            .into_iter()
            .map(|x| (x * 32767.0).round().clamp(-32768.0, 32767.0) as i16)
            .collect()
    }

    /// Mixes default-seeded noise into the signal.
    fn noise(self, amplitude: f32) -> Mix<Self, Noise>
    where
        Self: Sized,
    {
        self.mix(Noise::new(amplitude))
    }

    /// Mixes seeded noise into the signal.
    fn noise_with_seed(self, seed: u64, amplitude: f32) -> Mix<Self, Noise>
    where
        Self: Sized,
    {
        self.mix(Noise::with_seed(seed, amplitude))
    }

    /// Mixes the other generator's output into this one.
    fn mix<T: Signal>(self, other: T) -> Mix<Self, T>
    where
        Self: Sized,
    {
        Mix::new(1.0, self, 1.0, other)
    }
}

/// Constant-offset signal.
#[derive(Clone, Debug)]
pub struct Dc {
    offset: f32,
}

impl Dc {
    /// Constructs a constant signal at `offset`.
    pub fn new(offset: f32) -> Self {
        Self { offset }
    }
}

impl Signal for Dc {
    fn fill_buffer(&self, _sample_offset: usize, dest: &mut [f32]) {
        dest.fill(self.offset);
    }
}

/// Sinusoid with a given period (in samples) and amplitude.
#[derive(Clone, Debug)]
pub struct Sine {
    period: usize,
    amplitude: f32,
}

impl Sine {
    /// Constructs a sine wave; a zero period is clamped to one sample.
    pub fn new(period: usize, amplitude: f32) -> Self {
        Self {
            period: period.max(1),
            amplitude,
        }
    }
}

impl Signal for Sine {
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f32]) {
        for (i, p) in dest.iter_mut().enumerate() {
            let t = (sample_offset + i) as f32;
            *p = self.amplitude * (2.0 * PI * t / self.period as f32).sin();
        }
    }
}

/// Uniform white noise with a fixed seed.
#[derive(Clone, Debug)]
pub struct Noise {
    seed: u64,
    amplitude: f32,
}

impl Noise {
    /// Constructs noise with the default seed.
    pub fn new(amplitude: f32) -> Self {
        Self::with_seed(0x51ce, amplitude)
    }

    /// Constructs noise from an explicit seed.
    pub fn with_seed(seed: u64, amplitude: f32) -> Self {
        Self { seed, amplitude }
    }
}

impl Signal for Noise {
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f32]) {
        let offset_seed = (sample_offset as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let mut rng = StdRng::seed_from_u64(self.seed ^ offset_seed);
        for p in dest {
            *p = self.amplitude * (rng.gen::<f32>() * 2.0 - 1.0);
        }
    }
}

/// Weighted sum of two generators.
#[derive(Clone, Debug)]
pub struct Mix<A, B> {
    gain_a: f32,
    a: A,
    gain_b: f32,
    b: B,
}

impl<A: Signal, B: Signal> Mix<A, B> {
    /// Constructs a weighted mix of two generators.
    pub fn new(gain_a: f32, a: A, gain_b: f32, b: B) -> Self {
        Self {
            gain_a,
            a,
            gain_b,
            b,
        }
    }
}

impl<A: Signal, B: Signal> Signal for Mix<A, B> {
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f32]) {
        self.a.fill_buffer(sample_offset, dest);
        for p in dest.iter_mut() {
            *p *= self.gain_a;
        }
        let mut other = vec![0.0f32; dest.len()];
        self.b.fill_buffer(sample_offset, &mut other);
        for (p, x) in dest.iter_mut().zip(other) {
            *p += self.gain_b * x;
        }
    }
}
