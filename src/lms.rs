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

//! The Sign-Sign LMS predictor that drives QOA's sample prediction.
//!
//! One [`Lms`] tracks a single channel. The encoder clones it per trial
//! during the scale-factor search and commits the clone of the winning
//! trial; the decoder reloads it from the wire at every frame boundary.

use crate::constant::LMS_LEN;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Lms {
    pub(crate) history: [i32; LMS_LEN],
    pub(crate) weights: [i32; LMS_LEN],
}

impl Lms {
    /// Fresh encoder state. The weight seed tracks the first few
    /// milliseconds of typical material better than all-zero weights.
    pub(crate) fn seeded() -> Self {
        Self {
            history: [0; LMS_LEN],
            weights: [0, 0, -(1 << 13), 1 << 14],
        }
    }

    /// Predicts the next sample from the weighted history.
    #[inline]
    pub(crate) fn predict(&self) -> i32 {
        let mut acc = 0i64;
        for i in 0..LMS_LEN {
            acc += i64::from(self.weights[i]) * i64::from(self.history[i]);
        }
        (acc >> 13) as i32
    }

    /// Folds a reconstructed sample and its dequantized residual into the
    /// state.
    ///
    /// Weights are signed 16-bit quantities, in memory as on the wire:
    /// each update wraps its tap back into the `i16` range.
    #[inline]
    pub(crate) fn update(&mut self, sample: i16, residual: i32) {
        let delta = residual >> 4;
        for i in 0..LMS_LEN {
            let step = if self.history[i] < 0 { -delta } else { delta };
            self.weights[i] = i32::from((self.weights[i] + step) as i16);
        }
        self.history.rotate_left(1);
        self.history[LMS_LEN - 1] = i32::from(sample);
    }

    /// Squared penalty applied per sample when ranking scale-factor
    /// trials. Oversized weights are known to cause pops with
    /// high-frequency content; ranking them down steers the search toward
    /// safer factors.
    pub(crate) fn weights_penalty_squared(&self) -> u64 {
        let sum: i64 = self
            .weights
            .iter()
            .map(|&w| i64::from(w) * i64::from(w))
            .sum();
        let penalty = (sum >> 18) - 0x8ff;
        if penalty > 0 {
            (penalty * penalty) as u64
        } else {
            0
        }
    }

    /// Packs history and weights into the two big-endian words of the
    /// frame prelude. Both vectors already sit in the 16-bit range, so
    /// the masking only strips sign extension.
    pub(crate) fn to_wire(&self) -> (u64, u64) {
        let mut history = 0u64;
        let mut weights = 0u64;
        for i in 0..LMS_LEN {
            history = (history << 16) | ((self.history[i] as u64) & 0xffff);
            weights = (weights << 16) | ((self.weights[i] as u64) & 0xffff);
        }
        (history, weights)
    }

    /// Rebuilds the state from a frame prelude.
    pub(crate) fn from_wire(mut history: u64, mut weights: u64) -> Self {
        let mut lms = Self::default();
        for i in 0..LMS_LEN {
            lms.history[i] = i32::from((history >> 48) as i16);
            history <<= 16;
            lms.weights[i] = i32::from((weights >> 48) as i16);
            weights <<= 16;
        }
        lms
    }
}
