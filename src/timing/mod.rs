// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo and tick arithmetic.
//!
//! Timelines are laid out in MIDI ticks at a fixed resolution of
//! [`TICKS_PER_QUARTER`]; a [`Tempo`] converts ticks to wall-clock time.

use std::time::Duration;

/// Ticks per quarter note used by timelines and exported files
pub const TICKS_PER_QUARTER: u32 = 128;

/// Lowest tempo accepted from a session
pub const MIN_TEMPO: u32 = 60;

/// Highest tempo accepted from a session
pub const MAX_TEMPO: u32 = 200;

pub const DEFAULT_TEMPO: u32 = 120;

/// Tempo in beats (quarter notes) per minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Create a tempo; values are kept within 20-300 BPM
    ///
    /// A non-finite value falls back to [`DEFAULT_TEMPO`].
    pub fn new(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() {
            bpm.clamp(20.0, 300.0)
        } else {
            DEFAULT_TEMPO as f64
        };
        Self { bpm }
    }

    /// Tempo from a session value, clamped to the session range
    pub fn from_session(bpm: u32) -> Self {
        Self::new(bpm.clamp(MIN_TEMPO, MAX_TEMPO) as f64)
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Microseconds per quarter note, as stored in a MIDI tempo event
    pub fn micros_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.bpm) as u32
    }

    /// Wall-clock length of a number of beats
    pub fn beats_to_duration(&self, beats: f64) -> Duration {
        Duration::from_secs_f64(beats * 60.0 / self.bpm)
    }

    /// Wall-clock length of a number of ticks
    pub fn ticks_to_duration(&self, ticks: u64) -> Duration {
        self.beats_to_duration(ticks as f64 / TICKS_PER_QUARTER as f64)
    }

}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO as f64)
    }
}
