// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI file export.

pub mod midi_file;

pub use midi_file::{ExportNote, MidiExporter, DEFAULT_PROGRAM, DEFAULT_VELOCITY, STRUM_TICKS};

use crate::music::{Mode, PitchClass};
use crate::progression::Style;

/// File name for an exported progression, e.g. `C_major_pop_progression.mid`
pub fn file_name(key: PitchClass, mode: Mode, style: Style) -> String {
    format!("{}_{}_{}_progression.mid", key, mode, style)
}
