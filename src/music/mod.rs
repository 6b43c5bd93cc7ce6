// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory engine.
//!
//! Pitch table, chord construction with inversions, and diatonic scales.
//! Everything here is pure: identical inputs give identical values.

pub mod chord;
pub mod pitch;
pub mod scale;

pub use chord::{Chord, Extension, Inversion, Quality};
pub use pitch::{chromatic_index_of, frequency_of, MidiNote, Note, PitchClass};
pub use scale::{Mode, Scale};
