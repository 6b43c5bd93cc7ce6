// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Diatonic chord-progression generator.
//!
//! Derives the chords of a key, arranges them from style templates, and
//! renders the result either as audible playback or as a Standard MIDI File.
//!
//! ```text
//! key + mode -> Scale -> Progression -> rhythm::compile -> Timeline
//!                                                           |-> Player (audio / MIDI port)
//!                                                           `-> MidiExporter (.mid)
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod midi;
pub mod music;
pub mod playback;
pub mod progression;
pub mod rhythm;
pub mod timing;

pub use error::{AudioError, ParseNameError, TheoryError, TheoryResult};
pub use music::{Chord, Extension, Inversion, Mode, Note, PitchClass, Quality, Scale};
pub use playback::{AudioBackend, NoteOutput, PlaybackState, Player};
pub use progression::{Progression, ProgressionTemplater, SavedProgression, Style};
pub use rhythm::{compile, Event, NoteValue, RhythmPattern, Timeline};
pub use timing::Tempo;
