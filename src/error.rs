// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared across the crate.

use thiserror::Error;

/// Failures of the music-theory engine.
///
/// Every other theory input is a closed enum, so an unresolvable
/// pitch-class name is the only thing that can go wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    /// A root or key name outside the twelve recognized spellings
    #[error("Unknown pitch class: {0:?}")]
    UnknownPitchClass(String),
}

/// Failures of the audible playback sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Failed to initialize audio
    #[error("Audio initialization failed: {0}")]
    InitFailed(String),
    /// Failed to build or start the audio stream
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
    /// No audio device available
    #[error("No audio device available")]
    NoDevice,
    /// Failed to acquire the output lock
    #[error("Failed to acquire audio lock")]
    LockFailed,
    /// MIDI output port could not be opened
    #[error("MIDI port error: {0}")]
    MidiPort(String),
    /// Playback was requested outside of an async runtime
    #[error("Playback requires a running tokio runtime")]
    NoRuntime,
}

/// A mode, style or pattern name that is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseNameError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

pub type TheoryResult<T> = std::result::Result<T, TheoryError>;
