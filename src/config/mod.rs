// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session configuration.
//!
//! A session file fixes the key, style, rhythm and output settings of a
//! run. Files ending in `.toml` are read as TOML; anything else as YAML.
//! Every field has a default, so an empty file is a valid session.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::error::TheoryResult;
use crate::music::{Mode, Scale};
use crate::progression::{Style, MAX_LENGTH, MIN_GENERATED_LENGTH};
use crate::rhythm::RhythmPattern;
use crate::timing::{Tempo, DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO};

/// Root of a session file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionFile {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SessionFile {
    /// Load a session from a YAML or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {:?}", path))?;
        if is_toml(path) {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML session")
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML session")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize session to YAML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize session to TOML")
    }

    /// Save the session, in TOML when the path ends in `.toml`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = if is_toml(path) {
            self.to_toml()?
        } else {
            self.to_yaml()?
        };
        fs::write(path, text).with_context(|| format!("Failed to write session file: {:?}", path))
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// What to generate and how to render it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Tonic, e.g. "C", "F#", "Bb"
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub rhythm: RhythmPattern,
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    /// Number of chords to generate
    #[serde(default = "default_length")]
    pub length: usize,
    /// Note velocity (1-127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// Seed for random styles; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Use diatonic seventh chords
    #[serde(default)]
    pub sevenths: bool,
    /// Re-voice the progression for smooth voice leading
    #[serde(default)]
    pub voice_lead: bool,
}

fn default_name() -> String {
    "Untitled".to_string()
}
fn default_key() -> String {
    "C".to_string()
}
fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}
fn default_length() -> usize {
    4
}
fn default_velocity() -> u8 {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            key: default_key(),
            mode: Mode::default(),
            style: Style::default(),
            rhythm: RhythmPattern::default(),
            tempo: default_tempo(),
            length: default_length(),
            velocity: default_velocity(),
            seed: None,
            sevenths: false,
            voice_lead: false,
        }
    }
}

impl SessionConfig {
    /// Copy with tempo, length and velocity pulled into range
    pub fn clamped(&self) -> Self {
        Self {
            tempo: self.tempo.clamp(MIN_TEMPO, MAX_TEMPO),
            length: self.length.clamp(MIN_GENERATED_LENGTH, MAX_LENGTH),
            velocity: self.velocity.clamp(1, 127),
            ..self.clone()
        }
    }

    /// Scale for the configured key and mode
    pub fn scale(&self) -> TheoryResult<Scale> {
        let scale = Scale::generate(&self.key, self.mode)?;
        Ok(if self.sevenths {
            scale.with_sevenths()
        } else {
            scale
        })
    }

    pub fn tempo(&self) -> Tempo {
        Tempo::from_session(self.tempo)
    }
}

/// Where playback goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Built-in synthesizer on the default audio device
    #[default]
    Synth,
    /// External MIDI output port
    Midi,
}

/// Playback output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub backend: Backend,
    /// MIDI port index; the first synth-like port when absent
    #[serde(default)]
    pub midi_port: Option<usize>,
    /// MIDI channel (1-16)
    #[serde(default = "default_channel")]
    pub midi_channel: u8,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Buffer size in frames; device default when absent
    #[serde(default)]
    pub buffer_size: Option<u32>,
}

fn default_channel() -> u8 {
    1
}
fn default_sample_rate() -> u32 {
    44100
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            midi_port: None,
            midi_channel: default_channel(),
            sample_rate: default_sample_rate(),
            buffer_size: None,
        }
    }
}

impl OutputConfig {
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size.map(|frames| frames.clamp(64, 4096)),
            ..AudioConfig::default()
        }
    }

    /// Zero-based channel for MIDI messages
    pub fn channel_index(&self) -> u8 {
        self.midi_channel.clamp(1, 16) - 1
    }
}
