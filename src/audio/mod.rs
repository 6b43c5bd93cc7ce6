// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in audio backend.
//!
//! This module provides:
//! - A triangle-wave polyphonic synthesizer
//! - Audio output via cpal on the default device
//! - [`AudioEngine`], which ties the two together as a playback backend

pub mod output;
pub mod synth;

pub use output::{default_device_name, list_devices, AudioConfig, AudioOutput};
pub use synth::{Envelope, PolySynth};

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::error::AudioError;
use crate::playback::{AudioBackend, SharedOutput};

/// Synthesizer playing through the default audio device
///
/// The device is opened lazily by [`AudioBackend::ensure_ready`].
pub struct AudioEngine {
    synth: Arc<Mutex<PolySynth>>,
    output: Option<AudioOutput>,
    config: AudioConfig,
}

impl AudioEngine {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            synth: Arc::new(Mutex::new(PolySynth::new(config.sample_rate))),
            output: None,
            config,
        }
    }

    pub fn synth(&self) -> Arc<Mutex<PolySynth>> {
        Arc::clone(&self.synth)
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

impl AudioBackend for AudioEngine {
    fn ensure_ready(&mut self) -> Result<(), AudioError> {
        if self.output.is_some() {
            return Ok(());
        }

        let synth = Arc::clone(&self.synth);
        let output = AudioOutput::new(self.config.clone(), move |buffer, channels| {
            if let Ok(mut synth) = synth.lock() {
                synth.render(buffer, channels);
            }
        })?;

        self.synth
            .lock()
            .map_err(|_| AudioError::LockFailed)?
            .set_sample_rate(output.sample_rate());
        info!(device = %output.device_name(), "audio output ready");

        self.output = Some(output);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.output.is_some()
    }

    fn output(&self) -> SharedOutput {
        self.synth.clone()
    }
}
