// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal on the default device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{debug, error};

use crate::error::AudioError;

/// Audio output configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames; `None` lets the device decide
    pub buffer_size: Option<u32>,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: None,
            channels: 2,
        }
    }
}

impl AudioConfig {
    /// Buffer latency in milliseconds, when the buffer size is fixed
    pub fn latency_ms(&self) -> Option<f64> {
        self.buffer_size
            .map(|frames| frames as f64 / self.sample_rate as f64 * 1000.0)
    }
}

/// A running output stream
///
/// The stream plays until this value is dropped.
pub struct AudioOutput {
    _stream: Stream,
    config: AudioConfig,
    device_name: String,
}

impl AudioOutput {
    /// Open the default output device and start calling `callback`
    ///
    /// The callback receives a zeroed interleaved buffer and the channel
    /// count.
    pub fn new<F>(config: AudioConfig, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: match config.buffer_size {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    callback(data, channels);
                },
                move |err| {
                    error!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        debug!(
            device = %device_name,
            sample_rate = config.sample_rate,
            channels = config.channels,
            "audio output started"
        );

        Ok(Self {
            _stream: stream,
            config,
            device_name,
        })
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// Names of the available output devices
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

pub fn default_device_name() -> Option<String> {
    cpal::default_host()
        .default_output_device()
        .and_then(|d| d.name().ok())
}
