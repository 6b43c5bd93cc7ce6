// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Polyphonic triangle-wave synthesizer.
//!
//! Voices are keyed by MIDI note number and shaped by a linear ADSR
//! envelope. Rendering fills interleaved `f32` buffers.

use tracing::trace;

use crate::music::{MidiNote, Note};
use crate::playback::NoteOutput;

/// Most voices sounding at once; the oldest is dropped beyond this
pub const MAX_VOICES: usize = 32;

const MASTER_GAIN: f32 = 0.2;

/// Linear ADSR envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Seconds from silence to full level
    pub attack: f32,
    /// Seconds from full level to sustain
    pub decay: f32,
    /// Held level, 0.0 - 1.0
    pub sustain: f32,
    /// Seconds from note-off to silence
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.02,
            decay: 0.1,
            sustain: 0.3,
            release: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

#[derive(Debug, Clone)]
struct Voice {
    key: MidiNote,
    frequency: f32,
    gain: f32,
    phase: f32,
    level: f32,
    release_step: f32,
    stage: Stage,
}

impl Voice {
    fn release(&mut self, envelope: &Envelope, sample_rate: f32) {
        if matches!(self.stage, Stage::Release | Stage::Done) {
            return;
        }
        self.stage = Stage::Release;
        self.release_step = self.level / (envelope.release * sample_rate).max(1.0);
    }

    fn advance_envelope(&mut self, envelope: &Envelope, sample_rate: f32) {
        match self.stage {
            Stage::Attack => {
                self.level += 1.0 / (envelope.attack * sample_rate).max(1.0);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level -= (1.0 - envelope.sustain) / (envelope.decay * sample_rate).max(1.0);
                if self.level <= envelope.sustain {
                    self.level = envelope.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Done;
                }
            }
            Stage::Done => {}
        }
    }

    fn next_sample(&mut self, envelope: &Envelope, sample_rate: f32) -> f32 {
        // Triangle in [-1, 1]
        let wave = 1.0 - 4.0 * (self.phase - 0.5).abs();
        self.phase = (self.phase + self.frequency / sample_rate).fract();
        self.advance_envelope(envelope, sample_rate);
        wave * self.level * self.gain
    }
}

/// Triangle-wave polysynth
#[derive(Debug)]
pub struct PolySynth {
    voices: Vec<Voice>,
    envelope: Envelope,
    sample_rate: f32,
}

impl PolySynth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            envelope: Envelope::default(),
            sample_rate: sample_rate.max(1) as f32,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1) as f32;
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Voices still producing sound, including releasing ones
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.stage != Stage::Done).count()
    }

    /// Voices not yet released
    pub fn held_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| !matches!(v.stage, Stage::Release | Stage::Done))
            .count()
    }

    /// Start a voice at a frequency
    pub fn start_voice(&mut self, key: MidiNote, frequency: f32, velocity: u8) {
        if self.voices.len() >= MAX_VOICES {
            let stolen = self.voices.remove(0);
            trace!(key = stolen.key, "voice stolen");
        }
        self.voices.push(Voice {
            key,
            frequency,
            gain: MASTER_GAIN * velocity.min(127) as f32 / 127.0,
            phase: 0.0,
            level: 0.0,
            release_step: 0.0,
            stage: Stage::Attack,
        });
    }

    /// Release every held voice on a key
    pub fn release_key(&mut self, key: MidiNote) {
        let (envelope, sample_rate) = (self.envelope, self.sample_rate);
        for voice in self.voices.iter_mut().filter(|v| v.key == key) {
            voice.release(&envelope, sample_rate);
        }
    }

    /// Fill an interleaved buffer, mixing into what is already there
    pub fn render(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let (envelope, sample_rate) = (self.envelope, self.sample_rate);

        for frame in buffer.chunks_mut(channels) {
            let mut sample = 0.0;
            for voice in self.voices.iter_mut() {
                sample += voice.next_sample(&envelope, sample_rate);
            }
            let sample = sample.clamp(-1.0, 1.0);
            for out in frame.iter_mut() {
                *out += sample;
            }
        }

        self.voices.retain(|v| v.stage != Stage::Done);
    }
}

impl Default for PolySynth {
    fn default() -> Self {
        Self::new(44100)
    }
}

impl NoteOutput for PolySynth {
    fn note_on(&mut self, note: &Note, velocity: u8) {
        self.start_voice(note.midi_number(), note.frequency() as f32, velocity);
    }

    fn note_off(&mut self, note: &Note) {
        self.release_key(note.midi_number());
    }

    fn all_notes_off(&mut self) {
        let (envelope, sample_rate) = (self.envelope, self.sample_rate);
        for voice in self.voices.iter_mut() {
            voice.release(&envelope, sample_rate);
        }
    }
}
