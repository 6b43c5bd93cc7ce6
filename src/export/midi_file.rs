// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file writer.
//!
//! Serializes a [`Timeline`] as a single-track (format 0) file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::midi::{self, messages};
use crate::rhythm::{NoteValue, Timeline};
use crate::timing::{Tempo, TICKS_PER_QUARTER};

/// Note velocity written when none is configured (half of full scale)
pub const DEFAULT_VELOCITY: u8 = 64;

/// Program selected at the start of the track
pub const DEFAULT_PROGRAM: u8 = 1;

/// Tick offset between successive notes of a strummed chord
pub const STRUM_TICKS: u64 = 2;

/// Time signature written at the start of the track
pub const TIME_SIGNATURE: (u8, u8) = (4, 4);

/// A note placed on the tick grid
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// Note number (0-127)
    pub note: u8,
    pub velocity: u8,
    pub value: NoteValue,
    pub chord_index: usize,
}

impl ExportNote {
    pub fn end_tick(&self) -> u64 {
        self.tick + self.value.ticks()
    }
}

#[derive(Debug, Clone)]
struct MidiExportEvent {
    tick: u64,
    // Meta first, then program, then offs before ons at the same tick
    rank: u8,
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn note_on(tick: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            tick,
            rank: 3,
            data: midi::note_on(channel, note, velocity).to_vec(),
        }
    }

    fn note_off(tick: u64, channel: u8, note: u8) -> Self {
        Self {
            tick,
            rank: 2,
            data: midi::note_off(channel, note).to_vec(),
        }
    }

    fn program_change(channel: u8, program: u8) -> Self {
        Self {
            tick: 0,
            rank: 1,
            data: midi::program_change(channel, program).to_vec(),
        }
    }

    fn tempo(tempo: Tempo) -> Self {
        let micros = tempo.micros_per_quarter();
        Self {
            tick: 0,
            rank: 0,
            data: vec![
                messages::META,
                messages::META_TEMPO,
                0x03,
                ((micros >> 16) & 0xFF) as u8,
                ((micros >> 8) & 0xFF) as u8,
                (micros & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(numerator: u8, denominator: u8) -> Self {
        // Denominator is stored as a power of two
        let denom_power = denominator.max(1).trailing_zeros() as u8;
        Self {
            tick: 0,
            rank: 0,
            data: vec![
                messages::META,
                messages::META_TIME_SIGNATURE,
                0x04,
                numerator,
                denom_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per MIDI quarter note
            ],
        }
    }

    fn track_name(name: &str) -> Self {
        let bytes = &name.as_bytes()[..name.len().min(127)];
        let mut data = vec![messages::META, messages::META_TRACK_NAME, bytes.len() as u8];
        data.extend_from_slice(bytes);
        Self {
            tick: 0,
            rank: 0,
            data,
        }
    }
}

/// MIDI file exporter
#[derive(Debug, Clone)]
pub struct MidiExporter {
    tempo: Tempo,
    program: Option<u8>,
    velocity: u8,
    channel: u8,
    track_name: Option<String>,
}

impl MidiExporter {
    pub fn new() -> Self {
        Self {
            tempo: Tempo::default(),
            program: Some(DEFAULT_PROGRAM),
            velocity: DEFAULT_VELOCITY,
            channel: 0,
            track_name: None,
        }
    }

    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.clamp(1, 127);
        self
    }

    /// Program change at the start of the track; `None` writes none
    pub fn with_program(mut self, program: Option<u8>) -> Self {
        self.program = program;
        self
    }

    pub fn with_track_name(mut self, name: impl Into<String>) -> Self {
        self.track_name = Some(name.into());
        self
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Ticks per quarter note written in the header
    pub fn ppqn(&self) -> u16 {
        TICKS_PER_QUARTER as u16
    }

    /// Place every note of a timeline on the tick grid
    ///
    /// Strummed events offset each note by [`STRUM_TICKS`] per position.
    pub fn layout(&self, timeline: Timeline) -> Vec<ExportNote> {
        let mut notes = Vec::new();
        for event in timeline {
            let strummed = event.is_strummed();
            for (position, note) in event.notes.iter().enumerate() {
                let offset = if strummed {
                    position as u64 * STRUM_TICKS
                } else {
                    0
                };
                notes.push(ExportNote {
                    tick: event.start_tick + offset,
                    note: note.midi_number(),
                    velocity: self.velocity,
                    value: event.duration,
                    chord_index: event.chord_index,
                });
            }
        }
        notes
    }

    /// Serialize a timeline to file bytes
    pub fn to_bytes(&self, timeline: Timeline) -> Vec<u8> {
        let notes = self.layout(timeline);

        let mut events = vec![
            MidiExportEvent::tempo(self.tempo),
            MidiExportEvent::time_signature(TIME_SIGNATURE.0, TIME_SIGNATURE.1),
        ];
        if let Some(name) = &self.track_name {
            events.push(MidiExportEvent::track_name(name));
        }
        if let Some(program) = self.program {
            events.push(MidiExportEvent::program_change(self.channel, program));
        }
        for note in &notes {
            events.push(MidiExportEvent::note_on(
                note.tick,
                self.channel,
                note.note,
                note.velocity,
            ));
            events.push(MidiExportEvent::note_off(note.end_tick(), self.channel, note.note));
        }

        // Stable, so insertion order holds within a rank
        events.sort_by_key(|e| (e.tick, e.rank));

        let mut bytes = Vec::new();
        self.write_header(&mut bytes);
        self.write_track(&mut bytes, &events);
        bytes
    }

    /// Write a timeline to any writer
    pub fn write<W: Write>(&self, timeline: Timeline, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes(timeline))
    }

    /// Write a timeline to a file
    pub fn export<P: AsRef<Path>>(&self, timeline: Timeline, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        self.write(timeline, &mut file)?;
        info!(path = %path.display(), "exported MIDI file");
        Ok(())
    }

    fn write_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"MThd");
        // Chunk length (always 6)
        out.extend_from_slice(&6u32.to_be_bytes());
        // Format 0, one track
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&self.ppqn().to_be_bytes());
    }

    fn write_track(&self, out: &mut Vec<u8>, events: &[MidiExportEvent]) {
        let mut track_data = Vec::new();
        let mut last_tick = 0u64;

        for event in events {
            let delta = event.tick.saturating_sub(last_tick);
            write_variable_length(&mut track_data, delta as u32);
            track_data.extend_from_slice(&event.data);
            last_tick = event.tick;
        }

        // End of track
        write_variable_length(&mut track_data, 0);
        track_data.extend_from_slice(&[messages::META, messages::META_END_OF_TRACK, 0x00]);

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
        out.extend_from_slice(&track_data);
    }
}

impl Default for MidiExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a variable-length quantity
fn write_variable_length(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    out.extend_from_slice(&bytes);
}
