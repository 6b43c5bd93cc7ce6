// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback through an external MIDI output port via midir.

use std::sync::{Arc, Mutex};

use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{info, warn};

use super::messages;
use crate::error::AudioError;
use crate::music::{MidiNote, Note};
use crate::playback::{AudioBackend, NoteOutput, SharedOutput};

const CLIENT_NAME: &str = "chordcraft";

/// Port-name fragments of common software synths, tried first
const PREFERRED_PORTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

/// Note sink writing to an open MIDI connection
///
/// Sounding notes are tracked so they can be released on stop even when
/// the connection goes away.
pub struct MidiPortOutput {
    conn: Option<MidiOutputConnection>,
    channel: u8,
    sounding: Vec<MidiNote>,
}

impl MidiPortOutput {
    fn new(channel: u8) -> Self {
        Self {
            conn: None,
            channel: channel & 0x0F,
            sounding: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Notes started and not yet released
    pub fn sounding(&self) -> &[MidiNote] {
        &self.sounding
    }

    fn send(&mut self, message: &[u8]) {
        if let Some(conn) = self.conn.as_mut() {
            if let Err(e) = conn.send(message) {
                warn!(error = %e, "MIDI send failed");
            }
        }
    }
}

impl NoteOutput for MidiPortOutput {
    fn note_on(&mut self, note: &Note, velocity: u8) {
        let key = note.midi_number();
        self.send(&super::note_on(self.channel, key, velocity));
        self.sounding.push(key);
    }

    fn note_off(&mut self, note: &Note) {
        let key = note.midi_number();
        self.send(&super::note_off(self.channel, key));
        if let Some(pos) = self.sounding.iter().position(|&k| k == key) {
            self.sounding.remove(pos);
        }
    }

    fn all_notes_off(&mut self) {
        let sounding = std::mem::take(&mut self.sounding);
        for key in sounding {
            self.send(&super::note_off(self.channel, key));
        }
        self.send(&[
            messages::CONTROL_CHANGE | self.channel,
            messages::CC_ALL_NOTES_OFF,
            0,
        ]);
    }
}

/// Backend that opens a MIDI output port on demand
pub struct MidiPortBackend {
    port: Option<usize>,
    program: Option<u8>,
    output: Arc<Mutex<MidiPortOutput>>,
}

impl MidiPortBackend {
    /// Use the port at `port`, or pick one when `None`
    pub fn new(port: Option<usize>, channel: u8) -> Self {
        Self {
            port,
            program: None,
            output: Arc::new(Mutex::new(MidiPortOutput::new(channel))),
        }
    }

    /// Send a program change after connecting
    pub fn with_program(mut self, program: u8) -> Self {
        self.program = Some(program);
        self
    }

    fn select_port(&self, midi_out: &MidiOutput) -> Result<MidiOutputPort, AudioError> {
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(AudioError::MidiPort("no MIDI output ports found".to_string()));
        }

        if let Some(index) = self.port {
            return ports.get(index).cloned().ok_or_else(|| {
                AudioError::MidiPort(format!(
                    "port {} out of range ({} available)",
                    index,
                    ports.len()
                ))
            });
        }

        let preferred = ports.iter().position(|p| {
            midi_out
                .port_name(p)
                .map(|n| {
                    let n = n.to_lowercase();
                    PREFERRED_PORTS.iter().any(|frag| n.contains(frag))
                })
                .unwrap_or(false)
        });
        Ok(ports[preferred.unwrap_or(0)].clone())
    }
}

impl AudioBackend for MidiPortBackend {
    fn ensure_ready(&mut self) -> Result<(), AudioError> {
        let mut output = self.output.lock().map_err(|_| AudioError::LockFailed)?;
        if output.is_connected() {
            return Ok(());
        }

        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| AudioError::MidiPort(e.to_string()))?;
        let port = self.select_port(&midi_out)?;
        let name = midi_out
            .port_name(&port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let conn = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| AudioError::MidiPort(format!("Failed to connect to {}: {}", name, e)))?;
        output.conn = Some(conn);
        info!(port = %name, "MIDI output ready");

        if let Some(program) = self.program {
            let channel = output.channel;
            output.send(&super::program_change(channel, program));
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.output
            .lock()
            .map(|output| output.is_connected())
            .unwrap_or(false)
    }

    fn output(&self) -> SharedOutput {
        self.output.clone()
    }
}

/// Names of the available MIDI output ports, in index order
pub fn list_ports() -> Result<Vec<String>, AudioError> {
    let midi_out =
        MidiOutput::new(CLIENT_NAME).map_err(|e| AudioError::MidiPort(e.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .map(|p| {
            midi_out
                .port_name(p)
                .unwrap_or_else(|_| "Unknown".to_string())
        })
        .collect())
}
