// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output.
//!
//! Message constants shared by the file writer and the live port backend,
//! and a [`MidiPortBackend`] that plays through an external MIDI device.

pub mod port;

pub use port::{list_ports, MidiPortBackend, MidiPortOutput};

/// MIDI message constants
pub mod messages {
    // Channel voice messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    // Controller numbers
    pub const CC_ALL_NOTES_OFF: u8 = 123;

    // Meta events (file only)
    pub const META: u8 = 0xFF;
    pub const META_TRACK_NAME: u8 = 0x03;
    pub const META_END_OF_TRACK: u8 = 0x2F;
    pub const META_TEMPO: u8 = 0x51;
    pub const META_TIME_SIGNATURE: u8 = 0x58;
}

/// Note-on bytes for a channel
pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [messages::NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Note-off bytes for a channel
pub fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [messages::NOTE_OFF | (channel & 0x0F), note & 0x7F, 0]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [messages::PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_messages() {
        assert_eq!(note_on(0, 60, 64), [0x90, 60, 64]);
        assert_eq!(note_on(3, 60, 200), [0x93, 60, 200 & 0x7F]);
        assert_eq!(note_off(15, 72), [0x8F, 72, 0]);
        assert_eq!(program_change(0, 1), [0xC0, 1]);
    }

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
        assert_eq!(messages::META_TEMPO, 0x51);
    }
}
