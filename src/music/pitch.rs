// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch classes, reference frequencies, and sounding notes.
//!
//! A [`PitchClass`] is one of the twelve chromatic classes. Sharp and flat
//! spellings of the same class compare equal; the spelling only survives for
//! display. A [`Note`] pins a pitch class to an octave and carries its
//! frequency.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TheoryError, TheoryResult};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Octave in which the reference frequencies are defined
pub const REFERENCE_OCTAVE: i8 = 4;

/// Sharp spellings in chromatic order
const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings in chromatic order
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Octave-4 frequencies in Hz (A4 = 440)
const REFERENCE_FREQUENCIES: [f64; 12] = [
    261.63, // C
    277.18, // C# / Db
    293.66, // D
    311.13, // D# / Eb
    329.63, // E
    349.23, // F
    369.99, // F# / Gb
    392.00, // G
    415.30, // G# / Ab
    440.00, // A
    466.16, // A# / Bb
    493.88, // B
];

/// One of the twelve chromatic pitch classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchClass {
    index: u8,
    flat: bool,
}

impl PitchClass {
    pub const C: PitchClass = PitchClass::natural(0);
    pub const D: PitchClass = PitchClass::natural(2);
    pub const E: PitchClass = PitchClass::natural(4);
    pub const F: PitchClass = PitchClass::natural(5);
    pub const G: PitchClass = PitchClass::natural(7);
    pub const A: PitchClass = PitchClass::natural(9);
    pub const B: PitchClass = PitchClass::natural(11);

    const fn natural(index: u8) -> Self {
        Self { index, flat: false }
    }

    /// Pitch class from a chromatic index, spelled with sharps
    pub fn from_index(index: u8) -> Self {
        Self {
            index: index % 12,
            flat: false,
        }
    }

    /// Pitch class from a chromatic index with an explicit spelling preference
    pub fn from_index_spelled(index: u8, flat: bool) -> Self {
        Self {
            index: index % 12,
            flat,
        }
    }

    /// Parse a name such as "C", "F#" or "Bb"
    pub fn parse(name: &str) -> TheoryResult<Self> {
        let upper = name.trim().to_uppercase();
        let (index, flat) = match upper.as_str() {
            "C" => (0, false),
            "C#" => (1, false),
            "DB" => (1, true),
            "D" => (2, false),
            "D#" => (3, false),
            "EB" => (3, true),
            "E" => (4, false),
            "F" => (5, false),
            "F#" => (6, false),
            "GB" => (6, true),
            "G" => (7, false),
            "G#" => (8, false),
            "AB" => (8, true),
            "A" => (9, false),
            "A#" => (10, false),
            "BB" => (10, true),
            "B" => (11, false),
            _ => return Err(TheoryError::UnknownPitchClass(name.to_string())),
        };
        Ok(Self { index, flat })
    }

    /// Chromatic index (0-11), C = 0
    pub fn index(self) -> u8 {
        self.index
    }

    /// Whether this class is displayed with a flat
    pub fn is_flat_spelling(self) -> bool {
        self.flat
    }

    /// Display name honoring the spelling
    pub fn name(self) -> &'static str {
        if self.flat {
            FLAT_NAMES[self.index as usize]
        } else {
            SHARP_NAMES[self.index as usize]
        }
    }

    /// Transpose by semitones, keeping the spelling preference
    pub fn transpose(self, semitones: i32) -> Self {
        let index = (self.index as i32 + semitones).rem_euclid(12) as u8;
        Self {
            index,
            flat: self.flat,
        }
    }

    /// Frequency of this class in the reference octave
    pub fn reference_frequency(self) -> f64 {
        REFERENCE_FREQUENCIES[self.index as usize]
    }

    /// Frequency of this class in the given octave
    pub fn frequency(self, octave: i8) -> f64 {
        self.reference_frequency() * 2f64.powi(octave as i32 - REFERENCE_OCTAVE as i32)
    }
}

impl PartialEq for PitchClass {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for PitchClass {}

impl Hash for PitchClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PitchClass {
    type Error = TheoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PitchClass> for String {
    fn from(pc: PitchClass) -> Self {
        pc.name().to_string()
    }
}

/// Frequency of a named pitch class in the given octave
pub fn frequency_of(name: &str, octave: i8) -> TheoryResult<f64> {
    Ok(PitchClass::parse(name)?.frequency(octave))
}

/// Chromatic index (0-11) of a named pitch class
pub fn chromatic_index_of(name: &str) -> TheoryResult<u8> {
    Ok(PitchClass::parse(name)?.index())
}

/// A pitch class sounding in a specific octave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pitch_class: PitchClass,
    octave: i8,
    frequency: f64,
}

impl Note {
    /// Create a note; the frequency is derived from the pitch table
    pub fn new(pitch_class: PitchClass, octave: i8) -> Self {
        Self {
            pitch_class,
            octave,
            frequency: pitch_class.frequency(octave),
        }
    }

    pub fn pitch_class(&self) -> PitchClass {
        self.pitch_class
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// MIDI note number, middle C (C4) = 60
    pub fn midi_number(&self) -> MidiNote {
        let midi = (self.octave as i16 + 1) * 12 + self.pitch_class.index() as i16;
        midi.clamp(0, 127) as MidiNote
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_chromatic_index() {
        assert_eq!(chromatic_index_of("C").unwrap(), 0);
        assert_eq!(chromatic_index_of("A").unwrap(), 9);
        assert_eq!(chromatic_index_of("B").unwrap(), 11);
        assert_eq!(chromatic_index_of("C#").unwrap(), 1);
        assert_eq!(chromatic_index_of("Db").unwrap(), 1);
        assert_eq!(chromatic_index_of("Bb").unwrap(), 10);
    }

    #[test]
    fn test_unknown_pitch_class() {
        assert_eq!(
            chromatic_index_of("H"),
            Err(TheoryError::UnknownPitchClass("H".to_string()))
        );
        assert!(frequency_of("", 4).is_err());
        assert!(PitchClass::parse("C##").is_err());
    }

    #[test]
    fn test_a4_is_440() {
        assert_eq!(frequency_of("A", 4).unwrap(), 440.0);
        assert_eq!(frequency_of("A", 5).unwrap(), 880.0);
        assert_eq!(frequency_of("A", 3).unwrap(), 220.0);
    }

    #[test]
    fn test_octave_relation_for_every_class() {
        for index in 0..12 {
            let sharp = PitchClass::from_index(index);
            let flat = PitchClass::from_index_spelled(index, true);
            for octave in 0..=8 {
                let expected = sharp.frequency(4) * 2f64.powi(octave as i32 - 4);
                assert_eq!(sharp.frequency(octave), expected);
                assert_eq!(flat.frequency(octave), sharp.frequency(octave));
            }
        }
    }

    #[test]
    fn test_enharmonic_equality() {
        let cs = PitchClass::parse("C#").unwrap();
        let db = PitchClass::parse("Db").unwrap();
        assert_eq!(cs, db);
        assert_eq!(cs.to_string(), "C#");
        assert_eq!(db.to_string(), "Db");

        let set: HashSet<PitchClass> = [cs, db].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_transpose_keeps_spelling() {
        let bb = PitchClass::parse("Bb").unwrap();
        assert_eq!(bb.transpose(5).to_string(), "Eb");
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
        assert_eq!(PitchClass::G.transpose(5), PitchClass::C);
        assert_eq!(PitchClass::C.transpose(13).to_string(), "C#");
    }

    #[test]
    fn test_midi_number() {
        assert_eq!(Note::new(PitchClass::C, 4).midi_number(), 60);
        assert_eq!(Note::new(PitchClass::A, 4).midi_number(), 69);
        assert_eq!(Note::new(PitchClass::E, 5).midi_number(), 76);
        assert_eq!(Note::new(PitchClass::C, -1).midi_number(), 0);
    }

    #[test]
    fn test_note_display() {
        let note = Note::new(PitchClass::parse("Eb").unwrap(), 3);
        assert_eq!(note.to_string(), "Eb3");
        assert_eq!(note.frequency(), 311.13 / 2.0);
    }

    #[test]
    fn test_serde_uses_names() {
        let pc = PitchClass::parse("Ab").unwrap();
        let yaml = serde_yaml::to_string(&pc).unwrap();
        assert_eq!(yaml.trim(), "Ab");
        let back: PitchClass = serde_yaml::from_str("F#").unwrap();
        assert_eq!(back.index(), 6);
        assert!(serde_yaml::from_str::<PitchClass>("Q").is_err());
    }
}
