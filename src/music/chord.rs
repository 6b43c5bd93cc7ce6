// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord construction and inversion.
//!
//! Chords are immutable values built from a root, a quality, an optional
//! seventh extension and an inversion. Changing the inversion rebuilds the
//! chord from that harmonic identity instead of rotating the existing notes,
//! so the result never depends on the chord's previous state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::pitch::{MidiNote, Note, PitchClass, REFERENCE_OCTAVE};
use crate::error::TheoryResult;

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl Quality {
    /// Semitones above the root, root position
    pub fn intervals(self) -> [u8; 3] {
        match self {
            Quality::Major => [0, 4, 7],
            Quality::Minor => [0, 3, 7],
            Quality::Diminished => [0, 3, 6],
            Quality::Augmented => [0, 4, 8],
        }
    }

    /// Suffix appended to the root name in a chord symbol
    pub fn suffix(self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Diminished => "dim",
            Quality::Augmented => "aug",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Major => "major",
            Quality::Minor => "minor",
            Quality::Diminished => "diminished",
            Quality::Augmented => "augmented",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seventh extension
///
/// `Dominant7`, `Minor7` and `HalfDiminished7` all add a minor seventh
/// (10 semitones); only the symbol differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    #[serde(rename = "7")]
    Dominant7,
    #[serde(rename = "maj7")]
    Major7,
    #[serde(rename = "m7")]
    Minor7,
    #[serde(rename = "dim7")]
    Diminished7,
    #[serde(rename = "hdim7")]
    HalfDiminished7,
}

impl Extension {
    /// Semitones above the root of the added tone
    pub fn interval(self) -> u8 {
        match self {
            Extension::Dominant7 => 10,
            Extension::Major7 => 11,
            Extension::Minor7 => 10,
            Extension::Diminished7 => 9,
            Extension::HalfDiminished7 => 10,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Extension::Dominant7 => "7",
            Extension::Major7 => "maj7",
            Extension::Minor7 => "m7",
            Extension::Diminished7 => "dim7",
            Extension::HalfDiminished7 => "ø7",
        }
    }

    /// Whether the suffix already names the given triad quality
    fn implies(self, quality: Quality) -> bool {
        matches!(
            (self, quality),
            (Extension::Minor7, Quality::Minor)
                | (Extension::Diminished7, Quality::Diminished)
                | (Extension::HalfDiminished7, Quality::Diminished)
        )
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Chord inversion, 0 (root position) through 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Inversion {
    #[default]
    Root,
    First,
    Second,
    Third,
}

impl Inversion {
    pub const ALL: [Inversion; 4] = [
        Inversion::Root,
        Inversion::First,
        Inversion::Second,
        Inversion::Third,
    ];

    /// Inversion from any index, reduced modulo 4
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn index(self) -> usize {
        match self {
            Inversion::Root => 0,
            Inversion::First => 1,
            Inversion::Second => 2,
            Inversion::Third => 3,
        }
    }

    /// The following inversion, wrapping from third back to root
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

impl From<u8> for Inversion {
    fn from(value: u8) -> Self {
        Self::from_index(value as usize)
    }
}

impl From<Inversion> for u8 {
    fn from(inversion: Inversion) -> Self {
        inversion.index() as u8
    }
}

/// An immutable chord voicing
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    symbol: String,
    root: PitchClass,
    quality: Quality,
    extension: Option<Extension>,
    inversion: Inversion,
    octave: i8,
    notes: Vec<Note>,
    roman_numeral: Option<String>,
}

impl Chord {
    /// Build a chord from a root name, failing on an unknown pitch class
    pub fn build(
        root: &str,
        quality: Quality,
        extension: Option<Extension>,
        inversion: Inversion,
        octave: i8,
    ) -> TheoryResult<Self> {
        let root = PitchClass::parse(root)?;
        Ok(Self::from_root(root, quality, extension, inversion, octave))
    }

    /// Root-position chord in the reference octave
    pub fn triad(root: &str, quality: Quality) -> TheoryResult<Self> {
        Self::build(root, quality, None, Inversion::Root, REFERENCE_OCTAVE)
    }

    /// Build a chord from an already-resolved root
    pub fn from_root(
        root: PitchClass,
        quality: Quality,
        extension: Option<Extension>,
        inversion: Inversion,
        octave: i8,
    ) -> Self {
        let mut intervals = quality.intervals().to_vec();
        if let Some(ext) = extension {
            intervals.push(ext.interval());
        }

        let mut pitches: Vec<PitchClass> = intervals
            .iter()
            .map(|&interval| root.transpose(interval as i32))
            .collect();
        let len = pitches.len();
        pitches.rotate_left(inversion.index() % len);

        // Octaves follow the root-position interval at each position, so an
        // inverted chord keeps the wrap pattern of its root position.
        let notes = pitches
            .iter()
            .zip(&intervals)
            .map(|(&pc, &interval)| {
                let wrap = (root.index() + interval) / 12;
                Note::new(pc, octave + wrap as i8)
            })
            .collect();

        Self {
            symbol: Self::symbol_for(root, quality, extension),
            root,
            quality,
            extension,
            inversion,
            octave,
            notes,
            roman_numeral: None,
        }
    }

    fn symbol_for(root: PitchClass, quality: Quality, extension: Option<Extension>) -> String {
        let mut symbol = root.name().to_string();
        match extension {
            Some(ext) if ext.implies(quality) => symbol.push_str(ext.suffix()),
            Some(ext) => {
                symbol.push_str(quality.suffix());
                symbol.push_str(ext.suffix());
            }
            None => symbol.push_str(quality.suffix()),
        }
        symbol
    }

    /// Attach a Roman-numeral label
    pub fn with_roman_numeral(mut self, numeral: impl Into<String>) -> Self {
        self.roman_numeral = Some(numeral.into());
        self
    }

    /// Rebuild this chord in another inversion, keeping its label
    pub fn with_inversion(&self, inversion: Inversion) -> Self {
        let rebuilt = Self::from_root(
            self.root,
            self.quality,
            self.extension,
            inversion,
            self.octave,
        );
        Self {
            roman_numeral: self.roman_numeral.clone(),
            ..rebuilt
        }
    }

    /// All four inversions, root position first
    pub fn all_inversions(&self) -> Vec<Self> {
        Inversion::ALL
            .iter()
            .map(|&inversion| self.with_inversion(inversion))
            .collect()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn extension(&self) -> Option<Extension> {
        self.extension
    }

    pub fn inversion(&self) -> Inversion {
        self.inversion
    }

    /// Base octave the chord was built in
    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Notes, lowest-sounding first
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn roman_numeral(&self) -> Option<&str> {
        self.roman_numeral.as_deref()
    }

    /// Pitch classes in voicing order
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        self.notes.iter().map(|n| n.pitch_class()).collect()
    }

    /// Whether any note of the chord has this pitch class
    pub fn contains(&self, pitch_class: PitchClass) -> bool {
        self.notes.iter().any(|n| n.pitch_class() == pitch_class)
    }

    pub fn midi_notes(&self) -> Vec<MidiNote> {
        self.notes.iter().map(|n| n.midi_number()).collect()
    }

    /// Total semitone movement from another voicing, paired by position
    pub fn movement_from(&self, previous: &Chord) -> u32 {
        self.notes
            .iter()
            .zip(previous.notes())
            .map(|(a, b)| (a.midi_number() as i32 - b.midi_number() as i32).unsigned_abs())
            .sum()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}
