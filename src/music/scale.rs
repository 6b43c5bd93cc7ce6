// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Diatonic scales and their chords.
//!
//! A [`Scale`] holds the seven degrees of a major or natural-minor key and
//! the triad built on each degree, labeled with its Roman numeral.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chord::{Chord, Extension, Inversion, Quality};
use super::pitch::{PitchClass, REFERENCE_OCTAVE};
use crate::error::{ParseNameError, TheoryResult};

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    /// Natural minor (Aeolian)
    Minor,
}

impl Mode {
    /// Semitones from the tonic for each degree
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Triad quality on each degree
    ///
    /// The minor dominant stays minor (natural minor, no raised leading tone).
    pub fn qualities(self) -> [Quality; 7] {
        use Quality::*;
        match self {
            Mode::Major => [Major, Minor, Minor, Major, Major, Minor, Diminished],
            Mode::Minor => [Minor, Diminished, Major, Minor, Minor, Major, Major],
        }
    }

    pub fn roman_numerals(self) -> [&'static str; 7] {
        match self {
            Mode::Major => ["I", "ii", "iii", "IV", "V", "vi", "vii°"],
            Mode::Minor => ["i", "ii°", "III", "iv", "v", "VI", "VII"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }

    /// The other mode on the same tonic
    pub fn parallel(self) -> Self {
        match self {
            Mode::Major => Mode::Minor,
            Mode::Minor => Mode::Major,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" | "ionian" => Ok(Mode::Major),
            "minor" | "naturalminor" | "natural_minor" | "aeolian" => Ok(Mode::Minor),
            _ => Err(ParseNameError::new("mode", s)),
        }
    }
}

/// A diatonic scale with its seven chords
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    key: String,
    tonic: PitchClass,
    mode: Mode,
    notes: Vec<PitchClass>,
    chords: Vec<Chord>,
}

impl Scale {
    /// Generate the scale for a key name such as "C" or "Eb"
    pub fn generate(key: &str, mode: Mode) -> TheoryResult<Self> {
        let tonic = PitchClass::parse(key)?;
        Ok(Self::new(tonic, mode))
    }

    /// Generate the scale for a resolved tonic
    ///
    /// Degrees are spelled with flats in flat keys (F major, and D, G, C
    /// and F minor) and whenever the tonic itself is spelled flat.
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        let flat = uses_flats(tonic, mode);
        let notes: Vec<PitchClass> = mode
            .intervals()
            .iter()
            .map(|&interval| {
                PitchClass::from_index_spelled(tonic.transpose(interval as i32).index(), flat)
            })
            .collect();

        let chords = notes
            .iter()
            .zip(mode.qualities())
            .zip(mode.roman_numerals())
            .map(|((&root, quality), numeral)| {
                Chord::from_root(root, quality, None, Inversion::Root, REFERENCE_OCTAVE)
                    .with_roman_numeral(numeral)
            })
            .collect();

        let key = format!("{} {}", tonic, mode);
        debug!(key = %key, "generated scale");

        Self {
            key,
            tonic,
            mode,
            notes,
            chords,
        }
    }

    /// The same key with a diatonic seventh added to every chord
    pub fn with_sevenths(&self) -> Self {
        let chords = self
            .chords
            .iter()
            .enumerate()
            .map(|(degree, chord)| {
                let seventh = self.notes[(degree + 6) % 7];
                let interval = (seventh.index() + 12 - chord.root().index()) % 12;
                let extension = match (interval, chord.quality()) {
                    (11, _) => Extension::Major7,
                    (9, _) => Extension::Diminished7,
                    (_, Quality::Major) => Extension::Dominant7,
                    (_, Quality::Diminished) => Extension::HalfDiminished7,
                    _ => Extension::Minor7,
                };
                let numeral = chord.roman_numeral().unwrap_or_default();
                let numeral = match extension {
                    Extension::HalfDiminished7 => format!("{}ø7", numeral.trim_end_matches('°')),
                    _ => format!("{}7", numeral),
                };
                Chord::from_root(
                    chord.root(),
                    chord.quality(),
                    Some(extension),
                    Inversion::Root,
                    chord.octave(),
                )
                .with_roman_numeral(numeral)
            })
            .collect();

        Self {
            chords,
            ..self.clone()
        }
    }

    /// Display name, e.g. "C major"
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tonic(&self) -> PitchClass {
        self.tonic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Degree pitch classes, ascending from the tonic
    pub fn notes(&self) -> &[PitchClass] {
        &self.notes
    }

    /// Chords on each degree, root position
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    /// First chord of the scale that sounds the given pitch class
    pub fn chord_containing(&self, pitch_class: PitchClass) -> Option<&Chord> {
        self.chords.iter().find(|c| c.contains(pitch_class))
    }

    /// The scale of the other mode on the same tonic
    pub fn parallel(&self) -> Scale {
        Scale::new(self.tonic, self.mode.parallel())
    }
}

/// Whether a key's signature carries flats
fn uses_flats(tonic: PitchClass, mode: Mode) -> bool {
    if tonic.is_flat_spelling() {
        return true;
    }
    match mode {
        Mode::Major => tonic == PitchClass::F,
        Mode::Minor => [PitchClass::D, PitchClass::G, PitchClass::C, PitchClass::F].contains(&tonic),
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: &[PitchClass]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_c_major_notes() {
        let scale = Scale::generate("C", Mode::Major).unwrap();
        assert_eq!(names(scale.notes()), vec!["C", "D", "E", "F", "G", "A", "B"]);
        assert_eq!(scale.key(), "C major");
    }

    #[test]
    fn test_a_minor_notes() {
        let scale = Scale::generate("A", Mode::Minor).unwrap();
        assert_eq!(names(scale.notes()), vec!["A", "B", "C", "D", "E", "F", "G"]);
        assert_eq!(scale.key(), "A minor");
    }

    #[test]
    fn test_flat_key_spelling() {
        let scale = Scale::generate("Bb", Mode::Major).unwrap();
        assert_eq!(names(scale.notes()), vec!["Bb", "C", "D", "Eb", "F", "G", "A"]);
        assert_eq!(scale.chords()[3].symbol(), "Eb");
    }

    #[test]
    fn test_natural_flat_keys() {
        let f = Scale::generate("F", Mode::Major).unwrap();
        assert_eq!(names(f.notes()), vec!["F", "G", "A", "Bb", "C", "D", "E"]);
        assert_eq!(f.chords()[3].symbol(), "Bb");

        let dm = Scale::generate("D", Mode::Minor).unwrap();
        assert_eq!(names(dm.notes()), vec!["D", "E", "F", "G", "A", "Bb", "C"]);
        assert_eq!(dm.chords()[5].symbol(), "Bb");

        let cm = Scale::generate("C", Mode::Minor).unwrap().with_sevenths();
        assert_eq!(names(cm.notes()), vec!["C", "D", "Eb", "F", "G", "Ab", "Bb"]);
        assert_eq!(cm.chords()[2].symbol(), "Ebmaj7");

        // Sharp keys are unaffected
        let g = Scale::generate("G", Mode::Major).unwrap();
        assert_eq!(names(g.notes()), vec!["G", "A", "B", "C", "D", "E", "F#"]);
        let e = Scale::generate("E", Mode::Minor).unwrap();
        assert_eq!(names(e.notes()), vec!["E", "F#", "G", "A", "B", "C", "D"]);
    }

    #[test]
    fn test_c_major_chords() {
        let scale = Scale::generate("C", Mode::Major).unwrap();
        let chords = scale.chords();
        assert_eq!(chords[0].symbol(), "C");
        assert_eq!(chords[0].quality(), Quality::Major);
        assert_eq!(chords[1].symbol(), "Dm");
        assert_eq!(chords[4].symbol(), "G");
        assert_eq!(chords[6].quality(), Quality::Diminished);
        assert_eq!(chords[6].roman_numeral(), Some("vii°"));
        assert_eq!(chords[6].symbol(), "Bdim");
    }

    #[test]
    fn test_minor_qualities() {
        let scale = Scale::generate("A", Mode::Minor).unwrap();
        let qualities: Vec<Quality> = scale.chords().iter().map(|c| c.quality()).collect();
        assert_eq!(qualities, Mode::Minor.qualities().to_vec());
        // Natural-minor dominant
        assert_eq!(scale.chords()[4].symbol(), "Em");
        assert_eq!(scale.chords()[4].roman_numeral(), Some("v"));
        assert_eq!(scale.chords()[1].roman_numeral(), Some("ii°"));
    }

    #[test]
    fn test_chord_roots_match_degrees() {
        for key in ["C", "F#", "Ab", "E"] {
            for mode in [Mode::Major, Mode::Minor] {
                let scale = Scale::generate(key, mode).unwrap();
                assert_eq!(scale.chords().len(), 7);
                for (note, chord) in scale.notes().iter().zip(scale.chords()) {
                    assert_eq!(chord.root(), *note);
                    assert_eq!(chord.inversion(), Inversion::Root);
                    assert_eq!(chord.notes().len(), 3);
                }
            }
        }
    }

    #[test]
    fn test_numerals_agree_with_qualities() {
        for mode in [Mode::Major, Mode::Minor] {
            for (quality, numeral) in mode.qualities().iter().zip(mode.roman_numerals()) {
                let upper = numeral.chars().next().unwrap().is_uppercase();
                match quality {
                    Quality::Major => assert!(upper, "{numeral}"),
                    Quality::Minor => assert!(!upper, "{numeral}"),
                    Quality::Diminished => assert!(numeral.ends_with('°'), "{numeral}"),
                    Quality::Augmented => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn test_generate_is_idempotent() {
        let a = Scale::generate("D", Mode::Minor).unwrap();
        let b = Scale::generate("D", Mode::Minor).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_key() {
        assert!(Scale::generate("H", Mode::Major).is_err());
    }

    #[test]
    fn test_with_sevenths() {
        let scale = Scale::generate("C", Mode::Major).unwrap().with_sevenths();
        let symbols: Vec<&str> = scale.chords().iter().map(|c| c.symbol()).collect();
        assert_eq!(symbols, vec!["Cmaj7", "Dm7", "Em7", "Fmaj7", "G7", "Am7", "Bø7"]);
        assert_eq!(scale.chords()[6].roman_numeral(), Some("viiø7"));
        assert_eq!(scale.chords()[4].roman_numeral(), Some("V7"));
        assert!(scale.chords().iter().all(|c| c.notes().len() == 4));
    }

    #[test]
    fn test_chord_containing() {
        let scale = Scale::generate("C", Mode::Major).unwrap();
        let chord = scale.chord_containing(PitchClass::D).unwrap();
        assert_eq!(chord.symbol(), "Dm");
        let cs = PitchClass::parse("C#").unwrap();
        assert!(scale.chord_containing(cs).is_none());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Major".parse::<Mode>().unwrap(), Mode::Major);
        assert_eq!("aeolian".parse::<Mode>().unwrap(), Mode::Minor);
        assert!("dorian".parse::<Mode>().is_err());
    }

    #[test]
    fn test_parallel() {
        let scale = Scale::generate("C", Mode::Major).unwrap();
        assert_eq!(scale.parallel().key(), "C minor");
    }
}
