// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progressions.
//!
//! A [`Style`] names a scale-degree template; the [`ProgressionTemplater`]
//! slices it against a [`Scale`] to produce chords. A [`Progression`] is the
//! editable sequence the user works with afterwards.

pub mod record;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ParseNameError;
use crate::music::{Chord, Inversion, Mode, Scale};

pub use record::{ChordRecord, SavedProgression};

/// Most chords a progression may hold
pub const MAX_LENGTH: usize = 16;

/// Fewest chords a generated progression is asked for
pub const MIN_GENERATED_LENGTH: usize = 2;

/// Progression template style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Pop,
    Jazz,
    Blues,
    Lofi,
    Random,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Pop,
        Style::Jazz,
        Style::Blues,
        Style::Lofi,
        Style::Random,
    ];

    /// 0-based scale degrees of the template, or `None` for random
    pub fn degrees(self, mode: Mode) -> Option<&'static [usize]> {
        match (self, mode) {
            (Style::Pop, _) => Some(&[0, 4, 5, 3]),
            (Style::Jazz, _) => Some(&[1, 4, 0, 5]),
            (Style::Blues, _) => Some(&[0, 0, 3, 0]),
            (Style::Lofi, Mode::Minor) => Some(&[0, 6, 5, 6]),
            (Style::Lofi, Mode::Major) => Some(&[5, 3, 0, 4]),
            (Style::Random, _) => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Style::Pop => "pop",
            Style::Jazz => "jazz",
            Style::Blues => "blues",
            Style::Lofi => "lofi",
            Style::Random => "random",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pop" => Ok(Style::Pop),
            "jazz" => Ok(Style::Jazz),
            "blues" => Ok(Style::Blues),
            "lofi" | "lo-fi" => Ok(Style::Lofi),
            "random" => Ok(Style::Random),
            _ => Err(ParseNameError::new("style", s)),
        }
    }
}

/// Chords for a style, sliced to `length`
///
/// Fixed templates are truncated, never looped or padded. Random draws
/// `length` scale chords with replacement. Bounds are the caller's concern.
pub fn generate<R: Rng + ?Sized>(
    scale: &Scale,
    style: Style,
    length: usize,
    rng: &mut R,
) -> Vec<Chord> {
    let chords = match style.degrees(scale.mode()) {
        Some(degrees) => degrees
            .iter()
            .take(length)
            .map(|&degree| scale.chords()[degree].clone())
            .collect(),
        None => (0..length)
            .filter_map(|_| scale.chords().choose(rng).cloned())
            .collect::<Vec<_>>(),
    };

    info!(
        key = %scale.key(),
        style = %style,
        length = chords.len(),
        "generated progression"
    );
    chords
}

/// Seedable progression generator
pub struct ProgressionTemplater {
    rng: StdRng,
}

impl ProgressionTemplater {
    /// Create a templater seeded from entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a templater with a fixed seed for reproducible output
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a progression for a style
    pub fn generate(&mut self, scale: &Scale, style: Style, length: usize) -> Progression {
        Progression::from_chords(generate(scale, style, length, &mut self.rng))
    }

    /// Access the random source, for editing operations that need one
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for ProgressionTemplater {
    fn default() -> Self {
        Self::new()
    }
}

/// An editable chord sequence of at most [`MAX_LENGTH`] chords
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Progression {
    chords: Vec<Chord>,
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap chords, dropping any beyond [`MAX_LENGTH`]
    pub fn from_chords(mut chords: Vec<Chord>) -> Self {
        chords.truncate(MAX_LENGTH);
        Self { chords }
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn get(&self, index: usize) -> Option<&Chord> {
        self.chords.get(index)
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.chords.len() >= MAX_LENGTH
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chord> {
        self.chords.iter()
    }

    /// Append a chord; returns false when the progression is full
    pub fn push(&mut self, chord: Chord) -> bool {
        if self.is_full() {
            return false;
        }
        self.chords.push(chord);
        true
    }

    /// Append a random chord from the scale
    pub fn push_random<R: Rng + ?Sized>(&mut self, scale: &Scale, rng: &mut R) -> bool {
        match scale.chords().choose(rng) {
            Some(chord) => self.push(chord.clone()),
            None => false,
        }
    }

    /// Remove the chord at an index
    pub fn remove(&mut self, index: usize) -> Option<Chord> {
        if index < self.chords.len() {
            Some(self.chords.remove(index))
        } else {
            None
        }
    }

    /// Move a chord to a new position, shifting the chords between
    pub fn move_chord(&mut self, from: usize, to: usize) -> bool {
        if from >= self.chords.len() || to >= self.chords.len() {
            return false;
        }
        let chord = self.chords.remove(from);
        self.chords.insert(to, chord);
        true
    }

    /// Randomly reorder the chords
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.chords.shuffle(rng);
    }

    /// Replace the chord at an index with the given inversion of itself
    pub fn set_inversion(&mut self, index: usize, inversion: Inversion) -> Option<&Chord> {
        let slot = self.chords.get_mut(index)?;
        *slot = slot.with_inversion(inversion);
        Some(slot)
    }

    /// Advance the chord at an index to its next inversion
    pub fn cycle_inversion(&mut self, index: usize) -> Option<Inversion> {
        let next = self.chords.get(index)?.inversion().next();
        self.set_inversion(index, next).map(|c| c.inversion())
    }

    /// Re-voice every chord after the first to move as little as possible
    ///
    /// Each chord takes the inversion with the smallest total semitone
    /// movement from the chord before it; ties keep the lower inversion.
    /// Inverted voicings keep the octave pattern of root position, so after a
    /// root-position chord the root position never loses. A progression only
    /// picks up inversions once an earlier chord is inverted.
    pub fn voice_lead(&mut self) {
        for i in 1..self.chords.len() {
            let previous = &self.chords[i - 1];
            let current = &self.chords[i];

            let mut best = current.with_inversion(Inversion::Root);
            let mut best_movement = best.movement_from(previous);
            for index in 1..current.notes().len() {
                let candidate = current.with_inversion(Inversion::from_index(index));
                let movement = candidate.movement_from(previous);
                if movement < best_movement {
                    best_movement = movement;
                    best = candidate;
                }
            }

            debug!(
                chord = %best,
                inversion = best.inversion().index(),
                movement = best_movement,
                "voice led"
            );
            self.chords[i] = best;
        }
    }

    pub fn into_chords(self) -> Vec<Chord> {
        self.chords
    }
}

impl From<Vec<Chord>> for Progression {
    fn from(chords: Vec<Chord>) -> Self {
        Self::from_chords(chords)
    }
}

impl<'a> IntoIterator for &'a Progression {
    type Item = &'a Chord;
    type IntoIter = std::slice::Iter<'a, Chord>;

    fn into_iter(self) -> Self::IntoIter {
        self.chords.iter()
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(" - ")?;
            }
            write!(f, "{}", chord)?;
        }
        Ok(())
    }
}
