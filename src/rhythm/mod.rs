// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rhythm patterns and the event timeline.
//!
//! [`compile`] expands a chord sequence and a [`RhythmPattern`] into a
//! [`Timeline`] of [`Event`]s laid out in ticks. Both playback and MIDI
//! export consume the same timeline.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseNameError;
use crate::music::{Chord, Note};
use crate::timing::{Tempo, TICKS_PER_QUARTER};

/// Delay between successive notes of a strummed chord
pub const STRUM_STAGGER_MS: f64 = 10.0;

/// Nominal note length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteValue {
    Half,
    Quarter,
    Eighth,
}

impl NoteValue {
    pub fn ticks(self) -> u64 {
        let quarter = TICKS_PER_QUARTER as u64;
        match self {
            NoteValue::Half => quarter * 2,
            NoteValue::Quarter => quarter,
            NoteValue::Eighth => quarter / 2,
        }
    }

    /// Length in quarter-note beats
    pub fn beats(self) -> f64 {
        self.ticks() as f64 / TICKS_PER_QUARTER as f64
    }

    /// Short duration code ("2" for a half note)
    pub fn code(self) -> &'static str {
        match self {
            NoteValue::Half => "2",
            NoteValue::Quarter => "4",
            NoteValue::Eighth => "8",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NoteValue::Half => "half",
            NoteValue::Quarter => "quarter",
            NoteValue::Eighth => "eighth",
        }
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How each chord is spread over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhythmPattern {
    /// All notes together, half note
    #[default]
    Block,
    /// One note at a time, eighth notes
    Arpeggio,
    /// Bass quarter, then the upper notes twice as eighths
    Waltz,
    /// All notes, half note, each note slightly after the one below
    Strum,
}

impl RhythmPattern {
    pub const ALL: [RhythmPattern; 4] = [
        RhythmPattern::Block,
        RhythmPattern::Arpeggio,
        RhythmPattern::Waltz,
        RhythmPattern::Strum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RhythmPattern::Block => "block",
            RhythmPattern::Arpeggio => "arpeggio",
            RhythmPattern::Waltz => "waltz",
            RhythmPattern::Strum => "strum",
        }
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RhythmPattern {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(RhythmPattern::Block),
            "arpeggio" | "arp" => Ok(RhythmPattern::Arpeggio),
            "waltz" => Ok(RhythmPattern::Waltz),
            "strum" => Ok(RhythmPattern::Strum),
            _ => Err(ParseNameError::new("rhythm pattern", s)),
        }
    }
}

/// A group of notes starting together
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub notes: Vec<Note>,
    pub start_tick: u64,
    pub duration: NoteValue,
    /// Per-note delay for strummed events
    pub stagger_ms: Option<f64>,
    /// Index of the source chord in the progression
    pub chord_index: usize,
}

impl Event {
    pub fn end_tick(&self) -> u64 {
        self.start_tick + self.duration.ticks()
    }

    /// Real-time delay of the note at `position` within the event
    pub fn note_delay(&self, position: usize) -> Duration {
        match self.stagger_ms {
            Some(ms) => Duration::from_secs_f64(ms * position as f64 / 1000.0),
            None => Duration::ZERO,
        }
    }

    pub fn is_strummed(&self) -> bool {
        self.stagger_ms.is_some()
    }
}

/// Ordered events of one rendering
///
/// Consumed once by a renderer; compile again to render again.
#[derive(Debug, PartialEq)]
pub struct Timeline {
    events: Vec<Event>,
    pattern: RhythmPattern,
    total_ticks: u64,
}

impl Timeline {
    /// Events in performance order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn pattern(&self) -> RhythmPattern {
        self.pattern
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of nominal event durations
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Wall-clock length at a tempo
    pub fn duration_at(&self, tempo: Tempo) -> Duration {
        tempo.ticks_to_duration(self.total_ticks)
    }
}

impl IntoIterator for Timeline {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Expand chords into a timeline for a pattern
pub fn compile(chords: &[Chord], pattern: RhythmPattern) -> Timeline {
    let mut builder = TimelineBuilder::default();

    for (chord_index, chord) in chords.iter().enumerate() {
        let notes = chord.notes();
        match pattern {
            RhythmPattern::Block => {
                builder.push(notes.to_vec(), NoteValue::Half, None, chord_index);
            }
            RhythmPattern::Strum => {
                builder.push(
                    notes.to_vec(),
                    NoteValue::Half,
                    Some(STRUM_STAGGER_MS),
                    chord_index,
                );
            }
            RhythmPattern::Arpeggio => {
                for &note in notes {
                    builder.push(vec![note], NoteValue::Eighth, None, chord_index);
                }
            }
            RhythmPattern::Waltz => {
                if let Some((&bass, upper)) = notes.split_first() {
                    builder.push(vec![bass], NoteValue::Quarter, None, chord_index);
                    for _ in 0..2 {
                        builder.push(upper.to_vec(), NoteValue::Eighth, None, chord_index);
                    }
                }
            }
        }
    }

    builder.finish(pattern)
}

#[derive(Default)]
struct TimelineBuilder {
    events: Vec<Event>,
    cursor: u64,
}

impl TimelineBuilder {
    fn push(
        &mut self,
        notes: Vec<Note>,
        duration: NoteValue,
        stagger_ms: Option<f64>,
        chord_index: usize,
    ) {
        let event = Event {
            notes,
            start_tick: self.cursor,
            duration,
            stagger_ms,
            chord_index,
        };
        self.cursor = event.end_tick();
        self.events.push(event);
    }

    fn finish(self, pattern: RhythmPattern) -> Timeline {
        Timeline {
            events: self.events,
            pattern,
            total_ticks: self.cursor,
        }
    }
}
