// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note schedule for audible playback.
//!
//! Flattens a [`Timeline`] into note-on and note-off actions keyed by
//! microseconds from the start of the run, held in a min-heap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::music::Note;
use crate::rhythm::Timeline;
use crate::timing::Tempo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoteAction {
    // Offs sort first so a repeated pitch is released before it restarts
    Off,
    On,
}

/// A note action at a point in time
#[derive(Debug, Clone)]
pub struct ScheduledNote {
    /// Time in microseconds from the start of the run
    pub time_micros: u64,
    pub action: NoteAction,
    pub note: Note,
    pub velocity: u8,
    pub chord_index: usize,
    seq: u64,
}

impl ScheduledNote {
    fn key(&self) -> (u64, NoteAction, u64) {
        (self.time_micros, self.action, self.seq)
    }
}

// For BinaryHeap - we want minimum time first
impl Eq for ScheduledNote {}

impl PartialEq for ScheduledNote {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for ScheduledNote {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for ScheduledNote {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending note actions of one playback run
#[derive(Debug, Default)]
pub struct Schedule {
    queue: BinaryHeap<ScheduledNote>,
    end_micros: u64,
    seq: u64,
}

impl Schedule {
    /// Lay out a timeline at a tempo
    ///
    /// Strummed notes start at their stagger offset and keep the full
    /// event duration.
    pub fn from_timeline(timeline: Timeline, tempo: Tempo, velocity: u8) -> Self {
        let mut schedule = Self {
            end_micros: micros(timeline.duration_at(tempo)),
            ..Self::default()
        };

        for event in timeline {
            let start = tempo.ticks_to_duration(event.start_tick);
            let length = tempo.ticks_to_duration(event.duration.ticks());
            for (position, note) in event.notes.iter().enumerate() {
                let on = start + event.note_delay(position);
                schedule.push(micros(on), NoteAction::On, *note, velocity, event.chord_index);
                schedule.push(
                    micros(on + length),
                    NoteAction::Off,
                    *note,
                    0,
                    event.chord_index,
                );
            }
        }

        schedule
    }

    fn push(
        &mut self,
        time_micros: u64,
        action: NoteAction,
        note: Note,
        velocity: u8,
        chord_index: usize,
    ) {
        self.seq += 1;
        self.end_micros = self.end_micros.max(time_micros);
        self.queue.push(ScheduledNote {
            time_micros,
            action,
            note,
            velocity,
            chord_index,
            seq: self.seq,
        });
    }

    /// Offset of the next pending action
    pub fn next_time(&self) -> Option<Duration> {
        self.queue
            .peek()
            .map(|n| Duration::from_micros(n.time_micros))
    }

    /// Remove every action due at or before `until`, in order
    pub fn pop_due(&mut self, until: Duration) -> Vec<ScheduledNote> {
        let until = micros(until);
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|n| n.time_micros <= until) {
            if let Some(note) = self.queue.pop() {
                due.push(note);
            }
        }
        due
    }

    /// Offset at which the run is over
    pub fn end(&self) -> Duration {
        Duration::from_micros(self.end_micros)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn micros(duration: Duration) -> u64 {
    duration.as_micros() as u64
}
