// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audible playback.
//!
//! A [`Player`] renders a [`Timeline`] against the tokio clock through an
//! [`AudioBackend`]. Only one run is alive at a time: starting a new run
//! stops the previous one first. Progress is published through a shared
//! [`PlaybackState`].

pub mod scheduler;

pub use scheduler::{NoteAction, Schedule, ScheduledNote};

use std::slice;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::error::AudioError;
use crate::music::{Chord, Note};
use crate::rhythm::{compile, RhythmPattern, Timeline};
use crate::timing::Tempo;

/// Default note-on velocity
pub const DEFAULT_VELOCITY: u8 = 64;

/// Something that can sound notes
pub trait NoteOutput: Send {
    fn note_on(&mut self, note: &Note, velocity: u8);
    fn note_off(&mut self, note: &Note);
    /// Release everything currently sounding
    fn all_notes_off(&mut self);
}

/// Note output shared between the player and its playback task
pub type SharedOutput = Arc<Mutex<dyn NoteOutput>>;

/// An output device that must be opened before use
pub trait AudioBackend {
    /// Open the output if it is not open yet
    ///
    /// Calling this again after success is a no-op. A failure leaves the
    /// backend closed so a later call can retry.
    fn ensure_ready(&mut self) -> Result<(), AudioError>;

    fn is_ready(&self) -> bool;

    fn output(&self) -> SharedOutput;
}

const NO_CHORD: i64 = -1;

/// Observable state of the player
///
/// Each run gets a generation number; updates from a run that has since
/// been replaced are ignored.
#[derive(Debug)]
pub struct PlaybackState {
    playing: AtomicBool,
    current_chord: AtomicI64,
    generation: AtomicU64,
}

impl PlaybackState {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            current_chord: AtomicI64::new(NO_CHORD),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Index of the chord whose notes started most recently
    pub fn current_chord(&self) -> Option<usize> {
        let index = self.current_chord.load(Ordering::Acquire);
        usize::try_from(index).ok()
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.current_chord.store(NO_CHORD, Ordering::Release);
        self.playing.store(true, Ordering::Release);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn set_chord(&self, generation: u64, index: usize) {
        if self.is_current(generation) {
            self.current_chord.store(index as i64, Ordering::Release);
        }
    }

    fn finish(&self, generation: u64) {
        if self.is_current(generation) {
            self.playing.store(false, Ordering::Release);
            self.current_chord.store(NO_CHORD, Ordering::Release);
        }
    }

    fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.playing.store(false, Ordering::Release);
        self.current_chord.store(NO_CHORD, Ordering::Release);
    }
}

/// Timeline player over an audio backend
pub struct Player<B: AudioBackend> {
    backend: B,
    state: Arc<PlaybackState>,
    task: Option<JoinHandle<()>>,
    velocity: u8,
}

impl<B: AudioBackend> Player<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Arc::new(PlaybackState::new()),
            task: None,
            velocity: DEFAULT_VELOCITY,
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.min(127);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open the backend ahead of the first run
    pub fn ensure_ready(&mut self) -> Result<(), AudioError> {
        self.backend.ensure_ready()
    }

    /// Handle for observing playback from elsewhere
    pub fn state(&self) -> Arc<PlaybackState> {
        Arc::clone(&self.state)
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_chord(&self) -> Option<usize> {
        self.state.current_chord()
    }

    /// Start rendering a timeline, replacing any run in progress
    ///
    /// Returns as soon as the run is scheduled. Must be called from within
    /// a tokio runtime.
    pub fn start(&mut self, timeline: Timeline, tempo: Tempo) -> Result<(), AudioError> {
        self.stop();

        if let Err(e) = self.backend.ensure_ready() {
            warn!(error = %e, "audio output not ready");
            return Err(e);
        }
        let runtime = Handle::try_current().map_err(|_| AudioError::NoRuntime)?;

        let events = timeline.len();
        let pattern = timeline.pattern();
        let schedule = Schedule::from_timeline(timeline, tempo, self.velocity);
        let generation = self.state.begin();
        info!(
            events,
            %pattern,
            bpm = tempo.bpm(),
            length_ms = schedule.end().as_millis() as u64,
            "playback started"
        );

        self.task = Some(runtime.spawn(run(
            schedule,
            self.backend.output(),
            Arc::clone(&self.state),
            generation,
        )));
        Ok(())
    }

    /// Play one chord as a half-note block
    pub fn play_chord(&mut self, chord: &Chord, tempo: Tempo) -> Result<(), AudioError> {
        self.start(compile(slice::from_ref(chord), RhythmPattern::Block), tempo)
    }

    /// Cancel the current run and silence the output
    ///
    /// Safe to call at any time, including when nothing is playing.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("playback stopped");
        }
        // Retire the run before silencing, so a task still waiting on the
        // output lock finds itself stale once it gets it.
        self.state.reset();
        if self.backend.is_ready() {
            match self.backend.output().lock() {
                Ok(mut output) => output.all_notes_off(),
                Err(_) => error!("note output lock poisoned"),
            }
        }
    }

    /// Wait until the current run ends or is stopped
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!(error = %e, "playback task failed");
                }
            }
            self.task = None;
        }
    }
}

impl<B: AudioBackend> Drop for Player<B> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(mut schedule: Schedule, output: SharedOutput, state: Arc<PlaybackState>, generation: u64) {
    let start = Instant::now();

    while let Some(at) = schedule.next_time() {
        sleep_until(start + at).await;

        let due = schedule.pop_due(at);
        let Ok(mut sink) = output.lock() else {
            error!("note output lock poisoned");
            break;
        };
        if !state.is_current(generation) {
            debug!(generation, "playback superseded");
            return;
        }
        for item in &due {
            match item.action {
                NoteAction::On => {
                    sink.note_on(&item.note, item.velocity);
                    state.set_chord(generation, item.chord_index);
                }
                NoteAction::Off => sink.note_off(&item.note),
            }
        }
    }

    state.finish(generation);
    debug!(generation, "playback finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Mode, Scale};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        On(u8, u8),
        Off(u8),
        AllOff,
    }

    #[derive(Default)]
    struct Recorder {
        origin: Option<Instant>,
        calls: Vec<(Duration, Call)>,
    }

    impl Recorder {
        fn record(&mut self, call: Call) {
            let origin = *self.origin.get_or_insert_with(Instant::now);
            self.calls.push((Instant::now() - origin, call));
        }
    }

    impl NoteOutput for Recorder {
        fn note_on(&mut self, note: &Note, velocity: u8) {
            self.record(Call::On(note.midi_number(), velocity));
        }

        fn note_off(&mut self, note: &Note) {
            self.record(Call::Off(note.midi_number()));
        }

        fn all_notes_off(&mut self) {
            self.record(Call::AllOff);
        }
    }

    struct TestBackend {
        recorder: Arc<Mutex<Recorder>>,
        ready: bool,
        fail: bool,
        opens: usize,
    }

    impl TestBackend {
        fn new() -> Self {
            Self {
                recorder: Arc::new(Mutex::new(Recorder::default())),
                ready: false,
                fail: false,
                opens: 0,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<(Duration, Call)> {
            self.recorder.lock().unwrap().calls.clone()
        }
    }

    impl AudioBackend for TestBackend {
        fn ensure_ready(&mut self) -> Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::NoDevice);
            }
            if !self.ready {
                self.ready = true;
                self.opens += 1;
            }
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn output(&self) -> SharedOutput {
            self.recorder.clone()
        }
    }

    fn timeline(degrees: &[usize], pattern: RhythmPattern) -> Timeline {
        let scale = Scale::generate("C", Mode::Major).unwrap();
        let chords: Vec<Chord> = degrees.iter().map(|&d| scale.chords()[d].clone()).collect();
        compile(&chords, pattern)
    }

    fn near(actual: Duration, expected_ms: u64) -> bool {
        let expected = Duration::from_millis(expected_ms);
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        diff <= Duration::from_millis(2)
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_run() {
        let mut player = Player::new(TestBackend::new());
        player
            .start(timeline(&[0], RhythmPattern::Block), Tempo::new(120.0))
            .unwrap();
        assert!(player.is_playing());

        player.wait().await;
        assert!(!player.is_playing());
        assert_eq!(player.current_chord(), None);

        let calls = player.backend().calls();
        let ons: Vec<_> = calls.iter().filter(|(_, c)| matches!(c, Call::On(..))).collect();
        let offs: Vec<_> = calls.iter().filter(|(_, c)| matches!(c, Call::Off(_))).collect();
        assert_eq!(ons.len(), 3);
        assert_eq!(offs.len(), 3);
        assert!(ons.iter().all(|(t, _)| near(*t, 0)));
        assert!(offs.iter().all(|(t, _)| near(*t, 1000)));
        assert!(ons.iter().any(|(_, c)| *c == Call::On(60, DEFAULT_VELOCITY)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_run_stays_silent() {
        let backend = TestBackend::new();
        let output = backend.output();
        let state = Arc::new(PlaybackState::new());

        let generation = state.begin();
        state.reset();
        let schedule =
            Schedule::from_timeline(timeline(&[0, 4], RhythmPattern::Block), Tempo::default(), 64);
        run(schedule, output, Arc::clone(&state), generation).await;

        assert!(backend.calls().is_empty());
        assert!(!state.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_retires_run_before_silencing() {
        let mut player = Player::new(TestBackend::new());
        let state = player.state();
        player
            .start(timeline(&[0, 4], RhythmPattern::Block), Tempo::new(120.0))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let before = state.generation.load(Ordering::Acquire);
        player.stop();
        assert!(state.generation.load(Ordering::Acquire) > before);
        assert!(!state.is_playing());

        // Nothing sounds after the final all-notes-off
        tokio::time::sleep(Duration::from_secs(3)).await;
        let calls = player.backend().calls();
        assert_eq!(calls.last().map(|(_, c)| *c), Some(Call::AllOff));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_tempo_plays_at_default() {
        let mut player = Player::new(TestBackend::new());
        player
            .start(timeline(&[0], RhythmPattern::Block), Tempo::new(f64::NAN))
            .unwrap();
        player.wait().await;

        let offs: Vec<Duration> = player
            .backend()
            .calls()
            .iter()
            .filter(|(_, c)| matches!(c, Call::Off(_)))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(offs.len(), 3);
        assert!(offs.iter().all(|t| near(*t, 1000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_strum_timing() {
        let mut player = Player::new(TestBackend::new());
        player
            .start(timeline(&[0], RhythmPattern::Strum), Tempo::new(120.0))
            .unwrap();
        player.wait().await;

        let ons: Vec<Duration> = player
            .backend()
            .calls()
            .iter()
            .filter(|(_, c)| matches!(c, Call::On(..)))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(ons.len(), 3);
        assert!(near(ons[0], 0));
        assert!(near(ons[1], 10));
        assert!(near(ons[2], 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_chord_advances() {
        let mut player = Player::new(TestBackend::new());
        let state = player.state();
        player
            .start(timeline(&[0, 4, 5], RhythmPattern::Block), Tempo::new(120.0))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(state.current_chord(), Some(0));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(state.current_chord(), Some(1));
        assert!(state.is_playing());

        player.wait().await;
        assert!(!state.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut player = Player::new(TestBackend::new());
        player
            .start(timeline(&[0, 4], RhythmPattern::Block), Tempo::new(120.0))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        player.stop();
        player.stop();
        assert!(!player.is_playing());
        assert_eq!(player.current_chord(), None);

        // Nothing sounds after the stop
        tokio::time::sleep(Duration::from_secs(3)).await;
        let calls = player.backend().calls();
        assert_eq!(calls.iter().filter(|(_, c)| matches!(c, Call::On(..))).count(), 3);
        assert!(matches!(calls.last(), Some((_, Call::AllOff))));
        player.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_run() {
        let mut player = Player::new(TestBackend::new());
        player
            .start(timeline(&[0, 4], RhythmPattern::Block), Tempo::new(120.0))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let chord = Scale::generate("C", Mode::Major).unwrap().chords()[3].clone();
        player.play_chord(&chord, Tempo::new(120.0)).unwrap();
        player.wait().await;

        let calls = player.backend().calls();
        let ons = calls.iter().filter(|(_, c)| matches!(c, Call::On(..))).count();
        assert_eq!(ons, 6);
        assert!(calls.iter().any(|(_, c)| *c == Call::On(65, DEFAULT_VELOCITY)));
        // G major from the first run never starts
        assert!(!calls.iter().any(|(_, c)| *c == Call::On(71, DEFAULT_VELOCITY)));
        assert_eq!(player.backend().opens, 1);
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let mut player = Player::new(TestBackend::failing());
        let result = player.start(timeline(&[0], RhythmPattern::Block), Tempo::new(120.0));
        assert_eq!(result, Err(AudioError::NoDevice));
        assert!(!player.is_playing());
        player.wait().await;
    }

    #[test]
    fn test_start_requires_runtime() {
        let mut player = Player::new(TestBackend::new());
        let result = player.start(timeline(&[0], RhythmPattern::Block), Tempo::new(120.0));
        assert_eq!(result, Err(AudioError::NoRuntime));
        assert!(!player.is_playing());
    }
}
