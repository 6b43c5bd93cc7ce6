// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for chordcraft
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Scale and chord derivation
//! - Progression generation and voice leading
//! - Rhythm compilation and MIDI serialization
//! - Playback schedule construction and synth rendering

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use chordcraft::audio::PolySynth;
use chordcraft::export::MidiExporter;
use chordcraft::playback::Schedule;
use chordcraft::progression::{self, Progression};
use chordcraft::{
    compile, Chord, Extension, Inversion, Mode, NoteOutput, Quality, RhythmPattern, Scale, Style,
    Tempo,
};

fn bench_scale_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale");

    group.bench_function("generate", |b| {
        b.iter(|| Scale::generate(black_box("F#"), black_box(Mode::Minor)))
    });

    let scale = Scale::generate("Eb", Mode::Major).unwrap();
    group.bench_function("with_sevenths", |b| b.iter(|| black_box(&scale).with_sevenths()));

    group.finish();
}

fn bench_chord_build(c: &mut Criterion) {
    c.bench_function("chord_build_all_inversions", |b| {
        b.iter(|| {
            let chord = Chord::build(
                black_box("Bb"),
                Quality::Major,
                Some(Extension::Major7),
                Inversion::Root,
                4,
            )
            .unwrap();
            black_box(chord.all_inversions())
        })
    });
}

fn bench_progression(c: &mut Criterion) {
    let scale = Scale::generate("C", Mode::Major).unwrap();
    let mut group = c.benchmark_group("progression");

    for style in Style::ALL {
        group.bench_with_input(BenchmarkId::new("generate", style), &style, |b, &style| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| progression::generate(&scale, style, 16, &mut rng))
        });
    }

    let mut rng = StdRng::seed_from_u64(1);
    let chords = progression::generate(&scale, Style::Random, 16, &mut rng);
    group.bench_function("voice_lead_16", |b| {
        b.iter_batched(
            || Progression::from_chords(chords.clone()),
            |mut p| {
                p.voice_lead();
                p
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let scale = Scale::generate("A", Mode::Minor).unwrap().with_sevenths();
    let mut rng = StdRng::seed_from_u64(2);
    let chords = progression::generate(&scale, Style::Random, 16, &mut rng);
    let mut group = c.benchmark_group("render");

    for pattern in RhythmPattern::ALL {
        group.bench_with_input(BenchmarkId::new("compile", pattern), &pattern, |b, &pattern| {
            b.iter(|| compile(black_box(&chords), pattern))
        });

        let exporter = MidiExporter::new();
        group.bench_with_input(BenchmarkId::new("midi", pattern), &pattern, |b, &pattern| {
            b.iter_batched(
                || compile(&chords, pattern),
                |timeline| exporter.to_bytes(timeline),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(
            BenchmarkId::new("schedule", pattern),
            &pattern,
            |b, &pattern| {
                b.iter_batched(
                    || compile(&chords, pattern),
                    |timeline| Schedule::from_timeline(timeline, Tempo::default(), 64),
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

/// One 512-frame stereo buffer with a triad sounding
fn bench_synth_render(c: &mut Criterion) {
    let chord = Chord::triad("C", Quality::Major).unwrap();
    let mut synth = PolySynth::new(44100);
    for note in chord.notes() {
        synth.note_on(note, 90);
    }
    let mut buffer = vec![0.0f32; 1024];

    c.bench_function("synth_render_512", |b| {
        b.iter(|| {
            buffer.fill(0.0);
            synth.render(black_box(&mut buffer), 2);
        })
    });
}

criterion_group!(
    benches,
    bench_scale_generation,
    bench_chord_build,
    bench_progression,
    bench_render,
    bench_synth_render,
);

criterion_main!(benches);
