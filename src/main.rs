// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chordcraft::audio::{self, AudioEngine, Envelope};
use chordcraft::config::{Backend, SessionConfig, SessionFile};
use chordcraft::export::{self, MidiExporter};
use chordcraft::midi::{self, MidiPortBackend};
use chordcraft::{
    compile, AudioBackend, Mode, PlaybackState, Player, Progression, ProgressionTemplater,
    RhythmPattern, SavedProgression, Scale, Style,
};

#[derive(Parser)]
#[command(name = "chordcraft", about = "Diatonic chord progression generator")]
#[command(version)]
struct Cli {
    /// Session file (YAML, or TOML by extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the notes and chords of a key
    Scale {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        mode: Option<Mode>,
        /// Show diatonic seventh chords
        #[arg(long)]
        sevenths: bool,
    },

    /// Generate a progression and print it
    Generate {
        #[command(flatten)]
        session: SessionArgs,
        /// Print a saved-progression YAML record instead of a listing
        #[arg(long)]
        yaml: bool,
    },

    /// Write a progression to a MIDI file
    Export {
        #[command(flatten)]
        session: SessionArgs,
        /// Output file or directory (default: current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Play a progression
    Play {
        #[command(flatten)]
        session: SessionArgs,
        /// synth or midi
        #[arg(long)]
        backend: Option<String>,
        /// MIDI output port index
        #[arg(long)]
        port: Option<usize>,
    },

    /// List MIDI output ports
    Ports,

    /// List audio output devices
    Devices,
}

/// Options that override the session file
#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Tonic, e.g. C, F#, Bb
    #[arg(long)]
    key: Option<String>,
    /// major or minor
    #[arg(long)]
    mode: Option<Mode>,
    /// pop, jazz, blues, lofi or random
    #[arg(long)]
    style: Option<Style>,
    /// block, arpeggio, waltz or strum
    #[arg(long)]
    rhythm: Option<RhythmPattern>,
    /// Tempo in BPM (60-200)
    #[arg(long)]
    tempo: Option<u32>,
    /// Number of chords (2-16)
    #[arg(long)]
    length: Option<usize>,
    /// Note velocity (1-127)
    #[arg(long)]
    velocity: Option<u8>,
    /// Seed for the random style
    #[arg(long)]
    seed: Option<u64>,
    /// Use diatonic seventh chords
    #[arg(long)]
    sevenths: bool,
    /// Re-voice chords for smooth voice leading
    #[arg(long)]
    voice_lead: bool,
    /// Load a saved progression instead of generating one
    #[arg(long)]
    load: Option<PathBuf>,
}

impl SessionArgs {
    fn apply(&self, session: &mut SessionConfig) {
        if let Some(key) = &self.key {
            session.key = key.clone();
        }
        if let Some(mode) = self.mode {
            session.mode = mode;
        }
        if let Some(style) = self.style {
            session.style = style;
        }
        if let Some(rhythm) = self.rhythm {
            session.rhythm = rhythm;
        }
        if let Some(tempo) = self.tempo {
            session.tempo = tempo;
        }
        if let Some(length) = self.length {
            session.length = length;
        }
        if let Some(velocity) = self.velocity {
            session.velocity = velocity;
        }
        if self.seed.is_some() {
            session.seed = self.seed;
        }
        session.sevenths |= self.sevenths;
        session.voice_lead |= self.voice_lead;
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chordcraft=info")))
        .init();
}

fn load_session(path: Option<&Path>, args: &SessionArgs) -> Result<SessionFile> {
    let mut file = match path {
        Some(path) => SessionFile::load(path)?,
        None => SessionFile::default(),
    };
    args.apply(&mut file.session);
    file.session = file.session.clamped();
    debug!(?file, "session loaded");
    Ok(file)
}

/// Generate a progression, or load one when `--load` is given
///
/// A loaded progression also sets the tempo, style and rhythm.
fn build_progression(session: &mut SessionConfig, load: Option<&Path>) -> Result<(Scale, Progression)> {
    if let Some(path) = load {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read progression: {:?}", path))?;
        let saved = SavedProgression::from_yaml(&text)?;
        let progression = saved.restore()?;
        session.tempo = saved.tempo;
        session.style = saved.style;
        session.rhythm = saved.rhythm_pattern;
        // Key is stored as "<tonic> <mode>"
        let mut key = saved.key.split_whitespace();
        if let Some(tonic) = key.next() {
            session.key = tonic.to_string();
        }
        if let Some(mode) = key.next() {
            session.mode = mode.parse()?;
        }
        *session = session.clamped();
        info!(name = %saved.name, chords = progression.len(), "loaded progression");
        return Ok((session.scale()?, progression));
    }

    let scale = session.scale()?;
    let mut templater = match session.seed {
        Some(seed) => ProgressionTemplater::with_seed(seed),
        None => ProgressionTemplater::new(),
    };
    let mut progression = templater.generate(&scale, session.style, session.length);
    if session.voice_lead {
        progression.voice_lead();
    }
    Ok((scale, progression))
}

fn print_scale(scale: &Scale) {
    let notes: Vec<String> = scale.notes().iter().map(|n| n.to_string()).collect();
    println!("{}: {}", scale, notes.join(" "));
    println!();
    for chord in scale.chords() {
        print_chord_line(chord);
    }
}

fn print_chord_line(chord: &chordcraft::Chord) {
    let notes: Vec<String> = chord.notes().iter().map(|n| n.to_string()).collect();
    println!(
        "  {:<6} {:<8} {}",
        chord.roman_numeral().unwrap_or("-"),
        chord.symbol(),
        notes.join(" ")
    );
}

fn print_progression(scale: &Scale, session: &SessionConfig, progression: &Progression) {
    println!("{} / {} / {} BPM", scale, session.style, session.tempo);
    println!("{}", progression);
    println!();
    for chord in progression {
        print_chord_line(chord);
    }
}

fn export(session: &SessionConfig, progression: &Progression, out: Option<&Path>) -> Result<PathBuf> {
    let scale = session.scale()?;
    let name = export::file_name(scale.tonic(), session.mode, session.style);
    let path = match out {
        Some(out) if out.is_dir() => out.join(name),
        Some(out) => out.to_path_buf(),
        None => PathBuf::from(name),
    };

    let exporter = MidiExporter::new()
        .with_tempo(session.tempo())
        .with_velocity(session.velocity)
        .with_track_name(session.name.clone());
    exporter
        .export(compile(progression.chords(), session.rhythm), &path)
        .with_context(|| format!("Failed to write MIDI file: {:?}", path))?;
    Ok(path)
}

/// Print the sounding chord whenever it changes
async fn report_progress(state: Arc<PlaybackState>, symbols: Vec<String>) {
    let mut last = None;
    loop {
        let current = state.current_chord();
        if current != last {
            if let Some(symbol) = current.and_then(|i| symbols.get(i)) {
                println!("  > {}", symbol);
            }
            last = current;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn play_with<B: AudioBackend>(
    backend: B,
    session: &SessionConfig,
    progression: &Progression,
    tail: Duration,
) -> Result<()> {
    let mut player = Player::new(backend).with_velocity(session.velocity);
    player
        .start(compile(progression.chords(), session.rhythm), session.tempo())
        .context("Failed to start playback")?;

    let symbols = progression.iter().map(|c| c.symbol().to_string()).collect();
    let progress = tokio::spawn(report_progress(player.state(), symbols));

    let interrupted = tokio::select! {
        _ = player.wait() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    progress.abort();

    if interrupted {
        player.stop();
        println!("Stopped");
    }
    // Let released notes ring out
    tokio::time::sleep(tail).await;
    Ok(())
}

async fn play(
    file: &SessionFile,
    progression: &Progression,
    backend: Option<&str>,
    port: Option<usize>,
) -> Result<()> {
    let session = &file.session;
    let mut output = file.output.clone();
    if let Some(name) = backend {
        output.backend = match name.to_lowercase().as_str() {
            "synth" => Backend::Synth,
            "midi" => Backend::Midi,
            other => anyhow::bail!("Unknown backend: {:?} (expected synth or midi)", other),
        };
    }
    if port.is_some() {
        output.midi_port = port;
        output.backend = Backend::Midi;
    }

    println!(
        "Playing {} ({}, {} at {} BPM)",
        progression, session.rhythm, session.style, session.tempo
    );

    match output.backend {
        Backend::Synth => {
            let engine = AudioEngine::new(output.audio_config());
            let tail = Duration::from_secs_f32(Envelope::default().release);
            play_with(engine, session, progression, tail).await
        }
        Backend::Midi => {
            let backend = MidiPortBackend::new(output.midi_port, output.channel_index())
                .with_program(export::DEFAULT_PROGRAM);
            play_with(backend, session, progression, Duration::ZERO).await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Command::Scale {
            key,
            mode,
            sevenths,
        } => {
            let args = SessionArgs {
                key,
                mode,
                sevenths,
                ..SessionArgs::default()
            };
            let file = load_session(config, &args)?;
            print_scale(&file.session.scale()?);
        }
        Command::Generate { session, yaml } => {
            let mut file = load_session(config, &session)?;
            let (scale, progression) = build_progression(&mut file.session, session.load.as_deref())?;
            if yaml {
                let saved = SavedProgression::capture(
                    file.session.name.clone(),
                    &scale,
                    &progression,
                    file.session.tempo,
                    file.session.style,
                    file.session.rhythm,
                );
                print!("{}", saved.to_yaml()?);
            } else {
                print_progression(&scale, &file.session, &progression);
            }
        }
        Command::Export { session, out } => {
            let mut file = load_session(config, &session)?;
            let (_, progression) = build_progression(&mut file.session, session.load.as_deref())?;
            let path = export(&file.session, &progression, out.as_deref())?;
            println!("Wrote {}", path.display());
        }
        Command::Play {
            session,
            backend,
            port,
        } => {
            let mut file = load_session(config, &session)?;
            let (_, progression) = build_progression(&mut file.session, session.load.as_deref())?;
            play(&file, &progression, backend.as_deref(), port).await?;
        }
        Command::Ports => {
            let ports = midi::list_ports()?;
            if ports.is_empty() {
                println!("No MIDI output ports found");
            }
            for (index, name) in ports.iter().enumerate() {
                println!("  {}: {}", index, name);
            }
        }
        Command::Devices => {
            let default = audio::default_device_name();
            for name in audio::list_devices() {
                let marker = if Some(&name) == default.as_ref() { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
    }

    Ok(())
}
