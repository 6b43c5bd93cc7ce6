// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Serializable snapshot of a progression.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{Progression, Style};
use crate::error::TheoryResult;
use crate::music::pitch::REFERENCE_OCTAVE;
use crate::music::{Chord, Extension, Inversion, Quality, Scale};
use crate::rhythm::RhythmPattern;

/// A chord flattened to its harmonic identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordRecord {
    pub symbol: String,
    pub root: String,
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Extension>,
    #[serde(default)]
    pub inversion: Inversion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roman_numeral: Option<String>,
}

impl ChordRecord {
    pub fn from_chord(chord: &Chord) -> Self {
        Self {
            symbol: chord.symbol().to_string(),
            root: chord.root().to_string(),
            quality: chord.quality(),
            extension: chord.extension(),
            inversion: chord.inversion(),
            roman_numeral: chord.roman_numeral().map(str::to_string),
        }
    }

    /// Rebuild the chord in the reference octave
    pub fn to_chord(&self) -> TheoryResult<Chord> {
        let chord = Chord::build(
            &self.root,
            self.quality,
            self.extension,
            self.inversion,
            REFERENCE_OCTAVE,
        )?;
        Ok(match &self.roman_numeral {
            Some(numeral) => chord.with_roman_numeral(numeral.clone()),
            None => chord,
        })
    }
}

/// A named, timestamped progression with its playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgression {
    pub name: String,
    pub key: String,
    pub chords: Vec<ChordRecord>,
    pub tempo: u32,
    pub style: Style,
    pub rhythm_pattern: RhythmPattern,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

impl SavedProgression {
    /// Snapshot a progression, stamped with the current time
    pub fn capture(
        name: impl Into<String>,
        scale: &Scale,
        progression: &Progression,
        tempo: u32,
        style: Style,
        rhythm_pattern: RhythmPattern,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            name: name.into(),
            key: scale.key().to_string(),
            chords: progression.iter().map(ChordRecord::from_chord).collect(),
            tempo,
            style,
            rhythm_pattern,
            created_at,
        }
    }

    /// Rebuild the progression's chords
    pub fn restore(&self) -> TheoryResult<Progression> {
        let chords = self
            .chords
            .iter()
            .map(ChordRecord::to_chord)
            .collect::<TheoryResult<Vec<_>>>()?;
        Ok(Progression::from_chords(chords))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse saved progression")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize saved progression")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::Mode;
    use crate::progression::ProgressionTemplater;

    fn saved() -> (Progression, SavedProgression) {
        let scale = Scale::generate("Eb", Mode::Major).unwrap().with_sevenths();
        let mut progression = ProgressionTemplater::with_seed(1).generate(&scale, Style::Jazz, 4);
        progression.set_inversion(1, Inversion::Second);
        let saved = SavedProgression::capture(
            "Late night",
            &scale,
            &progression,
            90,
            Style::Jazz,
            RhythmPattern::Strum,
        );
        (progression, saved)
    }

    #[test]
    fn test_capture_fields() {
        let (_, saved) = saved();
        assert_eq!(saved.name, "Late night");
        assert_eq!(saved.key, "Eb major");
        assert_eq!(saved.chords.len(), 4);
        assert_eq!(saved.chords[0].symbol, "Fm7");
        assert_eq!(saved.chords[0].roman_numeral.as_deref(), Some("ii7"));
        assert_eq!(saved.chords[1].inversion, Inversion::Second);
        assert!(saved.created_at > 0);
    }

    #[test]
    fn test_restore_rebuilds_exactly() {
        let (progression, saved) = saved();
        assert_eq!(saved.restore().unwrap(), progression);
    }

    #[test]
    fn test_yaml_round_trip() {
        let (progression, saved) = saved();
        let yaml = saved.to_yaml().unwrap();
        assert!(yaml.contains("rhythm_pattern: strum"));
        assert!(yaml.contains("style: jazz"));

        let loaded = SavedProgression::from_yaml(&yaml).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.restore().unwrap(), progression);
    }

    #[test]
    fn test_restore_unknown_root() {
        let yaml = r#"
name: broken
key: C major
chords:
  - symbol: H
    root: H
    quality: major
tempo: 120
style: pop
rhythm_pattern: block
created_at: 0
"#;
        let saved = SavedProgression::from_yaml(yaml).unwrap();
        assert!(saved.restore().is_err());
    }
}
