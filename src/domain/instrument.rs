//! Instruments: sample folders with a scale of notes, and the built-in catalog.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// One step of a scale: a single sample or a chord sounding several samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Note {
    Single(String),
    Chord(Vec<String>),
}

impl Note {
    pub fn samples(&self) -> Vec<&str> {
        match self {
            Note::Single(sample) => vec![sample.as_str()],
            Note::Chord(samples) => samples.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Single(sample) => f.write_str(sample),
            Note::Chord(samples) => write!(f, "[{}]", samples.join(" ")),
        }
    }
}

pub const DEFAULT_MAX: i32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    /// Folder below the samples directory holding this instrument's samples
    pub folder: String,
    pub scale: Vec<Note>,
    /// Values below 1 silence the instrument
    pub max: i32,
}

impl Instrument {
    pub fn new(
        name: impl Into<String>,
        folder: impl Into<String>,
        scale: Vec<Note>,
        max: i32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if scale.is_empty() {
            return Err(DomainError::InvalidInstrument {
                name,
                message: "scale must hold at least one note".to_string(),
            });
        }
        Ok(Self {
            name,
            folder: folder.into(),
            scale,
            max,
        })
    }

    pub fn is_silent(&self) -> bool {
        self.max < 1
    }

    /// Note for `number`, taken modulo the scale length.
    pub fn note(&self, number: usize) -> &Note {
        &self.scale[number % self.scale.len()]
    }

    /// Sample ids for `number`: `<samples_dir>/<folder>/<note>`, several for a chord.
    /// A silent instrument yields none.
    pub fn samples(&self, number: usize, samples_dir: &Path) -> Vec<String> {
        if self.is_silent() {
            return Vec::new();
        }
        let folder = samples_dir.join(&self.folder);
        self.note(number)
            .samples()
            .into_iter()
            .map(|sample| folder.join(sample).to_string_lossy().into_owned())
            .collect()
    }
}

fn notes(names: &[&str]) -> Vec<Note> {
    names.iter().map(|n| Note::Single((*n).to_string())).collect()
}

fn chords(chords: &[&[&str]]) -> Vec<Note> {
    chords
        .iter()
        .map(|chord| Note::Chord(chord.iter().map(|n| (*n).to_string()).collect()))
        .collect()
}

pub const C_MAJOR: &[&str] = &["C", "D", "E", "F", "G", "A", "B", "C2"];
pub const E_MAJOR: &[&str] = &["E", "Fs", "G#", "A", "B", "C2s", "D2s", "E2"];
pub const PENTATONIC: &[&str] = &["Cs", "Ds", "Fs", "Gs", "As"];
pub const DIATONIC: &[&str] = &["F", "C", "G", "D", "F", "A", "E", "B"];
pub const CHORDS_1451: &[&[&str]] = &[
    &["C", "E", "G"],
    &["F", "A", "C"],
    &["G", "B", "D"],
    &["C", "E", "G"],
];
const DRUMS: &[&str] = &["2", "3", "5", "7", "8", "10", "11"];
const CYMBALS: &[&str] = &["0", "1", "2"];
const SAX_S: &[&str] = &["B", "C", "D", "E", "F", "G", "C2", "A"];
const PIANO_CHORDS: &[&str] = &["A", "C", "F", "G", "C"];

fn entry(name: &str, folder: &str, scale: Vec<Note>, max: i32) -> Instrument {
    Instrument {
        name: name.to_string(),
        folder: folder.to_string(),
        scale,
        max,
    }
}

/// The built-in instruments. Every scale is non-empty.
pub fn catalog() -> Vec<Instrument> {
    vec![
        entry("drums", "drums", notes(DRUMS), 11),
        entry("cymbals", "cymbals", notes(CYMBALS), 3),
        entry("tom", "tom", notes(C_MAJOR), DEFAULT_MAX),
        entry("trombone", "trombone", notes(C_MAJOR), DEFAULT_MAX),
        entry("trumpet", "trumpet", notes(C_MAJOR), DEFAULT_MAX),
        entry("sax", "sax", notes(C_MAJOR), DEFAULT_MAX),
        entry("sax_s", "sax_s", notes(SAX_S), DEFAULT_MAX),
        entry("voice", "voice", notes(C_MAJOR), DEFAULT_MAX),
        entry("voice_chords", "voice", chords(CHORDS_1451), 3),
        entry("squeak", "squeak", notes(C_MAJOR), DEFAULT_MAX),
        entry("dancers", "dancers", notes(C_MAJOR), -1),
        entry("guitar", "guitar", notes(C_MAJOR), DEFAULT_MAX),
        entry("classic_guitar", "classicguitar", notes(PENTATONIC), 5),
        entry("guitar_chords", "guitar", chords(CHORDS_1451), 3),
        entry("elecbass", "elecbass", notes(C_MAJOR), DEFAULT_MAX),
        entry("bass", "bass", notes(C_MAJOR), DEFAULT_MAX),
        entry("bass_chords", "bass", chords(CHORDS_1451), 3),
        entry("doublebass2", "doublebass2", notes(C_MAJOR), DEFAULT_MAX),
        entry("banjo", "banjo", notes(C_MAJOR), DEFAULT_MAX),
        entry("banjo2", "banjo2", notes(C_MAJOR), DEFAULT_MAX),
        entry("piano_chords", "pianochoords", notes(PIANO_CHORDS), 5),
    ]
}

pub fn by_name(name: &str) -> DomainResult<Instrument> {
    catalog()
        .into_iter()
        .find(|instrument| instrument.name == name)
        .ok_or_else(|| DomainError::UnknownInstrument(name.to_string()))
}
