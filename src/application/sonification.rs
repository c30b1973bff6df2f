//! Maps tower shape to instrument and note selections.

use std::path::PathBuf;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Instrument;

/// How instruments are picked for each trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Every instrument sounds independently with its own probability
    #[default]
    Simultaneous,
    /// At most one instrument, drawn by cumulative weight
    Alternating,
}

/// Which tower measure selects the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSource {
    /// The depth of the sounding tower
    #[default]
    Nesting,
    /// The number of children of the sounding tower
    Children,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundCue {
    pub sample: String,
    pub gain: f64,
}

/// Outcome of one sonified step: the selected instrument indices and what they play.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trigger {
    pub instruments: Vec<usize>,
    pub cues: Vec<SoundCue>,
}

/// Turns a (depth, fanout) pair into sounds.
pub trait InstrumentPlayer: Send + Sync {
    fn play(&self, depth: usize, fanout: usize, rng: &mut dyn RngCore) -> Trigger;
}

/// Player that never sounds and draws nothing from the random source.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl InstrumentPlayer for SilentPlayer {
    fn play(&self, _depth: usize, _fanout: usize, _rng: &mut dyn RngCore) -> Trigger {
        Trigger::default()
    }
}

/// First index whose running weight sum exceeds `draw`; `None` when the draw
/// lies beyond the total weight.
pub fn select_weighted(weights: &[f64], draw: f64) -> Option<usize> {
    let mut total = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        total += weight;
        if total > draw {
            return Some(index);
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct SonificationMapper {
    instruments: Vec<Instrument>,
    probabilities: Vec<f64>,
    gains: Vec<f64>,
    mode: PlaybackMode,
    source: NoteSource,
    samples_dir: PathBuf,
}

impl SonificationMapper {
    /// `probabilities` must give one value per instrument. Missing gains default to 0.
    pub fn new(
        instruments: Vec<Instrument>,
        probabilities: Vec<f64>,
        gains: Vec<f64>,
        mode: PlaybackMode,
        source: NoteSource,
        samples_dir: PathBuf,
    ) -> ApplicationResult<Self> {
        if probabilities.len() != instruments.len() {
            return Err(ApplicationError::Config {
                message: format!(
                    "{} instruments but {} probabilities",
                    instruments.len(),
                    probabilities.len()
                ),
            });
        }
        let mut gains = gains;
        gains.resize(instruments.len(), 0.0);
        Ok(Self {
            instruments,
            probabilities,
            gains,
            mode,
            source,
            samples_dir,
        })
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn select_instruments<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        match self.mode {
            PlaybackMode::Simultaneous => self
                .probabilities
                .iter()
                .enumerate()
                .filter(|(_, &p)| rng.gen::<f64>() < p)
                .map(|(index, _)| index)
                .collect(),
            PlaybackMode::Alternating => {
                let draw = rng.gen::<f64>();
                select_weighted(&self.probabilities, draw).into_iter().collect()
            }
        }
    }

    /// Note index for `instrument`: depth or fanout, modulo its scale length.
    pub fn note_index(&self, instrument: &Instrument, depth: usize, fanout: usize) -> usize {
        let number = match self.source {
            NoteSource::Nesting => depth,
            NoteSource::Children => fanout,
        };
        number % instrument.scale.len()
    }

    pub fn cues(&self, selected: &[usize], depth: usize, fanout: usize) -> Vec<SoundCue> {
        selected
            .iter()
            .filter_map(|&index| self.instruments.get(index).map(|i| (index, i)))
            .flat_map(|(index, instrument)| {
                let note = self.note_index(instrument, depth, fanout);
                let gain = self.gains[index];
                instrument
                    .samples(note, &self.samples_dir)
                    .into_iter()
                    .map(move |sample| SoundCue { sample, gain })
            })
            .collect()
    }
}

impl InstrumentPlayer for SonificationMapper {
    fn play(&self, depth: usize, fanout: usize, rng: &mut dyn RngCore) -> Trigger {
        let instruments = self.select_instruments(rng);
        let cues = self.cues(&instruments, depth, fanout);
        trace!(depth, fanout, ?instruments, cues = cues.len(), "play");
        Trigger { instruments, cues }
    }
}
