//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/towers/towers.toml`
//! 3. Local config: `<dir>/.towers.toml`
//! 4. Environment variables: `TOWERS_*` prefix, `__` between section and key
//!    (e.g. `TOWERS_GEOMETRY__SPACING=0.1`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::sonification::{NoteSource, PlaybackMode};
use crate::application::timeline::Timing;
use crate::application::ApplicationError;
use crate::domain::{Geometry, Palette};

/// Sound selection and sample locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundSettings {
    /// Play instrument and effect samples at all
    pub enabled: bool,
    pub mode: PlaybackMode,
    pub note_source: NoteSource,
    /// Catalog names of the instruments in play
    pub instruments: Vec<String>,
    /// One probability (simultaneous) or weight (alternating) per instrument
    pub probabilities: Vec<f64>,
    /// Gain per instrument; missing entries play at 0
    pub gains: Vec<f64>,
    pub samples_dir: PathBuf,
    pub effects_dir: PathBuf,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PlaybackMode::Simultaneous,
            note_source: NoteSource::Nesting,
            instruments: vec!["piano_chords".into(), "drums".into(), "bass".into()],
            probabilities: vec![0.9, 0.4, 0.6],
            gains: vec![0.0, -6.0, -3.0],
            samples_dir: PathBuf::from("./instruments"),
            effects_dir: PathBuf::from("./sounds"),
            seed: None,
        }
    }
}

/// Which indicators accompany the towers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    pub palette: Palette,
    pub level: bool,
    pub children: bool,
    pub expression: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            palette: Palette::Ocean,
            level: true,
            children: true,
            expression: true,
        }
    }
}

/// Unified configuration for towers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub geometry: Geometry,
    pub timing: Timing,
    pub sound: SoundSettings,
    pub display: DisplaySettings,
}

/// Get the XDG config directory for towers.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "towers").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("towers.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".towers.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is kept as is.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.towers.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                builder = builder.add_source(File::from(local_path).required(true));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TOWERS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sound.instruments")
                .with_list_parse_key("sound.probabilities")
                .with_list_parse_key("sound.gains"),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();
        settings.validate()?;
        Ok(settings)
    }

    /// Expand shell variables and tilde in the sample directories.
    fn expand_paths(&mut self) {
        self.sound.samples_dir = expand_path(&self.sound.samples_dir);
        self.sound.effects_dir = expand_path(&self.sound.effects_dir);
    }

    /// Reject geometry and sound settings the layout cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let g = &self.geometry;
        let invalid = |message: String| Err(ApplicationError::Config { message });

        if g.base_width <= 0.0 || g.base_height <= 0.0 {
            return invalid(format!(
                "geometry base must be positive, got {}x{}",
                g.base_width, g.base_height
            ));
        }
        if g.spacing < 0.0 {
            return invalid(format!("geometry.spacing must not be negative: {}", g.spacing));
        }
        if !(g.floor_ratio > 0.0 && g.floor_ratio <= 1.0) {
            return invalid(format!(
                "geometry.floor_ratio must be in (0, 1]: {}",
                g.floor_ratio
            ));
        }
        if self.sound.probabilities.len() != self.sound.instruments.len() {
            return invalid(format!(
                "sound: {} instruments but {} probabilities",
                self.sound.instruments.len(),
                self.sound.probabilities.len()
            ));
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# towers configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/towers/towers.toml
#   Local:  <dir>/.towers.toml
#   Env:    TOWERS_<SECTION>__<KEY>, e.g. TOWERS_SOUND__MODE=alternating

[geometry]
# spacing = 0.06        # gap between sibling blocks
# floor_ratio = 0.9     # height multiplier per level
# width_ratio = 0.5
# base_width = 7.0      # implicit root (ground base)
# base_height = 1.0
# corner_radius = 0.3
# corner_ratio = 0.9
# shrink_ratio = 0.45   # used by successive
# stage_edge = 7.0
# ground_level = -2.0

[timing]
# transition = 0.05
# wiggle_pause = 0.05
# step = 0.5
# drop = 0.4
# resize_step = 0.1
# recenter = 0.1
# highlight_pause = 3.0
# settle_pause = 1.0
# sound_time = 0.2

[sound]
# enabled = true
# mode = "simultaneous"     # or "alternating"
# note_source = "nesting"   # or "children"
# instruments = ["piano_chords", "drums", "bass"]
# probabilities = [0.9, 0.4, 0.6]
# gains = [0.0, -6.0, -3.0]
# samples_dir = "./instruments"
# effects_dir = "./sounds"
# seed = 42

[display]
# palette = "ocean"         # ocean, dawn or meadow
# level = true
# children = true
# expression = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
