//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// Towers within towers: bracket expressions as nested towers, with sonified animations
#[derive(Parser, Debug)]
#[command(name = "towers")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .towers.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Seed for the random source (overrides sound.seed)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an expression and show the tower tree
    Parse {
        /// Bracket expression, e.g. "(()(()))"
        expression: String,
        /// Show absolute placements of every block
        #[arg(long)]
        layout: bool,
    },

    /// Apply an operation to a parsed expression and print its timeline
    Schedule {
        /// Bracket expression
        expression: String,
        /// Operation to apply
        #[arg(short, long, value_enum, default_value_t = OpArg::Raise)]
        op: OpArg,
        /// Path of the operated node as comma separated child indices (default: root)
        #[arg(long, value_delimiter = ',')]
        at: Vec<usize>,
        /// First child index for swap
        #[arg(long, default_value_t = 0)]
        i: usize,
        /// Second child index for swap
        #[arg(long, default_value_t = 1)]
        j: usize,
        /// select: keep children deeper than this
        #[arg(long, conflicts_with = "min_children")]
        deeper_than: Option<usize>,
        /// select: keep children with at least this many children
        #[arg(long)]
        min_children: Option<usize>,
        /// Base height for successive and raise-towers
        #[arg(long)]
        height: Option<f64>,
        #[command(flatten)]
        playback: PlaybackArgs,
    },

    /// Sonify a bracket string character by character
    PlayString {
        /// Bracket string
        expression: String,
        /// Catalog instrument
        #[arg(short, long, default_value = "piano_chords")]
        instrument: String,
        /// Seconds per character (overrides timing.sound_time)
        #[arg(long)]
        sound_time: Option<f64>,
        #[command(flatten)]
        playback: PlaybackArgs,
    },

    /// List the instrument catalog
    Instruments,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PlaybackArgs {
    /// Print the timeline as JSON
    #[arg(long)]
    pub json: bool,
    /// Dispatch the timeline to the renderer, audio and label sinks
    #[arg(long)]
    pub play: bool,
    /// Wait for each transition in real time while playing
    #[arg(long, requires = "play")]
    pub realtime: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpArg {
    Raise,
    RaiseTowers,
    MergeForward,
    Union,
    Dedup,
    DedupRecursive,
    Swap,
    Select,
    Resize,
    Successive,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a template configuration file
    Template,
    /// Show configuration file locations
    Path,
}
