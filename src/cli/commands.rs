//! Command dispatch: runs the subcommands against the service container

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{Operation, Selection};
use crate::application::{dispatch, Timeline};
use crate::cli::args::{Cli, Commands, ConfigCommands, OpArg, PlaybackArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::instrument as instruments;
use crate::domain::{LayoutEngine, MergeOrder};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
#[instrument(level = "debug", skip(cli))]
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Parse { expression, layout }) => cmd_parse(cli, expression, *layout),
        Some(Commands::Schedule {
            expression,
            op,
            at,
            i,
            j,
            deeper_than,
            min_children,
            height,
            playback,
        }) => {
            let operation = operation_from(*op, *i, *j, *deeper_than, *min_children, *height)?;
            cmd_schedule(cli, expression, at, &operation, *playback)
        }
        Some(Commands::PlayString {
            expression,
            instrument,
            sound_time,
            playback,
        }) => cmd_play_string(cli, expression, instrument, *sound_time, *playback),
        Some(Commands::Instruments) => cmd_instruments(),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "towers", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".to_string(),
        )),
    }
}

fn config_dir(cli: &Cli) -> Option<PathBuf> {
    cli.config_dir
        .clone()
        .or_else(|| env::current_dir().ok())
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = config_dir(cli);
    let settings = Settings::load(dir.as_deref())?;
    debug!(?dir, "settings loaded");
    Ok(settings)
}

fn operation_from(
    op: OpArg,
    i: usize,
    j: usize,
    deeper_than: Option<usize>,
    min_children: Option<usize>,
    height: Option<f64>,
) -> CliResult<Operation> {
    let operation = match op {
        OpArg::Raise => Operation::Raise,
        OpArg::RaiseTowers => Operation::RaiseTowers { height },
        OpArg::MergeForward => Operation::Merge {
            order: MergeOrder::Forward,
        },
        OpArg::Union => Operation::Union,
        OpArg::Dedup => Operation::Dedup,
        OpArg::DedupRecursive => Operation::DedupRecursive,
        OpArg::Swap => Operation::Swap { i, j },
        OpArg::Select => Operation::Select(match (deeper_than, min_children) {
            (Some(depth), _) => Selection::DeeperThan(depth),
            (None, Some(count)) => Selection::FanoutAtLeast(count),
            (None, None) => Selection::NonEmpty,
        }),
        OpArg::Resize => Operation::Resize,
        OpArg::Successive => match height {
            Some(height) if height > 0.0 => Operation::Successive { height },
            Some(height) => {
                return Err(CliError::InvalidArgs(format!(
                    "--height must be positive, got {height}"
                )))
            }
            None => {
                return Err(CliError::InvalidArgs(
                    "successive needs --height".to_string(),
                ))
            }
        },
    };
    Ok(operation)
}

fn cmd_parse(cli: &Cli, expression: &str, layout: bool) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings, false)?;
    let tower = container.scene.build(expression)?;

    output::info(&tower.to_tree_string());
    output::action("expression", &tower.inner_expression());
    output::detail(&format!(
        "depth {}, {} blocks",
        tower.depth(),
        tower.count_descendants()
    ));

    if layout {
        output::header("placements");
        let engine = LayoutEngine::new(container.settings.geometry);
        for node in engine.place_on_stage(&tower) {
            output::detail(&output::placement_line(&node));
        }
    }
    Ok(())
}

fn cmd_schedule(
    cli: &Cli,
    expression: &str,
    at: &[usize],
    operation: &Operation,
    playback: PlaybackArgs,
) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings, playback.realtime)?;
    let mut scene = container.scene.build(expression)?;
    let mut rng = container.rng(cli.seed);

    let outcome = container.scene.apply(&mut scene, at, operation, &mut rng)?;

    if playback.json {
        print_json(&outcome.timeline)?;
    } else {
        output::action("result", &scene.inner_expression());
        print_timeline(&outcome.timeline);
    }
    if playback.play {
        play(&container, &outcome.timeline)?;
    }
    Ok(())
}

fn cmd_play_string(
    cli: &Cli,
    expression: &str,
    instrument_name: &str,
    sound_time: Option<f64>,
    playback: PlaybackArgs,
) -> CliResult<()> {
    let mut settings = load_settings(cli)?;
    if let Some(sound_time) = sound_time {
        if sound_time < 0.0 {
            return Err(CliError::InvalidArgs(format!(
                "--sound-time must not be negative, got {sound_time}"
            )));
        }
        settings.timing.sound_time = sound_time;
    }
    let container = ServiceContainer::new(settings, playback.realtime)?;
    let timeline = container.scene.play_string(expression, instrument_name)?;

    if playback.json {
        print_json(&timeline)?;
    } else {
        print_timeline(&timeline);
    }
    if playback.play {
        play(&container, &timeline)?;
    }
    Ok(())
}

fn cmd_instruments() -> CliResult<()> {
    output::header("instruments");
    for instrument in instruments::catalog() {
        let scale: Vec<String> = instrument.scale.iter().map(ToString::to_string).collect();
        let status = if instrument.is_silent() {
            " (silent)"
        } else {
            ""
        };
        output::detail(&format!(
            "{:<14} {:<10} {} notes{}: {}",
            instrument.name,
            instrument.folder,
            scale.len(),
            status,
            scale.join(" ")
        ));
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("configuration files");
            match global_config_path() {
                Some(path) => output::detail(&format!(
                    "global: {} {}",
                    path.display(),
                    exists_marker(&path)
                )),
                None => output::warning("no home directory, global config unavailable"),
            }
            if let Some(dir) = config_dir(cli) {
                let path = local_config_path(&dir);
                output::detail(&format!(
                    "local:  {} {}",
                    path.display(),
                    exists_marker(&path)
                ));
            }
        }
    }
    Ok(())
}

fn exists_marker(path: &std::path::Path) -> &'static str {
    if path.exists() {
        "(found)"
    } else {
        "(missing)"
    }
}

fn print_timeline(timeline: &Timeline) {
    let title = match timeline.op {
        Some(op) => format!("{:?}", op),
        None => "string".to_string(),
    };
    output::header(&format!(
        "{}: {} events, {:.2}s",
        title,
        timeline.len(),
        timeline.total_duration()
    ));
    for (index, event) in timeline.iter().enumerate() {
        output::info(&output::event_line(index, event));
    }
}

fn print_json(timeline: &Timeline) -> CliResult<()> {
    write_json(timeline, io::stdout().lock())
}

fn write_json(timeline: &Timeline, mut out: impl Write) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut out, timeline).map_err(|e| {
        if e.is_io() {
            InfraError::io("write timeline", e.into())
        } else {
            InfraError::Serialize {
                message: e.to_string(),
            }
        }
    })?;
    writeln!(out).map_err(|e| InfraError::io("write timeline", e))?;
    Ok(())
}

fn play(container: &ServiceContainer, timeline: &Timeline) -> CliResult<()> {
    dispatch(
        timeline,
        container.renderer.as_ref(),
        container.audio.as_ref(),
        container.labels.as_ref(),
    )?;
    Ok(())
}
