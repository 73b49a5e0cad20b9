//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::backend::Backends;
use crate::capture::{is_valid_duration, MAX_DURATION_SECS};
use crate::commands::{self, Context};
use crate::config::{get_config_path, CamicConfig};
use crate::logging;
use crate::setup;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Discover paired USB camera/microphone units and capture from them
#[derive(Parser)]
#[command(name = "camic")]
#[command(version)]
#[command(long_about = "Discover paired USB camera/microphone units and capture stills, audio and\naudio+video recordings from them.\n\nDEFAULT COMMAND:\n    If no command is specified, 'interactive' is used by default.\n\nEXAMPLES:\n    # Show microphones, cameras and how they pair up\n    $ camic list-devices\n\n    # Record pair #1 for 10 seconds\n    $ camic record --pair 1 -d 10\n\n    # Record every matched microphone at once\n    $ camic record-all\n\n    # Save a frame from camera 0\n    $ camic snapshot --camera 0 -o desk.png")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/camic/camic.toml\n    Logs:               ~/.local/state/camic/camic.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a device and capture from a menu (default)
    #[command(visible_alias = "i")]
    Interactive,

    /// List matched microphones, cameras and their pairing
    #[command(name = "list-devices", visible_alias = "ls")]
    ListDevices,

    /// Save a single frame from a camera as PNG
    Snapshot {
        /// Camera index
        #[arg(short, long, value_name = "ID")]
        camera: u32,

        /// Output file (default: captura_cam<ID>.png in the output directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Record one microphone to a WAV file
    #[command(name = "record-audio")]
    RecordAudio {
        /// Microphone id as shown by list-devices
        #[arg(
            short,
            long,
            value_name = "ID",
            required_unless_present = "name",
            conflicts_with = "name"
        )]
        mic: Option<u32>,

        /// Pick the first matched microphone whose name contains this text
        #[arg(short, long, value_name = "TEXT")]
        name: Option<String>,

        /// Duration in seconds (default from config)
        #[arg(short, long, value_name = "SECS")]
        duration: Option<f64>,

        /// Output file (default: grabacion_mic_<ID>.wav in the output directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Record several microphones at the same time
    ///
    /// Without --mic, every microphone matched by discovery is recorded.
    #[command(name = "record-all")]
    RecordAll {
        /// Microphone ids (repeatable)
        #[arg(short, long = "mic", value_name = "ID")]
        mics: Vec<u32>,

        /// Duration in seconds (default from config)
        #[arg(short, long, value_name = "SECS")]
        duration: Option<f64>,
    },

    /// Record video and audio from a discovered pair
    ///
    /// Pairs without a camera record audio only.
    #[command(visible_alias = "r")]
    Record {
        /// Pair number as shown by list-devices (1 = first)
        #[arg(short, long, value_name = "N")]
        pair: usize,

        /// Duration in seconds (default from config)
        #[arg(short, long, value_name = "SECS")]
        duration: Option<f64>,
    },

    /// Show a camera live in the terminal (q, Esc or Ctrl+C to quit)
    #[command(visible_alias = "w")]
    Watch {
        /// Camera index
        #[arg(short, long, value_name = "ID")]
        camera: u32,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   camic completions bash > camic.bash
    ///   camic completions zsh > _camic
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If the configuration cannot be written or parsed
/// - If command execution fails
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        generate(*shell, &mut Cli::command(), "camic", &mut io::stdout());
        return Ok(());
    }

    logging::init_logging()?;

    let config_path = get_config_path()?;
    if setup::ensure_config(&config_path)? {
        println!("Created default configuration at {}", config_path.display());
    }

    if let Some(Commands::Config) = &cli.command {
        return commands::handle_config();
    }

    let config = CamicConfig::load_from(&config_path)?;
    validate_durations(&cli.command)?;
    std::fs::create_dir_all(&config.capture.output_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create output directory {}: {e}",
            config.capture.output_dir.display()
        )
    })?;

    let ctx = Context::new(Backends::native(), config);

    match cli.command {
        None | Some(Commands::Interactive) => {
            if let Err(e) = commands::handle_interactive(&ctx) {
                // cliclack already printed the cancellation
                if let Some(io_err) = e.downcast_ref::<io::Error>() {
                    if io_err.kind() == io::ErrorKind::Interrupted {
                        process::exit(0);
                    }
                }
                return Err(e);
            }
        }
        Some(Commands::ListDevices) => commands::handle_list_devices(&ctx)?,
        Some(Commands::Snapshot { camera, output }) => {
            commands::handle_snapshot(&ctx, camera, output)?;
        }
        Some(Commands::RecordAudio {
            mic,
            name,
            duration,
            output,
        }) => {
            let mic_id = match (mic, name) {
                (Some(id), _) => id,
                (None, Some(name)) => commands::record_audio::resolve_microphone(&ctx, &name)?,
                (None, None) => unreachable!("clap requires --mic or --name"),
            };
            commands::handle_record_audio(&ctx, mic_id, duration, output)?;
        }
        Some(Commands::RecordAll { mics, duration }) => {
            commands::handle_record_all(&ctx, mics, duration)?;
        }
        Some(Commands::Record { pair, duration }) => {
            commands::handle_record(&ctx, pair, duration)?;
        }
        Some(Commands::Watch { camera }) => commands::handle_watch(&ctx, camera)?,
        Some(Commands::Config) | Some(Commands::Completions { .. }) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

/// Rejects durations that are not positive or exceed the capture limit.
fn validate_durations(command: &Option<Commands>) -> anyhow::Result<()> {
    let duration = match command {
        Some(Commands::RecordAudio { duration, .. })
        | Some(Commands::RecordAll { duration, .. })
        | Some(Commands::Record { duration, .. }) => *duration,
        _ => None,
    };

    match duration {
        Some(secs) if !is_valid_duration(secs) => anyhow::bail!(
            "Duration must be between 0 and {MAX_DURATION_SECS} seconds, got {secs}"
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_interactive() {
        let cli = Cli::try_parse_from(["camic"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_record_all_accepts_repeated_mics() {
        let cli = Cli::try_parse_from(["camic", "record-all", "-m", "1", "--mic", "3", "-d", "2.5"])
            .unwrap();
        match cli.command {
            Some(Commands::RecordAll { mics, duration }) => {
                assert_eq!(mics, vec![1, 3]);
                assert_eq!(duration, Some(2.5));
            }
            _ => panic!("expected record-all"),
        }
    }

    #[test]
    fn test_record_audio_needs_exactly_one_selector() {
        assert!(Cli::try_parse_from(["camic", "record-audio"]).is_err());
        assert!(Cli::try_parse_from(["camic", "record-audio", "-m", "1", "-n", "USB"]).is_err());
        assert!(Cli::try_parse_from(["camic", "record-audio", "-n", "2- USB"]).is_ok());
    }

    #[test]
    fn test_validate_durations() {
        let ok = Cli::try_parse_from(["camic", "record", "--pair", "1", "-d", "3"]).unwrap();
        assert!(validate_durations(&ok.command).is_ok());

        let zero = Cli::try_parse_from(["camic", "record-audio", "-m", "0", "-d", "0"]).unwrap();
        assert!(validate_durations(&zero.command).is_err());

        for huge in ["inf", "1e15", "3601"] {
            let cli = Cli::try_parse_from(["camic", "record-all", "-d", huge]).unwrap();
            assert!(validate_durations(&cli.command).is_err(), "{huge} accepted");
        }

        let none = Cli::try_parse_from(["camic", "list-devices"]).unwrap();
        assert!(validate_durations(&none.command).is_ok());
    }
}
