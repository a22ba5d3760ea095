use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use snaprotate::cli::{
    handle_backup_command, handle_config_command, handle_list_command, handle_rotate_command,
    handle_status_command, BackupArgs, Phases, RotateArgs,
};
use snaprotate::config::{ConfigPaths, Settings};
use snaprotate::logging::{self, LogFormat};
use snaprotate::tools::SystemRunner;

#[derive(Parser)]
#[command(
    name = "snaprotate",
    author = "Kaylee Beyene",
    version,
    about = "Hard-linked snapshot backups with multi-level history rotation",
    long_about = "snaprotate stages a new snapshot next to the live one with rsync \
                  --link-dest, promotes it to `current`, and rotates older snapshots \
                  through history levels governed by a count or age per level."
)]
struct Cli {
    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// Log line format: human or json
    #[arg(long, value_name = "FORMAT", default_value = "human", global = true)]
    log_format: LogFormat,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH", env = "SNAPROTATE_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the sources into the target, then rotate its history
    Run(BackupArgs),

    /// Back up the sources into the target without rotating
    Backup(BackupArgs),

    /// Rotate the target's history without backing up
    Rotate(RotateArgs),

    /// List the history entries of a target
    #[command(alias = "ls")]
    List {
        /// Target directory
        target: String,

        /// Retention policy used to label the levels
        #[arg(short, long, value_name = "LIST", allow_hyphen_values = true)]
        policy: Option<String>,
    },

    /// Show the state of a target
    Status {
        /// Target directory
        target: String,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = i8::try_from(i16::from(cli.verbose) - i16::from(cli.quiet)).unwrap_or(0);
    logging::init(cli.log_format, verbosity);

    let paths = match cli.config {
        Some(file) => ConfigPaths::with_settings_file(file),
        None => ConfigPaths::new()?,
    };
    let settings = Settings::load_or_default(&paths)?;
    let runner = SystemRunner;

    match cli.command {
        Commands::Run(args) => handle_backup_command(&settings, &runner, Phases::Full, args)?,
        Commands::Backup(args) => {
            handle_backup_command(&settings, &runner, Phases::BackupOnly, args)?
        }
        Commands::Rotate(args) => handle_rotate_command(&settings, &runner, args)?,
        Commands::List { target, policy } => {
            handle_list_command(&settings, &target, policy.as_deref())?
        }
        Commands::Status { target } => handle_status_command(&target)?,
        Commands::Config => handle_config_command(&paths, &settings)?,
    }

    Ok(())
}
