use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "magictimer", version, about = "Magic Timer CLI")]
struct Cli {
    /// Configuration file (defaults to $MAGICTIMER_CONFIG, then built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the activities a timer can be set for
    Activities,
    /// List the companion characters
    Characters,
    /// List the one-tap duration presets
    Presets,
    /// Step a duration by whole minutes (wraps around at the ends)
    Adjust {
        /// Current duration in minutes
        minutes: u32,
        /// Minutes to add (negative to subtract)
        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },
    /// Run a countdown in the terminal
    Run(commands::run::RunArgs),
    /// Configuration inspection
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Activities => commands::catalog::activities(),
        Commands::Characters => commands::catalog::characters(),
        Commands::Presets => commands::duration::presets(),
        Commands::Adjust { minutes, delta } => commands::duration::adjust(minutes, delta),
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Config { action } => commands::config::run(action, config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
