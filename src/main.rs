use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use hark::app::{App, run_text};
use hark::config::Config;
use hark::launcher::server;
use hark::logging::init_logging;
use hark::store::Store;

#[derive(Parser)]
#[command(version, about = "Voice assistant with a local app launcher")]
struct Cli {
    /// Configuration file, defaults to <config dir>/hark/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen on the microphone while the hotkey is active (default)
    Listen,
    /// Read commands from stdin instead of the microphone
    Type,
    /// Run the application launcher backend
    Serve {
        /// Overrides `launcher.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print saved notes
    Notes,
    /// Print saved reminders
    Reminders,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::from_file(path).context(format!("Reading config {}", path.display()))
        }
        None => Config::load_or_write_default(None),
    }
}

fn print_list(title: &str, items: &[String]) {
    println!("{title}:");
    for item in items {
        println!("- {item}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Commands::Listen) {
        Commands::Listen => {
            let mut app = App::new(config).await?;
            app.run().await
        }
        Commands::Type => run_text(&config).await,
        Commands::Serve { bind } => {
            let mut launcher = config.launcher;
            if let Some(bind) = bind {
                launcher.bind = bind;
            }
            info!("Serving {} launchable apps", launcher.apps.len());
            server::serve(&launcher).await
        }
        Commands::Notes => {
            print_list("Notes", Store::open(&config.paths.store_path).notes());
            Ok(())
        }
        Commands::Reminders => {
            print_list("Reminders", Store::open(&config.paths.store_path).reminders());
            Ok(())
        }
    }
}
