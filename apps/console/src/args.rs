use std::path::PathBuf;

use clap::Parser;

/// Interactive console for the lighting control panel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ConsoleArgs {
    /// Path to the engine configuration file.
    #[arg(short, long, default_value = "glowboard.yaml")]
    pub config: PathBuf,

    /// Broker or bridge URL, overriding the configuration file.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Load presets from a JSON file instead of the built-in table.
    #[arg(short, long)]
    pub presets: Option<PathBuf>,
}
