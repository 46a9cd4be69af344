use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task tracker CLI backed by a local JSON store or a remote AvenStudio
/// backend. Local storage defaults to `<data_local_dir>/avenstudio`.
#[derive(Parser)]
#[command(name = "aven", version, about = "AvenStudio task tracking CLI")]
pub struct Cli {
    /// Base URL of a remote backend (falls back to $AVEN_REMOTE_URL;
    /// unset means local storage).
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Local data directory (falls back to $AVEN_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
