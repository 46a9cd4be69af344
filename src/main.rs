use clap::Parser;

use avenstudio::cli::Cli;
use avenstudio::cmd::{self, Commands};
use avenstudio::store;

fn main() {
    let cli = Cli::parse();

    // Completions don't need a store.
    if let Commands::Completions { shell } = cli.command {
        cmd::cmd_completions(shell);
        return;
    }

    let remote = cli
        .remote
        .or_else(|| std::env::var("AVEN_REMOTE_URL").ok());

    let store = match store::open(remote, cli.data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open store: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cmd::dispatch(store.as_ref(), cli.command) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
