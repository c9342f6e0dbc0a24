//! Taskboard: boards, lists and cards kept as plain YAML files.
//!
//! # Usage
//!
//! ```text
//! taskboard [--root <dir>] board list
//! taskboard board show <board>
//! taskboard board create <board> --name <name> --list todo:Todo --list done:Done
//! taskboard board rename <board> <name>
//! taskboard board delete <board>
//! taskboard card list <board> [--archived] [--json]
//! taskboard card show <board> <card>
//! taskboard card add <board> --title <title> --list <list> [--label <l>]...
//! taskboard card edit <board> <card> [--title ..] [--description ..] [--label ..]...
//! taskboard card move <board> <card> --list <list> [--order <n>]
//! taskboard card archive <board> <card> [--restore]
//! taskboard card delete <board> <card>
//! taskboard watch [--debounce-ms 500]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{board::BoardCommand, card::CardCommand, watch::WatchArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "taskboard",
    version,
    about = "File-backed task boards with live change notifications",
    long_about = None,
)]
struct Cli {
    /// Store root holding `boards/`.
    #[arg(long, global = true, env = "TASKBOARD_ROOT", default_value = ".tasks")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, inspect and remove boards.
    Board {
        #[command(subcommand)]
        command: BoardCommand,
    },

    /// Create, edit, move and archive cards.
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },

    /// Stream change notifications for the store as JSON lines.
    Watch(WatchArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    taskboard_live::init_tracing();
    match cli.command {
        Commands::Board { command } => commands::board::run(&cli.root, command),
        Commands::Card { command } => commands::card::run(&cli.root, command),
        Commands::Watch(args) => args.run(&cli.root),
    }
}
