//! `taskboard watch`: print change notifications as JSON lines until Ctrl-C.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use taskboard_core::layout;
use taskboard_live::WatcherConfig;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Quiet period before a burst of changes is announced.
    #[arg(long, default_value_t = 500, value_name = "MS")]
    pub debounce_ms: u64,
}

impl WatchArgs {
    pub fn run(&self, root: &Path) -> Result<()> {
        let boards = layout::boards_dir(root);
        std::fs::create_dir_all(&boards)
            .with_context(|| format!("failed to create {}", boards.display()))?;

        let config = WatcherConfig {
            debounce: Duration::from_millis(self.debounce_ms),
        };
        eprintln!("Watching {} (Ctrl-C to stop)", root.display());
        taskboard_live::start_blocking(root, config, |payload| {
            println!("{}", String::from_utf8_lossy(&payload));
        })
        .context("watcher failed")
    }
}
