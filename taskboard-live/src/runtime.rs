use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WatcherConfig;
use crate::error::{io_err, LiveError};
use crate::hub::{BroadcastHub, ChannelConnection};
use crate::watcher::ChangeWatcher;

/// A running watcher wired to its own hub.
///
/// The hub is handed to whatever accepts client connections; the watcher
/// publishes into it until [`LiveSync::shutdown`].
pub struct LiveSync {
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
    watcher: JoinHandle<Result<(), LiveError>>,
}

impl LiveSync {
    /// Spawn the watcher on the current tokio runtime.
    pub fn start(root: impl Into<PathBuf>, config: WatcherConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let cancel = CancellationToken::new();
        let watcher = {
            let watcher = ChangeWatcher::new(hub.clone(), root).with_config(config);
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.run(cancel).await })
        };
        Self {
            hub,
            cancel,
            watcher,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Token that stops the watcher when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn shutdown(self) -> Result<(), LiveError> {
        self.cancel.cancel();
        handle_join("watcher", self.watcher.await)
    }
}

/// Start a tokio runtime and stream change payloads to `sink` until Ctrl-C.
pub fn start_blocking(
    root: &Path,
    config: WatcherConfig,
    sink: impl FnMut(Vec<u8>),
) -> Result<(), LiveError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(root.to_path_buf(), config, sink))
}

/// Watch `root`, forwarding every published payload to `sink`, until Ctrl-C.
///
/// Returns early, with the watcher's own result, if the watcher stops first.
pub async fn run(
    root: PathBuf,
    config: WatcherConfig,
    sink: impl FnMut(Vec<u8>),
) -> Result<(), LiveError> {
    let live = LiveSync::start(root, config);
    let stop = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl-c handler failed");
        }
        tracing::info!("received ctrl-c, stopping watcher");
    };
    forward(live, stop, sink).await
}

async fn forward(
    mut live: LiveSync,
    stop: impl Future<Output = ()>,
    mut sink: impl FnMut(Vec<u8>),
) -> Result<(), LiveError> {
    let (connection, mut payloads) = ChannelConnection::new();
    let id = live.hub().register(connection);
    tokio::pin!(stop);

    let ended = loop {
        tokio::select! {
            _ = &mut stop => break None,
            joined = &mut live.watcher => break Some(joined),
            payload = payloads.recv() => {
                let Some(payload) = payload else { break None };
                sink(payload);
            }
        }
    };

    live.hub().unregister(id);
    match ended {
        Some(joined) => {
            tracing::warn!("watcher stopped on its own");
            live.cancel.cancel();
            handle_join("watcher", joined)
        }
        None => live.shutdown().await,
    }
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), LiveError>, tokio::task::JoinError>,
) -> Result<(), LiveError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(LiveError::Join {
            task,
            message: err.to_string(),
        }),
    }
}

/// Install the `tracing` subscriber: `RUST_LOG` filter, `info` by default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
