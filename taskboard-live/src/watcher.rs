//! Debounced filesystem watcher over a store root.
//!
//! Raw `notify` events are forwarded into a tokio channel and consumed by a
//! single `select!` loop that also waits on the debounce deadline and the
//! cancellation token. A burst of qualifying events collapses into one
//! published [`ChangeEvent`]: the classification of the last event seen
//! before the burst went quiet.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{recommended_watcher, Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use taskboard_core::layout;

use crate::config::WatcherConfig;
use crate::error::{io_err, LiveError};
use crate::event::{classify, ChangeEvent};
use crate::hub::Broadcaster;

/// Watches `<root>` and publishes board/card change notifications.
pub struct ChangeWatcher<B> {
    broadcaster: B,
    root: PathBuf,
    config: WatcherConfig,
}

impl<B: Broadcaster> ChangeWatcher<B> {
    pub fn new(broadcaster: B, root: impl Into<PathBuf>) -> Self {
        Self {
            broadcaster,
            root: root.into(),
            config: WatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Run until `cancel` fires or the event source closes.
    ///
    /// Only failing to create the OS watcher is an error. A root that cannot
    /// be subscribed yet is logged and the loop keeps running. Cancellation
    /// is a clean `Ok(())`; the OS subscription is released on return.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), LiveError> {
        // Canonicalize so backend paths (e.g. /private/var/... on macOS)
        // match the prefix used for classification.
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());

        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let watcher = recommended_watcher(move |event| {
            let _ = event_tx.send(event);
        })?;

        let mut subscriptions = TreeSubscriptions::new(watcher);
        match subscriptions.subscribe_tree(&root) {
            Ok(dirs) => tracing::info!(
                root = %root.display(),
                directories = dirs.len(),
                "change watcher started",
            ),
            Err(err) => tracing::warn!(
                root = %root.display(),
                error = %err,
                "initial watch setup failed; continuing with partial subscriptions",
            ),
        }

        self.drive(&root, event_rx, &mut subscriptions, cancel).await;
        tracing::info!(root = %root.display(), "change watcher stopped");
        Ok(())
    }

    async fn drive<S: Subscriptions>(
        &self,
        root: &Path,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        subscriptions: &mut S,
        cancel: CancellationToken,
    ) {
        let mut debounce = Debounce::new(self.config.debounce);

        loop {
            let deadline = debounce.deadline();
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        Ok(event) => {
                            self.handle_raw(root, event, subscriptions, &mut debounce);
                        }
                        Err(err) => tracing::error!(error = %err, "watcher error"),
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(event) = debounce.take_due(Instant::now()) {
                        self.publish(&event);
                    }
                }
            }
        }
    }

    fn handle_raw<S: Subscriptions>(
        &self,
        root: &Path,
        event: Event,
        subscriptions: &mut S,
        debounce: &mut Debounce,
    ) {
        tracing::trace!(kind = ?event.kind, paths = ?event.paths, "raw filesystem event");
        if !is_relevant_event_kind(&event.kind) {
            return;
        }

        for path in &event.paths {
            if matches!(event.kind, EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))) {
                subscriptions.forget(path);
            }

            if path.is_dir() {
                // A directory appeared (created or renamed in): watch it and
                // pick up records written before the watch was in place.
                match subscriptions.subscribe_tree(path) {
                    Ok(new_dirs) => {
                        for dir in new_dirs {
                            for record in record_files(&dir) {
                                if let Some(change) = classify(root, &record) {
                                    debounce.observe(change, Instant::now());
                                }
                            }
                        }
                    }
                    Err(err) => {
                        tracing::debug!(path = %path.display(), error = %err, "could not extend watch");
                    }
                }
                continue;
            }

            if let Some(change) = classify(root, path) {
                debounce.observe(change, Instant::now());
            }
        }
    }

    fn publish(&self, event: &ChangeEvent) {
        match event.to_payload() {
            Ok(payload) => {
                tracing::debug!(kind = ?event.kind, board = %event.board_id, "publishing change");
                self.broadcaster.broadcast(&payload);
            }
            Err(err) => tracing::error!(error = %err, "failed to encode change event"),
        }
    }
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// Trailing-edge debounce holding at most one pending event.
#[derive(Debug)]
struct Debounce {
    window: Duration,
    pending: Option<ChangeEvent>,
    deadline: Option<Instant>,
}

impl Debounce {
    fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Replace the pending event and restart the window.
    fn observe(&mut self, event: ChangeEvent, now: Instant) {
        self.pending = Some(event);
        self.deadline = Some(now + self.window);
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn take_due(&mut self, now: Instant) -> Option<ChangeEvent> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

trait Subscriptions {
    /// Watch `dir` and every directory below it. Returns the directories that
    /// were not watched before.
    fn subscribe_tree(&mut self, dir: &Path) -> Result<Vec<PathBuf>, LiveError>;

    /// Drop bookkeeping for `path` and anything under it, so a directory that
    /// is removed and recreated gets watched again.
    fn forget(&mut self, path: &Path);
}

/// One non-recursive OS watch per directory, tracked so each is added once.
struct TreeSubscriptions<W> {
    watcher: W,
    watched: HashSet<PathBuf>,
}

impl<W: Watcher> TreeSubscriptions<W> {
    fn new(watcher: W) -> Self {
        Self {
            watcher,
            watched: HashSet::new(),
        }
    }
}

impl<W: Watcher> Subscriptions for TreeSubscriptions<W> {
    fn subscribe_tree(&mut self, dir: &Path) -> Result<Vec<PathBuf>, LiveError> {
        let mut added = Vec::new();
        for dir in collect_dirs(dir)? {
            if !self.watched.insert(dir.clone()) {
                continue;
            }
            if let Err(err) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                self.watched.remove(&dir);
                tracing::warn!(path = %dir.display(), error = %err, "could not watch directory");
                continue;
            }
            tracing::debug!(path = %dir.display(), "watching directory");
            added.push(dir);
        }
        Ok(added)
    }

    fn forget(&mut self, path: &Path) {
        self.watched.retain(|dir| !dir.starts_with(path));
    }
}

/// `root` and every directory below it, breadth first.
///
/// Only an unreadable `root` is an error. Subdirectories that vanish or
/// cannot be read are skipped, along with anything beneath them.
fn collect_dirs(root: &Path) -> Result<Vec<PathBuf>, LiveError> {
    let entries = fs::read_dir(root).map_err(|e| io_err(root, e))?;
    let mut dirs = vec![root.to_path_buf()];
    push_subdirs(root, entries, &mut dirs);

    let mut cursor = 1;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;
        match fs::read_dir(&current) {
            Ok(entries) => push_subdirs(&current, entries, &mut dirs),
            // Vanished between the event and the scan.
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %current.display(), error = %err, "skipping unreadable directory");
            }
        }
    }
    Ok(dirs)
}

fn push_subdirs(parent: &Path, entries: fs::ReadDir, dirs: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(path = %parent.display(), error = %err, "skipping directory entry");
                continue;
            }
        };
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
}

fn record_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && layout::is_record_file(p))
        .collect();
    files.sort();
    files
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(
                ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any | ModifyKind::Other
            )
    )
}
