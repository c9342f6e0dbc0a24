//! Live change notifications for a task store.
//!
//! [`ChangeWatcher`] observes the store root (whoever writes to it),
//! debounces bursts of filesystem events and publishes a small JSON
//! [`ChangeEvent`] through a [`Broadcaster`]; [`BroadcastHub`] fans each
//! payload out to every registered client [`Connection`].

pub mod config;
mod error;
pub mod event;
pub mod hub;
mod runtime;
pub mod watcher;

pub use config::{WatcherConfig, DEBOUNCE_WINDOW, DEFAULT_CONNECTION_CAPACITY};
pub use error::LiveError;
pub use event::{classify, ChangeEvent, ChangeKind};
pub use hub::{BroadcastHub, Broadcaster, ChannelConnection, Connection, ConnectionId};
pub use runtime::{init_tracing, run, start_blocking, LiveSync};
pub use watcher::ChangeWatcher;
