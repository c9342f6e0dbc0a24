use std::time::Duration;

/// Quiet period after the last qualifying filesystem event before a
/// notification is published.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Buffered payloads per [`crate::ChannelConnection`] before sends are dropped.
pub const DEFAULT_CONNECTION_CAPACITY: usize = 64;

/// Tunables for [`crate::ChangeWatcher`].
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_WINDOW,
        }
    }
}
