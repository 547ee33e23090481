//! Default values and functions for configuration

pub(crate) const DEFAULT_MAX_EVENTS: usize = 1;
pub(crate) const DEFAULT_EVENT_WINDOW_MS: u64 = 5_000;
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub(crate) fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

pub(crate) fn default_event_window_ms() -> u64 {
    DEFAULT_EVENT_WINDOW_MS
}

pub(crate) fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
