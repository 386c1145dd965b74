//! Bus configuration types.
//!
//! `BusConfig` controls the few behaviours of the bus that are a matter of
//! policy. It can be loaded from a TOML file; every field has a default.

use serde::{Deserialize, Serialize};

/// Configuration for an `EventBus` instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Keep an event's registry entry after its last subscription is removed.
    ///
    /// When `true`, a fully unsubscribed event still exists and reports a
    /// subscriber count of `0`. When `false`, the entry is dropped and the
    /// event reports `-1` again.
    #[serde(default = "default_true")]
    pub retain_empty_events: bool,

    /// Log panics caught inside handlers at `warn` level.
    ///
    /// Panics are always contained to the handler's own task.
    #[serde(default = "default_true")]
    pub log_handler_panics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            retain_empty_events: default_true(),
            log_handler_panics: default_true(),
        }
    }
}
