//! The `Event` value passed from publishers to handlers.
//!
//! An event is routed by `name`, carries an opaque JSON payload in `data`,
//! and may be flagged as a cancellation signal. The bus never mutates an
//! event; all handlers launched by one publish share the same instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named occurrence delivered to every handler registered for `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Routing key. Opaque and case-sensitive.
    pub name: String,
    /// Publisher-owned payload. `Value::Null` when the event carries no data.
    #[serde(default)]
    pub data: Value,
    /// Marks this occurrence as a cancellation signal rather than normal data.
    #[serde(default)]
    pub cancel: bool,
}

impl Event {
    /// Create a regular event carrying `data`.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            cancel: false,
        }
    }

    /// Create a regular event with no payload.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    /// Create the synthetic cancellation event for `name`.
    ///
    /// Cancellation is advisory: handlers must check [`Event::is_cancel`]
    /// themselves to cooperate.
    pub fn cancellation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Null,
            cancel: true,
        }
    }

    /// Whether this occurrence is a cancellation signal.
    pub fn is_cancel(&self) -> bool {
        self.cancel
    }
}
