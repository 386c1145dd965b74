use thiserror::Error;

/// Errors reported by the event bus.
///
/// Only subscription can fail, and only on an internal fault: the id
/// generator handed out a token that is malformed or already in use. Every
/// other bus operation reports absence through booleans, sentinels or
/// `Option`.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to subscribe to '{event}': {reason}")]
    SubscribeFailed { event: String, reason: String },
}
