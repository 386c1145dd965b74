//! Subscription identifier helpers.
//!
//! A subscription id has the form `<token>:<handler-name>`. The token makes
//! the id unique; the handler name is only there to make ids readable in
//! logs and listings. Handler names may contain `':'` themselves, so ids are
//! always split at the first separator.

/// Separator between the unique token and the handler name.
pub const ID_SEPARATOR: char = ':';

/// Build a subscription id from a unique token and a handler name.
pub fn compose(token: &str, handler_name: &str) -> String {
    format!("{token}{ID_SEPARATOR}{handler_name}")
}

/// The unique token part of a subscription id.
///
/// Returns the whole id when it contains no separator.
pub fn token(id: &str) -> &str {
    id.split_once(ID_SEPARATOR).map_or(id, |(token, _)| token)
}

/// The human-readable handler name part of a subscription id.
///
/// Returns `None` when the id contains no separator.
pub fn handler_name(id: &str) -> Option<&str> {
    id.split_once(ID_SEPARATOR).map(|(_, name)| name)
}
