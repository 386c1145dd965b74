//! Unique token source for subscription ids.

use uuid::Uuid;

/// Produces the unique part of a subscription id.
///
/// Implementations must return tokens that are unique with overwhelming
/// probability for the lifetime of the process. Tokens should not contain
/// `':'`, which separates the token from the handler name.
pub trait IdGenerator: Send + Sync {
    fn token(&self) -> String;
}

/// Default generator: random UUID v4 in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
