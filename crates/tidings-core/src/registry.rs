//! Subscription registry: event name -> (subscription id -> handler).
//!
//! Both levels are `DashMap`s so any number of threads can subscribe,
//! unsubscribe and look up concurrently. An event's entry is created on its
//! first subscription. Whether it survives losing its last subscription is
//! decided by `retain_empty_events`.
//!
//! Subscribe inserts the handler while still holding the outer entry guard,
//! and empty-entry removal uses `remove_if` under the same shard lock, so a
//! subscription can never land in an entry that is concurrently dropped.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use tidings_types::error::BusError;
use tidings_types::subscription;

use crate::handler::BoxEventHandler;
use crate::id::IdGenerator;

/// Concurrent registry of handlers keyed by event name and subscription id.
pub struct SubscriptionRegistry {
    events: DashMap<String, DashMap<String, BoxEventHandler>>,
    ids: Arc<dyn IdGenerator>,
    retain_empty_events: bool,
}

impl SubscriptionRegistry {
    pub fn new(ids: Arc<dyn IdGenerator>, retain_empty_events: bool) -> Self {
        Self {
            events: DashMap::new(),
            ids,
            retain_empty_events,
        }
    }

    /// Register `handler` for `event_name` and return its new subscription id.
    ///
    /// The id is `<token>:<handler_name>`; duplicate handler names are fine.
    ///
    /// # Errors
    ///
    /// [`BusError::SubscribeFailed`] when the id generator misbehaves: its
    /// token contains the id separator, or it repeats a token already in use
    /// for `event_name`. Nothing is registered in either case.
    pub fn insert(
        &self,
        event_name: &str,
        handler_name: &str,
        handler: BoxEventHandler,
    ) -> Result<String, BusError> {
        let token = self.ids.token();
        if token.contains(subscription::ID_SEPARATOR) {
            warn!(event = %event_name, %token, "id generator produced a token with a separator");
            return Err(BusError::SubscribeFailed {
                event: event_name.to_string(),
                reason: format!("token '{token}' contains '{}'", subscription::ID_SEPARATOR),
            });
        }
        let id = subscription::compose(&token, handler_name);

        let subs = self.events.entry(event_name.to_string()).or_default();
        let inserted = match subs.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handler);
                true
            }
        };
        let count = subs.len();
        drop(subs);

        if !inserted {
            warn!(event = %event_name, subscription_id = %id, "id generator repeated a token");
            return Err(BusError::SubscribeFailed {
                event: event_name.to_string(),
                reason: format!("subscription id '{id}' is already registered"),
            });
        }

        debug!(event = %event_name, subscription_id = %id, count, "subscribed handler");
        Ok(id)
    }

    /// Remove subscription `id` from `event_name`.
    ///
    /// Returns `(event_found, handler_removed)`.
    pub fn remove(&self, event_name: &str, id: &str) -> (bool, bool) {
        let Some(subs) = self.events.get(event_name) else {
            return (false, false);
        };
        let removed = subs.remove(id).is_some();
        drop(subs);

        if removed {
            debug!(event = %event_name, subscription_id = %id, "unsubscribed handler");
            if !self.retain_empty_events
                && self
                    .events
                    .remove_if(event_name, |_, subs| subs.is_empty())
                    .is_some()
            {
                debug!(event = %event_name, "dropped empty event entry");
            }
        }

        (true, removed)
    }

    /// Whether `event_name` currently has an entry (possibly empty).
    pub fn contains_event(&self, event_name: &str) -> bool {
        self.events.contains_key(event_name)
    }

    /// Whether subscription `id` is currently registered under `event_name`.
    pub fn contains(&self, event_name: &str, id: &str) -> bool {
        self.events
            .get(event_name)
            .is_some_and(|subs| subs.contains_key(id))
    }

    /// Number of handlers for `event_name`, or `None` when it has no entry.
    pub fn count(&self, event_name: &str) -> Option<usize> {
        self.events.get(event_name).map(|subs| subs.len())
    }

    /// Subscription ids for `event_name` in the registry's iteration order.
    pub fn ids(&self, event_name: &str) -> Vec<String> {
        self.events
            .get(event_name)
            .map(|subs| subs.iter().map(|r| r.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of every (id, handler) pair for `event_name`.
    ///
    /// All registry guards are released before this returns, so callers may
    /// invoke the handlers freely. `None` when the event has no entry.
    pub fn snapshot(&self, event_name: &str) -> Option<Vec<(String, BoxEventHandler)>> {
        let subs = self.events.get(event_name)?;
        let handlers = subs
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        Some(handlers)
    }

    /// Names of all events that currently have an entry.
    pub fn event_names(&self) -> Vec<String> {
        self.events.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of event entries.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has an entry.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("events", &self.events.len())
            .field("retain_empty_events", &self.retain_empty_events)
            .finish()
    }
}
