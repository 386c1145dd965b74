//! The event bus facade: subscription registry, dispatcher and state store
//! behind one shareable object.
//!
//! A host program builds one `EventBus` per logical bus and shares it by
//! `Arc`. There is no global instance.
//!
//! ## Delivery rules
//! - **Fire-and-forget**: `publish` returns once every handler invocation has
//!   been started, never waiting for completion.
//! - **Any thread**: subscribing needs no async runtime. Publishing from inside
//!   a Tokio runtime spawns handlers there; publishing from anywhere else runs
//!   each handler on its own thread.
//! - **Snapshot fan-out**: handlers registered before `publish` reads the
//!   registry are always launched; ones added or removed concurrently may or
//!   may not be.
//! - **No cross-event ordering**: handlers for different events, and for the
//!   same event, run in any order.
//! - **Advisory cancellation**: `cancel_event` only publishes an event with
//!   `cancel = true`; it cannot stop handlers that are already running.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span};

use tidings_observe::attrs::SPAN_PUBLISH;
use tidings_types::config::BusConfig;
use tidings_types::error::BusError;
use tidings_types::event::Event;

use crate::dispatch::Dispatcher;
use crate::handler::{BoxEventHandler, EventHandler};
use crate::id::{IdGenerator, UuidGenerator};
use crate::registry::SubscriptionRegistry;
use crate::state::StateStore;

/// Result of [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsubscribed {
    /// The event name has a registry entry.
    pub event_found: bool,
    /// The subscription was present and has now been removed.
    pub handler_removed: bool,
}

/// Result of [`EventBus::publish`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The event name has a registry entry.
    pub event_found: bool,
    /// Subscription ids whose handlers were launched, in registry order.
    pub handler_ids: Vec<String>,
}

/// In-process publish/subscribe bus with an auxiliary state store.
pub struct EventBus {
    registry: SubscriptionRegistry,
    dispatcher: Dispatcher,
    states: StateStore,
}

impl EventBus {
    /// Create a bus with default configuration and UUID subscription tokens.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    // -- Subscription registry --

    /// Register `handler` for `event_name` and return its subscription id.
    ///
    /// The id has the form `<unique-token>:<handler_name>`.
    ///
    /// # Errors
    ///
    /// [`BusError::SubscribeFailed`] if the id generator yields a malformed
    /// or already registered token. Never happens with the default generator.
    pub fn subscribe<H>(
        &self,
        event_name: &str,
        handler_name: &str,
        handler: H,
    ) -> Result<String, BusError>
    where
        H: EventHandler + 'static,
    {
        self.subscribe_boxed(event_name, handler_name, BoxEventHandler::new(handler))
    }

    /// [`subscribe`](Self::subscribe) for an already type-erased handler.
    pub fn subscribe_boxed(
        &self,
        event_name: &str,
        handler_name: &str,
        handler: BoxEventHandler,
    ) -> Result<String, BusError> {
        self.registry.insert(event_name, handler_name, handler)
    }

    /// Remove subscription `id` from `event_name`. Idempotent.
    pub fn unsubscribe(&self, event_name: &str, id: &str) -> Unsubscribed {
        let (event_found, handler_removed) = self.registry.remove(event_name, id);
        Unsubscribed {
            event_found,
            handler_removed,
        }
    }

    /// Whether `event_name` has a registry entry, even one with no handlers.
    pub fn event_exists(&self, event_name: &str) -> bool {
        self.registry.contains_event(event_name)
    }

    /// Whether subscription `id` is currently registered under `event_name`.
    pub fn has_subscribed_to(&self, event_name: &str, id: &str) -> bool {
        self.registry.contains(event_name, id)
    }

    /// Number of handlers for `event_name`; `-1` if the event has no entry.
    pub fn sub_count(&self, event_name: &str) -> i64 {
        self.registry
            .count(event_name)
            .map_or(-1, |count| i64::try_from(count).unwrap_or(i64::MAX))
    }

    /// Subscription ids for `event_name`. Order is unspecified.
    pub fn sub_list(&self, event_name: &str) -> Vec<String> {
        self.registry.ids(event_name)
    }

    /// Names of all events with a registry entry.
    pub fn event_names(&self) -> Vec<String> {
        self.registry.event_names()
    }

    // -- Dispatch --

    /// Launch every handler registered for `event.name`.
    ///
    /// Returns immediately after the handler invocations are started. Unknown
    /// event names launch nothing and report `event_found = false`.
    pub fn publish(&self, event: Event) -> Dispatch {
        let _span = debug_span!(SPAN_PUBLISH, tidings.event.name = %event.name).entered();
        let Some(handlers) = self.registry.snapshot(&event.name) else {
            debug!(event = %event.name, "publish to unknown event");
            return Dispatch::default();
        };

        debug!(
            tidings.event.cancel = event.cancel,
            tidings.handler.count = handlers.len(),
            "publishing event"
        );
        let handler_ids = self.dispatcher.dispatch(event, handlers);
        Dispatch {
            event_found: true,
            handler_ids,
        }
    }

    /// Publish a cancellation signal for `event_name`.
    ///
    /// Handlers see an event with `cancel = true` and null data. Already
    /// launched handlers for earlier publishes are not affected.
    pub fn cancel_event(&self, event_name: &str) -> Dispatch {
        self.publish(Event::cancellation(event_name))
    }

    /// Store `event.data` as state under `event.name`, then publish `event`.
    pub fn publish_as_state(&self, event: Event) -> Dispatch {
        self.states.set(event.name.clone(), event.data.clone());
        self.publish(event)
    }

    // -- State store --

    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.states.set(key, value);
    }

    /// Cloned value at `key`; `None` when absent.
    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.states.get(key)
    }

    pub fn delete_state(&self, key: &str) {
        self.states.remove(key);
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.states.contains(key)
    }

    /// Whether `key` is present and equal to `expected`.
    pub fn state_equals(&self, key: &str, expected: &Value) -> bool {
        self.states.equals(key, expected)
    }

    /// Set each pair independently; not atomic as a batch.
    pub fn set_states<I, K>(&self, states: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.states.set_many(states);
    }

    /// Remove all state entries; not atomic against concurrent writers.
    pub fn clear_states(&self) {
        self.states.clear();
    }

    pub fn state_keys(&self) -> Vec<String> {
        self.states.keys()
    }

    pub fn state_len(&self) -> usize {
        self.states.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.registry.len())
            .field("states", &self.states.len())
            .finish()
    }
}

/// Builder for [`EventBus`].
#[derive(Default)]
pub struct EventBusBuilder {
    config: BusConfig,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl EventBusBuilder {
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the UUID token source for subscription ids.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(ids));
        self
    }

    pub fn build(self) -> EventBus {
        let ids = self
            .id_generator
            .unwrap_or_else(|| Arc::new(UuidGenerator));

        EventBus {
            registry: SubscriptionRegistry::new(ids, self.config.retain_empty_events),
            dispatcher: Dispatcher::new(self.config.log_handler_panics),
            states: StateStore::new(),
        }
    }
}

impl std::fmt::Debug for EventBusBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusBuilder")
            .field("config", &self.config)
            .field("custom_ids", &self.id_generator.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant};
    use tidings_types::subscription;

    fn adder(counter: &Arc<AtomicU64>, amount: u64) -> impl EventHandler + 'static {
        let counter = Arc::clone(counter);
        handler_fn(move |_event| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(amount, Ordering::SeqCst);
            }
        })
    }

    fn noop() -> impl EventHandler + 'static {
        handler_fn(|_event| async {})
    }

    async fn wait_for(counter: &AtomicU64, expected: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.load(Ordering::SeqCst) != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("handlers did not settle");
    }

    fn wait_for_blocking(counter: &AtomicU64, expected: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) != expected {
            assert!(Instant::now() < deadline, "handlers did not settle");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn unknown_event_queries() {
        let bus = EventBus::new();
        assert!(!bus.event_exists("e"));
        assert_eq!(bus.sub_count("e"), -1);
        assert!(bus.sub_list("e").is_empty());
        assert!(!bus.has_subscribed_to("e", "x:y"));
    }

    #[tokio::test]
    async fn subscribe_returns_token_and_name() {
        let bus = EventBus::new();
        let id = bus.subscribe("e1", "n1", noop()).unwrap();

        assert!(id.ends_with(":n1"));
        assert_eq!(subscription::handler_name(&id), Some("n1"));
        assert!(!subscription::token(&id).is_empty());
        assert!(bus.has_subscribed_to("e1", &id));
        assert!(bus.event_exists("e1"));
        assert_eq!(bus.sub_list("e1"), vec![id]);
    }

    #[tokio::test]
    async fn duplicate_handler_names_do_not_collide() {
        let bus = EventBus::new();
        let a = bus.subscribe("e1", "same", noop()).unwrap();
        let b = bus.subscribe("e1", "same", noop()).unwrap();

        assert_ne!(a, b);
        assert_eq!(bus.sub_count("e1"), 2);
    }

    #[tokio::test]
    async fn unsubscribe_twice() {
        let bus = EventBus::new();
        let id = bus.subscribe("e1", "n1", noop()).unwrap();

        let first = bus.unsubscribe("e1", &id);
        assert_eq!(
            first,
            Unsubscribed {
                event_found: true,
                handler_removed: true
            }
        );
        let second = bus.unsubscribe("e1", &id);
        assert_eq!(
            second,
            Unsubscribed {
                event_found: true,
                handler_removed: false
            }
        );
        assert!(!bus.has_subscribed_to("e1", &id));
    }

    #[test]
    fn unsubscribe_unknown_event() {
        let bus = EventBus::new();
        let result = bus.unsubscribe("never", "x:y");
        assert!(!result.event_found);
        assert!(!result.handler_removed);
    }

    #[tokio::test]
    async fn empty_event_is_retained_by_default() {
        let bus = EventBus::new();
        let id = bus.subscribe("e1", "n1", noop()).unwrap();
        bus.unsubscribe("e1", &id);

        assert!(bus.event_exists("e1"));
        assert_eq!(bus.sub_count("e1"), 0);
        assert!(bus.sub_list("e1").is_empty());

        let dispatch = bus.publish(Event::named("e1"));
        assert!(dispatch.event_found);
        assert!(dispatch.handler_ids.is_empty());
    }

    #[tokio::test]
    async fn empty_event_dropped_when_configured() {
        let bus = EventBus::builder()
            .config(BusConfig {
                retain_empty_events: false,
                ..BusConfig::default()
            })
            .build();
        let id = bus.subscribe("e1", "n1", noop()).unwrap();
        bus.unsubscribe("e1", &id);

        assert!(!bus.event_exists("e1"));
        assert_eq!(bus.sub_count("e1"), -1);
        assert!(!bus.publish(Event::named("e1")).event_found);
    }

    #[tokio::test]
    async fn publish_unknown_event() {
        let bus = EventBus::new();
        let dispatch = bus.publish(Event::named("nobody"));
        assert_eq!(dispatch, Dispatch::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn publish_runs_each_handler_once() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU64::new(0));
        let mut ids = HashSet::new();
        for name in ["a", "b", "c"] {
            ids.insert(bus.subscribe("e1", name, adder(&counter, 1)).unwrap());
        }

        let dispatch = bus.publish(Event::named("e1"));
        assert!(dispatch.event_found);
        assert_eq!(dispatch.handler_ids.len(), 3);
        assert_eq!(dispatch.handler_ids.into_iter().collect::<HashSet<_>>(), ids);

        wait_for(&counter, 3).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn multiple_subscribers_sum_counters() {
        let bus = EventBus::new();
        let counter1 = Arc::new(AtomicU64::new(0));
        let counter2 = Arc::new(AtomicU64::new(0));

        bus.subscribe("testEvent1", "sub1", adder(&counter1, 1)).unwrap();
        bus.subscribe("testEvent1", "sub2", adder(&counter1, 10)).unwrap();
        bus.subscribe("testEvent1", "sub3", adder(&counter1, 100)).unwrap();
        bus.subscribe("testEvent2", "sub1", adder(&counter2, 1000)).unwrap();
        bus.subscribe("testEvent2", "sub3", adder(&counter2, 10000)).unwrap();

        assert_eq!(bus.sub_count("testEvent1"), 3);
        assert_eq!(bus.sub_count("testEvent2"), 2);

        bus.publish(Event::named("testEvent1"));
        bus.publish(Event::named("testEvent2"));

        wait_for(&counter1, 111).await;
        wait_for(&counter2, 11000).await;
    }

    #[tokio::test]
    async fn unsubscribed_handler_is_not_invoked() {
        let bus = EventBus::new();
        let kept = Arc::new(AtomicU64::new(0));
        let removed = Arc::new(AtomicU64::new(0));

        bus.subscribe("e1", "kept", adder(&kept, 1)).unwrap();
        let id = bus.subscribe("e1", "removed", adder(&removed, 1)).unwrap();
        bus.unsubscribe("e1", &id);

        let dispatch = bus.publish(Event::named("e1"));
        assert_eq!(dispatch.handler_ids.len(), 1);
        assert!(!dispatch.handler_ids.contains(&id));

        wait_for(&kept, 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(removed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handlers_share_event_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(AtomicU64::new(0));

        for name in ["a", "b"] {
            let seen = Arc::clone(&seen);
            let done = Arc::clone(&done);
            bus.subscribe(
                "order",
                name,
                handler_fn(move |event| {
                    let seen = Arc::clone(&seen);
                    let done = Arc::clone(&done);
                    async move {
                        seen.lock().unwrap().push(event);
                        done.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();
        }

        bus.publish(Event::new("order", json!({"id": 42})));
        wait_for(&done, 2).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].data, json!({"id": 42}));
        assert!(Arc::ptr_eq(&seen[0], &seen[1]));
    }

    #[tokio::test]
    async fn cancel_event_delivers_cancel_flag() {
        let bus = EventBus::new();
        let cancels = Arc::new(AtomicU64::new(0));
        let regular = Arc::new(AtomicU64::new(0));

        let (c, r) = (Arc::clone(&cancels), Arc::clone(&regular));
        bus.subscribe(
            "upload",
            "watcher",
            handler_fn(move |event| {
                let (c, r) = (Arc::clone(&c), Arc::clone(&r));
                async move {
                    if event.is_cancel() {
                        assert_eq!(event.data, Value::Null);
                        c.fetch_add(1, Ordering::SeqCst);
                    } else {
                        r.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }),
        )
        .unwrap();

        bus.publish(Event::named("upload"));
        let dispatch = bus.cancel_event("upload");
        assert!(dispatch.event_found);
        assert_eq!(dispatch.handler_ids.len(), 1);

        wait_for(&cancels, 1).await;
        wait_for(&regular, 1).await;
        assert!(!bus.cancel_event("unknown").event_found);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_handler_does_not_affect_others() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU64::new(0));

        let boom = handler_fn(|_event| async {
            panic!("handler failure");
        });
        bus.subscribe("e1", "boom", boom).unwrap();
        bus.subscribe("e1", "count", adder(&counter, 1)).unwrap();

        assert_eq!(bus.publish(Event::named("e1")).handler_ids.len(), 2);
        wait_for(&counter, 1).await;
        assert_eq!(bus.publish(Event::named("e1")).handler_ids.len(), 2);
        wait_for(&counter, 2).await;
    }

    #[tokio::test]
    async fn publish_as_state_sets_state_and_dispatches() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU64::new(0));
        bus.subscribe("k", "n", adder(&counter, 1)).unwrap();

        let dispatch = bus.publish_as_state(Event::new("k", json!({"v": 1})));
        assert!(dispatch.event_found);
        assert_eq!(dispatch.handler_ids.len(), 1);
        assert_eq!(bus.get_state("k"), Some(json!({"v": 1})));
        wait_for(&counter, 1).await;
    }

    #[tokio::test]
    async fn publish_as_state_without_subscribers_still_sets_state() {
        let bus = EventBus::new();
        let dispatch = bus.publish_as_state(Event::new("k", json!("v")));
        assert!(!dispatch.event_found);
        assert_eq!(bus.get_state("k"), Some(json!("v")));
    }

    #[test]
    fn state_operations() {
        let bus = EventBus::new();
        bus.set_state("k", json!(true));
        assert_eq!(bus.get_state("k"), Some(json!(true)));
        assert_eq!(bus.get_state("unknown"), None);
        assert!(bus.state_equals("k", &json!(true)));
        assert!(!bus.state_equals("k", &json!(false)));
        assert!(bus.has_state("k"));
        assert!(!bus.has_state("unknown"));

        bus.delete_state("k");
        assert!(!bus.has_state("k"));
        bus.delete_state("k");
    }

    #[test]
    fn bulk_state_operations() {
        let bus = EventBus::new();
        bus.set_states([("testState1", json!(true)), ("testState2", json!(false))]);
        assert_eq!(bus.get_state("testState1"), Some(json!(true)));
        assert_eq!(bus.get_state("testState2"), Some(json!(false)));
        assert_eq!(bus.state_len(), 2);

        let mut keys = bus.state_keys();
        keys.sort();
        assert_eq!(keys, vec!["testState1", "testState2"]);

        bus.clear_states();
        assert_eq!(bus.state_len(), 0);
        assert_eq!(bus.get_state("testState1"), None);
    }

    #[test]
    fn subscribe_outside_runtime_succeeds_and_delivers() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU64::new(0));
        let id = bus.subscribe("e1", "n1", adder(&counter, 7)).unwrap();
        assert!(bus.has_subscribed_to("e1", &id));

        let dispatch = bus.publish(Event::named("e1"));
        assert_eq!(dispatch.handler_ids, vec![id]);
        wait_for_blocking(&counter, 7);
    }

    #[test]
    fn publish_after_runtime_dropped_still_runs_handler() {
        let bus = Arc::new(EventBus::new());
        let counter = Arc::new(AtomicU64::new(0));

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            bus.subscribe("e1", "n1", adder(&counter, 1)).unwrap();
            bus.publish(Event::named("e1"));
            wait_for(&counter, 1).await;
        });
        drop(rt);

        let publisher = Arc::clone(&bus);
        let dispatch = std::thread::spawn(move || publisher.publish(Event::named("e1")))
            .join()
            .unwrap();
        assert_eq!(dispatch.handler_ids.len(), 1);
        wait_for_blocking(&counter, 2);
    }

    #[test]
    fn handler_thread_can_publish_and_sleep() {
        let bus = Arc::new(EventBus::new());
        let counter = Arc::new(AtomicU64::new(0));

        let relay_bus = Arc::clone(&bus);
        bus.subscribe(
            "first",
            "relay",
            handler_fn(move |_event| {
                let bus = Arc::clone(&relay_bus);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    bus.publish(Event::named("second"));
                }
            }),
        )
        .unwrap();
        bus.subscribe("second", "count", adder(&counter, 1)).unwrap();

        bus.publish(Event::named("first"));
        wait_for_blocking(&counter, 1);
    }

    #[test]
    fn duplicate_subscription_id_is_rejected() {
        struct Constant;
        impl IdGenerator for Constant {
            fn token(&self) -> String {
                "fixed".to_string()
            }
        }

        let bus = EventBus::builder().id_generator(Constant).build();
        assert_eq!(bus.subscribe("e1", "n1", noop()).unwrap(), "fixed:n1");

        let result = bus.subscribe("e1", "n1", noop());
        assert!(matches!(result, Err(BusError::SubscribeFailed { .. })));
        assert_eq!(bus.sub_count("e1"), 1);
    }

    #[tokio::test]
    async fn custom_id_generator() {
        struct Fixed(AtomicU64);
        impl IdGenerator for Fixed {
            fn token(&self) -> String {
                format!("tok{}", self.0.fetch_add(1, Ordering::SeqCst))
            }
        }

        let bus = EventBus::builder()
            .id_generator(Fixed(AtomicU64::new(0)))
            .build();
        assert_eq!(bus.subscribe("e1", "a", noop()).unwrap(), "tok0:a");
        assert_eq!(bus.subscribe("e2", "b", noop()).unwrap(), "tok1:b");

        let mut names = bus.event_names();
        names.sort();
        assert_eq!(names, vec!["e1", "e2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_subscribe_and_publish() {
        let bus = Arc::new(EventBus::new());
        let counter = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::new();

        for i in 0..20 {
            let bus = Arc::clone(&bus);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                bus.subscribe("shared", &format!("h{i}"), adder(&counter, 1))
                    .unwrap();
                bus.publish(Event::named("other"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(bus.sub_count("shared"), 20);
        let dispatch = bus.publish(Event::named("shared"));
        assert_eq!(dispatch.handler_ids.len(), 20);
        wait_for(&counter, 20).await;
    }

    /// Records the name and field names of every span and event it sees.
    #[derive(Clone, Default)]
    struct FieldRecorder(Arc<Mutex<Vec<(String, Vec<String>)>>>);

    impl FieldRecorder {
        fn record(&self, metadata: &tracing::Metadata<'_>) {
            let fields = metadata
                .fields()
                .iter()
                .map(|field| field.name().to_string())
                .collect();
            self.0
                .lock()
                .unwrap()
                .push((metadata.name().to_string(), fields));
        }

        fn fields_of(&self, name: &str) -> Vec<Vec<String>> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(recorded, _)| recorded == name)
                .map(|(_, fields)| fields.clone())
                .collect()
        }

        fn any_with_field(&self, field: &str) -> bool {
            self.0
                .lock()
                .unwrap()
                .iter()
                .any(|(_, fields)| fields.iter().any(|f| f == field))
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldRecorder {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.record(attrs.metadata());
        }

        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.record(event.metadata());
        }
    }

    #[test]
    fn spans_use_exported_names() {
        use tidings_observe::attrs::{
            EVENT_CANCEL, EVENT_NAME, HANDLER_COUNT, SPAN_HANDLE, SUBSCRIPTION_ID,
        };
        use tracing_subscriber::layer::SubscriberExt;

        let recorder = FieldRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU64::new(0));

        tracing::subscriber::with_default(subscriber, || {
            bus.subscribe("e1", "n1", adder(&counter, 1)).unwrap();
            bus.cancel_event("e1");
        });
        wait_for_blocking(&counter, 1);

        let publish = recorder.fields_of(SPAN_PUBLISH);
        assert_eq!(publish, vec![vec![EVENT_NAME.to_string()]]);

        let handle = recorder.fields_of(SPAN_HANDLE);
        assert_eq!(handle.len(), 1);
        for field in [EVENT_NAME, EVENT_CANCEL, SUBSCRIPTION_ID] {
            assert!(handle[0].iter().any(|f| f == field), "missing {field}");
        }

        assert!(recorder.any_with_field(HANDLER_COUNT));
    }

    #[test]
    fn debug_impl() {
        let bus = EventBus::new();
        let debug = format!("{bus:?}");
        assert!(debug.contains("EventBus"));
        assert!(debug.contains("events"));
        assert!(format!("{:?}", EventBus::builder()).contains("EventBusBuilder"));
    }
}
