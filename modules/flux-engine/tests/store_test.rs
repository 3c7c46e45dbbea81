//! Integration tests for the Store delegation layer on top of a shared
//! Dispatcher.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use flux_engine::{
    handler_name, key_mirror, Action, Dispatcher, FluxError, Handlers, ListenerId, Payload,
    Store, StoreBehavior, StoreContext, VERSION,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test stores
// ---------------------------------------------------------------------------

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct TodoStore {
    todos: Vec<String>,
    initialized: u32,
    log: Log,
}

impl TodoStore {
    fn with_log(log: &Log) -> Self {
        Self {
            log: Arc::clone(log),
            ..Self::default()
        }
    }

    fn on_add_todo(&mut self, action: &Action, ctx: &StoreContext<'_>) -> flux_engine::Result<()> {
        let title = action
            .get::<String>("title")
            .ok_or_else(|| anyhow!("ADD_TODO without a title"))?;
        self.log
            .lock()
            .unwrap()
            .push(format!("todo:add:{}:{title}", ctx.source()));
        self.todos.push(title);
        Ok(())
    }

    fn on_remove_todo_item(
        &mut self,
        action: &Action,
        _ctx: &StoreContext<'_>,
    ) -> flux_engine::Result<()> {
        if let Some(title) = action.get::<String>("title") {
            self.todos.retain(|todo| *todo != title);
        }
        Ok(())
    }
}

impl StoreBehavior for TodoStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new()
            .on("ADD_TODO", Self::on_add_todo)
            .handler("onRemoveTodoItem", Self::on_remove_todo_item)
    }

    fn initialize(&mut self) {
        self.initialized += 1;
    }
}

/// Only reacts to actions that originated in the view.
#[derive(Default)]
struct ViewTodoStore {
    inner: TodoStore,
}

impl StoreBehavior for ViewTodoStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new().on("ADD_TODO", |store: &mut Self, action, ctx| {
            store.inner.on_add_todo(action, ctx)
        })
    }

    fn source(&self) -> Option<&str> {
        Some("VIEW")
    }
}

/// Counts todos, but only after the todo store has seen the action.
struct StatsStore {
    todo_token: ListenerId,
    added: u32,
    log: Log,
}

impl StoreBehavior for StatsStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new().on("ADD_TODO", |store: &mut Self, _, ctx| {
            ctx.wait_for(&[store.todo_token])?;
            store.added += 1;
            store.log.lock().unwrap().push("stats:add".to_string());
            Ok(())
        })
    }
}

/// Waits on whatever token it is given, to build cycles between stores.
struct WaitingStore {
    wait_on: ListenerId,
}

impl StoreBehavior for WaitingStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new().on("PING", |store: &mut Self, _, ctx| ctx.wait_for(&[store.wait_on]))
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn add_todo(source: &str, title: &str) -> Payload {
    Payload::new(source, Action::new("ADD_TODO").with_field("title", title))
}

fn titles<S: StoreBehavior>(store: &Store<S>, read: impl FnOnce(&S) -> Vec<String>) -> Vec<String> {
    store.with_state(read)
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn store_registers_once_and_initializes() {
    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    assert_eq!(store.dispatch_token(), ListenerId::new(0));
    assert_eq!(dispatcher.len(), 1);
    assert!(Arc::ptr_eq(store.dispatcher(), &dispatcher));
    assert_eq!(store.with_state(|s| s.initialized), 1);
}

#[test]
fn store_without_dispatcher_fails_before_registering() {
    let dispatcher: Arc<Dispatcher<Payload>> = Arc::new(Dispatcher::new());

    let err = Store::builder(TodoStore::default()).build().unwrap_err();

    assert!(matches!(err, FluxError::MissingDispatcher));
    assert!(dispatcher.is_empty());
}

#[test]
fn builder_source_overrides_behavior_source() {
    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::builder(ViewTodoStore::default())
        .dispatcher(Arc::clone(&dispatcher))
        .source("SERVER")
        .build()
        .unwrap();
    assert_eq!(store.source(), Some("SERVER"));

    dispatcher.dispatch(add_todo("VIEW", "ignored")).unwrap();
    dispatcher.dispatch(add_todo("SERVER", "kept")).unwrap();

    assert_eq!(titles(&store, |s| s.inner.todos.clone()), vec!["kept"]);
}

// =========================================================================
// Handler routing
// =========================================================================

#[test]
fn source_filter_skips_other_sources() {
    let log: Log = Arc::default();
    let dispatcher = Arc::new(Dispatcher::new());
    let s1 = Store::new(Arc::clone(&dispatcher), TodoStore::with_log(&log)).unwrap();
    let s2 = Store::new(
        Arc::clone(&dispatcher),
        ViewTodoStore {
            inner: TodoStore::with_log(&log),
        },
    )
    .unwrap();
    assert_eq!(s1.source(), None);
    assert_eq!(s2.source(), Some("VIEW"));

    dispatcher.dispatch(add_todo("VIEW", "x")).unwrap();
    dispatcher.dispatch(add_todo("SERVER", "y")).unwrap();

    assert_eq!(titles(&s1, |s| s.todos.clone()), vec!["x", "y"]);
    assert_eq!(titles(&s2, |s| s.inner.todos.clone()), vec!["x"]);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["todo:add:VIEW:x", "todo:add:VIEW:x", "todo:add:SERVER:y"]
    );
}

#[test]
fn multi_word_action_reaches_matching_handler() {
    assert_eq!(handler_name("REMOVE_TODO_ITEM"), "onRemoveTodoItem");

    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    dispatcher.dispatch(add_todo("VIEW", "milk")).unwrap();
    dispatcher.dispatch(add_todo("VIEW", "eggs")).unwrap();
    dispatcher
        .dispatch(Payload::new(
            "VIEW",
            Action::new("REMOVE_TODO_ITEM").with_field("title", "milk"),
        ))
        .unwrap();

    assert_eq!(titles(&store, |s| s.todos.clone()), vec!["eggs"]);
}

#[test]
fn unknown_action_is_ignored() {
    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    dispatcher
        .dispatch(Payload::new("VIEW", Action::new("ARCHIVE_EVERYTHING")))
        .unwrap();

    assert!(titles(&store, |s| s.todos.clone()).is_empty());
}

#[test]
fn handler_error_propagates_out_of_dispatch() {
    let dispatcher = Arc::new(Dispatcher::new());
    let _store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    let err = dispatcher
        .dispatch(Payload::new("VIEW", Action::new("ADD_TODO")))
        .unwrap_err();

    assert!(matches!(err, FluxError::Listener(_)));
    assert!(!dispatcher.is_dispatching());
}

// =========================================================================
// Invalid payloads
// =========================================================================

#[test]
fn payload_without_source_is_invalid() {
    let dispatcher = Arc::new(Dispatcher::new());
    let _store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    let payload = Payload::from_value(json!({"action": {"action": "ADD_TODO", "title": "x"}}))
        .unwrap();
    let err = dispatcher.dispatch(payload).unwrap_err();

    assert!(matches!(err, FluxError::InvalidPayload(_)));
    assert_eq!(err.to_string(), "Invalid payload: payload has no source");
}

#[test]
fn payload_without_action_is_invalid() {
    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::new(Arc::clone(&dispatcher), TodoStore::default()).unwrap();

    let payload = Payload::from_value(json!({"source": "VIEW"})).unwrap();
    let err = store.handle_callback(&payload).unwrap_err();

    assert!(matches!(err, FluxError::InvalidPayload(_)));
    assert_eq!(err.to_string(), "Invalid payload: payload has no action");
}

#[test]
fn filtered_store_still_rejects_invalid_payloads() {
    let dispatcher = Arc::new(Dispatcher::new());
    let _store = Store::new(Arc::clone(&dispatcher), ViewTodoStore::default()).unwrap();

    let err = dispatcher.dispatch(Payload::default()).unwrap_err();

    assert!(matches!(err, FluxError::InvalidPayload(_)));
}

#[test]
fn undecodable_payload_converts_to_decode_error() {
    let err: FluxError = Payload::from_json("{not json").unwrap_err().into();
    assert!(matches!(err, FluxError::Decode(_)));
}

// =========================================================================
// Ordering between stores
// =========================================================================

#[test]
fn store_waits_for_another_store_registered_later() {
    let log: Log = Arc::default();
    let dispatcher = Arc::new(Dispatcher::new());
    let stats = Store::new(
        Arc::clone(&dispatcher),
        StatsStore {
            todo_token: ListenerId::new(1),
            added: 0,
            log: Arc::clone(&log),
        },
    )
    .unwrap();
    let todos = Store::new(Arc::clone(&dispatcher), TodoStore::with_log(&log)).unwrap();
    assert_eq!(todos.dispatch_token(), ListenerId::new(1));

    dispatcher.dispatch(add_todo("VIEW", "x")).unwrap();
    dispatcher.dispatch(add_todo("VIEW", "y")).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["todo:add:VIEW:x", "stats:add", "todo:add:VIEW:y", "stats:add"]
    );
    assert_eq!(stats.with_state(|s| s.added), 2);
    assert_eq!(todos.with_state(|s| s.todos.len()), 2);
}

#[test]
fn stores_waiting_on_each_other_fail_with_circular_dependency() {
    let dispatcher = Arc::new(Dispatcher::new());
    let first = Store::new(
        Arc::clone(&dispatcher),
        WaitingStore {
            wait_on: ListenerId::new(1),
        },
    )
    .unwrap();
    let _second = Store::new(
        Arc::clone(&dispatcher),
        WaitingStore {
            wait_on: first.dispatch_token(),
        },
    )
    .unwrap();

    let err = dispatcher
        .dispatch(Payload::new("VIEW", Action::new("PING")))
        .unwrap_err();

    assert!(matches!(err, FluxError::CircularDependency(id) if id == first.dispatch_token()));
    assert!(!dispatcher.is_dispatching());
}

#[test]
fn handler_called_outside_dispatch_cannot_wait() {
    let dispatcher = Arc::new(Dispatcher::new());
    let store = Store::new(
        Arc::clone(&dispatcher),
        WaitingStore {
            wait_on: ListenerId::new(0),
        },
    )
    .unwrap();

    let err = store
        .handle_callback(&Payload::new("VIEW", Action::new("PING")))
        .unwrap_err();

    assert!(matches!(err, FluxError::NotDispatching));
}

// =========================================================================
// Namespace
// =========================================================================

#[test]
fn namespace_exposes_version_and_key_mirror() {
    assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    let names = key_mirror(["ADD_TODO", "REMOVE_TODO_ITEM"]);
    assert_eq!(names["REMOVE_TODO_ITEM"], "REMOVE_TODO_ITEM");
}
