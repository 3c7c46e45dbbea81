//! Stores: dispatcher callbacks that route actions to named handlers.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use flux_events::{Action, Payload};

use crate::dispatcher::{Dispatcher, ListenerId};
use crate::error::{FluxError, Result};
use crate::traits::StoreBehavior;

/// A store handler: mutates the store's state in response to one action.
pub type HandlerFn<S> = dyn Fn(&mut S, &Action, &StoreContext<'_>) -> Result<()> + Send + Sync;

/// Derive the handler name for an action: `"ADD_TODO"` becomes `"onAddTodo"`.
///
/// The name is lower-cased, then the first character and every character
/// following an underscore is upper-cased with that underscore dropped.
pub fn handler_name(action: &str) -> String {
    let lower = action.to_lowercase();
    let mut name = String::with_capacity(lower.len() + 2);
    name.push_str("on");

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
    }
    while let Some(c) = chars.next() {
        if c != '_' {
            name.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => name.extend(next.to_uppercase()),
            // trailing underscore has nothing to capitalise
            None => name.push('_'),
        }
    }
    name
}

/// Handler-name → handler map for one store type.
pub struct Handlers<S> {
    by_name: HashMap<String, Box<HandlerFn<S>>>,
}

impl<S> Handlers<S> {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Add a handler under an explicit name such as `"onAddTodo"`.
    pub fn handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut S, &Action, &StoreContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.by_name.insert(name.into(), Box::new(handler));
        self
    }

    /// Add a handler for an action name; the handler name is derived from it.
    pub fn on<F>(self, action: &str, handler: F) -> Self
    where
        F: Fn(&mut S, &Action, &StoreContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.handler(handler_name(action), handler)
    }

    pub fn get(&self, name: &str) -> Option<&HandlerFn<S>> {
        self.by_name.get(name).map(|handler| handler.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<S> Default for Handlers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Handlers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Handlers").field("names", &names).finish()
    }
}

/// What a handler can see of the running cycle besides its action.
pub struct StoreContext<'a> {
    dispatcher: &'a Dispatcher<Payload>,
    source: &'a str,
}

impl<'a> StoreContext<'a> {
    /// Make sure the given stores have handled the current payload first.
    pub fn wait_for(&self, ids: &[ListenerId]) -> Result<()> {
        self.dispatcher.wait_for(ids)
    }

    /// Source of the payload being handled.
    pub fn source(&self) -> &str {
        self.source
    }

    pub fn dispatcher(&self) -> &Dispatcher<Payload> {
        self.dispatcher
    }
}

struct StoreCore<S> {
    state: Mutex<S>,
    handlers: Handlers<S>,
    source: Option<String>,
}

impl<S: StoreBehavior> StoreCore<S> {
    fn handle_callback(&self, dispatcher: &Dispatcher<Payload>, payload: &Payload) -> Result<()> {
        let source = payload
            .source()
            .ok_or_else(|| FluxError::InvalidPayload("payload has no source".to_string()))?;
        let action = payload
            .action()
            .ok_or_else(|| FluxError::InvalidPayload("payload has no action".to_string()))?;

        if let Some(filter) = self.source.as_deref() {
            if filter != source {
                debug!(
                    store = type_name::<S>(),
                    filter,
                    source,
                    "Skipping payload from other source"
                );
                return Ok(());
            }
        }

        let name = handler_name(&action.name);
        let Some(handler) = self.handlers.get(&name) else {
            trace!(store = type_name::<S>(), handler = name.as_str(), "No handler");
            return Ok(());
        };

        let ctx = StoreContext { dispatcher, source };
        let mut state = self.state.lock();
        handler(&mut *state, action, &ctx)
    }
}

/// A store registered with exactly one dispatcher.
///
/// The dispatcher and the store's [`ListenerId`] are fixed at construction.
/// Other stores order themselves after this one by passing
/// [`Store::dispatch_token`] to `wait_for`.
pub struct Store<S> {
    dispatcher: Arc<Dispatcher<Payload>>,
    token: ListenerId,
    core: Arc<StoreCore<S>>,
}

impl<S: StoreBehavior> Store<S> {
    pub fn builder(behavior: S) -> StoreBuilder<S> {
        StoreBuilder {
            behavior,
            dispatcher: None,
            source: None,
        }
    }

    /// Build a store on `dispatcher` with the behavior's own source filter.
    pub fn new(dispatcher: Arc<Dispatcher<Payload>>, behavior: S) -> Result<Self> {
        Self::builder(behavior).dispatcher(dispatcher).build()
    }

    /// The id this store was registered under.
    pub fn dispatch_token(&self) -> ListenerId {
        self.token
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<Payload>> {
        &self.dispatcher
    }

    pub fn source(&self) -> Option<&str> {
        self.core.source.as_deref()
    }

    /// Read the store's state.
    ///
    /// Must not be called from this store's own handler, nor from a store
    /// this one is currently waiting on; read other stores only after
    /// `wait_for` has returned for them.
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&*self.core.state.lock())
    }

    /// Run this store's callback directly, outside the dispatcher's loop.
    /// Handlers that call `wait_for` fail with `NotDispatching` here.
    pub fn handle_callback(&self, payload: &Payload) -> Result<()> {
        self.core.handle_callback(&self.dispatcher, payload)
    }
}

impl<S> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("type", &type_name::<S>())
            .field("token", &self.token)
            .field("source", &self.core.source)
            .finish()
    }
}

pub struct StoreBuilder<S> {
    behavior: S,
    dispatcher: Option<Arc<Dispatcher<Payload>>>,
    source: Option<String>,
}

impl<S: StoreBehavior> StoreBuilder<S> {
    pub fn dispatcher(mut self, dispatcher: Arc<Dispatcher<Payload>>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Override the behavior's source filter.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Register with the dispatcher and run `initialize`.
    ///
    /// Fails with `MissingDispatcher`, before registering anything, if no
    /// dispatcher was supplied.
    pub fn build(self) -> Result<Store<S>> {
        let dispatcher = self.dispatcher.ok_or(FluxError::MissingDispatcher)?;
        let source = self
            .source
            .or_else(|| self.behavior.source().map(str::to_string));

        let core = Arc::new(StoreCore {
            state: Mutex::new(self.behavior),
            handlers: S::handlers(),
            source,
        });

        let callback_core = Arc::clone(&core);
        let token = dispatcher.register(move |dispatcher, payload| {
            callback_core.handle_callback(dispatcher, payload)
        });
        core.state.lock().initialize();

        debug!(
            store = type_name::<S>(),
            token = %token,
            handlers = core.handlers.len(),
            "Store registered"
        );

        Ok(Store {
            dispatcher,
            token,
            core,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_name_simple() {
        assert_eq!(handler_name("ADD_TODO"), "onAddTodo");
        assert_eq!(handler_name("REMOVE_TODO_ITEM"), "onRemoveTodoItem");
        assert_eq!(handler_name("refresh"), "onRefresh");
    }

    #[test]
    fn test_handler_name_edge_cases() {
        assert_eq!(handler_name(""), "on");
        assert_eq!(handler_name("ADD_"), "onAdd_");
        assert_eq!(handler_name("ADD__TODO"), "onAdd_todo");
        assert_eq!(handler_name("_PRIVATE"), "on_private");
        assert_eq!(handler_name("X"), "onX");
    }

    #[test]
    fn test_handlers_on_derives_name() {
        struct Counter(u32);
        let handlers = Handlers::<Counter>::new()
            .on("INCREMENT", |state, _, _| {
                state.0 += 1;
                Ok(())
            })
            .handler("onReset", |state, _, _| {
                state.0 = 0;
                Ok(())
            });

        assert_eq!(handlers.len(), 2);
        assert!(handlers.contains("onIncrement"));
        assert!(handlers.contains("onReset"));
        assert!(handlers.get("onDecrement").is_none());
        assert_eq!(format!("{handlers:?}"), r#"Handlers { names: ["onIncrement", "onReset"] }"#);
    }
}
