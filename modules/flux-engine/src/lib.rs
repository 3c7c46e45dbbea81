//! Synchronous action dispatcher.
//!
//! A `Dispatcher` hands every payload to each registered callback exactly
//! once per cycle. Callbacks may pull other callbacks forward with
//! `wait_for`, which is how ordering between stores is declared.
//!
//! Stores are the usual consumers: implement `StoreBehavior` with a handler
//! map, build a `Store` against a shared dispatcher, and each action name is
//! routed to the matching `onXxx` handler.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod store;
pub mod traits;

pub use config::DispatcherConfig;
pub use dispatcher::{Callback, Dispatcher, ListenerId};
pub use error::{FluxError, Result};
pub use store::{handler_name, Handlers, Store, StoreBuilder, StoreContext};
pub use traits::StoreBehavior;

pub use flux_events::{self as events, action_names, key_mirror, Action, Payload};

/// Version of this crate, fixed at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
