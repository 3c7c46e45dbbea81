//! The contract a store type implements.

use crate::store::Handlers;

/// State plus handlers for one kind of store.
///
/// `handlers()` is called once per store at construction; it maps handler
/// names (`onAddTodo`) to functions over `&mut Self`. Actions whose derived
/// name is not in the map are ignored by this store.
pub trait StoreBehavior: Send + 'static {
    fn handlers() -> Handlers<Self>
    where
        Self: Sized;

    /// Only react to payloads from this source. `None` accepts every source.
    fn source(&self) -> Option<&str> {
        None
    }

    /// Called once, after the store has been registered with its dispatcher.
    fn initialize(&mut self) {}
}
