//! Action payloads carried through one dispatch cycle.
//!
//! A payload names where it came from (`source`) and what happened
//! (`action`). The dispatcher never looks inside; stores read the action
//! name to pick a handler.

pub mod constants;
pub mod types;

pub use constants::key_mirror;
pub use types::{Action, Payload};
