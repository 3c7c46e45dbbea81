//! Action names understood by the todo stores.

flux_engine::action_names!(ADD_TODO, COMPLETE_TODO, REMOVE_TODO_ITEM);

/// Source for actions typed in by a user.
pub const VIEW: &str = "VIEW";
