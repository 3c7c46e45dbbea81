use anyhow::anyhow;
use flux_engine::{Action, Handlers, ListenerId, StoreBehavior, StoreContext};
use tracing::info;

use crate::actions::VIEW;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub title: String,
    pub done: bool,
}

fn title_of(action: &Action) -> flux_engine::Result<String> {
    action
        .get::<String>("title")
        .ok_or_else(|| anyhow!("{} requires a title", action.name).into())
}

// ---------------------------------------------------------------------------
// TodoStore
// ---------------------------------------------------------------------------

/// The list itself.
#[derive(Debug, Default)]
pub struct TodoStore {
    pub todos: Vec<Todo>,
}

impl TodoStore {
    fn on_add_todo(&mut self, action: &Action, _ctx: &StoreContext<'_>) -> flux_engine::Result<()> {
        let title = title_of(action)?;
        info!(title = title.as_str(), "Todo added");
        self.todos.push(Todo { title, done: false });
        Ok(())
    }

    fn on_complete_todo(
        &mut self,
        action: &Action,
        _ctx: &StoreContext<'_>,
    ) -> flux_engine::Result<()> {
        let title = title_of(action)?;
        for todo in self.todos.iter_mut().filter(|t| t.title == title) {
            todo.done = true;
        }
        Ok(())
    }

    fn on_remove_todo_item(
        &mut self,
        action: &Action,
        _ctx: &StoreContext<'_>,
    ) -> flux_engine::Result<()> {
        let title = title_of(action)?;
        self.todos.retain(|t| t.title != title);
        Ok(())
    }
}

impl StoreBehavior for TodoStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new()
            .handler("onAddTodo", Self::on_add_todo)
            .handler("onCompleteTodo", Self::on_complete_todo)
            .handler("onRemoveTodoItem", Self::on_remove_todo_item)
    }
}

// ---------------------------------------------------------------------------
// StatsStore
// ---------------------------------------------------------------------------

/// Counters that must only move once the todo list has taken the action.
#[derive(Debug)]
pub struct StatsStore {
    todo_token: ListenerId,
    pub added: u32,
    pub completed: u32,
    pub removed: u32,
}

impl StatsStore {
    pub fn new(todo_token: ListenerId) -> Self {
        Self {
            todo_token,
            added: 0,
            completed: 0,
            removed: 0,
        }
    }
}

impl StoreBehavior for StatsStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new()
            .on(crate::actions::ADD_TODO, |stats: &mut Self, _, ctx| {
                ctx.wait_for(&[stats.todo_token])?;
                stats.added += 1;
                Ok(())
            })
            .on(crate::actions::COMPLETE_TODO, |stats: &mut Self, _, ctx| {
                ctx.wait_for(&[stats.todo_token])?;
                stats.completed += 1;
                Ok(())
            })
            .on(crate::actions::REMOVE_TODO_ITEM, |stats: &mut Self, _, ctx| {
                ctx.wait_for(&[stats.todo_token])?;
                stats.removed += 1;
                Ok(())
            })
    }
}

// ---------------------------------------------------------------------------
// AuditStore
// ---------------------------------------------------------------------------

/// Records which actions a user triggered directly.
#[derive(Debug, Default)]
pub struct AuditStore {
    pub entries: Vec<String>,
}

impl AuditStore {
    fn record(&mut self, action: &Action, _ctx: &StoreContext<'_>) -> flux_engine::Result<()> {
        self.entries.push(action.name.clone());
        Ok(())
    }
}

impl StoreBehavior for AuditStore {
    fn handlers() -> Handlers<Self> {
        Handlers::new()
            .on(crate::actions::ADD_TODO, Self::record)
            .on(crate::actions::COMPLETE_TODO, Self::record)
            .on(crate::actions::REMOVE_TODO_ITEM, Self::record)
    }

    fn source(&self) -> Option<&str> {
        Some(VIEW)
    }
}
