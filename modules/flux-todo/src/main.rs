mod actions;
mod stores;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flux_engine::{Action, Dispatcher, DispatcherConfig, Payload, Store};

use crate::actions::{ADD_TODO, COMPLETE_TODO, REMOVE_TODO_ITEM};
use crate::stores::{AuditStore, StatsStore, TodoStore};

#[derive(Parser)]
#[command(name = "flux-todo", version = flux_engine::VERSION, about = "Drive a todo list through the flux dispatcher")]
struct Cli {
    /// Source recorded on every action built from flags
    #[arg(long, default_value = actions::VIEW)]
    source: String,

    /// Todo titles to add, in order
    #[arg(long = "add")]
    add: Vec<String>,

    /// Todo titles to mark as done
    #[arg(long = "complete")]
    complete: Vec<String>,

    /// Todo titles to remove
    #[arg(long = "remove")]
    remove: Vec<String>,

    /// Raw JSON payloads, dispatched after the flag-built actions
    #[arg(long = "payload")]
    payloads: Vec<String>,
}

impl Cli {
    fn build_payloads(&self) -> Result<Vec<Payload>> {
        let titled = |name: &str, title: String| {
            Payload::new(
                self.source.clone(),
                Action::new(name).with_field("title", title),
            )
        };

        let mut out = Vec::new();
        out.extend(self.add.iter().cloned().map(|t| titled(ADD_TODO, t)));
        out.extend(self.complete.iter().cloned().map(|t| titled(COMPLETE_TODO, t)));
        out.extend(self.remove.iter().cloned().map(|t| titled(REMOVE_TODO_ITEM, t)));
        for raw in &self.payloads {
            let payload =
                Payload::from_json(raw).with_context(|| format!("Invalid payload JSON: {raw}"))?;
            out.push(payload);
        }
        Ok(out)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = DispatcherConfig::from_env()?;
    tracing::info!(dispatcher = config.name.as_str(), version = flux_engine::VERSION, "Starting flux-todo");

    let dispatcher = Arc::new(Dispatcher::with_config(config));
    let todos = Store::new(Arc::clone(&dispatcher), TodoStore::default())?;
    let stats = Store::new(
        Arc::clone(&dispatcher),
        StatsStore::new(todos.dispatch_token()),
    )?;
    let audit = Store::new(Arc::clone(&dispatcher), AuditStore::default())?;

    for payload in cli.build_payloads()? {
        dispatcher
            .dispatch(payload)
            .context("Dispatch failed")?;
    }

    todos.with_state(|s| {
        for todo in &s.todos {
            let mark = if todo.done { "x" } else { " " };
            println!("[{mark}] {}", todo.title);
        }
    });
    stats.with_state(|s| {
        println!(
            "added={} completed={} removed={}",
            s.added, s.completed, s.removed
        );
    });
    audit.with_state(|s| println!("view actions: {}", s.entries.join(", ")));

    Ok(())
}
