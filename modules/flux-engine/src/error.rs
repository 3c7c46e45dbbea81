use crate::dispatcher::ListenerId;

/// Result type alias for dispatcher and store operations.
pub type Result<T> = std::result::Result<T, FluxError>;

#[derive(Debug, thiserror::Error)]
pub enum FluxError {
    #[error("Cannot dispatch in the middle of a dispatch")]
    ReentrantDispatch,

    #[error("wait_for must be invoked while dispatching")]
    NotDispatching,

    #[error("Circular dependency detected while waiting for listener {0}")]
    CircularDependency(ListenerId),

    #[error("Listener {0} does not map to a registered callback")]
    UnknownListener(ListenerId),

    #[error("Store requires a dispatcher")]
    MissingDispatcher,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Listener(#[from] anyhow::Error),
}
