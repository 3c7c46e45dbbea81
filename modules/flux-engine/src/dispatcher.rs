//! The dispatch cycle.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::DispatcherConfig;
use crate::error::{FluxError, Result};

/// Identifies a registered callback. Assigned sequentially from zero and
/// never reused for the lifetime of its dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ListenerId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered listener. Receives the dispatcher it was registered with so
/// it can call [`Dispatcher::wait_for`] during the cycle.
pub type Callback<P> = dyn Fn(&Dispatcher<P>, &P) -> Result<()> + Send + Sync;

#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    pending: bool,
    handled: bool,
}

struct CycleState<P> {
    callbacks: Vec<Arc<Callback<P>>>,
    progress: Vec<Progress>,
    payload: Option<Arc<P>>,
    dispatching: bool,
}

/// Synchronous payload broker.
///
/// All methods take `&self`. The internal lock is never held while a callback
/// runs, so callbacks can register, wait for others, or (unsuccessfully) try
/// to dispatch again.
pub struct Dispatcher<P> {
    config: DispatcherConfig,
    state: Mutex<CycleState<P>>,
}

impl<P: fmt::Debug> Dispatcher<P> {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CycleState {
                callbacks: Vec::new(),
                progress: Vec::new(),
                payload: None,
                dispatching: false,
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Register a callback to be invoked with every dispatched payload.
    ///
    /// Allowed mid-cycle: the new callback is not part of the running cycle's
    /// pass, but other callbacks may already `wait_for` it.
    pub fn register<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Dispatcher<P>, &P) -> Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let id = ListenerId(state.callbacks.len());
        state.callbacks.push(Arc::new(callback));
        state.progress.push(Progress::default());
        trace!(dispatcher = %self.config.name, listener = %id, "Listener registered");
        id
    }

    /// Run one cycle: every registered callback sees `payload` exactly once,
    /// in registration order unless `wait_for` pulled it forward.
    ///
    /// The first callback error aborts the cycle. Callbacks not yet reached do
    /// not run, and the dispatcher is idle again by the time the error returns.
    pub fn dispatch(&self, payload: P) -> Result<()> {
        let listeners = {
            let mut state = self.state.lock();
            if state.dispatching {
                return Err(FluxError::ReentrantDispatch);
            }
            for progress in state.progress.iter_mut() {
                *progress = Progress::default();
            }
            if self.config.log_payloads {
                trace!(dispatcher = %self.config.name, payload = ?payload, "Payload");
            }
            state.payload = Some(Arc::new(payload));
            state.dispatching = true;
            state.callbacks.len()
        };
        let _idle = IdleOnDrop { state: &self.state };

        debug!(dispatcher = %self.config.name, listeners, "Dispatch started");

        for index in 0..listeners {
            let id = ListenerId(index);
            if self.state.lock().progress[index].pending {
                continue;
            }
            if let Err(e) = self.invoke(id) {
                warn!(dispatcher = %self.config.name, listener = %id, error = %e, "Dispatch aborted");
                return Err(e);
            }
        }

        debug!(dispatcher = %self.config.name, "Dispatch finished");
        Ok(())
    }

    /// Run the given callbacks now, before the caller continues.
    ///
    /// Only valid from inside a callback of the running cycle. Ids that have
    /// already finished this cycle are skipped; an id that has started but not
    /// finished means the caller is part of a cycle and fails.
    pub fn wait_for(&self, ids: &[ListenerId]) -> Result<()> {
        if !self.is_dispatching() {
            return Err(FluxError::NotDispatching);
        }

        for &id in ids {
            {
                let state = self.state.lock();
                match state.progress.get(id.0) {
                    Some(progress) if progress.pending && !progress.handled => {
                        return Err(FluxError::CircularDependency(id));
                    }
                    Some(progress) if progress.pending => continue,
                    Some(_) => {}
                    None => return Err(FluxError::UnknownListener(id)),
                }
            }
            trace!(dispatcher = %self.config.name, listener = %id, "Waiting for listener");
            self.invoke(id)?;
        }
        Ok(())
    }

    pub fn is_dispatching(&self) -> bool {
        self.state.lock().dispatching
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The only place a callback runs: pending, call, handled.
    fn invoke(&self, id: ListenerId) -> Result<()> {
        let (callback, payload) = {
            let mut state = self.state.lock();
            let callback = state
                .callbacks
                .get(id.0)
                .cloned()
                .ok_or(FluxError::UnknownListener(id))?;
            let payload = state.payload.clone().ok_or(FluxError::NotDispatching)?;
            state.progress[id.0].pending = true;
            (callback, payload)
        };

        trace!(dispatcher = %self.config.name, listener = %id, "Invoking listener");
        callback(self, &*payload)?;

        self.state.lock().progress[id.0].handled = true;
        Ok(())
    }
}

impl<P: fmt::Debug> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Dispatcher")
            .field("name", &self.config.name)
            .field("listeners", &state.callbacks.len())
            .field("dispatching", &state.dispatching)
            .finish()
    }
}

/// Returns the dispatcher to idle on every exit from `dispatch`, including
/// error returns and unwinding panics.
struct IdleOnDrop<'a, P> {
    state: &'a Mutex<CycleState<P>>,
}

impl<P> Drop for IdleOnDrop<'_, P> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.payload = None;
        state.dispatching = false;
    }
}
