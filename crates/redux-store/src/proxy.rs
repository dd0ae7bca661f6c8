//! Capability object handed to middleware and proxy-shaped subscribers

use std::sync::Arc;

use crate::dispatcher::Engine;
use crate::error::Result;

/// Read the current state and dispatch further actions
///
/// The proxy deliberately offers nothing else: middleware cannot register
/// subscribers or change the shape of the chain.
pub struct Proxy<S, A> {
    engine: Arc<Engine<S, A>>,
}

impl<S, A> Clone for Proxy<S, A> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S, A> Proxy<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new(engine: Arc<Engine<S, A>>) -> Self {
        Self { engine }
    }

    /// Snapshot of the latest committed state
    pub fn get_state(&self) -> S {
        self.engine.get_state()
    }

    /// Dispatch an action
    ///
    /// Called from inside the chain, the action is queued behind the one
    /// being processed and handled once the current action has finished.
    pub fn dispatch(&self, action: A) -> Result<()> {
        self.engine.dispatch(action)
    }

    /// Write a newly reduced state (terminal stages only)
    pub(crate) fn commit(&self, next_state: S) {
        self.engine.set_state(next_state);
    }
}
