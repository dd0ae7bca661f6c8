//! Dispatch queue and reentrancy guard
//!
//! Every dispatched action is pushed onto a FIFO queue. Whether the caller
//! then drains the queue depends on the ownership policy and on the
//! `draining` flag:
//!
//! - a caller that is not allowed to drain (a foreign thread under
//!   [`Ownership::Thread`]) only enqueues
//! - a caller that arrives while a drain is already running (a middleware or
//!   subscriber dispatching from inside the chain) only enqueues, the active
//!   drain loop picks the action up after the current one
//! - otherwise the caller becomes the drainer and processes actions until the
//!   queue is empty
//!
//! The flag lives under the queue lock. Push-and-claim and pop-or-release
//! are each one critical section, so a drainer can never give up the flag
//! while an action it did not see is sitting in the queue.
//!
//! The queue lock and the state lock are only held for push/pop and
//! read/swap. User code (middleware, reducer, subscribers) always runs with
//! no lock held.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use crate::error::{Error, Result};
use crate::middleware::{Chain, Link, Middleware};
use crate::options::{Ownership, StoreOptions};
use crate::proxy::Proxy;

/// Canonical state slot, shared with the reactive state driver
pub(crate) type StateSlot<S> = Arc<RwLock<S>>;

struct DispatchQueue<A> {
    actions: VecDeque<A>,
    draining: bool,
}

/// Shared core of a store: canonical state, pending actions, middleware chain
pub(crate) struct Engine<S, A> {
    options: StoreOptions,
    owner: ThreadId,
    state: StateSlot<S>,
    queue: Mutex<DispatchQueue<A>>,
    chain: RwLock<Chain<S, A>>,
}

/// Releases the drain flag when a drain ends early (error or unwind)
struct DrainGuard<'a, A> {
    queue: &'a Mutex<DispatchQueue<A>>,
    armed: bool,
}

impl<A> Drop for DrainGuard<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.queue).draining = false;
        }
    }
}

fn lock<A>(queue: &Mutex<DispatchQueue<A>>) -> MutexGuard<'_, DispatchQueue<A>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S, A> Engine<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new(initial_state: S, terminal: Link<S, A>, options: StoreOptions) -> Arc<Self> {
        log::debug!(
            "{}: created (ownership: {:?})",
            options.name,
            options.ownership
        );
        Arc::new(Self {
            options,
            owner: thread::current().id(),
            state: Arc::new(RwLock::new(initial_state)),
            queue: Mutex::new(DispatchQueue {
                actions: VecDeque::new(),
                draining: false,
            }),
            chain: RwLock::new(Chain::new(terminal)),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.options.name
    }

    /// Snapshot of the latest committed state
    pub(crate) fn get_state(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a newly committed state
    pub(crate) fn set_state(&self, next_state: S) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next_state;
    }

    pub(crate) fn state_slot(&self) -> StateSlot<S> {
        Arc::clone(&self.state)
    }

    pub(crate) fn apply_middleware(&self, middleware: Arc<dyn Middleware<S, A>>) {
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        chain.push(middleware);
        log::debug!("{}: applied middleware #{}", self.options.name, chain.len());
    }

    /// Number of queued actions not yet drained
    pub(crate) fn pending(&self) -> usize {
        lock(&self.queue).actions.len()
    }

    /// Enqueue an action and drain if this caller is allowed to
    pub(crate) fn dispatch(self: &Arc<Self>, action: A) -> Result<()> {
        let owning = self.is_owning_context();
        {
            let mut queue = lock(&self.queue);
            queue.actions.push_back(action);

            if !owning {
                log::trace!(
                    "{}: queued action from foreign thread ({} pending)",
                    self.options.name,
                    queue.actions.len()
                );
                return Ok(());
            }
            if queue.draining {
                // The active drain will reach the action we just queued
                return Ok(());
            }
            queue.draining = true;
        }

        self.drain()
    }

    fn is_owning_context(&self) -> bool {
        match self.options.ownership {
            Ownership::Thread => thread::current().id() == self.owner,
            Ownership::Any => true,
        }
    }

    /// Next action, or `None` after giving up the drain flag
    fn pop_or_release(&self) -> Option<A> {
        let mut queue = lock(&self.queue);
        let action = queue.actions.pop_front();
        if action.is_none() {
            queue.draining = false;
        }
        action
    }

    /// Runs with the drain flag held by the caller
    fn drain(self: &Arc<Self>) -> Result<()> {
        let mut guard = DrainGuard {
            queue: &self.queue,
            armed: true,
        };
        let proxy = Proxy::new(Arc::clone(self));

        while let Some(action) = self.pop_or_release() {
            if self.options.trace_actions {
                log::trace!(
                    "{}: processing action ({} pending)",
                    self.options.name,
                    self.pending()
                );
            }

            // Clone the head out so the chain lock is not held while user
            // code runs; middleware applied mid-drain affects later actions.
            let head = self
                .chain
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .head();

            if let Err(err) = head(&proxy, action) {
                let err = Error::from_chain(err);
                log::warn!(
                    "{}: drain aborted, {} action(s) left queued: {}",
                    self.options.name,
                    self.pending(),
                    err
                );
                return Err(err);
            }
        }

        // pop_or_release already cleared the flag
        guard.armed = false;
        Ok(())
    }

    #[cfg(test)]
    fn is_draining(&self) -> bool {
        lock(&self.queue).draining
    }
}

/// Cloneable handle for producers that only need to dispatch
///
/// The handle is `Send + Sync`, so it can be moved to worker threads. It
/// obeys the same ownership rule as the store: under [`Ownership::Thread`] a
/// dispatch from another thread is queued and drained by the next dispatch on
/// the owning thread.
pub struct Dispatcher<S, A> {
    engine: Arc<Engine<S, A>>,
}

impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S, A> Dispatcher<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new(engine: Arc<Engine<S, A>>) -> Self {
        Self { engine }
    }

    /// Dispatch an action to the store this handle belongs to
    pub fn dispatch(&self, action: A) -> Result<()> {
        self.engine.dispatch(action)
    }

    /// Number of queued actions not yet drained
    pub fn pending(&self) -> usize {
        self.engine.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_engine(ownership: Ownership) -> (Arc<Engine<i32, i32>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let terminal: Link<i32, i32> = Arc::new(move |proxy: &Proxy<i32, i32>, action: i32| {
            seen.fetch_add(1, Ordering::SeqCst);
            let state = proxy.get_state();
            proxy.commit(state + action);
            Ok(())
        });
        let options = StoreOptions {
            ownership,
            ..StoreOptions::named("test")
        };
        (Engine::new(0, terminal, options), calls)
    }

    #[test]
    fn test_owning_thread_drains_immediately() {
        let (engine, calls) = counting_engine(Ownership::Thread);
        engine.dispatch(5).unwrap();
        assert_eq!(engine.get_state(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_foreign_thread_only_enqueues() {
        let (engine, calls) = counting_engine(Ownership::Thread);
        let remote = Dispatcher::new(Arc::clone(&engine));

        thread::spawn(move || remote.dispatch(3).unwrap())
            .join()
            .unwrap();

        assert_eq!(engine.pending(), 1);
        assert_eq!(engine.get_state(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        engine.dispatch(1).unwrap();
        assert_eq!(engine.get_state(), 4);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_any_ownership_drains_on_foreign_thread() {
        let (engine, _calls) = counting_engine(Ownership::Any);
        let remote = Dispatcher::new(Arc::clone(&engine));

        thread::spawn(move || remote.dispatch(3).unwrap())
            .join()
            .unwrap();

        assert_eq!(engine.get_state(), 3);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_drain_flag_released_after_error() {
        let terminal: Link<i32, i32> = Arc::new(|proxy: &Proxy<i32, i32>, action: i32| {
            if action < 0 {
                anyhow::bail!("negative");
            }
            let state = proxy.get_state();
            proxy.commit(state + action);
            Ok(())
        });
        let engine = Engine::new(0, terminal, StoreOptions::default());

        assert!(engine.dispatch(-1).is_err());
        assert!(!engine.is_draining());

        engine.dispatch(2).unwrap();
        assert_eq!(engine.get_state(), 2);
    }

    #[test]
    fn test_drain_flag_released_after_panic() {
        let terminal: Link<i32, i32> = Arc::new(|proxy: &Proxy<i32, i32>, action: i32| {
            assert!(action >= 0, "negative");
            let state = proxy.get_state();
            proxy.commit(state + action);
            Ok(())
        });
        let engine = Engine::new(0, terminal, StoreOptions::default());

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.dispatch(-1)));
        assert!(unwound.is_err());
        assert!(!engine.is_draining());

        engine.dispatch(4).unwrap();
        assert_eq!(engine.get_state(), 4);
    }

    #[test]
    fn test_concurrent_dispatch_under_any_ownership_strands_nothing() {
        let (engine, calls) = counting_engine(Ownership::Any);

        thread::scope(|scope| {
            for _ in 0..8 {
                let remote = Dispatcher::new(Arc::clone(&engine));
                scope.spawn(move || {
                    for _ in 0..200 {
                        remote.dispatch(1).unwrap();
                    }
                });
            }
        });

        assert_eq!(engine.pending(), 0);
        assert!(!engine.is_draining());
        assert_eq!(engine.get_state(), 1600);
        assert_eq!(calls.load(Ordering::SeqCst), 1600);
    }
}
