use std::sync::Arc;

use crate::dispatcher::{Dispatcher, Engine};
use crate::error::Result;
use crate::middleware::{from_fn, Link, Middleware, Next};
use crate::options::StoreOptions;
use crate::proxy::Proxy;
use crate::reactive::{ReactiveBuilder, StateStream};
use crate::subscribers::{Subscribers, Subscription};

/// Store - holds the current state and runs the dispatch loop
///
/// Actions flow through the middleware chain into the reducer; every
/// reducer application commits a new state and notifies subscribers:
///
/// ```text
/// dispatch -> queue -> middleware chain -> reducer -> state -> subscribers
/// ```
///
/// # Example
///
/// ```rust
/// use redux_store::Store;
///
/// let store = Store::new(|state: i32, action: &'static str| match action {
///     "Increment" => state + 1,
///     "Decrement" => state - 1,
///     _ => state,
/// }, 0);
///
/// store.dispatch("Increment").unwrap();
/// store.dispatch("Increment").unwrap();
/// assert_eq!(store.get_state(), 2);
/// ```
pub struct Store<S, A> {
    engine: Arc<Engine<S, A>>,
    subscribers: Arc<Subscribers<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a store owned by the calling thread
    pub fn new<R>(reducer: R, initial_state: S) -> Self
    where
        R: Fn(S, A) -> S + Send + Sync + 'static,
    {
        Self::with_options(reducer, initial_state, StoreOptions::default())
    }

    /// Create a store with explicit options
    pub fn with_options<R>(reducer: R, initial_state: S, options: StoreOptions) -> Self
    where
        R: Fn(S, A) -> S + Send + Sync + 'static,
    {
        let subscribers = Subscribers::new();
        let terminal = reducer_stage(reducer, Arc::clone(&subscribers));
        Self {
            engine: Engine::new(initial_state, terminal, options),
            subscribers,
        }
    }

    /// Start building a store that runs on the stream backend
    ///
    /// See [`crate::reactive`] for how actions travel through it.
    pub fn reactive<R>(reducer: R, initial_state: S) -> ReactiveBuilder<S, A>
    where
        R: Fn(S, A) -> S + Send + Sync + 'static,
    {
        ReactiveBuilder::new(reducer, initial_state)
    }

    pub(crate) fn from_parts(engine: Arc<Engine<S, A>>, subscribers: Arc<Subscribers<S, A>>) -> Self {
        Self {
            engine,
            subscribers,
        }
    }

    /// Dispatch an action
    ///
    /// On the owning context this processes the action and everything it
    /// triggers before returning. Elsewhere the action is only queued.
    pub fn dispatch(&self, action: A) -> Result<()> {
        self.engine.dispatch(action)
    }

    /// Latest committed state
    pub fn get_state(&self) -> S {
        self.engine.get_state()
    }

    /// Register a callback invoked with every committed state
    pub fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let subscription = self.subscribers.add_state(subscriber);
        log::debug!(
            "{}: subscriber {:?} added",
            self.engine.name(),
            subscription.id()
        );
        subscription
    }

    /// Register a callback invoked with a store proxy after every commit
    ///
    /// Actions dispatched from the callback are queued behind the action
    /// whose commit triggered it.
    pub fn subscribe_proxy<F>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&Proxy<S, A>) + Send + Sync + 'static,
    {
        let subscription = self.subscribers.add_proxy(subscriber);
        log::debug!(
            "{}: proxy subscriber {:?} added",
            self.engine.name(),
            subscription.id()
        );
        subscription
    }

    /// Every committed state as a stream; unsubscribes when dropped
    pub fn state_stream(&self) -> StateStream<S> {
        StateStream::subscribe(&self.subscribers)
    }

    /// Add middleware; it intercepts actions before all previously applied
    /// middleware. Only actions processed after this call are affected.
    pub fn apply_middleware<M>(&self, middleware: M) -> &Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.engine.apply_middleware(Arc::new(middleware));
        self
    }

    /// Add a closure as middleware
    pub fn apply_middleware_fn<F>(&self, middleware: F) -> &Self
    where
        F: Fn(&Proxy<S, A>, Next<'_, S, A>, A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.apply_middleware(from_fn(middleware))
    }

    /// Cloneable handle for dispatching from other threads
    pub fn dispatcher(&self) -> Dispatcher<S, A> {
        Dispatcher::new(Arc::clone(&self.engine))
    }

    /// Number of queued actions not yet drained
    pub fn pending(&self) -> usize {
        self.engine.pending()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Terminal stage: reduce, commit, notify
fn reducer_stage<S, A, R>(reducer: R, subscribers: Arc<Subscribers<S, A>>) -> Link<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
    R: Fn(S, A) -> S + Send + Sync + 'static,
{
    Arc::new(move |proxy: &Proxy<S, A>, action: A| {
        let next_state = reducer(proxy.get_state(), action);
        proxy.commit(next_state.clone());
        subscribers.notify(&next_state, Some(proxy));
        Ok(())
    })
}
