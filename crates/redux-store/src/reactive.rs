//! Stream-driven backend
//!
//! Instead of calling the reducer from the dispatch loop, the terminal stage
//! publishes every action onto an action bus. A [`StateDriver`] consumes the
//! bus, applies the bottomware transform once to the whole stream, splits off
//! runoff actions and folds the rest through the reducer:
//!
//! ```text
//! dispatch -> middleware chain -> bus -> bottomware -+-> reducer -> state -> subscribers
//!                                                    |
//!                                                    +-> runoff -> dispatch
//! ```
//!
//! The driver is an ordinary future; spawn it on whatever executor hosts the
//! application. Ordering of transformed actions is whatever the bottomware
//! stream emits, the driver folds them in emission order.
//!
//! Runoff actions go back through the middleware chain. If nothing on the
//! way consumes or rewrites them they reach the bus again, so a runoff
//! predicate must only match actions some middleware handles.

use std::pin::Pin;
use std::sync::{Arc, PoisonError, Weak};
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::dispatcher::{Engine, StateSlot};
use crate::error::{Error, Result};
use crate::middleware::Link;
use crate::options::{Ownership, StoreOptions};
use crate::proxy::Proxy;
use crate::store::Store;
use crate::subscribers::{Subscribers, Subscription};

type Reducer<S, A> = Box<dyn Fn(S, A) -> S + Send + Sync>;
type Bottomware<A> = Box<dyn FnOnce(BoxStream<'static, A>) -> BoxStream<'static, A> + Send>;
type RunoffPredicate<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;

/// Builder for a store running on the stream backend
///
/// Created with [`Store::reactive`]. Bottomware defaults to the identity
/// transform, the runoff predicate to "never".
pub struct ReactiveBuilder<S, A> {
    reducer: Reducer<S, A>,
    initial_state: S,
    bottomware: Option<Bottomware<A>>,
    runoff: RunoffPredicate<A>,
    options: StoreOptions,
}

impl<S, A> ReactiveBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new<R>(reducer: R, initial_state: S) -> Self
    where
        R: Fn(S, A) -> S + Send + Sync + 'static,
    {
        Self {
            reducer: Box::new(reducer),
            initial_state,
            bottomware: None,
            runoff: Box::new(|_: &A| false),
            options: StoreOptions::named("reactive"),
        }
    }

    /// Transform applied once to the whole action stream before folding
    pub fn bottomware<F>(mut self, bottomware: F) -> Self
    where
        F: FnOnce(BoxStream<'static, A>) -> BoxStream<'static, A> + Send + 'static,
    {
        self.bottomware = Some(Box::new(bottomware));
        self
    }

    /// Actions matching the predicate bypass the reducer and are dispatched again
    pub fn runoff<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.runoff = Box::new(predicate);
        self
    }

    /// Store options; the ownership policy is always [`Ownership::Any`]
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the store and the driver that feeds it
    pub fn build(self) -> (Store<S, A>, StateDriver<S, A>) {
        let ReactiveBuilder {
            reducer,
            initial_state,
            bottomware,
            runoff,
            options,
        } = self;

        if options.ownership != Ownership::Any {
            log::debug!(
                "{}: reactive store ignores ownership {:?}, using Any",
                options.name,
                options.ownership
            );
        }
        let options = StoreOptions {
            ownership: Ownership::Any,
            ..options
        };
        let name = options.name.clone();

        let (bus, receiver) = mpsc::unbounded::<A>();
        let terminal: Link<S, A> = Arc::new(move |_proxy: &Proxy<S, A>, action: A| {
            bus.unbounded_send(action)
                .map_err(|_| anyhow::Error::new(Error::Disconnected))
        });

        let subscribers = Subscribers::new();
        let engine = Engine::new(initial_state.clone(), terminal, options);

        let actions = receiver.boxed();
        let actions = match bottomware {
            Some(bottomware) => bottomware(actions),
            None => actions,
        };

        let driver = StateDriver {
            engine: Arc::downgrade(&engine),
            slot: engine.state_slot(),
            subscribers: Arc::clone(&subscribers),
            actions,
            reducer,
            runoff,
            state: initial_state,
            name,
        };

        (Store::from_parts(engine, subscribers), driver)
    }
}

/// Folds the transformed action stream into committed states
///
/// Completes once the store is dropped and every action it accepted has
/// come out of the bottomware, or with an error if redirecting a runoff
/// action fails. Actions still in flight when the store is dropped are
/// folded and delivered to state subscribers; proxy subscribers are skipped
/// and runoff actions are discarded, as there is no store to dispatch into.
pub struct StateDriver<S, A> {
    engine: Weak<Engine<S, A>>,
    slot: StateSlot<S>,
    subscribers: Arc<Subscribers<S, A>>,
    actions: BoxStream<'static, A>,
    reducer: Reducer<S, A>,
    runoff: RunoffPredicate<A>,
    state: S,
    name: String,
}

impl<S, A> StateDriver<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub async fn run(self) -> Result<()> {
        let StateDriver {
            engine,
            slot,
            subscribers,
            mut actions,
            reducer,
            runoff,
            mut state,
            name,
        } = self;

        log::debug!("{}: state driver started", name);

        while let Some(action) = actions.next().await {
            let engine = engine.upgrade();

            if runoff(&action) {
                match engine {
                    Some(engine) => {
                        log::trace!("{}: redirecting runoff action", name);
                        engine.dispatch(action)?;
                    }
                    None => log::warn!("{}: store dropped, discarding runoff action", name),
                }
                continue;
            }

            state = reducer(state, action);
            // Sole writer of the slot: subscribers calling get_state() see
            // exactly the state they are handed.
            *slot.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
            let proxy = engine.map(Proxy::new);
            subscribers.notify(&state, proxy.as_ref());
        }

        log::debug!("{}: state driver stopped", name);
        Ok(())
    }
}

/// Stream of every committed state, in commit order
///
/// Unsubscribes when dropped.
pub struct StateStream<S> {
    receiver: UnboundedReceiver<S>,
    subscription: Option<Subscription>,
}

impl<S> StateStream<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn subscribe<A>(subscribers: &Arc<Subscribers<S, A>>) -> Self
    where
        A: Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = subscribers.add_state(move |state: &S| {
            // Receiver gone means the stream is being dropped
            let _ = sender.unbounded_send(state.clone());
        });
        Self {
            receiver,
            subscription: Some(subscription),
        }
    }
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.get_mut().receiver.poll_next_unpin(cx)
    }
}

impl<S> Drop for StateStream<S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
