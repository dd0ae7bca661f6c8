//! Subscriber registry
//!
//! Notification policy:
//! - subscribers are called in registration order, once per committed state
//! - each notification walks a snapshot of the list taken when it starts, so
//!   a subscriber added during a notification is first called on the next
//!   commit
//! - a subscriber removed during a notification is skipped if it has not
//!   been reached yet

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::proxy::Proxy;

/// Identifier of a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

enum Callback<S, A> {
    State(Box<dyn Fn(&S) + Send + Sync>),
    Proxy(Box<dyn Fn(&Proxy<S, A>) + Send + Sync>),
}

struct Entry<S, A> {
    id: SubscriptionId,
    active: AtomicBool,
    callback: Callback<S, A>,
}

pub(crate) struct Subscribers<S, A> {
    next_id: AtomicU64,
    entries: Mutex<Vec<Arc<Entry<S, A>>>>,
}

/// Anything a [`Subscription`] can unregister itself from
trait Registry: Send + Sync {
    fn remove(&self, id: SubscriptionId) -> bool;
}

impl<S, A> Subscribers<S, A>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn add_state<F>(self: &Arc<Self>, f: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.add(Callback::State(Box::new(f)))
    }

    pub(crate) fn add_proxy<F>(self: &Arc<Self>, f: F) -> Subscription
    where
        F: Fn(&Proxy<S, A>) + Send + Sync + 'static,
    {
        self.add(Callback::Proxy(Box::new(f)))
    }

    fn add(self: &Arc<Self>, callback: Callback<S, A>) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push(Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            callback,
        }));

        let registry: Arc<dyn Registry> = Arc::clone(self) as Arc<dyn Registry>;
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    /// Call every subscriber with the state that was just committed
    ///
    /// Without a proxy (the store is gone) only state-shaped subscribers run.
    pub(crate) fn notify(&self, state: &S, proxy: Option<&Proxy<S, A>>) {
        let snapshot: Vec<Arc<Entry<S, A>>> = self.entries().clone();

        for entry in snapshot {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            match (&entry.callback, proxy) {
                (Callback::State(f), _) => f(state),
                (Callback::Proxy(f), Some(proxy)) => f(proxy),
                (Callback::Proxy(_), None) => {}
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Arc<Entry<S, A>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, A> Registry for Subscribers<S, A>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = entries.remove(index);
        entry.active.store(false, Ordering::Release);
        log::debug!("subscriber {:?} removed", id);
        true
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle keeps the subscriber registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<dyn Registry>,
}

impl Subscription {
    /// Identifier of the registered subscriber
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the subscriber. Returns `false` if it was already gone or the
    /// store no longer exists.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
