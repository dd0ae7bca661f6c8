//! Middleware chain
//!
//! Middleware sits between `dispatch` and the reducer:
//!
//! ```text
//! dispatch -> Mn -> ... -> M2 -> M1 -> reducer -> state -> subscribers
//! ```
//!
//! Each `apply_middleware` call wraps the current head of the chain, so the
//! middleware applied last sees every action first. A middleware can:
//! - forward the action unchanged with `next.run(action)`
//! - forward a different action (transform)
//! - not call `next` at all (drop the action)
//! - call `next` several times, or dispatch new actions through the proxy
//!
//! Actions dispatched through the proxy are queued behind the action that is
//! currently being processed, they never re-enter the chain recursively.

use std::sync::Arc;

use crate::proxy::Proxy;

/// A composed pipeline stage: the terminal stage or a middleware wrapping one
pub(crate) type Link<S, A> = Arc<dyn Fn(&Proxy<S, A>, A) -> anyhow::Result<()> + Send + Sync>;

/// Middleware trait - intercepts actions before they reach the reducer
///
/// # Example
///
/// ```rust
/// use redux_store::{Middleware, Next, Proxy};
///
/// struct CancelIfEmpty;
///
/// impl Middleware<i32, String> for CancelIfEmpty {
///     fn handle(&self, _store: &Proxy<i32, String>, next: Next<'_, i32, String>, action: String) -> anyhow::Result<()> {
///         if action.is_empty() {
///             return Ok(()); // dropped
///         }
///         next.run(action)
///     }
/// }
/// ```
pub trait Middleware<S, A>: Send + Sync {
    /// Handle an action
    ///
    /// - `store`: read state, dispatch follow-up actions
    /// - `next`: the rest of the chain as it was when this middleware was applied
    /// - `action`: the action, owned
    fn handle(&self, store: &Proxy<S, A>, next: Next<'_, S, A>, action: A) -> anyhow::Result<()>;
}

/// Continuation handed to a middleware: everything after it in the chain
pub struct Next<'a, S, A> {
    proxy: &'a Proxy<S, A>,
    link: &'a Link<S, A>,
}

impl<S, A> Clone for Next<'_, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A> Copy for Next<'_, S, A> {}

impl<'a, S, A> Next<'a, S, A> {
    pub(crate) fn new(proxy: &'a Proxy<S, A>, link: &'a Link<S, A>) -> Self {
        Self { proxy, link }
    }

    /// Pass an action on to the rest of the chain
    pub fn run(&self, action: A) -> anyhow::Result<()> {
        (self.link)(self.proxy, action)
    }
}

/// Middleware built from a plain function or closure
pub struct FnMiddleware<F> {
    f: F,
}

/// Wrap a function with the middleware signature
///
/// Mostly useful with named functions; closures passed to
/// `Store::apply_middleware_fn` get their types inferred from the store.
pub fn from_fn<F>(f: F) -> FnMiddleware<F> {
    FnMiddleware { f }
}

impl<S, A, F> Middleware<S, A> for FnMiddleware<F>
where
    F: Fn(&Proxy<S, A>, Next<'_, S, A>, A) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, store: &Proxy<S, A>, next: Next<'_, S, A>, action: A) -> anyhow::Result<()> {
        (self.f)(store, next, action)
    }
}

/// Ordered middleware plus the terminal stage, composed into a single head
pub(crate) struct Chain<S, A> {
    terminal: Link<S, A>,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
    head: Link<S, A>,
}

impl<S: 'static, A: 'static> Chain<S, A> {
    pub(crate) fn new(terminal: Link<S, A>) -> Self {
        Self {
            head: Arc::clone(&terminal),
            terminal,
            middleware: Vec::new(),
        }
    }

    /// Append a middleware and recompose; it becomes the outermost stage
    pub(crate) fn push(&mut self, middleware: Arc<dyn Middleware<S, A>>) {
        self.middleware.push(middleware);
        self.head = compose(&self.terminal, &self.middleware);
    }

    pub(crate) fn head(&self) -> Link<S, A> {
        Arc::clone(&self.head)
    }

    pub(crate) fn len(&self) -> usize {
        self.middleware.len()
    }
}

/// Fold the middleware (in application order) around the terminal stage
fn compose<S: 'static, A: 'static>(
    terminal: &Link<S, A>,
    middleware: &[Arc<dyn Middleware<S, A>>],
) -> Link<S, A> {
    middleware.iter().fold(Arc::clone(terminal), |next, mw| {
        let mw = Arc::clone(mw);
        let link: Link<S, A> = Arc::new(move |proxy: &Proxy<S, A>, action: A| {
            mw.handle(proxy, Next::new(proxy, &next), action)
        });
        link
    })
}
