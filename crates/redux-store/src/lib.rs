//! Unidirectional state store
//!
//! A single current state is produced by folding dispatched actions through
//! a pure reducer. Cross-cutting behaviour (logging, filtering, turning one
//! action into several) is layered on as middleware without touching the
//! reducer or the code that dispatches.
//!
//! This crate provides:
//! - [`Store`]: owns the state, the dispatch queue, the middleware chain and
//!   the subscribers
//! - [`Middleware`] / [`Next`] / [`Proxy`]: the interception protocol
//! - [`Dispatcher`]: a cloneable handle for producers on other threads
//! - [`reactive`]: an alternative backend where a stream folds the actions
//!
//! Actions are processed strictly in the order they were submitted, including
//! actions dispatched while another action is being processed.

pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod options;
pub mod proxy;
pub mod reactive;
pub mod store;
pub mod subscribers;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use middleware::{from_fn, FnMiddleware, Middleware, Next};
pub use options::{Ownership, StoreOptions};
pub use proxy::Proxy;
pub use reactive::{ReactiveBuilder, StateDriver, StateStream};
pub use store::Store;
pub use subscribers::{Subscription, SubscriptionId};
