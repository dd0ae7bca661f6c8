//! Demo middleware
//!
//! Applied in the order DispatchMore, LogState, CancelIfEmpty, so an action
//! passes CancelIfEmpty first and DispatchMore last before the reducer.

use redux_store::{Middleware, Next, Proxy};

use crate::reducer::{Action, State};

/// LogStateMiddleware - prints the state on "Log" and swallows the action
pub struct LogStateMiddleware;

impl Middleware<State, Action> for LogStateMiddleware {
    fn handle(&self, store: &Proxy<State, Action>, next: Next<'_, State, Action>, action: Action) -> anyhow::Result<()> {
        if action == "Log" {
            println!("The state is {}", store.get_state());
            return Ok(());
        }
        next.run(action)
    }
}

/// CancelIfEmptyMiddleware - drops empty actions
pub struct CancelIfEmptyMiddleware;

impl Middleware<State, Action> for CancelIfEmptyMiddleware {
    fn handle(&self, _store: &Proxy<State, Action>, next: Next<'_, State, Action>, action: Action) -> anyhow::Result<()> {
        if action.is_empty() {
            println!("That was an empty action!");
            return Ok(());
        }
        next.run(action)
    }
}

/// DispatchMoreMiddleware - expands "Dispatch" into four follow-up actions
pub struct DispatchMoreMiddleware;

impl Middleware<State, Action> for DispatchMoreMiddleware {
    fn handle(&self, store: &Proxy<State, Action>, next: Next<'_, State, Action>, action: Action) -> anyhow::Result<()> {
        if action != "Dispatch" {
            return next.run(action);
        }
        log::debug!("Expanding Dispatch into follow-up actions");
        for follow_up in ["Increment", "Log", "Increment", "Log"] {
            store.dispatch(follow_up.to_string())?;
        }
        Ok(())
    }
}
