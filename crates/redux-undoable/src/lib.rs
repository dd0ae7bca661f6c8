//! Persistent undo/redo history
//!
//! [`History`] wraps a value together with the states it can return to.
//! Every operation returns a new `History`; the original stays valid and
//! unchanged, and both share their common history.
//!
//! ```rust
//! use redux_undoable::History;
//!
//! let h = History::new(0);
//! let h = h.advance(|n| n + 1);
//! assert_eq!(*h.get(), 1);
//!
//! let h = h.undo().unwrap();
//! assert_eq!(*h.get(), 0);
//! assert!(h.can_redo());
//! ```

mod error;
mod history;
mod stack;

pub use error::HistoryError;
pub use history::History;
