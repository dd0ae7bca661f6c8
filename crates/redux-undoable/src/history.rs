use std::fmt;

use crate::error::HistoryError;
use crate::stack::Stack;

/// A value plus the states it can undo to and redo to
///
/// - `past`: earlier values, most recent on top
/// - `future`: undone values, most recently undone on top
///
/// Editing after an undo (`advance` or `replace`) discards the future.
pub struct History<T> {
    present: T,
    past: Stack<T>,
    future: Stack<T>,
}

impl<T: Clone> History<T> {
    /// History with no past and no future
    pub fn new(present: T) -> Self {
        Self {
            present,
            past: Stack::new(),
            future: Stack::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.present
    }

    pub fn into_present(self) -> T {
        self.present
    }

    /// Apply an undoable edit: the current value moves onto the past
    pub fn advance<F>(&self, f: F) -> Self
    where
        F: FnOnce(&T) -> T,
    {
        Self {
            present: f(&self.present),
            past: self.past.push(self.present.clone()),
            future: Stack::new(),
        }
    }

    /// Apply an edit that is not recorded as its own undo step
    pub fn replace<F>(&self, f: F) -> Self
    where
        F: FnOnce(&T) -> T,
    {
        Self {
            present: f(&self.present),
            past: self.past.clone(),
            future: Stack::new(),
        }
    }

    pub fn undo(&self) -> Result<Self, HistoryError> {
        let (previous, past) = self
            .past
            .pop()
            .ok_or(HistoryError::InvalidOperation("cannot undo"))?;

        Ok(Self {
            present: previous.clone(),
            past,
            future: self.future.push(self.present.clone()),
        })
    }

    pub fn redo(&self) -> Result<Self, HistoryError> {
        let (next, future) = self
            .future
            .pop()
            .ok_or(HistoryError::InvalidOperation("cannot redo"))?;

        Ok(Self {
            present: next.clone(),
            past: self.past.push(self.present.clone()),
            future,
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Earlier values, most recent first
    pub fn past(&self) -> impl Iterator<Item = &T> {
        self.past.iter()
    }

    /// Undone values, most recently undone first
    pub fn future(&self) -> impl Iterator<Item = &T> {
        self.future.iter()
    }

    /// Same present, no past, no future
    pub fn clear_history(&self) -> Self {
        Self::new(self.present.clone())
    }
}

impl<T: Clone + Default> Default for History<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            present: self.present.clone(),
            past: self.past.clone(),
            future: self.future.clone(),
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for History<T> {
    fn eq(&self, other: &Self) -> bool {
        self.present == other.present
            && self.past_len() == other.past_len()
            && self.future_len() == other.future_len()
            && self.past().eq(other.past())
            && self.future().eq(other.future())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for History<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("present", &self.present)
            .field("past", &self.past().collect::<Vec<_>>())
            .field("future", &self.future().collect::<Vec<_>>())
            .finish()
    }
}
