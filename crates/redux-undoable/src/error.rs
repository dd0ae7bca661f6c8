use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Undo with an empty past, or redo with an empty future
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}
