//! Error type shared by the synchronous and reactive stores

use thiserror::Error;

/// Errors surfaced by [`Store::dispatch`](crate::Store::dispatch) and friends
#[derive(Debug, Error)]
pub enum Error {
    /// A middleware returned an error while processing an action.
    ///
    /// The drain loop stops at the failing action. State committed for
    /// earlier actions is kept and the rest of the queue stays pending.
    #[error("middleware rejected action: {0:#}")]
    Middleware(anyhow::Error),

    /// The reactive state driver has been dropped, so the action bus is closed
    #[error("reactive state driver has stopped")]
    Disconnected,

    /// Store options could not be parsed
    #[error("invalid store configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Recover a store error that travelled through a middleware as `anyhow::Error`
    pub(crate) fn from_chain(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => err,
            Err(err) => Error::Middleware(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
