use reverb_core::{BufferError, FormatError, defs::Paradigm};
use thiserror::Error;

use crate::request::RequestState;

// AM ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum AmError {
    /// No transport registered its constructors for the communicator's
    /// paradigm.
    #[error("no active-message transport registered for paradigm {0}")]
    UnsupportedParadigm(Paradigm),
    #[error("request cannot be started in state {0:?}")]
    InvalidRequestState(RequestState),
    /// Underlying transport failure; surfaces to the enclosing task, which
    /// may retry.
    #[error("transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl AmError {
    pub fn transport(message: impl Into<String>) -> Self {
        AmError::Transport(message.into())
    }
}
