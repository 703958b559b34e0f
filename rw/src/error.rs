//! Render coordination error types

use std::fmt;

use thiserror::Error;

/// Which terminal callback a configuration error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Ready,
    Redirect,
    NotFound,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackKind::Ready => "ready",
            CallbackKind::Redirect => "redirect",
            CallbackKind::NotFound => "not-found",
        };
        f.write_str(name)
    }
}

/// Errors raised by the coordinator and the dispatch pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// A dispatching operation ran before a store was bound (or after it was dropped)
    #[error("store must be bound before use")]
    StoreNotBound,

    /// A terminal callback was needed but never registered
    #[error("no {0} callback registered")]
    MissingCallback(CallbackKind),

    /// A namespaced action whose payload does not decode as a signal
    #[error("Malformed coordinator signal: {0}")]
    Signal(String),
}

impl RenderError {
    /// Precondition failures come from using the coordinator out of order
    pub fn is_precondition(&self) -> bool {
        matches!(self, RenderError::StoreNotBound)
    }

    /// Configuration failures come from an incompletely built coordinator
    pub fn is_configuration(&self) -> bool {
        matches!(self, RenderError::MissingCallback(_))
    }
}

/// Result alias for coordinator operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_bound_message() {
        let err = RenderError::StoreNotBound;
        assert_eq!(err.to_string(), "store must be bound before use");
        assert!(err.is_precondition());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_missing_callback_message() {
        let err = RenderError::MissingCallback(CallbackKind::NotFound);
        assert!(err.to_string().contains("not-found"));
        assert!(err.is_configuration());
    }
}
