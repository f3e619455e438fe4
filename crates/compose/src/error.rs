use thiserror::Error;

use leadline_state::StateError;

use crate::delivery::DeliveryError;

/// Errors returned by the reply flow.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The reply is not ready to send.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation requires an open composer.
    #[error("no reply is being composed")]
    NotComposing,

    /// A reply is already open.
    #[error("a reply is already being composed")]
    AlreadyComposing,

    /// The draft store failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// The delivery backend failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ComposeError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Delivery(e) => e.is_retryable(),
            Self::State(StateError::Io(_) | StateError::Backend(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn error_display() {
        let err = ComposeError::Validation("recipient is required".into());
        assert_eq!(err.to_string(), "validation failed: recipient is required");
        assert_eq!(
            ComposeError::NotComposing.to_string(),
            "no reply is being composed"
        );
    }

    #[test]
    fn retryable_follows_the_cause() {
        let err = ComposeError::from(DeliveryError::Timeout(Duration::from_secs(5)));
        assert!(err.is_retryable());
        let err = ComposeError::from(DeliveryError::Rejected("bad address".into()));
        assert!(!err.is_retryable());
        assert!(!ComposeError::AlreadyComposing.is_retryable());
    }
}
