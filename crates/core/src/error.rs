use thiserror::Error;

use crate::types::RequestId;

/// Errors raised by the request store and snapshot ingestion.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("request not found: {0}")]
    NotFound(RequestId),

    #[error("duplicate request id: {0}")]
    DuplicateRequestId(RequestId),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
