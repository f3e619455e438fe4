use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use leadline_core::{RequestId, SendAs};

/// A file carried by an outgoing reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A validated reply ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    /// Request the reply answers.
    pub request_id: RequestId,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    /// Opaque body produced by the editor.
    pub body: String,
    /// Mailbox the reply is sent from.
    pub send_as: SendAs,
    pub attachments: Vec<OutgoingAttachment>,
}

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Backend-assigned message identifier, if any.
    pub message_id: Option<String>,
    /// Human-readable status (e.g. `"sent"`, `"logged"`).
    pub status: String,
}

/// Errors a delivery backend can report.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The backend refused the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend did not answer in time.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The backend is misconfigured.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl DeliveryError {
    /// Returns `true` if the error is transient and a later attempt may
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Transport for finished replies.
#[async_trait]
pub trait Delivery: Send + Sync + std::fmt::Debug {
    /// Hand `reply` to the transport.
    async fn deliver(&self, reply: &OutgoingReply) -> Result<DeliveryReceipt, DeliveryError>;

    /// Return the backend name (e.g. `"log"`).
    fn backend_name(&self) -> &'static str;
}

/// Delivery backend that records replies in the log and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, reply: &OutgoingReply) -> Result<DeliveryReceipt, DeliveryError> {
        let message_id = uuid::Uuid::new_v4().to_string();
        info!(
            message_id = %message_id,
            request_id = %reply.request_id,
            to = %reply.to,
            cc = %reply.cc,
            bcc = %reply.bcc,
            send_as = reply.send_as.label(),
            attachments = reply.attachments.len(),
            body_len = reply.body.len(),
            "reply delivered"
        );
        Ok(DeliveryReceipt {
            message_id: Some(message_id),
            status: "logged".to_owned(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply() -> OutgoingReply {
        OutgoingReply {
            request_id: RequestId::new("req-0001"),
            to: "ahmed@example.com".into(),
            cc: String::new(),
            bcc: String::new(),
            body: "Thanks for reaching out.".into(),
            send_as: SendAs::Company,
            attachments: vec![OutgoingAttachment {
                filename: "quote.pdf".into(),
                content_type: "application/pdf".into(),
                data: Bytes::from_static(b"%PDF"),
            }],
        }
    }

    #[tokio::test]
    async fn log_delivery_succeeds() {
        let receipt = LogDelivery.deliver(&reply()).await.unwrap();
        assert_eq!(receipt.status, "logged");
        assert!(receipt.message_id.is_some());
        assert_eq!(LogDelivery.backend_name(), "log");
    }

    #[test]
    fn retryable_errors() {
        assert!(DeliveryError::Connection("reset".into()).is_retryable());
        assert!(DeliveryError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!DeliveryError::Rejected("spam".into()).is_retryable());
        assert!(!DeliveryError::Configuration("no host".into()).is_retryable());
    }
}
