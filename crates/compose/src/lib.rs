//! Reply composition for Leadline.
//!
//! [`ReplyFlow`] drives a single reply from opening the composer to handing
//! the message to a [`Delivery`] backend. Drafts are persisted through
//! [`DraftStore`] on top of any [`leadline_state::StateStore`] and saved
//! periodically by an [`AutosaveHandle`] while the composer is open.

pub mod attachment;
pub mod autosave;
pub mod config;
pub mod delivery;
pub mod draft;
pub mod error;
pub mod flow;

pub use attachment::{
    AttachmentKind, AttachmentLimits, AttachmentStager, FileCandidate, RejectReason, Rejection,
    StagedAttachment, StagingReport, format_size,
};
pub use autosave::AutosaveHandle;
pub use config::ComposeConfig;
pub use delivery::{
    Delivery, DeliveryError, DeliveryReceipt, LogDelivery, OutgoingAttachment, OutgoingReply,
};
pub use draft::{Draft, DraftFields, DraftStore};
pub use error::ComposeError;
pub use flow::{FlowPhase, ReplyFlow, StartOutcome};
