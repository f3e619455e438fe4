use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, field, info, instrument, warn};

use leadline_core::{AttachmentId, DraftKey, Request, RequestId, SendAs};

use crate::attachment::{AttachmentStager, FileCandidate, StagedAttachment, StagingReport};
use crate::autosave::{self, AutosaveHandle, Composer, SharedComposer};
use crate::config::ComposeConfig;
use crate::delivery::{Delivery, DeliveryReceipt, OutgoingAttachment, OutgoingReply};
use crate::draft::{Draft, DraftFields, DraftStore};
use crate::error::ComposeError;

/// Where the reply flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    Composing,
    Sending,
}

/// Result of opening the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// Key the draft is stored under.
    pub key: DraftKey,
    /// Whether a saved draft was loaded over the prefilled fields.
    pub restored: bool,
}

/// State that only exists while a reply is open.
#[derive(Debug)]
struct Session {
    request_id: RequestId,
    key: DraftKey,
    composer: SharedComposer,
    attachments: AttachmentStager,
    autosave: Option<AutosaveHandle>,
}

/// Drives one reply at a time from opening the composer to delivery.
///
/// Opening prefills the recipient and signature, restores a saved draft with a
/// non-empty body and arms autosave. Sending validates, stops autosave, clears
/// the draft and hands the reply to the [`Delivery`] backend.
#[derive(Debug)]
pub struct ReplyFlow {
    config: ComposeConfig,
    drafts: DraftStore,
    delivery: Arc<dyn Delivery>,
    phase: FlowPhase,
    session: Option<Session>,
}

impl ReplyFlow {
    pub fn new(config: ComposeConfig, drafts: DraftStore, delivery: Arc<dyn Delivery>) -> Self {
        Self {
            config,
            drafts,
            delivery,
            phase: FlowPhase::Idle,
            session: None,
        }
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// Request the open reply answers.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.session.as_ref().map(|s| &s.request_id)
    }

    /// Current field values of the open reply.
    pub fn fields(&self) -> Option<DraftFields> {
        self.session
            .as_ref()
            .map(|s| s.composer.lock().fields().clone())
    }

    /// Whether the open reply has edits not yet written to the draft store.
    pub fn is_dirty(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.composer.lock().is_dirty())
    }

    /// When the open reply was last written to the draft store.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.session
            .as_ref()
            .and_then(|s| s.composer.lock().last_saved())
    }

    pub fn attachments(&self) -> &[StagedAttachment] {
        match &self.session {
            Some(session) => session.attachments.staged(),
            None => &[],
        }
    }

    /// Open the composer for `request`.
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn start(&mut self, request: &Request) -> Result<StartOutcome, ComposeError> {
        if self.session.is_some() {
            return Err(ComposeError::AlreadyComposing);
        }

        let key = DraftKey::from(&request.id);
        let mut fields = DraftFields {
            to: request.sender_email.clone(),
            cc: String::new(),
            bcc: String::new(),
            body: self.config.initial_body(),
            send_as: self.config.default_send_as,
        };
        let mut last_saved = None;

        let restored = match self.drafts.load(&key).await? {
            Some(Draft {
                fields: saved,
                saved_at,
            }) if !saved.body.is_empty() => {
                info!(key = %key, %saved_at, "restored saved draft");
                fields = fields.restore(saved);
                last_saved = Some(saved_at);
                true
            }
            _ => false,
        };

        let composer = Arc::new(Mutex::new(Composer::new(fields, last_saved)));
        let mut session = Session {
            request_id: request.id.clone(),
            key: key.clone(),
            composer,
            attachments: AttachmentStager::new(self.config.limits),
            autosave: None,
        };
        self.arm_autosave(&mut session);
        self.session = Some(session);
        self.phase = FlowPhase::Composing;

        Ok(StartOutcome { key, restored })
    }

    fn arm_autosave(&self, session: &mut Session) {
        session.autosave = Some(AutosaveHandle::spawn(
            self.drafts.clone(),
            session.key.clone(),
            Arc::clone(&session.composer),
            self.config.autosave_interval,
        ));
    }

    fn composing(&mut self) -> Result<&mut Session, ComposeError> {
        match (self.phase, self.session.as_mut()) {
            (FlowPhase::Composing, Some(session)) => Ok(session),
            _ => Err(ComposeError::NotComposing),
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut DraftFields)) -> Result<(), ComposeError> {
        self.composing()?.composer.lock().edit(f);
        Ok(())
    }

    pub fn set_to(&mut self, to: impl Into<String>) -> Result<(), ComposeError> {
        let to = to.into();
        self.edit(|f| f.to = to)
    }

    pub fn set_cc(&mut self, cc: impl Into<String>) -> Result<(), ComposeError> {
        let cc = cc.into();
        self.edit(|f| f.cc = cc)
    }

    pub fn set_bcc(&mut self, bcc: impl Into<String>) -> Result<(), ComposeError> {
        let bcc = bcc.into();
        self.edit(|f| f.bcc = bcc)
    }

    /// Replace the body with the editor's current output.
    pub fn set_body(&mut self, body: impl Into<String>) -> Result<(), ComposeError> {
        let body = body.into();
        self.edit(|f| f.body = body)
    }

    pub fn set_send_as(&mut self, send_as: SendAs) -> Result<(), ComposeError> {
        self.edit(|f| f.send_as = send_as)
    }

    /// Stage files on the open reply.
    pub fn add_files(
        &mut self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> Result<StagingReport, ComposeError> {
        Ok(self.composing()?.attachments.add_files(candidates))
    }

    /// Unstage an attachment. Returns `false` if it was not staged.
    pub fn remove_attachment(&mut self, id: &AttachmentId) -> Result<bool, ComposeError> {
        Ok(self.composing()?.attachments.remove(id))
    }

    /// Write the open reply to the draft store now.
    pub async fn save_draft(&mut self) -> Result<Draft, ComposeError> {
        let drafts = self.drafts.clone();
        let session = self.composing()?;
        Ok(autosave::save_now(&drafts, &session.key, &session.composer).await?)
    }

    /// Validate and deliver the open reply.
    ///
    /// On a validation error nothing changes. On a delivery error the reply is
    /// saved back to the draft store and the composer stays open.
    #[instrument(skip(self), fields(request_id))]
    pub async fn send(&mut self) -> Result<DeliveryReceipt, ComposeError> {
        let session = self.composing()?;
        tracing::Span::current().record("request_id", field::display(&session.request_id));
        let fields = session.composer.lock().fields().clone();
        validate(&fields)?;

        let Some(mut session) = self.session.take() else {
            return Err(ComposeError::NotComposing);
        };
        self.phase = FlowPhase::Sending;

        if let Some(handle) = session.autosave.take() {
            handle.stop().await;
        }
        if let Err(e) = self.drafts.clear(&session.key).await {
            self.resume(session);
            return Err(e.into());
        }

        let reply = OutgoingReply {
            request_id: session.request_id.clone(),
            to: fields.to.clone(),
            cc: fields.cc.clone(),
            bcc: fields.bcc.clone(),
            body: fields.body.clone(),
            send_as: fields.send_as,
            attachments: session
                .attachments
                .staged()
                .iter()
                .map(OutgoingAttachment::from)
                .collect(),
        };

        match self.delivery.deliver(&reply).await {
            Ok(receipt) => {
                info!(
                    backend = self.delivery.backend_name(),
                    message_id = ?receipt.message_id,
                    attachments = reply.attachments.len(),
                    "reply sent"
                );
                self.phase = FlowPhase::Idle;
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    backend = self.delivery.backend_name(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "delivery failed, keeping reply as draft"
                );
                if let Err(save_err) =
                    autosave::save_now(&self.drafts, &session.key, &session.composer).await
                {
                    warn!(error = %save_err, "could not restore draft after failed delivery");
                }
                self.resume(session);
                Err(e.into())
            }
        }
    }

    fn resume(&mut self, mut session: Session) {
        self.arm_autosave(&mut session);
        self.session = Some(session);
        self.phase = FlowPhase::Composing;
    }

    /// Close the composer without sending. The saved draft is kept.
    pub async fn cancel(&mut self) -> Result<(), ComposeError> {
        self.composing()?;
        if let Some(mut session) = self.session.take() {
            if let Some(handle) = session.autosave.take() {
                handle.stop().await;
            }
            let dirty = session.composer.lock().is_dirty();
            debug!(key = %session.key, dirty, "reply cancelled");
        }
        self.phase = FlowPhase::Idle;
        Ok(())
    }
}

impl DraftFields {
    /// Overlay a saved draft. Empty saved addresses keep the prefilled ones.
    fn restore(self, saved: DraftFields) -> DraftFields {
        let keep = |saved: String, prefilled: String| {
            if saved.is_empty() { prefilled } else { saved }
        };
        DraftFields {
            to: keep(saved.to, self.to),
            cc: keep(saved.cc, self.cc),
            bcc: keep(saved.bcc, self.bcc),
            body: saved.body,
            send_as: saved.send_as,
        }
    }
}

fn validate(fields: &DraftFields) -> Result<(), ComposeError> {
    if fields.to.trim().is_empty() {
        return Err(ComposeError::Validation("recipient is required".to_owned()));
    }
    if fields.body.trim().is_empty() {
        return Err(ComposeError::Validation("message body is required".to_owned()));
    }
    Ok(())
}
