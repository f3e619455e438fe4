//! Staging of outgoing attachments under per-file and total size caps.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use leadline_core::AttachmentId;

use crate::delivery::OutgoingAttachment;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Size caps for staged attachments, checked only when files are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    /// Largest single file accepted, in bytes.
    pub max_file_bytes: u64,
    /// Largest combined size of all staged files, in bytes.
    pub max_total_bytes: u64,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * MIB,
            max_total_bytes: 25 * MIB,
        }
    }
}

impl AttachmentLimits {
    pub fn new(max_file_bytes: u64, max_total_bytes: u64) -> Self {
        Self {
            max_file_bytes,
            max_total_bytes,
        }
    }
}

/// A file offered for attachment.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A file accepted into the staging list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAttachment {
    pub id: AttachmentId,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub data: Bytes,
}

impl StagedAttachment {
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::classify(&self.content_type)
    }
}

impl From<&StagedAttachment> for OutgoingAttachment {
    fn from(staged: &StagedAttachment) -> Self {
        Self {
            filename: staged.name.clone(),
            content_type: staged.content_type.clone(),
            data: staged.data.clone(),
        }
    }
}

/// Why a candidate was not staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The file alone exceeds the per-file cap.
    #[error("file exceeds the {} per-file limit", format_limit(.limit))]
    FileTooLarge { limit: u64 },

    /// Adding the file would push the staged total past the cap.
    #[error("total attachment size would exceed {}", format_limit(.limit))]
    TotalSizeExceeded { limit: u64 },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn format_limit(limit: &u64) -> String {
    format_size(*limit)
}

/// A rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub size: u64,
    pub reason: RejectReason,
}

/// Outcome of [`AttachmentStager::add_files`], in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    /// Ids of the newly staged attachments.
    pub accepted: Vec<AttachmentId>,
    pub rejected: Vec<Rejection>,
}

/// Ordered list of staged attachments.
#[derive(Debug, Clone, Default)]
pub struct AttachmentStager {
    limits: AttachmentLimits,
    staged: Vec<StagedAttachment>,
}

impl AttachmentStager {
    pub fn new(limits: AttachmentLimits) -> Self {
        Self {
            limits,
            staged: Vec::new(),
        }
    }

    /// Stage `candidates` in order.
    ///
    /// A candidate larger than the per-file cap is rejected as
    /// [`RejectReason::FileTooLarge`]. Otherwise it is rejected as
    /// [`RejectReason::TotalSizeExceeded`] when the already staged files, the
    /// candidates accepted earlier in this call and the candidate together
    /// exceed the total cap. Rejected candidates consume no budget, so a
    /// later smaller candidate may still fit.
    pub fn add_files(
        &mut self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> StagingReport {
        let mut report = StagingReport::default();
        let mut total = self.total_size();

        for candidate in candidates {
            let size = candidate.size();
            let reason = if size > self.limits.max_file_bytes {
                Some(RejectReason::FileTooLarge {
                    limit: self.limits.max_file_bytes,
                })
            } else if total + size > self.limits.max_total_bytes {
                Some(RejectReason::TotalSizeExceeded {
                    limit: self.limits.max_total_bytes,
                })
            } else {
                None
            };

            if let Some(reason) = reason {
                debug!(name = %candidate.name, size, %reason, "attachment rejected");
                report.rejected.push(Rejection {
                    name: candidate.name,
                    size,
                    reason,
                });
                continue;
            }

            let id = AttachmentId::new(uuid::Uuid::new_v4().to_string());
            total += size;
            report.accepted.push(id.clone());
            self.staged.push(StagedAttachment {
                id,
                name: candidate.name,
                size,
                content_type: candidate.content_type,
                data: candidate.data,
            });
        }

        report
    }

    /// Remove the attachment with `id`. Returns `false` if it was not staged.
    pub fn remove(&mut self, id: &AttachmentId) -> bool {
        let before = self.staged.len();
        self.staged.retain(|a| &a.id != id);
        self.staged.len() != before
    }

    /// Combined size of all staged attachments.
    pub fn total_size(&self) -> u64 {
        self.staged.iter().map(|a| a.size).sum()
    }

    pub fn staged(&self) -> &[StagedAttachment] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

/// Coarse file type used to pick an icon when listing attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Other,
}

impl AttachmentKind {
    /// Classify a MIME type.
    pub fn classify(content_type: &str) -> Self {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Self::Image
        } else if content_type.contains("pdf") {
            Self::Pdf
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Other => "file",
        }
    }
}

/// Format a byte count as `B`, `KB` or `MB`; the two larger units carry one
/// decimal.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
