use std::time::Duration;

use leadline_core::SendAs;

use crate::attachment::AttachmentLimits;

/// Default interval between autosave attempts.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Signature appended below the reply body when the composer opens.
pub const DEFAULT_SIGNATURE: &str = "Best regards,\nSaudi ProTech Team\ninfo@saudiprotech.com";

/// Settings for the reply composer.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use leadline_compose::ComposeConfig;
///
/// let config = ComposeConfig::default().with_autosave_interval(Duration::from_secs(10));
/// assert_eq!(config.autosave_interval, Duration::from_secs(10));
/// assert!(config.draft_ttl.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// How often a dirty composer is written to the draft store.
    pub autosave_interval: Duration,

    /// Per-file and total attachment caps.
    pub limits: AttachmentLimits,

    /// Mailbox preselected when the composer opens.
    pub default_send_as: SendAs,

    /// Signature placed below an empty line in a fresh reply body.
    pub signature: String,

    /// Expiry applied to saved drafts. `None` keeps drafts until cleared.
    pub draft_ttl: Option<Duration>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            limits: AttachmentLimits::default(),
            default_send_as: SendAs::Company,
            signature: DEFAULT_SIGNATURE.to_owned(),
            draft_ttl: None,
        }
    }
}

impl ComposeConfig {
    /// Override the autosave interval.
    #[must_use]
    pub fn with_autosave_interval(mut self, interval: Duration) -> Self {
        self.autosave_interval = interval;
        self
    }

    /// Override the attachment caps.
    #[must_use]
    pub fn with_limits(mut self, limits: AttachmentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the mailbox preselected for new replies.
    #[must_use]
    pub fn with_default_send_as(mut self, send_as: SendAs) -> Self {
        self.default_send_as = send_as;
        self
    }

    /// Replace the reply signature.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Expire saved drafts after `ttl`.
    #[must_use]
    pub fn with_draft_ttl(mut self, ttl: Duration) -> Self {
        self.draft_ttl = Some(ttl);
        self
    }

    /// Body a freshly opened composer starts with.
    pub fn initial_body(&self) -> String {
        format!("\n\n{}", self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ComposeConfig::default();
        assert_eq!(config.autosave_interval, Duration::from_secs(30));
        assert_eq!(config.default_send_as, SendAs::Company);
        assert_eq!(config.limits.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.max_total_bytes, 25 * 1024 * 1024);
        assert!(config.draft_ttl.is_none());
    }

    #[test]
    fn initial_body_leaves_a_blank_line_above_the_signature() {
        let config = ComposeConfig::default().with_signature("-- Sam");
        assert_eq!(config.initial_body(), "\n\n-- Sam");
    }

    #[test]
    fn builders_override_fields() {
        let config = ComposeConfig::default()
            .with_default_send_as(SendAs::Personal)
            .with_draft_ttl(Duration::from_secs(3600))
            .with_limits(AttachmentLimits::new(1, 2));
        assert_eq!(config.default_send_as, SendAs::Personal);
        assert_eq!(config.draft_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.limits.max_total_bytes, 2);
    }
}
