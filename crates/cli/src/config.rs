use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use leadline_compose::{AttachmentLimits, ComposeConfig};
use leadline_core::SendAs;

/// Top-level configuration, loaded from `leadline.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct LeadlineConfig {
    /// Draft store backend.
    #[serde(default)]
    pub state: StateConfig,
    /// Reply composer settings.
    #[serde(default)]
    pub compose: ComposeSection,
    /// Where requests come from.
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LeadlineConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(toml::from_str("")?)
        }
    }
}

/// Configuration for the draft store backend.
#[derive(Debug, Deserialize)]
pub struct StateConfig {
    /// Which backend to use: `"memory"` or `"file"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// JSON document used by the `"file"` backend.
    #[serde(default = "default_state_path")]
    pub path: PathBuf,

    /// Key namespace for drafts. Defaults to `"leadline"`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_state_path(),
            namespace: default_namespace(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("leadline-drafts.json")
}

fn default_namespace() -> String {
    "leadline".to_owned()
}

/// `[compose]` section.
#[derive(Debug, Deserialize)]
pub struct ComposeSection {
    #[serde(default = "default_autosave_interval_seconds")]
    pub autosave_interval_seconds: u64,

    /// Largest single attachment, in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Largest combined attachment size, in bytes.
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// `"company"` or `"personal"`.
    #[serde(default)]
    pub default_send_as: SendAs,

    #[serde(default = "default_signature")]
    pub signature: String,

    /// Draft expiry in seconds. `0` keeps drafts until cleared.
    #[serde(default)]
    pub draft_ttl_seconds: u64,
}

impl Default for ComposeSection {
    fn default() -> Self {
        Self {
            autosave_interval_seconds: default_autosave_interval_seconds(),
            max_file_bytes: default_max_file_bytes(),
            max_total_bytes: default_max_total_bytes(),
            default_send_as: SendAs::default(),
            signature: default_signature(),
            draft_ttl_seconds: 0,
        }
    }
}

fn default_autosave_interval_seconds() -> u64 {
    ComposeConfig::default().autosave_interval.as_secs()
}

fn default_max_file_bytes() -> u64 {
    AttachmentLimits::default().max_file_bytes
}

fn default_max_total_bytes() -> u64 {
    AttachmentLimits::default().max_total_bytes
}

fn default_signature() -> String {
    ComposeConfig::default().signature
}

impl ComposeSection {
    /// Build the composer settings.
    pub fn to_compose_config(&self) -> ComposeConfig {
        let config = ComposeConfig::default()
            .with_autosave_interval(Duration::from_secs(self.autosave_interval_seconds.max(1)))
            .with_limits(AttachmentLimits::new(
                self.max_file_bytes,
                self.max_total_bytes,
            ))
            .with_default_send_as(self.default_send_as)
            .with_signature(self.signature.clone());
        match self.draft_ttl_seconds {
            0 => config,
            secs => config.with_draft_ttl(Duration::from_secs(secs)),
        }
    }
}

/// `[data]` section.
#[derive(Debug, Deserialize)]
pub struct DataConfig {
    /// JSON snapshot of requests. Sample data is generated when unset.
    pub snapshot: Option<PathBuf>,

    /// Number of sample requests to generate.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            sample_count: default_sample_count(),
        }
    }
}

fn default_sample_count() -> usize {
    25
}

/// `[logging]` section.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_owned()
}
