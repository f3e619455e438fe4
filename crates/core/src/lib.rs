pub mod clock;
pub mod error;
pub mod request;
pub mod sample;
pub mod snapshot;
pub mod stage;
pub mod stats;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use request::{
    Category, Direction, EmailHistoryItem, Note, Priority, Request, RequestAttachment, SendAs,
    Task, TaskStatus,
};
pub use sample::sample_requests;
pub use snapshot::{Snapshot, load_snapshot};
pub use stage::{STAGES, Stage, StageConfig, pipeline_stages};
pub use stats::{DashboardStats, win_rate};
pub use store::{DEFAULT_RECENT_LIMIT, RequestStore, group_by_stage};
pub use types::{AttachmentId, DraftKey, RequestId};
