use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;
use crate::types::RequestId;

/// The kind of inquiry a request represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Customer,
    Advertising,
    JobApplication,
}

/// Triage priority assigned to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Which mailbox an outbound reply is sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendAs {
    Personal,
    #[default]
    Company,
}

impl SendAs {
    /// Human-readable account label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Personal => "personal account",
            Self::Company => "company account",
        }
    }
}

impl std::str::FromStr for SendAs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "company" => Ok(Self::Company),
            other => Err(format!("unknown send-as mode: {other}")),
        }
    }
}

/// Progress of a follow-up task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

/// Direction of an email in a request's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A file that arrived with the inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAttachment {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub url: String,
}

/// An internal note left on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A follow-up task attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub assigned_to: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

/// One message in the conversation thread of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHistoryItem {
    pub id: String,
    pub direction: Direction,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub sent_by: String,
    /// Mailbox used for outbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_as: Option<SendAs>,
}

/// An inbound customer inquiry tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    pub stage: Stage,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub attachments: Vec<RequestAttachment>,
    #[serde(default)]
    pub email_history: Vec<EmailHistoryItem>,
}

impl Request {
    /// Create a request with the required fields; collections start empty.
    #[must_use]
    pub fn new(
        id: impl Into<RequestId>,
        sender_name: impl Into<String>,
        sender_email: impl Into<String>,
        subject: impl Into<String>,
        received_at: DateTime<Utc>,
        stage: Stage,
    ) -> Self {
        Self {
            id: id.into(),
            sender_name: sender_name.into(),
            sender_email: sender_email.into(),
            subject: subject.into(),
            body: String::new(),
            received_at,
            stage,
            category: Category::Customer,
            assigned_to: None,
            priority: None,
            notes: Vec::new(),
            tasks: Vec::new(),
            attachments: Vec::new(),
            email_history: Vec::new(),
        }
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the request category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the request priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Assign the request to a team member.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }
}
