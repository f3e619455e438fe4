//! Pipeline stage registry.
//!
//! The registry is a fixed, ordered table of the seven stages a request moves
//! through. It is defined once and never mutated; lookups that miss return
//! `None` rather than an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A position in the request pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` matches the
/// registry's `order` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    UnderReview,
    Contacted,
    ProposalSent,
    Negotiation,
    Won,
    Lost,
}

/// Static display metadata for a [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageConfig {
    /// The stage this entry describes.
    pub id: Stage,
    /// Human-readable label.
    pub label: &'static str,
    /// Color token used by front ends.
    pub color: &'static str,
    /// Sort order, 0 through 6.
    pub order: u8,
}

/// The stage registry, in pipeline order.
pub static STAGES: [StageConfig; 7] = [
    StageConfig {
        id: Stage::New,
        label: "New",
        color: "bg-primary",
        order: 0,
    },
    StageConfig {
        id: Stage::UnderReview,
        label: "Under Review",
        color: "bg-warning",
        order: 1,
    },
    StageConfig {
        id: Stage::Contacted,
        label: "Contacted",
        color: "bg-accent",
        order: 2,
    },
    StageConfig {
        id: Stage::ProposalSent,
        label: "Proposal Sent",
        color: "bg-primary",
        order: 3,
    },
    StageConfig {
        id: Stage::Negotiation,
        label: "Negotiation",
        color: "bg-warning",
        order: 4,
    },
    StageConfig {
        id: Stage::Won,
        label: "Won",
        color: "bg-success",
        order: 5,
    },
    StageConfig {
        id: Stage::Lost,
        label: "Lost",
        color: "bg-destructive",
        order: 6,
    },
];

/// Look up a stage by its string id (e.g. `"proposal_sent"`).
#[must_use]
pub fn find(id: &str) -> Option<&'static StageConfig> {
    STAGES.iter().find(|s| s.id.as_str() == id)
}

/// The registry without the two terminal stages (won, lost).
#[must_use]
pub fn pipeline_stages() -> &'static [StageConfig] {
    &STAGES[..STAGES.len() - 2]
}

impl Stage {
    /// Return the snake-case identifier of this stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::UnderReview => "under_review",
            Self::Contacted => "contacted",
            Self::ProposalSent => "proposal_sent",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Return the registry entry for this stage.
    #[must_use]
    pub fn config(self) -> &'static StageConfig {
        &STAGES[self as usize]
    }

    /// Return the human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.config().label
    }

    /// Whether the stage closes the request (won or lost).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Iterate over every stage in registry order.
    pub fn all() -> impl Iterator<Item = Stage> {
        STAGES.iter().map(|s| s.id)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find(s)
            .map(|c| c.id)
            .ok_or_else(|| CoreError::UnknownStage(s.to_owned()))
    }
}
