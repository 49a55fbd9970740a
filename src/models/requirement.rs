use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{InvalidValue, Task};

/// A decomposed piece of a goal, scoped to one iteration.
///
/// Requirements are immutable once created; only their child tasks change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    /// The goal this requirement was decomposed from.
    pub goal_id: String,
    /// Short name, when the caller gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Requirement {
    /// Title if present, otherwise the description.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.description)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(InvalidValue {
                field: "priority",
                value: s.to_string(),
                expected: "high, medium, or low",
            }),
        }
    }
}

/// Input for one requirement produced by goal decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequirementInput {
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

/// Requirements added to one goal, with the iteration they landed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalDecomposition {
    pub version: String,
    pub goal_id: String,
    pub requirements: Vec<Requirement>,
}
