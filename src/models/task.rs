use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InvalidValue;

/// An executable unit of work under a requirement.
///
/// `completed_at` is set exactly when `status` is `Done`; use
/// [`Task::set_status`] rather than assigning the field directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub complexity: Complexity,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Identifiers of tasks in the same iteration that must be done first.
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

impl Task {
    pub fn new(input: CreateTaskInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            complexity: input.complexity,
            status: TaskStatus::Todo,
            created_at: Utc::now(),
            completed_at: None,
            dependencies: input.dependencies,
        }
    }

    /// Move to `status`, keeping `completed_at` in step. Re-marking a done
    /// task as done keeps its original completion time.
    pub fn set_status(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Done if self.status != TaskStatus::Done => {
                self.completed_at = Some(Utc::now());
            }
            TaskStatus::Done => {}
            TaskStatus::Todo => self.completed_at = None,
        }
        self.status = status;
    }

    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.description)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "done" => Ok(Self::Done),
            _ => Err(InvalidValue {
                field: "status",
                value: s.to_string(),
                expected: "todo or done",
            }),
        }
    }
}

/// Rough effort estimate for a task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Complexity {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(InvalidValue {
                field: "complexity",
                value: s.to_string(),
                expected: "low, medium, or high",
            }),
        }
    }
}

/// Input for one task generated for a requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

/// Result of a status update: the task after the change plus what it was before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusChange {
    pub previous_status: TaskStatus,
    pub task: Task,
}
