use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InvalidValue, Requirement, Task, TaskStatus};

/// One versioned development cycle.
///
/// Iterations are never deleted. Completing one archives it in place and
/// clears the active pointer so that the next version can start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub version: String,
    /// The product requirement text the iteration was started with.
    #[serde(alias = "prd")]
    pub description: String,
    pub status: IterationStatus,
    pub created_at: DateTime<Utc>,
    /// Set if and only if `status` is `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// The lifecycle state of an iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IterationStatus {
    Active,
    Completed,
}

impl IterationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for IterationStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(InvalidValue {
                field: "iteration status",
                value: s.to_string(),
                expected: "active or completed",
            }),
        }
    }
}

impl Iteration {
    pub fn new(version: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            status: IterationStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
            requirements: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == IterationStatus::Active
    }

    /// Distinct goal identifiers, in the order they were first decomposed.
    pub fn goal_ids(&self) -> Vec<&str> {
        let mut goals: Vec<&str> = Vec::new();
        for req in &self.requirements {
            if !goals.contains(&req.goal_id.as_str()) {
                goals.push(&req.goal_id);
            }
        }
        goals
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.requirements.iter().flat_map(|r| r.tasks.iter())
    }

    pub fn find_task_mut(&mut self, id: uuid::Uuid) -> Option<&mut Task> {
        self.requirements
            .iter_mut()
            .flat_map(|r| r.tasks.iter_mut())
            .find(|t| t.id == id)
    }

    pub fn summary(&self) -> IterationSummary {
        let tasks_count = self.tasks().count();
        let completed_tasks_count = self
            .tasks()
            .filter(|t| t.status == TaskStatus::Done)
            .count();

        IterationSummary {
            version: self.version.clone(),
            status: self.status,
            created_at: self.created_at,
            completed_at: self.completed_at,
            goals_count: self.goal_ids().len(),
            requirements_count: self.requirements.len(),
            tasks_count,
            completed_tasks_count,
        }
    }
}

/// Index entry describing one iteration without its full tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub version: String,
    pub status: IterationStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub goals_count: usize,
    pub requirements_count: usize,
    pub tasks_count: usize,
    pub completed_tasks_count: usize,
}

impl IterationSummary {
    /// Share of done tasks, in percent. Zero when there are no tasks.
    pub fn completion_percent(&self) -> f64 {
        if self.tasks_count == 0 {
            return 0.0;
        }
        self.completed_tasks_count as f64 * 100.0 / self.tasks_count as f64
    }
}
