//! Request and response types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{IterationSummary, Requirement, Task};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetGuidanceRequest {
    #[schemars(
        description = "Workflow phase: 'planning', 'decomposition', 'task_generation', or 'reporting'"
    )]
    pub phase: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StartNewIterationRequest {
    #[schemars(description = "Semantic version of the iteration, e.g. '1.0.0' or '2.1.0-beta.1'")]
    pub version: String,
    #[schemars(description = "Product requirement text describing what this version delivers")]
    pub prd: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompleteIterationRequest {
    #[schemars(description = "Version of the active iteration to complete")]
    pub version: String,
}

/// One requirement in a decomposition request.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RequirementInput {
    #[schemars(description = "Optional short name for the requirement")]
    #[serde(default)]
    pub title: Option<String>,
    #[schemars(description = "What the requirement demands - concrete and testable")]
    pub description: String,
    #[schemars(description = "Priority: 'high', 'medium', or 'low'. Defaults to 'medium'.")]
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DecomposeGoalRequest {
    #[schemars(description = "Identifier of the goal being decomposed, e.g. 'G1'")]
    pub goal_id: String,
    #[schemars(description = "Requirements derived from the goal (at least one)")]
    pub requirements: Vec<RequirementInput>,
}

/// One task in a task generation request.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskInput {
    #[schemars(description = "Optional short name for the task")]
    #[serde(default)]
    pub title: Option<String>,
    #[schemars(description = "What to implement, including acceptance criteria")]
    pub description: String,
    #[schemars(description = "Complexity: 'low', 'medium', or 'high'. Defaults to 'medium'.")]
    #[serde(default)]
    pub complexity: Option<String>,
    #[schemars(
        description = "IDs of existing tasks in this iteration that must be done before this one"
    )]
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateTasksRequest {
    #[schemars(description = "The UUID of the requirement the tasks implement")]
    pub requirement_id: String,
    #[schemars(description = "Tasks to create (at least one)")]
    pub tasks: Vec<TaskInput>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskStatusRequest {
    #[schemars(description = "The UUID of the task to update")]
    pub task_id: String,
    #[schemars(description = "New status: 'todo' or 'done'")]
    pub status: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDevelopmentReportRequest {
    #[schemars(description = "Markdown text to add to the report")]
    pub content: String,
    #[schemars(
        description = "'append' (default) adds a timestamped entry; 'overwrite' replaces the whole report"
    )]
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ViewIterationRequest {
    #[schemars(
        description = "Version to show. Omit to show the active iteration; completed iterations can be named explicitly."
    )]
    #[serde(default)]
    pub version: Option<String>,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IterationInfo {
    pub version: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub goals_count: usize,
    pub requirements_count: usize,
    pub tasks_count: usize,
    pub completed_tasks_count: usize,
    pub completion_percent: f64,
}

impl From<IterationSummary> for IterationInfo {
    fn from(s: IterationSummary) -> Self {
        Self {
            completion_percent: s.completion_percent(),
            version: s.version,
            status: s.status.as_str().to_string(),
            created_at: s.created_at.to_rfc3339(),
            completed_at: s.completed_at.map(|t| t.to_rfc3339()),
            goals_count: s.goals_count,
            requirements_count: s.requirements_count,
            tasks_count: s.tasks_count,
            completed_tasks_count: s.completed_tasks_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectContextResponse {
    pub project_root: String,
    pub plan_directory: String,
    /// `None` is a normal state: no iteration is open.
    pub active_iteration: Option<IterationInfo>,
    /// Disagreements between the index, the active pointer and the iteration documents.
    pub inconsistencies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IterationListResponse {
    pub iterations: Vec<IterationInfo>,
    pub inconsistencies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RequirementInfo {
    pub id: String,
    pub goal_id: String,
    pub title: Option<String>,
    pub description: String,
    pub priority: String,
}

impl From<Requirement> for RequirementInfo {
    fn from(r: Requirement) -> Self {
        Self {
            id: r.id.to_string(),
            goal_id: r.goal_id,
            title: r.title,
            description: r.description,
            priority: r.priority.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RequirementListResponse {
    pub version: String,
    pub goal_id: String,
    pub requirements: Vec<RequirementInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskInfo {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub complexity: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub dependencies: Vec<String>,
}

impl From<Task> for TaskInfo {
    fn from(t: Task) -> Self {
        Self {
            id: t.id.to_string(),
            title: t.title,
            description: t.description,
            complexity: t.complexity.as_str().to_string(),
            status: t.status.as_str().to_string(),
            created_at: t.created_at.to_rfc3339(),
            completed_at: t.completed_at.map(|c| c.to_rfc3339()),
            dependencies: t.dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskListResponse {
    pub requirement_id: String,
    pub tasks: Vec<TaskInfo>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskStatusResponse {
    pub previous_status: String,
    pub task: TaskInfo,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReportUpdateResponse {
    pub version: String,
    pub mode: String,
    pub message: String,
}
