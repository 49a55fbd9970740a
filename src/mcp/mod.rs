//! MCP server exposing the development plan as tools for an AI agent.

mod types;

use std::str::FromStr;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PlanError;
use crate::guidance::{self, Guidance, Phase};
use crate::models::*;
use crate::store::Store;

#[derive(Clone)]
pub struct McpServer {
    store: Store,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(field: &str, s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s).map_err(|e| {
            McpError::invalid_params(format!("Invalid UUID for {} '{}': {}", field, s, e), None)
        })
    }

    fn parse_value<T>(s: &str) -> Result<T, McpError>
    where
        T: FromStr<Err = InvalidValue>,
    {
        T::from_str(s).map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    fn require_text(field: &str, value: &str) -> Result<(), McpError> {
        if value.trim().is_empty() {
            return Err(McpError::invalid_params(
                format!("{} must not be empty", field),
                None,
            ));
        }
        Ok(())
    }

    /// Map a store failure to a tool error that names its kind.
    fn plan_err(e: PlanError) -> McpError {
        if e.is_internal() {
            tracing::error!("Storage error: {}", e);
            return McpError::internal_error(format!("{}: {}", e.kind(), e), None);
        }
        tracing::warn!("Rejected call: {}: {}", e.kind(), e);
        McpError::invalid_params(
            format!("{}: {}", e.kind(), e),
            Some(serde_json::json!({ "kind": e.kind() })),
        )
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // ============================================================
    // Tool logic - typed results shared by the tools and tests
    // ============================================================

    pub fn handle_get_project_context(&self) -> ProjectContextResponse {
        let context = self.store.get_context();
        ProjectContextResponse {
            project_root: context.project_root.display().to_string(),
            plan_directory: context.plan_directory.display().to_string(),
            active_iteration: context.active_iteration.map(IterationInfo::from),
            inconsistencies: context.inconsistencies,
        }
    }

    pub fn handle_get_guidance(&self, req: GetGuidanceRequest) -> Result<Guidance, McpError> {
        let phase = Phase::from_str(req.phase.trim()).map_err(Self::plan_err)?;
        Ok(guidance::guidance(phase, &self.store.guidance_state()))
    }

    pub fn handle_start_new_iteration(
        &self,
        req: StartNewIterationRequest,
    ) -> Result<IterationInfo, McpError> {
        Self::require_text("version", &req.version)?;
        Self::require_text("prd", &req.prd)?;

        let iteration = self
            .store
            .create_iteration(req.version.trim(), &req.prd)
            .map_err(Self::plan_err)?;
        Ok(iteration.summary().into())
    }

    pub fn handle_list_iterations(&self) -> IterationListResponse {
        let listing = self.store.list_iterations();
        IterationListResponse {
            iterations: listing
                .iterations
                .into_iter()
                .map(IterationInfo::from)
                .collect(),
            inconsistencies: listing.inconsistencies,
        }
    }

    pub fn handle_complete_iteration(
        &self,
        req: CompleteIterationRequest,
    ) -> Result<IterationInfo, McpError> {
        Self::require_text("version", &req.version)?;

        let iteration = self
            .store
            .complete_iteration(req.version.trim())
            .map_err(Self::plan_err)?;
        Ok(iteration.summary().into())
    }

    pub fn handle_decompose_goal(
        &self,
        req: DecomposeGoalRequest,
    ) -> Result<RequirementListResponse, McpError> {
        Self::require_text("goal_id", &req.goal_id)?;
        if req.requirements.is_empty() {
            return Err(McpError::invalid_params(
                "requirements must contain at least one entry",
                None,
            ));
        }

        let inputs = req
            .requirements
            .into_iter()
            .map(|r| {
                Self::require_text("requirement description", &r.description)?;
                let priority = match r.priority.as_deref() {
                    Some(p) => Self::parse_value(p.trim())?,
                    None => Priority::default(),
                };
                Ok(CreateRequirementInput {
                    title: r.title.filter(|t| !t.trim().is_empty()),
                    description: r.description,
                    priority,
                })
            })
            .collect::<Result<Vec<_>, McpError>>()?;

        let decomposition = self
            .store
            .decompose_goal(&req.goal_id, inputs)
            .map_err(Self::plan_err)?;

        Ok(RequirementListResponse {
            version: decomposition.version,
            goal_id: decomposition.goal_id,
            requirements: decomposition
                .requirements
                .into_iter()
                .map(RequirementInfo::from)
                .collect(),
        })
    }

    pub fn handle_generate_tasks(
        &self,
        req: GenerateTasksRequest,
    ) -> Result<TaskListResponse, McpError> {
        let requirement_id = Self::parse_uuid("requirement_id", &req.requirement_id)?;
        if req.tasks.is_empty() {
            return Err(McpError::invalid_params(
                "tasks must contain at least one entry",
                None,
            ));
        }

        let inputs = req
            .tasks
            .into_iter()
            .map(|t| {
                Self::require_text("task description", &t.description)?;
                let complexity = match t.complexity.as_deref() {
                    Some(c) => Self::parse_value(c.trim())?,
                    None => Complexity::default(),
                };
                let dependencies = t
                    .dependencies
                    .iter()
                    .map(|d| Self::parse_uuid("dependency", d))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CreateTaskInput {
                    title: t.title.filter(|s| !s.trim().is_empty()),
                    description: t.description,
                    complexity,
                    dependencies,
                })
            })
            .collect::<Result<Vec<_>, McpError>>()?;

        let tasks = self
            .store
            .generate_tasks(requirement_id, inputs)
            .map_err(Self::plan_err)?;

        Ok(TaskListResponse {
            requirement_id: requirement_id.to_string(),
            tasks: tasks.into_iter().map(TaskInfo::from).collect(),
        })
    }

    pub fn handle_update_task_status(
        &self,
        req: UpdateTaskStatusRequest,
    ) -> Result<TaskStatusResponse, McpError> {
        let task_id = Self::parse_uuid("task_id", &req.task_id)?;
        let status: TaskStatus = Self::parse_value(req.status.trim())?;

        let change = self
            .store
            .update_task_status(task_id, status)
            .map_err(Self::plan_err)?;

        Ok(TaskStatusResponse {
            previous_status: change.previous_status.as_str().to_string(),
            task: change.task.into(),
        })
    }

    pub fn handle_update_development_report(
        &self,
        req: UpdateDevelopmentReportRequest,
    ) -> Result<ReportUpdateResponse, McpError> {
        let mode = match req.mode.as_deref() {
            Some(m) => Self::parse_value(m.trim())?,
            None => ReportMode::default(),
        };
        if mode == ReportMode::Append {
            Self::require_text("content", &req.content)?;
        }

        let version = self
            .store
            .update_report(&req.content, mode)
            .map_err(Self::plan_err)?;

        Ok(ReportUpdateResponse {
            message: format!("Development report for v{} updated ({})", version, mode.as_str()),
            version,
            mode: mode.as_str().to_string(),
        })
    }

    pub fn handle_view_plan(&self, req: ViewIterationRequest) -> Result<String, McpError> {
        self.store
            .view_plan(req.version.as_deref().map(str::trim))
            .map_err(Self::plan_err)
    }

    pub fn handle_view_report(&self, req: ViewIterationRequest) -> Result<String, McpError> {
        self.store
            .view_report(req.version.as_deref().map(str::trim))
            .map_err(Self::plan_err)
    }

    pub fn handle_repair_plan_index(&self) -> Result<IndexRepair, McpError> {
        self.store.repair_index().map_err(Self::plan_err)
    }
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Context Tools
    // ============================================================

    #[tool(
        description = "Get the project root, the plan directory, and the active iteration (null when none is open). Call this FIRST to learn where planning stands. Also lists any inconsistencies detected between the iterations index, the active pointer, and iteration documents."
    )]
    async fn get_project_context(&self) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_get_project_context())
    }

    #[tool(
        description = "Get guidance for a workflow phase: 'planning', 'decomposition', 'task_generation', or 'reporting'. Returns the recommended next tool, the rationale, any blocking precondition that is not yet met, related tools, and working principles. The suggestion reflects the current plan state."
    )]
    async fn get_guidance(
        &self,
        params: Parameters<GetGuidanceRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_get_guidance(params.0)?)
    }

    // ============================================================
    // Iteration Tools
    // ============================================================

    #[tool(
        description = "Start a new iteration for a semantic version (e.g. '1.0.0') with its product requirement text. Constraints: the version must be valid and never used before, and no other iteration may be active. Side effects: creates the iteration and its report, updates the index, and makes it the active iteration."
    )]
    async fn start_new_iteration(
        &self,
        params: Parameters<StartNewIterationRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_start_new_iteration(params.0)?)
    }

    #[tool(
        description = "List every iteration, oldest first, with status (active/completed), requirement and task counts, and completion percentage."
    )]
    async fn list_iterations(&self) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_list_iterations())
    }

    #[tool(
        description = "Complete the active iteration. Only the active iteration can be completed. Side effects: sets status to 'completed', records the completion time, updates the index, and clears the active iteration so a new one can start."
    )]
    async fn complete_iteration(
        &self,
        params: Parameters<CompleteIterationRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_complete_iteration(params.0)?)
    }

    // ============================================================
    // Planning Tools
    // ============================================================

    #[tool(
        description = "Decompose a goal into requirements within the active iteration. Each requirement needs a description and may carry a title and a priority (high/medium/low). Returns the created requirements with their IDs; use those IDs with generate_tasks_for_requirement."
    )]
    async fn decompose_goal_into_requirements(
        &self,
        params: Parameters<DecomposeGoalRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_decompose_goal(params.0)?)
    }

    #[tool(
        description = "Create tasks for a requirement of the active iteration. Each task needs a description and may carry a title, a complexity (low/medium/high), and dependencies: IDs of tasks that already exist in this iteration. Returns the created tasks with their IDs, all in status 'todo'."
    )]
    async fn generate_tasks_for_requirement(
        &self,
        params: Parameters<GenerateTasksRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_generate_tasks(params.0)?)
    }

    #[tool(
        description = "Set a task's status to 'todo' or 'done'. Marking done records the completion time; moving back to todo clears it. Returns the task and its previous status."
    )]
    async fn update_task_status(
        &self,
        params: Parameters<UpdateTaskStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_update_task_status(params.0)?)
    }

    // ============================================================
    // Report and View Tools
    // ============================================================

    #[tool(
        description = "Update the active iteration's development report. mode 'append' (default) adds a timestamped entry after the existing text and needs non-empty content; 'overwrite' replaces the whole report, and empty content clears it."
    )]
    async fn update_development_report(
        &self,
        params: Parameters<UpdateDevelopmentReportRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_update_development_report(params.0)?)
    }

    #[tool(
        description = "Show an iteration plan as Markdown: product requirements, goals with their requirements, tasks with status and complexity, and progress statistics. Defaults to the active iteration; pass a version to view any iteration."
    )]
    async fn view_current_iteration_plan(
        &self,
        params: Parameters<ViewIterationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let plan = self.handle_view_plan(params.0)?;
        Ok(CallToolResult::success(vec![Content::text(plan)]))
    }

    #[tool(
        description = "Show an iteration's development report as Markdown. Defaults to the active iteration; pass a version to view any iteration."
    )]
    async fn view_development_report(
        &self,
        params: Parameters<ViewIterationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = self.handle_view_report(params.0)?;
        Ok(CallToolResult::success(vec![Content::text(report)]))
    }

    // ============================================================
    // Maintenance Tools
    // ============================================================

    #[tool(
        description = "Rebuild the iterations index from the iteration documents and reset the active iteration to the single iteration marked active. Use this when get_project_context or list_iterations report inconsistencies. Returns what was fixed."
    )]
    async fn repair_plan_index(&self) -> Result<CallToolResult, McpError> {
        Self::json_result(&self.handle_repair_plan_index()?)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "devplan".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"devplan tracks a project's development plan: iterations -> requirements -> tasks -> reports.

MODEL:
- Iteration: one versioned development cycle (semantic version, e.g. 1.2.0).
  Exactly one iteration can be active. Completed iterations stay on record.
- Requirement: a piece of a goal, created by decomposing the goal inside the active iteration.
- Task: an executable unit of work under a requirement. Status is todo or done.
- Report: free-form Markdown kept per iteration.

WORKFLOW:
1. get_project_context - see whether an iteration is active
2. start_new_iteration - open a version with its product requirement text
3. decompose_goal_into_requirements - split each goal into requirements
4. generate_tasks_for_requirement - break every requirement into tasks
5. update_task_status - mark tasks done as work lands
6. update_development_report - record progress, problems and decisions
7. complete_iteration - close the version once all tasks are done

Unsure what comes next? Call get_guidance with the current phase
(planning, decomposition, task_generation, reporting).

ERRORS:
Failures name their kind (e.g. NoActiveIteration, DuplicateVersion, TaskNotFound)
and the identifier involved. If inconsistencies are reported, call repair_plan_index."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(store: Store) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(store);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
