//! File-backed plan store.
//!
//! The store is the only reader and writer of the plan directory:
//!
//! ```text
//! <plan dir>/
//!   .lock                      advisory lock, held for each mutation
//!   active_iteration.json      {"version": "1.0.0"} or {"version": null}
//!   iterations_index.json      summaries of every iteration, oldest first
//!   v<version>/iteration.json  the iteration with its requirements and tasks
//!   v<version>/report.md       free-form development report
//! ```
//!
//! Each document is replaced atomically. A logical mutation writes the
//! iteration document first and the index (and pointer) after it; if a later
//! write fails the call returns an error and the disagreement is reported by
//! [`Store::get_context`] and [`Store::list_iterations`] until
//! [`Store::repair_index`] rebuilds the derived documents.

mod files;
mod index;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{PlanError, Result};
use crate::guidance::GuidanceState;
use crate::models::*;
use crate::render;
use crate::version;

use files::{read_json, read_text, write_atomic, write_json, PlanLock};
pub use index::{reconcile, ActivePointer, IterationsIndex};

const ACTIVE_FILE: &str = "active_iteration.json";
const INDEX_FILE: &str = "iterations_index.json";
const LOCK_FILE: &str = ".lock";
const ITERATION_FILE: &str = "iteration.json";
const REPORT_FILE: &str = "report.md";

#[derive(Debug, Clone)]
pub struct Store {
    project_root: PathBuf,
    plan_dir: PathBuf,
}

impl Store {
    /// Open the store described by `config`, creating the plan directory.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.plan_dir).map_err(|e| PlanError::io(&config.plan_dir, e))?;
        debug!(plan_dir = %config.plan_dir.display(), "opened plan store");
        Ok(Self {
            project_root: config.project_root.clone(),
            plan_dir: config.plan_dir.clone(),
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn plan_dir(&self) -> &Path {
        &self.plan_dir
    }

    fn iteration_dir(&self, version: &str) -> PathBuf {
        self.plan_dir.join(format!("v{}", version))
    }

    fn iteration_file(&self, version: &str) -> PathBuf {
        self.iteration_dir(version).join(ITERATION_FILE)
    }

    fn report_file(&self, version: &str) -> PathBuf {
        self.iteration_dir(version).join(REPORT_FILE)
    }

    fn lock(&self) -> Result<PlanLock> {
        PlanLock::acquire(&self.plan_dir.join(LOCK_FILE))
    }

    // ============================================================
    // Document access
    // ============================================================

    fn load_index(&self) -> Result<IterationsIndex> {
        Ok(read_json(&self.plan_dir.join(INDEX_FILE))?.unwrap_or_default())
    }

    fn load_pointer(&self) -> Result<ActivePointer> {
        Ok(read_json(&self.plan_dir.join(ACTIVE_FILE))?.unwrap_or_default())
    }

    fn save_pointer(&self, version: Option<String>) -> Result<()> {
        write_json(&self.plan_dir.join(ACTIVE_FILE), &ActivePointer { version })
    }

    fn save_iteration(&self, iteration: &Iteration) -> Result<()> {
        write_json(&self.iteration_file(&iteration.version), iteration)
    }

    /// Load one iteration document. Unknown versions are `Ok(None)`.
    ///
    /// `version` must already be validated or come from the plan directory.
    fn load_iteration(&self, version: &str) -> Result<Option<Iteration>> {
        read_json(&self.iteration_file(version))
    }

    /// Look up an iteration by a caller-supplied version.
    pub fn get_iteration(&self, version: &str) -> Result<Iteration> {
        let version = version::validate(version)?.to_string();
        self.load_iteration(&version)?
            .ok_or(PlanError::IterationNotFound(version))
    }

    /// Every readable iteration document, oldest first, plus a message for
    /// each document that could not be read.
    fn scan_iterations(&self) -> Result<(Vec<Iteration>, Vec<String>)> {
        let entries = fs::read_dir(&self.plan_dir).map_err(|e| PlanError::io(&self.plan_dir, e))?;

        let mut iterations = Vec::new();
        let mut problems = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PlanError::io(&self.plan_dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(version) = name.strip_prefix('v') else {
                continue;
            };
            if !entry.path().is_dir() {
                continue;
            }
            match self.load_iteration(version) {
                Ok(Some(iteration)) => iterations.push(iteration),
                Ok(None) => {}
                Err(e) => {
                    warn!(version, error = %e, "skipping unreadable iteration");
                    problems.push(e.to_string());
                }
            }
        }

        iterations.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.version.cmp(&b.version))
        });
        Ok((iterations, problems))
    }

    /// Bring the index entry for `iteration` up to date. An unreadable index
    /// is rebuilt from the iteration documents.
    fn refresh_index(&self, iteration: &Iteration) -> Result<()> {
        let index = match self.load_index() {
            Ok(mut index) => {
                index.upsert(iteration.summary());
                index
            }
            Err(e) => {
                warn!(error = %e, "iterations index unreadable, rebuilding");
                let (iterations, _) = self.scan_iterations()?;
                IterationsIndex::from_iterations(&iterations)
            }
        };
        write_json(&self.plan_dir.join(INDEX_FILE), &index)
    }

    /// Load the iteration a pointer names. A pointer that is not a valid
    /// version is an inconsistency, not a path.
    fn pointer_target(&self, version: &str) -> Result<Option<Iteration>> {
        if version::validate(version).is_err() {
            return Err(PlanError::StorageInconsistent(format!(
                "active pointer holds an invalid version '{}'",
                version
            )));
        }
        self.load_iteration(version)
    }

    /// The iteration named by the active pointer.
    ///
    /// Fails with `StorageInconsistent` when the pointer names an iteration
    /// that is missing or already completed.
    pub fn active_iteration(&self) -> Result<Option<Iteration>> {
        let Some(version) = self.load_pointer()?.version else {
            return Ok(None);
        };
        match self.pointer_target(&version)? {
            Some(iteration) if iteration.is_active() => Ok(Some(iteration)),
            Some(_) => Err(PlanError::StorageInconsistent(format!(
                "active pointer names iteration {} which is already completed",
                version
            ))),
            None => Err(PlanError::StorageInconsistent(format!(
                "active pointer names iteration {} which does not exist",
                version
            ))),
        }
    }

    fn require_active(&self) -> Result<Iteration> {
        self.active_iteration()?.ok_or(PlanError::NoActiveIteration)
    }

    fn resolve_iteration(&self, version: Option<&str>) -> Result<Iteration> {
        match version {
            Some(version) => self.get_iteration(version),
            None => self.require_active(),
        }
    }

    /// Cross-check index, pointer and documents without failing.
    fn check_consistency(&self) -> Vec<String> {
        match self.scan_iterations() {
            Ok((iterations, problems)) => self.reconcile_documents(&iterations, problems),
            Err(e) => vec![e.to_string()],
        }
    }

    fn reconcile_documents(&self, iterations: &[Iteration], mut problems: Vec<String>) -> Vec<String> {
        let index = self.load_index().unwrap_or_else(|e| {
            problems.push(e.to_string());
            IterationsIndex::default()
        });
        let pointer = self.load_pointer().unwrap_or_else(|e| {
            problems.push(e.to_string());
            ActivePointer::default()
        });
        problems.extend(reconcile(iterations, &index, &pointer));
        problems
    }

    // ============================================================
    // Read operations
    // ============================================================

    /// Project paths and the active iteration. Never fails: storage problems
    /// are listed in `inconsistencies` instead.
    pub fn get_context(&self) -> ProjectContext {
        let mut inconsistencies = Vec::new();
        let active_iteration = match self.active_iteration() {
            Ok(active) => active.map(|i| i.summary()),
            Err(e) => {
                warn!(error = %e, "could not resolve active iteration");
                inconsistencies.push(e.to_string());
                None
            }
        };

        for problem in self.check_consistency() {
            if !inconsistencies.iter().any(|p| p.contains(problem.as_str())) {
                inconsistencies.push(problem);
            }
        }

        ProjectContext {
            project_root: self.project_root.clone(),
            plan_directory: self.plan_dir.clone(),
            active_iteration,
            inconsistencies,
        }
    }

    /// All iterations, oldest first, read from their own documents.
    pub fn list_iterations(&self) -> IterationListing {
        match self.scan_iterations() {
            Ok((iterations, problems)) => IterationListing {
                inconsistencies: self.reconcile_documents(&iterations, problems),
                iterations: iterations.iter().map(Iteration::summary).collect(),
            },
            Err(e) => {
                warn!(error = %e, "could not scan plan directory, falling back to index");
                let iterations = self
                    .load_index()
                    .map(|index| index.iterations)
                    .unwrap_or_default();
                IterationListing {
                    iterations,
                    inconsistencies: vec![e.to_string()],
                }
            }
        }
    }

    /// Markdown plan for `version`, or for the active iteration.
    pub fn view_plan(&self, version: Option<&str>) -> Result<String> {
        let iteration = self.resolve_iteration(version)?;
        Ok(render::render_plan(&iteration))
    }

    /// Report text for `version`, or for the active iteration.
    pub fn view_report(&self, version: Option<&str>) -> Result<String> {
        let iteration = self.resolve_iteration(version)?;
        let report = read_text(&self.report_file(&iteration.version))?;
        Ok(report.unwrap_or_else(|| render::report_header(&iteration)))
    }

    /// What the guidance engine needs to know about the current state.
    pub fn guidance_state(&self) -> GuidanceState {
        match self.active_iteration() {
            Ok(active) => GuidanceState::from_active(active.as_ref()),
            Err(e) => {
                warn!(error = %e, "guidance without an active iteration");
                GuidanceState::from_active(None)
            }
        }
    }

    // ============================================================
    // Iteration operations
    // ============================================================

    /// Start a new iteration and make it the active one.
    pub fn create_iteration(&self, version: &str, description: &str) -> Result<Iteration> {
        let version = version::validate(version)?.to_string();
        let _lock = self.lock()?;

        if self.iteration_file(&version).exists() || self.load_index()?.get(&version).is_some() {
            return Err(PlanError::DuplicateVersion(version));
        }

        let (iterations, _) = self.scan_iterations()?;
        if let Some(active) = iterations.iter().find(|i| i.is_active()) {
            return Err(PlanError::IterationAlreadyActive(active.version.clone()));
        }
        if let Some(pointed) = self.load_pointer()?.version {
            if iterations.iter().any(|i| i.version == pointed && i.is_active()) {
                return Err(PlanError::IterationAlreadyActive(pointed));
            }
        }

        let iteration = Iteration::new(version.clone(), description);
        self.save_iteration(&iteration)?;
        write_atomic(
            &self.report_file(&version),
            &render::report_header(&iteration),
        )?;
        self.refresh_index(&iteration)?;
        self.save_pointer(Some(version.clone()))?;

        info!(version = %version, "started iteration");
        Ok(iteration)
    }

    /// Archive the active iteration and clear the active pointer.
    pub fn complete_iteration(&self, version: &str) -> Result<Iteration> {
        let version = version::validate(version)?.to_string();
        let _lock = self.lock()?;

        let mut iteration = self.get_iteration(&version)?;
        if !iteration.is_active() {
            return Err(PlanError::IterationNotActive(version));
        }
        let pointer = self.load_pointer()?;
        if let Some(pointed) = &pointer.version {
            if *pointed != version && self.pointer_target(pointed)?.is_some_and(|i| i.is_active()) {
                return Err(PlanError::IterationNotActive(version));
            }
        }

        iteration.status = IterationStatus::Completed;
        iteration.completed_at = Some(Utc::now());
        self.save_iteration(&iteration)?;
        self.refresh_index(&iteration)?;
        if pointer.version.is_some() {
            self.save_pointer(None)?;
        }

        info!(version = %version, "completed iteration");
        Ok(iteration)
    }

    /// Rebuild the index from the iteration documents and point the active
    /// pointer at the single active iteration.
    pub fn repair_index(&self) -> Result<IndexRepair> {
        let _lock = self.lock()?;

        let (iterations, unreadable) = self.scan_iterations()?;
        let active: Vec<&Iteration> = iterations.iter().filter(|i| i.is_active()).collect();
        if active.len() > 1 {
            let versions: Vec<&str> = active.iter().map(|i| i.version.as_str()).collect();
            return Err(PlanError::StorageInconsistent(format!(
                "more than one iteration is marked active ({}); complete all but one first",
                versions.join(", ")
            )));
        }
        let active_version = active.first().map(|i| i.version.clone());

        let old_index = self.load_index().unwrap_or_default();
        let old_pointer = self.load_pointer().unwrap_or_default();
        let mut fixed = reconcile(&iterations, &old_index, &old_pointer);
        fixed.extend(unreadable.into_iter().map(|p| format!("skipped: {}", p)));

        write_json(
            &self.plan_dir.join(INDEX_FILE),
            &IterationsIndex::from_iterations(&iterations),
        )?;
        self.save_pointer(active_version.clone())?;

        info!(iterations = iterations.len(), fixed = fixed.len(), "rebuilt iterations index");
        Ok(IndexRepair {
            iterations: iterations.len(),
            active_iteration: active_version,
            fixed,
        })
    }

    // ============================================================
    // Requirement and task operations
    // ============================================================

    /// Append requirements for `goal_id` to the active iteration.
    pub fn decompose_goal(
        &self,
        goal_id: &str,
        inputs: Vec<CreateRequirementInput>,
    ) -> Result<GoalDecomposition> {
        let goal_id = goal_id.trim();
        if goal_id.is_empty() {
            return Err(PlanError::InvalidInput("goal_id must not be empty".into()));
        }
        if inputs.is_empty() {
            return Err(PlanError::InvalidInput(
                "at least one requirement is needed".into(),
            ));
        }
        if inputs.iter().any(|r| r.description.trim().is_empty()) {
            return Err(PlanError::InvalidInput(
                "requirement description must not be empty".into(),
            ));
        }

        let _lock = self.lock()?;
        let mut iteration = self.require_active()?;

        let now = Utc::now();
        let created: Vec<Requirement> = inputs
            .into_iter()
            .map(|input| Requirement {
                id: Uuid::new_v4(),
                goal_id: goal_id.to_string(),
                title: input.title,
                description: input.description,
                priority: input.priority,
                created_at: now,
                tasks: Vec::new(),
            })
            .collect();
        iteration.requirements.extend(created.iter().cloned());

        self.save_iteration(&iteration)?;
        self.refresh_index(&iteration)?;

        info!(
            version = %iteration.version,
            goal_id,
            count = created.len(),
            "added requirements"
        );
        Ok(GoalDecomposition {
            version: iteration.version,
            goal_id: goal_id.to_string(),
            requirements: created,
        })
    }

    /// Append tasks to a requirement of the active iteration.
    ///
    /// Every dependency must name a task that already exists in the
    /// iteration, so dependency chains cannot form cycles.
    pub fn generate_tasks(
        &self,
        requirement_id: Uuid,
        inputs: Vec<CreateTaskInput>,
    ) -> Result<Vec<Task>> {
        if inputs.is_empty() {
            return Err(PlanError::InvalidInput("at least one task is needed".into()));
        }
        if inputs.iter().any(|t| t.description.trim().is_empty()) {
            return Err(PlanError::InvalidInput(
                "task description must not be empty".into(),
            ));
        }

        let _lock = self.lock()?;
        let mut iteration = self.require_active()?;

        let known: HashSet<Uuid> = iteration.tasks().map(|t| t.id).collect();
        let version = iteration.version.clone();
        let requirement = iteration
            .requirements
            .iter_mut()
            .find(|r| r.id == requirement_id)
            .ok_or(PlanError::RequirementNotFound(requirement_id))?;

        for dep in inputs.iter().flat_map(|t| t.dependencies.iter()) {
            if !known.contains(dep) {
                return Err(PlanError::TaskNotFound(*dep));
            }
        }

        let created: Vec<Task> = inputs
            .into_iter()
            .map(|mut input| {
                let mut seen = HashSet::new();
                input.dependencies.retain(|d| seen.insert(*d));
                Task::new(input)
            })
            .collect();
        requirement.tasks.extend(created.iter().cloned());

        self.save_iteration(&iteration)?;
        self.refresh_index(&iteration)?;

        info!(
            version = %version,
            requirement_id = %requirement_id,
            count = created.len(),
            "added tasks"
        );
        Ok(created)
    }

    /// Set one task's status in the active iteration.
    pub fn update_task_status(&self, task_id: Uuid, status: TaskStatus) -> Result<TaskStatusChange> {
        let _lock = self.lock()?;
        let mut iteration = self.require_active()?;

        let task = iteration
            .find_task_mut(task_id)
            .ok_or(PlanError::TaskNotFound(task_id))?;
        let previous_status = task.status;
        task.set_status(status);
        let task = task.clone();

        self.save_iteration(&iteration)?;
        self.refresh_index(&iteration)?;

        info!(
            version = %iteration.version,
            task_id = %task_id,
            from = previous_status.as_str(),
            to = status.as_str(),
            "updated task status"
        );
        Ok(TaskStatusChange {
            previous_status,
            task,
        })
    }

    /// Append to or replace the active iteration's report. Returns the
    /// version whose report was written.
    pub fn update_report(&self, content: &str, mode: ReportMode) -> Result<String> {
        let _lock = self.lock()?;
        let iteration = self.require_active()?;
        let path = self.report_file(&iteration.version);

        let text = match mode {
            ReportMode::Overwrite => content.to_string(),
            ReportMode::Append => {
                let existing =
                    read_text(&path)?.unwrap_or_else(|| render::report_header(&iteration));
                render::append_report_entry(&existing, content, Utc::now())
            }
        };
        write_atomic(&path, &text)?;

        info!(version = %iteration.version, mode = mode.as_str(), "updated report");
        Ok(iteration.version)
    }
}
