//! Phase-conditioned suggestions for the next planning action.
//!
//! [`guidance`] is a pure function of a [`Phase`] and a [`GuidanceState`]
//! snapshot; the store builds the snapshot, nothing here touches disk.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::models::{Iteration, TaskStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Decomposition,
    TaskGeneration,
    Reporting,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Decomposition => "decomposition",
            Self::TaskGeneration => "task_generation",
            Self::Reporting => "reporting",
        }
    }
}

impl FromStr for Phase {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "decomposition" => Ok(Self::Decomposition),
            "task_generation" => Ok(Self::TaskGeneration),
            "reporting" => Ok(Self::Reporting),
            _ => Err(PlanError::UnknownPhase(s.to_string())),
        }
    }
}

/// What guidance needs to know about the active iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidanceState {
    pub active_version: Option<String>,
    pub requirements: usize,
    pub requirements_without_tasks: usize,
    pub tasks: usize,
    pub open_tasks: usize,
}

impl GuidanceState {
    pub fn from_active(active: Option<&Iteration>) -> Self {
        let Some(iteration) = active else {
            return Self::default();
        };
        Self {
            active_version: Some(iteration.version.clone()),
            requirements: iteration.requirements.len(),
            requirements_without_tasks: iteration
                .requirements
                .iter()
                .filter(|r| r.tasks.is_empty())
                .count(),
            tasks: iteration.tasks().count(),
            open_tasks: iteration
                .tasks()
                .filter(|t| t.status == TaskStatus::Todo)
                .count(),
        }
    }
}

/// Suggested next step for a phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guidance {
    pub phase: Phase,
    /// The tool to call next.
    pub recommended_tool: String,
    pub rationale: String,
    /// A precondition the recommended step is waiting on, if any.
    pub blocking: Option<String>,
    /// Other tools that are useful in this phase.
    pub related_tools: Vec<String>,
    /// Working principles for the phase.
    pub principles: Vec<String>,
}

const NO_ACTIVE: &str = "no active iteration - call start_new_iteration first";

pub fn guidance(phase: Phase, state: &GuidanceState) -> Guidance {
    match phase {
        Phase::Planning => planning(state),
        Phase::Decomposition => decomposition(state),
        Phase::TaskGeneration => task_generation(state),
        Phase::Reporting => reporting(state),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn planning(state: &GuidanceState) -> Guidance {
    let (recommended_tool, rationale, blocking) = match &state.active_version {
        None => (
            "start_new_iteration",
            "Read the product requirements, pick the next semantic version and open an iteration for it.".to_string(),
            None,
        ),
        Some(version) => (
            "view_current_iteration_plan",
            format!("Iteration {} is already open; review it before planning further.", version),
            Some(format!(
                "iteration {} is still active - call complete_iteration before starting another",
                version
            )),
        ),
    };

    Guidance {
        phase: Phase::Planning,
        recommended_tool: recommended_tool.to_string(),
        rationale,
        blocking,
        related_tools: strings(&["get_project_context", "list_iterations", "start_new_iteration"]),
        principles: strings(&[
            "Understand the requirement document before creating anything",
            "One iteration per release; versions follow MAJOR.MINOR.PATCH",
            "State the core goals of the version explicitly",
        ]),
    }
}

fn decomposition(state: &GuidanceState) -> Guidance {
    let (recommended_tool, rationale, blocking) = match &state.active_version {
        None => (
            "start_new_iteration",
            "Requirements belong to an iteration; there is none open.".to_string(),
            Some(NO_ACTIVE.to_string()),
        ),
        Some(version) => (
            "decompose_goal_into_requirements",
            format!(
                "Iteration {} has {} requirement(s); break each goal into independent, testable requirements.",
                version, state.requirements
            ),
            None,
        ),
    };

    Guidance {
        phase: Phase::Decomposition,
        recommended_tool: recommended_tool.to_string(),
        rationale,
        blocking,
        related_tools: strings(&["decompose_goal_into_requirements", "view_current_iteration_plan"]),
        principles: strings(&[
            "Each requirement should be implementable on its own",
            "Describe requirements concretely; avoid vague wording",
            "Set priorities so core functionality comes first",
        ]),
    }
}

fn task_generation(state: &GuidanceState) -> Guidance {
    let (recommended_tool, rationale, blocking) = match &state.active_version {
        None => (
            "start_new_iteration".to_string(),
            "Tasks belong to an iteration; there is none open.".to_string(),
            Some(NO_ACTIVE.to_string()),
        ),
        Some(_) if state.requirements == 0 => (
            "decompose_goal_into_requirements".to_string(),
            "Tasks are generated per requirement and there are no requirements yet.".to_string(),
            Some("the active iteration has no requirements - decompose a goal first".to_string()),
        ),
        Some(_) if state.requirements_without_tasks > 0 => (
            "generate_tasks_for_requirement".to_string(),
            format!(
                "{} of {} requirement(s) have no tasks yet.",
                state.requirements_without_tasks, state.requirements
            ),
            None,
        ),
        Some(_) => (
            "update_task_status".to_string(),
            format!(
                "Every requirement has tasks; {} of {} task(s) are still open.",
                state.open_tasks, state.tasks
            ),
            None,
        ),
    };

    Guidance {
        phase: Phase::TaskGeneration,
        recommended_tool,
        rationale,
        blocking,
        related_tools: strings(&["generate_tasks_for_requirement", "view_current_iteration_plan"]),
        principles: strings(&[
            "Each task should take between one and four hours",
            "Make task descriptions specific and actionable, with acceptance criteria",
            "Mark complexity as low, medium or high",
            "List dependencies on tasks that must finish first",
        ]),
    }
}

fn reporting(state: &GuidanceState) -> Guidance {
    let (recommended_tool, rationale, blocking) = match &state.active_version {
        None => (
            "start_new_iteration".to_string(),
            "Reports belong to an iteration; there is none open.".to_string(),
            Some(NO_ACTIVE.to_string()),
        ),
        Some(version) if state.open_tasks > 0 => (
            "update_development_report".to_string(),
            format!(
                "Record progress on iteration {} while work continues.",
                version
            ),
            Some(format!(
                "{} task(s) are still todo - finish them before complete_iteration",
                state.open_tasks
            )),
        ),
        Some(version) => (
            "complete_iteration".to_string(),
            format!(
                "All {} task(s) of iteration {} are done; write the final report and close it.",
                state.tasks, version
            ),
            None,
        ),
    };

    Guidance {
        phase: Phase::Reporting,
        recommended_tool,
        rationale,
        blocking,
        related_tools: strings(&[
            "update_development_report",
            "view_development_report",
            "complete_iteration",
        ]),
        principles: strings(&[
            "Summarise completed features and tasks",
            "Record problems met and how they were solved",
            "Note known issues and follow-up plans",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(requirements: usize, without_tasks: usize, tasks: usize, open: usize) -> GuidanceState {
        GuidanceState {
            active_version: Some("1.0.0".into()),
            requirements,
            requirements_without_tasks: without_tasks,
            tasks,
            open_tasks: open,
        }
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let err = "deployment".parse::<Phase>().expect_err("unknown");
        assert_eq!(err.kind(), "UnknownPhase");
    }

    #[test]
    fn phase_names_round_trip() {
        for phase in [
            Phase::Planning,
            Phase::Decomposition,
            Phase::TaskGeneration,
            Phase::Reporting,
        ] {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn planning_without_iteration_recommends_starting_one() {
        let g = guidance(Phase::Planning, &GuidanceState::default());
        assert_eq!(g.recommended_tool, "start_new_iteration");
        assert!(g.blocking.is_none());
    }

    #[test]
    fn planning_with_active_iteration_is_blocked() {
        let g = guidance(Phase::Planning, &active(0, 0, 0, 0));
        assert!(g.blocking.unwrap().contains("complete_iteration"));
    }

    #[test]
    fn decomposition_needs_an_active_iteration() {
        let g = guidance(Phase::Decomposition, &GuidanceState::default());
        assert_eq!(g.recommended_tool, "start_new_iteration");
        assert!(g.blocking.unwrap().contains("no active iteration"));
    }

    #[test]
    fn task_generation_follows_requirement_coverage() {
        let g = guidance(Phase::TaskGeneration, &active(0, 0, 0, 0));
        assert_eq!(g.recommended_tool, "decompose_goal_into_requirements");
        assert!(g.blocking.is_some());

        let g = guidance(Phase::TaskGeneration, &active(2, 1, 3, 3));
        assert_eq!(g.recommended_tool, "generate_tasks_for_requirement");
        assert!(g.rationale.starts_with("1 of 2"));

        let g = guidance(Phase::TaskGeneration, &active(2, 0, 3, 1));
        assert_eq!(g.recommended_tool, "update_task_status");
    }

    #[test]
    fn reporting_recommends_completion_once_everything_is_done() {
        let g = guidance(Phase::Reporting, &active(1, 0, 2, 1));
        assert_eq!(g.recommended_tool, "update_development_report");
        assert!(g.blocking.is_some());

        let g = guidance(Phase::Reporting, &active(1, 0, 2, 0));
        assert_eq!(g.recommended_tool, "complete_iteration");
        assert!(g.blocking.is_none());
    }
}
