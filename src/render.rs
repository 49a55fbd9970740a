//! Markdown rendering for iteration plans and development reports.

use chrono::{DateTime, Utc};

use crate::models::{Complexity, Iteration, Task, TaskStatus};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "[ ]",
        TaskStatus::Done => "[x]",
    }
}

fn complexity_marker(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Low => "🟢",
        Complexity::Medium => "🟡",
        Complexity::High => "🔴",
    }
}

/// Render an iteration as a Markdown plan.
///
/// Example output:
/// ```text
/// # Iteration Plan - v1.0.0
///
/// **Status**: active
/// ...
/// ### Goal: G1
///
/// #### Login `[high]`
/// - [x] 🟢 **Build form** (`<task id>`)
/// ...
/// ## Progress
///
/// - **Completion**: 100.0%
/// ```
pub fn render_plan(iteration: &Iteration) -> String {
    let summary = iteration.summary();
    let mut out = format!("# Iteration Plan - v{}\n\n", iteration.version);

    out.push_str(&format!("**Status**: {}\n", iteration.status.as_str()));
    out.push_str(&format!(
        "**Created**: {}\n",
        iteration.created_at.format(TIME_FORMAT)
    ));
    if let Some(completed_at) = iteration.completed_at {
        out.push_str(&format!("**Completed**: {}\n", completed_at.format(TIME_FORMAT)));
    }
    out.push_str(&format!(
        "\n## Product Requirements\n\n{}\n\n",
        iteration.description
    ));

    out.push_str("## Goals and Requirements\n\n");
    if iteration.requirements.is_empty() {
        out.push_str("*No requirements yet*\n\n");
    }

    for goal_id in iteration.goal_ids() {
        out.push_str(&format!("### Goal: {}\n\n", goal_id));

        for req in iteration.requirements.iter().filter(|r| r.goal_id == goal_id) {
            out.push_str(&format!("#### {} `[{}]`\n\n", req.label(), req.priority.as_str()));
            out.push_str(&format!("Requirement ID: `{}`\n\n", req.id));
            if req.title.is_some() {
                out.push_str(&format!("{}\n\n", req.description));
            }

            if req.tasks.is_empty() {
                out.push_str("*No tasks yet*\n\n");
                continue;
            }
            for task in &req.tasks {
                out.push_str(&render_task(task));
            }
            out.push('\n');
        }
    }

    out.push_str("## Progress\n\n");
    out.push_str(&format!("- **Goals**: {}\n", summary.goals_count));
    out.push_str(&format!("- **Requirements**: {}\n", summary.requirements_count));
    out.push_str(&format!("- **Tasks**: {}\n", summary.tasks_count));
    out.push_str(&format!("- **Completed tasks**: {}\n", summary.completed_tasks_count));
    out.push_str(&format!(
        "- **Completion**: {:.1}%\n",
        summary.completion_percent()
    ));

    out
}

fn render_task(task: &Task) -> String {
    let mut line = format!(
        "- {} {} **{}** (`{}`)",
        status_marker(task.status),
        complexity_marker(task.complexity),
        task.label(),
        task.id
    );
    if task.title.is_some() {
        line.push_str(&format!(": {}", task.description));
    }
    if !task.dependencies.is_empty() {
        let deps: Vec<String> = task.dependencies.iter().map(|d| d.to_string()).collect();
        line.push_str(&format!(" - depends on: {}", deps.join(", ")));
    }
    line.push('\n');
    line
}

/// Initial contents of an iteration's report.
pub fn report_header(iteration: &Iteration) -> String {
    format!(
        "# Development Report - v{}\n\n## Overview\n\n{}\n\n## Development Log\n\n",
        iteration.version, iteration.description
    )
}

/// `existing` followed by a timestamped separator and `content`.
pub fn append_report_entry(existing: &str, content: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}\n\n---\n*Updated: {}*\n\n{}",
        existing.trim_end_matches('\n'),
        at.format(TIME_FORMAT),
        content
    )
}
