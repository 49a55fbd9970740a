//! The iterations index and active-iteration pointer documents, and the
//! cross-checks between them and the iteration records.

use serde::{Deserialize, Serialize};

use crate::models::{Iteration, IterationStatus, IterationSummary};

/// `iterations_index.json`: one summary per iteration, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationsIndex {
    #[serde(default)]
    pub iterations: Vec<IterationSummary>,
}

impl IterationsIndex {
    pub fn from_iterations<'a>(iterations: impl IntoIterator<Item = &'a Iteration>) -> Self {
        let mut index = Self::default();
        for iteration in iterations {
            index.upsert(iteration.summary());
        }
        index
    }

    /// Insert or replace the entry for `summary.version`, keeping creation order.
    pub fn upsert(&mut self, summary: IterationSummary) {
        match self
            .iterations
            .iter_mut()
            .find(|s| s.version == summary.version)
        {
            Some(existing) => *existing = summary,
            None => self.iterations.push(summary),
        }
        self.iterations
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.version.cmp(&b.version)));
    }

    pub fn get(&self, version: &str) -> Option<&IterationSummary> {
        self.iterations.iter().find(|s| s.version == version)
    }
}

/// `active_iteration.json`: the version currently open for mutation, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePointer {
    pub version: Option<String>,
}

/// Compare the index and pointer against the iteration records on disk.
///
/// Returns one message per disagreement; an empty list means consistent.
pub fn reconcile(
    iterations: &[Iteration],
    index: &IterationsIndex,
    pointer: &ActivePointer,
) -> Vec<String> {
    let mut problems = Vec::new();

    for iteration in iterations {
        match index.get(&iteration.version) {
            None => problems.push(format!(
                "iteration {} is missing from the index",
                iteration.version
            )),
            Some(entry) if *entry != iteration.summary() => problems.push(format!(
                "index entry for iteration {} is out of date",
                iteration.version
            )),
            Some(_) => {}
        }
    }

    for entry in &index.iterations {
        if !iterations.iter().any(|i| i.version == entry.version) {
            problems.push(format!(
                "index lists iteration {} but its document is missing",
                entry.version
            ));
        }
    }

    let active: Vec<&Iteration> = iterations.iter().filter(|i| i.is_active()).collect();
    if active.len() > 1 {
        let versions: Vec<&str> = active.iter().map(|i| i.version.as_str()).collect();
        problems.push(format!(
            "more than one iteration is marked active: {}",
            versions.join(", ")
        ));
    }

    match &pointer.version {
        Some(version) => match iterations.iter().find(|i| &i.version == version) {
            None => problems.push(format!(
                "active pointer names iteration {} which does not exist",
                version
            )),
            Some(i) if i.status == IterationStatus::Completed => problems.push(format!(
                "active pointer names iteration {} which is already completed",
                version
            )),
            Some(_) => {}
        },
        None => {
            for iteration in &active {
                problems.push(format!(
                    "iteration {} is marked active but the active pointer is empty",
                    iteration.version
                ));
            }
        }
    }

    problems
}
