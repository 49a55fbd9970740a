use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{InvalidValue, IterationSummary};

/// Where the plan lives and which iteration, if any, is open.
///
/// `inconsistencies` lists disagreements found between the index, the
/// active pointer and the iteration documents. They are reported, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_root: PathBuf,
    pub plan_directory: PathBuf,
    pub active_iteration: Option<IterationSummary>,
    #[serde(default)]
    pub inconsistencies: Vec<String>,
}

/// All known iterations, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationListing {
    pub iterations: Vec<IterationSummary>,
    #[serde(default)]
    pub inconsistencies: Vec<String>,
}

/// What a rebuild of the index and active pointer changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRepair {
    pub iterations: usize,
    pub active_iteration: Option<String>,
    pub fixed: Vec<String>,
}

/// How a report update treats the existing text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    #[default]
    Append,
    Overwrite,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Overwrite => "overwrite",
        }
    }
}

impl FromStr for ReportMode {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(Self::Append),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(InvalidValue {
                field: "mode",
                value: s.to_string(),
                expected: "append or overwrite",
            }),
        }
    }
}
