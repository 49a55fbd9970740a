use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the plan store, the version validator and the guidance engine.
///
/// Every variant except [`PlanError::Io`] and [`PlanError::Parse`] is a
/// recoverable domain failure that the caller is expected to act on.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("version {0} already exists")]
    DuplicateVersion(String),

    #[error("iteration {0} is still active; complete it before starting a new one")]
    IterationAlreadyActive(String),

    #[error("iteration {0} does not exist")]
    IterationNotFound(String),

    #[error("iteration {0} is not the active iteration")]
    IterationNotActive(String),

    #[error("there is no active iteration; call start_new_iteration first")]
    NoActiveIteration,

    #[error("requirement {0} does not exist in the active iteration")]
    RequirementNotFound(Uuid),

    #[error("task {0} does not exist in the active iteration")]
    TaskNotFound(Uuid),

    #[error("unknown phase '{0}'; expected planning, decomposition, task_generation or reporting")]
    UnknownPhase(String),

    #[error("plan storage is inconsistent: {0}")]
    StorageInconsistent(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PlanError {
    /// The taxonomy name of this failure, as shown to tool callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidVersion { .. } => "InvalidVersion",
            Self::DuplicateVersion(_) => "DuplicateVersion",
            Self::IterationAlreadyActive(_) => "IterationAlreadyActive",
            Self::IterationNotFound(_) => "IterationNotFound",
            Self::IterationNotActive(_) => "IterationNotActive",
            Self::NoActiveIteration => "NoActiveIteration",
            Self::RequirementNotFound(_) => "RequirementNotFound",
            Self::TaskNotFound(_) => "TaskNotFound",
            Self::UnknownPhase(_) => "UnknownPhase",
            Self::StorageInconsistent(_) => "StorageInconsistent",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Io { .. } => "Io",
            Self::Parse { .. } => "Parse",
        }
    }

    /// True for failures of the storage medium rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_the_variant() {
        assert_eq!(PlanError::NoActiveIteration.kind(), "NoActiveIteration");
        assert_eq!(
            PlanError::DuplicateVersion("1.0.0".into()).kind(),
            "DuplicateVersion"
        );
    }

    #[test]
    fn message_names_the_identifier() {
        let id = Uuid::new_v4();
        let msg = PlanError::TaskNotFound(id).to_string();
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn only_storage_failures_are_internal() {
        let io = PlanError::io("/tmp/x", std::io::Error::other("boom"));
        assert!(io.is_internal());
        assert!(!PlanError::IterationNotFound("2.0.0".into()).is_internal());
    }
}
