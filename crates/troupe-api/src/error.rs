use thiserror::Error;

use troupe_runtime::OrchestratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    PermissionDenied,
    Conflict,
    InvalidArgument,
    Internal,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Orchestrator errors fold onto the transport-neutral codes: unknown
/// sessions are NotFound, calls the session's current state forbids are
/// Conflict, rejected plan content is InvalidArgument, and collaborator or
/// store faults are Internal.
impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let message = err.to_string();
        match err {
            OrchestratorError::SessionNotFound(_) => Self::NotFound(message),
            OrchestratorError::NoPlanAvailable(_)
            | OrchestratorError::AlreadyExecuting(_)
            | OrchestratorError::NotExecuting(_)
            | OrchestratorError::RegistryFull
            | OrchestratorError::InvalidTransition(_) => Self::Conflict(message),
            OrchestratorError::InvalidPlan(_) => Self::InvalidArgument(message),
            OrchestratorError::Collaborator(_) | OrchestratorError::Store(_) => {
                Self::Internal(message)
            }
        }
    }
}
