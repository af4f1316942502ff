use datafusion::common::DataFusionError;
use sail_common::error::CommonError;
use thiserror::Error;

use crate::argument::DirectiveClause;

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("error in DataFusion: {0}")]
    DataFusionError(#[from] DataFusionError),
    #[error("missing argument: {0}")]
    MissingArgument(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("invalid directive combination for table argument at position {position}: {message}")]
    InvalidDirectiveCombination { position: usize, message: String },
    #[error("unresolved expression in {clause} of table argument at position {position}: {message}")]
    UnresolvedExpression {
        position: usize,
        clause: DirectiveClause,
        message: String,
    },
}

impl PlanError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        PlanError::NotSupported(message.into())
    }

    pub fn missing(message: impl Into<String>) -> Self {
        PlanError::MissingArgument(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        PlanError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PlanError::InternalError(message.into())
    }

    pub fn invalid_directives(position: usize, message: impl Into<String>) -> Self {
        PlanError::InvalidDirectiveCombination {
            position,
            message: message.into(),
        }
    }

    pub fn unresolved(
        position: usize,
        clause: DirectiveClause,
        message: impl Into<String>,
    ) -> Self {
        PlanError::UnresolvedExpression {
            position,
            clause,
            message: message.into(),
        }
    }
}

impl From<CommonError> for PlanError {
    fn from(error: CommonError) -> Self {
        match error {
            CommonError::MissingArgument(message) => PlanError::MissingArgument(message),
            CommonError::InvalidArgument(message) => PlanError::InvalidArgument(message),
            CommonError::InvalidConfiguration(message) => PlanError::InvalidArgument(message),
            CommonError::NotSupported(message) => PlanError::NotSupported(message),
            CommonError::InternalError(message) => PlanError::InternalError(message),
        }
    }
}
