use crate::templater::Stage;
use crate::types::TemplateType;
use crate::validation::ErrorList;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiggingError {
    #[error("not initialized: run 'rigging init'")]
    NotInitialized,

    #[error("unknown template type {template_type} (executor '{executor}' in {stage})")]
    UnknownExecutorType {
        template_type: TemplateType,
        executor: String,
        stage: Stage,
    },

    #[error("template type {0} is registered more than once")]
    DuplicateExecutorType(TemplateType),

    #[error("executor '{executor}' has no usable template source: {reason}")]
    InvalidTemplateSource { executor: String, reason: String },

    #[error("{stage} executor '{executor}' ({template_type}) failed: {source:#}")]
    Backend {
        stage: Stage,
        executor: String,
        template_type: TemplateType,
        #[source]
        source: anyhow::Error,
    },

    #[error("unable to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {0}")]
    Validation(ErrorList),

    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("execution already exists: {0}")]
    ExecutionExists(String),

    #[error("unable to set owner reference: {0}")]
    OwnerReference(String),

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid condition '{0}': expected type=status[:reason[:message]]")]
    InvalidCondition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RiggingError {
    /// Whether re-running the same operation unchanged could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RiggingError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, RiggingError>;
