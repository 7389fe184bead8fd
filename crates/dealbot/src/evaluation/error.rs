/// Rejected user input; surfaced to the caller as a structured message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Engine settings that cannot produce a result. Indicates a deployment bug, not user error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid evaluation setting `{setting}`: {reason}")]
pub struct ConfigurationError {
    pub setting: &'static str,
    pub reason: String,
}

impl ConfigurationError {
    pub(crate) fn new(setting: &'static str, reason: impl Into<String>) -> Self {
        Self {
            setting,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
