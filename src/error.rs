use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("no check-in history for user {user_id}")]
    NotFound { user_id: String },
}

impl EngineError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(user_id: impl Into<String>) -> Self {
        EngineError::NotFound {
            user_id: user_id.into(),
        }
    }
}
