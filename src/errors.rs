use crate::api::ApiResponse;
use crate::models::Stage;
use axum::{http::StatusCode, response::Json};
use tracing::{info, warn};

/// Errors raised by the study session state machine. A rejected event never
/// changes session state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {event} while the session is in the {stage:?} stage")]
    InvalidTransition { stage: Stage, event: &'static str },

    #[error("Please enter study material or upload a file")]
    NoMaterial,

    #[error("Collection name cannot be empty")]
    EmptyCollectionName,

    #[error("There are no graded cards to save")]
    NothingToSave,

    #[error("Card '{0}' is not the current card")]
    NotFrontCard(String),

    #[error("Collection '{0}' has no cards to study")]
    EmptyCollection(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("There is no saved session to resume")]
    NoSavedSession,

    #[error("This session was not started from a saved collection")]
    NoCurrentCollection,

    #[error("Timer duration cannot be changed while it is running")]
    TimerRunning,

    #[error("Timer duration must be between 1 and 1440 minutes, got {0}")]
    InvalidDuration(u32),
}

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Action not available: {0}")]
    InvalidTransition(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidTransition { .. } => ApiError::InvalidTransition(err.to_string()),
            SessionError::CollectionNotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::NoSavedSession | SessionError::NoCurrentCollection => {
                ApiError::InvalidTransition(err.to_string())
            }
            _ => ApiError::ValidationError(err.to_string()),
        }
    }
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        match &self {
            ApiError::NotFound(message) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(
                        context
                            .user_friendly_message
                            .unwrap_or_else(|| message.clone()),
                    )),
                )
            }
            ApiError::ValidationError(message) | ApiError::BadRequest(message) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(message.clone())),
                )
            }
            ApiError::InvalidTransition(message) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Action not available in current stage"
                );
                (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(message.clone())),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("study_collection", "collection")
            .with_id("col-123")
            .with_user_message("Custom message");

        assert_eq!(context.operation, "study_collection");
        assert_eq!(context.resource_type, "collection");
        assert_eq!(context.resource_id, Some("col-123".to_string()));
        assert_eq!(
            context.user_friendly_message,
            Some("Custom message".to_string())
        );
    }

    #[test]
    fn test_session_error_classification() {
        let invalid = SessionError::InvalidTransition {
            stage: Stage::Dashboard,
            event: "repeat",
        };
        assert!(matches!(ApiError::from(invalid), ApiError::InvalidTransition(_)));

        let missing = SessionError::CollectionNotFound("col-9".to_string());
        assert!(matches!(ApiError::from(missing), ApiError::NotFound(_)));

        let empty_name = SessionError::EmptyCollectionName;
        assert!(matches!(ApiError::from(empty_name), ApiError::ValidationError(_)));
    }

    #[test]
    fn test_api_error_responses() {
        let error = ApiError::NotFound("Collection not found".to_string());
        let context = ErrorContext::new("delete_collection", "collection").with_id("col-1");
        let (status, _response) = error.to_response_with_context(context);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = ApiError::from(SessionError::InvalidDuration(u32::MAX))
            .to_response_with_context(ErrorContext::new("control_timer", "timer"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = ApiError::InvalidTransition("wrong stage".to_string())
            .to_response_with_context(ErrorContext::new("repeat_session", "session"));
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
